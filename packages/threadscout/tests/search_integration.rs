//! Integration tests for the full search and scan workflows.
//!
//! These tests drive the public facade end to end:
//! 1. Intent extraction from free text
//! 2. Per-platform query building
//! 3. Concurrent fan-out retrieval with failure isolation
//! 4. Merge, rank, and answer synthesis
//! 5. The signal scanner's batching, caps, and early stop

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio_util::sync::CancellationToken;

use threadscout::testing::{MockAccounts, MockLanguage, MockPlatform, MockPlatformCall};
use threadscout::{
    AccountHandle, MimePart, Platform, RawBody, RawMessageDetail, ScanConfig, SearchError,
    Searcher,
};

/// Helper to create a mail account.
fn mail_account(id: &str, label: &str) -> AccountHandle {
    AccountHandle::new(Platform::Mail, id, label)
}

fn intent_json(names: &[&str], keywords: &[&str]) -> String {
    serde_json::json!({
        "names": names,
        "email_addresses": [],
        "topics": [],
        "date_hints": [],
        "keywords": keywords,
        "partial_names": [],
    })
    .to_string()
}

fn signal_json(kind: &str, title: &str, importance: u8, unresolved: bool) -> String {
    format!(
        r#"[{{"type": "{kind}", "title": "{title}", "summary": "summary", "importance": {importance}, "unresolved": {unresolved}}}]"#
    )
}

fn padded(text: &str) -> String {
    format!("{text} {}", "context and detail ".repeat(15))
}

#[tokio::test]
async fn test_search_zero_accounts_reports_needs_connection() {
    let searcher = Searcher::new(MockLanguage::new(), MockPlatform::new(), MockAccounts::new());

    let response = searcher
        .search("u1", "find the launch plan", &[])
        .await
        .unwrap();

    assert!(response.needs_connection);
    assert_eq!(response.results_by_platform.len(), Platform::ALL.len());
    assert!(response.results_by_platform.values().all(|v| v.is_empty()));
    assert!(response.services_with_results.is_empty());
}

#[tokio::test]
async fn test_search_survives_one_failing_account() {
    let accounts = MockAccounts::new()
        .with_account("u1", mail_account("good", "personal"))
        .with_account("u1", mail_account("expired", "work"));
    let platform = MockPlatform::new()
        .with_message(
            "good",
            RawMessageDetail::plain(
                "m1",
                "quarterly numbers",
                "Alyssa",
                "2024-03-02T09:00:00Z",
                "attached the numbers",
            ),
        )
        .with_auth_failure("expired");

    // A clone shares the mock's recorded state with the searcher
    let store_view = accounts.clone();
    let searcher = Searcher::new(MockLanguage::new(), platform, accounts);
    let response = searcher
        .search("u1", "", &[Platform::Mail])
        .await
        .unwrap();

    let mail = &response.results_by_platform[&Platform::Mail];
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].id, "m1");
    assert_eq!(mail[0].account_label, "personal");
    assert_eq!(response.services_with_results, vec![Platform::Mail]);

    // Expired mail credentials were invalidated in the store
    assert_eq!(store_view.invalidated(), vec!["expired"]);
}

#[tokio::test]
async fn test_search_intent_drives_mail_query() {
    let accounts = MockAccounts::new().with_account("u1", mail_account("a1", "work"));
    let platform = MockPlatform::new()
        .with_message(
            "a1",
            RawMessageDetail::plain(
                "hit",
                "Alyssa chat follow-up",
                "Alyssa",
                "2024-03-02T09:00:00Z",
                "as discussed",
            ),
        )
        .with_message(
            "a1",
            RawMessageDetail::plain(
                "miss",
                "cafeteria menu",
                "Catering",
                "2024-03-02T10:00:00Z",
                "soup of the day",
            ),
        );
    // "find" and "show" sit on the stop list; "chat" does not
    let language = MockLanguage::new().with_reply(
        "chat with Alyssa",
        intent_json(&["Alyssa"], &["find", "show", "chat"]),
    );

    let searcher = Searcher::new(language, platform, accounts);
    let response = searcher
        .search("u1", "find my chat with Alyssa", &[Platform::Mail])
        .await
        .unwrap();

    let mail = &response.results_by_platform[&Platform::Mail];
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].id, "hit");
    assert_eq!(response.intent.names, vec!["Alyssa"]);
}

#[tokio::test]
async fn test_search_decodes_mime_bodies() {
    let plain = URL_SAFE_NO_PAD.encode("the plain text part");
    let html = URL_SAFE_NO_PAD.encode("<p>the html part</p>");
    let body = RawBody::MailMime(MimePart::multipart(
        "multipart/alternative",
        vec![
            MimePart::leaf("text/html", html),
            MimePart::leaf("text/plain", plain),
        ],
    ));
    let detail = RawMessageDetail::plain("m1", "mixed parts", "Ren", "2024-03-01T00:00:00Z", "")
        .with_body(body);

    let accounts = MockAccounts::new().with_account("u1", mail_account("a1", "work"));
    let platform = MockPlatform::new().with_message("a1", detail);

    let searcher = Searcher::new(MockLanguage::new(), platform, accounts);
    let response = searcher.search("u1", "", &[Platform::Mail]).await.unwrap();

    let mail = &response.results_by_platform[&Platform::Mail];
    assert_eq!(mail[0].body_preview, "the plain text part");
}

#[tokio::test]
async fn test_answer_grounds_in_retrieved_sources() {
    let accounts = MockAccounts::new().with_account("u1", mail_account("a1", "work"));
    let platform = MockPlatform::new().with_message(
        "a1",
        RawMessageDetail::plain(
            "m1",
            "venue decision",
            "Alyssa",
            "2024-03-02T09:00:00Z",
            "we booked the north hall",
        ),
    );
    let language = MockLanguage::new()
        .with_reply("Request:", intent_json(&["Alyssa"], &["venue"]))
        .with_reply("Question:", "Alyssa booked the north hall.");

    let searcher = Searcher::new(language, platform, accounts);
    let answered = searcher
        .answer("u1", "which venue did Alyssa pick?", &[Platform::Mail])
        .await
        .unwrap();

    assert_eq!(answered.answer, "Alyssa booked the north hall.");
    assert_eq!(answered.response.sources.len(), 1);
    assert_eq!(answered.response.sources[0].id, "m1");
}

#[tokio::test(start_paused = true)]
async fn test_scan_respects_caps_floor_and_dedup() {
    let accounts = MockAccounts::new().with_account("u1", mail_account("a1", "work"));
    let mut platform = MockPlatform::new();
    let mut language = MockLanguage::new();

    // Six documents: one below the importance floor, two sharing a
    // (kind, title) pair, the rest distinct and strong
    let replies = [
        signal_json("decision", "Ship Friday", 9, false),
        signal_json("decision", "ship friday", 7, false),
        signal_json("risk", "Vendor slip", 3, false),
        signal_json("risk", "Budget overrun", 8, true),
        signal_json("commitment", "Ren owns rollout", 7, false),
        signal_json("insight", "Usage doubled", 6, false),
    ];
    for (i, reply) in replies.iter().enumerate() {
        platform = platform.with_message(
            "a1",
            RawMessageDetail::plain(
                format!("m{i}"),
                format!("thread {i}"),
                "Alyssa",
                "2024-03-01T00:00:00Z",
                padded("substantive discussion"),
            ),
        );
        language = language.with_reply(format!("thread {i}"), reply.clone());
    }

    let searcher = Searcher::new(language, platform, accounts);
    let digest = searcher.scan_signals("u1", Platform::Mail, 3).await.unwrap();

    assert_eq!(digest.total_considered, 6);
    assert!(digest.signals.len() <= 3);
    assert!(digest.signals.iter().all(|s| s.importance >= 6));

    // Unresolved outranks importance
    assert_eq!(digest.signals[0].title, "Budget overrun");
    // Duplicate "ship friday" kept only once, highest-ranked copy
    let ship: Vec<_> = digest
        .signals
        .iter()
        .filter(|s| s.title.eq_ignore_ascii_case("ship friday"))
        .collect();
    assert_eq!(ship.len(), 1);
    assert_eq!(ship[0].importance, 9);
}

#[tokio::test(start_paused = true)]
async fn test_scan_early_stop_bounds_account_calls() {
    let accounts = MockAccounts::new()
        .with_account("u1", mail_account("busy", "work"))
        .with_account("u1", mail_account("quiet", "personal"));
    let mut platform = MockPlatform::new();
    let mut language = MockLanguage::new();

    for i in 0..6 {
        platform = platform.with_message(
            "busy",
            RawMessageDetail::plain(
                format!("m{i}"),
                format!("update {i}"),
                "Ren",
                "2024-03-01T00:00:00Z",
                padded("long enough to analyze"),
            ),
        );
        language = language.with_reply(
            format!("update {i}"),
            signal_json("insight", &format!("finding {i}"), 8, false),
        );
    }
    platform = platform.with_message(
        "quiet",
        RawMessageDetail::plain("never", "never scanned", "Ren", "", padded("x")),
    );

    let platform_view = platform.clone();
    let searcher = Searcher::new(language, platform, accounts);
    let digest = searcher
        .scan_signals("u1", Platform::Mail, 1)
        .await
        .unwrap();

    // target = 1 + 2: the first batch of three raw signals suffices,
    // so the second account is never listed
    let listed: Vec<String> = platform_view
        .list_calls()
        .iter()
        .filter_map(|c| match c {
            MockPlatformCall::List { account_id, .. } => Some(account_id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(listed, vec!["busy"]);
    assert_eq!(digest.signals.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scan_custom_config_floor() {
    let accounts = MockAccounts::new().with_account("u1", mail_account("a1", "work"));
    let platform = MockPlatform::new().with_message(
        "a1",
        RawMessageDetail::plain(
            "m1",
            "minor note",
            "Ren",
            "2024-03-01T00:00:00Z",
            padded("small but real"),
        ),
    );
    let language = MockLanguage::new()
        .with_reply("minor note", signal_json("insight", "Small win", 4, false));

    let searcher = Searcher::new(language, platform, accounts)
        .with_scan_config(ScanConfig::default().with_min_importance(3));
    let digest = searcher.scan_signals("u1", Platform::Mail, 5).await.unwrap();

    assert_eq!(digest.signals.len(), 1);
    assert_eq!(digest.signals[0].importance, 4);
}

#[tokio::test]
async fn test_cancelled_search_surfaces_cancelled_error() {
    let searcher = Searcher::new(MockLanguage::new(), MockPlatform::new(), MockAccounts::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = searcher
        .search_with_cancel("u1", "anything", &[], &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Cancelled));
}
