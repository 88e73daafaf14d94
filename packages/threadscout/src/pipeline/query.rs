//! Per-platform query construction from a structured intent.

use chrono::{DateTime, Utc};

use crate::pipeline::dates::{format_mail_date, resolve_all};
use crate::traits::platform::{PlatformQuery, TermFilter};
use crate::types::account::Platform;
use crate::types::intent::SearchIntent;

/// Generic query verbs that add noise to a mail search.
///
/// Compared case-insensitively against intent keywords.
const MAIL_STOP_WORDS: [&str; 10] = [
    "email",
    "emails",
    "find",
    "search",
    "show",
    "get",
    "conversation",
    "conversations",
    "message",
    "messages",
];

/// Build the mail backend's query string.
///
/// Term order: address filters, names, partial names, topics,
/// stop-word-filtered keywords, then date clauses. Fuzzy matching is
/// delegated to the backend's own full-text search; an all-empty
/// intent yields an empty string, which the retriever treats as
/// "most recent, unfiltered".
pub fn build_mail_query(intent: &SearchIntent, now: DateTime<Utc>) -> String {
    let mut terms: Vec<String> = Vec::new();

    for address in &intent.email_addresses {
        terms.push(format!("(from:{address} OR to:{address})"));
    }
    terms.extend(intent.names.iter().cloned());
    terms.extend(intent.partial_names.iter().cloned());
    terms.extend(intent.topics.iter().cloned());
    terms.extend(
        intent
            .keywords
            .iter()
            .filter(|k| !is_stop_word(k))
            .cloned(),
    );

    let window = resolve_all(&intent.date_hints, now);
    if let Some(after) = window.after {
        terms.push(format!("after:{}", format_mail_date(after)));
    }
    if let Some(before) = window.before {
        terms.push(format!("before:{}", format_mail_date(before)));
    }

    terms.join(" ")
}

/// Whether a keyword is on the mail stop list, case-insensitively.
pub fn is_stop_word(keyword: &str) -> bool {
    MAIL_STOP_WORDS
        .iter()
        .any(|s| keyword.eq_ignore_ascii_case(s))
}

/// Build the client-side substring filter for platforms without
/// server-side free-text search.
pub fn build_term_filter(intent: &SearchIntent) -> TermFilter {
    TermFilter::new(intent.flattened_terms())
}

/// Build the query in whichever form `platform` consumes.
pub fn build_query(platform: Platform, intent: &SearchIntent, now: DateTime<Utc>) -> PlatformQuery {
    if platform.has_server_search() {
        PlatformQuery::Mail(build_mail_query(intent, now))
    } else {
        PlatformQuery::Terms(build_term_filter(intent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_intent_empty_query() {
        assert_eq!(build_mail_query(&SearchIntent::default(), now()), "");
    }

    #[test]
    fn test_term_ordering() {
        let intent = SearchIntent {
            names: vec!["Alyssa Hacker".into()],
            email_addresses: vec!["ben@example.com".into()],
            topics: vec!["budget".into()],
            keywords: vec!["deadline".into()],
            partial_names: vec!["Jo".into()],
            ..Default::default()
        };
        assert_eq!(
            build_mail_query(&intent, now()),
            "(from:ben@example.com OR to:ben@example.com) Alyssa Hacker Jo budget deadline"
        );
    }

    #[test]
    fn test_stop_words_filtered_case_insensitive() {
        let intent = SearchIntent {
            keywords: vec!["Emails".into(), "deadline".into(), "FIND".into()],
            ..Default::default()
        };
        assert_eq!(build_mail_query(&intent, now()), "deadline");
    }

    #[test]
    fn test_non_stop_keyword_retained() {
        // "chat" is not on the stop list and must survive
        let intent = SearchIntent {
            names: vec!["Alyssa".into()],
            keywords: vec!["chat".into()],
            ..Default::default()
        };
        assert_eq!(build_mail_query(&intent, now()), "Alyssa chat");
    }

    #[test]
    fn test_date_clauses_appended_last() {
        let intent = SearchIntent {
            keywords: vec!["report".into()],
            date_hints: vec!["2023".into()],
            ..Default::default()
        };
        assert_eq!(
            build_mail_query(&intent, now()),
            "report after:2023/01/01 before:2024/01/01"
        );
    }

    #[test]
    fn test_build_query_platform_dispatch() {
        let intent = SearchIntent {
            names: vec!["Alyssa".into()],
            ..Default::default()
        };
        assert!(matches!(
            build_query(Platform::Mail, &intent, now()),
            PlatformQuery::Mail(_)
        ));
        match build_query(Platform::Chat, &intent, now()) {
            PlatformQuery::Terms(filter) => assert!(filter.matches("hey alyssa")),
            other => panic!("expected term filter, got {other:?}"),
        }
    }

    proptest! {
        // The stop list is ASCII; exercise every ASCII casing of each
        // word via a flip-case mask.
        #[test]
        fn prop_stop_words_excluded_any_ascii_case(
            index in 0..MAIL_STOP_WORDS.len(),
            mask in prop::collection::vec(any::<bool>(), 13),
        ) {
            let word: String = MAIL_STOP_WORDS[index]
                .chars()
                .zip(mask)
                .map(|(c, upper)| if upper { c.to_ascii_uppercase() } else { c })
                .collect();
            let intent = SearchIntent {
                keywords: vec![word],
                ..Default::default()
            };
            prop_assert_eq!(build_mail_query(&intent, now()), "");
        }
    }

    #[test]
    fn test_unicode_lookalike_keyword_not_filtered() {
        // U+017F case-folds to "s" in Unicode but is not an ASCII
        // casing of "show"; it must survive as a real search term
        let intent = SearchIntent {
            keywords: vec!["\u{17f}how".into()],
            ..Default::default()
        };
        assert_eq!(build_mail_query(&intent, now()), "\u{17f}how");
    }
}
