//! Query-intent extraction.
//!
//! One instruction-augmented call to the language backend, parsed
//! defensively: the first balanced JSON value is carved out of the
//! reply to tolerate extraneous prose, and any failure at any stage
//! degrades to an all-empty intent. This function never errors.

use tracing::{debug, warn};

use crate::pipeline::prompts::{format_intent_user, INTENT_SYSTEM};
use crate::traits::language::LanguageBackend;
use crate::types::intent::SearchIntent;

/// Extract structured intent from free text.
///
/// On any backend or parse failure the pipeline continues with empty
/// filters, degrading to a "most recent" search.
pub async fn extract_intent<L: LanguageBackend>(backend: &L, user_text: &str) -> SearchIntent {
    let reply = match backend
        .complete(INTENT_SYSTEM, &format_intent_user(user_text), 0.0, 500)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "intent extraction call failed, continuing unfiltered");
            return SearchIntent::default();
        }
    };

    match first_json_object(&reply).and_then(|json| serde_json::from_str::<SearchIntent>(json).ok())
    {
        Some(intent) => {
            debug!(?intent, "intent extracted");
            intent
        }
        None => {
            warn!(reply_len = reply.len(), "unparsable intent reply, continuing unfiltered");
            SearchIntent::default()
        }
    }
}

/// First balanced `{...}` substring of `text`, if any.
///
/// String literals and escapes are respected, so braces inside JSON
/// strings do not unbalance the scan.
pub(crate) fn first_json_object(text: &str) -> Option<&str> {
    first_balanced(text, '{', '}')
}

/// First balanced `[...]` substring of `text`, if any.
pub(crate) fn first_json_array(text: &str) -> Option<&str> {
    first_balanced(text, '[', ']')
}

fn first_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
