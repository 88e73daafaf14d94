//! Body decoding: base64 mail parts, MIME trees, HTML stripping.
//!
//! Platform-native encodings are decoded to plain text before the
//! preview truncation. Mail bodies arrive as MIME trees with URL-safe
//! base64 leaves; workspace-chat bodies carry HTML tags and entities.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;

use crate::traits::platform::{MimePart, RawBody};

/// Truncate to at most `max` characters, on a character boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Decode a URL-safe base64 payload to UTF-8 text.
///
/// Padding is tolerated either way; undecodable input yields `None`.
pub fn decode_base64url(data: &str) -> Option<String> {
    let trimmed = data.trim().trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(trimmed).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Strip HTML tags and common entities, collapsing whitespace.
pub fn strip_html(input: &str) -> String {
    let without_tags = tag_regex().replace_all(input, " ");
    // `&amp;` last, so pre-escaped entities decode exactly once
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    whitespace_regex()
        .replace_all(decoded.trim(), " ")
        .into_owned()
}

/// Extract readable text from a MIME tree.
///
/// Prefers `text/plain` over stripped `text/html`, recursing into
/// nested multipart containers at every level.
pub fn extract_mime_text(part: &MimePart) -> Option<String> {
    if let Some(data) = &part.data_b64 {
        let decoded = decode_base64url(data)?;
        if part.mime_type.eq_ignore_ascii_case("text/plain") {
            return Some(decoded);
        }
        if part.mime_type.eq_ignore_ascii_case("text/html") {
            return Some(strip_html(&decoded));
        }
        return None;
    }

    // Multipart: any text/plain wins over any text/html, at any depth
    if let Some(plain) = find_by_type(part, "text/plain") {
        return Some(plain);
    }
    if let Some(html) = find_by_type(part, "text/html") {
        return Some(html);
    }
    None
}

fn find_by_type(part: &MimePart, wanted: &str) -> Option<String> {
    for child in &part.parts {
        if child.mime_type.eq_ignore_ascii_case(wanted) {
            // An undecodable payload disqualifies this part only; a
            // sibling or the html fallback may still produce text
            if let Some(decoded) = child.data_b64.as_deref().and_then(decode_base64url) {
                return Some(if wanted == "text/html" {
                    strip_html(&decoded)
                } else {
                    decoded
                });
            }
        }
        if !child.parts.is_empty() {
            if let Some(found) = find_by_type(child, wanted) {
                return Some(found);
            }
        }
    }
    None
}

/// Decode any platform body to plain text.
pub fn body_text(body: &RawBody) -> String {
    match body {
        RawBody::MailMime(root) => extract_mime_text(root).unwrap_or_default(),
        RawBody::ChatHtml(html) => strip_html(html),
        RawBody::Plain(text) => text.clone(),
    }
}
