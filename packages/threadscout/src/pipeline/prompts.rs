//! LLM prompts for intent extraction, signal analysis and answer
//! synthesis.
//!
//! Formatting uses literal `{placeholder}` substitution so the
//! templates read close to what the backend receives.

/// System prompt for query-intent extraction.
///
/// The few-shot examples demonstrate the required generosity:
/// conversational phrasings, partial fragments and bare names must
/// all populate fields rather than being dropped.
pub const INTENT_SYSTEM: &str = r#"You turn a user's free-text request about their messages into structured search intent.

Output ONLY strict JSON with exactly these keys, each an array of strings (empty when nothing applies):
{
    "names": [],
    "email_addresses": [],
    "topics": [],
    "date_hints": [],
    "keywords": [],
    "partial_names": []
}

Be generous in interpretation:
- "chat with Alyssa" -> names: ["Alyssa"]
- "emails from ben@example.com about the budget" -> email_addresses: ["ben@example.com"], topics: ["budget"]
- "someone whose name starts with Jo" -> partial_names: ["Jo"]
- "messages from last week about the offsite" -> date_hints: ["last week"], topics: ["offsite"]
- "that thing Lem sent in 2023" -> names: ["Lem"], date_hints: ["2023"]
- anything else searchable goes into keywords

Never refuse, never explain, never add keys."#;

/// User template for intent extraction.
pub const INTENT_USER: &str = "Request: {text}";

/// System prompt for per-document signal extraction.
pub const SIGNAL_SYSTEM: &str = r#"You read one message and extract at most 2 memory signals: things a busy person would want surfaced later.

Output ONLY a strict JSON array (possibly empty). Each element:
{
    "type": "decision" | "risk" | "open_question" | "commitment" | "insight",
    "title": "headline, at most 60 characters",
    "summary": "one line, at most 150 characters",
    "importance": 1-10,
    "unresolved": true | false,
    "quotes": ["at most 2 short supporting quotes, each under 100 characters"]
}

Rate importance honestly: routine scheduling is 2-3, a blocked launch is 9. Mark unresolved=true only when the matter still needs action."#;

/// User template for signal extraction.
pub const SIGNAL_USER: &str = r#"From: {sender}
Date: {date}
Subject: {subject}

{body}"#;

/// System prompt for final answer synthesis.
pub const ANSWER_SYSTEM: &str = r#"You answer a user's question using only the message excerpts provided as context. Cite senders and dates naturally in prose. If the context does not contain the answer, say so plainly and suggest how the user might refine the search."#;

/// User template for answer synthesis.
pub const ANSWER_USER: &str = r#"Question: {question}

Context:
{context}"#;

/// Fill the intent user template.
pub fn format_intent_user(text: &str) -> String {
    INTENT_USER.replace("{text}", text)
}

/// Fill the signal user template.
pub fn format_signal_user(sender: &str, date: &str, subject: &str, body: &str) -> String {
    SIGNAL_USER
        .replace("{sender}", sender)
        .replace("{date}", date)
        .replace("{subject}", subject)
        .replace("{body}", body)
}

/// Fill the answer user template.
pub fn format_answer_user(question: &str, context: &str) -> String {
    ANSWER_USER
        .replace("{question}", question)
        .replace("{context}", context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_fill_placeholders() {
        let user = format_signal_user("Ren", "2024-03-01", "Budget", "body text");
        assert!(user.contains("From: Ren"));
        assert!(user.contains("Subject: Budget"));
        assert!(!user.contains('{'));
    }
}
