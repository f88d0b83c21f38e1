//! FAQ records — question/answer pairs from the portal help pages.
//!
//! Source shape: `{ question, answer, category, tags: [...], url }`.
//! A missing `category` defaults to "general". Episode names truncate the
//! question to keep labels readable.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use satgraph_core::Episode;

use crate::dataset::{list_field, opt_string, string_or, Dataset};

/// Placeholder identity for records with no usable `question`.
pub const PLACEHOLDER: &str = "Unknown";

/// Maximum question length carried into the episode name.
pub const NAME_QUESTION_CHARS: usize = 50;

/// Canonical FAQ payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Faq {
    /// The question; placeholder-substituted, never empty.
    pub question: String,
    /// The answer text.
    pub answer: Option<String>,
    /// FAQ category; defaults to "general". Doubles as the episode's
    /// category tag.
    pub category: String,
    /// Topic tags.
    pub tags: Vec<Value>,
    /// Portal page URL.
    pub url: Option<String>,
}

/// Normalizes a raw record. Total: never fails, never mutates `raw`.
pub fn normalize(raw: &Value) -> Faq {
    Faq {
        question: string_or(raw, "question", PLACEHOLDER),
        answer: opt_string(raw, "answer"),
        category: string_or(raw, "category", "general"),
        tags: list_field(raw, "tags"),
        url: opt_string(raw, "url"),
    }
}

impl Faq {
    /// Canonical episode body with `type` discriminator and `category` tag.
    pub fn body(&self) -> Value {
        json!({
            "type": "faq",
            "question": self.question,
            "answer": self.answer,
            "category": self.category,
            "tags": self.tags,
            "url": self.url,
        })
    }

    /// The question truncated to [`NAME_QUESTION_CHARS`] on a char boundary.
    pub fn name_question(&self) -> String {
        self.question.chars().take(NAME_QUESTION_CHARS).collect()
    }

    /// Converts the payload into a graph episode.
    pub fn to_episode(&self, reference_time: DateTime<Utc>) -> Episode {
        Episode::json(
            format!("FAQ: {}", self.name_question()),
            serde_json::to_string_pretty(&self.body()).unwrap_or_else(|_| "{}".to_string()),
            Dataset::Faqs.source_description(),
            reference_time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_record() {
        let raw = serde_json::json!({
            "question": "How do I download SST data?",
            "answer": "Register on the portal and use the order cart.",
            "category": "data-access",
            "tags": ["sst", "download"],
            "url": "https://portal.example/faq#12",
        });
        let faq = normalize(&raw);
        assert_eq!(faq.question, "How do I download SST data?");
        assert_eq!(faq.category, "data-access");
        assert_eq!(faq.tags.len(), 2);
    }

    #[test]
    fn test_missing_answer_and_category_default() {
        let faq = normalize(&serde_json::json!({"question": "Q2"}));
        assert!(faq.answer.is_none());
        assert_eq!(faq.category, "general");
        assert!(faq.tags.is_empty());
    }

    #[test]
    fn test_normalize_empty_record_defaults() {
        let faq = normalize(&serde_json::json!({}));
        assert_eq!(faq.question, PLACEHOLDER);
        assert_eq!(faq.category, "general");
    }

    #[test]
    fn test_episode_name_truncates_long_questions() {
        let long = "What is the revisit time of the scatterometer payload on board Oceansat-3?";
        let faq = normalize(&serde_json::json!({"question": long}));
        let ep = faq.to_episode(Utc::now());
        assert!(ep.name.starts_with("FAQ: "));
        assert_eq!(ep.name.chars().count(), "FAQ: ".chars().count() + NAME_QUESTION_CHARS);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let question: String = "ที่ดาวเทียม".repeat(10);
        let faq = normalize(&serde_json::json!({"question": question}));
        // Must not panic on multi-byte boundaries.
        assert_eq!(faq.name_question().chars().count(), NAME_QUESTION_CHARS);
    }

    #[test]
    fn test_body_category_is_faq_category() {
        let body = normalize(&serde_json::json!({"question": "Q"})).body();
        assert_eq!(body["type"], "faq");
        assert_eq!(body["category"], "general");
    }
}
