//! Core data model types for adaptest.
//!
//! Items are immutable once validated; response records are append-only and
//! owned by the engine's response log.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatError;

/// Easiest difficulty level.
pub const MIN_LEVEL: u8 = 1;
/// Hardest difficulty level.
pub const MAX_LEVEL: u8 = 5;

/// All difficulty levels, easiest first.
pub fn levels() -> impl Iterator<Item = u8> {
    MIN_LEVEL..=MAX_LEVEL
}

/// Clamp an arbitrary level request into `[MIN_LEVEL, MAX_LEVEL]`.
pub fn clamp_level(level: i64) -> u8 {
    level.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8
}

/// Option key to option text, iterated in sorted key order.
pub type OptionMap = BTreeMap<String, String>;

/// A validated, immutable test item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within the bank.
    pub id: String,
    /// Difficulty level, 1 (easiest) to 5 (hardest).
    pub difficulty: u8,
    /// Topic the item belongs to.
    pub category: String,
    /// The question text.
    pub prompt: String,
    /// Answer options keyed by option letter.
    pub options: OptionMap,
    /// Key of the correct option in `options`.
    pub correct_key: String,
    /// Explanation shown after answering.
    pub explanation: String,
}

impl Item {
    /// Text of the correct option.
    pub fn correct_text(&self) -> &str {
        // validated at construction: correct_key is always an option key
        self.options
            .get(&self.correct_key)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// An item as read from storage, before structural validation.
///
/// Every field is optional so that a missing field is reported by name
/// instead of surfacing as an opaque deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub options: Option<OptionMap>,
    #[serde(default)]
    pub correct_key: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl ItemRecord {
    /// Validate the record and turn it into an [`Item`].
    ///
    /// `position` is the zero-based index in the source collection, used to
    /// identify records whose id is missing.
    pub fn validate(self, position: usize) -> Result<Item, CatError> {
        let context = match &self.id {
            Some(id) if !id.trim().is_empty() => format!("item {id}"),
            _ => format!("item #{}", position + 1),
        };
        let missing = |field: &'static str| CatError::validation(&context, field, "is missing");

        let id = self.id.ok_or_else(|| missing("id"))?;
        if id.trim().is_empty() {
            return Err(CatError::validation(&context, "id", "must not be empty"));
        }

        let difficulty = self.difficulty.ok_or_else(|| missing("difficulty"))?;
        if !(MIN_LEVEL as i64..=MAX_LEVEL as i64).contains(&difficulty) {
            return Err(CatError::validation(
                &context,
                "difficulty",
                format!("must be between {MIN_LEVEL} and {MAX_LEVEL}, got {difficulty}"),
            ));
        }

        let category = self.category.ok_or_else(|| missing("category"))?;
        if category.trim().is_empty() {
            return Err(CatError::validation(&context, "category", "must not be empty"));
        }

        let prompt = self.prompt.ok_or_else(|| missing("prompt"))?;
        if prompt.trim().is_empty() {
            return Err(CatError::validation(&context, "prompt", "must not be empty"));
        }

        let options = self.options.ok_or_else(|| missing("options"))?;
        if options.len() < 2 {
            return Err(CatError::validation(
                &context,
                "options",
                format!("needs at least 2 entries, got {}", options.len()),
            ));
        }
        if options
            .iter()
            .any(|(key, text)| key.trim().is_empty() || text.trim().is_empty())
        {
            return Err(CatError::validation(
                &context,
                "options",
                "keys and texts must not be empty",
            ));
        }

        let correct_key = self.correct_key.ok_or_else(|| missing("correct_key"))?;
        if !options.contains_key(&correct_key) {
            return Err(CatError::validation(
                &context,
                "correct_key",
                format!("`{correct_key}` is not an option key"),
            ));
        }

        let explanation = self.explanation.ok_or_else(|| missing("explanation"))?;

        Ok(Item {
            id,
            difficulty: difficulty as u8,
            category,
            prompt,
            options,
            correct_key,
            explanation,
        })
    }
}

impl From<Item> for ItemRecord {
    fn from(item: Item) -> Self {
        Self {
            id: Some(item.id),
            difficulty: Some(item.difficulty as i64),
            category: Some(item.category),
            prompt: Some(item.prompt),
            options: Some(item.options),
            correct_key: Some(item.correct_key),
            explanation: Some(item.explanation),
        }
    }
}

/// One answered item. Immutable once appended to the response log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub item_id: String,
    /// Difficulty of the item that was answered.
    pub difficulty: u8,
    pub category: String,
    pub is_correct: bool,
    /// The engine's difficulty level when the item was posed.
    pub difficulty_at_time: u8,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    MaxQuestionsReached,
    ScoreStabilized,
    BankExhausted,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::MaxQuestionsReached => "max_questions_reached",
            TerminationReason::ScoreStabilized => "score_stabilized",
            TerminationReason::BankExhausted => "bank_exhausted",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ItemRecord {
        fixtures::item("q1", 3, "logic").into()
    }

    #[test]
    fn clamp_level_bounds() {
        assert_eq!(clamp_level(-4), 1);
        assert_eq!(clamp_level(0), 1);
        assert_eq!(clamp_level(3), 3);
        assert_eq!(clamp_level(9), 5);
        assert_eq!(levels().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn valid_record_becomes_item() {
        let item = record().validate(0).unwrap();
        assert_eq!(item.id, "q1");
        assert_eq!(item.difficulty, 3);
        assert_eq!(item.correct_text(), "gamma (q1)");
    }

    #[test]
    fn missing_field_is_named() {
        let mut r = record();
        r.explanation = None;
        let err = r.validate(0).unwrap_err();
        assert_eq!(err.field(), Some("explanation"));
        assert!(err.to_string().contains("item q1"));
    }

    #[test]
    fn missing_id_uses_position() {
        let mut r = record();
        r.id = None;
        let err = r.validate(6).unwrap_err();
        assert_eq!(err.field(), Some("id"));
        assert!(err.to_string().contains("item #7"));
    }

    #[test]
    fn difficulty_out_of_range() {
        for bad in [0, 6, -1] {
            let mut r = record();
            r.difficulty = Some(bad);
            assert_eq!(r.validate(0).unwrap_err().field(), Some("difficulty"));
        }
    }

    #[test]
    fn single_option_rejected() {
        let mut r = record();
        r.options = Some(OptionMap::from([("a".to_string(), "only".to_string())]));
        r.correct_key = Some("a".into());
        assert_eq!(r.validate(0).unwrap_err().field(), Some("options"));
    }

    #[test]
    fn correct_key_must_be_an_option() {
        let mut r = record();
        r.correct_key = Some("z".into());
        assert_eq!(r.validate(0).unwrap_err().field(), Some("correct_key"));
    }

    #[test]
    fn item_record_deserializes_with_missing_fields() {
        let r: ItemRecord = serde_json::from_str(r#"{"id": "x", "difficulty": 2}"#).unwrap();
        assert_eq!(r.difficulty, Some(2));
        assert_eq!(r.validate(0).unwrap_err().field(), Some("category"));
    }

    #[test]
    fn termination_reason_tags() {
        assert_eq!(
            serde_json::to_string(&TerminationReason::ScoreStabilized).unwrap(),
            "\"score_stabilized\""
        );
        assert_eq!(TerminationReason::BankExhausted.to_string(), "bank_exhausted");
        assert_eq!(
            TerminationReason::MaxQuestionsReached.as_str(),
            "max_questions_reached"
        );
    }
}
