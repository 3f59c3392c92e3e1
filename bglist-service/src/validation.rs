//! Field validation primitives
//!
//! Validators are plain functions/structs that return `Result<(), String>`;
//! binding code composes them and folds failures into a [`ValidationErrors`]
//! map keyed by the wire name of the offending field.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::FieldSchema;

/// Message of the letters-only validator
pub const LETTERS_ONLY_MESSAGE: &str =
    "Value must contain only letter (no space, digits, or other characters)";

/// Accepted `sortOrder` tokens
pub const SORT_ORDERS: &[&str] = &["ASC", "DESC"];

static LETTERS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z]+$").expect("letters-only pattern is valid"));

/// Aggregated validation failures, keyed by field
///
/// Serializes as `{"field": ["message", ...]}` with fields in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Record a failure for `field`
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Single-failure convenience constructor
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` has at least one failure
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Names of every failing field
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Checks that a sort column names a declared field of a schema
///
/// The lookup is an exact, case-sensitive match against a static field set.
#[derive(Debug, Clone)]
pub struct SortColumnValidator {
    allowed: Vec<&'static str>,
}

impl SortColumnValidator {
    pub fn new(allowed: Vec<&'static str>) -> Self {
        Self { allowed }
    }

    /// Validator scoped to the declared fields of `T`
    pub fn for_schema<T: FieldSchema>() -> Self {
        Self::new(T::field_names())
    }

    pub fn allowed(&self) -> &[&'static str] {
        &self.allowed
    }

    pub fn validate(&self, column: &str) -> Result<(), String> {
        if self.allowed.iter().any(|field| *field == column) {
            Ok(())
        } else {
            Err(format!(
                "sortColumn must be one of: {}",
                self.allowed.join(", ")
            ))
        }
    }
}

/// Letters-only string validator
///
/// Passes only when `use_regex` is set and the value is a non-empty run of
/// ASCII letters. With `use_regex` off (the default) every value fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LettersOnly {
    pub use_regex: bool,
}

impl LettersOnly {
    /// Validator with the regex check switched on
    pub fn with_regex() -> Self {
        Self { use_regex: true }
    }

    pub fn validate(&self, value: Option<&str>) -> Result<(), String> {
        match value {
            Some(v) if !v.is_empty() && self.use_regex && LETTERS_ONLY.is_match(v) => Ok(()),
            _ => Err(LETTERS_ONLY_MESSAGE.to_string()),
        }
    }
}

/// `sortOrder` must be exactly `ASC` or `DESC`
pub fn validate_sort_order(value: &str) -> Result<(), String> {
    if SORT_ORDERS.contains(&value) {
        Ok(())
    } else {
        Err(format!("sortOrder must be one of: {}", SORT_ORDERS.join(", ")))
    }
}

/// Inclusive range check
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), String> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be between {} and {}", field, min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BoardGameDto, DomainDto};

    #[test]
    fn test_sort_column_accepts_declared_fields() {
        let validator = SortColumnValidator::for_schema::<BoardGameDto>();
        for field in ["Id", "Name", "Year", "MinPlayers", "MaxPlayers", "PlayTime", "MinAge"] {
            assert!(validator.validate(field).is_ok(), "{} should be sortable", field);
        }
    }

    #[test]
    fn test_sort_column_is_case_sensitive() {
        let validator = SortColumnValidator::for_schema::<DomainDto>();
        assert!(validator.validate("name").is_err());
        assert!(validator.validate("NAME").is_err());
        assert!(validator.validate("Name").is_ok());
    }

    #[test]
    fn test_sort_column_rejects_unknown_and_injected_names() {
        let validator = SortColumnValidator::for_schema::<DomainDto>();
        for bad in ["Nonexistent", "", "Name; DROP TABLE Domains", "LastModifiedDate"] {
            assert_eq!(
                validator.validate(bad).unwrap_err(),
                "sortColumn must be one of: Id, Name"
            );
        }
    }

    #[test]
    fn test_sort_order_tokens() {
        assert!(validate_sort_order("ASC").is_ok());
        assert!(validate_sort_order("DESC").is_ok());
        assert!(validate_sort_order("asc").is_err());
        assert!(validate_sort_order("Desc").is_err());
        assert!(validate_sort_order("").is_err());
    }

    #[test]
    fn test_letters_only_with_regex() {
        let validator = LettersOnly::with_regex();
        assert!(validator.validate(Some("Wargames")).is_ok());
        assert!(validator.validate(Some("War games")).is_err());
        assert!(validator.validate(Some("Wargames2")).is_err());
        assert!(validator.validate(Some("")).is_err());
        assert!(validator.validate(None).is_err());
    }

    /// The flag gates success entirely: with the regex off, even a clean
    /// letters-only value is rejected.
    #[test]
    fn test_letters_only_without_regex_always_fails() {
        let validator = LettersOnly::default();
        assert!(!validator.use_regex);
        assert_eq!(
            validator.validate(Some("Wargames")).unwrap_err(),
            LETTERS_ONLY_MESSAGE
        );
    }

    #[test]
    fn test_range() {
        assert!(validate_range("pageSize", 1, 1, 100).is_ok());
        assert!(validate_range("pageSize", 100, 1, 100).is_ok());
        assert_eq!(
            validate_range("pageSize", 500, 1, 100).unwrap_err(),
            "pageSize must be between 1 and 100"
        );
    }

    #[test]
    fn test_errors_serialize_as_field_map() {
        let mut errors = ValidationErrors::default();
        errors.add("pageSize", "too big");
        errors.add("pageSize", "still too big");
        errors.add("sortOrder", "bad");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["pageSize"][1], "still too big");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["pageSize", "sortOrder"]);
    }
}
