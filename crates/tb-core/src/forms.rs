//! # Forms & validated inputs
//!
//! Every write path goes through one of the `New*` types below. Each derives
//! [`Validate`] and is checked before it reaches the store, so malformed
//! field values never get persisted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, Result};
use crate::models::NotificationTarget;

pub const SUBJECT_MAX: usize = 255;
pub const MESSAGE_MAX: usize = 4000;
pub const BOARD_NAME_MAX: usize = 50;
pub const BOARD_DESCRIPTION_MAX: usize = 150;
pub const USERNAME_MAX: usize = 150;
pub const CONTENT_MAX: usize = 100;
pub const AA_SEQ_MAX: usize = 10_000;
/// Three nucleotides per residue, against the largest accepted AA sequence.
pub const DNA_SEQ_MAX: usize = 3 * AA_SEQ_MAX;
pub const COMMENT_MAX: usize = 50;
pub const NOTIFICATION_FIELD_MAX: usize = 50;

/// Field name -> human readable messages, sorted by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// Messages for one field; empty when the field is valid.
    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                out.add(field.to_string(), describe(err));
            }
        }
        out
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<FormErrors> for AppError {
    fn from(errors: FormErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// Rejects a record whose fields violate their declared constraints.
pub fn ensure_valid<T: Validate>(record: &T) -> Result<()> {
    record
        .validate()
        .map_err(|errors| AppError::from(FormErrors::from(errors)))
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }

    let bound = |key: &str| err.params.get(key).and_then(serde_json::Value::as_u64);
    let given = err
        .params
        .get("value")
        .and_then(serde_json::Value::as_str)
        .map(|s| s.chars().count() as u64);

    match (err.code.as_ref(), given) {
        ("length", Some(0)) => "This field is required.".to_string(),
        ("length", Some(n)) => match (bound("min"), bound("max")) {
            (_, Some(max)) if n > max => {
                format!("Ensure this value has at most {max} characters (it has {n}).")
            }
            (Some(min), _) if n < min => {
                format!("Ensure this value has at least {min} characters (it has {n}).")
            }
            _ => "Enter a valid value.".to_string(),
        },
        ("length", None) => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => {
                format!("Ensure this value has between {min} and {max} characters.")
            }
            (None, Some(max)) => format!("Ensure this value has at most {max} characters."),
            _ => "This field is required.".to_string(),
        },
        (code, _) => format!("Enter a valid value ({code})."),
    }
}

/// Raw topic form as submitted. Missing fields deserialize as empty so the
/// validator, not the extractor, reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTopicForm {
    pub subject: String,
    pub message: String,
}

impl NewTopicForm {
    /// Trims both fields and validates them.
    pub fn clean(&self) -> std::result::Result<NewTopic, FormErrors> {
        let topic = NewTopic {
            subject: self.subject.trim().to_owned(),
            message: self.message.trim().to_owned(),
        };
        topic.validate()?;
        Ok(topic)
    }
}

/// A topic and its opening post, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewTopic {
    #[validate(length(min = 1, max = (SUBJECT_MAX as u64)))]
    pub subject: String,
    #[validate(length(min = 1, max = (MESSAGE_MAX as u64)))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBoard {
    #[validate(length(min = 1, max = (BOARD_NAME_MAX as u64)))]
    pub name: String,
    #[validate(length(min = 1, max = (BOARD_DESCRIPTION_MAX as u64)))]
    pub description: String,
}

#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = (USERNAME_MAX as u64)))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewDocument {
    #[validate(length(max = (CONTENT_MAX as u64)))]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProtein {
    #[validate(length(min = 1, max = (AA_SEQ_MAX as u64)))]
    pub aa_seq: String,
    #[validate(length(min = 1, max = (DNA_SEQ_MAX as u64)))]
    pub dna_seq: String,
    #[validate(length(max = (CONTENT_MAX as u64)))]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewComment {
    #[validate(length(min = 1, max = (COMMENT_MAX as u64)))]
    pub comm: String,
}

#[derive(Debug, Clone, Validate)]
pub struct NewNotification {
    #[validate(length(min = 1))]
    pub message: String,
    #[validate(length(min = 1, max = (NOTIFICATION_FIELD_MAX as u64)))]
    pub kind: String,
    pub target: NotificationTarget,
    #[validate(length(min = 1, max = (NOTIFICATION_FIELD_MAX as u64)))]
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn form(subject: &str, message: &str) -> NewTopicForm {
        NewTopicForm {
            subject: subject.into(),
            message: message.into(),
        }
    }

    #[test]
    fn clean_trims_and_accepts_bounds() {
        let topic = form("  Hello ", "\nWorld\n").clean().unwrap();
        assert_eq!(topic.subject, "Hello");
        assert_eq!(topic.message, "World");

        let edge = form(&"s".repeat(SUBJECT_MAX), &"m".repeat(MESSAGE_MAX));
        assert!(edge.clean().is_ok());
    }

    #[test]
    fn clean_rejects_overlong_fields() {
        let errors = form(&"s".repeat(SUBJECT_MAX + 1), &"m".repeat(MESSAGE_MAX + 1))
            .clean()
            .unwrap_err();
        assert_eq!(errors.field("subject").len(), 1);
        assert_eq!(errors.field("message").len(), 1);
    }

    #[test]
    fn clean_counts_characters_not_bytes() {
        // 255 two-byte characters is still within bounds.
        let subject = "é".repeat(SUBJECT_MAX);
        assert!(form(&subject, "ok").clean().is_ok());
    }

    #[test]
    fn blank_fields_are_required() {
        let errors = form("   ", "").clean().unwrap_err();
        assert!(!errors.field("subject").is_empty());
        assert!(!errors.field("message").is_empty());
        assert!(errors.to_string().contains("subject"));
    }

    #[test]
    fn errors_display_sorted_by_field_name() {
        let mut errors = FormErrors::default();
        errors.add("subject", "too long");
        errors.add("message", "required");
        errors.add("subject", "odd");
        assert_eq!(
            errors.to_string(),
            "message: required; subject: too long; subject: odd"
        );
    }

    #[test]
    fn limits_follow_constants() {
        let at_limit = NewTopic {
            subject: "s".repeat(SUBJECT_MAX),
            message: "m".repeat(MESSAGE_MAX),
        };
        assert!(ensure_valid(&at_limit).is_ok());
        let over = NewTopic {
            subject: "s".repeat(SUBJECT_MAX + 1),
            message: "m".repeat(MESSAGE_MAX + 1),
        };
        let errors = FormErrors::from(over.validate().unwrap_err());
        assert_eq!(
            errors.field("subject"),
            [format!("Ensure this value has at most {SUBJECT_MAX} characters (it has {}).", SUBJECT_MAX + 1)]
        );
        assert_eq!(errors.field("message").len(), 1);
    }

    #[test]
    fn describe_formats_length_errors() {
        let mut err = ValidationError::new("length");
        err.add_param(Cow::from("max"), &255);
        err.add_param(Cow::from("value"), &"x".repeat(300));
        assert_eq!(
            describe(&err),
            "Ensure this value has at most 255 characters (it has 300)."
        );

        let mut empty = ValidationError::new("length");
        empty.add_param(Cow::from("min"), &1);
        empty.add_param(Cow::from("value"), &"");
        assert_eq!(describe(&empty), "This field is required.");
    }

    #[test]
    fn protein_bounds_are_fixed() {
        let protein = NewProtein {
            aa_seq: "M".repeat(10),
            dna_seq: "A".repeat(DNA_SEQ_MAX),
            content: None,
        };
        assert!(ensure_valid(&protein).is_ok());

        let too_long = NewProtein {
            dna_seq: "A".repeat(DNA_SEQ_MAX + 1),
            ..protein
        };
        assert!(matches!(
            ensure_valid(&too_long),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn notification_rejects_malformed_fields() {
        let bad = NewNotification {
            message: String::new(),
            kind: "k".repeat(NOTIFICATION_FIELD_MAX + 1),
            target: NotificationTarget::Document(1),
            icon: "bell".into(),
        };
        let err = ensure_valid(&bad).unwrap_err().to_string();
        assert!(err.contains("message"));
        assert!(err.contains("kind"));
    }

    #[test]
    fn other_bounds_match_constants() {
        let board = NewBoard {
            name: "n".repeat(BOARD_NAME_MAX + 1),
            description: "d".repeat(BOARD_DESCRIPTION_MAX),
        };
        assert!(ensure_valid(&board).is_err());

        let comment = NewComment {
            comm: "c".repeat(COMMENT_MAX),
        };
        assert!(ensure_valid(&comment).is_ok());

        let doc = NewDocument {
            content: Some("c".repeat(CONTENT_MAX + 1)),
        };
        assert!(ensure_valid(&doc).is_err());

        let user = NewUser {
            username: "u".repeat(USERNAME_MAX + 1),
            password_hash: "$argon2id$".into(),
        };
        assert!(ensure_valid(&user).is_err());
    }
}
