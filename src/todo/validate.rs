//! Field constraints for todo records.
//!
//! Validation always runs on a complete record: creation validates the
//! candidate, updates validate the merged result of stored record and patch.

use std::collections::BTreeMap;
use std::fmt;

use super::model::{Todo, TodoCreate};

pub const TODO_NAME_LEN: (usize, usize) = (2, 512);
pub const TODO_DESCRIPTION_LEN: (usize, usize) = (0, 128);
pub const USERNAME_LEN: (usize, usize) = (2, 64);
pub const EMAIL_MAX_LEN: usize = 254;

/// Field name to human-readable message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_todo(todo: &Todo) -> Result<(), ValidationErrors> {
    validate_fields(
        &todo.todo_name,
        &todo.todo_description,
        &todo.username,
        todo.user_email.as_deref(),
    )
}

/// Same checks for a record that has not been assigned an id yet
pub fn validate_candidate(candidate: &TodoCreate) -> Result<(), ValidationErrors> {
    validate_fields(
        &candidate.todo_name,
        &candidate.todo_description,
        &candidate.username,
        candidate.user_email.as_deref(),
    )
}

fn validate_fields(
    name: &str,
    description: &str,
    username: &str,
    email: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check_length(&mut errors, "todo_name", name, TODO_NAME_LEN);
    check_length(&mut errors, "todo_description", description, TODO_DESCRIPTION_LEN);
    check_length(&mut errors, "username", username, USERNAME_LEN);

    if let Some(email) = email {
        if !is_valid_email(email) {
            errors.add("user_email", "value is not a valid email address");
        }
    }

    errors.into_result()
}

/// Lengths are counted in characters, not bytes.
pub fn check_length(errors: &mut ValidationErrors, field: &str, value: &str, (min, max): (usize, usize)) {
    let len = value.chars().count();
    if len < min {
        errors.add(field, format!("must be at least {} characters", min));
    } else if len > max {
        errors.add(field, format!("must be at most {} characters", max));
    }
}

/// Syntactic email check: `local@domain` with a dotted domain of
/// alphanumeric/hyphen labels and an alphabetic top-level label.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LEN {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !labels_ok {
        return false;
    }

    labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false)
}
