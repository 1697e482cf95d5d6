/// Input validation for account identity fields
use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationErrors;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]{1,32}$")
        .expect("hardcoded username regex is invalid - fix source code")
});

/// Emails are compared case-insensitively, so they are stored lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid Email".into()))
    }
}

pub fn validate_username(username: &str) -> Result<()> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Username may only contain letters, digits, '.', '_' or '-' (max 32)".into(),
        ))
    }
}

/// Flatten `validator` derive errors into a single validation message
pub fn into_app_error(errors: ValidationErrors) -> AppError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    AppError::Validation(messages.join(", "))
}
