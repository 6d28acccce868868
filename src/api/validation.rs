//! Client-side input validation.
//!
//! These checks run before any request is issued; a failure is shown to the
//! user and nothing is sent.

use lazy_static::lazy_static;
use regex::Regex;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Oldest patient age accepted by the analysis forms
pub const MAX_AGE: u32 = 150;

lazy_static! {
    /// Loose address shape check: something@something.tld
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();

    /// Conversation IDs are server-issued UUID-like tokens
    static ref CONVERSATION_ID_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9_-]{1,64}$"
    ).unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > 64 {
        return Err("Username is too long (max 64 characters)".to_string());
    }

    Ok(())
}

/// Validate a new password and its confirmation
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), String> {
    if password != confirmation {
        return Err("Passwords do not match".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }

    Ok(())
}

/// Validate a patient age
pub fn validate_age(age: u32) -> Result<(), String> {
    if age > MAX_AGE {
        return Err(format!("Age must be at most {}", MAX_AGE));
    }

    Ok(())
}

/// Validate a conversation ID before it is placed in a request path
pub fn validate_conversation_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("Conversation ID is required".to_string());
    }

    if !CONVERSATION_ID_REGEX.is_match(id) {
        return Err("Invalid conversation ID format".to_string());
    }

    Ok(())
}
