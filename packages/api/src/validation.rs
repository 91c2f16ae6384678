//! Field checks shared by the registration and house forms.

use chrono::NaiveTime;

use crate::error::ValidationError;

/// Letters and whitespace only, at least one character.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

/// Exactly ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Reject blank values for a required field.
pub fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

/// `HH:MM`, 24-hour clock.
pub fn validate_time(time: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map(|_| ())
        .map_err(|_| ValidationError::Time)
}
