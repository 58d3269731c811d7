//! Field validation helpers.

use crate::error::DomainError;

/// Requires a non-blank value of at most `max` characters.
pub(crate) fn required(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    max_len(field, value, max)
}

/// Checks the length of an optional value.
pub(crate) fn optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), DomainError> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must not exceed {max} characters"),
        ));
    }
    Ok(())
}

/// Requires a non-negative integer.
pub(crate) fn non_negative(field: &'static str, value: i32) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(())
}

/// Chilean RUN without separators: 7 or 8 digits followed by a digit or `K`.
pub(crate) fn run(value: &str) -> Result<(), DomainError> {
    let Some((check, body)) = value.as_bytes().split_last() else {
        return Err(DomainError::validation("run", "is required"));
    };
    let body_ok = (7..=8).contains(&body.len()) && body.iter().all(u8::is_ascii_digit);
    let check_ok = check.is_ascii_digit() || *check == b'K' || *check == b'k';
    if !(body_ok && check_ok) {
        return Err(DomainError::validation("run", "must be 7-8 digits followed by a digit or K"));
    }
    Ok(())
}

/// Minimal shape check: something on both sides of a single `@`.
pub(crate) fn email(value: &str) -> Result<(), DomainError> {
    required("email", value, 100)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(DomainError::validation("email", "is not a valid address")),
    }
}
