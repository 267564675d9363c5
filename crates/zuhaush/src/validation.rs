use crate::error::ServiceError;

/// Lower-cases and trims an e-mail address, rejecting obviously malformed input.
pub fn normalize_email(raw: &str) -> Result<String, ServiceError> {
    let email = raw.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(ServiceError::validation("Invalid email address"))
    }
}

/// At least eight characters with one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < 8 {
        return Err(ServiceError::validation(
            "Password must be at least 8 characters",
        ));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ServiceError::validation(
            "Password must contain at least one letter and one number",
        ));
    }
    Ok(())
}

/// E.164-style phone number: optional `+`, then 2-15 digits not starting with zero.
pub fn validate_phone(raw: &str) -> Result<String, ServiceError> {
    let phone = raw.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid = (2..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0');
    if valid {
        Ok(phone.to_string())
    } else {
        Err(ServiceError::validation("Invalid contact number"))
    }
}

/// Trimmed, non-empty text bounded by `max` characters.
pub fn required_text(field: &str, raw: &str, max: usize) -> Result<String, ServiceError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ServiceError::validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Like [`required_text`] but blank input becomes `None`.
pub fn optional_text(field: &str, raw: Option<&str>, max: usize) -> Result<Option<String>, ServiceError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => required_text(field, value, max).map(Some),
        None => Ok(None),
    }
}
