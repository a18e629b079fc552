use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Centralized validation for request payloads.
///
/// Lazy-loaded email validation regex, a practical subset of RFC 5322.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Upper bound for purchase prices and quantities.
pub const MAX_AMOUNT: f64 = 99_999_999.99;

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_MAX_LENGTH: usize = 32;
pub const NAME_MAX_LENGTH: usize = 100;

/// Validates an email address
///
/// # Examples
///
/// ```rust
/// use bazaar_core::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Validates a new password
///
/// # Password Requirements
///
/// - Between 6 and 32 characters
/// - At least one lowercase letter, one uppercase letter, one digit and one special character
/// - No whitespace
/// - Latin (ASCII) characters only
///
/// # Examples
///
/// ```rust
/// use bazaar_core::validation::validate_password;
///
/// assert!(validate_password("Secr3t!").is_ok());
/// assert!(validate_password("weak").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    let length = password.chars().count();
    if length < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters long"
        )));
    }

    if length > PASSWORD_MAX_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be no more than {PASSWORD_MAX_LENGTH} characters long"
        )));
    }

    if password.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidPassword(
            "Password must not contain whitespace".to_string(),
        ));
    }

    if !password.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain only Latin characters".to_string(),
        ));
    }

    let rules: [(fn(&char) -> bool, &str); 4] = [
        (char::is_ascii_lowercase, "a lowercase letter"),
        (char::is_ascii_uppercase, "an uppercase letter"),
        (char::is_ascii_digit, "a digit"),
        (char::is_ascii_punctuation, "a special character"),
    ];

    for (rule, description) in rules {
        if !password.chars().any(|c| rule(&c)) {
            return Err(ValidationError::InvalidPassword(format!(
                "Password must contain at least {description}"
            )));
        }
    }

    Ok(())
}

/// Validates a user name: required, not blank, at most 100 characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidName(
            "Name cannot be empty or whitespace only".to_string(),
        ));
    }

    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "Name must be no more than {NAME_MAX_LENGTH} characters long"
        )));
    }

    Ok(())
}

/// Validates a required free-text field such as a product name.
pub fn validate_required_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(format!("{field} is required")));
    }

    Ok(())
}

/// Validates a price or quantity: finite, within `0..=MAX_AMOUNT`, at most two decimals.
///
/// ```rust
/// use bazaar_core::validation::validate_amount;
///
/// assert!(validate_amount("Price", 19.99).is_ok());
/// assert!(validate_amount("Price", 1.005).is_err());
/// ```
pub fn validate_amount(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidField(format!(
            "{field} must be a number"
        )));
    }

    if !(0.0..=MAX_AMOUNT).contains(&value) {
        return Err(ValidationError::InvalidField(format!(
            "{field} must be between 0 and {MAX_AMOUNT}"
        )));
    }

    let cents = value * 100.0;
    if (cents.round() - cents).abs() > 1e-3 {
        return Err(ValidationError::InvalidField(format!(
            "{field} must have at most 2 decimal places"
        )));
    }

    Ok(())
}
