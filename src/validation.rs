//! Input validation shared by the service layer

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{BankError, BankResult};

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,50}$").expect("valid regex");
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex");
    static ref PHONE_RE: Regex = Regex::new(r"^\+?1?\d{9,15}$").expect("valid regex");
}

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";
const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_username(username: &str) -> BankResult<()> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(BankError::validation(
            "Username must be 3-50 characters of letters, digits, '_', '.' or '-'",
        ))
    }
}

pub fn validate_email(email: &str) -> BankResult<()> {
    if email.len() <= 120 && EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(BankError::validation("Invalid email format"))
    }
}

pub fn validate_password(password: &str) -> BankResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BankError::validation("Password must be at least 8 characters long"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(BankError::validation("Password must contain at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(BankError::validation("Password must contain at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(BankError::validation("Password must contain at least one number"));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(BankError::validation("Password must contain at least one special character"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> BankResult<()> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(BankError::validation("Invalid phone number format"))
    }
}

pub fn validate_account_number(number: &str) -> BankResult<()> {
    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(BankError::validation("Account number must contain only digits"));
    }
    if !(8..=16).contains(&number.len()) {
        return Err(BankError::validation("Account number must be between 8 and 16 digits"));
    }
    Ok(())
}

/// Amounts must be positive, at most `max`, and carry no more than cents.
pub fn validate_amount(amount: Decimal, max: Decimal, what: &str) -> BankResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(BankError::validation(format!("{} amount must be positive", what)));
    }
    if amount > max {
        return Err(BankError::validation(format!("{} amount exceeds maximum limit", what)));
    }
    if amount.normalize().scale() > 2 {
        return Err(BankError::validation(format!(
            "{} amount must have at most 2 decimal places",
            what
        )));
    }
    Ok(amount.round_dp(2))
}

pub fn parse_date(raw: &str) -> BankResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| BankError::validation("Invalid date format. Use YYYY-MM-DD"))
}

/// Trimmed, non-empty text field.
pub fn required_text(value: &str, field: &str, max_len: usize) -> BankResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BankError::validation(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(BankError::validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_password_rules_report_first_failure() {
        assert!(validate_password("Test1234!").is_ok());
        let msg = |p: &str| validate_password(p).unwrap_err().to_string();
        assert_eq!(msg("Ab1!"), "Password must be at least 8 characters long");
        assert_eq!(msg("test1234!"), "Password must contain at least one uppercase letter");
        assert_eq!(msg("TEST1234!"), "Password must contain at least one lowercase letter");
        assert_eq!(msg("Testtest!"), "Password must contain at least one number");
        assert_eq!(msg("Test12345"), "Password must contain at least one special character");
    }

    #[test]
    fn test_email_and_username() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_username("test_user.1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn test_phone_and_account_number() {
        assert!(validate_phone("+14155550123").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_account_number("1234567890").is_ok());
        assert!(validate_account_number("12345").is_err());
        assert!(validate_account_number("12345abc90").is_err());
    }

    #[test]
    fn test_amounts() {
        let max = Decimal::from(1_000);
        assert_eq!(
            validate_amount(Decimal::from_str("10.50").unwrap(), max, "Transaction").unwrap(),
            Decimal::from_str("10.5").unwrap()
        );
        assert!(validate_amount(Decimal::ZERO, max, "Transaction").is_err());
        assert!(validate_amount(Decimal::from(-5), max, "Transaction").is_err());
        assert!(validate_amount(Decimal::from(1_001), max, "Transaction").is_err());
        assert!(validate_amount(Decimal::from_str("1.005").unwrap(), max, "Transaction").is_err());
        // trailing zeros are not extra precision
        assert!(validate_amount(Decimal::from_str("1.500").unwrap(), max, "Transaction").is_ok());
    }

    #[test]
    fn test_dates() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            parse_date("29/02/2024").unwrap_err().to_string(),
            "Invalid date format. Use YYYY-MM-DD"
        );
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  Rent  ", "name", 10).unwrap(), "Rent");
        assert!(required_text("   ", "name", 10).is_err());
        assert!(required_text("abcdefghijk", "name", 10).is_err());
    }
}
