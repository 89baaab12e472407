//! Customer contact and delivery details.
//!
//! [`CustomerDraft`] holds whatever the customer has typed so far.
//! [`CustomerDraft::validate`] turns it into a [`CustomerInfo`], collecting
//! every field error at once instead of stopping at the first.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validation::{Field, FieldError};

/// Bangladeshi mobile numbers: optional `+88`/`88` prefix, then `01[3-9]` and
/// eight more digits.
static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+?88)?(01[3-9]\d{8})$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("`{0}` is not a valid mobile number (expected 01XXXXXXXXX)")]
    Invalid(String),
}

/// A validated mobile number in local `01XXXXXXXXX` form.
///
/// ```
/// use keepsake_core::customer::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+880 1712-345678").unwrap();
/// assert_eq!(phone.as_str(), "01712345678");
///
/// assert!(PhoneNumber::parse("01212345678").is_err()); // 012 is not a mobile prefix
/// assert!(PhoneNumber::parse("0171234567").is_err()); // too short
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a phone number, ignoring spaces and dashes.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input is empty or does not match the
    /// mobile-number pattern.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        MOBILE_PATTERN
            .captures(&compact)
            .and_then(|caps| caps.get(1))
            .map(|local| Self(local.as_str().to_string()))
            .ok_or_else(|| PhoneError::Invalid(input.trim().to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must look like name@domain")]
    Malformed,
}

/// A structurally valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an email address.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] if the address is too long or lacks a non-empty
    /// local part and domain around a single `@`.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer details as typed, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub district: String,
    pub thana: String,
}

/// Validated customer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<Email>,
    pub address: String,
    pub district: String,
    pub thana: String,
}

impl CustomerDraft {
    /// Validate the draft.
    ///
    /// Name, phone, and address are required. Email is optional but must be
    /// well-formed when given. District and thana are free text.
    ///
    /// # Errors
    ///
    /// Returns every [`FieldError`] found.
    pub fn validate(&self) -> Result<CustomerInfo, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::required(Field::CustomerName));
        }

        let phone = match PhoneNumber::parse(&self.phone) {
            Ok(phone) => Some(phone),
            Err(PhoneError::Empty) => {
                errors.push(FieldError::required(Field::Phone));
                None
            }
            Err(e) => {
                errors.push(FieldError::new(Field::Phone, e.to_string()));
                None
            }
        };

        let email = if self.email.trim().is_empty() {
            None
        } else {
            match Email::parse(&self.email) {
                Ok(email) => Some(email),
                Err(e) => {
                    errors.push(FieldError::new(Field::Email, e.to_string()));
                    None
                }
            }
        };

        let address = self.address.trim();
        if address.is_empty() {
            errors.push(FieldError::required(Field::Address));
        }

        match phone {
            Some(phone) if errors.is_empty() => Ok(CustomerInfo {
                name: name.to_string(),
                phone,
                email,
                address: address.to_string(),
                district: self.district.trim().to_string(),
                thana: self.thana.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn complete_draft() -> CustomerDraft {
        CustomerDraft {
            name: "Nusrat Jahan".to_string(),
            phone: "01712345678".to_string(),
            email: String::new(),
            address: "House 12, Road 5".to_string(),
            district: "Dhaka".to_string(),
            thana: "Dhanmondi".to_string(),
        }
    }

    #[rstest]
    #[case("01712345678", "01712345678")]
    #[case("+8801712345678", "01712345678")]
    #[case("8801912345678", "01912345678")]
    #[case("017-1234-5678", "01712345678")]
    #[case(" 01312345678 ", "01312345678")]
    fn test_phone_accepts(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(PhoneNumber::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("01212345678")]
    #[case("0171234567")]
    #[case("017123456789")]
    #[case("+1 555 123 4567")]
    #[case("phone")]
    fn test_phone_rejects(#[case] input: &str) {
        assert!(matches!(
            PhoneNumber::parse(input),
            Err(PhoneError::Invalid(_))
        ));
    }

    #[test]
    fn test_phone_empty() {
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_email_parse() {
        assert!(Email::parse("user@example.com").is_ok());
        assert_eq!(Email::parse("no-at-symbol"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::Malformed));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_validate_complete_draft() {
        let info = complete_draft().validate().unwrap();
        assert_eq!(info.name, "Nusrat Jahan");
        assert_eq!(info.phone.as_str(), "01712345678");
        assert!(info.email.is_none());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let draft = CustomerDraft {
            phone: "12345".to_string(),
            email: "broken".to_string(),
            ..CustomerDraft::default()
        };
        let errors = draft.validate().unwrap_err();
        let fields: Vec<&Field> = errors.iter().map(|e| &e.field).collect();
        assert_eq!(
            fields,
            vec![
                &Field::CustomerName,
                &Field::Phone,
                &Field::Email,
                &Field::Address
            ]
        );
    }

    #[test]
    fn test_invalid_phone_is_a_field_error_not_a_reset() {
        let draft = CustomerDraft {
            phone: "01012345678".to_string(),
            ..complete_draft()
        };
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::Phone);
        assert_eq!(draft.phone, "01012345678");
    }
}
