//! Recipient address for outbound notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation failures for [`EmailAddress`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailValidationError {
    #[error("email address must not be empty")]
    Empty,
    #[error("email address must contain exactly one '@' separating local and domain parts")]
    Malformed,
}

/// Loosely validated email address.
///
/// Deliverability is the mail relay's concern; this type only rules out
/// values that can never be addresses.
///
/// # Examples
/// ```
/// use engagement::domain::EmailAddress;
///
/// assert!(EmailAddress::new("ada@example.com").is_ok());
/// assert!(EmailAddress::new("ada@@example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(raw: impl Into<String>) -> Result<Self, EmailValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmailValidationError::Empty);
        }
        let mut parts = raw.split('@');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None)
                if !local.is_empty() && !domain.is_empty() && !raw.contains(char::is_whitespace)
        );
        if !well_formed {
            return Err(EmailValidationError::Malformed);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
