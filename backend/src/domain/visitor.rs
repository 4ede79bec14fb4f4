//! Visitor identity used by the booking flow.
//!
//! Registered visitors are referenced by [`VisitorId`]. Unauthenticated callers
//! supply a [`GuestContact`]; the repository reuses the visitor row with the
//! same email or creates one with an unusable [`GuestPasswordPlaceholder`].

use std::fmt;
use std::sync::OnceLock;

use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::VisitorId;

/// Prefix marking a password hash that can never verify.
pub const GUEST_PASSWORD_PREFIX: &str = "!guest$";

/// Validation failures for guest contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestValidationError {
    /// Guest name was missing or blank.
    MissingName,
    /// Guest email was missing or blank.
    MissingEmail,
    /// Email does not look like `local@domain`.
    InvalidEmail,
}

impl fmt::Display for GuestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "guest name is required when no visitor is signed in"),
            Self::MissingEmail => {
                write!(f, "guest email is required when no visitor is signed in")
            }
            Self::InvalidEmail => write!(f, "email address is not valid"),
        }
    }
}

impl std::error::Error for GuestValidationError {}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Lower-cased, trimmed email address used as the visitor's natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Normalise and validate an email address.
    ///
    /// # Examples
    /// ```
    /// use heritage_backend::domain::Email;
    ///
    /// let email = Email::parse("  Rahim@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_str(), "rahim@example.com");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, GuestValidationError> {
        let normalised = raw.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(GuestValidationError::MissingEmail);
        }
        if !email_regex().is_match(&normalised) {
            return Err(GuestValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact details for a visitor booking without a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestContact {
    name: String,
    email: Email,
    phone: Option<String>,
}

impl GuestContact {
    /// Build guest details from optional raw form fields.
    pub fn try_from_parts(
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Self, GuestValidationError> {
        let name = name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(GuestValidationError::MissingName)?;
        let email = email
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(GuestValidationError::MissingEmail)
            .and_then(Email::parse)?;
        let phone = phone
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        Ok(Self {
            name: name.to_owned(),
            email,
            phone,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// Who the booking is made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitorRef {
    /// A visitor resolved from the caller's session or an explicit id.
    Known(VisitorId),
    /// An unauthenticated guest identified by email.
    Guest(GuestContact),
}

/// Password hash stored for guest visitors.
///
/// The value is `!guest$` followed by the hex SHA-256 of 32 random bytes. No
/// password hashing scheme produces a leading `!`, so guest rows cannot be
/// used to sign in until the visitor registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestPasswordPlaceholder(String);

impl GuestPasswordPlaceholder {
    /// Generate a fresh placeholder from operating-system randomness.
    pub fn generate() -> Self {
        let mut seed = Zeroizing::new([0_u8; 32]);
        rand::rngs::OsRng.fill_bytes(seed.as_mut());
        let digest = Sha256::digest(seed.as_ref());
        Self(format!("{GUEST_PASSWORD_PREFIX}{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a stored hash is a guest placeholder.
    pub fn is_placeholder(hash: &str) -> bool {
        hash.starts_with(GUEST_PASSWORD_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some("a@b.io"), GuestValidationError::MissingName)]
    #[case(Some("   "), Some("a@b.io"), GuestValidationError::MissingName)]
    #[case(Some("Rahim"), None, GuestValidationError::MissingEmail)]
    #[case(Some("Rahim"), Some("  "), GuestValidationError::MissingEmail)]
    #[case(Some("Rahim"), Some("not-an-email"), GuestValidationError::InvalidEmail)]
    fn rejects_incomplete_guest_details(
        #[case] name: Option<&str>,
        #[case] email: Option<&str>,
        #[case] expected: GuestValidationError,
    ) {
        let err = GuestContact::try_from_parts(name, email, None).expect_err("invalid guest");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn normalises_guest_details() {
        let guest = GuestContact::try_from_parts(
            Some("  Rahim Uddin "),
            Some(" RAHIM@Example.com"),
            Some("  "),
        )
        .expect("valid guest");

        assert_eq!(guest.name(), "Rahim Uddin");
        assert_eq!(guest.email().as_str(), "rahim@example.com");
        assert_eq!(guest.phone(), None);
    }

    #[rstest]
    fn placeholders_are_unique_and_marked() {
        let first = GuestPasswordPlaceholder::generate();
        let second = GuestPasswordPlaceholder::generate();

        assert_ne!(first, second);
        assert!(GuestPasswordPlaceholder::is_placeholder(first.as_str()));
        assert_eq!(first.as_str().len(), GUEST_PASSWORD_PREFIX.len() + 64);
        assert!(!GuestPasswordPlaceholder::is_placeholder("$argon2id$v=19$..."));
    }
}
