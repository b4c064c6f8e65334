//! Upstream account credentials.
//!
//! Credentials are supplied once at startup by configuration and are only
//! ever used to obtain a session token. They are never written to disk.

use std::fmt;

use zeroize::Zeroizing;

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Validated upstream account credentials.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` must be non-empty but keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use recipe_gateway::domain::Credential;
///
/// let creds = Credential::try_from_parts(" cook@example.com ", "secret").unwrap();
/// assert_eq!(creds.email(), "cook@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    email: String,
    password: Zeroizing<String>,
}

impl Credential {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(CredentialValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Account email used as the OAuth username.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Account password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialValidationError::EmptyEmail)]
    #[case("   ", "pw", CredentialValidationError::EmptyEmail)]
    #[case("cook@example.com", "", CredentialValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialValidationError,
    ) {
        let err =
            Credential::try_from_parts(email, password).expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  cook@example.com  ", "secret")]
    #[case("chef@example.com", " spaced password ")]
    fn valid_credentials_trim_email(#[case] email: &str, #[case] password: &str) {
        let creds =
            Credential::try_from_parts(email, password).expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = Credential::try_from_parts("cook@example.com", "hunter2").expect("valid");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("cook@example.com"));
    }
}
