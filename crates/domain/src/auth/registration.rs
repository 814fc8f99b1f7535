//! Sign-up form and its client-side validation rules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[allow(clippy::expect_used)]
static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid regex"));

#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// Fields of the sign-up form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistrationField {
    /// Given name.
    FirstName,
    /// Family name.
    LastName,
    /// Public handle.
    Username,
    /// Contact email.
    Email,
    /// Password.
    Password,
    /// Password repeated.
    ConfirmPassword,
}

impl RegistrationField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
        }
    }
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failing field with its message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<RegistrationField, &'static str>,
}

impl ValidationErrors {
    fn add(&mut self, field: RegistrationField, message: &'static str) {
        self.fields.insert(field, message);
    }

    /// Message for one field, if it failed.
    #[must_use]
    pub fn get(&self, field: RegistrationField) -> Option<&'static str> {
        self.fields.get(&field).copied()
    }

    /// Iterates failing fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (RegistrationField, &'static str)> + '_ {
        self.fields.iter().map(|(field, message)| (*field, *message))
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when the form is valid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Sign-up form as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationForm {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Public handle.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password repeated; never sent to the server.
    #[serde(skip)]
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Checks every field and reports all failures at once.
    ///
    /// # Errors
    ///
    /// Returns the failing fields when any rule is violated.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_name(
            &mut errors,
            RegistrationField::FirstName,
            &self.first_name,
            "First name is required",
            "First name must be at least 2 characters",
        );
        check_name(
            &mut errors,
            RegistrationField::LastName,
            &self.last_name,
            "Last name is required",
            "Last name must be at least 2 characters",
        );

        if self.username.trim().is_empty() {
            errors.add(RegistrationField::Username, "Username is required");
        } else if self.username.chars().count() < 3 {
            errors.add(
                RegistrationField::Username,
                "Username must be at least 3 characters",
            );
        } else if !USERNAME_PATTERN.is_match(&self.username) {
            errors.add(
                RegistrationField::Username,
                "Username can only contain letters, numbers, and underscores",
            );
        }

        if self.email.trim().is_empty() {
            errors.add(RegistrationField::Email, "Email is required");
        } else if !EMAIL_PATTERN.is_match(&self.email) {
            errors.add(RegistrationField::Email, "Please enter a valid email address");
        }

        if self.password.is_empty() {
            errors.add(RegistrationField::Password, "Password is required");
        } else if !password_is_strong(&self.password) {
            errors.add(
                RegistrationField::Password,
                "Password must meet all requirements",
            );
        }

        if self.confirm_password.is_empty() {
            errors.add(
                RegistrationField::ConfirmPassword,
                "Please confirm your password",
            );
        } else if self.password != self.confirm_password {
            errors.add(RegistrationField::ConfirmPassword, "Passwords do not match");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// New password chosen from a reset link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PasswordReset {
    /// New password.
    pub password: String,
    /// New password repeated; the server checks it too.
    pub confirm_password: String,
}

impl PasswordReset {
    /// Checks that both entries match. Strength rules are left to the server.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationField::ConfirmPassword`] when the entries differ.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.password != self.confirm_password {
            errors.add(RegistrationField::ConfirmPassword, "Passwords do not match");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn check_name(
    errors: &mut ValidationErrors,
    field: RegistrationField,
    value: &str,
    missing: &'static str,
    too_short: &'static str,
) {
    if value.trim().is_empty() {
        errors.add(field, missing);
    } else if value.chars().count() < 2 {
        errors.add(field, too_short);
    }
}

fn password_is_strong(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}
