//! Authentication domain types

mod jwt;
mod registration;
mod types;

pub use jwt::{TokenClaims, token_preview};
pub use registration::{PasswordReset, RegistrationField, RegistrationForm, ValidationErrors};
pub use types::{
    CredentialKey, ForgotPasswordRequest, LoginRequest, MessageResponse,
    ResendVerificationRequest, SocialProvider, TokenGrant, User,
};
