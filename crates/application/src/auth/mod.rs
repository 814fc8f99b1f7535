//! Session authentication for the API client.
//!
//! This module provides:
//! - Cookie-backed credential access
//! - The request decorator and response interceptor
//! - The single-flight refresh coordinator
//! - Login, logout and registration flows

mod coordinator;
mod credentials;
mod decorator;
mod interceptor;
mod session;

pub use coordinator::RefreshCoordinator;
pub use credentials::SessionCredentials;
pub use decorator::RequestDecorator;
pub use interceptor::{Disposition, ResponseInterceptor};
pub use session::{
    FORGOT_PASSWORD_PATH, LOGIN_PATH, LOGOUT_PATH, OAUTH_PATH, REGISTER_PATH,
    RESEND_VERIFICATION_PATH, RESET_PASSWORD_PATH, SessionService, VERIFY_EMAIL_PATH,
};
