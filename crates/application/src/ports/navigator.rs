//! Navigation port

/// Port for sending the user to another route.
///
/// The client calls this when the session ends and the user has to sign in
/// again. Implementations must not block.
pub trait Navigator: Send + Sync {
    /// Navigates to `route` (for example `/login`).
    fn navigate(&self, route: &str);
}
