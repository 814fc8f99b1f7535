//! Navigator for non-interactive front ends.

use cogni_application::ports::Navigator;
use parking_lot::Mutex;

/// Records the requested route and logs it.
///
/// A terminal has no router, so the CLI reads [`last_route`](Self::last_route)
/// after a command and tells the user to sign in again.
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    last: Mutex<Option<String>>,
}

impl LoggingNavigator {
    /// Creates a navigator with no recorded route.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent route requested, if any.
    #[must_use]
    pub fn last_route(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "Redirect requested");
        *self.last.lock() = Some(route.to_string());
    }
}
