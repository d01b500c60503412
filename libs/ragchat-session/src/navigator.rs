/// Receiver of the session-ended signal.
///
/// The gateway calls [`redirect_to_login`](Navigator::redirect_to_login) when
/// recovery fails and local credentials have been cleared. What "redirect"
/// means is up to the host application (swap a view, print a message, exit).
pub trait Navigator: Send + Sync {
    /// Current location of the user, as a path-like string
    fn current_path(&self) -> String;

    /// Send the user to the login surface
    fn redirect_to_login(&self);
}

/// Navigator that does nothing, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        String::new()
    }

    fn redirect_to_login(&self) {}
}

/// Redirect to login unless the user is already on an auth page.
///
/// Suppressing the redirect on paths containing `login` or `register` keeps
/// the signal idempotent: a failed background request while the user is
/// already signing in must not bounce them around.
pub fn redirect_unless_on_auth_page(navigator: &dyn Navigator) {
    let path = navigator.current_path();
    if path.contains("login") || path.contains("register") {
        tracing::debug!(%path, "session ended on an auth page; redirect suppressed");
        return;
    }
    tracing::warn!(%path, "session ended; redirecting to login");
    navigator.redirect_to_login();
}
