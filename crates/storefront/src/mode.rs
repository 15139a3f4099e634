//! Mode selection and per-page-load context.
//!
//! The authentication signal is read once when the page loads and the derived
//! [`SessionMode`] is threaded through every reconciler call. Nothing in this
//! crate re-reads the signal mid-operation.

use keepsake_core::SessionMode;
use secrecy::{ExposeSecret, SecretString};

/// Page attribute value that marks an authenticated session.
const AUTHENTICATED_ATTRIBUTE: &str = "True";

/// Cookie carrying the anti-forgery token when no form field is present.
const CSRF_COOKIE: &str = "csrftoken";

const DEFAULT_LOGIN_PATH: &str = "/login/";

/// Server-supplied "is this session authenticated" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthSignal(bool);

impl AuthSignal {
    /// Wrap an already-resolved flag.
    #[must_use]
    pub const fn new(authenticated: bool) -> Self {
        Self(authenticated)
    }

    /// Read the flag from the page attribute value (`"True"` means authenticated).
    ///
    /// A missing attribute or any other value is a guest session.
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Self {
        Self(value == Some(AUTHENTICATED_ATTRIBUTE))
    }

    /// The raw flag.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        self.0
    }
}

/// Route a session to exactly one store.
#[must_use]
pub const fn select_mode(signal: AuthSignal) -> SessionMode {
    if signal.is_authenticated() {
        SessionMode::Authenticated
    } else {
        SessionMode::Guest
    }
}

/// Anti-forgery token attached to state-mutating remote requests.
#[derive(Clone)]
pub struct CsrfToken(SecretString);

impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CsrfToken([REDACTED])")
    }
}

impl CsrfToken {
    /// Wrap a token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Resolve the token from the page form field, falling back to the
    /// `csrftoken` cookie. Empty values are ignored.
    #[must_use]
    pub fn resolve(form_field: Option<&str>, cookie_header: Option<&str>) -> Option<Self> {
        form_field
            .filter(|v| !v.is_empty())
            .or_else(|| cookie_header.and_then(|h| cookie_value(h, CSRF_COOKIE)))
            .map(Self::new)
    }

    /// The token value for the request header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<SecretString> for CsrfToken {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

/// Find a non-empty cookie value in a `Cookie` header string.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Everything a reconciler needs to know about the current page.
///
/// Built once per page load; the mode inside never changes afterwards.
#[derive(Debug, Clone)]
pub struct PageContext {
    mode: SessionMode,
    path: String,
    login_path: String,
}

impl PageContext {
    /// Build the context for a page at `path`.
    #[must_use]
    pub fn new(signal: AuthSignal, path: impl Into<String>) -> Self {
        Self {
            mode: select_mode(signal),
            path: path.into(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Override the login entry point used for session-expiry redirects.
    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// The mode resolved at page load.
    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Current page path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the page is the cart-detail view.
    #[must_use]
    pub fn is_cart_view(&self) -> bool {
        self.path.contains("/cart/")
    }

    /// Whether the page is the wishlist-detail view.
    #[must_use]
    pub fn is_wishlist_view(&self) -> bool {
        self.path.contains("/wishlist/")
    }

    /// Login URL that returns to the current page afterwards.
    #[must_use]
    pub fn login_redirect(&self) -> String {
        format!(
            "{}?next={}",
            self.login_path,
            urlencoding::encode(&self.path)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_signal_from_attribute() {
        assert!(AuthSignal::from_attribute(Some("True")).is_authenticated());
        assert!(!AuthSignal::from_attribute(Some("False")).is_authenticated());
        assert!(!AuthSignal::from_attribute(Some("true")).is_authenticated());
        assert!(!AuthSignal::from_attribute(None).is_authenticated());
    }

    #[test]
    fn test_select_mode() {
        assert_eq!(
            select_mode(AuthSignal::new(true)),
            SessionMode::Authenticated
        );
        assert_eq!(select_mode(AuthSignal::new(false)), SessionMode::Guest);
    }

    #[test]
    fn test_csrf_prefers_form_field() {
        let token = CsrfToken::resolve(Some("from-form"), Some("csrftoken=from-cookie")).unwrap();
        assert_eq!(token.expose(), "from-form");
    }

    #[test]
    fn test_csrf_falls_back_to_cookie() {
        let token =
            CsrfToken::resolve(Some(""), Some("sessionid=abc; csrftoken=from-cookie; theme=dark"))
                .unwrap();
        assert_eq!(token.expose(), "from-cookie");
    }

    #[test]
    fn test_csrf_missing() {
        assert!(CsrfToken::resolve(None, Some("sessionid=abc")).is_none());
        assert!(CsrfToken::resolve(None, Some("csrftoken=")).is_none());
        assert!(CsrfToken::resolve(None, None).is_none());
    }

    #[test]
    fn test_csrf_debug_redacts() {
        let token = CsrfToken::new("hidden-value");
        assert!(!format!("{token:?}").contains("hidden-value"));
    }

    #[test]
    fn test_page_views() {
        let cart = PageContext::new(AuthSignal::new(false), "/cart/");
        assert!(cart.is_cart_view());
        assert!(!cart.is_wishlist_view());

        let wishlist = PageContext::new(AuthSignal::new(true), "/wishlist/");
        assert!(wishlist.is_wishlist_view());
        assert_eq!(wishlist.mode(), SessionMode::Authenticated);
    }

    #[test]
    fn test_login_redirect_preserves_path() {
        let page = PageContext::new(AuthSignal::new(true), "/product/pearl-ring/");
        assert_eq!(page.login_redirect(), "/login/?next=%2Fproduct%2Fpearl-ring%2F");

        let page = page.with_login_path("/accounts/login/");
        assert!(page.login_redirect().starts_with("/accounts/login/?next="));
    }
}
