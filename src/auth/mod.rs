//! Authentication state: cookies and login form handling.
//!
//! - [`CookieJar`] holds the session's cookies and computes persistence TTLs.
//! - [`LoginFormExtractor`] turns a login page into a [`LoginForm`].
//! - [`resolve_action_url`] finds where the login form posts to.

mod action_url;
mod cookies;
mod form;

pub use action_url::resolve_action_url;
pub use cookies::{Cookie, CookieError, CookieJar, JAR_FORMAT_VERSION};
pub use form::{DEFAULT_FORM_SELECTOR, LoginForm, LoginFormExtractor, SelectorError};
