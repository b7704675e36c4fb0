//! Resolution of a login form's `action` attribute against the login URL.
//!
//! Only the forms seen on login pages are handled: absent, absolute,
//! origin-relative (`/path`) and directory-relative (`path`) actions.
//! `..` segments and protocol-relative (`//host`) actions are not normalised.

use url::Url;

/// Resolves `action` against `login_url`.
///
/// - absent or empty: `login_url` unchanged
/// - absolute `http`/`https` URL: returned as is
/// - starts with `/`: origin of `login_url` followed by `action`
/// - otherwise: directory of `login_url` (query and fragment dropped, path cut
///   after its final `/`) followed by `action`
///
/// # Errors
///
/// Returns [`url::ParseError`] if `login_url` is not an absolute URL.
pub fn resolve_action_url(login_url: &str, action: Option<&str>) -> Result<String, url::ParseError> {
    let base = Url::parse(login_url)?;

    let Some(action) = action.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(login_url.to_string());
    };

    if let Ok(absolute) = Url::parse(action)
        && matches!(absolute.scheme(), "http" | "https")
    {
        return Ok(action.to_string());
    }

    if action.starts_with('/') {
        return Ok(format!("{}{action}", base.origin().ascii_serialization()));
    }

    let mut directory = base;
    directory.set_query(None);
    directory.set_fragment(None);
    let path = directory.path();
    let cut = path.rfind('/').map_or(0, |i| i + 1);
    let dir_path = path[..cut].to_string();
    directory.set_path(&dir_path);

    Ok(format!("{directory}{action}"))
}
