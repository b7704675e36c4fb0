//! Login form discovery in HTML pages.
//!
//! [`LoginFormExtractor`] locates the login form with a CSS selector and
//! collects `name -> value` pairs from its input controls. Submit and button
//! controls are only kept when they are the single such control or when their
//! name mentions "login", so secondary buttons (e.g. "clear form") are not
//! submitted together with the credentials.

use std::collections::BTreeMap;

use reqwest::Method;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::request::FormValue;

/// Selector used when none is configured for the login form.
pub const DEFAULT_FORM_SELECTOR: &str = "form";

/// Selector applied inside the located form when no input selector is configured.
const DEFAULT_INPUT_SELECTOR: &str = "input";

/// A CSS selector that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CSS selector '{selector}': {message}")]
pub struct SelectorError {
    /// The selector text.
    pub selector: String,
    /// Parser diagnostic.
    pub message: String,
}

fn parse_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Structured description of a login form.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Raw `action` attribute, if present.
    pub action: Option<String>,
    /// Declared method, `GET` when absent or unrecognised.
    pub method: Method,
    /// Scraped field values keyed by control name.
    pub fields: BTreeMap<String, FormValue>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            action: None,
            method: Method::GET,
            fields: BTreeMap::new(),
        }
    }
}

// Field values may carry pre-filled tokens; FormValue's Debug redacts them.
impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("action", &self.action)
            .field("method", &self.method)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Extracts [`LoginForm`]s from HTML using pre-parsed selectors.
#[derive(Debug)]
pub struct LoginFormExtractor {
    form_selector: Selector,
    input_selector: Option<Selector>,
    default_input_selector: Selector,
}

impl LoginFormExtractor {
    /// Parses the form selector and the optional input selector.
    ///
    /// A configured input selector is matched against the whole document;
    /// without one, `input` elements inside the located form are used.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if either selector is not valid CSS.
    pub fn new(form_selector: &str, input_selector: Option<&str>) -> Result<Self, SelectorError> {
        Ok(Self {
            form_selector: parse_selector(form_selector)?,
            input_selector: input_selector.map(parse_selector).transpose()?,
            default_input_selector: parse_selector(DEFAULT_INPUT_SELECTOR)?,
        })
    }

    /// Parses `html` and describes its login form.
    ///
    /// A page without a matching form yields an empty [`LoginForm`] whose
    /// action is absent, so the credentials are posted back to the login URL.
    #[must_use]
    pub fn extract(&self, html: &str) -> LoginForm {
        let document = Html::parse_document(html);
        let form_element = document.select(&self.form_selector).next();

        let mut form = LoginForm::default();
        if let Some(element) = form_element {
            form.action = element.value().attr("action").map(str::to_string);
            form.method = element
                .value()
                .attr("method")
                .map_or(Method::GET, parse_method);
        } else {
            warn!("no login form matched the configured selector");
        }

        let controls: Vec<ElementRef<'_>> = match (&self.input_selector, form_element) {
            (Some(selector), _) => document.select(selector).collect(),
            (None, Some(element)) => element.select(&self.default_input_selector).collect(),
            (None, None) => Vec::new(),
        };

        // Buttons are counted within the located form, even when the input
        // selector reaches outside it.
        let in_form = |control: &ElementRef<'_>| {
            form_element.is_none_or(|f| control.ancestors().any(|a| a.id() == f.id()))
        };
        let button_count = controls
            .iter()
            .filter(|c| is_button(c) && in_form(c))
            .count();

        for control in controls {
            let Some(name) = control.value().attr("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let sole_button = button_count == 1 && in_form(&control);
            if is_button(&control) && !sole_button && !name.to_ascii_lowercase().contains("login") {
                debug!(name, "skipping secondary button");
                continue;
            }
            let value = control.value().attr("value").unwrap_or_default();
            form.fields.insert(name.to_string(), FormValue::from(value));
        }

        debug!(
            action = ?form.action,
            method = %form.method,
            field_count = form.fields.len(),
            "extracted login form"
        );
        form
    }
}

fn is_button(control: &ElementRef<'_>) -> bool {
    control
        .value()
        .attr("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("submit") || t.eq_ignore_ascii_case("button"))
}

fn parse_method(raw: &str) -> Method {
    let upper = raw.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Method::GET;
    }
    Method::from_bytes(upper.as_bytes()).unwrap_or_else(|_| {
        debug!(method = raw, "unrecognised form method, using GET");
        Method::GET
    })
}
