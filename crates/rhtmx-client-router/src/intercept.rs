//! Interception of in-app link clicks
//!
//! A document-wide click listener hands each click to
//! [`NavigationController::handle_click`](crate::NavigationController::handle_click).
//! The checks here decide whether the browser should follow the link
//! itself; only same-origin links to a path some route handles are turned
//! into history navigation.

use url::Url;

use crate::navigation::NavigationKind;

/// Primary (usually left) mouse button
pub const PRIMARY_BUTTON: i16 = 0;

/// The `<a>` element a click landed on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    /// Value of the `target` attribute, if present
    pub target: Option<String>,
    /// Whether the `download` attribute is present
    pub download: bool,
    /// Value of the `rel` attribute, if present
    pub rel: Option<String>,
    /// Whether the `replace-state` marker attribute is present
    pub replace_state: bool,
}

impl Anchor {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_download(mut self) -> Self {
        self.download = true;
        self
    }

    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    /// Marks the link to replace the current history entry
    pub fn replacing(mut self) -> Self {
        self.replace_state = true;
        self
    }

    fn is_external(&self) -> bool {
        self.rel
            .as_deref()
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("external")))
    }

    fn is_mailto(&self) -> bool {
        self.href
            .get(..7)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
    }
}

/// A click as seen by the document-level listener
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
    pub button: i16,
    pub meta_key: bool,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    /// The nearest anchor around the click target, if any
    pub anchor: Option<Anchor>,
    default_prevented: bool,
}

impl ClickEvent {
    /// A plain primary-button click on `anchor`
    pub fn on(anchor: Anchor) -> Self {
        Self {
            anchor: Some(anchor),
            ..Self::default()
        }
    }

    pub fn with_button(mut self, button: i16) -> Self {
        self.button = button;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta_key = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift_key = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt_key = true;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    fn has_modifier(&self) -> bool {
        self.meta_key || self.ctrl_key || self.shift_key || self.alt_key
    }
}

/// Why a click was left to the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    InterceptionDisabled,
    DefaultPrevented,
    NotPrimaryButton,
    ModifierKey,
    NoAnchor,
    TargetAttribute,
    Download,
    ExternalRel,
    Mailto,
    InvalidHref,
    CrossOrigin,
    NoMatchingRoute,
}

/// What [`handle_click`](crate::NavigationController::handle_click) did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The browser handles the click
    Ignored(IgnoreReason),
    /// Default was prevented and history was updated
    Navigated { url: String, kind: NavigationKind },
}

/// Applies the attribute and modifier rules to a click
///
/// Returns the anchor when nothing rules the click out.
pub fn screen_click(event: &ClickEvent) -> Result<&Anchor, IgnoreReason> {
    if event.default_prevented() {
        return Err(IgnoreReason::DefaultPrevented);
    }
    if event.button != PRIMARY_BUTTON {
        return Err(IgnoreReason::NotPrimaryButton);
    }
    if event.has_modifier() {
        return Err(IgnoreReason::ModifierKey);
    }

    let anchor = event.anchor.as_ref().ok_or(IgnoreReason::NoAnchor)?;
    if anchor.target.is_some() {
        return Err(IgnoreReason::TargetAttribute);
    }
    if anchor.download {
        return Err(IgnoreReason::Download);
    }
    if anchor.is_external() {
        return Err(IgnoreReason::ExternalRel);
    }
    if anchor.is_mailto() {
        return Err(IgnoreReason::Mailto);
    }
    Ok(anchor)
}

/// Resolves `href` against the current page and keeps it only if it stays
/// on the same origin
///
/// Returns the pathname plus search string of the target. The fragment is
/// dropped.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::intercept::resolve_same_origin;
///
/// let url = resolve_same_origin("../b?x=1", "https://example.com", "/docs/a/").unwrap();
/// assert_eq!(url, "/docs/b?x=1");
///
/// assert!(resolve_same_origin("https://other.org/", "https://example.com", "/").is_err());
/// ```
pub fn resolve_same_origin(href: &str, origin: &str, current: &str) -> Result<String, IgnoreReason> {
    let base = Url::parse(origin)
        .and_then(|origin| origin.join(current))
        .map_err(|_| IgnoreReason::InvalidHref)?;
    let target = base.join(href).map_err(|_| IgnoreReason::InvalidHref)?;

    if target.origin() != base.origin() {
        return Err(IgnoreReason::CrossOrigin);
    }

    Ok(match target.query() {
        Some(query) => format!("{}?{}", target.path(), query),
        None => target.path().to_string(),
    })
}
