//! Navigation controller
//!
//! Owns the root prefix, the route registry and the [`History`] seam, and
//! broadcasts a [`LocationChanged`] notification after every change of the
//! browser-visible URL. History is always updated before listeners run, so a
//! handler that navigates again sees the previous navigation completed.

pub mod history;

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;

use once_cell::unsync::OnceCell;
use serde::Serialize;
use tracing::debug;

pub use history::{History, MemoryHistory};

use crate::config::RouterConfig;
use crate::error::{RouterError, RouterResult};
use crate::intercept::{resolve_same_origin, screen_click, ClickEvent, ClickOutcome, IgnoreReason};
use crate::path::{merge_query, normalize_root, parse_query, split_search, to_query_string};
use crate::route::{MatchResult, Route, RouteRegistry};
use crate::signal::{Signal, Subscription};

/// How the URL came to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationKind {
    PushState,
    ReplaceState,
    PopState,
    PageLoad,
}

/// Notification sent after the browser-visible URL changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChanged {
    /// New pathname plus search string
    pub url: String,
    pub kind: NavigationKind,
    /// Element that asked for the navigation, if any
    pub source: Option<String>,
}

impl LocationChanged {
    /// The event payload with one flag per navigation kind
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_client_router::navigation::{LocationChanged, NavigationKind};
    ///
    /// let event = LocationChanged {
    ///     url: "/users".to_string(),
    ///     kind: NavigationKind::PopState,
    ///     source: None,
    /// };
    /// let json = event.detail().to_json().unwrap();
    /// assert_eq!(json["popState"], true);
    /// assert_eq!(json["pushState"], false);
    /// assert!(json.get("sourceElement").is_none());
    /// ```
    pub fn detail(&self) -> LocationDetail {
        LocationDetail {
            source_element: self.source.clone(),
            push_state: self.kind == NavigationKind::PushState,
            replace_state: self.kind == NavigationKind::ReplaceState,
            pop_state: self.kind == NavigationKind::PopState,
            page_load: self.kind == NavigationKind::PageLoad,
        }
    }
}

/// Serializable detail of a location-changed event. Exactly one flag is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_element: Option<String>,
    pub push_state: bool,
    pub replace_state: bool,
    pub pop_state: bool,
    pub page_load: bool,
}

impl LocationDetail {
    /// The payload as a JSON object, for hosts that dispatch it as a DOM event
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Shared navigation state of one page
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::{MemoryHistory, NavigationController};
///
/// let nav = NavigationController::new(MemoryHistory::new("/"));
/// nav.set_root("/app").unwrap();
/// assert!(nav.set_root("/other").is_err());
///
/// nav.push_url("/app/users?page=2", None);
/// assert_eq!(nav.current_url(), "/app/users?page=2");
/// ```
pub struct NavigationController {
    history: RefCell<Box<dyn History>>,
    root: OnceCell<String>,
    registry: RefCell<RouteRegistry>,
    location_changed: Signal<LocationChanged>,
    intercept_links: Cell<bool>,
}

impl NavigationController {
    pub fn new(history: impl History + 'static) -> Self {
        Self {
            history: RefCell::new(Box::new(history)),
            root: OnceCell::new(),
            registry: RefCell::new(RouteRegistry::new()),
            location_changed: Signal::new(),
            intercept_links: Cell::new(true),
        }
    }

    /// Creates a controller and applies the root prefix and link
    /// interception switch from `config`
    pub fn from_config(history: impl History + 'static, config: &RouterConfig) -> RouterResult<Self> {
        let controller = Self::new(history);
        if let Some(root) = &config.root {
            controller.set_root(root)?;
        }
        controller.set_intercept_links(config.intercept_links);
        Ok(controller)
    }

    /// Sets the root prefix. It can be set only once.
    pub fn set_root(&self, root: &str) -> RouterResult<()> {
        let normalized = normalize_root(root);
        self.root.set(normalized).map_err(|_| RouterError::RootAlreadySet {
            current: self.root().to_string(),
        })?;
        debug!(root = self.root(), "root prefix set");
        Ok(())
    }

    /// The root prefix, `/` until one is set
    pub fn root(&self) -> &str {
        self.root.get().map(String::as_str).unwrap_or("/")
    }

    /// Current pathname plus search string
    pub fn current_url(&self) -> String {
        self.history.borrow().location()
    }

    pub fn origin(&self) -> String {
        self.history.borrow().origin()
    }

    pub fn push_url(&self, url: &str, source: Option<&str>) {
        self.history.borrow_mut().push_state(url);
        self.notify(NavigationKind::PushState, source);
    }

    pub fn replace_url(&self, url: &str, source: Option<&str>) {
        self.history.borrow_mut().replace_state(url);
        self.notify(NavigationKind::ReplaceState, source);
    }

    /// Merges query parameters into the current URL
    ///
    /// `Some(value)` sets a parameter and `None` deletes it. History is
    /// replaced only when the resulting parameters differ from the current
    /// ones. Returns whether the URL changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_client_router::{MemoryHistory, NavigationController};
    ///
    /// let nav = NavigationController::new(MemoryHistory::new("/list?page=1&sort=name"));
    /// assert!(nav.replace_url_params(&[("page", Some("2")), ("sort", None)]));
    /// assert_eq!(nav.current_url(), "/list?page=2");
    ///
    /// assert!(!nav.replace_url_params(&[("page", Some("2"))]));
    /// ```
    pub fn replace_url_params<K, V>(&self, updates: &[(K, Option<V>)]) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let current = self.current_url();
        let (path, search) = split_search(&current);
        let current_params = parse_query(search);
        let merged = merge_query(&current_params, updates);

        if merged == current_params {
            return false;
        }

        let url = if merged.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, to_query_string(&merged))
        };
        if url == current {
            return false;
        }

        self.replace_url(&url, None);
        true
    }

    /// Pushes (or replaces) a link-style href, resolved against the current URL
    ///
    /// Fails with [`RouterError::InvalidUrl`] when the href cannot be parsed
    /// or points at another origin. Returns the resolved pathname plus search.
    pub fn navigate_href(&self, href: &str, replace: bool) -> RouterResult<String> {
        let url = resolve_same_origin(href, &self.origin(), &self.current_url()).map_err(|reason| {
            RouterError::InvalidUrl {
                url: href.to_string(),
                reason: match reason {
                    IgnoreReason::CrossOrigin => "points at another origin".to_string(),
                    other => format!("{:?}", other),
                },
            }
        })?;

        if replace {
            self.replace_url(&url, None);
        } else {
            self.push_url(&url, None);
        }
        Ok(url)
    }

    /// Broadcasts a browser back/forward navigation
    pub fn handle_pop_state(&self) {
        self.notify(NavigationKind::PopState, None);
    }

    /// Broadcasts the initial page load
    pub fn handle_page_load(&self) {
        self.notify(NavigationKind::PageLoad, None);
    }

    /// Steps back in history. Returns false when there was nothing to go back to.
    pub fn go_back(&self) -> bool {
        let moved = self.history.borrow_mut().back();
        if moved {
            self.handle_pop_state();
        }
        moved
    }

    /// Steps forward in history. Returns false at the newest entry.
    pub fn go_forward(&self) -> bool {
        let moved = self.history.borrow_mut().forward();
        if moved {
            self.handle_pop_state();
        }
        moved
    }

    /// Handles a document-level click
    ///
    /// Same-origin links whose path some registered route matches are turned
    /// into a push (or a replace, for anchors marked `replace-state`) and the
    /// event's default is prevented. Everything else is left to the browser.
    pub fn handle_click(&self, event: &mut ClickEvent) -> ClickOutcome {
        match self.intercept(event) {
            Ok((url, kind)) => {
                event.prevent_default();
                match kind {
                    NavigationKind::ReplaceState => self.replace_url(&url, None),
                    _ => self.push_url(&url, None),
                }
                ClickOutcome::Navigated { url, kind }
            }
            Err(reason) => {
                debug!(?reason, "link click left to the browser");
                ClickOutcome::Ignored(reason)
            }
        }
    }

    fn intercept(&self, event: &ClickEvent) -> Result<(String, NavigationKind), IgnoreReason> {
        if !self.intercepts_links() {
            return Err(IgnoreReason::InterceptionDisabled);
        }

        let anchor = screen_click(event)?;
        let url = resolve_same_origin(&anchor.href, &self.origin(), &self.current_url())?;
        if !self.registry.borrow().handles(&url, self.root()) {
            return Err(IgnoreReason::NoMatchingRoute);
        }

        let kind = if anchor.replace_state {
            NavigationKind::ReplaceState
        } else {
            NavigationKind::PushState
        };
        Ok((url, kind))
    }

    pub fn intercepts_links(&self) -> bool {
        self.intercept_links.get()
    }

    pub fn set_intercept_links(&self, enabled: bool) {
        self.intercept_links.set(enabled);
    }

    /// Matches `route` against the current URL
    pub fn match_route(&self, route: &Route) -> RouterResult<MatchResult> {
        let url = self.current_url();
        self.registry.borrow().match_route(route, &url, self.root())
    }

    pub fn registry(&self) -> Ref<'_, RouteRegistry> {
        self.registry.borrow()
    }

    pub fn registry_mut(&self) -> RefMut<'_, RouteRegistry> {
        self.registry.borrow_mut()
    }

    /// Listens for location changes
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_location_changed(&self, listener: impl Fn(&LocationChanged) + 'static) -> Subscription {
        self.location_changed.subscribe(listener)
    }

    fn notify(&self, kind: NavigationKind, source: Option<&str>) {
        let event = LocationChanged {
            url: self.current_url(),
            kind,
            source: source.map(str::to_string),
        };
        debug!(url = %event.url, ?kind, "location changed");
        self.location_changed.emit(&event);
    }
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("root", &self.root())
            .field("url", &self.current_url())
            .field("routes", &self.registry.borrow().len())
            .field("intercept_links", &self.intercepts_links())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder(nav: &NavigationController) -> (Rc<RefCell<Vec<LocationChanged>>>, Subscription) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sub = {
            let events = events.clone();
            nav.on_location_changed(move |e| events.borrow_mut().push(e.clone()))
        };
        (events, sub)
    }

    #[test]
    fn test_push_then_notify() {
        let nav = NavigationController::new(MemoryHistory::new("/"));
        let (events, _sub) = recorder(&nav);

        nav.push_url("/a", Some("nav-link"));
        nav.replace_url("/b", None);

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].url, "/a");
        assert_eq!(events[0].kind, NavigationKind::PushState);
        assert_eq!(events[0].source.as_deref(), Some("nav-link"));
        assert_eq!(events[1].kind, NavigationKind::ReplaceState);
    }

    #[test]
    fn test_exactly_one_flag_per_detail() {
        for kind in [
            NavigationKind::PushState,
            NavigationKind::ReplaceState,
            NavigationKind::PopState,
            NavigationKind::PageLoad,
        ] {
            let detail = LocationChanged {
                url: "/".to_string(),
                kind,
                source: None,
            }
            .detail();
            let flags = [detail.push_state, detail.replace_state, detail.pop_state, detail.page_load];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        }
    }

    #[test]
    fn test_detail_json_names_source() {
        let json = LocationChanged {
            url: "/a".to_string(),
            kind: NavigationKind::PushState,
            source: Some("3:/a".to_string()),
        }
        .detail()
        .to_json()
        .unwrap();
        assert_eq!(json["sourceElement"], "3:/a");
        assert_eq!(json["pushState"], true);
    }

    #[test]
    fn test_root_set_twice_fails() {
        let nav = NavigationController::new(MemoryHistory::default());
        assert_eq!(nav.root(), "/");
        nav.set_root("app/").unwrap();
        assert_eq!(
            nav.set_root("/app"),
            Err(RouterError::RootAlreadySet {
                current: "/app".to_string()
            })
        );
    }

    #[test]
    fn test_replace_url_params_without_change_is_silent() {
        let nav = NavigationController::new(MemoryHistory::new("/list?a=1"));
        let (events, _sub) = recorder(&nav);

        assert!(!nav.replace_url_params(&[("a", Some("1"))]));
        assert!(!nav.replace_url_params::<_, &str>(&[("missing", None)]));
        assert!(events.borrow().is_empty());

        assert!(nav.replace_url_params::<_, &str>(&[("a", None)]));
        assert_eq!(nav.current_url(), "/list");
    }

    #[test]
    fn test_navigate_href_resolves_relative() {
        let nav = NavigationController::new(MemoryHistory::new("/docs/intro"));
        assert_eq!(nav.navigate_href("setup?x=1", false).unwrap(), "/docs/setup?x=1");
        assert_eq!(nav.current_url(), "/docs/setup?x=1");

        assert!(matches!(
            nav.navigate_href("https://elsewhere.org/", false),
            Err(RouterError::InvalidUrl { .. })
        ));
        assert_eq!(nav.current_url(), "/docs/setup?x=1");
    }

    #[test]
    fn test_go_back_emits_pop_state() {
        let nav = NavigationController::new(MemoryHistory::new("/"));
        nav.push_url("/a", None);
        let (events, _sub) = recorder(&nav);

        assert!(nav.go_back());
        assert!(!nav.go_back());
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(events.borrow()[0].kind, NavigationKind::PopState);
        assert_eq!(events.borrow()[0].url, "/");
    }

    #[test]
    fn test_reentrant_navigation_sees_completed_history() {
        let nav = Rc::new(NavigationController::new(MemoryHistory::new("/")));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let _sub = {
            let weak = Rc::downgrade(&nav);
            let seen = seen.clone();
            nav.on_location_changed(move |event| {
                let Some(nav) = weak.upgrade() else { return };
                seen.borrow_mut().push(nav.current_url());
                if event.url == "/login" {
                    nav.replace_url("/home", None);
                }
            })
        };

        nav.push_url("/login", None);
        assert_eq!(*seen.borrow(), vec!["/login".to_string(), "/home".to_string()]);
    }
}
