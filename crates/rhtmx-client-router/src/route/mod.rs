//! Route definitions, pattern compilation and matching
//!
//! - [`pattern`]: tokenizing and reverse filling of pattern text
//! - [`parser`]: compilation of tokens into a [`CompiledPattern`]
//! - [`matcher`]: running compiled patterns against URLs
//! - [`registry`]: bookkeeping of mounted routes

pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod registry;

use std::rc::Rc;

use once_cell::unsync::OnceCell;

pub use matcher::{match_pattern, MatchResult, ParentRoute, RouteParams, Tail, TailParams};
pub use parser::{compile, CompiledPattern, ParamKind, ParamSpec};
pub use pattern::{fill, tokenize, FilledPattern, PatternToken};
pub use registry::{RegisteredRoute, RouteId, RouteRegistry};

use crate::error::{RouterError, RouterResult};

/// Smallest allowed cache capacity
pub const MIN_CACHE_COUNT: usize = 1;

/// Clamps a cache capacity to at least [`MIN_CACHE_COUNT`]
pub fn clamp_cache_count(count: usize) -> usize {
    count.max(MIN_CACHE_COUNT)
}

/// One route: a pattern bound to the element it renders
///
/// The pattern is immutable once set. The id is assigned by the
/// [`RouteRegistry`] on first registration and kept across remounts.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::Route;
///
/// let route = Route::new()
///     .with_pattern("/users/:id")
///     .with_element("user-page")
///     .with_cache_count(3);
///
/// let result = route.match_url("/users/42", "/").unwrap();
/// assert_eq!(result.route_params["id"], Some("42".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Route {
    id: Option<RouteId>,
    pattern: Option<String>,
    compiled: OnceCell<Rc<CompiledPattern>>,
    parent_route: ParentRoute,
    element: Option<String>,
    append_to: Option<String>,
    cache_count: Option<usize>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pattern while building the route
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self.compiled = OnceCell::new();
        self
    }

    /// Sets the tag name of the element rendered for this route
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Sets the id of the container the element is appended to
    pub fn with_append_to(mut self, target: impl Into<String>) -> Self {
        self.append_to = Some(target.into());
        self
    }

    /// Sets the cache capacity, clamped to at least 1
    pub fn with_cache_count(mut self, count: usize) -> Self {
        self.cache_count = Some(clamp_cache_count(count));
        self
    }

    /// Sets the pattern of an existing route
    ///
    /// Fails with [`RouterError::PatternImmutable`] when a different pattern
    /// is already set.
    pub fn set_pattern(&mut self, pattern: impl Into<String>) -> RouterResult<()> {
        let pattern = pattern.into();
        match &self.pattern {
            Some(current) if *current != pattern => Err(RouterError::PatternImmutable {
                current: current.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.pattern = Some(pattern);
                Ok(())
            }
        }
    }

    pub fn id(&self) -> Option<&RouteId> {
        self.id.as_ref()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn append_to(&self) -> Option<&str> {
        self.append_to.as_deref()
    }

    /// Configured cache capacity, if any
    pub fn cache_count(&self) -> Option<usize> {
        self.cache_count
    }

    pub fn set_cache_count(&mut self, count: usize) {
        self.cache_count = Some(clamp_cache_count(count));
    }

    pub fn parent_route(&self) -> &ParentRoute {
        &self.parent_route
    }

    /// Updates the link to the parent's tail
    pub fn set_parent_route(&mut self, parent: ParentRoute) {
        self.parent_route = parent;
    }

    pub(crate) fn assign_id(&mut self, id: RouteId) {
        self.id = Some(id);
    }

    /// The compiled pattern, built on first use
    pub fn compiled(&self) -> RouterResult<Rc<CompiledPattern>> {
        let pattern = self.pattern.as_deref().ok_or(RouterError::MissingPattern)?;
        self.compiled
            .get_or_try_init(|| compile(pattern).map(Rc::new))
            .cloned()
    }

    /// Matches `url` against this route
    ///
    /// Top-level routes see `url` with `root` stripped; child routes see
    /// their parent's tail.
    pub fn match_url(&self, url: &str, root: &str) -> RouterResult<MatchResult> {
        Ok(self.compiled()?.match_under(&self.parent_route, url, root))
    }

    /// Human-readable label for diagnostics
    pub(crate) fn label(&self) -> String {
        match (&self.id, &self.pattern) {
            (Some(id), _) => id.to_string(),
            (None, Some(pattern)) => pattern.clone(),
            (None, None) => "<unnamed route>".to_string(),
        }
    }
}
