//! Bookkeeping of mounted routes

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use super::matcher::MatchResult;
use super::parser::CompiledPattern;
use super::Route;
use crate::error::RouterResult;
use crate::path::strip_root;

/// Process-wide sequence for route ids, never reused
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Diagnostic route identifier of the form `{sequence}:{pattern}`
///
/// Ids only name routes for logs and tooling; matching never looks at them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    fn next(pattern: &str) -> Self {
        let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        RouteId(format!("{}:{}", sequence, pattern))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sequence number part of the id
    pub fn sequence(&self) -> u64 {
        self.0
            .split_once(':')
            .and_then(|(seq, _)| seq.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registry entry
#[derive(Debug, Clone)]
pub struct RegisteredRoute {
    pub id: RouteId,
    pub pattern: String,
    compiled: Rc<CompiledPattern>,
}

impl RegisteredRoute {
    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }
}

/// All currently mounted routes, in registration order
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: HashMap<RouteId, RegisteredRoute>,
    order: Vec<RouteId>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route, assigning an id on its first registration
    ///
    /// A route that already carries an id (a remount) keeps it. The pattern
    /// is compiled here, so an invalid pattern fails before any id is spent.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_client_router::{Route, RouteRegistry};
    ///
    /// let mut registry = RouteRegistry::new();
    /// let mut route = Route::new().with_pattern("/users/:id");
    ///
    /// let id = registry.add_route(&mut route).unwrap();
    /// assert!(id.as_str().ends_with(":/users/:id"));
    /// assert_eq!(route.id(), Some(&id));
    /// ```
    pub fn add_route(&mut self, route: &mut Route) -> RouterResult<RouteId> {
        let compiled = route.compiled()?;

        let id = match route.id().cloned() {
            Some(id) => id,
            None => {
                let id = RouteId::next(compiled.pattern());
                route.assign_id(id.clone());
                id
            }
        };

        if !self.routes.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.routes.insert(
            id.clone(),
            RegisteredRoute {
                id: id.clone(),
                pattern: compiled.pattern().to_string(),
                compiled,
            },
        );

        debug!(route_id = %id, "route registered");
        Ok(id)
    }

    /// Unregisters a route. Returns whether it was registered.
    pub fn remove_route(&mut self, route: &Route) -> bool {
        let Some(id) = route.id() else {
            return false;
        };

        let removed = self.routes.remove(id).is_some();
        if removed {
            self.order.retain(|other| other != id);
            debug!(route_id = %id, "route unregistered");
        }
        removed
    }

    /// Matches a route against `url`
    pub fn match_route(&self, route: &Route, url: &str, root: &str) -> RouterResult<MatchResult> {
        route.match_url(url, root)
    }

    /// Whether any registered pattern matches `url`
    ///
    /// Every pattern is tested against the root-relative URL, nested ones
    /// included.
    pub fn handles(&self, url: &str, root: &str) -> bool {
        let path = strip_root(url, root);
        self.iter()
            .any(|entry| entry.compiled.match_path(&path).matches)
    }

    pub fn get(&self, id: &RouteId) -> Option<&RegisteredRoute> {
        self.routes.get(id)
    }

    pub fn contains(&self, id: &RouteId) -> bool {
        self.routes.contains_key(id)
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredRoute> {
        self.order.iter().filter_map(|id| self.routes.get(id))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
