//! Per-route cache of rendered elements
//!
//! Each mounted route keeps the elements it created, most recently activated
//! first, keyed by the named params they were created for. Coming back to a
//! param set that is still cached reuses the same element instead of
//! building a new one.

use std::collections::VecDeque;

use tracing::debug;

use crate::route::{clamp_cache_count, MatchResult, RouteParams, Tail, TailParams};

/// A rendered route element
///
/// Implementations are cheap handles (like DOM node references): cloning one
/// refers to the same element.
pub trait RouteElement: Clone {
    fn set_route_params(&self, params: &RouteParams);

    fn set_query_params(&self, params: &[(String, String)]);

    fn set_tail_params(&self, params: &TailParams);

    /// `None` for top-level routes and while the parent does not match
    fn set_parent_route(&self, tail: Option<&Tail>);
}

/// The document the route elements live in
///
/// Hooks may navigate. Routes affected by that navigation are refreshed
/// after the current update returns.
pub trait ElementHost<E> {
    /// Builds a new element for `tag`
    fn create_element(&mut self, tag: &str) -> E;

    /// Inserts `element` into the container with id `target`, or into the
    /// route's own position when `target` is `None`
    fn append_element(&mut self, target: Option<&str>, element: &E);

    fn remove_element(&mut self, element: &E);

    /// Called after `element` became the active element of its route
    fn element_activated(&mut self, _element: &E) {}

    /// Called before `element` is removed. Returning false keeps it in the
    /// document; the cache treats it as inactive either way.
    fn element_deactivating(&mut self, _element: &E) -> bool {
        true
    }
}

/// A cache entry
#[derive(Debug, Clone)]
pub struct CachedElement<E> {
    pub element: E,
    pub matched_params: RouteParams,
}

/// What [`RouteElementCache::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    /// Nothing was active and nothing matched
    Idle,
    /// A new element was built and activated
    Created,
    /// A cached element was activated again
    Reused,
    /// The active element stayed and got fresh query and tail params
    Refreshed,
    /// The active element was deactivated
    Deactivated,
}

#[derive(Debug, Clone)]
pub struct RouteElementCache<E> {
    tag: String,
    append_to: Option<String>,
    cache_count: usize,
    /// Most recently activated first. The active element, if any, is at the front.
    entries: VecDeque<CachedElement<E>>,
    active: bool,
}

impl<E: RouteElement> RouteElementCache<E> {
    pub fn new(tag: impl Into<String>, append_to: Option<String>, cache_count: usize) -> Self {
        Self {
            tag: tag.into(),
            append_to,
            cache_count: clamp_cache_count(cache_count),
            entries: VecDeque::new(),
            active: false,
        }
    }

    pub fn cache_count(&self) -> usize {
        self.cache_count
    }

    /// Changes the capacity, clamped to at least 1, dropping the oldest
    /// entries that no longer fit
    pub fn set_cache_count(&mut self, count: usize) {
        self.cache_count = clamp_cache_count(count);
        self.evict_overflow();
    }

    pub fn active_element(&self) -> Option<&E> {
        if self.active {
            self.entries.front().map(|entry| &entry.element)
        } else {
            None
        }
    }

    /// Params the active element was created for
    pub fn active_params(&self) -> Option<&RouteParams> {
        if self.active {
            self.entries.front().map(|entry| &entry.matched_params)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, most recently activated first
    pub fn iter(&self) -> impl Iterator<Item = &CachedElement<E>> {
        self.entries.iter()
    }

    /// Brings the rendered element in line with a new match
    pub fn update<H>(&mut self, result: &MatchResult, parent: Option<&Tail>, host: &mut H) -> CacheUpdate
    where
        H: ElementHost<E> + ?Sized,
    {
        if !result.matches {
            if self.active {
                self.deactivate(host);
                return CacheUpdate::Deactivated;
            }
            return CacheUpdate::Idle;
        }

        if self.active {
            if let Some(current) = self
                .entries
                .front()
                .filter(|current| current.matched_params == result.route_params)
            {
                apply_volatile(&current.element, result, parent);
                return CacheUpdate::Refreshed;
            }
            self.deactivate(host);
        }

        let (_, reused) = self.activate_element_for(result, parent, host);
        if reused {
            CacheUpdate::Reused
        } else {
            CacheUpdate::Created
        }
    }

    /// Activates the element for `result`, reusing a cached one with equal
    /// named params when there is one
    ///
    /// Returns the element and whether it came from the cache. An element
    /// that is still active is deactivated first.
    pub fn activate_element_for<H>(&mut self, result: &MatchResult, parent: Option<&Tail>, host: &mut H) -> (E, bool)
    where
        H: ElementHost<E> + ?Sized,
    {
        self.deactivate(host);

        let cached = self
            .entries
            .iter()
            .position(|entry| entry.matched_params == result.route_params)
            .and_then(|index| self.entries.remove(index));

        let reused = cached.is_some();
        let entry = match cached {
            Some(entry) => {
                debug!(tag = %self.tag, "reusing cached element");
                apply_volatile(&entry.element, result, parent);
                entry
            }
            None => {
                debug!(tag = %self.tag, "creating element");
                let element = host.create_element(&self.tag);
                element.set_route_params(&result.route_params);
                apply_volatile(&element, result, parent);
                CachedElement {
                    element,
                    matched_params: result.route_params.clone(),
                }
            }
        };

        host.append_element(self.append_to.as_deref(), &entry.element);
        host.element_activated(&entry.element);

        let element = entry.element.clone();
        self.entries.push_front(entry);
        self.active = true;
        self.evict_overflow();

        (element, reused)
    }

    /// Deactivates the active element, if any
    ///
    /// The host may veto removal from the document; the element stays cached
    /// and inactive either way.
    pub fn deactivate<H>(&mut self, host: &mut H)
    where
        H: ElementHost<E> + ?Sized,
    {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(entry) = self.entries.front() {
            if host.element_deactivating(&entry.element) {
                host.remove_element(&entry.element);
            } else {
                debug!(tag = %self.tag, "element removal vetoed");
            }
        }
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.cache_count {
            if self.entries.pop_back().is_some() {
                debug!(tag = %self.tag, cache_count = self.cache_count, "evicted cached element");
            }
        }
    }
}

/// Sets the properties that do not decide cache identity
fn apply_volatile<E: RouteElement>(element: &E, result: &MatchResult, parent: Option<&Tail>) {
    element.set_query_params(&result.query_params());
    element.set_tail_params(&result.route_tail_param);
    element.set_parent_route(parent);
}
