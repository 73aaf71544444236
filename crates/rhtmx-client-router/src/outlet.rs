//! Mounting routes into a page
//!
//! [`Router::mount`] registers a top-level route and keeps it in sync with
//! the location. [`MountedRoute::mount_child`] nests a route under another
//! one: the child only ever sees the parent's tail, and it is recomputed
//! each time the parent publishes a new tail, after the parent itself.
//!
//! Unmounting (explicitly or by dropping the handle) deactivates the
//! element, removes the route from the registry and tells the children the
//! tail is gone.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::iter;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::cache::{ElementHost, RouteElement, RouteElementCache};
use crate::config::RouterConfig;
use crate::error::{RouterError, RouterResult};
use crate::navigation::NavigationController;
use crate::path::{join_paths, to_query_string};
use crate::route::{clamp_cache_count, fill, CompiledPattern, MatchResult, ParentRoute, Route, RouteId, Tail};
use crate::signal::{Signal, Subscription};

/// Shared context for mounting routes
pub struct Router<E> {
    controller: Rc<NavigationController>,
    host: Rc<RefCell<dyn ElementHost<E>>>,
    queue: Rc<RefreshQueue<E>>,
    default_cache_count: usize,
}

impl<E> Clone for Router<E> {
    fn clone(&self) -> Self {
        Self {
            controller: Rc::clone(&self.controller),
            host: Rc::clone(&self.host),
            queue: Rc::clone(&self.queue),
            default_cache_count: self.default_cache_count,
        }
    }
}

/// Refreshes requested while host hooks run
///
/// The host is borrowed for the whole cache update, so a hook that navigates
/// cannot refresh routes synchronously. Those refreshes wait here and run
/// once the update is done.
struct RefreshQueue<E> {
    busy: Cell<bool>,
    pending: RefCell<VecDeque<Weak<RouteNode<E>>>>,
}

impl<E: RouteElement + 'static> RefreshQueue<E> {
    fn new() -> Self {
        Self {
            busy: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    fn defer(&self, node: &Rc<RouteNode<E>>) {
        let weak = Rc::downgrade(node);
        let mut pending = self.pending.borrow_mut();
        if !pending.iter().any(|queued| queued.ptr_eq(&weak)) {
            pending.push_back(weak);
        }
    }

    fn drain(&self) {
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(weak) = next else {
                break;
            };
            if let Some(node) = weak.upgrade() {
                node.refresh();
            }
        }
    }
}

impl<E: RouteElement + 'static> Router<E> {
    pub fn new<H>(controller: Rc<NavigationController>, host: Rc<RefCell<H>>) -> Self
    where
        H: ElementHost<E> + 'static,
    {
        let host: Rc<RefCell<dyn ElementHost<E>>> = host;
        Self {
            controller,
            host,
            queue: Rc::new(RefreshQueue::new()),
            default_cache_count: 1,
        }
    }

    /// A router whose routes default to the configured cache capacity
    pub fn from_config<H>(controller: Rc<NavigationController>, host: Rc<RefCell<H>>, config: &RouterConfig) -> Self
    where
        H: ElementHost<E> + 'static,
    {
        Self::new(controller, host).with_default_cache_count(config.effective_cache_count())
    }

    /// Cache capacity for routes that do not set one
    pub fn with_default_cache_count(mut self, count: usize) -> Self {
        self.default_cache_count = clamp_cache_count(count);
        self
    }

    pub fn controller(&self) -> &Rc<NavigationController> {
        &self.controller
    }

    /// Mounts a top-level route and matches it against the current location
    ///
    /// Fails when the route has no pattern, an invalid pattern or no element.
    pub fn mount(&self, route: Route) -> RouterResult<MountedRoute<E>> {
        attach(self.clone(), route, None)
    }
}

impl<E> fmt::Debug for Router<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("controller", &self.controller)
            .field("default_cache_count", &self.default_cache_count)
            .finish()
    }
}

/// Options for [`MountedRoute::navigate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Values for `:name` placeholders, taking precedence over the current ones
    pub params: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    /// Sub-path appended after the route's own path
    pub tail: Option<String>,
    pub replace_state: bool,
}

impl NavigateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn replace_state(mut self) -> Self {
        self.replace_state = true;
        self
    }
}

struct RouteState {
    route: Route,
    last_match: MatchResult,
    mounted: bool,
}

struct RouteNode<E> {
    router: Router<E>,
    pattern: Rc<CompiledPattern>,
    state: RefCell<RouteState>,
    /// Kept apart from `state` so hooks can still read the route while the
    /// cache talks to the host
    cache: RefCell<RouteElementCache<E>>,
    tail_changed: Signal<Option<Tail>>,
    /// Patterns of the ancestors, outermost first
    lineage: Vec<String>,
}

impl<E: RouteElement + 'static> RouteNode<E> {
    fn set_parent_tail(&self, tail: Option<Tail>) {
        self.state
            .borrow_mut()
            .route
            .set_parent_route(ParentRoute::Child(tail));
    }

    /// Rematches against the current location, updates the element and
    /// publishes the new tail
    ///
    /// Deferred while another route is updating the host.
    fn refresh(self: &Rc<Self>) {
        let queue = &self.router.queue;
        if queue.busy.get() {
            debug!("refresh deferred until the host is free");
            queue.defer(self);
            return;
        }

        let controller = &self.router.controller;
        let url = controller.current_url();

        let (result, parent_tail, label) = {
            let state = self.state.borrow();
            if !state.mounted {
                return;
            }
            let parent = state.route.parent_route();
            let parent_tail = match parent {
                ParentRoute::Child(tail) => tail.clone(),
                ParentRoute::Root => None,
            };
            (
                self.pattern.match_under(parent, &url, controller.root()),
                parent_tail,
                state.route.label(),
            )
        };

        queue.busy.set(true);
        let outcome = self
            .cache
            .borrow_mut()
            .update(&result, parent_tail.as_ref(), &mut *self.router.host.borrow_mut());
        queue.busy.set(false);
        trace!(route = %label, %url, matches = result.matches, ?outcome, "route refreshed");

        let tail = {
            let mut state = self.state.borrow_mut();
            state.last_match = result;
            state.last_match.tail.clone()
        };

        self.tail_changed.emit(&tail);
        queue.drain();
    }
}

fn attach<E: RouteElement + 'static>(
    router: Router<E>,
    mut route: Route,
    parent: Option<&MountedRoute<E>>,
) -> RouterResult<MountedRoute<E>> {
    let pattern = route.compiled()?;
    let tag = route
        .element()
        .ok_or_else(|| RouterError::MissingElement { route: route.label() })?
        .to_string();

    let lineage = match parent {
        Some(parent) => {
            route.set_parent_route(ParentRoute::Child(parent.tail()));
            let mut lineage = parent.node.lineage.clone();
            lineage.push(parent.pattern());
            lineage
        }
        None => {
            route.set_parent_route(ParentRoute::Root);
            Vec::new()
        }
    };

    router.controller.registry_mut().add_route(&mut route)?;

    let cache = RouteElementCache::new(
        tag,
        route.append_to().map(str::to_string),
        route.cache_count().unwrap_or(router.default_cache_count),
    );
    let node = Rc::new(RouteNode {
        router,
        pattern,
        state: RefCell::new(RouteState {
            route,
            last_match: MatchResult::no_match(),
            mounted: true,
        }),
        cache: RefCell::new(cache),
        tail_changed: Signal::new(),
        lineage,
    });

    let weak = Rc::downgrade(&node);
    let subscription = match parent {
        None => node.router.controller.on_location_changed(move |_| {
            if let Some(node) = weak.upgrade() {
                node.refresh();
            }
        }),
        Some(parent) => parent.node.tail_changed.subscribe(move |tail| {
            if let Some(node) = weak.upgrade() {
                node.set_parent_tail(tail.clone());
                node.refresh();
            }
        }),
    };

    node.refresh();
    Ok(MountedRoute {
        node,
        subscription: Some(subscription),
    })
}

/// A route that is live in the page
///
/// Dropping the handle unmounts the route.
pub struct MountedRoute<E: RouteElement + 'static> {
    node: Rc<RouteNode<E>>,
    subscription: Option<Subscription>,
}

impl<E: RouteElement + 'static> MountedRoute<E> {
    /// Mounts `route` under this one. It matches this route's tail.
    pub fn mount_child(&self, route: Route) -> RouterResult<MountedRoute<E>> {
        attach(self.node.router.clone(), route, Some(self))
    }

    pub fn id(&self) -> Option<RouteId> {
        self.node.state.borrow().route.id().cloned()
    }

    pub fn pattern(&self) -> String {
        self.node
            .state
            .borrow()
            .route
            .pattern()
            .unwrap_or_default()
            .to_string()
    }

    pub fn last_match(&self) -> MatchResult {
        self.node.state.borrow().last_match.clone()
    }

    /// Tail published to the children, `None` while the route does not match
    pub fn tail(&self) -> Option<Tail> {
        self.node.state.borrow().last_match.tail.clone()
    }

    pub fn active_element(&self) -> Option<E> {
        self.node.cache.borrow().active_element().cloned()
    }

    /// Number of cached elements, the active one included
    pub fn cached_len(&self) -> usize {
        self.node.cache.borrow().len()
    }

    pub fn cache_count(&self) -> usize {
        self.node.cache.borrow().cache_count()
    }

    /// Changes the cache capacity, clamped to at least 1
    pub fn set_cache_count(&self, count: usize) {
        self.node.state.borrow_mut().route.set_cache_count(count);
        self.node.cache.borrow_mut().set_cache_count(count);
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Rematches the route against the current location
    pub fn refresh(&self) {
        self.node.refresh();
    }

    /// Listens for the tail this route publishes to its children
    #[must_use = "dropping the subscription removes the listener"]
    pub fn on_tail_changed(&self, listener: impl Fn(&Option<Tail>) + 'static) -> Subscription {
        self.node.tail_changed.subscribe(listener)
    }

    /// Builds the URL for this route from the ancestors' patterns and
    /// navigates to it
    ///
    /// Splats are left out. Placeholders take values from `options.params`
    /// first, then from the params currently matched by the ancestors and
    /// the route itself. Optional groups with an unknown placeholder are
    /// dropped; an unknown required placeholder is an
    /// [`UnresolvedParams`](RouterError::UnresolvedParams) error and nothing
    /// is navigated.
    ///
    /// Each call pushes a new history entry unless `replace_state` is set.
    pub fn navigate(&self, options: &NavigateOptions) -> RouterResult<String> {
        let controller = Rc::clone(&self.node.router.controller);

        let (url, source) = {
            let state = self.node.state.borrow();
            let own = state.route.pattern().ok_or(RouterError::MissingPattern)?;

            let mut values: HashMap<String, String> = HashMap::new();
            if let ParentRoute::Child(Some(tail)) = state.route.parent_route() {
                values.extend(present(&tail.route_params));
            }
            if state.last_match.matches {
                values.extend(present(&state.last_match.route_params));
            }
            values.extend(options.params.clone());

            let mut pieces = vec![controller.root().to_string()];
            let mut missing = Vec::new();
            for pattern in self.node.lineage.iter().map(String::as_str).chain(iter::once(own)) {
                let filled = fill(pattern, &values);
                missing.extend(filled.missing);
                pieces.push(filled.path);
            }
            if let Some(tail) = &options.tail {
                pieces.push(tail.clone());
            }

            let path = join_paths(&pieces);
            if !missing.is_empty() {
                return Err(RouterError::UnresolvedParams { path, params: missing });
            }

            let url = if options.query.is_empty() {
                path
            } else {
                format!("{}?{}", path, to_query_string(&options.query))
            };
            (url, state.route.id().map(RouteId::to_string))
        };

        if options.replace_state {
            controller.replace_url(&url, source.as_deref());
        } else {
            controller.push_url(&url, source.as_deref());
        }
        Ok(url)
    }

    /// Unmounts the route and hands back its definition
    ///
    /// The returned route keeps its id, so mounting it again reuses the id.
    pub fn unmount(mut self) -> Route {
        self.teardown();
        let route = self.node.state.borrow().route.clone();
        route
    }

    fn teardown(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        subscription.unsubscribe();

        {
            let mut guard = self.node.state.borrow_mut();
            let state = &mut *guard;
            state.mounted = false;
            self.node
                .cache
                .borrow_mut()
                .deactivate(&mut *self.node.router.host.borrow_mut());
            self.node.router.controller.registry_mut().remove_route(&state.route);
            state.last_match = MatchResult::no_match();
        }

        self.node.tail_changed.emit(&None);
    }
}

impl<E: RouteElement + 'static> Drop for MountedRoute<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<E: RouteElement + 'static> fmt::Debug for MountedRoute<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedRoute")
            .field("id", &self.id())
            .field("pattern", &self.pattern())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// Params that currently hold a value
fn present(params: &HashMap<String, Option<String>>) -> impl Iterator<Item = (String, String)> + '_ {
    params
        .iter()
        .filter_map(|(name, value)| value.clone().map(|value| (name.clone(), value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::MemoryHistory;
    use crate::route::{RouteParams, TailParams};

    #[derive(Debug, Clone, Default)]
    struct Stub(Rc<RefCell<RouteParams>>);

    impl RouteElement for Stub {
        fn set_route_params(&self, params: &RouteParams) {
            *self.0.borrow_mut() = params.clone();
        }
        fn set_query_params(&self, _params: &[(String, String)]) {}
        fn set_tail_params(&self, _params: &TailParams) {}
        fn set_parent_route(&self, _tail: Option<&Tail>) {}
    }

    #[derive(Default)]
    struct StubHost;

    impl ElementHost<Stub> for StubHost {
        fn create_element(&mut self, _tag: &str) -> Stub {
            Stub::default()
        }
        fn append_element(&mut self, _target: Option<&str>, _element: &Stub) {}
        fn remove_element(&mut self, _element: &Stub) {}
    }

    fn router(url: &str) -> Router<Stub> {
        let controller = Rc::new(NavigationController::new(MemoryHistory::new(url)));
        Router::new(controller, Rc::new(RefCell::new(StubHost)))
    }

    #[test]
    fn test_mount_requires_element() {
        let router = router("/");
        let err = router.mount(Route::new().with_pattern("/a")).unwrap_err();
        assert_eq!(
            err,
            RouterError::MissingElement {
                route: "/a".to_string()
            }
        );
        assert!(router.controller().registry().is_empty());
    }

    #[test]
    fn test_mount_requires_pattern() {
        let router = router("/");
        let err = router.mount(Route::new().with_element("x-page")).unwrap_err();
        assert_eq!(err, RouterError::MissingPattern);
    }

    #[test]
    fn test_navigate_fills_ancestors_and_drops_splats() {
        let router = router("/users/ann/posts");
        let users = router
            .mount(Route::new().with_pattern("/users/:user/*rest").with_element("user-page"))
            .unwrap();
        let post = users
            .mount_child(Route::new().with_pattern("/posts(/:post)").with_element("post-page"))
            .unwrap();

        let url = post.navigate(&NavigateOptions::new().param("post", "9")).unwrap();
        assert_eq!(url, "/users/ann/posts/9");
        assert_eq!(post.last_match().route_params["post"], Some("9".to_string()));
    }

    #[test]
    fn test_navigate_unresolved_required_param() {
        let router = router("/");
        let route = router
            .mount(Route::new().with_pattern("/users/:id").with_element("user-page"))
            .unwrap();

        let err = route.navigate(&NavigateOptions::new()).unwrap_err();
        assert_eq!(
            err,
            RouterError::UnresolvedParams {
                path: "/users/:id".to_string(),
                params: vec!["id".to_string()],
            }
        );
        assert_eq!(router.controller().current_url(), "/");
    }

    #[test]
    fn test_drop_unregisters() {
        let router = router("/a");
        let route = router
            .mount(Route::new().with_pattern("/a").with_element("a-page"))
            .unwrap();
        assert_eq!(router.controller().registry().len(), 1);
        assert!(route.active_element().is_some());

        drop(route);
        assert!(router.controller().registry().is_empty());
    }
}
