//! # RHTMX Client Router
//!
//! A declarative client-side router with support for:
//! - Static routes (`/about`)
//! - Named parameters (`/users/:id`)
//! - Optional groups, which may nest (`/docs(/:section)(/:subsection)`)
//! - Splat tails handed down to nested routes (`/users/*routeTail`)
//! - A per-route cache of rendered elements keyed by route params
//!
//! ## Hierarchical Matching
//!
//! A top-level route matches the location with the root prefix removed. A
//! route with a splat publishes the unmatched remainder as its [`Tail`];
//! routes mounted under it match that tail instead of the full URL, and are
//! recomputed right after their parent on every navigation.
//!
//! ## Example
//!
//! ```
//! use rhtmx_client_router::match_pattern;
//!
//! let result = match_pattern("/docs/:section(/:subsection)", "/docs/faq", "/").unwrap();
//! assert!(result.matches);
//! assert_eq!(result.route_params["section"], Some("faq".to_string()));
//! assert_eq!(result.route_params["subsection"], None);
//!
//! let nested = match_pattern("/users/*routeTail", "/users/profile/worked", "/").unwrap();
//! assert_eq!(nested.tail.unwrap().path, "/profile/worked");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod intercept;
pub mod navigation;
pub mod outlet;
pub mod path;
pub mod route;
pub mod signal;

// ============================================================================
// Re-exports
// ============================================================================

pub use cache::{CacheUpdate, CachedElement, ElementHost, RouteElement, RouteElementCache};
pub use config::{Config, RouterConfig};
pub use error::{RouterError, RouterResult};
pub use intercept::{Anchor, ClickEvent, ClickOutcome, IgnoreReason};
pub use navigation::{History, LocationChanged, LocationDetail, MemoryHistory, NavigationController, NavigationKind};
pub use outlet::{MountedRoute, NavigateOptions, Router};
pub use route::{
    compile, match_pattern, CompiledPattern, MatchResult, ParentRoute, Route, RouteId, RouteParams, RouteRegistry,
    Tail, TailParams,
};
pub use signal::{Signal, Subscription};
