//! Site registry, URL configuration and HTTP serving
//!
//! - [`StarkSite`] collects handler registrations
//! - [`SiteUrls`] names, reverses, resolves and dispatches routes
//! - [`build_admin_routes`] mounts the routes on an axum `Router`

pub mod router;
pub mod site;
pub mod urls;

pub use router::build_admin_routes;
pub use site::StarkSite;
pub use urls::{Route, RouteArgs, RouteGroup, SiteUrls};
