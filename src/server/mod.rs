//! Request-side binding of the authorizer
//!
//! Hosts plug in here: a router exposes its per-request capabilities
//! through [`RouterResource`], handlers carry a stable name, and
//! [`AuthMiddleware`] decides admission before the handler runs.

mod middleware;

pub use middleware::{AuthMiddleware, Handler, RequestContext, RouterResource};
