//! Request admission middleware
//!
//! Converts the live request into a request identifier, asks the
//! authorizer whether any grant on the caller's token covers it, and
//! either runs the wrapped handler or hands the request to the router's
//! unauthorized path. Clients only ever see the unauthorized response;
//! the reason a request was turned away stays in the debug log.

use crate::auth::Authorizer;
use crate::uri::{RequestParams, Uri};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Per-request state handed through the middleware chain
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub headers: HashMap<String, String>,
    pub params: RequestParams,
}

/// Per-request capabilities a host router provides
#[async_trait]
pub trait RouterResource: Send + Sync {
    /// Pull the caller's token out of the request; empty means none
    fn auth_token(&self, ctx: &RequestContext) -> String;

    /// Root path for request identifiers under this router
    fn resource_path(&self) -> String;

    /// Emit the host framework's unauthorized response
    async fn handle_unauthorized(&self, ctx: &RequestContext);
}

/// A request handler with a stable symbolic name
///
/// The name is attached at route registration and becomes the final
/// segment of the request identifier.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &RequestContext);
}

/// Wraps a handler so it only runs for admitted requests
pub struct AuthMiddleware<H> {
    authorizer: Arc<Authorizer>,
    resource: Arc<dyn RouterResource>,
    next: H,
}

impl<H: Handler> AuthMiddleware<H> {
    pub fn new(authorizer: Arc<Authorizer>, resource: Arc<dyn RouterResource>, next: H) -> Self {
        Self {
            authorizer,
            resource,
            next,
        }
    }
}

#[async_trait]
impl<H: Handler> Handler for AuthMiddleware<H> {
    fn name(&self) -> &str {
        self.next.name()
    }

    async fn handle(&self, ctx: &RequestContext) {
        let token = self.resource.auth_token(ctx);
        if token.is_empty() {
            debug!(handler = self.next.name(), "no auth token on request");
            self.resource.handle_unauthorized(ctx).await;
            return;
        }

        let request_uri =
            Uri::for_request(&self.resource.resource_path(), self.next.name(), &ctx.params);

        match self.authorizer.authorized_resources(&token, vec![request_uri]) {
            Ok(authorized) if !authorized.is_empty() => self.next.handle(ctx).await,
            Ok(_) => {
                debug!(handler = self.next.name(), "no grant covers request");
                self.resource.handle_unauthorized(ctx).await;
            }
            Err(e) => {
                debug!(handler = self.next.name(), error = %e, "authorization failed");
                self.resource.handle_unauthorized(ctx).await;
            }
        }
    }
}
