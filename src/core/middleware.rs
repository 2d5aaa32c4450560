use std::sync::Arc;

use http::Extensions;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};

use crate::credentials::token::TokenManager;

/// Injects the cached service-identity bearer token into every outgoing
/// request. Requests that already carry an `Authorization` header (user-context
/// operations pass their own short-lived session token) are left untouched.
#[derive(Clone)]
pub struct AuthMiddleware {
    tokens: Arc<TokenManager>,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<TokenManager>) -> Self {
        Self { tokens }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if !req.headers().contains_key(header::AUTHORIZATION) {
            let token = self.tokens.access_token().await.map_err(|e| {
                reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                    "failed to get access token: {}",
                    e
                ))
            })?;

            req.headers_mut().insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
        }

        next.run(req, extensions).await
    }
}
