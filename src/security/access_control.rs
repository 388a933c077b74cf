//! Access Control Middleware.
//! Enforces the client address allow-list.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::filter::FilterChain;
use crate::observability::metrics;
use crate::security::client_ip::{ExtractedAddress, IpExtractor};

/// Body sent with every rejection.
pub const FORBIDDEN_BODY: &str = "403 forbidden";

/// State required for access control.
#[derive(Clone)]
pub struct AccessControlState {
    pub chain: Arc<FilterChain>,
    pub extractor: Arc<IpExtractor>,
    pub enabled: bool,
}

/// Client address attached to admitted requests.
#[derive(Clone, Debug)]
pub struct ClientContext {
    pub client: ExtractedAddress,
    pub provider: &'static str,
}

pub async fn access_control_middleware(
    State(state): State<AccessControlState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled {
        return next.run(req).await;
    }

    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let Some(client) = state.extractor.extract(req.headers(), remote) else {
        tracing::warn!(remote = ?remote, "No client address determinable, denying");
        metrics::record_extraction_failure();
        metrics::record_decision(None);
        return forbidden();
    };

    match state.chain.decide(client.addr) {
        Some(provider) => {
            tracing::debug!(
                client = %client.addr,
                source = %client.source,
                provider,
                "Request allowed"
            );
            metrics::record_decision(Some(provider));
            req.extensions_mut().insert(ClientContext { client, provider });
            next.run(req).await
        }
        None => {
            tracing::info!(client = %client.addr, source = %client.source, "Request denied");
            metrics::record_decision(None);
            forbidden()
        }
    }
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, FORBIDDEN_BODY).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchProvider, PoolMatcher};
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app(enabled: bool, extractor: IpExtractor) -> Router {
        let state = AccessControlState {
            chain: Arc::new(FilterChain::new(vec![MatchProvider::Defined(PoolMatcher::defined(&[
                "10.192.0.0/24",
            ]))])),
            extractor: Arc::new(extractor),
            enabled,
        };

        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, access_control_middleware))
    }

    fn request(peer: &str, xff: Option<&'static str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = xff {
            builder = builder.header("x-forwarded-for", v);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    async fn body(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn allowed_peer_passes() {
        let res = app(true, IpExtractor::direct())
            .oneshot(request("10.192.0.7:4000", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn denied_peer_gets_forbidden() {
        let res = app(true, IpExtractor::direct())
            .oneshot(request("8.8.8.8:4000", Some("10.192.0.7")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(body(res).await, FORBIDDEN_BODY);
    }

    #[tokio::test]
    async fn trusted_header_is_used() {
        let extractor = IpExtractor::from_names(true, &["X-Forwarded-For"]).unwrap();
        let res = app(true, extractor)
            .oneshot(request("8.8.8.8:4000", Some("10.192.0.7, 8.8.8.8")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admitted_request_carries_client_context() {
        let state = AccessControlState {
            chain: Arc::new(FilterChain::new(vec![MatchProvider::Defined(PoolMatcher::defined(&[
                "10.192.0.0/24",
            ]))])),
            extractor: Arc::new(IpExtractor::direct()),
            enabled: true,
        };
        let app = Router::new()
            .route(
                "/",
                get(|Extension(ctx): Extension<ClientContext>| async move {
                    format!("{} {} {}", ctx.client.addr, ctx.client.source, ctx.provider)
                }),
            )
            .layer(middleware::from_fn_with_state(state, access_control_middleware));

        let res = app.oneshot(request("10.192.0.7:4000", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(res).await, "10.192.0.7 remote defined");
    }

    #[tokio::test]
    async fn missing_client_address_is_denied() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = app(true, IpExtractor::direct()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn disabled_filter_bypasses() {
        let res = app(false, IpExtractor::direct())
            .oneshot(request("8.8.8.8:4000", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
