use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use reqwest::Client;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct RelayState {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ProxyQuery {
    url: Option<String>,
}

fn cors() -> [(HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

/// `client` must already carry the browser identification header.
pub fn router(client: Client) -> Router {
    Router::new()
        .route("/proxy", get(proxy).options(preflight))
        .with_state(RelayState { client })
}

pub async fn serve(listener: TcpListener, client: Client) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "relay listening");
    }
    axum::serve(listener, router(client))
        .await
        .map_err(Error::Server)
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, cors())
}

async fn proxy(State(state): State<RelayState>, Query(query): Query<ProxyQuery>) -> Response {
    let Some(target) = query.url.filter(|url| !url.is_empty()) else {
        return (StatusCode::BAD_REQUEST, cors(), "URL is required").into_response();
    };

    match fetch(&state.client, &target).await {
        Ok(body) => {
            info!(%target, bytes = body.len(), "relayed");
            (StatusCode::OK, cors(), body).into_response()
        }
        Err(e) => {
            warn!(%target, error = %e, "relay fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                cors(),
                format!("Error fetching the URL: {e}"),
            )
                .into_response()
        }
    }
}

async fn fetch(client: &Client, target: &str) -> reqwest::Result<String> {
    client.get(target).send().await?.text().await
}
