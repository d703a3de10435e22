use std::net::SocketAddr;

use axum::{response::Html, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const PING_RESPONSE: &str = "Bot do Discord online!";

async fn ping() -> Html<&'static str> {
    Html(PING_RESPONSE)
}

/// Answers every GET with a 200 and a static page. Hosting platforms that
/// kill services not listening on a port are satisfied by this.
pub fn health_router() -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/{*path}", get(ping))
}

/// Bind the health check listener.
///
/// # Errors
///
/// Errors if the address can't be bound.
pub async fn bind_health(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Health check listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve the health check until the token is cancelled.
pub async fn serve_health(listener: TcpListener, shutdown: CancellationToken) {
    let result = axum::serve(listener, health_router())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await;

    if let Err(e) = result {
        log::error!("Health check listener died: {e}");
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    async fn get_page(uri: &str) -> (StatusCode, Option<String>, String) {
        let response = health_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn any_path_is_ok() {
        for uri in ["/", "/healthz", "/some/deep/path"] {
            let (status, content_type, body) = get_page(uri).await;
            assert_eq!(status, StatusCode::OK);
            assert!(content_type.unwrap().starts_with("text/html"));
            assert_eq!(body, "Bot do Discord online!");
        }
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let listener = bind_health("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let token = CancellationToken::new();
        let server = tokio::spawn(serve_health(listener, token.clone()));

        token.cancel();
        server.await.unwrap();
    }
}
