use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{ask, corpus, health};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// - `POST /ask`: retrieval-augmented answer
/// - health and status endpoints
/// - corpus reload
/// - `/data/*`: static files from the data directory (the corpus file)
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_allowed_origins);
    let data_dir = ServeDir::new(&state.paths.data_dir);

    Router::new()
        .route("/ask", post(ask::ask))
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route("/api/corpus/reload", post(corpus::reload_corpus))
        .nest_service("/data", data_dir)
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// `"*"` anywhere in the list allows every origin, without credentials.
fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let origins = resolve_allowed_origins(configured);
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        tracing::warn!("CORS allows any origin; credentials are disabled");
        return base.allow_origin(AllowOrigin::any());
    }

    let allowed_origins = origins
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    base.allow_origin(AllowOrigin::list(allowed_origins))
        .allow_credentials(true)
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }

    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_vite_dev_origins() {
        let origins = resolve_allowed_origins(&[]);
        assert!(origins.contains(&"http://localhost:5173".to_string()));
    }

    #[test]
    fn configured_origins_replace_defaults() {
        let origins = resolve_allowed_origins(&[
            " https://chat.example.com ".to_string(),
            "".to_string(),
        ]);
        assert_eq!(origins, vec!["https://chat.example.com".to_string()]);
    }

    #[tokio::test]
    async fn wildcard_origin_allows_any_origin_without_credentials() {
        let app: Router = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(build_cors_layer(&["https://a.example.com".to_string(), "*".to_string()]));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let response = reqwest::Client::new()
            .get(format!("http://{}/health", addr))
            .header("Origin", "https://anywhere.example.org")
            .send()
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers.get("access-control-allow-credentials").is_none());
    }

    #[test]
    fn configured_list_builds_a_usable_layer() {
        let _app: Router = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(build_cors_layer(&["https://chat.example.com".to_string()]));
    }
}
