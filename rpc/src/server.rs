//! Axum router assembly and the HTTP server.

use std::future::Future;
use std::net::SocketAddr;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, health, parcels, transfers, users, zk};
use crate::rate_limit::{limit_failed_attempts, limit_requests};
use crate::state::AppState;

/// Build the full application router.
///
/// Route layout:
/// - `/api/auth/*`: login, limited on failed attempts
/// - `/api/zk/*`, `/api/parcels/*`, `/api/users/*`, `/api/transfers/*`:
///   limited per client
/// - `/api/health*`, `/metrics`: never limited
pub fn router(state: AppState) -> Router {
    router_with_options(state, true)
}

/// As [`router`], leaving out `/metrics` when `expose_metrics` is false.
pub fn router_with_options(state: AppState, expose_metrics: bool) -> Router {
    let auth_routes = Router::new()
        .route("/request-nonce", post(auth::request_nonce))
        .route("/verify-signature", post(auth::verify_signature))
        .layer(from_fn_with_state(
            state.auth_limit.clone(),
            limit_failed_attempts,
        ));

    let zk_routes = Router::new()
        .route("/status", get(zk::status))
        .route("/generate-commitment", post(zk::generate_commitment))
        .route("/generate-proof", post(zk::generate_proof))
        .route("/verify-proof", post(zk::verify_proof))
        .route("/verify-ownership", post(zk::verify_ownership))
        .route("/generate-shareable-proof", post(zk::generate_shareable_proof))
        .route("/verify-shareable-proof", post(zk::verify_shareable_proof))
        .route("/my-proofs", get(zk::my_proofs));

    let parcel_routes = Router::new()
        .route("/", post(parcels::register))
        .route("/mine", get(parcels::mine))
        .route("/blockchain/:id", get(parcels::on_ledger))
        .route("/:id", get(parcels::get_parcel));

    let user_routes = Router::new()
        .route("/profile", get(users::profile))
        .route("/:address", get(users::by_address));

    let transfer_routes = Router::new()
        .route("/request", post(transfers::request))
        .route("/pending", get(transfers::pending))
        .route("/approve", post(transfers::approve))
        .route("/reject", post(transfers::reject));

    let limited = Router::new()
        .nest("/auth", auth_routes)
        .nest("/zk", zk_routes)
        .nest("/parcels", parcel_routes)
        .nest("/users", user_routes)
        .nest("/transfers", transfer_routes)
        .layer(from_fn_with_state(
            state.general_limit.clone(),
            limit_requests,
        ));

    let api = Router::new()
        .merge(limited)
        .route("/health", get(health::health))
        .route("/health/ledger", get(health::ledger_health));

    let mut app = Router::new().nest("/api", api);
    if expose_metrics {
        app = app.route("/metrics", get(health::metrics));
    }
    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct RpcServer {
    pub bind: SocketAddr,
    pub expose_metrics: bool,
}

impl RpcServer {
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            expose_metrics: true,
        }
    }

    pub fn with_metrics(mut self, expose: bool) -> Self {
        self.expose_metrics = expose;
        self
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve(
        &self,
        state: AppState,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        self.serve_on(listener, state, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(
        &self,
        listener: tokio::net::TcpListener,
        state: AppState,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, metrics = self.expose_metrics, "HTTP API listening");
        axum::serve(
            listener,
            router_with_options(state, self.expose_metrics)
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
