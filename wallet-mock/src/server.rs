/// Axum HTTP server setup and routing
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::state::{ServiceSettings, ServiceState};

/// Path prefix the real service mounts its API under
pub const API_PREFIX: &str = "/api/v1";

pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow requests from browser-based agent dashboards
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Wallet endpoints
        .route("/wallets", post(create_wallet))
        .route("/wallets/:agent_id", get(get_wallet))
        .route("/wallets/:agent_id/balances", get(get_all_balances))
        .route(
            "/wallets/:agent_id/balances/:chain/:token",
            get(get_balance),
        )
        .route("/wallets/:agent_id/channels", get(get_agent_channels))
        // Channel endpoints
        .route("/channels", post(open_channel))
        .route("/channels/:channel_id", delete(close_channel))
        .route("/channels/:channel_id/payments", post(send_payment))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        // Shared state
        .with_state(state.clone());

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Development helpers (not part of the agent wallet API)
        .route("/dev/wallets/:agent_id/credit", post(credit_wallet))
        .nest(API_PREFIX, api)
        .with_state(state)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(state: AppState, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(state.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Agent wallet mock listening on http://{}{}", addr, API_PREFIX);
    log::info!("💰 Funding endpoint: POST /dev/wallets/:agent_id/credit");
    if state.settings().master_seed.is_none() {
        log::warn!("⚠️  No MASTER_SEED set, wallet creation will fail");
    }
    if let Some(limit) = state.settings().rate_limit {
        log::info!("🚦 Rate limit: {} requests", limit);
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Mock server running on its own thread and runtime.
///
/// Dropping it signals a graceful shutdown; the thread is not joined so an
/// idle keep-alive connection cannot stall the caller.
pub struct BackgroundServer {
    addr: SocketAddr,
    state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl BackgroundServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL including the API prefix, ready for a client config
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }
}

impl Drop for BackgroundServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Bind an ephemeral localhost port and serve in the background.
///
/// The listener is bound before this returns, so requests can be sent
/// immediately from blocking code.
pub fn spawn_background(settings: ServiceSettings) -> anyhow::Result<BackgroundServer> {
    let state = Arc::new(ServiceState::new(settings));
    let app = create_router(state.clone());

    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    let (tx, rx) = oneshot::channel::<()>();

    std::thread::Builder::new()
        .name("wallet-mock".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::error!("Failed to start mock runtime: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        log::error!("Failed to adopt mock listener: {}", e);
                        return;
                    }
                };
                let shutdown = async {
                    rx.await.ok();
                };
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    log::error!("Mock server error: {}", e);
                }
            });
        })?;

    log::debug!("Mock wallet service on http://{}{}", addr, API_PREFIX);

    Ok(BackgroundServer {
        addr,
        state,
        shutdown: Some(tx),
    })
}
