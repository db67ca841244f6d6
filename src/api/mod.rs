//! HTTP JSON API over [`Bank`]
pub mod error;
pub mod extract;
pub mod handlers;
pub mod types;


use axum::{
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::bank::Bank;
use crate::error::{BankError, BankResult};

#[derive(Clone)]
pub struct ApiState {
    pub bank: Arc<Bank>,
}

pub fn router(state: ApiState) -> Router {
    use handlers::{accounts, auth, bills, budgets, transactions, users};

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/users/me",
            get(users::profile).put(users::update_profile).delete(users::delete_user),
        )
        .route("/users/me/password", put(users::change_password))
        .route("/accounts", get(accounts::list).post(accounts::open))
        .route(
            "/accounts/:id",
            get(accounts::get).put(accounts::update).delete(accounts::close),
        )
        .route("/transactions", get(transactions::list).post(transactions::create))
        .route(
            "/transactions/categories",
            get(transactions::list_categories).post(transactions::create_category),
        )
        .route("/transactions/:id", get(transactions::get))
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/:id", put(budgets::update))
        .route("/bills", get(bills::list).post(bills::create))
        .route("/bills/:id", put(bills::update).delete(bills::cancel));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiServer {
    state: ApiState,
    bind_addr: String,
}

impl ApiServer {
    pub fn new(bank: Arc<Bank>, host: &str, port: u16) -> Self {
        Self {
            state: ApiState { bank },
            bind_addr: format!("{}:{}", host, port),
        }
    }

    /// Serve until `shutdown` resolves, then flush the database.
    pub async fn start<F>(self, shutdown: F) -> BankResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bank = self.state.bank.clone();
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| BankError::Config(format!("cannot bind {}: {}", self.bind_addr, e)))?;
        let addr: SocketAddr = listener
            .local_addr()
            .map_err(|e| BankError::Internal(e.to_string()))?;
        info!("🌐 API server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| BankError::Internal(format!("server failed: {}", e)))?;

        info!("API server stopped, flushing database");
        bank.flush()
    }
}
