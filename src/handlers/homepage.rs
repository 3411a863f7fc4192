use axum::{routing::get, Router};

use crate::AppState;

pub const GREETING: &str = "Hello World. Welcome to LearnCSIT server.";

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(homepage))
}

async fn homepage() -> &'static str {
    GREETING
}
