// src/lib.rs
//
// Concept-shot generation: an actix-web proxy in front of a hosted
// multimodal AI gateway, plus the client-side workflow orchestrator that
// sequences analysis and generation calls into one result set.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod services;

pub use errors::ConceptShotError;

use services::UpstreamClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    /// When set, every request must carry a matching `x-app-secret` header.
    pub app_secret: Option<String>,
}
