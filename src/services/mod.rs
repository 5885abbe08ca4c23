// src/services/mod.rs
pub mod analysis;
pub mod assembly;
pub mod gateway_client;
pub mod image_processor;
pub mod orchestrator;
pub mod upstream;

pub use gateway_client::{Gateway, HttpGateway};
pub use image_processor::ImageProcessor;
pub use orchestrator::Orchestrator;
pub use upstream::UpstreamClient;
