//! Generation client layer.
//!
//! This module provides:
//! - Request/response types for the external text-generation service
//! - The GenerationClient trait
//! - An HTTP implementation and a scripted mock

pub mod client;
pub mod http;

pub use client::{
    GenerationClient, GenerationError, GenerationRequest, GenerationResponse, MockGenerationClient,
    TokenUsage,
};
pub use http::{API_KEY_ENV, HttpClientConfig, HttpGenerationClient};
