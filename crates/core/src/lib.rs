//! Core types and shared functionality for waypost.
//!
//! This crate provides:
//! - In-memory TTL cache and cache-key hashing
//! - Outbound rate limiter
//! - Domain models for geocoding and crawling
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod limit;
pub mod models;

pub use cache::TtlCache;
pub use config::AppConfig;
pub use error::Error;
pub use limit::RateLimiter;
