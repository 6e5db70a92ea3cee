//! Shared utilities for folio
//!
//! This crate provides common functionality used across the folio workspace:
//! tracing setup and typed access to environment configuration.

pub mod config;
pub mod logging;

pub use config::{EnvError, EnvSource, ProcessEnv};
pub use logging::{LogFormat, init_tracing};
