//! SocialCue Common Utilities
//!
//! Shared infrastructure for all SocialCue crates:
//! - Error types and result aliases
//! - Fixed-rate tick clock for the host loop
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
