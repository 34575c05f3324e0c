//! Core library for the Morgen calendar bridge.
//!
//! Holds the identifier codec and virtual ID registry, the authenticated API
//! client, the batch executor, and the line protocol types shared with the
//! `morgen-bridge` binary.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod model;
pub mod protocol;

pub use batch::{BatchExecutor, BatchFailure, BatchResult, BatchSuccess};
pub use client::{MorgenClient, RateLimit};
pub use config::MorgenConfig;
pub use error::{ErrorKind, MorgenError, MorgenResult, TransportReason};
pub use ids::{IdRegistry, VirtualId};
