//! Pushline Core Library
//!
//! Shared functionality for the Pushline components:
//! - Subscription data model and registry wire types
//! - Configuration resolution and hierarchy
//! - Error taxonomy for the subscribe / deliver / present pipeline
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod tracing_init;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{DispatchOutcome, PushSubscription, SubscriptionKeys, Validation};
