//! Subscription registry integration.
//!
//! Provides a reqwest-based client for the registry's REST API, used both
//! by the lifecycle manager and by the operator CLI.

mod client;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;

pub use client::RegistryClient;
