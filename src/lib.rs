//! Library root for `react-bot`.
//!
//! React-bot keeps a real-time connection to Slack open and adds an emoji reaction
//! to messages posted in a configured set of channels:
//! - Ignores its own messages and unwatched channels
//! - Picks the reaction at random from a configured pool
//! - Throttles bursts with a simple shared cooldown
//! - Reconnects whenever the live connection drops
//!
//! The chat platform sits behind a trait so the event loop can be driven by
//! other implementations, or by test doubles.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the react-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime with the Slack chat client
/// - Starts the main event loop
pub async fn start(config: Config) -> Void {
    info!("Starting react-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the rustls crypto provider."))?;

    // Initialize the runtime.
    let mut runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
