//! Chat service integration for react-bot.
//!
//! This module provides the transport the event loop runs on:
//! - Establishing the real-time connection and learning the bot's identity
//! - Draining newly arrived message events
//! - Performing remote actions such as adding a reaction
//!
//! It defines the `GenericChatClient` trait that can be implemented for different
//! chat services, with a default implementation for Slack.

pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::base::types::{Acknowledgment, Action, Event, SessionIdentity};

// Errors.

/// Failures a chat transport can report.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established (network or authentication).
    #[error("failed to connect: {0}")]
    Connection(String),
    /// The live connection dropped; reconnecting is expected to recover.
    #[error("connection dropped: {0}")]
    Transient(String),
    /// A remote call could not be performed at all.
    #[error("remote call failed: {0}")]
    Call(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Transient(_))
    }
}

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the three capabilities the event loop consumes. Implementing
/// it allows a different chat platform (or a test double) to drive the bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Establish the real-time connection.
    ///
    /// Returns the bot's own identity so its events can be ignored. Calling this
    /// again replaces any previous connection.
    async fn connect(&self) -> Result<SessionIdentity, TransportError>;

    /// Return the events that arrived since the previous call, in arrival order.
    ///
    /// Never blocks waiting for new events. Fails with [`TransportError::Transient`]
    /// when the live connection is gone.
    async fn poll(&self) -> Result<Vec<Event>, TransportError>;

    /// Perform a remote action against a message.
    ///
    /// A platform-side rejection is reported through the returned [`Acknowledgment`],
    /// not as an error.
    async fn invoke_action(&self, action: Action, channel_id: &str, payload: &str, message_ts: &str) -> Result<Acknowledgment, TransportError>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}

// Tests.
