//! Service integrations for external APIs and clients.
//!
//! This module contains the chat transport used by the react-bot. The service
//! defines both a generic trait and a concrete Slack implementation, allowing for
//! extensibility and easy testing.

pub mod chat;
