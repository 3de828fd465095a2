//! Per-event decisions for react-bot.
//!
//! This module provides the policy applied to each polled event:
//! - Deciding whether an event qualifies for a reaction, and which one
//! - Throttling reactions with a shared cooldown counter

pub mod rate_gate;
pub mod responder;
