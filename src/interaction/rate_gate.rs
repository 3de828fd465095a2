//! A single shared cooldown that suppresses bursts of reactions.
//!
//! The counter is event-counted, not wall-clock based: a reaction resets it to the
//! configured cooldown, and every processed event counts it down by one. Reactions
//! are allowed only while it is below one.

use serde::Deserialize;

/// How long the counter survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CooldownScope {
    /// Reset to zero at the start of every poll, so it only throttles within one batch.
    #[default]
    Batch,
    /// Carried across polls, additionally counting down once per poll.
    Global,
}

/// The shared cooldown counter, owned by the event loop.
#[derive(Debug, Clone)]
pub struct RateGate {
    counter: i64,
    cooldown: i64,
    scope: CooldownScope,
}

impl RateGate {
    pub fn new(cooldown: u32, scope: CooldownScope) -> Self {
        Self {
            counter: 0,
            cooldown: i64::from(cooldown),
            scope,
        }
    }

    /// Called once at the start of each poll cycle.
    pub fn begin_cycle(&mut self) {
        match self.scope {
            CooldownScope::Batch => self.counter = 0,
            CooldownScope::Global => self.tick(),
        }
    }

    /// Whether a reaction is allowed right now.
    pub fn is_open(&self) -> bool {
        self.counter < 1
    }

    /// Record a reaction; closes the gate for the cooldown period.
    pub fn trip(&mut self) {
        self.counter = self.cooldown;
    }

    /// Count down by one; called once per processed event.
    pub fn tick(&mut self) {
        self.counter = self.counter.saturating_sub(1);
    }

    #[cfg(test)]
    pub(crate) fn counter(&self) -> i64 {
        self.counter
    }
}

// Tests.
