//! The connect → poll → react loop, and its reconnect handling.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Action, Event, Res, SessionIdentity, Void},
    },
    interaction::{rate_gate::RateGate, responder::Responder},
    service::chat::{ChatClient, TransportError},
};

/// How a poll cycle failed.
///
/// Only a dropped connection forces a reconnect; anything else is logged and the
/// loop carries on with the next cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Transient(TransportError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<TransportError> for CycleError {
    fn from(err: TransportError) -> Self {
        if err.is_transient() { CycleError::Transient(err) } else { CycleError::Other(err.into()) }
    }
}

/// Runtime state for the event loop.
///
/// Owns everything the loop touches; nothing here is shared across tasks.
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat client instance.
    pub chat: ChatClient,
    responder: Responder,
    gate: RateGate,
    session: Option<SessionIdentity>,
}

impl Runtime {
    /// Create a new runtime instance backed by Slack.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        let chat = ChatClient::slack(&config)?;
        let responder = Responder::new(config.watch_channels.clone(), config.emoji_responses.clone());

        if responder.watch_set().is_empty() {
            warn!("No watch channels configured; the bot will never react.");
        }

        Ok(Self::with_parts(config, chat, responder))
    }

    /// Assemble a runtime from existing parts.
    pub fn with_parts(config: Config, chat: ChatClient, responder: Responder) -> Self {
        let gate = RateGate::new(config.cooldown_cycles, config.cooldown_scope);

        Self {
            config,
            chat,
            responder,
            gate,
            session: None,
        }
    }

    /// The identity from the most recent successful connect.
    pub fn session(&self) -> Option<&SessionIdentity> {
        self.session.as_ref()
    }

    /// Connect (or reconnect) and refresh the session identity.
    #[instrument(skip_all)]
    pub async fn connect(&mut self) -> Void {
        let identity = self.chat.connect().await?;

        debug!("Connected. Bot id: {}", identity);

        self.session = Some(identity);

        Ok(())
    }

    /// Connect, then poll forever at the configured cadence.
    ///
    /// Returns only when a connect attempt fails.
    pub async fn start(&mut self) -> Void {
        self.connect().await?;

        info!(interval_ms = self.config.poll_interval.as_millis() as u64, "Polling for events ...");

        loop {
            self.step().await?;
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Run one poll cycle and recover from its failure.
    ///
    /// A dropped connection is re-established immediately (after the optional
    /// reconnect delay); any other failure is logged. Only a failed reconnect is returned.
    pub async fn step(&mut self) -> Void {
        match self.run_cycle().await {
            Ok(()) => {}
            Err(CycleError::Transient(err)) => {
                debug!("{}", err);

                if !self.config.reconnect_delay.is_zero() {
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }

                self.connect().await?;
            }
            Err(CycleError::Other(err)) => {
                error!("Error while handling poll cycle: {:?}", err);
            }
        }

        Ok(())
    }

    /// Poll once and react to qualifying events, subject to the cooldown.
    #[instrument(skip_all)]
    pub async fn run_cycle(&mut self) -> Result<(), CycleError> {
        self.gate.begin_cycle();

        let Some(self_id) = self.session.clone() else {
            return Err(CycleError::Transient(TransportError::Transient("no session".to_string())));
        };

        let events = self.chat.poll().await?;

        for event in events {
            if self.responder.should_respond(&event, &self_id) && self.gate.is_open() {
                self.respond(&event).await?;
                self.gate.trip();
            }

            self.gate.tick();
        }

        Ok(())
    }

    /// React to a single qualifying event.
    async fn respond(&mut self, event: &Event) -> Result<(), CycleError> {
        if event.author.is_none() {
            let body = serde_json::to_string(event).unwrap_or_else(|_| format!("{:?}", event));
            warn!("Skipping message without an author: {}", body);
            return Ok(());
        }

        let Some(channel) = event.channel.as_deref() else {
            return Ok(());
        };

        let emoji = self.responder.choose_response().to_string();
        let lag_ms = event.sent_at().map(|sent_at| (Utc::now() - sent_at).num_milliseconds());

        debug!(channel, ts = %event.ts, emoji = %emoji, lag_ms, "Responding to message ...");

        let ack = self.chat.invoke_action(Action::AddReaction, channel, &emoji, &event.ts).await?;

        if !ack.ok {
            warn!(channel, ts = %event.ts, "{} rejected: {}", Action::AddReaction.method(), ack.error.as_deref().unwrap_or("unknown error"));
        }

        Ok(())
    }
}

// Tests.
