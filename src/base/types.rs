//! Shared result aliases and the values that flow through the event loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application error type.
pub type Err = anyhow::Error;
/// Application result type.
pub type Res<T> = Result<T, Err>;
/// Result with no value.
pub type Void = Res<()>;

/// The bot's own participant identifier, as reported by the platform at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity(pub String);

impl SessionIdentity {
    /// Wrap a platform user ID.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(user_id.into())
    }

    /// The raw user ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw list form accepted from configuration: either `"a, b, c"` or `["a", "b", "c"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListRepr {
    Joined(String),
    Items(Vec<String>),
}

impl ListRepr {
    fn into_items(self) -> Vec<String> {
        let items = match self {
            ListRepr::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            ListRepr::Items(items) => items,
        };

        items.into_iter().map(|i| i.trim().to_string()).filter(|i| !i.is_empty()).collect()
    }
}

/// The channels the bot pays attention to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "ListRepr")]
pub struct WatchSet(Vec<String>);

impl WatchSet {
    /// Build a watch set from channel IDs.
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(channels.into_iter().map(Into::into).collect())
    }

    /// Whether `channel` is watched.
    pub fn contains(&self, channel: &str) -> bool {
        self.0.iter().any(|c| c == channel)
    }

    /// Whether no channel is watched.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn channels(&self) -> &[String] {
        &self.0
    }
}

impl From<ListRepr> for WatchSet {
    fn from(repr: ListRepr) -> Self {
        Self(repr.into_items())
    }
}

/// The pool of reaction names a response is drawn from.
///
/// Never empty: construction fails instead, so an empty pool surfaces at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ListRepr")]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    /// Build a vocabulary; fails when `payloads` is empty.
    pub fn new<I, S>(payloads: I) -> Res<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let payloads: Vec<String> = payloads.into_iter().map(Into::into).collect();

        if payloads.is_empty() {
            return Err(anyhow::anyhow!("At least one emoji response must be configured."));
        }

        Ok(Self(payloads))
    }

    /// The configured reaction names, in order.
    pub fn payloads(&self) -> &[String] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, payload: &str) -> bool {
        self.0.iter().any(|p| p == payload)
    }
}

impl TryFrom<ListRepr> for Vocabulary {
    type Error = Err;

    fn try_from(repr: ListRepr) -> Res<Self> {
        Self::new(repr.into_items())
    }
}

/// A single inbound message event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Author user ID; absent for some message subtypes.
    pub author: Option<String>,
    /// Origin channel ID.
    pub channel: Option<String>,
    /// Message timestamp, which doubles as the message identifier.
    pub ts: String,
}

impl Event {
    /// Wall-clock time the message was sent, decoded from its `ts`.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        let (secs, frac) = self.ts.split_once('.').unwrap_or((&self.ts, "0"));

        let secs = secs.parse::<i64>().ok()?;
        let micros = format!("{frac:0<6}").get(..6)?.parse::<u32>().ok()?;

        DateTime::from_timestamp(secs, micros * 1_000)
    }
}

/// Remote actions the bot knows how to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Add an emoji reaction to a message.
    AddReaction,
}

impl Action {
    /// The platform method name for this action.
    pub fn method(&self) -> &'static str {
        match self {
            Action::AddReaction => "reactions.add",
        }
    }
}

/// Structured reply to a remote action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    /// Whether the platform accepted the action.
    pub ok: bool,
    /// Platform error code when it did not.
    pub error: Option<String>,
}

impl Acknowledgment {
    /// A successful acknowledgment.
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    /// A rejection carrying the platform's error code.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self { ok: false, error: Some(error.into()) }
    }
}

// Tests.
