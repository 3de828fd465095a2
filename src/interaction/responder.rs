//! Decides which events get a reaction and picks the reaction.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::base::types::{Event, SessionIdentity, Vocabulary, WatchSet};

/// Whether `event` qualifies for a reaction.
///
/// The bot never reacts to its own messages, and only reacts in watched channels.
/// An event without a channel is never in the watch set.
pub fn should_respond(event: &Event, self_id: &SessionIdentity, watch_set: &WatchSet) -> bool {
    if event.author.as_deref() == Some(self_id.as_str()) {
        return false;
    }

    event.channel.as_deref().is_some_and(|channel| watch_set.contains(channel))
}

/// Picks one reaction uniformly at random.
pub fn choose_response<'a, R>(vocabulary: &'a Vocabulary, rng: &mut R) -> &'a str
where
    R: Rng + ?Sized,
{
    let payloads = vocabulary.payloads();

    // `Vocabulary` is never empty.
    &payloads[rng.random_range(0..payloads.len())]
}

/// The configured policy, plus the random source used to pick reactions.
pub struct Responder {
    watch_set: WatchSet,
    vocabulary: Vocabulary,
    rng: StdRng,
}

impl Responder {
    pub fn new(watch_set: WatchSet, vocabulary: Vocabulary) -> Self {
        Self {
            watch_set,
            vocabulary,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a responder with a specific seed (for reproducible testing).
    pub fn with_seed(watch_set: WatchSet, vocabulary: Vocabulary, seed: u64) -> Self {
        Self {
            watch_set,
            vocabulary,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn should_respond(&self, event: &Event, self_id: &SessionIdentity) -> bool {
        should_respond(event, self_id, &self.watch_set)
    }

    pub fn choose_response(&mut self) -> &str {
        choose_response(&self.vocabulary, &mut self.rng)
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }
}

// Tests.
