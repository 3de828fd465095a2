//! Slack implementation of the chat transport.
//!
//! Slack retired the RTM API, so the real-time connection is a Socket Mode listener.
//! Pushed message events are queued by the listener callback and drained by `poll`.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::{errors::SlackClientError, prelude::*};
use tokio::sync::{
    Mutex,
    mpsc::{self, error::TryRecvError},
};
use tracing::{info, instrument, trace, warn};

use crate::base::{
    config::Config,
    types::{Acknowledgment, Action, Event, Res, SessionIdentity},
};

use super::{ChatClient, GenericChatClient, TransportError};

// Type aliases.

type Connector = SlackClientHyperConnector<HttpsConnector<HttpConnector>>;
type FullClient = slack_morphism::SlackClient<Connector>;
type SocketModeListener = SlackClientSocketModeListener<Connector>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub fn slack(config: &Config) -> Res<Self> {
        let client = SlackChatClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackMessageEvent> for Event {
    fn from(message: SlackMessageEvent) -> Self {
        Self {
            author: message.sender.user.map(|u| u.0),
            channel: message.origin.channel.map(|c| c.0),
            ts: message.origin.ts.0,
        }
    }
}

// Structs.

/// User state for the slack socket client.
///
/// Owned by the listener environment; the receiving end lives in [`SlackConnection`].
struct SlackEventFeed {
    sender: mpsc::UnboundedSender<Event>,
    healthy: Arc<AtomicBool>,
}

/// A live Socket Mode listener and the queue it feeds.
struct SlackConnection {
    listener: Arc<SocketModeListener>,
    events: mpsc::UnboundedReceiver<Event>,
    healthy: Arc<AtomicBool>,
}

/// Slack client implementation.
struct SlackChatClient {
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    client: Arc<FullClient>,
    connection: Mutex<Option<SlackConnection>>,
}

impl SlackChatClient {
    /// Create a new Slack chat client; no connection is made until `connect`.
    pub fn new(config: &Config) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        Ok(Self {
            app_token,
            bot_token,
            client,
            connection: Mutex::new(None),
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    #[instrument(name = "SlackChatClient::connect", skip_all)]
    async fn connect(&self) -> Result<SessionIdentity, TransportError> {
        let mut connection = self.connection.lock().await;

        // Tear down the previous listener, if any.

        if let Some(previous) = connection.take() {
            previous.listener.shutdown().await;
        }

        // Get the bot's user ID.

        let session = self.client.open_session(&self.bot_token);
        let bot_user = session.auth_test().await.map_err(|e| TransportError::Connection(e.to_string()))?;
        let identity = SessionIdentity::new(bot_user.user_id.0);

        info!("Slack bot user ID: {}", identity);

        // Initialize the socket mode listener.

        let (sender, events) = mpsc::unbounded_channel();
        let healthy = Arc::new(AtomicBool::new(true));

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

        let listener_environment = Arc::new(
            SlackClientEventsListenerEnvironment::new(self.client.clone())
                .with_error_handler(handle_listener_error)
                .with_user_state(SlackEventFeed { sender, healthy: healthy.clone() }),
        );

        let listener = Arc::new(SlackClientSocketModeListener::new(&SlackClientSocketModeConfig::new(), listener_environment, socket_mode_callbacks));

        // Register the app token and open the WS connections.

        listener.listen_for(&self.app_token).await.map_err(|e| TransportError::Connection(e.to_string()))?;
        listener.start().await;

        *connection = Some(SlackConnection { listener, events, healthy });

        Ok(identity)
    }

    async fn poll(&self) -> Result<Vec<Event>, TransportError> {
        let mut connection = self.connection.lock().await;

        let Some(connection) = connection.as_mut() else {
            return Err(TransportError::Transient("not connected".to_string()));
        };

        let mut events = Vec::new();

        loop {
            match connection.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if events.is_empty() => return Err(TransportError::Transient("event feed closed".to_string())),
                Err(TryRecvError::Disconnected) => break,
            }
        }

        // Hand out what already arrived; the next poll reports the drop.
        if events.is_empty() && !connection.healthy.load(Ordering::Acquire) {
            return Err(TransportError::Transient("socket mode listener reported an error".to_string()));
        }

        Ok(events)
    }

    #[instrument(skip(self))]
    async fn invoke_action(&self, action: Action, channel_id: &str, payload: &str, message_ts: &str) -> Result<Acknowledgment, TransportError> {
        let session = self.client.open_session(&self.bot_token);

        let result = match action {
            Action::AddReaction => {
                let request = SlackApiReactionsAddRequest {
                    channel: SlackChannelId(channel_id.to_string()),
                    name: SlackReactionName(payload.to_string()),
                    timestamp: SlackTs(message_ts.to_string()),
                };

                session.reactions_add(&request).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => Ok(Acknowledgment::ok()),
            Err(SlackClientError::ApiError(ae)) => Ok(Acknowledgment::rejected(ae.code)),
            Err(e) => Err(TransportError::Call(format!("{}: {}", action.method(), e))),
        }
    }
}

// Socket mode listener callbacks for Slack.

/// Forwards message events into the poll queue.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let SlackEventCallbackBody::Message(message) = event_callback.event else {
        trace!("Ignoring non-message push event.");
        return Ok(());
    };

    let states = states.read().await;
    let feed = states.get_user_state::<SlackEventFeed>().ok_or(anyhow::anyhow!("Failed to get event feed"))?;

    if feed.sender.send(Event::from(message)).is_err() {
        warn!("Dropping message event; nobody is polling.");
    }

    Ok(())
}

/// Marks the connection unhealthy so the next poll triggers a reconnect.
fn handle_listener_error(err: Box<dyn std::error::Error + Send + Sync>, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> HttpStatusCode {
    warn!("Socket mode listener error: {}", err);

    match states.try_read() {
        Ok(states) => {
            if let Some(feed) = states.get_user_state::<SlackEventFeed>() {
                feed.healthy.store(false, Ordering::Release);
            }
        }
        Err(_) => warn!("Listener state busy; connection health not updated."),
    }

    HttpStatusCode::OK
}
