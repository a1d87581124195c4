//! Per-request decision procedure: verify, decode, select, authorize,
//! then hand the chosen route to the task runner.

use crate::collaborator::{EventDecoder, SignatureVerifier};
use crate::error::DispatchError;
use crate::event::{
    CallbackEvent, ChannelMessageEvent, CommandInvocation, InboundEvent, MentionEvent,
};
use crate::identity::BotIdentity;
use crate::matcher::CompiledRoute;
use crate::permission::PermissionEvaluator;
use crate::registry::Registry;
use crate::route::Request;
use crate::runner::{TaskContext, TaskOutcome, TaskRunner};
use http::HeaderMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use user_store::{User, UserStore};

/// Reply text for command tokens with no registered route.
pub const UNKNOWN_COMMAND_TEXT: &str = "Unknown command.";

/// What the caller should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Echo the handshake value as plain text.
    Challenge(String),
    /// A callback was routed; empty success.
    Accepted,
    /// A callback was acknowledged without routing; empty success.
    Ignored,
    /// Reply with an ephemeral message.
    Ephemeral(String),
    /// A command was accepted with nothing to say; empty success.
    Empty,
}

/// Result of dispatching one request.
#[derive(Debug)]
pub struct Dispatch {
    pub outcome: Outcome,
    /// A Denied Route replaced the selected one.
    pub denied: bool,
    /// The handler task, if one was scheduled.
    pub task: Option<JoinHandle<TaskOutcome>>,
}

impl Dispatch {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            denied: false,
            task: None,
        }
    }

    fn ignored() -> Self {
        Self::new(Outcome::Ignored)
    }
}

/// Route chosen for an event, with the capture groups of its pattern.
struct Selection<E> {
    route: Arc<CompiledRoute<E>>,
    captures: Vec<Option<String>>,
}

impl<E> Selection<E> {
    fn matched(route: &Arc<CompiledRoute<E>>, message: &str) -> Self {
        Self {
            route: Arc::clone(route),
            captures: route.captures(message),
        }
    }

    fn fixed(route: &Arc<CompiledRoute<E>>) -> Self {
        Self {
            route: Arc::clone(route),
            captures: Vec::new(),
        }
    }
}

/// The routing engine.
///
/// Shared behind an `Arc`; the registry is read-only and the bot identity
/// is the only state written after construction.
pub struct Dispatcher {
    registry: Arc<Registry>,
    store: Arc<dyn UserStore>,
    verifier: Arc<dyn SignatureVerifier>,
    decoder: Arc<dyn EventDecoder>,
    identity: Arc<BotIdentity>,
    permissions: PermissionEvaluator,
    runner: TaskRunner,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn UserStore>,
        verifier: Arc<dyn SignatureVerifier>,
        decoder: Arc<dyn EventDecoder>,
    ) -> Self {
        Self {
            registry,
            permissions: PermissionEvaluator::new(store.clone()),
            store,
            verifier,
            decoder,
            identity: Arc::new(BotIdentity::new()),
            runner: TaskRunner::new(),
        }
    }

    /// Use a shared identity cell, e.g. one that is already resolved.
    pub fn with_identity(mut self, identity: Arc<BotIdentity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_runner(mut self, runner: TaskRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn bot_identity(&self) -> &BotIdentity {
        &self.identity
    }

    /// Handle an event-endpoint request.
    pub async fn handle_event(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Dispatch, DispatchError> {
        self.verifier
            .verify(headers, body)
            .map_err(DispatchError::Authentication)?;

        let event = self
            .decoder
            .decode_event(body)
            .map_err(DispatchError::UnparseableEvent)?;

        match event {
            InboundEvent::Challenge(challenge) => {
                debug!("URL verification challenge");
                Ok(Dispatch::new(Outcome::Challenge(challenge)))
            }
            InboundEvent::Callback(callback) => self.route_callback(body, callback).await,
        }
    }

    /// Handle a command-endpoint request.
    pub async fn handle_command(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Dispatch, DispatchError> {
        self.verifier
            .verify(headers, body)
            .map_err(DispatchError::Authentication)?;

        let command = self
            .decoder
            .decode_command(body)
            .map_err(DispatchError::MalformedInput)?;

        self.route_command(command).await
    }

    async fn route_callback(
        &self,
        raw: &[u8],
        callback: CallbackEvent,
    ) -> Result<Dispatch, DispatchError> {
        self.identity.resolve(raw)?;

        let actor = match callback.actor() {
            Some(actor) if !actor.is_empty() => actor,
            _ => {
                debug!(kind = %callback.kind(), "Ignoring event without an actor");
                return Ok(Dispatch::ignored());
            }
        };

        if self.identity.is_self(actor) {
            debug!(kind = %callback.kind(), "Ignoring event produced by the bot");
            return Ok(Dispatch::ignored());
        }

        match callback {
            CallbackEvent::Mention(event) => self.route_mention(event).await,
            CallbackEvent::ChannelMessage(event) => self.route_channel_message(event).await,
            CallbackEvent::Unsupported { kind, .. } => {
                debug!(kind = %kind, "Ignoring unsupported event");
                Ok(Dispatch::ignored())
            }
        }
    }

    #[instrument(skip_all, fields(user = %event.user, channel = %event.channel))]
    async fn route_mention(&self, event: MentionEvent) -> Result<Dispatch, DispatchError> {
        let user = self.store.find_or_create_user(&event.user).await?;
        let message = self.identity.strip_mention(&event.text);

        let selection = match self.registry.select_mention(&message) {
            Some(route) => Selection::matched(route, &message),
            None => match self.registry.default_mention_route() {
                Some(route) => Selection::fixed(route),
                None => {
                    warn!("No mention route matched and no default route is registered");
                    return Ok(Dispatch::ignored());
                }
            },
        };

        let (selection, denied) = self
            .authorize(&user, selection, self.registry.denied_mention_route())
            .await?;

        let task = selection.map(|selection| {
            debug!(user = %user.id, route = %selection.route.name(), "{}", message);
            let channel = event.channel.clone();
            self.execute(selection, event, message, &user, &channel)
        });

        Ok(Dispatch {
            outcome: Outcome::Accepted,
            denied,
            task,
        })
    }

    #[instrument(skip_all, fields(user = %event.user, channel = %event.channel))]
    async fn route_channel_message(
        &self,
        event: ChannelMessageEvent,
    ) -> Result<Dispatch, DispatchError> {
        let user = self.store.find_or_create_user(&event.user).await?;
        let message = self.identity.strip_mention(&event.text);

        let selection = match self.registry.select_channel_message(&message) {
            Some(route) => Selection::matched(route, &message),
            None => return Err(DispatchError::NoRouteMatched),
        };

        let (selection, denied) = self
            .authorize(&user, selection, self.registry.denied_channel_message_route())
            .await?;

        let task = selection.map(|selection| {
            debug!(user = %user.id, route = %selection.route.name(), "{}", message);
            let channel = event.channel.clone();
            self.execute(selection, event, message, &user, &channel)
        });

        Ok(Dispatch {
            outcome: Outcome::Accepted,
            denied,
            task,
        })
    }

    #[instrument(skip_all, fields(command = %command.command, user = %command.user_id))]
    async fn route_command(&self, command: CommandInvocation) -> Result<Dispatch, DispatchError> {
        let Some(route) = self.registry.command_route(&command.command).cloned() else {
            debug!("Unknown command");
            return Ok(Dispatch::new(Outcome::Ephemeral(UNKNOWN_COMMAND_TEXT.to_string())));
        };

        let user = self.store.find_or_create_user(&command.user_id).await?;
        let message = command.text.clone();
        let channel = command.channel_id.clone();

        if !self.permissions.can(&user, &route.route().permissions).await? {
            warn!(user = %user.id, route = %route.name(), "Permission failure");

            let Some(denied) = self.registry.denied_command_route().cloned() else {
                return Ok(Dispatch {
                    outcome: Outcome::Empty,
                    denied: true,
                    task: None,
                });
            };

            let outcome = acknowledgement(denied.immediate_response());
            let selection = Selection::fixed(denied.compiled());
            let task = self.execute(selection, command, message, &user, &channel);
            return Ok(Dispatch {
                outcome,
                denied: true,
                task: Some(task),
            });
        }

        debug!(user = %user.id, route = %route.name(), "Slash command");
        let outcome = acknowledgement(route.immediate_response());
        let selection = Selection::matched(route.compiled(), &message);
        let task = self.execute(selection, command, message, &user, &channel);

        Ok(Dispatch {
            outcome,
            denied: false,
            task: Some(task),
        })
    }

    /// Check the selected route against the actor's groups, substituting
    /// the denied route on refusal. `None` means nothing should run.
    async fn authorize<E>(
        &self,
        user: &User,
        selection: Selection<E>,
        denied_route: Option<&Arc<CompiledRoute<E>>>,
    ) -> Result<(Option<Selection<E>>, bool), DispatchError> {
        if self
            .permissions
            .can(user, &selection.route.route().permissions)
            .await?
        {
            return Ok((Some(selection), false));
        }

        warn!(user = %user.id, route = %selection.route.name(), "Permission failure");
        match denied_route {
            Some(route) => Ok((Some(Selection::fixed(route)), true)),
            None => {
                warn!("No denied route registered for this category");
                Ok((None, true))
            }
        }
    }

    fn execute<E: Send + 'static>(
        &self,
        selection: Selection<E>,
        event: E,
        message: String,
        user: &User,
        channel: &str,
    ) -> JoinHandle<TaskOutcome> {
        let Selection { route, captures } = selection;
        let handler = route.handler();
        let request = Request {
            route: route.route().clone(),
            event,
            message,
            captures,
            registry: Arc::clone(&self.registry),
        };
        let context = TaskContext::new(route.name())
            .with_user(user.id.as_str())
            .with_channel(channel);

        self.runner
            .spawn(context, async move { handler.handle(request).await })
    }
}

fn acknowledgement(text: Option<&str>) -> Outcome {
    match text {
        Some(text) => Outcome::Ephemeral(text.to_string()),
        None => Outcome::Empty,
    }
}
