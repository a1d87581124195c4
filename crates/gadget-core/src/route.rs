//! Route descriptors and the handler interface.

use crate::event::{ChannelMessageEvent, CommandInvocation, MentionEvent};
use crate::registry::Registry;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Permission entry that opens a route to everyone.
pub const WILDCARD: &str = "*";

/// Metadata shared by every route kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Unique within its category.
    pub name: String,
    /// Regular expression the triggering text must match.
    pub pattern: String,
    pub description: String,
    pub help: String,
    /// Groups allowed to run this route. Empty or `*` means everyone.
    pub permissions: Vec<String>,
    /// Higher runs first.
    pub priority: i32,
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// True if anyone may run this route.
    pub fn is_open(&self) -> bool {
        self.permissions.is_empty() || self.permissions.iter().any(|p| p == WILDCARD)
    }
}

/// The three trigger kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Mention,
    ChannelMessage,
    Command,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Mention => "mention",
            Category::ChannelMessage => "channel_message",
            Category::Command => "command",
        };
        f.write_str(name)
    }
}

/// Everything a handler receives when its route runs.
pub struct Request<E> {
    /// The route being executed.
    pub route: Route,
    pub event: E,
    /// Triggering text with the bot's own mention removed.
    pub message: String,
    /// Capture groups of the route pattern against `message`; index 0 is
    /// the whole match. Empty for default and denied routes.
    pub captures: Vec<Option<String>>,
    /// All registered routes.
    pub registry: Arc<Registry>,
}

impl<E> Request<E> {
    /// Capture group by index, if it participated in the match.
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref())
    }
}

impl<E: fmt::Debug> fmt::Debug for Request<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("route", &self.route.name)
            .field("event", &self.event)
            .field("message", &self.message)
            .field("captures", &self.captures)
            .finish()
    }
}

/// Work performed when a route is selected.
///
/// Handlers run on their own task; an `Err` or a panic is logged by the
/// task runner and never reaches the dispatcher.
#[async_trait]
pub trait Handler<E>: Send + Sync {
    async fn handle(&self, request: Request<E>) -> anyhow::Result<()>;
}

/// Handler backed by an async closure. Built with [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

#[async_trait]
impl<E, F, Fut> Handler<E> for HandlerFn<F>
where
    E: Send + 'static,
    F: Fn(Request<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, request: Request<E>) -> anyhow::Result<()> {
        (self.f)(request).await
    }
}

/// A route for an event category together with its handler.
pub struct EventRoute<E> {
    pub route: Route,
    pub handler: Arc<dyn Handler<E>>,
}

impl<E> EventRoute<E> {
    pub fn new<H>(route: Route, handler: H) -> Self
    where
        H: Handler<E> + 'static,
    {
        Self {
            route,
            handler: Arc::new(handler),
        }
    }
}

pub type MentionRoute = EventRoute<MentionEvent>;
pub type ChannelMessageRoute = EventRoute<ChannelMessageEvent>;

/// A route triggered by a literal command token.
pub struct CommandRoute {
    pub route: Route,
    /// Command token, e.g. "/deploy".
    pub command: String,
    /// Text sent back synchronously before the handler runs.
    pub immediate_response: Option<String>,
    pub handler: Arc<dyn Handler<CommandInvocation>>,
}

impl CommandRoute {
    pub fn new<H>(route: Route, command: impl Into<String>, handler: H) -> Self
    where
        H: Handler<CommandInvocation> + 'static,
    {
        Self {
            route,
            command: command.into(),
            immediate_response: None,
            handler: Arc::new(handler),
        }
    }

    pub fn with_immediate_response(mut self, text: impl Into<String>) -> Self {
        self.immediate_response = Some(text.into());
        self
    }
}
