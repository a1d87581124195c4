//! The route registry: per-category route tables plus the default and
//! denied slots.

use crate::error::RouteError;
use crate::event::{ChannelMessageEvent, CommandInvocation, MentionEvent};
use crate::matcher::{CompiledRoute, RouteTable};
use crate::route::{Category, ChannelMessageRoute, CommandRoute, EventRoute, MentionRoute, Route};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A compiled command route, keyed by its command token.
pub struct CompiledCommand {
    inner: Arc<CompiledRoute<CommandInvocation>>,
    command: String,
    immediate_response: Option<String>,
}

impl CompiledCommand {
    fn compile(def: CommandRoute) -> Result<Self, RouteError> {
        let inner = Arc::new(CompiledRoute::compile(EventRoute {
            route: def.route,
            handler: def.handler,
        })?);

        Ok(Self {
            inner,
            command: def.command,
            immediate_response: def.immediate_response,
        })
    }

    pub fn compiled(&self) -> &Arc<CompiledRoute<CommandInvocation>> {
        &self.inner
    }

    pub fn route(&self) -> &Route {
        self.inner.route()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn immediate_response(&self) -> Option<&str> {
        self.immediate_response.as_deref()
    }
}

impl fmt::Debug for CompiledCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCommand")
            .field("command", &self.command)
            .field("route", self.inner.route())
            .field("immediate_response", &self.immediate_response)
            .finish()
    }
}

/// A registered route together with the category it was registered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredRoute {
    pub route: Route,
    pub category: Category,
}

/// Every route known to the bot.
///
/// Populated during setup, then shared read-only behind an `Arc`.
#[derive(Default)]
pub struct Registry {
    mentions: RouteTable<MentionEvent>,
    channel_messages: RouteTable<ChannelMessageEvent>,
    commands: HashMap<String, Arc<CompiledCommand>>,
    default_mention: Option<Arc<CompiledRoute<MentionEvent>>>,
    denied_mention: Option<Arc<CompiledRoute<MentionEvent>>>,
    denied_channel_message: Option<Arc<CompiledRoute<ChannelMessageEvent>>>,
    denied_command: Option<Arc<CompiledCommand>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mention route, replacing any route with the same name.
    pub fn add_mention_route(&mut self, route: MentionRoute) -> Result<(), RouteError> {
        debug!(route = %route.route.name, "Registering mention route");
        self.mentions.insert(route)
    }

    pub fn add_mention_routes(
        &mut self,
        routes: impl IntoIterator<Item = MentionRoute>,
    ) -> Result<(), RouteError> {
        routes
            .into_iter()
            .try_for_each(|route| self.add_mention_route(route))
    }

    /// Register a channel-message route, replacing any route with the same name.
    pub fn add_channel_message_route(
        &mut self,
        route: ChannelMessageRoute,
    ) -> Result<(), RouteError> {
        debug!(route = %route.route.name, "Registering channel message route");
        self.channel_messages.insert(route)
    }

    pub fn add_channel_message_routes(
        &mut self,
        routes: impl IntoIterator<Item = ChannelMessageRoute>,
    ) -> Result<(), RouteError> {
        routes
            .into_iter()
            .try_for_each(|route| self.add_channel_message_route(route))
    }

    /// Register a command route keyed by its command token.
    pub fn add_command_route(&mut self, route: CommandRoute) -> Result<(), RouteError> {
        if route.route.name.is_empty() {
            return Err(RouteError::MissingName);
        }
        if route.command.is_empty() {
            return Err(RouteError::MissingCommand(route.route.name));
        }

        debug!(route = %route.route.name, command = %route.command, "Registering command route");
        let compiled = CompiledCommand::compile(route)?;
        if let Some(previous) = self
            .commands
            .insert(compiled.command.clone(), Arc::new(compiled))
        {
            warn!(
                command = %previous.command,
                route = %previous.name(),
                "Command route replaced"
            );
        }
        Ok(())
    }

    pub fn add_command_routes(
        &mut self,
        routes: impl IntoIterator<Item = CommandRoute>,
    ) -> Result<(), RouteError> {
        routes
            .into_iter()
            .try_for_each(|route| self.add_command_route(route))
    }

    /// Route run when no mention route matches.
    pub fn set_default_mention_route(&mut self, route: MentionRoute) -> Result<(), RouteError> {
        self.default_mention = Some(Arc::new(CompiledRoute::compile(route)?));
        Ok(())
    }

    /// Route run in place of a mention route the actor may not use.
    pub fn set_denied_mention_route(&mut self, route: MentionRoute) -> Result<(), RouteError> {
        self.denied_mention = Some(Arc::new(CompiledRoute::compile(route)?));
        Ok(())
    }

    /// Route run in place of a channel-message route the actor may not use.
    pub fn set_denied_channel_message_route(
        &mut self,
        route: ChannelMessageRoute,
    ) -> Result<(), RouteError> {
        self.denied_channel_message = Some(Arc::new(CompiledRoute::compile(route)?));
        Ok(())
    }

    /// Route run in place of a command the actor may not use.
    pub fn set_denied_command_route(&mut self, route: CommandRoute) -> Result<(), RouteError> {
        self.denied_command = Some(Arc::new(CompiledCommand::compile(route)?));
        Ok(())
    }

    pub fn mention_route(&self, name: &str) -> Option<&Arc<CompiledRoute<MentionEvent>>> {
        self.mentions.get(name)
    }

    pub fn channel_message_route(
        &self,
        name: &str,
    ) -> Option<&Arc<CompiledRoute<ChannelMessageEvent>>> {
        self.channel_messages.get(name)
    }

    /// Look up a command route by its literal token, e.g. "/deploy".
    pub fn command_route(&self, command: &str) -> Option<&Arc<CompiledCommand>> {
        self.commands.get(command)
    }

    /// Look up a route's metadata by category and name.
    pub fn lookup(&self, category: Category, name: &str) -> Option<&Route> {
        match category {
            Category::Mention => self.mentions.get(name).map(|r| r.route()),
            Category::ChannelMessage => self.channel_messages.get(name).map(|r| r.route()),
            Category::Command => self
                .commands
                .values()
                .find(|c| c.name() == name)
                .map(|c| c.route()),
        }
    }

    pub fn select_mention(&self, text: &str) -> Option<&Arc<CompiledRoute<MentionEvent>>> {
        self.mentions.select(text)
    }

    pub fn select_channel_message(
        &self,
        text: &str,
    ) -> Option<&Arc<CompiledRoute<ChannelMessageEvent>>> {
        self.channel_messages.select(text)
    }

    pub fn default_mention_route(&self) -> Option<&Arc<CompiledRoute<MentionEvent>>> {
        self.default_mention.as_ref()
    }

    pub fn denied_mention_route(&self) -> Option<&Arc<CompiledRoute<MentionEvent>>> {
        self.denied_mention.as_ref()
    }

    pub fn denied_channel_message_route(
        &self,
    ) -> Option<&Arc<CompiledRoute<ChannelMessageEvent>>> {
        self.denied_channel_message.as_ref()
    }

    pub fn denied_command_route(&self) -> Option<&Arc<CompiledCommand>> {
        self.denied_command.as_ref()
    }

    /// All mention, channel-message and command routes, by priority
    /// descending then name. Default and denied routes are not included.
    pub fn registered_routes(&self) -> Vec<RegisteredRoute> {
        let mentions = self.mentions.sorted().iter().map(|r| RegisteredRoute {
            route: r.route().clone(),
            category: Category::Mention,
        });
        let channel_messages = self.channel_messages.sorted().iter().map(|r| RegisteredRoute {
            route: r.route().clone(),
            category: Category::ChannelMessage,
        });
        let commands = self.commands.values().map(|c| RegisteredRoute {
            route: c.route().clone(),
            category: Category::Command,
        });

        let mut routes: Vec<RegisteredRoute> =
            mentions.chain(channel_messages).chain(commands).collect();
        routes.sort_by(|a, b| {
            b.route
                .priority
                .cmp(&a.route.priority)
                .then_with(|| a.route.name.cmp(&b.route.name))
        });
        routes
    }

    /// Number of registered routes, excluding default and denied slots.
    pub fn len(&self) -> usize {
        self.mentions.len() + self.channel_messages.len() + self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("mentions", &self.mentions.len())
            .field("channel_messages", &self.channel_messages.len())
            .field("commands", &self.commands.len())
            .field("has_default_mention", &self.default_mention.is_some())
            .finish()
    }
}
