//! Built-in feature modules.
//!
//! Each module exposes the routes it contributes; [`register_all`] wires
//! them into a registry at startup.

mod dice;
mod eightball;
mod fallback;
mod groups;
mod help;
mod permission_denied;
mod user_info;

pub use permission_denied::PERMISSION_DENIED_TEXT;

use gadget_core::{Registry, RouteError};
use slack_client::{MessageOptions, SlackClient};
use std::sync::Arc;
use tracing::{error, info};
use user_store::UserStore;

/// Name of the group allowed to manage groups and look up users.
pub const ADMINS_GROUP: &str = "admins";

/// Services shared by every plugin handler.
#[derive(Clone)]
pub struct PluginContext {
    pub slack: Arc<SlackClient>,
    pub store: Arc<dyn UserStore>,
}

impl PluginContext {
    pub fn new(slack: Arc<SlackClient>, store: Arc<dyn UserStore>) -> Self {
        Self { slack, store }
    }

    /// Post a message, logging instead of propagating failures.
    pub async fn reply(&self, plugin: &str, channel: &str, text: &str, options: &MessageOptions) {
        if let Err(e) = self.slack.post_message(channel, text, options).await {
            error!(error = %e, channel, plugin, "Failed to post message");
        }
    }

    /// Add a reaction, logging instead of propagating failures.
    pub async fn react(&self, plugin: &str, channel: &str, ts: &str, emoji: &str) {
        if let Err(e) = self.slack.add_reaction(channel, ts, emoji).await {
            error!(error = %e, channel, plugin, "Failed to add reaction");
        }
    }
}

/// Reply in the thread the triggering message belongs to, if any.
pub fn thread_options(thread_ts: Option<&str>) -> MessageOptions {
    match thread_ts {
        Some(ts) if !ts.is_empty() => MessageOptions::in_thread(ts),
        _ => MessageOptions::default(),
    }
}

/// Register every built-in route, including the default and denied routes.
pub fn register_all(registry: &mut Registry, ctx: &PluginContext) -> Result<(), RouteError> {
    registry.set_default_mention_route(fallback::mention_route(ctx))?;
    registry.set_denied_mention_route(permission_denied::mention_route(ctx))?;
    registry.set_denied_channel_message_route(permission_denied::channel_message_route(ctx))?;
    registry.set_denied_command_route(permission_denied::command_route())?;

    registry.add_mention_routes(groups::mention_routes(ctx))?;
    registry.add_mention_routes(user_info::mention_routes(ctx))?;
    registry.add_mention_routes(dice::mention_routes(ctx))?;
    registry.add_mention_routes(eightball::mention_routes(ctx))?;
    registry.add_mention_routes(help::mention_routes(ctx))?;

    info!(routes = registry.len(), "Registered plugin routes");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use user_store::MemoryStore;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_register_all() {
        let server = MockServer::start().await;
        let ctx = testing::context(&server, MemoryStore::new());
        let mut registry = Registry::new();

        register_all(&mut registry, &ctx).unwrap();

        assert!(registry.default_mention_route().is_some());
        assert!(registry.denied_mention_route().is_some());
        assert!(registry.denied_channel_message_route().is_some());
        assert_eq!(
            registry
                .denied_command_route()
                .and_then(|c| c.immediate_response()),
            Some(PERMISSION_DENIED_TEXT)
        );
        assert_eq!(registry.len(), 8);
        assert_eq!(
            registry.select_mention("roll some dice").map(|r| r.name()),
            Some("dice.rollD6")
        );
        assert_eq!(
            registry.select_mention("will it rain?").map(|r| r.name()),
            Some("eightball.askEightball")
        );
    }

    #[test]
    fn test_thread_options() {
        assert_eq!(thread_options(Some("1.0")).thread_ts.as_deref(), Some("1.0"));
        assert!(thread_options(Some("")).thread_ts.is_none());
        assert!(thread_options(None).thread_ts.is_none());
    }
}
