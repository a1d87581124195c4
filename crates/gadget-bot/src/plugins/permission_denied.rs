//! Denied routes: run in place of a route the actor may not use.

use super::{thread_options, PluginContext};
use async_trait::async_trait;
use gadget_core::{
    handler_fn, ChannelMessageEvent, ChannelMessageRoute, CommandInvocation, CommandRoute,
    Handler, MentionEvent, MentionRoute, Request, Route, WILDCARD,
};
use tracing::warn;

const PLUGIN: &str = "permission_denied";

/// Immediate acknowledgement for a refused command.
pub const PERMISSION_DENIED_TEXT: &str = "Permission denied.";

pub fn mention_route(ctx: &PluginContext) -> MentionRoute {
    MentionRoute::new(route(), Denied { ctx: ctx.clone() })
}

pub fn channel_message_route(ctx: &PluginContext) -> ChannelMessageRoute {
    ChannelMessageRoute::new(route(), Denied { ctx: ctx.clone() })
}

pub fn command_route() -> CommandRoute {
    let handler = handler_fn(|request: Request<CommandInvocation>| async move {
        warn!(
            user = %request.event.user_id,
            command = %request.event.command,
            "Slash command permission denied"
        );
        anyhow::Ok(())
    });

    CommandRoute::new(route(), "", handler).with_immediate_response(PERMISSION_DENIED_TEXT)
}

fn route() -> Route {
    Route::new(PLUGIN).with_permissions([WILDCARD])
}

struct Denied {
    ctx: PluginContext,
}

impl Denied {
    async fn refuse(&self, user: &str, channel: &str, ts: &str, thread_ts: Option<&str>) {
        self.ctx.react(PLUGIN, channel, ts, "astonished").await;

        let text = format!("I'm sorry, <@{}>, but you're not allowed to do that.", user);
        self.ctx
            .reply(PLUGIN, channel, &text, &thread_options(thread_ts))
            .await;
    }
}

#[async_trait]
impl Handler<MentionEvent> for Denied {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        warn!(user = %ev.user, channel = %ev.channel, "Mention permission denied");
        self.refuse(&ev.user, &ev.channel, &ev.ts, ev.thread_ts.as_deref())
            .await;
        Ok(())
    }
}

#[async_trait]
impl Handler<ChannelMessageEvent> for Denied {
    async fn handle(&self, request: Request<ChannelMessageEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        warn!(user = %ev.user, channel = %ev.channel, "Channel message permission denied");
        self.refuse(&ev.user, &ev.channel, &ev.ts, ev.thread_ts.as_deref())
            .await;
        Ok(())
    }
}
