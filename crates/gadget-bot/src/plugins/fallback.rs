//! Default mention route: answers mentions nothing else understood.

use super::{thread_options, PluginContext};
use async_trait::async_trait;
use gadget_core::{Handler, MentionEvent, MentionRoute, Request, Route, WILDCARD};

const PLUGIN: &str = "fallback";

pub fn mention_route(ctx: &PluginContext) -> MentionRoute {
    MentionRoute::new(
        Route::new(PLUGIN).with_permissions([WILDCARD]),
        Fallback { ctx: ctx.clone() },
    )
}

struct Fallback {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for Fallback {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        let text = format!(
            "Hi there! I see you sent me a message, <@{}>, but I'm not sure what to do with that.",
            ev.user
        );

        self.ctx
            .reply(PLUGIN, &ev.channel, &text, &thread_options(ev.thread_ts.as_deref()))
            .await;
        Ok(())
    }
}
