//! Dice rolling.

use super::{thread_options, PluginContext};
use async_trait::async_trait;
use gadget_core::{Handler, MentionEvent, MentionRoute, Request, Route, WILDCARD};
use rand::Rng;

const PLUGIN: &str = "dice";

pub fn mention_routes(ctx: &PluginContext) -> Vec<MentionRoute> {
    vec![MentionRoute::new(
        Route::new("dice.rollD6")
            .with_pattern(r"(?i)^(roll some dice|dice me)[!.]?$")
            .with_description("Rolls two d6 dice")
            .with_help("roll some dice")
            .with_permissions([WILDCARD]),
        RollD6 { ctx: ctx.clone() },
    )]
}

fn roll_d6() -> u8 {
    rand::thread_rng().gen_range(1..=6)
}

struct RollD6 {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for RollD6 {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        self.ctx.react(PLUGIN, &ev.channel, &ev.ts, "game_die").await;

        let (first, second) = (roll_d6(), roll_d6());
        let text = format!("<@{}> rolled a {} and a {}", ev.user, first, second);
        self.ctx
            .reply(PLUGIN, &ev.channel, &text, &thread_options(ev.thread_ts.as_deref()))
            .await;
        Ok(())
    }
}
