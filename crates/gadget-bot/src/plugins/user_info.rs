//! Profile lookup for a mentioned user.

use super::{thread_options, PluginContext, ADMINS_GROUP};
use anyhow::Context;
use async_trait::async_trait;
use gadget_core::{Handler, MentionEvent, MentionRoute, Request, Route};
use rand::seq::SliceRandom;
use slack_client::UserProfile;

const PLUGIN: &str = "user_info";

const SPIRIT_ANIMALS: &[&str] = &[
    "Giant Panda",
    "Blue Whale",
    "Bengal Tiger",
    "Asian Elephant",
    "Gorilla",
    "Snow Leopard",
    "Orangutan",
    "Sea Turtle",
    "Black Rhino",
    "African Penguin",
    "Red Panda",
    "Polar Bear",
];

pub fn mention_routes(ctx: &PluginContext) -> Vec<MentionRoute> {
    vec![MentionRoute::new(
        Route::new("user_info.userInfo")
            .with_pattern(r"(?i)^(tell me about|who is) <@([a-z0-9]+)>[.?]?$")
            .with_description("Shows what Slack knows about a user")
            .with_help("who is @user")
            .with_permissions([ADMINS_GROUP]),
        UserInfo { ctx: ctx.clone() },
    )]
}

fn describe(profile: &UserProfile, spirit_animal: &str) -> String {
    format!(
        "- *Real Name:* {}\n- *Time Zone:* {}\n- *Email:* {}\n- *Locale:* {}\n- *Spirit Animal:* {}\n",
        profile.display_name(),
        profile.tz.as_deref().unwrap_or_default(),
        profile.email().unwrap_or_default(),
        profile.locale.as_deref().unwrap_or_default(),
        spirit_animal,
    )
}

fn spirit_animal() -> &'static str {
    SPIRIT_ANIMALS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Red Panda")
}

struct UserInfo {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for UserInfo {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        let target = request
            .capture(2)
            .context("pattern captured no user")?
            .to_string();

        self.ctx.store.find_or_create_user(&target).await?;

        let text = match self.ctx.slack.user_info(&target).await {
            Some(profile) => describe(&profile, spirit_animal()),
            None => format!("I couldn't look up <@{}> right now.", target),
        };

        self.ctx
            .reply(PLUGIN, &ev.channel, &text, &thread_options(ev.thread_ts.as_deref()))
            .await;
        Ok(())
    }
}
