//! Magic 8-ball.

use super::{thread_options, PluginContext};
use async_trait::async_trait;
use gadget_core::{Handler, MentionEvent, MentionRoute, Request, Route, WILDCARD};
use rand::seq::SliceRandom;

const PLUGIN: &str = "eightball";

const ANSWERS: &[&str] = &[
    "It is certain",
    "It is decidedly so",
    "Without a doubt",
    "Yes - definitely",
    "You may rely on it",
    "As I see it, yes",
    "Most likely",
    "Outlook good",
    "Signs point to yes",
    "Yes",
    "Reply hazy, try again",
    "Ask again later",
    "Better not tell you now",
    "Cannot predict now",
    "Concentrate and ask again",
    "Don't count on it",
    "My reply is no",
    "My sources say no",
    "Outlook not so good",
    "Very doubtful",
];

pub fn mention_routes(ctx: &PluginContext) -> Vec<MentionRoute> {
    // Low priority: the pattern is broad enough to shadow other questions.
    vec![MentionRoute::new(
        Route::new("eightball.askEightball")
            .with_pattern(r"(?i)^(will|can|am I) .+[?]?$")
            .with_description("Asks a magic 8-ball a question")
            .with_help("Will|Can|Am I ... ?")
            .with_permissions([WILDCARD])
            .with_priority(-10),
        AskEightball { ctx: ctx.clone() },
    )]
}

fn answer() -> &'static str {
    ANSWERS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Ask again later")
}

struct AskEightball {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for AskEightball {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        self.ctx.react(PLUGIN, &ev.channel, &ev.ts, "8ball").await;
        self.ctx
            .reply(
                PLUGIN,
                &ev.channel,
                answer(),
                &thread_options(ev.thread_ts.as_deref()),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing;
    use serde_json::json;
    use user_store::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_answer_is_canned() {
        for _ in 0..50 {
            assert!(ANSWERS.contains(&answer()));
        }
    }

    #[tokio::test]
    async fn test_questions_route_here() {
        let server = MockServer::start().await;
        let ctx = testing::context(&server, MemoryStore::new());
        let registry = testing::registry(&ctx);

        for question in ["will it rain?", "Can I deploy on Friday", "am I dreaming?"] {
            assert_eq!(
                registry.select_mention(question).map(|r| r.name()),
                Some("eightball.askEightball"),
                "{}",
                question
            );
        }
        assert!(registry.select_mention("what time is it").is_none());
    }

    #[tokio::test]
    async fn test_ask_replies() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/reactions.add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C1", "ts": "1.1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = testing::context(&server, MemoryStore::new());
        let registry = testing::registry(&ctx);
        let text = "will it work?";
        let request = testing::request(
            &registry,
            "eightball.askEightball",
            testing::mention("U1", text),
            text,
        );

        let route = registry.mention_route("eightball.askEightball").unwrap();
        route.handler().handle(request).await.unwrap();
    }
}
