//! Lists the routes the asking user may run.

use super::{thread_options, PluginContext};
use async_trait::async_trait;
use gadget_core::{
    is_permitted, Category, Handler, MentionEvent, MentionRoute, RegisteredRoute, Request, Route,
    WILDCARD,
};

const PLUGIN: &str = "help";

pub fn mention_routes(ctx: &PluginContext) -> Vec<MentionRoute> {
    vec![MentionRoute::new(
        Route::new("help")
            .with_pattern(r"(?i)^(help|what can you do)[.?!]?$")
            .with_description("Lists what I can do for you")
            .with_help("help")
            .with_permissions([WILDCARD]),
        Help { ctx: ctx.clone() },
    )]
}

fn render(routes: &[RegisteredRoute]) -> String {
    let mut text = String::from("Here's what I can do for you:\n");
    for registered in routes {
        let route = &registered.route;
        if route.help.is_empty() {
            continue;
        }
        let trigger = match registered.category {
            Category::Mention => format!("@me {}", route.help),
            Category::ChannelMessage | Category::Command => route.help.clone(),
        };
        if route.description.is_empty() {
            text.push_str(&format!("*-* `{}`\n", trigger));
        } else {
            text.push_str(&format!("*-* `{}`: {}\n", trigger, route.description));
        }
    }
    text
}

struct Help {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for Help {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;

        let user = self.ctx.store.find_or_create_user(&ev.user).await?;
        let groups: Vec<String> = self
            .ctx
            .store
            .groups_of(&user)
            .await?
            .into_iter()
            .map(|g| g.name)
            .collect();

        let visible: Vec<RegisteredRoute> = request
            .registry
            .registered_routes()
            .into_iter()
            .filter(|r| is_permitted(&groups, &r.route.permissions))
            .collect();

        self.ctx
            .reply(
                PLUGIN,
                &ev.channel,
                &render(&visible),
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
    use user_store::{MemoryStore, UserStore, GLOBAL_ADMINS};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_render() {
        let routes = vec![
            RegisteredRoute {
                route: Route::new("dice.rollD6")
                    .with_help("roll some dice")
                    .with_description("Rolls two d6 dice"),
                category: Category::Mention,
            },
            RegisteredRoute {
                route: Route::new("hidden"),
                category: Category::Mention,
            },
            RegisteredRoute {
                route: Route::new("deploy").with_help("/deploy <env>"),
                category: Category::Command,
            },
        ];

        assert_eq!(
            render(&routes),
            "Here's what I can do for you:\n*-* `@me roll some dice`: Rolls two d6 dice\n*-* `/deploy <env>`\n"
        );
    }

    async fn posted_help(store: MemoryStore, user: &str) -> String {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C1", "ts": "1.1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = testing::context(&server, store);
        let registry = testing::registry(&ctx);
        let request = testing::request(&registry, "help", testing::mention(user, "help"), "help");
        let route = registry.mention_route("help").unwrap();
        route.handler().handle(request).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        body["text"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_help_hides_admin_routes() {
        let text = posted_help(MemoryStore::new(), "U1").await;

        assert!(text.contains("roll some dice"));
        assert!(text.contains("my groups"));
        assert!(!text.contains("list groups"));
        assert!(!text.contains("who is @user"));
    }

    #[tokio::test]
    async fn test_help_for_global_admin() {
        let store = MemoryStore::new();
        store.add_member(GLOBAL_ADMINS, "UADMIN").await.unwrap();

        let text = posted_help(store, "UADMIN").await;

        assert!(text.contains("list groups"));
        assert!(text.contains("who is @user"));
    }
}
