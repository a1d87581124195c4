//! Slack Web API client.

use crate::error::SlackError;
use crate::types::*;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Client for the Slack Web API methods the bot uses.
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl SlackClient {
    /// Create a new Slack client.
    pub fn new(token: SecretString, base_url: impl Into<String>) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post a message to a channel, optionally in a thread.
    #[instrument(skip(self, text, options), fields(thread_ts = ?options.thread_ts))]
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        options: &MessageOptions,
    ) -> Result<PostedMessage, SlackError> {
        let request = PostMessageRequest {
            channel,
            text,
            thread_ts: options.thread_ts.as_deref(),
        };

        let posted: PostedMessage = self.post("chat.postMessage", &request).await?;
        debug!("Posted message {} to {}", posted.ts, posted.channel);
        Ok(posted)
    }

    /// Add an emoji reaction to a message.
    #[instrument(skip(self))]
    pub async fn add_reaction(&self, channel: &str, ts: &str, emoji: &str) -> Result<(), SlackError> {
        let request = AddReactionRequest {
            channel,
            timestamp: ts,
            name: emoji,
        };

        let _: Value = self.post("reactions.add", &request).await?;
        Ok(())
    }

    /// Look up a user's profile. `None` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn user_info(&self, user_id: &str) -> Option<UserProfile> {
        let result: Result<UserInfoResponse, SlackError> = self
            .get("users.info", &[("user", user_id), ("include_locale", "true")])
            .await;

        match result {
            Ok(response) => Some(response.user),
            Err(e) => {
                warn!("Failed to fetch user info: {}", e);
                None
            }
        }
    }

    async fn post<B, T>(&self, method: &str, body: &B) -> Result<T, SlackError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await?;

        parse_response(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SlackError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, method))
            .bearer_auth(self.token.expose_secret())
            .query(query)
            .send()
            .await?;

        parse_response(response).await
    }
}

/// Unwrap Slack's `{ "ok": bool, "error": ... }` envelope.
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SlackError> {
    let status = response.status();
    if !status.is_success() {
        let msg = response.text().await.unwrap_or_default();
        return Err(SlackError::Api(format!("{}: {}", status, msg)));
    }

    let value: Value = response.json().await?;
    if !value.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(SlackError::Api(error.to_string()));
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> SlackClient {
        SlackClient::new(SecretString::new("xoxb-test".into()), mock_server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_post_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_json(json!({ "channel": "C1", "text": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C1", "ts": "1.0001"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let posted = client
            .post_message("C1", "hello", &MessageOptions::default())
            .await
            .unwrap();

        assert_eq!(posted.channel, "C1");
        assert_eq!(posted.ts, "1.0001");
    }

    #[tokio::test]
    async fn test_post_message_in_thread() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_json(json!({ "channel": "C1", "text": "reply", "thread_ts": "1.0" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C1", "ts": "1.0002"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client
            .post_message("C1", "reply", &MessageOptions::in_thread("1.0"))
            .await;

        tokio_test::assert_ok!(result);
    }

    #[tokio::test]
    async fn test_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false, "error": "channel_not_found"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client
            .post_message("CNOPE", "hello", &MessageOptions::default())
            .await;

        match result {
            Err(SlackError::Api(error)) => assert_eq!(error, "channel_not_found"),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/reactions.add"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.add_reaction("C1", "1.0", "astonished").await;

        assert!(matches!(result, Err(SlackError::Api(_))));
    }

    #[tokio::test]
    async fn test_add_reaction() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/reactions.add"))
            .and(body_json(json!({
                "channel": "C1", "timestamp": "1.0", "name": "astonished"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        tokio_test::assert_ok!(client.add_reaction("C1", "1.0", "astonished").await);
    }

    #[tokio::test]
    async fn test_user_info() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users.info"))
            .and(query_param("user", "U1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "user": {
                    "id": "U1",
                    "name": "ann",
                    "real_name": "Ann Example",
                    "tz": "America/New_York",
                    "locale": "en-US",
                    "profile": { "email": "ann@example.com", "display_name": "ann" }
                }
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let profile = client.user_info("U1").await.unwrap();

        assert_eq!(profile.display_name(), "Ann Example");
        assert_eq!(profile.tz.as_deref(), Some("America/New_York"));
        assert_eq!(profile.locale.as_deref(), Some("en-US"));
        assert_eq!(profile.email(), Some("ann@example.com"));
    }

    #[tokio::test]
    async fn test_user_info_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users.info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false, "error": "user_not_found"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.user_info("UNOPE").await.is_none());
    }
}
