//! Slack wire types.

use gadget_core::{
    CallbackEvent, ChannelMessageEvent, CommandInvocation, InboundEvent, MentionEvent,
};
use serde::{Deserialize, Serialize};

/// Body posted to the Events API endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification { challenge: String },
    EventCallback(CallbackEnvelope),
    AppRateLimited,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackEnvelope {
    pub team_id: Option<String>,
    pub api_app_id: Option<String>,
    pub event_id: Option<String>,
    pub event: RawEvent,
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

/// An inner event. Only the fields the bot routes on are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: Option<String>,
    pub user: Option<String>,
    pub bot_id: Option<String>,
    pub channel: Option<String>,
    pub text: Option<String>,
    pub ts: Option<String>,
    pub thread_ts: Option<String>,
}

impl RawEvent {
    pub fn into_callback(self) -> CallbackEvent {
        let user = self.user.unwrap_or_default();
        let channel = self.channel.unwrap_or_default();
        let text = self.text.unwrap_or_default();
        let ts = self.ts.unwrap_or_default();

        match self.kind.as_str() {
            "app_mention" => CallbackEvent::Mention(MentionEvent {
                user,
                channel,
                text,
                ts,
                thread_ts: self.thread_ts,
            }),
            "message" => CallbackEvent::ChannelMessage(ChannelMessageEvent {
                user,
                channel,
                text,
                ts,
                thread_ts: self.thread_ts,
            }),
            _ => CallbackEvent::Unsupported {
                kind: self.kind,
                user: Some(user).filter(|u| !u.is_empty()),
            },
        }
    }
}

impl From<EventEnvelope> for InboundEvent {
    fn from(envelope: EventEnvelope) -> Self {
        match envelope {
            EventEnvelope::UrlVerification { challenge } => InboundEvent::Challenge(challenge),
            EventEnvelope::EventCallback(callback) => {
                InboundEvent::Callback(callback.event.into_callback())
            }
            EventEnvelope::AppRateLimited => InboundEvent::Callback(CallbackEvent::Unsupported {
                kind: "app_rate_limited".to_string(),
                user: None,
            }),
        }
    }
}

/// URL-encoded slash command form.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    pub user_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel_id: String,
    pub user_name: Option<String>,
    pub team_id: Option<String>,
    pub response_url: Option<String>,
    pub trigger_id: Option<String>,
}

impl From<SlashCommand> for CommandInvocation {
    fn from(cmd: SlashCommand) -> Self {
        Self {
            command: cmd.command,
            user_id: cmd.user_id,
            text: cmd.text,
            channel_id: cmd.channel_id,
            response_url: cmd.response_url,
            trigger_id: cmd.trigger_id,
        }
    }
}

/// Extra options for `chat.postMessage`.
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    /// Reply in this thread.
    pub thread_ts: Option<String>,
}

impl MessageOptions {
    pub fn in_thread(ts: impl Into<String>) -> Self {
        Self {
            thread_ts: Some(ts.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AddReactionRequest<'a> {
    pub channel: &'a str,
    pub timestamp: &'a str,
    pub name: &'a str,
}

/// A message the bot posted.
#[derive(Debug, Clone, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserInfoResponse {
    pub user: UserProfile,
}

/// A workspace member as returned by `users.info`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub real_name: Option<String>,
    pub tz: Option<String>,
    pub tz_label: Option<String>,
    pub locale: Option<String>,
    #[serde(default)]
    pub profile: ProfileFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFields {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub real_name: Option<String>,
}

impl UserProfile {
    /// Best available human name.
    pub fn display_name(&self) -> &str {
        self.real_name
            .as_deref()
            .or(self.profile.real_name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or(self.name.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.profile.email.as_deref()
    }
}
