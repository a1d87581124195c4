//! Inbound event kinds the dispatcher routes.

/// A message that mentions the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionEvent {
    pub user: String,
    pub channel: String,
    pub text: String,
    /// Timestamp identifying the message within its channel.
    pub ts: String,
    /// Parent thread timestamp, if the message was posted in a thread.
    pub thread_ts: Option<String>,
}

/// A message posted in a channel the bot is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessageEvent {
    pub user: String,
    pub channel: String,
    pub text: String,
    pub ts: String,
    pub thread_ts: Option<String>,
}

/// A command invocation (e.g. `/deploy production`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInvocation {
    /// The literal command token, including the leading slash.
    pub command: String,
    pub user_id: String,
    /// Free-text argument following the command.
    pub text: String,
    pub channel_id: String,
    /// URL for delayed responses.
    pub response_url: Option<String>,
    pub trigger_id: Option<String>,
}

/// Inner event delivered by a callback envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    Mention(MentionEvent),
    ChannelMessage(ChannelMessageEvent),
    /// Any other event kind; acknowledged but never routed.
    Unsupported { kind: String, user: Option<String> },
}

impl CallbackEvent {
    /// The user who triggered the event.
    pub fn actor(&self) -> Option<&str> {
        match self {
            CallbackEvent::Mention(ev) => Some(&ev.user),
            CallbackEvent::ChannelMessage(ev) => Some(&ev.user),
            CallbackEvent::Unsupported { user, .. } => user.as_deref(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            CallbackEvent::Mention(_) => "app_mention",
            CallbackEvent::ChannelMessage(_) => "message",
            CallbackEvent::Unsupported { kind, .. } => kind,
        }
    }
}

/// A decoded event-endpoint body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// URL verification handshake; the value is echoed back.
    Challenge(String),
    Callback(CallbackEvent),
}
