//! Incoming chat messages and the guards that decide which ones are evaluated.

use serde::{Deserialize, Serialize};

/// Author of a message, as far as the relay cares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

/// A message observed in a monitored chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Message id within its chat.
    #[serde(default)]
    pub id: i64,
    /// Chat id; groups and channels are negative, private chats positive.
    #[serde(default)]
    pub chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Sender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Caption of a media message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl IncomingMessage {
    /// Message body, falling back to the media caption.
    pub fn body(&self) -> Option<&str> {
        fn non_blank(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|s| !s.trim().is_empty())
        }
        non_blank(&self.text).or_else(|| non_blank(&self.caption))
    }
}

/// Why a message was not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoText,
    MissingChat,
    PrivateChat,
    FromBot,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoText => "no_text",
            Self::MissingChat => "missing_chat",
            Self::PrivateChat => "private_chat",
            Self::FromBot => "from_bot",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return the text to evaluate, or why the message is skipped.
pub fn admit(message: &IncomingMessage) -> Result<&str, SkipReason> {
    let text = message.body().ok_or(SkipReason::NoText)?;
    if message.chat_id == 0 {
        return Err(SkipReason::MissingChat);
    }
    if message.chat_id > 0 {
        return Err(SkipReason::PrivateChat);
    }
    if message.from.as_ref().is_some_and(|sender| sender.is_bot) {
        return Err(SkipReason::FromBot);
    }
    Ok(text)
}
