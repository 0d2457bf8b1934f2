//! Bot persona records as the backend stores and returns them.

use serde::{Deserialize, Serialize};

/// Greeting used when a bot has no configured opening line.
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    #[default]
    Private,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
        }
    }
}

impl std::str::FromStr for Privacy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Privacy::Public),
            "private" => Ok(Privacy::Private),
            _ => Err(format!("invalid privacy value: {value}")),
        }
    }
}

/// One bot persona, exactly as the backend serializes it. Listing endpoints
/// return the same shape, so the persona fields beyond the display set are
/// optional-with-default rather than a separate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub bot_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub type_of_bot: String,
    #[serde(default)]
    pub privacy: Privacy,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub first_message: Option<String>,
    #[serde(default)]
    pub situation: String,
    #[serde(default)]
    pub back_story: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub chatting_way: String,
}

impl Bot {
    /// The opening line shown when a chat has no history yet.
    pub fn greeting(&self) -> &str {
        match self.first_message.as_deref() {
            Some(first) if !first.is_empty() => first,
            _ => DEFAULT_GREETING,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

/// Avatar file contents read by the CLI before the upload is built, so the
/// API client never touches the filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Fields for a bot create or update. The backend requires every form field
/// on both operations; the avatar alone is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct BotDraft {
    pub name: String,
    pub bio: String,
    pub first_message: String,
    pub situation: String,
    pub back_story: String,
    pub personality: String,
    pub chatting_way: String,
    pub type_of_bot: String,
    pub privacy: Privacy,
    pub avatar: Option<AvatarUpload>,
}

impl BotDraft {
    /// Seed a draft from an existing bot so an edit can override only some
    /// fields while resubmitting the rest unchanged.
    pub fn from_bot(bot: &Bot) -> Self {
        Self {
            name: bot.name.clone(),
            bio: bot.bio.clone(),
            first_message: bot.first_message.clone().unwrap_or_default(),
            situation: bot.situation.clone(),
            back_story: bot.back_story.clone(),
            personality: bot.personality.clone(),
            chatting_way: bot.chatting_way.clone(),
            type_of_bot: bot.type_of_bot.clone(),
            privacy: bot.privacy,
            avatar: None,
        }
    }
}
