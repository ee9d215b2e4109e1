use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::ser::Serializer;
use serde_derive::{Deserialize, Serialize};
use serde_json::json;

use super::{is_false, Client, ExtraData, User};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Regular,
    Error,
    Command,
    Reply,
    System,
    Ephemeral,
    #[serde(other)]
    Unknown,
}

fn user_ids<S: Serializer>(users: &[User], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(users.iter().map(|u| &u.id))
}

/// A chat message. Fields the backend computes (`html`, reactions, counts,
/// update and delete times) are decoded but never sent back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing)]
    pub html: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageType>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub silent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub show_in_channel: bool,
    #[serde(default, serialize_with = "user_ids", skip_serializing_if = "Vec::is_empty")]
    pub mentioned_users: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing)]
    pub latest_reactions: Vec<Reaction>,
    #[serde(default, skip_serializing)]
    pub own_reactions: Vec<Reaction>,
    #[serde(default, skip_serializing)]
    pub reaction_counts: HashMap<String, i64>,
    #[serde(default, skip_serializing)]
    pub reply_count: i64,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra_data: ExtraData,
}

impl Message {
    pub fn new(text: &str) -> Message {
        Message {
            text: text.to_owned(),
            ..Default::default()
        }
    }

    /// A message authored by `user_id`, as used for system messages attached
    /// to membership changes.
    pub fn from_user(text: &str, user_id: &str) -> Message {
        Message {
            text: text.to_owned(),
            user: Some(User::new(user_id)),
            ..Default::default()
        }
    }

    pub fn reply_to(parent_id: &str, text: &str) -> Message {
        Message {
            text: text.to_owned(),
            parent_id: parent_id.to_owned(),
            kind: Some(MessageType::Reply),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fallback: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title_link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thumb_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_url: String,
    #[serde(flatten)]
    pub extra_data: ExtraData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing)]
    pub user: Option<User>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra_data: ExtraData,
}

impl Reaction {
    pub fn new(kind: &str) -> Reaction {
        Reaction {
            kind: kind.to_owned(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReactionResponse {
    #[serde(default)]
    pub message: Message,
    #[serde(default)]
    pub reaction: Reaction,
}

/// Custom event delivered to channel watchers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra_data: ExtraData,
}

impl Event {
    pub fn new(kind: &str) -> Event {
        Event {
            kind: kind.to_owned(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendMessageOptions {
    /// Do not send push notifications for this message.
    pub skip_push: bool,
}

#[derive(Deserialize)]
pub(crate) struct MessageResponse {
    #[serde(default)]
    pub message: Message,
}

#[derive(Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ReactionsResponse {
    #[serde(default)]
    reactions: Vec<Reaction>,
}

pub(crate) fn query_pairs(options: &[(&str, &str)]) -> Vec<(String, String)> {
    options
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn require_message_id(message_id: &str) -> Result<()> {
    if message_id.is_empty() {
        return Err(Error::invalid("message ID is empty"));
    }
    Ok(())
}

impl Client {
    pub async fn get_message(&self, message_id: &str) -> Result<Message> {
        require_message_id(message_id)?;
        let resp: MessageResponse = self.http().get(&["messages", message_id], &Vec::new()).await?;
        Ok(resp.message)
    }

    /// Replaces the text and custom fields of an existing message.
    pub async fn update_message(&self, message: &Message) -> Result<Message> {
        require_message_id(&message.id)?;
        let resp: MessageResponse = self
            .http()
            .post(&["messages", message.id.as_str()], &json!({ "message": message }))
            .await?;
        Ok(resp.message)
    }

    pub async fn delete_message(&self, message_id: &str, hard: bool) -> Result<Message> {
        require_message_id(message_id)?;
        let params = if hard {
            vec![("hard".to_owned(), "true".to_owned())]
        } else {
            Vec::new()
        };
        let resp: MessageResponse = self.http().delete(&["messages", message_id], &params).await?;
        Ok(resp.message)
    }

    /// Marks every channel as read for the user.
    pub async fn mark_all_read(&self, user_id: &str) -> Result<()> {
        if user_id.is_empty() {
            return Err(Error::invalid("user ID is empty"));
        }
        self.http()
            .post::<_, serde::de::IgnoredAny>(&["channels", "read"], &json!({ "user": { "id": user_id } }))
            .await?;
        Ok(())
    }

    pub async fn send_reaction(
        &self,
        reaction: &Reaction,
        message_id: &str,
        user_id: &str,
    ) -> Result<ReactionResponse> {
        require_message_id(message_id)?;
        if reaction.kind.is_empty() {
            return Err(Error::invalid("reaction type is empty"));
        }
        let mut reaction = reaction.clone();
        reaction.user_id = user_id.to_owned();

        self.http()
            .post(&["messages", message_id, "reaction"], &json!({ "reaction": reaction }))
            .await
    }

    pub async fn delete_reaction(
        &self,
        message_id: &str,
        reaction_type: &str,
        user_id: &str,
    ) -> Result<ReactionResponse> {
        require_message_id(message_id)?;
        if reaction_type.is_empty() {
            return Err(Error::invalid("reaction type is empty"));
        }
        let params = vec![("user_id".to_owned(), user_id.to_owned())];
        self.http()
            .delete(&["messages", message_id, "reaction", reaction_type], &params)
            .await
    }

    /// Lists reactions on a message; `options` carries `limit`/`offset`.
    pub async fn get_reactions(&self, message_id: &str, options: &[(&str, &str)]) -> Result<Vec<Reaction>> {
        require_message_id(message_id)?;
        let resp: ReactionsResponse = self
            .http()
            .get(&["messages", message_id, "reactions"], &query_pairs(options))
            .await?;
        Ok(resp.reactions)
    }
}
