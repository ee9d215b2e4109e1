use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use serde_json::json;

use super::channel::ChannelData;
use super::message::{Message, Reaction};
use super::{is_false, Client, ExtraData};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub invisible: bool,

    #[serde(default, skip_serializing)]
    pub online: bool,
    #[serde(default, skip_serializing)]
    pub banned: bool,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub mutes: Vec<Mute>,
    #[serde(default, skip_serializing)]
    pub channel_mutes: Vec<ChannelMute>,

    #[serde(flatten)]
    pub extra_data: ExtraData,
}

impl User {
    pub fn new(id: &str) -> User {
        User {
            id: id.to_owned(),
            ..Default::default()
        }
    }
}

/// A user muted by another user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Mute {
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub target: User,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChannelMute {
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub channel: ChannelData,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

/// Sets and removes individual fields of one user without a full upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialUserUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "ExtraData::is_empty")]
    pub set: ExtraData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unset: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteUserOptions {
    pub mark_messages_deleted: bool,
    pub hard_delete: bool,
    pub delete_conversation_channels: bool,
}

impl DeleteUserOptions {
    fn params(&self) -> Vec<(String, String)> {
        [
            ("mark_messages_deleted", self.mark_messages_deleted),
            ("hard_delete", self.hard_delete),
            ("delete_conversation_channels", self.delete_conversation_channels),
        ]
        .iter()
        .filter(|(_, on)| *on)
        .map(|(name, _)| (name.to_string(), "true".to_owned()))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportUserResponse {
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: HashMap<String, User>,
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    user: User,
}

impl Client {
    /// Creates the user or replaces all of its fields.
    pub async fn upsert_user(&self, user: &User) -> Result<User> {
        let mut users = self.upsert_users(std::slice::from_ref(user)).await?;
        users
            .remove(&user.id)
            .ok_or_else(|| Error::UnexpectedResponse(format!("user {} missing from upsert response", user.id)))
    }

    pub async fn upsert_users(&self, users: &[User]) -> Result<HashMap<String, User>> {
        if users.is_empty() {
            return Err(Error::invalid("users are not set"));
        }
        let mut by_id = HashMap::with_capacity(users.len());
        for user in users {
            if user.id.is_empty() {
                return Err(Error::invalid("user ID is empty"));
            }
            by_id.insert(user.id.as_str(), user);
        }

        let resp: UsersResponse = self.http().post(&["users"], &json!({ "users": by_id })).await?;
        Ok(resp.users)
    }

    pub async fn partial_update_users(&self, updates: &[PartialUserUpdate]) -> Result<HashMap<String, User>> {
        if updates.is_empty() {
            return Err(Error::invalid("users are not set"));
        }
        if updates.iter().any(|u| u.id.is_empty()) {
            return Err(Error::invalid("user ID is empty"));
        }
        let resp: UsersResponse = self.http().patch(&["users"], &json!({ "users": updates })).await?;
        Ok(resp.users)
    }

    pub async fn delete_user(&self, user_id: &str, options: DeleteUserOptions) -> Result<()> {
        require_user_id(user_id)?;
        self.http()
            .delete::<serde::de::IgnoredAny>(&["users", user_id], &options.params())
            .await?;
        Ok(())
    }

    pub async fn deactivate_user(&self, user_id: &str, options: Option<ExtraData>) -> Result<User> {
        require_user_id(user_id)?;
        let body = options.unwrap_or_default();
        let resp: UserResponse = self.http().post(&["users", user_id, "deactivate"], &body).await?;
        Ok(resp.user)
    }

    pub async fn reactivate_user(&self, user_id: &str, options: Option<ExtraData>) -> Result<User> {
        require_user_id(user_id)?;
        let body = options.unwrap_or_default();
        let resp: UserResponse = self.http().post(&["users", user_id, "reactivate"], &body).await?;
        Ok(resp.user)
    }

    /// Exports the user together with their messages and reactions.
    pub async fn export_user(&self, user_id: &str) -> Result<ExportUserResponse> {
        require_user_id(user_id)?;
        self.http().get(&["users", user_id, "export"], &Vec::new()).await
    }
}

fn require_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(Error::invalid("user ID is empty"));
    }
    Ok(())
}
