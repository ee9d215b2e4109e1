use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde_derive::Deserialize;
use serde_json::{json, Value};

use super::http::payload_param;
use super::message::query_pairs;
use super::query::QueryRequest;
use super::user::Mute;
use super::{Client, ExtraData, Message, QueryOption, User};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageFlag {
    #[serde(default)]
    pub created_by_automod: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<User>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MuteResponse {
    #[serde(default)]
    pub mute: Mute,
    #[serde(default)]
    pub own_user: Option<User>,
}

#[derive(Deserialize)]
struct QueryMessageFlagsResponse {
    #[serde(default)]
    flags: Vec<MessageFlag>,
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid(format!("{} is empty", what)));
    }
    Ok(())
}

impl Client {
    async fn moderate(&self, action: &str, body: &Value) -> Result<()> {
        self.http()
            .post::<_, IgnoredAny>(&["moderation", action], body)
            .await?;
        Ok(())
    }

    pub async fn flag_message(&self, message_id: &str, user_id: &str) -> Result<()> {
        require(message_id, "message ID")?;
        require(user_id, "user ID")?;
        self.moderate("flag", &json!({ "target_message_id": message_id, "user_id": user_id }))
            .await
    }

    pub async fn unflag_message(&self, message_id: &str, user_id: &str) -> Result<()> {
        require(message_id, "message ID")?;
        require(user_id, "user ID")?;
        self.moderate("unflag", &json!({ "target_message_id": message_id, "user_id": user_id }))
            .await
    }

    pub async fn flag_user(&self, target_id: &str, user_id: &str) -> Result<()> {
        require(target_id, "target ID")?;
        require(user_id, "user ID")?;
        self.moderate("flag", &json!({ "target_user_id": target_id, "user_id": user_id }))
            .await
    }

    pub async fn unflag_user(&self, target_id: &str, user_id: &str) -> Result<()> {
        require(target_id, "target ID")?;
        require(user_id, "user ID")?;
        self.moderate("unflag", &json!({ "target_user_id": target_id, "user_id": user_id }))
            .await
    }

    /// Mutes `target_id` for `user_id`.
    pub async fn mute_user(&self, target_id: &str, user_id: &str) -> Result<MuteResponse> {
        require(target_id, "target ID")?;
        require(user_id, "user ID")?;
        self.http()
            .post(
                &["moderation", "mute"],
                &json!({ "target_id": target_id, "user_id": user_id }),
            )
            .await
    }

    pub async fn unmute_user(&self, target_id: &str, user_id: &str) -> Result<()> {
        require(target_id, "target ID")?;
        require(user_id, "user ID")?;
        self.moderate("unmute", &json!({ "target_id": target_id, "user_id": user_id }))
            .await
    }

    /// Bans `target_id` application-wide. `options` may carry `timeout`
    /// (minutes) and `reason`; `type` and `id` scope the ban to a channel.
    pub async fn ban_user(&self, target_id: &str, user_id: &str, options: Option<ExtraData>) -> Result<()> {
        require(target_id, "target ID")?;
        require(user_id, "user ID")?;
        let mut body = options.unwrap_or_default();
        body.insert("target_user_id".to_owned(), json!(target_id));
        body.insert("user_id".to_owned(), json!(user_id));
        self.moderate("ban", &Value::Object(body)).await
    }

    pub async fn unban_user(&self, target_id: &str, options: &[(&str, &str)]) -> Result<()> {
        require(target_id, "target ID")?;
        let mut params = query_pairs(options);
        params.push(("target_user_id".to_owned(), target_id.to_owned()));
        self.http()
            .delete::<IgnoredAny>(&["moderation", "ban"], &params)
            .await?;
        Ok(())
    }

    pub async fn query_message_flags(&self, q: &QueryOption) -> Result<Vec<MessageFlag>> {
        let request = QueryRequest {
            user_id: "",
            ..QueryRequest::from(q)
        };
        let params = vec![payload_param(&request)?];
        let resp: QueryMessageFlagsResponse = self
            .http()
            .get(&["moderation", "flags", "message"], &params)
            .await?;
        Ok(resp.flags)
    }
}
