use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::de::IgnoredAny;
use serde_derive::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::http::payload_param;
use super::message::{query_pairs, MessageResponse, MessagesResponse};
use super::query::QueryRequest;
use super::user::ChannelMute;
use super::{Client, Event, ExtraData, Message, QueryOption, SendMessageOptions, User};
use crate::error::{Error, Result};

/// Channel fields as stored by the backend. Custom fields land in `extra_data`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChannelData {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub created_by: Option<User>,
    #[serde(default)]
    pub member_count: i64,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra_data: ExtraData,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChannelMember {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default)]
    pub invited: bool,
    #[serde(default)]
    pub invite_accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invite_rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChannelRead {
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub last_read: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_messages: i64,
}

/// Channel state as returned by the query and update endpoints. Absent
/// slices leave the local copy untouched.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChannelState {
    #[serde(default)]
    pub channel: Option<ChannelData>,
    #[serde(default)]
    pub members: Option<Vec<ChannelMember>>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub read: Option<Vec<ChannelRead>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialUpdate {
    #[serde(skip_serializing_if = "ExtraData::is_empty")]
    pub set: ExtraData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unset: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportMessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelMuteResponse {
    #[serde(default)]
    pub channel_mute: ChannelMute,
    #[serde(default)]
    pub own_user: Option<User>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendFileRequest {
    pub data: Vec<u8>,
    pub file_name: String,
    pub user: User,
    pub content_type: Option<String>,
}

impl SendFileRequest {
    pub fn from_path<P: AsRef<Path>>(path: P, user: User) -> Result<SendFileRequest> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::invalid(format!("{} has no file name", path.display())))?
            .to_owned();
        Ok(SendFileRequest {
            data: std::fs::read(path)?,
            file_name,
            user,
            content_type: None,
        })
    }

    fn form(&self, content_type: &str) -> Result<Form> {
        if self.file_name.is_empty() {
            return Err(Error::invalid("file name is empty"));
        }
        if self.user.id.is_empty() {
            return Err(Error::invalid("user ID is empty"));
        }
        let part = Part::bytes(self.data.clone())
            .file_name(self.file_name.clone())
            .mime_str(content_type)?;
        Ok(Form::new()
            .part("file", part)
            .text("user", serde_json::to_string(&self.user)?))
    }
}

#[derive(Deserialize)]
struct FileResponse {
    #[serde(default)]
    file: String,
}

#[derive(Serialize)]
struct QueryMembersRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    id: &'a str,
    #[serde(flatten)]
    query: QueryRequest<'a>,
}

#[derive(Deserialize)]
struct QueryMembersResponse {
    #[serde(default)]
    members: Vec<ChannelMember>,
}

fn require_ids(user_ids: &[&str]) -> Result<()> {
    if user_ids.is_empty() {
        return Err(Error::invalid("user IDs are empty"));
    }
    if user_ids.iter().any(|id| id.is_empty()) {
        return Err(Error::invalid("user ID is empty"));
    }
    Ok(())
}

fn require_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(Error::invalid("user ID is empty"));
    }
    Ok(())
}

/// Handle to one channel, bound to the client that created it. Methods that
/// change membership or channel data refresh the local state from the
/// backend's response.
#[derive(Debug, Clone)]
pub struct Channel {
    client: Client,
    pub data: ChannelData,
    pub members: Vec<ChannelMember>,
    pub messages: Vec<Message>,
    pub read: Vec<ChannelRead>,
}

impl Channel {
    pub(crate) fn new(client: Client, kind: &str, id: &str) -> Channel {
        Channel {
            client,
            data: ChannelData {
                kind: kind.to_owned(),
                id: id.to_owned(),
                ..Default::default()
            },
            members: Vec::new(),
            messages: Vec::new(),
            read: Vec::new(),
        }
    }

    pub(crate) fn from_state(client: Client, state: ChannelState) -> Channel {
        let mut channel = Channel::new(client, "", "");
        channel.apply(state);
        channel
    }

    fn apply(&mut self, state: ChannelState) {
        if let Some(data) = state.channel {
            self.data = data;
        }
        if let Some(members) = state.members {
            self.members = members;
        }
        if let Some(messages) = state.messages {
            self.messages = messages;
        }
        if let Some(read) = state.read {
            self.read = read;
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn kind(&self) -> &str {
        &self.data.kind
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// `type:id`, as used by filters and moderation endpoints.
    pub fn cid(&self) -> String {
        if self.data.cid.is_empty() {
            format!("{}:{}", self.data.kind, self.data.id)
        } else {
            self.data.cid.clone()
        }
    }

    fn path<'a>(&'a self, tail: &[&'a str]) -> Result<Vec<&'a str>> {
        if self.data.kind.is_empty() {
            return Err(Error::invalid("channel type is empty"));
        }
        if self.data.id.is_empty() {
            return Err(Error::invalid("channel ID is empty"));
        }
        let mut path = vec!["channels", self.data.kind.as_str(), self.data.id.as_str()];
        path.extend_from_slice(tail);
        Ok(path)
    }

    /// Gets or creates the channel and loads its state. Without an ID the
    /// backend derives one from the member list in `payload.data`.
    pub(crate) async fn query(&mut self, payload: &Value) -> Result<()> {
        if self.data.kind.is_empty() {
            return Err(Error::invalid("channel type is empty"));
        }
        let resp: ChannelState = if self.data.id.is_empty() {
            let path = ["channels", self.data.kind.as_str(), "query"];
            self.client.http().post(&path, payload).await?
        } else {
            self.client.http().post(&self.path(&["query"])?, payload).await?
        };
        self.apply(resp);
        Ok(())
    }

    /// Reloads channel data, members, messages and read state.
    pub async fn refresh(&mut self) -> Result<()> {
        self.query(&json!({"watch": false, "state": true})).await
    }

    async fn post_update(&mut self, body: &ExtraData) -> Result<()> {
        let resp: ChannelState = self.client.http().post(&self.path(&[])?, body).await?;
        self.apply(resp);
        Ok(())
    }

    fn update_body(key: &str, value: Value, message: Option<&Message>) -> Result<ExtraData> {
        let mut body = ExtraData::new();
        body.insert(key.to_owned(), value);
        if let Some(message) = message {
            body.insert("message".to_owned(), serde_json::to_value(message)?);
        }
        Ok(body)
    }

    /// Replaces the channel's custom data; `message` is posted as a system message.
    pub async fn update(&mut self, data: ExtraData, message: Option<&Message>) -> Result<()> {
        let body = Self::update_body("data", Value::Object(data), message)?;
        self.post_update(&body).await
    }

    pub async fn partial_update(&mut self, update: &PartialUpdate) -> Result<()> {
        if update.set.is_empty() && update.unset.is_empty() {
            return Err(Error::invalid("set or unset should not be empty"));
        }
        let resp: ChannelState = self.client.http().patch(&self.path(&[])?, update).await?;
        self.apply(resp);
        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        self.client.http().delete::<IgnoredAny>(&self.path(&[])?, &Vec::new()).await?;
        Ok(())
    }

    /// Removes every message from the channel.
    pub async fn truncate(&mut self) -> Result<()> {
        let resp: ChannelState = self
            .client
            .http()
            .post(&self.path(&["truncate"])?, &json!({}))
            .await?;
        self.apply(resp);
        self.messages.clear();
        Ok(())
    }

    pub async fn add_members(
        &mut self,
        user_ids: &[&str],
        message: Option<&Message>,
        options: Option<ExtraData>,
    ) -> Result<()> {
        require_ids(user_ids)?;
        let mut body = Self::update_body("add_members", json!(user_ids), message)?;
        if let Some(options) = options {
            for (key, value) in options {
                body.entry(key).or_insert(value);
            }
        }
        self.post_update(&body).await
    }

    pub async fn remove_members(&mut self, user_ids: &[&str], message: Option<&Message>) -> Result<()> {
        require_ids(user_ids)?;
        let body = Self::update_body("remove_members", json!(user_ids), message)?;
        self.post_update(&body).await
    }

    pub async fn invite_members(&mut self, user_ids: &[&str]) -> Result<()> {
        require_ids(user_ids)?;
        let body = Self::update_body("invites", json!(user_ids), None)?;
        self.post_update(&body).await
    }

    pub async fn add_moderators(&mut self, user_ids: &[&str]) -> Result<()> {
        self.add_moderators_with_message(user_ids, None).await
    }

    pub async fn add_moderators_with_message(
        &mut self,
        user_ids: &[&str],
        message: Option<&Message>,
    ) -> Result<()> {
        require_ids(user_ids)?;
        let body = Self::update_body("add_moderators", json!(user_ids), message)?;
        self.post_update(&body).await
    }

    pub async fn demote_moderators(&mut self, user_ids: &[&str]) -> Result<()> {
        self.demote_moderators_with_message(user_ids, None).await
    }

    pub async fn demote_moderators_with_message(
        &mut self,
        user_ids: &[&str],
        message: Option<&Message>,
    ) -> Result<()> {
        require_ids(user_ids)?;
        let body = Self::update_body("demote_moderators", json!(user_ids), message)?;
        self.post_update(&body).await
    }

    pub async fn accept_invite(&mut self, user_id: &str, message: Option<&Message>) -> Result<()> {
        require_user_id(user_id)?;
        let mut body = Self::update_body("accept_invite", json!(true), message)?;
        body.insert("user_id".to_owned(), json!(user_id));
        self.post_update(&body).await
    }

    pub async fn reject_invite(&mut self, user_id: &str, message: Option<&Message>) -> Result<()> {
        require_user_id(user_id)?;
        let mut body = Self::update_body("reject_invite", json!(true), message)?;
        body.insert("user_id".to_owned(), json!(user_id));
        self.post_update(&body).await
    }

    /// Members matching the filter; `name` supports `$autocomplete`.
    pub async fn query_members(&self, q: &QueryOption) -> Result<Vec<ChannelMember>> {
        let request = QueryMembersRequest {
            kind: self.kind(),
            id: self.id(),
            query: QueryRequest {
                user_id: "",
                ..QueryRequest::from(q)
            },
        };
        let params = vec![payload_param(&request)?];
        let resp: QueryMembersResponse = self.client.http().get(&["members"], &params).await?;
        Ok(resp.members)
    }

    /// Sends `message` as `user_id` and returns it as stored, with ID and
    /// rendered HTML filled in.
    pub async fn send_message(
        &self,
        message: &Message,
        user_id: &str,
        options: SendMessageOptions,
    ) -> Result<Message> {
        require_user_id(user_id)?;
        let mut message = message.clone();
        message.user = Some(User::new(user_id));

        let mut body = json!({ "message": message });
        if options.skip_push {
            body["skip_push"] = json!(true);
        }
        let resp: MessageResponse = self.client.http().post(&self.path(&["message"])?, &body).await?;
        Ok(resp.message)
    }

    /// Imports historical messages, keeping their `created_at`.
    pub async fn import_messages(&self, messages: &[Message]) -> Result<ImportMessagesResponse> {
        if messages.is_empty() {
            return Err(Error::invalid("messages are empty"));
        }
        self.client
            .http()
            .post(&self.path(&["import"])?, &json!({ "messages": messages }))
            .await
    }

    pub async fn get_replies(&self, parent_id: &str, options: &[(&str, &str)]) -> Result<Vec<Message>> {
        if parent_id.is_empty() {
            return Err(Error::invalid("parent message ID is empty"));
        }
        let resp: MessagesResponse = self
            .client
            .http()
            .get(&["messages", parent_id, "replies"], &query_pairs(options))
            .await?;
        Ok(resp.messages)
    }

    pub async fn send_event(&self, event: &Event, user_id: &str) -> Result<()> {
        require_user_id(user_id)?;
        if event.kind.is_empty() {
            return Err(Error::invalid("event type is empty"));
        }
        let mut event = event.clone();
        event.user = Some(User::new(user_id));
        self.client
            .http()
            .post::<_, IgnoredAny>(&self.path(&["event"])?, &json!({ "event": event }))
            .await?;
        Ok(())
    }

    pub async fn mark_read(&self, user_id: &str, options: Option<ExtraData>) -> Result<()> {
        require_user_id(user_id)?;
        let mut body = options.unwrap_or_default();
        body.insert("user".to_owned(), json!({ "id": user_id }));
        self.client
            .http()
            .post::<_, IgnoredAny>(&self.path(&["read"])?, &body)
            .await?;
        Ok(())
    }

    /// Bans `target_id` from this channel only.
    pub async fn ban_user(&self, target_id: &str, user_id: &str, options: Option<ExtraData>) -> Result<()> {
        let mut options = options.unwrap_or_default();
        options.insert("type".to_owned(), json!(self.kind()));
        options.insert("id".to_owned(), json!(self.id()));
        self.client.ban_user(target_id, user_id, Some(options)).await
    }

    pub async fn unban_user(&self, target_id: &str) -> Result<()> {
        self.client
            .unban_user(target_id, &[("type", self.kind()), ("id", self.id())])
            .await
    }

    /// Mutes the channel for `user_id`, optionally expiring after `expiration`.
    pub async fn mute(&self, user_id: &str, expiration: Option<Duration>) -> Result<ChannelMuteResponse> {
        require_user_id(user_id)?;
        let mut body = json!({ "channel_cid": self.cid(), "user_id": user_id });
        if let Some(expiration) = expiration {
            let millis = u64::try_from(expiration.as_millis())
                .map_err(|_| Error::invalid("mute expiration is too large"))?;
            body["expiration"] = json!(millis);
        }
        self.client
            .http()
            .post(&["moderation", "mute", "channel"], &body)
            .await
    }

    pub async fn unmute(&self, user_id: &str) -> Result<()> {
        require_user_id(user_id)?;
        self.client
            .http()
            .post::<_, IgnoredAny>(
                &["moderation", "unmute", "channel"],
                &json!({ "channel_cid": self.cid(), "user_id": user_id }),
            )
            .await?;
        Ok(())
    }

    /// Hides the channel from `user_id`'s channel list until a new message arrives.
    pub async fn hide(&self, user_id: &str, clear_history: bool) -> Result<()> {
        require_user_id(user_id)?;
        self.client
            .http()
            .post::<_, IgnoredAny>(
                &self.path(&["hide"])?,
                &json!({ "user_id": user_id, "clear_history": clear_history }),
            )
            .await?;
        Ok(())
    }

    pub async fn show(&self, user_id: &str) -> Result<()> {
        require_user_id(user_id)?;
        self.client
            .http()
            .post::<_, IgnoredAny>(&self.path(&["show"])?, &json!({ "user_id": user_id }))
            .await?;
        Ok(())
    }

    /// Uploads a file to the channel and returns its URL.
    pub async fn send_file(&self, request: &SendFileRequest) -> Result<String> {
        let content_type = request
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        let form = request.form(content_type)?;
        let resp: FileResponse = self.client.http().upload(&self.path(&["file"])?, form).await?;
        Ok(resp.file)
    }

    /// Uploads an image; `content_type` must be an `image/*` type.
    pub async fn send_image(&self, request: &SendFileRequest) -> Result<String> {
        let content_type = match request.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => ct,
            _ => return Err(Error::invalid("image content type must be image/*")),
        };
        let form = request.form(content_type)?;
        let resp: FileResponse = self.client.http().upload(&self.path(&["image"])?, form).await?;
        Ok(resp.file)
    }

    pub async fn delete_file(&self, url: &str) -> Result<()> {
        self.delete_upload("file", url).await
    }

    pub async fn delete_image(&self, url: &str) -> Result<()> {
        self.delete_upload("image", url).await
    }

    async fn delete_upload(&self, kind: &str, url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(Error::invalid("url is empty"));
        }
        let params = vec![("url".to_owned(), url.to_owned())];
        self.client
            .http()
            .delete::<IgnoredAny>(&self.path(&[kind])?, &params)
            .await?;
        Ok(())
    }
}
