use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;

use super::auth;
use super::http::ChatHttpClient;
use super::{Channel, ExtraData};
use crate::error::{Error, Result};
use crate::settings::ClientSettings;

struct ClientInner {
    settings: ClientSettings,
    http_client: ChatHttpClient,
}

/// Server-side handle to the chat API. Cloning is cheap and clones share
/// one connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &self.inner.settings.api_key)
            .field("base_url", &self.inner.settings.base_url)
            .finish()
    }
}

impl Client {
    pub fn new(api_key: &str, api_secret: &str) -> Result<Client> {
        Self::with_settings(ClientSettings::new(api_key, api_secret))
    }

    /// Builds a client from `STREAM_KEY`, `STREAM_SECRET` and the optional
    /// `STREAM_CHAT_URL` / `STREAM_CHAT_TIMEOUT` variables.
    pub fn from_env() -> Result<Client> {
        Self::with_settings(ClientSettings::from_env()?)
    }

    pub fn with_settings(settings: ClientSettings) -> Result<Client> {
        settings.validate().map_err(|e| Error::invalid(e.to_string()))?;
        let token = auth::server_token(&settings.api_secret)?;
        let http_client = ChatHttpClient::new(&settings, &token)?;
        debug!(base_url = %settings.base_url, "chat client ready");
        Ok(Client {
            inner: Arc::new(ClientInner { settings, http_client }),
        })
    }

    pub(crate) fn http(&self) -> &ChatHttpClient {
        &self.inner.http_client
    }

    pub fn api_key(&self) -> &str {
        &self.inner.settings.api_key
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    /// Whether both handles share the same underlying client.
    pub fn ptr_eq(&self, other: &Client) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle to a channel. No request is made until an operation is called.
    pub fn channel(&self, kind: &str, id: &str) -> Channel {
        Channel::new(self.clone(), kind, id)
    }

    /// Gets or creates a channel owned by `user_id` and loads its state.
    ///
    /// An empty `id` requires `data["members"]`; the backend then derives a
    /// distinct channel for that member set.
    pub async fn create_channel(
        &self,
        kind: &str,
        id: &str,
        user_id: &str,
        data: Option<ExtraData>,
    ) -> Result<Channel> {
        let mut data = data.unwrap_or_default();
        if kind.is_empty() {
            return Err(Error::invalid("channel type is empty"));
        }
        if id.is_empty() && !data.contains_key("members") {
            return Err(Error::invalid("either channel ID or members must be provided"));
        }
        if user_id.is_empty() {
            return Err(Error::invalid("user ID is empty"));
        }

        data.insert("created_by".to_owned(), json!({ "id": user_id }));
        let payload = json!({
            "watch": false,
            "state": true,
            "presence": false,
            "data": Value::Object(data),
        });

        let mut channel = self.channel(kind, id);
        channel.query(&payload).await?;
        Ok(channel)
    }

    /// Signs a token a frontend client can use to connect as `user_id`.
    pub fn create_token(&self, user_id: &str, expire: Option<DateTime<Utc>>) -> Result<String> {
        auth::user_token(&self.inner.settings.api_secret, user_id, expire)
    }

    /// Checks the `X-Signature` header of a webhook request against its body.
    pub fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        auth::verify_webhook(&self.inner.settings.api_secret, body, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_credentials() {
        assert!(matches!(Client::new("", "secret"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Client::new("key", ""), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let client = Client::new("key", "very-secret").unwrap();
        let printed = format!("{:?}", client);
        assert!(printed.contains("key"));
        assert!(!printed.contains("very-secret"));
    }

    #[test]
    fn test_channel_shares_client() {
        let client = Client::new("key", "secret").unwrap();
        let channel = client.channel("team", "spacex");
        assert!(channel.client().ptr_eq(&client));
        assert_eq!(channel.kind(), "team");
        assert_eq!(channel.id(), "spacex");
        assert!(channel.members.is_empty());
    }

    #[tokio::test]
    async fn test_create_channel_validation() {
        let client = Client::new("key", "secret").unwrap();

        let err = client.create_channel("", "id", "bob", None).await.unwrap_err();
        assert!(err.to_string().contains("channel type"));

        let err = client.create_channel("messaging", "", "bob", None).await.unwrap_err();
        assert!(err.to_string().contains("members"));

        let err = client.create_channel("messaging", "id", "", None).await.unwrap_err();
        assert!(err.to_string().contains("user ID"));
    }

    #[test]
    fn test_webhook_roundtrip() {
        let client = Client::new("key", "secret").unwrap();
        let body = br#"{"type":"message.new"}"#;
        let signature = auth::webhook_signature("secret", body).unwrap();
        assert!(client.verify_webhook(body, &signature));
        assert!(!client.verify_webhook(body, "00"));
    }
}
