use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde_derive::{Deserialize, Serialize};

use super::Client;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushProvider {
    Apn,
    Firebase,
}

/// A push notification target registered for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub push_provider: PushProvider,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Device {
    pub fn new(id: &str, user_id: &str, push_provider: PushProvider) -> Device {
        Device {
            id: id.to_owned(),
            user_id: user_id.to_owned(),
            push_provider,
            created_at: None,
        }
    }
}

#[derive(Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

impl Client {
    pub async fn add_device(&self, device: &Device) -> Result<()> {
        if device.id.is_empty() {
            return Err(Error::invalid("device ID is empty"));
        }
        if device.user_id.is_empty() {
            return Err(Error::invalid("device user ID is empty"));
        }
        self.http().post::<_, IgnoredAny>(&["devices"], device).await?;
        Ok(())
    }

    pub async fn get_devices(&self, user_id: &str) -> Result<Vec<Device>> {
        if user_id.is_empty() {
            return Err(Error::invalid("user ID is empty"));
        }
        let params = vec![("user_id".to_owned(), user_id.to_owned())];
        let resp: DevicesResponse = self.http().get(&["devices"], &params).await?;
        Ok(resp.devices)
    }

    pub async fn delete_device(&self, user_id: &str, device_id: &str) -> Result<()> {
        if user_id.is_empty() || device_id.is_empty() {
            return Err(Error::invalid("user ID and device ID are required"));
        }
        let params = vec![
            ("id".to_owned(), device_id.to_owned()),
            ("user_id".to_owned(), user_id.to_owned()),
        ];
        self.http().delete::<IgnoredAny>(&["devices"], &params).await?;
        Ok(())
    }
}
