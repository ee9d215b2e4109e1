//! Typed client for a hosted chat backend's REST API.
//!
//! Every operation validates its arguments, makes a single authenticated
//! HTTP call and decodes the JSON response:
//!
//! ```no_run
//! use stream_chat::{Client, Message, SendMessageOptions};
//!
//! # async fn run() -> stream_chat::Result<()> {
//! let client = Client::from_env()?;
//! let channel = client.create_channel("team", "stream", "tommaso", None).await?;
//! channel
//!     .send_message(&Message::new("hi there!"), "tommaso", SendMessageOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod chat;
mod error;
mod settings;

pub use chat::*;
pub use error::{ApiError, Error, RateLimitInfo, Result};
pub use settings::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
