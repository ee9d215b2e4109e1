mod auth;
mod channel;
mod client;
mod device;
mod http;
mod message;
mod moderation;
mod query;
mod user;

pub use self::channel::{
    Channel, ChannelData, ChannelMember, ChannelMuteResponse, ChannelRead, ImportMessagesResponse,
    PartialUpdate, SendFileRequest,
};
pub use self::client::Client;
pub use self::device::{Device, PushProvider};
pub use self::message::{
    Attachment, Event, Message, MessageType, Reaction, ReactionResponse, SendMessageOptions,
};
pub use self::moderation::{MessageFlag, MuteResponse};
pub use self::query::{QueryOption, SearchRequest, SearchResponse, SearchResult, SearchWarning, SortOption};
pub use self::user::{ChannelMute, DeleteUserOptions, ExportUserResponse, Mute, PartialUserUpdate, User};

/// Free-form JSON object for custom fields and request options.
pub type ExtraData = serde_json::Map<String, serde_json::Value>;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
