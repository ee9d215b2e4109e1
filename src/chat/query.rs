use serde_derive::{Deserialize, Serialize};

use super::channel::{Channel, ChannelState};
use super::http::payload_param;
use super::{Client, ExtraData, Message, User};
use crate::error::{Error, Result};

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub field: String,
    /// 1 for ascending, -1 for descending.
    pub direction: i32,
}

impl SortOption {
    pub fn asc(field: &str) -> SortOption {
        SortOption {
            field: field.to_owned(),
            direction: 1,
        }
    }

    pub fn desc(field: &str) -> SortOption {
        SortOption {
            field: field.to_owned(),
            direction: -1,
        }
    }
}

/// Filter, sort and pagination for the query endpoints. The filter is a
/// MongoDB-style condition object forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOption {
    pub filter: ExtraData,
    pub sort: Vec<SortOption>,
    pub user_id: String,
    pub limit: u32,
    pub offset: u32,
    pub message_limit: Option<u32>,
    pub member_limit: Option<u32>,
}

impl QueryOption {
    /// Starts a query from a `json!` filter, which must be an object.
    pub fn with_filter(filter: serde_json::Value) -> Result<QueryOption> {
        match filter {
            serde_json::Value::Object(filter) => Ok(QueryOption {
                filter,
                ..Default::default()
            }),
            other => Err(Error::invalid(format!("filter must be a JSON object, got {}", other))),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub filter_conditions: &'a ExtraData,
    #[serde(skip_serializing_if = "<[SortOption]>::is_empty")]
    pub sort: &'a [SortOption],
    #[serde(skip_serializing_if = "str::is_empty")]
    pub user_id: &'a str,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<bool>,
}

impl<'a> From<&'a QueryOption> for QueryRequest<'a> {
    fn from(q: &'a QueryOption) -> Self {
        QueryRequest {
            filter_conditions: &q.filter,
            sort: &q.sort,
            user_id: &q.user_id,
            limit: q.limit,
            offset: q.offset,
            message_limit: q.message_limit,
            member_limit: q.member_limit,
            state: None,
            watch: None,
            presence: None,
        }
    }
}

/// Full-text message search across the channels matching `filters`.
/// `query` and `message_filters` are mutually exclusive, and `offset`
/// cannot be combined with `sort` or `next`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(rename = "filter_conditions")]
    pub filters: ExtraData,
    #[serde(rename = "message_filter_conditions", skip_serializing_if = "ExtraData::is_empty")]
    pub message_filters: ExtraData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortOption>,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub offset: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub next: String,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<()> {
        if self.offset != 0 && (!self.sort.is_empty() || !self.next.is_empty()) {
            return Err(Error::invalid("cannot use offset with next or sort parameters"));
        }
        if !self.query.is_empty() && !self.message_filters.is_empty() {
            return Err(Error::invalid("can only specify query or message filters, not both"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub message: Message,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchWarning {
    #[serde(default)]
    pub warning_code: i64,
    #[serde(default)]
    pub warning_description: String,
    #[serde(default)]
    pub channel_search_count: i64,
    #[serde(default)]
    pub channel_search_cids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub next: String,
    #[serde(default)]
    pub previous: String,
    #[serde(default)]
    pub results_warning: Option<SearchWarning>,
}

#[derive(Deserialize)]
struct QueryUsersResponse {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Deserialize)]
struct QueryChannelsResponse {
    #[serde(default)]
    channels: Vec<ChannelState>,
}

impl Client {
    pub async fn query_users(&self, q: &QueryOption) -> Result<Vec<User>> {
        let params = vec![payload_param(&QueryRequest::from(q))?];
        let resp: QueryUsersResponse = self.http().get(&["users"], &params).await?;
        Ok(resp.users)
    }

    /// Returns the channels matching the filter, each with its members,
    /// latest messages and read state. `user_id` scopes per-user filters
    /// such as `muted`.
    pub async fn query_channels(&self, q: &QueryOption) -> Result<Vec<Channel>> {
        let request = QueryRequest {
            state: Some(true),
            watch: Some(false),
            presence: Some(false),
            ..QueryRequest::from(q)
        };
        let resp: QueryChannelsResponse = self.http().post(&["channels"], &request).await?;
        Ok(resp
            .channels
            .into_iter()
            .map(|state| Channel::from_state(self.clone(), state))
            .collect())
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Message>> {
        let resp = self.search_with_full_response(request).await?;
        Ok(resp.results.into_iter().map(|r| r.message).collect())
    }

    pub async fn search_with_full_response(&self, request: &SearchRequest) -> Result<SearchResponse> {
        request.validate()?;
        let params = vec![payload_param(request)?];
        self.http().get(&["search"], &params).await
    }
}
