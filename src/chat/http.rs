static CLIENT_HEADER: &str = concat!("stream-rust-client-", env!("CARGO_PKG_VERSION"));

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::ser::Serialize;
use tracing::{debug, warn};

use crate::error::{ApiError, Error, RateLimitInfo, Result};
use crate::settings::ClientSettings;

/// Query parameters attached to a call, on top of `api_key`.
pub(crate) type Params = Vec<(String, String)>;

/// Encodes a structured read request into the `payload` query parameter
/// used by the GET-style query endpoints.
pub(crate) fn payload_param<T: Serialize + ?Sized>(payload: &T) -> Result<(String, String)> {
    Ok(("payload".to_owned(), serde_json::to_string(payload)?))
}

pub(crate) struct ChatHttpClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ChatHttpClient {
    pub fn new(settings: &ClientSettings, auth_token: &str) -> Result<ChatHttpClient> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| Error::Settings(format!("invalid base URL {:?}: {}", settings.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Settings(format!("base URL {:?} cannot hold a path", settings.base_url)));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(auth_token)
                .map_err(|_| Error::Settings("auth token is not a valid header value".to_owned()))?,
        );
        headers.insert("Stream-Auth-Type", HeaderValue::from_static("jwt"));
        headers.insert("X-Stream-Client", HeaderValue::from_static(CLIENT_HEADER));

        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;
        Ok(ChatHttpClient {
            client,
            base_url,
            api_key: settings.api_key.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str], params: &Params) -> RequestBuilder {
        self.client
            .request(method, self.url(segments))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
    }

    pub async fn api_call<B, R>(
        &self,
        method: Method,
        segments: &[&str],
        params: &Params,
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(method = %method, path = %segments.join("/"), "chat api call");
        let mut req = self.request(method, segments, params);
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await?;
        Self::parse_response(res).await
    }

    pub async fn get<R: DeserializeOwned>(&self, segments: &[&str], params: &Params) -> Result<R> {
        self.api_call::<(), R>(Method::GET, segments, params, None).await
    }

    pub async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<R> {
        self.api_call(Method::POST, segments, &Params::new(), Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<R> {
        self.api_call(Method::PATCH, segments, &Params::new(), Some(body)).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, segments: &[&str], params: &Params) -> Result<R> {
        self.api_call::<(), R>(Method::DELETE, segments, params, None).await
    }

    pub async fn upload<R: DeserializeOwned>(&self, segments: &[&str], form: Form) -> Result<R> {
        debug!(path = %segments.join("/"), "chat api upload");
        let res = self
            .request(Method::POST, segments, &Params::new())
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(res).await
    }

    async fn parse_response<R: DeserializeOwned>(res: Response) -> Result<R> {
        let status = res.status();
        let rate_limit = RateLimitInfo::from_headers(res.headers());
        let body = res.bytes().await?;

        if status.as_u16() >= 400 {
            let mut err: ApiError = serde_json::from_slice(&body).unwrap_or_else(|_| ApiError {
                message: String::from_utf8_lossy(&body).into_owned(),
                ..Default::default()
            });
            err.status_code = status.as_u16();
            err.rate_limit = rate_limit;
            warn!(status = err.status_code, code = err.code, message = %err.message, "chat api error");
            return Err(err.into());
        }

        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
