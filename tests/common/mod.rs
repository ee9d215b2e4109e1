//! In-process mock of the chat backend.
//!
//! Every request is recorded and answered by a routing closure, so tests can
//! assert on the exact wire shape the client produces.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use reqwest::Url;
use serde_json::{json, Value};
use stream_chat::{Client, ClientSettings};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The JSON-encoded `payload` query parameter of GET-style queries.
    pub fn payload(&self) -> Value {
        let raw = self.param("payload").expect("request has no payload param");
        serde_json::from_str(raw).expect("payload is not JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }

    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

pub struct Reply {
    pub status: u16,
    pub body: Value,
    pub raw: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl Reply {
    pub fn ok(body: Value) -> Reply {
        Reply {
            status: 200,
            body,
            raw: None,
            headers: Vec::new(),
        }
    }

    pub fn error(status: u16, code: i64, message: &str) -> Reply {
        Reply {
            status,
            body: json!({"code": code, "message": message, "StatusCode": status, "duration": "0.01ms"}),
            raw: None,
            headers: Vec::new(),
        }
    }

    pub fn text(status: u16, text: &str) -> Reply {
        Reply {
            status,
            body: Value::Null,
            raw: Some(text.to_owned()),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Reply {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }
}

type Router = dyn Fn(&RecordedRequest) -> Reply + Send + Sync;

pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn start<F>(router: F) -> MockBackend
    where
        F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    {
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let router: Arc<Router> = Arc::new(router);

        let service_requests = requests.clone();
        let service = make_service_fn(move |_| {
            let requests = service_requests.clone();
            let router = router.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    Self::handle(req, requests.clone(), router.clone())
                }))
            }
        });

        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(service);
        let addr = server.local_addr();
        tokio::spawn(async move {
            server.await.ok();
        });

        MockBackend { addr, requests }
    }

    async fn handle(
        req: Request<Body>,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
        router: Arc<Router>,
    ) -> Result<Response<Body>, Infallible> {
        let (parts, body) = req.into_parts();
        let body = hyper::body::to_bytes(body)
            .await
            .map(|b| b.to_vec())
            .unwrap_or_default();
        let url = Url::parse(&format!("http://mock{}", parts.uri)).expect("request URI");

        let recorded = RecordedRequest {
            method: parts.method.to_string(),
            path: url.path().to_owned(),
            query: url.query_pairs().into_owned().collect(),
            headers: parts
                .headers
                .iter()
                .map(|(k, v)| (k.as_str().to_owned(), v.to_str().unwrap_or_default().to_owned()))
                .collect(),
            body,
        };
        let reply = router(&recorded);
        requests.lock().unwrap().push(recorded);

        let mut response = Response::builder()
            .status(reply.status)
            .header("Content-Type", "application/json");
        for (name, value) in &reply.headers {
            response = response.header(name.as_str(), value.as_str());
        }
        let body = reply.raw.unwrap_or_else(|| reply.body.to_string());
        Ok(response.body(Body::from(body)).unwrap())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> Client {
        let settings = ClientSettings::new("test-key", "test-secret").with_base_url(&self.base_url());
        Client::with_settings(settings).unwrap()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests().pop().expect("no request was made")
    }
}

pub fn channel_json(kind: &str, id: &str) -> Value {
    json!({
        "type": kind,
        "id": id,
        "cid": format!("{}:{}", kind, id),
        "created_by": {"id": "owner"},
        "member_count": 0,
        "created_at": "2020-03-01T10:00:00Z",
        "updated_at": "2020-03-01T10:00:00Z"
    })
}

pub fn member_json(user_id: &str, role: &str) -> Value {
    json!({
        "user_id": user_id,
        "user": {"id": user_id},
        "role": role,
        "created_at": "2020-03-01T10:00:00Z"
    })
}

/// Converts a `json!` object literal into request options.
pub fn object(value: Value) -> stream_chat::ExtraData {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}
