mod common;

use common::{channel_json, member_json, object, MockBackend, Reply};
use futures::future::join_all;
use serde_json::json;
use stream_chat::{Error, QueryOption, SearchRequest, SortOption};

#[tokio::test]
async fn test_query_users() {
    let backend = MockBackend::start(|req| {
        assert!(req.is("GET", "/users"));
        Reply::ok(json!({"users": [{"id": "b", "online": true}, {"id": "c"}]}))
    })
    .await;

    let users = backend
        .client()
        .query_users(&QueryOption {
            filter: object(json!({"id": {"$in": ["a", "b", "c"]}})),
            sort: vec![SortOption::desc("last_active")],
            offset: 1,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert!(users[0].online);
    assert_eq!(
        backend.last().payload(),
        json!({
            "filter_conditions": {"id": {"$in": ["a", "b", "c"]}},
            "sort": [{"field": "last_active", "direction": -1}],
            "limit": 2,
            "offset": 1
        })
    );
}

#[tokio::test]
async fn test_query_channels() {
    let backend = MockBackend::start(|req| {
        assert!(req.is("POST", "/channels"));
        Reply::ok(json!({
            "channels": [{
                "channel": channel_json("messaging", "c1"),
                "members": [member_json("bob", "owner")],
                "messages": [{"id": "m1", "text": "hello"}],
                "read": [{"user": {"id": "bob"}, "unread_messages": 2}]
            }]
        }))
    })
    .await;
    let client = backend.client();

    let channels = client
        .query_channels(&QueryOption {
            filter: object(json!({"id": "c1"})),
            message_limit: Some(1),
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(channels.len(), 1);
    let channel = &channels[0];
    assert_eq!(channel.cid(), "messaging:c1");
    assert_eq!(channel.members[0].user.id, "bob");
    assert_eq!(channel.messages[0].text, "hello");
    assert_eq!(channel.read[0].unread_messages, 2);
    assert!(channel.client().ptr_eq(&client));

    assert_eq!(
        backend.last().json(),
        json!({
            "filter_conditions": {"id": "c1"},
            "limit": 1,
            "message_limit": 1,
            "state": true,
            "watch": false,
            "presence": false
        })
    );
}

#[tokio::test]
async fn test_query_muted_channels() {
    let backend = MockBackend::start(|_| {
        Reply::ok(json!({"channels": [{"channel": channel_json("messaging", "muted-1")}]}))
    })
    .await;

    let channels = backend
        .client()
        .query_channels(&QueryOption {
            filter: object(json!({"muted": true, "cid": "messaging:muted-1"})),
            user_id: "bob".to_owned(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(channels[0].id(), "muted-1");
    let body = backend.last().json();
    assert_eq!(body["user_id"], "bob");
    assert_eq!(body["filter_conditions"]["muted"], true);
}

#[tokio::test]
async fn test_non_object_filter_is_rejected() {
    let backend = MockBackend::start(|_| Reply::ok(json!({"users": [{"id": "bob"}]}))).await;
    let client = backend.client();

    let result = QueryOption::with_filter(json!([{"id": "bob"}]));
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(QueryOption::with_filter(json!("bob")).is_err());
    assert!(QueryOption::with_filter(json!(null)).is_err());

    let q = QueryOption::with_filter(json!({"id": "bob"})).unwrap();
    client.query_users(&q).await.unwrap();
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(backend.last().payload(), json!({"filter_conditions": {"id": "bob"}}));
}

#[tokio::test]
async fn test_query_channels_empty_result() {
    let backend = MockBackend::start(|_| Reply::ok(json!({"channels": []}))).await;

    let channels = backend
        .client()
        .query_channels(&QueryOption::with_filter(json!({"id": "missing"})).unwrap())
        .await
        .unwrap();
    assert!(channels.is_empty());
}

#[tokio::test]
async fn test_search() {
    let backend = MockBackend::start(|req| {
        assert!(req.is("GET", "/search"));
        Reply::ok(json!({
            "results": [
                {"message": {"id": "m1", "text": "How many errors should I expect"}},
                {"message": {"id": "m2", "text": "Errors are expected"}}
            ]
        }))
    })
    .await;

    let messages = backend
        .client()
        .search(&SearchRequest {
            query: "errors".to_owned(),
            filters: object(json!({"members": {"$in": ["bob"]}})),
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, "m2");
    assert_eq!(
        backend.last().payload(),
        json!({"query": "errors", "filter_conditions": {"members": {"$in": ["bob"]}}, "limit": 2})
    );
}

#[tokio::test]
async fn test_search_rejects_invalid_request_without_calling() {
    let backend = MockBackend::start(|_| Reply::ok(json!({}))).await;
    let client = backend.client();

    let err = client
        .search(&SearchRequest {
            query: "errors".to_owned(),
            filters: object(json!({"members": {"$in": ["bob"]}})),
            offset: 2,
            next: "cursor".to_owned(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = client
        .search(&SearchRequest {
            query: "errors".to_owned(),
            message_filters: object(json!({"text": {"$q": "errors"}})),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_search_with_full_response_pages() {
    let backend = MockBackend::start(|req| {
        let payload = req.payload();
        if payload.get("next").is_none() {
            Reply::ok(json!({
                "results": [{"message": {"id": "m1"}}],
                "next": "page-2"
            }))
        } else {
            Reply::ok(json!({
                "results": [{"message": {"id": "m2"}}],
                "previous": "page-1",
                "results_warning": {
                    "warning_code": 1,
                    "warning_description": "searched a subset of channels",
                    "channel_search_count": 1,
                    "channel_search_cids": ["messaging:c1"]
                }
            }))
        }
    })
    .await;
    let client = backend.client();

    let mut request = SearchRequest {
        filters: object(json!({"members": {"$in": ["bob"]}})),
        message_filters: object(json!({"text": {"$q": "hello"}})),
        sort: vec![SortOption::desc("created_at")],
        limit: 1,
        ..Default::default()
    };
    let page = client.search_with_full_response(&request).await.unwrap();
    assert_eq!(page.results[0].message.id, "m1");
    assert_eq!(page.next, "page-2");
    assert!(page.previous.is_empty());
    assert!(page.results_warning.is_none());

    request.next = page.next;
    let page = client.search_with_full_response(&request).await.unwrap();
    assert_eq!(page.results[0].message.id, "m2");
    assert_eq!(page.previous, "page-1");
    assert!(page.next.is_empty());
    let warning = page.results_warning.unwrap();
    assert_eq!(warning.channel_search_cids, vec!["messaging:c1"]);

    let payload = backend.last().payload();
    assert_eq!(payload["next"], "page-2");
    assert_eq!(payload["message_filter_conditions"], json!({"text": {"$q": "hello"}}));
}

#[tokio::test]
async fn test_flag_and_query_flags() {
    let backend = MockBackend::start(|req| {
        if req.is("GET", "/moderation/flags/message") {
            Reply::ok(json!({
                "flags": [{"user": {"id": "bob"}, "message": {"id": "m1", "text": "spam"}}]
            }))
        } else {
            Reply::ok(json!({}))
        }
    })
    .await;
    let client = backend.client();

    client.flag_message("m1", "bob").await.unwrap();
    let req = backend.last();
    assert!(req.is("POST", "/moderation/flag"));
    assert_eq!(req.json(), json!({"target_message_id": "m1", "user_id": "bob"}));

    let flags = client
        .query_message_flags(&QueryOption::with_filter(json!({"channel_cid": "messaging:c1"})).unwrap())
        .await
        .unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0].message.as_ref().unwrap().id, "m1");
    assert_eq!(
        backend.last().payload(),
        json!({"filter_conditions": {"channel_cid": "messaging:c1"}})
    );

    client.unflag_message("m1", "bob").await.unwrap();
    assert!(backend.last().is("POST", "/moderation/unflag"));

    client.flag_user("sue", "bob").await.unwrap();
    assert_eq!(backend.last().json(), json!({"target_user_id": "sue", "user_id": "bob"}));

    client.unflag_user("sue", "bob").await.unwrap();
    assert!(backend.last().is("POST", "/moderation/unflag"));
}

#[tokio::test]
async fn test_mute_and_unmute_user() {
    let backend = MockBackend::start(|req| {
        if req.path == "/moderation/mute" {
            Reply::ok(json!({
                "mute": {"user": {"id": "bob"}, "target": {"id": "sue"}, "created_at": "2021-01-01T00:00:00Z"},
                "own_user": {"id": "bob", "mutes": [{"user": {"id": "bob"}, "target": {"id": "sue"}}]}
            }))
        } else {
            Reply::ok(json!({}))
        }
    })
    .await;
    let client = backend.client();

    let resp = client.mute_user("sue", "bob").await.unwrap();
    assert_eq!(resp.mute.target.id, "sue");
    assert_eq!(resp.own_user.unwrap().mutes.len(), 1);
    assert_eq!(backend.last().json(), json!({"target_id": "sue", "user_id": "bob"}));

    client.unmute_user("sue", "bob").await.unwrap();
    assert!(backend.last().is("POST", "/moderation/unmute"));
}

#[tokio::test]
async fn test_global_ban() {
    let backend = MockBackend::start(|_| Reply::ok(json!({}))).await;
    let client = backend.client();

    client
        .ban_user("sue", "bob", Some(object(json!({"timeout": 60, "reason": "spam"}))))
        .await
        .unwrap();
    assert_eq!(
        backend.last().json(),
        json!({"target_user_id": "sue", "user_id": "bob", "timeout": 60, "reason": "spam"})
    );

    client.unban_user("sue", &[]).await.unwrap();
    let req = backend.last();
    assert!(req.is("DELETE", "/moderation/ban"));
    assert_eq!(req.query.len(), 2);
    assert_eq!(req.param("target_user_id"), Some("sue"));
}

#[tokio::test]
async fn test_concurrent_calls_share_client() {
    let backend = MockBackend::start(|req| {
        let user_id = req.path.trim_start_matches("/users/").trim_end_matches("/export");
        Reply::ok(json!({"user": {"id": user_id}}))
    })
    .await;
    let client = backend.client();

    let ids: Vec<String> = (0..8).map(|i| format!("user-{}", i)).collect();
    let results = join_all(ids.iter().map(|id| {
        let client = client.clone();
        async move { client.export_user(id).await }
    }))
    .await;

    for (id, result) in ids.iter().zip(results) {
        assert_eq!(&result.unwrap().user.id, id);
    }
    assert_eq!(backend.requests().len(), 8);
}
