use super::*;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::ClientId;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Copy)]
enum StubMode {
    Ok,
    GraphQlErrors,
    ServerError,
    Garbage,
    OddRecords,
}

#[derive(Clone)]
struct StubState {
    mode: StubMode,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn handle_graphql(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.lock().await.push((api_key, body.clone()));

    let query = body["query"].as_str().unwrap_or_default();
    match state.mode {
        StubMode::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
        StubMode::Garbage => (StatusCode::OK, "<html>not graphql</html>".to_string()),
        StubMode::GraphQlErrors => (
            StatusCode::OK,
            json!({
                "data": null,
                "errors": [{ "message": "Not Authorized", "errorType": "Unauthorized" }]
            })
            .to_string(),
        ),
        StubMode::OddRecords => (
            StatusCode::OK,
            json!({
                "data": { "listCommentsForTalk": { "items": [
                    {
                        "talkId": "talk-odd",
                        "text": "from an old client",
                        "clientId": null,
                        "createdAt": "2019-10-01T10:00:00.000Z",
                        "createdBy": "ann"
                    },
                    {
                        "talkId": "talk-odd",
                        "text": "hand-entered",
                        "clientId": "not-a-uuid",
                        "createdAt": "1569924001000"
                    },
                    {
                        "talkId": "talk-odd",
                        "text": "regular",
                        "clientId": "6f1c3c56-8f6d-4c43-8d6a-2f0c9d0b1a11",
                        "createdAt": 1_569_924_002_000_i64,
                        "createdBy": "bob"
                    }
                ]}}
            })
            .to_string(),
        ),
        StubMode::Ok if query.contains("listCommentsForTalk") => {
            let talk_id = body["variables"]["talkId"].clone();
            (
                StatusCode::OK,
                json!({
                    "data": { "listCommentsForTalk": { "items": [
                        {
                            "id": "c-1",
                            "talkId": talk_id,
                            "text": "nice talk",
                            "clientId": "6f1c3c56-8f6d-4c43-8d6a-2f0c9d0b1a11",
                            "createdAt": 1_000,
                            "createdBy": "ann"
                        },
                        {
                            "talkId": talk_id,
                            "text": "anonymous",
                            "clientId": "6f1c3c56-8f6d-4c43-8d6a-2f0c9d0b1a12",
                            "createdAt": 2_000,
                            "createdBy": null
                        }
                    ]}}
                })
                .to_string(),
            )
        }
        StubMode::Ok => {
            let mut stored = body["variables"]["input"].clone();
            stored["id"] = json!("server-id");
            (
                StatusCode::OK,
                json!({ "data": { "createComment": stored } }).to_string(),
            )
        }
    }
}

async fn spawn_graphql_stub(mode: StubMode) -> anyhow::Result<(String, StubState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = StubState {
        mode,
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/graphql", post(handle_graphql))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/graphql"), state))
}

fn comment(talk_id: &str, text: &str) -> Comment {
    Comment {
        id: None,
        talk_id: TalkId::new(talk_id),
        text: text.to_string(),
        client_id: Some(ClientId::generate()),
        created_at: 42,
        created_by: Some("bob".to_string()),
    }
}

#[test]
fn rejects_invalid_endpoint() {
    let err = GraphQlBackend::new("not a url", None)
        .err()
        .expect("invalid endpoint");
    assert!(matches!(err, ClientError::InvalidEndpoint { .. }));
}

#[tokio::test]
async fn lists_comments_for_talk() {
    let (endpoint, stub) = spawn_graphql_stub(StubMode::Ok).await.expect("stub");
    let backend =
        GraphQlBackend::new(&endpoint, Some("da2-test-key".to_string())).expect("backend");

    let comments = backend
        .list_comments_for_talk(&TalkId::new("talk-9"))
        .await
        .expect("list");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id.as_deref(), Some("c-1"));
    assert_eq!(comments[0].talk_id, TalkId::new("talk-9"));
    assert_eq!(comments[1].created_by, None);

    let requests = stub.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let (api_key, body) = &requests[0];
    assert_eq!(api_key.as_deref(), Some("da2-test-key"));
    assert_eq!(body["variables"], json!({ "talkId": "talk-9" }));
    assert!(body["query"]
        .as_str()
        .expect("query")
        .contains("listCommentsForTalk(talkId: $talkId)"));
}

#[tokio::test]
async fn create_sends_full_comment_record() {
    let (endpoint, stub) = spawn_graphql_stub(StubMode::Ok).await.expect("stub");
    let backend = GraphQlBackend::new(&endpoint, None).expect("backend");
    let input = comment("talk-3", "hello **world**");

    let stored = backend
        .create_comment(&input)
        .await
        .expect("create")
        .expect("echoed record");
    assert_eq!(stored.id.as_deref(), Some("server-id"));
    assert_eq!(stored.text, input.text);

    let requests = stub.requests.lock().await;
    let (api_key, body) = &requests[0];
    assert_eq!(api_key, &None);
    let sent = &body["variables"]["input"];
    assert_eq!(sent["talkId"], "talk-3");
    assert_eq!(sent["text"], "hello **world**");
    let client_id = input.client_id.expect("client id");
    assert_eq!(sent["clientId"], client_id.to_string());
    assert_eq!(sent["createdAt"], 42);
    assert_eq!(sent["createdBy"], "bob");
    assert!(sent.get("id").is_none());
}

#[tokio::test]
async fn loosely_shaped_records_do_not_sink_the_list() {
    let (endpoint, _stub) = spawn_graphql_stub(StubMode::OddRecords)
        .await
        .expect("stub");
    let backend = GraphQlBackend::new(&endpoint, None).expect("backend");

    let comments = backend
        .list_comments_for_talk(&TalkId::new("talk-odd"))
        .await
        .expect("list");
    let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["from an old client", "hand-entered", "regular"]);

    assert_eq!(comments[0].client_id, None);
    assert_eq!(comments[0].created_at, 1_569_924_000_000);
    assert_eq!(comments[1].client_id, None);
    assert_eq!(comments[1].created_at, 1_569_924_001_000);
    assert_eq!(comments[1].created_by, None);
    assert!(comments[2].client_id.is_some());
    assert_eq!(comments[2].created_at, 1_569_924_002_000);
}

#[tokio::test]
async fn graphql_errors_fail_the_call() {
    let (endpoint, _stub) = spawn_graphql_stub(StubMode::GraphQlErrors)
        .await
        .expect("stub");
    let backend = GraphQlBackend::new(&endpoint, None).expect("backend");

    let err = backend
        .list_comments(&TalkId::new("t"))
        .await
        .expect_err("graphql error");
    assert!(matches!(err, ClientError::GraphQl(_)));
    assert!(err.to_string().contains("Unauthorized: Not Authorized"));
}

#[tokio::test]
async fn http_failures_and_garbage_fail_the_call() {
    let (endpoint, _stub) = spawn_graphql_stub(StubMode::ServerError)
        .await
        .expect("stub");
    let backend = GraphQlBackend::new(&endpoint, None).expect("backend");
    let err = backend
        .list_comments(&TalkId::new("t"))
        .await
        .expect_err("500");
    assert!(matches!(err, ClientError::Transport(_)));

    let (endpoint, _stub) = spawn_graphql_stub(StubMode::Garbage).await.expect("stub");
    let backend = GraphQlBackend::new(&endpoint, None).expect("backend");
    let err = backend
        .put_comment(&comment("t", "x"))
        .await
        .expect_err("garbage");
    assert!(matches!(
        err,
        ClientError::Decode {
            operation: "createComment",
            ..
        }
    ));
}

#[tokio::test]
async fn missing_backend_always_fails() {
    let backend = MissingCommentsBackend;
    assert!(backend
        .list_comments_for_talk(&TalkId::new("t"))
        .await
        .is_err());
    assert!(backend.create_comment(&comment("t", "x")).await.is_err());
}
