//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port and drives the client
//! over real HTTP through the default `ReqwestTransport`, checking that
//! request building, header injection and outcome classification hold up
//! against an actual server.

use lametric_cloud::{ApiError, Client, ClientConfig, Frame, GoalData, VERSION};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Start the mock server on an ephemeral port and return its base URL.
async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn client(base_url: &str, token: Option<&str>) -> Client {
    let mut config = ClientConfig::new().with_base_url(base_url);
    if let Some(token) = token {
        config = config.with_access_token(token);
    }
    Client::new(config)
}

#[tokio::test]
async fn widget_update_lifecycle() {
    let base_url = start_server().await;
    let client = client(&base_url, Some("12345"));

    // Step 1: push typed frames.
    let frames = vec![
        Frame::text("Hello").with_icon("i120"),
        Frame::goal(GoalData {
            start: 0,
            current: 42,
            end: 100,
            unit: Some("%".to_string()),
        }),
    ];
    let reply = client.update_widget("abc", &frames, None).await.unwrap();
    assert_eq!(reply, json!({"success": {"data": {"frames": 2}}}));

    // Step 2: the server stored exactly what was sent.
    let state = client.get("dev/widget/abc", &()).await.unwrap();
    assert_eq!(state["frames"], serde_json::to_value(&frames).unwrap());
    assert!(state["version"].is_null());

    // Step 3: push raw JSON frames to a versioned widget.
    let raw_frames = json!([{"text": "v2"}]);
    client
        .update_widget("abc", &raw_frames, Some("2"))
        .await
        .unwrap();

    let state = client.get("/dev/widget/abc", &()).await.unwrap();
    assert_eq!(state["frames"], raw_frames);
    assert_eq!(state["version"], "2");
}

#[tokio::test]
async fn missing_token_surfaces_raw_errors() {
    let base_url = start_server().await;
    let client = client(&base_url, None);

    let err = client
        .update_widget("abc", &[Frame::text("nope")], None)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, ApiError::Application(errors) if *errors == json!([{"message": "Unauthorized"}])),
        "{err:?}"
    );
}

#[tokio::test]
async fn unknown_widget_is_an_application_error() {
    let base_url = start_server().await;
    let err = client(&base_url, Some("12345"))
        .get("dev/widget/missing", &())
        .await
        .unwrap_err();
    assert_eq!(err.errors(), Some(&json!([{"message": "widget not found"}])));
}

#[tokio::test]
async fn empty_404_is_an_http_status_error() {
    let base_url = start_server().await;
    let err = client(&base_url, None)
        .get("no/such/route", &())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, ApiError::HttpStatus { status: 404, reason } if reason == "Not Found"),
        "{err:?}"
    );
}

#[tokio::test]
async fn get_sends_params_and_default_headers() {
    let base_url = start_server().await;
    let client = Client::new(
        ClientConfig::new()
            .with_base_url(&base_url)
            .with_access_token("12345")
            .with_header("foo", "bar"),
    );

    let echo = client
        .get("dev/echo", &json!({"page": 2, "filter": {"kind": "clock"}}))
        .await
        .unwrap();

    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["query"], json!([["filter[kind]", "clock"], ["page", "2"]]));
    assert!(echo["body"].is_null());

    let headers = &echo["headers"];
    assert_eq!(headers["x-access-token"], "12345");
    assert_eq!(headers["foo"], "bar");
    assert_eq!(headers["accept"], "application/json");
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["user-agent"], format!("lametric-cloud/{VERSION}"));
}

#[tokio::test]
async fn non_get_sends_json_body_without_token_header() {
    let base_url = start_server().await;
    let client = client(&base_url, None);
    let params = json!({"name": "clock", "tags": ["a", "b"]});

    for (method, echo) in [
        ("POST", client.post("dev/echo", &params).await.unwrap()),
        ("PUT", client.put("dev/echo", &params).await.unwrap()),
        ("DELETE", client.delete("dev/echo", &params).await.unwrap()),
    ] {
        assert_eq!(echo["method"], method);
        assert_eq!(echo["body"], params, "{method}");
        assert_eq!(echo["query"], json!([]), "{method}");
        assert!(echo["headers"].get("x-access-token").is_none(), "{method}");
    }
}

#[tokio::test]
async fn concurrent_calls_share_one_client() {
    let base_url = start_server().await;
    let client = client(&base_url, Some("12345"));

    let first = [Frame::text("1")];
    let second = [Frame::text("2")];
    let params = json!({"n": 3});
    let (a, b, c) = tokio::join!(
        client.update_widget("one", &first, None),
        client.update_widget("two", &second, None),
        client.get("dev/echo", &params),
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(c.unwrap()["query"], json!([["n", "3"]]));

    let one = client.get("dev/widget/one", &()).await.unwrap();
    let two = client.get("dev/widget/two", &()).await.unwrap();
    assert_eq!(one["frames"], json!([{"text": "1"}]));
    assert_eq!(two["frames"], json!([{"text": "2"}]));
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    // Bind and drop a listener so the port is known to be closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), None)
        .get("dev/echo", &())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    assert!(err.status().is_none());
}

#[tokio::test]
async fn empty_echo_body_round_trips_as_value() {
    let base_url = start_server().await;
    let echo: Value = client(&base_url, None).delete("dev/echo", &()).await.unwrap();
    assert_eq!(echo["method"], "DELETE");
    assert!(echo["body"].is_null());
}
