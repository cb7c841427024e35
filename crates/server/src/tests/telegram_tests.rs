use super::*;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const TOKEN: &str = "42TOKEN";

#[derive(Clone, Default)]
struct MockApi {
    sent: Arc<Mutex<Vec<Value>>>,
    offsets: Arc<Mutex<Vec<i64>>>,
}

async fn mock_send(State(api): State<MockApi>, Json(body): Json<Value>) -> Json<Value> {
    api.sent.lock().expect("sent").push(body);
    Json(json!({ "ok": true, "result": { "message_id": 1 } }))
}

async fn mock_updates(State(api): State<MockApi>, Json(body): Json<Value>) -> Json<Value> {
    let offset = body["offset"].as_i64().unwrap_or_default();
    api.offsets.lock().expect("offsets").push(offset);
    if offset == 0 {
        return Json(json!({
            "ok": true,
            "result": [
                { "update_id": 41, "message": { "chat": { "id": 7 }, "sticker": {} } },
                {
                    "update_id": 42,
                    "message": { "chat": { "id": 7 }, "from": { "id": 99 }, "text": "📢 Новости" }
                }
            ]
        }));
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    Json(json!({ "ok": true, "result": [] }))
}

async fn spawn_mock(api: MockApi) -> Url {
    let app = Router::new()
        .route(&format!("/bot{TOKEN}/sendMessage"), post(mock_send))
        .route(&format!("/bot{TOKEN}/getUpdates"), post(mock_updates))
        .with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}")).expect("url")
}

fn keyboard() -> Vec<Vec<Label>> {
    vec![
        vec![Label::from("📢 Новости"), Label::from("🎓 Абитуриентам")],
        vec![Label::from("👨‍🏫 Сотрудники кафедры")],
    ]
}

fn transport(base: Url) -> TelegramTransport {
    TelegramTransport::new(base, TOKEN.into(), keyboard(), Duration::from_secs(1))
        .expect("transport")
        .with_retry_delay(Duration::from_millis(10))
}

#[test]
fn api_url_embeds_token_and_method() {
    let transport = transport(Url::parse("https://api.telegram.org/").expect("url"));
    assert_eq!(
        transport.api_url("getUpdates"),
        "https://api.telegram.org/bot42TOKEN/getUpdates"
    );
}

#[test]
fn rich_reply_with_keyboard_uses_html_and_reply_markup() {
    let transport = transport(Url::parse("https://api.telegram.org").expect("url"));
    let reply = ReplyPayload::rich("<b>news</b>").with_keyboard();
    let body = serde_json::to_value(transport.send_request(5, &reply)).expect("json");

    assert_eq!(body["chat_id"], 5);
    assert_eq!(body["parse_mode"], "HTML");
    assert_eq!(body["reply_markup"]["resize_keyboard"], true);
    assert_eq!(body["reply_markup"]["keyboard"][0][1]["text"], "🎓 Абитуриентам");
    assert_eq!(
        body["reply_markup"]["keyboard"][1]
            .as_array()
            .expect("row")
            .len(),
        1
    );
}

#[test]
fn plain_reply_without_keyboard_omits_optional_fields() {
    let transport = transport(Url::parse("https://api.telegram.org").expect("url"));
    let reply = ReplyPayload::plain("done");
    let body = serde_json::to_value(transport.send_request(5, &reply)).expect("json");

    assert_eq!(body, json!({ "chat_id": 5, "text": "done" }));
}

#[test]
fn updates_without_text_are_skipped() {
    let update: Update = serde_json::from_value(json!({
        "update_id": 1,
        "message": { "chat": { "id": 3 }, "photo": [] }
    }))
    .expect("update");
    assert_eq!(inbound_from_update(update), None);

    let update: Update = serde_json::from_value(json!({ "update_id": 2 })).expect("update");
    assert_eq!(inbound_from_update(update), None);
}

#[tokio::test]
async fn send_posts_message_to_bot_api() {
    let api = MockApi::default();
    let base = spawn_mock(api.clone()).await;
    let transport = transport(base);

    transport
        .send(7, &ReplyPayload::rich("hello").with_keyboard())
        .await
        .expect("send");

    let sent = api.sent.lock().expect("sent").clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["text"], "hello");
    assert_eq!(sent[0]["chat_id"], 7);
}

#[tokio::test]
async fn rejected_call_is_an_error() {
    let app = Router::new().route(
        &format!("/bot{TOKEN}/sendMessage"),
        post(|| async { Json(json!({ "ok": false, "description": "chat not found" })) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    let transport = transport(Url::parse(&format!("http://{addr}")).expect("url"));

    let error = transport
        .send(7, &ReplyPayload::plain("hello"))
        .await
        .expect_err("rejected");
    assert!(matches!(error, TransportError::Rejected(ref reason) if reason == "chat not found"));
}

async fn spawn_failing_send(status: StatusCode, body: &'static str) -> Url {
    let app = Router::new().route(
        &format!("/bot{TOKEN}/sendMessage"),
        post(move || async move { (status, body) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}")).expect("url")
}

#[tokio::test]
async fn error_status_keeps_api_description() {
    let base = spawn_failing_send(
        StatusCode::BAD_REQUEST,
        r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
    )
    .await;

    let error = transport(base)
        .send(7, &ReplyPayload::plain("hello"))
        .await
        .expect_err("rejected");
    assert!(
        matches!(error, TransportError::Rejected(ref reason) if reason == "Bad Request: chat not found"),
        "{error}"
    );
}

#[tokio::test]
async fn error_status_without_envelope_reports_status() {
    let base = spawn_failing_send(StatusCode::BAD_GATEWAY, "upstream down").await;

    let error = transport(base)
        .send(7, &ReplyPayload::plain("hello"))
        .await
        .expect_err("rejected");
    assert!(
        matches!(error, TransportError::Rejected(ref reason) if reason.contains("502")),
        "{error}"
    );
}

#[tokio::test]
async fn listen_forwards_text_messages_and_advances_offset() {
    let api = MockApi::default();
    let base = spawn_mock(api.clone()).await;
    let transport = Arc::new(transport(base));

    let (tx, mut rx) = mpsc::channel(4);
    let listener = {
        let transport = transport.clone();
        tokio::spawn(async move { transport.listen(tx).await })
    };

    let inbound = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timely update")
        .expect("message");
    assert_eq!(
        inbound,
        InboundMessage {
            user_id: Some(99),
            chat_id: 7,
            text: "📢 Новости".into(),
        }
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(rx);
    tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("listener stops once receiver is gone")
        .expect("join")
        .expect("listen result");

    let offsets = api.offsets.lock().expect("offsets").clone();
    assert_eq!(offsets[0], 0);
    assert!(offsets[1..].iter().all(|offset| *offset == 43), "{offsets:?}");
}
