use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tokio::sync::broadcast;
use tower::ServiceExt;

use kiosk::config::AppConfig;
use kiosk::db;
use kiosk::handlers;
use kiosk::models::{Entity, EntityKind, OrderEvent, Vocabulary};
use kiosk::services::nlu::{NluProvider, ParsedUtterance};
use kiosk::services::normalize::Normalizer;
use kiosk::services::session::SessionStore;
use kiosk::state::AppState;

// ── Mock Providers ──

/// Entities laid out over `text` in order, with character offsets.
fn entities(text: &str, spans: &[(EntityKind, &str)]) -> Vec<Entity> {
    let mut from = 0;
    spans
        .iter()
        .map(|(kind, value)| {
            let byte = text[from..].find(value).unwrap() + from;
            from = byte + value.len();
            let start = text[..byte].chars().count();
            Entity::new(*kind, value, start, start + value.chars().count())
        })
        .collect()
}

struct MockNlu;

#[async_trait]
impl NluProvider for MockNlu {
    async fn parse(&self, text: &str) -> anyhow::Result<ParsedUtterance> {
        if text.contains("고장") {
            anyhow::bail!("nlu offline");
        }
        if text.contains("아메리카노") {
            return Ok(ParsedUtterance {
                intent: Some("order_coffee".to_string()),
                entities: entities(
                    text,
                    &[
                        (EntityKind::Temperature, "아이스"),
                        (EntityKind::DrinkType, "아메리카노"),
                    ],
                ),
            });
        }
        Ok(ParsedUtterance {
            intent: Some("greet".to_string()),
            entities: Vec::new(),
        })
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        rasa_url: "http://localhost:5005".to_string(),
        vocabulary_path: None,
        webhook_secret: "".to_string(), // empty = skip signature validation
        session_ttl_minutes: 30,
    }
}

fn state_with(config: AppConfig) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    let normalizer = Arc::new(Normalizer::new(&Vocabulary::builtin().unwrap()));
    let (order_tx, _) = broadcast::channel(16);
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        sessions: Mutex::new(SessionStore::new(normalizer, config.session_ttl_minutes)),
        config,
        nlu: Box::new(MockNlu),
        order_tx,
    })
}

fn test_state() -> Arc<AppState> {
    state_with(test_config())
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook", post(handlers::webhook::action_webhook))
        .route("/api/dev/message", post(handlers::dev::send_message))
        .route("/api/admin/orders", get(handlers::admin::list_orders))
        .route("/api/admin/sessions", get(handlers::admin::list_sessions))
        .route(
            "/api/admin/sessions/:id/clear",
            post(handlers::admin::clear_session),
        )
        .route("/api/orders/events", get(handlers::events::order_events))
        .with_state(state)
}

fn action_call(action: &str, sender: &str, text: &str, entities: Vec<Entity>) -> serde_json::Value {
    json!({
        "next_action": action,
        "sender_id": sender,
        "tracker": {
            "sender_id": sender,
            "latest_message": { "text": text, "entities": entities }
        }
    })
}

fn webhook_request(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn texts(json: &serde_json::Value) -> Vec<String> {
    json["responses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["text"].as_str().unwrap().to_string())
        .collect()
}

async fn order_two_iced_americanos(state: &Arc<AppState>, sender: &str) -> serde_json::Value {
    let text = "아이스 아메리카노 두 잔 주세요";
    let call = action_call(
        "action_order_confirmation",
        sender,
        text,
        entities(
            text,
            &[
                (EntityKind::Temperature, "아이스"),
                (EntityKind::DrinkType, "아메리카노"),
                (EntityKind::Quantity, "두"),
            ],
        ),
    );
    let (status, json) = send(state, webhook_request(&call)).await;
    assert_eq!(status, StatusCode::OK);
    json
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let res = test_app(test_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok");
}

// ── Action server ──

#[tokio::test]
async fn test_order_finish_takeout_flow() {
    let state = test_state();
    let mut events = state.order_tx.subscribe();

    let json = order_two_iced_americanos(&state, "s1").await;
    assert_eq!(json["events"], json!([]));
    assert_eq!(
        texts(&json),
        vec!["주문하신 음료는 아이스 아메리카노 미디움 두 잔입니다. 다른 추가 옵션이 필요하신가요?"]
    );

    let call = action_call("action_order_finish", "s1", "주문 완료", Vec::new());
    let (status, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        texts(&json),
        vec![
            "주문하신 음료는 아이스 아메리카노 미디움 두 잔입니다.",
            "드시고 가시나요, 포장하시나요?",
        ]
    );

    match events.try_recv().unwrap() {
        OrderEvent::Completed { order } => {
            assert_eq!(order.session_id, "s1");
            assert_eq!(order.cups, 2);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let text = "포장해주세요";
    let call = action_call(
        "action_takeout",
        "s1",
        text,
        entities(text, &[(EntityKind::Take, "포장")]),
    );
    let (status, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(texts(&json)[0].starts_with("포장 주문이 완료되었습니다."));
    assert!(matches!(
        events.try_recv().unwrap(),
        OrderEvent::DiningMode { ref mode, .. } if mode == "포장"
    ));

    let (status, orders) = send(&state, admin_request("GET", "/api/admin/orders")).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["summary"], "아이스 아메리카노 미디움 두 잔");
    assert_eq!(orders[0]["dining_mode"], "포장");
    assert_eq!(orders[0]["lines"][0]["drink"], "아메리카노");
    assert_eq!(orders[0]["lines"][0]["temperature"], "아이스");

    // Finishing left an empty cart behind.
    let call = action_call("action_order_finish", "s1", "주문 완료", Vec::new());
    let (_, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(
        texts(&json),
        vec!["장바구니에 주문이 없습니다. 다시 주문해 주세요."]
    );
}

#[tokio::test]
async fn test_sessions_do_not_share_carts() {
    let state = test_state();
    order_two_iced_americanos(&state, "s1").await;

    let call = action_call("action_cancel_order", "s2", "취소해줘", Vec::new());
    let (_, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(texts(&json), vec!["취소할 주문이 없습니다."]);

    let call = action_call("action_cancel_order", "s1", "취소해줘", Vec::new());
    let (_, json) = send(&state, webhook_request(&call)).await;
    assert!(texts(&json)[0].starts_with("모든 주문이 취소되었습니다."));
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let state = test_state();
    order_two_iced_americanos(&state, "s1").await;
    state
        .db
        .lock()
        .unwrap()
        .execute_batch("DROP TABLE completed_orders")
        .unwrap();

    let call = action_call("action_order_finish", "s1", "주문 완료", Vec::new());
    let (status, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        texts(&json),
        vec!["처리 중 오류가 발생했습니다. 다시 시도해 주세요."]
    );
    assert_eq!(state.sessions.lock().unwrap().cart("s1").total_cups(), 2);
}

#[tokio::test]
async fn test_order_errors_are_spoken() {
    let state = test_state();
    let text = "아이스 허브티 주세요";
    let call = action_call(
        "action_order_confirmation",
        "s1",
        text,
        entities(
            text,
            &[
                (EntityKind::Temperature, "아이스"),
                (EntityKind::DrinkType, "허브티"),
            ],
        ),
    );
    let (status, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        texts(&json),
        vec!["허브티는(은) 온도가 핫으로 고정된 음료입니다! 다시 주문해 주세요."]
    );
}

#[tokio::test]
async fn test_classifier_entities_are_ignored() {
    let state = test_state();
    let text = "아메리카노 주세요";
    let mut spans = entities(text, &[(EntityKind::DrinkType, "아메리카노")]);
    let mut duplicate = spans[0].clone();
    duplicate.extractor = Some("DIETClassifier".to_string());
    spans.push(duplicate);

    let call = action_call("action_order_confirmation", "s1", text, spans);
    let (_, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(
        texts(&json),
        vec!["주문하신 음료는 핫 아메리카노 미디움 한 잔입니다. 다른 추가 옵션이 필요하신가요?"]
    );
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let state = test_state();
    let call = action_call("action_make_sandwich", "s1", "샌드위치", Vec::new());
    let (status, json) = send(&state, webhook_request(&call)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("action_make_sandwich"));
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let state = test_state();
    let req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .body(Body::from("not json"))
        .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_signature() {
    let mut config = test_config();
    config.webhook_secret = "s3cret".to_string();
    let state = state_with(config);

    let call = action_call("action_coffee_recommendation", "s1", "추천해줘", Vec::new());
    let body = call.to_string();

    let (status, _) = send(&state, webhook_request(&call)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(handlers::webhook::SIGNATURE_HEADER, handlers::webhook::sign("wrong", body.as_bytes()))
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(handlers::webhook::SIGNATURE_HEADER, handlers::webhook::sign("s3cret", body.as_bytes()))
        .body(Body::from(body))
        .unwrap();
    let (status, json) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(texts(&json)[0].starts_with("저희 매장이 추천하는 커피로는"));
}

// ── Admin API ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let state = test_state();

    let req = Request::builder()
        .uri("/api/admin/orders")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");

    let req = Request::builder()
        .uri("/api/admin/sessions")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_sessions_and_clear() {
    let state = test_state();
    order_two_iced_americanos(&state, "s1").await;

    let (status, json) = send(&state, admin_request("GET", "/api/admin/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = json.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], "s1");
    assert_eq!(sessions[0]["summary"], "아이스 아메리카노 미디움 두 잔");
    assert_eq!(sessions[0]["cups"], 2);

    let (status, _) = send(&state, admin_request("POST", "/api/admin/sessions/s1/clear")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.sessions.lock().unwrap().cart("s1").is_empty());

    let (status, _) =
        send(&state, admin_request("POST", "/api/admin/sessions/nobody/clear")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_orders_limit() {
    let state = test_state();
    for _ in 0..3 {
        order_two_iced_americanos(&state, "s1").await;
        let call = action_call("action_order_finish", "s1", "주문 완료", Vec::new());
        send(&state, webhook_request(&call)).await;
    }

    let (_, json) = send(&state, admin_request("GET", "/api/admin/orders?limit=2")).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_order_events_require_token() {
    let state = test_state();
    let req = Request::builder()
        .uri("/api/orders/events?token=nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_order_events_replay_survives_db_error() {
    let state = test_state();
    state
        .db
        .lock()
        .unwrap()
        .execute_batch("DROP TABLE completed_orders")
        .unwrap();

    let req = Request::builder()
        .uri("/api/orders/events?token=test-token&recent=5")
        .body(Body::empty())
        .unwrap();
    let res = test_app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Dev endpoint ──

fn dev_request(sender: &str, text: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/dev/message")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"sender_id": sender, "text": text}).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_dev_message_runs_mapped_action() {
    let state = test_state();
    let (status, json) = send(&state, dev_request("dev", "아이스 아메리카노 주세요")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["intent"], "order_coffee");
    assert_eq!(json["action"], "action_order_confirmation");
    assert_eq!(json["entities"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["replies"][0],
        "주문하신 음료는 아이스 아메리카노 미디움 한 잔입니다. 다른 추가 옵션이 필요하신가요?"
    );
}

#[tokio::test]
async fn test_dev_message_without_action() {
    let state = test_state();
    let (status, json) = send(&state, dev_request("dev", "안녕하세요")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["intent"], "greet");
    assert_eq!(json["action"], serde_json::Value::Null);
    assert_eq!(json["replies"], json!([]));
}

#[tokio::test]
async fn test_dev_message_nlu_failure() {
    let state = test_state();
    let (status, json) = send(&state, dev_request("dev", "고장났나요")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("nlu offline"));
}
