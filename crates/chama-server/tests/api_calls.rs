use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chama_announce::{AnnouncementConfig, Announcer, AudioStore};
use chama_calls::CallStore;
use chama_db::{create_pool, run_migrations, DbRuntimeSettings};
use chama_server::{app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn setup_state() -> AppState {
    // A single connection so every query sees the same in-memory database.
    let pool = create_pool(
        ":memory:",
        DbRuntimeSettings {
            pool_max_size: 1,
            ..Default::default()
        },
    )
    .unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }

    let audio = AudioStore::default();
    let announcer = Announcer::from_config(&AnnouncementConfig::default(), audio.clone()).unwrap();
    AppState::new(CallStore::new(pool), Arc::new(announcer), audio)
}

async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn submit(state: &AppState, name: &str, room: &str) -> Value {
    let (status, body) = send(
        state,
        "POST",
        "/api/calls",
        Some(json!({ "patientName": name, "roomNumber": room })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    body["call"].clone()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let state = setup_state();
    let (status, body) = send(&state, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn submit_call_trims_and_stores() {
    let state = setup_state();
    let (status, body) = send(
        &state,
        "POST",
        "/api/calls",
        Some(json!({
            "patientName": "  joão silva ",
            "roomNumber": "5",
            "professionalName": "   "
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notice"], "Chamada realizada com sucesso!");
    assert_eq!(body["call"]["patientName"], "joão silva");
    assert_eq!(body["call"]["roomNumber"], "5");
    assert!(body["call"].get("professionalName").is_none());
    assert!(body["call"]["id"].as_str().is_some_and(|id| !id.is_empty()));

    let stored = state.store.recent(5).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn professional_outside_catalog_is_stored_as_typed() {
    let state = setup_state();
    let (status, body) = send(
        &state,
        "POST",
        "/api/calls",
        Some(json!({
            "patientName": "Maria",
            "roomNumber": "3",
            "professionalName": " Enfermeira Plantonista "
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["call"]["professionalName"], "Enfermeira Plantonista");
    let stored = state.store.recent(1).await.unwrap();
    assert_eq!(
        stored[0].professional_name.as_deref(),
        Some("Enfermeira Plantonista")
    );
}

#[tokio::test]
async fn invalid_submission_never_reaches_store() {
    let state = setup_state();
    let mut changes = state.store.subscribe_changes();

    let (status, body) = send(
        &state,
        "POST",
        "/api/calls",
        Some(json!({ "patientName": "Jo", "roomNumber": "5" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Campos inválidos.");
    assert_eq!(body["field"], "patientName");

    let (status, body) = send(
        &state,
        "POST",
        "/api/calls",
        Some(json!({ "patientName": "Maria" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "roomNumber");

    assert!(state.store.recent(5).await.unwrap().is_empty());
    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn list_defaults_to_panel_limit_newest_first() {
    let state = setup_state();
    for i in 0..7 {
        submit(&state, &format!("Paciente {i}"), "1").await;
    }

    let (status, body) = send(&state, "GET", "/api/calls", None).await;
    assert_eq!(status, StatusCode::OK);
    let calls = body.as_array().unwrap();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0]["patientName"], "Paciente 6");
    assert_eq!(calls[4]["patientName"], "Paciente 2");

    // Capped at the display limit.
    let (_, body) = send(&state, "GET", "/api/calls?limit=50", None).await;
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn reset_reports_deleted_then_already_empty() {
    let state = setup_state();
    for name in ["Ana Clara", "Bianca", "Caio"] {
        submit(&state, name, "2").await;
    }

    let (status, body) = send(&state, "DELETE", "/api/calls", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "deleted");
    assert_eq!(body["count"], 3);
    assert_eq!(body["notice"], "Histórico de chamadas resetado com sucesso!");

    let (status, body) = send(&state, "DELETE", "/api/calls", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already_empty");
    assert_eq!(body["notice"], "Histórico já estava vazio.");

    let (_, body) = send(&state, "GET", "/api/calls", None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_one_call() {
    let state = setup_state();
    let call = submit(&state, "Ana Clara", "2").await;
    let id = call["id"].as_str().unwrap();

    let (status, _) = send(&state, "DELETE", &format!("/api/calls/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&state, "DELETE", &format!("/api/calls/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn recall_creates_new_call_with_same_fields() {
    let state = setup_state();
    let original = submit(&state, "Ana Clara", "2").await;
    let id = original["id"].as_str().unwrap();

    let (status, body) = send(&state, "POST", &format!("/api/calls/{id}/recall"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["call"]["id"], original["id"]);
    assert_eq!(body["call"]["patientName"], "Ana Clara");
    assert_eq!(body["call"]["roomNumber"], "2");

    let (status, _) = send(&state, "POST", "/api/calls/missing/recall", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_lists_rooms_and_professionals() {
    let state = setup_state();
    let (status, body) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["rooms"].as_array().unwrap().is_empty());
    assert!(!body["professionals"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn audio_is_served_from_cache() {
    let state = setup_state();
    let asset = state.audio.put("audio/wav", vec![82, 73, 70, 70]).await;

    let response = app(state.clone())
        .oneshot(Request::builder().uri(asset.url.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/wav");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), b"RIFF");

    let (status, _) = send(&state, "GET", "/api/audio/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
