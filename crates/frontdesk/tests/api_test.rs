//! Integration tests for the HTTP API.

use std::time::{Duration, SystemTime};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;

mod common;

use common::{ADMIN_TOKEN, body_json, test_app, test_app_with};

// ============================================================================
// Service Endpoints
// ============================================================================

#[tokio::test]
async fn test_livez() {
    let t = test_app().await;

    let response = t
        .request(Request::get("/livez").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_version() {
    let t = test_app().await;

    let response = t
        .request(Request::get("/version").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], "frontdesk");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_root_names_clinic_and_dir() {
    let t = test_app().await;

    let response = t
        .request(Request::get("/").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Klinik Tenang bot aktif.");
    assert_eq!(json["config_dir"], t.dir.path().display().to_string());
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let t = test_app().await;

    let response = t
        .request(
            Request::options("/chat")
                .header("origin", "http://localhost:5500")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:5500"
    );
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_greeting_is_small_talk() {
    let t = test_app().await;

    let response = t
        .post_json("/chat", json!({"message": "halo", "session_id": "s1"}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["reply"].as_str().unwrap().starts_with("Halo!"));
    assert_eq!(json["end"], false);
    assert_eq!(json["session_id"], "s1");
    assert_eq!(json["remaining"], 5);
    assert!(json.get("handoff").is_none());
    assert!(t.generator.requests().is_empty());
}

#[tokio::test]
async fn test_malformed_body_gets_fresh_session() {
    let t = test_app().await;

    let response = t
        .request(
            Request::post("/chat")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(!json["session_id"].as_str().unwrap().is_empty());
    assert_eq!(json["remaining"], 5);
    assert_eq!(json["end"], false);
}

#[tokio::test]
async fn test_crisis_hands_off_and_ends() {
    let t = test_app().await;

    let response = t
        .post_json(
            "/chat",
            json!({"message": "aku ingin mati saja", "session_id": "s1"}),
        )
        .await;
    let json = body_json(response).await;
    assert_eq!(
        json["reply"],
        "Kamu tidak sendiri. Hubungi Klinik Tenang atau 119."
    );
    assert_eq!(json["handoff"], true);
    assert_eq!(json["end"], true);
    assert_eq!(json["remaining"], 0);

    // Ended sessions only repeat the ended notice.
    let response = t
        .post_json("/chat", json!({"message": "halo", "session_id": "s1"}))
        .await;
    let json = body_json(response).await;
    assert!(json["reply"].as_str().unwrap().contains("Sesi ini sudah berakhir"));
    assert_eq!(json["end"], true);
    assert!(json.get("handoff").is_none());

    let response = t
        .post_json("/status", json!({"session_id": "s1"}))
        .await;
    let json = body_json(response).await;
    assert_eq!(json["end"], true);
    assert_eq!(json["remaining"], 0);
}

#[tokio::test]
async fn test_off_topic_is_redirected() {
    let t = test_app().await;

    let response = t
        .post_json(
            "/chat",
            json!({"message": "resep rendang dong", "session_id": "s1"}),
        )
        .await;
    let json = body_json(response).await;
    assert!(json["reply"].as_str().unwrap().starts_with("Maaf"));
    assert_eq!(json["remaining"], 4);
    assert!(t.generator.requests().is_empty());
}

#[tokio::test]
async fn test_full_session_closes_with_recommendation() {
    let t = test_app_with(
        common::SETTINGS,
        [
            "Ceritakan lebih lanjut.",
            "Sejak kapan?",
            "Itu wajar.",
            "Coba rutinitas tidur.",
            "Semoga membantu.",
            r#"{"category": "anak", "confidence": 0.9}"#,
        ],
    )
    .await;

    let messages = [
        "anakku susah tidur",
        "sudah dua minggu",
        "aku jadi cemas",
        "apa yang bisa kulakukan",
        "oke kucoba",
    ];
    let mut last = serde_json::Value::Null;
    for (i, message) in messages.iter().enumerate() {
        let response = t
            .post_json("/chat", json!({"message": message, "session_id": "s1"}))
            .await;
        last = body_json(response).await;
        assert_eq!(last["remaining"], 4 - i as u64);
    }

    assert_eq!(last["end"], true);
    assert_eq!(last["category"], "anak");
    assert_eq!(last["confidence"], 0.9);
    let reply = last["reply"].as_str().unwrap();
    assert!(reply.starts_with("Semoga membantu."));
    assert!(reply.contains("**Psikolog Anak**"));
    assert!(reply.ends_with("Terima kasih sudah bercerita."));

    let requests = t.generator.requests();
    assert_eq!(requests.len(), 6);
    assert_eq!(requests[0].system, "Kamu asisten Klinik Tenang.");
    assert_eq!(requests[0].model, "test-model");
}

#[tokio::test]
async fn test_status_for_unknown_session() {
    let t = test_app().await;

    let response = t
        .post_json("/status", json!({"session_id": "baru"}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["session_id"], "baru");
    assert_eq!(json["remaining"], 5);
    assert_eq!(json["end"], false);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_disabled_is_forbidden() {
    let t = test_app_with(r#"{"admin_token": "whatever-token"}"#, []).await;

    let response = t
        .request(
            Request::get("/admin/config")
                .header("x-admin-token", "whatever-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
}

#[tokio::test]
async fn test_admin_wrong_token_is_unauthorized() {
    let t = test_app().await;

    let response = t
        .request(
            Request::get("/admin/config")
                .header("x-admin-token", "salah")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = t
        .request(Request::post("/admin/reload").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_config_snapshot() {
    let t = test_app().await;

    let response = t
        .request(
            Request::get("/admin/config")
                .header("x-admin-token", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["clinic"]["name"], "Klinik Tenang");
    assert_eq!(json["faq"]["jam"], "Klinik buka 08.00-20.00.");
    assert_eq!(json["faq_keys"]["jam"][0], "jam buka");
    assert_eq!(json["closing"], "Terima kasih sudah bercerita.");
}

#[tokio::test]
async fn test_put_config_updates_faq() {
    let t = test_app().await;

    for (file, data) in [
        ("faq.json", json!({"tarif": "Rp300.000 per sesi."})),
        ("faq_keys.json", json!({"tarif": ["tarif", "biaya"]})),
    ] {
        let response = t
            .request(
                Request::put("/admin/config")
                    .header("x-admin-token", ADMIN_TOKEN)
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"file": file, "data": data}).to_string()))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["saved"], file);
        assert!(json["mtime"].as_f64().unwrap() > 0.0);
    }

    let response = t
        .post_json(
            "/chat",
            json!({"message": "berapa biaya konsultasi?", "session_id": "s1"}),
        )
        .await;
    let json = body_json(response).await;
    assert_eq!(json["reply"], "Rp300.000 per sesi.");
    assert_eq!(json["remaining"], 4);
}

#[tokio::test]
async fn test_put_config_rejects_unknown_file() {
    let t = test_app().await;

    let response = t
        .request(
            Request::put("/admin/config")
                .header("x-admin-token", ADMIN_TOKEN)
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"file": "../secrets.json", "data": {}}).to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let json = body_json(response).await;
    assert_eq!(json["detail"], "file not allowed: ../secrets.json");
    assert!(!t.dir.path().parent().unwrap().join("secrets.json").exists());
}

#[tokio::test]
async fn test_reload_returns_timestamp() {
    let t = test_app().await;

    let response = t
        .request(
            Request::post("/admin/reload")
                .header("x-admin-token", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["reloaded_at"].as_str().unwrap().ends_with('Z'));
}

// ============================================================================
// Hot Reload
// ============================================================================

#[tokio::test]
async fn test_edited_file_is_picked_up_without_reload() {
    let t = test_app().await;

    let path = t.dir.path().join("settings.json");
    std::fs::write(&path, r#"{"clinic": {"name": "Klinik Baru"}}"#).unwrap();
    // Push the mtime forward so coarse filesystem clocks still register a change.
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    let response = t
        .request(Request::get("/").body(Body::empty()).unwrap())
        .await;
    let json = body_json(response).await;
    assert_eq!(json["message"], "Klinik Baru bot aktif.");
}
