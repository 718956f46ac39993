mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use carfix::api::{build_router, AppState, SESSION_HEADER};
use carfix::config::Config;
use carfix::diagnosis::{DiagnosisPipeline, SessionId};
use common::{small_video_info, EchoKnowledge, FakeCodec, ScriptedDetector};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const BOUNDARY: &str = "carfix-test-boundary";

fn create_test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = DiagnosisPipeline::builder(&Config::default())
        .unwrap()
        .detector(Some(Arc::new(ScriptedDetector::new(&[(3, "headlight"), (7, "headlight")]))))
        .codec(Arc::new(FakeCodec::new(10, small_video_info())))
        .audio_analyzer(None)
        .knowledge(Arc::new(EchoKnowledge::new(1)))
        .video_lookup(None)
        .media_dir(dir.path())
        .build();
    (build_router(AppState::new(Arc::new(pipeline))), dir)
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File { filename: &'a str, content_type: &'a str, bytes: &'a [u8] },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value).as_bytes(),
                );
            }
            Part::File { filename, content_type, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn diagnose_request(parts: &[Part<'_>], session: Option<SessionId>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/diagnose_ai")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY));
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session.to_string());
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "carfix");
}

#[tokio::test]
async fn test_diagnose_description_only() {
    let (app, _dir) = create_test_app();
    let parts = [
        Part::Text("description", "knocking sound when accelerating"),
        Part::Text("vehicle_make", "Toyota"),
        Part::Text("vehicle_model", "Camry"),
        Part::Text("vehicle_year", "2015"),
    ];

    let response = app.oneshot(diagnose_request(&parts, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["ok"], true);
    assert!(json["session_id"].as_str().unwrap().parse::<SessionId>().is_ok());
    let diagnosis = &json["diagnosis"];
    assert_eq!(diagnosis["causes"][0]["text"], "User description: knocking sound when accelerating");
    assert_eq!(diagnosis["causes"].as_array().unwrap().len(), 1);
    assert_eq!(diagnosis["visual_issues"], serde_json::json!([]));
    assert_eq!(diagnosis["options"]["DIY"], "$50 estimated");
    assert!(!diagnosis["parts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_description_is_bad_request() {
    let (app, _dir) = create_test_app();

    let response = app
        .oneshot(diagnose_request(&[Part::Text("vehicle_make", "Honda")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_video_upload_is_annotated_and_downloadable() {
    let (app, _dir) = create_test_app();
    let parts = [
        Part::Text("description", "headlight flickers"),
        Part::File { filename: "walkaround.mp4", content_type: "video/mp4", bytes: b"not really mp4" },
    ];

    let response = app.clone().oneshot(diagnose_request(&parts, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let diagnosis = &json["diagnosis"];
    assert_eq!(diagnosis["visual_issues"], serde_json::json!(["headlight"]));
    assert_eq!(diagnosis["annotated_media"]["frame_count"], 10);

    let media_id = diagnosis["annotated_media"]["id"].as_str().unwrap();
    let media_url = diagnosis["annotated_media"]["url"].as_str().unwrap();
    assert_eq!(media_url, format!("/api/media/{}", media_id));
    assert!(diagnosis["annotated_media"].get("path").is_none(), "server paths stay private");

    let response = app
        .oneshot(Request::builder().uri(media_url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/mp4");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"fake mp4 with 10 frames");
}

#[tokio::test]
async fn test_end_session_empties_media_dir() {
    let (app, dir) = create_test_app();
    let session = SessionId::new();

    for name in ["front.mp4", "rear.mov"] {
        let parts = [
            Part::Text("description", "headlight flickers"),
            Part::File { filename: name, content_type: "video/mp4", bytes: b"not really video" },
        ];
        let response = app.clone().oneshot(diagnose_request(&parts, Some(session))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", session))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["cleared"], 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unknown_media_is_not_found() {
    let (app, _dir) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/media/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_history_and_end_session() {
    let (app, _dir) = create_test_app();
    let session = SessionId::new();

    for description in ["first symptom", "second symptom"] {
        let response = app
            .clone()
            .oneshot(diagnose_request(&[Part::Text("description", description)], Some(session)))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["session_id"], session.to_string());
    }

    let history_uri = format!("/api/sessions/{}/history", session);
    let response = app
        .clone()
        .oneshot(Request::builder().uri(&history_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = json_body(response).await;
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["description"], "first symptom");
    assert_eq!(history[1]["description"], "second symptom");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{}", session))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(response).await["cleared"], 2);

    let response = app
        .oneshot(Request::builder().uri(&history_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(json_body(response).await["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_session_path_is_bad_request() {
    let (app, _dir) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/api/sessions/nope/history").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
