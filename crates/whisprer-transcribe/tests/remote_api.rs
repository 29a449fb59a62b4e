//! Contract tests for the remote transcription client, backed by a local
//! wiremock server standing in for the hosted service.

use std::path::Path;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use whisprer_transcribe::{RemoteClient, RemoteConfig, TranscribeError, Transcriber};
use wiremock::matchers::{any, body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, api_key: &str) -> RemoteClient {
    RemoteClient::new(
        RemoteConfig::new(api_key).with_endpoint(format!("{}/v1/transcribe", server.uri())),
    )
    .unwrap()
}

fn audio_file(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    // "hello" encodes to "aGVsbG8=".
    std::fs::write(&path, b"hello").unwrap();
    path
}

#[tokio::test]
async fn sends_expected_request_and_normalizes_transcript() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let audio = audio_file(&dir, "clip.wav");

    Mock::given(method("POST"))
        .and(path("/v1/transcribe"))
        .and(header_exists("authorization"))
        .and(header("whisprer-api-key", "user-key"))
        .and(body_json(json!({
            "audioBase64": "aGVsbG8=",
            "audioFormat": "wav",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transcript": "hello, hello, world",
            "remainingCredits": 41,
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Whitespace around the configured key must not reach the wire.
    let text = client(&server, "  user-key  ")
        .transcribe(&audio)
        .await
        .unwrap();
    assert_eq!(text, "hello world");
}

#[tokio::test]
async fn extensionless_files_fall_back_to_webm() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let audio = audio_file(&dir, "noext");

    Mock::given(method("POST"))
        .and(body_json(json!({
            "audioBase64": "aGVsbG8=",
            "audioFormat": "webm",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transcript": "ok",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server, "user-key").transcribe(&audio).await.unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn missing_key_fails_before_any_io() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // The audio path does not exist; a blank key must fail first.
    let result = client(&server, "   ")
        .transcribe(Path::new("/nonexistent/clip.wav"))
        .await;
    assert!(matches!(result, Err(TranscribeError::MissingCredential)));
}

#[tokio::test]
async fn unreadable_audio_file_is_an_io_error() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server, "user-key")
        .transcribe(Path::new("/nonexistent/clip.wav"))
        .await;
    assert!(matches!(result, Err(TranscribeError::Io(_))));
}

#[tokio::test]
async fn service_errors_keep_status_and_body() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let audio = audio_file(&dir, "clip.wav");

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_string("Insufficient credits"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, "user-key").transcribe(&audio).await;
    match result {
        Err(TranscribeError::Service { status, body }) => {
            assert_eq!(status, 402);
            assert_eq!(body, "Insufficient credits");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_body_shape_is_malformed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let audio = audio_file(&dir, "clip.wav");

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hi" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, "user-key").transcribe(&audio).await;
    assert!(matches!(result, Err(TranscribeError::MalformedResponse(_))));
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let audio = audio_file(&dir, "clip.wav");

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "transcript": "late" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let config = RemoteConfig::new("user-key")
        .with_endpoint(format!("{}/v1/transcribe", server.uri()))
        .with_timeout(Duration::from_millis(50));
    let result = RemoteClient::new(config).unwrap().transcribe(&audio).await;
    assert!(matches!(result, Err(TranscribeError::Timeout)));
}
