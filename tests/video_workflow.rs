//! Submit, poll, download and release against a mock Veo endpoint.

use std::sync::Arc;
use std::time::Duration;

use genstudio::{
    ClientContext, Credential, CredentialStore, GeminiClient, ImageRole, MediaAttachment,
    PollConfig, Studio, StudioConfig, TaskKind,
};
use genstudio::storage::FileKeyValueStore;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPERATION: &str = "models/veo-3.1-fast-generate-preview/operations/op-42";

fn fast_config(server: &MockServer) -> StudioConfig {
    StudioConfig::new()
        .with_api_base(server.uri())
        .with_poll(PollConfig::new().with_interval(Duration::from_millis(5)))
}

async fn mount_video_flow(server: &MockServer, pending_rounds: u64) {
    Mock::given(method("POST"))
        .and(path("/models/veo-3.1-fast-generate-preview:predictLongRunning"))
        .and(body_partial_json(json!({
            "instances": [ {
                "prompt": "timelapse of a blooming flower",
                "image": { "bytesBase64Encoded": "RlJBTUU=", "mimeType": "image/jpeg" }
            } ],
            "parameters": { "aspectRatio": "9:16", "resolution": "720p", "sampleCount": 1 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", OPERATION)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION, "done": false })),
        )
        .up_to_n_times(pending_rounds)
        .expect(pending_rounds)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", OPERATION)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": format!("{}/files/video-1:download?alt=media", server.uri()) } }
            ] } }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/video-1:download"))
        .and(query_param("alt", "media"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4-bytes".to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

fn video_inputs(studio: &mut Studio) {
    let inputs = studio.controller_mut(TaskKind::TextToVideo).inputs_mut();
    inputs.prompt = "timelapse of a blooming flower".into();
    inputs.aspect_ratio = Some(genstudio::AspectRatio::Portrait9x16);
    inputs.set_image(
        ImageRole::Primary,
        Some(MediaAttachment::new("RlJBTUU=", "image/jpeg")),
    );
}

#[tokio::test]
async fn test_video_generation_end_to_end() {
    let server = MockServer::start().await;
    mount_video_flow(&server, 3).await;

    let context = ClientContext::new(fast_config(&server))
        .with_credential(Credential::new("test-key").unwrap());
    let mut studio = Studio::connect(context).unwrap();
    video_inputs(&mut studio);

    let registry = studio.registry().clone();
    let controller = studio.controller_mut(TaskKind::TextToVideo);
    let output = controller.submit().await.expect("video output");
    let video = output.video().unwrap();
    assert_eq!(video.bytes(), b"fake-mp4-bytes");
    assert_eq!(registry.live_count(), 1);

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.mp4");
    video.save_to(&target).await.unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"fake-mp4-bytes");

    controller.clear_output();
    assert_eq!(registry.live_count(), 0);
    // Mock expectations (one submit, 3 + 1 status checks, one download) are verified on drop.
}

#[tokio::test]
async fn test_failed_operation_surfaces_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}", OPERATION)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "error": { "code": 3, "message": "The prompt could not be processed." }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let context = ClientContext::new(fast_config(&server))
        .with_credential(Credential::new("test-key").unwrap());
    let mut studio = Studio::connect(context).unwrap();
    video_inputs(&mut studio);

    let controller = studio.controller_mut(TaskKind::TextToVideo);
    assert!(controller.submit().await.is_none());
    let message = controller.error().unwrap();
    assert!(message.contains("The prompt could not be processed."), "{}", message);
    assert_eq!(studio.registry().live_count(), 0);
}

#[tokio::test]
async fn test_polling_gives_up_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION, "done": false })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = fast_config(&server).with_poll(
        PollConfig::new()
            .unbounded()
            .with_interval(Duration::from_millis(5))
            .with_max_attempts(2),
    );
    let context = ClientContext::new(config).with_credential(Credential::new("test-key").unwrap());
    let mut studio = Studio::connect(context).unwrap();
    video_inputs(&mut studio);

    let controller = studio.controller_mut(TaskKind::TextToVideo);
    assert!(controller.submit().await.is_none());
    assert!(controller.error().unwrap().contains("after 2 status checks"));
}

#[tokio::test]
async fn test_credential_persists_across_sessions() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(&server).with_credential_path(dir.path().join("credentials.json"));

    let store = CredentialStore::from_config(&config);
    assert!(!store.is_set());
    store.set("  test-key  ");

    let reopened = CredentialStore::new(Arc::new(FileKeyValueStore::new(
        config.credential_path.clone(),
    )));
    assert_eq!(reopened.get().unwrap().expose(), "test-key");

    let saved = std::fs::read_to_string(&config.credential_path).unwrap();
    assert!(saved.contains("\"gemini_api_key\""));

    let context = ClientContext::from_store(config, &reopened);
    assert!(context.is_initialized());
    assert!(GeminiClient::new(context).is_ok());
}

#[tokio::test]
async fn test_rejected_key_during_status_check_is_a_polling_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}", OPERATION)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let context = ClientContext::new(fast_config(&server))
        .with_credential(Credential::new("test-key").unwrap());
    let mut studio = Studio::connect(context).unwrap();
    video_inputs(&mut studio);

    let controller = studio.controller_mut(TaskKind::TextToVideo);
    assert!(controller.submit().await.is_none());
    let message = controller.error().unwrap();
    assert!(message.starts_with("Failed to get generation status"), "{}", message);
    assert_eq!(studio.registry().live_count(), 0);
}
