use super::*;
use crate::auth::{SessionProvider, StaticSession};
use crate::camera::FrameCapture;
use crate::config::{OutputFormat, PreprocessConfig};
use crate::error::{CameraError, ClosetError};
use crate::events::{ClosetEvent, EventBus, NotificationLevel};
use crate::frame::{Frame, FrameFormat, Rotation};
use crate::preprocess::{ImagePreprocessor, Segmenter};
use crate::storage::{HttpStorageClient, MockStorageService, StorageService};
use crate::test_support::{
    spawn_storage_server, split_color_frame, EmptySegmenter, FailingSegmenter, FakeStorageState,
    ScriptedFrameSource,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio::time::timeout;

async fn bound_capture(source: ScriptedFrameSource) -> Arc<AsyncMutex<FrameCapture>> {
    let mut capture = FrameCapture::new(Box::new(source));
    capture.setup().await.unwrap();
    Arc::new(AsyncMutex::new(capture))
}

fn coordinator(
    capture: Arc<AsyncMutex<FrameCapture>>,
    segmenter: Arc<dyn Segmenter>,
    storage: Arc<dyn StorageService>,
    session: Arc<dyn SessionProvider>,
    event_bus: Arc<EventBus>,
) -> UploadCoordinator {
    let preprocessor = ImagePreprocessor::new(
        PreprocessConfig {
            output_format: OutputFormat::Png,
            ..PreprocessConfig::default()
        },
        segmenter,
    );
    UploadCoordinator::new(
        capture,
        Arc::new(preprocessor),
        storage,
        session,
        event_bus,
    )
}

async fn next_notification(
    receiver: &mut broadcast::Receiver<ClosetEvent>,
) -> (NotificationLevel, String) {
    loop {
        let event = timeout(Duration::from_secs(5), receiver.recv())
            .await
            .expect("no notification within 5s")
            .unwrap();
        if let ClosetEvent::Notification { level, message, .. } = event {
            return (level, message);
        }
    }
}

fn drain_notifications(receiver: &mut broadcast::Receiver<ClosetEvent>) -> usize {
    let mut count = 0;
    while let Ok(event) = receiver.try_recv() {
        if matches!(event, ClosetEvent::Notification { .. }) {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn test_rejected_upload_scenario() {
    let state = FakeStorageState::rejecting_uploads(500);
    let base_url = spawn_storage_server(state.clone()).await;
    let storage = Arc::new(HttpStorageClient::new(&base_url, 5).unwrap());

    let source =
        ScriptedFrameSource::new().then_frame(split_color_frame(1, 8, 4, Rotation::Rotate90));
    let event_bus = Arc::new(EventBus::new(64));
    let mut events = event_bus.subscribe();

    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(FailingSegmenter),
        storage.clone(),
        Arc::new(StaticSession::anonymous()),
        event_bus,
    );

    coordinator.start_capture(CaptureRequest::default()).unwrap();
    let terminal = coordinator.wait_for_terminal().await.unwrap();

    assert_eq!(terminal, PipelineState::Failed("500".to_string()));
    assert!(!coordinator.is_busy());
    assert_eq!(state.uploads.load(Ordering::SeqCst), 1);

    let (level, message) = next_notification(&mut events).await;
    assert_eq!(level, NotificationLevel::Error);
    assert_eq!(message, "Error: 500");

    assert!(storage.list("unknown").await.unwrap().is_empty());
    assert!(storage.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_successful_run_stores_tagged_garment() {
    let storage = Arc::new(MockStorageService::new());
    let source =
        ScriptedFrameSource::new().then_frame(split_color_frame(1, 4, 4, Rotation::Upright));
    let event_bus = Arc::new(EventBus::new(64));
    let mut events = event_bus.subscribe();

    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(EmptySegmenter),
        storage.clone(),
        Arc::new(StaticSession::new(Some("u1".to_string()))),
        event_bus,
    );

    coordinator
        .start_capture(CaptureRequest {
            category: Some("Top".to_string()),
            season: Some("Winter".to_string()),
        })
        .unwrap();
    assert_eq!(
        coordinator.wait_for_terminal().await.unwrap(),
        PipelineState::Succeeded
    );

    let (level, message) = next_notification(&mut events).await;
    assert_eq!(level, NotificationLevel::Info);
    assert_eq!(message, SAVED_MESSAGE);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(drain_notifications(&mut events), 0);

    let garments = storage.list("u1").await.unwrap();
    assert_eq!(garments.len(), 1);
    assert_eq!(garments[0].category, "Top");
    assert_eq!(garments[0].season, "Winter");
}

#[tokio::test]
async fn test_state_transitions_are_published_in_order() {
    let source =
        ScriptedFrameSource::new().then_frame(split_color_frame(1, 4, 4, Rotation::Upright));
    let event_bus = Arc::new(EventBus::new(64));
    let mut events = event_bus.subscribe();

    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(EmptySegmenter),
        Arc::new(MockStorageService::new()),
        Arc::new(StaticSession::anonymous()),
        event_bus,
    );
    let run = coordinator.start_capture(CaptureRequest::default()).unwrap();

    let mut states = Vec::new();
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            ClosetEvent::PipelineStateChanged { run_id, state } => {
                assert_eq!(run_id, run);
                states.push(state);
            }
            ClosetEvent::Notification { .. } => break,
            _ => {}
        }
    }

    assert_eq!(
        states,
        vec![
            PipelineState::Capturing,
            PipelineState::Processing,
            PipelineState::Uploading,
            PipelineState::Succeeded,
        ]
    );
    assert_eq!(*coordinator.subscribe().borrow(), PipelineState::Succeeded);
}

#[tokio::test]
async fn test_second_capture_is_refused_while_busy() {
    let source = ScriptedFrameSource::new()
        .then_frame(split_color_frame(1, 4, 4, Rotation::Upright))
        .then_frame(split_color_frame(2, 4, 4, Rotation::Upright))
        .with_capture_delay(Duration::from_millis(200));
    let storage = Arc::new(MockStorageService::new());
    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(EmptySegmenter),
        storage.clone(),
        Arc::new(StaticSession::anonymous()),
        Arc::new(EventBus::new(64)),
    );

    coordinator.start_capture(CaptureRequest::default()).unwrap();
    assert!(coordinator.is_busy());

    let err = coordinator
        .start_capture(CaptureRequest::default())
        .unwrap_err();
    assert!(matches!(err, ClosetError::Busy { .. }));

    assert_eq!(
        coordinator.wait_for_terminal().await.unwrap(),
        PipelineState::Succeeded
    );
    assert!(!coordinator.is_busy());

    // Terminal outcome must be acknowledged before a new run
    assert!(coordinator.start_capture(CaptureRequest::default()).is_err());
    assert!(coordinator.acknowledge());
    assert!(!coordinator.acknowledge());
    assert_eq!(coordinator.state(), PipelineState::Idle);

    coordinator.start_capture(CaptureRequest::default()).unwrap();
    assert_eq!(
        coordinator.wait_for_terminal().await.unwrap(),
        PipelineState::Succeeded
    );
    assert_eq!(storage.upload_count(), 2);
}

#[tokio::test]
async fn test_network_failure_carries_transport_message() {
    let storage = Arc::new(MockStorageService::new());
    storage.fail_next_with_network("connection refused");

    let source =
        ScriptedFrameSource::new().then_frame(split_color_frame(1, 4, 4, Rotation::Upright));
    let event_bus = Arc::new(EventBus::new(64));
    let mut events = event_bus.subscribe();
    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(EmptySegmenter),
        storage.clone(),
        Arc::new(StaticSession::anonymous()),
        event_bus,
    );

    coordinator.start_capture(CaptureRequest::default()).unwrap();
    assert_eq!(
        coordinator.wait_for_terminal().await.unwrap(),
        PipelineState::Failed("connection refused".to_string())
    );

    let (_, message) = next_notification(&mut events).await;
    assert_eq!(message, "Network error: connection refused");
    assert!(storage.list("unknown").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_capture_failure_skips_upload() {
    let storage = Arc::new(MockStorageService::new());
    let source = ScriptedFrameSource::new().then_error(CameraError::Capture {
        details: "shutter jammed".to_string(),
    });
    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(EmptySegmenter),
        storage.clone(),
        Arc::new(StaticSession::anonymous()),
        Arc::new(EventBus::new(64)),
    );

    coordinator.start_capture(CaptureRequest::default()).unwrap();
    assert_eq!(
        coordinator.wait_for_terminal().await.unwrap(),
        PipelineState::Failed("shutter jammed".to_string())
    );
    assert!(!coordinator.is_busy());
    assert_eq!(storage.upload_count(), 0);
}

#[tokio::test]
async fn test_unbound_camera_fails_the_run() {
    let capture = Arc::new(AsyncMutex::new(FrameCapture::new(Box::new(
        ScriptedFrameSource::new(),
    ))));
    let coordinator = coordinator(
        capture,
        Arc::new(EmptySegmenter),
        Arc::new(MockStorageService::new()),
        Arc::new(StaticSession::anonymous()),
        Arc::new(EventBus::new(64)),
    );

    coordinator.start_capture(CaptureRequest::default()).unwrap();
    match coordinator.wait_for_terminal().await.unwrap() {
        PipelineState::Failed(reason) => assert!(reason.contains("not bound")),
        other => panic!("Expected failure, got {}", other),
    }
}

#[tokio::test]
async fn test_discarded_coordinator_never_publishes_outcome() {
    let storage = Arc::new(MockStorageService::new());
    let source = ScriptedFrameSource::new()
        .then_frame(split_color_frame(1, 4, 4, Rotation::Upright))
        .with_capture_delay(Duration::from_millis(200));
    let event_bus = Arc::new(EventBus::new(64));
    let mut events = event_bus.subscribe();

    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(EmptySegmenter),
        storage.clone(),
        Arc::new(StaticSession::anonymous()),
        event_bus,
    );
    let mut state = coordinator.subscribe();
    coordinator.start_capture(CaptureRequest::default()).unwrap();
    drop(coordinator);

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(*state.borrow_and_update(), PipelineState::Capturing);
    assert_eq!(drain_notifications(&mut events), 0);
    assert_eq!(storage.upload_count(), 0);
}

#[tokio::test]
async fn test_undecodable_frame_fails_in_processing() {
    let storage = Arc::new(MockStorageService::new());
    let corrupt = Frame::new(9, vec![1, 2, 3], 8, 8, FrameFormat::Jpeg, Rotation::Upright);
    let source = ScriptedFrameSource::new().then_frame(corrupt);
    let event_bus = Arc::new(EventBus::new(64));
    let mut events = event_bus.subscribe();

    let coordinator = coordinator(
        bound_capture(source).await,
        Arc::new(EmptySegmenter),
        storage.clone(),
        Arc::new(StaticSession::anonymous()),
        event_bus,
    );

    coordinator.start_capture(CaptureRequest::default()).unwrap();
    let terminal = coordinator.wait_for_terminal().await.unwrap();

    match &terminal {
        PipelineState::Failed(reason) => {
            assert!(reason.contains("decode"), "reason: {}", reason);
            assert!(reason.contains("frame 9"), "reason: {}", reason);
        }
        other => panic!("Expected a failed run, got {}", other),
    }
    assert!(!coordinator.is_busy());
    assert_eq!(storage.upload_count(), 0);

    let mut states = Vec::new();
    let mut notifications = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            ClosetEvent::PipelineStateChanged { state, .. } => states.push(state),
            ClosetEvent::Notification { level, message, .. } => notifications.push((level, message)),
            _ => {}
        }
    }
    assert_eq!(
        states,
        vec![PipelineState::Capturing, PipelineState::Processing, terminal.clone()]
    );
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, NotificationLevel::Error);
    assert!(notifications[0].1.starts_with("Could not prepare image"));
}
