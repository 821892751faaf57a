use super::*;
use crate::auth::StaticSession;
use crate::error::StorageError;
use crate::events::{ClosetEvent, EventBus};
use crate::test_support::{spawn_storage_server, FakeStorageState};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn client(base_url: &str) -> HttpStorageClient {
    HttpStorageClient::new(base_url, 5).unwrap()
}

#[tokio::test]
async fn test_upload_then_list() {
    let base_url = spawn_storage_server(FakeStorageState::default()).await;
    let client = client(&base_url);

    let request = UploadRequest::new("u1", "AAAA".to_string()).with_category(Some("Top"));
    let response = client.upload(&request).await.unwrap();
    assert!(response.url.is_some());

    let garments = client.list("u1").await.unwrap();
    assert_eq!(garments.len(), 1);
    assert_eq!(garments[0].category, "Top");
    assert_eq!(garments[0].season, "All");

    assert!(client.list("someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_server_failure() {
    let state = FakeStorageState::rejecting_uploads(500);
    let base_url = spawn_storage_server(state.clone()).await;

    let err = client(&base_url)
        .upload(&UploadRequest::new("u1", String::new()))
        .await
        .unwrap_err();

    match &err {
        StorageError::Server { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "upload rejected");
        }
        other => panic!("Expected server failure, got {:?}", other),
    }
    assert_eq!(err.failure_reason(), "500");
    assert_eq!(state.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_service_is_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}/", addr))
        .list("u1")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Network { .. }));
}

#[tokio::test]
async fn test_delete_missing_garment_is_surfaced() {
    let base_url = spawn_storage_server(FakeStorageState::default()).await;
    let err = client(&base_url)
        .delete("http://fake/static/uploads/img_9.png", "u1")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Server { status: 404, .. }));
}

#[test]
fn test_base_url_trailing_slash_is_normalized() {
    let client = client("https://closet.example/");
    assert_eq!(client.base_url(), "https://closet.example");
}

#[tokio::test]
async fn test_wardrobe_refresh_and_delete() {
    let state = FakeStorageState::default()
        .with_garment("u1", 1, "Top")
        .with_garment("u1", 2, "Bottom")
        .with_garment("u2", 3, "Shoes");
    let base_url = spawn_storage_server(state).await;

    let bus = Arc::new(EventBus::new(16));
    let mut events = bus.subscribe();
    let wardrobe = Wardrobe::new(
        Arc::new(client(&base_url)),
        Arc::new(StaticSession::new(Some("u1".to_string()))),
    )
    .with_event_bus(bus.clone());

    let garments = wardrobe.refresh().await.unwrap();
    assert_eq!(garments.len(), 2);
    assert!(matches!(
        events.recv().await.unwrap(),
        ClosetEvent::GarmentsLoaded { count: 2 }
    ));

    let url = garments[0].image_url.clone();
    wardrobe.delete(&url).await.unwrap();
    assert_eq!(wardrobe.len(), 1);
    assert!(wardrobe.garments().iter().all(|g| g.image_url != url));
    assert!(matches!(
        events.recv().await.unwrap(),
        ClosetEvent::GarmentDeleted { image_url } if image_url == url
    ));
}

#[tokio::test]
async fn test_wardrobe_keeps_garment_when_delete_fails() {
    let mock = Arc::new(MockStorageService::new().with_garments(
        "",
        vec![Garment {
            id: 7,
            image_url: "mock://a.png".to_string(),
            category: "Top".to_string(),
            season: "All".to_string(),
        }],
    ));
    let wardrobe = Wardrobe::new(mock.clone(), Arc::new(StaticSession::anonymous()));
    wardrobe.refresh().await.unwrap();
    assert_eq!(wardrobe.len(), 1);

    mock.fail_next_with_network("connection reset");
    assert!(wardrobe.delete("mock://a.png").await.is_err());
    assert_eq!(wardrobe.len(), 1);

    wardrobe.delete("mock://a.png").await.unwrap();
    assert!(wardrobe.is_empty());
}

#[tokio::test]
async fn test_wardrobe_refresh_failure_keeps_previous_list() {
    let mock = Arc::new(MockStorageService::new());
    let wardrobe = Wardrobe::new(mock.clone(), Arc::new(StaticSession::anonymous()));

    mock.upload(&UploadRequest::new("", "AAAA".to_string()))
        .await
        .unwrap();
    wardrobe.refresh().await.unwrap();

    mock.fail_next_with_status(503);
    let err = wardrobe.refresh().await.unwrap_err();
    assert_eq!(err.failure_reason(), "503");
    assert_eq!(wardrobe.len(), 1);
}

#[tokio::test]
async fn test_mock_scripted_failures_are_consumed_in_order() {
    let mock = MockStorageService::new();
    mock.fail_next_with_status(500);
    mock.fail_next_with_network("timeout");

    let request = UploadRequest::new("u1", String::new());
    assert!(matches!(
        mock.upload(&request).await,
        Err(StorageError::Server { status: 500, .. })
    ));
    assert!(matches!(
        mock.upload(&request).await,
        Err(StorageError::Network { .. })
    ));
    assert!(mock.upload(&request).await.is_ok());
    assert_eq!(mock.upload_count(), 3);
    assert_eq!(mock.list("u1").await.unwrap().len(), 1);
}
