//! Scripted collaborators shared by unit tests.

use crate::camera::FrameSource;
use crate::error::{CameraError, SegmentationError};
use crate::frame::{Frame, Rotation};
use crate::preprocess::Segmenter;
use crate::storage::{Garment, UploadRequest, UploadResponse};
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use image::{DynamicImage, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Frame source with a fixed bind outcome and a queue of capture outcomes
pub struct ScriptedFrameSource {
    bind_result: Result<(), CameraError>,
    captures: VecDeque<Result<Frame, CameraError>>,
    capture_delay: Duration,
    pub binds: Arc<AtomicUsize>,
    pub unbinds: Arc<AtomicUsize>,
}

impl ScriptedFrameSource {
    pub fn new() -> Self {
        Self {
            bind_result: Ok(()),
            captures: VecDeque::new(),
            capture_delay: Duration::ZERO,
            binds: Arc::new(AtomicUsize::new(0)),
            unbinds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_bind(details: &str) -> Self {
        let mut source = Self::new();
        source.bind_result = Err(CameraError::Initialization {
            details: details.to_string(),
        });
        source
    }

    pub fn then_frame(mut self, frame: Frame) -> Self {
        self.captures.push_back(Ok(frame));
        self
    }

    pub fn then_error(mut self, error: CameraError) -> Self {
        self.captures.push_back(Err(error));
        self
    }

    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }
}

#[async_trait]
impl FrameSource for ScriptedFrameSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn bind(&mut self) -> Result<(), CameraError> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        self.bind_result.clone()
    }

    async fn unbind(&mut self) {
        self.unbinds.fetch_add(1, Ordering::SeqCst);
    }

    async fn capture(&mut self) -> Result<Frame, CameraError> {
        if !self.capture_delay.is_zero() {
            tokio::time::sleep(self.capture_delay).await;
        }
        self.captures.pop_front().unwrap_or_else(|| {
            Err(CameraError::Capture {
                details: "no scripted frame left".to_string(),
            })
        })
    }
}

/// Segmenter whose every call fails
pub struct FailingSegmenter;

#[async_trait]
impl Segmenter for FailingSegmenter {
    async fn extract_foreground(
        &self,
        _image: &DynamicImage,
    ) -> Result<Option<DynamicImage>, SegmentationError> {
        Err(SegmentationError::Failed {
            details: "model unavailable".to_string(),
        })
    }
}

/// Segmenter that never finds a foreground
pub struct EmptySegmenter;

#[async_trait]
impl Segmenter for EmptySegmenter {
    async fn extract_foreground(
        &self,
        _image: &DynamicImage,
    ) -> Result<Option<DynamicImage>, SegmentationError> {
        Ok(None)
    }
}

/// Segmenter that returns a fixed image regardless of input
pub struct FixedSegmenter(pub DynamicImage);

#[async_trait]
impl Segmenter for FixedSegmenter {
    async fn extract_foreground(
        &self,
        _image: &DynamicImage,
    ) -> Result<Option<DynamicImage>, SegmentationError> {
        Ok(Some(self.0.clone()))
    }
}

/// Segmenter that takes longer than any sensible timeout
pub struct SlowSegmenter(pub Duration);

#[async_trait]
impl Segmenter for SlowSegmenter {
    async fn extract_foreground(
        &self,
        image: &DynamicImage,
    ) -> Result<Option<DynamicImage>, SegmentationError> {
        tokio::time::sleep(self.0).await;
        Ok(Some(image.clone()))
    }
}

/// A width x height frame whose left half is red and right half blue
pub fn split_color_frame(id: u64, width: u32, height: u32, rotation: Rotation) -> Frame {
    let image = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    Frame::from_image(id, &DynamicImage::ImageRgba8(image), rotation)
}

/// State behind the in-process `/clothes` server
#[derive(Clone, Default)]
pub struct FakeStorageState {
    pub garments: Arc<Mutex<Vec<(String, Garment)>>>,
    pub uploads: Arc<AtomicUsize>,
    /// When set, every upload is answered with this status
    pub upload_status: Option<u16>,
}

impl FakeStorageState {
    pub fn rejecting_uploads(status: u16) -> Self {
        Self {
            upload_status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_garment(self, user_id: &str, id: i64, category: &str) -> Self {
        self.garments.lock().push((
            user_id.to_string(),
            Garment {
                id,
                image_url: format!("http://fake/static/uploads/img_{}.png", id),
                category: category.to_string(),
                season: "All".to_string(),
            },
        ));
        self
    }
}

/// Serve the storage API on an ephemeral port; returns the base url
pub async fn spawn_storage_server(state: FakeStorageState) -> String {
    let app = Router::new()
        .route(
            "/clothes",
            post(fake_upload).get(fake_list).delete(fake_delete),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

async fn fake_upload(
    State(state): State<FakeStorageState>,
    Json(request): Json<UploadRequest>,
) -> Response {
    state.uploads.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.upload_status {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "upload rejected").into_response();
    }

    let mut garments = state.garments.lock();
    let id = garments.len() as i64 + 1;
    let url = format!("http://fake/static/uploads/img_{}.png", id);
    garments.push((
        request.user_id,
        Garment {
            id,
            image_url: url.clone(),
            category: request.category,
            season: request.season,
        },
    ));
    Json(UploadResponse {
        message: "Saved".to_string(),
        url: Some(url),
    })
    .into_response()
}

async fn fake_list(
    State(state): State<FakeStorageState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Garment>> {
    let user_id = params.get("user_id").cloned().unwrap_or_default();
    let garments = state
        .garments
        .lock()
        .iter()
        .filter(|(owner, _)| *owner == user_id)
        .map(|(_, garment)| garment.clone())
        .collect();
    Json(garments)
}

async fn fake_delete(
    State(state): State<FakeStorageState>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    let (Some(image_url), Some(user_id)) = (params.get("image_url"), params.get("user_id")) else {
        return StatusCode::BAD_REQUEST;
    };
    let mut garments = state.garments.lock();
    let before = garments.len();
    garments.retain(|(owner, g)| !(owner == user_id && g.image_url == *image_url));
    if garments.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}
