use super::client::StorageService;
use super::types::{Garment, UploadRequest, UploadResponse};
use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory garment store used in place of the remote service.
///
/// Failures are scripted per call: each queued failure is consumed by the next
/// request of any kind.
#[derive(Default)]
pub struct MockStorageService {
    garments: Mutex<Vec<(String, Garment)>>,
    failures: Mutex<VecDeque<StorageError>>,
    next_id: Mutex<i64>,
    uploads: AtomicUsize,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with garments owned by `user_id`
    pub fn with_garments(self, user_id: &str, garments: Vec<Garment>) -> Self {
        {
            let mut store = self.garments.lock();
            let mut next_id = self.next_id.lock();
            for garment in garments {
                *next_id = (*next_id).max(garment.id);
                store.push((user_id.to_string(), garment));
            }
        }
        self
    }

    /// Fail the next request with a non-2xx status
    pub fn fail_next_with_status(&self, status: u16) {
        self.failures.lock().push_back(StorageError::Server {
            status,
            body: String::new(),
        });
    }

    /// Fail the next request as a transport error
    pub fn fail_next_with_network<S: Into<String>>(&self, details: S) {
        self.failures.lock().push_back(StorageError::Network {
            details: details.into(),
        });
    }

    /// Number of upload submissions received, including failed ones
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Option<StorageError> {
        self.failures.lock().pop_front()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, StorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        let id = {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            *next_id
        };
        let url = format!("mock://static/uploads/img_{}.png", id);
        self.garments.lock().push((
            request.user_id.clone(),
            Garment {
                id,
                image_url: url.clone(),
                category: request.category.clone(),
                season: request.season.clone(),
            },
        ));

        Ok(UploadResponse {
            message: "Garment saved".to_string(),
            url: Some(url),
        })
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Garment>, StorageError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(self
            .garments
            .lock()
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, garment)| garment.clone())
            .collect())
    }

    async fn delete(&self, image_url: &str, user_id: &str) -> Result<(), StorageError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let mut store = self.garments.lock();
        let before = store.len();
        store.retain(|(owner, garment)| !(owner == user_id && garment.image_url == image_url));
        if store.len() == before {
            return Err(StorageError::Server {
                status: 404,
                body: "Garment not found".to_string(),
            });
        }
        Ok(())
    }
}
