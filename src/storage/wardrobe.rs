use super::client::StorageService;
use super::types::Garment;
use crate::auth::SessionProvider;
use crate::error::StorageError;
use crate::events::{ClosetEvent, EventBus};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-memory view of the user's garments, rebuilt from the storage service
pub struct Wardrobe {
    storage: Arc<dyn StorageService>,
    session: Arc<dyn SessionProvider>,
    event_bus: Option<Arc<EventBus>>,
    garments: RwLock<Vec<Garment>>,
}

impl Wardrobe {
    pub fn new(storage: Arc<dyn StorageService>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            storage,
            session,
            event_bus: None,
            garments: RwLock::new(Vec::new()),
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Replace the cached list with a fresh listing.
    ///
    /// On failure the previous list is kept.
    pub async fn refresh(&self) -> Result<Vec<Garment>, StorageError> {
        let user_id = self.session.listing_user_id();
        let garments = match self.storage.list(&user_id).await {
            Ok(garments) => garments,
            Err(e) => {
                warn!("Failed to list garments: {}", e);
                return Err(e);
            }
        };

        info!("Loaded {} garments", garments.len());
        *self.garments.write() = garments.clone();
        self.publish(ClosetEvent::GarmentsLoaded {
            count: garments.len(),
        });
        Ok(garments)
    }

    /// Ask the service to delete a garment; drop it locally only once confirmed
    pub async fn delete(&self, image_url: &str) -> Result<(), StorageError> {
        let user_id = self.session.listing_user_id();
        self.storage.delete(image_url, &user_id).await?;

        self.garments.write().retain(|g| g.image_url != image_url);
        debug!("Dropped {} from local wardrobe", image_url);
        self.publish(ClosetEvent::GarmentDeleted {
            image_url: image_url.to_string(),
        });
        Ok(())
    }

    pub fn garments(&self) -> Vec<Garment> {
        self.garments.read().clone()
    }

    pub fn len(&self) -> usize {
        self.garments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.garments.read().is_empty()
    }

    fn publish(&self, event: ClosetEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}
