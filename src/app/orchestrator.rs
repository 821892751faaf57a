use super::types::{Component, ComponentState};
use crate::auth::StaticSession;
use crate::camera::{FrameCapture, FrameCaptureBuilder};
use crate::canvas::{OutfitCanvas, OutfitEditor};
use crate::config::SmartClosetConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::motion::{accelerometer_from_config, MotionEventFilter};
use crate::preprocess::ImagePreprocessor;
use crate::storage::{HttpStorageClient, StorageService, Wardrobe};
use crate::upload::UploadCoordinator;
use crate::weather::WeatherClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wires every component of the app together from one configuration
pub struct ClosetOrchestrator {
    pub(super) config: SmartClosetConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) session: Arc<StaticSession>,

    // Components
    pub(super) capture: Arc<Mutex<FrameCapture>>,
    pub(super) coordinator: UploadCoordinator,
    pub(super) wardrobe: Wardrobe,
    pub(super) editor: OutfitEditor,
    pub(super) weather: WeatherClient,

    // Lifecycle management
    pub(super) component_states: parking_lot::Mutex<HashMap<Component, ComponentState>>,
    pub(super) cancellation_token: CancellationToken,
}

impl ClosetOrchestrator {
    /// Create an orchestrator talking to the configured storage service
    pub fn new(config: SmartClosetConfig) -> Result<Self> {
        let storage = Arc::new(HttpStorageClient::from_config(&config.storage)?);
        Self::with_storage(config, storage)
    }

    /// Create an orchestrator with an explicit storage backend
    pub fn with_storage(
        config: SmartClosetConfig,
        storage: Arc<dyn StorageService>,
    ) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let session = Arc::new(StaticSession::new(config.system.user_id.clone()));

        let capture = Arc::new(Mutex::new(
            FrameCaptureBuilder::new()
                .config(config.camera.clone())
                .event_bus(Arc::clone(&event_bus))
                .build()?,
        ));

        let preprocessor = Arc::new(ImagePreprocessor::from_config(config.preprocess.clone()));

        let coordinator = UploadCoordinator::new(
            Arc::clone(&capture),
            preprocessor,
            Arc::clone(&storage),
            session.clone(),
            Arc::clone(&event_bus),
        );

        let wardrobe = Wardrobe::new(Arc::clone(&storage), session.clone())
            .with_event_bus(Arc::clone(&event_bus));

        let motion = MotionEventFilter::new(
            config.motion.clone(),
            accelerometer_from_config(&config.motion),
        )
        .with_event_bus(Arc::clone(&event_bus));
        let editor = OutfitEditor::new(
            OutfitCanvas::new(&config.canvas),
            motion,
            Arc::clone(&event_bus),
        );

        let weather = WeatherClient::from_config(&config.weather)?;

        info!(
            "Orchestrator created (storage {}, camera source {:?})",
            config.storage.base_url, config.camera.source
        );

        Ok(Self {
            config,
            event_bus,
            session,
            capture,
            coordinator,
            wardrobe,
            editor,
            weather,
            component_states: parking_lot::Mutex::new(HashMap::new()),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &SmartClosetConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn session(&self) -> &StaticSession {
        &self.session
    }

    pub fn coordinator(&self) -> &UploadCoordinator {
        &self.coordinator
    }

    pub fn wardrobe(&self) -> &Wardrobe {
        &self.wardrobe
    }

    pub fn editor(&self) -> &OutfitEditor {
        &self.editor
    }
}
