use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmartClosetConfig {
    pub storage: StorageConfig,
    pub weather: WeatherConfig,
    pub camera: CameraConfig,
    pub preprocess: PreprocessConfig,
    pub motion: MotionConfig,
    pub canvas: CanvasConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Base URL of the garment storage service
    #[serde(default = "default_storage_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeatherConfig {
    /// Base URL of the forecast service
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Last known latitude, used when no location is given explicitly
    pub latitude: Option<f64>,

    /// Last known longitude
    pub longitude: Option<f64>,

    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameSourceKind {
    /// Frames are read from an image file
    Still,
    /// Frames are synthesized (debug upload)
    Placeholder,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Which frame source backs the camera
    #[serde(default = "default_frame_source")]
    pub source: FrameSourceKind,

    /// Image file used by the still source
    #[serde(default = "default_image_path")]
    pub image_path: String,

    /// Sensor-reported rotation in degrees (0, 90, 180, 270)
    #[serde(default)]
    pub rotation: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PreprocessConfig {
    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Compressed format used for the upload payload
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Run background removal before encoding
    #[serde(default = "default_segmentation_enabled")]
    pub segmentation_enabled: bool,

    /// Upper bound on a single segmentation call
    #[serde(default = "default_segmentation_timeout")]
    pub segmentation_timeout_secs: u64,

    /// Color distance from the border color below which a pixel is background
    #[serde(default = "default_background_tolerance")]
    pub background_tolerance: f32,

    /// Opaque pixels required before a foreground result is accepted
    #[serde(default = "default_min_foreground_pixels")]
    pub min_foreground_pixels: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MotionConfig {
    /// Acceleration magnitude, in g, above which a sample is a shake candidate
    #[serde(default = "default_shake_threshold")]
    pub shake_threshold_g: f64,

    /// Minimum time between accepted shakes
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Accelerometer input device (sensors feature)
    pub device: Option<String>,

    /// Raw device counts corresponding to one standard gravity
    #[serde(default = "default_counts_per_g")]
    pub counts_per_g: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CanvasConfig {
    #[serde(default = "default_top_offset")]
    pub top_offset: (f32, f32),

    #[serde(default = "default_bottom_offset")]
    pub bottom_offset: (f32, f32),

    #[serde(default = "default_shoes_offset")]
    pub shoes_offset: (f32, f32),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Identifier of the signed-in user, if any
    pub user_id: Option<String>,
}

impl SmartClosetConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("smartcloset.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("storage.base_url", default_storage_base_url())?
            .set_default("storage.timeout_secs", default_storage_timeout())?
            .set_default("weather.base_url", default_weather_base_url())?
            .set_default("weather.timeout_secs", default_weather_timeout())?
            .set_default("camera.source", "still")?
            .set_default("camera.image_path", default_image_path())?
            .set_default("camera.rotation", 0)?
            .set_default("preprocess.jpeg_quality", default_jpeg_quality() as i64)?
            .set_default("preprocess.output_format", "jpeg")?
            .set_default(
                "preprocess.segmentation_enabled",
                default_segmentation_enabled(),
            )?
            .set_default(
                "preprocess.segmentation_timeout_secs",
                default_segmentation_timeout(),
            )?
            .set_default(
                "preprocess.background_tolerance",
                default_background_tolerance() as f64,
            )?
            .set_default(
                "preprocess.min_foreground_pixels",
                default_min_foreground_pixels(),
            )?
            .set_default("motion.shake_threshold_g", default_shake_threshold())?
            .set_default("motion.debounce_ms", default_debounce_ms())?
            .set_default("motion.counts_per_g", default_counts_per_g())?
            .set_default(
                "canvas.top_offset",
                vec![default_top_offset().0 as f64, default_top_offset().1 as f64],
            )?
            .set_default(
                "canvas.bottom_offset",
                vec![
                    default_bottom_offset().0 as f64,
                    default_bottom_offset().1 as f64,
                ],
            )?
            .set_default(
                "canvas.shoes_offset",
                vec![
                    default_shoes_offset().0 as f64,
                    default_shoes_offset().1 as f64,
                ],
            )?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            // SMARTCLOSET__STORAGE__BASE_URL etc.; keys contain underscores
            .add_source(
                Environment::with_prefix("SMARTCLOSET")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: SmartClosetConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage base_url must not be empty".to_string(),
            ));
        }

        if self.weather.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Weather base_url must not be empty".to_string(),
            ));
        }

        if self.camera.rotation % 90 != 0 || self.camera.rotation >= 360 {
            return Err(ConfigError::Message(format!(
                "Camera rotation must be 0, 90, 180 or 270 (got {})",
                self.camera.rotation
            )));
        }

        if self.preprocess.jpeg_quality == 0 || self.preprocess.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.preprocess.segmentation_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Segmentation timeout must be greater than 0".to_string(),
            ));
        }

        if !(self.motion.shake_threshold_g > 0.0) {
            return Err(ConfigError::Message(
                "Shake threshold must be greater than 0".to_string(),
            ));
        }

        if self.motion.debounce_ms == 0 {
            return Err(ConfigError::Message(
                "Shake debounce must be greater than 0".to_string(),
            ));
        }

        if !(self.motion.counts_per_g > 0.0) {
            return Err(ConfigError::Message(
                "counts_per_g must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SmartClosetConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                base_url: default_storage_base_url(),
                timeout_secs: default_storage_timeout(),
            },
            weather: WeatherConfig {
                base_url: default_weather_base_url(),
                latitude: None,
                longitude: None,
                timeout_secs: default_weather_timeout(),
            },
            camera: CameraConfig {
                source: default_frame_source(),
                image_path: default_image_path(),
                rotation: 0,
            },
            preprocess: PreprocessConfig::default(),
            motion: MotionConfig::default(),
            canvas: CanvasConfig::default(),
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                user_id: None,
            },
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            output_format: default_output_format(),
            segmentation_enabled: default_segmentation_enabled(),
            segmentation_timeout_secs: default_segmentation_timeout(),
            background_tolerance: default_background_tolerance(),
            min_foreground_pixels: default_min_foreground_pixels(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            shake_threshold_g: default_shake_threshold(),
            debounce_ms: default_debounce_ms(),
            device: None,
            counts_per_g: default_counts_per_g(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            top_offset: default_top_offset(),
            bottom_offset: default_bottom_offset(),
            shoes_offset: default_shoes_offset(),
        }
    }
}

// Default value functions
fn default_storage_base_url() -> String {
    "https://spad0x.pythonanywhere.com/".to_string()
}
fn default_storage_timeout() -> u64 {
    30
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/".to_string()
}
fn default_weather_timeout() -> u64 {
    10
}

fn default_frame_source() -> FrameSourceKind {
    FrameSourceKind::Still
}
fn default_image_path() -> String {
    "./capture.jpg".to_string()
}

fn default_jpeg_quality() -> u8 {
    70
}
fn default_output_format() -> OutputFormat {
    OutputFormat::Jpeg
}
fn default_segmentation_enabled() -> bool {
    true
}
fn default_segmentation_timeout() -> u64 {
    10
}
fn default_background_tolerance() -> f32 {
    40.0
}
fn default_min_foreground_pixels() -> u64 {
    1
}

fn default_shake_threshold() -> f64 {
    12.0
}
fn default_debounce_ms() -> u64 {
    1000
}
fn default_counts_per_g() -> f64 {
    1024.0
}

fn default_top_offset() -> (f32, f32) {
    (0.0, -200.0)
}
fn default_bottom_offset() -> (f32, f32) {
    (0.0, 100.0)
}
fn default_shoes_offset() -> (f32, f32) {
    (0.0, 400.0)
}

fn default_event_bus_capacity() -> usize {
    100
}
