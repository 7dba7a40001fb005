//! Runtime configuration for the viewer.
//!
//! Every field has a default that reproduces the stock viewer, so a page can
//! pass a partial JSON object (or nothing at all) to `start_with_config`.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Id of the element the page mounts into.
    pub mount_id: String,
    /// URL of the TrueType font used for the 3D labels.
    pub font_url: String,
    /// Source of the arrow image used by both navigation controls.
    pub arrow_image: String,
    pub log_level: String,
    /// Upper bound for `devicePixelRatio`.
    pub max_pixel_ratio: f32,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub lights: LightsConfig,
    pub material: MaterialConfig,
    pub label: LabelConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub point_color: [f32; 3],
    pub point_intensity: f32,
    pub point_position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub size: f32,
    pub depth: f32,
    /// Height of the label's center above the model origin.
    pub offset_y: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub zenith: [f32; 3],
    pub horizon: [f32; 3],
    pub ground: [f32; 3],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            mount_id: "app".into(),
            font_url: "./fonts/helvetiker_regular.ttf".into(),
            arrow_image: "./images/arrow.png".into(),
            log_level: "debug".into(),
            max_pixel_ratio: 2.0,
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            lights: LightsConfig::default(),
            material: MaterialConfig::default(),
            label: LabelConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { fov_degrees: 45.0, near: 1.0, far: 100.0, distance: 10.0 }
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 1.5,
            max_distance: 60.0,
        }
    }
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.5,
            point_color: [1.0, 1.0, 1.0],
            point_intensity: 0.5,
            point_position: [2.0, 3.0, 4.0],
        }
    }
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self { color: [1.0, 1.0, 1.0], metalness: 0.766, roughness: 0.041 }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self { size: 0.5, depth: 0.2, offset_y: 2.0 }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            zenith: [0.18, 0.32, 0.62],
            horizon: [0.78, 0.84, 0.92],
            ground: [0.22, 0.2, 0.19],
        }
    }
}

impl OrbitConfig {
    /// Distance limits ordered so that min <= max. NaN limits count as 0.
    pub fn distance_range(&self) -> (f32, f32) {
        let a = self.min_distance.max(0.0);
        let b = self.max_distance.max(0.0);
        if a <= b { (a, b) } else { (b, a) }
    }
}

impl ViewerConfig {
    /// Parses a (possibly partial) JSON object; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
