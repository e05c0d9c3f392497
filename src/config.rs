//! Editor Configuration
//!
//! Tunables for media loading and performance issue reporting, plus the
//! initial property values new nodes are created with.
//!
//! ```rust,ignore
//! use myth_editor::EditorConfig;
//!
//! let config = EditorConfig::from_json_str(r#"{ "loadTimeoutMs": 5000 }"#)?;
//! assert_eq!(config.load_timeout().as_secs(), 5);
//! ```
//!
//! Every field is optional in the JSON form; missing fields take the
//! [`Default`] values.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub const DEFAULT_GLOBE_TEXTURE: &str =
    "https://upload.wikimedia.org/wikipedia/commons/a/ac/Earthmap1000x500.jpg";
pub const DEFAULT_BUMP_MAP: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/1/15/Srtm_ramp2.world.21600x10800.jpg/2560px-Srtm_ramp2.world.21600x10800.jpg";
pub const DEFAULT_VIDEO_SRC: &str = "assets/video/SpokePromo.mp4";

const MIB: u64 = 1024 * 1024;

/// Thresholds used by the performance issue scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceLimits {
    /// Triangle count above which a warning is raised.
    pub max_triangles: u32,
    /// Largest texture edge, in pixels, before a warning is raised.
    pub max_texture_size: u32,
    /// Encoded image size above which a large-file warning is raised.
    pub large_image_bytes: u64,
    /// Encoded video size above which a large-file warning is raised.
    pub large_video_bytes: u64,
}

impl Default for PerformanceLimits {
    fn default() -> Self {
        Self {
            max_triangles: 100_000,
            max_texture_size: 4096,
            large_image_bytes: 2 * MIB,
            large_video_bytes: 20 * MIB,
        }
    }
}

/// Initial element properties for newly inserted nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeDefaults {
    pub globe_texture: String,
    pub bump_map: String,
    pub video_src: String,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            globe_texture: DEFAULT_GLOBE_TEXTURE.to_string(),
            bump_map: DEFAULT_BUMP_MAP.to_string(),
            video_src: DEFAULT_VIDEO_SRC.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Upper bound for one resolve + fetch round, in milliseconds.
    pub load_timeout_ms: u64,
    pub limits: PerformanceLimits,
    pub defaults: NodeDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 30_000,
            limits: PerformanceLimits::default(),
            defaults: NodeDefaults::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    #[inline]
    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
