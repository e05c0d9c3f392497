//! Performance and validation issues shown next to a node.

use serde::{Deserialize, Serialize};

use crate::config::PerformanceLimits;
use crate::media::{DecodedMedia, MediaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureStats {
    pub width: u32,
    pub height: u32,
}

/// Snapshot of a node's renderable state, as seen by an [`IssueScanner`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderableStats {
    pub triangles: u32,
    pub materials: u32,
    pub textures: Vec<TextureStats>,
}

impl RenderableStats {
    pub fn add_media(&mut self, media: &DecodedMedia) {
        let (width, height) = media.dimensions();
        self.textures.push(TextureStats { width, height });
    }
}

/// Pure function of the current renderable state.
pub trait IssueScanner: Send + Sync {
    fn scan(&self, stats: &RenderableStats) -> Vec<Issue>;
}

/// Default scanner: triangle budget and texture dimensions.
#[derive(Debug, Clone, Default)]
pub struct PerfIssueScanner {
    limits: PerformanceLimits,
}

impl PerfIssueScanner {
    #[must_use]
    pub fn new(limits: PerformanceLimits) -> Self {
        Self { limits }
    }
}

impl IssueScanner for PerfIssueScanner {
    fn scan(&self, stats: &RenderableStats) -> Vec<Issue> {
        let mut issues = Vec::new();

        if stats.triangles > self.limits.max_triangles {
            issues.push(Issue::warning(format!(
                "This object has {} triangles. Consider simplifying it to {} or fewer.",
                stats.triangles, self.limits.max_triangles
            )));
        }

        let max = self.limits.max_texture_size;
        for texture in &stats.textures {
            if texture.width > max || texture.height > max {
                issues.push(Issue::warning(format!(
                    "Texture is {}x{}. Textures larger than {max}x{max} may not load on mobile devices.",
                    texture.width, texture.height
                )));
            }
        }

        issues
    }
}

/// Appends a warning when an encoded file exceeds the limit for its kind.
pub fn maybe_add_large_file_issue(
    kind: MediaKind,
    byte_size: u64,
    limits: &PerformanceLimits,
    issues: &mut Vec<Issue>,
) {
    let limit = match kind {
        MediaKind::Image => limits.large_image_bytes,
        MediaKind::Video => limits.large_video_bytes,
    };

    if byte_size > limit {
        #[allow(clippy::cast_precision_loss)]
        let megabytes = byte_size as f64 / (1024.0 * 1024.0);
        issues.push(Issue::warning(format!(
            "Large {kind} file ({megabytes:.1} MB). Files this size will slow down loading."
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_flags_triangles_and_large_textures() {
        let scanner = PerfIssueScanner::new(PerformanceLimits {
            max_triangles: 10,
            max_texture_size: 512,
            ..PerformanceLimits::default()
        });
        let stats = RenderableStats {
            triangles: 11,
            materials: 1,
            textures: vec![
                TextureStats { width: 512, height: 512 },
                TextureStats { width: 1024, height: 256 },
            ],
        };

        let issues = scanner.scan(&stats);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn large_file_threshold_depends_on_kind() {
        let limits = PerformanceLimits {
            large_image_bytes: 100,
            large_video_bytes: 1000,
            ..PerformanceLimits::default()
        };
        let mut issues = Vec::new();
        maybe_add_large_file_issue(MediaKind::Image, 101, &limits, &mut issues);
        maybe_add_large_file_issue(MediaKind::Video, 101, &limits, &mut issues);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.starts_with("Large image file"));
    }
}
