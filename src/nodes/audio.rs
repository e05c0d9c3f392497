//! Positional audio parameters, owned by nodes that play sound.

use serde::{Deserialize, Serialize};

pub const AUDIO_PARAMS_COMPONENT: &str = "audio-params";

/// Media element the parameters apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioElementType {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioType {
    Stereo,
    #[default]
    PannerNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceModel {
    Linear,
    #[default]
    Inverse,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioParams {
    pub audio_type: AudioType,
    pub volume: f32,
    pub distance_model: DistanceModel,
    pub rolloff_factor: f32,
    pub ref_distance: f32,
    pub max_distance: f32,
    pub cone_inner_angle: f32,
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            audio_type: AudioType::PannerNode,
            volume: 0.5,
            distance_model: DistanceModel::Inverse,
            rolloff_factor: 1.0,
            ref_distance: 1.0,
            max_distance: 10_000.0,
            cone_inner_angle: 360.0,
            cone_outer_angle: 0.0,
            cone_outer_gain: 0.0,
        }
    }
}

impl AudioParams {
    /// Sets the volume, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}
