use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Canvas, Fps, Rgba8};
use crate::foundation::error::{PaperdollError, PaperdollResult};
use crate::pose::landmark::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::render::skeleton::SkeletonStyle;
use crate::transform::placement::DEFAULT_HEAD_MAGNIFICATION;

pub const ENV_CONFIDENCE_THRESHOLD: &str = "PAPERDOLL_CONFIDENCE_THRESHOLD";
pub const ENV_HEAD_MAGNIFICATION: &str = "PAPERDOLL_HEAD_MAGNIFICATION";
pub const ENV_DEBUG_SKELETON: &str = "PAPERDOLL_DEBUG_SKELETON";

/// Settings shared by the compositor and the session controller.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Size of the surface drawings are composited onto.
    #[serde(default = "default_render")]
    pub render: Canvas,
    /// Resolution live landmarks are reported in.
    #[serde(default = "default_capture")]
    pub capture: Canvas,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_head_magnification")]
    pub head_magnification: f64,
    #[serde(default = "default_replay_fps")]
    pub replay_fps: Fps,
    #[serde(default)]
    pub debug_skeleton: bool,
    /// Mirror estimates horizontally about the capture width (selfie view).
    #[serde(default)]
    pub mirror_capture: bool,
    #[serde(default)]
    pub skeleton: SkeletonStyle,
    /// Background fill on clear; transparent when absent.
    #[serde(default)]
    pub background: Option<Rgba8>,
}

fn default_render() -> Canvas {
    Canvas {
        width: 640,
        height: 480,
    }
}
fn default_capture() -> Canvas {
    Canvas {
        width: 320,
        height: 240,
    }
}
fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}
fn default_head_magnification() -> f64 {
    DEFAULT_HEAD_MAGNIFICATION
}
fn default_replay_fps() -> Fps {
    Fps { num: 30, den: 1 }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            render: default_render(),
            capture: default_capture(),
            confidence_threshold: default_confidence_threshold(),
            head_magnification: default_head_magnification(),
            replay_fps: default_replay_fps(),
            debug_skeleton: false,
            mirror_capture: false,
            skeleton: SkeletonStyle::default(),
            background: None,
        }
    }
}

impl OverlayConfig {
    pub fn from_json_str(s: &str) -> PaperdollResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> PaperdollResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read overlay config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> PaperdollResult<()> {
        for (what, c) in [("render", self.render), ("capture", self.capture)] {
            if c.is_empty() {
                return Err(PaperdollError::config(format!(
                    "{what} size must be non-zero, got {}x{}",
                    c.width, c.height
                )));
            }
        }
        if !self.confidence_threshold.is_finite() || !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PaperdollError::config(format!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !self.head_magnification.is_finite() || self.head_magnification <= 0.0 {
            return Err(PaperdollError::config(format!(
                "head magnification must be > 0, got {}",
                self.head_magnification
            )));
        }
        Fps::new(self.replay_fps.num, self.replay_fps.den)?;
        let style = &self.skeleton;
        if !(style.edge_width.is_finite() && style.edge_width > 0.0)
            || !(style.point_radius.is_finite() && style.point_radius > 0.0)
        {
            return Err(PaperdollError::config(
                "skeleton edge width and point radius must be > 0",
            ));
        }
        Ok(())
    }

    /// Apply `PAPERDOLL_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; values that fail to parse are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        if let Some(v) = parsed(ENV_CONFIDENCE_THRESHOLD) {
            self.confidence_threshold = v;
        }
        if let Some(v) = parsed(ENV_HEAD_MAGNIFICATION) {
            self.head_magnification = v;
        }
        if let Some(v) = lookup(ENV_DEBUG_SKELETON).and_then(|v| parse_flag(&v)) {
            self.debug_skeleton = v;
        }
        self
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
