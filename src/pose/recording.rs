use std::path::Path;

use anyhow::Context;

use crate::foundation::core::Fps;
use crate::foundation::error::{PaperdollError, PaperdollResult};
use crate::pose::landmark::LandmarkSet;

/// A landmark set captured at a point in time, in render-surface coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PoseFrame {
    /// Seconds since the recording started.
    pub captured_at_secs: f64,
    pub landmarks: LandmarkSet,
}

/// Append-only sequence of captured frames.
///
/// Frames cannot be edited once appended; the only mutations are [`PoseRecording::push`] and
/// [`PoseRecording::clear`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PoseRecording {
    frames: Vec<PoseFrame>,
}

impl PoseRecording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: PoseFrame) {
        self.frames.push(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PoseFrame> {
        self.frames.get(index)
    }

    /// Frame `index` modulo the recording length; `None` when empty.
    pub fn frame_looped(&self, index: usize) -> Option<&PoseFrame> {
        if self.frames.is_empty() {
            return None;
        }
        self.frames.get(index % self.frames.len())
    }

    pub fn frames(&self) -> &[PoseFrame] {
        &self.frames
    }

    pub fn from_path(path: &Path) -> PaperdollResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read pose recording '{}'", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| PaperdollError::serde(format!("invalid pose recording: {e}")))
    }

    pub fn write_to_path(&self, path: &Path) -> PaperdollResult<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write pose recording '{}'", path.display()))?;
        Ok(())
    }
}

/// Maps host time onto replay frame indices at a fixed rate, independent of how often the
/// host ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayClock {
    fps: Fps,
    origin_secs: Option<f64>,
}

impl ReplayClock {
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            origin_secs: None,
        }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Forget the origin; the next call to [`ReplayClock::position`] restarts at frame 0.
    pub fn reset(&mut self) {
        self.origin_secs = None;
    }

    pub fn is_running(&self) -> bool {
        self.origin_secs.is_some()
    }

    /// Index into a recording of `len` frames at host time `now_secs`, looping after the last
    /// frame. The first call pins the origin.
    pub fn position(&mut self, now_secs: f64, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let origin = *self.origin_secs.get_or_insert(now_secs);
        let elapsed = (now_secs - origin).max(0.0);
        let frame = self.fps.secs_to_frames_floor(elapsed);
        Some((frame % len as u64) as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pose/recording.rs"]
mod tests;
