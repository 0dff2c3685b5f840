//! Interfaces the session controller drives: a pose estimator and a capture feed.
//!
//! Both are single-threaded. Futures returned here are polled from the host's frame tick and
//! may be dropped unfinished; dropping is how the controller abandons a request.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{PaperdollError, PaperdollResult};
use crate::pose::landmark::LandmarkSet;

pub type ModelFuture = Pin<Box<dyn Future<Output = PaperdollResult<()>>>>;
pub type EstimateFuture = Pin<Box<dyn Future<Output = PaperdollResult<LandmarkSet>>>>;

/// One still from the capture feed, RGBA8 rows top to bottom.
#[derive(Clone, Debug)]
pub struct CaptureFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

impl CaptureFrame {
    /// A frame the estimator can run on: non-empty and fully populated.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == self.width as usize * self.height as usize * 4
    }
}

pub trait PoseEstimator {
    /// Load the model. Called once per session.
    fn initialize(&mut self) -> ModelFuture;

    /// Estimate a single pose, in the frame's pixel coordinates. An empty set means no person
    /// was found.
    fn estimate(&mut self, frame: &CaptureFrame) -> EstimateFuture;

    /// Release the model. No further calls follow.
    fn dispose(&mut self);
}

pub trait CaptureSource {
    /// Enough data buffered to produce a frame.
    fn is_ready(&self) -> bool;

    fn dimensions(&self) -> Canvas;

    fn current_frame(&mut self) -> Option<CaptureFrame>;
}

/// Estimator that replays a fixed list of estimates, one per request.
///
/// Offline stand-in for a model: used by the CLI to drive a session from a file.
#[derive(Debug, Default)]
pub struct ScriptedEstimator {
    script: VecDeque<LandmarkSet>,
    repeat: bool,
    initialized: bool,
    disposed: bool,
}

impl ScriptedEstimator {
    pub fn new(script: impl IntoIterator<Item = LandmarkSet>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Cycle through the script instead of failing once it runs out.
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl PoseEstimator for ScriptedEstimator {
    fn initialize(&mut self) -> ModelFuture {
        self.initialized = true;
        Box::pin(std::future::ready(Ok(())))
    }

    fn estimate(&mut self, _frame: &CaptureFrame) -> EstimateFuture {
        let result = if self.disposed || !self.initialized {
            Err(PaperdollError::estimation("scripted estimator is not initialized"))
        } else {
            match self.script.pop_front() {
                Some(set) => {
                    if self.repeat {
                        self.script.push_back(set.clone());
                    }
                    Ok(set)
                }
                None => Err(PaperdollError::estimation("estimate script exhausted")),
            }
        };
        Box::pin(std::future::ready(result))
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.script.clear();
    }
}

/// Capture feed that always yields the same blank frame.
#[derive(Clone, Debug)]
pub struct StillCapture {
    size: Canvas,
    pixels: Arc<[u8]>,
}

impl StillCapture {
    pub fn new(size: Canvas) -> Self {
        let len = size.width as usize * size.height as usize * 4;
        Self {
            size,
            pixels: vec![0u8; len].into(),
        }
    }
}

impl CaptureSource for StillCapture {
    fn is_ready(&self) -> bool {
        !self.size.is_empty()
    }

    fn dimensions(&self) -> Canvas {
        self.size
    }

    fn current_frame(&mut self) -> Option<CaptureFrame> {
        Some(CaptureFrame {
            width: self.size.width,
            height: self.size.height,
            rgba: Arc::clone(&self.pixels),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/collaborators.rs"]
mod tests;
