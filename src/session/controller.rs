//! Pose session lifecycle: model loading, the per-frame detection loop, recording and
//! teardown.
//!
//! The host calls [`PoseSession::tick`] once per display frame. At most one estimate is in
//! flight; its future is stored on the session and polled on later ticks until it resolves.
//! Stopping or tearing down drops that future, so a superseded request can never deliver.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::config::OverlayConfig;
use crate::foundation::core::Canvas;
use crate::foundation::error::{PaperdollError, PaperdollResult};
use crate::pose::landmark::LandmarkSet;
use crate::pose::recording::{PoseFrame, PoseRecording};
use crate::render::compositor::FrameSource;
use crate::session::collaborators::{
    CaptureFrame, CaptureSource, EstimateFuture, ModelFuture, PoseEstimator,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ModelLoading,
    Ready,
    Detecting,
    Paused,
    ViewingReplay,
    TornDown,
}

/// How detection and recording are driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Detect continuously once the model is ready; nothing is recorded.
    Overlay,
    /// Detect between start and stop, record every estimate, replay after stopping.
    Record,
}

/// What a tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
    /// Nothing to do in the current state.
    Idle,
    ModelPending,
    ModelReady,
    ModelFailed,
    /// No usable capture frame this tick; retried next tick.
    CaptureNotReady,
    EstimatePending,
    /// A new landmark set was accepted.
    Landmarks,
    /// The estimator found nobody; the previous landmarks are kept.
    NoPose,
    EstimateFailed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub estimates_ok: u64,
    pub estimates_empty: u64,
    pub estimates_failed: u64,
    /// In-flight estimates dropped by stop or teardown.
    pub estimates_abandoned: u64,
}

pub struct PoseSession<E: PoseEstimator, C: CaptureSource> {
    estimator: E,
    capture: C,
    config: OverlayConfig,
    mode: ViewMode,
    state: SessionState,

    model_init: Option<ModelFuture>,
    in_flight: Option<EstimateFuture>,
    start_when_ready: bool,

    capture_visible: bool,
    current: LandmarkSet,
    recording: PoseRecording,
    recording_origin_secs: Option<f64>,
    stats: SessionStats,
    // Last capture size reported as differing from `config.capture`.
    mismatched_capture: Option<Canvas>,
}

impl<E: PoseEstimator, C: CaptureSource> PoseSession<E, C> {
    pub fn new(
        estimator: E,
        capture: C,
        config: OverlayConfig,
        mode: ViewMode,
    ) -> PaperdollResult<Self> {
        config.validate()?;
        Ok(Self {
            estimator,
            capture,
            config,
            mode,
            state: SessionState::Idle,
            model_init: None,
            in_flight: None,
            start_when_ready: false,
            capture_visible: true,
            current: LandmarkSet::empty(),
            recording: PoseRecording::new(),
            recording_origin_secs: None,
            stats: SessionStats::default(),
            mismatched_capture: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn capture_visible(&self) -> bool {
        self.capture_visible
    }

    /// Latest accepted estimate, in capture coordinates.
    pub fn current_landmarks(&self) -> &LandmarkSet {
        &self.current
    }

    pub fn recording(&self) -> &PoseRecording {
        &self.recording
    }

    pub fn is_estimate_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// What the compositor should draw at host time `now_secs`.
    pub fn frame_source(&self, now_secs: f64) -> FrameSource<'_> {
        if self.state == SessionState::ViewingReplay {
            FrameSource::Replay {
                recording: &self.recording,
                now_secs,
            }
        } else {
            FrameSource::Live(&self.current)
        }
    }

    /// Begin loading the model. Repeated calls while loading or loaded are no-ops.
    pub fn load_model(&mut self) -> PaperdollResult<()> {
        match self.state {
            SessionState::TornDown => Err(torn_down()),
            SessionState::Idle => {
                let feed = self.capture.dimensions();
                self.note_capture_size(feed);
                self.model_init = Some(self.estimator.initialize());
                self.transition(SessionState::ModelLoading);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Start (or restart) detection, discarding any previous recording.
    ///
    /// While the model is still loading the request is remembered and honoured once it is
    /// ready.
    pub fn start_detecting(&mut self) -> PaperdollResult<()> {
        match self.state {
            SessionState::TornDown => Err(torn_down()),
            SessionState::Idle => Err(PaperdollError::session(
                "cannot start detection before the model is loading",
            )),
            SessionState::ModelLoading => {
                self.start_when_ready = true;
                self.reset_recording();
                Ok(())
            }
            SessionState::Detecting => Ok(()),
            SessionState::Ready | SessionState::Paused | SessionState::ViewingReplay => {
                self.reset_recording();
                self.transition(SessionState::Detecting);
                Ok(())
            }
        }
    }

    /// Stop detection. Moves to replay when anything was recorded, otherwise pauses.
    pub fn stop_detecting(&mut self) -> PaperdollResult<()> {
        match self.state {
            SessionState::TornDown => Err(torn_down()),
            SessionState::ModelLoading => {
                self.start_when_ready = false;
                Ok(())
            }
            SessionState::Detecting => {
                self.abandon_in_flight();
                let next = if self.recording.is_empty() {
                    SessionState::Paused
                } else {
                    SessionState::ViewingReplay
                };
                self.transition(next);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Flip capture visibility; detection is unaffected. Returns the new visibility.
    pub fn toggle_capture_visibility(&mut self) -> bool {
        self.capture_visible = !self.capture_visible;
        tracing::debug!(visible = self.capture_visible, "capture visibility toggled");
        self.capture_visible
    }

    /// Advance the session by one host frame.
    pub fn tick(&mut self, now_secs: f64) -> TickEvent {
        match self.state {
            SessionState::ModelLoading => self.poll_model(),
            SessionState::Detecting => self.poll_detection(now_secs),
            _ => TickEvent::Idle,
        }
    }

    /// Cancel everything outstanding and release the estimator. Idempotent.
    pub fn teardown(&mut self) {
        if self.state == SessionState::TornDown {
            return;
        }
        self.model_init = None;
        self.abandon_in_flight();
        self.estimator.dispose();
        self.current = LandmarkSet::empty();
        self.reset_recording();
        self.start_when_ready = false;
        self.transition(SessionState::TornDown);
    }

    fn poll_model(&mut self) -> TickEvent {
        let Some(init) = self.model_init.as_mut() else {
            self.transition(SessionState::Idle);
            return TickEvent::ModelFailed;
        };
        match poll_once(init) {
            Poll::Pending => TickEvent::ModelPending,
            Poll::Ready(Ok(())) => {
                self.model_init = None;
                let autostart = self.mode == ViewMode::Overlay || self.start_when_ready;
                self.start_when_ready = false;
                if autostart {
                    self.transition(SessionState::Detecting);
                } else {
                    self.transition(SessionState::Ready);
                }
                TickEvent::ModelReady
            }
            Poll::Ready(Err(e)) => {
                self.model_init = None;
                self.start_when_ready = false;
                tracing::error!("pose model failed to load: {e}");
                self.transition(SessionState::Idle);
                TickEvent::ModelFailed
            }
        }
    }

    fn poll_detection(&mut self, now_secs: f64) -> TickEvent {
        if self.in_flight.is_none() {
            let Some(frame) = self.usable_frame() else {
                return TickEvent::CaptureNotReady;
            };
            self.in_flight = Some(self.estimator.estimate(&frame));
        }
        let Some(estimate) = self.in_flight.as_mut() else {
            return TickEvent::EstimatePending;
        };

        match poll_once(estimate) {
            Poll::Pending => TickEvent::EstimatePending,
            Poll::Ready(result) => {
                self.in_flight = None;
                self.accept(result, now_secs)
            }
        }
    }

    fn usable_frame(&mut self) -> Option<CaptureFrame> {
        if !self.capture.is_ready() {
            return None;
        }
        let frame = self.capture.current_frame()?;
        if !frame.is_valid() {
            tracing::debug!(
                width = frame.width,
                height = frame.height,
                "skipping invalid capture frame"
            );
            return None;
        }
        self.note_capture_size(Canvas {
            width: frame.width,
            height: frame.height,
        });
        Some(frame)
    }

    // Rescale and mirroring use `config.capture`; a feed of another size is still estimated.
    fn note_capture_size(&mut self, size: Canvas) {
        if size == self.config.capture || self.mismatched_capture == Some(size) {
            return;
        }
        self.mismatched_capture = Some(size);
        tracing::warn!(
            feed_width = size.width,
            feed_height = size.height,
            capture_width = self.config.capture.width,
            capture_height = self.config.capture.height,
            "capture feed size differs from the configured capture canvas"
        );
    }

    fn accept(&mut self, result: PaperdollResult<LandmarkSet>, now_secs: f64) -> TickEvent {
        let set = match result {
            Ok(set) => set,
            Err(e) => {
                self.stats.estimates_failed += 1;
                tracing::warn!("pose estimation failed: {e}");
                return TickEvent::EstimateFailed;
            }
        };
        if set.is_empty() {
            self.stats.estimates_empty += 1;
            return TickEvent::NoPose;
        }

        let set = if self.config.mirror_capture {
            set.mirrored_x(f64::from(self.config.capture.width))
        } else {
            set
        };

        if self.mode == ViewMode::Record {
            let origin = *self.recording_origin_secs.get_or_insert(now_secs);
            let factor = self.config.capture.scale_to(self.config.render);
            self.recording.push(PoseFrame {
                captured_at_secs: (now_secs - origin).max(0.0),
                landmarks: set.scaled(factor),
            });
        }

        self.current = set;
        self.stats.estimates_ok += 1;
        TickEvent::Landmarks
    }

    fn abandon_in_flight(&mut self) {
        if self.in_flight.take().is_some() {
            self.stats.estimates_abandoned += 1;
            tracing::debug!("in-flight estimate abandoned");
        }
    }

    fn reset_recording(&mut self) {
        self.recording.clear();
        self.recording_origin_secs = None;
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::info!(from = ?self.state, to = ?next, "pose session state change");
            self.state = next;
        }
    }
}

impl<E: PoseEstimator, C: CaptureSource> Drop for PoseSession<E, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn torn_down() -> PaperdollError {
    PaperdollError::session("session has been torn down")
}

fn poll_once<T>(fut: &mut Pin<Box<dyn Future<Output = T>>>) -> Poll<T> {
    let mut cx = Context::from_waker(Waker::noop());
    fut.as_mut().poll(&mut cx)
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;
