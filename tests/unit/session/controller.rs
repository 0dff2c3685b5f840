use super::*;
use crate::foundation::core::Canvas;
use crate::pose::landmark::{Landmark, LandmarkId};
use crate::session::collaborators::StillCapture;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Default)]
struct Script {
    init_ready: bool,
    init_error: bool,
    hold_estimates: bool,
    results: VecDeque<PaperdollResult<LandmarkSet>>,
    estimate_calls: usize,
    dispose_calls: usize,
}

/// Estimator whose futures resolve only when the test says so.
#[derive(Clone, Default)]
struct Gated(Rc<RefCell<Script>>);

impl Gated {
    fn ready() -> Self {
        let g = Self::default();
        g.0.borrow_mut().init_ready = true;
        g
    }

    fn push(&self, set: LandmarkSet) {
        self.0.borrow_mut().results.push_back(Ok(set));
    }

    fn push_err(&self) {
        self.0
            .borrow_mut()
            .results
            .push_back(Err(PaperdollError::estimation("model threw")));
    }
}

impl PoseEstimator for Gated {
    fn initialize(&mut self) -> ModelFuture {
        let script = Rc::clone(&self.0);
        Box::pin(std::future::poll_fn(move |_| {
            let s = script.borrow();
            match (s.init_ready, s.init_error) {
                (false, _) => Poll::Pending,
                (true, false) => Poll::Ready(Ok(())),
                (true, true) => Poll::Ready(Err(PaperdollError::estimation("no weights"))),
            }
        }))
    }

    fn estimate(&mut self, _frame: &CaptureFrame) -> EstimateFuture {
        self.0.borrow_mut().estimate_calls += 1;
        let script = Rc::clone(&self.0);
        Box::pin(std::future::poll_fn(move |_| {
            let mut s = script.borrow_mut();
            if s.hold_estimates {
                return Poll::Pending;
            }
            Poll::Ready(
                s.results
                    .pop_front()
                    .unwrap_or_else(|| Ok(LandmarkSet::empty())),
            )
        }))
    }

    fn dispose(&mut self) {
        self.0.borrow_mut().dispose_calls += 1;
    }
}

struct Feed {
    ready: bool,
    inner: StillCapture,
}

impl CaptureSource for Feed {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn dimensions(&self) -> Canvas {
        self.inner.dimensions()
    }

    fn current_frame(&mut self) -> Option<CaptureFrame> {
        self.inner.current_frame()
    }
}

fn feed() -> Feed {
    Feed {
        ready: true,
        inner: StillCapture::new(Canvas::new(320, 240).unwrap()),
    }
}

fn pose(x: f64) -> LandmarkSet {
    LandmarkSet::empty()
        .with(LandmarkId::LeftShoulder, Landmark::new(x, 40.0, 0.9))
        .with(LandmarkId::LeftElbow, Landmark::new(x, 80.0, 0.9))
}

fn session(est: &Gated, mode: ViewMode) -> PoseSession<Gated, Feed> {
    PoseSession::new(est.clone(), feed(), OverlayConfig::default(), mode).unwrap()
}

fn loaded(est: &Gated, mode: ViewMode) -> PoseSession<Gated, Feed> {
    let mut s = session(est, mode);
    s.load_model().unwrap();
    assert_eq!(s.tick(0.0), TickEvent::ModelReady);
    s
}

#[test]
fn overlay_mode_detects_as_soon_as_the_model_is_ready() {
    let est = Gated::default();
    let mut s = session(&est, ViewMode::Overlay);
    assert_eq!(s.state(), SessionState::Idle);
    assert_eq!(s.tick(0.0), TickEvent::Idle);

    s.load_model().unwrap();
    assert_eq!(s.state(), SessionState::ModelLoading);
    assert_eq!(s.tick(0.0), TickEvent::ModelPending);
    assert_eq!(est.0.borrow().estimate_calls, 0);

    est.0.borrow_mut().init_ready = true;
    assert_eq!(s.tick(0.1), TickEvent::ModelReady);
    assert_eq!(s.state(), SessionState::Detecting);

    est.push(pose(10.0));
    assert_eq!(s.tick(0.2), TickEvent::Landmarks);
    assert_eq!(s.current_landmarks(), &pose(10.0));
    assert!(s.recording().is_empty());
}

#[test]
fn record_mode_waits_for_start() {
    let est = Gated::ready();
    let mut s = loaded(&est, ViewMode::Record);
    assert_eq!(s.state(), SessionState::Ready);
    assert_eq!(s.tick(0.1), TickEvent::Idle);
    assert_eq!(est.0.borrow().estimate_calls, 0);

    s.start_detecting().unwrap();
    assert_eq!(s.state(), SessionState::Detecting);
}

#[test]
fn start_during_model_load_is_honoured_when_ready() {
    let est = Gated::default();
    let mut s = session(&est, ViewMode::Record);
    assert!(s.start_detecting().is_err());

    s.load_model().unwrap();
    s.start_detecting().unwrap();
    assert_eq!(s.state(), SessionState::ModelLoading);
    est.0.borrow_mut().init_ready = true;
    s.tick(0.0);
    assert_eq!(s.state(), SessionState::Detecting);
}

#[test]
fn model_failure_never_starts_the_loop() {
    let est = Gated::default();
    {
        let mut script = est.0.borrow_mut();
        script.init_ready = true;
        script.init_error = true;
    }
    let mut s = session(&est, ViewMode::Overlay);
    s.load_model().unwrap();
    assert_eq!(s.tick(0.0), TickEvent::ModelFailed);
    assert_eq!(s.state(), SessionState::Idle);
    assert_eq!(s.tick(0.1), TickEvent::Idle);
    assert_eq!(est.0.borrow().estimate_calls, 0);
}

#[test]
fn at_most_one_estimate_in_flight() {
    let est = Gated::ready();
    est.0.borrow_mut().hold_estimates = true;
    let mut s = loaded(&est, ViewMode::Overlay);

    for i in 0..5 {
        assert_eq!(s.tick(f64::from(i) * 0.016), TickEvent::EstimatePending);
    }
    assert_eq!(est.0.borrow().estimate_calls, 1);
    assert!(s.is_estimate_in_flight());

    est.push(pose(1.0));
    est.0.borrow_mut().hold_estimates = false;
    assert_eq!(s.tick(0.1), TickEvent::Landmarks);
    assert!(!s.is_estimate_in_flight());

    est.push(pose(2.0));
    assert_eq!(s.tick(0.2), TickEvent::Landmarks);
    assert_eq!(est.0.borrow().estimate_calls, 2);
}

#[test]
fn capture_not_ready_skips_estimation_and_retries() {
    let est = Gated::ready();
    let mut s = loaded(&est, ViewMode::Overlay);
    s.capture.ready = false;
    assert_eq!(s.tick(0.1), TickEvent::CaptureNotReady);
    assert_eq!(est.0.borrow().estimate_calls, 0);

    s.capture.ready = true;
    est.push(pose(3.0));
    assert_eq!(s.tick(0.2), TickEvent::Landmarks);
}

#[test]
fn feed_size_is_checked_against_the_configured_capture() {
    let est = Gated::ready();
    let matching = loaded(&est, ViewMode::Overlay);
    assert_eq!(matching.mismatched_capture, None);

    let small = Canvas::new(160, 120).unwrap();
    let feed = Feed {
        ready: true,
        inner: StillCapture::new(small),
    };
    let mut s = PoseSession::new(est.clone(), feed, OverlayConfig::default(), ViewMode::Overlay)
        .unwrap();
    s.load_model().unwrap();
    assert_eq!(s.mismatched_capture, Some(small));

    // Detection still runs on the odd-sized feed.
    assert_eq!(s.tick(0.0), TickEvent::ModelReady);
    est.push(pose(3.0));
    assert_eq!(s.tick(0.1), TickEvent::Landmarks);
    assert_eq!(s.mismatched_capture, Some(small));
}

#[test]
fn estimation_errors_keep_the_loop_running() {
    let est = Gated::ready();
    let mut s = loaded(&est, ViewMode::Overlay);
    est.push_err();
    est.push(pose(4.0));

    assert_eq!(s.tick(0.1), TickEvent::EstimateFailed);
    assert_eq!(s.state(), SessionState::Detecting);
    assert_eq!(s.tick(0.2), TickEvent::Landmarks);
    assert_eq!(s.stats().estimates_failed, 1);
    assert_eq!(s.stats().estimates_ok, 1);
}

#[test]
fn empty_estimates_keep_previous_landmarks() {
    let est = Gated::ready();
    let mut s = loaded(&est, ViewMode::Record);
    s.start_detecting().unwrap();
    est.push(pose(5.0));
    s.tick(0.1);
    assert_eq!(s.tick(0.2), TickEvent::NoPose);
    assert_eq!(s.current_landmarks(), &pose(5.0));
    assert_eq!(s.recording().len(), 1);
    assert_eq!(s.stats().estimates_empty, 1);
}

#[test]
fn recording_is_stored_in_render_coordinates_and_replays() {
    let est = Gated::ready();
    let mut s = loaded(&est, ViewMode::Record);
    s.start_detecting().unwrap();
    for i in 0..3 {
        est.push(pose(10.0 * f64::from(i + 1)));
        assert_eq!(s.tick(1.0 + f64::from(i) * 0.5), TickEvent::Landmarks);
    }

    let rec = s.recording();
    assert_eq!(rec.len(), 3);
    // 320x240 capture onto the 640x480 render surface.
    let first = rec.get(0).unwrap();
    assert_eq!(first.captured_at_secs, 0.0);
    assert_eq!(first.landmarks.get(LandmarkId::LeftShoulder).unwrap().x, 20.0);
    assert_eq!(first.landmarks.get(LandmarkId::LeftElbow).unwrap().y, 160.0);
    assert_eq!(rec.get(2).unwrap().captured_at_secs, 1.0);
    // Live landmarks stay in capture coordinates.
    assert_eq!(s.current_landmarks(), &pose(30.0));

    s.stop_detecting().unwrap();
    assert_eq!(s.state(), SessionState::ViewingReplay);
    assert!(matches!(
        s.frame_source(5.0),
        FrameSource::Replay { recording, .. } if recording.len() == 3
    ));
}

#[test]
fn stop_without_frames_pauses_and_restart_clears_recording() {
    let est = Gated::ready();
    let mut s = loaded(&est, ViewMode::Record);
    s.start_detecting().unwrap();
    s.stop_detecting().unwrap();
    assert_eq!(s.state(), SessionState::Paused);
    assert!(matches!(s.frame_source(0.0), FrameSource::Live(_)));

    s.start_detecting().unwrap();
    est.push(pose(1.0));
    s.tick(0.1);
    s.stop_detecting().unwrap();
    assert_eq!(s.state(), SessionState::ViewingReplay);

    s.start_detecting().unwrap();
    assert!(s.recording().is_empty());
    assert_eq!(s.state(), SessionState::Detecting);
}

#[test]
fn stop_abandons_the_in_flight_estimate() {
    let est = Gated::ready();
    est.0.borrow_mut().hold_estimates = true;
    let mut s = loaded(&est, ViewMode::Record);
    s.start_detecting().unwrap();
    assert_eq!(s.tick(0.1), TickEvent::EstimatePending);

    s.stop_detecting().unwrap();
    assert_eq!(s.stats().estimates_abandoned, 1);
    assert!(!s.is_estimate_in_flight());

    est.0.borrow_mut().hold_estimates = false;
    assert_eq!(s.tick(0.2), TickEvent::Idle);
    assert!(s.recording().is_empty());

    est.push(pose(7.0));
    s.start_detecting().unwrap();
    assert_eq!(s.tick(0.3), TickEvent::Landmarks);
    assert_eq!(est.0.borrow().estimate_calls, 2);
    assert_eq!(s.current_landmarks(), &pose(7.0));
    assert_eq!(s.recording().len(), 1);
}

#[test]
fn mirroring_flips_about_the_capture_width() {
    let est = Gated::ready();
    let config = OverlayConfig {
        mirror_capture: true,
        ..OverlayConfig::default()
    };
    let mut s = PoseSession::new(est.clone(), feed(), config, ViewMode::Overlay).unwrap();
    s.load_model().unwrap();
    s.tick(0.0);
    est.push(pose(20.0));
    s.tick(0.1);
    assert_eq!(
        s.current_landmarks()
            .get(LandmarkId::LeftShoulder)
            .unwrap()
            .x,
        300.0
    );
}

#[test]
fn toggling_capture_visibility_does_not_interrupt_detection() {
    let est = Gated::ready();
    let mut s = loaded(&est, ViewMode::Overlay);
    assert!(s.capture_visible());
    assert!(!s.toggle_capture_visibility());
    assert_eq!(s.state(), SessionState::Detecting);
    est.push(pose(1.0));
    assert_eq!(s.tick(0.1), TickEvent::Landmarks);
    assert!(s.toggle_capture_visibility());
}

#[test]
fn teardown_is_idempotent_and_final() {
    let est = Gated::ready();
    est.0.borrow_mut().hold_estimates = true;
    let mut s = loaded(&est, ViewMode::Overlay);
    s.tick(0.1);

    s.teardown();
    s.teardown();
    assert_eq!(s.state(), SessionState::TornDown);
    assert_eq!(est.0.borrow().dispose_calls, 1);
    assert_eq!(s.stats().estimates_abandoned, 1);

    est.0.borrow_mut().hold_estimates = false;
    assert_eq!(s.tick(0.2), TickEvent::Idle);
    assert_eq!(est.0.borrow().estimate_calls, 1);
    assert!(s.start_detecting().is_err());
    assert!(s.load_model().is_err());
    assert!(s.current_landmarks().is_empty());
}

#[test]
fn teardown_during_model_load_cancels_it() {
    let est = Gated::default();
    let mut s = session(&est, ViewMode::Overlay);
    s.load_model().unwrap();
    s.teardown();
    est.0.borrow_mut().init_ready = true;
    assert_eq!(s.tick(0.0), TickEvent::Idle);
    assert_eq!(s.state(), SessionState::TornDown);
}

#[test]
fn dropping_the_session_disposes_the_estimator() {
    let est = Gated::ready();
    {
        let _s = loaded(&est, ViewMode::Overlay);
    }
    assert_eq!(est.0.borrow().dispose_calls, 1);
}
