//! Paperdoll composites hand-drawn body-part drawings onto human poses.
//!
//! A pose estimator reports 17 body landmarks per frame. Each drawing (torso, head, upper arm,
//! ...) is tied to a few of those landmarks by a [`PartMapping`], and every frame the drawings
//! are placed with an affine transform solved from the landmarks and rasterized onto a
//! [`RenderSurface`].
//!
//! # Pipeline overview
//!
//! 1. **Decode**: [`VectorAssetSet`] (SVG sources per part) `->` [`AssetSnapshot`], memoized by
//!    content in a [`VectorAssetCache`].
//! 2. **Estimate**: [`PoseSession`] drives a [`PoseEstimator`] once per host tick, at most one
//!    request in flight, and records frames while in [`ViewMode::Record`].
//! 3. **Composite**: [`Compositor::render`] gates each part on landmark confidence, solves its
//!    transform and draws it. Replay frames play back at a fixed rate and loop.
//!
//! Per-frame work never fails: parts that cannot be drawn are reported in a [`FrameReport`].
//! Only configuration errors ([`PaperdollError::is_fatal`]) stop the system.
#![forbid(unsafe_code)]

mod assets;
mod config;
mod foundation;
mod pose;
mod render;
mod session;

/// Geometry that turns landmarks into drawing transforms.
pub mod transform;

pub use assets::cache::{AssetSnapshot, DecodeJob, DecodeOutcome, VectorAssetCache};
pub use assets::decode::{VectorAsset, VectorAssetSet, decode_svg};
pub use config::{
    ENV_CONFIDENCE_THRESHOLD, ENV_DEBUG_SKELETON, ENV_HEAD_MAGNIFICATION, OverlayConfig,
};
pub use foundation::core::{Affine, Canvas, FRAME_BOUNDARY_EPSILON, Fps, Point, Rgba8, Vec2};
pub use foundation::error::{PaperdollError, PaperdollResult};
pub use pose::landmark::{
    DEFAULT_CONFIDENCE_THRESHOLD, Landmark, LandmarkId, LandmarkSet, SKELETON_EDGES,
};
pub use pose::mapping::{PartMapping, PartMappingTable, RequiredLandmarks, STANDARD_PART_ORDER};
pub use pose::recording::{PoseFrame, PoseRecording, ReplayClock};
pub use render::compositor::{Compositor, FrameReport, FrameSource, SkipReason};
pub use render::skeleton::{SkeletonStats, SkeletonStyle, draw_skeleton};
pub use render::surface::{FrameRGBA, PixmapSurface, RenderSurface};
pub use session::collaborators::{
    CaptureFrame, CaptureSource, EstimateFuture, ModelFuture, PoseEstimator, ScriptedEstimator,
    StillCapture,
};
pub use session::controller::{PoseSession, SessionState, SessionStats, TickEvent, ViewMode};

/// Names of the standard body parts.
pub mod parts {
    pub use crate::pose::mapping::{
        HEAD, LEFT_FOOT, LEFT_HAND, LEFT_LOWER_ARM, LEFT_LOWER_LEG, LEFT_UPPER_ARM, LEFT_UPPER_LEG,
        RIGHT_FOOT, RIGHT_HAND, RIGHT_LOWER_ARM, RIGHT_LOWER_LEG, RIGHT_UPPER_ARM,
        RIGHT_UPPER_LEG, TORSO,
    };
}
