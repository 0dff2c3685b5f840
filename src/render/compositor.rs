//! Per-frame compositing of body-part drawings onto a landmark set.
//!
//! A frame is: clear, pick the landmark source (live or replay), optionally draw the debug
//! skeleton, then place every mapped drawing in table order. Nothing in here fails a frame;
//! parts that cannot be placed are reported in [`FrameReport`] and logged.

use std::borrow::Cow;
use std::sync::Arc;

use kurbo::Size;

use crate::assets::cache::{AssetSnapshot, VectorAssetCache};
use crate::assets::decode::{VectorAsset, VectorAssetSet};
use crate::config::OverlayConfig;
use crate::foundation::core::{Affine, Canvas, Point};
use crate::foundation::error::PaperdollResult;
use crate::pose::landmark::{LandmarkId, LandmarkSet};
use crate::pose::mapping::{PartMapping, PartMappingTable};
use crate::pose::recording::{PoseRecording, ReplayClock};
use crate::render::skeleton::{SkeletonStats, draw_skeleton};
use crate::render::surface::RenderSurface;
use crate::transform::affine::affine_from_three_points;
use crate::transform::placement::{
    SegmentAxis, anchored_placement, head_placement, point_placement, segment_placement,
};

/// Where the landmarks for a frame come from.
#[derive(Clone, Copy, Debug)]
pub enum FrameSource<'a> {
    /// Latest estimate in capture coordinates; rescaled to `OverlayConfig::render` before use,
    /// whatever the surface size.
    Live(&'a LandmarkSet),
    /// Recorded frames, already in render coordinates, played back at the configured rate.
    Replay {
        recording: &'a PoseRecording,
        now_secs: f64,
    },
}

/// Why a part was not drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A drawing exists but no mapping names the part.
    NoMapping,
    /// The part's vector source failed to decode.
    AssetUnavailable,
    /// A required landmark is absent or below the threshold.
    LowConfidence(LandmarkId),
    /// The landmarks admit no usable transform (collinear quad corners).
    DegenerateTransform,
    /// The surface rejected the draw.
    DrawFailed,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Recording index shown, for replay frames.
    pub replay_index: Option<usize>,
    /// Parts drawn, in draw order.
    pub drawn: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    pub skeleton: Option<SkeletonStats>,
}

impl FrameReport {
    pub fn was_drawn(&self, part: &str) -> bool {
        self.drawn.iter().any(|p| p == part)
    }

    pub fn skip_reason(&self, part: &str) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(p, _)| p == part)
            .map(|(_, reason)| *reason)
    }
}

/// Owns the mapping table, the decoded drawings and the replay clock.
#[derive(Debug)]
pub struct Compositor {
    config: OverlayConfig,
    mapping: PartMappingTable,
    assets: VectorAssetCache,
    replay_clock: ReplayClock,
    // Last surface size reported as differing from `config.render`.
    mismatched_surface: Option<Canvas>,
}

impl Compositor {
    pub fn new(config: OverlayConfig, mapping: PartMappingTable) -> PaperdollResult<Self> {
        config.validate()?;
        let replay_clock = ReplayClock::new(config.replay_fps);
        Ok(Self {
            config,
            mapping,
            assets: VectorAssetCache::new(),
            replay_clock,
            mismatched_surface: None,
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn mapping(&self) -> &PartMappingTable {
        &self.mapping
    }

    pub fn set_debug_skeleton(&mut self, enabled: bool) {
        self.config.debug_skeleton = enabled;
    }

    /// Decode and install a new drawing set, reusing memoized decodes.
    pub fn set_assets(&mut self, set: &VectorAssetSet) -> Arc<AssetSnapshot> {
        self.assets.update(set)
    }

    /// Direct access for hosts that defer decoding (`begin`/`commit`).
    pub fn assets_mut(&mut self) -> &mut VectorAssetCache {
        &mut self.assets
    }

    pub fn assets(&self) -> &VectorAssetCache {
        &self.assets
    }

    /// Restart replay at frame 0 on the next replay render.
    pub fn reset_replay(&mut self) {
        self.replay_clock.reset();
    }

    fn note_surface_size(&mut self, size: Canvas) {
        if size == self.config.render || self.mismatched_surface == Some(size) {
            return;
        }
        self.mismatched_surface = Some(size);
        tracing::warn!(
            surface_width = size.width,
            surface_height = size.height,
            render_width = self.config.render.width,
            render_height = self.config.render.height,
            "surface size differs from the configured render canvas; landmarks stay in render coordinates"
        );
    }

    #[tracing::instrument(skip_all, fields(replay = matches!(source, FrameSource::Replay { .. })))]
    pub fn render<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        source: FrameSource<'_>,
    ) -> FrameReport {
        surface.clear();
        self.note_surface_size(surface.size());
        let mut report = FrameReport::default();

        let landmarks: Cow<'_, LandmarkSet> = match source {
            FrameSource::Live(set) => {
                self.replay_clock.reset();
                // Same target as recorded frames, so live and replay share one scale.
                let factor = self.config.capture.scale_to(self.config.render);
                Cow::Owned(set.scaled(factor))
            }
            FrameSource::Replay {
                recording,
                now_secs,
            } => {
                let Some(index) = self.replay_clock.position(now_secs, recording.len()) else {
                    return report;
                };
                let Some(frame) = recording.get(index) else {
                    return report;
                };
                report.replay_index = Some(index);
                Cow::Borrowed(&frame.landmarks)
            }
        };

        let threshold = self.config.confidence_threshold;
        if self.config.debug_skeleton {
            report.skeleton = Some(draw_skeleton(
                surface,
                &landmarks,
                threshold,
                &self.config.skeleton,
            ));
        }

        let snapshot = self.assets.snapshot();
        for (part, mapping) in self.mapping.iter() {
            let Some(asset) = snapshot.get(part) else {
                if snapshot.is_failed(part) {
                    report.skip(part, SkipReason::AssetUnavailable);
                }
                continue;
            };

            let transform = match solve_part(
                mapping,
                &landmarks,
                asset,
                threshold,
                self.config.head_magnification,
            ) {
                Ok(m) => m,
                Err(reason) => {
                    report.skip(part, reason);
                    continue;
                }
            };

            match surface.draw_asset(asset, transform) {
                Ok(()) => report.drawn.push(part.to_string()),
                Err(e) => {
                    tracing::warn!(part, "draw failed: {e}");
                    report.skip(part, SkipReason::DrawFailed);
                }
            }
        }

        let mut unmapped: Vec<&str> = snapshot
            .parts()
            .filter(|part| self.mapping.get(part).is_none())
            .collect();
        unmapped.sort_unstable();
        for part in unmapped {
            report.skip(part, SkipReason::NoMapping);
        }

        report
    }
}

impl FrameReport {
    fn skip(&mut self, part: &str, reason: SkipReason) {
        tracing::debug!(part, ?reason, "part skipped");
        self.skipped.push((part.to_string(), reason));
    }
}

/// Confidence-gate a part, then solve its transform by strategy.
fn solve_part(
    mapping: &PartMapping,
    landmarks: &LandmarkSet,
    asset: &VectorAsset,
    threshold: f64,
    head_magnification: f64,
) -> Result<Affine, SkipReason> {
    let at = |id: LandmarkId| {
        landmarks
            .confident(id, threshold)
            .ok_or(SkipReason::LowConfidence(id))
    };
    for &id in mapping.required().as_slice() {
        at(id)?;
    }

    let size = Size::new(asset.width(), asset.height());
    let transform = match *mapping {
        PartMapping::Quad {
            top_left,
            top_right,
            bottom_left,
            ..
        } => {
            let corners = [
                Point::ORIGIN,
                Point::new(size.width, 0.0),
                Point::new(0.0, size.height),
            ];
            let targets = [at(top_left)?, at(top_right)?, at(bottom_left)?];
            affine_from_three_points(corners, targets).ok_or(SkipReason::DegenerateTransform)?
        }
        PartMapping::Segment { from, to } => {
            segment_placement(at(from)?, at(to)?, size, SegmentAxis::Vertical).to_affine()
        }
        PartMapping::MirroredSegment {
            left_center,
            right_center,
        } => segment_placement(
            at(left_center)?,
            at(right_center)?,
            size,
            SegmentAxis::Horizontal,
        )
        .to_affine(),
        PartMapping::Anchored {
            wrist,
            elbow,
            mirrored,
        } => anchored_placement(at(wrist)?, at(elbow)?, size, mirrored).to_affine(),
        PartMapping::EarAnchored {
            left_anchor,
            right_anchor,
        } => head_placement(at(left_anchor)?, at(right_anchor)?, size, head_magnification)
            .to_affine(),
        PartMapping::PointAnchored { center } => point_placement(at(center)?, size).to_affine(),
    };

    if !transform.is_finite() {
        return Err(SkipReason::DegenerateTransform);
    }
    Ok(transform)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
