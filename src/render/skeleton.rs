use crate::foundation::core::Rgba8;
use crate::pose::landmark::{LandmarkSet, SKELETON_EDGES};
use crate::render::surface::RenderSurface;

/// Debug overlay colors and sizes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SkeletonStyle {
    pub edge_color: Rgba8,
    pub edge_width: f64,
    pub point_color: Rgba8,
    pub point_radius: f64,
}

impl Default for SkeletonStyle {
    fn default() -> Self {
        Self {
            edge_color: Rgba8::opaque(0, 255, 0),
            edge_width: 2.0,
            point_color: Rgba8::opaque(255, 0, 0),
            point_radius: 5.0,
        }
    }
}

/// What the overlay actually put on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkeletonStats {
    pub edges: usize,
    pub points: usize,
}

/// Stroke every skeleton edge whose endpoints are both confident, then dot every confident
/// landmark on top. Individual draw failures are logged and skipped.
pub fn draw_skeleton<S: RenderSurface + ?Sized>(
    surface: &mut S,
    landmarks: &LandmarkSet,
    threshold: f64,
    style: &SkeletonStyle,
) -> SkeletonStats {
    let mut stats = SkeletonStats::default();

    for (a, b) in SKELETON_EDGES {
        let (Some(from), Some(to)) = (
            landmarks.confident(a, threshold),
            landmarks.confident(b, threshold),
        ) else {
            continue;
        };
        match surface.stroke_line(from, to, style.edge_color, style.edge_width) {
            Ok(()) => stats.edges += 1,
            Err(e) => tracing::debug!(from = a.name(), to = b.name(), "skeleton edge skipped: {e}"),
        }
    }

    for (id, landmark) in landmarks.iter() {
        if !landmark.is_confident(threshold) {
            continue;
        }
        match surface.fill_circle(landmark.position(), style.point_radius, style.point_color) {
            Ok(()) => stats.points += 1,
            Err(e) => tracing::debug!(landmark = id.name(), "skeleton point skipped: {e}"),
        }
    }

    stats
}

#[cfg(test)]
#[path = "../../tests/unit/render/skeleton.rs"]
mod tests;
