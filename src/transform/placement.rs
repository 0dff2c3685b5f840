use std::f64::consts::{FRAC_PI_2, PI};

use kurbo::Size;

use crate::foundation::core::{Affine, Point, Vec2};

/// Default magnification applied to head drawings. Sketched heads carry a wide margin around
/// the face, so the ear-to-ear distance only spans part of the drawing.
pub const DEFAULT_HEAD_MAGNIFICATION: f64 = 2.5;

/// Placement of a drawing relative to landmarks.
///
/// Applied as translate, then rotate about the translated origin, then uniform scale, then the
/// drawing is blitted with its top-left corner at `offset` (asset pixels).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub translate: Vec2,
    pub rotate: f64,
    pub scale: f64,
    pub offset: Vec2,
}

impl Placement {
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translate)
            * Affine::rotate(self.rotate)
            * Affine::scale(self.scale)
            * Affine::translate(self.offset)
    }
}

/// Which intrinsic dimension of the drawing runs along the bone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentAxis {
    /// Drawn left to right (arms): scale by width, no rotation offset, left-centre on the pivot.
    Horizontal,
    /// Drawn top to bottom (legs): scale by height, rotated by -90°, top-centre on the pivot.
    Vertical,
}

/// Pivot `from`, aim at `to`, stretch the drawing to the segment length.
///
/// A zero-length segment yields scale 0 and rotation 0.
pub fn segment_placement(from: Point, to: Point, asset: Size, axis: SegmentAxis) -> Placement {
    let delta = to - from;
    let angle = delta.y.atan2(delta.x);
    let length = delta.hypot();

    let (rotate, extent, offset) = match axis {
        SegmentAxis::Horizontal => (angle, asset.width, Vec2::new(0.0, -asset.height / 2.0)),
        SegmentAxis::Vertical => (
            angle - FRAC_PI_2,
            asset.height,
            Vec2::new(-asset.width / 2.0, 0.0),
        ),
    };

    Placement {
        translate: from.to_vec2(),
        rotate,
        scale: length / extent.max(1.0),
        offset,
    }
}

/// Centre the head between the ears, rotated along the ear line.
pub fn head_placement(left_ear: Point, right_ear: Point, asset: Size, magnification: f64) -> Placement {
    let delta = right_ear - left_ear;
    Placement {
        translate: left_ear.midpoint(right_ear).to_vec2(),
        rotate: delta.y.atan2(delta.x),
        scale: delta.hypot() / asset.width.max(1.0) * magnification,
        offset: Vec2::new(-asset.width / 2.0, -asset.height / 2.0),
    }
}

/// Hang a hand off the wrist, pointing away from the elbow, at intrinsic size.
///
/// Mirrored hands are turned around and hang by their right edge.
pub fn anchored_placement(wrist: Point, elbow: Point, asset: Size, mirrored: bool) -> Placement {
    let delta = wrist - elbow;
    let angle = delta.y.atan2(delta.x);
    let (rotate, offset) = if mirrored {
        (angle + PI, Vec2::new(-asset.width, -asset.height / 2.0))
    } else {
        (angle, Vec2::new(0.0, -asset.height / 2.0))
    };
    Placement {
        translate: wrist.to_vec2(),
        rotate,
        scale: 1.0,
        offset,
    }
}

/// Centre the drawing on a single landmark at intrinsic size.
pub fn point_placement(center: Point, asset: Size) -> Placement {
    Placement {
        translate: center.to_vec2(),
        rotate: 0.0,
        scale: 1.0,
        offset: Vec2::new(-asset.width / 2.0, -asset.height / 2.0),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/placement.rs"]
mod tests;
