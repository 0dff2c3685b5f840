use crate::foundation::error::{PaperdollError, PaperdollResult};

pub use kurbo::{Affine, Point, Vec2};

/// Pixel dimensions of a surface: the render canvas or the capture feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> PaperdollResult<Self> {
        if width == 0 || height == 0 {
            return Err(PaperdollError::config("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Per-axis factor mapping coordinates in `self` onto `target`.
    pub fn scale_to(self, target: Canvas) -> Vec2 {
        fn ratio(to: u32, from: u32) -> f64 {
            if from == 0 {
                return 1.0;
            }
            f64::from(to) / f64::from(from)
        }

        Vec2::new(
            ratio(target.width, self.width),
            ratio(target.height, self.height),
        )
    }
}

/// Slack, in frames, absorbed by [`Fps::secs_to_frames_floor`].
pub const FRAME_BOUNDARY_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> PaperdollResult<Self> {
        if den == 0 {
            return Err(PaperdollError::config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PaperdollError::config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Whole frames elapsed after `secs`. Times within [`FRAME_BOUNDARY_EPSILON`] frames below a
    /// boundary count as on it, so sampling at `frames_to_secs(k)` always yields `k`.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        if !secs.is_finite() {
            return 0;
        }
        (secs * self.as_f64() + FRAME_BOUNDARY_EPSILON)
            .floor()
            .max(0.0) as u64
    }
}

/// Straight (non-premultiplied) RGBA8 colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
