//! Canonical 17-point body landmark model.

use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{PaperdollError, PaperdollResult};

/// Confidence a landmark must reach before anything is drawn from it.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Tracked body points, in the index order produced by the pose model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "usize", into = "usize")]
#[repr(usize)]
pub enum LandmarkId {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl LandmarkId {
    pub const COUNT: usize = 17;

    pub const ALL: [LandmarkId; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name as emitted by the pose model (`leftShoulder`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "leftEye",
            Self::RightEye => "rightEye",
            Self::LeftEar => "leftEar",
            Self::RightEar => "rightEar",
            Self::LeftShoulder => "leftShoulder",
            Self::RightShoulder => "rightShoulder",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftWrist => "leftWrist",
            Self::RightWrist => "rightWrist",
            Self::LeftHip => "leftHip",
            Self::RightHip => "rightHip",
            Self::LeftKnee => "leftKnee",
            Self::RightKnee => "rightKnee",
            Self::LeftAnkle => "leftAnkle",
            Self::RightAnkle => "rightAnkle",
        }
    }
}

impl TryFrom<usize> for LandmarkId {
    type Error = PaperdollError;

    fn try_from(index: usize) -> PaperdollResult<Self> {
        Self::from_index(index).ok_or_else(|| {
            PaperdollError::config(format!(
                "landmark index {index} is out of range (0..{})",
                Self::COUNT
            ))
        })
    }
}

impl From<LandmarkId> for usize {
    fn from(id: LandmarkId) -> usize {
        id.index()
    }
}

/// Bones drawn by the debug skeleton overlay.
pub const SKELETON_EDGES: [(LandmarkId, LandmarkId); 12] = [
    (LandmarkId::LeftShoulder, LandmarkId::RightShoulder),
    (LandmarkId::LeftHip, LandmarkId::RightHip),
    (LandmarkId::LeftShoulder, LandmarkId::LeftElbow),
    (LandmarkId::LeftElbow, LandmarkId::LeftWrist),
    (LandmarkId::RightShoulder, LandmarkId::RightElbow),
    (LandmarkId::RightElbow, LandmarkId::RightWrist),
    (LandmarkId::LeftHip, LandmarkId::LeftKnee),
    (LandmarkId::LeftKnee, LandmarkId::LeftAnkle),
    (LandmarkId::RightHip, LandmarkId::RightKnee),
    (LandmarkId::RightKnee, LandmarkId::RightAnkle),
    (LandmarkId::LeftShoulder, LandmarkId::LeftHip),
    (LandmarkId::RightShoulder, LandmarkId::RightHip),
];

/// One estimated keypoint. `score` is accepted as an alias for `confidence`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(alias = "score")]
    pub confidence: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Passes the confidence gate with finite coordinates.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold && self.x.is_finite() && self.y.is_finite()
    }
}

/// Fixed-length pose: one optional landmark per [`LandmarkId`].
///
/// Serialized as a JSON array of at most 17 entries (`null` for absent points); shorter arrays
/// are padded with absent points.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<Option<Landmark>>", into = "Vec<Option<Landmark>>")]
pub struct LandmarkSet {
    points: [Option<Landmark>; LandmarkId::COUNT],
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl LandmarkSet {
    pub fn empty() -> Self {
        Self {
            points: [None; LandmarkId::COUNT],
        }
    }

    /// Build from the model's keypoint list, in index order.
    pub fn from_points(points: Vec<Option<Landmark>>) -> PaperdollResult<Self> {
        if points.len() > LandmarkId::COUNT {
            return Err(PaperdollError::serde(format!(
                "landmark set has {} points, expected at most {}",
                points.len(),
                LandmarkId::COUNT
            )));
        }
        let mut out = Self::empty();
        for (slot, p) in out.points.iter_mut().zip(points) {
            *slot = p;
        }
        Ok(out)
    }

    pub fn with(mut self, id: LandmarkId, landmark: Landmark) -> Self {
        self.set(id, Some(landmark));
        self
    }

    pub fn set(&mut self, id: LandmarkId, landmark: Option<Landmark>) {
        self.points[id.index()] = landmark;
    }

    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.points[id.index()].as_ref()
    }

    /// Position of `id` if present and confident, `None` otherwise.
    pub fn confident(&self, id: LandmarkId, threshold: f64) -> Option<Point> {
        self.get(id)
            .filter(|lm| lm.is_confident(threshold))
            .map(Landmark::position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, &Landmark)> {
        LandmarkId::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(id, p)| p.as_ref().map(|lm| (*id, lm)))
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    /// Per-axis rescale; confidence is untouched.
    pub fn scaled(&self, factor: Vec2) -> Self {
        let mut out = self.clone();
        for lm in out.points.iter_mut().flatten() {
            lm.x *= factor.x;
            lm.y *= factor.y;
        }
        out
    }

    /// Mirror horizontally about a surface of width `width`.
    pub fn mirrored_x(&self, width: f64) -> Self {
        let mut out = self.clone();
        for lm in out.points.iter_mut().flatten() {
            lm.x = width - lm.x;
        }
        out
    }
}

impl TryFrom<Vec<Option<Landmark>>> for LandmarkSet {
    type Error = PaperdollError;

    fn try_from(points: Vec<Option<Landmark>>) -> PaperdollResult<Self> {
        Self::from_points(points)
    }
}

impl From<LandmarkSet> for Vec<Option<Landmark>> {
    fn from(set: LandmarkSet) -> Self {
        set.points.to_vec()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pose/landmark.rs"]
mod tests;
