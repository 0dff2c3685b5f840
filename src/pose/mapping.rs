//! Static body-part to landmark mapping.
//!
//! Each part carries exactly one placement strategy, chosen when the table is loaded. The
//! compositor dispatches on the variant; it never inspects field shapes at draw time.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{PaperdollError, PaperdollResult};
use crate::pose::landmark::LandmarkId;

pub const TORSO: &str = "torso";
pub const HEAD: &str = "head";
pub const LEFT_UPPER_ARM: &str = "leftUpperArm";
pub const LEFT_LOWER_ARM: &str = "leftLowerArm";
pub const LEFT_HAND: &str = "leftHand";
pub const RIGHT_UPPER_ARM: &str = "rightUpperArm";
pub const RIGHT_LOWER_ARM: &str = "rightLowerArm";
pub const RIGHT_HAND: &str = "rightHand";
pub const LEFT_UPPER_LEG: &str = "leftUpperLeg";
pub const LEFT_LOWER_LEG: &str = "leftLowerLeg";
pub const RIGHT_UPPER_LEG: &str = "rightUpperLeg";
pub const RIGHT_LOWER_LEG: &str = "rightLowerLeg";
pub const LEFT_FOOT: &str = "leftFoot";
pub const RIGHT_FOOT: &str = "rightFoot";

/// Draw order of the standard parts (back to front).
pub const STANDARD_PART_ORDER: [&str; 14] = [
    TORSO,
    LEFT_UPPER_LEG,
    LEFT_LOWER_LEG,
    RIGHT_UPPER_LEG,
    RIGHT_LOWER_LEG,
    LEFT_FOOT,
    RIGHT_FOOT,
    LEFT_UPPER_ARM,
    LEFT_LOWER_ARM,
    LEFT_HAND,
    RIGHT_UPPER_ARM,
    RIGHT_LOWER_ARM,
    RIGHT_HAND,
    HEAD,
];

/// Placement strategy for one body part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(
    tag = "strategy",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum PartMapping {
    /// Four-corner region; the drawing's top-left, top-right and bottom-left corners are pinned.
    Quad {
        top_left: LandmarkId,
        top_right: LandmarkId,
        bottom_left: LandmarkId,
        bottom_right: LandmarkId,
    },
    /// Bone pivoted at `from`, drawing authored vertically.
    Segment { from: LandmarkId, to: LandmarkId },
    /// Bone pivoted at `left_center`, drawing authored horizontally.
    MirroredSegment {
        left_center: LandmarkId,
        right_center: LandmarkId,
    },
    /// Drawing anchored at the wrist and oriented away from the elbow.
    Anchored {
        wrist: LandmarkId,
        elbow: LandmarkId,
        #[serde(default)]
        mirrored: bool,
    },
    /// Drawing centred between two anchors (ears).
    EarAnchored {
        left_anchor: LandmarkId,
        right_anchor: LandmarkId,
    },
    /// Drawing centred on a single point.
    PointAnchored { center: LandmarkId },
}

/// Landmarks a strategy needs, without allocating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequiredLandmarks {
    ids: [LandmarkId; 4],
    len: usize,
}

impl RequiredLandmarks {
    fn of(ids: &[LandmarkId]) -> Self {
        let mut out = Self {
            ids: [LandmarkId::Nose; 4],
            len: ids.len(),
        };
        out.ids[..ids.len()].copy_from_slice(ids);
        out
    }

    pub fn as_slice(&self) -> &[LandmarkId] {
        &self.ids[..self.len]
    }
}

impl PartMapping {
    pub fn required(&self) -> RequiredLandmarks {
        match *self {
            Self::Quad {
                top_left,
                top_right,
                bottom_left,
                bottom_right,
            } => RequiredLandmarks::of(&[top_left, top_right, bottom_left, bottom_right]),
            Self::Segment { from, to } => RequiredLandmarks::of(&[from, to]),
            Self::MirroredSegment {
                left_center,
                right_center,
            } => RequiredLandmarks::of(&[left_center, right_center]),
            Self::Anchored { wrist, elbow, .. } => RequiredLandmarks::of(&[wrist, elbow]),
            Self::EarAnchored {
                left_anchor,
                right_anchor,
            } => RequiredLandmarks::of(&[left_anchor, right_anchor]),
            Self::PointAnchored { center } => RequiredLandmarks::of(&[center]),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::Quad { .. } => "quad",
            Self::Segment { .. } => "segment",
            Self::MirroredSegment { .. } => "mirrored_segment",
            Self::Anchored { .. } => "anchored",
            Self::EarAnchored { .. } => "ear_anchored",
            Self::PointAnchored { .. } => "point_anchored",
        }
    }

    /// Reject mappings whose geometry can never be solved (repeated landmarks).
    pub fn validate(&self) -> PaperdollResult<()> {
        let required = self.required();
        let ids = required.as_slice();
        let unique: HashSet<_> = ids.iter().collect();
        if unique.len() != ids.len() {
            return Err(PaperdollError::config(format!(
                "{} mapping references the same landmark twice",
                self.strategy_name()
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct PartEntry {
    part: String,
    #[serde(flatten)]
    mapping: PartMapping,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct TableFile {
    parts: Vec<PartEntry>,
}

/// Ordered, validated part mapping table. Iteration order is draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct PartMappingTable {
    entries: Vec<(String, PartMapping)>,
}

impl PartMappingTable {
    pub fn new(entries: Vec<(String, PartMapping)>) -> PaperdollResult<Self> {
        let mut seen = HashSet::new();
        for (part, mapping) in &entries {
            if part.trim().is_empty() {
                return Err(PaperdollError::config("part name must be non-empty"));
            }
            if !seen.insert(part.as_str()) {
                return Err(PaperdollError::config(format!(
                    "part '{part}' is mapped more than once"
                )));
            }
            mapping
                .validate()
                .map_err(|e| PaperdollError::config(format!("part '{part}': {e}")))?;
        }
        Ok(Self { entries })
    }

    /// Mapping used by the sketch canvases.
    pub fn standard() -> Self {
        use LandmarkId::*;

        let entries = vec![
            (
                TORSO,
                PartMapping::Quad {
                    top_left: RightShoulder,
                    top_right: LeftShoulder,
                    bottom_left: RightHip,
                    bottom_right: LeftHip,
                },
            ),
            (
                LEFT_UPPER_LEG,
                PartMapping::Segment {
                    from: LeftHip,
                    to: LeftKnee,
                },
            ),
            (
                LEFT_LOWER_LEG,
                PartMapping::Segment {
                    from: LeftKnee,
                    to: LeftAnkle,
                },
            ),
            (
                RIGHT_UPPER_LEG,
                PartMapping::Segment {
                    from: RightHip,
                    to: RightKnee,
                },
            ),
            (
                RIGHT_LOWER_LEG,
                PartMapping::Segment {
                    from: RightKnee,
                    to: RightAnkle,
                },
            ),
            (LEFT_FOOT, PartMapping::PointAnchored { center: LeftAnkle }),
            (RIGHT_FOOT, PartMapping::PointAnchored { center: RightAnkle }),
            (
                LEFT_UPPER_ARM,
                PartMapping::MirroredSegment {
                    left_center: LeftShoulder,
                    right_center: LeftElbow,
                },
            ),
            (
                LEFT_LOWER_ARM,
                PartMapping::MirroredSegment {
                    left_center: LeftElbow,
                    right_center: LeftWrist,
                },
            ),
            (
                LEFT_HAND,
                PartMapping::Anchored {
                    wrist: LeftWrist,
                    elbow: LeftElbow,
                    mirrored: false,
                },
            ),
            (
                RIGHT_UPPER_ARM,
                PartMapping::MirroredSegment {
                    left_center: RightElbow,
                    right_center: RightShoulder,
                },
            ),
            (
                RIGHT_LOWER_ARM,
                PartMapping::MirroredSegment {
                    left_center: RightWrist,
                    right_center: RightElbow,
                },
            ),
            (
                RIGHT_HAND,
                PartMapping::Anchored {
                    wrist: RightWrist,
                    elbow: RightElbow,
                    mirrored: true,
                },
            ),
            (
                HEAD,
                PartMapping::EarAnchored {
                    left_anchor: RightEar,
                    right_anchor: LeftEar,
                },
            ),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(part, mapping)| (part.to_string(), mapping))
                .collect(),
        }
    }

    /// Parse the tagged table format: `{"parts": [{"part": "torso", "strategy": "quad", ...}]}`.
    pub fn from_json_str(s: &str) -> PaperdollResult<Self> {
        let file: TableFile = serde_json::from_str(s)
            .map_err(|e| PaperdollError::config(format!("invalid part mapping table: {e}")))?;
        Self::new(
            file.parts
                .into_iter()
                .map(|entry| (entry.part, entry.mapping))
                .collect(),
        )
    }

    /// Parse the sketch app's untagged object (`{"torso": {"topLeft": 6, ...}, ...}`).
    ///
    /// The strategy of each entry is inferred from its field names here, once. Standard parts
    /// keep their standard draw order; any other part follows in name order.
    pub fn from_legacy_json_str(s: &str) -> PaperdollResult<Self> {
        let raw: BTreeMap<String, LegacyEntry> = serde_json::from_str(s)
            .map_err(|e| PaperdollError::config(format!("invalid legacy part mapping: {e}")))?;

        let mut ordered: Vec<(String, LegacyEntry)> = raw.into_iter().collect();
        ordered.sort_by_key(|(part, _)| {
            STANDARD_PART_ORDER
                .iter()
                .position(|p| p == part)
                .unwrap_or(STANDARD_PART_ORDER.len())
        });

        let mut entries = Vec::with_capacity(ordered.len());
        for (part, entry) in ordered {
            let mapping = entry
                .into_mapping(&part)
                .map_err(|e| PaperdollError::config(format!("part '{part}': {e}")))?;
            entries.push((part, mapping));
        }
        Self::new(entries)
    }

    /// Load a table file in either format.
    pub fn from_path(path: &Path) -> PaperdollResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read part mapping '{}'", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| PaperdollError::config(format!("invalid part mapping json: {e}")))?;
        if value.get("parts").is_some_and(serde_json::Value::is_array) {
            Self::from_json_str(&text)
        } else {
            Self::from_legacy_json_str(&text)
        }
    }

    pub fn to_json_string(&self) -> PaperdollResult<String> {
        let file = TableFile {
            parts: self
                .entries
                .iter()
                .map(|(part, mapping)| PartEntry {
                    part: part.clone(),
                    mapping: *mapping,
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn get(&self, part: &str) -> Option<&PartMapping> {
        self.entries
            .iter()
            .find(|(name, _)| name == part)
            .map(|(_, mapping)| mapping)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PartMapping)> {
        self.entries.iter().map(|(part, mapping)| (part.as_str(), mapping))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PartMappingTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum LegacyEntry {
    #[serde(rename_all = "camelCase")]
    Quad {
        top_left: usize,
        top_right: usize,
        bottom_left: usize,
        bottom_right: usize,
    },
    Center {
        center: usize,
    },
    #[serde(rename_all = "camelCase")]
    Ears {
        left_anchor: usize,
        right_anchor: usize,
    },
    #[serde(rename_all = "camelCase")]
    Arm {
        left_center: usize,
        right_center: usize,
    },
    Hand {
        wrist: usize,
        elbow: usize,
    },
    Leg {
        start: usize,
        end: usize,
    },
}

impl LegacyEntry {
    fn into_mapping(self, part: &str) -> PaperdollResult<PartMapping> {
        let id = |index: usize| LandmarkId::try_from(index);
        Ok(match self {
            Self::Quad {
                top_left,
                top_right,
                bottom_left,
                bottom_right,
            } => PartMapping::Quad {
                top_left: id(top_left)?,
                top_right: id(top_right)?,
                bottom_left: id(bottom_left)?,
                bottom_right: id(bottom_right)?,
            },
            Self::Center { center } => PartMapping::PointAnchored { center: id(center)? },
            Self::Ears {
                left_anchor,
                right_anchor,
            } => PartMapping::EarAnchored {
                left_anchor: id(left_anchor)?,
                right_anchor: id(right_anchor)?,
            },
            Self::Arm {
                left_center,
                right_center,
            } => PartMapping::MirroredSegment {
                left_center: id(left_center)?,
                right_center: id(right_center)?,
            },
            Self::Hand { wrist, elbow } => PartMapping::Anchored {
                wrist: id(wrist)?,
                elbow: id(elbow)?,
                mirrored: part == RIGHT_HAND,
            },
            Self::Leg { start, end } => PartMapping::Segment {
                from: id(start)?,
                to: id(end)?,
            },
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pose/mapping.rs"]
mod tests;
