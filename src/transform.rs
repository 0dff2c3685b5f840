//! Pure geometry: landmark correspondences to drawing transforms.

/// Affine solve from point correspondences.
pub mod affine;
/// Pivot, rotation and scale placements for the segment-like strategies.
pub mod placement;
