use crate::foundation::core::{Affine, Point};

/// Source triangles with a smaller determinant magnitude are treated as collinear.
pub const MIN_DETERMINANT: f64 = 1e-6;

/// Solve the affine map sending `src[i]` onto `dst[i]` for `i in 0..3` (Cramer's rule).
///
/// Returns `None` when the source points are collinear or nearly so; callers skip the draw
/// rather than apply a singular transform.
pub fn affine_from_three_points(src: [Point; 3], dst: [Point; 3]) -> Option<Affine> {
    let [Point { x: x0, y: y0 }, Point { x: x1, y: y1 }, Point { x: x2, y: y2 }] = src;
    let [p0, p1, p2] = dst;

    let det = x0 * (y1 - y2) + x1 * (y2 - y0) + x2 * (y0 - y1);
    if !det.is_finite() || det.abs() < MIN_DETERMINANT {
        return None;
    }

    // Cofactors shared by the x and y rows of the solution.
    let (ca0, ca1, ca2) = (y1 - y2, y2 - y0, y0 - y1);
    let (cc0, cc1, cc2) = (x2 - x1, x0 - x2, x1 - x0);
    let (ce0, ce1, ce2) = (x1 * y2 - x2 * y1, x2 * y0 - x0 * y2, x0 * y1 - x1 * y0);

    let solve = |v0: f64, v1: f64, v2: f64, k0: f64, k1: f64, k2: f64| {
        (v0 * k0 + v1 * k1 + v2 * k2) / det
    };

    let a = solve(p0.x, p1.x, p2.x, ca0, ca1, ca2);
    let c = solve(p0.x, p1.x, p2.x, cc0, cc1, cc2);
    let e = solve(p0.x, p1.x, p2.x, ce0, ce1, ce2);
    let b = solve(p0.y, p1.y, p2.y, ca0, ca1, ca2);
    let d = solve(p0.y, p1.y, p2.y, cc0, cc1, cc2);
    let f = solve(p0.y, p1.y, p2.y, ce0, ce1, ce2);

    let m = Affine::new([a, b, c, d, e, f]);
    m.is_finite().then_some(m)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
