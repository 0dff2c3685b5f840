use super::*;

const EPS: f64 = 1e-9;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

fn assert_point(a: Point, b: Point) {
    assert!(close(a.x, b.x) && close(a.y, b.y), "{a:?} != {b:?}");
}

#[test]
fn horizontal_segment_stretches_width_along_bone() {
    let asset = Size::new(50.0, 20.0);
    let from = Point::new(100.0, 100.0);
    let to = Point::new(140.0, 130.0);
    let p = segment_placement(from, to, asset, SegmentAxis::Horizontal);

    assert!(close(p.scale, 1.0));
    assert!(close(p.rotate, 30f64.atan2(40.0)));
    assert_eq!(p.translate, from.to_vec2());

    // Left-centre of the drawing lands on `from`, right-centre on `to`.
    let m = p.to_affine();
    assert_point(m * Point::new(0.0, 10.0), from);
    assert_point(m * Point::new(50.0, 10.0), to);
}

#[test]
fn vertical_segment_stretches_height_along_bone() {
    let asset = Size::new(30.0, 120.0);
    let hip = Point::new(200.0, 300.0);
    let knee = Point::new(200.0, 420.0);
    let p = segment_placement(hip, knee, asset, SegmentAxis::Vertical);

    assert!(close(p.rotate, 0.0));
    assert!(close(p.scale, 1.0));

    let m = p.to_affine();
    assert_point(m * Point::new(15.0, 0.0), hip);
    assert_point(m * Point::new(15.0, 120.0), knee);
}

#[test]
fn segment_scale_grows_with_distance_and_stays_positive() {
    let asset = Size::new(40.0, 40.0);
    let from = Point::new(0.0, 0.0);
    let mut last = 0.0;
    for len in [1.0, 5.0, 40.0, 400.0] {
        let p = segment_placement(from, Point::new(len, 0.0), asset, SegmentAxis::Horizontal);
        assert!(p.scale > last);
        last = p.scale;
    }
}

#[test]
fn zero_length_segment_has_zero_scale_not_nan() {
    let p = segment_placement(
        Point::new(3.0, 3.0),
        Point::new(3.0, 3.0),
        Size::new(10.0, 10.0),
        SegmentAxis::Vertical,
    );
    assert_eq!(p.scale, 0.0);
    assert!(p.rotate.is_finite());
    assert!(p.to_affine().is_finite());
}

#[test]
fn tiny_assets_floor_the_denominator_at_one() {
    let p = segment_placement(
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Size::new(0.25, 0.25),
        SegmentAxis::Horizontal,
    );
    assert!(close(p.scale, 10.0));
}

#[test]
fn head_is_centred_between_ears_and_magnified() {
    let asset = Size::new(100.0, 80.0);
    let left = Point::new(80.0, 50.0);
    let right = Point::new(120.0, 50.0);
    let p = head_placement(left, right, asset, DEFAULT_HEAD_MAGNIFICATION);

    assert_eq!(p.translate, Vec2::new(100.0, 50.0));
    assert!(close(p.rotate, 0.0));
    assert!(close(p.scale, 40.0 / 100.0 * 2.5));

    // The drawing's centre lands on the ear midpoint.
    assert_point(p.to_affine() * Point::new(50.0, 40.0), Point::new(100.0, 50.0));
}

#[test]
fn head_rotates_with_tilted_ears() {
    let p = head_placement(
        Point::new(0.0, 0.0),
        Point::new(10.0, 10.0),
        Size::new(10.0, 10.0),
        1.0,
    );
    assert!(close(p.rotate, std::f64::consts::FRAC_PI_4));
}

#[test]
fn anchored_hand_hangs_from_wrist() {
    let asset = Size::new(30.0, 20.0);
    let elbow = Point::new(100.0, 100.0);
    let wrist = Point::new(100.0, 150.0);

    let left = anchored_placement(wrist, elbow, asset, false);
    assert!(close(left.scale, 1.0));
    let m = left.to_affine();
    assert_point(m * Point::new(0.0, 10.0), wrist);
    // The far edge points away from the elbow.
    assert_point(m * Point::new(30.0, 10.0), Point::new(100.0, 180.0));

    let right = anchored_placement(wrist, elbow, asset, true);
    let m = right.to_affine();
    assert_point(m * Point::new(30.0, 10.0), wrist);
    assert_point(m * Point::new(0.0, 10.0), Point::new(100.0, 180.0));
}

#[test]
fn point_placement_centres_asset() {
    let p = point_placement(Point::new(10.0, 20.0), Size::new(6.0, 4.0));
    assert_point(p.to_affine() * Point::new(3.0, 2.0), Point::new(10.0, 20.0));
    assert_point(p.to_affine() * Point::new(0.0, 0.0), Point::new(7.0, 18.0));
}
