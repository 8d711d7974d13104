use crate::models::posture::{AngleMeasurement, Point2D};

/// Return the unsigned angle (in degrees) at vertex `p2` between the rays
/// `p2 -> p1` and `p2 -> p3`, normalized into [0, 180].
///
/// A zero-length ray (`p1 == p2` or `p3 == p2`) yields 0 instead of an
/// undefined angle, so a collapsed landmark never breaks the frame loop.
pub fn calculate_angle(p1: Point2D, p2: Point2D, p3: Point2D) -> f64 {
    let (ax, ay) = (p1.x - p2.x, p1.y - p2.y);
    let (bx, by) = (p3.x - p2.x, p3.y - p2.y);

    if (ax == 0.0 && ay == 0.0) || (bx == 0.0 && by == 0.0) {
        return 0.0;
    }

    // Difference of the two headings lies in (-360, 360)
    let angle = (by.atan2(bx) - ay.atan2(ax)).to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

pub fn measure_angle(p1: Point2D, p2: Point2D, p3: Point2D) -> AngleMeasurement {
    AngleMeasurement::new(calculate_angle(p1, p2, p3))
}
