//! Corner construction shared by the sprite and nine-slice batches.

use glam::Vec2;

use crate::primitives::Transform2D;

/// The four corners of a transformed quad.
///
/// `corners[0..4]` are, before rotation, top-left, bottom-left, bottom-right
/// and top-right of the local rectangle (y grows down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadCorners {
    pub corners: [Vec2; 4],
}

impl QuadCorners {
    /// Corners in vertex emission order: 1, 4, 3, 2.
    #[inline]
    pub fn emission_order(&self) -> [Vec2; 4] {
        let [p1, p2, p3, p4] = self.corners;
        [p1, p4, p3, p2]
    }
}

/// Build the corners of a `size` rectangle anchored at `origin` (fractions of
/// the size), scaled, rotated about the anchor and moved to `transform.position`.
///
/// With a rotation only corners 1 to 3 are rotated. The fourth is completed
/// from them, per axis and in exactly this order of operations:
///
/// - `x4 = x1 + (x3 - x2)`
/// - `y4 = y3 - (y2 - y1)`
///
/// Both are exact for rectangles, but the results are bit-for-bit part of the
/// vertex output and a fourth independent rotation rounds differently.
pub fn quad_corners(size: Vec2, origin: Vec2, transform: &Transform2D) -> QuadCorners {
    let (w, h) = (size.x, size.y);
    let scale = transform.scale;

    let x = transform.position.x - origin.x * w;
    let y = transform.position.y - origin.y * h;

    let origin_x = w * origin.x;
    let origin_y = h * origin.y;

    let world_origin_x = x + origin_x;
    let world_origin_y = y + origin_y;

    let fx = -origin_x * scale.x;
    let fy = -origin_y * scale.y;
    let fx2 = (w - origin_x) * scale.x;
    let fy2 = (h - origin_y) * scale.y;

    let (p1x, p1y) = (fx, fy);
    let (p2x, p2y) = (fx, fy2);
    let (p3x, p3y) = (fx2, fy2);
    let (p4x, p4y) = (fx2, fy);

    let [x1, y1, x2, y2, x3, y3, x4, y4] = if transform.rotation != 0.0 {
        let rot = f64::from(transform.rotation).to_radians();
        let cos = rot.cos() as f32;
        let sin = rot.sin() as f32;

        let x1 = cos * p1x - sin * p1y;
        let y1 = sin * p1x + cos * p1y;

        let x2 = cos * p2x - sin * p2y;
        let y2 = sin * p2x + cos * p2y;

        let x3 = cos * p3x - sin * p3y;
        let y3 = sin * p3x + cos * p3y;

        let x4 = x1 + (x3 - x2);
        let y4 = y3 - (y2 - y1);

        [x1, y1, x2, y2, x3, y3, x4, y4]
    } else {
        [p1x, p1y, p2x, p2y, p3x, p3y, p4x, p4y]
    };

    QuadCorners {
        corners: [
            Vec2::new(x1 + world_origin_x, y1 + world_origin_y),
            Vec2::new(x2 + world_origin_x, y2 + world_origin_y),
            Vec2::new(x3 + world_origin_x, y3 + world_origin_y),
            Vec2::new(x4 + world_origin_x, y4 + world_origin_y),
        ],
    }
}
