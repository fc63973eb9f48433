//! Toroidal geometry.
//!
//! Both axes wrap, so every coordinate lives in `[0, extent)` and the
//! distance along an axis is never more than half the extent.

/// World extents shared by everything that moves or senses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Torus {
    pub width: f32,
    pub height: f32,
}

impl Torus {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn wrap(&self, x: f32, y: f32) -> (f32, f32) {
        (wrap_axis(x, self.width), wrap_axis(y, self.height))
    }

    /// Shortest displacement from `(ox, oy)` to `(x, y)`.
    #[inline]
    pub fn delta(&self, x: f32, y: f32, ox: f32, oy: f32) -> (f32, f32) {
        (
            axis_delta(x, ox, self.width),
            axis_delta(y, oy, self.height),
        )
    }

    #[inline]
    pub fn distance_sq(&self, x: f32, y: f32, ox: f32, oy: f32) -> f32 {
        let (dx, dy) = self.delta(x, y, ox, oy);
        dx * dx + dy * dy
    }
}

/// Bring `v` into `[0, extent)`.
#[inline]
pub fn wrap_axis(v: f32, extent: f32) -> f32 {
    let w = v.rem_euclid(extent);
    // rem_euclid rounds tiny negatives up to `extent`
    if w >= extent {
        0.0
    } else {
        w
    }
}

/// Signed displacement `v - origin`, using the wrapped distance when the
/// straight one exceeds half the extent.
#[inline]
pub fn axis_delta(v: f32, origin: f32, extent: f32) -> f32 {
    let d = v - origin;
    let half = extent / 2.0;
    if d > half {
        d - extent
    } else if d < -half {
        d + extent
    } else {
        d
    }
}
