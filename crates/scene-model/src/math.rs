//! Vector, orientation, and ray types.

use serde::{Deserialize, Serialize};

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub const FORWARD: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, factor: f64) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(&self) -> Option<Vec3> {
        let len = self.length();
        if len <= f64::EPSILON {
            return None;
        }
        Some(self.scale(1.0 / len))
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Vec3) -> f64 {
        self.sub(other).length()
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Vec3, b: &Vec3, t: f64) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        a.add(&b.sub(a).scale(t))
    }
}

/// Head orientation as Euler angles in degrees.
///
/// `pitch` rotates about the horizontal (x) axis, `yaw` about the vertical
/// (y) axis, `roll` about the forward (z) axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl EulerAngles {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Per-axis rotation from `self` to `next`, each wrapped into (-180, 180].
    ///
    /// Hosts report angles in [0, 360); a heading that crosses 359 -> 1 is a
    /// 2 degree turn, not a 358 degree one.
    pub fn delta_to(&self, next: &EulerAngles) -> EulerAngles {
        EulerAngles {
            pitch: wrap_degrees(next.pitch - self.pitch),
            yaw: wrap_degrees(next.yaw - self.yaw),
            roll: wrap_degrees(next.roll - self.roll),
        }
    }

    /// Linear interpolation along the shortest arc of each axis.
    pub fn lerp(a: &EulerAngles, b: &EulerAngles, t: f64) -> EulerAngles {
        let t = t.clamp(0.0, 1.0);
        let d = a.delta_to(b);
        EulerAngles {
            pitch: a.pitch + d.pitch * t,
            yaw: a.yaw + d.yaw * t,
            roll: a.roll + d.roll * t,
        }
    }
}

/// Wrap an angle difference into (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// A half-line used for line-of-sight queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray from `from` towards `to`; `None` when the points coincide.
    pub fn between(from: Vec3, to: Vec3) -> Option<Ray> {
        to.sub(&from)
            .normalized()
            .map(|direction| Ray::new(from, direction))
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin.add(&self.direction.scale(t))
    }
}
