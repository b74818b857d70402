//! Finite rotations of the unit sphere
//!
//! A [`FiniteRotation`] is a unit quaternion together with an optional *axis
//! hint*. The hint never changes how points are rotated; it only decides which
//! of the two equivalent (axis, angle) pairs is reported, so that rotations
//! close to the identity keep a stable Euler pole.

use std::ops::Mul;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use super::point::PointOnSphere;
use crate::constants::EPSILON;

/// Above this quaternion dot product slerp degenerates to a normalised lerp
const SLERP_DOT_THRESHOLD: f64 = 1.0 - 1e-12;

/// A rigid rotation of the sphere about an axis through its centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiniteRotation {
    quat: DQuat,
    axis_hint: Option<PointOnSphere>,
}

impl FiniteRotation {
    /// The rotation that leaves every point in place
    pub fn identity() -> Self {
        Self { quat: DQuat::IDENTITY, axis_hint: None }
    }

    /// Wrap a quaternion, normalising it first. A zero quaternion yields the identity.
    pub fn from_quat(quat: DQuat) -> Self {
        let len = quat.length();
        let quat = if len > EPSILON { quat / len } else { DQuat::IDENTITY };
        Self { quat, axis_hint: None }
    }

    /// Rotation by `angle` radians (right-handed) about the Euler pole `pole`.
    /// The pole is kept as the axis hint.
    pub fn from_euler_pole(pole: PointOnSphere, angle: f64) -> Self {
        Self {
            quat: DQuat::from_axis_angle(pole.position(), angle),
            axis_hint: Some(pole),
        }
    }

    /// Rotation about the pole at (`lat`, `lon`) by `angle` degrees, as stored
    /// in rotation files.
    pub fn from_euler_pole_degrees(lat: f64, lon: f64, angle: f64) -> Self {
        Self::from_euler_pole(PointOnSphere::from_lat_lon_degrees(lat, lon), angle.to_radians())
    }

    /// Attach the preferred sense of the rotation axis
    pub fn with_axis_hint(mut self, axis_hint: Option<PointOnSphere>) -> Self {
        self.axis_hint = axis_hint;
        self
    }

    /// The unit quaternion
    pub fn quat(&self) -> DQuat {
        self.quat
    }

    /// The preferred sense of the rotation axis, if any
    pub fn axis_hint(&self) -> Option<PointOnSphere> {
        self.axis_hint
    }

    /// True within numerical tolerance of no rotation
    pub fn is_identity(&self) -> bool {
        self.quat.w.abs() >= 1.0 - EPSILON
    }

    /// Rotation angle in `[0, π]`
    pub fn angle(&self) -> f64 {
        2.0 * self.quat.w.abs().clamp(0.0, 1.0).acos()
    }

    /// The Euler pole and signed angle (radians) of this rotation, or `None`
    /// for the identity, whose axis is undefined.
    ///
    /// With an axis hint the returned pole lies in the hint's hemisphere; the
    /// angle is negated when that requires flipping the axis.
    pub fn axis_and_angle(&self) -> Option<(PointOnSphere, f64)> {
        if self.is_identity() {
            return None;
        }
        // q and -q are the same rotation; pick the one with w >= 0
        let q = if self.quat.w < 0.0 { -self.quat } else { self.quat };
        let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
        let axis = PointOnSphere::new(DVec3::new(q.x, q.y, q.z))?;

        match self.axis_hint {
            Some(hint) if axis.dot(&hint) < 0.0 => Some((axis.antipode(), -angle)),
            _ => Some((axis, angle)),
        }
    }

    /// `a ∘ b`: apply `b` first, then `a`.
    pub fn compose(a: &FiniteRotation, b: &FiniteRotation) -> FiniteRotation {
        FiniteRotation {
            quat: (a.quat * b.quat).normalize(),
            axis_hint: a.axis_hint.or(b.axis_hint),
        }
    }

    /// The rotation undoing this one
    pub fn inverse(&self) -> FiniteRotation {
        FiniteRotation { quat: self.quat.conjugate(), axis_hint: self.axis_hint }
    }

    /// Rotate a vector without renormalising it
    pub fn rotate_vector(&self, v: DVec3) -> DVec3 {
        self.quat.mul_vec3(v)
    }

    /// Rotate `point`; the exact identity leaves it bit-for-bit unchanged
    pub fn rotate_point(&self, point: &PointOnSphere) -> PointOnSphere {
        if self.quat == DQuat::IDENTITY {
            return *point;
        }
        PointOnSphere::from_unit_vector(self.rotate_vector(point.position()).normalize())
    }

    /// True if both describe the same rotation (`q` and `-q` are equivalent)
    /// within `tolerance` on the quaternion dot product.
    pub fn quat_is_equivalent(&self, other: &FiniteRotation, tolerance: f64) -> bool {
        self.quat.dot(other.quat).abs() >= 1.0 - tolerance
    }

    /// Spherically interpolate between the rotations sampled at `older_time`
    /// and `younger_time` (Ma, `older_time > younger_time`) for `target_time`.
    ///
    /// The older rotation's axis hint is preferred for the result.
    pub fn interpolate(
        older: &FiniteRotation,
        younger: &FiniteRotation,
        older_time: f64,
        younger_time: f64,
        target_time: f64,
    ) -> FiniteRotation {
        let span = older_time - younger_time;
        let axis_hint = older.axis_hint.or(younger.axis_hint);
        if span.abs() < EPSILON {
            return older.with_axis_hint(axis_hint);
        }
        let t = (target_time - younger_time) / span;
        FiniteRotation { quat: slerp(younger.quat, older.quat, t), axis_hint }
    }
}

impl Default for FiniteRotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for FiniteRotation {
    type Output = FiniteRotation;

    fn mul(self, rhs: FiniteRotation) -> FiniteRotation {
        FiniteRotation::compose(&self, &rhs)
    }
}

/// Shortest-path spherical linear interpolation from `from` (t = 0) to `to` (t = 1).
fn slerp(from: DQuat, to: DQuat, t: f64) -> DQuat {
    let mut to = to;
    let mut dot = from.dot(to);
    if dot < 0.0 {
        to = -to;
        dot = -dot;
    }

    if dot > SLERP_DOT_THRESHOLD {
        return (from * (1.0 - t) + to * t).normalize();
    }

    let theta = dot.clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    (from * wa + to * wb).normalize()
}
