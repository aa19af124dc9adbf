use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::FusionError;

/// Maximum allowed deviation of a quaternion's norm from 1.0 before it is
/// refused as invalid input.
const UNIT_NORM_TOLERANCE: f32 = 1e-3;

/// A sensor pose: the rigid transform from camera frame to map frame.
///
/// Mirrors the teacher's `Transform`, but is restricted to what the fusion
/// engine needs: a translation (the sensor's origin in the map frame) and a
/// unit-quaternion rotation, with both the forward map and its inverse.
#[derive(Clone, Copy, Debug)]
pub struct Pose {
    origin: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
}

impl Pose {
    /// Builds a pose from an origin and a quaternion, rejecting
    /// non-unit-norm quaternions as [`FusionError::InvalidInput`].
    pub fn from_parts(origin: Vector3<f32>, quaternion: Quaternion<f32>) -> Result<Self, FusionError> {
        let norm = quaternion.norm();
        if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return Err(FusionError::InvalidInput {
                reason: format!("sensor pose quaternion is not unit-norm (|q| = {norm})"),
            });
        }
        Ok(Self {
            origin,
            rotation: UnitQuaternion::from_quaternion(quaternion),
        })
    }

    pub fn identity() -> Self {
        Self {
            origin: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    pub fn origin(&self) -> Vector3<f32> {
        self.origin
    }

    /// Transforms a camera-frame point into the map frame.
    pub fn camera_to_map_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * p + self.origin
    }

    /// Rotates a camera-frame normal into the map frame.
    pub fn camera_to_map_normal(&self, n: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * n
    }

    /// Transforms a map-frame point into the camera frame. Exact inverse of
    /// [`Self::camera_to_map_point`].
    pub fn map_to_camera_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.inverse() * (p - self.origin)
    }
}
