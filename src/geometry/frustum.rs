use nalgebra::Vector3;

use super::camera::Intrinsics;
use super::pose::Pose;

/// Camera viewing volume used by the fusion engine's visibility prepass: a
/// sensor pose plus intrinsics and image bounds, clipped to `[near, far]`
/// depth.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pose: Pose,
    intrinsics: Intrinsics,
    width: usize,
    height: usize,
    near: f32,
    far: f32,
}

impl Frustum {
    pub fn new(pose: Pose, intrinsics: Intrinsics, width: usize, height: usize, near: f32, far: f32) -> Self {
        Self {
            pose,
            intrinsics,
            width,
            height,
            near,
            far,
        }
    }

    /// True when a camera-frame point lies within the depth range and
    /// projects inside the image.
    pub fn contains_camera_point(&self, p: &Vector3<f32>) -> bool {
        if p.z < self.near || p.z > self.far {
            return false;
        }
        self.intrinsics.project(p, self.width, self.height).is_some()
    }

    /// True when a map-frame point is visible from this frustum's pose.
    pub fn contains_map_point(&self, p: &Vector3<f32>) -> bool {
        let camera_point = self.pose.map_to_camera_point(p);
        self.contains_camera_point(&camera_point)
    }
}
