use nalgebra::Vector3;
use ndarray::Array2;

use crate::geometry::{Intrinsics, Pose};

/// One sample of a dense RGB-D grid: a camera-frame point and its color.
/// Non-finite `position` denotes a missing-depth pixel.
#[derive(Clone, Copy, Debug)]
pub struct Pixel {
    pub position: Vector3<f32>,
    pub color: Vector3<u8>,
}

impl Pixel {
    pub fn new(position: Vector3<f32>, color: Vector3<u8>) -> Self {
        Self { position, color }
    }

    /// A pixel with no depth reading.
    pub fn missing() -> Self {
        Self {
            position: Vector3::new(f32::NAN, f32::NAN, f32::NAN),
            color: Vector3::zeros(),
        }
    }

    pub fn has_depth(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }
}

/// A `W×H` organized RGB-D keyframe, indexed `[row, col]` i.e. `[v, u]` to
/// match ndarray's row-major convention. Kept as a 2D grid, not a flat point
/// list, so normal estimation can look up `(u±k, v)`/`(u, v±k)` neighbors.
pub struct Keyframe {
    pub grid: Array2<Pixel>,
    pub pose: Pose,
}

impl Keyframe {
    pub fn new(grid: Array2<Pixel>, pose: Pose) -> Self {
        Self { grid, pose }
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    pub fn pixel(&self, u: usize, v: usize) -> &Pixel {
        &self.grid[(v, u)]
    }

    /// Backprojects pixel `(u, v, z)` into a camera-frame point using
    /// `intrinsics`, independent of the stored grid depth; used by callers
    /// constructing synthetic clouds and by scan preprocessing.
    pub fn backproject(intrinsics: &Intrinsics, u: f32, v: f32, z: f32) -> Vector3<f32> {
        intrinsics.backproject(u, v, z)
    }
}
