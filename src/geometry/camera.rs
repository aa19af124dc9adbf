use nalgebra::Vector3;

/// Pinhole camera intrinsics: focal lengths `alpha`/`beta` and principal
/// point `(cx, cy)`, in pixel units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intrinsics {
    pub alpha: f64,
    pub beta: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    pub fn new(alpha: f64, beta: f64, cx: f64, cy: f64) -> Self {
        Self { alpha, beta, cx, cy }
    }

    /// True when both focal lengths are strictly positive, the only
    /// precondition the core places on intrinsics.
    pub fn is_valid(&self) -> bool {
        self.alpha > 0.0 && self.beta > 0.0
    }

    /// Projects a camera-frame point into pixel coordinates and depth.
    ///
    /// Returns `None` when the point is behind the camera (`p.z <= 0`) or
    /// its projection falls outside the `width x height` image.
    pub fn project(&self, p: &Vector3<f32>, width: usize, height: usize) -> Option<(f32, f32, f32)> {
        if p.z <= 0.0 {
            return None;
        }
        let u = (self.alpha * (p.x as f64 / p.z as f64) + self.cx) as f32;
        let v = (self.beta * (p.y as f64 / p.z as f64) + self.cy) as f32;
        if u < 0.0 || u >= width as f32 || v < 0.0 || v >= height as f32 {
            return None;
        }
        Some((u, v, p.z))
    }

    /// Backprojects a pixel and depth into a camera-frame 3D point. This is
    /// the exact inverse of [`Self::project`].
    pub fn backproject(&self, u: f32, v: f32, z: f32) -> Vector3<f32> {
        Vector3::new(
            ((u as f64 - self.cx) * z as f64 / self.alpha) as f32,
            ((v as f64 - self.cy) * z as f64 / self.beta) as f32,
            z,
        )
    }
}
