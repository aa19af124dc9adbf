use nalgebra::Vector3;

/// An oriented disk approximating a small patch of reconstructed surface.
///
/// Grounded on the teacher's GPU surfel layout (position, normal, radius,
/// color, confidence) but stored as a plain CPU-side value type. Position is
/// the tombstone carrier: a recycled or never-allocated slot stores `NaN`
/// coordinates, which `is_valid` detects directly rather than relying on a
/// side flag that could drift out of sync.
#[derive(Clone, Copy, Debug)]
pub struct Surfel {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub color: Vector3<u8>,
    pub radius: f32,
    pub confidence: u32,
}

impl Surfel {
    pub fn new(
        position: Vector3<f32>,
        normal: Vector3<f32>,
        color: Vector3<u8>,
        radius: f32,
        confidence: u32,
    ) -> Self {
        Self {
            position,
            normal,
            color,
            radius,
            confidence,
        }
    }

    /// Sentinel tombstone for a free or never-allocated store slot: a
    /// non-finite position, per §3's "records may be marked invalid by
    /// storing a sentinel non-finite position".
    pub fn invalid() -> Self {
        Self {
            position: Vector3::new(f32::NAN, f32::NAN, f32::NAN),
            normal: Vector3::zeros(),
            color: Vector3::zeros(),
            radius: 0.0,
            confidence: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }

    /// True once this surfel's confidence has crossed `confidence_threshold`
    /// (`C*`), the point at which it is considered reliable enough to
    /// surface in a preview or bounding-box query.
    pub fn is_reliable(&self, confidence_threshold: u32) -> bool {
        self.is_valid() && self.confidence >= confidence_threshold
    }
}
