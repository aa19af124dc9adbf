use nalgebra::ClosedAdd;
use nalgebra::Scalar;
use nalgebra::Vector3;
use num::Zero;

/// Axis-aligned bounding box in 3D space.
#[derive(Clone, Debug, PartialEq)]
pub struct Box3D<T>
where
    T: Scalar + Zero + ClosedAdd,
{
    pub min: Vector3<T>,
    pub max: Vector3<T>,
}

impl<T> Box3D<T>
where
    T: Scalar + Zero + ClosedAdd,
{
    ///
    /// # Arguments
    ///
    /// * `start_point`: The minimum point in the X, Y, and Z axis.
    /// * `size`: The size of in the X, Y, and Z axis.
    pub fn from_extents(start_point: Vector3<T>, size: Vector3<T>) -> Self {
        Box3D {
            min: start_point.clone(),
            max: start_point + &size,
        }
    }

    pub fn empty() -> Self {
        Self {
            min: Vector3::<T>::zero(),
            max: Vector3::<T>::zero(),
        }
    }
}

impl Box3D<f32> {
    /// Creates a box from two corner points, reordering components so that
    /// `min` is componentwise less than or equal to `max`.
    pub fn from_min_max(a: Vector3<f32>, b: Vector3<f32>) -> Self {
        Self {
            min: Vector3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vector3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Grows the box, in place, so that it also contains `point`.
    pub fn grow(&mut self, point: &Vector3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn contains(&self, point: &Vector3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn intersects(&self, other: &Box3D<f32>) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }
}

pub type Box3Df = Box3D<f32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_from_extents() {
        let b = Box3Df::from_extents(Vector3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(b.min, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(b.max, Vector3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn should_contain_points_inside_bounds() {
        let b = Box3Df::from_min_max(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        assert!(b.contains(&Vector3::new(0.5, 0.5, 0.5)));
        assert!(!b.contains(&Vector3::new(1.5, 0.5, 0.5)));
    }

    #[test]
    fn should_detect_intersection() {
        let a = Box3Df::from_min_max(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let b = Box3Df::from_min_max(Vector3::new(0.5, 0.5, 0.5), Vector3::new(2.0, 2.0, 2.0));
        let c = Box3Df::from_min_max(Vector3::new(5.0, 5.0, 5.0), Vector3::new(6.0, 6.0, 6.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn should_grow_to_include_point() {
        let mut b = Box3Df::empty();
        b.grow(&Vector3::new(-1.0, 2.0, 0.5));
        b.grow(&Vector3::new(3.0, -2.0, 0.5));
        assert_eq!(b.min, Vector3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vector3::new(3.0, 2.0, 0.5));
    }
}
