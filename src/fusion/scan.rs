use nalgebra::Vector3;

use crate::geometry::Intrinsics;
use crate::keyframe::Keyframe;

/// A pixel's contribution after scan preprocessing: a map-frame point ready
/// for association, plus the attributes a newly inserted surfel would carry.
#[derive(Clone, Copy, Debug)]
pub struct ScanPoint {
    pub u: usize,
    pub v: usize,
    pub position_map: Vector3<f32>,
    pub normal_map: Vector3<f32>,
    pub normal_camera_z: f32,
    pub depth: f32,
    pub color: Vector3<u8>,
    pub radius: f32,
}

/// Why a pixel did not produce a [`ScanPoint`], for per-frame counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanDrop {
    MissingDepth,
    DegenerateNormal,
    GrazingAngle,
    OutOfDepthRange,
}

/// Runs §4.4.1 scan preprocessing over every pixel of `frame`, in row-major
/// order, against `intrinsics`.
pub fn preprocess_scan(
    frame: &Keyframe,
    intrinsics: &Intrinsics,
    min_scan_znormal: f32,
    min_kinect_dist: f32,
    max_kinect_dist: f32,
) -> (Vec<ScanPoint>, Vec<ScanDrop>) {
    let width = frame.width();
    let height = frame.height();
    let mut points = Vec::new();
    let mut drops = Vec::new();

    for v in 0..height {
        for u in 0..width {
            let pixel = frame.pixel(u, v);
            if !pixel.has_depth() {
                drops.push(ScanDrop::MissingDepth);
                continue;
            }

            let normal_camera = match estimate_normal(frame, u, v) {
                Some(n) => n,
                None => {
                    drops.push(ScanDrop::DegenerateNormal);
                    continue;
                }
            };

            let p = pixel.position;
            let oriented = orient_toward_sensor(normal_camera, p);
            let normal_z = oriented.z;

            if normal_z.abs() < min_scan_znormal {
                drops.push(ScanDrop::GrazingAngle);
                continue;
            }

            if p.z < min_kinect_dist || p.z > max_kinect_dist {
                drops.push(ScanDrop::OutOfDepthRange);
                continue;
            }

            let radius = (p.z * 2.0_f32.sqrt()) / (intrinsics.alpha as f32 * normal_z.abs());

            points.push(ScanPoint {
                u,
                v,
                position_map: frame.pose.camera_to_map_point(&p),
                normal_map: frame.pose.camera_to_map_normal(&oriented),
                normal_camera_z: normal_z,
                depth: p.z,
                color: pixel.color,
                radius,
            });
        }
    }

    (points, drops)
}

/// Estimates the camera-frame normal at `(u, v)` via the cross product of
/// the vectors to its `(u+1, v)` and `(u, v+1)` neighbors. Returns `None` if
/// either neighbor is out of bounds or has no depth, or if the resulting
/// normal is degenerate (zero length).
fn estimate_normal(frame: &Keyframe, u: usize, v: usize) -> Option<Vector3<f32>> {
    if u + 1 >= frame.width() || v + 1 >= frame.height() {
        return None;
    }
    let center = frame.pixel(u, v);
    let right = frame.pixel(u + 1, v);
    let down = frame.pixel(u, v + 1);
    if !right.has_depth() || !down.has_depth() {
        return None;
    }

    let du = right.position - center.position;
    let dv = down.position - center.position;
    let n = du.cross(&dv);
    let norm = n.norm();
    if norm <= f32::EPSILON || !norm.is_finite() {
        None
    } else {
        Some(n / norm)
    }
}

/// Flips `normal` so it points back toward the sensor at the origin of the
/// camera frame, i.e. so `n_z < 0`.
fn orient_toward_sensor(normal: Vector3<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let view = -point;
    if normal.dot(&view) < 0.0 {
        -normal
    } else {
        normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Pose;
    use crate::keyframe::Pixel;
    use ndarray::Array2;

    fn frontal_plane_frame(intrinsics: &Intrinsics) -> Keyframe {
        let (w, h) = (4usize, 4usize);
        let mut grid = Array2::from_elem((h, w), Pixel::missing());
        for v in 0..h {
            for u in 0..w {
                let p = intrinsics.backproject(u as f32, v as f32, 1.0);
                grid[(v, u)] = Pixel::new(p, Vector3::new(200, 10, 10));
            }
        }
        Keyframe::new(grid, Pose::identity())
    }

    #[test]
    fn should_accept_frontal_plane_pixels() {
        let intrinsics = Intrinsics::new(500.0, 500.0, 320.0, 240.0);
        let frame = frontal_plane_frame(&intrinsics);
        let (points, drops) = preprocess_scan(&frame, &intrinsics, 0.2, 0.1, 5.0);
        assert!(!points.is_empty());
        assert!(drops.iter().any(|d| *d == ScanDrop::MissingDepth || *d == ScanDrop::DegenerateNormal));
        for p in &points {
            assert!(p.normal_camera_z.abs() > 0.9);
        }
    }

    #[test]
    fn should_drop_border_pixels_as_degenerate_normal() {
        let intrinsics = Intrinsics::new(500.0, 500.0, 320.0, 240.0);
        let frame = frontal_plane_frame(&intrinsics);
        let (points, _) = preprocess_scan(&frame, &intrinsics, 0.2, 0.1, 5.0);
        assert!(points.iter().all(|p| p.u < frame.width() - 1 && p.v < frame.height() - 1));
    }

    #[test]
    fn should_reject_tilted_plane_below_znormal_threshold() {
        let intrinsics = Intrinsics::new(500.0, 500.0, 320.0, 240.0);
        let (w, h) = (4usize, 4usize);
        let mut grid = Array2::from_elem((h, w), Pixel::missing());
        // A plane raked steeply in x so the camera-frame normal is nearly
        // perpendicular to the view axis: |n_z| well below 0.2.
        for v in 0..h {
            for u in 0..w {
                let depth = 1.0 + (u as f32) * 0.5;
                let p = intrinsics.backproject(u as f32, v as f32, depth);
                grid[(v, u)] = Pixel::new(p, Vector3::new(1, 2, 3));
            }
        }
        let frame = Keyframe::new(grid, Pose::identity());
        let (points, _) = preprocess_scan(&frame, &intrinsics, 0.2, 0.1, 5.0);
        assert!(points.is_empty());
    }
}
