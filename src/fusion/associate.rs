use nalgebra::Vector3;
use ordered_float::OrderedFloat;

use crate::geometry::{Intrinsics, Pose};
use crate::store::SurfelStore;

use super::scan::ScanPoint;

/// Picks the best-matching candidate surfel for `scan_point` among
/// `candidates`, per §4.4.3 steps 2-3: reproject each candidate through the
/// current pose, keep those landing on the same pixel (within integer
/// rounding), then take the one closest in depth. Ties go to the
/// earlier-inserted (lower index) candidate, since `candidates` preserves
/// insertion order and this picks the first minimum.
pub fn find_match(
    candidates: &[usize],
    scan_point: &ScanPoint,
    store: &SurfelStore,
    pose: &Pose,
    intrinsics: &Intrinsics,
    width: usize,
    height: usize,
    dmax: f32,
) -> Option<usize> {
    let mut best: Option<(usize, OrderedFloat<f32>)> = None;

    for &candidate in candidates {
        let Some(surfel) = store.get(candidate) else {
            continue;
        };
        let camera_point = pose.map_to_camera_point(&surfel.position);
        let Some((u, v, z)) = intrinsics.project(&camera_point, width, height) else {
            continue;
        };
        if u.round() as i64 != scan_point.u as i64 || v.round() as i64 != scan_point.v as i64 {
            continue;
        }

        let gap = OrderedFloat((z - scan_point.depth).abs());
        if gap.0 >= dmax {
            continue;
        }

        match best {
            Some((_, best_gap)) if gap >= best_gap => {}
            _ => best = Some((candidate, gap)),
        }
    }

    best.map(|(index, _)| index)
}

/// Result of blending an existing surfel with a new observation. `position`
/// is the *unclamped* running average; the caller is responsible for
/// clamping it into the surfel's current octree voxel (§4.4.3 step 4)
/// before committing, since only the spatial index knows the voxel bounds.
pub struct Blended {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub color: Vector3<u8>,
    pub radius: f32,
    pub confidence: u32,
}

/// Confidence-weighted running average, per §4.4.3 step 4.
pub fn blend(
    existing_position: Vector3<f32>,
    existing_normal: Vector3<f32>,
    existing_color: Vector3<u8>,
    existing_radius: f32,
    existing_confidence: u32,
    scan_point: &ScanPoint,
) -> Blended {
    let k = existing_confidence as f32;

    let position = (existing_position * k + scan_point.position_map) / (k + 1.0);

    let normal = (existing_normal * k + scan_point.normal_map).normalize();

    let color = Vector3::new(
        blend_channel(existing_color.x, scan_point.color.x, k),
        blend_channel(existing_color.y, scan_point.color.y, k),
        blend_channel(existing_color.z, scan_point.color.z, k),
    );

    let radius = existing_radius.min(scan_point.radius);

    Blended {
        position,
        normal,
        color,
        radius,
        confidence: existing_confidence + 1,
    }
}

fn blend_channel(existing: u8, new: u8, k: f32) -> u8 {
    (((existing as f32) * k + new as f32) / (k + 1.0)).round().clamp(0.0, 255.0) as u8
}
