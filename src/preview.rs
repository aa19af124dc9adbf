use std::collections::HashMap;

use nalgebra::Vector3;

use crate::store::SurfelStore;

/// One coarse point in a generated preview: the mean position and color of
/// the reliable surfels sampled from its voxel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewPoint {
    pub position: Vector3<f32>,
    pub color: Vector3<u8>,
}

/// Downsamples reliable surfels in `store` into one [`PreviewPoint`] per
/// occupied voxel of side `preview_resolution`. Each voxel averages at most
/// the first `color_samples_in_voxel` reliable surfels encountered in store
/// order. `stride` throttles output by emitting only every `stride`-th
/// reliable surfel considered for sampling (visualization-only, §9 open
/// question (a)); `stride = 1` samples every reliable surfel.
pub fn generate_preview(
    store: &SurfelStore,
    confidence_threshold: u32,
    preview_resolution: f32,
    color_samples_in_voxel: usize,
    stride: usize,
) -> Vec<PreviewPoint> {
    let stride = stride.max(1);
    let mut voxels: HashMap<(i64, i64, i64), (Vector3<f32>, Vector3<f32>, usize)> = HashMap::new();

    let mut seen = 0usize;
    for (_, surfel) in store.iter() {
        if !surfel.is_reliable(confidence_threshold) {
            continue;
        }
        seen += 1;
        if (seen - 1) % stride != 0 {
            continue;
        }

        let key = (
            (surfel.position.x / preview_resolution).floor() as i64,
            (surfel.position.y / preview_resolution).floor() as i64,
            (surfel.position.z / preview_resolution).floor() as i64,
        );
        let entry = voxels.entry(key).or_insert((Vector3::zeros(), Vector3::zeros(), 0));
        if entry.2 >= color_samples_in_voxel {
            continue;
        }
        entry.0 += surfel.position;
        entry.1 += surfel.color.map(|c| c as f32);
        entry.2 += 1;
    }

    voxels
        .into_values()
        .filter(|(_, _, count)| *count > 0)
        .map(|(position_sum, color_sum, count)| {
            let n = count as f32;
            PreviewPoint {
                position: position_sum / n,
                color: (color_sum / n).map(|c| c.round().clamp(0.0, 255.0) as u8),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surfel::Surfel;

    fn reliable(position: Vector3<f32>, color: Vector3<u8>) -> Surfel {
        Surfel::new(position, Vector3::z(), color, 0.01, 10)
    }

    #[test]
    fn should_skip_unreliable_surfels() {
        let mut store = SurfelStore::with_capacity(4);
        store
            .allocate(Surfel::new(Vector3::zeros(), Vector3::z(), Vector3::new(1, 1, 1), 0.01, 1))
            .unwrap();
        let preview = generate_preview(&store, 5, 0.2, 3, 1);
        assert!(preview.is_empty());
    }

    #[test]
    fn should_average_samples_within_a_voxel() {
        let mut store = SurfelStore::with_capacity(4);
        store.allocate(reliable(Vector3::new(0.01, 0.01, 0.01), Vector3::new(0, 0, 0))).unwrap();
        store.allocate(reliable(Vector3::new(0.02, 0.02, 0.02), Vector3::new(100, 100, 100))).unwrap();
        let preview = generate_preview(&store, 5, 0.2, 3, 1);
        assert_eq!(preview.len(), 1);
        assert_eq!(preview[0].color, Vector3::new(50, 50, 50));
    }

    #[test]
    fn should_split_across_separate_voxels() {
        let mut store = SurfelStore::with_capacity(4);
        store.allocate(reliable(Vector3::new(0.01, 0.01, 0.01), Vector3::new(0, 0, 0))).unwrap();
        store.allocate(reliable(Vector3::new(5.0, 5.0, 5.0), Vector3::new(0, 0, 0))).unwrap();
        let preview = generate_preview(&store, 5, 0.2, 3, 1);
        assert_eq!(preview.len(), 2);
    }

    #[test]
    fn should_throttle_output_with_stride() {
        let mut store = SurfelStore::with_capacity(8);
        for i in 0..4 {
            store
                .allocate(reliable(Vector3::new(i as f32, 0.0, 0.0), Vector3::new(0, 0, 0)))
                .unwrap();
        }
        let full = generate_preview(&store, 5, 0.2, 3, 1);
        let throttled = generate_preview(&store, 5, 0.2, 3, 2);
        assert_eq!(full.len(), 4);
        assert_eq!(throttled.len(), 2);
    }
}
