use std::collections::HashMap;

use nalgebra::Vector3;

use crate::bounds::Box3Df;

/// Integer voxel coordinate: `floor(p / leaf_size)` componentwise.
type VoxelKey = (i64, i64, i64);

/// Spatial index over live surfel handles.
///
/// The teacher's kd-tree groups points by recursive spatial splits, which
/// assumes a static point set built once and queried many times. The fusion
/// core instead inserts and removes continuously while ingesting keyframes,
/// so this realizes the octree as a sparse grid of fixed-size voxel
/// buckets: every leaf has the same size `leaf_size`, named by its integer
/// coordinate, and stored only if non-empty. This is an octree with exactly
/// one level of (infinite, sparse) branching instead of an explicit
/// recursive subdivision, and it supports O(1) insert/removal, which a
/// balanced kd-tree does not.
#[derive(Debug)]
pub struct SpatialIndex {
    leaf_size: f32,
    buckets: HashMap<VoxelKey, Vec<usize>>,
}

impl SpatialIndex {
    pub fn new(leaf_size: f32) -> Self {
        assert!(leaf_size > 0.0, "leaf_size must be positive");
        Self {
            leaf_size,
            buckets: HashMap::new(),
        }
    }

    pub fn leaf_size(&self) -> f32 {
        self.leaf_size
    }

    fn key_of(&self, point: &Vector3<f32>) -> VoxelKey {
        (
            (point.x / self.leaf_size).floor() as i64,
            (point.y / self.leaf_size).floor() as i64,
            (point.z / self.leaf_size).floor() as i64,
        )
    }

    /// Registers `index` under the voxel containing `position`.
    pub fn insert(&mut self, index: usize, position: &Vector3<f32>) {
        self.buckets.entry(self.key_of(position)).or_default().push(index);
    }

    /// Removes `index` from the voxel containing `position`. No-op if the
    /// pair is not present (e.g. it was already removed).
    pub fn remove(&mut self, index: usize, position: &Vector3<f32>) {
        let key = self.key_of(position);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.retain(|&i| i != index);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Handles sharing a voxel with `position`, plus all handles in the 26
    /// neighboring voxels. Association search radius is bounded by
    /// `leaf_size`, matching the spec's "neighbor voxel" association rule.
    pub fn neighbor_indices(&self, position: &Vector3<f32>) -> Vec<usize> {
        let (kx, ky, kz) = self.key_of(position);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy, kz + dz)) {
                        out.extend_from_slice(bucket);
                    }
                }
            }
        }
        out
    }

    /// Clamps `proposed` to stay within the voxel that currently contains
    /// `original`, preserving the invariant that a surfel's bucket
    /// assignment never needs to change on update. Returns `None` when the
    /// clamp would move the point by more than half a voxel, or when the
    /// clamped point still lands on the voxel's far face and so would hash
    /// into the neighboring voxel despite `clamp`'s inclusive bound,
    /// signaling the caller should skip the positional update rather than
    /// distort or misindex it.
    pub fn clamp_to_voxel(&self, original: &Vector3<f32>, proposed: &Vector3<f32>) -> Option<Vector3<f32>> {
        let original_key = self.key_of(original);
        let (kx, ky, kz) = original_key;
        let min = Vector3::new(kx as f32, ky as f32, kz as f32) * self.leaf_size;
        let max = min.add_scalar(self.leaf_size);
        let clamped = Vector3::new(
            proposed.x.clamp(min.x, max.x),
            proposed.y.clamp(min.y, max.y),
            proposed.z.clamp(min.z, max.z),
        );
        if self.key_of(&clamped) != original_key {
            return None;
        }
        if (clamped - proposed).norm() > self.leaf_size * 0.5 {
            None
        } else {
            Some(clamped)
        }
    }

    /// All handles whose voxel intersects `bounds`, for bounding-box
    /// queries over the whole map. The key range bounds the candidate
    /// leaves; each leaf's own voxel is then checked against `bounds` with
    /// [`Box3Df::intersects`] rather than assumed, since a caller-supplied
    /// box is never itself voxel-aligned.
    pub fn query_box(&self, bounds: &Box3Df) -> Vec<usize> {
        let min_key = self.key_of(&bounds.min);
        let max_key = self.key_of(&bounds.max);
        let mut out = Vec::new();
        for x in min_key.0..=max_key.0 {
            for y in min_key.1..=max_key.1 {
                for z in min_key.2..=max_key.2 {
                    let Some(bucket) = self.buckets.get(&(x, y, z)) else {
                        continue;
                    };
                    let leaf_min = Vector3::new(x as f32, y as f32, z as f32) * self.leaf_size;
                    let leaf_box = Box3Df::from_extents(leaf_min, Vector3::new(self.leaf_size, self.leaf_size, self.leaf_size));
                    if bounds.intersects(&leaf_box) {
                        out.extend_from_slice(bucket);
                    }
                }
            }
        }
        out
    }

    pub fn all_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.values().flatten().copied()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_find_self_voxel_neighbor() {
        let mut index = SpatialIndex::new(0.1);
        let p = Vector3::new(0.02, 0.02, 0.02);
        index.insert(7, &p);
        assert_eq!(index.neighbor_indices(&p), vec![7]);
    }

    #[test]
    fn should_find_across_adjacent_voxel_boundary() {
        let mut index = SpatialIndex::new(0.1);
        index.insert(1, &Vector3::new(0.099, 0.05, 0.05));
        let neighbors = index.neighbor_indices(&Vector3::new(0.101, 0.05, 0.05));
        assert_eq!(neighbors, vec![1]);
    }

    #[test]
    fn should_remove_handle_from_its_voxel() {
        let mut index = SpatialIndex::new(0.1);
        let p = Vector3::new(0.05, 0.05, 0.05);
        index.insert(3, &p);
        index.remove(3, &p);
        assert!(index.neighbor_indices(&p).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn should_clamp_update_into_original_voxel() {
        let index = SpatialIndex::new(0.1);
        let original = Vector3::new(0.05, 0.05, 0.05);
        let proposed = Vector3::new(0.2, 0.05, 0.05);
        let clamped = index.clamp_to_voxel(&original, &proposed);
        assert!(clamped.is_none());

        let small_move = Vector3::new(0.099, 0.05, 0.05);
        let clamped = index.clamp_to_voxel(&original, &small_move).unwrap();
        assert!(clamped.x < 0.1);
    }

    #[test]
    fn should_reject_clamp_landing_exactly_on_voxel_far_face() {
        // `original` sits in voxel (0, 0, 0) = [0, 0.1). `proposed` is
        // already exactly on the voxel's far face (x = 0.1), so `clamp`
        // passes it through unchanged and the half-voxel distortion check
        // alone would accept it (distance zero). But
        // floor(0.1 / 0.1) = 1, i.e. voxel (1, 0, 0): the point is no
        // longer inside the voxel the handle stays registered under, so
        // this must still be rejected.
        let index = SpatialIndex::new(0.1);
        let original = Vector3::new(0.06, 0.05, 0.05);
        let proposed = Vector3::new(0.1, 0.05, 0.05);
        assert_eq!(index.key_of(&original), (0, 0, 0));
        assert_eq!(index.key_of(&proposed), (1, 0, 0));
        assert!(index.clamp_to_voxel(&original, &proposed).is_none());
    }

    #[test]
    fn should_clear_all_buckets() {
        let mut index = SpatialIndex::new(0.1);
        index.insert(1, &Vector3::new(0.0, 0.0, 0.0));
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.all_indices().count(), 0);
    }
}
