/// In-process tuning knobs for the fusion engine.
///
/// Mirrors the teacher's builder-style parameter structs (`ICPParams`): a
/// plain data struct with a sensible `Default` plus chained `with_*`
/// setters, so callers override only what they need. Reading these values
/// out of a config file, CLI flags, or environment variables is left to the
/// embedding application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusionParams {
    /// Depth tolerance (meters) for a candidate to match an existing surfel.
    pub dmax: f32,
    /// Scan points closer than this (meters) are rejected.
    pub min_kinect_dist: f32,
    /// Scan points farther than this (meters) are rejected.
    pub max_kinect_dist: f32,
    /// Spatial index leaf side length (meters).
    pub octree_resolution: f32,
    /// Preview voxel side length (meters).
    pub preview_resolution: f32,
    /// Reliable samples averaged per preview voxel.
    pub preview_color_samples_in_voxel: usize,
    /// `C*`: minimum confidence for a surfel to be considered reliable.
    pub confidence_threshold: u32,
    /// Minimum `|n_z|` in camera frame; grazing pixels below this are dropped.
    pub min_scan_znormal: f32,
    /// Whether to pre-filter candidate surfels by frustum before association.
    pub use_frustum: bool,
    /// Surfel store capacity.
    pub scene_size: usize,
    /// Whether structured per-frame logging is enabled.
    pub logging: bool,
    /// If false, every surviving pixel inserts a new surfel instead of
    /// attempting to match and update an existing one.
    pub use_update: bool,
    /// Visualization-only throttle on preview output: emit one point for
    /// every `preview_stride`-th reliable surfel encountered. `1` emits
    /// every candidate point.
    pub preview_stride: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            dmax: 0.005,
            min_kinect_dist: 0.8,
            max_kinect_dist: 4.0,
            octree_resolution: 0.2,
            preview_resolution: 0.2,
            preview_color_samples_in_voxel: 3,
            confidence_threshold: 5,
            min_scan_znormal: 0.2,
            use_frustum: true,
            scene_size: 30_000_000,
            logging: true,
            use_update: true,
            preview_stride: 1,
        }
    }
}

impl FusionParams {
    pub fn with_dmax(mut self, dmax: f32) -> Self {
        self.dmax = dmax;
        self
    }

    pub fn with_kinect_range(mut self, min_kinect_dist: f32, max_kinect_dist: f32) -> Self {
        self.min_kinect_dist = min_kinect_dist;
        self.max_kinect_dist = max_kinect_dist;
        self
    }

    pub fn with_octree_resolution(mut self, octree_resolution: f32) -> Self {
        self.octree_resolution = octree_resolution;
        self
    }

    pub fn with_preview_resolution(mut self, preview_resolution: f32) -> Self {
        self.preview_resolution = preview_resolution;
        self
    }

    pub fn with_preview_color_samples_in_voxel(mut self, samples: usize) -> Self {
        self.preview_color_samples_in_voxel = samples;
        self
    }

    pub fn with_confidence_threshold(mut self, confidence_threshold: u32) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn with_min_scan_znormal(mut self, min_scan_znormal: f32) -> Self {
        self.min_scan_znormal = min_scan_znormal;
        self
    }

    pub fn with_use_frustum(mut self, use_frustum: bool) -> Self {
        self.use_frustum = use_frustum;
        self
    }

    pub fn with_scene_size(mut self, scene_size: usize) -> Self {
        self.scene_size = scene_size;
        self
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_use_update(mut self, use_update: bool) -> Self {
        self.use_update = use_update;
        self
    }

    pub fn with_preview_stride(mut self, preview_stride: usize) -> Self {
        self.preview_stride = preview_stride.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_spec_defaults() {
        let params = FusionParams::default();
        assert_eq!(params.dmax, 0.005);
        assert_eq!(params.min_kinect_dist, 0.8);
        assert_eq!(params.max_kinect_dist, 4.0);
        assert_eq!(params.octree_resolution, 0.2);
        assert_eq!(params.preview_resolution, 0.2);
        assert_eq!(params.preview_color_samples_in_voxel, 3);
        assert_eq!(params.confidence_threshold, 5);
        assert_eq!(params.min_scan_znormal, 0.2);
        assert!(params.use_frustum);
        assert_eq!(params.scene_size, 30_000_000);
        assert!(params.logging);
        assert!(params.use_update);
        assert_eq!(params.preview_stride, 1);
    }

    #[test]
    fn should_chain_builder_overrides() {
        let params = FusionParams::default()
            .with_dmax(0.01)
            .with_use_update(false)
            .with_scene_size(10);
        assert_eq!(params.dmax, 0.01);
        assert!(!params.use_update);
        assert_eq!(params.scene_size, 10);
    }

    #[test]
    fn should_floor_preview_stride_at_one() {
        let params = FusionParams::default().with_preview_stride(0);
        assert_eq!(params.preview_stride, 1);
    }
}
