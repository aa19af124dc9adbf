mod associate;
mod scan;

use std::collections::HashSet;

use ndarray::Array2;

use crate::config::FusionParams;
use crate::error::FusionError;
use crate::geometry::{Frustum, Intrinsics, Pose};
use crate::keyframe::{Keyframe, Pixel};
use crate::logger::{FrameRecord, FusionLogger, LogValue};
use crate::octree::SpatialIndex;
use crate::store::{StoreFull, SurfelStore};
use crate::surfel::Surfel;

use associate::{blend, find_match};
use scan::{preprocess_scan, ScanDrop};

pub use scan::ScanPoint;

/// Per-frame outcome of [`FusionEngine::ingest_keyframe`]. A `DegenerateScan`
/// (zero pixels surviving preprocessing) is represented here as every
/// counter at zero rather than as an error variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub pixels_total: usize,
    pub dropped_missing_depth: usize,
    pub dropped_degenerate_normal: usize,
    pub dropped_grazing_angle: usize,
    pub dropped_depth_range: usize,
    pub matched: usize,
    pub inserted: usize,
}

impl IngestSummary {
    fn record_drop(&mut self, drop: ScanDrop) {
        match drop {
            ScanDrop::MissingDepth => self.dropped_missing_depth += 1,
            ScanDrop::DegenerateNormal => self.dropped_degenerate_normal += 1,
            ScanDrop::GrazingAngle => self.dropped_grazing_angle += 1,
            ScanDrop::OutOfDepthRange => self.dropped_depth_range += 1,
        }
    }
}

/// The main per-keyframe reconstruction pipeline: scan preprocessing,
/// visibility filtering, per-pixel association, and update-or-insert.
pub struct FusionEngine {
    store: SurfelStore,
    index: SpatialIndex,
    params: FusionParams,
    logger: FusionLogger,
    intrinsics: Option<Intrinsics>,
}

const LOG_RING_CAPACITY: usize = 64;

impl FusionEngine {
    pub fn new(params: FusionParams) -> Self {
        let store = SurfelStore::with_capacity(params.scene_size);
        let index = SpatialIndex::new(params.octree_resolution);
        let logger = FusionLogger::new(params.logging, LOG_RING_CAPACITY);
        Self {
            store,
            index,
            params,
            logger,
            intrinsics: None,
        }
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    pub fn logger(&self) -> &FusionLogger {
        &self.logger
    }

    /// Sets the pinhole intrinsics used for every subsequent keyframe. A
    /// second call is ignored, matching the spec's "a second intrinsics
    /// message is ignored" contract.
    pub fn set_intrinsics(&mut self, intrinsics: Intrinsics) -> Result<(), FusionError> {
        if !intrinsics.is_valid() {
            return Err(FusionError::InvalidInput {
                reason: "intrinsics focal lengths must be strictly positive".to_string(),
            });
        }
        if self.intrinsics.is_none() {
            self.intrinsics = Some(intrinsics);
        }
        Ok(())
    }

    pub fn has_intrinsics(&self) -> bool {
        self.intrinsics.is_some()
    }

    /// Fuses one `W×H` organized RGB-D keyframe, observed from `pose`, into
    /// the map.
    pub fn ingest_keyframe(&mut self, grid: Array2<Pixel>, pose: Pose) -> Result<IngestSummary, FusionError> {
        let intrinsics = self.intrinsics.ok_or(FusionError::NotReady)?;
        let frame = Keyframe::new(grid, pose);
        let width = frame.width();
        let height = frame.height();

        let (points, drops) = preprocess_scan(
            &frame,
            &intrinsics,
            self.params.min_scan_znormal,
            self.params.min_kinect_dist,
            self.params.max_kinect_dist,
        );

        let mut summary = IngestSummary {
            pixels_total: width * height,
            ..Default::default()
        };
        for drop in drops {
            summary.record_drop(drop);
        }

        let visible = self.visible_candidates(&pose, &intrinsics, width, height);

        for point in &points {
            let raw_candidates = self.index.neighbor_indices(&point.position_map);
            let candidates: Vec<usize> = match &visible {
                Some(set) => raw_candidates.into_iter().filter(|c| set.contains(c)).collect(),
                None => raw_candidates,
            };

            let matched = if self.params.use_update {
                find_match(
                    &candidates,
                    point,
                    &self.store,
                    &pose,
                    &intrinsics,
                    width,
                    height,
                    self.params.dmax,
                )
            } else {
                None
            };

            match matched {
                Some(index) => self.apply_update(index, point),
                None => {
                    if self.apply_insert(point).is_err() {
                        self.log_ingest(&summary);
                        return Err(FusionError::OutOfCapacity {
                            integrated: summary.matched + summary.inserted,
                        });
                    }
                    summary.inserted += 1;
                    continue;
                }
            }
            summary.matched += 1;
        }

        self.log_ingest(&summary);
        Ok(summary)
    }

    fn visible_candidates(
        &self,
        pose: &Pose,
        intrinsics: &Intrinsics,
        width: usize,
        height: usize,
    ) -> Option<HashSet<usize>> {
        if !self.params.use_frustum {
            return None;
        }
        let frustum = Frustum::new(
            *pose,
            *intrinsics,
            width,
            height,
            self.params.min_kinect_dist,
            self.params.max_kinect_dist,
        );
        Some(
            self.index
                .all_indices()
                .filter(|&i| {
                    self.store
                        .get(i)
                        .map(|s| frustum.contains_map_point(&s.position))
                        .unwrap_or(false)
                })
                .collect(),
        )
    }

    fn apply_update(&mut self, index: usize, point: &ScanPoint) {
        let existing = match self.store.get(index) {
            Some(s) => *s,
            None => return,
        };
        let blended = blend(
            existing.position,
            existing.normal,
            existing.color,
            existing.radius,
            existing.confidence,
            point,
        );
        let position = self
            .index
            .clamp_to_voxel(&existing.position, &blended.position)
            .unwrap_or(existing.position);
        self.store.set(
            index,
            Surfel::new(position, blended.normal, blended.color, blended.radius, blended.confidence),
        );
    }

    fn apply_insert(&mut self, point: &ScanPoint) -> Result<usize, StoreFull> {
        let surfel = Surfel::new(point.position_map, point.normal_map, point.color, point.radius, 1);
        let index = self.store.allocate(surfel)?;
        self.index.insert(index, &point.position_map);
        Ok(index)
    }

    fn log_ingest(&self, summary: &IngestSummary) {
        let record = FrameRecord::new("ingest_keyframe")
            .with("pixels_total", LogValue::UInt(summary.pixels_total as u64))
            .with("matched", LogValue::UInt(summary.matched as u64))
            .with("inserted", LogValue::UInt(summary.inserted as u64))
            .with(
                "dropped_missing_depth",
                LogValue::UInt(summary.dropped_missing_depth as u64),
            )
            .with(
                "dropped_degenerate_normal",
                LogValue::UInt(summary.dropped_degenerate_normal as u64),
            )
            .with(
                "dropped_grazing_angle",
                LogValue::UInt(summary.dropped_grazing_angle as u64),
            )
            .with("dropped_depth_range", LogValue::UInt(summary.dropped_depth_range as u64))
            .with("store_len", LogValue::UInt(self.store.len() as u64));
        self.logger.log_frame(record);
    }

    /// Invalidates every surfel and clears the spatial index. Idempotent.
    pub fn reset_map(&mut self) {
        self.store.reset();
        self.index.clear();
    }

    pub fn store(&self) -> &SurfelStore {
        &self.store
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }
}
