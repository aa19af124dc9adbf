use crate::bounds::Box3Df;
use crate::fusion::FusionEngine;

/// Read-only spatial and enumeration queries over a [`FusionEngine`]'s map,
/// kept as a thin façade over the store and spatial index rather than
/// letting callers reach into either directly (§9: "keep them behind a
/// single façade so the clamping invariant cannot be violated by ad-hoc
/// callers").
pub struct MapQuery<'a> {
    engine: &'a FusionEngine,
}

impl<'a> MapQuery<'a> {
    pub fn new(engine: &'a FusionEngine) -> Self {
        Self { engine }
    }

    /// Reliable surfel indices whose positions lie within `bounds`. Callers
    /// may still see non-finite records from stale handles and must filter.
    pub fn bounding_box_indices(&self, bounds: &Box3Df) -> Vec<usize> {
        let confidence_threshold = self.engine.params().confidence_threshold;
        self.engine
            .index()
            .query_box(bounds)
            .into_iter()
            .filter(|&i| {
                self.engine
                    .store()
                    .get(i)
                    .map(|s| s.is_reliable(confidence_threshold) && bounds.contains(&s.position))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Every currently valid index, reliable or not, for external savers.
    pub fn all_indices(&self) -> Vec<usize> {
        self.engine.store().iter().map(|(index, _)| index).collect()
    }

    /// The tight axis-aligned box enclosing every currently valid surfel,
    /// or `None` when the map is empty. Lets a caller size a
    /// [`Self::bounding_box_indices`] query to the map's actual extent
    /// instead of guessing (§5: "callers bound cost by sizing the box").
    pub fn map_bounds(&self) -> Option<Box3Df> {
        let mut positions = self.engine.store().iter().map(|(_, s)| s.position);
        let first = positions.next()?;
        let mut bounds = Box3Df::from_min_max(first, first);
        for position in positions {
            bounds.grow(&position);
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionParams;
    use crate::geometry::{Intrinsics, Pose};
    use crate::keyframe::Pixel;
    use nalgebra::Vector3;
    use ndarray::Array2;

    fn engine_with_one_surfel() -> FusionEngine {
        let mut engine = FusionEngine::new(FusionParams::default().with_confidence_threshold(1));
        engine
            .set_intrinsics(Intrinsics::new(500.0, 500.0, 320.0, 240.0))
            .unwrap();
        let intr = Intrinsics::new(500.0, 500.0, 320.0, 240.0);
        let mut grid = Array2::from_elem((8, 8), Pixel::missing());
        for dv in 0..=1 {
            for du in 0..=1 {
                let p = intr.backproject((3 + du) as f32, (3 + dv) as f32, 1.0);
                grid[(3 + dv, 3 + du)] = Pixel::new(p, Vector3::new(9, 9, 9));
            }
        }
        engine.ingest_keyframe(grid, Pose::identity()).unwrap();
        engine
    }

    #[test]
    fn should_return_all_indices_after_insert() {
        let engine = engine_with_one_surfel();
        let query = MapQuery::new(&engine);
        assert_eq!(query.all_indices().len(), 1);
    }

    #[test]
    fn should_find_surfel_within_wide_bounding_box() {
        let engine = engine_with_one_surfel();
        let query = MapQuery::new(&engine);
        let huge = Box3Df::from_min_max(Vector3::new(-10.0, -10.0, -10.0), Vector3::new(10.0, 10.0, 10.0));
        assert_eq!(query.bounding_box_indices(&huge).len(), 1);
    }

    #[test]
    fn should_miss_surfel_outside_bounding_box() {
        let engine = engine_with_one_surfel();
        let query = MapQuery::new(&engine);
        let far_away = Box3Df::from_min_max(Vector3::new(100.0, 100.0, 100.0), Vector3::new(101.0, 101.0, 101.0));
        assert!(query.bounding_box_indices(&far_away).is_empty());
    }

    #[test]
    fn should_return_empty_indices_after_reset() {
        let mut engine = engine_with_one_surfel();
        engine.reset_map();
        let query = MapQuery::new(&engine);
        assert!(query.all_indices().is_empty());
    }

    #[test]
    fn should_report_no_bounds_for_empty_map() {
        let engine = FusionEngine::new(FusionParams::default());
        let query = MapQuery::new(&engine);
        assert!(query.map_bounds().is_none());
    }

    #[test]
    fn should_report_tight_bounds_around_single_surfel() {
        let engine = engine_with_one_surfel();
        let query = MapQuery::new(&engine);
        let bounds = query.map_bounds().unwrap();
        let (_, surfel) = engine.store().iter().next().unwrap();
        assert!(bounds.contains(&surfel.position));
        assert_eq!(bounds.min, bounds.max);
    }
}
