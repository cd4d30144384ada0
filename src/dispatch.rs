//! Batch dispatcher — releases normalized features to the rendering
//! consumer in fixed-size, paced batches.
//!
//! The consumer runs on a cooperative scheduler and renders one feature at
//! a time; a few thousand features delivered at once would starve it.
//! Pacing only changes timing, never completeness: every feature is
//! delivered exactly once.

use std::time::Duration;

use tracing::debug;

use crate::model::{BatchProgress, NormalizedFeature};

/// Result sets at or under this size go out in a single batch.
pub const LARGE_THRESHOLD: usize = 200;
/// Batch size for large result sets.
pub const BATCH_SIZE: usize = 50;
/// Pause between batches, yielding the scheduler back to the consumer.
pub const BATCH_DELAY: Duration = Duration::from_millis(50);

/// Receives dispatched features and batch progress events.
pub trait FeatureConsumer: Send {
    fn feature(&mut self, feature: &NormalizedFeature);
    fn progress(&mut self, progress: BatchProgress);
}

/// Dispatch all features to the consumer.
///
/// Small sets are released as one batch with no pause. Large sets are
/// split into `BATCH_SIZE` chunks; each chunk is delivered synchronously,
/// a progress event is emitted, and an inter-batch pause yields control
/// before the next chunk. An empty set is zero batches: no features, no
/// progress events.
pub async fn dispatch<C: FeatureConsumer>(features: &[NormalizedFeature], consumer: &mut C) {
    if features.is_empty() {
        return;
    }

    if features.len() <= LARGE_THRESHOLD {
        for feature in features {
            consumer.feature(feature);
        }
        consumer.progress(BatchProgress {
            batch_index: 1,
            total_batches: 1,
            items_in_batch: features.len(),
        });
        return;
    }

    let total_batches = features.len().div_ceil(BATCH_SIZE);
    debug!(features = features.len(), total_batches, "dispatching in paced batches");

    for (index, chunk) in features.chunks(BATCH_SIZE).enumerate() {
        for feature in chunk {
            consumer.feature(feature);
        }
        consumer.progress(BatchProgress {
            batch_index: index + 1,
            total_batches,
            items_in_batch: chunk.len(),
        });
        if index + 1 < total_batches {
            tokio::time::sleep(BATCH_DELAY).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Geometry;

    struct Recorder {
        features: Vec<String>,
        progress: Vec<BatchProgress>,
    }

    impl Recorder {
        fn new() -> Self {
            Self { features: Vec::new(), progress: Vec::new() }
        }
    }

    impl FeatureConsumer for Recorder {
        fn feature(&mut self, feature: &NormalizedFeature) {
            self.features.push(feature.id.clone());
        }
        fn progress(&mut self, progress: BatchProgress) {
            self.progress.push(progress);
        }
    }

    fn make_features(n: usize) -> Vec<NormalizedFeature> {
        (0..n)
            .map(|i| NormalizedFeature {
                id: i.to_string(),
                display_name: String::new(),
                address: String::new(),
                type_label: String::new(),
                dataset_tag: "test".into(),
                latitude: 24.0,
                longitude: 54.0,
                projected_x: 0.0,
                projected_y: 0.0,
                preserved_geometry: Geometry::Point { x: 54.0, y: 24.0 },
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_set_single_batch() {
        let features = make_features(120);
        let mut rec = Recorder::new();
        dispatch(&features, &mut rec).await;
        assert_eq!(rec.features.len(), 120);
        assert_eq!(rec.progress.len(), 1);
        assert_eq!(rec.progress[0].items_in_batch, 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_set_batch_count_and_completeness() {
        let features = make_features(230);
        let mut rec = Recorder::new();
        dispatch(&features, &mut rec).await;

        // ceil(230 / 50) = 5 batches whose sizes sum to 230.
        assert_eq!(rec.progress.len(), 5);
        assert_eq!(rec.progress.iter().map(|p| p.items_in_batch).sum::<usize>(), 230);
        assert_eq!(rec.features.len(), 230);
        // No feature dropped or duplicated, order preserved.
        for (i, id) in rec.features.iter().enumerate() {
            assert_eq!(id, &i.to_string());
        }
        for (i, p) in rec.progress.iter().enumerate() {
            assert_eq!(p.batch_index, i + 1);
            assert_eq!(p.total_batches, 5);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_set_emits_nothing() {
        let mut rec = Recorder::new();
        dispatch(&[], &mut rec).await;
        assert!(rec.features.is_empty());
        // Zero features means zero batches, so no progress either.
        assert!(rec.progress.is_empty());
    }
}
