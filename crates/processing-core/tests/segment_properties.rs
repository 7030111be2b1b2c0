use clipforge_media_model::samples::ChangeSample;
use clipforge_media_model::scene::{MediaMetadata, SceneDetectionResult};
use clipforge_processing_core::segment::{SegmentBuilder, SegmentConfig};
use proptest::prelude::*;

/// Strictly increasing timestamps built from positive gaps.
fn sample_stream() -> impl Strategy<Value = Vec<ChangeSample>> {
    prop::collection::vec((0.01f64..3.0, 0.0f64..1.0), 0..60).prop_map(|steps| {
        let mut t = 0.0;
        steps
            .into_iter()
            .map(|(gap, score)| {
                t += gap;
                ChangeSample::new(t, score)
            })
            .collect()
    })
}

fn stream_end(samples: &[ChangeSample], tail: f64) -> f64 {
    samples.last().map(|s| s.timestamp_secs).unwrap_or(0.0) + tail
}

proptest! {
    #[test]
    fn scenes_partition_the_stream(
        samples in sample_stream(),
        tail in 0.01f64..5.0,
        min_duration in 0.0f64..5.0,
        threshold in 0.0f64..1.0,
    ) {
        let end = stream_end(&samples, tail);
        let builder = SegmentBuilder::new(SegmentConfig::new(min_duration, threshold));
        let scenes = builder.build(&samples, Some(end)).unwrap();

        prop_assert!(!scenes.is_empty());
        let result = SceneDetectionResult::new(scenes, end, MediaMetadata::default());
        prop_assert_eq!(result.check_partition(), Vec::<String>::new());
    }

    #[test]
    fn only_the_last_scene_may_be_short(
        samples in sample_stream(),
        tail in 0.01f64..5.0,
        min_duration in 0.01f64..5.0,
        threshold in 0.0f64..1.0,
    ) {
        let end = stream_end(&samples, tail);
        let builder = SegmentBuilder::new(SegmentConfig::new(min_duration, threshold));
        let scenes = builder.build(&samples, Some(end)).unwrap();

        for scene in &scenes[..scenes.len() - 1] {
            prop_assert!(
                scene.duration_secs() >= min_duration,
                "{} lasts {} < {}",
                scene.id,
                scene.duration_secs(),
                min_duration
            );
        }
    }

    #[test]
    fn every_interior_boundary_is_a_cut_sample(
        samples in sample_stream(),
        tail in 0.01f64..5.0,
        threshold in 0.0f64..1.0,
    ) {
        let end = stream_end(&samples, tail);
        let builder = SegmentBuilder::new(SegmentConfig::new(0.5, threshold));
        let scenes = builder.build(&samples, Some(end)).unwrap();

        for scene in scenes.iter().skip(1) {
            let sample = samples
                .iter()
                .find(|s| s.timestamp_secs == scene.start_secs);
            prop_assert!(sample.is_some_and(|s| s.score > threshold));
        }
    }

    #[test]
    fn segmentation_is_deterministic(samples in sample_stream(), tail in 0.01f64..5.0) {
        let end = stream_end(&samples, tail);
        let builder = SegmentBuilder::with_defaults();
        prop_assert_eq!(
            builder.build(&samples, Some(end)).unwrap(),
            builder.build(&samples, Some(end)).unwrap()
        );
    }
}
