//! Thumbnail timestamp planning.

use clipforge_common::error::{ClipforgeError, ClipforgeResult};
use clipforge_media_model::scene::Scene;
use clipforge_media_model::thumbnail::{ThumbnailInterval, ThumbnailOptions, ThumbnailRequest};

/// Two timestamps closer than this are the same frame for planning purposes.
const SAME_FRAME_SECS: f64 = 1e-3;

/// Pick the timestamps to grab thumbnails at, in ascending order.
///
/// `Uniform` spaces `count` timestamps over `[0, duration]`. `Smart` takes
/// the start of the `count` longest scenes and fills any shortfall with
/// uniform timestamps.
pub fn plan_thumbnails(
    duration_secs: f64,
    options: &ThumbnailOptions,
    scenes: &[Scene],
) -> ClipforgeResult<Vec<f64>> {
    options
        .validate()
        .map_err(|e| ClipforgeError::validation(e.to_string()))?;

    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(ClipforgeError::validation(format!(
            "duration must be > 0, got {duration_secs}"
        )));
    }

    let count = options.count as usize;
    let uniform = uniform_timestamps(duration_secs, count);

    let timestamps = match options.interval {
        ThumbnailInterval::Uniform => uniform,
        ThumbnailInterval::Smart => {
            let mut ranked: Vec<&Scene> = scenes.iter().collect();
            ranked.sort_by(|a, b| {
                b.duration_secs()
                    .total_cmp(&a.duration_secs())
                    .then(a.start_secs.total_cmp(&b.start_secs))
            });

            let mut picked: Vec<f64> = ranked
                .into_iter()
                .take(count)
                .map(|s| s.start_secs)
                .collect();

            for t in uniform {
                if picked.len() >= count {
                    break;
                }
                if picked.iter().all(|p| (p - t).abs() > SAME_FRAME_SECS) {
                    picked.push(t);
                }
            }

            picked.sort_by(f64::total_cmp);
            picked
        }
    };

    tracing::debug!(
        count = timestamps.len(),
        interval = ?options.interval,
        "Planned thumbnails"
    );

    Ok(timestamps)
}

fn uniform_timestamps(duration_secs: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![0.0];
    }
    let step = duration_secs / (count - 1) as f64;
    (0..count).map(|i| i as f64 * step).collect()
}

/// One request per planned timestamp.
pub fn thumbnail_requests(timestamps: &[f64], options: &ThumbnailOptions) -> Vec<ThumbnailRequest> {
    timestamps
        .iter()
        .map(|&timestamp_secs| ThumbnailRequest {
            timestamp_secs,
            width: options.width,
            height: options.height,
            quality: options.quality,
            format: options.format,
        })
        .collect()
}
