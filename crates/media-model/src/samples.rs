//! Change-metric samples: the raw signal scene segmentation consumes.
//!
//! Samples are stored as JSONL, one `{"t": secs, "score": value}` object
//! per line. Lines starting with `#` are treated as comments so a stream
//! can carry a header describing how the metric was computed.

use serde::{Deserialize, Serialize};

/// A timestamped scalar describing how much the picture changed at `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeSample {
    /// Seconds from the start of the media.
    #[serde(rename = "t")]
    pub timestamp_secs: f64,

    /// Non-negative, unbounded change magnitude.
    pub score: f64,
}

impl ChangeSample {
    pub fn new(timestamp_secs: f64, score: f64) -> Self {
        Self {
            timestamp_secs,
            score,
        }
    }
}

/// Parse samples from JSONL content (one JSON object per line).
pub fn parse_samples(jsonl: &str) -> Result<Vec<ChangeSample>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize samples to JSONL format.
pub fn serialize_samples(samples: &[ChangeSample]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for sample in samples {
        output.push_str(&serde_json::to_string(sample)?);
        output.push('\n');
    }
    Ok(output)
}

/// Parse the frame-metadata dump a media tool writes when filtering frames
/// by scene score (`select='gt(scene,T)',metadata=print`).
///
/// Each selected frame produces a `pts_time:<secs>` line, usually followed by
/// a `lavfi.scene_score=<value>` line. A frame without a score line gets
/// `f64::INFINITY`, since the tool only printed it because it passed the
/// threshold. Unparseable lines are ignored.
pub fn parse_scene_metadata(text: &str) -> Vec<ChangeSample> {
    let mut samples: Vec<ChangeSample> = Vec::new();
    let mut pending: Option<f64> = None;

    for line in text.lines() {
        if let Some(rest) = line.split("pts_time:").nth(1) {
            if let Some(t) = pending.take() {
                samples.push(ChangeSample::new(t, f64::INFINITY));
            }
            let value = rest.split_whitespace().next().unwrap_or("");
            pending = value.parse::<f64>().ok();
        } else if let Some(rest) = line.split("lavfi.scene_score=").nth(1) {
            if let (Some(t), Ok(score)) = (pending, rest.trim().parse::<f64>()) {
                samples.push(ChangeSample::new(t, score));
                pending = None;
            }
        }
    }

    if let Some(t) = pending {
        samples.push(ChangeSample::new(t, f64::INFINITY));
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_roundtrip() {
        let samples = vec![
            ChangeSample::new(0.0, 0.1),
            ChangeSample::new(1.0, 0.9),
            ChangeSample::new(2.5, 0.05),
        ];
        let jsonl = serialize_samples(&samples).unwrap();
        let parsed = parse_samples(&jsonl).unwrap();
        assert_eq!(samples, parsed);
    }

    #[test]
    fn test_parse_skips_header_comment() {
        let jsonl = "# {\"metric\":\"histogram\"}\n{\"t\":0.5,\"score\":0.3}\n\n";
        let parsed = parse_samples(jsonl).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!((parsed[0].timestamp_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_string(&ChangeSample::new(1.5, 0.25)).unwrap();
        assert!(json.contains("\"t\":1.5"));
        assert!(json.contains("\"score\":0.25"));
    }

    #[test]
    fn test_parse_scene_metadata_with_scores() {
        let dump = "frame:0    pts:48048   pts_time:2.002\n\
                    lavfi.scene_score=0.612\n\
                    frame:1    pts:144144  pts_time:6.006\n\
                    lavfi.scene_score=0.48\n";
        let samples = parse_scene_metadata(dump);
        assert_eq!(samples.len(), 2);
        assert!((samples[0].timestamp_secs - 2.002).abs() < 1e-9);
        assert!((samples[0].score - 0.612).abs() < 1e-9);
        assert!((samples[1].timestamp_secs - 6.006).abs() < 1e-9);
    }

    #[test]
    fn test_parse_scene_metadata_without_scores() {
        let dump = "frame:0 pts:1 pts_time:1.0\nframe:1 pts:2 pts_time:3.5\n";
        let samples = parse_scene_metadata(dump);
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.score.is_infinite()));
        assert!((samples[1].timestamp_secs - 3.5).abs() < 1e-9);
    }
}
