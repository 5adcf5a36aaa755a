//! Metrics describing a corpus preparation run.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Pipeline stage a metrics sample belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Byte-to-character decoding of the raw input.
    Decode,
    /// Markup stripping (or verbatim copy in raw mode).
    Normalize,
    /// Vocabulary construction.
    Vocabulary,
    /// Character-to-code encoding.
    Encode,
    /// Train/validation partitioning.
    Split,
    /// Fixed-width and metadata serialisation.
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Decode => "decode",
            Stage::Normalize => "normalize",
            Stage::Vocabulary => "vocabulary",
            Stage::Encode => "encode",
            Stage::Split => "split",
            Stage::Serialize => "serialize",
        };
        f.write_str(label)
    }
}

/// Metrics captured for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageMetrics {
    /// Stage the sample describes.
    pub stage: Stage,
    /// Size of the stage output (characters, codes, or bytes depending on the stage).
    pub output_len: usize,
    /// Execution time for the stage.
    pub elapsed: Duration,
    /// Resident set size sample captured from `/proc/self/status` on Linux.
    pub rss_kb: Option<usize>,
}

/// Aggregate metrics produced by a preparation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineMetrics {
    /// Per-stage samples in execution order.
    pub stages: Vec<StageMetrics>,
    /// Total duration of the run.
    pub total_duration: Duration,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    /// Creates an empty metrics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::with_capacity(6),
            total_duration: Duration::ZERO,
        }
    }

    /// Records a stage that started at `started`.
    pub fn record(&mut self, stage: Stage, output_len: usize, started: Instant) {
        self.stages.push(StageMetrics {
            stage,
            output_len,
            elapsed: started.elapsed(),
            rss_kb: sample_rss_kb(),
        });
    }

    /// Returns the sample recorded for `stage`, if any.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageMetrics> {
        self.stages.iter().find(|sample| sample.stage == stage)
    }

    /// Largest RSS sample seen during the run.
    #[must_use]
    pub fn peak_rss_kb(&self) -> Option<usize> {
        self.stages.iter().filter_map(|sample| sample.rss_kb).max()
    }
}

#[cfg(target_os = "linux")]
fn current_rss_kb() -> Option<usize> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open("/proc/self/status").ok()?;
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let value = rest
                .split_whitespace()
                .find_map(|part| part.parse::<usize>().ok());
            return value;
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn current_rss_kb() -> Option<usize> {
    None
}

/// Samples the current resident set size (RSS) on supported platforms.
pub fn sample_rss_kb() -> Option<usize> {
    current_rss_kb()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_stage_order() {
        let mut metrics = PipelineMetrics::new();
        let started = Instant::now();
        metrics.record(Stage::Decode, 10, started);
        metrics.record(Stage::Normalize, 4, started);
        let order: Vec<Stage> = metrics.stages.iter().map(|s| s.stage).collect();
        assert_eq!(order, vec![Stage::Decode, Stage::Normalize]);
        assert_eq!(metrics.stage(Stage::Normalize).map(|s| s.output_len), Some(4));
        assert!(metrics.stage(Stage::Split).is_none());
    }

    #[test]
    fn stage_names_serialise_in_snake_case() {
        let json = serde_json::to_string(&Stage::Vocabulary).unwrap();
        assert_eq!(json, "\"vocabulary\"");
        assert_eq!(Stage::Serialize.to_string(), "serialize");
    }
}
