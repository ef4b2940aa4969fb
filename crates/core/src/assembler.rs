use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::AssemblyConfig,
    error::{Result, SpoilerError},
    ranking::{Chronological, RankingStrategy},
    types::{DurationMode, Segment, TargetDuration, Timeline},
};

/// What to do with candidates whose ranges intersect an included segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Include duplicates and overlaps; the rendered cut may repeat footage.
    #[default]
    Keep,
    SkipOverlapping,
}

/// Greedy, duration-bounded timeline builder.
pub struct Assembler {
    ranking: Box<dyn RankingStrategy>,
    overlap_policy: OverlapPolicy,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            ranking: Box::new(Chronological),
            overlap_policy: OverlapPolicy::Keep,
        }
    }
}

impl Assembler {
    pub fn new(ranking: Box<dyn RankingStrategy>, overlap_policy: OverlapPolicy) -> Self {
        Self {
            ranking,
            overlap_policy,
        }
    }

    pub fn from_config(config: &AssemblyConfig) -> Self {
        Self::new(config.ranking.strategy(), config.overlap_policy)
    }

    /// Build a timeline from candidate segments.
    ///
    /// Candidates are walked once in ranked order. A segment that would push
    /// the total past the target is skipped and the walk continues; the walk
    /// stops as soon as the total reaches the target. `progress` receives the
    /// fill percentage after every inclusion.
    ///
    /// `source_length` is the provider's authoritative video length; without
    /// it percentage targets are measured against the latest segment end.
    pub fn assemble(
        &self,
        segments: Vec<Segment>,
        target: TargetDuration,
        source_length: Option<f64>,
        progress: &mut dyn FnMut(f64),
    ) -> Result<Timeline> {
        let candidates = segments.len();
        if candidates == 0 {
            return Err(SpoilerError::NoSegmentsAssembled { candidates });
        }

        let estimated_length = source_length.unwrap_or_else(|| estimate_length(&segments));
        let target_duration = resolve_target(target, estimated_length)?;
        info!(
            "Assembling up to {target_duration:.1}s from {candidates} candidates ({} mode)",
            target.mode
        );

        let mut included: Vec<Segment> = Vec::new();
        let mut total_duration = 0.0;

        for segment in self.ranking.rank(segments, estimated_length) {
            let length = segment.duration();
            if total_duration + length > target_duration {
                debug!(
                    "Skipping [{:.1}, {:.1}]: {length:.1}s does not fit",
                    segment.start(),
                    segment.end()
                );
                continue;
            }
            if self.overlap_policy == OverlapPolicy::SkipOverlapping
                && included.iter().any(|s| s.overlaps(&segment))
            {
                debug!(
                    "Skipping [{:.1}, {:.1}]: overlaps an included segment",
                    segment.start(),
                    segment.end()
                );
                continue;
            }

            total_duration += length;
            included.push(segment);
            progress((total_duration / target_duration * 100.0).min(100.0));

            if total_duration >= target_duration {
                break;
            }
        }

        if included.is_empty() {
            return Err(SpoilerError::NoSegmentsAssembled { candidates });
        }

        info!(
            "Assembled {} segments, {total_duration:.1}s of {target_duration:.1}s",
            included.len()
        );
        Ok(Timeline {
            segments: included,
            total_duration,
            target_duration,
        })
    }
}

/// Lower-bound estimate of the source length: the latest segment end.
pub fn estimate_length(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::end).fold(0.0, f64::max)
}

/// Turn a requested duration into seconds.
pub fn resolve_target(target: TargetDuration, estimated_length: f64) -> Result<f64> {
    let invalid = |reason: &str| SpoilerError::InvalidTarget {
        value: target.value,
        reason: reason.to_string(),
    };

    if !target.value.is_finite() || target.value <= 0.0 {
        return Err(invalid("must be a positive number"));
    }

    match target.mode {
        DurationMode::Seconds => Ok(target.value),
        DurationMode::Percentage => {
            if target.value > 100.0 {
                return Err(invalid("percentage must not exceed 100"));
            }
            let seconds = target.value / 100.0 * estimated_length;
            if seconds <= 0.0 {
                return Err(invalid("source length is unknown"));
            }
            Ok(seconds)
        }
    }
}
