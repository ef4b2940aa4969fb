use serde::{Deserialize, Serialize};

use crate::types::Segment;

/// Decides the order in which the assembler considers candidate segments.
pub trait RankingStrategy: Send + Sync {
    fn rank(&self, segments: Vec<Segment>, total_duration: f64) -> Vec<Segment>;
}

/// Source order: ascending start time, ties kept in input order.
pub struct Chronological;

impl RankingStrategy for Chronological {
    fn rank(&self, mut segments: Vec<Segment>, _total_duration: f64) -> Vec<Segment> {
        segments.sort_by(|a, b| a.start().total_cmp(&b.start()));
        segments
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativePhase {
    Introduction,
    RisingAction,
    Climax,
    FallingAction,
    Resolution,
}

impl NarrativePhase {
    /// Phase for a relative position in `[0, 1]`.
    pub fn at(position: f64) -> Self {
        match position {
            p if p < 0.1 => NarrativePhase::Introduction,
            p if p < 0.5 => NarrativePhase::RisingAction,
            p if p < 0.8 => NarrativePhase::Climax,
            p if p < 0.9 => NarrativePhase::FallingAction,
            _ => NarrativePhase::Resolution,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            NarrativePhase::Climax => 1.0,
            NarrativePhase::Resolution => 0.9,
            NarrativePhase::RisingAction => 0.8,
            NarrativePhase::FallingAction => 0.7,
            NarrativePhase::Introduction => 0.6,
        }
    }
}

/// Climax first, then resolution, rising action, falling action and
/// introduction; chronological within a phase.
pub struct NarrativeArc;

impl RankingStrategy for NarrativeArc {
    fn rank(&self, segments: Vec<Segment>, total_duration: f64) -> Vec<Segment> {
        let mut segments = Chronological.rank(segments, total_duration);
        if !(total_duration.is_finite() && total_duration > 0.0) {
            return segments;
        }
        let weight = |s: &Segment| {
            NarrativePhase::at((s.start() / total_duration).clamp(0.0, 1.0)).weight()
        };
        segments.sort_by(|a, b| weight(b).total_cmp(&weight(a)));
        segments
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingKind {
    #[default]
    Chronological,
    Narrative,
}

impl RankingKind {
    pub fn strategy(&self) -> Box<dyn RankingStrategy> {
        match self {
            RankingKind::Chronological => Box::new(Chronological),
            RankingKind::Narrative => Box::new(NarrativeArc),
        }
    }
}
