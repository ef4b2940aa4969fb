use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpoilerError};

/// A candidate time range in the source video together with the sentence
/// that justified picking it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    start: f64,
    end: f64,
    sentence: String,
}

impl Segment {
    /// Build a segment, rejecting ranges that are empty, inverted, negative
    /// or not finite.
    pub fn new(start: f64, end: f64, sentence: impl Into<String>) -> Result<Self> {
        let invalid = |reason: &str| SpoilerError::InvalidSegment {
            start,
            end,
            reason: reason.to_string(),
        };

        if !start.is_finite() || !end.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if start < 0.0 {
            return Err(invalid("start must not be negative"));
        }
        if start >= end {
            return Err(invalid("start must be before end"));
        }

        Ok(Self {
            start,
            end,
            sentence: sentence.into(),
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// How a requested summary length is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationMode {
    #[default]
    Seconds,
    Percentage,
}

impl fmt::Display for DurationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationMode::Seconds => write!(f, "seconds"),
            DurationMode::Percentage => write!(f, "percentage"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetDuration {
    pub value: f64,
    pub mode: DurationMode,
}

impl TargetDuration {
    pub fn seconds(value: f64) -> Self {
        Self {
            value,
            mode: DurationMode::Seconds,
        }
    }

    pub fn percentage(value: f64) -> Self {
        Self {
            value,
            mode: DurationMode::Percentage,
        }
    }
}

/// The assembled cut, in playback order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub segments: Vec<Segment>,
    pub total_duration: f64,
    pub target_duration: f64,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Reference to a video uploaded to the video service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoHandle {
    pub id: String,
    pub source_url: String,
    /// Authoritative length in seconds, when the service reports one.
    pub length: Option<f64>,
}

/// One clip of a render request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineClip {
    pub video_id: String,
    pub start: f64,
    pub end: f64,
}

/// A submitted highlight job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub video_url: String,
    pub title: String,
    pub genres: Vec<String>,
    pub target: TargetDuration,
}

impl JobSpec {
    /// Replaces the "Other" genre placeholder with the free-text genre, or
    /// drops it when none was given.
    pub fn resolve_genres(mut genres: Vec<String>, other_genre: Option<&str>) -> Vec<String> {
        if let Some(pos) = genres.iter().position(|g| g == "Other") {
            genres.remove(pos);
            if let Some(other) = other_genre.map(str::trim).filter(|g| !g.is_empty()) {
                genres.push(other.to_string());
            }
        }
        genres
    }
}
