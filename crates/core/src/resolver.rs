use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    retry::{RetryPolicy, retry, with_timeout},
    types::{Segment, VideoHandle},
    video::VideoService,
};

/// Picks the authoritative match among a sentence's search hits.
pub trait MatchStrategy: Send + Sync {
    fn pick(&self, matches: &[Segment]) -> Option<Segment>;
}

/// Take the first hit the search returned.
pub struct FirstMatch;

impl MatchStrategy for FirstMatch {
    fn pick(&self, matches: &[Segment]) -> Option<Segment> {
        matches.first().cloned()
    }
}

/// Take the longest hit; the earliest one wins ties.
pub struct LongestMatch;

impl MatchStrategy for LongestMatch {
    fn pick(&self, matches: &[Segment]) -> Option<Segment> {
        matches
            .iter()
            .fold(None::<&Segment>, |best, m| match best {
                Some(b) if b.duration() >= m.duration() => Some(b),
                _ => Some(m),
            })
            .cloned()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategyKind {
    #[default]
    First,
    Longest,
}

impl MatchStrategyKind {
    pub fn strategy(&self) -> Box<dyn MatchStrategy> {
        match self {
            MatchStrategyKind::First => Box::new(FirstMatch),
            MatchStrategyKind::Longest => Box::new(LongestMatch),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            retry: RetryPolicy::none(),
        }
    }
}

/// Map each sentence to one segment of the source video.
///
/// Sentences without a usable match are dropped. The result is unsorted and
/// may contain duplicate or overlapping ranges.
pub async fn resolve_segments(
    video_service: &dyn VideoService,
    video: &VideoHandle,
    sentences: &[String],
    strategy: &dyn MatchStrategy,
    options: ResolverOptions,
) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(sentences.len());

    for sentence in sentences {
        let shots = retry(options.retry, || {
            with_timeout(
                "search",
                options.timeout_secs,
                video_service.search(video, sentence),
            )
        })
        .await;

        let shots = match shots {
            Ok(shots) => shots,
            Err(e) => {
                warn!("Search failed for sentence {}: {e}", preview(sentence));
                continue;
            }
        };

        let matches: Vec<Segment> = shots
            .into_iter()
            .filter_map(|(start, end)| match Segment::new(start, end, sentence.as_str()) {
                Ok(segment) => Some(segment),
                Err(e) => {
                    warn!("Rejected match for {}: {e}", preview(sentence));
                    None
                }
            })
            .collect();

        match strategy.pick(&matches) {
            Some(segment) => {
                info!(
                    "Matched [{:.1}, {:.1}] for sentence {}",
                    segment.start(),
                    segment.end(),
                    preview(sentence)
                );
                segments.push(segment);
            }
            None => info!("No match for sentence {}", preview(sentence)),
        }
    }

    segments
}

fn preview(sentence: &str) -> String {
    let head: String = sentence.chars().take(50).collect();
    if head.len() < sentence.len() {
        format!("{head:?}...")
    } else {
        format!("{head:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64) -> Segment {
        Segment::new(start, end, "s").unwrap()
    }

    #[test]
    fn first_match_takes_head() {
        let matches = vec![seg(5.0, 6.0), seg(1.0, 30.0)];
        assert_eq!(FirstMatch.pick(&matches), Some(seg(5.0, 6.0)));
        assert_eq!(FirstMatch.pick(&[]), None);
    }

    #[test]
    fn longest_match_prefers_duration_then_order() {
        let matches = vec![seg(5.0, 6.0), seg(1.0, 30.0), seg(40.0, 69.0)];
        assert_eq!(LongestMatch.pick(&matches), Some(seg(1.0, 30.0)));
        let tied = vec![seg(0.0, 10.0), seg(20.0, 30.0)];
        assert_eq!(LongestMatch.pick(&tied), Some(seg(0.0, 10.0)));
    }

    #[test]
    fn preview_truncates_long_sentences() {
        let long = "word ".repeat(30);
        assert!(preview(&long).ends_with("..."));
        assert_eq!(preview("short"), "\"short\"");
    }
}
