//! Containment join between emotion and sentiment segments.
//!
//! A sentiment segment is associated with an emotion segment only when it
//! fully encloses it (`s.start <= e.start && s.end >= e.end`). Partial
//! overlap never qualifies. Every qualifying sentiment is kept, in input
//! order.
//!
//! Two interchangeable strategies implement the same contract:
//!
//! | Strategy | Cost | Notes |
//! |----------|------|-------|
//! | `Scan` | O(n·m) | Checks every pair |
//! | `Indexed` | O((n + m) log m + k) | Start-sorted sentiments with a max-end segment tree |

use tracing::debug;

use emoline_models::DetectionEvent;

/// One emotion segment with the sentiment segments that contain it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSegment<'a> {
    pub emotion: &'a DetectionEvent,
    pub sentiments: Vec<&'a DetectionEvent>,
}

/// Algorithm used for the containment join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStrategy {
    Scan,
    #[default]
    Indexed,
}

/// Aligns independently timed emotion and sentiment streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentMerger {
    strategy: JoinStrategy,
}

impl SegmentMerger {
    pub fn new(strategy: JoinStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    /// Associate each emotion with every sentiment that fully contains it.
    ///
    /// Returns one entry per emotion, in input order. An empty sentiment
    /// list is not an error: every emotion gets an empty association set.
    pub fn merge_containing<'a>(
        &self,
        emotions: &'a [DetectionEvent],
        sentiments: &'a [DetectionEvent],
    ) -> Vec<MergedSegment<'a>> {
        let associations = if sentiments.is_empty() {
            vec![Vec::new(); emotions.len()]
        } else {
            match self.strategy {
                JoinStrategy::Scan => scan_join(emotions, sentiments),
                JoinStrategy::Indexed => indexed_join(emotions, sentiments),
            }
        };

        let merged: Vec<MergedSegment<'a>> = emotions
            .iter()
            .zip(associations)
            .map(|(emotion, indices)| MergedSegment {
                emotion,
                sentiments: indices.into_iter().map(|i| &sentiments[i]).collect(),
            })
            .collect();

        debug!(
            strategy = ?self.strategy,
            emotions = emotions.len(),
            sentiments = sentiments.len(),
            associated = merged.iter().filter(|m| !m.sentiments.is_empty()).count(),
            "Merged segments"
        );

        merged
    }
}

fn scan_join(emotions: &[DetectionEvent], sentiments: &[DetectionEvent]) -> Vec<Vec<usize>> {
    emotions
        .iter()
        .map(|emotion| {
            sentiments
                .iter()
                .enumerate()
                .filter(|(_, s)| s.interval.contains(&emotion.interval))
                .map(|(i, _)| i)
                .collect()
        })
        .collect()
}

fn indexed_join(emotions: &[DetectionEvent], sentiments: &[DetectionEvent]) -> Vec<Vec<usize>> {
    let mut by_start: Vec<usize> = (0..sentiments.len()).collect();
    by_start.sort_by(|&a, &b| sentiments[a].start().total_cmp(&sentiments[b].start()));

    let ends: Vec<f64> = by_start.iter().map(|&i| sentiments[i].end()).collect();
    let tree = MaxEndTree::new(&ends);

    emotions
        .iter()
        .map(|emotion| {
            let limit = by_start.partition_point(|&i| sentiments[i].start() <= emotion.start());
            let mut positions = Vec::new();
            tree.collect(limit, emotion.end(), &mut positions);

            let mut indices: Vec<usize> = positions.into_iter().map(|p| by_start[p]).collect();
            indices.sort_unstable();
            indices
        })
        .collect()
}

/// Segment tree over sentiment end times, ordered by start.
struct MaxEndTree {
    size: usize,
    nodes: Vec<f64>,
}

impl MaxEndTree {
    fn new(ends: &[f64]) -> Self {
        let size = ends.len().next_power_of_two().max(1);
        let mut nodes = vec![f64::NEG_INFINITY; 2 * size];
        nodes[size..size + ends.len()].copy_from_slice(ends);
        for i in (1..size).rev() {
            nodes[i] = nodes[2 * i].max(nodes[2 * i + 1]);
        }
        Self { size, nodes }
    }

    /// Push every position below `limit` whose end is at least `min_end`.
    fn collect(&self, limit: usize, min_end: f64, out: &mut Vec<usize>) {
        self.descend(1, 0, self.size, limit, min_end, out);
    }

    fn descend(&self, node: usize, lo: usize, hi: usize, limit: usize, min_end: f64, out: &mut Vec<usize>) {
        if lo >= limit || self.nodes[node] < min_end {
            return;
        }
        if hi - lo == 1 {
            out.push(lo);
            return;
        }
        let mid = (lo + hi) / 2;
        self.descend(2 * node, lo, mid, limit, min_end, out);
        self.descend(2 * node + 1, mid, hi, limit, min_end, out);
    }
}
