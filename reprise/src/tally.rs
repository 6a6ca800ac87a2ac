//! # Tally Module - Merging Viewing Intervals By Depth
//!
//! The tally turns a stream of completed, possibly overlapping viewing intervals into a
//! timeline annotated with how many times each point was viewed.
//!
//! ## Representation
//!
//! Every merged interval contributes one `START` and one `STOP` [`BoundaryNode`] to a doubly
//! linked list kept in an arena. Two sentinel nodes at `-inf` and `+inf` bound the list, so
//! insertion never has to special-case an empty list or the ends.
//!
//! Nodes are ordered by time point. At equal time points a `STOP` is placed before the nodes
//! already there, so a pause immediately followed by a resume at the same instant never
//! counts as overlap.
//!
//! ## Traversal
//!
//! [`Tally::traverse`] walks the list once, keeping a running depth (+1 on `START`, -1 on
//! `STOP`). The span between two consecutive nodes was viewed exactly as many times as the
//! depth held over it, which gives the seconds viewed exactly N times for every N.
//!
//! ```rust
//! use reprise::tally::Tally;
//!
//! let mut tally = Tally::new();
//! tally.add_interval(0.0, 5.0);
//! tally.add_interval(5.0, 10.0);
//! tally.add_interval(2.0, 4.0);
//!
//! let coverage = tally.traverse();
//! assert_eq!(coverage.viewed_once(), 8.0);
//! assert_eq!(coverage.viewed_twice(), 2.0);
//! assert_eq!(coverage.one_or_more(), 10.0);
//! ```
//!
//! ## Performance
//!
//! - `add`: O(n) in the number of boundary nodes (two linear scans, O(1) relinking)
//! - `traverse`: O(n)
//!
//! Lists hold one pair of nodes per pause/resume cycle of a viewing session, so they stay
//! small.

use strum::Display;

use crate::Seconds;
use crate::entry::{EntryState, ViewEntry};
use crate::error::StateFault;

/// Arena index of the `-inf` sentinel
const HEAD: usize = 0;
/// Arena index of the `+inf` sentinel
const TAIL: usize = 1;

/// Sequence number given to boundary nodes, for diagnostics
pub type NodeId = u64;

/// What a boundary node marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BoundaryKind {
    Start,
    Stop,
    Sentinel,
}

/// One endpoint of a merged interval
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryNode {
    id: NodeId,
    time_point: Seconds,
    kind: BoundaryKind,
    prev: usize,
    next: usize,
}

impl BoundaryNode {
    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub const fn time_point(&self) -> Seconds {
        self.time_point
    }

    pub const fn kind(&self) -> BoundaryKind {
        self.kind
    }
}

/// Hands out boundary nodes with increasing ids
#[derive(Debug, Clone, Default)]
struct NodeFactory {
    id_counter: NodeId,
}

impl NodeFactory {
    fn create(&mut self, time_point: Seconds, kind: BoundaryKind) -> BoundaryNode {
        self.id_counter += 1;
        log::trace!(
            "Boundary node #{} created at {} ({})",
            self.id_counter,
            time_point,
            kind
        );
        BoundaryNode {
            id: self.id_counter,
            time_point,
            kind,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// Placement order of boundaries
///
/// `a` goes before a node at `b` if it is strictly earlier, or if it is a `STOP` at the same
/// time point.
pub fn is_smaller(a: Seconds, b: Seconds, kind_of_a: BoundaryKind) -> bool {
    if a < b {
        return true;
    }
    a == b && kind_of_a == BoundaryKind::Stop
}

/// Seconds of media viewed at each depth, as computed by [`Tally::traverse`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coverage {
    /// `by_depth[n - 1]` holds the seconds viewed exactly `n` times
    by_depth: Vec<Seconds>,
}

impl Coverage {
    fn record(&mut self, depth: usize, delta: Seconds) {
        if self.by_depth.len() < depth {
            self.by_depth.resize(depth, 0.0);
        }
        self.by_depth[depth - 1] += delta;
    }

    /// Seconds viewed exactly `times` times. Unviewed time is not tracked, so `0` yields `0.0`.
    pub fn exactly(&self, times: usize) -> Seconds {
        times
            .checked_sub(1)
            .and_then(|index| self.by_depth.get(index))
            .copied()
            .unwrap_or(0.0)
    }

    /// Seconds viewed `times` times or more
    pub fn at_least(&self, times: usize) -> Seconds {
        // `Sum` for floats starts at -0.0, which would print as "-0.00"
        self.by_depth
            .iter()
            .skip(times.saturating_sub(1))
            .fold(0.0, |total, seconds| total + seconds)
    }

    pub fn viewed_once(&self) -> Seconds {
        self.exactly(1)
    }

    pub fn viewed_twice(&self) -> Seconds {
        self.exactly(2)
    }

    pub fn viewed_three_plus(&self) -> Seconds {
        self.at_least(3)
    }

    pub fn one_or_more(&self) -> Seconds {
        self.at_least(1)
    }

    pub fn two_or_more(&self) -> Seconds {
        self.at_least(2)
    }

    /// Highest number of overlapping views anywhere on the timeline
    pub fn max_depth(&self) -> usize {
        self.by_depth.len()
    }
}

/// Depth-ordered merge of completed viewing intervals
#[derive(Debug, Clone)]
pub struct Tally {
    nodes: Vec<BoundaryNode>,
    factory: NodeFactory,
    merged: usize,
    anomalies: usize,
    coverage: Option<Coverage>,
}

impl Tally {
    pub fn new() -> Self {
        let mut factory = NodeFactory::default();

        let mut head = factory.create(Seconds::NEG_INFINITY, BoundaryKind::Sentinel);
        let mut tail = factory.create(Seconds::INFINITY, BoundaryKind::Sentinel);
        head.prev = HEAD;
        head.next = TAIL;
        tail.prev = HEAD;
        tail.next = TAIL;

        Self {
            nodes: vec![head, tail],
            factory,
            merged: 0,
            anomalies: 0,
            coverage: None,
        }
    }

    /// Merge a completed entry
    ///
    /// Entries that are still in progress are rejected; close a snapshot first to merge
    /// one speculatively.
    pub fn add(&mut self, entry: &ViewEntry) -> Result<(), StateFault> {
        let Some((start, stop)) = entry.bounds() else {
            return Err(StateFault::EntryNotCompleted {
                id: entry.id(),
                state: entry.state(),
            });
        };
        debug_assert_eq!(entry.state(), EntryState::Completed);

        log::debug!("Tally: merging entry #{} [{start}, {stop}]", entry.id());
        let repaired = !self.merge(start, stop);
        if entry.has_clock_anomaly() || repaired {
            self.anomalies += 1;
        }
        Ok(())
    }

    /// Merge a raw `[start, stop]` interval given in media seconds
    ///
    /// A `stop` earlier than `start` or not finite is merged as a zero-width interval, and an
    /// interval with a non-finite `start` contributes nothing. Both count as anomalies.
    pub fn add_interval(&mut self, start: Seconds, stop: Seconds) {
        if !self.merge(start, stop) {
            self.anomalies += 1;
        }
    }

    /// Insert both boundaries, returning `false` if the bounds had to be repaired
    fn merge(&mut self, start: Seconds, stop: Seconds) -> bool {
        self.merged += 1;

        if !start.is_finite() {
            log::warn!("Tally: interval start {start} is not a media time, nothing merged");
            return false;
        }

        let usable = stop.is_finite() && stop >= start;
        if !usable {
            log::warn!("Tally: interval [{start}, {stop}] merged as zero-width");
        }
        let stop = if usable { stop } else { start };

        self.insert_boundary(start, BoundaryKind::Start);
        self.insert_boundary(stop, BoundaryKind::Stop);
        usable
    }

    /// Scan from the head and insert before the first node the boundary is smaller than
    fn insert_boundary(&mut self, time_point: Seconds, kind: BoundaryKind) -> usize {
        let mut cursor = self.nodes[HEAD].next;
        while cursor != TAIL && !is_smaller(time_point, self.nodes[cursor].time_point, kind) {
            cursor = self.nodes[cursor].next;
        }
        self.insert_before(cursor, time_point, kind)
    }

    fn insert_before(&mut self, at: usize, time_point: Seconds, kind: BoundaryKind) -> usize {
        let index = self.nodes.len();
        let prev = self.nodes[at].prev;

        let mut node = self.factory.create(time_point, kind);
        node.prev = prev;
        node.next = at;
        self.nodes.push(node);

        self.nodes[prev].next = index;
        self.nodes[at].prev = index;
        index
    }

    /// Walk the timeline and recompute the seconds viewed at each depth
    ///
    /// The result is also kept and returned by [`Tally::coverage`] until the next traversal.
    pub fn traverse(&mut self) -> &Coverage {
        let mut coverage = Coverage::default();
        let mut depth: i64 = 0;
        let mut previous: Option<Seconds> = None;

        for node in self.boundaries() {
            let span_depth = depth;
            match node.kind {
                BoundaryKind::Start => depth += 1,
                BoundaryKind::Stop => depth -= 1,
                BoundaryKind::Sentinel => continue,
            }

            let delta = previous.map_or(0.0, |previous| node.time_point - previous);
            // Depth only goes negative across the zero-width span of a zero-length interval
            if let Ok(span_depth) = usize::try_from(span_depth)
                && span_depth > 0
            {
                coverage.record(span_depth, delta);
            }

            log::trace!(
                "[Node #{:03}] {:>10.4}s {:<5} depth {} -> {}, delta {:.4}s",
                node.id,
                node.time_point,
                node.kind,
                span_depth,
                depth,
                delta
            );
            previous = Some(node.time_point);
        }

        self.coverage.insert(coverage)
    }

    /// Coverage from the last traversal
    ///
    /// Stale after an `add` until `traverse` runs again, `None` if it never ran.
    pub const fn coverage(&self) -> Option<&Coverage> {
        self.coverage.as_ref()
    }

    /// The boundary nodes in timeline order, without the sentinels
    pub fn boundaries(&self) -> Boundaries<'_> {
        Boundaries {
            tally: self,
            cursor: self.nodes[HEAD].next,
        }
    }

    /// Number of boundary nodes, without the sentinels
    pub fn len(&self) -> usize {
        self.nodes.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of intervals merged so far
    pub const fn merged_count(&self) -> usize {
        self.merged
    }

    /// Number of merged intervals whose bounds were clamped or dropped
    pub const fn anomaly_count(&self) -> usize {
        self.anomalies
    }
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the non-sentinel nodes of a [`Tally`]
pub struct Boundaries<'a> {
    tally: &'a Tally,
    cursor: usize,
}

impl<'a> Iterator for Boundaries<'a> {
    type Item = &'a BoundaryNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == TAIL {
            return None;
        }
        let node = &self.tally.nodes[self.cursor];
        self.cursor = node.next;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryFactory;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const EPSILON: f64 = 1e-9;

    fn tally_of(intervals: &[(f64, f64)]) -> Tally {
        let mut tally = Tally::new();
        for &(start, stop) in intervals {
            tally.add_interval(start, stop);
        }
        tally
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    /// Seconds covered exactly `n` times, found by checking every elementary segment
    fn brute_force(intervals: &[(f64, f64)]) -> Vec<f64> {
        let mut points: Vec<f64> = intervals.iter().flat_map(|&(a, b)| [a, b]).collect();
        points.sort_by(f64::total_cmp);
        points.dedup();

        let mut by_count = vec![0.0; intervals.len() + 1];
        for window in points.windows(2) {
            let mid = (window[0] + window[1]) / 2.0;
            let count = intervals
                .iter()
                .filter(|&&(start, stop)| start <= mid && mid < stop)
                .count();
            by_count[count] += window[1] - window[0];
        }
        by_count
    }

    #[test]
    fn test_is_smaller() {
        assert!(is_smaller(1.0, 2.0, BoundaryKind::Start));
        assert!(is_smaller(1.0, 2.0, BoundaryKind::Stop));
        assert!(!is_smaller(2.0, 1.0, BoundaryKind::Stop));
        assert!(is_smaller(2.0, 2.0, BoundaryKind::Stop));
        assert!(!is_smaller(2.0, 2.0, BoundaryKind::Start));
        assert!(is_smaller(1e300, Seconds::INFINITY, BoundaryKind::Start));
    }

    #[test]
    fn test_empty_tally() {
        let mut tally = Tally::new();
        assert!(tally.is_empty());
        assert!(tally.coverage().is_none());

        let coverage = tally.traverse().clone();
        assert_eq!(coverage.viewed_once(), 0.0);
        assert_eq!(coverage.viewed_twice(), 0.0);
        assert_eq!(coverage.viewed_three_plus(), 0.0);
        assert_eq!(coverage.max_depth(), 0);
        assert_eq!(tally.coverage(), Some(&coverage));
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        for intervals in [[(0.0, 5.0), (5.0, 10.0)], [(5.0, 10.0), (0.0, 5.0)]] {
            let mut tally = tally_of(&intervals);
            let coverage = tally.traverse();
            assert_eq!(coverage.viewed_once(), 10.0);
            assert_eq!(coverage.viewed_twice(), 0.0);
            assert_eq!(coverage.max_depth(), 1);
        }
    }

    #[test]
    fn test_stop_goes_before_start_at_same_time() {
        let tally = tally_of(&[(0.0, 5.0), (5.0, 10.0)]);
        let kinds: Vec<BoundaryKind> = tally.boundaries().map(BoundaryNode::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BoundaryKind::Start,
                BoundaryKind::Stop,
                BoundaryKind::Start,
                BoundaryKind::Stop
            ]
        );
    }

    #[test]
    fn test_worked_example() {
        let mut tally = tally_of(&[
            (0.0, 8.45),
            (8.45, 12.56),
            (67.30, 69.72),
            (67.55, 71.82),
            (69.51, 74.29),
            (70.24, 75.16),
        ]);
        let coverage = tally.traverse();

        assert!((coverage.viewed_once() - 13.68).abs() < 1e-6);
        assert!((coverage.viewed_twice() - 4.95).abs() < 1e-6);
        assert!((coverage.viewed_three_plus() - 1.79).abs() < 1e-6);
        assert!((coverage.one_or_more() - 20.42).abs() < 1e-6);

        let duration = 106.46;
        assert!((coverage.viewed_once() / duration * 100.0 - 12.85).abs() < 0.01);
        assert!((coverage.viewed_twice() / duration * 100.0 - 4.65).abs() < 0.01);
    }

    #[test]
    fn test_deep_nesting() {
        // Depth climbs to 4, then 5 for the innermost second
        let mut tally = tally_of(&[
            (0.0, 10.0),
            (1.0, 9.0),
            (2.0, 8.0),
            (3.0, 7.0),
            (4.5, 5.5),
        ]);
        let coverage = tally.traverse();

        assert_close(coverage.exactly(1), 2.0);
        assert_close(coverage.exactly(2), 2.0);
        assert_close(coverage.exactly(3), 2.0);
        assert_close(coverage.exactly(4), 3.0);
        assert_close(coverage.exactly(5), 1.0);
        assert_close(coverage.viewed_three_plus(), 6.0);
        assert_close(coverage.two_or_more(), 8.0);
        assert_close(coverage.one_or_more(), 10.0);
        assert_eq!(coverage.max_depth(), 5);
    }

    #[test]
    fn test_identical_intervals_stack() {
        let mut tally = tally_of(&[(2.0, 6.0); 4]);
        let coverage = tally.traverse();
        assert_close(coverage.exactly(4), 4.0);
        assert_close(coverage.viewed_three_plus(), 4.0);
        assert_close(coverage.viewed_once(), 0.0);
    }

    #[test]
    fn test_zero_width_interval_is_harmless() {
        let mut tally = tally_of(&[(3.0, 3.0)]);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.traverse().one_or_more(), 0.0);

        let mut tally = tally_of(&[(0.0, 10.0), (5.0, 5.0)]);
        let coverage = tally.traverse();
        assert_close(coverage.viewed_once(), 10.0);
        assert_close(coverage.viewed_twice(), 0.0);
    }

    #[test]
    fn test_reversed_interval_is_zero_width() {
        let mut tally = tally_of(&[(8.0, 6.0)]);
        let points: Vec<f64> = tally.boundaries().map(BoundaryNode::time_point).collect();
        assert_eq!(points, vec![8.0, 8.0]);
        assert_eq!(tally.traverse().one_or_more(), 0.0);
        assert_eq!(tally.anomaly_count(), 1);
    }

    #[test]
    fn test_empty_roll_ups_are_positive_zero() {
        let mut tally = Tally::new();
        let coverage = tally.traverse();
        assert!(!coverage.viewed_three_plus().is_sign_negative());
        assert!(!coverage.two_or_more().is_sign_negative());
        assert!(!coverage.one_or_more().is_sign_negative());

        let mut tally = tally_of(&[(0.0, 4.0)]);
        let coverage = tally.traverse();
        assert!(!coverage.viewed_three_plus().is_sign_negative());
        assert!(!coverage.two_or_more().is_sign_negative());
        assert_eq!(format!("{:.2}", coverage.viewed_three_plus()), "0.00");
    }

    #[test]
    fn test_non_finite_bounds_do_not_corrupt_totals() {
        let mut tally = tally_of(&[
            (0.0, 10.0),
            (f64::NAN, 5.0),
            (2.0, f64::NAN),
            (3.0, f64::INFINITY),
            (f64::NEG_INFINITY, 1.0),
        ]);
        assert_eq!(tally.merged_count(), 5);
        assert_eq!(tally.anomaly_count(), 4);
        assert!(tally.boundaries().all(|node| node.time_point().is_finite()));

        let coverage = tally.traverse();
        assert_close(coverage.viewed_once(), 10.0);
        assert_close(coverage.one_or_more(), 10.0);
        assert_close(coverage.two_or_more(), 0.0);
    }

    #[test]
    fn test_add_entry_with_non_finite_start() {
        let mut factory = EntryFactory::new();
        let mut tally = Tally::new();

        let mut normal = factory.create(0.0);
        normal.close(6.0).unwrap();
        tally.add(&normal).unwrap();

        let mut broken = factory.create(f64::NAN);
        broken.close(4.0).unwrap();
        assert!(broken.has_clock_anomaly());
        tally.add(&broken).unwrap();

        assert_eq!(tally.anomaly_count(), 1);
        assert_eq!(tally.len(), 2);
        let coverage = tally.traverse();
        assert_close(coverage.viewed_once(), 6.0);
        assert_close(coverage.one_or_more(), 6.0);
    }

    #[test]
    fn test_unsorted_submission_keeps_order() {
        let tally = tally_of(&[(40.0, 45.0), (0.0, 12.0), (10.0, 41.0), (3.0, 4.0)]);
        let points: Vec<f64> = tally.boundaries().map(BoundaryNode::time_point).collect();
        assert_eq!(points, vec![0.0, 3.0, 4.0, 10.0, 12.0, 40.0, 41.0, 45.0]);
        assert_eq!(tally.len(), 8);
        assert_eq!(tally.merged_count(), 4);
    }

    #[test]
    fn test_node_ids_follow_creation_order() {
        let tally = tally_of(&[(5.0, 6.0), (1.0, 2.0)]);
        // Sentinels take ids 1 and 2
        let ids: Vec<NodeId> = tally.boundaries().map(BoundaryNode::id).collect();
        assert_eq!(ids, vec![5, 6, 3, 4]);
    }

    #[test]
    fn test_coverage_is_stale_until_traversed() {
        let mut tally = tally_of(&[(0.0, 4.0)]);
        tally.traverse();
        tally.add_interval(1.0, 2.0);
        assert_eq!(tally.coverage().map(Coverage::viewed_twice), Some(0.0));
        assert_eq!(tally.traverse().viewed_twice(), 1.0);
    }

    #[test]
    fn test_add_rejects_open_entry() {
        let mut factory = EntryFactory::new();
        let mut tally = Tally::new();

        let open = factory.create(1.0);
        assert_eq!(
            tally.add(&open),
            Err(StateFault::EntryNotCompleted {
                id: 1,
                state: EntryState::InProgress
            })
        );
        assert!(tally.is_empty());

        let mut closed = factory.create(2.0);
        closed.close(3.0).unwrap();
        tally.add(&closed).unwrap();
        assert_eq!(tally.len(), 2);
    }

    #[test]
    fn test_add_counts_clock_anomalies() {
        let mut entry = EntryFactory::new().create(9.0);
        entry.close(4.0).unwrap();

        let mut tally = Tally::new();
        tally.add(&entry).unwrap();
        assert_eq!(tally.anomaly_count(), 1);
        assert_eq!(tally.traverse().one_or_more(), 0.0);
    }

    #[test]
    fn test_matches_brute_force_on_random_intervals() {
        let mut rng = StdRng::seed_from_u64(0x5EED);

        for _ in 0..200 {
            let count = rng.gen_range(1..12_usize);
            // Quarter-second grid so ties between boundaries are common
            let intervals: Vec<(f64, f64)> = (0..count)
                .map(|_| {
                    let start = f64::from(rng.gen_range(0..160_u32)) * 0.25;
                    let length = f64::from(rng.gen_range(0..40_u32)) * 0.25;
                    (start, start + length)
                })
                .collect();

            let mut tally = tally_of(&intervals);

            let points: Vec<f64> = tally.boundaries().map(BoundaryNode::time_point).collect();
            assert!(points.windows(2).all(|pair| pair[0] <= pair[1]));
            assert_eq!(points.len(), intervals.len() * 2);

            let expected = brute_force(&intervals);
            let coverage = tally.traverse();
            let union: f64 = expected.iter().skip(1).sum();
            let overlap: f64 = expected.iter().skip(2).sum();

            assert_close(coverage.one_or_more(), union);
            assert_close(coverage.two_or_more(), overlap);
            for times in 1..expected.len() {
                assert_close(coverage.exactly(times), expected[times]);
            }
        }
    }
}
