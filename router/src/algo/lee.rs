//! Lee's maze routing on the bin grid: wave propagation from every bin a net
//! already occupies, then a greedy descent back from the drain.

use super::{Direction, Rotation};
use crate::grid::RoutingGrid;
use lee_common::geom::coord::BinCoord;
use std::collections::VecDeque;

const UNREACHED: u32 = u32::MAX;

/// Ordered multiset of the bins one net has claimed so far, with O(1)
/// membership.
#[derive(Clone, Debug)]
pub struct ClaimedBins {
    bins: Vec<BinCoord>,
    mask: Vec<bool>,
    cols: u32,
}

impl ClaimedBins {
    pub fn new<G: RoutingGrid + ?Sized>(grid: &G) -> Self {
        Self {
            bins: Vec::new(),
            mask: vec![false; grid.len()],
            cols: grid.cols(),
        }
    }

    #[inline]
    fn slot(&self, bin: BinCoord) -> usize {
        bin.row as usize * self.cols as usize + bin.col as usize
    }

    pub fn claim(&mut self, bin: BinCoord) {
        let slot = self.slot(bin);
        self.mask[slot] = true;
        self.bins.push(bin);
    }

    pub fn extend<I: IntoIterator<Item = BinCoord>>(&mut self, bins: I) {
        for bin in bins {
            self.claim(bin);
        }
    }

    #[inline]
    pub fn contains(&self, bin: BinCoord) -> bool {
        self.mask[self.slot(bin)]
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BinCoord> + '_ {
        self.bins.iter().copied()
    }

    pub fn into_vec(self) -> Vec<BinCoord> {
        self.bins
    }
}

/// Result of walking back from a drain to the net.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backtrace {
    /// First claimed bin reached; the new wire attaches to the net here.
    pub attachment: BinCoord,
    /// Bins walked, drain first. The attachment bin is not included.
    pub path: Vec<BinCoord>,
    /// Bins where the wire bends, in source-to-drain order.
    pub corners: VecDeque<BinCoord>,
}

impl Backtrace {
    /// The drain already lies on the net.
    pub fn attached(bin: BinCoord) -> Self {
        Self {
            attachment: bin,
            path: Vec::new(),
            corners: VecDeque::new(),
        }
    }
}

/// Scratch state for one maze-routing call chain. The distance buffer is
/// reused across endpoints and nets and reset before every wave.
#[derive(Clone, Default)]
pub struct LeeSolver {
    dist: Vec<u32>,
    queue: VecDeque<BinCoord>,
    cols: u32,
}

impl LeeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes the buffer for `grid` and marks every bin unreached.
    pub fn reset<G: RoutingGrid + ?Sized>(&mut self, grid: &G) {
        if self.dist.len() != grid.len() {
            self.dist = vec![UNREACHED; grid.len()];
        } else {
            self.dist.fill(UNREACHED);
        }
        self.cols = grid.cols();
        self.queue.clear();
    }

    /// Hop count recorded by the last wave, `None` if the bin was not reached.
    pub fn dist(&self, bin: BinCoord) -> Option<u32> {
        let slot = bin.row as usize * self.cols as usize + bin.col as usize;
        match self.dist.get(slot) {
            Some(&d) if d != UNREACHED => Some(d),
            _ => None,
        }
    }

    /// Multi-source breadth-first wave from every claimed bin. The drain gets
    /// its hop count when first reached but the wave never expands past it.
    pub fn propagate<G: RoutingGrid + ?Sized>(
        &mut self,
        grid: &G,
        claimed: &ClaimedBins,
        drain: BinCoord,
        rotation: Rotation,
    ) {
        self.reset(grid);

        for bin in claimed.iter() {
            let slot = grid.index(bin);
            if self.dist[slot] == UNREACHED {
                self.dist[slot] = 0;
                self.queue.push_back(bin);
            }
        }

        let order = rotation.scan_order();
        while let Some(current) = self.queue.pop_front() {
            let next = self.dist[grid.index(current)] + 1;
            for dir in order {
                let Some(n) = grid.neighbor(current, dir) else {
                    continue;
                };
                let slot = grid.index(n);
                if self.dist[slot] != UNREACHED || grid.is_blocked(n) {
                    continue;
                }
                self.dist[slot] = next;
                if n != drain {
                    self.queue.push_back(n);
                }
            }
        }
    }

    /// Descends from `drain` to the first claimed bin, always stepping to the
    /// neighbour with the strictly smallest distance (first in scan order on
    /// ties). Returns `None` when the last wave never reached the drain.
    pub fn backtrace<G: RoutingGrid + ?Sized>(
        &self,
        grid: &G,
        claimed: &ClaimedBins,
        drain: BinCoord,
        rotation: Rotation,
    ) -> Option<Backtrace> {
        if claimed.contains(drain) {
            return Some(Backtrace::attached(drain));
        }
        if self.dist[grid.index(drain)] == UNREACHED {
            return None;
        }

        let order = rotation.scan_order();
        let mut path = Vec::new();
        let mut corners = VecDeque::new();
        let mut heading: Option<Direction> = None;
        let mut current = drain;

        while !claimed.contains(current) {
            let value = self.dist[grid.index(current)];
            let mut best: Option<(Direction, BinCoord, u32)> = None;
            for dir in order {
                let Some(n) = grid.neighbor(current, dir) else {
                    continue;
                };
                if n == drain || grid.is_blocked(n) {
                    continue;
                }
                let d = self.dist[grid.index(n)];
                if d >= value || best.is_some_and(|(_, _, b)| d >= b) {
                    continue;
                }
                best = Some((dir, n, d));
            }

            let Some((dir, next, _)) = best else {
                panic!(
                    "backtrace stuck at bin {} (distance {}) with no closer neighbour",
                    current, value
                );
            };

            if heading.is_some_and(|h| h != dir) {
                corners.push_front(current);
            }
            path.push(current);
            heading = Some(dir);
            current = next;
        }

        Some(Backtrace {
            attachment: current,
            path,
            corners,
        })
    }

    /// Propagation followed by backtrace for one endpoint.
    pub fn route<G: RoutingGrid + ?Sized>(
        &mut self,
        grid: &G,
        claimed: &ClaimedBins,
        drain: BinCoord,
        rotation: Rotation,
    ) -> Option<Backtrace> {
        if claimed.contains(drain) {
            return Some(Backtrace::attached(drain));
        }
        self.propagate(grid, claimed, drain, rotation);
        self.backtrace(grid, claimed, drain, rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lee_common::grid::{BinConverter, BinGrids};

    fn grid(rows: u32, cols: u32) -> BinGrids {
        BinGrids::new(BinConverter::new(cols as f64, rows as f64, rows, cols))
    }

    fn claimed_at(grids: &BinGrids, bins: &[(u32, u32)]) -> ClaimedBins {
        let mut claimed = ClaimedBins::new(grids);
        claimed.extend(bins.iter().map(|&(r, c)| BinCoord::new(r, c)));
        claimed
    }

    #[test]
    fn test_wave_counts_manhattan_hops() {
        let grids = grid(4, 4);
        let claimed = claimed_at(&grids, &[(0, 0)]);
        let mut solver = LeeSolver::new();
        let drain = BinCoord::new(3, 3);
        solver.propagate(&grids, &claimed, drain, Rotation::Clockwise);

        assert_eq!(solver.dist(drain), Some(6));
        assert_eq!(solver.dist(BinCoord::new(0, 0)), Some(0));
        assert_eq!(solver.dist(BinCoord::new(2, 1)), Some(3));
    }

    #[test]
    fn test_drain_is_not_expanded() {
        // Single row: the drain sits between the source and the far end.
        let grids = grid(1, 4);
        let claimed = claimed_at(&grids, &[(0, 0)]);
        let mut solver = LeeSolver::new();
        solver.propagate(&grids, &claimed, BinCoord::new(0, 2), Rotation::Clockwise);

        assert_eq!(solver.dist(BinCoord::new(0, 2)), Some(2));
        assert_eq!(solver.dist(BinCoord::new(0, 3)), None);
    }

    #[test]
    fn test_backtrace_records_the_bend() {
        let grids = grid(4, 4);
        let claimed = claimed_at(&grids, &[(0, 0)]);
        let mut solver = LeeSolver::new();
        let trace = solver
            .route(&grids, &claimed, BinCoord::new(3, 3), Rotation::Clockwise)
            .unwrap();

        let expected: Vec<BinCoord> = [(3, 3), (2, 3), (1, 3), (0, 3), (0, 2), (0, 1)]
            .iter()
            .map(|&(r, c)| BinCoord::new(r, c))
            .collect();
        assert_eq!(trace.path, expected);
        assert_eq!(trace.attachment, BinCoord::new(0, 0));
        assert_eq!(trace.corners, VecDeque::from(vec![BinCoord::new(0, 3)]));
    }

    #[test]
    fn test_rotation_decides_ties() {
        let grids = grid(3, 3);
        let mut solver = LeeSolver::new();

        // Going back up from the bottom-right, east and south tie.
        let claimed = claimed_at(&grids, &[(2, 2)]);
        let drain = BinCoord::new(0, 0);
        let cw = solver
            .route(&grids, &claimed, drain, Rotation::Clockwise)
            .unwrap();
        let ccw = solver
            .route(&grids, &claimed, drain, Rotation::CounterClockwise)
            .unwrap();
        assert_eq!(cw.path.len(), 4);
        assert_eq!(ccw.path.len(), 4);
        assert_eq!(cw.path[1], BinCoord::new(0, 1));
        assert_eq!(ccw.path[1], BinCoord::new(1, 0));

        // Mirrored: south and west tie.
        let claimed = claimed_at(&grids, &[(2, 0)]);
        let drain = BinCoord::new(0, 2);
        let cw = solver
            .route(&grids, &claimed, drain, Rotation::Clockwise)
            .unwrap();
        let ccw = solver
            .route(&grids, &claimed, drain, Rotation::CounterClockwise)
            .unwrap();
        assert_eq!(cw.path[1], BinCoord::new(1, 2));
        assert_eq!(ccw.path[1], BinCoord::new(0, 1));
    }

    #[test]
    fn test_blockages_are_avoided() {
        let mut grids = grid(3, 3);
        for bin in [BinCoord::new(0, 1), BinCoord::new(1, 1)] {
            grids.set_blockage(bin, true).unwrap();
        }
        let claimed = claimed_at(&grids, &[(0, 0)]);
        let mut solver = LeeSolver::new();
        let trace = solver
            .route(&grids, &claimed, BinCoord::new(0, 2), Rotation::Clockwise)
            .unwrap();

        assert_eq!(trace.path.len(), 6);
        assert!(trace.path.iter().all(|&b| !grids.is_blocked(b)));
        assert_eq!(trace.corners.len(), 2);
    }

    #[test]
    fn test_enclosed_drain_is_unreachable() {
        let mut grids = grid(3, 3);
        for bin in [BinCoord::new(1, 2), BinCoord::new(2, 1)] {
            grids.set_blockage(bin, true).unwrap();
        }
        let claimed = claimed_at(&grids, &[(0, 0)]);
        let mut solver = LeeSolver::new();
        assert!(
            solver
                .route(&grids, &claimed, BinCoord::new(2, 2), Rotation::Clockwise)
                .is_none()
        );
    }

    #[test]
    fn test_claimed_drain_needs_no_wire() {
        let grids = grid(2, 2);
        let claimed = claimed_at(&grids, &[(0, 0), (0, 1)]);
        let mut solver = LeeSolver::new();
        let trace = solver
            .route(&grids, &claimed, BinCoord::new(0, 1), Rotation::Clockwise)
            .unwrap();
        assert_eq!(trace, Backtrace::attached(BinCoord::new(0, 1)));
    }

    #[test]
    fn test_wave_starts_from_every_claimed_bin() {
        let grids = grid(1, 6);
        let claimed = claimed_at(&grids, &[(0, 0), (0, 1), (0, 2)]);
        let mut solver = LeeSolver::new();
        let trace = solver
            .route(&grids, &claimed, BinCoord::new(0, 5), Rotation::Clockwise)
            .unwrap();
        assert_eq!(trace.attachment, BinCoord::new(0, 2));
        assert_eq!(trace.path, vec![BinCoord::new(0, 5), BinCoord::new(0, 4), BinCoord::new(0, 3)]);
        assert!(trace.corners.is_empty());
    }
}
