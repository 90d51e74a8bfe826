use std::collections::VecDeque;

use ahash::AHashMap;
use rand::seq::SliceRandom;

use crate::penalty::{detached_sequence, init_sequence, RouteAggregate, TimeWindowPenalty};
use crate::problem::Num;
use crate::solution::modification::Modification;
use crate::solution::{RouteNode, Solution};
use crate::utils::Random;

/// Copy of `w`'s route with `w` removed. Same-route relocations of `w` are priced as
/// insertions into this copy.
struct ShadowRoute {
    nodes: Vec<RouteNode>,
    positions: AHashMap<usize, usize>,
    w: usize,
    eject_delta: Num,
}

impl ShadowRoute {
    fn without(sol: &Solution, w: usize) -> Self {
        let route = sol.routed(w);
        let customers = sol
            .iter_customers_of_route(route)
            .filter(|&c| c != w)
            .collect::<Vec<_>>();
        let mut nodes = detached_sequence(
            &customers.iter().map(|&c| sol.node(c).id).collect::<Vec<_>>(),
        );
        init_sequence::<TimeWindowPenalty>(sol.instance(), &mut nodes);
        let positions = customers
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i + 1))
            .collect();

        Self {
            nodes,
            positions,
            w,
            eject_delta: sol.eject_delta::<TimeWindowPenalty>(w),
        }
    }

    /// Time-window delta of moving `w` in front of `v` within its own route.
    fn out_relocate_delta(&self, sol: &Solution, v: usize) -> Option<Num> {
        let &pos = self.positions.get(&v)?;
        let instance = sol.instance();
        let tail = &self.nodes[self.nodes.len() - 1];
        let inserted = TimeWindowPenalty::insert_value(
            instance,
            &self.nodes[pos - 1],
            &self.nodes[pos],
            tail,
            sol.node(self.w).id,
        );
        Some(self.eject_delta + inserted - TimeWindowPenalty::route_value(instance, tail))
    }
}

/// Lazily enumerates the modifications around one route: for every node `w` of the route,
/// in random order, and every candidate `v` (route tails first, then the nearest neighbours
/// of `w`), all applicable moves between `v` and `w`.
///
/// Inter-route candidates are yielded unpriced. Same-route relocations and exchanges come
/// with precomputed deltas; exchanges are only yielded when their delta is exact.
pub struct ModificationNeighbourhood<'a> {
    sol: &'a Solution<'a>,
    n_near: usize,
    permutation: Vec<usize>,
    next_w: usize,
    w: usize,
    candidates: Vec<usize>,
    next_v: usize,
    shadow: Option<ShadowRoute>,
    pending: VecDeque<Modification>,
}

impl<'a> ModificationNeighbourhood<'a> {
    pub fn new(sol: &'a Solution<'a>, route: usize, n_near: usize, rng: &mut Random) -> Self {
        let mut permutation = sol.iter_route(route).collect::<Vec<_>>();
        permutation.shuffle(rng);
        Self {
            sol,
            n_near,
            permutation,
            next_w: 0,
            w: 0,
            candidates: Vec::new(),
            next_v: 0,
            shadow: None,
            pending: VecDeque::with_capacity(3),
        }
    }

    fn prepare(&mut self, w: usize) {
        let sol = self.sol;
        self.w = w;
        self.next_v = 0;
        self.candidates.clear();
        self.shadow = None;
        if !sol.is_depot(w) {
            self.shadow = Some(ShadowRoute::without(sol, w));
            self.candidates
                .extend(sol.iter_route_ids().map(|r| sol.route_tail(r)));
        }
        self.candidates
            .extend_from_slice(sol.instance().neighbours().nearest_k(sol.node(w).id, self.n_near));
    }

    fn check_modifications(&mut self, v: usize) {
        let sol = self.sol;
        let w = self.w;
        if v == w || sol.is_ejected(v) {
            return;
        }
        if sol.route_of(v) != sol.route_of(w) {
            for m in [
                Modification::two_opt(v, w),
                Modification::out_relocate(v, w),
                Modification::exchange(v, w),
            ] {
                if m.applicable(sol) {
                    self.pending.push_back(m);
                }
            }
        } else if !sol.is_depot(w) && !sol.is_depot(v) {
            let relocate = Modification::out_relocate(v, w);
            if relocate.applicable(sol) {
                let shadowed = self.shadow.as_ref().and_then(|it| it.out_relocate_delta(sol, v));
                if let Some(delta) = shadowed {
                    self.pending.push_back(relocate.with_components(0.0, delta));
                }
            }
            let exchange = Modification::exchange(v, w);
            if exchange.applicable(sol) {
                let (delta, exact) = sol.exchange_delta_lower_bound(v, w);
                if exact {
                    self.pending.push_back(exchange.with_components(0.0, delta));
                }
            }
        }
    }
}

impl<'a> Iterator for ModificationNeighbourhood<'a> {
    type Item = Modification;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(m) = self.pending.pop_front() {
                return Some(m);
            }
            if self.next_v < self.candidates.len() {
                let v = self.candidates[self.next_v];
                self.next_v += 1;
                self.check_modifications(v);
                continue;
            }
            if self.next_w < self.permutation.len() {
                let w = self.permutation[self.next_w];
                self.next_w += 1;
                self.prepare(w);
                continue;
            }
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::vrptw::tests::create_random_instance;
    use crate::solution::modification::tests::straight_delta;
    use crate::solution::modification::ModificationType;
    use crate::utils::create_seeded_rng;

    use super::*;

    #[test]
    fn streamed_deltas_match_applied_modifications() {
        let mut rng = create_seeded_rng(51);
        let mut same_route = 0;
        for _ in 0..10 {
            let instance = create_random_instance(&mut rng, 18, 70.0);
            let mut sol = Solution::new(&instance);
            let routes: Vec<Vec<usize>> =
                vec![(1..=6).collect(), (7..=12).collect(), (13..=16).collect()];
            sol.set(&routes, &[17, 18], None);

            for route in 0..3 {
                for mut m in ModificationNeighbourhood::new(&sol, route, 5, &mut rng) {
                    assert!(m.applicable(&sol));
                    assert!(!sol.is_ejected(m.v));
                    let w = m.w.unwrap();
                    assert_eq!(sol.route_of(w), Some(route));
                    if sol.route_of(m.v) == sol.route_of(w) {
                        same_route += 1;
                        assert!(matches!(
                            m.kind,
                            ModificationType::OutRelocate | ModificationType::Exchange
                        ));
                    }

                    let capacity = m.delta(&sol, 1.0, 0.0);
                    let time_window = m.delta(&sol, 0.0, 1.0);
                    let (c, tw, _) = straight_delta(&sol, &m);
                    assert!((capacity - c).abs() < 1e-5, "{:?}", m);
                    assert!((time_window - tw).abs() < 1e-5, "{:?}", m);
                }
            }
        }
        assert!(same_route > 0);
    }

    #[test]
    fn every_node_of_the_route_is_visited() {
        let mut rng = create_seeded_rng(52);
        let instance = create_random_instance(&mut rng, 8, 100.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[vec![1, 2, 3, 4], vec![5, 6, 7, 8]], &[], None);

        let mut seen = Vec::new();
        for m in ModificationNeighbourhood::new(&sol, 0, 8, &mut rng) {
            let w = m.w.unwrap();
            if !seen.contains(&w) {
                seen.push(w);
            }
        }
        seen.sort();
        // the head sentinel takes part through two-opt, the tail never does
        let mut expected = vec![1, 2, 3, 4, sol.route_head(0)];
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn dropping_the_stream_cancels_it() {
        let mut rng = create_seeded_rng(53);
        let instance = create_random_instance(&mut rng, 10, 100.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[(1..=5).collect(), (6..=10).collect()], &[], None);

        let first_three = ModificationNeighbourhood::new(&sol, 0, 3, &mut rng)
            .take(3)
            .count();
        assert_eq!(first_three, 3);
        // the solution is untouched and can be mutated again
        Modification::eject(1).apply(&mut sol);
        sol.ejection_pool.push(1);
        assert!(sol.accounts_for_all_customers());
    }
}
