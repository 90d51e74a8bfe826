use crate::penalty::{CapacityPenalty, TimeWindowPenalty};
use crate::problem::Num;
use crate::solution::Solution;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModificationType {
    /// swap the customers after `v` with the customers after `w`
    TwoOpt,
    /// move `w` in front of `v`
    OutRelocate,
    /// swap the positions of `v` and `w`
    Exchange,
    /// place the ejected `w` in front of `v`
    Insert,
    /// remove `v` from its route
    Eject,
}

/// A candidate edit of a solution. Short lived: it is only meaningful for the solution state
/// it was created against.
#[derive(Copy, Clone, Debug)]
pub struct Modification {
    pub kind: ModificationType,
    pub v: usize,
    pub w: Option<usize>,
    /// (capacity delta, time-window delta), computed on first use
    components: Option<(Num, Num)>,
}

impl Modification {
    pub fn new(kind: ModificationType, v: usize, w: usize) -> Self {
        Self {
            kind,
            v,
            w: Some(w),
            components: None,
        }
    }

    pub fn two_opt(v: usize, w: usize) -> Self {
        Self::new(ModificationType::TwoOpt, v, w)
    }
    pub fn out_relocate(v: usize, w: usize) -> Self {
        Self::new(ModificationType::OutRelocate, v, w)
    }
    pub fn exchange(v: usize, w: usize) -> Self {
        Self::new(ModificationType::Exchange, v, w)
    }
    pub fn insert(v: usize, w: usize) -> Self {
        Self::new(ModificationType::Insert, v, w)
    }
    pub fn eject(v: usize) -> Self {
        Self {
            kind: ModificationType::Eject,
            v,
            w: None,
            components: None,
        }
    }

    /// Modification whose deltas were already computed by the caller.
    pub(crate) fn with_components(mut self, capacity_delta: Num, time_window_delta: Num) -> Self {
        self.components = Some((capacity_delta, time_window_delta));
        self
    }

    fn w(&self) -> usize {
        match self.w {
            Some(w) => w,
            None => panic!("{:?} modification without a second node", self.kind),
        }
    }

    pub fn applicable(&self, sol: &Solution) -> bool {
        let v = self.v;
        match self.kind {
            ModificationType::TwoOpt => {
                let w = self.w();
                match (sol.route_of(v), sol.route_of(w)) {
                    (Some(route_v), Some(route_w)) => {
                        route_v != route_w && !sol.is_tail(v) && !sol.is_tail(w)
                    }
                    _ => false,
                }
            }
            ModificationType::OutRelocate => {
                let w = self.w();
                !sol.is_depot(w) && !sol.is_ejected(w) && !sol.is_ejected(v) && !sol.is_head(v)
            }
            ModificationType::Insert => {
                let w = self.w();
                !sol.is_depot(w) && sol.is_ejected(w) && !sol.is_ejected(v) && !sol.is_head(v)
            }
            ModificationType::Exchange => {
                let w = self.w();
                !sol.is_depot(v) && !sol.is_depot(w) && !sol.is_ejected(v) && !sol.is_ejected(w)
            }
            ModificationType::Eject => !sol.is_depot(v) && !sol.is_ejected(v),
        }
    }

    fn compute_components(&self, sol: &Solution) -> (Num, Num) {
        let v = self.v;
        match self.kind {
            ModificationType::TwoOpt => {
                let w = self.w();
                (
                    sol.two_opt_delta::<CapacityPenalty>(v, w),
                    sol.two_opt_delta::<TimeWindowPenalty>(v, w),
                )
            }
            ModificationType::OutRelocate => {
                let w = self.w();
                (
                    sol.out_relocate_delta::<CapacityPenalty>(v, w),
                    sol.out_relocate_delta::<TimeWindowPenalty>(v, w),
                )
            }
            ModificationType::Exchange => {
                let w = self.w();
                (
                    sol.exchange_delta::<CapacityPenalty>(v, w),
                    sol.exchange_delta::<TimeWindowPenalty>(v, w),
                )
            }
            ModificationType::Insert => {
                let w = self.w();
                (
                    sol.insert_delta::<CapacityPenalty>(v, w),
                    sol.insert_delta::<TimeWindowPenalty>(v, w),
                )
            }
            ModificationType::Eject => (
                sol.eject_delta::<CapacityPenalty>(v),
                sol.eject_delta::<TimeWindowPenalty>(v),
            ),
        }
    }

    /// `alpha * capacity delta + beta * time-window delta`
    pub fn delta(&mut self, sol: &Solution, alpha: f64, beta: f64) -> Num {
        let (capacity, time_window) = match self.components {
            Some(components) => components,
            None => {
                let components = self.compute_components(sol);
                self.components = Some(components);
                components
            }
        };
        alpha * capacity + beta * time_window
    }

    pub fn apply(&self, sol: &mut Solution) {
        debug_assert!(self.applicable(sol), "{:?} is not applicable", self);
        let v = self.v;
        let touched = match self.kind {
            ModificationType::TwoOpt => {
                let w = self.w();
                let routes = vec![sol.routed(v), sol.routed(w)];
                sol.swap_tails(v, w);
                routes
            }
            ModificationType::OutRelocate => {
                let w = self.w();
                let routes = vec![sol.routed(v), sol.routed(w)];
                if v != w {
                    sol.relink_gap_when_removing_node(w);
                    sol.relink_in_front_of(v, w);
                }
                routes
            }
            ModificationType::Exchange => {
                let w = self.w();
                let routes = vec![sol.routed(v), sol.routed(w)];
                if v != w {
                    sol.swap_positions(v, w);
                }
                routes
            }
            ModificationType::Insert => {
                let w = self.w();
                sol.relink_in_front_of(v, w);
                vec![sol.routed(v)]
            }
            ModificationType::Eject => {
                let route = sol.routed(v);
                sol.relink_gap_when_removing_node(v);
                vec![route]
            }
        };

        for (i, &route) in touched.iter().enumerate() {
            if touched[..i].contains(&route) {
                continue;
            }
            sol.init_route_penalty(route);
            #[cfg(feature = "move-asserts")]
            assert!(sol.route_is_consistent(route), "route {} broken by {:?}", route, self);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rand::seq::SliceRandom;
    use rand::Rng;

    use crate::penalty::{Distance, RouteAggregate};
    use crate::problem::vrptw::tests::create_random_instance;
    use crate::problem::vrptw::VRPTWInstance;
    use crate::utils::{create_seeded_rng, Random};

    use super::*;

    fn total<A: RouteAggregate>(sol: &Solution) -> Num {
        sol.iter_route_ids().map(|r| sol.penalty::<A>(r)).sum()
    }

    /// Change of every aggregate measured by applying the modification to a copy.
    pub(crate) fn straight_delta(sol: &Solution, m: &Modification) -> (Num, Num, Num) {
        let mut copy = sol.clone();
        m.apply(&mut copy);
        (
            total::<CapacityPenalty>(&copy) - total::<CapacityPenalty>(sol),
            total::<TimeWindowPenalty>(&copy) - total::<TimeWindowPenalty>(sol),
            total::<Distance>(&copy) - total::<Distance>(sol),
        )
    }

    fn distance_delta(sol: &Solution, m: &Modification) -> Num {
        let v = m.v;
        match m.kind {
            ModificationType::TwoOpt => sol.two_opt_delta::<Distance>(v, m.w()),
            ModificationType::OutRelocate => sol.out_relocate_delta::<Distance>(v, m.w()),
            ModificationType::Exchange => sol.exchange_delta::<Distance>(v, m.w()),
            ModificationType::Insert => sol.insert_delta::<Distance>(v, m.w()),
            ModificationType::Eject => sol.eject_delta::<Distance>(v),
        }
    }

    fn random_solution<'a>(
        rng: &mut Random,
        instance: &'a VRPTWInstance,
        num_routes: usize,
        num_ejected: usize,
    ) -> Solution<'a> {
        let n = instance.num_customers;
        let mut customers = (1..=n).collect::<Vec<_>>();
        customers.shuffle(rng);
        let pool = customers.split_off(n - num_ejected);
        let mut routes = vec![Vec::new(); num_routes];
        for c in customers {
            let r = rng.gen_range(0..num_routes);
            routes[r].push(c);
        }
        let mut sol = Solution::new(instance);
        sol.set(&routes, &pool, None);
        sol
    }

    fn random_node(rng: &mut Random, sol: &Solution) -> usize {
        let routes = sol.iter_route_ids().collect::<Vec<_>>();
        let route = routes[rng.gen_range(0..routes.len())];
        let nodes = sol.iter_route(route).collect::<Vec<_>>();
        nodes[rng.gen_range(0..nodes.len())]
    }

    fn assert_delta_matches(sol: &Solution, m: Modification) {
        let mut predicted = m;
        let capacity = predicted.delta(sol, 1.0, 0.0);
        let time_window = predicted.delta(sol, 0.0, 1.0);
        let distance = distance_delta(sol, &m);
        let (c, tw, d) = straight_delta(sol, &m);
        assert!((capacity - c).abs() < 1e-5, "{:?}: capacity {} != {}", m, capacity, c);
        assert!((time_window - tw).abs() < 1e-5, "{:?}: time window {} != {}", m, time_window, tw);
        assert!((distance - d).abs() < 1e-5, "{:?}: distance {} != {}", m, distance, d);
    }

    #[test]
    fn deltas_match_applied_modifications() {
        let mut rng = create_seeded_rng(31);
        let mut checked = [0usize; 5];
        for _ in 0..30 {
            let instance = create_random_instance(&mut rng, 16, 60.0);
            let sol = random_solution(&mut rng, &instance, 3, 3);
            for _ in 0..200 {
                let v = random_node(&mut rng, &sol);
                let w = if rng.gen_bool(0.2) {
                    sol.ejection_pool.iter().nth(rng.gen_range(0..3)).unwrap()
                } else {
                    random_node(&mut rng, &sol)
                };
                let candidates = [
                    Modification::two_opt(v, w),
                    Modification::out_relocate(v, w),
                    Modification::exchange(v, w),
                    Modification::insert(v, w),
                    Modification::eject(v),
                ];
                for (i, m) in candidates.into_iter().enumerate() {
                    if m.applicable(&sol) {
                        checked[i] += 1;
                        assert_delta_matches(&sol, m);
                    }
                }
            }
        }
        assert!(checked.iter().all(|&it| it > 0), "{:?}", checked);
    }

    #[test]
    fn applied_modifications_keep_routes_and_accounting() {
        let mut rng = create_seeded_rng(32);
        let instance = create_random_instance(&mut rng, 20, 80.0);
        let mut sol = random_solution(&mut rng, &instance, 4, 2);

        for _ in 0..500 {
            let v = random_node(&mut rng, &sol);
            let w = random_node(&mut rng, &sol);
            let m = match rng.gen_range(0..4) {
                0 => Modification::two_opt(v, w),
                1 => Modification::out_relocate(v, w),
                2 => Modification::exchange(v, w),
                _ => match sol.ejection_pool.pop() {
                    Some(c) => Modification::insert(v, c),
                    None => Modification::eject(v),
                },
            };
            if m.applicable(&sol) {
                m.apply(&mut sol);
                if m.kind == ModificationType::Eject {
                    sol.ejection_pool.push(v);
                }
            } else if m.kind == ModificationType::Insert {
                sol.ejection_pool.push(m.w());
            }

            assert!(sol.accounts_for_all_customers());
            for r in sol.iter_route_ids() {
                assert!(sol.route_is_consistent(r));
                assert!(sol.iter_customers_of_route(r).all(|c| sol.route_of(c) == Some(r)));
            }
        }
    }

    #[test]
    fn applicability_rules() {
        let mut rng = create_seeded_rng(33);
        let instance = create_random_instance(&mut rng, 6, 100.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[vec![1, 2], vec![3, 4]], &[5, 6], None);
        let (head0, tail0) = (sol.route_head(0), sol.route_tail(0));
        let (head1, tail1) = (sol.route_head(1), sol.route_tail(1));

        assert!(Modification::two_opt(head0, 3).applicable(&sol));
        assert!(!Modification::two_opt(tail0, 3).applicable(&sol));
        assert!(!Modification::two_opt(1, 2).applicable(&sol));
        assert!(!Modification::two_opt(1, 5).applicable(&sol));

        assert!(Modification::insert(tail1, 5).applicable(&sol));
        assert!(!Modification::insert(head1, 5).applicable(&sol));
        assert!(!Modification::insert(1, 2).applicable(&sol));
        assert!(!Modification::insert(5, 6).applicable(&sol));

        assert!(Modification::out_relocate(1, 2).applicable(&sol));
        assert!(Modification::out_relocate(tail1, 2).applicable(&sol));
        assert!(!Modification::out_relocate(1, tail1).applicable(&sol));
        assert!(!Modification::out_relocate(1, 5).applicable(&sol));

        assert!(Modification::exchange(1, 4).applicable(&sol));
        assert!(!Modification::exchange(1, head1).applicable(&sol));
        assert!(!Modification::exchange(1, 6).applicable(&sol));

        assert!(Modification::eject(2).applicable(&sol));
        assert!(!Modification::eject(tail0).applicable(&sol));
        assert!(!Modification::eject(5).applicable(&sol));
    }

    #[test]
    fn delta_is_cached_and_weighted() {
        let mut rng = create_seeded_rng(34);
        let instance = create_random_instance(&mut rng, 6, 10.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[vec![1, 2, 3], vec![4]], &[5, 6], None);

        let mut m = Modification::insert(4, 5);
        let capacity = m.delta(&sol, 1.0, 0.0);
        let time_window = m.delta(&sol, 0.0, 1.0);
        assert!((m.delta(&sol, 2.0, 3.0) - (2.0 * capacity + 3.0 * time_window)).abs() < 1e-9);

        let mut preset = Modification::insert(4, 5).with_components(7.0, 11.0);
        assert_eq!(preset.delta(&sol, 1.0, 1.0), 18.0);

        Modification::eject(2).apply(&mut sol);
        sol.ejection_pool.push(2);
        assert_eq!(sol.to_description().routes, vec![vec![1, 3], vec![4]]);
    }
}
