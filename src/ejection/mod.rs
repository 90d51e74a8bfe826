use crate::problem::vrptw::Customer;
use crate::problem::Num;
use crate::solution::Solution;

/// A set of customers whose removal makes a route feasible.
#[derive(Clone, Debug, PartialEq)]
pub struct Ejection {
    /// customers in route order
    pub customers: Vec<usize>,
    pub p_sum: i64,
}

enum State {
    Fresh,
    Running,
    Done,
}

/// Depth-first search over the subsets of at most `k_max` customers of one route, in
/// lexicographic order of their positions. Yields every subset whose removal leaves the route
/// feasible and whose weight sum is strictly below the best sum found so far.
///
/// The route is split into a kept prefix (`kept`), the ejected customers (`ejected`) and the
/// undecided suffix starting at `s_first`. Arrival times along the kept prefix are stored per
/// position in `a_quote` (unclamped) and `a_temp` (clamped into the window).
pub struct FeasibleEjections<'a> {
    sol: &'a Solution<'a>,
    weights: &'a [i64],
    k_max: usize,
    /// route nodes by position, sentinels included
    positions: Vec<usize>,
    kept: Vec<usize>,
    ejected: Vec<usize>,
    s_first: usize,
    p_sum: i64,
    p_best: i64,
    total_demand: Num,
    a_quote: Vec<Num>,
    a_temp: Vec<Num>,
    state: State,
}

impl<'a> FeasibleEjections<'a> {
    pub fn new(
        sol: &'a Solution<'a>,
        route: usize,
        k_max: usize,
        weights: &'a [i64],
        p_best: i64,
    ) -> Self {
        let positions = sol.iter_route(route).collect::<Vec<_>>();
        let len = positions.len();
        let head = sol.node(positions[0]);
        let mut a_quote = vec![0.0; len];
        let mut a_temp = vec![0.0; len];
        a_quote[0] = head.a;
        a_temp[0] = head.a;

        Self {
            sol,
            weights,
            k_max,
            total_demand: sol.node(positions[len - 1]).demand_pf,
            positions,
            kept: Vec::with_capacity(len),
            ejected: Vec::with_capacity(k_max),
            s_first: 1,
            p_sum: 0,
            p_best,
            a_quote,
            a_temp,
            state: State::Fresh,
        }
    }

    /// Best weight sum yielded so far (or the initial bound).
    pub fn p_best(&self) -> i64 {
        self.p_best
    }

    fn customer_at(&self, pos: usize) -> &Customer {
        self.sol.instance().customer(self.sol.node(self.positions[pos]).id)
    }

    fn weight_at(&self, pos: usize) -> i64 {
        self.weights[self.sol.node(self.positions[pos]).id]
    }

    fn is_tail(&self, pos: usize) -> bool {
        pos + 1 == self.positions.len()
    }

    /// Arrival at `pos` when visited right after the last kept position.
    fn retime_from_last_kept(&mut self, pos: usize) {
        let last = *self.kept.last().unwrap_or(&0);
        let instance = self.sol.instance();
        let (from, to) = (
            self.sol.node(self.positions[last]).id,
            self.sol.node(self.positions[pos]).id,
        );
        let a_quote =
            self.a_temp[last] + instance.customer(from).servicetime + instance.time(from, to);
        self.a_quote[pos] = a_quote;
        self.a_temp[pos] = instance.customer(to).clamp(a_quote);
    }

    /// Ejects the first undecided customer.
    fn increment_k(&mut self) {
        let e_last = self.s_first;
        self.ejected.push(e_last);
        self.s_first += 1;
        self.p_sum += self.weight_at(e_last);
        self.total_demand -= self.customer_at(e_last).demand;

        self.retime_from_last_kept(e_last);
        self.retime_from_last_kept(self.s_first);
    }

    /// Keeps the most recently ejected customer instead.
    fn increment_last(&mut self) {
        if let Some(e_last) = self.ejected.pop() {
            self.kept.push(e_last);
            self.p_sum -= self.weight_at(e_last);
            self.total_demand += self.customer_at(e_last).demand;
        }
    }

    /// Undoes the last ejection and every decision taken after it. Returns false when nothing
    /// is left to undo.
    fn backtrack(&mut self) -> bool {
        let old = match self.ejected.pop() {
            Some(old) => old,
            None => return false,
        };
        let e_last = match self.ejected.last() {
            Some(&e_last) => e_last,
            None => return false,
        };
        self.p_sum -= self.weight_at(old);
        self.total_demand += self.customer_at(old).demand;
        while self.kept.last().map_or(false, |&pos| pos > e_last) {
            self.kept.pop();
        }
        self.s_first = e_last + 1;
        true
    }

    /// Leaves every branch whose last kept customer is already late.
    fn settle(&mut self) -> bool {
        loop {
            let last = *self.kept.last().unwrap_or(&0);
            if self.a_quote[last] <= self.customer_at(last).due {
                return true;
            }
            if !self.backtrack() {
                return false;
            }
            self.increment_last();
            self.increment_k();
        }
    }

    fn advance(&mut self) -> bool {
        if self.p_sum < self.p_best
            && !self.is_tail(self.s_first)
            && self.ejected.len() < self.k_max
        {
            self.increment_k();
        } else if !self.is_tail(self.s_first) {
            self.increment_last();
            self.increment_k();
        } else {
            if !self.backtrack() {
                return false;
            }
            self.increment_last();
            self.increment_k();
        }
        self.settle()
    }

    fn is_feasible(&self) -> bool {
        let s_first = self.s_first;
        let node = self.sol.node(self.positions[s_first]);
        self.p_sum < self.p_best
            && self.a_quote[s_first] <= self.customer_at(s_first).due
            && self.a_temp[s_first] <= node.z
            && node.tw_sf == 0.0
            && self.total_demand <= self.sol.instance().vehicle_capacity
    }

    fn finish(&mut self) -> Option<Ejection> {
        self.state = State::Done;
        self.kept.clear();
        self.ejected.clear();
        None
    }
}

impl<'a> Iterator for FeasibleEjections<'a> {
    type Item = Ejection;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Done => return None,
            State::Fresh => {
                self.state = State::Running;
                self.kept.push(0);
                if self.k_max == 0 || self.positions.len() <= 2 {
                    return self.finish();
                }
                self.increment_k();
                if !self.settle() {
                    return self.finish();
                }
            }
            State::Running => {
                if !self.advance() {
                    return self.finish();
                }
            }
        }
        loop {
            if self.is_feasible() {
                self.p_best = self.p_sum;
                return Some(Ejection {
                    customers: self.ejected.iter().map(|&pos| self.positions[pos]).collect(),
                    p_sum: self.p_sum,
                });
            }
            if !self.advance() {
                return self.finish();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;
    use rand::Rng;

    use crate::problem::vrptw::tests::create_random_instance;
    use crate::problem::vrptw::VRPTWInstance;
    use crate::utils::validator::validate_route;
    use crate::utils::{create_seeded_rng, Random};

    use super::*;

    /// All subsets in lexicographic order, filtered by the same improvement rule.
    fn brute_force(
        instance: &VRPTWInstance,
        route: &[usize],
        k_max: usize,
        weights: &[i64],
        mut p_best: i64,
    ) -> (Vec<Ejection>, i64) {
        fn visit(
            instance: &VRPTWInstance,
            route: &[usize],
            k_max: usize,
            weights: &[i64],
            from: usize,
            chosen: &mut Vec<usize>,
            p_best: &mut i64,
            found: &mut Vec<Ejection>,
        ) {
            for pos in from..route.len() {
                chosen.push(pos);
                let p_sum = chosen.iter().map(|&i| weights[route[i]]).sum::<i64>();
                let remaining = route
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !chosen.contains(i))
                    .map(|(_, &c)| c)
                    .collect::<Vec<_>>();
                if p_sum < *p_best && validate_route(instance, &remaining).is_ok() {
                    *p_best = p_sum;
                    found.push(Ejection {
                        customers: chosen.iter().map(|&i| route[i]).collect(),
                        p_sum,
                    });
                }
                if chosen.len() < k_max {
                    visit(instance, route, k_max, weights, pos + 1, chosen, p_best, found);
                }
                chosen.pop();
            }
        }
        let mut found = Vec::new();
        visit(instance, route, k_max, weights, 0, &mut Vec::new(), &mut p_best, &mut found);
        (found, p_best)
    }

    fn random_route(rng: &mut Random, instance: &VRPTWInstance, len: usize) -> Vec<usize> {
        let mut customers = (1..=instance.num_customers).collect::<Vec<_>>();
        customers.shuffle(rng);
        customers.truncate(len);
        customers.sort_by(|a, b| {
            instance
                .customer(*a)
                .ready
                .total_cmp(&instance.customer(*b).ready)
        });
        // a few local swaps to create violations
        for _ in 0..2 {
            let i = rng.gen_range(0..len - 1);
            customers.swap(i, i + 1);
        }
        customers
    }

    #[test]
    fn yields_the_same_subsets_as_brute_force() {
        let mut rng = create_seeded_rng(41);
        let mut yields = 0;
        for round in 0..40 {
            let instance = create_random_instance(&mut rng, 14, 120.0);
            let len = 4 + round % 7;
            let route = random_route(&mut rng, &instance, len);
            let weights = (0..=instance.num_customers)
                .map(|_| rng.gen_range(0..4))
                .collect::<Vec<i64>>();
            let k_max = 1 + round % 5;

            let mut sol = Solution::new(&instance);
            let pool = (1..=instance.num_customers)
                .filter(|c| !route.contains(c))
                .collect::<Vec<_>>();
            sol.set(&[route.clone()], &pool, None);

            let mut ejections = FeasibleEjections::new(&sol, 0, k_max, &weights, i64::MAX);
            let found = ejections.by_ref().collect::<Vec<_>>();
            let (expected, p_best) = brute_force(&instance, &route, k_max, &weights, i64::MAX);
            assert_eq!(found, expected, "route {:?}", route);
            assert_eq!(ejections.p_best(), p_best);
            yields += found.len();
        }
        assert!(yields > 0);
    }

    #[test]
    fn respects_the_initial_bound_and_stops_early() {
        let mut rng = create_seeded_rng(42);
        let instance = create_random_instance(&mut rng, 10, 40.0);
        let route = (1..=10).collect::<Vec<_>>();
        let mut sol = Solution::new(&instance);
        sol.set(&[route.clone()], &[], None);
        let weights = vec![1; 11];

        let (expected, _) = brute_force(&instance, &route, 3, &weights, 3);
        let found = FeasibleEjections::new(&sol, 0, 3, &weights, 3).collect::<Vec<_>>();
        assert_eq!(found, expected);
        assert!(found.iter().all(|it| it.p_sum < 3));

        // the consumer may stop after the first yield
        let mut ejections = FeasibleEjections::new(&sol, 0, 3, &weights, i64::MAX);
        let first = ejections.next();
        let (all, _) = brute_force(&instance, &route, 3, &weights, i64::MAX);
        assert_eq!(first, all.first().cloned());
    }

    #[test]
    fn nothing_to_eject() {
        let mut rng = create_seeded_rng(43);
        let instance = create_random_instance(&mut rng, 3, 100.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[vec![], vec![1, 2, 3]], &[], None);
        let weights = vec![0; 4];

        assert_eq!(FeasibleEjections::new(&sol, 0, 3, &weights, i64::MAX).next(), None);
        assert_eq!(FeasibleEjections::new(&sol, 1, 0, &weights, i64::MAX).next(), None);
    }
}
