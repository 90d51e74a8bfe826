use log::{debug, info, trace};
use rand::Rng;

use crate::ejection::FeasibleEjections;
use crate::neighbourhood::ModificationNeighbourhood;
use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
use crate::solution::modification::{Modification, ModificationType};
use crate::solution::Solution;
use crate::solver::penalty_counter::PenaltyCounter;
#[cfg(feature = "search_assertions")]
use crate::utils::validator::assert_valid_solution;
use crate::utils::{Countdown, Random, EPS5};

#[derive(Clone, Debug)]
pub struct Parameters {
    pub n_near: usize,
    pub k_max: usize,
    pub i_rand: usize,
    pub beta_correction: bool,
    /// overrides the capacity bound when larger
    pub lower_bound: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            n_near: 100,
            k_max: 5,
            i_rand: 1000,
            beta_correction: false,
            lower_bound: 0,
        }
    }
}

/// Route minimization by repeated route deletion: the customers of a deleted route are put
/// into the ejection pool and reinserted one by one with increasingly expensive strategies.
pub struct EamaSolver<'a> {
    instance: &'a VRPTWInstance,
    params: Parameters,
    /// weight of the capacity penalty
    alpha: f64,
    /// weight of the time-window penalty
    beta: f64,
    p: PenaltyCounter,
}

impl<'a> EamaSolver<'a> {
    pub fn with_instance(instance: &'a VRPTWInstance, params: Parameters) -> Self {
        Self {
            instance,
            params,
            alpha: 1.0,
            beta: 1.0,
            p: PenaltyCounter::new(instance),
        }
    }

    pub fn solve(&mut self, rng: &mut Random, countdown: &Countdown) -> Solution<'a> {
        self.alpha = 1.0;
        self.beta = 1.0;
        self.p.clear();

        let lower_bound = self.instance.routes_lower_bound().max(self.params.lower_bound);
        let mut sol = Solution::with_one_route_per_customer(self.instance);
        info!(
            "starting with {} routes, lower bound {}",
            sol.num_routes(),
            lower_bound
        );

        while sol.num_routes() > lower_bound {
            info!("routes number: {}", sol.num_routes());
            if !self.delete_route(&mut sol, rng, countdown) {
                break;
            }
            sol.remove_empty_routes();

            #[cfg(feature = "search_assertions")]
            assert_valid_solution(self.instance, &sol);
        }
        sol
    }

    /// Removes a random route and reinserts all of its customers. Restores the solution when
    /// a customer cannot be reinserted or the time is up.
    pub fn delete_route(
        &mut self,
        sol: &mut Solution<'a>,
        rng: &mut Random,
        countdown: &Countdown,
    ) -> bool {
        debug_assert!(sol.ejection_pool.is_empty() && sol.w.is_none());
        let snapshot = sol.to_description();
        let ejected = sol.eliminate_random_route(rng);
        debug!("delete_route: {} customers in the ejection pool", ejected);

        while let Some(w) = sol.ejection_pool.pop() {
            sol.w = Some(w);
            if countdown.is_finished() {
                debug!("delete_route: time limit reached");
                sol.set_with(&snapshot);
                return false;
            }
            trace!("ejection pool: {}, w: {}", sol.ejection_pool.len(), w);

            if self.insert_feasible(sol) || self.squeeze(sol, rng) {
                #[cfg(feature = "search_assertions")]
                assert!(sol.accounts_for_all_customers());
                continue;
            }

            let p_w = self.p.increment(w);
            debug!("p[{}] = {}", w, p_w);
            if self.insert_eject(sol) {
                self.perturb(sol, rng);
                #[cfg(feature = "search_assertions")]
                assert!(sol.accounts_for_all_customers());
                continue;
            }

            debug!("delete_route failed, restoring {} routes", snapshot.number_of_routes());
            sol.set_with(&snapshot);
            return false;
        }
        true
    }

    /// Inserts `w` at the first position next to one of its neighbours (or at the end of a
    /// route) that keeps the solution feasible.
    pub fn insert_feasible(&self, sol: &mut Solution) -> bool {
        let w = match sol.w {
            Some(w) => w,
            None => return false,
        };
        match Self::find_feasible_insertion(sol, w) {
            Some(m) => {
                m.apply(sol);
                sol.w = None;
                trace!("insert_feasible: inserted {}", w);
                true
            }
            None => false,
        }
    }

    fn find_feasible_insertion(sol: &Solution, w: usize) -> Option<Modification> {
        let neighbours = sol.instance().neighbours().nearest(w).iter().copied();
        let tails = sol.iter_route_ids().map(|r| sol.route_tail(r));
        neighbours.chain(tails).find_map(|v| {
            let mut m = Modification::insert(v, w);
            (m.applicable(sol) && m.delta(sol, 1.0, 1.0) < EPS5).then_some(m)
        })
    }

    /// Cheapest insertion of `w` over the given routes, weighted by the current `alpha` and
    /// `beta`. The first insertion without penalty increase is taken right away.
    fn find_optimal_insertion(
        &self,
        sol: &Solution,
        routes: impl Iterator<Item = usize>,
        w: usize,
    ) -> Option<Modification> {
        let mut best: Option<(Num, Modification)> = None;
        for route in routes {
            // w goes in front of v, so the head is skipped
            for v in sol.iter_route(route).skip(1) {
                let mut m = Modification::insert(v, w);
                let delta = m.delta(sol, self.alpha, self.beta);
                if best.as_ref().map_or(true, |(opt, _)| delta < *opt) {
                    if delta < EPS5 {
                        return Some(m);
                    }
                    best = Some((delta, m));
                }
            }
        }
        best.map(|(_, m)| m)
    }

    /// Inserts `w` at its cheapest position and repairs the resulting infeasibility with local
    /// search on random infeasible routes.
    pub fn squeeze(&mut self, sol: &mut Solution<'a>, rng: &mut Random) -> bool {
        let w = match sol.w {
            Some(w) => w,
            None => return false,
        };
        let snapshot = sol.to_description();
        let routes = sol.iter_route_ids().collect::<Vec<_>>();
        let insertion = match self.find_optimal_insertion(sol, routes.into_iter(), w) {
            Some(m) => m,
            None => return false,
        };
        insertion.apply(sol);
        sol.w = None;

        loop {
            let infeasible = sol.iter_infeasible_route_ids().collect::<Vec<_>>();
            if infeasible.is_empty() {
                break;
            }
            trace!("squeeze: penalty sum {}", sol.total_penalty(self.alpha, self.beta));
            let route = infeasible[rng.gen_range(0..infeasible.len())];
            let route_penalty = sol.route_penalty(route, self.alpha, self.beta);

            let mut best: Option<(Num, Modification)> = None;
            for mut m in ModificationNeighbourhood::new(sol, route, self.params.n_near, rng) {
                let delta = m.delta(sol, self.alpha, self.beta);
                if best.as_ref().map_or(true, |(opt, _)| delta < *opt) {
                    best = Some((delta, m));
                    // resolves the whole violation of the route
                    if delta <= -route_penalty + EPS5 {
                        break;
                    }
                }
            }

            match best {
                Some((delta, m)) if delta <= -EPS5 => {
                    trace!("squeeze: applying {:?} with delta {}", m.kind, delta);
                    m.apply(sol);
                }
                best => {
                    debug!(
                        "squeeze failed, best delta: {:?}",
                        best.map(|(delta, _)| delta)
                    );
                    if self.params.beta_correction {
                        self.correct_beta(sol);
                    }
                    sol.set_with(&snapshot);
                    return false;
                }
            }
        }
        debug_assert!(sol.is_feasible());
        true
    }

    fn correct_beta(&mut self, sol: &Solution) {
        // negative when the capacity penalty is the smaller one
        if sol.total_penalty(1.0, -1.0) < 0.0 {
            self.beta /= 0.99;
        } else {
            self.beta *= 0.99;
        }
        debug!("beta after correction: {:.12}", self.beta);
    }

    /// Inserts `w` into the route where the cheapest set of at most `k_max` customers (ranked
    /// by their penalty counters) can be ejected to restore feasibility. The ejected customers
    /// go into the ejection pool.
    pub fn insert_eject(&mut self, sol: &mut Solution<'a>) -> bool {
        let w = match sol.w {
            Some(w) => w,
            None => return false,
        };
        let snapshot = sol.to_description();
        let mut p_best = i64::MAX;
        let mut best: Option<(Modification, Vec<usize>)> = None;

        let routes = sol.iter_route_ids().collect::<Vec<_>>();
        for route in routes {
            let insertion = match self.find_optimal_insertion(sol, std::iter::once(route), w) {
                Some(m) if m.applicable(sol) => m,
                _ => continue,
            };
            insertion.apply(sol);

            if sol.is_route_feasible(route) {
                if p_best > 0 {
                    p_best = 0;
                    best = Some((insertion, Vec::new()));
                }
            } else {
                let mut ejections = FeasibleEjections::new(
                    sol,
                    route,
                    self.params.k_max,
                    self.p.as_slice(),
                    p_best,
                );
                for ejection in ejections.by_ref() {
                    best = Some((insertion, ejection.customers));
                }
                p_best = ejections.p_best();
            }

            Modification::eject(w).apply(sol);
        }
        debug!("insert_eject: best p_sum {}", p_best);

        let (insertion, ejected) = match best {
            Some(best) => best,
            None => {
                sol.set_with(&snapshot);
                return false;
            }
        };
        insertion.apply(sol);
        sol.w = None;
        for c in ejected {
            Modification::eject(c).apply(sol);
            sol.ejection_pool.push(c);
        }
        debug_assert!(sol.is_feasible());
        true
    }

    /// Applies random inter-route moves that do not increase the penalty. Returns the number
    /// of applied moves.
    pub fn perturb(&self, sol: &mut Solution, rng: &mut Random) -> usize {
        const KINDS: [ModificationType; 3] = [
            ModificationType::TwoOpt,
            ModificationType::OutRelocate,
            ModificationType::Exchange,
        ];
        let n = self.instance.num_customers;
        let mut applied = 0;
        for _ in 0..self.params.i_rand {
            let v = rng.gen_range(1..=n);
            if sol.is_ejected(v) {
                continue;
            }
            let w = rng.gen_range(1..=n);
            if sol.is_ejected(w) || sol.route_of(v) == sol.route_of(w) {
                continue;
            }
            let mut m = Modification::new(KINDS[rng.gen_range(0..KINDS.len())], v, w);
            if m.applicable(sol) && m.delta(sol, 1.0, 1.0) < EPS5 {
                m.apply(sol);
                applied += 1;
            }
        }
        debug!("perturb: applied {} modifications", applied);
        applied
    }
}
