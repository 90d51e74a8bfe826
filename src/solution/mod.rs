use fixedbitset::FixedBitSet;
use log::trace;
use rand::Rng;

use crate::penalty::{CapacityPenalty, Distance, TimeWindowPenalty};
use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
pub use crate::solution::description::SolutionDescription;
pub use crate::solution::ejection_pool::EjectionPool;
use crate::utils::{Random, EPS5};

pub mod datastructure;
mod description;
mod ejection_pool;
pub mod modification;

/// One entry of the route arena together with the aggregates of its route.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RouteNode {
    /// customer id, 0 for depot sentinels
    pub id: usize,
    pub pred: usize,
    pub succ: usize,
    pub route: Option<usize>,
    /// position in the route, the head sentinel is at 0
    pub idx: usize,

    /// earliest feasible arrival given the predecessors
    pub a: Num,
    pub tw_pf: Num,
    /// latest feasible arrival given the successors
    pub z: Num,
    pub tw_sf: Num,

    pub demand_pf: Num,
    pub demand_sf: Num,

    pub dist_pf: Num,
    pub dist_sf: Num,
}

impl RouteNode {
    fn unlinked(node_id: usize, customer_id: usize) -> Self {
        Self {
            id: customer_id,
            pred: node_id,
            succ: node_id,
            ..Default::default()
        }
    }
}

/// Node `c` of the arena is customer `c` (1..=n); node 0 is the depot template and never linked.
/// Route slot `r` owns the sentinels `n + 1 + 2r` (head) and `n + 2 + 2r` (tail).
/// `routes` lists the slots currently in use.
#[derive(Clone)]
pub struct Solution<'a> {
    pub(crate) instance: &'a VRPTWInstance,
    pub(crate) nodes: Vec<RouteNode>,
    pub(crate) routes: Vec<usize>,
    pub ejection_pool: EjectionPool,
    /// customer under repair
    pub w: Option<usize>,
}

impl<'a> Solution<'a> {
    pub fn new(instance: &'a VRPTWInstance) -> Self {
        let n = instance.num_customers;
        let mut nodes: Vec<RouteNode> = (0..=n).map(|id| RouteNode::unlinked(id, id)).collect();
        nodes.reserve(2 * n);
        for r in 0..n {
            let head = n + 1 + 2 * r;
            for idx in 0..2 {
                nodes.push(RouteNode {
                    id: 0,
                    pred: head,
                    succ: head + 1,
                    route: Some(r),
                    idx,
                    ..Default::default()
                });
            }
        }

        Self {
            instance,
            nodes,
            routes: Vec::with_capacity(n),
            ejection_pool: EjectionPool::with_num_customers(n),
            w: None,
        }
    }

    /// Initial solution serving every customer with its own vehicle.
    pub fn with_one_route_per_customer(instance: &'a VRPTWInstance) -> Self {
        let mut solution = Self::new(instance);
        let routes: Vec<Vec<usize>> = (1..=instance.num_customers).map(|c| vec![c]).collect();
        solution.set(&routes, &[], None);
        solution
    }

    pub fn instance(&self) -> &'a VRPTWInstance {
        self.instance
    }

    pub fn set_with(&mut self, desc: &SolutionDescription) {
        self.set(&desc.routes, &desc.ejection_pool, desc.w);
    }

    pub fn set(&mut self, routes: &[Vec<usize>], ejection_pool: &[usize], w: Option<usize>) {
        let n = self.instance.num_customers;
        debug_assert!(routes.len() <= n, "more routes than slots");

        for c in 1..=n {
            self.nodes[c] = RouteNode::unlinked(c, c);
        }
        self.routes.clear();
        self.ejection_pool.clear();

        for r in 0..n {
            let (head, tail) = (self.route_head(r), self.route_tail(r));
            self.link_nodes(head, tail);
        }

        for (r, route) in routes.iter().enumerate() {
            let mut prev = self.route_head(r);
            for &c in route {
                debug_assert!(c >= 1 && c <= n, "unknown customer {}", c);
                self.link_nodes(prev, c);
                self.nodes[c].route = Some(r);
                prev = c;
            }
            let tail = self.route_tail(r);
            self.link_nodes(prev, tail);
            self.routes.push(r);
            self.init_route_penalty(r);
        }

        for &c in ejection_pool {
            self.ejection_pool.push(c);
        }
        self.w = w;
    }

    pub fn to_description(&self) -> SolutionDescription {
        SolutionDescription {
            routes: self
                .routes
                .iter()
                .map(|&r| {
                    self.iter_customers_of_route(r)
                        .map(|it| self.nodes[it].id)
                        .collect()
                })
                .collect(),
            ejection_pool: self.ejection_pool.iter().collect(),
            w: self.w,
        }
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn iter_route_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.routes.iter().copied()
    }

    pub fn is_ejected(&self, node: usize) -> bool {
        self.nodes[node].route.is_none()
    }

    pub fn route_penalty(&self, route: usize, alpha: f64, beta: f64) -> Num {
        alpha * self.penalty::<CapacityPenalty>(route)
            + beta * self.penalty::<TimeWindowPenalty>(route)
    }

    pub fn total_penalty(&self, alpha: f64, beta: f64) -> Num {
        self.iter_route_ids()
            .map(|r| self.route_penalty(r, alpha, beta))
            .sum()
    }

    pub fn total_distance(&self) -> Num {
        self.iter_route_ids().map(|r| self.penalty::<Distance>(r)).sum()
    }

    pub fn is_route_feasible(&self, route: usize) -> bool {
        self.penalty::<CapacityPenalty>(route) < EPS5
            && self.penalty::<TimeWindowPenalty>(route) < EPS5
    }

    pub fn is_feasible(&self) -> bool {
        self.iter_route_ids().all(|r| self.is_route_feasible(r))
    }

    pub fn iter_infeasible_route_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter_route_ids().filter(|&r| !self.is_route_feasible(r))
    }

    /// Every customer is either routed exactly once, in the ejection pool, or under repair.
    pub fn accounts_for_all_customers(&self) -> bool {
        let n = self.instance.num_customers;
        let mut seen = FixedBitSet::with_capacity(n + 1);
        let mut mark = |c: usize| -> bool {
            if c == 0 || c > n || seen.contains(c) {
                return false;
            }
            seen.insert(c);
            true
        };
        for &r in &self.routes {
            for node in self.iter_customers_of_route(r) {
                if self.nodes[node].route != Some(r) || !mark(self.nodes[node].id) {
                    return false;
                }
            }
        }
        for c in self.ejection_pool.iter() {
            if !self.is_ejected(c) || !mark(c) {
                return false;
            }
        }
        if let Some(w) = self.w {
            if !self.is_ejected(w) || self.ejection_pool.contains(w) || !mark(w) {
                return false;
            }
        }
        seen.count_ones(..) == n
    }

    /// Removes a uniformly chosen route and pushes its customers, in route order, onto the pool.
    pub fn eliminate_random_route(&mut self, rng: &mut Random) -> usize {
        let idx = rng.gen_range(0..self.routes.len());
        let route = self.routes.swap_remove(idx);
        let customers = self.iter_customers_of_route(route).collect::<Vec<_>>();
        for &c in &customers {
            self.nodes[c] = RouteNode::unlinked(c, c);
            self.ejection_pool.push(c);
        }
        let (head, tail) = (self.route_head(route), self.route_tail(route));
        self.link_nodes(head, tail);
        self.init_route_penalty(route);
        trace!("eliminated route {} with {} customers", route, customers.len());
        customers.len()
    }

    /// Drops routes without customers. Returns the number of dropped routes.
    pub fn remove_empty_routes(&mut self) -> usize {
        let before = self.routes.len();
        let empty = self
            .routes
            .iter()
            .copied()
            .filter(|&r| self.route_len(r) == 0)
            .collect::<Vec<_>>();
        self.routes.retain(|r| !empty.contains(r));
        before - self.routes.len()
    }
}
