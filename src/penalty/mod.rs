use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
use crate::solution::{RouteNode, Solution};

pub use capacity::CapacityPenalty;
pub use distance::Distance;
pub use time_window::TimeWindowPenalty;

mod capacity;
mod distance;
mod time_window;

/// A quantity kept per route as a prefix (`*_pf`) and a suffix (`*_sf`) aggregate on every node.
///
/// All `*_value` functions return the value of the whole route after the described edit,
/// using only the aggregates of the nodes around the edit:
/// * `insert_value`: customer `w` placed between `v_minus` and `v`
/// * `replace_value`: customer `w` takes the place of `v` (between `v_minus` and `v_plus`)
/// * `eject_value`: `v` removed from between `v_minus` and `v_plus`
/// * `one_opt_value`: the prefix ending in `v` followed by the suffix starting in `w_plus`
pub trait RouteAggregate {
    /// The route value does not depend on the visiting order.
    const ORDER_INDEPENDENT: bool;

    fn start_forward(instance: &VRPTWInstance, head: &mut RouteNode);
    fn extend_forward(instance: &VRPTWInstance, prev: &RouteNode, next: &mut RouteNode);
    fn start_backward(instance: &VRPTWInstance, tail: &mut RouteNode);
    fn extend_backward(instance: &VRPTWInstance, next: &RouteNode, prev: &mut RouteNode);

    fn route_value(instance: &VRPTWInstance, tail: &RouteNode) -> Num;
    fn insert_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        v: &RouteNode,
        tail: &RouteNode,
        w: usize,
    ) -> Num;
    fn replace_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        v: &RouteNode,
        v_plus: &RouteNode,
        tail: &RouteNode,
        w: usize,
    ) -> Num;
    fn eject_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        v: &RouteNode,
        v_plus: &RouteNode,
        tail: &RouteNode,
    ) -> Num;
    fn one_opt_value(instance: &VRPTWInstance, v: &RouteNode, w_plus: &RouteNode) -> Num;
}

/// Shared read access to one node and write access to another node of the same slice.
pub(crate) fn pair_mut(
    nodes: &mut [RouteNode],
    read: usize,
    write: usize,
) -> (&RouteNode, &mut RouteNode) {
    debug_assert_ne!(read, write);
    if read < write {
        let (left, right) = nodes.split_at_mut(write);
        (&left[read], &mut right[0])
    } else {
        let (left, right) = nodes.split_at_mut(read);
        (&right[0], &mut left[write])
    }
}

/// Runs both passes of `A` over a detached sequence of nodes whose first and last entries
/// are depots.
pub fn init_sequence<A: RouteAggregate>(instance: &VRPTWInstance, nodes: &mut [RouteNode]) {
    let len = nodes.len();
    A::start_forward(instance, &mut nodes[0]);
    for i in 1..len {
        let (prev, next) = pair_mut(nodes, i - 1, i);
        A::extend_forward(instance, prev, next);
    }
    A::start_backward(instance, &mut nodes[len - 1]);
    for i in (0..len - 1).rev() {
        let (next, prev) = pair_mut(nodes, i + 1, i);
        A::extend_backward(instance, next, prev);
    }
}

/// Detached route visiting `customers` between two depot copies.
pub fn detached_sequence(customers: &[usize]) -> Vec<RouteNode> {
    std::iter::once(0)
        .chain(customers.iter().copied())
        .chain(std::iter::once(0))
        .enumerate()
        .map(|(idx, id)| RouteNode {
            id,
            idx,
            ..Default::default()
        })
        .collect()
}

/// Value of a route visiting `customers` in the given order.
pub fn evaluate_sequence<A: RouteAggregate>(instance: &VRPTWInstance, customers: &[usize]) -> Num {
    let mut nodes = detached_sequence(customers);
    init_sequence::<A>(instance, &mut nodes);
    A::route_value(instance, &nodes[nodes.len() - 1])
}

impl<'a> Solution<'a> {
    pub(crate) fn init_aggregate<A: RouteAggregate>(&mut self, route: usize) {
        let instance = self.instance;
        let (head, tail) = (self.route_head(route), self.route_tail(route));

        A::start_forward(instance, &mut self.nodes[head]);
        let mut node = head;
        while node != tail {
            let next = self.nodes[node].succ;
            let (prev_node, next_node) = pair_mut(&mut self.nodes, node, next);
            A::extend_forward(instance, prev_node, next_node);
            node = next;
        }

        A::start_backward(instance, &mut self.nodes[tail]);
        while node != head {
            let prev = self.nodes[node].pred;
            let (next_node, prev_node) = pair_mut(&mut self.nodes, node, prev);
            A::extend_backward(instance, next_node, prev_node);
            node = prev;
        }
    }

    pub fn penalty<A: RouteAggregate>(&self, route: usize) -> Num {
        A::route_value(self.instance, &self.nodes[self.route_tail(route)])
    }

    /// Route value after placing the ejected customer `w` in front of `v`.
    pub fn insert_penalty<A: RouteAggregate>(&self, v: usize, w: usize) -> Num {
        let route = self.routed(v);
        let nodes = &self.nodes;
        A::insert_value(
            self.instance,
            &nodes[nodes[v].pred],
            &nodes[v],
            &nodes[self.route_tail(route)],
            nodes[w].id,
        )
    }
    pub fn insert_delta<A: RouteAggregate>(&self, v: usize, w: usize) -> Num {
        self.insert_penalty::<A>(v, w) - self.penalty::<A>(self.routed(v))
    }

    /// Route value of `v`'s route after `w` took the place of `v`.
    pub fn replace_penalty<A: RouteAggregate>(&self, v: usize, w: usize) -> Num {
        let route = self.routed(v);
        let nodes = &self.nodes;
        A::replace_value(
            self.instance,
            &nodes[nodes[v].pred],
            &nodes[v],
            &nodes[nodes[v].succ],
            &nodes[self.route_tail(route)],
            nodes[w].id,
        )
    }
    pub fn replace_delta<A: RouteAggregate>(&self, v: usize, w: usize) -> Num {
        self.replace_penalty::<A>(v, w) - self.penalty::<A>(self.routed(v))
    }

    pub fn eject_penalty<A: RouteAggregate>(&self, v: usize) -> Num {
        let route = self.routed(v);
        let nodes = &self.nodes;
        A::eject_value(
            self.instance,
            &nodes[nodes[v].pred],
            &nodes[v],
            &nodes[nodes[v].succ],
            &nodes[self.route_tail(route)],
        )
    }
    pub fn eject_delta<A: RouteAggregate>(&self, v: usize) -> Num {
        self.eject_penalty::<A>(v) - self.penalty::<A>(self.routed(v))
    }

    /// Change of the summed value of both routes when the customers after `v` and after `w`
    /// swap routes.
    pub fn two_opt_delta<A: RouteAggregate>(&self, v: usize, w: usize) -> Num {
        let (route_v, route_w) = (self.routed(v), self.routed(w));
        debug_assert_ne!(route_v, route_w);
        let nodes = &self.nodes;
        A::one_opt_value(self.instance, &nodes[v], &nodes[nodes[w].succ])
            - self.penalty::<A>(route_v)
            + A::one_opt_value(self.instance, &nodes[w], &nodes[nodes[v].succ])
            - self.penalty::<A>(route_w)
    }

    /// Change caused by moving `w` in front of `v`.
    pub fn out_relocate_delta<A: RouteAggregate>(&self, v: usize, w: usize) -> Num {
        let (route_v, route_w) = (self.routed(v), self.routed(w));
        if route_v != route_w {
            return self.eject_delta::<A>(w) + self.insert_delta::<A>(v, w);
        }
        if A::ORDER_INDEPENDENT || v == w || self.succ(w) == v {
            return 0.0;
        }
        let mut customers = self
            .iter_customers_of_route(route_v)
            .filter(|&c| c != w)
            .collect::<Vec<_>>();
        let at = customers
            .iter()
            .position(|&c| c == v)
            .unwrap_or(customers.len());
        customers.insert(at, w);
        self.resequenced_delta::<A>(route_v, &customers)
    }

    /// Change caused by swapping the positions of `v` and `w`.
    pub fn exchange_delta<A: RouteAggregate>(&self, v: usize, w: usize) -> Num {
        let (route_v, route_w) = (self.routed(v), self.routed(w));
        if route_v != route_w {
            return self.replace_delta::<A>(v, w) + self.replace_delta::<A>(w, v);
        }
        if A::ORDER_INDEPENDENT || v == w {
            return 0.0;
        }
        let customers = self
            .iter_customers_of_route(route_v)
            .map(|c| {
                if c == v {
                    w
                } else if c == w {
                    v
                } else {
                    c
                }
            })
            .collect::<Vec<_>>();
        self.resequenced_delta::<A>(route_v, &customers)
    }

    fn resequenced_delta<A: RouteAggregate>(&self, route: usize, customers: &[usize]) -> Num {
        let ids = customers.iter().map(|&c| self.nodes[c].id).collect::<Vec<_>>();
        evaluate_sequence::<A>(self.instance, &ids) - self.penalty::<A>(route)
    }
}
