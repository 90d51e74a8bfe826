use crate::penalty::RouteAggregate;
use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
use crate::solution::{RouteNode, Solution};
use crate::utils::EPS7;

/// Accumulated lateness: an arrival after `due` is pushed back to `due` and the difference
/// is penalized, an arrival before `ready` waits.
pub struct TimeWindowPenalty;

#[inline(always)]
fn positive(x: Num) -> Num {
    x.max(0.0)
}

impl RouteAggregate for TimeWindowPenalty {
    const ORDER_INDEPENDENT: bool = false;

    fn start_forward(instance: &VRPTWInstance, head: &mut RouteNode) {
        head.a = instance.customer(head.id).ready;
        head.tw_pf = 0.0;
    }

    fn extend_forward(instance: &VRPTWInstance, prev: &RouteNode, next: &mut RouteNode) {
        let customer = instance.customer(next.id);
        let a_quote =
            prev.a + instance.customer(prev.id).servicetime + instance.time(prev.id, next.id);
        next.a = customer.clamp(a_quote);
        next.tw_pf = prev.tw_pf + positive(a_quote - customer.due);
    }

    fn start_backward(instance: &VRPTWInstance, tail: &mut RouteNode) {
        tail.z = instance.customer(tail.id).due;
        tail.tw_sf = 0.0;
    }

    fn extend_backward(instance: &VRPTWInstance, next: &RouteNode, prev: &mut RouteNode) {
        let customer = instance.customer(prev.id);
        let z_quote = next.z - customer.servicetime - instance.time(prev.id, next.id);
        prev.z = customer.clamp(z_quote);
        prev.tw_sf = next.tw_sf + positive(customer.ready - z_quote);
    }

    fn route_value(_instance: &VRPTWInstance, tail: &RouteNode) -> Num {
        tail.tw_pf
    }

    fn insert_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        v: &RouteNode,
        _tail: &RouteNode,
        w: usize,
    ) -> Num {
        between(instance, v_minus, v, w)
    }

    fn replace_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        _v: &RouteNode,
        v_plus: &RouteNode,
        _tail: &RouteNode,
        w: usize,
    ) -> Num {
        between(instance, v_minus, v_plus, w)
    }

    fn eject_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        _v: &RouteNode,
        v_plus: &RouteNode,
        _tail: &RouteNode,
    ) -> Num {
        Self::one_opt_value(instance, v_minus, v_plus)
    }

    fn one_opt_value(instance: &VRPTWInstance, v: &RouteNode, w_plus: &RouteNode) -> Num {
        let arrival = v.a + instance.customer(v.id).servicetime + instance.time(v.id, w_plus.id);
        v.tw_pf + w_plus.tw_sf + positive(arrival - w_plus.z)
    }
}

/// Penalty of the route where `w` is visited between `before` and `after`.
fn between(instance: &VRPTWInstance, before: &RouteNode, after: &RouteNode, w: usize) -> Num {
    let customer = instance.customer(w);
    let a_quote = before.a + instance.customer(before.id).servicetime + instance.time(before.id, w);
    let z_quote = after.z - customer.servicetime - instance.time(w, after.id);

    before.tw_pf
        + after.tw_sf
        + positive(a_quote - customer.due)
        + positive(customer.ready - z_quote)
        + positive(customer.clamp(a_quote) - customer.clamp(z_quote))
}

impl<'a> Solution<'a> {
    /// Lower bound of the time-window delta of exchanging two customers of the same route.
    ///
    /// Only the nodes next to the swapped positions are re-timed. Once the re-timed arrival
    /// meets the cached one again, the rest of the route is read off the prefix aggregates and
    /// the bound is exact (second value `true`).
    pub fn exchange_delta_lower_bound(&self, v: usize, w: usize) -> (Num, bool) {
        if v == w {
            return (0.0, true);
        }
        let route = self.routed(v);
        debug_assert_eq!(Some(route), self.route_of(w));
        let (v, w) = if self.nodes[v].idx < self.nodes[w].idx {
            (v, w)
        } else {
            (w, v)
        };

        let instance = self.instance;
        let nodes = &self.nodes;
        let (v_minus, v_plus) = (nodes[v].pred, nodes[v].succ);
        let (w_minus, w_plus) = (nodes[w].pred, nodes[w].succ);
        let tail = self.route_tail(route);

        let mut penalty = nodes[v_minus].tw_pf;
        if v_plus == w {
            let (a, late) = self.retime(v_minus, w, v);
            let arrival = a
                + instance.customer(nodes[v].id).servicetime
                + instance.time(nodes[v].id, nodes[w_plus].id);
            penalty += late + nodes[w_plus].tw_sf + positive(arrival - nodes[w_plus].z);
            return (penalty - self.penalty::<TimeWindowPenalty>(route), true);
        }

        let mut exact = false;
        let (a, late) = self.retime(v_minus, w, v_plus);
        penalty += late;
        if (a - nodes[v_plus].a).abs() < EPS7 {
            penalty += nodes[w_minus].tw_pf - nodes[v_plus].tw_pf;
            let (a, late) = self.retime(w_minus, v, w_plus);
            penalty += late;
            if (a - nodes[w_plus].a).abs() < EPS7 {
                penalty += nodes[tail].tw_pf - nodes[w_plus].tw_pf;
                exact = true;
            }
        }
        (penalty - self.penalty::<TimeWindowPenalty>(route), exact)
    }

    /// Arrival at `c2` and the lateness collected at `c1` and `c2` when both are visited
    /// after `c0`.
    fn retime(&self, c0: usize, c1: usize, c2: usize) -> (Num, Num) {
        let instance = self.instance;
        let mut a = self.nodes[c0].a;
        let mut late = 0.0;
        let mut prev = self.nodes[c0].id;
        for next in [self.nodes[c1].id, self.nodes[c2].id] {
            let customer = instance.customer(next);
            let a_quote = a + instance.customer(prev).servicetime + instance.time(prev, next);
            late += positive(a_quote - customer.due);
            a = customer.clamp(a_quote);
            prev = next;
        }
        (a, late)
    }
}
