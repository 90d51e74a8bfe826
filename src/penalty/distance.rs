use crate::penalty::RouteAggregate;
use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
use crate::solution::RouteNode;

/// Travelled distance, not a penalty but maintained the same way.
pub struct Distance;

impl RouteAggregate for Distance {
    const ORDER_INDEPENDENT: bool = false;

    fn start_forward(_instance: &VRPTWInstance, head: &mut RouteNode) {
        head.dist_pf = 0.0;
    }

    fn extend_forward(instance: &VRPTWInstance, prev: &RouteNode, next: &mut RouteNode) {
        next.dist_pf = prev.dist_pf + instance.distance(prev.id, next.id);
    }

    fn start_backward(_instance: &VRPTWInstance, tail: &mut RouteNode) {
        tail.dist_sf = 0.0;
    }

    fn extend_backward(instance: &VRPTWInstance, next: &RouteNode, prev: &mut RouteNode) {
        prev.dist_sf = next.dist_sf + instance.distance(prev.id, next.id);
    }

    fn route_value(_instance: &VRPTWInstance, tail: &RouteNode) -> Num {
        tail.dist_pf
    }

    fn insert_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        v: &RouteNode,
        _tail: &RouteNode,
        w: usize,
    ) -> Num {
        v_minus.dist_pf + instance.distance(v_minus.id, w) + instance.distance(w, v.id) + v.dist_sf
    }

    fn replace_value(
        instance: &VRPTWInstance,
        v_minus: &RouteNode,
        _v: &RouteNode,
        v_plus: &RouteNode,
        _tail: &RouteNode,
        w: usize,
    ) -> Num {
        v_minus.dist_pf
            + instance.distance(v_minus.id, w)
            + instance.distance(w, v_plus.id)
            + v_plus.dist_sf
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
        v.dist_pf + instance.distance(v.id, w_plus.id) + w_plus.dist_sf
    }
}
