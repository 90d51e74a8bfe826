use crate::penalty::RouteAggregate;
use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
use crate::solution::RouteNode;

/// Load above the vehicle capacity.
pub struct CapacityPenalty;

#[inline(always)]
fn overload(instance: &VRPTWInstance, load: Num) -> Num {
    (load - instance.vehicle_capacity).max(0.0)
}

impl RouteAggregate for CapacityPenalty {
    const ORDER_INDEPENDENT: bool = true;

    fn start_forward(instance: &VRPTWInstance, head: &mut RouteNode) {
        head.demand_pf = instance.customer(head.id).demand;
    }

    fn extend_forward(instance: &VRPTWInstance, prev: &RouteNode, next: &mut RouteNode) {
        next.demand_pf = prev.demand_pf + instance.customer(next.id).demand;
    }

    fn start_backward(instance: &VRPTWInstance, tail: &mut RouteNode) {
        tail.demand_sf = instance.customer(tail.id).demand;
    }

    fn extend_backward(instance: &VRPTWInstance, next: &RouteNode, prev: &mut RouteNode) {
        prev.demand_sf = next.demand_sf + instance.customer(prev.id).demand;
    }

    fn route_value(instance: &VRPTWInstance, tail: &RouteNode) -> Num {
        overload(instance, tail.demand_pf)
    }

    fn insert_value(
        instance: &VRPTWInstance,
        _v_minus: &RouteNode,
        _v: &RouteNode,
        tail: &RouteNode,
        w: usize,
    ) -> Num {
        overload(instance, tail.demand_pf + instance.customer(w).demand)
    }

    fn replace_value(
        instance: &VRPTWInstance,
        _v_minus: &RouteNode,
        v: &RouteNode,
        _v_plus: &RouteNode,
        tail: &RouteNode,
        w: usize,
    ) -> Num {
        overload(
            instance,
            tail.demand_pf - instance.customer(v.id).demand + instance.customer(w).demand,
        )
    }

    fn eject_value(
        instance: &VRPTWInstance,
        _v_minus: &RouteNode,
        v: &RouteNode,
        _v_plus: &RouteNode,
        tail: &RouteNode,
    ) -> Num {
        overload(instance, tail.demand_pf - instance.customer(v.id).demand)
    }

    fn one_opt_value(instance: &VRPTWInstance, v: &RouteNode, w_plus: &RouteNode) -> Num {
        overload(instance, v.demand_pf + w_plus.demand_sf)
    }
}
