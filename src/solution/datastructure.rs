use crate::penalty::{CapacityPenalty, Distance, TimeWindowPenalty};
use crate::solution::{RouteNode, Solution};

impl<'a> Solution<'a> {
    pub fn node(&self, node_id: usize) -> &RouteNode {
        &self.nodes[node_id]
    }
    pub fn pred(&self, node_id: usize) -> usize {
        self.nodes[node_id].pred
    }
    pub fn succ(&self, node_id: usize) -> usize {
        self.nodes[node_id].succ
    }
    pub fn route_of(&self, node_id: usize) -> Option<usize> {
        self.nodes[node_id].route
    }
    /// Route of a node that is known to be routed.
    pub(crate) fn routed(&self, node_id: usize) -> usize {
        match self.nodes[node_id].route {
            Some(route) => route,
            None => panic!("node {} is not routed", node_id),
        }
    }
    pub fn route_head(&self, route: usize) -> usize {
        self.instance.num_customers + 1 + 2 * route
    }
    pub fn route_tail(&self, route: usize) -> usize {
        self.route_head(route) + 1
    }
    pub fn is_depot(&self, node_id: usize) -> bool {
        self.nodes[node_id].id == 0
    }
    pub fn is_head(&self, node_id: usize) -> bool {
        let n = self.instance.num_customers;
        node_id > n && (node_id - n - 1) % 2 == 0
    }
    pub fn is_tail(&self, node_id: usize) -> bool {
        let n = self.instance.num_customers;
        node_id > n && (node_id - n - 1) % 2 == 1
    }

    pub(crate) fn link_nodes(&mut self, n1: usize, n2: usize) {
        self.nodes[n1].succ = n2;
        self.nodes[n2].pred = n1;
    }

    /// Closes the gap left by `node` and detaches it from its route.
    pub(crate) fn relink_gap_when_removing_node(&mut self, node: usize) -> (usize, usize) {
        let (pred, succ) = (self.nodes[node].pred, self.nodes[node].succ);
        self.link_nodes(pred, succ);
        let n = &mut self.nodes[node];
        n.pred = node;
        n.succ = node;
        n.route = None;
        (pred, succ)
    }

    /// Links the detached node `w` between `pred(v)` and `v`.
    pub(crate) fn relink_in_front_of(&mut self, v: usize, w: usize) {
        let pred = self.nodes[v].pred;
        self.link_nodes(pred, w);
        self.link_nodes(w, v);
        self.nodes[w].route = self.nodes[v].route;
    }

    /// Swaps the positions (and routes) of two distinct nodes.
    pub(crate) fn swap_positions(&mut self, v: usize, w: usize) {
        debug_assert_ne!(v, w);
        if self.nodes[v].succ == w {
            let (pred, succ) = (self.nodes[v].pred, self.nodes[w].succ);
            self.link_nodes(pred, w);
            self.link_nodes(w, v);
            self.link_nodes(v, succ);
        } else if self.nodes[w].succ == v {
            let (pred, succ) = (self.nodes[w].pred, self.nodes[v].succ);
            self.link_nodes(pred, v);
            self.link_nodes(v, w);
            self.link_nodes(w, succ);
        } else {
            let (v_pred, v_succ) = (self.nodes[v].pred, self.nodes[v].succ);
            let (w_pred, w_succ) = (self.nodes[w].pred, self.nodes[w].succ);
            self.link_nodes(v_pred, w);
            self.link_nodes(w, v_succ);
            self.link_nodes(w_pred, v);
            self.link_nodes(v, w_succ);
        }
        let route_v = self.nodes[v].route;
        self.nodes[v].route = self.nodes[w].route;
        self.nodes[w].route = route_v;
    }

    /// Exchanges the customers following `v` with the customers following `w`.
    /// Both routes keep their own sentinels.
    pub(crate) fn swap_tails(&mut self, v: usize, w: usize) {
        let (route_v, route_w) = (self.routed(v), self.routed(w));
        debug_assert_ne!(route_v, route_w);
        let (tail_v, tail_w) = (self.route_tail(route_v), self.route_tail(route_w));

        let segment_v = (self.nodes[v].succ != tail_v)
            .then(|| (self.nodes[v].succ, self.nodes[tail_v].pred));
        let segment_w = (self.nodes[w].succ != tail_w)
            .then(|| (self.nodes[w].succ, self.nodes[tail_w].pred));

        match segment_w {
            Some((first, last)) => {
                self.link_nodes(v, first);
                self.link_nodes(last, tail_v);
                self.retag(first, last, route_v);
            }
            None => self.link_nodes(v, tail_v),
        }
        match segment_v {
            Some((first, last)) => {
                self.link_nodes(w, first);
                self.link_nodes(last, tail_w);
                self.retag(first, last, route_w);
            }
            None => self.link_nodes(w, tail_w),
        }
    }

    fn retag(&mut self, first: usize, last: usize, route: usize) {
        let mut node = first;
        loop {
            self.nodes[node].route = Some(route);
            if node == last {
                break;
            }
            node = self.nodes[node].succ;
        }
    }

    /// Recomputes positions and all aggregates of a route.
    pub(crate) fn init_route_penalty(&mut self, route: usize) {
        let tail = self.route_tail(route);
        let mut node = self.route_head(route);
        let mut idx = 0;
        loop {
            self.nodes[node].idx = idx;
            if node == tail {
                break;
            }
            node = self.nodes[node].succ;
            idx += 1;
        }
        self.init_aggregate::<TimeWindowPenalty>(route);
        self.init_aggregate::<CapacityPenalty>(route);
        self.init_aggregate::<Distance>(route);
    }

    /// Sentinels are depot copies, every node between them belongs to the route
    /// and the links agree in both directions.
    pub(crate) fn route_is_consistent(&self, route: usize) -> bool {
        let (head, tail) = (self.route_head(route), self.route_tail(route));
        if !self.is_depot(head) || !self.is_depot(tail) {
            return false;
        }
        let mut node = head;
        let mut steps = 0;
        while node != tail {
            let succ = self.nodes[node].succ;
            if self.nodes[succ].pred != node || self.nodes[node].route != Some(route) {
                return false;
            }
            if succ != tail && self.is_depot(succ) {
                return false;
            }
            node = succ;
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
        }
        self.nodes[tail].route == Some(route)
    }

    pub fn route_len(&self, route: usize) -> usize {
        self.nodes[self.route_tail(route)].idx - 1
    }
}

pub struct RouteIterator<'a> {
    sol: &'a Solution<'a>,
    next: Option<usize>,
    last: usize,
}

impl<'a> Iterator for RouteIterator<'a> {
    type Item = usize;
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(u) = self.next {
            if u != self.last {
                self.next = Some(self.sol.succ(u));
            } else {
                self.next = None;
            }
            return Some(u);
        }
        None
    }
}

impl<'a> RouteIterator<'a> {
    fn new(sol: &'a Solution, first: usize, last: usize) -> Self {
        Self {
            sol,
            next: Some(first),
            last,
        }
    }
    fn empty(sol: &'a Solution) -> Self {
        Self {
            sol,
            next: None,
            last: 0,
        }
    }
}

impl<'a> Solution<'a> {
    /// All nodes of the route, sentinels included.
    pub fn iter_route(&self, route: usize) -> RouteIterator {
        RouteIterator::new(self, self.route_head(route), self.route_tail(route))
    }
    pub fn iter_customers_of_route(&self, route: usize) -> RouteIterator {
        let (head, tail) = (self.route_head(route), self.route_tail(route));
        if self.succ(head) == tail {
            RouteIterator::empty(self)
        } else {
            RouteIterator::new(self, self.succ(head), self.pred(tail))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::vrptw::tests::create_random_instance;
    use crate::utils::create_seeded_rng;

    use super::*;

    fn customers_of(sol: &Solution, route: usize) -> Vec<usize> {
        sol.iter_customers_of_route(route).collect()
    }

    fn route_as_string(sol: &Solution, route: usize) -> String {
        sol.iter_route(route)
            .map(|it| sol.nodes[it].id.to_string())
            .collect::<Vec<String>>()
            .join(",")
    }

    #[test]
    fn swap_tails_keeps_sentinels() {
        let mut rng = create_seeded_rng(11);
        let instance = create_random_instance(&mut rng, 7, 100.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[vec![1, 2, 3], vec![4, 5, 6, 7]], &[], None);

        sol.swap_tails(1, 5);
        assert_eq!(customers_of(&sol, 0), vec![1, 6, 7]);
        assert_eq!(customers_of(&sol, 1), vec![4, 5, 2, 3]);
        assert_eq!(sol.route_of(6), Some(0));
        assert_eq!(sol.route_of(2), Some(1));
        sol.init_route_penalty(0);
        sol.init_route_penalty(1);
        assert!(sol.route_is_consistent(0));
        assert!(sol.route_is_consistent(1));

        // cutting after a head moves whole routes, cutting before a tail moves nothing
        let head = sol.route_head(0);
        sol.swap_tails(head, 3);
        assert_eq!(customers_of(&sol, 0), Vec::<usize>::new());
        assert_eq!(customers_of(&sol, 1), vec![4, 5, 2, 3, 1, 6, 7]);
        sol.init_route_penalty(0);
        sol.init_route_penalty(1);
        assert_eq!(sol.route_len(0), 0);
        assert_eq!(sol.route_len(1), 7);
        assert!(sol.route_is_consistent(0));
        assert!(sol.route_is_consistent(1));
    }

    #[test]
    fn swap_positions_handles_adjacent_nodes() {
        let mut rng = create_seeded_rng(12);
        let instance = create_random_instance(&mut rng, 5, 100.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[vec![1, 2, 3], vec![4, 5]], &[], None);

        sol.swap_positions(1, 2);
        assert_eq!(customers_of(&sol, 0), vec![2, 1, 3]);
        sol.swap_positions(3, 1);
        assert_eq!(customers_of(&sol, 0), vec![2, 3, 1]);
        sol.swap_positions(2, 5);
        assert_eq!(customers_of(&sol, 0), vec![5, 3, 1]);
        assert_eq!(customers_of(&sol, 1), vec![4, 2]);
        assert_eq!(sol.route_of(5), Some(0));
        assert_eq!(sol.route_of(2), Some(1));
    }

    #[test]
    fn remove_and_relink() {
        let mut rng = create_seeded_rng(13);
        let instance = create_random_instance(&mut rng, 4, 100.0);
        let mut sol = Solution::new(&instance);
        sol.set(&[vec![1, 2, 3, 4]], &[], None);

        let (pred, succ) = sol.relink_gap_when_removing_node(2);
        assert_eq!((pred, succ), (1, 3));
        assert!(sol.is_ejected(2));
        let tail = sol.route_tail(0);
        sol.relink_in_front_of(tail, 2);
        sol.init_route_penalty(0);
        assert_eq!(customers_of(&sol, 0), vec![1, 3, 4, 2]);
        assert_eq!(sol.node(2).idx, 4);
        assert_eq!(sol.route_len(0), 4);
        assert_eq!(route_as_string(&sol, 0), "0,1,3,4,2,0");
        assert!(sol.is_head(sol.route_head(0)));
        assert!(sol.is_tail(tail));
        assert!(!sol.is_head(tail));
        assert!(!sol.is_tail(3));
    }
}
