use crate::problem::vrptw::VRPTWInstance;

/// Counts how often each customer could not be reinserted without ejecting others.
/// Ejection sets are ranked by the sum of these counters.
#[derive(Clone, Debug)]
pub struct PenaltyCounter {
    counters: Vec<i64>,
}

impl PenaltyCounter {
    pub fn new(instance: &VRPTWInstance) -> Self {
        Self {
            counters: vec![0; instance.num_customers + 1],
        }
    }

    pub fn clear(&mut self) {
        self.counters.fill(0);
    }

    pub fn increment(&mut self, customer: usize) -> i64 {
        self.counters[customer] += 1;
        self.counters[customer]
    }

    /// indexed by customer id, entry 0 belongs to the depot
    pub fn as_slice(&self) -> &[i64] {
        &self.counters
    }
}
