use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;

/// Owned snapshot of a solution: customer ids of every route (without depots)
/// in route order, the ejection pool in insertion order and the customer under repair.
#[derive(Clone, Debug, PartialEq)]
pub struct SolutionDescription {
    pub(crate) routes: Vec<Vec<usize>>,
    pub(crate) ejection_pool: Vec<usize>,
    pub(crate) w: Option<usize>,
}

impl SolutionDescription {
    pub fn routes(&self) -> &Vec<Vec<usize>> {
        &self.routes
    }

    pub fn number_of_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn number_of_unrouted_customers(&self) -> usize {
        self.ejection_pool.len() + self.w.map_or(0, |_| 1)
    }

    pub fn total_distance(&self, instance: &VRPTWInstance) -> Num {
        self.routes
            .iter()
            .map(|route| {
                let mut prev = 0;
                let mut distance = 0.0;
                for &c in route.iter().chain(std::iter::once(&0)) {
                    distance += instance.distance(prev, c);
                    prev = c;
                }
                distance
            })
            .sum()
    }
}
