use fixedbitset::FixedBitSet;

use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
use crate::solution::{Solution, SolutionDescription};
use crate::utils::EPS5;

#[derive(Debug)]
pub enum Violation {
    UnknownCustomer(usize),
    VisitedTwice(usize),
    NotServed(usize),
    Demand(Num),
    TimeWindow(usize, Num),
}

#[derive(Debug)]
pub enum ValidatorResult {
    /// number of routes and total distance
    Valid(usize, Num),
    ConstraintViolation(Violation),
    ObjectiveMismatch(Num),
}

impl ValidatorResult {
    pub fn assert_valid(&self) {
        match self {
            Self::Valid(..) => {}
            Self::ConstraintViolation(violation) => {
                panic!("{:?}", violation)
            }
            Self::ObjectiveMismatch(num) => {
                panic!("ObjectiveMismatch({})", num)
            }
        }
    }
}

/// Drives the route from the depot through `customers` and back. Returns the travelled distance,
/// or the first violated constraint.
pub fn validate_route(instance: &VRPTWInstance, customers: &[usize]) -> Result<Num, Violation> {
    use Violation::*;

    let mut load = 0.0;
    let mut distance = 0.0;
    let mut prev = instance.depot();
    let mut start = prev.ready;

    for &c in customers.iter().chain(std::iter::once(&0)) {
        if c > instance.num_customers {
            return Err(UnknownCustomer(c));
        }
        let node = instance.customer(c);
        load += node.demand;
        if load > instance.vehicle_capacity + EPS5 {
            return Err(Demand(load - instance.vehicle_capacity));
        }

        distance += instance.distance(prev.id, c);
        let arrival = start + prev.servicetime + instance.time(prev.id, c);
        if arrival > node.due + EPS5 {
            return Err(TimeWindow(c, arrival - node.due));
        }
        start = arrival.max(node.ready);
        prev = node;
    }
    Ok(distance)
}

/// Checks every route independently of the solver's aggregates and that each customer is
/// served exactly once. Unrouted customers are reported as violations.
pub fn validate_solution_description(
    instance: &VRPTWInstance,
    desc: &SolutionDescription,
    objective: Option<Num>,
) -> ValidatorResult {
    use ValidatorResult::*;
    use Violation::*;

    let mut visited = FixedBitSet::with_capacity(instance.num_customers + 1);
    let mut total_distance = 0.0;
    for route in desc.routes() {
        for &c in route {
            if c == 0 || c > instance.num_customers {
                return ConstraintViolation(UnknownCustomer(c));
            }
            if visited.put(c) {
                return ConstraintViolation(VisitedTwice(c));
            }
        }
        match validate_route(instance, route) {
            Ok(distance) => total_distance += distance,
            Err(violation) => return ConstraintViolation(violation),
        }
    }
    if let Some(c) = (1..=instance.num_customers).find(|&c| !visited.contains(c)) {
        return ConstraintViolation(NotServed(c));
    }

    match objective {
        Some(expected) if (expected - total_distance).abs() > EPS5 => {
            ObjectiveMismatch(total_distance)
        }
        _ => Valid(desc.number_of_routes(), total_distance),
    }
}

pub fn assert_valid_solution_description(instance: &VRPTWInstance, desc: &SolutionDescription) {
    validate_solution_description(instance, desc, Some(desc.total_distance(instance)))
        .assert_valid();
}

pub fn assert_valid_solution(instance: &VRPTWInstance, solution: &Solution) {
    assert!(solution.accounts_for_all_customers(), "customer accounting is broken");
    validate_solution_description(
        instance,
        &solution.to_description(),
        Some(solution.total_distance()),
    )
    .assert_valid();
}

#[cfg(test)]
mod tests {
    use crate::io::solomon_reader::read_instance;
    use crate::io::solomon_reader::tests::SMALL_INSTANCE;

    use super::*;

    #[test]
    fn detects_every_kind_of_violation() -> anyhow::Result<()> {
        let instance = read_instance(SMALL_INSTANCE.as_bytes())?;
        let desc = |routes: Vec<Vec<usize>>| SolutionDescription {
            routes,
            ejection_pool: vec![],
            w: None,
        };

        let singles = desc(vec![vec![1], vec![2], vec![3]]);
        let valid = validate_solution_description(&instance, &singles, None);
        assert!(matches!(valid, ValidatorResult::Valid(3, _)));

        let twice =
            validate_solution_description(&instance, &desc(vec![vec![1, 2], vec![2, 3]]), None);
        assert!(matches!(twice, ValidatorResult::ConstraintViolation(Violation::VisitedTwice(2))));

        let missing = validate_solution_description(&instance, &desc(vec![vec![1, 2]]), None);
        assert!(matches!(missing, ValidatorResult::ConstraintViolation(Violation::NotServed(3))));

        let unknown = validate_solution_description(&instance, &desc(vec![vec![1, 2, 3, 9]]), None);
        assert!(matches!(
            unknown,
            ValidatorResult::ConstraintViolation(Violation::UnknownCustomer(9))
        ));

        let mismatch = validate_solution_description(&instance, &singles, Some(-1.0));
        assert!(matches!(mismatch, ValidatorResult::ObjectiveMismatch(_)));
        Ok(())
    }

    #[test]
    fn capacity_and_lateness_are_checked_per_route() -> anyhow::Result<()> {
        let instance = read_instance(SMALL_INSTANCE.as_bytes())?;
        let all = (1..=instance.num_customers).collect::<Vec<_>>();
        let demand = all.iter().map(|&c| instance.customer(c).demand).sum::<Num>();
        let result = validate_route(&instance, &all);
        if demand > instance.vehicle_capacity {
            assert!(matches!(result, Err(Violation::Demand(_))));
        }
        for c in all {
            assert!(
                validate_route(&instance, &[c]).is_ok(),
                "customer {} cannot be served alone",
                c
            );
        }
        Ok(())
    }
}
