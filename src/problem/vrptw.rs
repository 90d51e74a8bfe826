use std::fmt::{Debug, Formatter};

use anyhow::{ensure, Result};
use log::warn;

use crate::problem::neighbours::NeighbourIndex;
use crate::problem::travel_matrix::{FixSizedTravelMatrix, TravelMatrix};
use crate::problem::Num;

#[derive(Clone, Debug)]
pub struct Customer {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub demand: Num,
    pub ready: Num,
    pub due: Num,
    pub servicetime: Num,
}

impl Customer {
    /// Clamps an arrival time into the time window.
    #[inline(always)]
    pub fn clamp(&self, t: Num) -> Num {
        t.max(self.ready).min(self.due)
    }
}

pub struct VRPTWInstance {
    pub name: String,
    pub num_customers: usize,
    pub num_vehicles: usize,
    pub vehicle_capacity: Num,
    /// depot at index 0, customer `i` at index `i`
    pub customers: Vec<Customer>,
    pub(crate) travel_matrix: FixSizedTravelMatrix,
    pub(crate) neighbours: NeighbourIndex,
}

impl Debug for VRPTWInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "VRPTW instance {}:", self.name)
            .and(writeln!(
                f,
                "{} vehicles with capacity {}",
                self.num_vehicles, self.vehicle_capacity
            ))
            .and(write!(
                f,
                "{} customers: {:?}",
                self.num_customers,
                &self.customers[1..]
            ))
    }
}

impl VRPTWInstance {
    #[inline(always)]
    pub fn distance(&self, from: usize, to: usize) -> Num {
        self.travel_matrix.distance(from, to)
    }
    #[inline(always)]
    pub fn time(&self, from: usize, to: usize) -> Num {
        self.travel_matrix.time(from, to)
    }
    #[inline(always)]
    pub fn customer(&self, id: usize) -> &Customer {
        &self.customers[id]
    }
    pub fn depot(&self) -> &Customer {
        &self.customers[0]
    }
    pub fn iter_customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter().skip(1)
    }
    pub fn neighbours(&self) -> &NeighbourIndex {
        &self.neighbours
    }
    pub fn total_demand(&self) -> Num {
        self.iter_customers().map(|c| c.demand).sum()
    }
    /// Number of vehicles needed to carry the total demand.
    pub fn routes_lower_bound(&self) -> usize {
        if self.num_customers == 0 {
            return 0;
        }
        ((self.total_demand() / self.vehicle_capacity).ceil() as usize).max(1)
    }
}

pub fn create_instance_with(
    name: String,
    num_vehicles: usize,
    vehicle_capacity: Num,
    customers: Vec<Customer>,
) -> Result<VRPTWInstance> {
    ensure!(!customers.is_empty(), "instance {} has no depot", name);
    ensure!(
        vehicle_capacity > 0.0,
        "instance {}: vehicle capacity must be positive (got {})",
        name,
        vehicle_capacity
    );
    for (idx, customer) in customers.iter().enumerate() {
        ensure!(
            customer.id == idx,
            "instance {}: expected customer id {} at position {}, found {}",
            name,
            idx,
            idx,
            customer.id
        );
        ensure!(
            customer.demand >= 0.0,
            "instance {}: customer {} has negative demand",
            name,
            customer.id
        );
        ensure!(
            customer.ready <= customer.due,
            "instance {}: customer {} has an empty time window [{}, {}]",
            name,
            customer.id,
            customer.ready,
            customer.due
        );
        if customer.demand > vehicle_capacity {
            warn!(
                "customer {} demands more than the vehicle capacity ({} > {})",
                customer.id, customer.demand, vehicle_capacity
            );
        }
    }

    let num_customers = customers.len() - 1;
    let travel_matrix = FixSizedTravelMatrix::with_euclidean_distances(
        &customers.iter().map(|it| (it.x, it.y)).collect::<Vec<_>>(),
    );
    let neighbours = NeighbourIndex::with_travel_matrix(&travel_matrix, num_customers);

    Ok(VRPTWInstance {
        name,
        num_customers,
        num_vehicles,
        vehicle_capacity,
        customers,
        travel_matrix,
        neighbours,
    })
}
