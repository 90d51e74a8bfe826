use crate::problem::travel_matrix::TravelMatrix;

/// For every customer id, the other (non-depot) customers ordered by ascending distance.
/// Built once per instance and only read afterwards.
#[derive(Debug)]
pub struct NeighbourIndex {
    neighbours: Vec<Vec<usize>>,
}

impl NeighbourIndex {
    pub fn with_travel_matrix(matrix: &impl TravelMatrix, num_customers: usize) -> Self {
        let neighbours = (0..=num_customers)
            .map(|from| {
                let mut row: Vec<usize> = (1..=num_customers).filter(|&to| to != from).collect();
                row.sort_by(|&a, &b| {
                    matrix
                        .distance(from, a)
                        .total_cmp(&matrix.distance(from, b))
                        .then(a.cmp(&b))
                });
                row
            })
            .collect();
        Self { neighbours }
    }

    pub fn nearest(&self, id: usize) -> &[usize] {
        &self.neighbours[id]
    }

    pub fn nearest_k(&self, id: usize, k: usize) -> &[usize] {
        let row = &self.neighbours[id];
        &row[..k.min(row.len())]
    }
}
