use crate::problem::Num;

pub trait TravelMatrix {
    fn distance(&self, from: usize, to: usize) -> Num;
    fn time(&self, from: usize, to: usize) -> Num;
}

/// Dense all-pairs matrix indexed by customer id. Travel time equals distance.
#[derive(Debug)]
pub struct FixSizedTravelMatrix {
    n: usize,
    data: Vec<Num>,
}

impl FixSizedTravelMatrix {
    pub fn with_euclidean_distances(coords: &[(f64, f64)]) -> Self {
        let n = coords.len();
        let mut data = vec![0.0; n * n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (xi, yi) = &coords[i];
                let (xj, yj) = &coords[j];
                data[i * n + j] = ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt();
            }
        }

        Self { n, data }
    }

    #[inline(always)]
    fn idx(&self, from: usize, to: usize) -> usize {
        from * self.n + to
    }
}

impl TravelMatrix for FixSizedTravelMatrix {
    #[inline(always)]
    fn distance(&self, from: usize, to: usize) -> Num {
        self.data[self.idx(from, to)]
    }

    #[inline(always)]
    fn time(&self, from: usize, to: usize) -> Num {
        self.data[self.idx(from, to)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_matrix_is_symmetric_with_zero_diagonal() {
        let matrix =
            FixSizedTravelMatrix::with_euclidean_distances(&[(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)]);
        assert_eq!(matrix.n, 3);
        for i in 0..3 {
            assert_eq!(matrix.distance(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(matrix.distance(i, j), matrix.distance(j, i));
                assert_eq!(matrix.distance(i, j), matrix.time(i, j));
            }
        }
        assert!((matrix.distance(0, 1) - 5.0).abs() < 1e-12);
        assert!((matrix.distance(0, 2) - 10.0).abs() < 1e-12);
    }
}
