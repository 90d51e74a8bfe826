pub mod neighbours;
pub mod travel_matrix;
pub mod vrptw;

pub type Num = f64;
