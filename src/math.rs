/// 2D point type (parametric UV space).
pub type Point2 = nalgebra::Point2<f64>;
