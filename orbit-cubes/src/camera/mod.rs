mod orbit;
mod projection;

pub use orbit::OrbitCamera;
pub use projection::{fixed_view, Projection};
