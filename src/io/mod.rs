pub mod environment;
pub mod screenshot;
