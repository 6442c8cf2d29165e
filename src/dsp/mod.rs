pub mod common;
pub mod dynamics;

pub use dynamics::{DynamicsParams, DynamicsProcessor};
