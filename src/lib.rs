pub mod config;
pub mod error;
pub mod export;
pub mod packing;
pub mod presort;
pub mod remnant;
pub mod render;
pub mod solver;
pub mod types;

pub use error::{Error, Result};
pub use solver::{Solver, plan_cutting};
