//! Ready-made circuits.

pub mod inclusion;
pub mod list_root;

pub use inclusion::InclusionCircuit;
pub use list_root::ListRootCircuit;
