// src/graph/mod.rs
//! Reference graph: extraction, resolution, cycles and export.

pub mod builder;
pub mod cycles;
pub mod dot;
pub mod imports;
pub mod resolver;

pub use builder::DependencyGraph;
pub use cycles::find_cycles;
pub use resolver::{normalize_path, resolve, Resolution, UnitIndex};
