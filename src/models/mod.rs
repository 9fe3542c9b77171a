pub mod core;
pub mod stats;
