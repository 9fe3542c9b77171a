pub mod cluster_index;

pub use cluster_index::ClusterIndex;
