pub mod kmeans;
mod partition;
