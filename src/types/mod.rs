mod centroids;
mod cluster_count;
mod error;
mod image;

pub use centroids::*;
pub use cluster_count::*;
pub use error::*;
pub use image::*;
