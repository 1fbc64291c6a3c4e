//! K-nearest-neighbors classifier.
//!
//! Samples and queries are compared by cosine similarity: both are projected onto
//! the training vocabulary and scaled to unit length, so a dot product is all a
//! comparison costs. The neighbor count is picked on held-out samples.

mod classifier;
mod train;

pub use classifier::{Knn, KnnSample};
pub use train::train;
