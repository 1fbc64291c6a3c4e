//! Feed-forward neural network classifier.
//!
//! A single hidden layer of sigmoid units feeds one sigmoid output per language.
//! Training runs per-sample gradient descent for a sweep of step sizes and keeps
//! the network that does best on held-out samples.

mod data_set;
mod gradients;
mod network;
mod train;

pub use data_set::DataSet;
pub use network::Network;
pub use train::train;
