//! Kernel support vector machine classifier.
//!
//! One binary (language vs. rest) machine is trained per language, all sharing a
//! single pool of support vectors. A sample is assigned to the language whose
//! machine reports the largest margin.

mod classifier;
mod kernel;
mod solver;
mod train;

pub use classifier::{BinaryClassifier, Svm};
pub use kernel::{Kernel, KernelCache, KernelType};
pub use solver::{Solution, solve};
pub use train::train;
