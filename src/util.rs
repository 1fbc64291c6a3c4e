//! Shared numeric utilities used by every classifier.

pub mod kahan;
pub mod linalg;

pub use kahan::KahanSum;
