//! Identification tree (ID3) classifier.
//!
//! A binary decision tree whose internal nodes compare the frequency of a single
//! token against a threshold. Trees are grown greedily by choosing, at every node,
//! the split that minimizes the weighted entropy of the language distribution.

mod node;
mod train;

pub use node::{Classification, IdTree, TreeNode};
pub use train::train;
