//! Tree representation, inference and persistence.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CodelangError, Result};
use crate::tokens::Frequencies;

/// A node of an identification tree.
///
/// Children are owned by their parent, so a tree is always finite and acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub enum TreeNode {
    Leaf {
        language: String,
        /// Fraction of the language's training samples that reach this leaf.
        confidence: Option<f64>,
    },
    Branch {
        token: String,
        threshold: f64,
        false_branch: Box<TreeNode>,
        true_branch: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn leaf(language: impl Into<String>, confidence: Option<f64>) -> Self {
        TreeNode::Leaf {
            language: language.into(),
            confidence,
        }
    }

    pub fn branch(
        token: impl Into<String>,
        threshold: f64,
        false_branch: TreeNode,
        true_branch: TreeNode,
    ) -> Self {
        TreeNode::Branch {
            token: token.into(),
            threshold,
            false_branch: Box::new(false_branch),
            true_branch: Box::new(true_branch),
        }
    }
}

/// Result of classifying a sample with an identification tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification<'a> {
    pub language: &'a str,
    pub confidence: Option<f64>,
}

/// A trained identification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTree {
    root: TreeNode,
}

impl IdTree {
    pub fn new(root: TreeNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Classify a sample, returning the leaf's language.
    pub fn classify(&self, freqs: &Frequencies) -> &str {
        self.classify_with_confidence(freqs).language
    }

    /// Classify a sample, returning the leaf's language and confidence.
    pub fn classify_with_confidence(&self, freqs: &Frequencies) -> Classification<'_> {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf {
                    language,
                    confidence,
                } => {
                    return Classification {
                        language,
                        confidence: *confidence,
                    };
                }
                TreeNode::Branch {
                    token,
                    threshold,
                    false_branch,
                    true_branch,
                } => {
                    node = if freqs.get(token) > *threshold {
                        true_branch
                    } else {
                        false_branch
                    };
                }
            }
        }
    }

    /// Languages that appear in at least one leaf, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut languages = BTreeSet::new();
        self.walk(|node| {
            if let TreeNode::Leaf { language, .. } = node {
                languages.insert(language.clone());
            }
        });
        languages.into_iter().collect()
    }

    /// Number of internal (branch) nodes.
    pub fn branch_count(&self) -> usize {
        let mut count = 0;
        self.walk(|node| {
            if matches!(node, TreeNode::Branch { .. }) {
                count += 1;
            }
        });
        count
    }

    fn walk<F: FnMut(&TreeNode)>(&self, mut visit: F) {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            visit(node);
            if let TreeNode::Branch {
                false_branch,
                true_branch,
                ..
            } = node
            {
                stack.push(true_branch);
                stack.push(false_branch);
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a tree encoded with [`IdTree::encode`].
    ///
    /// Nesting depth is not limited, since trees trained on large corpora can be
    /// much deeper than serde_json's default recursion limit.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_slice(data);
        deserializer.disable_recursion_limit();
        let tree = IdTree::deserialize(&mut deserializer)
            .and_then(|tree| deserializer.end().map(|_| tree))
            .map_err(|e| CodelangError::decode(format!("identification tree: {e}")))?;
        Ok(tree)
    }
}

/// Persisted form of a [`TreeNode`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NodeRecord {
    leaf: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaf_classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaf_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    false_branch: Option<Box<NodeRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    true_branch: Option<Box<NodeRecord>>,
}

impl From<TreeNode> for NodeRecord {
    fn from(node: TreeNode) -> Self {
        match node {
            TreeNode::Leaf {
                language,
                confidence,
            } => NodeRecord {
                leaf: true,
                leaf_classification: Some(language),
                leaf_confidence: confidence,
                ..Default::default()
            },
            TreeNode::Branch {
                token,
                threshold,
                false_branch,
                true_branch,
            } => NodeRecord {
                leaf: false,
                keyword: Some(token),
                threshold: Some(threshold),
                false_branch: Some(Box::new((*false_branch).into())),
                true_branch: Some(Box::new((*true_branch).into())),
                ..Default::default()
            },
        }
    }
}

impl TryFrom<NodeRecord> for TreeNode {
    type Error = String;

    fn try_from(record: NodeRecord) -> std::result::Result<Self, Self::Error> {
        if record.leaf {
            let language = record
                .leaf_classification
                .ok_or("leaf node without leafClassification")?;
            if let Some(confidence) = record.leaf_confidence {
                if !(0.0..=1.0).contains(&confidence) {
                    return Err(format!("leaf confidence {confidence} outside [0, 1]"));
                }
            }
            return Ok(TreeNode::leaf(language, record.leaf_confidence));
        }

        let token = record.keyword.ok_or("branch node without keyword")?;
        let threshold = record.threshold.ok_or("branch node without threshold")?;
        let false_branch = record.false_branch.ok_or("branch node without falseBranch")?;
        let true_branch = record.true_branch.ok_or("branch node without trueBranch")?;
        Ok(TreeNode::branch(
            token,
            threshold,
            TreeNode::try_from(*false_branch)?,
            TreeNode::try_from(*true_branch)?,
        ))
    }
}
