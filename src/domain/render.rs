//! Tree display via `termtree`

use termtree::Tree;
use tracing::instrument;

use crate::domain::ordering::compare_branches;
use crate::domain::tree::{IllFormedBranch, TreeFeatureBranch, TreeType, TypedBranch};

/// Branch order used when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchOrder {
    /// Associations first, then attributes, as analyzed
    #[default]
    Discovery,
    /// Total order from `ordering::compare_branches`
    Sorted,
}

pub trait TreeRender {
    fn to_tree_string(&self, order: BranchOrder) -> Tree<String>;
}

impl TreeRender for TreeType {
    #[instrument(level = "trace", skip_all)]
    fn to_tree_string(&self, order: BranchOrder) -> Tree<String> {
        match self {
            TreeType::WellFormed(tree) => {
                let mut branches: Vec<&TreeFeatureBranch> = tree.branches().iter().collect();
                if order == BranchOrder::Sorted {
                    branches.sort_by(|a, b| compare_branches(a, b));
                }
                let leaves = branches.into_iter().map(|branch| match branch {
                    TreeFeatureBranch::Typed(typed) => typed_leaf(typed, order),
                    TreeFeatureBranch::IllFormed(ill) => Tree::new(ill_formed_label(ill)),
                });
                Tree::new(tree.tree_type().display_name()).with_leaves(leaves)
            }
            TreeType::IllFormed(tree) => {
                let codes: Vec<String> = tree.explanations().iter().map(|e| e.to_string()).collect();
                let label = format!("{} [ill-formed: {}]", tree.tree_type().display_name(), codes.join(", "));
                let conflicts = tree.name_conflicts().iter().map(|(name, branches)| {
                    Tree::new(format!("conflict '{name}'"))
                        .with_leaves(branches.iter().map(|typed| typed_leaf(typed, order)))
                });
                Tree::new(label).with_leaves(conflicts)
            }
        }
    }
}

fn typed_leaf(typed: &TypedBranch, order: BranchOrder) -> Tree<String> {
    let child = typed.child().to_tree_string(order);
    let label = format!(
        "{} ({:?}) : {}",
        typed.name(),
        typed.kind(),
        child.root
    );
    Tree::new(label).with_leaves(child.leaves)
}

fn ill_formed_label(ill: &IllFormedBranch) -> String {
    let codes: Vec<String> = ill.explanations().iter().map(|e| e.to_string()).collect();
    format!("✗ {} [{}]", ill.label(), codes.join(", "))
}
