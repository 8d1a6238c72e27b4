//! Analysis results: tree nodes, branches and ill-formedness reports
//!
//! All values are built once by the analyzer and never mutated. Constructors
//! enforce the structural invariants; violating one is a defect reported as
//! `TreeError::InvariantViolation`, not an explanation.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::explanation::Explanation;
use crate::domain::model::{AssociationInfo, FeatureInfo, FeatureKind, TypeInfo};

/// Outcome of analyzing one type as a tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TreeType {
    WellFormed(WellFormedTree),
    IllFormed(IllFormedTree),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellFormedTree {
    tree_type: TypeInfo,
    branches: Vec<TreeFeatureBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IllFormedTree {
    tree_type: TypeInfo,
    explanations: BTreeSet<Explanation>,
    name_conflicts: BTreeMap<String, Vec<TypedBranch>>,
}

/// One edge from a tree node to a child.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum TreeFeatureBranch {
    Typed(TypedBranch),
    IllFormed(IllFormedBranch),
}

/// How a typed branch was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    Property,
    Port,
    AssociationProperty,
    AssociationPort,
}

/// A valid edge carrying its recursively analyzed child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedBranch {
    kind: BranchKind,
    name: String,
    feature: FeatureInfo,
    association: Option<AssociationInfo>,
    child: Box<TreeType>,
}

/// A rejected edge with the reasons for rejection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IllFormedBranch {
    feature: Option<FeatureInfo>,
    association: Option<AssociationInfo>,
    explanations: Vec<Explanation>,
}

impl TreeType {
    pub fn tree_type(&self) -> &TypeInfo {
        match self {
            TreeType::WellFormed(t) => &t.tree_type,
            TreeType::IllFormed(t) => &t.tree_type,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        matches!(self, TreeType::WellFormed(_))
    }

    /// Branches of a well-formed node; empty for an ill-formed one.
    pub fn branches(&self) -> &[TreeFeatureBranch] {
        match self {
            TreeType::WellFormed(t) => &t.branches,
            TreeType::IllFormed(_) => &[],
        }
    }

    /// Every ill-formed branch nested anywhere in this tree, paired with the
    /// node that owns it.
    ///
    /// Pre-order: a node's own ill-formed branches come before those of its
    /// children, so pairs are grouped by owning node. Children of branches
    /// listed in a name-conflict report are visited too.
    pub fn ill_formed_branches(&self) -> Vec<(&TreeType, &IllFormedBranch)> {
        let mut pairs = Vec::new();
        self.collect_ill_formed_branches(&mut pairs);
        pairs
    }

    fn collect_ill_formed_branches<'a>(&'a self, pairs: &mut Vec<(&'a TreeType, &'a IllFormedBranch)>) {
        match self {
            TreeType::WellFormed(tree) => {
                for branch in &tree.branches {
                    if let TreeFeatureBranch::IllFormed(ill) = branch {
                        pairs.push((self, ill));
                    }
                }
                for branch in &tree.branches {
                    if let TreeFeatureBranch::Typed(typed) = branch {
                        typed.child().collect_ill_formed_branches(pairs);
                    }
                }
            }
            TreeType::IllFormed(tree) => {
                for typed in tree.name_conflicts.values().flatten() {
                    typed.child().collect_ill_formed_branches(pairs);
                }
            }
        }
    }

    /// Every ill-formed node in this tree, this node included, in pre-order.
    pub fn ill_formed_trees(&self) -> Vec<&IllFormedTree> {
        let mut trees = Vec::new();
        self.collect_ill_formed_trees(&mut trees);
        trees
    }

    fn collect_ill_formed_trees<'a>(&'a self, trees: &mut Vec<&'a IllFormedTree>) {
        match self {
            TreeType::WellFormed(tree) => {
                for typed in tree.typed_branches() {
                    typed.child().collect_ill_formed_trees(trees);
                }
            }
            TreeType::IllFormed(tree) => {
                trees.push(tree);
                for typed in tree.name_conflicts.values().flatten() {
                    typed.child().collect_ill_formed_trees(trees);
                }
            }
        }
    }

    /// True when no node and no branch anywhere below is ill-formed.
    pub fn is_fully_well_formed(&self) -> bool {
        self.ill_formed_trees().is_empty() && self.ill_formed_branches().is_empty()
    }

    /// Number of nodes on the longest root-to-leaf chain of typed branches.
    pub fn depth(&self) -> usize {
        1 + self
            .branches()
            .iter()
            .filter_map(TreeFeatureBranch::as_typed)
            .map(|typed| typed.child().depth())
            .max()
            .unwrap_or(0)
    }
}

impl WellFormedTree {
    /// Fails when two typed branches share a name.
    pub fn new(tree_type: TypeInfo, branches: Vec<TreeFeatureBranch>) -> TreeResult<Self> {
        let mut seen = HashSet::new();
        for typed in branches.iter().filter_map(TreeFeatureBranch::as_typed) {
            if !seen.insert(typed.name()) {
                return Err(TreeError::InvariantViolation(format!(
                    "well-formed tree {} has duplicate branch name '{}'",
                    tree_type.display_name(),
                    typed.name()
                )));
            }
        }
        Ok(Self { tree_type, branches })
    }

    pub fn tree_type(&self) -> &TypeInfo {
        &self.tree_type
    }

    pub fn branches(&self) -> &[TreeFeatureBranch] {
        &self.branches
    }

    pub fn typed_branches(&self) -> impl Iterator<Item = &TypedBranch> {
        self.branches.iter().filter_map(TreeFeatureBranch::as_typed)
    }
}

impl IllFormedTree {
    pub fn new(
        tree_type: TypeInfo,
        explanations: BTreeSet<Explanation>,
        name_conflicts: BTreeMap<String, Vec<TypedBranch>>,
    ) -> TreeResult<Self> {
        if explanations.is_empty() {
            return Err(TreeError::InvariantViolation(format!(
                "ill-formed tree {} carries no explanation",
                tree_type.display_name()
            )));
        }
        Ok(Self {
            tree_type,
            explanations,
            name_conflicts,
        })
    }

    pub fn tree_type(&self) -> &TypeInfo {
        &self.tree_type
    }

    pub fn explanations(&self) -> &BTreeSet<Explanation> {
        &self.explanations
    }

    pub fn name_conflicts(&self) -> &BTreeMap<String, Vec<TypedBranch>> {
        &self.name_conflicts
    }
}

impl TreeFeatureBranch {
    pub fn as_typed(&self) -> Option<&TypedBranch> {
        match self {
            TreeFeatureBranch::Typed(t) => Some(t),
            TreeFeatureBranch::IllFormed(_) => None,
        }
    }

    pub fn as_ill_formed(&self) -> Option<&IllFormedBranch> {
        match self {
            TreeFeatureBranch::Typed(_) => None,
            TreeFeatureBranch::IllFormed(b) => Some(b),
        }
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, TreeFeatureBranch::Typed(_))
    }
}

impl TypedBranch {
    /// Branch for a composite attribute.
    pub fn property(feature: FeatureInfo, child: TreeType) -> TreeResult<Self> {
        Self::build(BranchKind::Property, feature, None, child)
    }

    /// Branch for a composite port.
    pub fn port(feature: FeatureInfo, child: TreeType) -> TreeResult<Self> {
        Self::build(BranchKind::Port, feature, None, child)
    }

    /// Branch for a directed composite association ending in a property.
    pub fn association_property(
        association: AssociationInfo,
        feature: FeatureInfo,
        child: TreeType,
    ) -> TreeResult<Self> {
        Self::build(BranchKind::AssociationProperty, feature, Some(association), child)
    }

    /// Branch for a directed composite association ending in a port.
    pub fn association_port(
        association: AssociationInfo,
        feature: FeatureInfo,
        child: TreeType,
    ) -> TreeResult<Self> {
        Self::build(BranchKind::AssociationPort, feature, Some(association), child)
    }

    fn build(
        kind: BranchKind,
        feature: FeatureInfo,
        association: Option<AssociationInfo>,
        child: TreeType,
    ) -> TreeResult<Self> {
        let expected = match kind {
            BranchKind::Property | BranchKind::AssociationProperty => FeatureKind::Property,
            BranchKind::Port | BranchKind::AssociationPort => FeatureKind::Port,
        };
        if feature.kind != expected {
            return Err(TreeError::InvariantViolation(format!(
                "{kind:?} branch built from {:?} {}",
                feature.kind,
                feature.display_name()
            )));
        }
        if feature.declared_type != Some(child.tree_type().id) {
            return Err(TreeError::InvariantViolation(format!(
                "{kind:?} branch {} is not typed by its child {}",
                feature.display_name(),
                child.tree_type().display_name()
            )));
        }
        let name = branch_name(&feature, association.as_ref()).ok_or_else(|| {
            TreeError::InvariantViolation(format!(
                "{kind:?} branch built from unnamed feature {}",
                feature.id
            ))
        })?;
        Ok(Self {
            kind,
            name,
            feature,
            association,
            child: Box::new(child),
        })
    }

    pub fn kind(&self) -> BranchKind {
        self.kind
    }

    /// Effective branch name; never empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feature(&self) -> &FeatureInfo {
        &self.feature
    }

    pub fn association(&self) -> Option<&AssociationInfo> {
        self.association.as_ref()
    }

    pub fn child(&self) -> &TreeType {
        &self.child
    }
}

/// `association.end` when the end is owned by a named association, else the
/// end's own name.
fn branch_name(feature: &FeatureInfo, association: Option<&AssociationInfo>) -> Option<String> {
    let feature_name = feature.effective_name()?;
    let qualified = association.and_then(|a| {
        let owned_by_association = feature.is_owned_by_association(a.id);
        match (owned_by_association, a.effective_name()) {
            (true, Some(a_name)) => Some(format!("{a_name}.{feature_name}")),
            _ => None,
        }
    });
    Some(qualified.unwrap_or_else(|| feature_name.to_string()))
}

impl IllFormedBranch {
    /// Fails unless a feature or an association is given and at least one
    /// branch-level explanation is present.
    pub fn new(
        feature: Option<FeatureInfo>,
        association: Option<AssociationInfo>,
        explanations: Vec<Explanation>,
    ) -> TreeResult<Self> {
        if feature.is_none() && association.is_none() {
            return Err(TreeError::InvariantViolation(
                "ill-formed branch without feature or association".to_string(),
            ));
        }
        if explanations.is_empty() {
            return Err(TreeError::InvariantViolation(
                "ill-formed branch carries no explanation".to_string(),
            ));
        }
        if let Some(e) = explanations.iter().find(|e| e.is_type_level()) {
            return Err(TreeError::InvariantViolation(format!(
                "type-level explanation {e} on a branch"
            )));
        }
        Ok(Self {
            feature,
            association,
            explanations,
        })
    }

    pub fn feature(&self) -> Option<&FeatureInfo> {
        self.feature.as_ref()
    }

    pub fn association(&self) -> Option<&AssociationInfo> {
        self.association.as_ref()
    }

    pub fn explanations(&self) -> &[Explanation] {
        &self.explanations
    }

    pub fn has(&self, explanation: Explanation) -> bool {
        self.explanations.contains(&explanation)
    }

    /// Best available label: feature name, else association name.
    pub fn label(&self) -> String {
        match (&self.feature, &self.association) {
            (Some(f), _) if f.effective_name().is_some() => f.display_name(),
            (_, Some(a)) => a.display_name(),
            (Some(f), None) => f.display_name(),
            (None, None) => String::from("<unknown>"),
        }
    }
}
