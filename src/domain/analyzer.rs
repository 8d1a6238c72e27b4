//! Recursive tree analysis

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::error::TreeResult;
use crate::domain::explanation::Explanation;
use crate::domain::model::{FeatureInfo, ModelQuery, TypeId, TypeInfo};
use crate::domain::ordering::{compare_typed_branches, sort_associations};
use crate::domain::path::TreePath;
use crate::domain::policy::ClosedWorldPolicy;
use crate::domain::tree::{IllFormedTree, TreeFeatureBranch, TreeType, TypedBranch, WellFormedTree};

/// Walks a type's composite structure and builds its `TreeType`.
///
/// Holds no state between calls: the same analyzer can serve any number of
/// roots, from several threads if model and policy allow it.
pub struct TreeAnalyzer<'a, M: ?Sized, P: ?Sized> {
    model: &'a M,
    policy: &'a P,
}

impl<'a, M, P> TreeAnalyzer<'a, M, P>
where
    M: ModelQuery + ?Sized,
    P: ClosedWorldPolicy + ?Sized,
{
    pub fn new(model: &'a M, policy: &'a P) -> Self {
        Self { model, policy }
    }

    pub(crate) fn model(&self) -> &'a M {
        self.model
    }

    /// Analyze `root` with an empty path.
    pub fn analyze_root(&self, root: TypeId) -> TreeResult<TreeType> {
        let root = self.model.type_info(root)?;
        self.analyze(&TreePath::new(), &root)
    }

    /// Analyze `ty` reached through `path`.
    #[instrument(level = "debug", skip_all, fields(ty = %ty.display_name(), depth = path.len()))]
    pub fn analyze(&self, path: &TreePath, ty: &TypeInfo) -> TreeResult<TreeType> {
        if !ty.kind.is_tree_feature_type() {
            debug!(kind = ?ty.kind, "not a tree feature type");
            let tree = IllFormedTree::new(
                ty.clone(),
                BTreeSet::from([Explanation::NotCompositeStructureOrDataType]),
                BTreeMap::new(),
            )?;
            return Ok(TreeType::IllFormed(tree));
        }

        // associations first, then attributes; the merged order is kept as is
        let mut branches = self.association_branches(path, ty)?;
        branches.extend(self.attribute_branches(path, ty)?);

        let conflicts = name_conflicts(&branches);
        if !conflicts.is_empty() {
            debug!(names = ?conflicts.keys().collect::<Vec<_>>(), "feature name conflicts");
            let tree = IllFormedTree::new(
                ty.clone(),
                BTreeSet::from([Explanation::FeatureNameConflicts]),
                conflicts,
            )?;
            return Ok(TreeType::IllFormed(tree));
        }

        debug!(branches = branches.len(), "well-formed node");
        Ok(TreeType::WellFormed(WellFormedTree::new(ty.clone(), branches)?))
    }

    fn association_branches(&self, path: &TreePath, context: &TypeInfo) -> TreeResult<Vec<TreeFeatureBranch>> {
        let mut associations = self.model.composite_associations(context.id)?;
        sort_associations(&mut associations);

        let mut branches = Vec::with_capacity(associations.len());
        for association in &associations {
            if let Some(branch) = self.classify_association(path, context, association)? {
                branches.push(branch);
            }
        }
        Ok(branches)
    }

    fn attribute_branches(&self, path: &TreePath, context: &TypeInfo) -> TreeResult<Vec<TreeFeatureBranch>> {
        self.candidate_attributes(context)?
            .iter()
            .map(|feature| self.classify_attribute(path, context, feature))
            .collect()
    }

    /// Composite attributes and ports that are not association ends and that
    /// the policy deems closed-world.
    fn candidate_attributes(&self, context: &TypeInfo) -> TreeResult<Vec<FeatureInfo>> {
        let mut candidates = Vec::new();
        for feature in self.model.attributes(context.id)? {
            if feature.association.is_some() || !feature.is_composite() {
                continue;
            }
            if self.policy.is_closed_world(context, &feature)? {
                candidates.push(feature);
            }
        }
        Ok(candidates)
    }
}

impl<'a, M, P> TreeAnalyzer<'a, M, P>
where
    M: ModelQuery + Sync + ?Sized,
    P: ClosedWorldPolicy + Sync + ?Sized,
{
    /// Analyze several roots in parallel; results follow the input order.
    #[instrument(level = "debug", skip_all, fields(roots = roots.len()))]
    pub fn analyze_roots(&self, roots: &[TypeId]) -> Vec<TreeResult<TreeType>> {
        roots.par_iter().map(|root| self.analyze_root(*root)).collect()
    }
}

/// Typed branches grouped by name, keeping only names used more than once.
pub fn name_conflicts(branches: &[TreeFeatureBranch]) -> BTreeMap<String, Vec<TypedBranch>> {
    branches
        .iter()
        .filter_map(TreeFeatureBranch::as_typed)
        .cloned()
        .into_group_map_by(|typed| typed.name().to_string())
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(name, mut group)| {
            group.sort_by(compare_typed_branches);
            (name, group)
        })
        .collect()
}
