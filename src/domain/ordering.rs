//! Deterministic orderings over associations and branches
//!
//! Primary key is the stable structural identifier supplied by the model.
//! Elements without one sort after identified ones and fall back to a
//! SHA-256 fingerprint of their structure, then to their arena id.

use std::cmp::Ordering;

use sha2::{Digest, Sha256};

use crate::domain::model::{AssociationInfo, FeatureInfo};
use crate::domain::tree::{TreeFeatureBranch, TypedBranch};

/// Hex digest of the parts of an association that do not depend on
/// incidental store layout.
pub fn structural_fingerprint(association: &AssociationInfo) -> String {
    let mut hasher = Sha256::new();
    hasher.update(association.name.as_deref().unwrap_or_default());
    for end in &association.member_ends {
        hasher.update([0u8]);
        hasher.update(end.name.as_deref().unwrap_or_default());
        hasher.update([0u8]);
        hasher.update(end.declared_type_key.as_deref().unwrap_or_default());
        hasher.update(format!(
            "|{:?}|{:?}|{}|{}",
            end.kind,
            end.aggregation,
            end.multiplicity(),
            end.navigable
        ));
    }
    hex::encode(hasher.finalize())
}

/// Present values sort before absent ones.
fn compare_optional<T, F>(a: Option<&T>, b: Option<&T>, cmp: F) -> Ordering
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_ids(a: Option<&str>, b: Option<&str>) -> Ordering {
    compare_optional(a, b, str::cmp)
}

/// Total order on associations.
pub fn compare_associations(a: &AssociationInfo, b: &AssociationInfo) -> Ordering {
    compare_ids(a.stable_id.as_deref(), b.stable_id.as_deref())
        .then_with(|| {
            if a.stable_id.is_some() && b.stable_id.is_some() {
                Ordering::Equal
            } else {
                structural_fingerprint(a).cmp(&structural_fingerprint(b))
            }
        })
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_associations(associations: &mut [AssociationInfo]) {
    associations.sort_by(compare_associations);
}

/// Total order on features: stable id, then name, then id.
pub fn compare_features(a: &FeatureInfo, b: &FeatureInfo) -> Ordering {
    compare_ids(a.stable_id.as_deref(), b.stable_id.as_deref())
        .then_with(|| compare_ids(a.effective_name(), b.effective_name()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Typed branches by name, then kind, then association, then feature.
pub fn compare_typed_branches(x: &TypedBranch, y: &TypedBranch) -> Ordering {
    x.name()
        .cmp(y.name())
        .then_with(|| x.kind().cmp(&y.kind()))
        .then_with(|| compare_optional(x.association(), y.association(), compare_associations))
        .then_with(|| compare_features(x.feature(), y.feature()))
}

/// Total order over heterogeneous branches.
///
/// Typed branches come first, by name, then kind, then feature. Ill-formed
/// branches follow, by association, then feature.
pub fn compare_branches(a: &TreeFeatureBranch, b: &TreeFeatureBranch) -> Ordering {
    match (a, b) {
        (TreeFeatureBranch::Typed(x), TreeFeatureBranch::Typed(y)) => compare_typed_branches(x, y),
        (TreeFeatureBranch::Typed(_), TreeFeatureBranch::IllFormed(_)) => Ordering::Less,
        (TreeFeatureBranch::IllFormed(_), TreeFeatureBranch::Typed(_)) => Ordering::Greater,
        (TreeFeatureBranch::IllFormed(x), TreeFeatureBranch::IllFormed(y)) => {
            compare_optional(x.association(), y.association(), compare_associations)
                .then_with(|| compare_optional(x.feature(), y.feature(), compare_features))
                .then_with(|| x.explanations().cmp(y.explanations()))
        }
    }
}
