//! Path from the analysis root to the current node, used for cycle detection

use std::sync::Arc;

use crate::domain::error::ModelResult;
use crate::domain::model::{ModelQuery, TypeInfo};

/// Immutable sequence of the types visited so far.
///
/// Extending a path produces a new one; the original is untouched, so
/// sibling branches never observe each other's descent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreePath {
    types: Arc<[TypeInfo]>,
}

impl TreePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extended(&self, ty: &TypeInfo) -> Self {
        let mut types = self.types.to_vec();
        types.push(ty.clone());
        Self {
            types: types.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter()
    }

    /// Cycle rule: `target` may extend `path + context` only if it is
    /// unrelated by conformance, in either direction, to every type on it.
    ///
    /// A subtype or supertype of an ancestor is rejected as well as an exact
    /// repeat, since substitution could close the cycle at runtime.
    pub fn is_acyclic_with<M>(&self, model: &M, context: &TypeInfo, target: &TypeInfo) -> ModelResult<bool>
    where
        M: ModelQuery + ?Sized,
    {
        for ancestor in self.iter().chain(std::iter::once(context)) {
            if model.related(ancestor.id, target.id)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
