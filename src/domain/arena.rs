use std::collections::{HashSet, VecDeque};

use generational_arena::Arena;
use tracing::instrument;

use crate::domain::error::{ModelError, ModelResult};
use crate::domain::model::{
    AggregationKind, AssociationId, AssociationInfo, FeatureId, FeatureInfo, FeatureKind,
    ModelQuery, TypeId, TypeInfo, TypeKind, UpperBound,
};

/// Stored type with its generalizations and owned elements.
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub name: Option<String>,
    pub kind: TypeKind,
    pub stable_id: Option<String>,
    /// Direct supertypes
    pub generals: Vec<TypeId>,
    /// Attributes and ports owned by this type, in declaration order
    pub owned_features: Vec<FeatureId>,
}

/// Who owns a stored feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureOwner {
    Type(TypeId),
    Association(AssociationId),
}

#[derive(Debug, Clone)]
pub struct FeatureNode {
    pub name: Option<String>,
    pub kind: FeatureKind,
    pub declared_type: Option<TypeId>,
    pub lower: u32,
    pub upper: UpperBound,
    pub aggregation: AggregationKind,
    pub owner: FeatureOwner,
    /// Association this feature is a member end of
    pub association: Option<AssociationId>,
    pub navigable: bool,
    pub stable_id: Option<String>,
    /// Features of supertypes this one redefines
    pub redefines: Vec<FeatureId>,
}

#[derive(Debug, Clone)]
pub struct AssociationNode {
    pub name: Option<String>,
    pub stable_id: Option<String>,
    pub member_ends: Vec<FeatureId>,
    pub is_derived: bool,
    /// Namespace owner, when the association is nested in a type
    pub owner: Option<TypeId>,
    pub redefines: Vec<AssociationId>,
}

/// Arena-backed structural model.
///
/// Uses generational arenas so ids handed out to callers never alias a
/// different element. Built with `ModelBuilder`; read through `ModelQuery`.
#[derive(Debug, Default)]
pub struct ModelArena {
    pub(crate) types: Arena<TypeNode>,
    pub(crate) features: Arena<FeatureNode>,
    pub(crate) associations: Arena<AssociationNode>,
}

impl ModelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    pub(crate) fn type_node(&self, ty: TypeId) -> ModelResult<&TypeNode> {
        self.types.get(ty.0).ok_or(ModelError::UnknownType(ty))
    }

    pub(crate) fn feature_node(&self, feature: FeatureId) -> ModelResult<&FeatureNode> {
        self.features
            .get(feature.0)
            .ok_or(ModelError::UnknownFeature(feature))
    }

    pub(crate) fn association_node(&self, association: AssociationId) -> ModelResult<&AssociationNode> {
        self.associations
            .get(association.0)
            .ok_or(ModelError::UnknownAssociation(association))
    }

    fn feature_info(&self, id: FeatureId) -> ModelResult<FeatureInfo> {
        let node = self.feature_node(id)?;
        let owner = match node.owner {
            FeatureOwner::Type(ty) => Some(ty),
            FeatureOwner::Association(_) => None,
        };
        let declared_type_key = match node.declared_type {
            Some(ty) => {
                let ty = self.type_node(ty)?;
                ty.stable_id.clone().or_else(|| ty.name.clone())
            }
            None => None,
        };
        Ok(FeatureInfo {
            id,
            name: node.name.clone(),
            kind: node.kind,
            declared_type: node.declared_type,
            declared_type_key,
            lower: node.lower,
            upper: node.upper,
            aggregation: node.aggregation,
            owner,
            association: node.association,
            navigable: node.navigable,
            stable_id: node.stable_id.clone(),
        })
    }

    fn association_info(&self, id: AssociationId) -> ModelResult<AssociationInfo> {
        let node = self.association_node(id)?;
        let member_ends = node
            .member_ends
            .iter()
            .map(|end| self.feature_info(*end))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(AssociationInfo {
            id,
            name: node.name.clone(),
            stable_id: node.stable_id.clone(),
            member_ends,
            is_derived: node.is_derived,
        })
    }

    /// `ty` followed by all its supertypes, breadth-first, each once.
    #[instrument(level = "trace", skip(self))]
    pub fn ancestry(&self, ty: TypeId) -> ModelResult<Vec<TypeId>> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([ty]);
        let mut order = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            for general in &self.type_node(current)?.generals {
                if !visited.contains(general) {
                    queue.push_back(*general);
                }
            }
        }
        Ok(order)
    }

    /// Whether `association` is relevant when analyzing `ty`: owned by `ty`
    /// or a supertype, or having an end typed by `ty` or a supertype.
    fn is_reachable_from(&self, ancestry: &[TypeId], node: &AssociationNode) -> ModelResult<bool> {
        if node.owner.is_some_and(|owner| ancestry.contains(&owner)) {
            return Ok(true);
        }
        for end in &node.member_ends {
            if let Some(end_type) = self.feature_node(*end)?.declared_type {
                if ancestry.contains(&end_type) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn is_composite(&self, node: &AssociationNode) -> ModelResult<bool> {
        for end in &node.member_ends {
            if self.feature_node(*end)?.aggregation == AggregationKind::Composite {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl ModelQuery for ModelArena {
    fn type_info(&self, ty: TypeId) -> ModelResult<TypeInfo> {
        let node = self.type_node(ty)?;
        Ok(TypeInfo {
            id: ty,
            name: node.name.clone(),
            kind: node.kind,
            stable_id: node.stable_id.clone(),
        })
    }

    fn conforms_to(&self, specific: TypeId, general: TypeId) -> ModelResult<bool> {
        self.type_node(general)?;
        Ok(self.ancestry(specific)?.contains(&general))
    }

    #[instrument(level = "trace", skip(self))]
    fn composite_associations(&self, ty: TypeId) -> ModelResult<Vec<AssociationInfo>> {
        let ancestry = self.ancestry(ty)?;

        let mut reachable = Vec::new();
        for (index, node) in self.associations.iter() {
            if node.is_derived || !self.is_composite(node)? {
                continue;
            }
            if self.is_reachable_from(&ancestry, node)? {
                reachable.push(AssociationId(index));
            }
        }

        let redefined: HashSet<AssociationId> = reachable
            .iter()
            .map(|id| self.association_node(*id))
            .collect::<ModelResult<Vec<_>>>()?
            .into_iter()
            .flat_map(|node| node.redefines.iter().copied())
            .collect();

        reachable
            .into_iter()
            .filter(|id| !redefined.contains(id))
            .map(|id| self.association_info(id))
            .collect()
    }

    #[instrument(level = "trace", skip(self))]
    fn attributes(&self, ty: TypeId) -> ModelResult<Vec<FeatureInfo>> {
        let ancestry = self.ancestry(ty)?;

        // breadth-first ancestry may list a supertype before the subtype
        // redefining its features, so redefinitions are gathered up front
        let mut redefined = HashSet::new();
        for current in &ancestry {
            for feature in &self.type_node(*current)?.owned_features {
                redefined.extend(self.feature_node(*feature)?.redefines.iter().copied());
            }
        }

        let mut seen = HashSet::new();
        let mut attributes = Vec::new();
        for current in &ancestry {
            for feature in &self.type_node(*current)?.owned_features {
                if redefined.contains(feature) || !seen.insert(*feature) {
                    continue;
                }
                attributes.push(self.feature_info(*feature)?);
            }
        }
        Ok(attributes)
    }

    fn types(&self) -> ModelResult<Vec<TypeInfo>> {
        let mut ids: Vec<TypeId> = self.types.iter().map(|(index, _)| TypeId(index)).collect();
        ids.sort();
        ids.into_iter().map(|id| self.type_info(id)).collect()
    }
}
