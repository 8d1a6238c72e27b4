//! Builder for arena-backed structural models.

use tracing::instrument;

use crate::domain::arena::{AssociationNode, FeatureNode, FeatureOwner, ModelArena, TypeNode};
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::model::{AggregationKind, AssociationId, FeatureId, FeatureKind, TypeId, TypeKind, UpperBound};

/// Description of an attribute, port or association end.
///
/// Defaults to a named, typed, navigable, composite `1..1` property, i.e. a
/// feature that passes every tree check.
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    name: Option<String>,
    kind: FeatureKind,
    declared_type: Option<TypeId>,
    lower: u32,
    upper: UpperBound,
    aggregation: AggregationKind,
    navigable: bool,
    stable_id: Option<String>,
}

impl FeatureSpec {
    /// Unnamed, untyped property; otherwise as the defaults above.
    pub fn untyped() -> Self {
        Self {
            name: None,
            kind: FeatureKind::Property,
            declared_type: None,
            lower: 1,
            upper: UpperBound::Limited(1),
            aggregation: AggregationKind::Composite,
            navigable: true,
            stable_id: None,
        }
    }

    pub fn property(name: &str, declared_type: TypeId) -> Self {
        Self::untyped()
            .with_name(Some(name))
            .with_type(Some(declared_type))
    }

    pub fn port(name: &str, declared_type: TypeId) -> Self {
        Self {
            kind: FeatureKind::Port,
            ..Self::property(name, declared_type)
        }
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_string);
        self
    }

    pub fn with_type(mut self, declared_type: Option<TypeId>) -> Self {
        self.declared_type = declared_type;
        self
    }

    pub fn with_kind(mut self, kind: FeatureKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn multiplicity(mut self, lower: u32, upper: UpperBound) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn aggregation(mut self, aggregation: AggregationKind) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn navigable(mut self, navigable: bool) -> Self {
        self.navigable = navigable;
        self
    }

    pub fn stable_id(mut self, stable_id: &str) -> Self {
        self.stable_id = Some(stable_id.to_string());
        self
    }

    fn into_node(self, owner: FeatureOwner, association: Option<AssociationId>) -> FeatureNode {
        FeatureNode {
            name: self.name,
            kind: self.kind,
            declared_type: self.declared_type,
            lower: self.lower,
            upper: self.upper,
            aggregation: self.aggregation,
            owner,
            association,
            navigable: self.navigable,
            stable_id: self.stable_id,
            redefines: Vec::new(),
        }
    }
}

/// Member end of an association under construction.
#[derive(Debug, Clone)]
pub struct EndSpec {
    feature: FeatureSpec,
    /// Owning type; `None` means the association owns the end.
    owned_by: Option<TypeId>,
}

impl EndSpec {
    pub fn association_owned(feature: FeatureSpec) -> Self {
        Self {
            feature,
            owned_by: None,
        }
    }

    pub fn type_owned(feature: FeatureSpec, owner: TypeId) -> Self {
        Self {
            feature,
            owned_by: Some(owner),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssociationSpec {
    name: Option<String>,
    stable_id: Option<String>,
    ends: Vec<EndSpec>,
    is_derived: bool,
    owner: Option<TypeId>,
}

impl AssociationSpec {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            ..Self::default()
        }
    }

    /// Directed composite association `whole -> part`.
    ///
    /// The `whole` end is an unnamed, non-navigable `0..1` end; `part` is
    /// the navigable end. Both ends are owned by the association.
    pub fn composite(name: &str, whole: TypeId, part: FeatureSpec) -> Self {
        let whole_end = FeatureSpec::untyped()
            .with_type(Some(whole))
            .multiplicity(0, UpperBound::Limited(1))
            .aggregation(AggregationKind::None)
            .navigable(false);
        Self::new(Some(name))
            .end(EndSpec::association_owned(whole_end))
            .end(EndSpec::association_owned(part.navigable(true)))
    }

    pub fn end(mut self, end: EndSpec) -> Self {
        self.ends.push(end);
        self
    }

    pub fn stable_id(mut self, stable_id: &str) -> Self {
        self.stable_id = Some(stable_id.to_string());
        self
    }

    pub fn derived(mut self, is_derived: bool) -> Self {
        self.is_derived = is_derived;
        self
    }

    pub fn owned_by(mut self, owner: TypeId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Constructs a `ModelArena` element by element.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: ModelArena,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, name: Option<&str>, kind: TypeKind, stable_id: Option<&str>) -> TypeId {
        TypeId(self.model.types.insert(TypeNode {
            name: name.map(str::to_string),
            kind,
            stable_id: stable_id.map(str::to_string),
            generals: Vec::new(),
            owned_features: Vec::new(),
        }))
    }

    pub fn class(&mut self, name: &str) -> TypeId {
        self.add_type(Some(name), TypeKind::Class, None)
    }

    pub fn data_type(&mut self, name: &str) -> TypeId {
        self.add_type(Some(name), TypeKind::DataType, None)
    }

    /// Declare `general` as a direct supertype of `specific`.
    #[instrument(level = "trace", skip(self))]
    pub fn generalize(&mut self, specific: TypeId, general: TypeId) -> ModelResult<()> {
        self.model.type_node(general)?;
        let node = self
            .model
            .types
            .get_mut(specific.0)
            .ok_or(ModelError::UnknownType(specific))?;
        if !node.generals.contains(&general) {
            node.generals.push(general);
        }
        Ok(())
    }

    /// Add an attribute or port owned by `owner`.
    #[instrument(level = "trace", skip(self, feature))]
    pub fn add_feature(&mut self, owner: TypeId, feature: FeatureSpec) -> ModelResult<FeatureId> {
        self.check_type_ref(feature.declared_type)?;
        self.model.type_node(owner)?;
        let id = FeatureId(self.model.features.insert(feature.into_node(FeatureOwner::Type(owner), None)));
        self.owned_features_mut(owner)?.push(id);
        Ok(id)
    }

    /// Record that `feature` redefines `redefined`.
    pub fn redefine_feature(&mut self, feature: FeatureId, redefined: FeatureId) -> ModelResult<()> {
        self.model.feature_node(redefined)?;
        let node = self
            .model
            .features
            .get_mut(feature.0)
            .ok_or(ModelError::UnknownFeature(feature))?;
        node.redefines.push(redefined);
        Ok(())
    }

    /// Record that `association` redefines `redefined`.
    pub fn redefine_association(&mut self, association: AssociationId, redefined: AssociationId) -> ModelResult<()> {
        self.model.association_node(redefined)?;
        let node = self
            .model
            .associations
            .get_mut(association.0)
            .ok_or(ModelError::UnknownAssociation(association))?;
        node.redefines.push(redefined);
        Ok(())
    }

    /// Add an association together with its member ends.
    ///
    /// Type-owned ends are also listed among their owner's features.
    #[instrument(level = "trace", skip(self, spec))]
    pub fn add_association(&mut self, spec: AssociationSpec) -> ModelResult<AssociationId> {
        if let Some(owner) = spec.owner {
            self.model.type_node(owner)?;
        }
        for end in &spec.ends {
            self.check_type_ref(end.feature.declared_type)?;
            if let Some(owner) = end.owned_by {
                self.model.type_node(owner)?;
            }
        }

        let id = AssociationId(self.model.associations.insert(AssociationNode {
            name: spec.name,
            stable_id: spec.stable_id,
            member_ends: Vec::new(),
            is_derived: spec.is_derived,
            owner: spec.owner,
            redefines: Vec::new(),
        }));

        let mut member_ends = Vec::with_capacity(spec.ends.len());
        for end in spec.ends {
            let owner = match end.owned_by {
                Some(ty) => FeatureOwner::Type(ty),
                None => FeatureOwner::Association(id),
            };
            let feature = FeatureId(self.model.features.insert(end.feature.into_node(owner, Some(id))));
            if let Some(ty) = end.owned_by {
                self.owned_features_mut(ty)?.push(feature);
            }
            member_ends.push(feature);
        }

        let node = self
            .model
            .associations
            .get_mut(id.0)
            .ok_or(ModelError::UnknownAssociation(id))?;
        node.member_ends = member_ends;
        Ok(id)
    }

    pub fn build(self) -> ModelArena {
        self.model
    }

    fn check_type_ref(&self, ty: Option<TypeId>) -> ModelResult<()> {
        match ty {
            Some(ty) => self.model.type_node(ty).map(|_| ()),
            None => Ok(()),
        }
    }

    fn owned_features_mut(&mut self, owner: TypeId) -> ModelResult<&mut Vec<FeatureId>> {
        self.model
            .types
            .get_mut(owner.0)
            .map(|node| &mut node.owned_features)
            .ok_or(ModelError::UnknownType(owner))
    }
}
