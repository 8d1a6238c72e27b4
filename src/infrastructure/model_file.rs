//! TOML model documents
//!
//! ```toml
//! [[types]]
//! name = "Vehicle"
//! generals = ["Thing"]
//!
//! [[types.features]]
//! name = "engine"
//! type = "Engine"
//! upper = "*"
//!
//! [[associations]]
//! name = "Drive"
//! [[associations.ends]]
//! type = "Vehicle"
//! [[associations.ends]]
//! name = "wheel"
//! type = "Wheel"
//! navigable = true
//! aggregation = "composite"
//! ```
//!
//! Elements refer to each other by name. Type features default to a
//! navigable composite `1..1` property; association ends default to a
//! non-navigable, non-aggregating `1..1` property.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::builder::{AssociationSpec, EndSpec, FeatureSpec, ModelBuilder};
use crate::domain::model::{
    AggregationKind, AssociationId, FeatureId, FeatureKind, TypeId, TypeKind, UpperBound,
};
use crate::domain::{ModelArena, ModelError};

#[derive(Error, Debug)]
pub enum ModelFileError {
    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate type name '{0}'")]
    DuplicateType(String),

    #[error("unknown type '{name}' referenced by {context}")]
    UnknownType { name: String, context: String },

    #[error("unknown feature '{0}' (expected Type::feature)")]
    UnknownFeature(String),

    #[error("unknown association '{0}'")]
    UnknownAssociation(String),

    #[error("invalid upper bound '{0}' (expected an integer or \"*\")")]
    InvalidUpperBound(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type ModelFileResult<T> = Result<T, ModelFileError>;

/// Upper bound as written: an integer or `"*"`; negative integers mean unbounded.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawUpperBound {
    Number(i64),
    Text(String),
}

impl Default for RawUpperBound {
    fn default() -> Self {
        RawUpperBound::Number(1)
    }
}

impl RawUpperBound {
    fn resolve(&self) -> ModelFileResult<UpperBound> {
        match self {
            RawUpperBound::Number(n) if *n < 0 => Ok(UpperBound::Unbounded),
            RawUpperBound::Number(n) => u32::try_from(*n)
                .map(UpperBound::Limited)
                .map_err(|_| ModelFileError::InvalidUpperBound(n.to_string())),
            RawUpperBound::Text(s) if s.trim() == "*" => Ok(UpperBound::Unbounded),
            RawUpperBound::Text(s) => Err(ModelFileError::InvalidUpperBound(s.clone())),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    #[serde(default)]
    types: Vec<TypeDoc>,
    #[serde(default)]
    associations: Vec<AssociationDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeDoc {
    name: String,
    #[serde(default = "default_type_kind")]
    kind: TypeKind,
    id: Option<String>,
    #[serde(default)]
    generals: Vec<String>,
    #[serde(default)]
    features: Vec<FeatureDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeatureDoc {
    name: Option<String>,
    #[serde(rename = "type")]
    declared_type: Option<String>,
    #[serde(default = "default_feature_kind")]
    kind: FeatureKind,
    #[serde(default = "default_lower")]
    lower: u32,
    #[serde(default)]
    upper: RawUpperBound,
    #[serde(default = "default_composite")]
    aggregation: AggregationKind,
    #[serde(default = "default_true")]
    navigable: bool,
    id: Option<String>,
    /// `Type::feature` references
    #[serde(default)]
    redefines: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct EndDoc {
    name: Option<String>,
    #[serde(rename = "type")]
    declared_type: Option<String>,
    #[serde(default = "default_feature_kind")]
    kind: FeatureKind,
    #[serde(default = "default_lower")]
    lower: u32,
    #[serde(default)]
    upper: RawUpperBound,
    #[serde(default = "default_no_aggregation")]
    aggregation: AggregationKind,
    #[serde(default)]
    navigable: bool,
    id: Option<String>,
    /// Owning type; the association owns the end when absent
    owner: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssociationDoc {
    name: Option<String>,
    id: Option<String>,
    #[serde(default)]
    derived: bool,
    /// Type the association is nested in
    owner: Option<String>,
    #[serde(default)]
    redefines: Vec<String>,
    #[serde(default)]
    ends: Vec<EndDoc>,
}

fn default_type_kind() -> TypeKind {
    TypeKind::Class
}

fn default_feature_kind() -> FeatureKind {
    FeatureKind::Property
}

fn default_lower() -> u32 {
    1
}

fn default_composite() -> AggregationKind {
    AggregationKind::Composite
}

fn default_no_aggregation() -> AggregationKind {
    AggregationKind::None
}

fn default_true() -> bool {
    true
}

/// Name lookup tables filled while building.
#[derive(Default)]
struct Names {
    types: HashMap<String, TypeId>,
    features: HashMap<String, FeatureId>,
    associations: HashMap<String, AssociationId>,
}

impl Names {
    fn type_id(&self, name: &str, context: impl FnOnce() -> String) -> ModelFileResult<TypeId> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| ModelFileError::UnknownType {
                name: name.to_string(),
                context: context(),
            })
    }

    fn optional_type_id(
        &self,
        name: Option<&str>,
        context: impl FnOnce() -> String,
    ) -> ModelFileResult<Option<TypeId>> {
        name.map(|n| self.type_id(n, context)).transpose()
    }
}

impl ModelDocument {
    pub fn parse(content: &str) -> ModelFileResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the arena; every name reference must resolve.
    #[instrument(level = "debug", skip_all, fields(types = self.types.len(), associations = self.associations.len()))]
    pub fn into_model(self) -> ModelFileResult<ModelArena> {
        let mut builder = ModelBuilder::new();
        let mut names = Names::default();

        for ty in &self.types {
            if names.types.contains_key(&ty.name) {
                return Err(ModelFileError::DuplicateType(ty.name.clone()));
            }
            let id = builder.add_type(Some(&ty.name), ty.kind, ty.id.as_deref());
            names.types.insert(ty.name.clone(), id);
        }

        for ty in &self.types {
            let specific = names.type_id(&ty.name, || "types".to_string())?;
            for general in &ty.generals {
                let general = names.type_id(general, || format!("generals of {}", ty.name))?;
                builder.generalize(specific, general)?;
            }
        }

        let mut feature_redefinitions = Vec::new();
        for ty in &self.types {
            let owner = names.type_id(&ty.name, || "types".to_string())?;
            for feature in &ty.features {
                let spec = feature_spec(&names, &ty.name, feature)?;
                let id = builder.add_feature(owner, spec)?;
                if let Some(name) = feature.name.as_deref() {
                    names.features.insert(format!("{}::{}", ty.name, name), id);
                }
                for redefined in &feature.redefines {
                    feature_redefinitions.push((id, redefined.clone()));
                }
            }
        }

        let mut association_redefinitions = Vec::new();
        for association in &self.associations {
            let label = association.name.as_deref().unwrap_or("<unnamed association>");
            let mut spec = AssociationSpec::new(association.name.as_deref()).derived(association.derived);
            if let Some(stable_id) = association.id.as_deref() {
                spec = spec.stable_id(stable_id);
            }
            if let Some(owner) = association.owner.as_deref() {
                spec = spec.owned_by(names.type_id(owner, || format!("owner of {label}"))?);
            }
            for end in &association.ends {
                spec = spec.end(end_spec(&names, label, end)?);
            }
            let id = builder.add_association(spec)?;
            if let Some(name) = association.name.as_deref() {
                names.associations.insert(name.to_string(), id);
            }
            for redefined in &association.redefines {
                association_redefinitions.push((id, redefined.clone()));
            }
        }

        for (feature, redefined) in feature_redefinitions {
            let target = names
                .features
                .get(&redefined)
                .copied()
                .ok_or(ModelFileError::UnknownFeature(redefined))?;
            builder.redefine_feature(feature, target)?;
        }
        for (association, redefined) in association_redefinitions {
            let target = names
                .associations
                .get(&redefined)
                .copied()
                .ok_or(ModelFileError::UnknownAssociation(redefined))?;
            builder.redefine_association(association, target)?;
        }

        let model = builder.build();
        debug!(
            types = model.type_count(),
            features = model.feature_count(),
            associations = model.association_count(),
            "model built"
        );
        Ok(model)
    }
}

fn feature_spec(names: &Names, owner: &str, doc: &FeatureDoc) -> ModelFileResult<FeatureSpec> {
    let declared_type = names.optional_type_id(doc.declared_type.as_deref(), || {
        format!("{owner}::{}", doc.name.as_deref().unwrap_or("<unnamed>"))
    })?;
    let mut spec = FeatureSpec::untyped()
        .with_name(doc.name.as_deref())
        .with_type(declared_type)
        .with_kind(doc.kind)
        .multiplicity(doc.lower, doc.upper.resolve()?)
        .aggregation(doc.aggregation)
        .navigable(doc.navigable);
    if let Some(stable_id) = doc.id.as_deref() {
        spec = spec.stable_id(stable_id);
    }
    Ok(spec)
}

fn end_spec(names: &Names, association: &str, doc: &EndDoc) -> ModelFileResult<EndSpec> {
    let declared_type = names.optional_type_id(doc.declared_type.as_deref(), || {
        format!("end of {association}")
    })?;
    let mut feature = FeatureSpec::untyped()
        .with_name(doc.name.as_deref())
        .with_type(declared_type)
        .with_kind(doc.kind)
        .multiplicity(doc.lower, doc.upper.resolve()?)
        .aggregation(doc.aggregation)
        .navigable(doc.navigable);
    if let Some(stable_id) = doc.id.as_deref() {
        feature = feature.stable_id(stable_id);
    }
    match doc.owner.as_deref() {
        Some(owner) => {
            let owner = names.type_id(owner, || format!("owner of an end of {association}"))?;
            Ok(EndSpec::type_owned(feature, owner))
        }
        None => Ok(EndSpec::association_owned(feature)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_star_or_negative_when_resolving_upper_then_unbounded() {
        assert_eq!(RawUpperBound::Text("*".into()).resolve().unwrap(), UpperBound::Unbounded);
        assert_eq!(RawUpperBound::Number(-1).resolve().unwrap(), UpperBound::Unbounded);
        assert_eq!(RawUpperBound::Number(3).resolve().unwrap(), UpperBound::Limited(3));
        assert!(RawUpperBound::Text("many".into()).resolve().is_err());
    }
}
