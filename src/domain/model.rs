//! Model query interface: the read-only view of the structural model
//!
//! The analyzer never sees the backing store. It works on snapshots
//! (`TypeInfo`, `FeatureInfo`, `AssociationInfo`) handed out by a
//! `ModelQuery` implementation, so analysis results stay valid after the
//! model is dropped.

use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::error::ModelResult;

macro_rules! element_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) Index);

        impl $name {
            /// Rebuild an id from the raw parts of an arena index.
            pub fn from_raw_parts(slot: usize, generation: u64) -> Self {
                Self(Index::from_raw_parts(slot, generation))
            }

            pub fn into_raw_parts(self) -> (usize, u64) {
                self.0.into_raw_parts()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let (slot, generation) = self.0.into_raw_parts();
                write!(f, concat!($prefix, "#{}.{}"), slot, generation)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

element_id!(TypeId, "type");
element_id!(FeatureId, "feature");
element_id!(AssociationId, "association");

/// Classification of a model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    AssociationClass,
    DataType,
    PrimitiveType,
    Enumeration,
    Interface,
    Other,
}

impl TypeKind {
    pub fn is_class_like(self) -> bool {
        matches!(self, TypeKind::Class | TypeKind::AssociationClass)
    }

    pub fn is_data_type_like(self) -> bool {
        matches!(
            self,
            TypeKind::DataType | TypeKind::PrimitiveType | TypeKind::Enumeration
        )
    }

    /// Whether a type of this kind can anchor a tree node.
    ///
    /// Association classes are class-like but excluded: their instances are
    /// links, not parts.
    pub fn is_tree_feature_type(self) -> bool {
        matches!(self, TypeKind::Class) || self.is_data_type_like()
    }
}

/// Upper multiplicity bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpperBound {
    Limited(u32),
    Unbounded,
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpperBound::Limited(n) => write!(f, "{n}"),
            UpperBound::Unbounded => write!(f, "*"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    None,
    Shared,
    Composite,
}

/// Whether a structural feature is a plain property or a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Property,
    Port,
}

/// Snapshot of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: Option<String>,
    pub kind: TypeKind,
    /// Stable structural identifier, when the model provides one
    pub stable_id: Option<String>,
}

impl TypeInfo {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("<{}>", self.id))
    }
}

/// Snapshot of an attribute, port or association member end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureInfo {
    pub id: FeatureId,
    pub name: Option<String>,
    pub kind: FeatureKind,
    pub declared_type: Option<TypeId>,
    /// Stable id of the declared type, else its name
    pub declared_type_key: Option<String>,
    pub lower: u32,
    pub upper: UpperBound,
    pub aggregation: AggregationKind,
    /// Owning type; `None` for ends owned by their association
    pub owner: Option<TypeId>,
    /// Association this feature is a member end of
    pub association: Option<AssociationId>,
    pub navigable: bool,
    pub stable_id: Option<String>,
}

impl FeatureInfo {
    pub fn is_composite(&self) -> bool {
        self.aggregation == AggregationKind::Composite
    }

    pub fn is_port(&self) -> bool {
        self.kind == FeatureKind::Port
    }

    pub fn is_owned_by_association(&self, association: AssociationId) -> bool {
        self.owner.is_none() && self.association == Some(association)
    }

    /// Name if present and non-empty.
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn display_name(&self) -> String {
        self.effective_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("<{}>", self.id))
    }

    pub fn multiplicity(&self) -> String {
        format!("{}..{}", self.lower, self.upper)
    }
}

/// Snapshot of an association with its member ends in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationInfo {
    pub id: AssociationId,
    pub name: Option<String>,
    pub stable_id: Option<String>,
    pub member_ends: Vec<FeatureInfo>,
    pub is_derived: bool,
}

impl AssociationInfo {
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn display_name(&self) -> String {
        self.effective_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("<{}>", self.id))
    }

    pub fn is_composite(&self) -> bool {
        self.member_ends.iter().any(FeatureInfo::is_composite)
    }
}

/// Read-only queries the analyzer needs from the modeling API.
pub trait ModelQuery {
    fn type_info(&self, ty: TypeId) -> ModelResult<TypeInfo>;

    /// Reflexive-transitive conformance: `specific` is `general` or one of its subtypes.
    fn conforms_to(&self, specific: TypeId, general: TypeId) -> ModelResult<bool>;

    /// Composite associations reachable from `ty`, excluding redefined and derived ones.
    fn composite_associations(&self, ty: TypeId) -> ModelResult<Vec<AssociationInfo>>;

    /// All attributes and ports of `ty`, inherited ones included, redefined ones excluded.
    fn attributes(&self, ty: TypeId) -> ModelResult<Vec<FeatureInfo>>;

    /// All types of the model, in a deterministic order.
    fn types(&self) -> ModelResult<Vec<TypeInfo>>;

    fn find_type(&self, name: &str) -> ModelResult<Option<TypeInfo>> {
        Ok(self
            .types()?
            .into_iter()
            .find(|t| t.name.as_deref() == Some(name)))
    }

    /// Conformance in either direction.
    fn related(&self, a: TypeId, b: TypeId) -> ModelResult<bool> {
        Ok(self.conforms_to(a, b)? || self.conforms_to(b, a)?)
    }
}
