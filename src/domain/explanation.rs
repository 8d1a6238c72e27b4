//! Machine-readable reasons for ill-formedness

use std::fmt;

use serde::Serialize;

/// Why a branch or a tree node was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Explanation {
    // branch level
    UnnamedStructuralFeature,
    OptionalMultiplicity,
    ZeroMultiplicity,
    CollectionMultiplicity,
    UntypedProperty,
    UntypedPort,
    CircularTopology,
    DataTypePort,
    UndirectedBinaryAssociation,
    NaryAssociation,
    UntypedAssociationFromMemberEnd,
    UnrelatedAssociationFromMemberEndType,
    UntypedAssociationToMemberEnd,

    // type level
    NotCompositeStructureOrDataType,
    FeatureNameConflicts,
    /// Reserved for policy extensions; the analyzer never produces it.
    TemplateType,
    /// Reserved for policy extensions; the analyzer never produces it.
    ParameterizedType,
}

impl Explanation {
    pub fn code(self) -> &'static str {
        match self {
            Explanation::UnnamedStructuralFeature => "UnnamedStructuralFeature",
            Explanation::OptionalMultiplicity => "OptionalMultiplicity",
            Explanation::ZeroMultiplicity => "ZeroMultiplicity",
            Explanation::CollectionMultiplicity => "CollectionMultiplicity",
            Explanation::UntypedProperty => "UntypedProperty",
            Explanation::UntypedPort => "UntypedPort",
            Explanation::CircularTopology => "CircularTopology",
            Explanation::DataTypePort => "DataTypePort",
            Explanation::UndirectedBinaryAssociation => "UndirectedBinaryAssociation",
            Explanation::NaryAssociation => "NaryAssociation",
            Explanation::UntypedAssociationFromMemberEnd => "UntypedAssociationFromMemberEnd",
            Explanation::UnrelatedAssociationFromMemberEndType => {
                "UnrelatedAssociationFromMemberEndType"
            }
            Explanation::UntypedAssociationToMemberEnd => "UntypedAssociationToMemberEnd",
            Explanation::NotCompositeStructureOrDataType => "NotCompositeStructureOrDataType",
            Explanation::FeatureNameConflicts => "FeatureNameConflicts",
            Explanation::TemplateType => "TemplateType",
            Explanation::ParameterizedType => "ParameterizedType",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Explanation::UnnamedStructuralFeature => "feature has no name",
            Explanation::OptionalMultiplicity => "lower bound is 0",
            Explanation::ZeroMultiplicity => "upper bound is 0",
            Explanation::CollectionMultiplicity => "multiplicity allows more than one value",
            Explanation::UntypedProperty => "property has no type",
            Explanation::UntypedPort => "port has no type",
            Explanation::CircularTopology => "target type conforms to a type already on the path",
            Explanation::DataTypePort => "data type owns a port",
            Explanation::UndirectedBinaryAssociation => "association ends cannot be directed",
            Explanation::NaryAssociation => "association does not have exactly two ends",
            Explanation::UntypedAssociationFromMemberEnd => "association source end has no type",
            Explanation::UnrelatedAssociationFromMemberEndType => {
                "association source end type is unrelated to the context"
            }
            Explanation::UntypedAssociationToMemberEnd => "association target end has no type",
            Explanation::NotCompositeStructureOrDataType => {
                "type is neither a class nor a data type"
            }
            Explanation::FeatureNameConflicts => "several branches share a name",
            Explanation::TemplateType => "type is a template",
            Explanation::ParameterizedType => "type is parameterized",
        }
    }

    pub fn is_type_level(self) -> bool {
        matches!(
            self,
            Explanation::NotCompositeStructureOrDataType
                | Explanation::FeatureNameConflicts
                | Explanation::TemplateType
                | Explanation::ParameterizedType
        )
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
