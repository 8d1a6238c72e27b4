//! Domain layer: model view, tree analysis and results
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod analyzer;
pub mod arena;
pub mod builder;
pub mod classifier;
pub mod error;
pub mod explanation;
pub mod model;
pub mod ordering;
pub mod path;
pub mod policy;
pub mod render;
pub mod tree;
pub mod validation;

pub use analyzer::{name_conflicts, TreeAnalyzer};
pub use arena::ModelArena;
pub use builder::{AssociationSpec, EndSpec, FeatureSpec, ModelBuilder};
pub use error::{ModelError, ModelResult, TreeError, TreeResult};
pub use explanation::Explanation;
pub use model::{
    AggregationKind, AssociationId, AssociationInfo, FeatureId, FeatureInfo, FeatureKind,
    ModelQuery, TypeId, TypeInfo, TypeKind, UpperBound,
};
pub use path::TreePath;
pub use policy::{AllClosedWorld, ClosedWorldPolicy, PatternPolicy};
pub use render::{BranchOrder, TreeRender};
pub use tree::{
    BranchKind, IllFormedBranch, IllFormedTree, TreeFeatureBranch, TreeType, TypedBranch,
    WellFormedTree,
};
pub use validation::Validated;
