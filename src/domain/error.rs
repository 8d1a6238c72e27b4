//! Domain-level errors
//!
//! These are faults: a broken model query, a failing policy, or a violated
//! construction invariant. Ill-formedness of the analyzed structure is data
//! (`Explanation`), never an error.

use thiserror::Error;

use crate::domain::model::{AssociationId, FeatureId, TypeId};

/// Failures raised by a `ModelQuery` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown type: {0}")]
    UnknownType(TypeId),

    #[error("unknown feature: {0}")]
    UnknownFeature(FeatureId),

    #[error("unknown association: {0}")]
    UnknownAssociation(AssociationId),

    #[error("inconsistent model: {0}")]
    Inconsistent(String),
}

/// Faults that abort an analysis.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("model query failed: {0}")]
    Model(#[from] ModelError),

    #[error("closed-world policy failed for {feature}: {message}")]
    Policy { feature: String, message: String },

    #[error("tree invariant violated: {0}")]
    InvariantViolation(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

pub type TreeResult<T> = Result<T, TreeError>;
