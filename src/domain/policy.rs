//! Closed-world policy: which composite features count as tree composition
//!
//! The analyzer does not decide this itself. A policy is injected at the
//! analyzer entry point.

use regex::Regex;
use tracing::trace;

use crate::domain::error::TreeResult;
use crate::domain::model::{FeatureInfo, TypeInfo};

pub trait ClosedWorldPolicy {
    /// Whether `feature`, seen from `owner`, is eligible for tree composition.
    fn is_closed_world(&self, owner: &TypeInfo, feature: &FeatureInfo) -> TreeResult<bool>;
}

impl<F> ClosedWorldPolicy for F
where
    F: Fn(&TypeInfo, &FeatureInfo) -> TreeResult<bool>,
{
    fn is_closed_world(&self, owner: &TypeInfo, feature: &FeatureInfo) -> TreeResult<bool> {
        self(owner, feature)
    }
}

/// Every composite feature is closed-world.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllClosedWorld;

impl ClosedWorldPolicy for AllClosedWorld {
    fn is_closed_world(&self, _owner: &TypeInfo, _feature: &FeatureInfo) -> TreeResult<bool> {
        Ok(true)
    }
}

/// Pattern based policy.
///
/// A feature is open-world when its owner's name matches one of
/// `open_world_types`, or when its name or `Owner::name` matches one of
/// `open_world_features`. Everything else gets `default_closed_world`.
#[derive(Debug, Clone)]
pub struct PatternPolicy {
    default_closed_world: bool,
    open_world_types: Vec<Regex>,
    open_world_features: Vec<Regex>,
}

impl PatternPolicy {
    pub fn new(
        default_closed_world: bool,
        open_world_types: Vec<Regex>,
        open_world_features: Vec<Regex>,
    ) -> Self {
        Self {
            default_closed_world,
            open_world_types,
            open_world_features,
        }
    }

    /// Compile pattern strings.
    pub fn from_patterns<S: AsRef<str>>(
        default_closed_world: bool,
        open_world_types: &[S],
        open_world_features: &[S],
    ) -> Result<Self, regex::Error> {
        let compile = |patterns: &[S]| -> Result<Vec<Regex>, regex::Error> {
            patterns.iter().map(|p| Regex::new(p.as_ref())).collect()
        };
        Ok(Self::new(
            default_closed_world,
            compile(open_world_types)?,
            compile(open_world_features)?,
        ))
    }
}

impl ClosedWorldPolicy for PatternPolicy {
    fn is_closed_world(&self, owner: &TypeInfo, feature: &FeatureInfo) -> TreeResult<bool> {
        if let Some(owner_name) = owner.name.as_deref() {
            if self.open_world_types.iter().any(|re| re.is_match(owner_name)) {
                trace!(owner = owner_name, "owner is open-world");
                return Ok(false);
            }
        }
        if let Some(feature_name) = feature.effective_name() {
            let qualified = format!("{}::{}", owner.display_name(), feature_name);
            if self
                .open_world_features
                .iter()
                .any(|re| re.is_match(feature_name) || re.is_match(&qualified))
            {
                trace!(feature = %qualified, "feature is open-world");
                return Ok(false);
            }
        }
        Ok(self.default_closed_world)
    }
}
