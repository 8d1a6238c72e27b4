//! Branch classification: one candidate edge in, one branch (or nothing) out
//!
//! Every check of the battery runs; the collected explanations decide
//! between a typed branch (whose child is analyzed recursively) and a single
//! ill-formed branch. Model and policy faults abort through `?`.

use tracing::{debug, instrument, trace};

use crate::domain::analyzer::TreeAnalyzer;
use crate::domain::error::TreeResult;
use crate::domain::explanation::Explanation;
use crate::domain::model::{AssociationInfo, FeatureInfo, ModelQuery, TypeInfo, UpperBound};
use crate::domain::path::TreePath;
use crate::domain::policy::ClosedWorldPolicy;
use crate::domain::tree::{IllFormedBranch, TreeFeatureBranch, TypedBranch};
use crate::domain::validation::Validated;

/// Resolve the `(from, to)` ends of a binary association.
///
/// The single navigable end is `to`. More or fewer than two ends, or a
/// navigability that does not single out one end, cannot be directed.
pub fn directed_ends(association: &AssociationInfo) -> Result<(&FeatureInfo, &FeatureInfo), Explanation> {
    let [first, second] = association.member_ends.as_slice() else {
        return Err(Explanation::NaryAssociation);
    };
    match (first.navigable, second.navigable) {
        (false, true) => Ok((first, second)),
        (true, false) => Ok((second, first)),
        _ => Err(Explanation::UndirectedBinaryAssociation),
    }
}

/// Exactly-one multiplicity.
pub fn multiplicity_checks(lower: u32, upper: UpperBound) -> Validated<()> {
    let lower_check = match lower {
        1 => Validated::Valid(()),
        0 => Validated::Invalid(vec![Explanation::OptionalMultiplicity]),
        _ => Validated::Invalid(vec![Explanation::CollectionMultiplicity]),
    };
    let upper_check = match upper {
        UpperBound::Limited(1) => Validated::Valid(()),
        UpperBound::Limited(0) => Validated::Invalid(vec![Explanation::ZeroMultiplicity]),
        UpperBound::Limited(_) | UpperBound::Unbounded => {
            Validated::Invalid(vec![Explanation::CollectionMultiplicity])
        }
    };
    lower_check.combine(upper_check).map(|_| ())
}

/// Full battery for one feature seen from `context`.
///
/// Returns the combined verdict and the resolved target type, if any.
fn feature_checks<M>(
    model: &M,
    path: &TreePath,
    context: &TypeInfo,
    feature: &FeatureInfo,
    untyped: Explanation,
) -> TreeResult<(Validated<()>, Option<TypeInfo>)>
where
    M: ModelQuery + ?Sized,
{
    let target = feature
        .declared_type
        .map(|ty| model.type_info(ty))
        .transpose()?;

    let acyclic = match &target {
        Some(target) => Validated::check(
            path.is_acyclic_with(model, context, target)?,
            Explanation::CircularTopology,
        ),
        None => Validated::Valid(()),
    };

    let verdict = Validated::all([
        Validated::check(target.is_some(), untyped),
        acyclic,
        multiplicity_checks(feature.lower, feature.upper),
        Validated::check(
            feature.effective_name().is_some(),
            Explanation::UnnamedStructuralFeature,
        ),
        Validated::check(
            !(context.kind.is_data_type_like() && feature.is_port()),
            Explanation::DataTypePort,
        ),
    ]);
    Ok((verdict, target))
}

fn ill_formed(
    feature: Option<FeatureInfo>,
    association: Option<AssociationInfo>,
    explanations: Vec<Explanation>,
) -> TreeResult<Option<TreeFeatureBranch>> {
    debug!(?explanations, "ill-formed branch");
    IllFormedBranch::new(feature, association, explanations)
        .map(|branch| Some(TreeFeatureBranch::IllFormed(branch)))
}

impl<'a, M, P> TreeAnalyzer<'a, M, P>
where
    M: ModelQuery + ?Sized,
    P: ClosedWorldPolicy + ?Sized,
{
    /// Classify one composite association seen from `context`.
    ///
    /// `Ok(None)` when the association is traversed from its other side.
    #[instrument(level = "trace", skip_all, fields(context = %context.display_name(), association = %association.display_name()))]
    pub fn classify_association(
        &self,
        path: &TreePath,
        context: &TypeInfo,
        association: &AssociationInfo,
    ) -> TreeResult<Option<TreeFeatureBranch>> {
        let model = self.model();

        let (from, to) = match directed_ends(association) {
            Ok((from, to)) => (from.clone(), to.clone()),
            Err(explanation) => return ill_formed(None, Some(association.clone()), vec![explanation]),
        };

        let from_conforms = match from.declared_type {
            Some(from_type) => model.conforms_to(context.id, from_type)?,
            None => false,
        };
        if !from_conforms {
            let to_conforms = match to.declared_type {
                Some(to_type) => model.conforms_to(context.id, to_type)?,
                None => false,
            };
            if to_conforms {
                trace!("association traversed from its other end, skipped");
                return Ok(None);
            }
            let explanation = if from.declared_type.is_none() {
                Explanation::UntypedAssociationFromMemberEnd
            } else {
                Explanation::UnrelatedAssociationFromMemberEndType
            };
            return ill_formed(Some(from), Some(association.clone()), vec![explanation]);
        }

        let (verdict, target) = feature_checks(
            model,
            path,
            context,
            &to,
            Explanation::UntypedAssociationToMemberEnd,
        )?;
        let target = match (verdict, target) {
            (Validated::Valid(()), Some(target)) => target,
            (Validated::Invalid(explanations), _) => {
                return ill_formed(Some(to), Some(association.clone()), explanations)
            }
            (Validated::Valid(()), None) => {
                return ill_formed(
                    Some(to),
                    Some(association.clone()),
                    vec![Explanation::UntypedAssociationToMemberEnd],
                )
            }
        };

        let child = self.analyze(&path.extended(context), &target)?;
        let branch = if to.is_port() {
            TypedBranch::association_port(association.clone(), to, child)?
        } else {
            TypedBranch::association_property(association.clone(), to, child)?
        };
        debug!(name = branch.name(), "association branch");
        Ok(Some(TreeFeatureBranch::Typed(branch)))
    }

    /// Classify one composite, closed-world attribute or port of `context`.
    #[instrument(level = "trace", skip_all, fields(context = %context.display_name(), feature = %feature.display_name()))]
    pub fn classify_attribute(
        &self,
        path: &TreePath,
        context: &TypeInfo,
        feature: &FeatureInfo,
    ) -> TreeResult<TreeFeatureBranch> {
        let untyped = if feature.is_port() {
            Explanation::UntypedPort
        } else {
            Explanation::UntypedProperty
        };
        let (verdict, target) = feature_checks(self.model(), path, context, feature, untyped)?;
        let target = match (verdict, target) {
            (Validated::Valid(()), Some(target)) => target,
            (Validated::Invalid(explanations), _) => {
                debug!(?explanations, "ill-formed attribute branch");
                return IllFormedBranch::new(Some(feature.clone()), None, explanations)
                    .map(TreeFeatureBranch::IllFormed);
            }
            (Validated::Valid(()), None) => {
                return IllFormedBranch::new(Some(feature.clone()), None, vec![untyped])
                    .map(TreeFeatureBranch::IllFormed);
            }
        };

        let child = self.analyze(&path.extended(context), &target)?;
        let branch = if feature.is_port() {
            TypedBranch::port(feature.clone(), child)?
        } else {
            TypedBranch::property(feature.clone(), child)?
        };
        debug!(name = branch.name(), "attribute branch");
        Ok(TreeFeatureBranch::Typed(branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, UpperBound::Limited(1), vec![])]
    #[case(0, UpperBound::Limited(1), vec![Explanation::OptionalMultiplicity])]
    #[case(0, UpperBound::Limited(0), vec![Explanation::OptionalMultiplicity, Explanation::ZeroMultiplicity])]
    #[case(1, UpperBound::Limited(0), vec![Explanation::ZeroMultiplicity])]
    #[case(1, UpperBound::Limited(4), vec![Explanation::CollectionMultiplicity])]
    #[case(1, UpperBound::Unbounded, vec![Explanation::CollectionMultiplicity])]
    #[case(0, UpperBound::Unbounded, vec![Explanation::OptionalMultiplicity, Explanation::CollectionMultiplicity])]
    #[case(2, UpperBound::Limited(2), vec![Explanation::CollectionMultiplicity])]
    fn given_bounds_when_checking_multiplicity_then_reports_expected_codes(
        #[case] lower: u32,
        #[case] upper: UpperBound,
        #[case] expected: Vec<Explanation>,
    ) {
        let result = multiplicity_checks(lower, upper);
        match result.into_result() {
            Ok(()) => assert!(expected.is_empty()),
            Err(codes) => assert_eq!(codes, expected),
        }
    }
}
