//! Error-accumulating validation
//!
//! Every check of a battery is evaluated; failures are concatenated with
//! `combine` instead of stopping at the first one.

use crate::domain::explanation::Explanation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated<T> {
    Valid(T),
    Invalid(Vec<Explanation>),
}

impl Validated<()> {
    /// A single check: valid when `ok`, else fails with `explanation`.
    pub fn check(ok: bool, explanation: Explanation) -> Self {
        if ok {
            Validated::Valid(())
        } else {
            Validated::Invalid(vec![explanation])
        }
    }

    /// Combine a sequence of checks, keeping failures in evaluation order.
    pub fn all<I>(checks: I) -> Self
    where
        I: IntoIterator<Item = Validated<()>>,
    {
        checks
            .into_iter()
            .fold(Validated::Valid(()), |acc, next| acc.combine(next).map(|_| ()))
    }
}

impl<T> Validated<T> {
    /// Applicative combination: both valid yields the pair, otherwise the
    /// failures of both sides are concatenated. A code already present is
    /// not repeated.
    pub fn combine<U>(self, other: Validated<U>) -> Validated<(T, U)> {
        match (self, other) {
            (Validated::Valid(a), Validated::Valid(b)) => Validated::Valid((a, b)),
            (Validated::Valid(_), Validated::Invalid(e)) => Validated::Invalid(e),
            (Validated::Invalid(e), Validated::Valid(_)) => Validated::Invalid(e),
            (Validated::Invalid(mut left), Validated::Invalid(right)) => {
                for explanation in right {
                    if !left.contains(&explanation) {
                        left.push(explanation);
                    }
                }
                Validated::Invalid(left)
            }
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Validated<U> {
        match self {
            Validated::Valid(v) => Validated::Valid(f(v)),
            Validated::Invalid(e) => Validated::Invalid(e),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }

    pub fn into_result(self) -> Result<T, Vec<Explanation>> {
        match self {
            Validated::Valid(v) => Ok(v),
            Validated::Invalid(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_mixed_checks_when_combining_then_keeps_failures_in_order() {
        let result = Validated::all([
            Validated::check(false, Explanation::UntypedProperty),
            Validated::check(true, Explanation::CircularTopology),
            Validated::check(false, Explanation::OptionalMultiplicity),
            Validated::check(false, Explanation::UntypedProperty),
        ]);

        assert_eq!(
            result,
            Validated::Invalid(vec![
                Explanation::UntypedProperty,
                Explanation::OptionalMultiplicity
            ])
        );
    }

    #[test]
    fn given_only_passing_checks_when_combining_then_valid() {
        let result = Validated::all([
            Validated::check(true, Explanation::UntypedProperty),
            Validated::check(true, Explanation::DataTypePort),
        ]);

        assert!(result.is_valid());
        assert_eq!(result.into_result(), Ok(()));
    }

    #[test]
    fn given_two_valid_values_when_combining_then_pairs_them() {
        let combined = Validated::Valid(1).combine(Validated::Valid("a"));
        assert_eq!(combined, Validated::Valid((1, "a")));
    }
}
