use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::error::SequenceError;

/// Upper bound on trials per session.
///
/// An experiment-design constraint carried over from the protocol, not a
/// technical limit.
pub const MAX_TRIALS: u32 = 40;

/// Builds the per-trial target labels for one session.
///
/// The caller provides the category member list and the base item the
/// subject is asked to detect; randomness comes in through an explicit RNG
/// so seeded runs are reproducible.
pub struct SequenceBuilder<'a> {
    members: &'a [&'a str],
    base_item: &'a str,
}

impl<'a> SequenceBuilder<'a> {
    #[must_use]
    pub fn new(members: &'a [&'a str], base_item: &'a str) -> Self {
        Self { members, base_item }
    }

    /// Generate the shuffled label sequence for `trial_count` trials.
    ///
    /// Even construction slots carry the base item and odd slots one
    /// alternative drawn uniformly with replacement, so the base item lands
    /// on exactly `ceil(trial_count / 2)` trials no matter how the final
    /// shuffle orders them.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::InvalidTrialCount` unless
    /// `1 <= trial_count <= MAX_TRIALS`, `SequenceError::InvalidBaseItem` if
    /// the base item is not a member, and `SequenceError::EmptyAlternatives`
    /// if the base item is the only member.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        trial_count: u32,
        rng: &mut R,
    ) -> Result<Vec<String>, SequenceError> {
        if trial_count == 0 || trial_count > MAX_TRIALS {
            return Err(SequenceError::InvalidTrialCount { got: trial_count });
        }
        if !self.members.contains(&self.base_item) {
            return Err(SequenceError::InvalidBaseItem {
                item: self.base_item.to_string(),
            });
        }

        let alternatives: Vec<&str> = self
            .members
            .iter()
            .copied()
            .filter(|member| *member != self.base_item)
            .collect();
        if alternatives.is_empty() {
            return Err(SequenceError::EmptyAlternatives);
        }

        let mut labels: Vec<String> = (0..trial_count)
            .map(|slot| {
                if slot % 2 == 0 {
                    self.base_item
                } else {
                    // alternatives is non-empty, checked above
                    alternatives.choose(rng).copied().unwrap_or(self.base_item)
                }
            })
            .map(str::to_string)
            .collect();
        labels.shuffle(rng);

        Ok(labels)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MEMBERS: &[&str] = &["apple", "grape", "banana", "pineapple"];

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn generate(trial_count: u32) -> Result<Vec<String>, SequenceError> {
        SequenceBuilder::new(MEMBERS, "apple").generate(trial_count, &mut rng())
    }

    #[test]
    fn sequence_has_requested_length() {
        for count in [1, 7, 10, 40] {
            assert_eq!(generate(count).unwrap().len(), count as usize);
        }
    }

    #[test]
    fn base_item_fills_half_the_trials_rounded_up() {
        for count in 1..=MAX_TRIALS {
            let labels = generate(count).unwrap();
            let base = labels.iter().filter(|l| *l == "apple").count();
            assert_eq!(base, count.div_ceil(2) as usize, "count {count}");
        }
    }

    #[test]
    fn non_base_labels_are_category_alternatives() {
        let labels = generate(40).unwrap();
        for label in labels.iter().filter(|l| *l != "apple") {
            assert!(MEMBERS.contains(&label.as_str()));
            assert_ne!(label, "apple");
        }
    }

    #[test]
    fn trial_count_bounds_are_enforced() {
        assert!(generate(1).is_ok());
        assert!(generate(40).is_ok());
        assert_eq!(
            generate(0).unwrap_err(),
            SequenceError::InvalidTrialCount { got: 0 }
        );
        assert_eq!(
            generate(41).unwrap_err(),
            SequenceError::InvalidTrialCount { got: 41 }
        );
    }

    #[test]
    fn base_item_must_be_a_member() {
        let err = SequenceBuilder::new(MEMBERS, "carrot")
            .generate(10, &mut rng())
            .unwrap_err();
        assert_eq!(
            err,
            SequenceError::InvalidBaseItem {
                item: "carrot".into()
            }
        );
    }

    #[test]
    fn lone_member_category_has_no_alternatives() {
        let err = SequenceBuilder::new(&["apple"], "apple")
            .generate(10, &mut rng())
            .unwrap_err();
        assert_eq!(err, SequenceError::EmptyAlternatives);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let builder = SequenceBuilder::new(MEMBERS, "apple");
        let first = builder
            .generate(20, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let second = builder
            .generate(20, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(first, second);

        let other_seed = builder
            .generate(20, &mut StdRng::seed_from_u64(43))
            .unwrap();
        // Same multiset either way, almost surely a different order.
        let base = |labels: &[String]| labels.iter().filter(|l| *l == "apple").count();
        assert_eq!(base(&first), base(&other_seed));
    }
}
