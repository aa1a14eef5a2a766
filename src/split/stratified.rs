use std::collections::BTreeMap;

use itertools::Itertools;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{apportion::*, *};
use crate::{
    ClassId,
    error::{GraphError, Result, raise_error_unless},
};

/// Proportional train/validation/test splitter.
///
/// The split runs in two stages: first the test set is separated from the rest, then the
/// rest is divided into train and validation sets. The proportions have to sum to `1`.
/// Every set receives the floor or the ceiling of `fraction * n` rows; if the test share is
/// fractional it is rounded up, as is the validation share where possible.
///
/// If labels are passed for stratification, every class is split on its own: each class
/// contributes the floor or the ceiling of `fraction * class_size` rows to every set, so its
/// proportion in every set is within one row of the requested fraction. Every class needs at
/// least two members.
///
/// # Examples
/// ```
/// use attrgraph::split::StratifiedSplit;
///
/// let labels = [0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
/// let partition = StratifiedSplit::default()
///     .seed(Some(7))
///     .split_indices(labels.len(), Some(&labels[..]))
///     .unwrap();
///
/// assert_eq!(partition.test.len(), 2);
/// assert_eq!(partition.train.len() + partition.val.len(), 8);
/// assert!(partition.is_disjoint());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StratifiedSplit {
    pub train_size: f64,
    pub val_size: f64,
    pub test_size: f64,
    pub seed: Option<u64>,
}

impl Default for StratifiedSplit {
    fn default() -> Self {
        Self {
            train_size: 0.5,
            val_size: 0.3,
            test_size: 0.2,
            seed: None,
        }
    }
}

impl StratifiedSplit {
    /// Sets the proportion of rows in the train set
    pub fn train_size(mut self, size: f64) -> Self {
        self.train_size = size;
        self
    }

    /// Sets the proportion of rows in the validation set
    pub fn val_size(mut self, size: f64) -> Self {
        self.val_size = size;
        self
    }

    /// Sets the proportion of rows in the test set
    pub fn test_size(mut self, size: f64) -> Self {
        self.test_size = size;
        self
    }

    /// Sets the seed. Without a seed, every call draws a different partition.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Partitions the row indices `0..n`.
    ///
    /// # Errors
    /// - [`GraphError::InvalidSplit`] if a proportion is not in `(0, 1)`, the proportions do
    ///   not sum to `1`, a set would be empty or (when stratifying) a set has fewer rows than
    ///   there are classes,
    /// - [`GraphError::LengthMismatch`] if `stratify` does not have length `n`,
    /// - [`GraphError::InsufficientClassMembers`] if some class has a single member.
    pub fn split_indices<L>(&self, n: usize, stratify: Option<&[L]>) -> Result<IndexPartition>
    where
        L: Ord + Copy + Into<ClassId>,
    {
        self.validate()?;

        let groups = match stratify {
            None => vec![(0..n).collect_vec()],
            Some(labels) => class_members(labels, n)?,
        };

        let sizes = groups.iter().map(Vec::len).collect_vec();
        let counts = apportion(&sizes, [self.test_size, self.val_size, self.train_size])
            .ok_or_else(|| {
                GraphError::InvalidSplit(format!("cannot distribute {n} rows among the sets"))
            })?;

        let [n_test, n_val, n_train]: [usize; 3] =
            std::array::from_fn(|s| counts.iter().map(|c| c[s]).sum());
        let required = groups.len().max(1);
        raise_error_unless!(
            n_train >= required && n_val >= required && n_test >= required,
            GraphError::InvalidSplit(format!(
                "splitting {n} rows into {n_train}, {n_val} and {n_test} rows leaves a set with fewer than {required} rows"
            ))
        );

        let rng = &mut rng_from_seed(self.seed);
        let mut partition = IndexPartition {
            train: Vec::with_capacity(n_train),
            val: Vec::with_capacity(n_val),
            test: Vec::with_capacity(n_test),
        };

        for (mut members, [test, val, _]) in groups.into_iter().zip(counts) {
            members.shuffle(rng);
            partition.test.extend_from_slice(&members[..test]);
            partition.val.extend_from_slice(&members[test..test + val]);
            partition.train.extend_from_slice(&members[test + val..]);
        }

        partition.train.shuffle(rng);
        partition.val.shuffle(rng);
        partition.test.shuffle(rng);

        debug!(
            "Split {n} rows into {n_train} train, {n_val} validation and {n_test} test rows"
        );

        Ok(partition)
    }

    /// Splits every array into train, validation and test rows (in input order).
    ///
    /// # Errors
    /// Returns [`GraphError::LengthMismatch`] if the arrays do not agree on their number of
    /// rows, and otherwise the errors of [`StratifiedSplit::split_indices`].
    pub fn split_arrays<R, L>(
        &self,
        arrays: &[&R],
        stratify: Option<&[L]>,
    ) -> Result<Vec<SplitRows<R::Output>>>
    where
        R: RowSelect + ?Sized,
        L: Ord + Copy + Into<ClassId>,
    {
        let Some(first) = arrays.first() else {
            return Err(GraphError::Usage(
                "at least one array is required for splitting".into(),
            ));
        };
        let n = first.num_rows();
        if let Some(other) = arrays.iter().find(|a| a.num_rows() != n) {
            return Err(GraphError::LengthMismatch {
                expected: n,
                found: other.num_rows(),
            });
        }

        let partition = self.split_indices(n, stratify)?;
        Ok(arrays.iter().map(|a| partition.select(*a)).collect())
    }

    fn validate(&self) -> Result<()> {
        for (name, size) in [
            ("train_size", self.train_size),
            ("val_size", self.val_size),
            ("test_size", self.test_size),
        ] {
            raise_error_unless!(
                size > 0.0 && size < 1.0,
                GraphError::InvalidSplit(format!("{name} = {size} must be in (0, 1)"))
            );
        }

        let total = self.train_size + self.val_size + self.test_size;
        raise_error_unless!(
            (total - 1.0).abs() <= SIZE_EPS,
            GraphError::InvalidSplit(format!("proportions sum to {total} instead of 1"))
        );
        Ok(())
    }
}

/// Groups the rows `0..n` by their label (in ascending label order).
fn class_members<L>(labels: &[L], n: usize) -> Result<Vec<Vec<usize>>>
where
    L: Ord + Copy + Into<ClassId>,
{
    raise_error_unless!(
        labels.len() == n,
        GraphError::LengthMismatch {
            expected: n,
            found: labels.len(),
        }
    );

    let mut classes: BTreeMap<L, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        classes.entry(label).or_default().push(row);
    }

    if let Some((&class, members)) = classes.iter().find(|(_, members)| members.len() < 2) {
        return Err(GraphError::InsufficientClassMembers {
            class: class.into(),
            found: members.len(),
            required: 2,
        });
    }

    Ok(classes.into_values().collect())
}

#[cfg(test)]
mod test {
    use ndarray::{Array2, array};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn sizes_and_disjointness() {
        for n in [10usize, 17, 100, 257] {
            let partition = StratifiedSplit::default()
                .seed(Some(n as u64))
                .split_indices::<u8>(n, None)
                .unwrap();

            let n_test = (0.2 * n as f64 - SIZE_EPS).ceil() as usize;
            assert_eq!(partition.test.len(), n_test);
            assert_eq!(partition.len(), n);
            assert!(partition.is_disjoint());
            assert!(partition.train.len() >= partition.val.len());
        }
    }

    #[test]
    fn stratification_preserves_proportions() {
        let labels = (0..300).map(|i| if i % 3 == 0 { 1 } else { 0 }).collect_vec();
        let partition = StratifiedSplit::default()
            .seed(Some(1))
            .split_indices(labels.len(), Some(&labels[..]))
            .unwrap();

        assert_eq!(partition.len(), 300);
        assert!(partition.is_disjoint());

        for (set, expected) in [
            (&partition.train, 150),
            (&partition.val, 90),
            (&partition.test, 60),
        ] {
            assert_eq!(set.len(), expected);
            let ones = set.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(ones * 3, expected);
        }
    }

    #[test]
    fn stratification_with_uneven_classes() {
        let rng = &mut Pcg64Mcg::seed_from_u64(23);

        for (train_size, val_size, test_size) in
            [(0.5, 0.3, 0.2), (0.7, 0.2, 0.1), (0.1, 0.1, 0.8), (0.6, 0.25, 0.15)]
        {
            let split = StratifiedSplit::default()
                .train_size(train_size)
                .val_size(val_size)
                .test_size(test_size);

            for _ in 0..50 {
                let num_classes = rng.random_range(2..7);
                let mut labels = (0..num_classes)
                    .flat_map(|class| {
                        let members = rng.random_range(2..60);
                        std::iter::repeat_n(class as ClassId, members)
                    })
                    .collect_vec();
                labels.shuffle(rng);
                let n = labels.len();

                let Ok(partition) = split
                    .seed(Some(rng.random()))
                    .split_indices(n, Some(&labels[..]))
                else {
                    continue;
                };

                assert_eq!(partition.len(), n);
                assert!(partition.is_disjoint());

                let class_sizes = labels.iter().counts();
                for (set, fraction) in [
                    (&partition.train, train_size),
                    (&partition.val, val_size),
                    (&partition.test, test_size),
                ] {
                    assert!((set.len() as f64 - fraction * n as f64).abs() < 1.0);

                    let in_set = set.iter().map(|&i| labels[i]).counts();
                    for (class, &size) in &class_sizes {
                        let count = in_set.get(*class).copied().unwrap_or(0);
                        assert!((count as f64 - fraction * size as f64).abs() <= 1.0);
                    }
                }
            }
        }
    }

    #[test]
    fn seeded_is_reproducible() {
        let split = StratifiedSplit::default().seed(Some(99));
        assert_eq!(
            split.split_indices::<u8>(50, None).unwrap(),
            split.split_indices::<u8>(50, None).unwrap()
        );
    }

    #[test]
    fn split_arrays_in_input_order() {
        let features: Array2<f32> = Array2::from_shape_fn((20, 2), |(i, j)| (i * 2 + j) as f32);
        let ids: Array2<f32> = Array2::from_shape_fn((20, 2), |(i, _)| i as f32);

        let result = StratifiedSplit::default()
            .seed(Some(3))
            .split_arrays::<_, u8>(&[&features, &ids], None)
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].train.nrows(), 10);
        assert_eq!(result[0].val.nrows(), 6);
        assert_eq!(result[0].test.nrows(), 4);

        // both arrays are split with the same partition
        for (row_f, row_i) in result[0].train.rows().into_iter().zip(result[1].train.rows()) {
            assert_eq!(row_f[0], row_i[0] * 2.0);
        }
    }

    #[test]
    fn errors() {
        let short = array![[1.0f32], [2.0]];
        let long = array![[1.0f32], [2.0], [3.0]];
        assert!(matches!(
            StratifiedSplit::default().split_arrays::<_, u8>(&[&long, &short], None),
            Err(GraphError::LengthMismatch {
                expected: 3,
                found: 2
            })
        ));

        assert!(matches!(
            StratifiedSplit::default()
                .test_size(0.0)
                .split_indices::<u8>(10, None),
            Err(GraphError::InvalidSplit(_))
        ));
        assert!(matches!(
            StratifiedSplit::default()
                .train_size(0.7)
                .split_indices::<u8>(10, None),
            Err(GraphError::InvalidSplit(_))
        ));
        assert!(matches!(
            StratifiedSplit::default()
                .train_size(0.3)
                .val_size(0.3)
                .test_size(0.2)
                .split_indices::<u8>(100, None),
            Err(GraphError::InvalidSplit(_))
        ));
        assert!(
            StratifiedSplit::default()
                .train_size(0.7)
                .val_size(0.2)
                .test_size(0.1)
                .split_indices::<u8>(100, None)
                .is_ok()
        );

        let labels = [0, 0, 0, 0, 1];
        assert!(matches!(
            StratifiedSplit::default().split_indices(5, Some(&labels[..])),
            Err(GraphError::InsufficientClassMembers { found: 1, .. })
        ));
    }
}
