use rand::seq::SliceRandom;
use tracing::debug;

use super::*;
use crate::{
    ClassId,
    error::{GraphError, Result},
};

/// Draws `n_per_class` training and `n_per_class` validation nodes from every class
/// `0..=max(labels)`; all remaining nodes form the test set.
///
/// Members of each class are permuted, the first `n_per_class` go to the train set and the
/// next `n_per_class` to the validation set. Train and validation sets are shuffled once more
/// afterwards; the test set is sorted ascending. Nodes with a negative label always end up
/// in the test set.
///
/// With a `seed` the result is reproducible; without one, every call draws a different
/// partition (see the [module documentation](crate::split)).
///
/// # Errors
/// - [`GraphError::InvalidSplit`] if a class id is not smaller than the number of nodes,
/// - [`GraphError::InsufficientClassMembers`] if a class has fewer than `2 * n_per_class`
///   members.
///
/// # Examples
/// ```
/// use attrgraph::split::balanced_split;
///
/// let labels = [0, 0, 0, 0, 1, 1, 1, 1];
/// let partition = balanced_split(&labels, 1, Some(0)).unwrap();
///
/// assert_eq!(partition.train.len(), 2);
/// assert_eq!(partition.val.len(), 2);
/// assert_eq!(partition.test.len(), 4);
/// ```
pub fn balanced_split(
    labels: &[ClassId],
    n_per_class: usize,
    seed: Option<u64>,
) -> Result<IndexPartition> {
    let num_classes = match labels.iter().max() {
        Some(&max) if max >= 0 => max
            .checked_add(1)
            .and_then(|k| usize::try_from(k).ok())
            .filter(|&k| k <= labels.len())
            .ok_or_else(|| {
                GraphError::InvalidSplit(format!(
                    "class {max} exceeds the number of nodes ({})",
                    labels.len()
                ))
            })?,
        _ => 0,
    };

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
    for (node, &label) in labels.iter().enumerate() {
        if label >= 0 {
            members[label as usize].push(node);
        }
    }

    let required = 2 * n_per_class;
    if let Some((class, found)) = members
        .iter()
        .enumerate()
        .find(|(_, m)| m.len() < required)
    {
        return Err(GraphError::InsufficientClassMembers {
            class: class as ClassId,
            found: found.len(),
            required,
        });
    }

    let rng = &mut rng_from_seed(seed);
    let mut train = Vec::with_capacity(n_per_class * num_classes);
    let mut val = Vec::with_capacity(n_per_class * num_classes);
    let mut in_train_or_val = vec![false; labels.len()];

    for mut class_members in members {
        class_members.shuffle(rng);
        train.extend_from_slice(&class_members[..n_per_class]);
        val.extend_from_slice(&class_members[n_per_class..required]);

        for &node in &class_members[..required] {
            in_train_or_val[node] = true;
        }
    }

    train.shuffle(rng);
    val.shuffle(rng);

    let test: Vec<usize> = (0..labels.len())
        .filter(|&node| !in_train_or_val[node])
        .collect();

    debug!(
        "Drew {n_per_class} train and validation nodes for each of {num_classes} classes, {} test nodes remain",
        test.len()
    );

    Ok(IndexPartition { train, val, test })
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn one_per_class() {
        let labels = [0, 0, 0, 0, 1, 1, 1, 1];
        let partition = balanced_split(&labels, 1, Some(42)).unwrap();

        assert_eq!(partition.train.len(), 2);
        assert_eq!(partition.val.len(), 2);
        assert_eq!(partition.test.len(), 4);
        assert!(partition.is_disjoint());
        assert_eq!(partition.len(), labels.len());
        assert!(partition.test.is_sorted());

        for set in [&partition.train, &partition.val] {
            assert_eq!(
                set.iter().map(|&i| labels[i]).sorted().collect_vec(),
                vec![0, 1]
            );
        }
    }

    #[test]
    fn random_labels() {
        let rng = &mut Pcg64Mcg::seed_from_u64(17);

        for _ in 0..20 {
            let num_classes: ClassId = rng.random_range(1..6);
            let n_per_class = rng.random_range(1..5usize);
            let labels = (0..200)
                .map(|_| rng.random_range(0..num_classes))
                .collect_vec();

            let Ok(partition) = balanced_split(&labels, n_per_class, Some(rng.random())) else {
                continue;
            };

            let observed_classes = labels.iter().max().map_or(0, |&c| c as usize + 1);
            assert_eq!(partition.train.len(), n_per_class * observed_classes);
            assert_eq!(partition.val.len(), n_per_class * observed_classes);
            assert_eq!(partition.len(), labels.len());
            assert!(partition.is_disjoint());
        }
    }

    #[test]
    fn seed_is_reproducible() {
        let labels = (0..100).map(|i| (i % 4) as ClassId).collect_vec();
        assert_eq!(
            balanced_split(&labels, 5, Some(1)).unwrap(),
            balanced_split(&labels, 5, Some(1)).unwrap()
        );
    }

    #[test]
    fn unlabelled_nodes_are_tested() {
        let labels = [0, -1, 0, 1, 1, -1];
        let partition = balanced_split(&labels, 1, None).unwrap();
        assert_eq!(partition.test, vec![1, 5]);
    }

    #[test]
    fn insufficient_members() {
        let labels = [0, 0, 0, 0, 1, 2, 2];
        assert!(matches!(
            balanced_split(&labels, 1, Some(0)),
            Err(GraphError::InsufficientClassMembers {
                class: 1,
                found: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn class_ids_beyond_nodes() {
        for labels in [vec![0, 0, ClassId::MAX], vec![0, 1, 5, 1]] {
            assert!(matches!(
                balanced_split(&labels, 1, Some(0)),
                Err(GraphError::InvalidSplit(_))
            ));
        }

        // no labelled node at all
        let partition = balanced_split(&[-1, -3], 1, Some(0)).unwrap();
        assert_eq!(partition.test, vec![0, 1]);
    }
}
