//! Stratified train/test partitioning

use tracing::{debug, warn};

use crate::deterministic::LcgRng;
use crate::errors::{Result, TrainerError};

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of held-out rows: `ceil(test_size * n)` capped at `n - 1`
pub fn test_count(n: usize, test_size: f64) -> usize {
    let wanted = (test_size * n as f64).ceil() as usize;
    wanted.min(n.saturating_sub(1))
}

/// Split encoded labels into train and test partitions
///
/// Per-class test quotas follow the largest-remainder method and every
/// class keeps at least one training row. Both partitions come back in a
/// seeded shuffled order.
pub fn stratified_split(
    labels: &[usize],
    n_classes: usize,
    test_size: f64,
    rng: &mut LcgRng,
) -> Result<SplitIndices> {
    let n = labels.len();
    if n < 2 {
        return Err(TrainerError::InsufficientData(format!(
            "need at least 2 labeled rows to split, got {}",
            n
        )));
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainerError::InvalidConfig(format!(
            "test size must be strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (row, &label) in labels.iter().enumerate() {
        let bucket = by_class.get_mut(label).ok_or_else(|| {
            TrainerError::InvalidConfig(format!(
                "label {} outside {} classes",
                label, n_classes
            ))
        })?;
        bucket.push(row);
    }

    let capacity: Vec<usize> = by_class.iter().map(|rows| rows.len().saturating_sub(1)).collect();
    let mut n_test = test_count(n, test_size);
    let total_capacity: usize = capacity.iter().sum();
    if n_test > total_capacity {
        warn!(
            "Only {} rows can be held out while keeping every class in training (wanted {})",
            total_capacity, n_test
        );
        n_test = total_capacity;
    }

    // Largest remainder: floor each exact share, then hand out the rest
    let mut quotas = vec![0usize; n_classes];
    let mut remainders = Vec::with_capacity(n_classes);
    for (k, rows) in by_class.iter().enumerate() {
        let exact = n_test as f64 * rows.len() as f64 / n as f64;
        quotas[k] = (exact.floor() as usize).min(capacity[k]);
        remainders.push((exact - exact.floor(), k));
    }
    remainders.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut assigned: usize = quotas.iter().sum();
    while assigned < n_test {
        let before = assigned;
        for &(_, k) in &remainders {
            if assigned == n_test {
                break;
            }
            if quotas[k] < capacity[k] {
                quotas[k] += 1;
                assigned += 1;
            }
        }
        if assigned == before {
            break;
        }
    }

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (rows, &quota) in by_class.iter_mut().zip(&quotas) {
        rng.shuffle(rows);
        test.extend_from_slice(&rows[..quota]);
        train.extend_from_slice(&rows[quota..]);
    }
    rng.shuffle(&mut train);
    rng.shuffle(&mut test);

    debug!(
        "Stratified split: {} train / {} test, quotas {:?}",
        train.len(),
        test.len(),
        quotas
    );

    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: &[usize]) -> Vec<usize> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(k, &c)| std::iter::repeat(k).take(c))
            .collect()
    }

    fn class_counts(labels: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; n_classes];
        for &r in rows {
            counts[labels[r]] += 1;
        }
        counts
    }

    #[test]
    fn test_count_rounds_up_and_caps() {
        assert_eq!(test_count(100, 0.2), 20);
        assert_eq!(test_count(11, 0.2), 3);
        assert_eq!(test_count(2, 0.9), 1);
    }

    #[test]
    fn preserves_class_proportions() {
        let y = labels(&[60, 30, 10]);
        let mut rng = LcgRng::new(42);
        let split = stratified_split(&y, 3, 0.2, &mut rng).unwrap();

        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        assert_eq!(class_counts(&y, &split.test, 3), vec![12, 6, 2]);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn largest_remainder_distributes_leftover() {
        // 7 test rows over 5/5/1: exact shares 3.18, 3.18, 0.64
        let y = labels(&[5, 5, 1]);
        let split = stratified_split(&y, 3, 0.6, &mut LcgRng::new(1)).unwrap();
        let counts = class_counts(&y, &split.test, 3);
        assert_eq!(counts.iter().sum::<usize>(), 7);
        // The singleton class stays in training
        assert_eq!(counts[2], 0);
        assert_eq!(class_counts(&y, &split.train, 3)[2], 1);
    }

    #[test]
    fn every_class_keeps_a_training_row() {
        let y = labels(&[2, 2]);
        let split = stratified_split(&y, 2, 0.9, &mut LcgRng::new(5)).unwrap();
        assert_eq!(class_counts(&y, &split.train, 2), vec![1, 1]);
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn same_seed_same_split() {
        let y = labels(&[40, 25]);
        let a = stratified_split(&y, 2, 0.25, &mut LcgRng::new(9)).unwrap();
        let b = stratified_split(&y, 2, 0.25, &mut LcgRng::new(9)).unwrap();
        let c = stratified_split(&y, 2, 0.25, &mut LcgRng::new(10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_bad_input() {
        let mut rng = LcgRng::new(0);
        assert!(matches!(
            stratified_split(&[0], 1, 0.2, &mut rng),
            Err(TrainerError::InsufficientData(_))
        ));
        assert!(matches!(
            stratified_split(&[0, 1], 2, 1.0, &mut rng),
            Err(TrainerError::InvalidConfig(_))
        ));
    }
}
