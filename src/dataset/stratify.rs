//! Iterative stratification for multi-label data
//!
//! **Problem**: single-label stratification keys on one class per sample. With
//! multi-hot labels the label combinations explode and most are unique, so
//! there is no class to stratify on.
//!
//! **Solution**: iterative stratification (Sechidis, Tsoumakas & Vlahavas,
//! 2011). Labels are processed rarest first; each sample carrying the current
//! label goes to the fold that still wants the most occurrences of it.
//!
//! Two changes from the published algorithm:
//! - fold sizes are hard capacities (largest-remainder rounding of
//!   `n * proportion`), so test-fold sizes are exact;
//! - per-label desired counts are scaled by those capacities, keeping the
//!   label targets consistent with the sizes the folds actually get.
//!
//! Balance bound: the first label processed (a label of minimum support) ends
//! with per-fold counts differing by at most one. Later labels are balanced
//! greedily against what earlier steps already placed; the most frequent
//! labels absorb the capacity constraint.

use super::LabelMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Split `n` samples into folds sized by `proportions`.
///
/// Largest-remainder rounding: every fold gets `floor(n * p)`, leftover samples
/// go to the largest fractional parts (lower fold index wins ties).
pub(crate) fn fold_capacities(n: usize, proportions: &[f64]) -> Vec<usize> {
    let total: f64 = proportions.iter().sum();
    #[allow(clippy::cast_precision_loss)]
    let exact: Vec<f64> = proportions.iter().map(|p| n as f64 * p / total).collect();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut capacities: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let assigned: usize = capacities.iter().sum();
    let mut by_remainder: Vec<usize> = (0..proportions.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &fold in by_remainder.iter().take(n.saturating_sub(assigned)) {
        capacities[fold] += 1;
    }
    capacities
}

/// Assign every sample to exactly one fold.
///
/// Returns the member indices of each fold, sorted ascending. Deterministic for
/// a fixed `seed`.
pub(crate) fn iterative_stratification(
    labels: &LabelMatrix,
    proportions: &[f64],
    seed: u64,
) -> Vec<Vec<usize>> {
    let n = labels.n_rows();
    let n_folds = proportions.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut capacity = fold_capacities(n, proportions);
    let supports = labels.supports();

    // desired[l][j]: occurrences of label l fold j still wants
    #[allow(clippy::cast_precision_loss)]
    let mut desired: Vec<Vec<f64>> = supports
        .iter()
        .map(|&support| {
            capacity
                .iter()
                .map(|&c| support as f64 * c as f64 / n as f64)
                .collect()
        })
        .collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let mut remaining = supports;
    let mut assigned = vec![false; n];
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_folds];

    while let Some(label) = rarest_label(&remaining, &mut rng) {
        for &sample in &order {
            if assigned[sample] || !labels.get(sample, label) {
                continue;
            }
            let fold = choose_fold(&capacity, |j| desired[label][j], &mut rng);
            assigned[sample] = true;
            folds[fold].push(sample);
            capacity[fold] -= 1;
            for (l, &positive) in labels.row(sample).iter().enumerate() {
                if positive {
                    desired[l][fold] -= 1.0;
                    remaining[l] -= 1;
                }
            }
        }
    }

    // Unlabelled samples only affect fold sizes
    for &sample in &order {
        if !assigned[sample] {
            let fold = choose_fold(&capacity, |_| 0.0, &mut rng);
            assigned[sample] = true;
            folds[fold].push(sample);
            capacity[fold] -= 1;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

/// Label with the fewest unassigned positive samples; random among ties.
fn rarest_label(remaining: &[usize], rng: &mut StdRng) -> Option<usize> {
    let min = remaining.iter().copied().filter(|&r| r > 0).min()?;
    let tied: Vec<usize> = (0..remaining.len())
        .filter(|&l| remaining[l] == min)
        .collect();
    tied.choose(rng).copied()
}

/// Fold with capacity left maximising `(desire, capacity)`; random among ties.
fn choose_fold(capacity: &[usize], desire: impl Fn(usize) -> f64, rng: &mut StdRng) -> usize {
    let open: Vec<usize> = (0..capacity.len()).filter(|&j| capacity[j] > 0).collect();

    let mut best: Vec<usize> = Vec::with_capacity(open.len());
    for &j in &open {
        match best.first() {
            None => best.push(j),
            Some(&b) => {
                let ordering = desire(j)
                    .total_cmp(&desire(b))
                    .then(capacity[j].cmp(&capacity[b]));
                match ordering {
                    std::cmp::Ordering::Greater => {
                        best.clear();
                        best.push(j);
                    }
                    std::cmp::Ordering::Equal => best.push(j),
                    std::cmp::Ordering::Less => {}
                }
            }
        }
    }

    match best.len() {
        0 => 0,
        1 => best[0],
        len => best[rng.gen_range(0..len)],
    }
}
