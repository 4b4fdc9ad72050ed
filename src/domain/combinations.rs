//! Selection subset enumeration.
//!
//! Produces every k-element subset of the selections in lexicographic
//! order over the input order: for [A, B, C] and k = 2 that is
//! AB, AC, BC. Pure and allocation-only.

/// Binomial coefficient C(n, k); zero when k > n.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    // Multiplying before dividing keeps every intermediate exact.
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Enumerates all k-element subsets of `items`.
///
/// Output is deterministic, exhaustive and duplicate-free with exactly
/// `binomial(items.len(), k)` entries. `k == 0` yields one empty subset;
/// `k > items.len()` yields none.
pub fn combinations<T>(items: &[T], k: usize) -> Vec<Vec<&T>> {
    let n = items.len();
    if k > n {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(binomial(n, k));
    let mut indices: Vec<usize> = (0..k).collect();

    loop {
        out.push(indices.iter().map(|&i| &items[i]).collect());

        // Rightmost index that can still move forward.
        let Some(pos) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
            break;
        };
        indices[pos] += 1;
        for j in pos + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }

    out
}
