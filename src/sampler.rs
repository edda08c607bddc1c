//! Weighted sampling without replacement.

use rand::Rng;

/// Draw `k` distinct items, each draw proportional to the weights of what is
/// still in the pool. Returns the whole pool (input order) when `k >= len`.
///
/// Weights below 1 are treated as 1 so nothing starves.
pub fn weighted_select<T, R, F>(candidates: &[T], weight: F, k: usize, rng: &mut R) -> Vec<T>
where
  T: Clone,
  R: Rng + ?Sized,
  F: Fn(&T) -> u64,
{
  if candidates.is_empty() || k == 0 {
    return Vec::new();
  }
  if k >= candidates.len() {
    return candidates.to_vec();
  }

  let mut pool: Vec<(usize, u64)> = candidates
    .iter()
    .enumerate()
    .map(|(i, c)| (i, weight(c).max(1)))
    .collect();
  let mut picked = Vec::with_capacity(k);

  while picked.len() < k && !pool.is_empty() {
    let total: u64 = pool.iter().map(|(_, w)| *w).sum();
    let mut roll = rng.gen_range(0..total);
    let mut slot = pool.len() - 1;
    for (pos, (_, w)) in pool.iter().enumerate() {
      if roll < *w {
        slot = pos;
        break;
      }
      roll -= w;
    }
    let (idx, _) = pool.swap_remove(slot);
    picked.push(candidates[idx].clone());
  }

  picked
}
