//! # Juror Selection
//!
//! Stake-weighted sortition over a term's active-stake snapshot.
//!
//! Each draw index `i` hashes `(seed, i)`, reduces the first 16 bytes of the
//! digest modulo the total active stake, and picks the juror whose
//! cumulative-stake interval contains that point:
//!
//! ```text
//! stakes      [ 100 | 300       | 100 ]
//! cumulative    100   400         500
//! point 250  ───────────▲  → juror 1
//! ```
//!
//! A juror may be picked more than once; each accepted pick adds one unit
//! of weight and locks one more penalty share of their stake. The court
//! passes over a candidate whose unlocked stake cannot cover that share, so
//! a draw index yields at most one pick.
//!
//! Draw indices are global within a round. The round keeps the next index
//! as its draft cursor, so drafting in several batches gives the same panel
//! as drafting in one go.

use juris_core::{AccountId, Amount, DisputeId, Randomness, RoundId, Sha256Accumulator};

/// Draw indices tried per requested juror before a batch is given up.
pub const MAX_DRAW_ATTEMPTS_PER_JUROR: u64 = 64;

/// Cumulative view of the jurors eligible at one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeSnapshot {
    jurors: Vec<AccountId>,
    /// `cumulative[i]` = sum of stakes `0..=i`.
    cumulative: Vec<u128>,
}

impl StakeSnapshot {
    /// Build from `(juror, active stake)` pairs, keeping jurors with at
    /// least `min_active_balance`. Input order does not matter.
    pub fn new(stakes: Vec<(AccountId, Amount)>, min_active_balance: Amount) -> Self {
        let mut eligible: Vec<(AccountId, Amount)> = stakes
            .into_iter()
            .filter(|(_, stake)| !stake.is_zero() && *stake >= min_active_balance)
            .collect();
        eligible.sort_by(|a, b| a.0.cmp(&b.0));

        let mut jurors = Vec::with_capacity(eligible.len());
        let mut cumulative = Vec::with_capacity(eligible.len());
        let mut running: u128 = 0;
        for (juror, stake) in eligible {
            running = running.saturating_add(stake.units());
            jurors.push(juror);
            cumulative.push(running);
        }
        Self { jurors, cumulative }
    }

    /// Sum of eligible stake.
    pub fn total(&self) -> u128 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Number of eligible jurors.
    pub fn len(&self) -> usize {
        self.jurors.len()
    }

    /// Whether nobody is eligible.
    pub fn is_empty(&self) -> bool {
        self.jurors.is_empty()
    }

    /// Juror whose cumulative interval contains `point`.
    pub fn juror_at(&self, point: u128) -> Option<&AccountId> {
        let index = self.cumulative.partition_point(|&c| c <= point);
        self.jurors.get(index)
    }
}

/// Round-specific seed derived from the term seed.
pub fn draft_seed(randomness: &Randomness, dispute: DisputeId, round: RoundId) -> [u8; 32] {
    Sha256Accumulator::new()
        .bytes(randomness.as_bytes())
        .u64(dispute.0)
        .u64(round.0)
        .finish()
}

fn draw_point(seed: &[u8; 32], index: u64, total: u128) -> u128 {
    let digest = Sha256Accumulator::new().bytes(seed).u64(index).finish();
    let mut high = [0u8; 16];
    high.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(high) % total
}

/// Candidates for draw indices `start_index..`, paired with their index.
///
/// The stream is endless unless the snapshot holds no stake, in which case
/// it is empty; callers bound it with [`Iterator::take`].
pub fn candidates<'a>(
    seed: &'a [u8; 32],
    snapshot: &'a StakeSnapshot,
    start_index: u64,
) -> impl Iterator<Item = (u64, &'a AccountId)> + 'a {
    let total = snapshot.total();
    (start_index..)
        .take_while(move |_| total != 0)
        .filter_map(move |i| snapshot.juror_at(draw_point(seed, i, total)).map(|juror| (i, juror)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn snapshot() -> StakeSnapshot {
        StakeSnapshot::new(
            vec![
                (id("carol"), Amount::new(100)),
                (id("alice"), Amount::new(100)),
                (id("bob"), Amount::new(300)),
                (id("dust"), Amount::new(99)),
                (id("zero"), Amount::ZERO),
            ],
            Amount::new(100),
        )
    }

    #[test]
    fn snapshot_filters_and_sorts() {
        let s = snapshot();
        assert_eq!(s.len(), 3);
        assert_eq!(s.total(), 500);
        assert_eq!(s.juror_at(0), Some(&id("alice")));
        assert_eq!(s.juror_at(99), Some(&id("alice")));
        assert_eq!(s.juror_at(100), Some(&id("bob")));
        assert_eq!(s.juror_at(399), Some(&id("bob")));
        assert_eq!(s.juror_at(400), Some(&id("carol")));
        assert_eq!(s.juror_at(499), Some(&id("carol")));
        assert_eq!(s.juror_at(500), None);
    }

    #[test]
    fn empty_snapshot_draws_nothing() {
        let s = StakeSnapshot::new(vec![(id("dust"), Amount::new(5))], Amount::new(100));
        assert!(s.is_empty());
        assert_eq!(candidates(&[1u8; 32], &s, 0).count(), 0);
    }

    fn draw(seed: &[u8; 32], snapshot: &StakeSnapshot, start: u64, count: usize) -> Vec<AccountId> {
        candidates(seed, snapshot, start)
            .take(count)
            .map(|(_, juror)| juror.clone())
            .collect()
    }

    #[test]
    fn draw_is_deterministic() {
        let seed = draft_seed(&Randomness::from_block_hash([9u8; 32]), DisputeId(0), RoundId(0));
        let a = draw(&seed, &snapshot(), 0, 7);
        let b = draw(&seed, &snapshot(), 0, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn candidates_carry_their_draw_index() {
        let seed = [5u8; 32];
        let s = snapshot();
        let indices: Vec<u64> = candidates(&seed, &s, 10).take(3).map(|(i, _)| i).collect();
        assert_eq!(indices, vec![10, 11, 12]);
    }

    #[test]
    fn batched_draw_matches_single_draw() {
        let seed = [3u8; 32];
        let whole = draw(&seed, &snapshot(), 0, 9);
        let mut pieces = draw(&seed, &snapshot(), 0, 4);
        pieces.extend(draw(&seed, &snapshot(), 4, 5));
        assert_eq!(whole, pieces);
    }

    #[test]
    fn seeds_differ_per_round() {
        let r = Randomness::from_block_hash([9u8; 32]);
        assert_ne!(draft_seed(&r, DisputeId(0), RoundId(0)), draft_seed(&r, DisputeId(0), RoundId(1)));
        assert_ne!(draft_seed(&r, DisputeId(0), RoundId(1)), draft_seed(&r, DisputeId(1), RoundId(0)));
    }

    #[test]
    fn heavy_staker_is_drawn_most() {
        let seed = [42u8; 32];
        let mut counts: BTreeMap<AccountId, u64> = BTreeMap::new();
        for juror in draw(&seed, &snapshot(), 0, 2_000) {
            *counts.entry(juror).or_default() += 1;
        }
        let bob = counts[&id("bob")];
        assert!(bob > counts[&id("alice")]);
        assert!(bob > counts[&id("carol")]);
        assert!(!counts.contains_key(&id("dust")));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn weights_sum_to_count(
                stakes in proptest::collection::vec(100u64..10_000, 1..12),
                seed in any::<[u8; 32]>(),
                count in 0usize..64,
            ) {
                let pairs = stakes
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (AccountId::new(format!("juror-{i}")).unwrap(), Amount::from(*s)))
                    .collect();
                let snap = StakeSnapshot::new(pairs, Amount::new(100));
                prop_assert_eq!(draw(&seed, &snap, 0, count).len(), count);
            }
        }
    }
}
