//! # Term Clock
//!
//! Protocol time is divided into fixed-length terms. Term 0 is synthetic: it
//! starts one term before the configured first term and never carries
//! randomness. Terms are created lazily and strictly in id order, whenever
//! someone performs the transitions that wall-clock time has made due.
//!
//! ## Randomness
//!
//! A new term records `randomness_block = current block + 1`. Its seed is the
//! hash of that block, which does not exist yet when the term is created, so
//! whoever triggers the transition cannot choose it. The seed is read from
//! the chain the first time it is needed and then stored forever. Before the
//! block is mined, or after its hash has expired, no seed is available and
//! drafting must fail rather than fall back to anything else.

use juris_core::{Amount, BlockNumber, Randomness, TermId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::collaborators::Chain;
use crate::error::CourtError;

/// A protocol term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Sequential id.
    pub id: TermId,
    /// When the term starts.
    pub start_time: Timestamp,
    /// Block whose hash seeds this term.
    pub randomness_block: BlockNumber,
    /// Seed, empty until first computed.
    pub randomness: Randomness,
    /// Stake supply when the term was created.
    pub stake_supply_snapshot: Amount,
}

/// Owner of the term table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtClock {
    term_duration_secs: u64,
    first_term_start_time: Timestamp,
    terms: Vec<Term>,
}

impl CourtClock {
    /// Create the clock with term 0 in place.
    ///
    /// # Errors
    ///
    /// - [`CourtError::ZeroTermDuration`] if `term_duration_secs` is 0.
    /// - [`CourtError::BadFirstTermStartTime`] if `first_term_start_time` is
    ///   earlier than `now` plus one term, which would put term 0 in the past.
    pub fn new(
        term_duration_secs: u64,
        first_term_start_time: Timestamp,
        now: Timestamp,
        stake_supply: Amount,
    ) -> Result<Self, CourtError> {
        if term_duration_secs == 0 {
            return Err(CourtError::ZeroTermDuration);
        }
        let earliest = now.checked_add_secs(term_duration_secs)?;
        if first_term_start_time < earliest {
            return Err(CourtError::BadFirstTermStartTime {
                first: first_term_start_time,
                earliest,
            });
        }
        let term_zero = Term {
            id: TermId::ZERO,
            start_time: first_term_start_time.checked_sub_secs(term_duration_secs)?,
            randomness_block: BlockNumber(0),
            randomness: Randomness::EMPTY,
            stake_supply_snapshot: stake_supply,
        };
        Ok(Self {
            term_duration_secs,
            first_term_start_time,
            terms: vec![term_zero],
        })
    }

    /// Length of a term in seconds.
    pub fn term_duration_secs(&self) -> u64 {
        self.term_duration_secs
    }

    /// Start of term 1.
    pub fn first_term_start_time(&self) -> Timestamp {
        self.first_term_start_time
    }

    /// Last term created. Never forces a transition.
    pub fn current_term_id(&self) -> TermId {
        TermId(self.terms.len().saturating_sub(1) as u64)
    }

    /// A created term.
    pub fn term(&self, id: TermId) -> Option<&Term> {
        usize::try_from(id.0).ok().and_then(|i| self.terms.get(i))
    }

    fn term_zero(&self) -> &Term {
        &self.terms[0]
    }

    /// Transitions that time has made due but nobody has performed.
    pub fn needed_term_transitions(&self, now: Timestamp) -> u64 {
        let start = self.term_zero().start_time;
        if now < start {
            return 0;
        }
        let elapsed = now.secs_since(&start) / self.term_duration_secs;
        elapsed.saturating_sub(self.current_term_id().0)
    }

    /// Create up to `max` due terms. Returns how many were created, which is
    /// 0 when nothing is due or `max` is 0.
    ///
    /// Each new term snapshots `stake_supply` and records
    /// `current_block + 1` as its randomness block.
    pub fn transition(
        &mut self,
        max: u64,
        now: Timestamp,
        current_block: BlockNumber,
        stake_supply: Amount,
    ) -> Result<u64, CourtError> {
        let count = self.needed_term_transitions(now).min(max);
        let term_zero_start = self.term_zero().start_time;
        let mut created = Vec::new();
        let mut id = self.current_term_id();
        for _ in 0..count {
            id = id.next().ok_or(juris_core::ArithmeticError::Overflow { op: "term id" })?;
            let offset = id
                .0
                .checked_mul(self.term_duration_secs)
                .ok_or(juris_core::ArithmeticError::Overflow { op: "term start" })?;
            created.push(Term {
                id,
                start_time: term_zero_start.checked_add_secs(offset)?,
                randomness_block: current_block.successor(),
                randomness: Randomness::EMPTY,
                stake_supply_snapshot: stake_supply,
            });
        }
        self.terms.extend(created);
        Ok(count)
    }

    /// Move the first term start later. Returns the previous start.
    ///
    /// # Errors
    ///
    /// - [`CourtError::CannotDelayStartedCourt`] once term 1 exists or its
    ///   start time has passed.
    /// - [`CourtError::CannotDelayPastStartTime`] unless `new_start` is
    ///   strictly later than the current first term start.
    pub fn delay_start_time(
        &mut self,
        new_start: Timestamp,
        now: Timestamp,
    ) -> Result<Timestamp, CourtError> {
        if self.current_term_id() != TermId::ZERO || self.needed_term_transitions(now) > 0 {
            return Err(CourtError::CannotDelayStartedCourt);
        }
        let previous = self.first_term_start_time;
        if new_start <= previous {
            return Err(CourtError::CannotDelayPastStartTime {
                current: previous,
                requested: new_start,
            });
        }
        self.terms[0].start_time = new_start.checked_sub_secs(self.term_duration_secs)?;
        self.first_term_start_time = new_start;
        Ok(previous)
    }

    /// Seed of `term`, computing it from the chain if not stored yet.
    ///
    /// # Errors
    ///
    /// - [`CourtError::TermNotReached`] if the term does not exist.
    /// - [`CourtError::TermRandomnessNotYetComputed`] if its block is not mined.
    /// - [`CourtError::TermRandomnessUnavailable`] for term 0 or if the block
    ///   hash has expired.
    pub fn randomness_of<C: Chain>(&self, term: TermId, chain: &C) -> Result<Randomness, CourtError> {
        let t = self.term(term).ok_or(CourtError::TermNotReached(term))?;
        if !t.randomness.is_empty() {
            return Ok(t.randomness);
        }
        if t.id == TermId::ZERO {
            return Err(CourtError::TermRandomnessUnavailable {
                term,
                randomness_block: t.randomness_block,
            });
        }
        if chain.block_number() <= t.randomness_block {
            return Err(CourtError::TermRandomnessNotYetComputed {
                term,
                randomness_block: t.randomness_block,
            });
        }
        chain
            .block_hash(t.randomness_block)
            .map(Randomness::from_block_hash)
            .ok_or(CourtError::TermRandomnessUnavailable {
                term,
                randomness_block: t.randomness_block,
            })
    }

    /// Compute and store the seed of `term`.
    ///
    /// # Errors
    ///
    /// As [`CourtClock::randomness_of`].
    pub fn ensure_term_randomness<C: Chain>(
        &mut self,
        term: TermId,
        chain: &C,
    ) -> Result<Randomness, CourtError> {
        let randomness = self.randomness_of(term, chain)?;
        if let Some(t) = usize::try_from(term.0).ok().and_then(|i| self.terms.get_mut(i)) {
            t.randomness = randomness;
        }
        Ok(randomness)
    }
}
