//! Shared harness: an in-memory court with a keeper, a funded subject and a
//! handful of active jurors.

#![allow(dead_code)]

use juris_core::{AccountId, Amount, DisputeId, RoundId, TermId, Timestamp};
use juris_court::{
    commitment_for, Accounting, Court, CourtConfig, InMemoryEnvironment, Outcome,
};

pub const START: i64 = 1_700_000_000;
pub const DAY: u64 = 86_400;
pub const SALT: [u8; 32] = [7u8; 32];

pub fn id(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub court: Court<InMemoryEnvironment>,
}

impl Harness {
    /// Court whose term 0 starts now, so term 1 begins one day later.
    pub fn deploy(configure: impl FnOnce(&mut CourtConfig)) -> Self {
        Self::deploy_starting_in(1, configure)
    }

    /// Court whose first term begins `days` days from now.
    pub fn deploy_starting_in(days: u64, configure: impl FnOnce(&mut CourtConfig)) -> Self {
        init_tracing();
        let now = Timestamp::from_epoch_secs(START).unwrap();
        let env = InMemoryEnvironment::new(now, id("subscriptions"), 30).unwrap();
        let first = now.checked_add_secs(days * DAY).unwrap();
        let mut config = CourtConfig::new(id("governor"), first);
        configure(&mut config);
        let mut harness = Self {
            court: Court::new(config, env).unwrap(),
        };
        harness.fund(&id("subject"), 1_000_000);
        harness
            .court
            .env_mut()
            .subscriptions
            .set_up_to_date(&id("subject"), true);
        harness
    }

    /// Default court with `alice`, `bob` and `carol` staking 1000 each.
    pub fn with_jurors() -> Self {
        let mut harness = Self::deploy(|_| {});
        for juror in ["alice", "bob", "carol"] {
            harness.activate(&id(juror), 1_000);
        }
        harness
    }

    pub fn activate(&mut self, juror: &AccountId, amount: u128) {
        let from = TermId(self.court.current_term_id().0 + 1);
        self.court
            .env_mut()
            .registry
            .activate(juror, Amount::new(amount), from)
            .unwrap();
    }

    pub fn fund(&mut self, account: &AccountId, amount: u128) {
        self.court
            .env_mut()
            .accounting
            .mint(account, Amount::new(amount))
            .unwrap();
    }

    pub fn balance(&self, account: &str) -> Amount {
        self.court.env().accounting.balance_of(&id(account))
    }

    pub fn term(&self) -> TermId {
        self.court.current_term_id()
    }

    /// Move `terms` terms forward.
    pub fn pass_terms(&mut self, terms: u64) {
        self.pass_to(self.term().0 + terms);
    }

    /// Advance a day at a time, performing each due transition and mining
    /// two blocks so every new term's randomness becomes available, until
    /// the current term is `term`.
    pub fn pass_to(&mut self, term: u64) {
        while self.term().0 < term {
            self.court.env_mut().chain.increase_time(DAY).unwrap();
            self.court
                .ensure_term_transitions(&id("keeper"), 1)
                .unwrap();
            self.court.env_mut().chain.advance_blocks(2);
        }
    }

    /// Two-ruling dispute drafted from the next term.
    pub fn raise(&mut self, juror_count: u64) -> DisputeId {
        let draft_term = TermId(self.term().0 + 1);
        self.court
            .create_dispute(&id("subject"), 2, juror_count, draft_term)
            .unwrap()
    }

    pub fn draft_all(&mut self, dispute_id: DisputeId) {
        let round = self.court.dispute(dispute_id).unwrap().last_round().unwrap();
        let remaining = round.remaining_to_draft();
        self.court
            .draft(&id("keeper"), dispute_id, remaining)
            .unwrap();
    }

    /// Raise a dispute, move to its draft term and draft it. Voting opens
    /// in the current term afterwards.
    pub fn raise_and_draft(&mut self, juror_count: u64) -> DisputeId {
        let dispute_id = self.raise(juror_count);
        self.pass_terms(1);
        self.draft_all(dispute_id);
        dispute_id
    }

    pub fn drafted(&self, dispute_id: DisputeId, round_id: RoundId) -> Vec<(AccountId, u64)> {
        let round = self.court.round(dispute_id, round_id).unwrap();
        round
            .juror_order
            .iter()
            .map(|juror| (juror.clone(), round.juror_weight(juror)))
            .collect()
    }

    /// Commit every vote, pass into the reveal window, reveal every vote
    /// and pass out of it. `None` entries commit nothing.
    pub fn vote(&mut self, dispute_id: DisputeId, round_id: RoundId, votes: &[(AccountId, Option<Outcome>)]) {
        for (juror, outcome) in votes {
            if let Some(outcome) = outcome {
                self.court
                    .commit_vote(juror, dispute_id, round_id, commitment_for(*outcome, &SALT))
                    .unwrap();
            }
        }
        self.pass_terms(1);
        for (juror, outcome) in votes {
            if let Some(outcome) = outcome {
                self.court
                    .reveal_vote(juror, dispute_id, round_id, *outcome, &SALT)
                    .unwrap();
            }
        }
        self.pass_terms(1);
    }

    /// Every drafted juror of the round votes `outcome`.
    pub fn unanimous(&mut self, dispute_id: DisputeId, round_id: RoundId, outcome: Outcome) {
        let votes: Vec<_> = self
            .drafted(dispute_id, round_id)
            .into_iter()
            .map(|(juror, _)| (juror, Some(outcome)))
            .collect();
        self.vote(dispute_id, round_id, &votes);
    }

    pub fn settle_all_penalties(&mut self, dispute_id: DisputeId) {
        let rounds = self.court.dispute(dispute_id).unwrap().rounds.len() as u64;
        for round in 0..rounds {
            self.court
                .settle_penalties(&id("keeper"), dispute_id, RoundId(round), 0)
                .unwrap();
        }
    }
}

pub fn ruling_a() -> Outcome {
    Outcome::ruling(0)
}

pub fn ruling_b() -> Outcome {
    Outcome::ruling(1)
}
