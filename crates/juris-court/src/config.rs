//! # Court Configuration
//!
//! [`CourtConfig`] collects every economic and temporal parameter the court
//! runs with. It loads from YAML and is validated once, when the court is
//! constructed; nothing downstream re-checks ranges.
//!
//! ```yaml
//! governor: "0xgov"
//! term_duration_secs: 86400
//! first_term_start_time: "2026-03-01T00:00:00Z"
//! fees: { juror_fee: 10, heartbeat_fee: 20, draft_fee: 30, settle_fee: 40 }
//! round_durations: { commit_terms: 1, reveal_terms: 1, appeal_terms: 1, appeal_confirm_terms: 1 }
//! penalty_pct: 100            # basis points
//! final_round_reduction: 3300 # basis points
//! appeal_step_factor: 3
//! max_regular_appeal_rounds: 3
//! min_active_balance: 100
//! ```

use std::path::Path;

use juris_core::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Denominator for basis-point percentages.
pub const PCT_BASE: u16 = 10_000;

/// Per-unit fees charged for each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Paid to jurors per unit of drafted weight.
    pub juror_fee: Amount,
    /// Paid once per round to whoever transitions into its draft term.
    pub heartbeat_fee: Amount,
    /// Paid to drafters per juror drafted.
    pub draft_fee: Amount,
    /// Paid to penalty settlers per juror settled.
    pub settle_fee: Amount,
}

/// Length of each voting phase, in terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDurations {
    /// Terms jurors have to commit.
    pub commit_terms: u64,
    /// Terms jurors have to reveal.
    pub reveal_terms: u64,
    /// Terms anyone has to appeal.
    pub appeal_terms: u64,
    /// Terms anyone has to confirm an appeal.
    pub appeal_confirm_terms: u64,
}

/// What happens to an appeal deposit when nobody confirms the appeal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnconfirmedAppealPolicy {
    /// Jurors' ruling stands; the appealer gets the deposit back.
    #[default]
    RefundAppealer,
    /// The appealed ruling becomes final; the appealer gets the deposit back.
    AppealedRulingPrevails,
    /// Jurors' ruling stands; the deposit is donated to the subscriptions pool.
    DonateToSubscriptions,
}

/// Full court configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtConfig {
    /// Account allowed to run governance operations.
    pub governor: AccountId,
    /// Length of a term in seconds.
    pub term_duration_secs: u64,
    /// Start of term 1.
    pub first_term_start_time: Timestamp,
    /// Per-unit round fees.
    pub fees: FeeSchedule,
    /// Voting phase lengths.
    pub round_durations: RoundDurations,
    /// Stake locked per drafted weight, in basis points of `min_active_balance`.
    pub penalty_pct: u16,
    /// Final-round fee discount, in basis points.
    pub final_round_reduction: u16,
    /// Juror-count multiplier applied on each appeal.
    pub appeal_step_factor: u64,
    /// Number of regular rounds before the final round.
    pub max_regular_appeal_rounds: u64,
    /// Minimum active stake to be drafted or to vote in a final round.
    pub min_active_balance: Amount,
    /// Appeal deposit multiple of the next round's fees.
    #[serde(default = "default_appeal_collateral_factor")]
    pub appeal_collateral_factor: u64,
    /// Confirmation deposit multiple of the next round's fees.
    #[serde(default = "default_appeal_confirm_collateral_factor")]
    pub appeal_confirm_collateral_factor: u64,
    /// Cap on jurors drafted per call, on top of the caller's own limit.
    #[serde(default)]
    pub max_jurors_per_draft_batch: Option<u64>,
    /// Term transitions an ordinary operation may perform implicitly.
    #[serde(default = "default_max_auto_term_transitions")]
    pub max_auto_term_transitions: u64,
    /// Fixed stake supply snapshotted by every term instead of querying the registry.
    #[serde(default)]
    pub stake_supply_override: Option<Amount>,
    /// Disposition of unconfirmed appeal deposits.
    #[serde(default)]
    pub unconfirmed_appeal_policy: UnconfirmedAppealPolicy,
}

fn default_appeal_collateral_factor() -> u64 {
    3
}

fn default_appeal_confirm_collateral_factor() -> u64 {
    2
}

fn default_max_auto_term_transitions() -> u64 {
    1
}

impl CourtConfig {
    /// Reference parameters: 1-day terms, one-term voting phases, fees
    /// 10/20/30/40, 1% penalty, 33% final-round reduction, step factor 3,
    /// 3 regular rounds, minimum active balance 100.
    pub fn new(governor: AccountId, first_term_start_time: Timestamp) -> Self {
        Self {
            governor,
            term_duration_secs: 86_400,
            first_term_start_time,
            fees: FeeSchedule {
                juror_fee: Amount::new(10),
                heartbeat_fee: Amount::new(20),
                draft_fee: Amount::new(30),
                settle_fee: Amount::new(40),
            },
            round_durations: RoundDurations {
                commit_terms: 1,
                reveal_terms: 1,
                appeal_terms: 1,
                appeal_confirm_terms: 1,
            },
            penalty_pct: 100,
            final_round_reduction: 3_300,
            appeal_step_factor: 3,
            max_regular_appeal_rounds: 3,
            min_active_balance: Amount::new(100),
            appeal_collateral_factor: default_appeal_collateral_factor(),
            appeal_confirm_collateral_factor: default_appeal_confirm_collateral_factor(),
            max_jurors_per_draft_batch: None,
            max_auto_term_transitions: default_max_auto_term_transitions(),
            stake_supply_override: None,
            unconfirmed_appeal_policy: UnconfirmedAppealPolicy::default(),
        }
    }

    /// Parse and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed input and
    /// [`ConfigError::InvalidField`] when a value is out of range.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CourtConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`CourtConfig::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Check every range constraint.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidField`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::InvalidField { field, reason });

        if self.term_duration_secs == 0 {
            return invalid("term_duration_secs", "must be greater than zero");
        }
        let d = &self.round_durations;
        for (field, value) in [
            ("round_durations.commit_terms", d.commit_terms),
            ("round_durations.reveal_terms", d.reveal_terms),
            ("round_durations.appeal_terms", d.appeal_terms),
            ("round_durations.appeal_confirm_terms", d.appeal_confirm_terms),
        ] {
            if value == 0 {
                return invalid(field, "must be greater than zero");
            }
        }
        if self.penalty_pct > PCT_BASE {
            return invalid("penalty_pct", "must be at most 10000 basis points");
        }
        if self.final_round_reduction > PCT_BASE {
            return invalid("final_round_reduction", "must be at most 10000 basis points");
        }
        if self.appeal_step_factor == 0 {
            return invalid("appeal_step_factor", "must be greater than zero");
        }
        if self.max_regular_appeal_rounds == 0 {
            return invalid("max_regular_appeal_rounds", "must be greater than zero");
        }
        if self.min_active_balance.is_zero() {
            return invalid("min_active_balance", "must be greater than zero");
        }
        if self.appeal_collateral_factor == 0 {
            return invalid("appeal_collateral_factor", "must be greater than zero");
        }
        if self.appeal_confirm_collateral_factor == 0 {
            return invalid("appeal_confirm_collateral_factor", "must be greater than zero");
        }
        if self.max_jurors_per_draft_batch == Some(0) {
            return invalid("max_jurors_per_draft_batch", "must be greater than zero when set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
governor: "0xgov"
term_duration_secs: 86400
first_term_start_time: "2026-03-01T00:00:00Z"
fees:
  juror_fee: 10
  heartbeat_fee: "20"
  draft_fee: 30
  settle_fee: 40
round_durations:
  commit_terms: 1
  reveal_terms: 1
  appeal_terms: 1
  appeal_confirm_terms: 1
penalty_pct: 100
final_round_reduction: 3300
appeal_step_factor: 3
max_regular_appeal_rounds: 3
min_active_balance: 100
"#;

    fn gov() -> AccountId {
        AccountId::new("0xgov").unwrap()
    }

    #[test]
    fn yaml_matches_reference_defaults() {
        let parsed = CourtConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(parsed, CourtConfig::new(gov(), parsed.first_term_start_time));
        assert_eq!(parsed.first_term_start_time.to_iso8601(), "2026-03-01T00:00:00Z");
    }

    #[test]
    fn optional_fields_take_defaults() {
        let parsed = CourtConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(parsed.appeal_collateral_factor, 3);
        assert_eq!(parsed.appeal_confirm_collateral_factor, 2);
        assert_eq!(parsed.max_auto_term_transitions, 1);
        assert_eq!(parsed.stake_supply_override, None);
        assert_eq!(
            parsed.unconfirmed_appeal_policy,
            UnconfirmedAppealPolicy::RefundAppealer
        );
    }

    #[test]
    fn policy_parses_snake_case() {
        let yaml = format!("{YAML}unconfirmed_appeal_policy: donate_to_subscriptions\n");
        let parsed = CourtConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(
            parsed.unconfirmed_appeal_policy,
            UnconfirmedAppealPolicy::DonateToSubscriptions
        );
    }

    #[test]
    fn zero_term_duration_rejected() {
        let yaml = YAML.replace("term_duration_secs: 86400", "term_duration_secs: 0");
        let err = CourtConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("term_duration_secs"));
    }

    #[test]
    fn percentages_above_base_rejected() {
        let yaml = YAML.replace("penalty_pct: 100", "penalty_pct: 10001");
        assert!(matches!(
            CourtConfig::from_yaml_str(&yaml),
            Err(ConfigError::InvalidField { field: "penalty_pct", .. })
        ));
    }

    #[test]
    fn zero_phase_length_rejected() {
        let yaml = YAML.replace("reveal_terms: 1", "reveal_terms: 0");
        assert!(matches!(
            CourtConfig::from_yaml_str(&yaml),
            Err(ConfigError::InvalidField { field: "round_durations.reveal_terms", .. })
        ));
    }

    #[test]
    fn zero_draft_batch_cap_rejected() {
        let mut config = CourtConfig::from_yaml_str(YAML).unwrap();
        config.max_jurors_per_draft_batch = Some(0);
        assert!(config.validate().is_err());
        config.max_jurors_per_draft_batch = Some(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            CourtConfig::from_yaml_str("governor: [unterminated"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("court.yaml");
        std::fs::write(&path, YAML).unwrap();
        let config = CourtConfig::load(&path).unwrap();
        assert_eq!(config.min_active_balance, Amount::new(100));

        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            CourtConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
