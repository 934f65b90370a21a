//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers the court passes around. Terms,
//! disputes and rounds are all counted with plain integers, so the newtypes
//! exist to keep those counters from being mixed up at call sites.
//!
//! `AccountId` names any party the court deals with: jurors, disputers,
//! appealers, the governor, and the collaborator accounts themselves.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_ACCOUNT_ID_LEN: usize = 64;

/// Validated identifier of a party (juror, disputer, governor, pool account).
///
/// Accepts 1..=64 ASCII characters drawn from alphanumerics and `-_:.`, which
/// covers both hex addresses (`0xab12...`) and DID-style names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a validated account identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAccountId`] if the value is empty,
    /// longer than 64 characters, or contains characters outside
    /// `[A-Za-z0-9-_:.]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::InvalidAccountId {
                value,
                reason: "must not be empty",
            });
        }
        if value.len() > MAX_ACCOUNT_ID_LEN {
            return Err(ValidationError::InvalidAccountId {
                value,
                reason: "must be at most 64 characters",
            });
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        {
            return Err(ValidationError::InvalidAccountId {
                value,
                reason: "may only contain ASCII alphanumerics and '-', '_', ':', '.'",
            });
        }
        Ok(Self(value))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequential term number. Term 0 is the synthetic pre-start term.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TermId(pub u64);

impl TermId {
    /// The synthetic term preceding the court's first real term.
    pub const ZERO: TermId = TermId(0);

    /// The raw term number.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The following term, or `None` at `u64::MAX`.
    pub fn next(self) -> Option<TermId> {
        self.0.checked_add(1).map(TermId)
    }

    /// This term shifted forward by `terms`, or `None` on overflow.
    pub fn checked_add(self, terms: u64) -> Option<TermId> {
        self.0.checked_add(terms).map(TermId)
    }

    /// Number of terms from `earlier` to `self`, saturating at zero.
    pub fn saturating_since(self, earlier: TermId) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "term:{}", self.0)
    }
}

/// Sequential dispute number, assigned from 0 in creation order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DisputeId(pub u64);

impl DisputeId {
    /// The raw dispute number.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DisputeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispute:{}", self.0)
    }
}

/// Zero-based index of a round within its dispute.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RoundId(pub u64);

impl RoundId {
    /// The raw round index.
    pub fn value(self) -> u64 {
        self.0
    }

    /// The following round, or `None` at `u64::MAX`.
    pub fn next(self) -> Option<RoundId> {
        self.0.checked_add(1).map(RoundId)
    }

    /// The preceding round, or `None` for round 0.
    pub fn previous(self) -> Option<RoundId> {
        self.0.checked_sub(1).map(RoundId)
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round:{}", self.0)
    }
}

/// Identifier of a vote held by the voting collaborator.
///
/// Derived from `(dispute, round)` by packing the dispute id into the high
/// 64 bits and the round id into the low 64 bits, so distinct rounds never
/// collide and the mapping is reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteId(pub u128);

impl VoteId {
    /// Derive the vote id for a dispute round.
    pub fn for_round(dispute: DisputeId, round: RoundId) -> Self {
        Self((u128::from(dispute.0) << 64) | u128::from(round.0))
    }

    /// Recover the dispute and round this vote belongs to.
    pub fn split(self) -> (DisputeId, RoundId) {
        (DisputeId((self.0 >> 64) as u64), RoundId(self.0 as u64))
    }
}

impl std::fmt::Display for VoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (dispute, round) = self.split();
        write!(f, "vote:{}/{}", dispute.0, round.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_accepts_addresses_and_names() {
        assert!(AccountId::new("0xA1b2C3").is_ok());
        assert!(AccountId::new("juror-1").is_ok());
        assert!(AccountId::new("did:key:z6Mk.x_y").is_ok());
    }

    #[test]
    fn account_id_rejects_empty() {
        let err = AccountId::new("").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn account_id_rejects_overlong() {
        assert!(AccountId::new("a".repeat(64)).is_ok());
        assert!(AccountId::new("a".repeat(65)).is_err());
    }

    #[test]
    fn account_id_rejects_whitespace_and_symbols() {
        assert!(AccountId::new("juror 1").is_err());
        assert!(AccountId::new("juror/1").is_err());
    }

    #[test]
    fn account_id_deserialization_validates() {
        let ok: AccountId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");
        assert!(serde_json::from_str::<AccountId>("\"\"").is_err());
    }

    #[test]
    fn term_id_arithmetic() {
        assert_eq!(TermId(4).next(), Some(TermId(5)));
        assert_eq!(TermId(u64::MAX).next(), None);
        assert_eq!(TermId(4).checked_add(3), Some(TermId(7)));
        assert_eq!(TermId(7).saturating_since(TermId(4)), 3);
        assert_eq!(TermId(4).saturating_since(TermId(7)), 0);
    }

    #[test]
    fn round_id_neighbours() {
        assert_eq!(RoundId(0).previous(), None);
        assert_eq!(RoundId(2).previous(), Some(RoundId(1)));
        assert_eq!(RoundId(2).next(), Some(RoundId(3)));
    }

    #[test]
    fn vote_id_is_unique_per_round_and_reversible() {
        let a = VoteId::for_round(DisputeId(1), RoundId(0));
        let b = VoteId::for_round(DisputeId(0), RoundId(1));
        assert_ne!(a, b);
        assert_eq!(a.split(), (DisputeId(1), RoundId(0)));
        assert_eq!(
            VoteId::for_round(DisputeId(u64::MAX), RoundId(u64::MAX)).split(),
            (DisputeId(u64::MAX), RoundId(u64::MAX))
        );
    }

    #[test]
    fn display_formats() {
        assert_eq!(TermId(3).to_string(), "term:3");
        assert_eq!(DisputeId(9).to_string(), "dispute:9");
        assert_eq!(RoundId(1).to_string(), "round:1");
        assert_eq!(VoteId::for_round(DisputeId(9), RoundId(1)).to_string(), "vote:9/1");
    }
}
