//! Closed enums driving the dual-consensus rule.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// The class of actor casting a vote.
///
/// Only these two classes participate in consensus. Any finer-grained voter
/// identity ("CEO", an agent name) travels as a separate label on the vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    /// A synthetic agent.
    #[serde(alias = "synthiant")]
    Synthient,
    /// A human reviewer.
    Human,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synthient => "synthient",
            Self::Human => "human",
        }
    }
}

impl FromStr for Actor {
    type Err = TypesError;

    /// Case-insensitive; the legacy spelling `synthiant` maps to `Synthient`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthient" | "synthiant" => Ok(Self::Synthient),
            "human" => Ok(Self::Human),
            _ => Err(TypesError::InvalidActor(s.to_string())),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vote's decision. There is no abstain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Veto,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Veto => "veto",
        }
    }
}

impl FromStr for Decision {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "veto" => Ok(Self::Veto),
            _ => Err(TypesError::InvalidDecision(s.to_string())),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// No veto yet, and dual consensus not reached.
    #[default]
    Pending,
    /// Both a human and a synthient approved, nobody vetoed.
    Approved,
    /// At least one veto. Absorbing.
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the proposal has reached a terminal outcome.
    ///
    /// `Approved` is terminal only in the sense that dual consensus was
    /// reached; a later veto still moves it to `Rejected`.
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl FromStr for ProposalStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(TypesError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_accepts_legacy_spelling() {
        assert_eq!("synthiant".parse::<Actor>(), Ok(Actor::Synthient));
        assert_eq!("Human".parse::<Actor>(), Ok(Actor::Human));
    }

    #[test]
    fn free_text_identity_is_not_an_actor() {
        assert_eq!(
            "CEO".parse::<Actor>(),
            Err(TypesError::InvalidActor("CEO".to_string()))
        );
    }

    #[test]
    fn abstain_is_not_a_decision() {
        assert!("abstain".parse::<Decision>().is_err());
        assert!("".parse::<Decision>().is_err());
        assert_eq!("veto".parse::<Decision>(), Ok(Decision::Veto));
    }

    #[test]
    fn status_defaults_to_pending() {
        assert_eq!(ProposalStatus::default(), ProposalStatus::Pending);
        assert!(!ProposalStatus::Pending.is_decided());
        assert!(ProposalStatus::Rejected.is_decided());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Actor::Synthient).unwrap();
        assert_eq!(json, "\"synthient\"");
        let legacy: Actor = serde_json::from_str("\"synthiant\"").unwrap();
        assert_eq!(legacy, Actor::Synthient);
        let status: ProposalStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(status, ProposalStatus::Approved);
    }
}
