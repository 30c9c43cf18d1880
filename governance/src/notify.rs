//! Post-commit notifications for UI consumers.
//!
//! Publishing is best-effort. A failed or unobserved notification never
//! affects the outcome returned to the caller.

use std::sync::Arc;

use accord_types::{Actor, Decision, ProposalId, ProposalStatus, VoteId};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

/// Events emitted after a governance transaction commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ProposalCreated {
        proposal_id: ProposalId,
        title: String,
    },
    VoteRecorded {
        proposal_id: ProposalId,
        vote_id: VoteId,
        actor: Actor,
        decision: Decision,
        status: ProposalStatus,
    },
    StatusChanged {
        proposal_id: ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
    },
}

impl GovernanceEvent {
    pub fn proposal_id(&self) -> &ProposalId {
        match self {
            Self::ProposalCreated { proposal_id, .. }
            | Self::VoteRecorded { proposal_id, .. }
            | Self::StatusChanged { proposal_id, .. } => proposal_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification dropped: {0}")]
    Dropped(String),
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: GovernanceEvent) -> Result<(), NotifyError>;
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn publish(&self, event: GovernanceEvent) -> Result<(), NotifyError> {
        (**self).publish(event)
    }
}

/// Publish without letting a failure escape. Called after commit.
pub(crate) fn publish_best_effort<N: NotificationSink + ?Sized>(sink: &N, event: GovernanceEvent) {
    let proposal_id = *event.proposal_id();
    if let Err(e) = sink.publish(event) {
        tracing::warn!(%proposal_id, error = %e, "notification failed");
    }
}

/// Fans events out to any number of subscribers over a tokio broadcast
/// channel. Slow subscribers lag and lose the oldest events.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for BroadcastNotifier {
    fn publish(&self, event: GovernanceEvent) -> Result<(), NotifyError> {
        // No subscribers is not a failure.
        match self.sender.send(event) {
            Ok(receivers) => tracing::trace!(receivers, "event published"),
            Err(_) => tracing::trace!("event published with no subscribers"),
        }
        Ok(())
    }
}
