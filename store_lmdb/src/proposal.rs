//! Key layout and read helpers shared by committed reads and write batches.
//!
//! Vote keys are `proposal_id ++ created_at_be ++ seq_be`, so a prefix scan
//! over one proposal yields its votes already in creation order with
//! insertion order on ties.

use std::ops::Bound;

use heed::RoTxn;

use accord_store::proposal::{Proposal, ProposalWithVotes};
use accord_store::vote::Vote;
use accord_store::StoreError;
use accord_types::{ProposalId, Timestamp};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

/// Build the `proposal_order` key: `created_at_be ++ seq_be`.
pub(crate) fn order_key(created_at: Timestamp, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&created_at.as_millis().to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Build the `votes` key: `proposal_id ++ created_at_be ++ seq_be`.
pub(crate) fn vote_key(proposal_id: &ProposalId, created_at: Timestamp, seq: u64) -> [u8; 48] {
    let mut key = [0u8; 48];
    key[..32].copy_from_slice(proposal_id.as_bytes());
    key[32..].copy_from_slice(&order_key(created_at, seq));
    key
}

/// Exclusive upper bound of the key range sharing `prefix`, or `None` when
/// the prefix is all `0xFF` and the range is unbounded above.
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last != 0xFF {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

/// Iterate the raw entries of `votes_db` belonging to one proposal.
fn vote_range<'txn>(
    env: &LmdbEnvironment,
    txn: &'txn RoTxn<'_>,
    id: &ProposalId,
) -> Result<heed::RoRange<'txn, heed::types::Bytes, heed::types::Bytes>, StoreError> {
    let prefix = id.as_bytes().as_slice();
    let upper = prefix_upper_bound(prefix);
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (
        Bound::Included(prefix),
        upper.as_deref().map_or(Bound::Unbounded, Bound::Excluded),
    );
    let iter = env.votes_db.range(txn, &bounds).map_err(LmdbError::from)?;
    Ok(iter)
}

pub(crate) fn id_from_bytes(bytes: &[u8]) -> Result<ProposalId, StoreError> {
    let arr: [u8; 32] = bytes.try_into().map_err(|_| {
        StoreError::Corruption(format!("proposal id has {} bytes, expected 32", bytes.len()))
    })?;
    Ok(ProposalId::new(arr))
}

pub(crate) fn read_proposal(
    env: &LmdbEnvironment,
    txn: &RoTxn<'_>,
    id: &ProposalId,
) -> Result<Option<Proposal>, StoreError> {
    let Some(bytes) = env
        .proposals_db
        .get(txn, id.as_bytes().as_slice())
        .map_err(LmdbError::from)?
    else {
        return Ok(None);
    };
    let proposal: Proposal = bincode::deserialize(bytes).map_err(LmdbError::from)?;
    Ok(Some(proposal))
}

pub(crate) fn read_votes(
    env: &LmdbEnvironment,
    txn: &RoTxn<'_>,
    id: &ProposalId,
) -> Result<Vec<Vote>, StoreError> {
    let iter = vote_range(env, txn, id)?;
    let mut votes = Vec::new();
    for result in iter {
        let (_key, val) = result.map_err(LmdbError::from)?;
        let vote: Vote = bincode::deserialize(val).map_err(LmdbError::from)?;
        votes.push(vote);
    }
    Ok(votes)
}

pub(crate) fn count_votes(
    env: &LmdbEnvironment,
    txn: &RoTxn<'_>,
    id: &ProposalId,
) -> Result<u64, StoreError> {
    let iter = vote_range(env, txn, id)?;
    let mut count = 0u64;
    for result in iter {
        result.map_err(LmdbError::from)?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn read_proposal_with_votes(
    env: &LmdbEnvironment,
    txn: &RoTxn<'_>,
    id: &ProposalId,
) -> Result<ProposalWithVotes, StoreError> {
    let proposal = read_proposal(env, txn, id)?
        .ok_or_else(|| LmdbError::NotFound(format!("proposal {id}")))?;
    let votes = read_votes(env, txn, id)?;
    Ok(ProposalWithVotes { proposal, votes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_drops_trailing_ff() {
        assert_eq!(prefix_upper_bound(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_upper_bound(&[0x01, 0x02]), Some(vec![0x01, 0x03]));
    }

    #[test]
    fn upper_bound_of_all_ff_is_unbounded() {
        assert_eq!(prefix_upper_bound(&[0xFF, 0xFF]), None);
    }

    #[test]
    fn vote_keys_sort_by_time_then_seq() {
        let id = ProposalId::new([7u8; 32]);
        let a = vote_key(&id, Timestamp::from_millis(5), 9);
        let b = vote_key(&id, Timestamp::from_millis(6), 1);
        let c = vote_key(&id, Timestamp::from_millis(6), 2);
        assert!(a < b && b < c);
        assert_eq!(&a[..32], id.as_bytes());
    }

    #[test]
    fn id_from_bytes_rejects_short_slices() {
        assert!(matches!(
            id_from_bytes(&[1, 2, 3]),
            Err(StoreError::Corruption(_))
        ));
    }
}
