use proptest::prelude::*;

use accord_types::{Actor, Decision, ProposalId, ProposalStatus, Timestamp, VoteId};

fn any_status() -> impl Strategy<Value = ProposalStatus> {
    prop_oneof![
        Just(ProposalStatus::Pending),
        Just(ProposalStatus::Approved),
        Just(ProposalStatus::Rejected),
    ]
}

proptest! {
    /// ProposalId hex form parses back to the same id.
    #[test]
    fn proposal_id_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = ProposalId::new(bytes);
        prop_assert_eq!(ProposalId::from_hex(&id.to_hex()).unwrap(), id);
    }

    /// VoteId bincode encoding stays the raw 32 bytes.
    #[test]
    fn vote_id_bincode_is_raw_bytes(bytes in prop::array::uniform32(0u8..)) {
        let id = VoteId::new(bytes);
        let encoded = bincode::serialize(&id).unwrap();
        prop_assert_eq!(encoded.as_slice(), &bytes[..]);
        let decoded: VoteId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, id);
    }

    /// Distinct sequence numbers never collide for the same content.
    #[test]
    fn proposal_id_distinct_per_seq(a in 0u64..1_000_000, b in 0u64..1_000_000, title in ".{1,16}") {
        prop_assume!(a != b);
        prop_assert_ne!(
            ProposalId::derive(a, 0, &title, "body"),
            ProposalId::derive(b, 0, &title, "body")
        );
    }

    /// Timestamp ordering follows the millisecond value.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }

    /// Status display text parses back.
    #[test]
    fn status_display_parses(status in any_status()) {
        prop_assert_eq!(status.to_string().parse::<ProposalStatus>().unwrap(), status);
    }
}

#[test]
fn actor_and_decision_display_parse() {
    for actor in [Actor::Synthient, Actor::Human] {
        assert_eq!(actor.to_string().parse::<Actor>().unwrap(), actor);
    }
    for decision in [Decision::Approve, Decision::Veto] {
        assert_eq!(decision.to_string().parse::<Decision>().unwrap(), decision);
    }
}
