//! Subcommand execution against a wired governance engine.

use accord_governance::{
    parse_status_filter, EvidenceWriter, GovernanceEngine, GovernanceError, NotificationSink,
    Tally, VoteRequest,
};
use accord_store::ProposalStore;
use serde_json::{json, Value};

/// A governance operation requested on the command line.
#[derive(Clone, Debug, PartialEq, Eq, clap::Subcommand)]
pub enum Command {
    /// Submit a new proposal.
    Propose {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// Cast a vote on a proposal.
    Vote {
        /// Proposal id (64 hex characters).
        id: String,
        /// "human" or "synthient".
        #[arg(long)]
        actor: String,
        /// "approve" or "veto".
        #[arg(long)]
        decision: String,
        #[arg(long)]
        reason: String,
        /// Optional voter label recorded for audit, e.g. "CEO".
        #[arg(long)]
        voter: Option<String>,
    },
    /// Show a proposal with its votes.
    Show { id: String },
    /// List proposals, newest first.
    List {
        /// Only proposals with this status: pending, approved or rejected.
        #[arg(long)]
        status: Option<String>,
    },
    /// Replay vote histories and compare with stored statuses.
    Audit {
        /// Audit one proposal instead of all of them.
        id: Option<String>,
    },
}

pub fn run<S, E, N>(
    engine: &GovernanceEngine<S, E, N>,
    command: Command,
) -> Result<Value, GovernanceError>
where
    S: ProposalStore,
    E: EvidenceWriter + Clone,
    N: NotificationSink + Clone,
{
    let output = match command {
        Command::Propose { title, body } => {
            let proposal = engine.submit_proposal(&title, &body)?;
            json!({ "id": proposal.id, "status": proposal.status })
        }
        Command::Vote {
            id,
            actor,
            decision,
            reason,
            voter,
        } => {
            let mut request = VoteRequest::new(&id, &actor, &decision, &reason);
            request.voter = voter;
            let outcome = engine.cast_vote(&request)?;
            to_json(&outcome)
        }
        Command::Show { id } => {
            let view = engine.get_proposal(&id)?;
            let tally = Tally::from_votes(&view.votes);
            let mut value = to_json(&view);
            value["tally"] = to_json(&tally);
            value
        }
        Command::List { status } => {
            let status = parse_status_filter(status.as_deref())?;
            to_json(&engine.list_proposals(status)?)
        }
        Command::Audit { id: Some(id) } => {
            let finding = engine.audit(&id)?;
            json!({ "consistent": finding.is_consistent(), "finding": finding })
        }
        Command::Audit { id: None } => {
            let report = engine.audit_all()?;
            json!({ "consistent": report.is_consistent(), "report": report })
        }
    };
    Ok(output)
}

/// Error body printed on failure; `status` mirrors the HTTP mapping.
pub fn error_json(err: &GovernanceError) -> Value {
    json!({
        "error": err.to_string(),
        "status": err.http_status(),
        "retryable": err.is_retryable(),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use accord_governance::BroadcastNotifier;
    use accord_governance::JsonlEvidenceWriter;
    use accord_store_lmdb::LmdbEnvironment;
    use accord_types::SystemClock;

    type TestEngine =
        GovernanceEngine<LmdbEnvironment, Arc<JsonlEvidenceWriter>, Arc<BroadcastNotifier>>;

    fn engine(dir: &tempfile::TempDir) -> TestEngine {
        let env = LmdbEnvironment::open(&dir.path().join("db"), 8, 16 * 1024 * 1024).unwrap();
        let evidence = JsonlEvidenceWriter::open(&dir.path().join("evidence.jsonl")).unwrap();
        GovernanceEngine::new(
            Arc::new(env),
            Arc::new(evidence),
            Arc::new(BroadcastNotifier::default()),
            Arc::new(SystemClock),
        )
    }

    fn vote(id: &str, actor: &str, decision: &str) -> Command {
        Command::Vote {
            id: id.to_string(),
            actor: actor.to_string(),
            decision: decision.to_string(),
            reason: "r".to_string(),
            voter: None,
        }
    }

    #[test]
    fn propose_vote_show_flow() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);

        let created = run(
            &engine,
            Command::Propose {
                title: "T".into(),
                body: "B".into(),
            },
        )
        .unwrap();
        assert_eq!(created["status"], "pending");
        let id = created["id"].as_str().unwrap().to_string();

        run(&engine, vote(&id, "human", "approve")).unwrap();
        let outcome = run(&engine, vote(&id, "synthient", "approve")).unwrap();
        assert_eq!(outcome["status"], "approved");
        assert_eq!(outcome["transitioned"], true);

        let shown = run(&engine, Command::Show { id: id.clone() }).unwrap();
        assert_eq!(shown["votes"].as_array().unwrap().len(), 2);
        assert_eq!(shown["tally"]["human_approve"], 1);

        let audit = run(&engine, Command::Audit { id: None }).unwrap();
        assert_eq!(audit["consistent"], true);
    }

    #[test]
    fn list_rejects_unknown_status() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &engine(&dir),
            Command::List {
                status: Some("maybe".into()),
            },
        )
        .unwrap_err();
        assert_eq!(error_json(&err)["status"], 400);
    }

    #[test]
    fn vote_on_unknown_proposal_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&engine(&dir), vote(&"cd".repeat(32), "human", "veto")).unwrap_err();
        let body = error_json(&err);
        assert_eq!(body["status"], 404);
        assert_eq!(body["retryable"], false);
    }
}
