use tracing::{error, info};

use crate::event::{CleanupTrigger, NotificationEnvelope, PushEvent, classify};
use crate::service::{ArtifactRegistry, CleanupError, CleanupReport, CleanupService, SourceControl};

const GITHUB_EVENT_ATTRIBUTE: &str = "X-Github-Event";

/// Consume one notification envelope and run the matching cleanup.
///
/// Single pass, no state retained across invocations. The handler never
/// raises: internal failures end up in the returned status string and the
/// log, while the classification conditions mirror the push-event shapes
/// GitHub emits for branch deletions and tag creations.
pub async fn handle_notification<S: SourceControl, R: ArtifactRegistry>(
    service: &CleanupService<S, R>,
    envelope: &NotificationEnvelope,
) -> String {
    info!("starting package cleanup");

    let Some(record) = envelope.records.first() else {
        info!("cannot find a GitHub event");
        return conclude("End Result: No GitHub event found, nothing was cleaned.".to_string());
    };

    let is_push = record
        .sns
        .message_attributes
        .get(GITHUB_EVENT_ATTRIBUTE)
        .is_some_and(|attr| attr.value == "push");
    if !is_push {
        info!("cannot find a GitHub event");
        return conclude("End Result: No GitHub event found, nothing was cleaned.".to_string());
    }

    let mut status = String::from("End Result: Found GitHub push event");

    let event: PushEvent = match serde_json::from_str(&record.sns.message) {
        Ok(event) => event,
        Err(err) => {
            error!(%err, "failed to decode push payload");
            status.push_str(", but the push payload could not be decoded. Nothing was cleaned.");
            return conclude(status);
        }
    };

    match classify(&event) {
        Some(CleanupTrigger::BranchRemoved { branch }) => {
            status.push_str(&format!(", branch {branch} was removed"));
            info!(%branch, "found relevant event: removal of branch");

            let outcome = service
                .remove_branch_packages(&event.repository.name, &branch)
                .await;
            if run_succeeded(&outcome) {
                info!(%branch, "finished removing all packages of branch");
                status.push_str(", all packages were deleted.");
            } else {
                error!(%branch, "error while removing all packages of branch");
                status.push_str(", encountered an error while deleting all packages.");
            }
        }
        Some(CleanupTrigger::TagCreated { tag }) => {
            status.push_str(&format!(", new tag {tag} was created"));
            info!(%tag, "found relevant event: created new tag");

            let outcome = service
                .remove_tag_snapshots(&event.repository.name, &tag)
                .await;
            if run_succeeded(&outcome) {
                info!(%tag, "finished removing snapshots of tag");
                status.push_str(", all snapshots were deleted.");
            } else {
                error!(%tag, "error while removing snapshots of tag");
                status.push_str(", encountered an error while deleting snapshots.");
            }
        }
        None => {
            info!(git_ref = %event.git_ref, "event matched no cleanup condition");
            status.push_str(", but no condition for further processing was met. Nothing was cleaned.");
        }
    }

    conclude(status)
}

fn run_succeeded(outcome: &Result<CleanupReport, CleanupError>) -> bool {
    match outcome {
        Ok(report) => report.is_complete(),
        Err(err) => {
            error!(%err, "cleanup run aborted");
            false
        }
    }
}

fn conclude(status: String) -> String {
    info!("finished package cleanup");
    info!("{status}");
    status
}
