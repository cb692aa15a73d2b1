pub mod event;
pub mod handler;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use event::{
    CleanupTrigger, MessageAttribute, NotificationEnvelope, NotificationRecord, PushEvent,
    PushRepository, SnsMessage, ZERO_SHA, classify,
};
pub use handler::handle_notification;
pub use service::{
    ArtifactRegistry, CleanupError, CleanupReport, CleanupService, DeleteFailure, SourceControl,
};
