mod announcement_store;
mod attendance_store;
pub mod dates;
mod entity_kind;
mod entity_manager;
mod event_store;
mod invitation_store;
mod json_store;
mod match_store;
mod member_store;
mod team_store;
mod user_store;

pub use entity_kind::EntityKind;
pub use entity_manager::{Entity, EntityId, EntityManager, NewEntity, Patch, StorageStatus};
pub use json_store::{JsonStore, LoadedCollection};

pub use announcement_store::{
    Announcement, AnnouncementPatch, AnnouncementStore, NewAnnouncement, Priority,
};
pub use attendance_store::{
    Attendance, AttendancePatch, AttendanceStatus, AttendanceStore, NewAttendance,
};
pub use event_store::{Event, EventKind, EventPatch, EventStore, NewEvent};
pub use invitation_store::{
    Invitation, InvitationPatch, InvitationStatus, InvitationStore, NewInvitation,
};
pub use match_store::{Match, MatchPatch, MatchStatus, MatchStore, NewMatch};
pub use member_store::{MemberRole, MemberStore, NewTeamMember, TeamMember, TeamMemberPatch};
pub use team_store::{NewTeam, Team, TeamPatch, TeamStore};
pub use user_store::{NewUser, User, UserPatch, UserStore};

use std::path::PathBuf;

/// Errors from the durable file layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} is not a JSON array")]
    NotAnArray(PathBuf),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Lookup errors for callers that want to tell a missing record apart from
/// a collection whose backing file could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} record {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },
    #[error("{kind} storage unavailable: {reason}")]
    StorageUnavailable { kind: EntityKind, reason: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Generate a short uppercase code, used for team join codes.
pub fn generate_join_code() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase()
}

/// Generate an opaque token for invitations.
pub fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
