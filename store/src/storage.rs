//! The single entry point route handlers use to reach persisted data.
//!
//! [`Storage`] owns one store per collection and forwards entity-prefixed
//! calls to them. The only rule it adds is password hashing on user writes.

use crate::config::StorageConfig;
use crate::password;
use crate::persistence::{
    Announcement, AnnouncementPatch, AnnouncementStore, Attendance, AttendanceStatus,
    AttendanceStore, EntityId, EntityKind, Event, EventPatch, EventStore, Invitation,
    InvitationPatch, InvitationStore, JsonStore, Match, MatchPatch, MatchStore, MemberStore,
    NewAnnouncement, NewEvent, NewInvitation, NewMatch, NewTeam, NewTeamMember, NewUser,
    StorageStatus, StoreError, Team, TeamMember, TeamMemberPatch, TeamPatch, TeamStore, User,
    UserPatch, UserStore,
};
use serde_json::Value;

/// Record count and file health for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub kind: EntityKind,
    pub records: usize,
    /// `None` for collections this process only reads.
    pub status: Option<StorageStatus>,
}

pub struct Storage {
    json: JsonStore,
    users: UserStore,
    teams: TeamStore,
    members: MemberStore,
    matches: MatchStore,
    events: EventStore,
    announcements: AnnouncementStore,
    attendance: AttendanceStore,
    invitations: InvitationStore,
}

impl Storage {
    /// Create the data directory and load every collection.
    ///
    /// Never fails: unreadable collections start empty and show up in
    /// [`storage_health`](Self::storage_health).
    #[tracing::instrument(level = "info", skip_all, fields(data_dir = %config.data_dir.display()))]
    pub async fn open(config: StorageConfig) -> Self {
        let json = JsonStore::new(config.data_dir);
        if let Err(e) = json.init_data_directory().await {
            tracing::warn!("Failed to create data directory: {}", e);
        }
        tracing::info!("Using data directory: {}", json.dir().display());

        let (users, teams, members, matches, events, announcements, attendance, invitations) =
            tokio::join!(
                UserStore::load(json.clone()),
                TeamStore::load(json.clone()),
                MemberStore::load(json.clone()),
                MatchStore::load(json.clone()),
                EventStore::load(json.clone()),
                AnnouncementStore::load(json.clone()),
                AttendanceStore::load(json.clone()),
                InvitationStore::load(json.clone()),
            );

        Self {
            json,
            users,
            teams,
            members,
            matches,
            events,
            announcements,
            attendance,
            invitations,
        }
    }

    pub fn data_dir(&self) -> &std::path::Path {
        self.json.dir()
    }

    // ── Users ──────────────────────────────────────────────────────────

    pub async fn get_user(&self, id: EntityId) -> Option<User> {
        self.users.get(id).await
    }

    pub async fn fetch_user(&self, id: EntityId) -> Result<User, StoreError> {
        self.users.manager().fetch(id).await
    }

    pub async fn get_users(&self) -> Vec<User> {
        self.users.get_all().await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users.get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.users.get_by_email(email).await
    }

    /// Plaintext passwords are hashed; values already in `<digest>.<salt>` form are kept.
    pub async fn create_user(&self, mut data: NewUser) -> User {
        data.password = password::ensure_hashed(data.password);
        self.users.create(data).await
    }

    pub async fn update_user(&self, id: EntityId, mut patch: UserPatch) -> Option<User> {
        patch.password = patch.password.map(password::ensure_hashed);
        self.users.update(id, patch).await
    }

    pub async fn delete_user(&self, id: EntityId) -> bool {
        self.users.delete(id).await
    }

    /// Look up `username` and check `candidate` against its stored hash.
    pub async fn verify_user_password(&self, username: &str, candidate: &str) -> Option<User> {
        let user = self.users.get_by_username(username).await?;
        password::verify_password(candidate, &user.password).then_some(user)
    }

    // ── Teams ──────────────────────────────────────────────────────────

    pub async fn get_team(&self, id: EntityId) -> Option<Team> {
        self.teams.get(id).await
    }

    pub async fn fetch_team(&self, id: EntityId) -> Result<Team, StoreError> {
        self.teams.manager().fetch(id).await
    }

    pub async fn get_teams(&self) -> Vec<Team> {
        self.teams.get_all().await
    }

    pub async fn get_team_by_join_code(&self, code: &str) -> Option<Team> {
        self.teams.get_by_join_code(code).await
    }

    pub async fn get_teams_by_owner(&self, owner_id: EntityId) -> Vec<Team> {
        self.teams.get_by_owner(owner_id).await
    }

    pub async fn create_team(&self, data: NewTeam) -> Team {
        self.teams.create(data).await
    }

    pub async fn update_team(&self, id: EntityId, patch: TeamPatch) -> Option<Team> {
        self.teams.update(id, patch).await
    }

    /// Removes only the team record; memberships and fixtures are left in place.
    pub async fn delete_team(&self, id: EntityId) -> bool {
        self.teams.delete(id).await
    }

    // ── Team members ───────────────────────────────────────────────────

    /// All memberships across every team.
    pub async fn get_all_team_members(&self) -> Vec<TeamMember> {
        self.members.get_all().await
    }

    pub async fn get_team_members(&self, team_id: EntityId) -> Vec<TeamMember> {
        self.members.get_by_team(team_id).await
    }

    pub async fn get_user_memberships(&self, user_id: EntityId) -> Vec<TeamMember> {
        self.members.get_by_user(user_id).await
    }

    pub async fn get_team_member(
        &self,
        team_id: EntityId,
        user_id: EntityId,
    ) -> Option<TeamMember> {
        self.members.get_membership(team_id, user_id).await
    }

    pub async fn add_team_member(&self, data: NewTeamMember) -> TeamMember {
        self.members.create(data).await
    }

    pub async fn update_team_member(
        &self,
        id: EntityId,
        patch: TeamMemberPatch,
    ) -> Option<TeamMember> {
        self.members.update(id, patch).await
    }

    pub async fn remove_team_member(&self, id: EntityId) -> bool {
        self.members.delete(id).await
    }

    // ── Matches ────────────────────────────────────────────────────────

    pub async fn get_matches(&self) -> Vec<Match> {
        self.matches.get_all().await
    }

    pub async fn get_match(&self, id: EntityId) -> Option<Match> {
        self.matches.get(id).await
    }

    pub async fn fetch_match(&self, id: EntityId) -> Result<Match, StoreError> {
        self.matches.manager().fetch(id).await
    }

    pub async fn get_matches_by_team(&self, team_id: EntityId) -> Vec<Match> {
        self.matches.get_by_team(team_id).await
    }

    pub async fn get_recent_matches(&self, team_id: EntityId, limit: usize) -> Vec<Match> {
        self.matches.get_recent(team_id, limit).await
    }

    pub async fn get_upcoming_matches(&self, team_id: EntityId, limit: usize) -> Vec<Match> {
        self.matches.get_upcoming(team_id, limit).await
    }

    pub async fn create_match(&self, data: NewMatch) -> Match {
        self.matches.create(data).await
    }

    pub async fn update_match(&self, id: EntityId, patch: MatchPatch) -> Option<Match> {
        self.matches.update(id, patch).await
    }

    pub async fn delete_match(&self, id: EntityId) -> bool {
        self.matches.delete(id).await
    }

    // ── Events ─────────────────────────────────────────────────────────

    pub async fn get_events(&self) -> Vec<Event> {
        self.events.get_all().await
    }

    pub async fn get_event(&self, id: EntityId) -> Option<Event> {
        self.events.get(id).await
    }

    pub async fn fetch_event(&self, id: EntityId) -> Result<Event, StoreError> {
        self.events.manager().fetch(id).await
    }

    pub async fn get_events_by_team(&self, team_id: EntityId) -> Vec<Event> {
        self.events.get_by_team(team_id).await
    }

    pub async fn get_upcoming_events(&self, team_id: EntityId, limit: usize) -> Vec<Event> {
        self.events.get_upcoming(team_id, limit).await
    }

    pub async fn create_event(&self, data: NewEvent) -> Event {
        self.events.create(data).await
    }

    pub async fn update_event(&self, id: EntityId, patch: EventPatch) -> Option<Event> {
        self.events.update(id, patch).await
    }

    pub async fn delete_event(&self, id: EntityId) -> bool {
        self.events.delete(id).await
    }

    // ── Announcements ──────────────────────────────────────────────────

    pub async fn get_announcements(&self) -> Vec<Announcement> {
        self.announcements.get_all().await
    }

    pub async fn get_announcement(&self, id: EntityId) -> Option<Announcement> {
        self.announcements.get(id).await
    }

    pub async fn get_announcements_by_team(&self, team_id: EntityId) -> Vec<Announcement> {
        self.announcements.get_by_team(team_id).await
    }

    pub async fn get_recent_announcements(
        &self,
        team_id: EntityId,
        limit: usize,
    ) -> Vec<Announcement> {
        self.announcements.get_recent(team_id, limit).await
    }

    pub async fn create_announcement(&self, data: NewAnnouncement) -> Announcement {
        self.announcements.create(data).await
    }

    pub async fn update_announcement(
        &self,
        id: EntityId,
        patch: AnnouncementPatch,
    ) -> Option<Announcement> {
        self.announcements.update(id, patch).await
    }

    pub async fn delete_announcement(&self, id: EntityId) -> bool {
        self.announcements.delete(id).await
    }

    // ── Attendance ─────────────────────────────────────────────────────

    pub async fn get_all_attendance(&self) -> Vec<Attendance> {
        self.attendance.get_all().await
    }

    pub async fn get_event_attendance(&self, event_id: EntityId) -> Vec<Attendance> {
        self.attendance.get_by_event(event_id).await
    }

    pub async fn get_user_attendance(&self, user_id: EntityId) -> Vec<Attendance> {
        self.attendance.get_by_user(user_id).await
    }

    pub async fn get_attendance(
        &self,
        event_id: EntityId,
        user_id: EntityId,
    ) -> Option<Attendance> {
        self.attendance.get_for(event_id, user_id).await
    }

    pub async fn set_attendance(
        &self,
        event_id: EntityId,
        user_id: EntityId,
        status: AttendanceStatus,
        note: Option<String>,
    ) -> Attendance {
        self.attendance.set(event_id, user_id, status, note).await
    }

    pub async fn delete_attendance(&self, id: EntityId) -> bool {
        self.attendance.delete(id).await
    }

    pub async fn delete_event_attendance(&self, event_id: EntityId) -> usize {
        self.attendance.delete_for_event(event_id).await
    }

    // ── Invitations ────────────────────────────────────────────────────

    pub async fn get_invitations(&self) -> Vec<Invitation> {
        self.invitations.get_all().await
    }

    pub async fn get_invitation(&self, id: EntityId) -> Option<Invitation> {
        self.invitations.get(id).await
    }

    pub async fn get_invitation_by_token(&self, token: &str) -> Option<Invitation> {
        self.invitations.get_by_token(token).await
    }

    pub async fn get_pending_invitations(&self, team_id: EntityId) -> Vec<Invitation> {
        self.invitations.get_pending_by_team(team_id).await
    }

    pub async fn create_invitation(&self, data: NewInvitation) -> Invitation {
        self.invitations.create(data).await
    }

    pub async fn update_invitation(
        &self,
        id: EntityId,
        patch: InvitationPatch,
    ) -> Option<Invitation> {
        self.invitations.update(id, patch).await
    }

    pub async fn delete_invitation(&self, id: EntityId) -> bool {
        self.invitations.delete(id).await
    }

    // ── Health ─────────────────────────────────────────────────────────

    /// File status of every collection this facade writes.
    pub async fn storage_health(&self) -> Vec<(EntityKind, StorageStatus)> {
        vec![
            (EntityKind::Users, self.users.storage_status().await),
            (EntityKind::Teams, self.teams.storage_status().await),
            (EntityKind::TeamMembers, self.members.storage_status().await),
            (EntityKind::Matches, self.matches.storage_status().await),
            (EntityKind::Events, self.events.storage_status().await),
            (
                EntityKind::Announcements,
                self.announcements.storage_status().await,
            ),
            (EntityKind::Attendance, self.attendance.storage_status().await),
            (EntityKind::Invitations, self.invitations.storage_status().await),
        ]
    }

    /// Record counts for every known collection, including ones with no store here.
    pub async fn collection_summary(&self) -> Vec<CollectionSummary> {
        let health = self.storage_health().await;
        let mut summary = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let status = health
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, s)| s.clone());
            let records = match kind {
                EntityKind::Users => self.users.manager().count().await,
                EntityKind::Teams => self.teams.manager().count().await,
                EntityKind::TeamMembers => self.members.manager().count().await,
                EntityKind::Matches => self.matches.manager().count().await,
                EntityKind::Events => self.events.manager().count().await,
                EntityKind::Announcements => self.announcements.manager().count().await,
                EntityKind::Attendance => self.attendance.manager().count().await,
                EntityKind::Invitations => self.invitations.manager().count().await,
                other => self.json.load_data::<Value>(other).await.len(),
            };
            summary.push(CollectionSummary {
                kind,
                records,
                status,
            });
        }
        summary
    }
}
