use super::{
    dates, Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity, Patch, StorageStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    #[default]
    Player,
    Captain,
    Coach,
    Admin,
}

/// Links a user to a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: EntityId,
    pub team_id: EntityId,
    pub user_id: EntityId,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(with = "dates")]
    pub joined_at: DateTime<Utc>,
}

impl Entity for TeamMember {
    const KIND: EntityKind = EntityKind::TeamMembers;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTeamMember {
    pub team_id: EntityId,
    pub user_id: EntityId,
    pub role: Option<MemberRole>,
    pub position: Option<String>,
    pub jersey_number: Option<u32>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl NewEntity<TeamMember> for NewTeamMember {
    fn build(self, id: EntityId) -> TeamMember {
        TeamMember {
            id,
            team_id: self.team_id,
            user_id: self.user_id,
            role: self.role.unwrap_or_default(),
            position: self.position,
            jersey_number: self.jersey_number,
            joined_at: self.joined_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamMemberPatch {
    pub role: Option<MemberRole>,
    pub position: Option<Option<String>>,
    pub jersey_number: Option<Option<u32>>,
}

impl Patch<TeamMember> for TeamMemberPatch {
    fn apply(self, target: &mut TeamMember) {
        if let Some(role) = self.role {
            target.role = role;
        }
        if let Some(position) = self.position {
            target.position = position;
        }
        if let Some(jersey_number) = self.jersey_number {
            target.jersey_number = jersey_number;
        }
    }
}

/// Persistence for team memberships.
pub struct MemberStore {
    inner: EntityManager<TeamMember>,
}

impl MemberStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<TeamMember> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<TeamMember> {
        self.inner.get_all().await
    }

    pub async fn get_by_team(&self, team_id: EntityId) -> Vec<TeamMember> {
        self.inner.find(|m| m.team_id == team_id).await
    }

    pub async fn get_by_user(&self, user_id: EntityId) -> Vec<TeamMember> {
        self.inner.find(|m| m.user_id == user_id).await
    }

    pub async fn get_membership(&self, team_id: EntityId, user_id: EntityId) -> Option<TeamMember> {
        self.inner
            .find_one(|m| m.team_id == team_id && m.user_id == user_id)
            .await
    }

    pub async fn create(&self, data: NewTeamMember) -> TeamMember {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: TeamMemberPatch) -> Option<TeamMember> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    pub fn manager(&self) -> &EntityManager<TeamMember> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(team_id: EntityId, user_id: EntityId) -> NewTeamMember {
        NewTeamMember {
            team_id,
            user_id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_role_defaults_to_player() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemberStore::load(JsonStore::new(dir.path())).await;
        let before = Utc::now();
        let member = store.create(membership(1, 2)).await;

        assert_eq!(member.role, MemberRole::Player);
        assert!(member.joined_at >= before);

        let text = std::fs::read_to_string(dir.path().join("team_members.json")).unwrap();
        assert!(text.contains(r#""role": "player""#));
    }

    #[tokio::test]
    async fn test_lookups_by_team_user_and_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemberStore::load(JsonStore::new(dir.path())).await;
        store.create(membership(1, 10)).await;
        store.create(membership(1, 11)).await;
        let coach = store
            .create(NewTeamMember {
                role: Some(MemberRole::Coach),
                ..membership(2, 10)
            })
            .await;

        assert_eq!(store.get_by_team(1).await.len(), 2);
        assert_eq!(store.get_by_user(10).await.len(), 2);
        assert_eq!(store.get_membership(2, 10).await, Some(coach));
        assert_eq!(store.get_membership(2, 11).await, None);
    }

    #[tokio::test]
    async fn test_joined_at_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemberStore::load(JsonStore::new(dir.path())).await;
        let member = store.create(membership(3, 4)).await;

        let reloaded = MemberStore::load(JsonStore::new(dir.path())).await;
        assert_eq!(reloaded.get(member.id).await, Some(member));
    }
}
