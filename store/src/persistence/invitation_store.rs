use super::{
    dates, generate_token, Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity,
    Patch, StorageStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Revoked,
}

/// An emailed invitation to join a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invitation {
    pub id: EntityId,
    pub team_id: EntityId,
    pub email: String,
    pub token: String,
    #[serde(default)]
    pub status: InvitationStatus,
    pub invited_by: EntityId,
    #[serde(with = "dates")]
    pub created_at: DateTime<Utc>,
}

impl Entity for Invitation {
    const KIND: EntityKind = EntityKind::Invitations;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewInvitation {
    pub team_id: EntityId,
    pub email: String,
    pub invited_by: EntityId,
    pub token: Option<String>,
}

impl NewEntity<Invitation> for NewInvitation {
    fn build(self, id: EntityId) -> Invitation {
        Invitation {
            id,
            team_id: self.team_id,
            email: self.email,
            token: self.token.unwrap_or_else(generate_token),
            status: InvitationStatus::Pending,
            invited_by: self.invited_by,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvitationPatch {
    pub status: Option<InvitationStatus>,
}

impl Patch<Invitation> for InvitationPatch {
    fn apply(self, target: &mut Invitation) {
        if let Some(status) = self.status {
            target.status = status;
        }
    }
}

/// Persistence for team invitations.
pub struct InvitationStore {
    inner: EntityManager<Invitation>,
}

impl InvitationStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<Invitation> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<Invitation> {
        self.inner.get_all().await
    }

    pub async fn get_by_token(&self, token: &str) -> Option<Invitation> {
        self.inner.find_one(|i| i.token == token).await
    }

    pub async fn get_pending_by_team(&self, team_id: EntityId) -> Vec<Invitation> {
        self.inner
            .find(|i| i.team_id == team_id && i.status == InvitationStatus::Pending)
            .await
    }

    pub async fn create(&self, data: NewInvitation) -> Invitation {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: InvitationPatch) -> Option<Invitation> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    pub fn manager(&self) -> &EntityManager<Invitation> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}
