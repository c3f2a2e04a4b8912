use super::{
    Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity, Patch, StorageStatus,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Pending,
    Attending,
    NotAttending,
    Maybe,
}

/// One user's answer for one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attendance {
    pub id: EntityId,
    pub event_id: EntityId,
    pub user_id: EntityId,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub note: Option<String>,
}

impl Entity for Attendance {
    const KIND: EntityKind = EntityKind::Attendance;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewAttendance {
    pub event_id: EntityId,
    pub user_id: EntityId,
    pub status: Option<AttendanceStatus>,
    pub note: Option<String>,
}

impl NewEntity<Attendance> for NewAttendance {
    fn build(self, id: EntityId) -> Attendance {
        Attendance {
            id,
            event_id: self.event_id,
            user_id: self.user_id,
            status: self.status.unwrap_or_default(),
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttendancePatch {
    pub status: Option<AttendanceStatus>,
    pub note: Option<Option<String>>,
}

impl Patch<Attendance> for AttendancePatch {
    fn apply(self, target: &mut Attendance) {
        if let Some(status) = self.status {
            target.status = status;
        }
        if let Some(note) = self.note {
            target.note = note;
        }
    }
}

/// Persistence for event attendance responses.
pub struct AttendanceStore {
    inner: EntityManager<Attendance>,
}

impl AttendanceStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<Attendance> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<Attendance> {
        self.inner.get_all().await
    }

    pub async fn get_by_event(&self, event_id: EntityId) -> Vec<Attendance> {
        self.inner.find(|a| a.event_id == event_id).await
    }

    pub async fn get_by_user(&self, user_id: EntityId) -> Vec<Attendance> {
        self.inner.find(|a| a.user_id == user_id).await
    }

    pub async fn get_for(&self, event_id: EntityId, user_id: EntityId) -> Option<Attendance> {
        self.inner
            .find_one(|a| a.event_id == event_id && a.user_id == user_id)
            .await
    }

    /// Record a user's answer, updating their existing row if there is one.
    pub async fn set(
        &self,
        event_id: EntityId,
        user_id: EntityId,
        status: AttendanceStatus,
        note: Option<String>,
    ) -> Attendance {
        let patch = AttendancePatch {
            status: Some(status),
            note: Some(note.clone()),
        };
        let fresh = NewAttendance {
            event_id,
            user_id,
            status: Some(status),
            note,
        };
        self.inner
            .upsert(|a| a.event_id == event_id && a.user_id == user_id, patch, fresh)
            .await
    }

    pub async fn create(&self, data: NewAttendance) -> Attendance {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: AttendancePatch) -> Option<Attendance> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    /// Drop every response for an event. Returns how many were removed.
    pub async fn delete_for_event(&self, event_id: EntityId) -> usize {
        self.inner.delete_many(|a| a.event_id == event_id).await
    }

    pub fn manager(&self) -> &EntityManager<Attendance> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}
