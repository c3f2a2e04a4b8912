use super::{
    dates, Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity, Patch, StorageStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Training,
    Meeting,
    Social,
    Other,
}

/// A team calendar entry other than a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: EntityId,
    pub team_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type: EventKind,
    #[serde(with = "dates")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "dates::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    pub created_by: EntityId,
    #[serde(with = "dates")]
    pub created_at: DateTime<Utc>,
}

impl Entity for Event {
    const KIND: EntityKind = EntityKind::Events;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub team_id: EntityId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub created_by: EntityId,
    pub description: Option<String>,
    pub event_type: Option<EventKind>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn new(
        team_id: EntityId,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        created_by: EntityId,
    ) -> Self {
        Self {
            team_id,
            title: title.into(),
            start_time,
            created_by,
            description: None,
            event_type: None,
            end_time: None,
            location: None,
            created_at: None,
        }
    }
}

impl NewEntity<Event> for NewEvent {
    fn build(self, id: EntityId) -> Event {
        Event {
            id,
            team_id: self.team_id,
            title: self.title,
            description: self.description,
            event_type: self.event_type.unwrap_or_default(),
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            created_by: self.created_by,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub event_type: Option<EventKind>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<Option<DateTime<Utc>>>,
    pub location: Option<Option<String>>,
}

impl Patch<Event> for EventPatch {
    fn apply(self, target: &mut Event) {
        if let Some(title) = self.title {
            target.title = title;
        }
        if let Some(description) = self.description {
            target.description = description;
        }
        if let Some(event_type) = self.event_type {
            target.event_type = event_type;
        }
        if let Some(start_time) = self.start_time {
            target.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            target.end_time = end_time;
        }
        if let Some(location) = self.location {
            target.location = location;
        }
    }
}

/// Persistence for team events.
pub struct EventStore {
    inner: EntityManager<Event>,
}

impl EventStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<Event> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<Event> {
        self.inner.get_all().await
    }

    pub async fn get_by_team(&self, team_id: EntityId) -> Vec<Event> {
        self.inner.find(|e| e.team_id == team_id).await
    }

    pub async fn get_upcoming(&self, team_id: EntityId, limit: usize) -> Vec<Event> {
        self.get_upcoming_at(team_id, limit, Utc::now()).await
    }

    /// Events starting strictly after `now`, soonest first, ties in id order.
    pub async fn get_upcoming_at(
        &self,
        team_id: EntityId,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let mut events = self
            .inner
            .find(|e| e.team_id == team_id && e.start_time > now)
            .await;
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        events.truncate(limit);
        events
    }

    pub async fn create(&self, data: NewEvent) -> Event {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: EventPatch) -> Option<Event> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    pub fn manager(&self) -> &EntityManager<Event> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}
