use super::{
    dates, Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity, Patch, StorageStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub id: EntityId,
    pub team_id: EntityId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    pub created_by: EntityId,
    #[serde(with = "dates")]
    pub created_at: DateTime<Utc>,
}

impl Entity for Announcement {
    const KIND: EntityKind = EntityKind::Announcements;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewAnnouncement {
    pub team_id: EntityId,
    pub title: String,
    pub content: String,
    pub created_by: EntityId,
    pub priority: Option<Priority>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEntity<Announcement> for NewAnnouncement {
    fn build(self, id: EntityId) -> Announcement {
        Announcement {
            id,
            team_id: self.team_id,
            title: self.title,
            content: self.content,
            priority: self.priority.unwrap_or_default(),
            created_by: self.created_by,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub priority: Option<Priority>,
}

impl Patch<Announcement> for AnnouncementPatch {
    fn apply(self, target: &mut Announcement) {
        if let Some(title) = self.title {
            target.title = title;
        }
        if let Some(content) = self.content {
            target.content = content;
        }
        if let Some(priority) = self.priority {
            target.priority = priority;
        }
    }
}

/// Persistence for team announcements.
pub struct AnnouncementStore {
    inner: EntityManager<Announcement>,
}

impl AnnouncementStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<Announcement> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<Announcement> {
        self.inner.get_all().await
    }

    /// All of a team's announcements, newest first.
    pub async fn get_by_team(&self, team_id: EntityId) -> Vec<Announcement> {
        let mut announcements = self.inner.find(|a| a.team_id == team_id).await;
        announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        announcements
    }

    pub async fn get_recent(&self, team_id: EntityId, limit: usize) -> Vec<Announcement> {
        let mut announcements = self.get_by_team(team_id).await;
        announcements.truncate(limit);
        announcements
    }

    pub async fn create(&self, data: NewAnnouncement) -> Announcement {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: AnnouncementPatch) -> Option<Announcement> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    pub fn manager(&self) -> &EntityManager<Announcement> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn posted(team_id: EntityId, title: &str, at: DateTime<Utc>) -> NewAnnouncement {
        NewAnnouncement {
            team_id,
            title: title.to_string(),
            content: "See you there.".to_string(),
            created_by: 1,
            created_at: Some(at),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_priority_defaults_to_normal() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnouncementStore::load(JsonStore::new(dir.path())).await;
        let a = store
            .create(NewAnnouncement {
                team_id: 1,
                title: "Kit collection".to_string(),
                content: "Saturday at the clubhouse.".to_string(),
                created_by: 1,
                ..Default::default()
            })
            .await;
        assert_eq!(a.priority, Priority::Normal);
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnouncementStore::load(JsonStore::new(dir.path())).await;
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        store.create(posted(1, "oldest", base)).await;
        store.create(posted(1, "newest", base + Duration::days(2))).await;
        store.create(posted(2, "elsewhere", base + Duration::days(5))).await;
        store.create(posted(1, "middle", base + Duration::days(1))).await;

        let recent = store.get_recent(1, 2).await;
        let titles: Vec<&str> = recent.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "middle"]);
        assert_eq!(store.get_by_team(1).await.len(), 3);
    }
}
