use super::{
    dates, Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity, Patch, StorageStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Postponed,
    Cancelled,
}

/// A fixture against another club.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub id: EntityId,
    pub team_id: EntityId,
    pub opponent: String,
    #[serde(with = "dates")]
    pub match_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_is_home")]
    pub is_home: bool,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub goals_for: Option<u32>,
    #[serde(default)]
    pub goals_against: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_is_home() -> bool {
    true
}

impl Entity for Match {
    const KIND: EntityKind = EntityKind::Matches;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub team_id: EntityId,
    pub opponent: String,
    pub match_date: DateTime<Utc>,
    pub location: Option<String>,
    pub is_home: Option<bool>,
    pub status: Option<MatchStatus>,
    pub notes: Option<String>,
}

impl NewMatch {
    pub fn new(team_id: EntityId, opponent: impl Into<String>, match_date: DateTime<Utc>) -> Self {
        Self {
            team_id,
            opponent: opponent.into(),
            match_date,
            location: None,
            is_home: None,
            status: None,
            notes: None,
        }
    }
}

impl NewEntity<Match> for NewMatch {
    fn build(self, id: EntityId) -> Match {
        Match {
            id,
            team_id: self.team_id,
            opponent: self.opponent,
            match_date: self.match_date,
            location: self.location,
            is_home: self.is_home.unwrap_or_else(default_is_home),
            status: self.status.unwrap_or_default(),
            goals_for: None,
            goals_against: None,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchPatch {
    pub opponent: Option<String>,
    pub match_date: Option<DateTime<Utc>>,
    pub location: Option<Option<String>>,
    pub is_home: Option<bool>,
    pub status: Option<MatchStatus>,
    pub goals_for: Option<Option<u32>>,
    pub goals_against: Option<Option<u32>>,
    pub notes: Option<Option<String>>,
}

impl Patch<Match> for MatchPatch {
    fn apply(self, target: &mut Match) {
        if let Some(opponent) = self.opponent {
            target.opponent = opponent;
        }
        if let Some(match_date) = self.match_date {
            target.match_date = match_date;
        }
        if let Some(location) = self.location {
            target.location = location;
        }
        if let Some(is_home) = self.is_home {
            target.is_home = is_home;
        }
        if let Some(status) = self.status {
            target.status = status;
        }
        if let Some(goals_for) = self.goals_for {
            target.goals_for = goals_for;
        }
        if let Some(goals_against) = self.goals_against {
            target.goals_against = goals_against;
        }
        if let Some(notes) = self.notes {
            target.notes = notes;
        }
    }
}

/// Persistence for matches.
pub struct MatchStore {
    inner: EntityManager<Match>,
}

impl MatchStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<Match> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<Match> {
        self.inner.get_all().await
    }

    pub async fn get_by_team(&self, team_id: EntityId) -> Vec<Match> {
        self.inner.find(|m| m.team_id == team_id).await
    }

    /// The team's `limit` latest matches by date, newest first.
    ///
    /// Matches on the same date come out in id order.
    pub async fn get_recent(&self, team_id: EntityId, limit: usize) -> Vec<Match> {
        let mut matches = self.get_by_team(team_id).await;
        matches.sort_by(|a, b| b.match_date.cmp(&a.match_date).then(a.id.cmp(&b.id)));
        matches.truncate(limit);
        matches
    }

    pub async fn get_upcoming(&self, team_id: EntityId, limit: usize) -> Vec<Match> {
        self.get_upcoming_at(team_id, limit, Utc::now()).await
    }

    /// Matches strictly after `now`, soonest first.
    pub async fn get_upcoming_at(
        &self,
        team_id: EntityId,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<Match> {
        let mut matches = self
            .inner
            .find(|m| m.team_id == team_id && m.match_date > now)
            .await;
        matches.sort_by(|a, b| a.match_date.cmp(&b.match_date).then(a.id.cmp(&b.id)));
        matches.truncate(limit);
        matches
    }

    pub async fn create(&self, data: NewMatch) -> Match {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: MatchPatch) -> Option<Match> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    pub fn manager(&self) -> &EntityManager<Match> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}
