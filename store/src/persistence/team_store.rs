use super::{
    generate_join_code, Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity, Patch,
    StorageStatus,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEAM_LOGO: &str = "/default-team-logo.png";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: EntityId,
    pub name: String,
    pub logo: String,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub colors: Option<String>,
    pub join_code: String,
    pub owner_id: EntityId,
}

impl Entity for Team {
    const KIND: EntityKind = EntityKind::Teams;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTeam {
    pub name: String,
    pub owner_id: EntityId,
    pub logo: Option<String>,
    pub division: Option<String>,
    pub founded_year: Option<i32>,
    pub colors: Option<String>,
    /// Generated when absent.
    pub join_code: Option<String>,
}

impl NewEntity<Team> for NewTeam {
    fn build(self, id: EntityId) -> Team {
        Team {
            id,
            name: self.name,
            logo: self.logo.unwrap_or_else(|| DEFAULT_TEAM_LOGO.to_string()),
            division: self.division,
            founded_year: self.founded_year,
            colors: self.colors,
            join_code: self.join_code.unwrap_or_else(generate_join_code),
            owner_id: self.owner_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub division: Option<Option<String>>,
    pub founded_year: Option<Option<i32>>,
    pub colors: Option<Option<String>>,
    pub join_code: Option<String>,
    pub owner_id: Option<EntityId>,
}

impl Patch<Team> for TeamPatch {
    fn apply(self, target: &mut Team) {
        if let Some(name) = self.name {
            target.name = name;
        }
        if let Some(logo) = self.logo {
            target.logo = logo;
        }
        if let Some(division) = self.division {
            target.division = division;
        }
        if let Some(founded_year) = self.founded_year {
            target.founded_year = founded_year;
        }
        if let Some(colors) = self.colors {
            target.colors = colors;
        }
        if let Some(join_code) = self.join_code {
            target.join_code = join_code;
        }
        if let Some(owner_id) = self.owner_id {
            target.owner_id = owner_id;
        }
    }
}

/// Persistence for teams.
pub struct TeamStore {
    inner: EntityManager<Team>,
}

impl TeamStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<Team> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<Team> {
        self.inner.get_all().await
    }

    /// Join codes are matched case-insensitively so users can type them in any case.
    pub async fn get_by_join_code(&self, code: &str) -> Option<Team> {
        let code = code.trim();
        self.inner
            .find_one(|t| t.join_code.eq_ignore_ascii_case(code))
            .await
    }

    pub async fn get_by_owner(&self, owner_id: EntityId) -> Vec<Team> {
        self.inner.find(|t| t.owner_id == owner_id).await
    }

    pub async fn create(&self, data: NewTeam) -> Team {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: TeamPatch) -> Option<Team> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    pub fn manager(&self) -> &EntityManager<Team> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_team(name: &str, owner_id: EntityId) -> NewTeam {
        NewTeam {
            name: name.to_string(),
            owner_id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_defaults_for_logo_and_join_code() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamStore::load(JsonStore::new(dir.path())).await;
        let team = store.create(sample_team("Harbor FC", 1)).await;

        assert_eq!(team.logo, DEFAULT_TEAM_LOGO);
        assert_eq!(team.join_code.len(), 6);
        assert_eq!(team.join_code, team.join_code.to_uppercase());
    }

    #[tokio::test]
    async fn test_get_by_join_code() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamStore::load(JsonStore::new(dir.path())).await;
        let team = store
            .create(NewTeam {
                join_code: Some("HRB123".to_string()),
                ..sample_team("Harbor FC", 1)
            })
            .await;
        store.create(sample_team("Valley United", 2)).await;

        assert_eq!(store.get_by_join_code("hrb123").await, Some(team));
        assert_eq!(store.get_by_join_code("ZZZ999").await, None);
    }

    #[tokio::test]
    async fn test_get_by_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamStore::load(JsonStore::new(dir.path())).await;
        store.create(sample_team("Harbor FC", 1)).await;
        store.create(sample_team("Valley United", 2)).await;
        store.create(sample_team("Harbor FC Reserves", 1)).await;

        let owned = store.get_by_owner(1).await;
        let names: Vec<&str> = owned.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Harbor FC", "Harbor FC Reserves"]);
    }

    #[tokio::test]
    async fn test_update_keeps_unsupplied_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamStore::load(JsonStore::new(dir.path())).await;
        let team = store
            .create(NewTeam {
                division: Some("Second Division".to_string()),
                ..sample_team("Harbor FC", 1)
            })
            .await;

        let updated = store
            .update(
                team.id,
                TeamPatch {
                    logo: Some("/uploads/harbor.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.logo, "/uploads/harbor.png");
        assert_eq!(updated.division.as_deref(), Some("Second Division"));
        assert_eq!(updated.join_code, team.join_code);
    }
}
