use super::{
    Entity, EntityId, EntityKind, EntityManager, JsonStore, NewEntity, Patch, StorageStatus,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

/// An account. `password` holds the salted hash, never plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default)]
    pub phone: Option<String>,
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::Users;

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
}

impl NewEntity<User> for NewUser {
    fn build(self, id: EntityId) -> User {
        User {
            id,
            username: self.username,
            password: self.password,
            full_name: self.full_name,
            email: self.email,
            avatar: self.avatar.unwrap_or_else(default_avatar),
            phone: self.phone,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<Option<String>>,
    pub avatar: Option<String>,
    pub phone: Option<Option<String>>,
}

impl Patch<User> for UserPatch {
    fn apply(self, target: &mut User) {
        if let Some(username) = self.username {
            target.username = username;
        }
        if let Some(password) = self.password {
            target.password = password;
        }
        if let Some(full_name) = self.full_name {
            target.full_name = full_name;
        }
        if let Some(email) = self.email {
            target.email = email;
        }
        if let Some(avatar) = self.avatar {
            target.avatar = avatar;
        }
        if let Some(phone) = self.phone {
            target.phone = phone;
        }
    }
}

/// Persistence for user accounts.
pub struct UserStore {
    inner: EntityManager<User>,
}

impl UserStore {
    pub async fn load(store: JsonStore) -> Self {
        Self {
            inner: EntityManager::load(store).await,
        }
    }

    pub async fn get(&self, id: EntityId) -> Option<User> {
        self.inner.get(id).await
    }

    pub async fn get_all(&self) -> Vec<User> {
        self.inner.get_all().await
    }

    /// Exact, case-sensitive match.
    pub async fn get_by_username(&self, username: &str) -> Option<User> {
        self.inner.find_one(|u| u.username == username).await
    }

    /// Email addresses compare case-insensitively.
    pub async fn get_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .find_one(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .await
    }

    pub async fn create(&self, data: NewUser) -> User {
        self.inner.create(data).await
    }

    pub async fn update(&self, id: EntityId, patch: UserPatch) -> Option<User> {
        self.inner.update(id, patch).await
    }

    pub async fn delete(&self, id: EntityId) -> bool {
        self.inner.delete(id).await
    }

    pub fn manager(&self) -> &EntityManager<User> {
        &self.inner
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.inner.storage_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "deadbeef.cafe".to_string(),
            full_name: "Alex Morgan".to_string(),
            email: Some(format!("{username}@example.com")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_avatar_filled_in() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(JsonStore::new(dir.path())).await;
        let user = store.create(sample_user("alex")).await;
        assert_eq!(user.avatar, DEFAULT_AVATAR);

        let custom = store
            .create(NewUser {
                avatar: Some("/uploads/sam.png".to_string()),
                ..sample_user("sam")
            })
            .await;
        assert_eq!(custom.avatar, "/uploads/sam.png");
    }

    #[tokio::test]
    async fn test_lookup_by_username_and_email() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(JsonStore::new(dir.path())).await;
        let alex = store.create(sample_user("alex")).await;
        store.create(sample_user("sam")).await;

        assert_eq!(store.get_by_username("alex").await, Some(alex.clone()));
        assert_eq!(store.get_by_username("Alex").await, None);
        assert_eq!(store.get_by_email("ALEX@example.com").await, Some(alex));
        assert_eq!(store.get_by_email("nobody@example.com").await, None);
    }

    #[tokio::test]
    async fn test_patch_can_clear_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(JsonStore::new(dir.path())).await;
        let user = store.create(sample_user("alex")).await;

        let updated = store
            .update(
                user.id,
                UserPatch {
                    email: Some(None),
                    full_name: Some("Alex M.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, None);
        assert_eq!(updated.full_name, "Alex M.");
        assert_eq!(updated.username, "alex");
        assert_eq!(updated.password, user.password);
    }

    #[tokio::test]
    async fn test_missing_avatar_in_file_gets_default() {
        let dir = tempfile::tempdir().unwrap();
        let json_store = JsonStore::new(dir.path());
        std::fs::write(
            json_store.file_path(EntityKind::Users),
            r#"[{"id": 2, "username": "old", "password": "a.b", "full_name": "Old Timer"}]"#,
        )
        .unwrap();

        let store = UserStore::load(json_store).await;
        let user = store.get(2).await.unwrap();
        assert_eq!(user.avatar, DEFAULT_AVATAR);
        assert_eq!(store.create(sample_user("new")).await.id, 3);
    }
}
