// src/store.rs
//! Durable client-side state: auth credentials and the confirmed device
//! identifier. The two live in separate namespaces so a logout never
//! forgets which device this install was registered as.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;

const AUTH: &str = "auth";
const DEVICE: &str = "device";

const ACCESS_TOKEN: &str = "access_token";
const REFRESH_TOKEN: &str = "refresh_token";
const USER_ID: &str = "user_id";
const USER_EMAIL: &str = "user_email";
const DEVICE_IDENTIFIER: &str = "device_identifier";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>, StoreError>;
    async fn refresh_token(&self) -> Result<Option<String>, StoreError>;
    async fn user_id(&self) -> Result<Option<String>, StoreError>;
    async fn user_email(&self) -> Result<Option<String>, StoreError>;
    async fn save_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError>;
    async fn save_user(&self, user_id: &str, email: &str) -> Result<(), StoreError>;
    /// Drops tokens and user info.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DeviceCache: Send + Sync {
    async fn get(&self) -> Result<Option<String>, StoreError>;
    async fn set(&self, device_identifier: &str) -> Result<(), StoreError>;
}

fn present(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

// ---------- SQLITE ---------- //

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // every in-memory connection is its own database, so keep exactly one alive
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };
        let db = pool.connect_with(opts).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                namespace  TEXT NOT NULL,
                key        TEXT NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )
            "#,
        )
        .execute(&db)
        .await?;

        debug!("opened store at {url}");
        Ok(Self { db })
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    async fn read(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv WHERE namespace=? AND key=?")
            .bind(namespace)
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(present(row.map(|r| r.get::<String, _>("value"))))
    }

    async fn write(&self, namespace: &str, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        for (key, value) in pairs {
            sqlx::query(
                r#"
                INSERT INTO kv (namespace, key, value, updated_at)
                VALUES (?,?,?,?)
                ON CONFLICT(namespace, key) DO UPDATE
                  SET value=EXCLUDED.value,
                      updated_at=EXCLUDED.updated_at
                "#,
            )
            .bind(namespace)
            .bind(*key)
            .bind(*value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn wipe(&self, namespace: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv WHERE namespace=?")
            .bind(namespace)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.read(AUTH, ACCESS_TOKEN).await
    }

    async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.read(AUTH, REFRESH_TOKEN).await
    }

    async fn user_id(&self) -> Result<Option<String>, StoreError> {
        self.read(AUTH, USER_ID).await
    }

    async fn user_email(&self) -> Result<Option<String>, StoreError> {
        self.read(AUTH, USER_EMAIL).await
    }

    async fn save_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        self.write(AUTH, &[(ACCESS_TOKEN, access_token), (REFRESH_TOKEN, refresh_token)])
            .await
    }

    async fn save_user(&self, user_id: &str, email: &str) -> Result<(), StoreError> {
        self.write(AUTH, &[(USER_ID, user_id), (USER_EMAIL, email)]).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.wipe(AUTH).await
    }
}

#[async_trait]
impl DeviceCache for SqliteStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        self.read(DEVICE, DEVICE_IDENTIFIER).await
    }

    async fn set(&self, device_identifier: &str) -> Result<(), StoreError> {
        self.write(DEVICE, &[(DEVICE_IDENTIFIER, device_identifier)]).await
    }
}

// ---------- MEMORY ---------- //

#[derive(Default)]
pub struct MemoryStore {
    auth: RwLock<HashMap<&'static str, String>>,
    device: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(access_token: &str) -> Self {
        Self {
            auth: RwLock::new(HashMap::from([(ACCESS_TOKEN, access_token.to_string())])),
            device: RwLock::default(),
        }
    }

    pub fn with_device(self, device_identifier: &str) -> Self {
        Self {
            device: RwLock::new(Some(device_identifier.to_string())),
            ..self
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        present(self.auth.read().await.get(key).cloned())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read(ACCESS_TOKEN).await)
    }

    async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read(REFRESH_TOKEN).await)
    }

    async fn user_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read(USER_ID).await)
    }

    async fn user_email(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read(USER_EMAIL).await)
    }

    async fn save_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        let mut m = self.auth.write().await;
        m.insert(ACCESS_TOKEN, access_token.to_string());
        m.insert(REFRESH_TOKEN, refresh_token.to_string());
        Ok(())
    }

    async fn save_user(&self, user_id: &str, email: &str) -> Result<(), StoreError> {
        let mut m = self.auth.write().await;
        m.insert(USER_ID, user_id.to_string());
        m.insert(USER_EMAIL, email.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.auth.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl DeviceCache for MemoryStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(present(self.device.read().await.clone()))
    }

    async fn set(&self, device_identifier: &str) -> Result<(), StoreError> {
        *self.device.write().await = Some(device_identifier.to_string());
        Ok(())
    }
}
