//! Process-wide state, built once at startup and shared as `Arc<AppState>`.
//!
//! Nothing here is mutated after [`AppState::bootstrap`] returns.

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rusqlite::{Connection, InterruptHandle};
use tracing::info;
use uuid::Uuid;
use warden_crypto::aead::Key;
use warden_crypto::password::{self, PasswordParams};
use warden_db::queries::{orgs, settings, users};
use warden_db::DbError;

use crate::config::{AdminConfig, Secrets};
use crate::error::{AdminError, Result};

/// A store handle. Blocking work locks it from a blocking worker.
pub type Db = Arc<tokio::sync::Mutex<Connection>>;

pub struct AppState {
    primary: Db,
    replicas: Vec<Db>,
    db_key: Key,
    token_key: Key,
    password_params: PasswordParams,
    root_org: String,
    root_user: String,
    token_ttl: Duration,
    request_timeout: Duration,
}

/// Root owner credentials. Only returned by the bootstrap that created them.
pub struct RootCredentials {
    pub org: String,
    pub user: String,
    pub api_secret: String,
}

impl std::fmt::Debug for RootCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootCredentials")
            .field("org", &self.org)
            .field("user", &self.user)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl AppState {
    /// Open the store and load the root org, creating it on first start.
    ///
    /// Runs blocking I/O; call it before serving requests.
    pub fn bootstrap(
        config: &AdminConfig,
        secrets: Secrets,
    ) -> Result<(Self, Option<RootCredentials>)> {
        let mut conn = if config.in_memory() {
            warden_db::open_memory()?
        } else {
            warden_db::open(Path::new(&config.storage.database_path))?
        };
        let password_params = config.password_params();

        let (root_org, created) = match settings::get_opt(&conn, settings::ROOT_ORG)? {
            Some(id) => (orgs::read(&conn, &id)?, None),
            None => {
                let org = create_root(&mut conn, &password_params, &secrets.db_key)?;
                let owner = users::read(&conn, &org.owner, &secrets.db_key)?;
                info!(org = %org.id, user = %owner.id, "root org created");
                let credentials = RootCredentials {
                    org: org.id.clone(),
                    user: owner.id,
                    api_secret: owner.api_secret,
                };
                (org, Some(credentials))
            }
        };

        let primary: Db = Arc::new(tokio::sync::Mutex::new(conn));
        let replicas = if config.in_memory() || config.storage.replicas == 0 {
            vec![Arc::clone(&primary)]
        } else {
            (0..config.storage.replicas)
                .map(|_| open_replica(&config.storage.database_path))
                .collect::<Result<Vec<_>>>()?
        };

        info!(
            root_org = %root_org.id,
            replicas = replicas.len(),
            "state ready"
        );

        let state = Self {
            primary,
            replicas,
            db_key: secrets.db_key,
            token_key: secrets.token_key,
            password_params,
            root_user: root_org.owner,
            root_org: root_org.id,
            token_ttl: config.token_ttl(),
            request_timeout: config.request_timeout(),
        };
        Ok((state, created))
    }

    /// Id of the distinguished root org.
    pub fn root_org(&self) -> &str {
        &self.root_org
    }

    /// Id of the root org's owner.
    pub fn root_user(&self) -> &str {
        &self.root_user
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub(crate) fn token_key(&self) -> &Key {
        &self.token_key
    }

    /// The primary store handle; all writes go here.
    pub fn primary(&self) -> &Db {
        &self.primary
    }

    /// A uniformly random read replica. Reads may lag writes.
    pub fn replica(&self) -> &Db {
        self.replicas
            .choose(&mut rand::thread_rng())
            .unwrap_or(&self.primary)
    }

    /// Run `f` in a transaction on the primary, on a blocking worker.
    ///
    /// If the calling future is dropped (a request timeout), the running
    /// statement is interrupted and the transaction rolls back; nothing the
    /// closure wrote is committed.
    pub(crate) async fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &Key) -> warden_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let timeout = self.request_timeout;
        self.on_blocking(&self.primary, move |conn, key, cancelled| {
            let tx = conn.transaction().map_err(DbError::from)?;
            let out = f(&tx, key)?;
            if cancelled.load(Ordering::Acquire) {
                // dropping tx rolls back
                return Err(AdminError::Timeout(timeout));
            }
            tx.commit().map_err(DbError::from)?;
            Ok(out)
        })
        .await
    }

    /// Run `f` against a random replica on a blocking worker.
    pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &Key) -> warden_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.on_blocking(self.replica(), move |conn, key, _| {
            f(conn, key).map_err(AdminError::from)
        })
        .await
    }

    /// Run `f` against the primary without a transaction.
    pub(crate) async fn read_primary<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &Key) -> warden_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.on_blocking(&self.primary, move |conn, key, _| {
            f(conn, key).map_err(AdminError::from)
        })
        .await
    }

    /// Lock `db` (cancellably), then hand the connection to `f` on the
    /// blocking pool.
    async fn on_blocking<T, F>(&self, db: &Db, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection, &Key, &AtomicBool) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = Arc::clone(db).lock_owned().await;
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut abandon = Abandon {
            interrupt: conn.get_interrupt_handle(),
            cancelled: Arc::clone(&cancelled),
            finished: false,
        };
        let key = self.db_key.clone();
        let timeout = self.request_timeout;

        let result = blocking(move || {
            if cancelled.load(Ordering::Acquire) {
                return Err(AdminError::Timeout(timeout));
            }
            f(&mut *conn, &key, &cancelled)
        })
        .await;
        abandon.finished = true;
        result
    }

    /// Derive a password hash on a blocking worker.
    pub(crate) async fn derive_password(&self, cleartext: String) -> Result<String> {
        let params = self.password_params;
        blocking(move || password::derive(&cleartext, &params).map_err(AdminError::from)).await
    }

    /// Bound `fut` by the request timeout. A timed-out call is abandoned.
    pub(crate) async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| AdminError::Timeout(self.request_timeout))?
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AdminError::Worker(e.to_string()))?
}

/// Cancels a store call whose caller went away before it finished.
struct Abandon {
    interrupt: InterruptHandle,
    cancelled: Arc<AtomicBool>,
    finished: bool,
}

impl Drop for Abandon {
    fn drop(&mut self) {
        if !self.finished {
            self.cancelled.store(true, Ordering::Release);
            self.interrupt.interrupt();
            tracing::debug!("store call abandoned");
        }
    }
}

fn create_root(
    conn: &mut Connection,
    params: &PasswordParams,
    key: &Key,
) -> Result<warden_types::Org> {
    let suffix = Uuid::new_v4().simple().to_string();
    let derived = password::derive(&Uuid::new_v4().to_string(), params)?;

    let tx = conn.transaction().map_err(DbError::from)?;
    let org = orgs::insert_with_owner(
        &tx,
        &format!("root-{suffix}"),
        "root",
        &format!("root@{suffix}.invalid"),
        &derived,
        key,
    )?;
    settings::set(&tx, settings::ROOT_ORG, &org.id)?;
    tx.commit().map_err(DbError::from)?;
    Ok(org)
}

fn open_replica(path: &str) -> Result<Db> {
    let conn = warden_db::open(Path::new(path))?;
    conn.execute_batch("PRAGMA query_only = ON;")
        .map_err(DbError::from)?;
    Ok(Arc::new(tokio::sync::Mutex::new(conn)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::Status;

    #[tokio::test]
    async fn test_bootstrap_creates_root() {
        let (state, root) = testing::state();
        assert_eq!(state.root_org(), root.org);
        assert_eq!(state.root_user(), root.user);

        let org_id = root.org.clone();
        let org = state
            .read(move |conn, _| orgs::read(conn, &org_id))
            .await
            .expect("read root org");
        assert_eq!(org.meta.status, Status::Active);
        assert!(org.name.starts_with("root-"));

        let user_id = root.user.clone();
        let user = state
            .read(move |conn, key| users::read(conn, &user_id, key))
            .await
            .expect("read root user");
        assert_eq!(user.api_secret, root.api_secret);
        assert_eq!(user.meta.status, Status::Active);
    }

    #[test]
    fn test_bootstrap_reuses_root() {
        let path = std::env::temp_dir().join(format!("warden-state-{}.db", Uuid::new_v4()));
        let mut config = testing::config();
        config.storage.database_path = path.display().to_string();
        config.storage.replicas = 2;

        let (first, created) = AppState::bootstrap(&config, testing::secrets()).expect("first");
        assert!(created.is_some());
        let root_org = first.root_org().to_string();
        drop(first);

        let (second, created) = AppState::bootstrap(&config, testing::secrets()).expect("second");
        assert!(created.is_none());
        assert_eq!(second.root_org(), root_org);
        assert_eq!(second.replicas.len(), 2);
        drop(second);

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[test]
    fn test_credentials_debug_redacted() {
        let creds = RootCredentials {
            org: "o".to_string(),
            user: "u".to_string(),
            api_secret: "s3cret".to_string(),
        };
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let (state, _) = testing::slow_state(10);
        let result: Result<()> = state
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(AdminError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_abandoned_write_rolls_back() {
        let (state, _) = testing::slow_state(50);

        let result = state
            .bounded(state.write(|conn, _| {
                settings::set(conn, "pending", "written")?;
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            }))
            .await;
        assert!(matches!(result, Err(AdminError::Timeout(_))));

        // queues behind the abandoned call, which still holds the primary
        let value = state
            .read_primary(|conn, _| settings::get_opt(conn, "pending"))
            .await
            .expect("read");
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_write_commits() {
        let (state, _) = testing::state();
        state
            .write(|conn, _| settings::set(conn, "pending", "written"))
            .await
            .expect("write");
        let value = state
            .read(|conn, _| settings::get_opt(conn, "pending"))
            .await
            .expect("read");
        assert_eq!(value.as_deref(), Some("written"));
    }
}
