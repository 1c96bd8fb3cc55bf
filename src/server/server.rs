use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::{anyhow, bail};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// How the session token travels in the `Cookie` header.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub post_service: Arc<dyn PostService>,
    pub session_cookie: Arc<SessionCookie>,
    pool: Option<MySqlPool>,
}

struct Stores {
    user_repo: Arc<dyn UserRepo>,
    post_repo: Arc<dyn PostRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl Stores {
    fn memory() -> Self {
        let store = MemoryStore::new();
        Stores {
            user_repo: Arc::new(MemoryUserRepo::new(store.clone())),
            post_repo: Arc::new(MemoryPostRepo::new(store.clone())),
            tx_manager: Arc::new(MemoryTxManager::new(store)),
        }
    }

    fn mysql(pool: MySqlPool) -> Self {
        Stores {
            user_repo: Arc::new(MySqlUserRepo::new(pool.clone())),
            post_repo: Arc::new(MySqlPostRepo::new(pool.clone())),
            tx_manager: Arc::new(MySqlTxManager::new(pool)),
        }
    }
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let (stores, pool) = match settings.store.backend.as_str() {
            "memory" => {
                warn!("using in-memory store, data is lost on exit");
                (Stores::memory(), None)
            }
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.mysql_dsn is required for the mysql backend"))?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(settings.store.max_connections)
                    .connect(dsn)
                    .await?;
                (Stores::mysql(pool.clone()), Some(pool))
            }
            other => bail!("Unknown store backend: {}", other),
        };

        let revocations: Arc<dyn SessionRevocationStore> =
            match settings.session.backend.as_str() {
                "memory" => Arc::new(MemorySessionRevocationStore::new()),
                "redis" => {
                    let dsn = settings.session.redis_dsn.as_deref().ok_or_else(|| {
                        anyhow!("session.redis_dsn is required for the redis backend")
                    })?;
                    let redis_client = redis::Client::open(dsn)?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    Arc::new(RedisSessionRevocationStore::new(
                        redis_manager,
                        settings.session.redis_prefix.clone(),
                    ))
                }
                other => bail!("Unknown session backend: {}", other),
            };

        if settings.session.signing_key.is_empty() {
            bail!("session.signing_key must not be empty");
        }
        let session_config = SessionConfig {
            issuer: settings.session.issuer.clone(),
            audience: settings.session.audience.clone(),
            ttl: Duration::from_secs(settings.session.ttl_secs),
            signing_key: settings.session.signing_key.clone().into_bytes(),
        };
        let session_cookie = SessionCookie {
            name: settings.session.cookie_name.clone(),
            max_age_secs: settings.session.ttl_secs,
            secure: settings.http.cert_path.is_some(),
        };

        let server = Self::assemble(stores, revocations, session_config, session_cookie, pool);
        info!("server started");
        Ok(server)
    }

    /// Everything in process memory. Used by tests and local demos.
    pub fn in_memory(session_config: SessionConfig, session_cookie: SessionCookie) -> Self {
        Self::assemble(
            Stores::memory(),
            Arc::new(MemorySessionRevocationStore::new()),
            session_config,
            session_cookie,
            None,
        )
    }

    fn assemble(
        stores: Stores,
        revocations: Arc<dyn SessionRevocationStore>,
        session_config: SessionConfig,
        session_cookie: SessionCookie,
        pool: Option<MySqlPool>,
    ) -> Self {
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let session_manager: Arc<dyn SessionManager> =
            Arc::new(JwtSessionManager::new(session_config, revocations));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            stores.user_repo,
            credential_hasher,
            session_manager,
            stores.tx_manager.clone(),
        ));
        let post_service: Arc<dyn PostService> =
            Arc::new(RealPostService::new(stores.post_repo, stores.tx_manager));

        Self {
            auth_service,
            post_service,
            session_cookie: Arc::new(session_cookie),
            pool,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
