use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::mail::MailClient;
use crate::clients::newsapi::NewsApiClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{CascadeService, PasswordResetService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub news: Arc<NewsApiClient>,

    pub mail: Arc<MailClient>,

    pub cascades: CascadeService,

    pub password_resets: PasswordResetService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let news = Arc::new(NewsApiClient::new(&config.news)?);
        let mail = Arc::new(MailClient::new(&config.mail)?);

        let cascades = CascadeService::new(store.clone());
        let password_resets =
            PasswordResetService::new(store.clone(), mail.clone(), config.security.clone());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            news,
            mail,
            cascades,
            password_resets,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
