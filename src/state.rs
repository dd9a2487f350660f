use crate::{
    config::{DbConfig, RuntimeConfiguration, StoreBackend},
    error::{MigrateSnafu, OpenDatabaseSnafu, RosterResult},
    routes::sse::SseEvent,
    service::RosterService,
    store::{MemoryStudentStore, PgStudentStore, StudentStore},
};
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;

#[derive(Clone, Debug)]
pub struct RosterState {
    roster: RosterService,
    store: Arc<dyn StudentStore>,
    config: RuntimeConfiguration,
}

impl RosterState {
    pub async fn new(options: PgPoolOptions, config: RuntimeConfiguration) -> RosterResult<Self> {
        let store: Arc<dyn StudentStore> = match config.store_backend() {
            StoreBackend::Postgres => {
                let db_config = DbConfig::new()?;
                let pool = options
                    .connect(&db_config.get_db_path())
                    .await
                    .context(OpenDatabaseSnafu)?;

                sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

                Arc::new(PgStudentStore::new(pool))
            }
            StoreBackend::Memory => {
                warn!("Using the in-memory store, nothing will survive a restart");
                Arc::new(MemoryStudentStore::default())
            }
        };

        Ok(Self::from_store(store, config))
    }

    pub fn from_store(store: Arc<dyn StudentStore>, config: RuntimeConfiguration) -> Self {
        Self {
            roster: RosterService::new(store.clone()),
            store,
            config,
        }
    }

    #[allow(clippy::unused_self, clippy::needless_pass_by_value)] //in case self is ever needed :), and to allow direct html! usage
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://unpkg.com/htmx-ext-sse@2.2.3" integrity="sha384-Y4gc0CK6Kg+hmulDc6rZPJu0tqvk7EWlih0Oh+2OkAi1ZDlCbBDCQEE2uVk472Ky" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Students" }
                }
                body hx-ext="sse" class="min-h-screen bg-gray-50 text-gray-900" {
                    (markup)
                }
            }
        }
    }

    pub const fn roster(&self) -> &RosterService {
        &self.roster
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub fn subscribe_to_sse_feed(&self) -> Receiver<SseEvent> {
        self.roster.subscribe()
    }

    pub async fn sensible_shutdown(&self) {
        self.store.close().await;
    }
}
