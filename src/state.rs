use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adr::{ChangeRequestIndexBuilder, RecordDrafter, RecordFetcher, RepositoryHost};
use crate::config::{AdrConfig, FetchLimits};

pub struct AppState {
    pub host: Arc<dyn RepositoryHost>,
    pub config: Arc<AdrConfig>,
    pub admin_ids: HashSet<u64>,
    /// Admins can change these at runtime with `/adr config`.
    pub limits: Arc<RwLock<FetchLimits>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// A fetcher bound to the current parse error policy.
    pub async fn record_fetcher(&self) -> RecordFetcher {
        let limits = *self.limits.read().await;
        RecordFetcher::new(self.host.clone(), self.config.clone()).with_policy(limits.on_parse_error)
    }

    pub fn record_drafter(&self) -> RecordDrafter {
        RecordDrafter::new(self.host.clone(), self.config.clone())
    }

    /// An index builder bound to the current paging limits.
    pub async fn index_builder(&self) -> ChangeRequestIndexBuilder {
        let limits = *self.limits.read().await;
        ChangeRequestIndexBuilder::new(self.host.clone(), self.config.clone())
            .with_page_size(limits.page_size)
            .with_max_pages(limits.max_pages)
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
