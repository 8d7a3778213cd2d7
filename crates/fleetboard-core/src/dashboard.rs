// ── Admin dashboard ──
//
// The four ordered collections behind one shared backend.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::backend::{Backend, RestBackend};
use crate::config::{BackendConfig, ManagerOptions};
use crate::error::CoreError;
use crate::manager::CollectionManager;
use crate::model::{Collection, Faq, FooterResource, Game, Member};

/// One manager per collection, all sharing a backend.
///
/// Cheaply cloneable. Nothing is fetched until a manager is mounted.
pub struct Dashboard<B: Backend = RestBackend> {
    backend: Arc<B>,
    members: CollectionManager<Member, B>,
    games: CollectionManager<Game, B>,
    faqs: CollectionManager<Faq, B>,
    resources: CollectionManager<FooterResource, B>,
}

impl<B: Backend> Clone for Dashboard<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            members: self.members.clone(),
            games: self.games.clone(),
            faqs: self.faqs.clone(),
            resources: self.resources.clone(),
        }
    }
}

impl Dashboard<RestBackend> {
    /// Build a dashboard over the hosted REST API.
    pub fn connect(config: &BackendConfig, options: &ManagerOptions) -> Result<Self, CoreError> {
        let backend = Arc::new(RestBackend::new(config)?);
        Ok(Self::with_backend(backend, options))
    }

    /// One-shot: build, run `f`, unmount everything.
    ///
    /// Tuned for the CLI: the realtime socket and change feeds are off
    /// since only a single request/response cycle is needed. `f` mounts
    /// whichever collection it works on.
    pub async fn oneshot<F, Fut, R>(
        config: BackendConfig,
        options: ManagerOptions,
        f: F,
    ) -> Result<R, CoreError>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<R, CoreError>>,
    {
        let config = BackendConfig {
            realtime_enabled: false,
            ..config
        };
        let dashboard = Self::connect(&config, &options.oneshot())?;
        let result = f(dashboard.clone()).await;
        dashboard.unmount_all().await;
        result
    }
}

impl<B: Backend> Dashboard<B> {
    pub fn with_backend(backend: Arc<B>, options: &ManagerOptions) -> Self {
        Self {
            members: CollectionManager::new(Arc::clone(&backend), options.clone()),
            games: CollectionManager::new(Arc::clone(&backend), options.clone()),
            faqs: CollectionManager::new(Arc::clone(&backend), options.clone()),
            resources: CollectionManager::new(Arc::clone(&backend), options.clone()),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn members(&self) -> &CollectionManager<Member, B> {
        &self.members
    }

    pub fn games(&self) -> &CollectionManager<Game, B> {
        &self.games
    }

    pub fn faqs(&self) -> &CollectionManager<Faq, B> {
        &self.faqs
    }

    pub fn resources(&self) -> &CollectionManager<FooterResource, B> {
        &self.resources
    }

    /// Mount all four managers concurrently.
    ///
    /// Every manager is mounted even if another fails; the first failure
    /// is returned.
    pub async fn mount_all(&self) -> Result<(), CoreError> {
        let (members, games, faqs, resources) = tokio::join!(
            self.members.mount(),
            self.games.mount(),
            self.faqs.mount(),
            self.resources.mount(),
        );
        let results = [
            (Collection::Members, members),
            (Collection::BestGames, games),
            (Collection::Faqs, faqs),
            (Collection::FooterResources, resources),
        ];
        let mut first = None;
        for (collection, result) in results {
            if let Err(e) = result {
                warn!(%collection, error = %e, "mount failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    pub async fn unmount_all(&self) {
        tokio::join!(
            self.members.unmount(),
            self.games.unmount(),
            self.faqs.unmount(),
            self.resources.unmount(),
        );
    }
}

impl<B: Backend> std::fmt::Debug for Dashboard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("members", &self.members)
            .field("games", &self.games)
            .field("faqs", &self.faqs)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}
