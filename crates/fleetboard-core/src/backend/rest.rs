// ── Backend over the hosted table API ──

use async_trait::async_trait;
use fleetboard_api::{
    ApiCredentials, Order, RealtimeEndpoint, RealtimeHandle, ReconnectConfig, RestClient,
    SelectQuery, TransportConfig,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Backend, ChangeFeed};
use crate::config::BackendConfig;
use crate::error::CoreError;
use crate::model::{Collection, EntityId, OrderedEntity, Visibility};
use crate::order::sort_rows;

/// Insert body: the draft's columns plus id and position.
#[derive(Serialize)]
struct InsertRow<'a, D: Serialize> {
    id: &'a EntityId,
    position: i64,
    #[serde(flatten)]
    draft: &'a D,
}

/// [`Backend`] backed by the REST table API and the realtime socket.
#[derive(Debug, Clone)]
pub struct RestBackend {
    rest: RestClient,
    realtime: Option<RealtimeEndpoint>,
    reconnect: ReconnectConfig,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        let credentials = ApiCredentials {
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        };
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let rest = RestClient::new(&config.url, &credentials, &transport)?;

        let realtime = if config.realtime_enabled {
            Some(RealtimeEndpoint::from_project_url(&config.url, &credentials)?)
        } else {
            None
        };

        Ok(Self {
            rest,
            realtime,
            reconnect: config.reconnect.clone(),
        })
    }

    /// Wrap a pre-built client; `realtime` may be `None` to run without a feed.
    pub fn with_client(rest: RestClient, realtime: Option<RealtimeEndpoint>) -> Self {
        Self {
            rest,
            realtime,
            reconnect: ReconnectConfig::default(),
        }
    }

    fn list_query<T: OrderedEntity>(visibility: Visibility) -> SelectQuery {
        let mut query = SelectQuery::new();
        if visibility == Visibility::Public && T::HAS_ACTIVE_FLAG {
            query = query.eq("is_active", true);
        }
        if let Some(group) = T::GROUP_COLUMN {
            query = query.order(Order::asc(group));
        }
        query
            .order(Order::asc("position").nulls_first())
            .order(Order::asc("created_at"))
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn list_by_position<T: OrderedEntity>(
        &self,
        visibility: Visibility,
    ) -> Result<Vec<T>, CoreError> {
        let query = Self::list_query::<T>(visibility);
        let mut rows: Vec<T> = self.rest.select(T::COLLECTION.table(), &query).await?;
        debug!(collection = %T::COLLECTION, rows = rows.len(), "listed rows");

        // The server already orders; re-sorting applies the full tie-break.
        sort_rows(&mut rows);
        Ok(rows)
    }

    async fn insert<T: OrderedEntity>(
        &self,
        id: &EntityId,
        draft: &T::Draft,
        position: i64,
    ) -> Result<T, CoreError> {
        let body = InsertRow {
            id,
            position,
            draft,
        };
        self.rest
            .insert(T::COLLECTION.table(), &body)
            .await
            .map_err(|e| CoreError::from_write(e, T::COLLECTION, "insert", id))
    }

    async fn update_fields<T, P>(&self, id: &EntityId, patch: &P) -> Result<T, CoreError>
    where
        T: OrderedEntity,
        P: Serialize + Send + Sync,
    {
        self.rest
            .update(T::COLLECTION.table(), &id.to_string(), patch)
            .await
            .map_err(|e| CoreError::from_write(e, T::COLLECTION, "update", id))
    }

    async fn delete<T: OrderedEntity>(&self, id: &EntityId) -> Result<(), CoreError> {
        self.rest
            .delete(T::COLLECTION.table(), &id.to_string())
            .await
            .map_err(|e| CoreError::from_write(e, T::COLLECTION, "delete", id))
    }

    fn subscribe(&self, collection: Collection) -> Result<ChangeFeed, CoreError> {
        let endpoint = self
            .realtime
            .clone()
            .ok_or_else(|| CoreError::Subscription {
                collection,
                reason: "realtime is disabled for this backend".into(),
            })?;

        let cancel = CancellationToken::new();
        let handle = RealtimeHandle::connect(
            endpoint,
            collection.table(),
            self.reconnect.clone(),
            cancel.clone(),
        );
        Ok(ChangeFeed::new(collection, handle.subscribe(), Some(cancel)))
    }
}
