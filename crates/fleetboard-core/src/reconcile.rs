// ── Persistence reconciler ──
//
// Turns planned changes into backend writes. A swap is two
// position-only updates issued together; an insert is a single write
// carrying a client-generated id so it can be retried safely. Every
// write is bounded by the configured timeout. Nothing is rolled back:
// the caller refetches and the store's state wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::Backend;
use crate::error::CoreError;
use crate::model::{ActivePatch, Draft, EntityId, FieldPatch, OrderedEntity, PositionPatch, Visibility};
use crate::order::{SwapPlan, next_position};

/// Issues the writes for one collection manager.
pub struct Reconciler<B> {
    backend: Arc<B>,
    write_timeout: Duration,
}

impl<B> std::fmt::Debug for Reconciler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Reconciler<B> {
    pub fn new(backend: Arc<B>, write_timeout: Duration) -> Self {
        Self {
            backend,
            write_timeout,
        }
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    // ── Reorder ──────────────────────────────────────────────────────

    /// Persist both halves of a swap concurrently.
    ///
    /// Exactly one failure yields [`CoreError::PartialSwap`]; two yield
    /// [`CoreError::WriteFailed`] unless the first was an auth rejection.
    pub async fn apply_swap<T: OrderedEntity>(&self, plan: &SwapPlan<T>) -> Result<(), CoreError> {
        let [(first_id, first_pos), (second_id, second_pos)] = plan.assignments();
        debug!(
            collection = %T::COLLECTION,
            %first_id, first_pos, %second_id, second_pos,
            "writing swap"
        );

        let (first, second) = tokio::join!(
            self.write_position::<T>(&first_id, first_pos),
            self.write_position::<T>(&second_id, second_pos),
        );

        match (first, second) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => Err(Self::partial::<T>(first_id, second_id, &e)),
            (Err(e), Ok(())) => Err(Self::partial::<T>(second_id, first_id, &e)),
            (Err(e @ CoreError::Unauthorized { .. }), Err(_)) => Err(e),
            (Err(a), Err(b)) => Err(CoreError::WriteFailed {
                collection: T::COLLECTION,
                operation: "reorder",
                reason: format!("{a}; {b}"),
            }),
        }
    }

    fn partial<T: OrderedEntity>(applied: EntityId, failed: EntityId, err: &CoreError) -> CoreError {
        warn!(collection = %T::COLLECTION, %applied, %failed, error = %err, "swap half-applied");
        CoreError::PartialSwap {
            collection: T::COLLECTION,
            applied,
            failed,
            reason: err.to_string(),
        }
    }

    async fn write_position<T: OrderedEntity>(
        &self,
        id: &EntityId,
        position: i64,
    ) -> Result<(), CoreError> {
        let _: T = self
            .bounded(self.backend.update_fields::<T, _>(id, &PositionPatch { position }))
            .await?;
        Ok(())
    }

    // ── Insert ───────────────────────────────────────────────────────

    /// Insert `draft` after every row of its group in `existing`.
    ///
    /// A transient failure is retried once under the same id; if that
    /// retry reports a duplicate key the first attempt had landed, and
    /// the stored row is read back instead.
    pub async fn insert_appended<T: OrderedEntity>(
        &self,
        existing: &[Arc<T>],
        draft: &T::Draft,
    ) -> Result<T, CoreError> {
        draft.validate()?;
        let position = next_position(existing, draft.group());
        let id = EntityId::generate();
        debug!(collection = %T::COLLECTION, %id, position, "inserting");

        match self.insert_once::<T>(&id, draft, position).await {
            Err(e) if e.is_transient() => {
                warn!(collection = %T::COLLECTION, %id, error = %e, "insert unconfirmed, retrying");
                match self.insert_once::<T>(&id, draft, position).await {
                    Err(CoreError::Conflict { .. }) => self.read_back::<T>(&id).await,
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn insert_once<T: OrderedEntity>(
        &self,
        id: &EntityId,
        draft: &T::Draft,
        position: i64,
    ) -> Result<T, CoreError> {
        self.bounded(self.backend.insert::<T>(id, draft, position)).await
    }

    async fn read_back<T: OrderedEntity>(&self, id: &EntityId) -> Result<T, CoreError> {
        let rows: Vec<T> = self
            .bounded(self.backend.list_by_position::<T>(Visibility::Admin))
            .await?;
        rows.into_iter()
            .find(|row| row.id() == id)
            .ok_or_else(|| CoreError::NotFound {
                collection: T::COLLECTION,
                id: id.clone(),
            })
    }

    // ── Field edits ──────────────────────────────────────────────────

    pub async fn update<T: OrderedEntity>(
        &self,
        id: &EntityId,
        patch: &T::Patch,
    ) -> Result<T, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::validation("no fields to update"));
        }
        patch.validate()?;
        self.bounded(self.backend.update_fields::<T, _>(id, patch)).await
    }

    pub async fn set_active<T: OrderedEntity>(
        &self,
        id: &EntityId,
        active: bool,
    ) -> Result<T, CoreError> {
        if !T::HAS_ACTIVE_FLAG {
            return Err(CoreError::Unsupported {
                collection: T::COLLECTION,
                operation: "Changing visibility",
            });
        }
        self.bounded(
            self.backend
                .update_fields::<T, _>(id, &ActivePatch { is_active: active }),
        )
        .await
    }

    pub async fn delete<T: OrderedEntity>(&self, id: &EntityId) -> Result<(), CoreError> {
        self.bounded(self.backend.delete::<T>(id)).await
    }

    async fn bounded<R>(
        &self,
        write: impl Future<Output = Result<R, CoreError>>,
    ) -> Result<R, CoreError> {
        tokio::time::timeout(self.write_timeout, write)
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: self.write_timeout.as_secs(),
            })?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::model::{Faq, FaqPatch, Game, NewFaq};
    use crate::order::testing::faq;
    use crate::order::{MoveDirection, MovePlan, plan_move};

    async fn seeded() -> (Arc<MemoryBackend>, Reconciler<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .seed(vec![faq("A", Some(1)), faq("B", Some(2)), faq("C", Some(3))])
            .await;
        let reconciler = Reconciler::new(Arc::clone(&backend), Duration::from_secs(10));
        (backend, reconciler)
    }

    async fn swap_b_up(backend: &MemoryBackend) -> SwapPlan<Faq> {
        let rows: Vec<Arc<Faq>> = backend.rows::<Faq>().await.into_iter().map(Arc::new).collect();
        match plan_move(&rows, &EntityId::from("B"), MoveDirection::Up).unwrap() {
            MovePlan::Swap(swap) => swap,
            MovePlan::NoOp => panic!("expected a swap"),
        }
    }

    fn positions(rows: &[Faq]) -> Vec<(String, Option<i64>)> {
        rows.iter().map(|r| (r.id.to_string(), r.position)).collect()
    }

    fn draft(q: &str) -> NewFaq {
        NewFaq {
            question_it: q.into(),
            question_en: q.into(),
            answer_it: "a".into(),
            answer_en: "a".into(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn swap_writes_exactly_two_rows() {
        let (backend, reconciler) = seeded().await;
        let plan = swap_b_up(&backend).await;

        reconciler.apply_swap(&plan).await.unwrap();

        assert_eq!(backend.write_count(), 2);
        assert_eq!(
            positions(&backend.rows::<Faq>().await),
            vec![
                ("B".into(), Some(1)),
                ("A".into(), Some(2)),
                ("C".into(), Some(3)),
            ]
        );
    }

    #[tokio::test]
    async fn one_failed_half_is_a_partial_swap() {
        let (backend, reconciler) = seeded().await;
        let plan = swap_b_up(&backend).await;
        backend.fail_next_update(&EntityId::from("A")).await;

        let err = reconciler.apply_swap(&plan).await.unwrap_err();
        let CoreError::PartialSwap { applied, failed, .. } = err else {
            panic!("expected PartialSwap, got {err:?}");
        };
        assert_eq!(applied, EntityId::from("B"));
        assert_eq!(failed, EntityId::from("A"));

        // B took position 1, A kept it: a duplicate the comparator tolerates.
        let rows = backend.rows::<Faq>().await;
        assert_eq!(rows[0].position, Some(1));
        assert_eq!(rows[1].position, Some(1));
    }

    #[tokio::test]
    async fn both_halves_failing_is_a_write_failure() {
        let (backend, reconciler) = seeded().await;
        let plan = swap_b_up(&backend).await;
        backend.fail_next_update(&EntityId::from("A")).await;
        backend.fail_next_update(&EntityId::from("B")).await;

        let err = reconciler.apply_swap(&plan).await.unwrap_err();
        assert!(matches!(err, CoreError::WriteFailed { operation: "reorder", .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_writes_time_out() {
        let (backend, _) = seeded().await;
        let reconciler = Reconciler::new(Arc::clone(&backend), Duration::from_millis(50));
        backend.set_write_delay(Some(Duration::from_secs(5))).await;

        let err = reconciler.delete::<Faq>(&EntityId::from("A")).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }));
    }

    #[tokio::test]
    async fn insert_appends_after_the_maximum() {
        let (backend, reconciler) = seeded().await;
        let existing: Vec<Arc<Faq>> = backend.rows::<Faq>().await.into_iter().map(Arc::new).collect();

        let row = reconciler.insert_appended(&existing, &draft("D")).await.unwrap();
        assert_eq!(row.position, Some(4));
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn unconfirmed_insert_is_read_back_not_duplicated() {
        let (backend, reconciler) = seeded().await;
        backend.lose_next_insert_acks(1).await;

        let row = reconciler.insert_appended::<Faq>(&[], &draft("D")).await.unwrap();
        assert_eq!(row.question_en, "D");

        let stored = backend.rows::<Faq>().await;
        assert_eq!(stored.iter().filter(|r| r.question_en == "D").count(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_never_writes() {
        let (backend, reconciler) = seeded().await;
        let err = reconciler.insert_appended::<Faq>(&[], &draft("  ")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let (backend, reconciler) = seeded().await;
        let err = reconciler
            .update::<Faq>(&EntityId::from("A"), &FaqPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn games_have_no_visibility_flag() {
        let (_, reconciler) = seeded().await;
        let err = reconciler
            .set_active::<Game>(&EntityId::from("g"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
    }
}
