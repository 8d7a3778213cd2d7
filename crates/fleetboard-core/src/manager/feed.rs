// ── Change-feed task ──
//
// One per mounted manager. Every notification (or lag report) folds the
// queued burst into a single refetch. Outages the source rides out itself
// show as `Reconnecting` until its resync. When the feed closes the task
// resubscribes with backoff; the view keeps its last rows meanwhile.

use std::sync::Weak;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{CollectionManager, FeedState, Inner};
use crate::backend::{Backend, ChangeFeed, FeedSignal};
use crate::model::OrderedEntity;

pub(super) async fn run<T: OrderedEntity, B: Backend>(
    inner: Weak<Inner<T, B>>,
    mut feed: Option<ChangeFeed>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut outages: u32 = 0;

    loop {
        let Some(active) = feed.as_mut() else {
            let Some(manager) = upgrade(&inner) else { break };
            let policy = manager.inner.options.resubscribe.clone();
            if policy.max_retries.is_some_and(|max| attempt >= max) {
                warn!(collection = %T::COLLECTION, attempt, "giving up on change feed");
                manager.set_feed(FeedState::Disabled);
                break;
            }
            manager.set_feed(FeedState::Reconnecting {
                attempt: attempt.saturating_add(1),
            });
            drop(manager);

            let delay = policy.delay_for(attempt);
            debug!(collection = %T::COLLECTION, attempt, ?delay, "resubscribing after delay");
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }

            let Some(manager) = upgrade(&inner) else { break };
            match manager.inner.backend.subscribe(T::COLLECTION) {
                Ok(fresh) => {
                    info!(collection = %T::COLLECTION, "change feed restored");
                    feed = Some(fresh);
                    attempt = 0;
                    outages = 0;
                    manager.set_feed(FeedState::Connected);
                    // Anything written while disconnected was missed.
                    if !refresh(&manager, &cancel).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(collection = %T::COLLECTION, error = %e, "resubscribe failed");
                    attempt = attempt.saturating_add(1);
                }
            }
            continue;
        };

        let signal = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            signal = active.next() => signal,
        };

        match signal {
            FeedSignal::Changed(kind) => {
                let folded = active.drain();
                debug!(collection = %T::COLLECTION, %kind, folded, "change notification");
            }
            FeedSignal::Lagged(skipped) => {
                active.drain();
                debug!(collection = %T::COLLECTION, skipped, "change feed lagged");
            }
            FeedSignal::Interrupted => {
                outages = outages.saturating_add(1);
                warn!(collection = %T::COLLECTION, outages, "change feed interrupted");
                let Some(manager) = upgrade(&inner) else { break };
                manager.set_feed(FeedState::Reconnecting { attempt: outages });
                continue;
            }
            FeedSignal::Closed => {
                warn!(collection = %T::COLLECTION, "change feed closed");
                feed = None;
                continue;
            }
        }

        let Some(manager) = upgrade(&inner) else { break };
        if active.is_interrupted() {
            manager.set_feed(FeedState::Reconnecting {
                attempt: outages.max(1),
            });
        } else {
            outages = 0;
            manager.set_feed(FeedState::Connected);
        }
        if !refresh(&manager, &cancel).await {
            break;
        }
    }

    debug!(collection = %T::COLLECTION, "feed task exiting");
}

fn upgrade<T: OrderedEntity, B: Backend>(
    inner: &Weak<Inner<T, B>>,
) -> Option<CollectionManager<T, B>> {
    inner.upgrade().map(|inner| CollectionManager { inner })
}

/// Refetch unless cancelled first. Returns `false` on cancellation.
async fn refresh<T: OrderedEntity, B: Backend>(
    manager: &CollectionManager<T, B>,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        result = manager.refresh() => {
            if let Err(e) = result {
                debug!(collection = %T::COLLECTION, error = %e, "feed-triggered refresh failed");
            }
            true
        }
    }
}
