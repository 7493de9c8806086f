//! Live collection subscriptions.
//!
//! The store publishes a [`Collection`] marker on a [`ChangeBus`] after
//! every committed write. A [`Subscription`] owns a background task that
//! re-runs its query on every relevant change and pushes the fresh snapshot
//! through a `watch` channel, so consumers always observe the latest
//! committed snapshot in commit order. No ordering is guaranteed *across*
//! independently-opened subscriptions.
//!
//! A subscription tears itself down when dropped, and `unsubscribe` is
//! idempotent: a re-subscribing scope can never leak a duplicate feed.

use std::future::Future;

use tokio::sync::{broadcast, watch};

// ─── Change events ───────────────────────────────────────────────────────────

/// The four live collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
  Users,
  Projects,
  Evidence,
  Positions,
}

/// Fan-out point for committed writes. Cloning is cheap; all clones share
/// the same channel.
#[derive(Clone)]
pub struct ChangeBus {
  tx: broadcast::Sender<Collection>,
}

impl ChangeBus {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(64);
    Self { tx }
  }

  /// Announce a committed write. Never blocks; a publish with no listeners
  /// is simply dropped.
  pub fn publish(&self, collection: Collection) {
    let _ = self.tx.send(collection);
  }

  pub fn changes(&self) -> broadcast::Receiver<Collection> {
    self.tx.subscribe()
  }
}

impl Default for ChangeBus {
  fn default() -> Self { Self::new() }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A live query handle: the latest snapshot, plus push delivery of every
/// subsequent one.
pub struct Subscription<T> {
  rx:   watch::Receiver<Vec<T>>,
  task: Option<tokio::task::JoinHandle<()>>,
}

impl<T> Subscription<T> {
  /// Stop delivery. Idempotent; also runs on drop.
  pub fn unsubscribe(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<T: Clone> Subscription<T> {
  /// The most recently delivered snapshot.
  pub fn snapshot(&self) -> Vec<T> { self.rx.borrow().clone() }

  /// Wait for the next snapshot after the one already seen. Returns `None`
  /// once the feed has stopped (unsubscribed, or its query failed).
  pub async fn next(&mut self) -> Option<Vec<T>> {
    match self.rx.changed().await {
      Ok(()) => Some(self.rx.borrow_and_update().clone()),
      Err(_) => None,
    }
  }
}

impl<T> Drop for Subscription<T> {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

// ─── Opening a feed ──────────────────────────────────────────────────────────

/// Open a live feed over `initial`, re-running `query` after every change
/// event naming one of `collections`.
///
/// A query failure is logged and stops the feed (the snapshot simply stops
/// updating); it is never retried. A lagged change receiver collapses the
/// missed events into one refresh: `query` always returns the full current
/// snapshot, so nothing is lost.
pub fn subscribe<T, F, Fut, E>(
  collections: Vec<Collection>,
  mut changes: broadcast::Receiver<Collection>,
  initial: Vec<T>,
  query: F,
) -> Subscription<T>
where
  T: Clone + Send + Sync + 'static,
  F: Fn() -> Fut + Send + 'static,
  Fut: Future<Output = Result<Vec<T>, E>> + Send,
  E: std::fmt::Display,
{
  let (tx, rx) = watch::channel(initial);

  let task = tokio::spawn(async move {
    loop {
      match changes.recv().await {
        Ok(c) if collections.contains(&c) => {}
        Ok(_) => continue,
        Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => break,
      }

      match query().await {
        Ok(snapshot) => {
          // Send fails only when every receiver is gone.
          if tx.send(snapshot).is_err() {
            break;
          }
        }
        Err(e) => {
          tracing::warn!("live feed query failed, feed stops: {e}");
          break;
        }
      }
    }
  });

  Subscription { rx, task: Some(task) }
}
