//! Live operator positions and the fire-and-forget broadcast loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::{project::GeoPoint, store::FieldStore};

/// The single "where is this operator right now" record. Overwritten in
/// place on every fix; no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivePosition {
  pub operator_id:    Uuid,
  pub position:       GeoPoint,
  pub updated_at:     DateTime<Utc>,
  /// The project the operator is currently working, or `None` when no obra
  /// is active.
  pub active_project: Option<Uuid>,
}

/// Forward position fixes from a device sensor channel into the store.
///
/// Runs until the sensor channel closes. Each fix overwrites the operator's
/// live position with the coordinate, the current time, and whatever project
/// is active at that moment. Failed writes are logged and skipped — the
/// broadcast never retries and never stops on a write error.
pub async fn broadcast_positions<S>(
  store: S,
  operator_id: Uuid,
  mut fixes: mpsc::Receiver<GeoPoint>,
  active_project: watch::Receiver<Option<Uuid>>,
) where
  S: FieldStore,
{
  while let Some(position) = fixes.recv().await {
    let record = LivePosition {
      operator_id,
      position,
      updated_at: Utc::now(),
      active_project: *active_project.borrow(),
    };
    if let Err(e) = store.upsert_position(record).await {
      tracing::warn!(%operator_id, "position broadcast write failed: {e}");
    }
  }
  tracing::debug!(%operator_id, "position sensor channel closed");
}
