//! The derived metrics engine.
//!
//! Pure functions over snapshots — nothing here reads the store or the
//! clock. Callers evaluate once per project per snapshot batch and fan out
//! over every loaded project.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{evidence::Evidence, project::Project};

/// Progress figures derived from one project and its evidence list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
  pub total_evidence: usize,
  pub approved:       usize,
  pub rejected:       usize,
  pub pending:        usize,
  /// Fraction of the scheduled window already elapsed, clamped to `[0, 1]`.
  /// Defined as 0 for a zero-length or inverted window.
  pub time_progress:  f64,
  /// Whole days from `now` to the estimated end. Negative when overdue;
  /// never clamped.
  pub days_remaining: i64,
}

/// Derive [`ProjectStats`] from a snapshot.
///
/// The counts are exact partition cardinalities, so
/// `approved + rejected + pending == evidence.len()` always holds. An empty
/// evidence list yields all-zero counts.
pub fn project_stats(
  project: &Project,
  evidence: &[Evidence],
  now: DateTime<Utc>,
) -> ProjectStats {
  let mut approved = 0;
  let mut rejected = 0;
  let mut pending = 0;
  for ev in evidence {
    match ev.status {
      crate::evidence::ReviewStatus::Approved => approved += 1,
      crate::evidence::ReviewStatus::Rejected => rejected += 1,
      crate::evidence::ReviewStatus::Pending => pending += 1,
    }
  }

  let total_days = (project.estimated_end - project.start_date).num_days();
  let elapsed_days = (now - project.start_date).num_days();
  let time_progress = if total_days > 0 {
    (elapsed_days as f64 / total_days as f64).clamp(0.0, 1.0)
  } else {
    // Zero-length window: avoid 0/0 and call the project not started.
    0.0
  };

  ProjectStats {
    total_evidence: evidence.len(),
    approved,
    rejected,
    pending,
    time_progress,
    days_remaining: (project.estimated_end - now).num_days(),
  }
}
