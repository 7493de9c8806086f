//! Field evidence ("evidencias") and the review state machine.
//!
//! An evidence record is written once by an operator and reviewed at most
//! once by a supervisor. `pendiente` is the only non-terminal state; no
//! transition leaves `aprobado` or `rechazado`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, project::GeoPoint};

// ─── Media ───────────────────────────────────────────────────────────────────

/// What kind of capture the media URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
  #[serde(rename = "foto")]
  Photo,
  #[serde(rename = "video")]
  Video,
}

impl MediaKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Photo => "foto",
      Self::Video => "video",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "foto" => Some(Self::Photo),
      "video" => Some(Self::Video),
      _ => None,
    }
  }
}

// ─── Review states ───────────────────────────────────────────────────────────

/// Review status of an evidence record. The wire literals are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
  #[serde(rename = "pendiente")]
  Pending,
  #[serde(rename = "aprobado")]
  Approved,
  #[serde(rename = "rechazado")]
  Rejected,
}

impl ReviewStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pendiente",
      Self::Approved => "aprobado",
      Self::Rejected => "rechazado",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "pendiente" => Some(Self::Pending),
      "aprobado" => Some(Self::Approved),
      "rechazado" => Some(Self::Rejected),
      _ => None,
    }
  }

  pub fn is_pending(self) -> bool { matches!(self, Self::Pending) }
}

/// A reviewer's decision — the two terminal states, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
  #[serde(rename = "aprobado")]
  Approved,
  #[serde(rename = "rechazado")]
  Rejected,
}

impl Verdict {
  pub fn into_status(self) -> ReviewStatus {
    match self {
      Self::Approved => ReviewStatus::Approved,
      Self::Rejected => ReviewStatus::Rejected,
    }
  }
}

// ─── Evidence ────────────────────────────────────────────────────────────────

/// A geotagged photo/video submission. Immutable except for the single
/// review transition applied through [`Evidence::review`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
  pub evidence_id:      Uuid,
  pub project_id:       Uuid,
  pub operator_id:      Uuid,
  pub kind:             MediaKind,
  /// Download URL in the external object store; the media bytes never pass
  /// through this system.
  pub media_url:        String,
  pub capture_location: GeoPoint,
  pub description:      String,
  pub submitted_at:     DateTime<Utc>,
  pub status:           ReviewStatus,
  pub reviewed_by:      Option<Uuid>,
  pub reviewed_at:      Option<DateTime<Utc>>,
}

impl Evidence {
  /// Apply a review verdict. Legal only from `pendiente`; a second review
  /// attempt fails with [`Error::AlreadyReviewed`] instead of silently
  /// overwriting the first supervisor's decision.
  pub fn review(
    &mut self,
    verdict: Verdict,
    reviewer_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<()> {
    if !self.status.is_pending() {
      return Err(Error::AlreadyReviewed(self.evidence_id));
    }
    self.status = verdict.into_status();
    self.reviewed_by = Some(reviewer_id);
    self.reviewed_at = Some(now);
    Ok(())
  }
}

/// Input to [`crate::store::FieldStore::submit_evidence`].
/// `evidence_id`, `submitted_at`, and the initial `pendiente` status are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEvidence {
  pub project_id:       Uuid,
  pub operator_id:      Uuid,
  pub kind:             MediaKind,
  pub media_url:        String,
  pub capture_location: GeoPoint,
  pub description:      String,
}
