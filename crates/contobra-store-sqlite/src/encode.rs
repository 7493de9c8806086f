//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. The assigned-project set is stored as a
//! compact JSON array. Role and status columns hold the Spanish wire
//! literals shared with the mobile clients.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use contobra_core::{
  evidence::{Evidence, MediaKind, ReviewStatus},
  position::LivePosition,
  project::{GeoPoint, Project, ProjectStatus},
  user::{Role, UserAccount},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Option<Role>) -> Option<&'static str> {
  role.map(Role::as_str)
}

/// Unknown role strings decode to `None` — an account whose role column
/// holds an unrecognised value gets no privileges.
pub fn decode_role(s: Option<&str>) -> Option<Role> {
  s.and_then(Role::parse)
}

// ─── ProjectStatus ───────────────────────────────────────────────────────────

pub fn encode_project_status(s: ProjectStatus) -> &'static str { s.as_str() }

pub fn decode_project_status(s: &str) -> Result<ProjectStatus> {
  ProjectStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown project status: {s:?}")))
}

// ─── MediaKind / ReviewStatus ────────────────────────────────────────────────

pub fn encode_media_kind(k: MediaKind) -> &'static str { k.as_str() }

pub fn decode_media_kind(s: &str) -> Result<MediaKind> {
  MediaKind::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown media kind: {s:?}")))
}

pub fn encode_review_status(s: ReviewStatus) -> &'static str { s.as_str() }

pub fn decode_review_status(s: &str) -> Result<ReviewStatus> {
  ReviewStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown review status: {s:?}")))
}

// ─── Assigned-project set ────────────────────────────────────────────────────

pub fn encode_assigned(set: &BTreeSet<Uuid>) -> Result<String> {
  let ids: Vec<String> = set.iter().copied().map(encode_uuid).collect();
  Ok(serde_json::to_string(&ids)?)
}

pub fn decode_assigned(s: &str) -> Result<BTreeSet<Uuid>> {
  let ids: Vec<String> = serde_json::from_str(s)?;
  ids.iter().map(|id| decode_uuid(id)).collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub uid:               String,
  pub name:              String,
  pub email:             String,
  pub role:              Option<String>,
  pub assigned_projects: String,
  pub created_at:        String,
}

impl RawUser {
  pub fn into_account(self) -> Result<UserAccount> {
    Ok(UserAccount {
      uid:               decode_uuid(&self.uid)?,
      name:              self.name,
      email:             self.email,
      role:              decode_role(self.role.as_deref()),
      assigned_projects: decode_assigned(&self.assigned_projects)?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `projects` row.
pub struct RawProject {
  pub project_id:    String,
  pub name:          String,
  pub lat:           f64,
  pub lon:           f64,
  pub radius_m:      f64,
  pub supervisor_id: String,
  pub status:        String,
  pub start_date:    String,
  pub estimated_end: String,
  pub created_at:    String,
}

impl RawProject {
  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:    decode_uuid(&self.project_id)?,
      name:          self.name,
      center:        GeoPoint { lat: self.lat, lon: self.lon },
      radius_m:      self.radius_m,
      supervisor_id: decode_uuid(&self.supervisor_id)?,
      status:        decode_project_status(&self.status)?,
      start_date:    decode_dt(&self.start_date)?,
      estimated_end: decode_dt(&self.estimated_end)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `evidence` row.
pub struct RawEvidence {
  pub evidence_id:  String,
  pub project_id:   String,
  pub operator_id:  String,
  pub kind:         String,
  pub media_url:    String,
  pub lat:          f64,
  pub lon:          f64,
  pub description:  String,
  pub submitted_at: String,
  pub status:       String,
  pub reviewed_by:  Option<String>,
  pub reviewed_at:  Option<String>,
}

impl RawEvidence {
  pub fn into_evidence(self) -> Result<Evidence> {
    Ok(Evidence {
      evidence_id:  decode_uuid(&self.evidence_id)?,
      project_id:   decode_uuid(&self.project_id)?,
      operator_id:  decode_uuid(&self.operator_id)?,
      kind:         decode_media_kind(&self.kind)?,
      media_url:    self.media_url,
      capture_location: GeoPoint { lat: self.lat, lon: self.lon },
      description:  self.description,
      submitted_at: decode_dt(&self.submitted_at)?,
      status:       decode_review_status(&self.status)?,
      reviewed_by:  self.reviewed_by.as_deref().map(decode_uuid).transpose()?,
      reviewed_at:  self.reviewed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `live_positions` row.
pub struct RawPosition {
  pub operator_id:    String,
  pub lat:            f64,
  pub lon:            f64,
  pub updated_at:     String,
  pub active_project: Option<String>,
}

impl RawPosition {
  pub fn into_position(self) -> Result<LivePosition> {
    Ok(LivePosition {
      operator_id:    decode_uuid(&self.operator_id)?,
      position:       GeoPoint { lat: self.lat, lon: self.lon },
      updated_at:     decode_dt(&self.updated_at)?,
      active_project: self
        .active_project
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
    })
  }
}
