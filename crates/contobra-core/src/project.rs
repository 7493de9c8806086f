//! Projects ("obras") — the unit of work everything else hangs off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Geography ───────────────────────────────────────────────────────────────

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lon: f64,
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Project lifecycle status. The wire literals are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
  #[serde(rename = "iniciando")]
  Initiating,
  #[serde(rename = "proceso")]
  InProgress,
  #[serde(rename = "terminando")]
  Finishing,
}

impl ProjectStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Initiating => "iniciando",
      Self::InProgress => "proceso",
      Self::Finishing => "terminando",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "iniciando" => Some(Self::Initiating),
      "proceso" => Some(Self::InProgress),
      "terminando" => Some(Self::Finishing),
      _ => None,
    }
  }
}

// ─── Project ─────────────────────────────────────────────────────────────────

/// A public-works construction project.
///
/// Invariants held by every persisted project: `radius_m >= 0` and
/// `start_date <= estimated_end`, both checked at the write boundary.
/// Projects are never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  pub project_id:    Uuid,
  pub name:          String,
  /// Geographic center of the geofence.
  pub center:        GeoPoint,
  /// Geofence radius in meters.
  pub radius_m:      f64,
  pub supervisor_id: Uuid,
  pub status:        ProjectStatus,
  pub start_date:    DateTime<Utc>,
  pub estimated_end: DateTime<Utc>,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::FieldStore::create_project`]. New projects always
/// start in `iniciando`; `project_id` and `created_at` are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewProject {
  pub name:          String,
  pub center:        GeoPoint,
  pub radius_m:      f64,
  pub supervisor_id: Uuid,
  pub start_date:    DateTime<Utc>,
  pub estimated_end: DateTime<Utc>,
}

impl NewProject {
  /// Check the project invariants before anything is written.
  pub fn validate(&self) -> Result<()> {
    validate_fields(self.radius_m, self.start_date, self.estimated_end)
  }
}

/// Full update payload — every mutable field, including supervisor
/// reassignment. Admin only.
#[derive(Debug, Clone)]
pub struct ProjectUpdate {
  pub name:          String,
  pub center:        GeoPoint,
  pub radius_m:      f64,
  pub supervisor_id: Uuid,
  pub status:        ProjectStatus,
  pub start_date:    DateTime<Utc>,
  pub estimated_end: DateTime<Utc>,
}

impl ProjectUpdate {
  pub fn validate(&self) -> Result<()> {
    validate_fields(self.radius_m, self.start_date, self.estimated_end)
  }
}

/// The subset of fields a supervisor may change on their own projects.
#[derive(Debug, Clone)]
pub struct ProjectDetails {
  pub name:     String,
  pub radius_m: f64,
  pub status:   ProjectStatus,
}

impl ProjectDetails {
  pub fn validate(&self) -> Result<()> {
    if !(self.radius_m >= 0.0) {
      return Err(Error::InvalidRadius(self.radius_m));
    }
    Ok(())
  }
}

fn validate_fields(
  radius_m: f64,
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Result<()> {
  // A negated `>=` also rejects NaN.
  if !(radius_m >= 0.0) {
    return Err(Error::InvalidRadius(radius_m));
  }
  if start > end {
    return Err(Error::InvalidDates);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn input() -> NewProject {
    NewProject {
      name:          "Puente Norte".into(),
      center:        GeoPoint { lat: 19.43, lon: -99.13 },
      radius_m:      50.0,
      supervisor_id: Uuid::new_v4(),
      start_date:    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
      estimated_end: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn valid_input_passes() {
    assert!(input().validate().is_ok());
  }

  #[test]
  fn negative_radius_rejected() {
    let mut p = input();
    p.radius_m = -1.0;
    assert!(matches!(p.validate(), Err(Error::InvalidRadius(_))));
  }

  #[test]
  fn nan_radius_rejected() {
    let mut p = input();
    p.radius_m = f64::NAN;
    assert!(matches!(p.validate(), Err(Error::InvalidRadius(_))));
  }

  #[test]
  fn inverted_dates_rejected() {
    let mut p = input();
    p.estimated_end = p.start_date - chrono::Duration::days(1);
    assert!(matches!(p.validate(), Err(Error::InvalidDates)));
  }

  #[test]
  fn zero_length_window_allowed() {
    // start == end is degenerate but legal; the metrics engine guards it.
    let mut p = input();
    p.estimated_end = p.start_date;
    assert!(p.validate().is_ok());
  }

  #[test]
  fn status_literals_round_trip() {
    for s in [
      ProjectStatus::Initiating,
      ProjectStatus::InProgress,
      ProjectStatus::Finishing,
    ] {
      assert_eq!(ProjectStatus::parse(s.as_str()), Some(s));
    }
    assert_eq!(ProjectStatus::parse("in_progress"), None);
  }
}
