//! Operator↔project assignment helpers.
//!
//! The persisted write is always a full replace of the operator's
//! assignment set (see [`crate::store::FieldStore::assign_projects`]);
//! checkbox-style callers build the replacement set locally with
//! [`toggle`], starting from the operator's current assignments.

use std::collections::BTreeSet;

use uuid::Uuid;

/// Flip one project in and out of an assignment set.
pub fn toggle(set: &mut BTreeSet<Uuid>, project_id: Uuid) {
  if !set.insert(project_id) {
    set.remove(&project_id);
  }
}
