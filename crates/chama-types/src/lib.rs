//! Shared types, validation rules, and constants for the Chama calling board.
//!
//! This crate provides the foundational types used across all Chama crates:
//! the persisted call record, the feed snapshot handed to displays, the
//! staff submission and its validation errors (via `thiserror`), and the
//! clinic catalog of rooms and professionals.
//!
//! No crate in the workspace depends on anything *except* `chama-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

pub mod catalog;

pub use catalog::{Catalog, ProfessionalGroup};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of records a television display subscribes to (current + history).
pub const DISPLAY_FEED_LIMIT: u32 = 6;

/// Number of records listed on the staff panel.
pub const PANEL_FEED_LIMIT: u32 = 5;

/// Minimum number of characters in a patient name.
pub const MIN_PATIENT_NAME_CHARS: usize = 3;

/// Maximum number of characters in a patient or professional name.
pub const MAX_NAME_CHARS: usize = 128;

/// Maximum number of characters in a room label.
pub const MAX_ROOM_CHARS: usize = 64;

/// One persisted "call patient X to room Y".
///
/// Records are created by a submission and never mutated. They disappear
/// only through the bulk reset or an individual delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// Opaque public ID (UUID string).
    pub id: String,
    /// Patient name exactly as submitted (trimmed).
    pub patient_name: String,
    /// Room label exactly as submitted (trimmed).
    pub room_number: String,
    /// Professional attending the patient, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_name: Option<String>,
    /// Store-assigned ordering key. Strictly increasing per insert.
    pub seq: i64,
    /// Creation timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub created_at: String,
}

/// Ordered view over the most recent call records, newest first.
///
/// A snapshot always replaces the previous one wholesale; there are no
/// incremental updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedSnapshot(Vec<CallRecord>);

impl FeedSnapshot {
    /// Wraps records that are already ordered newest first.
    pub fn new(calls: Vec<CallRecord>) -> Self {
        Self(calls)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn calls(&self) -> &[CallRecord] {
        &self.0
    }

    pub fn into_calls(self) -> Vec<CallRecord> {
        self.0
    }
}

impl From<Vec<CallRecord>> for FeedSnapshot {
    fn from(calls: Vec<CallRecord>) -> Self {
        Self(calls)
    }
}

/// Raw staff submission as received from the panel form.
///
/// Every field is optional here so that a missing field is reported as a
/// validation error on that field rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSubmission {
    pub patient_name: Option<String>,
    pub room_number: Option<String>,
    pub professional_name: Option<String>,
}

/// A submission that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCall {
    pub patient_name: String,
    pub room_number: String,
    pub professional_name: Option<String>,
}

/// Form validation failures. Messages are shown inline on the panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("O nome do paciente deve ter pelo menos 3 caracteres.")]
    PatientNameTooShort,
    #[error("O nome do paciente deve ter no máximo {max} caracteres.")]
    PatientNameTooLong { max: usize },
    #[error("Por favor, selecione uma sala.")]
    MissingRoom,
    #[error("O nome da sala deve ter no máximo {max} caracteres.")]
    RoomTooLong { max: usize },
    #[error("O nome do profissional deve ter no máximo {max} caracteres.")]
    ProfessionalTooLong { max: usize },
}

impl ValidationError {
    /// Name of the form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::PatientNameTooShort | Self::PatientNameTooLong { .. } => "patientName",
            Self::MissingRoom | Self::RoomTooLong { .. } => "roomNumber",
            Self::ProfessionalTooLong { .. } => "professionalName",
        }
    }
}

impl CallSubmission {
    /// Validates the submission and normalizes whitespace.
    ///
    /// A blank professional name is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking the patient
    /// name, then the room, then the professional.
    pub fn validate(self) -> Result<NewCall, ValidationError> {
        let patient_name = self.patient_name.unwrap_or_default().trim().to_string();
        let patient_chars = patient_name.chars().count();
        if patient_chars < MIN_PATIENT_NAME_CHARS {
            return Err(ValidationError::PatientNameTooShort);
        }
        if patient_chars > MAX_NAME_CHARS {
            return Err(ValidationError::PatientNameTooLong {
                max: MAX_NAME_CHARS,
            });
        }

        let room_number = self.room_number.unwrap_or_default().trim().to_string();
        if room_number.is_empty() {
            return Err(ValidationError::MissingRoom);
        }
        if room_number.chars().count() > MAX_ROOM_CHARS {
            return Err(ValidationError::RoomTooLong {
                max: MAX_ROOM_CHARS,
            });
        }

        let professional_name = self
            .professional_name
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if let Some(ref p) = professional_name {
            if p.chars().count() > MAX_NAME_CHARS {
                return Err(ValidationError::ProfessionalTooLong {
                    max: MAX_NAME_CHARS,
                });
            }
        }

        Ok(NewCall {
            patient_name,
            room_number,
            professional_name,
        })
    }
}

impl From<&CallRecord> for NewCall {
    /// Copies the call fields of an existing record, used for re-calls.
    fn from(record: &CallRecord) -> Self {
        Self {
            patient_name: record.patient_name.clone(),
            room_number: record.room_number.clone(),
            professional_name: record.professional_name.clone(),
        }
    }
}
