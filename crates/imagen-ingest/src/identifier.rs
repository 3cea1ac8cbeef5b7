//! Subject identifier normalization.
//!
//! Most questionnaire exports store a composite "user code" whose first 12
//! characters are the zero-padded subject ID. Some sessions already store the
//! plain integer ID. Which encoding applies is part of each instrument's
//! schema.

use std::path::Path;

use imagen_common::parse_f64;
use imagen_model::{InstrumentSchema, Session, SubjectId};
use thiserror::Error;

use crate::error::{IngestError, Result};

/// Number of leading user-code characters that form the subject ID.
pub const USER_CODE_PREFIX_LEN: usize = 12;

/// How a session encodes its identifier column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdEncoding {
    /// The cell already holds the integer ID.
    Plain,
    /// The first 12 characters of the cell are the ID.
    UserCode,
}

/// A single identifier cell that could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot normalize '{value}': {reason}")]
pub struct IdentifierError {
    pub value: String,
    pub reason: &'static str,
}

impl IdentifierError {
    fn new(value: &str, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }
}

/// Canonicalizes raw identifier cells for one instrument.
#[derive(Debug, Clone, Default)]
pub struct IdentifierNormalizer {
    plain_sessions: Vec<Session>,
}

impl IdentifierNormalizer {
    pub fn new(plain_sessions: impl IntoIterator<Item = Session>) -> Self {
        Self {
            plain_sessions: plain_sessions.into_iter().collect(),
        }
    }

    pub fn for_schema(schema: &InstrumentSchema) -> Self {
        Self::new(
            Session::ALL
                .into_iter()
                .filter(|&session| schema.is_plain_id_session(session)),
        )
    }

    pub fn encoding(&self, session: Session) -> IdEncoding {
        if self.plain_sessions.contains(&session) {
            IdEncoding::Plain
        } else {
            IdEncoding::UserCode
        }
    }

    /// Normalizes one raw cell recorded at `session`.
    pub fn normalize(
        &self,
        raw: &str,
        session: Session,
    ) -> std::result::Result<SubjectId, IdentifierError> {
        match self.encoding(session) {
            IdEncoding::Plain => normalize_plain(raw),
            IdEncoding::UserCode => normalize_user_code(raw),
        }
    }

    /// Normalizes a whole identifier column.
    ///
    /// The first bad cell aborts the column: a malformed ID usually means the
    /// file layout changed, not a one-off data error.
    pub fn normalize_column(
        &self,
        values: &[Option<String>],
        session: Session,
        path: &Path,
    ) -> Result<Vec<SubjectId>> {
        values
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                let raw = value.as_deref().unwrap_or("");
                self.normalize(raw, session)
                    .map_err(|err| IngestError::MalformedIdentifier {
                        path: path.to_path_buf(),
                        session,
                        row: idx + 1,
                        value: err.value,
                        reason: err.reason,
                    })
            })
            .collect()
    }
}

/// Parses an already-canonical integer ID.
///
/// Integral float spellings (`"12345.0"`) are accepted.
pub fn normalize_plain(raw: &str) -> std::result::Result<SubjectId, IdentifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::new(raw, "empty identifier"));
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(SubjectId(value));
    }
    match parse_f64(trimmed) {
        Some(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 => {
            Ok(SubjectId(value as i64))
        }
        Some(_) => Err(IdentifierError::new(raw, "not an integral number")),
        None => Err(IdentifierError::new(raw, "not a number")),
    }
}

/// Parses the subject ID out of a composite user code.
///
/// Takes the first 12 characters, which must all be ASCII digits; any
/// trailing content is ignored.
pub fn normalize_user_code(raw: &str) -> std::result::Result<SubjectId, IdentifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::new(raw, "empty identifier"));
    }
    let prefix: String = trimmed.chars().take(USER_CODE_PREFIX_LEN).collect();
    if prefix.chars().count() < USER_CODE_PREFIX_LEN {
        return Err(IdentifierError::new(raw, "fewer than 12 characters"));
    }
    if !prefix.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(IdentifierError::new(raw, "12-character prefix is not numeric"));
    }
    prefix
        .parse::<i64>()
        .map(SubjectId)
        .map_err(|_| IdentifierError::new(raw, "12-character prefix is not numeric"))
}
