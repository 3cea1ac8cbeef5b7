//! Data model for the IMAGEN instrument pipeline.
//!
//! The types here are shared by the registry, the loaders and the CLI:
//!
//! - [`Session`] and [`SubjectId`]: the long-format table key
//! - [`CohortLabel`] with its [`Sex`], [`Site`] and [`CohortClass`] codes
//! - [`InstrumentSchema`]: the declarative description of one instrument

pub mod cohort;
pub mod error;
pub mod schema;
pub mod session;
pub mod subject;

pub use cohort::{CohortClass, CohortLabel, DatasetSplit, Sex, Site};
pub use error::ParseError;
pub use schema::{
    Aggregation, Band, BandedRecode, CategoricalRecode, Codelist, CompositeScore, ConcatRecode,
    InstrumentSchema, LabelJoinKey, LabelSetSchema, LabelSource, RecordKey, RoiColumn,
    SessionSource, Unmapped, ValueType,
};
pub use session::Session;
pub use subject::SubjectId;

/// Column holding the canonical subject identifier in every table.
pub const ID_COLUMN: &str = "ID";

/// Column holding the session code in every table.
pub const SESSION_COLUMN: &str = "Session";

/// Raw identifier column of the questionnaire exports.
pub const USER_CODE_COLUMN: &str = "User code";
