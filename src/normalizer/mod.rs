//! Mapping of backend-native results onto the shared [`CheckResult`] schema.
//!
//! One normalizer per [`Backend`], selected by the tag on the [`RawResult`].
//! A payload whose overall shape is wrong yields a [`NormalizeError`]; a
//! single unusable entry inside an otherwise valid payload is skipped and
//! reported as a warning. Principle ids are kept verbatim, so backends may
//! introduce ids this crate has never seen.

mod checks;
pub mod foops;
pub mod fuji;
pub mod somef;
pub mod structure;

use thiserror::Error;

use crate::gateway::RawResult;
use crate::models::{Backend, CheckResult};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("{backend} response is not a JSON object")]
    NotAnObject { backend: Backend },

    #[error("{backend} response is missing `{field}`")]
    MissingField {
        backend: Backend,
        field: &'static str,
    },
}

/// Checks extracted from one backend call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Normalized {
    pub checks: Vec<CheckResult>,
    pub warnings: Vec<String>,
}

impl Normalized {
    fn warn(&mut self, backend: Backend, message: impl std::fmt::Display) {
        self.warnings.push(format!("{backend}: {message}"));
    }
}

/// Normalize one raw backend result.
pub fn normalize(raw: &RawResult) -> Result<Normalized, NormalizeError> {
    match raw.backend {
        Backend::Fuji => fuji::normalize(&raw.payload),
        Backend::Somef => somef::normalize(&raw.payload),
        Backend::Foops => foops::normalize(&raw.payload),
        Backend::Structure => structure::normalize(&raw.payload),
    }
}
