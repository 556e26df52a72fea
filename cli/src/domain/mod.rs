//! Domain layer — pure types, validation, and extraction rules.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod echo;
pub mod error;
pub mod probe;
pub mod stack;

pub use config::{DeployConfig, VerifierKind};
pub use error::{CommandError, ConfigError, EngineError};
pub use probe::{
    HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse, ProbeOptions, ProbeResult,
    RetrySchedule,
};
pub use stack::{OutputSet, ResourceChanges, StackHandle, UpdateSummary};
