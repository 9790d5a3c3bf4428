//! The three pipeline steps with their own failure policy.

pub mod download;
pub mod footage;
pub mod script;

pub use download::{BatchDownloadStep, DownloadObserver};
pub use footage::{FootageAcquisitionStep, FootagePlan, FALLBACK_TERMS};
pub use script::{ResilientScriptStep, ScriptOutcome, DEFAULT_MIN_SCRIPT_CHARS};
