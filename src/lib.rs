//! Seuscope - Outcome classification and error-rate statistics for SEU fault-injection campaigns
//!
//! This library takes the parsed logs of a fault-injection campaign (one record
//! per run plus the golden reference), classifies every run as SEFI, SDC or
//! no-effect, and aggregates the classes over the register hierarchy with
//! confidence bands, windowed rates and injection-space probability models.

pub mod aggregate;
pub mod campaign;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod outcome;
pub mod probability;
pub mod rate;
pub mod record;
pub mod register_tree;
pub mod report;
