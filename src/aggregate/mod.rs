// Campaign-level error-rate tables
//
// Composes the register tree, the classifier and the rate estimators into the
// reports that get plotted: per-node class rates, per-child breakdowns,
// per-register stacked proportions, and sanity checks over equivalent
// injections.
//
// Every table is computed on demand from the campaign snapshot; nothing is
// cached between calls.

mod consistency;
mod rates;

pub use consistency::{consistency_check, InconsistentGroup, LabeledRun};
pub use rates::{
    adjusted_probability_for, confidence_interval_for, error_rate_by_type,
    error_rate_by_type_in_children, error_rate_summary, field_mismatch_rates,
    stacked_register_error_class, windowed_rate_for, ChildRates, FieldMismatch,
    FieldMismatchRates, RegisterClassProportions, RegisterErrorSummary,
};
