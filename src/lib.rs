//! # Program Report Builder
//!
//! A library for classifying flat collections of heterogeneous program
//! records into a two-level hierarchy and rolling them up into
//! statutory-style report matrices with consistent totals.
//!
//! ## Core Concepts
//!
//! - **Records**: capital subprojects, trainings, activities, staffing
//!   and office requirements, other expenses, owned by the caller and
//!   only read here
//! - **Classification**: Component -> Package paths from a fixed
//!   component set; unknown components are dropped observably
//! - **Temporal Bucketing**: optional date strings resolved to month
//!   slots against a target year; bad dates contribute zero
//! - **Rollup Integrity**: every parent summary is recomputed from its
//!   children, so the grand total always equals the sum of the leaves
//! - **Matrix Output**: one tree serves five report shapes as a grid of
//!   cells plus merge ranges, ready for tabular display or export
//!
//! ## Example
//!
//! ```rust,ignore
//! use program_report_builder::*;
//!
//! let records = RecordSet {
//!     subprojects: vec![SubprojectRecord {
//!         name: "Community Water System".to_string(),
//!         component: "Infrastructure Support".to_string(),
//!         package_type: Some("Potable Water".to_string()),
//!         target_date: Some("2023-03-15".to_string()),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let reference = CodeReference::new();
//! let filters = ReportFilters::for_year(ReportYear::Year(2023));
//!
//! let outcome = ReportProcessor::process(&records, &reference, &filters);
//! let grid = render_report(
//!     &records,
//!     &reference,
//!     &filters,
//!     ReportKind::PhysicalPlan,
//!     &ExpansionState::expand_all(&outcome.tree),
//! )?;
//! ```

pub mod classify;
pub mod engine;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod matrix;
pub mod normalize;
pub mod object_codes;
pub mod period;
pub mod rates;
pub mod schema;
pub mod utils;
pub mod verify;

pub use classify::{
    classify, package_display_order, Classification, Component, HierarchyPath,
};
pub use engine::{DroppedRecord, ReportEngine, ReportOutcome};
pub use error::{ReportError, Result};
pub use export::export_file_name;
pub use hierarchy::{
    Bar, CurrencySplit, FundFlow, GroupNode, Item, Measures, PackageNode, ReportTree,
    TreeBuilder,
};
pub use matrix::{
    build_grid, Cell, CellRole, CellValue, Column, ColumnField, ColumnGroup, ColumnPlan,
    ExpansionState, Grid, MergeRange, ReportKind,
};
pub use normalize::{merge_key, normalize_quantity, normalize_unit, Quantity};
pub use object_codes::{CodeReference, CodeResolution, ObjectType, DEFAULT_PARTICULAR};
pub use period::{
    bucket, bucket_month, BarItem, Bucket, BucketMode, PeriodCounter, PeriodIndex, ReportYear,
};
pub use rates::{disbursement_rate, obligation_rate, percentage, variance, NodeRates};
pub use schema::*;
pub use utils::natural_cmp;
pub use verify::{verify_rollup, VerificationReport};

use log::{debug, info, warn};

pub struct ReportProcessor;

impl ReportProcessor {
    /// Builds the component hierarchy for one filter configuration.
    /// Pure over (records, reference, filters); records whose component
    /// tag matched nothing come back in `dropped` and are logged as
    /// data-quality warnings.
    pub fn process(
        records: &RecordSet,
        reference: &CodeReference,
        filters: &ReportFilters,
    ) -> ReportOutcome {
        info!(
            "building component report for year {} over {} records",
            filters.year.label(),
            records.len()
        );

        let outcome = ReportEngine::new(filters, reference).build_component_tree(records);
        log_dropped(&outcome);
        debug!(
            "component tree carries {} top-level groups",
            outcome.tree.groups.len()
        );
        outcome
    }

    pub fn process_geographic(
        records: &RecordSet,
        reference: &CodeReference,
        filters: &ReportFilters,
    ) -> ReportOutcome {
        info!(
            "building geographic report for year {} over {} records",
            filters.year.label(),
            records.len()
        );

        let outcome = ReportEngine::new(filters, reference).build_geographic_tree(records);
        log_dropped(&outcome);
        outcome
    }

    /// Same build, followed by a full rollup consistency pass.
    pub fn process_with_verification(
        records: &RecordSet,
        reference: &CodeReference,
        filters: &ReportFilters,
        tolerance: f64,
    ) -> Result<ReportOutcome> {
        let outcome = Self::process(records, reference, filters);

        let verification = verify_rollup(&outcome.tree, tolerance)?;
        for warning in &verification.warnings {
            debug!("data quality: {}", warning);
        }

        Ok(outcome)
    }
}

fn log_dropped(outcome: &ReportOutcome) {
    for dropped in &outcome.dropped {
        warn!(
            "dropped {} '{}' with unknown component tag '{}'",
            dropped.kind, dropped.indicator, dropped.component_tag
        );
    }
}

pub fn build_report(
    records: &RecordSet,
    reference: &CodeReference,
    filters: &ReportFilters,
) -> ReportOutcome {
    ReportProcessor::process(records, reference, filters)
}

/// One entry point for all five report shapes: builds the matching
/// tree, derives the column plan, and flattens it under the supplied
/// expansion state.
pub fn render_report(
    records: &RecordSet,
    reference: &CodeReference,
    filters: &ReportFilters,
    kind: ReportKind,
    expansion: &ExpansionState,
) -> Result<Grid> {
    let outcome = match kind {
        ReportKind::Geographic => ReportProcessor::process_geographic(records, reference, filters),
        _ => ReportProcessor::process(records, reference, filters),
    };

    let plan = ColumnPlan::for_report(kind, &outcome.tree, reference);
    build_grid(&outcome.tree, &plan, expansion)
}
