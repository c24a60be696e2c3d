//! The three metric domains.
//!
//! Each report type runs the same fetch/rank/summarize engine. A [`Domain`]
//! record carries everything that differs between them.

use std::fmt;

/// Direction in which the primary metric is ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Higher is better.
    Descending,
    /// Lower is better.
    Ascending,
}

/// The field a domain ranks by.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub field: &'static str,
    pub direction: SortDirection,
    /// Value used when a record lacks the field.
    pub missing: f64,
}

/// Secondary ordering applied after the primary sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    None,
    /// One adjacent-pair pass; neighbours with equal primary metric swap
    /// when the later one has the larger sum of `fields`.
    AdjacentPairSum { fields: [&'static str; 2] },
}

/// An average reported under `label`, computed over `field`.
#[derive(Debug, Clone, Copy)]
pub struct SummaryField {
    pub label: &'static str,
    pub field: &'static str,
}

/// Source scalars a domain forwards into its aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passthrough {
    None,
    DateRange {
        start: &'static str,
        end: &'static str,
    },
    StateAverages {
        prev: &'static str,
        curr: &'static str,
    },
}

/// What the entity aggregator does with a district that has no blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyChildren {
    /// Fail with `EmptyCollection`.
    Fail,
    /// Report absent best/worst blocks and no averages.
    ReportAbsent,
}

/// Which report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    Inspection,
    WorkManagement,
    ZeroMuster,
}

impl DomainKind {
    pub fn domain(self) -> &'static Domain {
        match self {
            DomainKind::Inspection => &INSPECTION,
            DomainKind::WorkManagement => &WORK_MANAGEMENT,
            DomainKind::ZeroMuster => &ZERO_MUSTER,
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.domain().label)
    }
}

/// Configuration of one metric domain.
#[derive(Debug)]
pub struct Domain {
    pub kind: DomainKind,
    /// Human-readable name used in logs and errors.
    pub label: &'static str,
    /// Prefix for artifact filenames.
    pub tag: &'static str,
    /// Path segment under the dashboard API base URL.
    pub endpoint: &'static str,
    pub metric: MetricSpec,
    pub tie_break: TieBreak,
    pub summary_fields: &'static [SummaryField],
    pub passthrough: Passthrough,
    pub empty_children: EmptyChildren,
}

impl Domain {
    /// Name of the run log kept for this report type.
    pub fn log_file_name(&self) -> String {
        format!("nregs_{}.log", self.tag)
    }
}

pub static INSPECTION: Domain = Domain {
    kind: DomainKind::Inspection,
    label: "inspection",
    tag: "inspection",
    endpoint: "inspection",
    metric: MetricSpec {
        field: "total_visit_marks",
        direction: SortDirection::Descending,
        missing: 0.0,
    },
    tie_break: TieBreak::AdjacentPairSum {
        fields: ["dpc_ws_visited", "adpc_ws_visited"],
    },
    summary_fields: &[
        SummaryField { label: "dpc_ws_visited", field: "dpc_ws_visited" },
        SummaryField { label: "adpc_ws_visited", field: "adpc_ws_visited" },
        SummaryField { label: "dpc_marks", field: "dpc_marks" },
        SummaryField { label: "adpc_marks", field: "adpc_marks" },
        SummaryField { label: "total_marks", field: "total_visit_marks" },
    ],
    passthrough: Passthrough::DateRange {
        start: "range_start",
        end: "range_end",
    },
    empty_children: EmptyChildren::Fail,
};

pub static WORK_MANAGEMENT: Domain = Domain {
    kind: DomainKind::WorkManagement,
    label: "work management",
    tag: "work_management",
    endpoint: "work-management",
    metric: MetricSpec {
        field: "work_management_total",
        direction: SortDirection::Descending,
        missing: 0.0,
    },
    tie_break: TieBreak::None,
    summary_fields: &[
        SummaryField { label: "prev_completion", field: "prev_completion" },
        SummaryField { label: "curr_completion", field: "curr_completion" },
        SummaryField { label: "marks_prev", field: "marks_prev" },
        SummaryField { label: "marks_curr", field: "marks_curr" },
        SummaryField { label: "total_marks", field: "work_management_total" },
    ],
    passthrough: Passthrough::StateAverages {
        prev: "state_avg_prev",
        curr: "state_avg_curr",
    },
    empty_children: EmptyChildren::ReportAbsent,
};

pub static ZERO_MUSTER: Domain = Domain {
    kind: DomainKind::ZeroMuster,
    label: "zero muster",
    tag: "zero_muster",
    endpoint: "zero-muster",
    metric: MetricSpec {
        field: "zero_attendance_percentage",
        direction: SortDirection::Ascending,
        missing: 100.0,
    },
    tie_break: TieBreak::None,
    summary_fields: &[
        SummaryField { label: "total_muster_issued", field: "total_muster_issued" },
        SummaryField { label: "total_zero_attendance", field: "total_zero_attendance" },
        SummaryField { label: "zero_attendance_percentage", field: "zero_attendance_percentage" },
        SummaryField { label: "zero_muster_marks", field: "zero_muster_marks" },
    ],
    passthrough: Passthrough::None,
    empty_children: EmptyChildren::ReportAbsent,
};
