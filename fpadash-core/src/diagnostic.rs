//! Diagnostics surfaced to the caller instead of aborting a render

use crate::charts::ChartKind;
use crate::kpi::Metric;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What a diagnostic is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Scope {
    /// The workbook as a whole
    Workbook,
    /// One sheet, by exact name
    Sheet(String),
    /// One KPI
    Metric(Metric),
    /// One chart
    Chart(ChartKind),
}

impl Scope {
    /// Get the sheet name if this is a sheet scope
    pub fn sheet_name(&self) -> Option<&str> {
        match self {
            Scope::Sheet(name) => Some(name),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scope::Workbook => 0,
            Scope::Sheet(_) => 1,
            Scope::Metric(_) => 2,
            Scope::Chart(_) => 3,
        }
    }
}

impl PartialOrd for Scope {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scope {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scope::Sheet(a), Scope::Sheet(b)) => a.cmp(b),
            (Scope::Metric(a), Scope::Metric(b)) => a.cmp(b),
            (Scope::Chart(a), Scope::Chart(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Workbook => f.write_str("workbook"),
            Scope::Sheet(name) => write!(f, "sheet '{}'", name),
            Scope::Metric(metric) => write!(f, "metric '{}'", metric.label()),
            Scope::Chart(kind) => write!(f, "chart '{}'", kind.label()),
        }
    }
}

/// A warning or error attached to a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub scope: Scope,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(scope: Scope, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            scope,
            message: message.into(),
            severity,
        }
    }

    pub fn warning(scope: Scope, message: impl Into<String>) -> Self {
        Self::new(scope, message, Severity::Warning)
    }

    pub fn error(scope: Scope, message: impl Into<String>) -> Self {
        Self::new(scope, message, Severity::Error)
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scope
            .cmp(&other.scope)
            .then_with(|| other.severity.cmp(&self.severity))
            .then_with(|| self.message.cmp(&other.message))
    }
}
