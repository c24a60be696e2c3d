//! Data models for the NREGS analysis pipelines.
//!
//! Records arrive from the dashboard API as loosely-shaped JSON objects. The
//! fields the aggregators rely on are typed here; everything else rides along
//! in an open map so schema additions on the dashboard side don't break us.

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::PipelineError;

/// Name of the collection field in every dashboard payload.
pub const RESULTS_FIELD: &str = "results";

/// One entity's metrics (a district or a block) for a reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Entity name as reported by the dashboard.
    #[serde(rename = "group_name")]
    pub name: String,
    /// Every other field of the record, in source order.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Numeric value of a field, if present and numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    /// Numeric value of a field, falling back to `default` when absent.
    pub fn number_or(&self, field: &str, default: f64) -> f64 {
        self.number(field).unwrap_or(default)
    }
}

/// An ordered set of records sharing a schema, plus the scalar fields the
/// source sent alongside them (period bounds, precomputed averages).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    pub records: Vec<Record>,
    pub context: Map<String, Value>,
}

impl RecordCollection {
    /// Split a dashboard payload into its `results` records and context fields.
    pub fn from_payload(
        payload: Value,
        domain: &'static str,
        scope: &'static str,
    ) -> Result<Self, PipelineError> {
        let malformed = |reason: String| PipelineError::MalformedData {
            domain,
            scope,
            reason,
        };

        let mut context = match payload {
            Value::Object(map) => map,
            other => {
                return Err(malformed(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let results = context
            .remove(RESULTS_FIELD)
            .ok_or_else(|| malformed(format!("missing `{}` field", RESULTS_FIELD)))?;

        let records: Vec<Record> = serde_json::from_value(results)
            .map_err(|e| malformed(format!("unreadable `{}`: {}", RESULTS_FIELD, e)))?;

        Ok(Self { records, context })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by exact entity name.
    pub fn find(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A record together with its 1-based position in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub rank: usize,
    #[serde(flatten)]
    pub record: Record,
}

/// Records in final ranked order. Ranks are always `1..=len` with no gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedCollection {
    entries: Vec<RankedRecord>,
}

impl RankedCollection {
    /// Assign ranks by position.
    pub fn from_ordered(records: Vec<Record>) -> Self {
        let entries = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| RankedRecord { rank: i + 1, record })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[RankedRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entity names in ranked order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.record.name.as_str()).collect()
    }

    /// Entity name to rank. A repeated name keeps its last rank.
    pub fn rank_map(&self) -> BTreeMap<String, usize> {
        self.entries
            .iter()
            .map(|e| (e.record.name.clone(), e.rank))
            .collect()
    }

    /// Best and worst records, or `None` for an empty ranking.
    pub fn extrema(&self) -> Option<ExtremaPair> {
        let best = self.entries.first()?;
        let worst = self.entries.last()?;
        Some(ExtremaPair {
            best: best.record.clone(),
            worst: worst.record.clone(),
        })
    }
}

/// First and last record of a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremaPair {
    pub best: Record,
    pub worst: Record,
}

/// Named averages over a collection, each rounded to 2 decimal places.
///
/// Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSummary {
    entries: Vec<(String, f64)>,
}

impl AggregateSummary {
    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.entries.push((label.into(), value));
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Serialize for AggregateSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Reporting period bounds forwarded from the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Scalars supplied by the source and forwarded unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassthroughContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_avg_prev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_avg_curr: Option<f64>,
}

/// Output of the state aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAggregate {
    pub top: Record,
    pub bottom: Record,
    pub averages: AggregateSummary,
    pub ranks: BTreeMap<String, usize>,
    pub total_entities: usize,
    pub context: PassthroughContext,
    /// Normalized state records, in source order.
    pub collection: RecordCollection,
}

impl StateAggregate {
    /// The part of the state aggregate that goes into reports.
    pub fn overview(&self) -> StateOverview {
        StateOverview {
            top_district: self.top.clone(),
            bottom_district: self.bottom.clone(),
            state_averages: self.averages.clone(),
            context: self.context.clone(),
        }
    }
}

/// Summary block of the entity aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub total_blocks: usize,
    /// Absent when the district reported no blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub averages: Option<AggregateSummary>,
    pub best_performing_block: Option<String>,
    pub best_metric: Option<f64>,
    pub worst_performing_block: Option<String>,
    pub worst_metric: Option<f64>,
    #[serde(flatten)]
    pub context: PassthroughContext,
}

/// Output of the entity aggregator: one district's ranked blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityAggregate {
    pub blocks: RankedCollection,
    pub district_summary: EntitySummary,
}

/// State-level section of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateOverview {
    pub top_district: Record,
    pub bottom_district: Record,
    pub state_averages: AggregateSummary,
    #[serde(flatten)]
    pub context: PassthroughContext,
}

/// District-level section of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSection {
    pub district_name: String,
    pub state_rank: Option<usize>,
    pub total_districts: usize,
    pub district_info: Option<Record>,
    pub details: EntityAggregate,
}

/// The full result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub date: NaiveDate,
    pub state_data: StateOverview,
    pub district_data: DistrictSection,
    pub analysis: String,
}
