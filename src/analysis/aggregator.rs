//! State and district aggregation.
//!
//! Both aggregators take a raw dashboard payload, normalize it, rank it and
//! compute the domain's averages. They differ in what they report and in how
//! they treat an empty collection.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::analysis::{normalize_records, rank, round2};
use crate::domain::{Domain, EmptyChildren, Passthrough, SummaryField};
use crate::error::PipelineError;
use crate::models::{
    AggregateSummary, DateRange, EntityAggregate, EntitySummary, PassthroughContext,
    RankedCollection, Record, RecordCollection, StateAggregate,
};

/// Arithmetic mean of `field` rounded to 2 decimals. Records lacking the
/// field count as 0. `None` for an empty slice.
pub fn mean_of(records: &[Record], field: &str) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: f64 = records.iter().map(|r| r.number_or(field, 0.0)).sum();
    Some(round2(sum / records.len() as f64))
}

/// Averages for every field in `fields`, or `None` for an empty slice.
pub fn summarize(records: &[Record], fields: &[SummaryField]) -> Option<AggregateSummary> {
    let mut summary = AggregateSummary::default();
    for f in fields {
        summary.push(f.label, mean_of(records, f.field)?);
    }
    Some(summary)
}

/// Rank all districts of the state and summarize them.
pub fn aggregate_state(domain: &Domain, payload: Value) -> Result<StateAggregate, PipelineError> {
    let mut collection = RecordCollection::from_payload(payload, domain.label, "state")?;
    info!(
        "Processing state {} data with {} districts",
        domain.label,
        collection.len()
    );

    normalize_records(&mut collection.records);

    let ranked = rank(
        collection.records.clone(),
        &domain.metric,
        &domain.tie_break,
        domain.label,
    )?;
    let extrema = ranked.extrema().ok_or(PipelineError::EmptyCollection {
        domain: domain.label,
        operation: "rank",
    })?;
    let averages =
        summarize(&collection.records, domain.summary_fields).ok_or(PipelineError::EmptyCollection {
            domain: domain.label,
            operation: "average",
        })?;

    let metric = domain.metric.field;
    info!(
        "Top district: {} with {} {}",
        extrema.best.name,
        metric,
        extrema.best.number_or(metric, domain.metric.missing)
    );
    info!(
        "Bottom district: {} with {} {}",
        extrema.worst.name,
        metric,
        extrema.worst.number_or(metric, domain.metric.missing)
    );

    Ok(StateAggregate {
        top: extrema.best,
        bottom: extrema.worst,
        averages,
        ranks: ranked.rank_map(),
        total_entities: ranked.len(),
        context: passthrough(domain, &collection.context),
        collection,
    })
}

/// Rank the blocks of one district and summarize them.
///
/// An empty block list fails for domains configured with
/// [`EmptyChildren::Fail`] and yields an empty summary otherwise.
pub fn aggregate_entity(domain: &Domain, payload: Value) -> Result<EntityAggregate, PipelineError> {
    let mut collection = RecordCollection::from_payload(payload, domain.label, "district")?;
    info!(
        "Processing district {} data with {} blocks",
        domain.label,
        collection.len()
    );

    normalize_records(&mut collection.records);
    let context = passthrough(domain, &collection.context);

    if collection.is_empty() && domain.empty_children == EmptyChildren::ReportAbsent {
        warn!("District {} data has no blocks", domain.label);
        return Ok(EntityAggregate {
            blocks: RankedCollection::default(),
            district_summary: EntitySummary {
                total_blocks: 0,
                averages: None,
                best_performing_block: None,
                best_metric: None,
                worst_performing_block: None,
                worst_metric: None,
                context,
            },
        });
    }

    let averages = summarize(&collection.records, domain.summary_fields);
    let total_blocks = collection.len();
    let blocks = rank(
        collection.records,
        &domain.metric,
        &domain.tie_break,
        domain.label,
    )?;
    debug!("Block ranking: {:?}", blocks.names());
    let extrema = blocks.extrema();

    let metric = domain.metric.field;
    let metric_of = |r: &Record| r.number_or(metric, domain.metric.missing);
    if let Some(pair) = &extrema {
        info!(
            "Best block: {} with {} {}",
            pair.best.name,
            metric,
            metric_of(&pair.best)
        );
        info!(
            "Worst block: {} with {} {}",
            pair.worst.name,
            metric,
            metric_of(&pair.worst)
        );
    }

    Ok(EntityAggregate {
        district_summary: EntitySummary {
            total_blocks,
            averages,
            best_performing_block: extrema.as_ref().map(|p| p.best.name.clone()),
            best_metric: extrema.as_ref().map(|p| metric_of(&p.best)),
            worst_performing_block: extrema.as_ref().map(|p| p.worst.name.clone()),
            worst_metric: extrema.as_ref().map(|p| metric_of(&p.worst)),
            context,
        },
        blocks,
    })
}

fn passthrough(domain: &Domain, context: &Map<String, Value>) -> PassthroughContext {
    match domain.passthrough {
        Passthrough::None => PassthroughContext::default(),
        Passthrough::DateRange { start, end } => {
            let text = |key: &str| {
                context
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            PassthroughContext {
                date_range: Some(DateRange {
                    start: text(start),
                    end: text(end),
                }),
                ..Default::default()
            }
        }
        Passthrough::StateAverages { prev, curr } => {
            let number = |key: &str| round2(context.get(key).and_then(Value::as_f64).unwrap_or(0.0));
            PassthroughContext {
                state_avg_prev: Some(number(prev)),
                state_avg_curr: Some(number(curr)),
                ..Default::default()
            }
        }
    }
}
