//! Ranking by a primary metric, with the inspection tie-break pass.

use std::cmp::Ordering;

use crate::domain::{MetricSpec, SortDirection, TieBreak};
use crate::error::PipelineError;
use crate::models::{RankedCollection, Record};

/// Rank records by `metric`, then apply `tie_break`.
///
/// The primary sort is stable, so records with equal metrics keep their
/// source order unless the tie-break pass moves them.
pub fn rank(
    mut records: Vec<Record>,
    metric: &MetricSpec,
    tie_break: &TieBreak,
    domain: &'static str,
) -> Result<RankedCollection, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyCollection {
            domain,
            operation: "rank",
        });
    }

    sort_by_metric(&mut records, metric);

    if let TieBreak::AdjacentPairSum { fields } = tie_break {
        adjacent_pair_pass(&mut records, metric, fields);
    }

    Ok(RankedCollection::from_ordered(records))
}

fn sort_by_metric(records: &mut [Record], metric: &MetricSpec) {
    records.sort_by(|a, b| {
        let a = a.number_or(metric.field, metric.missing);
        let b = b.number_or(metric.field, metric.missing);
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match metric.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

/// Single left-to-right pass over neighbours. When two adjacent records share
/// the primary metric and the second has the larger secondary sum, they swap.
///
/// This is not a sort: a record can sink past any number of tied neighbours
/// within the pass but rises at most one place, so a run of three or more
/// ties is only partially ordered.
fn adjacent_pair_pass(records: &mut [Record], metric: &MetricSpec, fields: &[&str; 2]) {
    let secondary = |r: &Record| fields.iter().map(|f| r.number_or(f, 0.0)).sum::<f64>();

    for i in 0..records.len().saturating_sub(1) {
        let here = records[i].number_or(metric.field, metric.missing);
        let next = records[i + 1].number_or(metric.field, metric.missing);
        if here != next {
            continue;
        }
        if secondary(&records[i]) < secondary(&records[i + 1]) {
            records.swap(i, i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{INSPECTION, WORK_MANAGEMENT, ZERO_MUSTER};
    use serde_json::json;

    fn inspection(name: &str, marks: f64, dpc: u64, adpc: u64) -> Record {
        serde_json::from_value(json!({
            "group_name": name,
            "total_visit_marks": marks,
            "dpc_ws_visited": dpc,
            "adpc_ws_visited": adpc
        }))
        .unwrap()
    }

    fn zero_muster(name: &str, pct: f64) -> Record {
        serde_json::from_value(json!({"group_name": name, "zero_attendance_percentage": pct}))
            .unwrap()
    }

    fn rank_inspection(records: Vec<Record>) -> RankedCollection {
        rank(records, &INSPECTION.metric, &INSPECTION.tie_break, INSPECTION.label).unwrap()
    }

    #[test]
    fn test_ranks_are_a_permutation() {
        let records = (0..7)
            .map(|i| inspection(&format!("D{}", i), (i % 3) as f64, i, 0))
            .collect();
        let ranked = rank_inspection(records);

        let mut ranks: Vec<usize> = ranked.entries().iter().map(|e| e.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_descending_puts_maximum_first() {
        let records = vec![
            inspection("A", 2.5, 0, 0),
            inspection("B", 5.75, 0, 0),
            inspection("C", 4.0, 0, 0),
        ];
        let ranked = rank_inspection(records);
        assert_eq!(ranked.names(), vec!["B", "C", "A"]);
        assert_eq!(ranked.entries()[0].rank, 1);
    }

    #[test]
    fn test_ascending_puts_minimum_first() {
        let records = vec![
            zero_muster("Hi", 30.0),
            zero_muster("Lo", 1.5),
            zero_muster("Mid", 12.0),
        ];
        let ranked = rank(records, &ZERO_MUSTER.metric, &ZERO_MUSTER.tie_break, "zero muster")
            .unwrap();
        assert_eq!(ranked.names(), vec!["Lo", "Mid", "Hi"]);
    }

    #[test]
    fn test_missing_zero_attendance_ranks_last() {
        let missing: Record = serde_json::from_value(json!({"group_name": "Unknown"})).unwrap();
        let records = vec![missing, zero_muster("Known", 99.0)];
        let ranked = rank(records, &ZERO_MUSTER.metric, &ZERO_MUSTER.tie_break, "zero muster")
            .unwrap();
        assert_eq!(ranked.names(), vec!["Known", "Unknown"]);
    }

    #[test]
    fn test_adjacent_tie_swaps_on_larger_visit_sum() {
        let records = vec![inspection("A", 6.0, 1, 0), inspection("B", 6.0, 2, 2)];
        let ranked = rank_inspection(records);
        assert_eq!(ranked.names(), vec!["B", "A"]);
    }

    #[test]
    fn test_tie_break_scenario() {
        let records = vec![
            inspection("A", 6.0, 3, 2),
            inspection("B", 6.0, 1, 1),
            inspection("C", 4.0, 0, 0),
        ];
        let ranked = rank_inspection(records);

        assert_eq!(ranked.names(), vec!["A", "B", "C"]);
        let ranks = ranked.rank_map();
        assert_eq!(ranks["A"], 1);
        assert_eq!(ranks["B"], 2);
        assert_eq!(ranks["C"], 3);
    }

    #[test]
    fn test_three_way_tie_is_only_partially_ordered() {
        // Visit sums 1, 2, 3. A full sort would give Z, Y, X; the single pass
        // swaps (X, Y) then (X, Z) and stops.
        let records = vec![
            inspection("X", 6.0, 1, 0),
            inspection("Y", 6.0, 1, 1),
            inspection("Z", 6.0, 2, 1),
        ];
        let ranked = rank_inspection(records);
        assert_eq!(ranked.names(), vec!["Y", "Z", "X"]);
    }

    #[test]
    fn test_three_way_tie_leaves_late_winner_behind() {
        // Sums 2, 1, 3: only the (Y, Z) pair swaps, so Z never reaches the top.
        let records = vec![
            inspection("X", 3.0, 2, 0),
            inspection("Y", 3.0, 1, 0),
            inspection("Z", 3.0, 3, 0),
        ];
        let ranked = rank_inspection(records);
        assert_eq!(ranked.names(), vec!["X", "Z", "Y"]);
    }

    #[test]
    fn test_no_tie_break_keeps_source_order() {
        let wm = |name: &str, total: f64, prev: u64| -> Record {
            serde_json::from_value(json!({
                "group_name": name,
                "work_management_total": total,
                "dpc_ws_visited": prev
            }))
            .unwrap()
        };
        let records = vec![wm("First", 8.0, 0), wm("Second", 8.0, 9), wm("Low", 1.0, 0)];
        let ranked = rank(
            records,
            &WORK_MANAGEMENT.metric,
            &WORK_MANAGEMENT.tie_break,
            WORK_MANAGEMENT.label,
        )
        .unwrap();
        assert_eq!(ranked.names(), vec!["First", "Second", "Low"]);
    }

    #[test]
    fn test_empty_input_fails() {
        let err = rank(Vec::new(), &INSPECTION.metric, &INSPECTION.tie_break, "inspection")
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyCollection {
                operation: "rank",
                ..
            }
        ));
    }
}
