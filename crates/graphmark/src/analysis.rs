//! Comparative analysis
//!
//! Diffs the p50 latency of every query two results have in common and
//! rolls the per-query classifications up into a recommendation. Works
//! across runs (same backend, two snapshots) or across backends (two
//! `DatabaseResult`s from one run).

use crate::error::{GraphmarkError, GraphmarkResult};
use crate::queries::Category;
use crate::results::{BenchmarkResult, DatabaseResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Changes within ±5% are noise
pub const CHANGE_THRESHOLD_PERCENT: f64 = 5.0;

/// Direction of a latency change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeClass {
    Improved,
    Regressed,
    Unchanged,
}

impl ChangeClass {
    pub fn classify(change_percent: f64) -> Self {
        if change_percent < -CHANGE_THRESHOLD_PERCENT {
            ChangeClass::Improved
        } else if change_percent > CHANGE_THRESHOLD_PERCENT {
            ChangeClass::Regressed
        } else {
            ChangeClass::Unchanged
        }
    }
}

/// Overall verdict of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Average improvement above the threshold
    Continue,
    /// More queries regressed than improved
    RegressionWarning,
    DiminishingReturns,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Continue => "continue",
            Recommendation::RegressionWarning => "regression warning",
            Recommendation::DiminishingReturns => "diminishing returns",
        }
    }
}

/// One query present in both results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryComparison {
    pub name: String,
    pub category: Category,
    pub baseline_p50_ms: f64,
    pub target_p50_ms: f64,
    /// `(target - baseline) / baseline * 100`
    pub change_percent: f64,
    pub class: ChangeClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: String,
    pub target: String,
    pub queries: Vec<QueryComparison>,
    /// Queries that could not be compared: present on one side only,
    /// without timing, or with a zero baseline
    pub skipped: usize,
    pub improved: usize,
    pub regressed: usize,
    pub unchanged: usize,
    /// Mean improvement magnitude over improved queries, in percent
    pub avg_improvement_percent: f64,
    pub recommendation: Recommendation,
}

/// Percentage change of `target` relative to `baseline`
pub fn change_percent(baseline: f64, target: f64) -> f64 {
    (target - baseline) / baseline * 100.0
}

/// Compare two backend results query by query
pub fn compare_databases(
    baseline: &DatabaseResult,
    target: &DatabaseResult,
) -> GraphmarkResult<Comparison> {
    let target_names: HashSet<&str> = target.queries.iter().map(|q| q.name.as_str()).collect();
    let baseline_names: HashSet<&str> =
        baseline.queries.iter().map(|q| q.name.as_str()).collect();

    let mut skipped = target_names.difference(&baseline_names).count();
    let mut queries = Vec::new();

    for base in &baseline.queries {
        let Some(other) = target.query(&base.name) else {
            skipped += 1;
            continue;
        };
        let (Some(base_timing), Some(target_timing)) = (&base.timing, &other.timing) else {
            skipped += 1;
            continue;
        };
        if base_timing.p50_ms <= 0.0 {
            skipped += 1;
            continue;
        }

        let change = change_percent(base_timing.p50_ms, target_timing.p50_ms);
        queries.push(QueryComparison {
            name: base.name.clone(),
            category: base.category,
            baseline_p50_ms: base_timing.p50_ms,
            target_p50_ms: target_timing.p50_ms,
            change_percent: change,
            class: ChangeClass::classify(change),
        });
    }

    if queries.is_empty() {
        return Err(GraphmarkError::analysis(format!(
            "no comparable queries between {} and {} ({} skipped)",
            baseline.database, target.database, skipped
        )));
    }

    Ok(summarize(
        baseline.database.clone(),
        target.database.clone(),
        queries,
        skipped,
    ))
}

/// Compare one backend across two runs
pub fn compare_runs(
    baseline: &BenchmarkResult,
    target: &BenchmarkResult,
    database: &str,
) -> GraphmarkResult<Comparison> {
    let base_db = baseline.database(database).ok_or_else(|| {
        GraphmarkError::analysis(format!("baseline has no results for '{}'", database))
    })?;
    let target_db = target.database(database).ok_or_else(|| {
        GraphmarkError::analysis(format!("target has no results for '{}'", database))
    })?;

    let mut comparison = compare_databases(base_db, target_db)?;
    comparison.baseline = format!("{}@{}", database, label(baseline));
    comparison.target = format!("{}@{}", database, label(target));
    Ok(comparison)
}

/// Load two snapshot files and compare one backend
pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(
    baseline: P,
    target: Q,
    database: &str,
) -> GraphmarkResult<Comparison> {
    let baseline = BenchmarkResult::load_from(baseline)?;
    let target = BenchmarkResult::load_from(target)?;
    compare_runs(&baseline, &target, database)
}

fn label(result: &BenchmarkResult) -> String {
    result
        .commit
        .clone()
        .unwrap_or_else(|| result.timestamp.to_rfc3339())
}

fn summarize(
    baseline: String,
    target: String,
    queries: Vec<QueryComparison>,
    skipped: usize,
) -> Comparison {
    let count = |class| queries.iter().filter(|q| q.class == class).count();
    let improved = count(ChangeClass::Improved);
    let regressed = count(ChangeClass::Regressed);
    let unchanged = count(ChangeClass::Unchanged);

    let avg_improvement_percent = if improved == 0 {
        0.0
    } else {
        queries
            .iter()
            .filter(|q| q.class == ChangeClass::Improved)
            .map(|q| -q.change_percent)
            .sum::<f64>()
            / improved as f64
    };

    let recommendation = if avg_improvement_percent > CHANGE_THRESHOLD_PERCENT {
        Recommendation::Continue
    } else if regressed > improved {
        Recommendation::RegressionWarning
    } else {
        Recommendation::DiminishingReturns
    };

    Comparison {
        baseline,
        target,
        queries,
        skipped,
        improved,
        regressed,
        unchanged,
        avg_improvement_percent,
        recommendation,
    }
}

impl Comparison {
    pub fn regressions(&self) -> impl Iterator<Item = &QueryComparison> {
        self.queries
            .iter()
            .filter(|q| q.class == ChangeClass::Regressed)
    }

    /// Print a per-query table and the verdict
    pub fn print_summary(&self) {
        println!("\n=== {} → {} ===", self.baseline, self.target);
        println!(
            "{:<28} {:>12} {:>12} {:>10}",
            "Query", "Baseline", "Target", "Change"
        );
        println!("{}", "-".repeat(66));

        for q in &self.queries {
            let change_str = match q.class {
                // Green for improvement
                ChangeClass::Improved => format!("\x1b[32m{:+.1}%\x1b[0m", q.change_percent),
                // Red for regression
                ChangeClass::Regressed => format!("\x1b[31m{:+.1}%\x1b[0m", q.change_percent),
                ChangeClass::Unchanged => "~".to_string(),
            };
            println!(
                "{:<28} {:>12} {:>12} {:>10}",
                q.name,
                format!("{:.3}ms", q.baseline_p50_ms),
                format!("{:.3}ms", q.target_p50_ms),
                change_str
            );
        }

        println!(
            "\nImproved: {}  Regressed: {}  Unchanged: {}  Skipped: {}",
            self.improved, self.regressed, self.unchanged, self.skipped
        );
        println!(
            "Average improvement: {:.1}%  Recommendation: {}",
            self.avg_improvement_percent,
            self.recommendation.as_str()
        );

        let regressions: Vec<_> = self.regressions().collect();
        if !regressions.is_empty() {
            println!("\n\x1b[31m⚠️  Regressions detected:\x1b[0m");
            for reg in regressions {
                println!(
                    "  - {}: {:.3}ms → {:.3}ms ({:+.1}%)",
                    reg.name, reg.baseline_p50_ms, reg.target_p50_ms, reg.change_percent
                );
            }
        }
    }
}
