//! Aggregates over scored champions: top-N lists, distributions, correlations and rosters.

use std::collections::BTreeMap;

use crate::metrics::{Metric, ScoredChampion};
use crate::normalize::Affinity;

/// Level cap of each rank.
pub const RANK_MAX_LEVELS: [(u32, u32); 6] = [(1, 10), (2, 20), (3, 30), (4, 40), (5, 50), (6, 60)];

/// One entry of a top-N list.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedEntry {
    pub name: String,
    pub value: f64,
}

/// The `n` records with the largest value of `metric`, largest first.
///
/// Records without a value or with a NaN value are skipped. Equal values keep their input order.
pub fn top_n(records: &[ScoredChampion], metric: Metric, n: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = records
        .iter()
        .filter_map(|record| {
            let value = metric.value(record).filter(|value| !value.is_nan())?;
            Some(RankedEntry {
                name: record.name().to_string(),
                value,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries.truncate(n);
    entries
}

/// Number of champions per affinity, most common first; ties keep first-seen order.
pub fn affinity_distribution(records: &[ScoredChampion]) -> Vec<(Affinity, usize)> {
    let mut counts: Vec<(Affinity, usize)> = Vec::new();
    for affinity in records.iter().filter_map(|record| record.champion.affinity) {
        match counts.iter_mut().find(|(seen, _)| *seen == affinity) {
            Some((_, count)) => *count += 1,
            None => counts.push((affinity, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Square matrix of pairwise Pearson coefficients with its column labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Builds a matrix from labels and row-major coefficients.
    pub fn new(labels: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        Self { labels, values }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Coefficient at `row`/`column`; NaN where it is undefined.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values
            .get(row)
            .and_then(|values| values.get(column))
            .copied()
            .unwrap_or(f64::NAN)
    }

    /// Coefficient between two labelled columns.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let row = self.labels.iter().position(|label| label == a)?;
        let column = self.labels.iter().position(|label| label == b)?;
        Some(self.get(row, column))
    }
}

/// Pearson coefficient over the observations where both values are present.
pub fn pearson(pairs: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return f64::NAN;
    }
    (cov / denominator).clamp(-1.0, 1.0)
}

/// Pairwise-complete correlation of `metrics` across `records`.
///
/// No records yields an empty matrix; otherwise every metric gets a row and column.
pub fn correlation_matrix(records: &[ScoredChampion], metrics: &[Metric]) -> CorrelationMatrix {
    if records.is_empty() {
        return CorrelationMatrix::default();
    }

    let columns: Vec<Vec<Option<f64>>> = metrics
        .iter()
        .map(|metric| records.iter().map(|record| metric.value(record)).collect())
        .collect();

    let mut values = vec![vec![f64::NAN; metrics.len()]; metrics.len()];
    for i in 0..metrics.len() {
        for j in i..metrics.len() {
            let pairs = columns[i]
                .iter()
                .zip(&columns[j])
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)));
            let coefficient = pearson(pairs);
            values[i][j] = coefficient;
            values[j][i] = coefficient;
        }
    }

    CorrelationMatrix {
        labels: metrics.iter().map(|metric| metric.label()).collect(),
        values,
    }
}

/// Champions sitting at the level cap of their rank, grouped by ascending rank.
pub fn max_level_roster(records: &[ScoredChampion]) -> Vec<&ScoredChampion> {
    RANK_MAX_LEVELS
        .iter()
        .flat_map(|&(rank, max_level)| {
            records.iter().filter(move |record| {
                record.champion.rank == Some(rank) && record.champion.level == Some(max_level)
            })
        })
        .collect()
}

/// Roster size per rank, ascending by rank.
pub fn rank_counts(roster: &[&ScoredChampion]) -> Vec<(u32, usize)> {
    let mut counts = BTreeMap::new();
    for rank in roster.iter().filter_map(|record| record.champion.rank) {
        *counts.entry(rank).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{Attribute, Attributes, Champion};

    fn champion(name: &str, hp: Option<f64>, affinity: Option<Affinity>) -> ScoredChampion {
        let mut attributes = Attributes::default()
            .with(Attribute::Def, 10.0)
            .with(Attribute::Spd, 100.0);
        attributes.set(Attribute::Hp, hp);
        ScoredChampion::new(Champion {
            name: name.to_string(),
            affinity,
            attributes,
            rank: None,
            level: None,
            buff_cooldown: 3.0,
            debuff_cooldown: 4.0,
        })
    }

    fn ranked(name: &str, rank: u32, level: u32) -> ScoredChampion {
        let mut record = champion(name, Some(1.0), None);
        record.champion.rank = Some(rank);
        record.champion.level = Some(level);
        record
    }

    fn names(entries: &[RankedEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn top_n_sorts_descending_with_stable_ties() {
        let records = vec![
            champion("a", Some(10.0), None),
            champion("b", Some(30.0), None),
            champion("c", Some(20.0), None),
            champion("d", Some(30.0), None),
            champion("e", None, None),
        ];
        let top = top_n(&records, Metric::Attribute(Attribute::Hp), 3);
        assert_eq!(names(&top), ["b", "d", "c"]);
        assert_eq!(top[0].value, 30.0);

        let all = top_n(&records, Metric::Attribute(Attribute::Hp), 10);
        assert_eq!(names(&all), ["b", "d", "c", "a"]);
    }

    #[test]
    fn top_n_drops_nan_values() {
        let records = vec![
            champion("a", Some(150.0), None),
            champion("nan", Some(f64::NAN), None),
            champion("c", Some(300.0), None),
            champion("d", Some(225.0), None),
        ];
        let top = top_n(&records, Metric::Attribute(Attribute::Hp), 5);
        assert_eq!(names(&top), ["c", "d", "a"]);

        let mut infinite = champion("inf", Some(f64::INFINITY), None);
        infinite.champion.attributes.set(Attribute::Def, Some(-100.0));
        let infinite = ScoredChampion::new(infinite.champion);
        let records = vec![champion("a", Some(150.0), None), infinite];
        assert_eq!(names(&top_n(&records, Metric::Ehp, 5)), ["a"]);
    }

    #[test]
    fn affinity_distribution_orders_by_count() {
        let records = vec![
            champion("a", None, Some(Affinity::Void)),
            champion("b", None, Some(Affinity::Magic)),
            champion("c", None, Some(Affinity::Magic)),
            champion("d", None, None),
            champion("e", None, Some(Affinity::Force)),
        ];
        assert_eq!(
            affinity_distribution(&records),
            vec![
                (Affinity::Magic, 2),
                (Affinity::Void, 1),
                (Affinity::Force, 1)
            ]
        );
        assert!(affinity_distribution(&[]).is_empty());
    }

    #[test]
    fn pearson_handles_degenerate_input() {
        assert!((pearson(vec![(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]) - 1.0).abs() < 1e-12);
        assert!((pearson(vec![(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]) + 1.0).abs() < 1e-12);
        assert!(pearson(vec![(1.0, 2.0)]).is_nan());
        assert!(pearson(vec![(1.0, 2.0), (1.0, 3.0)]).is_nan());
    }

    #[test]
    fn correlation_uses_pairwise_complete_rows() {
        let records = vec![
            champion("a", Some(1.0), None),
            champion("b", Some(2.0), None),
            champion("c", None, None),
            champion("d", Some(3.0), None),
        ];
        let metrics = [Metric::Attribute(Attribute::Hp), Metric::Ehp];
        let matrix = correlation_matrix(&records, &metrics);
        assert_eq!(matrix.labels(), ["HP", "EHP"]);
        let hp_ehp = matrix.between("HP", "EHP").expect("labels exist");
        assert!((hp_ehp - 1.0).abs() < 1e-12);

        let constant = correlation_matrix(&records, &[Metric::Attribute(Attribute::Spd)]);
        assert!(constant.get(0, 0).is_nan());
    }

    #[test]
    fn correlation_of_no_records_is_empty() {
        let matrix = correlation_matrix(&[], &[Metric::Attribute(Attribute::Hp)]);
        assert!(matrix.is_empty());
    }

    #[test]
    fn roster_matches_rank_caps() {
        let records = vec![
            ranked("a", 3, 30),
            ranked("b", 3, 29),
            ranked("c", 1, 10),
            ranked("d", 6, 60),
            ranked("e", 3, 30),
        ];
        let roster = max_level_roster(&records);
        let roster_names: Vec<&str> = roster.iter().map(|record| record.name()).collect();
        assert_eq!(roster_names, ["c", "a", "e", "d"]);
        assert_eq!(rank_counts(&roster), vec![(1, 1), (3, 2), (6, 1)]);
    }

    #[test]
    fn empty_roster_has_no_counts() {
        let records = vec![ranked("a", 2, 19)];
        let roster = max_level_roster(&records);
        assert!(roster.is_empty());
        assert!(rank_counts(&roster).is_empty());
    }
}
