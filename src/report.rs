//! Turns scored champions into the ordered list of report pages.

use log::debug;

use crate::aggregate::{
    affinity_distribution, correlation_matrix, max_level_roster, rank_counts, top_n, RankedEntry,
};
use crate::config::{ReportConfig, SectionId};
use crate::metrics::{Metric, Role, ScoredChampion};
use crate::model::{Bar, BarChart, BarOrientation, Heatmap, PageContent, ReportPage, ValueFormat};
use crate::normalize::Attribute;

/// Diagnostic shown instead of the rank pages when no champion is at its level cap.
pub const EMPTY_ROSTER_MESSAGE: &str = "No champions found at max level for their rank.";

const TOP_HP: usize = 5;
const TOP_ROLE: usize = 5;
const TOP_SPEED: usize = 20;
const TOP_EHP: usize = 5;
const TOP_APPLIERS: usize = 5;

/// The pages of one report in output order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportPlan {
    pages: Vec<ReportPage>,
    empty_roster: bool,
}

impl ReportPlan {
    pub fn pages(&self) -> &[ReportPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<ReportPage> {
        self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Whether the rank pages were replaced by the empty-roster notice.
    pub fn has_empty_roster_notice(&self) -> bool {
        self.empty_roster
    }

    fn push(&mut self, section: SectionId, content: PageContent) {
        self.pages.push(ReportPage::new(section, content));
    }
}

/// Metrics included in the correlation heatmap for the configured level.
pub fn correlation_metrics(config: &ReportConfig) -> Vec<Metric> {
    let mut metrics: Vec<Metric> = Attribute::ALL.iter().copied().map(Metric::Attribute).collect();
    if config.level.correlates_ehp() {
        metrics.push(Metric::Ehp);
    }
    metrics
}

/// Top scorers of every role, in role order.
pub fn role_leaders(records: &[ScoredChampion]) -> Vec<(Role, Vec<RankedEntry>)> {
    Role::ALL
        .iter()
        .map(|role| (*role, top_n(records, Metric::RoleScore(*role), TOP_ROLE)))
        .collect()
}

fn ranked_chart(
    title: impl Into<String>,
    axis: impl Into<String>,
    entries: &[RankedEntry],
    format: ValueFormat,
) -> PageContent {
    PageContent::Bars(
        BarChart::new(title, axis).with_bars(
            entries
                .iter()
                .map(|entry| Bar::new(entry.name.clone(), entry.value, format)),
        ),
    )
}

fn top_metric_page(
    records: &[ScoredChampion],
    metric: Metric,
    count: usize,
    title: String,
    format: ValueFormat,
) -> PageContent {
    ranked_chart(title, metric.label(), &top_n(records, metric, count), format)
}

/// Builds the page list for `records` following the sections enabled in `config`.
pub fn plan_report(records: &[ScoredChampion], config: &ReportConfig) -> ReportPlan {
    let sections = config.enabled_sections();
    let enabled = |section: SectionId| sections.contains(&section);
    let mut plan = ReportPlan::default();

    if enabled(SectionId::TopHp) {
        plan.push(
            SectionId::TopHp,
            top_metric_page(
                records,
                Metric::Attribute(Attribute::Hp),
                TOP_HP,
                format!("Top {TOP_HP} Champions by HP"),
                ValueFormat::Natural,
            ),
        );
    }

    if enabled(SectionId::Affinity) {
        let chart = BarChart::new("Distribution of Champions by Affinity", "Number of Champions")
            .with_orientation(BarOrientation::Vertical)
            .with_category_axis(Some("Affinity".to_string()))
            .with_bars(
                affinity_distribution(records)
                    .into_iter()
                    .map(|(affinity, count)| {
                        Bar::new(affinity.label(), count as f64, ValueFormat::Integer)
                    }),
            );
        plan.push(SectionId::Affinity, PageContent::Bars(chart));
    }

    if enabled(SectionId::Correlation) {
        let matrix = correlation_matrix(records, &correlation_metrics(config));
        plan.push(
            SectionId::Correlation,
            PageContent::Heatmap(Heatmap::new("Correlation Between Key Stats", matrix)),
        );
    }

    if enabled(SectionId::Roles) {
        for (role, leaders) in role_leaders(records) {
            plan.push(
                SectionId::Roles,
                ranked_chart(
                    format!("Top {TOP_ROLE} {} Champions", role.name()),
                    Metric::RoleScore(role).label(),
                    &leaders,
                    ValueFormat::Fixed(2),
                ),
            );
        }
    }

    if enabled(SectionId::TopSpeed) {
        plan.push(
            SectionId::TopSpeed,
            top_metric_page(
                records,
                Metric::Attribute(Attribute::Spd),
                TOP_SPEED,
                format!("Top {TOP_SPEED} Speediest Champions"),
                ValueFormat::Natural,
            ),
        );
    }

    if enabled(SectionId::TopEhp) {
        plan.push(
            SectionId::TopEhp,
            top_metric_page(
                records,
                Metric::Ehp,
                TOP_EHP,
                format!("Top {TOP_EHP} Champions by EHP"),
                ValueFormat::Integer,
            ),
        );
    }

    if enabled(SectionId::BuffRate) {
        plan.push(
            SectionId::BuffRate,
            top_metric_page(
                records,
                Metric::BuffRate,
                TOP_APPLIERS,
                format!("Top {TOP_APPLIERS} Buff Appliers"),
                ValueFormat::Fixed(2),
            ),
        );
    }

    if enabled(SectionId::DebuffRate) {
        plan.push(
            SectionId::DebuffRate,
            top_metric_page(
                records,
                Metric::DebuffRate,
                TOP_APPLIERS,
                format!("Top {TOP_APPLIERS} Debuff Appliers"),
                ValueFormat::Fixed(2),
            ),
        );
    }

    let roster = max_level_roster(records);

    if enabled(SectionId::MaxLevel) {
        let chart = BarChart::new("Champions at Max Level for Their Rank", "Rank").with_bars(
            roster.iter().filter_map(|record| {
                let rank = record.champion.rank?;
                Some(Bar::new(record.name(), f64::from(rank), ValueFormat::Integer))
            }),
        );
        plan.push(SectionId::MaxLevel, PageContent::Bars(chart));
    }

    if enabled(SectionId::RankCounts) || enabled(SectionId::RankRosters) {
        let counts = rank_counts(&roster);
        if counts.is_empty() {
            let section = if enabled(SectionId::RankCounts) {
                SectionId::RankCounts
            } else {
                SectionId::RankRosters
            };
            plan.push(section, PageContent::Notice(EMPTY_ROSTER_MESSAGE.to_string()));
            plan.empty_roster = true;
        } else {
            if enabled(SectionId::RankCounts) {
                let chart = BarChart::new(
                    "Number of Champions at Each Rank at Max Level",
                    "Number of Champions",
                )
                .with_orientation(BarOrientation::Vertical)
                .with_category_axis(Some("Rank".to_string()))
                .with_bars(counts.iter().map(|(rank, count)| {
                    Bar::new(rank.to_string(), *count as f64, ValueFormat::Integer)
                }));
                plan.push(SectionId::RankCounts, PageContent::Bars(chart));
            }

            if enabled(SectionId::RankRosters) {
                for &(rank, _) in &counts {
                    let bars = roster
                        .iter()
                        .filter(|record| record.champion.rank == Some(rank))
                        .map(|record| {
                            Bar::new(record.name(), f64::from(rank), ValueFormat::Integer)
                                .with_annotation(record.name())
                        });
                    let title = format!("Champions at Rank {rank} and Max Level");
                    let chart = BarChart::new(title, "Rank").with_bars(bars);
                    plan.push(SectionId::RankRosters, PageContent::Bars(chart));
                }
            }
        }
    }

    debug!("Planned {} report page(s)", plan.len());
    plan
}
