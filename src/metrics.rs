//! Derived per-champion metrics: effective health, application rates and role scores.

use std::fmt;

use crate::normalize::{Attribute, Champion};

/// Effective health points, `HP * (1 + DEF / 100)`. Not clamped; negative DEF lowers it.
pub fn effective_health(hp: Option<f64>, def: Option<f64>) -> Option<f64> {
    Some(hp? * (1.0 + def? / 100.0))
}

/// How often a skill with the given cooldown lands per turn.
pub fn application_rate(cooldown: f64) -> Option<f64> {
    if cooldown.is_finite() && cooldown > 0.0 {
        Some(1.0 / cooldown)
    } else {
        None
    }
}

/// Gameplay roles champions are ranked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Tank,
    DamageDealer,
    Support,
    Debuffer,
    Healer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Tank,
        Role::DamageDealer,
        Role::Support,
        Role::Debuffer,
        Role::Healer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Role::Tank => "Tank",
            Role::DamageDealer => "Damage Dealer",
            Role::Support => "Support",
            Role::Debuffer => "Debuffer",
            Role::Healer => "Healer",
        }
    }

    /// Attribute weights of the role; they sum to 1.0.
    pub fn weights(self) -> &'static [(Attribute, f64)] {
        match self {
            Role::Tank => &[(Attribute::Def, 0.5), (Attribute::Hp, 0.5)],
            Role::DamageDealer => &[
                (Attribute::Atk, 0.5),
                (Attribute::CritRate, 0.25),
                (Attribute::CritDamage, 0.25),
            ],
            Role::Support => &[
                (Attribute::Hp, 0.4),
                (Attribute::Spd, 0.4),
                (Attribute::Acc, 0.2),
            ],
            Role::Debuffer => &[
                (Attribute::Acc, 0.5),
                (Attribute::Spd, 0.3),
                (Attribute::Hp, 0.2),
            ],
            Role::Healer => &[
                (Attribute::Hp, 0.4),
                (Attribute::Spd, 0.4),
                (Attribute::Res, 0.2),
            ],
        }
    }

    /// Weighted sum of the role's attributes; missing if any of them is missing.
    pub fn score(self, champion: &Champion) -> Option<f64> {
        self.weights()
            .iter()
            .map(|(attribute, weight)| champion.attributes.get(*attribute).map(|v| v * weight))
            .sum()
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values computed from a champion's raw attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DerivedMetrics {
    pub ehp: Option<f64>,
    pub buff_rate: Option<f64>,
    pub debuff_rate: Option<f64>,
    role_scores: [Option<f64>; 5],
}

impl DerivedMetrics {
    pub fn compute(champion: &Champion) -> Self {
        let mut role_scores = [None; 5];
        for role in Role::ALL {
            role_scores[role.index()] = role.score(champion);
        }
        Self {
            ehp: effective_health(
                champion.attributes.get(Attribute::Hp),
                champion.attributes.get(Attribute::Def),
            ),
            buff_rate: application_rate(champion.buff_cooldown),
            debuff_rate: application_rate(champion.debuff_cooldown),
            role_scores,
        }
    }

    pub fn role_score(&self, role: Role) -> Option<f64> {
        self.role_scores[role.index()]
    }
}

/// A champion together with its derived metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredChampion {
    pub champion: Champion,
    pub metrics: DerivedMetrics,
}

impl ScoredChampion {
    pub fn new(champion: Champion) -> Self {
        let metrics = DerivedMetrics::compute(&champion);
        Self { champion, metrics }
    }

    pub fn name(&self) -> &str {
        &self.champion.name
    }
}

/// Computes derived metrics for every champion, preserving order.
pub fn derive(champions: Vec<Champion>) -> Vec<ScoredChampion> {
    champions.into_iter().map(ScoredChampion::new).collect()
}

/// A numeric column that charts and aggregates can read from a [`ScoredChampion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Attribute(Attribute),
    Ehp,
    BuffRate,
    DebuffRate,
    RoleScore(Role),
    Rank,
}

impl Metric {
    pub fn value(self, record: &ScoredChampion) -> Option<f64> {
        match self {
            Metric::Attribute(attribute) => record.champion.attributes.get(attribute),
            Metric::Ehp => record.metrics.ehp,
            Metric::BuffRate => record.metrics.buff_rate,
            Metric::DebuffRate => record.metrics.debuff_rate,
            Metric::RoleScore(role) => record.metrics.role_score(role),
            Metric::Rank => record.champion.rank.map(f64::from),
        }
    }

    /// Short column label used on axes and in the correlation heatmap.
    pub fn label(self) -> String {
        match self {
            Metric::Attribute(attribute) => attribute.column().to_string(),
            Metric::Ehp => "EHP".to_string(),
            Metric::BuffRate => "Buff Application Rate".to_string(),
            Metric::DebuffRate => "Debuff Application Rate".to_string(),
            Metric::RoleScore(role) => format!("{} Score", role.name()),
            Metric::Rank => "Rank".to_string(),
        }
    }
}
