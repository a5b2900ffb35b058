//! Run configuration: report level, invalid-value policy, enabled sections and paths.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then whatever the caller
//! (usually the command line) overrides on the returned [`ReportConfig`].  The enums implement
//! [`FromStr`] and [`Display`] with the same kebab-case spelling serde uses, so the file and the
//! command line accept identical values.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ReportError, Result};

/// Default input file name.
pub const DEFAULT_INPUT: &str = "champion_data.csv";

/// Placeholder buff cooldown used when the input carries no per-record value.
pub const DEFAULT_BUFF_COOLDOWN: f64 = 3.0;

/// Placeholder debuff cooldown used when the input carries no per-record value.
pub const DEFAULT_DEBUFF_COOLDOWN: f64 = 4.0;

/// Default title printed in the page header.
pub const DEFAULT_TITLE: &str = "Champion Report";

/// Which preset of sections a run renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportLevel {
    /// Top HP, affinity distribution and the attribute correlation heatmap.
    Basic,
    /// Every section; the correlation heatmap also covers EHP.
    #[default]
    Extended,
}

impl ReportLevel {
    /// Sections rendered when the configuration does not list them explicitly.
    pub fn default_sections(self) -> &'static [SectionId] {
        match self {
            ReportLevel::Basic => &[
                SectionId::TopHp,
                SectionId::Affinity,
                SectionId::Correlation,
            ],
            ReportLevel::Extended => SectionId::ALL,
        }
    }

    /// Output file used when none is configured.
    pub fn default_output(self) -> &'static str {
        match self {
            ReportLevel::Basic => "champion_report.pdf",
            ReportLevel::Extended => "champion_report_v4.pdf",
        }
    }

    /// Whether the correlation heatmap includes the EHP column.
    pub fn correlates_ehp(self) -> bool {
        matches!(self, ReportLevel::Extended)
    }

    fn as_str(self) -> &'static str {
        match self {
            ReportLevel::Basic => "basic",
            ReportLevel::Extended => "extended",
        }
    }
}

/// What happens to numeric cells that cannot be parsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidValuePolicy {
    /// Abort the run on the first invalid cell.
    Fail,
    /// Treat invalid cells as missing values.
    #[default]
    Skip,
}

impl InvalidValuePolicy {
    fn as_str(self) -> &'static str {
        match self {
            InvalidValuePolicy::Fail => "fail",
            InvalidValuePolicy::Skip => "skip",
        }
    }
}

/// Identifies one section of the report. Declaration order is page order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    TopHp,
    Affinity,
    Correlation,
    Roles,
    TopSpeed,
    TopEhp,
    BuffRate,
    DebuffRate,
    MaxLevel,
    RankCounts,
    RankRosters,
}

impl SectionId {
    /// Every section in page order.
    pub const ALL: &'static [SectionId] = &[
        SectionId::TopHp,
        SectionId::Affinity,
        SectionId::Correlation,
        SectionId::Roles,
        SectionId::TopSpeed,
        SectionId::TopEhp,
        SectionId::BuffRate,
        SectionId::DebuffRate,
        SectionId::MaxLevel,
        SectionId::RankCounts,
        SectionId::RankRosters,
    ];

    /// The kebab-case identifier used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::TopHp => "top-hp",
            SectionId::Affinity => "affinity",
            SectionId::Correlation => "correlation",
            SectionId::Roles => "roles",
            SectionId::TopSpeed => "top-speed",
            SectionId::TopEhp => "top-ehp",
            SectionId::BuffRate => "buff-rate",
            SectionId::DebuffRate => "debuff-rate",
            SectionId::MaxLevel => "max-level",
            SectionId::RankCounts => "rank-counts",
            SectionId::RankRosters => "rank-rosters",
        }
    }
}

/// Error returned when parsing one of the configuration enums from text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseConfigValueError {
    kind: &'static str,
    value: String,
    expected: Vec<&'static str>,
}

impl fmt::Display for ParseConfigValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}'; expected one of: {}",
            self.kind,
            self.value,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for ParseConfigValueError {}

fn parse_named<T: Copy>(
    kind: &'static str,
    value: &str,
    candidates: &[(T, &'static str)],
) -> std::result::Result<T, ParseConfigValueError> {
    let needle = value.trim().to_ascii_lowercase().replace('_', "-");
    candidates
        .iter()
        .find(|(_, name)| *name == needle)
        .map(|(item, _)| *item)
        .ok_or_else(|| ParseConfigValueError {
            kind,
            value: value.to_string(),
            expected: candidates.iter().map(|(_, name)| *name).collect(),
        })
}

impl FromStr for ReportLevel {
    type Err = ParseConfigValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_named(
            "report level",
            s,
            &[
                (ReportLevel::Basic, ReportLevel::Basic.as_str()),
                (ReportLevel::Extended, ReportLevel::Extended.as_str()),
            ],
        )
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvalidValuePolicy {
    type Err = ParseConfigValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_named(
            "invalid-value policy",
            s,
            &[
                (InvalidValuePolicy::Fail, InvalidValuePolicy::Fail.as_str()),
                (InvalidValuePolicy::Skip, InvalidValuePolicy::Skip.as_str()),
            ],
        )
    }
}

impl fmt::Display for InvalidValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = ParseConfigValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let candidates: Vec<_> = SectionId::ALL
            .iter()
            .map(|section| (*section, section.as_str()))
            .collect();
        parse_named("section", s, &candidates)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete configuration of one report run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// CSV file to read.
    pub input: PathBuf,
    /// PDF file to write; defaults depend on the level.
    pub output: Option<PathBuf>,
    /// Section preset and correlation column set.
    pub level: ReportLevel,
    /// Handling of unparseable numeric cells.
    pub on_invalid: InvalidValuePolicy,
    /// Explicit section list replacing the level preset.
    pub sections: Option<Vec<SectionId>>,
    /// Buff cooldown used for records without their own value.
    pub buff_cooldown: f64,
    /// Debuff cooldown used for records without their own value.
    pub debuff_cooldown: f64,
    /// Embed a PDF outline entry per page (requires the `bookmarks` feature).
    pub bookmarks: bool,
    /// Title printed in every page header.
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: None,
            level: ReportLevel::default(),
            on_invalid: InvalidValuePolicy::default(),
            sections: None,
            buff_cooldown: DEFAULT_BUFF_COOLDOWN,
            debuff_cooldown: DEFAULT_DEBUFF_COOLDOWN,
            bookmarks: false,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl ReportConfig {
    /// Reads a TOML configuration file. Keys that are absent keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ReportError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// The output path, falling back to the level default.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.level.default_output()))
    }

    /// Enabled sections, deduplicated and in page order.
    pub fn enabled_sections(&self) -> Vec<SectionId> {
        let mut sections = match &self.sections {
            Some(sections) => sections.clone(),
            None => self.level.default_sections().to_vec(),
        };
        sections.sort();
        sections.dedup();
        sections
    }

    /// Whether a section is part of this run.
    pub fn is_enabled(&self, section: SectionId) -> bool {
        self.enabled_sections().contains(&section)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("buff_cooldown", self.buff_cooldown),
            ("debuff_cooldown", self.debuff_cooldown),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ReportError::invalid_config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
