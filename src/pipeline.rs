//! End-to-end report run: load, normalize, derive, plan, render and write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::builder::ReportBuilder;
use crate::config::{ReportConfig, SectionId};
use crate::error::{ReportError, Result};
use crate::loader::RawTable;
use crate::metrics::{derive, ScoredChampion};
use crate::normalize::{normalize, NormalizeOptions};
use crate::report::{plan_report, role_leaders, ReportPlan, EMPTY_ROSTER_MESSAGE};

/// What a finished run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub champions: usize,
    pub pages: usize,
    pub bytes: usize,
}

/// Loaded and scored champions ready for planning.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub table: RawTable,
    pub records: Vec<ScoredChampion>,
}

fn console_error(err: io::Error) -> ReportError {
    ReportError::Io {
        path: PathBuf::from("<stdout>"),
        source: err,
    }
}

/// Loads the input and computes every derived metric, printing the column type dump.
pub fn analyze<W: Write>(config: &ReportConfig, console: &mut W) -> Result<Analysis> {
    config.validate()?;

    let table = RawTable::from_path(&config.input)?;
    print_column_kinds(&table, console).map_err(console_error)?;

    let champions = normalize(
        &table,
        &NormalizeOptions {
            on_invalid: config.on_invalid,
            default_buff_cooldown: config.buff_cooldown,
            default_debuff_cooldown: config.debuff_cooldown,
        },
    )?;
    let records = derive(champions);
    info!(
        "Analyzed {} champion(s) from {}",
        records.len(),
        config.input.display()
    );

    Ok(Analysis { table, records })
}

fn print_column_kinds<W: Write>(table: &RawTable, console: &mut W) -> io::Result<()> {
    let kinds = table.column_kinds();
    let width = kinds.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, kind) in kinds {
        writeln!(console, "{name:<width$}  {kind}")?;
    }
    writeln!(console)
}

fn print_role_leaders<W: Write>(records: &[ScoredChampion], console: &mut W) -> io::Result<()> {
    for (role, leaders) in role_leaders(records) {
        writeln!(console, "Top 5 {} Champions:", role.name())?;
        for entry in leaders {
            writeln!(console, "  {:<24} {:.2}", entry.name, entry.value)?;
        }
        writeln!(console)?;
    }
    Ok(())
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runs the whole pipeline, writing console output to `console`.
pub fn run_with_console<W: Write>(config: &ReportConfig, console: &mut W) -> Result<RunSummary> {
    let analysis = analyze(config, console)?;
    let plan: ReportPlan = plan_report(&analysis.records, config);

    if config.is_enabled(SectionId::Roles) {
        print_role_leaders(&analysis.records, console).map_err(console_error)?;
    }
    if plan.has_empty_roster_notice() {
        writeln!(console, "{EMPTY_ROSTER_MESSAGE}").map_err(console_error)?;
    }

    let rendered = ReportBuilder::new(config.title.clone())
        .with_source_name(source_name(analysis.table.source()))
        .with_bookmarks(config.bookmarks)
        .add_pages(plan.into_pages())
        .render()?;

    let output = config.output_path();
    fs::write(&output, &rendered.bytes).map_err(|source| ReportError::Write {
        path: output.clone(),
        source,
    })?;
    info!("Wrote {} ({} bytes)", output.display(), rendered.bytes.len());
    writeln!(console, "Report saved to {}", output.display()).map_err(console_error)?;

    Ok(RunSummary {
        output,
        champions: analysis.records.len(),
        pages: rendered.page_count,
        bytes: rendered.bytes.len(),
    })
}

/// Runs the whole pipeline, printing to standard output.
pub fn run(config: &ReportConfig) -> Result<RunSummary> {
    let stdout = io::stdout();
    let mut console = stdout.lock();
    run_with_console(config, &mut console)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_csv(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("champion_data.csv");
        let mut file = fs::File::create(&path).expect("create csv");
        file.write_all(contents.as_bytes()).expect("write csv");
        path
    }

    #[test]
    fn analyze_prints_column_kinds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_csv(
            &dir,
            "Name,Affinity,HP,ATK,DEF,CritRate,CritDamage,SPD,ACC,RES,Rank,Level\n\
             A,1,100,10,50,0,0,10,10,10,1,10\n",
        );
        let config = ReportConfig {
            input,
            ..ReportConfig::default()
        };

        let mut console = Vec::new();
        let analysis = analyze(&config, &mut console).expect("analyze");
        let printed = String::from_utf8(console).expect("utf8");

        assert_eq!(analysis.records.len(), 1);
        assert_eq!(analysis.records[0].metrics.ehp, Some(150.0));
        assert!(printed.contains("Name        text"));
        assert!(printed.contains("HP          integer"));
    }

    #[test]
    fn analyze_rejects_invalid_config_before_loading() {
        let config = ReportConfig {
            input: PathBuf::from("/missing.csv"),
            buff_cooldown: -1.0,
            ..ReportConfig::default()
        };
        let err = analyze(&config, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig { .. }));
    }

    #[test]
    fn source_name_uses_file_name() {
        assert_eq!(source_name(Path::new("/data/champion_data.csv")), "champion_data.csv");
    }
}
