use std::error::Error;
use std::path::PathBuf;

use champion_report::config::{InvalidValuePolicy, ReportConfig, ReportLevel, SectionId};
use champion_report::pipeline;
use clap::{ArgAction, Parser};
use env_logger::{Builder, Env};
use log::debug;

/// Generates a PDF chart report from a champion stats CSV.
///
/// Fonts are read from `assets/fonts` next to the binary or from the directory named by
/// `CHAMPION_REPORT_FONTS_DIR`; installed DejaVu, Liberation or Arial fonts are used otherwise.
#[derive(Parser, Debug)]
#[command(author, version, about = "Champion stats PDF report generator")]
struct Cli {
    /// CSV file with one champion per row.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Destination PDF file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Section preset: `basic` or `extended`.
    #[arg(long)]
    level: Option<ReportLevel>,

    /// What to do with unparseable numeric cells: `fail` or `skip`.
    #[arg(long = "on-invalid")]
    on_invalid: Option<InvalidValuePolicy>,

    /// Render only the named section; repeat to select several.
    #[arg(long = "section", value_name = "SECTION")]
    sections: Vec<SectionId>,

    /// Buff cooldown for champions without a `Buff_Skill_Cooldown` value.
    #[arg(long = "buff-cooldown")]
    buff_cooldown: Option<f64>,

    /// Debuff cooldown for champions without a `Debuff_Skill_Cooldown` value.
    #[arg(long = "debuff-cooldown")]
    debuff_cooldown: Option<f64>,

    /// Add a PDF outline entry for every page.
    #[arg(long)]
    bookmarks: bool,

    /// TOML file with report settings; command-line flags take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<ReportConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_file(path)?,
            None => ReportConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = Some(output);
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(on_invalid) = self.on_invalid {
            config.on_invalid = on_invalid;
        }
        if !self.sections.is_empty() {
            config.sections = Some(self.sections);
        }
        if let Some(cooldown) = self.buff_cooldown {
            config.buff_cooldown = cooldown;
        }
        if let Some(cooldown) = self.debuff_cooldown {
            config.debuff_cooldown = cooldown;
        }
        if self.bookmarks {
            config.bookmarks = true;
        }

        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = cli.into_config().and_then(|config| {
        debug!("Resolved configuration: {:?}", config);
        pipeline::run(&config).map_err(Into::into)
    });

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
