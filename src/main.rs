mod data_loader;
mod error;
mod pipeline;
mod report;
mod report_context;
mod util;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use error::Result;
use report_context::ReportContext;

/*
    Score report for one team's games. The data source, team and table size come from
    report.toml (see `init`); the score cutoff is the only per-run input.
*/

#[derive(Parser)]
#[command(name = "lakers_report")]
#[command(about = "Game-by-game scoring report for one NBA team", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "report.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct SourceArgs {
    /// Named data source from the config
    #[arg(long)]
    source: Option<String>,
    /// Read games from this CSV or JSON file instead of a named source
    #[arg(long)]
    data: Option<PathBuf>,
    /// Team to report on (defaults to the configured team)
    #[arg(long)]
    team: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the report once
    Report {
        #[command(flatten)]
        source: SourceArgs,
        /// Minimum total score for a game to be included (defaults to the lowest total)
        #[arg(long)]
        threshold: Option<u32>,
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Render the report, then re-render for every threshold read from stdin
    Watch {
        #[command(flatten)]
        source: SourceArgs,
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the allowed threshold range for the team
    Bounds {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Write the default config file
    Init,
}

#[derive(Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let ctx = match ReportContext::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Report { source, threshold, format } => commands::report(&ctx, &source, threshold, format),
        Commands::Watch { source, format } => commands::watch(&ctx, &source, format),
        Commands::Bounds { source } => commands::bounds(&ctx, &source),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use std::io::{self, BufRead, Write};
    use std::path::Path;

    use crate::data_loader::{load_games, resolve_source, GameRecord};
    use crate::error::ReportError;
    use crate::pipeline::{filter_team, run_pipeline, threshold_bounds};
    use crate::report::{build_page, render_json, render_text, warning_page, Widget};

    pub fn team_name<'a>(ctx: &'a ReportContext, args: &'a SourceArgs) -> &'a str {
        args.team.as_deref().unwrap_or(&ctx.team_name)
    }

    pub fn render<W: Write>(ctx: &ReportContext, out: &mut W, page: &[Widget], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => render_text(out, page, ctx.bar_width),
            OutputFormat::Json => render_json(out, page),
        }
    }

    // Loads the games, or renders the warning page and returns None when there are none
    pub fn load_or_warn<W: Write>(
        ctx: &ReportContext,
        args: &SourceArgs,
        format: OutputFormat,
        out: &mut W,
    ) -> Result<Option<Vec<GameRecord>>> {
        let loaded = resolve_source(ctx, args.source.as_deref(), args.data.as_deref())
            .and_then(|path| load_games(path, ctx));

        match loaded {
            Ok(games) => Ok(Some(games)),
            Err(e) if e.is_data_unavailable() => {
                log::warn!("{}", e);
                render(ctx, out, &warning_page(team_name(ctx, args)), format)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn page_for(ctx: &ReportContext, games: &[GameRecord], team: &str, threshold: Option<u32>) -> Result<Vec<Widget>> {
        match run_pipeline(games, team, threshold, ctx) {
            Ok(report) => Ok(build_page(&report, ctx)),
            Err(e) if e.is_data_unavailable() => {
                log::warn!("{}", e);
                Ok(warning_page(team))
            }
            Err(e) => Err(e),
        }
    }

    pub fn report(ctx: &ReportContext, args: &SourceArgs, threshold: Option<u32>, format: OutputFormat) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let Some(games) = load_or_warn(ctx, args, format, &mut out)? else { return Ok(()) };

        let page = page_for(ctx, &games, team_name(ctx, args), threshold)?;
        render(ctx, &mut out, &page, format)
    }

    pub fn watch(ctx: &ReportContext, args: &SourceArgs, format: OutputFormat) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let Some(games) = load_or_warn(ctx, args, format, &mut out)? else { return Ok(()) };

        watch_games(ctx, &games, team_name(ctx, args), format, io::stdin().lock(), &mut out)
    }

    // The source is loaded once; every threshold line re-runs the whole report against it.
    pub fn watch_games<R: BufRead, W: Write>(
        ctx: &ReportContext,
        games: &[GameRecord],
        team: &str,
        format: OutputFormat,
        input: R,
        out: &mut W,
    ) -> Result<()> {
        let Some(bounds) = threshold_bounds(&filter_team(games, team)) else {
            log::warn!("No games found for {}", team);
            return render(ctx, out, &warning_page(team), format);
        };

        render(ctx, out, &page_for(ctx, games, team, None)?, format)?;
        out.flush()?;
        log::info!(
            "Enter a minimum total score between {} and {} (blank line or q to quit)",
            bounds.min, bounds.max
        );

        for line in input.lines() {
            let line = line?;
            let input = line.trim();

            if input.is_empty() || input.eq_ignore_ascii_case("q") { break; }

            let threshold = match input.parse::<u32>() {
                Ok(t) => t,
                Err(_) => {
                    log::warn!("Not a score: {:?}", input);
                    continue;
                }
            };

            render(ctx, out, &page_for(ctx, games, team, Some(threshold))?, format)?;
            out.flush()?;
        }

        Ok(())
    }

    pub fn bounds(ctx: &ReportContext, args: &SourceArgs) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let Some(games) = load_or_warn(ctx, args, OutputFormat::Text, &mut out)? else { return Ok(()) };
        let team = team_name(ctx, args);

        match threshold_bounds(&filter_team(&games, team)) {
            Some(bounds) => {
                writeln!(out, "Team:      {}", team)?;
                writeln!(out, "Range:     {} to {}", bounds.min, bounds.max)?;
                writeln!(out, "Default:   {}", bounds.default_threshold())?;
            }
            None => render(ctx, &mut out, &warning_page(team), OutputFormat::Text)?,
        }

        Ok(())
    }

    pub fn init(config_path: &Path) -> Result<()> {
        if config_path.exists() {
            return Err(ReportError::Config(format!("{} already exists", config_path.display())));
        }

        ReportContext::default().save(config_path)?;
        println!("Created default config at {}", config_path.display());
        println!("Point [sources] nba_vegas at your game log, then run 'lakers_report report'");

        Ok(())
    }
}
