use anyhow::Result;
use chrono::NaiveDate;
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::archive::config::load_config;
use crate::archive::dates::{DateRange, parse_date};
use crate::archive::paths::resolve_paths;
use crate::archive::report::StderrReporter;
use crate::archive::version::VersionComponent;
use crate::commands::make_latest::{self, MakeLatestOptions};
use crate::commands::reprocess::{self, ReprocessOptions, ReprocessTarget};
use crate::commands::resolve_path::{self, ResolvePathOptions};
use crate::commands::{CommandReport, status};

#[derive(Parser)]
#[command(name = "dbp")]
#[command(version, about = "Versioned science-data archive tooling")]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    /// Print progress notes to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Symlink the newest version of each date into a stable directory.
    MakeLatest(MakeLatestArgs),
    /// Queue every input file of a processing code for reprocessing.
    ReprocessByCode(ReprocessArgs),
    /// Queue every file of a product for reprocessing.
    ReprocessByProduct(ReprocessArgs),
    /// Expand a path template for a catalogued file.
    ResolvePath(ResolvePathArgs),
    /// Show resolved paths and effective configuration.
    Status,
}

#[derive(Args)]
struct MakeLatestArgs {
    /// Directory holding the versioned files.
    indir: PathBuf,
    /// Glob selecting candidate files inside the input directory.
    #[arg(short, long)]
    glob: Option<String>,
    /// Remove existing links from the output directory before linking.
    #[arg(short, long)]
    delete: bool,
    /// Replace existing links of the same name.
    #[arg(short, long)]
    force: bool,
    /// Output directory for the links (default: <indir>/latest).
    #[arg(short, long)]
    outdir: Option<PathBuf>,
}

#[derive(Args)]
struct ReprocessArgs {
    /// Code or product name.
    name: String,
    /// First date to reprocess (YYYY-MM-DD).
    #[arg(short, long = "startDate", alias = "start-date", value_parser = parse_date_arg)]
    start_date: Option<NaiveDate>,
    /// Last date to reprocess, inclusive (YYYY-MM-DD).
    #[arg(short, long = "endDate", alias = "end-date", value_parser = parse_date_arg)]
    end_date: Option<NaiveDate>,
    /// Version component to bump: 0 interface, 1 quality, 2 revision.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
    force: Option<u8>,
}

#[derive(Args)]
struct ResolvePathArgs {
    /// Template with {TOKEN} markers.
    #[arg(short, long)]
    template: String,
    /// Catalogued filename supplying date, time, version and lineage.
    #[arg(short, long)]
    file: String,
    /// Version to use instead of the catalogued one.
    #[arg(long, value_name = "VERSION")]
    version_override: Option<String>,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|err| format!("{err:#}"))
}

impl ReprocessArgs {
    fn into_options(self, target: fn(String) -> ReprocessTarget) -> Result<ReprocessOptions> {
        let bump = self
            .force
            .map(VersionComponent::try_from)
            .transpose()
            .map_err(anyhow::Error::msg)?;
        Ok(ReprocessOptions {
            target: target(self.name),
            range: DateRange {
                start: self.start_date,
                end: self.end_date,
            },
            bump,
        })
    }
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

/// Parse arguments, run the selected command and print its report.
/// Returns whether the command finished without issues.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    let reporter = StderrReporter {
        verbose: cli.verbose,
    };
    let cfg = load_config()?;
    let paths = resolve_paths()?;

    let report = match cli.command {
        Command::MakeLatest(args) => {
            let opts = MakeLatestOptions {
                indir: args.indir,
                glob: args.glob,
                outdir: args.outdir,
                delete: args.delete,
                force: args.force,
            };
            let dirs = make_latest::resolve_dirs(&opts, &cfg)?;
            if dirs.clobbers_input() {
                Cli::command()
                    .error(
                        ErrorKind::ArgumentConflict,
                        "outdir cannot be the same as indir, would clobber files",
                    )
                    .exit();
            }
            make_latest::run(&dirs, &opts, &cfg, &paths, &reporter)?
        }
        Command::ReprocessByCode(args) => {
            reprocess::run(&args.into_options(ReprocessTarget::Code)?, &cfg, &paths)?
        }
        Command::ReprocessByProduct(args) => {
            reprocess::run(&args.into_options(ReprocessTarget::Product)?, &cfg, &paths)?
        }
        Command::ResolvePath(args) => {
            let opts = ResolvePathOptions {
                template: args.template,
                file: args.file,
                version: args.version_override,
            };
            let (report, resolved) = resolve_path::run(&opts, &paths)?;
            if !cli.json {
                println!("{resolved}");
                return Ok(report.ok);
            }
            report
        }
        Command::Status => status::run(&cfg, &paths)?,
    };

    print_report(&report, cli.json)?;
    Ok(report.ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn make_latest_takes_exactly_one_directory() {
        assert!(Cli::try_parse_from(["dbp", "make-latest"]).is_err());
        assert!(Cli::try_parse_from(["dbp", "make-latest", "a", "b"]).is_err());
        let parsed = Cli::try_parse_from(["dbp", "make-latest", "a", "--force", "-g", "*.cdf"]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn reprocess_flags_are_validated() {
        let ok = Cli::try_parse_from([
            "dbp",
            "reprocess-by-product",
            "mag",
            "--startDate",
            "2012-10-02",
            "--endDate",
            "2012-10-25",
            "--force",
            "1",
        ]);
        assert!(ok.is_ok());
        assert!(Cli::try_parse_from(["dbp", "reprocess-by-code", "x", "--force", "3"]).is_err());
        assert!(
            Cli::try_parse_from(["dbp", "reprocess-by-code", "x", "--startDate", "10/02/2012"])
                .is_err()
        );
    }
}
