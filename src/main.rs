use anyhow::Context;
use causal_profile_viz::{render, view};
use causal_profile_viz::{SortOrder, StderrWarnings, ToggleOutcome, Viewer};
use clap::{Parser, Subcommand};
use regex::Regex;
use tracing_subscriber::EnvFilter;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "causal-profile-viz")]
#[command(about = "Causal profile viewer", long_about = None)]
struct Cli {
    /// Log everything at trace level (otherwise RUST_LOG applies).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write plot data for a profile as JSON.
    Report {
        #[arg(long)]
        profile: String,

        #[arg(short = 'o', long)]
        out: String,

        /// Minimum measurements a progress point needs to be plotted.
        #[arg(long, default_value_t = 10)]
        min_points: usize,

        #[arg(long, value_enum, default_value_t)]
        sort: SortOrder,

        /// Hide a progress point (repeatable).
        #[arg(long)]
        disable: Vec<String>,

        /// Lower --min-points when it would leave nothing to plot.
        #[arg(long)]
        auto_relax: bool,
    },
    /// Print a text summary of a profile.
    Summary {
        #[arg(long)]
        profile: String,

        #[arg(long, default_value_t = 10)]
        min_points: usize,

        #[arg(long, value_enum, default_value_t)]
        sort: SortOrder,

        /// Only show locations matching this regex.
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        auto_relax: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &str, min_points: usize, sort: SortOrder, auto_relax: bool) -> Result<Viewer> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read profile file {}", path))?;
    let viewer = Viewer::load(&text, Box::new(StderrWarnings), Box::new(move || min_points))
        .with_context(|| format!("profile {} is unreadable", path))?;
    Ok(viewer.with_sort(sort).with_auto_relax(auto_relax))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.cmd {
        Commands::Report {
            profile,
            out,
            min_points,
            sort,
            disable,
            auto_relax,
        } => {
            let mut viewer = load(&profile, min_points, sort, auto_relax)?;

            for point in &disable {
                if viewer.profile().is_disabled(point) {
                    continue;
                }
                if viewer.toggle_progress_point(point) == ToggleOutcome::Unknown {
                    eprintln!("WARN: profile has no progress point named '{}'", point);
                }
            }

            let plots = viewer.refresh();
            if plots.results.is_empty() {
                eprintln!(
                    "WARN: no location has {} or more usable measurements; try a lower --min-points",
                    plots.min_points
                );
            }

            let data = render::build_report_data(viewer.profile(), plots);
            let json = render::render_json_report(&data)?;
            std::fs::write(&out, json).with_context(|| format!("write report {}", out))?;
            println!("Wrote {}", out);
        }
        Commands::Summary {
            profile,
            min_points,
            sort,
            location,
            auto_relax,
        } => {
            let viewer = load(&profile, min_points, sort, auto_relax)?;
            let filter = location
                .as_deref()
                .map(Regex::new)
                .transpose()
                .context("bad --location regex")?;

            let mut plots = viewer.refresh();
            if let Some(re) = &filter {
                plots.results.retain(|r| re.is_match(r.name.as_str()));
                plots.range = view::progress_speedup_range(&plots.results);
            }

            let data = render::build_report_data(viewer.profile(), plots);
            print!("{}", render::render_text_summary(&data)?);
        }
    }

    Ok(())
}
