use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hs_app::{AnalysisController, AppConfig, AppResult, RunProgressEvent, RunStage};
use hs_jobs::{RemoteStatus, ReplayJobService};
use hs_present::{DisplayGroup, ResultTablePresenter};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hs-cli")]
#[command(about = "Hail swath analysis - run the hail prediction job and render its tables", long_about = None)]
struct Cli {
    /// Configuration YAML file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the job endpoint for a host
    Endpoint {
        /// Host the panel is served from; unrecognized hosts use the default
        #[arg(long)]
        host: Option<String>,
    },
    /// Render a saved table output
    Present {
        /// JSON file holding the job's table output
        file: PathBuf,
        /// Show every column instead of hiding the configured ones
        #[arg(long)]
        all_columns: bool,
        /// Print the display model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up the band color for a hail size
    Color {
        /// Hail size, e.g. 1.75
        value: String,
    },
    /// Run the full analysis flow against recorded job outputs
    Replay {
        /// Storm date (YYYY-MM-DD or MM/DD/YYYY)
        #[arg(long)]
        date: String,
        /// Recorded table output
        #[arg(long)]
        results: PathBuf,
        /// Recorded geometry output
        #[arg(long)]
        geometry: Option<PathBuf>,
        /// Status sequence reported by the job, e.g. Executing,Succeeded
        #[arg(long, value_delimiter = ',', default_value = "Executing,Succeeded")]
        statuses: Vec<RemoteStatus>,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,
        /// Show every column instead of hiding the configured ones
        #[arg(long)]
        all_columns: bool,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Endpoint { host } => cmd_endpoint(&config, host.as_deref()),
        Commands::Present {
            file,
            all_columns,
            json,
        } => cmd_present(&config, &file, all_columns, json),
        Commands::Color { value } => cmd_color(&config, &value),
        Commands::Replay {
            date,
            results,
            geometry,
            statuses,
            interval_ms,
            all_columns,
        } => cmd_replay(
            config,
            &date,
            &results,
            geometry.as_deref(),
            statuses,
            interval_ms,
            all_columns,
        ),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_yaml(path)?,
        None => AppConfig::default(),
    };
    Ok(config.from_process_env())
}

fn cmd_endpoint(config: &AppConfig, host: Option<&str>) -> AppResult<()> {
    let endpoint = match host {
        Some(host) => config.deployment.endpoint_for(host),
        None => config.deployment.endpoint(),
    };
    println!("{endpoint}");
    Ok(())
}

fn cmd_present(config: &AppConfig, file: &Path, all_columns: bool, json: bool) -> AppResult<()> {
    let payload = read_payload(file)?;
    let groups = hs_results::decode_payload(&payload)?;

    let mut options = config.presenter.options.clone();
    options.show_all_columns |= all_columns;
    let presenter = ResultTablePresenter::new(config.presenter.color_band()?);
    let display = presenter.present(&groups, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&display)?);
    } else {
        println!("{} of {} groups have results", display.len(), groups.len());
        print_groups(&display);
    }
    Ok(())
}

fn cmd_color(config: &AppConfig, value: &str) -> AppResult<()> {
    let band = config.presenter.color_band()?;
    match band.color_for(value) {
        Some(color) => println!("{value}: {}", color.hex()),
        None => println!("{value}: no band color"),
    }
    Ok(())
}

fn cmd_replay(
    mut config: AppConfig,
    date: &str,
    results: &Path,
    geometry: Option<&Path>,
    statuses: Vec<RemoteStatus>,
    interval_ms: u64,
    all_columns: bool,
) -> AppResult<()> {
    config.polling.interval_ms = interval_ms;
    if all_columns {
        config.presenter.options.show_all_columns = true;
    }

    let mut service = ReplayJobService::new()
        .with_statuses(statuses)
        .with_output(config.job.table_output.clone(), read_payload(results)?);
    if let Some(geometry) = geometry {
        service = service.with_output(config.job.geometry_output.clone(), read_payload(geometry)?);
    }

    println!("Replaying analysis for {date}");
    let mut last_emit = Instant::now();
    let mut last_stage: Option<RunStage> = None;
    let mut controller = AnalysisController::new(Arc::new(service), config)?.with_progress(
        Box::new(move |event: &RunProgressEvent| {
            let emit_now = last_stage.as_ref() != Some(&event.stage)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(event);
                last_stage = Some(event.stage.clone());
                last_emit = Instant::now();
            }
        }),
    );

    controller.run(date)?;
    let settled = controller.wait_for_idle(Duration::from_secs(600));
    clear_progress_line();
    if !settled {
        tracing::warn!("replay did not settle; cancelling");
        controller.cancel();
    }

    let state = controller.state();
    println!("{}  (elapsed {:.0}s)", state.status_text, controller.elapsed().as_secs_f64());
    if let Some(error) = &state.geometry_error {
        println!("Hail layer unavailable: {error}");
    }
    if !state.ready {
        return match controller.take_error() {
            Some(error) => Err(error),
            None => Ok(()),
        };
    }

    print_groups(&controller.display());
    Ok(())
}

/// Table outputs are JSON, but the service may also hand back a bare string.
fn read_payload(path: &Path) -> AppResult<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content).unwrap_or(Value::String(content)))
}

fn print_groups(groups: &[DisplayGroup]) {
    for group in groups {
        println!();
        println!("{}", group.label);

        let headers: Vec<&str> = group.columns.iter().map(|c| c.header.as_str()).collect();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in &group.rows {
            for (width, cell) in widths.iter_mut().zip(&row.cells) {
                *width = (*width).max(cell.text.chars().count());
            }
        }

        let line = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(text, &width)| format!("{text:>width$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };
        println!("{}", line(headers.clone()));
        println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
        for row in &group.rows {
            let mut text = line(row.texts());
            if let Some(color) = row.background {
                text.push_str(&format!("  {}", color.hex()));
            }
            println!("{text}");
        }
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(status) = event.job_status {
        line.push_str(&format!("  job={status}"));
    }
    if let Some(message) = &event.message {
        line.push_str(&format!("  {message}"));
    }
    print!("{line}");
    let _ = io::stdout().flush();
}
