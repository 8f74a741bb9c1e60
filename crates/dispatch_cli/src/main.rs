//! `dispatch`: run the ambulance dispatch simulator on an input file, or
//! generate one.

mod display;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dispatch_core::dispatcher::Dispatcher;
use dispatch_core::input::{load_input, write_input};
use dispatch_core::report::write_report_file;
use dispatch_core::scenario::{
    generate_input, CancellationScope, DispatchConfig, EmergencyVehiclePreference,
    ForwardingMode, GeneratorParams, TerminationPolicy, DEFAULT_HORIZON_MARGIN,
};
use dispatch_core::telemetry_export::{
    write_cancellations_csv, write_finished_csv, write_summary_json,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dispatch",
    about = "Multi-hospital ambulance dispatch simulator",
    long_about = "Simulates hospitals dispatching Standard and Restricted vehicles to\n\
                  prioritized patient requests, tick by tick, and writes a report."
)]
struct Cli {
    /// Log filter, e.g. `debug` or `dispatch_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an input file and write the report
    Run(RunArgs),
    /// Write a random, seed-reproducible input file
    Generate(GenerateArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Print only start and end messages
    Silent,
    /// Print every hospital after every tick, waiting for Enter
    Interactive,
}

#[derive(Args)]
struct RunArgs {
    /// Input file
    #[arg(long, short)]
    input: PathBuf,
    /// Report file
    #[arg(long, short, default_value = "output.txt")]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = Mode::Silent)]
    mode: Mode,
    /// Also write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
    /// Also write one CSV row per served patient
    #[arg(long)]
    records_csv: Option<PathBuf>,
    /// Also write one CSV row per applied cancellation
    #[arg(long)]
    cancellations_csv: Option<PathBuf>,
    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmergencyVehicleArg {
    RestrictedFirst,
    StandardFirst,
}

#[derive(Clone, Copy, ValueEnum)]
enum CancellationScopeArg {
    /// Queued, outbound and returning trips can be cancelled
    AnyTrip,
    /// Once the patient is aboard the trip completes
    OutboundOnly,
}

#[derive(Clone, Copy, ValueEnum)]
enum ForwardingArg {
    LeastLoaded,
    Disabled,
}

#[derive(Clone, Copy, ValueEnum)]
enum TerminationArg {
    /// Stop once nothing is busy, queued or scheduled
    Converged,
    /// Always run until the horizon
    FixedHorizon,
}

#[derive(Args)]
struct PolicyArgs {
    /// Vehicle class tried first for emergencies
    #[arg(long, value_enum, default_value_t = EmergencyVehicleArg::RestrictedFirst)]
    emergency_vehicle: EmergencyVehicleArg,
    #[arg(long, value_enum, default_value_t = CancellationScopeArg::AnyTrip)]
    cancellation_scope: CancellationScopeArg,
    /// Count the ticks of cancelled trips as busy time
    #[arg(long)]
    credit_aborted_trips: bool,
    #[arg(long, value_enum, default_value_t = ForwardingArg::LeastLoaded)]
    forwarding: ForwardingArg,
    #[arg(long, value_enum, default_value_t = TerminationArg::Converged)]
    termination: TerminationArg,
    /// Ticks allowed after the last scheduled event
    #[arg(long, default_value_t = DEFAULT_HORIZON_MARGIN)]
    horizon_margin: u64,
}

impl PolicyArgs {
    fn to_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_emergency_vehicle_preference(match self.emergency_vehicle {
                EmergencyVehicleArg::RestrictedFirst => EmergencyVehiclePreference::RestrictedFirst,
                EmergencyVehicleArg::StandardFirst => EmergencyVehiclePreference::StandardFirst,
            })
            .with_cancellation_scope(match self.cancellation_scope {
                CancellationScopeArg::AnyTrip => CancellationScope::AnyTrip,
                CancellationScopeArg::OutboundOnly => CancellationScope::OutboundOnly,
            })
            .with_credit_aborted_trips(self.credit_aborted_trips)
            .with_forwarding(match self.forwarding {
                ForwardingArg::LeastLoaded => ForwardingMode::LeastLoaded,
                ForwardingArg::Disabled => ForwardingMode::Disabled,
            })
            .with_termination(match self.termination {
                TerminationArg::Converged => TerminationPolicy::Converged,
                TerminationArg::FixedHorizon => TerminationPolicy::FixedHorizon,
            })
            .with_horizon_margin(self.horizon_margin)
    }
}

#[derive(Args)]
struct GenerateArgs {
    /// Where to write the input file
    #[arg(long, short)]
    output: PathBuf,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 3)]
    hospitals: usize,
    /// Upper bound on each hospital's vehicles per class
    #[arg(long, default_value_t = 3)]
    max_vehicles: u32,
    #[arg(long, default_value_t = 5)]
    standard_speed: u64,
    #[arg(long, default_value_t = 8)]
    restricted_speed: u64,
    #[arg(long, default_value_t = 50)]
    requests: usize,
    /// Requests arrive over ticks 1..=window
    #[arg(long, default_value_t = 100)]
    window: u64,
    /// Share of emergency requests (0.0 to 1.0)
    #[arg(long, default_value_t = 0.3)]
    emergency_share: f64,
    /// Share of requests later cancelled (0.0 to 1.0)
    #[arg(long, default_value_t = 0.05)]
    cancellation_share: f64,
}

// ── commands ───────────────────────────────────────────────────────

fn run(args: RunArgs) -> Result<()> {
    let input = load_input(&args.input)?;
    let mut dispatcher = Dispatcher::new(&input, args.policy.to_config())
        .with_context(|| format!("{} does not describe a runnable network", args.input.display()))?;

    let outcome = match args.mode {
        Mode::Silent => {
            println!("Simulation starts...");
            dispatcher.run()?
        }
        Mode::Interactive => {
            let stdin = io::stdin();
            let mut stdout = io::stdout().lock();
            display::run_interactive(&mut dispatcher, stdin.lock(), &mut stdout)?
        }
    };
    info!(final_tick = outcome.final_tick, stop = ?outcome.stop, "run complete");

    let summary = dispatcher.summary();
    let telemetry = dispatcher.telemetry();
    write_report_file(&args.output, &summary, &telemetry.finished).with_context(|| {
        format!(
            "simulation finished but the report could not be written to {}",
            args.output.display()
        )
    })?;
    if let Some(path) = &args.summary_json {
        write_summary_json(path, &summary)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.records_csv {
        write_finished_csv(path, &telemetry.finished)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.cancellations_csv {
        write_cancellations_csv(path, &telemetry.cancellations)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if args.mode == Mode::Silent {
        println!("Simulation ends, output file created");
    }
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<()> {
    let params = GeneratorParams::default()
        .with_seed(args.seed)
        .with_hospitals(args.hospitals)
        .with_max_vehicles_per_class(args.max_vehicles)
        .with_speeds(args.standard_speed, args.restricted_speed)
        .with_requests(args.requests, args.window)
        .with_emergency_share(args.emergency_share)
        .with_cancellation_share(args.cancellation_share);
    let input = generate_input(&params);

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    write_input(&input, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        hospitals = input.hospital_count(),
        requests = input.requests.len(),
        cancellations = input.cancellations.len(),
        "input generated"
    );
    Ok(())
}

// ── helpers ────────────────────────────────────────────────────────

/// Installs the stderr subscriber. Returns `false` when one was already set,
/// in which case the existing subscriber keeps receiving events.
fn init_tracing(log_level: Option<&str>) -> bool {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    match fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        Ok(()) => true,
        Err(err) => {
            eprintln!("warning: logging not initialised: {err}");
            false
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Generate(args) => generate(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
