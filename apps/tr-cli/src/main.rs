use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tr_sim::{Powertrain, SimOptions, SimRecord, SimResult, VehicleSaveState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tr-cli")]
#[command(about = "Traction CLI - wheelset adhesion and drivetrain simulation", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a vehicle file
    Validate {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
    },
    /// Run the vehicle's scenario from the start
    Run {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
        /// Write recorded samples as CSV (defaults to a summary on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a save state at the end of the run
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Stop at this time instead of the scenario's end (s)
        #[arg(long)]
        until: Option<f64>,
    },
    /// Continue a run from a save state to the scenario's end
    Resume {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
        /// Save state written by `run --snapshot`
        snapshot_path: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a new save state at the end of the run
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> SimResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { vehicle_path } => cmd_validate(&vehicle_path),
        Commands::Run {
            vehicle_path,
            output,
            snapshot,
            until,
        } => cmd_run(&vehicle_path, None, output.as_deref(), snapshot.as_deref(), until),
        Commands::Resume {
            vehicle_path,
            snapshot_path,
            output,
            snapshot,
        } => cmd_run(
            &vehicle_path,
            Some(&snapshot_path),
            output.as_deref(),
            snapshot.as_deref(),
            None,
        ),
    }
}

fn cmd_validate(vehicle_path: &Path) -> SimResult<()> {
    println!("Validating vehicle: {}", vehicle_path.display());
    let vehicle = tr_project::load(vehicle_path)?;
    // building catches what the schema alone cannot, such as an unusable motor
    Powertrain::from_vehicle(&vehicle)?;
    println!("✓ Vehicle '{}' is valid ({} drive)", vehicle.name, vehicle.drive.kind_name());
    Ok(())
}

fn cmd_run(
    vehicle_path: &Path,
    resume_from: Option<&Path>,
    output: Option<&Path>,
    snapshot: Option<&Path>,
    until: Option<f64>,
) -> SimResult<()> {
    let vehicle = tr_project::load(vehicle_path)?;
    let (mut powertrain, mut schedule, mut opts) = tr_sim::prepare(&vehicle)?;
    if let Some(path) = resume_from {
        let state = VehicleSaveState::load(path)?;
        powertrain.restore(&state, &mut schedule)?;
        info!(path = %path.display(), t = state.time_s, "resumed from save state");
    }
    if let Some(t) = until {
        opts.t_end = t;
    }

    println!("Running '{}' to t = {:.3} s (dt = {} s)", vehicle.name, opts.t_end, opts.dt);
    let record = tr_sim::run_scenario(&mut powertrain, &mut schedule, &opts)?;

    match output {
        Some(path) => {
            std::fs::write(path, record.to_csv())?;
            println!("✓ Wrote {} samples to {}", record.x.len(), path.display());
        }
        None => print_summary(&record, &opts),
    }

    if let Some(path) = snapshot {
        powertrain.save_state(&schedule).save(path)?;
        println!("✓ Save state written to {}", path.display());
    }
    Ok(())
}

fn print_summary(record: &SimRecord, opts: &SimOptions) {
    let Some(last) = record.last() else {
        return;
    };
    let t = record.t.last().copied().unwrap_or(0.0);
    println!("  Samples: {} (every {} steps)", record.x.len(), opts.record_every);
    println!("  t = {t:.3} s");
    println!("  Axle speed:  {:.3} m/s", last.axle_speed_mps);
    println!("  Train speed: {:.3} m/s", last.train_speed_mps);
    println!("  Slip:        {:.3} m/s ({:.1} %)", last.slip_speed_mps, last.slip_speed_percent);
    println!("  Axle force:  {:.1} N", last.axle_force_n);
    if let Some(gear) = last.gear {
        println!("  Gear:        {gear}");
    }
    if let Some(rpm) = last.engine_rpm {
        println!("  Engine:      {rpm:.0} rpm");
    }
    let slipping = record.x.iter().filter(|s| s.wheel_slip).count();
    if slipping > 0 {
        println!("  Wheel slip in {slipping} of {} samples", record.x.len());
    }
    for (time, event) in &record.events {
        println!("  {time:8.3} s  {event:?}");
    }
}
