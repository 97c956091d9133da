use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use headset_pilot::config::PilotConfig;
use headset_pilot::recorder::Recorder;
use headset_pilot::sink::{CommandSink, DryRunSink, SerialSink, UdpSink};
use headset_pilot::stream::{JsonLinesSource, StreamSource};
use headset_pilot::{Pilot, fly};

#[derive(Parser)]
#[command(name = "headset-pilot")]
#[command(about = "Fly a drone with headset motion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read headset frames and fly
    Run {
        /// YAML configuration; built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// JSON-lines frame file, `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,
        #[arg(long, value_enum, default_value_t = SinkKind::DryRun)]
        sink: SinkKind,
        /// Serial device, required for `--sink serial`
        #[arg(long)]
        serial_port: Option<String>,
        /// Directory for the csv flight record
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Validate a configuration file
    CheckConfig { config: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkKind {
    DryRun,
    Udp,
    Serial,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            sink,
            serial_port,
            record,
        } => run(config, &input, sink, serial_port, record),
        Commands::CheckConfig { config } => check_config(config),
    }
}

fn load_config(path: Option<PathBuf>) -> Option<PilotConfig> {
    let Some(path) = path else {
        return Some(PilotConfig::default());
    };
    match PilotConfig::from_file(&path) {
        Ok(config) => Some(config),
        Err(e) => {
            log::error!("Failed to load {}: {}", path.display(), e);
            None
        }
    }
}

fn check_config(path: PathBuf) -> ExitCode {
    match load_config(Some(path)) {
        Some(config) => {
            println!("Configuration is valid:\n{:#?}", config);
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}

fn open_sink(
    kind: SinkKind,
    serial_port: Option<String>,
    config: &PilotConfig,
) -> Option<Box<dyn CommandSink>> {
    let vehicle = &config.vehicle;
    let sink: Result<Box<dyn CommandSink>, _> = match kind {
        SinkKind::DryRun => return Some(Box::new(DryRunSink::new())),
        SinkKind::Udp => UdpSink::new(&vehicle.address, vehicle.ack_timeout)
            .map(|s| Box::new(s) as Box<dyn CommandSink>),
        SinkKind::Serial => {
            let Some(path) = serial_port else {
                log::error!("--sink serial needs --serial-port");
                return None;
            };
            SerialSink::new(&path, vehicle.baud_rate, vehicle.ack_timeout)
                .map(|s| Box::new(s) as Box<dyn CommandSink>)
        }
    };
    match sink {
        Ok(sink) => Some(sink),
        Err(e) => {
            log::error!("Failed to open vehicle link: {}", e);
            None
        }
    }
}

fn open_source(input: &str) -> io::Result<Box<dyn StreamSource + Send>> {
    if input == "-" {
        return Ok(Box::new(JsonLinesSource::new(BufReader::new(io::stdin()))));
    }
    let file = File::open(input)?;
    Ok(Box::new(JsonLinesSource::new(BufReader::new(file))))
}

fn run(
    config: Option<PathBuf>,
    input: &str,
    sink: SinkKind,
    serial_port: Option<String>,
    record: Option<PathBuf>,
) -> ExitCode {
    let Some(config) = load_config(config) else {
        return ExitCode::FAILURE;
    };
    let Some(sink) = open_sink(sink, serial_port, &config) else {
        return ExitCode::FAILURE;
    };
    let source = match open_source(input) {
        Ok(source) => source,
        Err(e) => {
            log::error!("Failed to open {}: {}", input, e);
            return ExitCode::FAILURE;
        }
    };

    let mut pilot = Pilot::new(&config, sink);
    if let Some(dir) = record {
        match Recorder::create(&dir) {
            Ok(recorder) => {
                log::info!("Recording to {}", recorder.path().display());
                pilot = pilot.with_recorder(recorder);
            }
            Err(e) => log::error!("Failed to create flight record in {}: {}", dir.display(), e),
        }
    }

    if let Err(e) = pilot.initialize() {
        log::error!("Vehicle did not accept command mode: {}", e);
    }

    log::info!("Reading headset frames from {}", input);
    fly(source, &mut pilot, config.queue_capacity);

    let stats = pilot.stats();
    log::info!(
        "Stream ended in {} state: {} samples, {} commands ({} failed), {} frames rejected, {} dropped",
        pilot.state().name(),
        stats.samples,
        stats.commands,
        stats.failed_dispatches,
        stats.rejected_frames,
        stats.dropped_frames
    );
    ExitCode::SUCCESS
}
