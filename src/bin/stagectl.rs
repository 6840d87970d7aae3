//! # stagectl
//!
//! Line-delimited JSON front end for the microscope stage.
//!
//! Reads one request object per line on stdin and writes one response object
//! per line on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Simulated stage with built-in defaults
//! stagectl --simulate
//!
//! # Real hardware, verbose JSON logs
//! stagectl --config /etc/microscope/stage.toml -v --json
//!
//! echo '{"id": 1, "op": "start_collection"}' | stagectl -s
//! ```
//!
//! Requests run one at a time on a worker thread, in the order they were
//! read, and replies come back in that order. `emergency_stop` is the
//! exception: the reader handles it as soon as the line arrives, cutting
//! short the move in flight, so its reply may overtake earlier ones.
//!
//! `RUST_LOG` takes precedence over `-v` when set.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use clap::Parser;
use microscope_stage::{
    load_config, select_driver, Failure, Request, Response, StageConfig, StageController,
    StepDriver,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;

type Controller = StageController<Box<dyn StepDriver + Send>>;

/// Microscope stage controller
#[derive(Parser, Debug)]
#[command(name = "stagectl")]
#[command(version)]
#[command(about = "Three-axis microscope stage controller speaking JSON lines on stdio")]
#[command(long_about = None)]
struct Args {
    /// Stage configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force the simulated driver even when GPIO is available
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

/// A decoded input line.
enum Job {
    /// A well-formed request.
    Run(Request),
    /// The line could not be decoded; answered with `bad_request`.
    Reject(String),
}

/// A job together with the `id` to echo.
struct Envelope {
    id: Option<Value>,
    job: Job,
}

fn main() {
    if let Err(e) = run() {
        error!("stagectl failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("stagectl v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            info!("No configuration file given, using defaults");
            StageConfig::default()
        }
    };

    let driver = select_driver(&config, args.simulate);
    let controller: Arc<Controller> = Arc::new(StageController::from_config(driver, &config)?);
    info!(mode = ?controller.get_status().drive_mode, "Stage ready");

    serve(&controller, io::stdin().lock(), io::stdout())?;

    if let Err(failure) = controller.shutdown() {
        error!(kind = %failure.kind, "Shutdown failed: {}", failure.message);
    }
    info!("stagectl stopped");
    Ok(())
}

/// Answer every line of `input` until EOF.
///
/// Returns once every queued request has been answered.
fn serve<D, R, W>(controller: &Arc<StageController<D>>, input: R, output: W) -> io::Result<()>
where
    D: StepDriver + Send + 'static,
    R: BufRead,
    W: Write + Send + 'static,
{
    let output = Arc::new(Mutex::new(output));
    let (queue, jobs) = mpsc::channel::<Envelope>();

    let worker = {
        let controller = Arc::clone(controller);
        let output = Arc::clone(&output);
        thread::spawn(move || {
            for envelope in jobs {
                let response = respond(&controller, envelope.job);
                reply(&output, envelope.id, &response);
            }
        })
    };

    let mut result = Ok(());
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                result = Err(e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let envelope = decode(&line);
        if let Job::Run(Request::EmergencyStop) = envelope.job {
            // Not queued: the worker may be blocked in the move to abort
            let response = controller.handle(Request::EmergencyStop);
            reply(&output, envelope.id, &response);
            continue;
        }

        if queue.send(envelope).is_err() {
            warn!("Request worker stopped; ignoring further input");
            break;
        }
    }

    drop(queue);
    debug!("Input closed, waiting for queued requests");
    if worker.join().is_err() {
        warn!("Request worker panicked");
    }
    result
}

fn decode(line: &str) -> Envelope {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => {
            let id = value.get("id").cloned();
            let job = match serde_json::from_value::<Request>(value) {
                Ok(request) => Job::Run(request),
                Err(e) => Job::Reject(format!("Invalid request: {}", e)),
            };
            Envelope { id, job }
        }
        Err(e) => Envelope {
            id: None,
            job: Job::Reject(format!("Malformed JSON: {}", e)),
        },
    }
}

fn respond<D: StepDriver>(controller: &StageController<D>, job: Job) -> Response {
    match job {
        Job::Run(request) => {
            debug!(?request, "Dispatching request");
            controller.handle(request)
        }
        Job::Reject(message) => {
            warn!("{}", message);
            let position = controller.with_sequencer(|seq| seq.snapshot());
            Response::Error(Failure::bad_request(message, position))
        }
    }
}

fn reply<W: Write>(output: &Mutex<W>, id: Option<Value>, response: &Response) {
    if let Err(e) = write_response(&mut *output.lock(), id, response) {
        error!("Failed to write response: {}", e);
    }
}

fn write_response<W: Write>(out: &mut W, id: Option<Value>, response: &Response) -> io::Result<()> {
    let mut reply = serde_json::to_value(response)?;
    if let (Some(id), Value::Object(fields)) = (id, &mut reply) {
        fields.insert("id".to_string(), id);
    }

    serde_json::to_writer(&mut *out, &reply)?;
    out.write_all(b"\n")?;
    out.flush()
}

/// `RUST_LOG` directives when set and valid, else the verbosity level.
fn log_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(level, rust_log.as_deref());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}
