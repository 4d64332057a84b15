mod commands;

use clap::Parser;
use commands::{parse_command, parse_task_arg, Command, HELP};
use screentrigger::{
    ActionDispatcher, AutomationConfig, AutomationEvent, AutomationLoop, RecordingDispatcher,
    ReplayCapture, RunState, ScreenCapture,
};
use serde::Deserialize;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

const PREVIEW_FILE: &str = "latest_detection.png";

#[derive(Parser, Debug)]
#[command(author, version, about = "Click on images when they appear on screen")]
struct Cli {
    /// Path to an optional JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Trigger to add at startup: PATH[=click|drag[:DX,DY,MS]]. Repeatable.
    #[arg(short, long = "task", value_name = "SPEC")]
    tasks: Vec<String>,
    /// Record actions instead of injecting input, replaying --screen images.
    #[arg(long)]
    dry_run: bool,
    /// Image to replay as the screen in dry-run mode. Repeatable.
    #[arg(long = "screen", value_name = "PNG", requires = "dry_run")]
    screens: Vec<PathBuf>,
    /// Take a baseline screenshot and start immediately.
    #[arg(long)]
    autostart: bool,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    interval_ms: u64,
    threshold: f32,
    parallel: bool,
    preview_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = AutomationConfig::default();
        Self {
            interval_ms: cfg.interval.as_millis() as u64,
            threshold: cfg.threshold,
            parallel: true,
            preview_dir: None,
        }
    }
}

impl From<&Config> for AutomationConfig {
    fn from(value: &Config) -> Self {
        AutomationConfig::default()
            .with_interval(Duration::from_millis(value.interval_ms))
            .with_threshold(value.threshold)
            .with_parallel(value.parallel)
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&text)?;
    if !(-1.0..=1.0).contains(&config.threshold) {
        return Err("threshold must be within [-1, 1]".into());
    }
    Ok(config)
}

type Backends = (Box<dyn ScreenCapture>, Box<dyn ActionDispatcher>);

fn backends(cli: &Cli) -> Result<Backends, Box<dyn std::error::Error>> {
    if cli.dry_run {
        let capture = ReplayCapture::from_paths(&cli.screens)?;
        return Ok((Box::new(capture), Box::new(RecordingDispatcher::new())));
    }
    desktop_backends()
}

#[cfg(feature = "desktop")]
fn desktop_backends() -> Result<Backends, Box<dyn std::error::Error>> {
    Ok((
        Box::new(screentrigger::DesktopCapture::new()),
        Box::new(screentrigger::DesktopDispatcher::new()),
    ))
}

#[cfg(not(feature = "desktop"))]
fn desktop_backends() -> Result<Backends, Box<dyn std::error::Error>> {
    Err("built without the `desktop` feature; use --dry-run".into())
}

/// Prints events and writes detection previews until the loop is dropped.
fn spawn_event_printer(
    events: mpsc::Receiver<AutomationEvent>,
    preview_dir: Option<PathBuf>,
) -> io::Result<thread::JoinHandle<()>> {
    if let Some(dir) = &preview_dir {
        fs::create_dir_all(dir)?;
    }
    thread::Builder::new()
        .name("screentrigger-events".to_string())
        .spawn(move || {
            for event in events {
                println!("{event}");
                if let (AutomationEvent::Detection { annotated_png, .. }, Some(dir)) =
                    (&event, &preview_dir)
                {
                    let path = dir.join(PREVIEW_FILE);
                    if let Err(err) = fs::write(&path, annotated_png) {
                        eprintln!("failed to write preview {}: {err}", path.display());
                    }
                }
            }
        })
}

fn execute(automation: &mut AutomationLoop, command: Command) -> bool {
    let outcome = match command {
        Command::Start => automation.start(),
        Command::Stop => {
            automation.stop();
            Ok(())
        }
        Command::Add { path, action } => automation.add_task(&path, action).map(|_| ()),
        Command::Remove(name) => automation.remove_task(&name),
        Command::Screenshot => automation.capture_baseline(),
        Command::Scan => {
            match automation.run_once() {
                Some(report) => println!(
                    "scanned {} task(s): {} detection(s), {} action(s)",
                    report.evaluated, report.detections, report.dispatched
                ),
                None => println!("scan is only available while stopped"),
            }
            Ok(())
        }
        Command::List => {
            let state = match automation.run_state() {
                RunState::Running => "running",
                RunState::Stopped => "stopped",
            };
            println!("{state}, {} task(s)", automation.tasks().len());
            for (idx, task) in automation.tasks().iter().enumerate() {
                let size = task.template_size();
                println!(
                    "  {}. {} ({}x{}) -> {}",
                    idx + 1,
                    task.name(),
                    size.width,
                    size.height,
                    task.action()
                );
            }
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => return false,
    };
    if let Err(err) = outcome {
        eprintln!("error: {err}");
    }
    true
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("screentrigger=debug".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let (capture, dispatcher) = backends(&cli)?;
    let (automation, events) = AutomationLoop::with_channel(capture, dispatcher);
    let mut automation = automation.with_config(AutomationConfig::from(&config));
    let printer = spawn_event_printer(events, config.preview_dir.clone())?;

    for spec in &cli.tasks {
        let (path, action) = parse_task_arg(spec)?;
        automation.add_task(&path, action)?;
    }
    if cli.autostart {
        automation.capture_baseline()?;
        automation.start()?;
    }

    println!("type `help` for commands");
    for line in io::stdin().lock().lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(Some(command)) => {
                if !execute(&mut automation, command) {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => eprintln!("error: {err}"),
        }
    }

    automation.stop();
    drop(automation);
    if printer.join().is_err() {
        eprintln!("event printer panicked; some events may not have been printed");
    }
    Ok(())
}
