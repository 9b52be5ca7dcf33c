mod app;
mod bridge;
mod core;
mod effect;
mod event_emitter;
mod ipc;
mod macos;
mod platform;

use anyhow::{bail, Result};
use argh::FromArgs;
use ipc::IpcClient;
use shydock_ipc::{Command, EventFilter, ResolutionPreset, Response};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shydock - hide the macOS Dock unless an external display is connected
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Toggle(ToggleCmd),
    SetResolution(SetResolutionCmd),
    LaunchAtLogin(LaunchAtLoginCmd),
    Status(StatusCmd),
    ListDisplays(ListDisplaysCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Start the shydock daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Flip the Dock between hidden and shown
#[derive(FromArgs)]
#[argh(subcommand, name = "toggle")]
struct ToggleCmd {}

/// Set the minimum size a display needs to count as external
#[derive(FromArgs)]
#[argh(subcommand, name = "set-resolution")]
struct SetResolutionCmd {
    /// preset (off, 1080p, 1440p, 4k) or width followed by height
    #[argh(positional, greedy)]
    args: Vec<String>,
}

/// Enable or disable starting at login
#[derive(FromArgs)]
#[argh(subcommand, name = "launch-at-login")]
struct LaunchAtLoginCmd {
    /// on or off
    #[argh(positional)]
    value: String,
}

/// Show the daemon state
#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
struct StatusCmd {
    /// print raw JSON
    #[argh(switch)]
    json: bool,
}

/// List active displays and whether they count as external
#[derive(FromArgs)]
#[argh(subcommand, name = "list-displays")]
struct ListDisplaysCmd {}

/// Stream state events as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// send the current state first
    #[argh(switch)]
    snapshot: bool,
    /// comma-separated event types (dock, warning, settings)
    #[argh(option)]
    filter: Option<String>,
}

/// Quit the daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["shydock", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(_)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("shydock {} starting", VERSION);
            app::App::run()
        }
        Some(SubCommand::Version(_)) => {
            println!("shydock {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Subscribe(cmd)) => {
            let filter = cmd
                .filter
                .as_deref()
                .map(EventFilter::parse_list)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            ipc::subscribe_and_print(cmd.snapshot, filter)
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let json = matches!(&subcmd, SubCommand::Status(StatusCmd { json: true }));
    let cmd = to_command(subcmd)?;
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::State { state } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{}", state.status_line());
                println!("Dock: {}", state.dock);
                println!(
                    "Minimum resolution: {}",
                    format_resolution(state.min_width, state.min_height)
                );
                println!("Launch at login: {}", state.launch_at_login);
                println!(
                    "Accessibility: {}",
                    if state.accessibility_trusted {
                        "granted"
                    } else {
                        "missing"
                    }
                );
                if let Some(error) = state.last_error {
                    println!("Last error: {}", error);
                }
            }
        }
        Response::Displays { displays } => {
            for d in displays {
                println!(
                    "{}: {}x{} {}{}",
                    d.id,
                    d.width,
                    d.height,
                    if d.is_builtin { "built-in" } else { "external" },
                    if d.qualifies { " *" } else { "" }
                );
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Result<Command> {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::Subscribe(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Toggle(_) => Ok(Command::ToggleDock),
        SubCommand::SetResolution(cmd) => parse_resolution(&cmd.args),
        SubCommand::LaunchAtLogin(cmd) => Ok(Command::SetLaunchAtLogin {
            enabled: parse_on_off(&cmd.value)?,
        }),
        SubCommand::Status(_) => Ok(Command::GetState),
        SubCommand::ListDisplays(_) => Ok(Command::ListDisplays),
        SubCommand::Quit(_) => Ok(Command::Quit),
    }
}

fn parse_resolution(args: &[String]) -> Result<Command> {
    let (width, height) = match args {
        [preset] => preset
            .parse::<ResolutionPreset>()
            .map_err(anyhow::Error::msg)?
            .dimensions(),
        [width, height] => (width.parse()?, height.parse()?),
        _ => bail!("Usage: set-resolution <off|1080p|1440p|4k> | <width> <height>"),
    };
    Ok(Command::SetResolution { width, height })
}

fn parse_on_off(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => bail!("Unknown value: {} (use on or off)", s),
    }
}

fn format_resolution(width: f64, height: f64) -> String {
    if width <= 1.0 || height <= 1.0 {
        "off".to_string()
    } else {
        format!("{}x{}", width, height)
    }
}
