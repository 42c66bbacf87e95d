//! mpdwire-cli: Command-line interface for mpdwire.

mod output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mpdwire_client::{args, Command, CommandList, Session, Statistics};
use mpdwire_core::build_info::BUILD_INFO;
use mpdwire_core::{paths, Config};
use output::Format;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "mpdwire")]
#[command(about = "Control a Music Player Daemon from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon host (overrides config and MPD_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Daemon port (overrides config and MPD_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Password to authenticate with after connecting
    #[arg(long, global = true)]
    password: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format (table, json, plain)
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show player status
    Status,

    /// Show daemon statistics
    Stats,

    /// List the queue
    Queue,

    /// Show the current track
    Current,

    /// Start playback, resuming a paused track
    Play {
        /// Start the current track from the beginning
        #[arg(long)]
        restart: bool,
    },

    /// Play the next track, wrapping to the first
    Next,

    /// Play the previous track, wrapping to the last
    Previous,

    /// Jump to a queue position
    Skip {
        /// Zero-based position (taken modulo the queue length)
        position: usize,
    },

    /// Wait for a subsystem to change
    Idle {
        /// Subsystems to watch (all when omitted)
        subsystems: Vec<String>,
    },

    /// List unique values of a tag
    List {
        /// Tag name, e.g. Artist or Album
        tag: String,
    },

    /// List stored playlists
    Playlists,

    /// Append URIs to the queue
    Add {
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// Send any known command
    Raw {
        /// Command name
        name: String,

        /// Command arguments
        args: Vec<String>,
    },

    /// Show build and daemon protocol version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.log_level.as_deref() {
        Some(level) => mpdwire_core::logging::init_with_level(level),
        None => mpdwire_core::logging::init(),
    }

    let Some(command) = cli.command.as_ref() else {
        println!("{}", BUILD_INFO.version_line("mpdwire"));
        println!("Use --help for usage information");
        return Ok(());
    };

    let config = load_config(&cli)?;
    let mut session = Session::from_config(&config);

    if !matches!(command, Commands::Version) {
        session
            .connect()
            .with_context(|| format!("Failed to connect to {}", config.endpoint()))?;
        if config.password().is_some() {
            session.authenticate().context("Authentication failed")?;
        }
    }

    run(&mut session, command, cli.format)?;

    if let Err(e) = session.close() {
        debug!("Ignoring disconnect failure: {}", e);
    }
    Ok(())
}

fn run(session: &mut Session, command: &Commands, format: Format) -> Result<()> {
    match command {
        Commands::Status => {
            let current = session.current_track()?;
            output::print_status(session.player(), session.status(), current.as_ref(), format)?;
        }
        Commands::Stats => {
            let raw = session.run(Command::Stats, &[])?.into_map();
            output::print_statistics(&Statistics::from_record(&raw), &raw, format)?;
        }
        Commands::Queue => {
            session.refresh()?;
            output::print_tracks(session.queue(), format)?;
        }
        Commands::Current => {
            let track = session.current_track()?;
            output::print_track(track.as_ref(), format)?;
        }
        Commands::Play { restart } => {
            let track = session.play(!restart)?;
            output::print_track(track.as_ref(), format)?;
        }
        Commands::Next => {
            let track = session.next()?;
            output::print_track(track.as_ref(), format)?;
        }
        Commands::Previous => {
            let track = session.previous()?;
            output::print_track(track.as_ref(), format)?;
        }
        Commands::Skip { position } => {
            let track = session.skip(*position)?;
            output::print_track(track.as_ref(), format)?;
        }
        Commands::Idle { subsystems } => {
            let subsystems: Vec<&str> = subsystems.iter().map(String::as_str).collect();
            let changed = session.idle(&subsystems)?;
            output::print_response(&mpdwire_client::Response::Values(changed), format)?;
        }
        Commands::List { tag } => {
            let response = session.run(Command::List, &args([tag]))?;
            output::print_response(&response, format)?;
        }
        Commands::Playlists => {
            let response = session.run(Command::ListPlaylists, &[])?;
            output::print_response(&response, format)?;
        }
        Commands::Add { uris } => {
            let mut batch = CommandList::new();
            for uri in uris {
                batch.push(Command::Add, &args([uri]));
            }
            session.send_batch(&batch)?;
            info!("Added {} URI(s) to the queue", uris.len());
            println!("Added {} item(s)", uris.len());
        }
        Commands::Raw { name, args: raw_args } => {
            let Some(response) = session.call(name, &args(raw_args))? else {
                bail!("Unknown command '{name}'");
            };
            output::print_response(&response, format)?;
        }
        Commands::Version => {
            // A daemon that cannot be reached is reported, not fatal.
            let server = match session.connect() {
                Ok(()) => session.server_version().map(str::to_string),
                Err(e) => {
                    debug!("Version check could not reach the daemon: {}", e);
                    None
                }
            };
            println!(
                "{}",
                BUILD_INFO.version_line_with_server("mpdwire", server.as_deref())
            );
        }
    }

    Ok(())
}

/// Config file, then `MPD_HOST`/`MPD_PORT`, then command-line flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = paths::config_path();

    let mut config = if config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        Config::default()
    };

    config.apply_env()?;

    if let Some(host) = &cli.host {
        config.host = host.clone();
        config.socket = None;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }

    debug!("Using daemon at {}", config.endpoint());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpdwire_client::PlayerStatus;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["mpdwire", "queue", "--format", "json", "--port", "6601"]);
        assert!(matches!(cli.command, Some(Commands::Queue)));
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.port, Some(6601));
    }

    #[test]
    fn test_cli_raw_collects_arguments() {
        let cli = Cli::parse_from(["mpdwire", "raw", "find", "Artist", "Pink Floyd"]);
        match cli.command {
            Some(Commands::Raw { name, args }) => {
                assert_eq!(name, "find");
                assert_eq!(args, vec!["Artist", "Pink Floyd"]);
            }
            _ => panic!("expected raw command"),
        }
    }

    #[test]
    fn test_add_requires_uri() {
        assert!(Cli::try_parse_from(["mpdwire", "add"]).is_err());
    }

    #[test]
    fn test_player_status_defaults_render() {
        let player = PlayerStatus::default();
        assert!(output::print_status(&player, &Default::default(), None, Format::Table).is_ok());
    }
}
