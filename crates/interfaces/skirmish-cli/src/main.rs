use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use skirmish_cli::{commands, LaunchOverrides};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the engine for a local skirmish
    Launch {
        #[arg(short, long, env = "SKIRMISH_CONFIG")]
        config: Option<Utf8PathBuf>,
        #[arg(long, help = "Engine binary (overrides config)")]
        engine: Option<Utf8PathBuf>,
        #[arg(long, help = "Engine write directory (overrides config)")]
        write_dir: Option<Utf8PathBuf>,
        #[arg(long)]
        isolation: bool,
        #[arg(long, help = "Write sl-connection.json instead of a start script")]
        no_start_script: bool,
        /// Engine arguments, forwarded only with --no-start-script
        #[arg(last = true)]
        extra: Vec<String>,
    },
    /// Print the start script for the configured match
    Script {
        #[arg(short, long, env = "SKIRMISH_CONFIG")]
        config: Option<Utf8PathBuf>,
        #[arg(long, default_value = "127.0.0.1")]
        address: String,
        #[arg(long, default_value_t = 0)]
        port: u16,
    },
    /// Inspect the launcher configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    Path,
    Show {
        #[arg(short, long, env = "SKIRMISH_CONFIG")]
        config: Option<Utf8PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut stdout = std::io::stdout();
    match cli.command {
        Commands::Launch {
            config,
            engine,
            write_dir,
            isolation,
            no_start_script,
            extra,
        } => {
            let overrides = LaunchOverrides {
                engine,
                write_dir,
                isolation,
                no_start_script,
            };
            let code = commands::cmd_launch(config, overrides, extra).await?;
            std::process::exit(code);
        }
        Commands::Script {
            config,
            address,
            port,
        } => commands::cmd_script(config, address, port, &mut stdout)?,
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::cmd_config_path(&mut stdout)?,
            ConfigCommands::Show { config } => commands::cmd_config_show(config, &mut stdout)?,
        },
    }

    Ok(())
}
