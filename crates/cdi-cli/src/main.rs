mod commands;

use cdi_core::Injector;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cdi",
    version,
    about = "Resolve CDI devices and inject their edits into OCI runtime configs"
)]
struct Cli {
    /// Directory holding CDI spec files (overrides CDI_SPEC_DIR and the config file).
    #[arg(long, global = true)]
    spec_dir: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered specs by vendor and runtime.
    List,
    /// Check whether a device can be resolved (exit 0 if so, 1 otherwise).
    Has {
        /// Device name as requested by the container.
        device: String,
    },
    /// Inject device edits into an OCI runtime config.
    Inject {
        /// Path to the bundle's config.json.
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
        /// Write the result here instead of editing the config in place.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Device names to inject, in order.
        #[arg(required = true)]
        devices: Vec<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CDI_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let spec_dir = cli.spec_dir.as_deref();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::List => commands::make_registry(spec_dir)
            .and_then(|registry| commands::list::run(&registry, json_output)),
        Commands::Has { device } => commands::make_registry(spec_dir).and_then(|registry| {
            commands::has::run(&Injector::new(registry), &device, json_output)
        }),
        Commands::Inject {
            config,
            output,
            devices,
        } => commands::make_registry(spec_dir).and_then(|registry| {
            commands::inject::run(
                &Injector::new(registry),
                &config,
                &devices,
                output.as_deref(),
                json_output,
            )
        }),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
