//! Kiln CLI
//!
//! A command-line tool for running code submissions in sandboxed
//! containers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kiln::{Classification, Config, EXAMPLE_CONFIG, Engine, ExecutionRequest};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Run untrusted code submissions in throwaway containers")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: kiln.toml)
        #[arg(short, long, default_value = "kiln.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a source file in a sandboxed container
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., python, cpp, java)
        #[arg(short, long)]
        language: String,

        /// File whose contents are fed to the program's stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Wall-clock budget in seconds
        #[arg(short = 't', long)]
        wall_time: Option<u64>,

        /// Memory ceiling in megabytes
        #[arg(short, long)]
        memory_limit: Option<u64>,
    },

    /// List available languages
    Languages,

    /// Show the effective configuration
    ShowConfig,

    /// Probe container runtime availability
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            source,
            language,
            input,
            wall_time,
            memory_limit,
        } => {
            run_submission(
                config,
                &source,
                &language,
                input.as_deref(),
                wall_time,
                memory_limit,
            )
            .await
        }
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
        Commands::Check => check_runtime(&config).await,
    }
}

async fn run_submission(
    mut config: Config,
    source: &PathBuf,
    language_id: &str,
    input: Option<&std::path::Path>,
    wall_time: Option<u64>,
    memory_limit: Option<u64>,
) -> Result<()> {
    let source_text = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;

    let stdin = if let Some(input_path) = input {
        Some(
            tokio::fs::read_to_string(input_path)
                .await
                .context("failed to read input file")?,
        )
    } else {
        None
    };

    // Only explicitly specified values override the configured ceilings
    if let Some(secs) = wall_time {
        config.limits.wall_time_secs = Some(secs);
    }
    if let Some(mb) = memory_limit {
        config.limits.memory_mb = Some(mb);
    }

    let mut request = ExecutionRequest::new(language_id, source_text);
    if let Some(stdin) = stdin {
        request = request.with_stdin(stdin);
    }

    let engine = Engine::new(config);
    info!(language = language_id, "executing submission");
    let result = engine.execute(&request).await?;

    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
        if !result.stderr.ends_with('\n') {
            eprintln!();
        }
    }

    // Log execution info via tracing (stderr), keeping stdout clean for piping
    info!(
        classification = ?result.classification,
        elapsed = format_args!("{}ms", result.elapsed_millis),
        exit_code = result.exit_code,
        "execution result"
    );

    match result.classification {
        Classification::Ok => Ok(()),
        Classification::RuntimeError => std::process::exit(result.exit_code.unwrap_or(1)),
        _ => std::process::exit(1),
    }
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    let mut languages: Vec<_> = config.languages.iter().collect();
    languages.sort_by_key(|(id, _)| *id);

    for (id, lang) in languages {
        let lang_type = if lang.is_compiled() {
            "compiled"
        } else {
            "interpreted"
        };
        println!("  {:<15} {} [{}] ({})", id, lang.name, lang.image, lang_type);
    }
}

fn show_config(config: &Config) {
    println!("Resource ceilings:");
    println!("  Memory: {} MB", config.limits.memory_mb());
    println!("  CPUs: {}", config.limits.cpus());
    println!("  Wall time: {:?}", config.limits.wall_time());
    println!("  Probe timeout: {:?}", config.limits.probe_timeout());
    println!("  Output cap: {} bytes", config.limits.max_output_bytes());
    println!();
    println!("Docker client: {}", config.docker_binary().display());
    println!("Workspace root: {}", config.workspace_root.display());
    println!();
    println!("Languages configured: {}", config.languages.len());
}

async fn check_runtime(config: &Config) -> Result<()> {
    let engine = Engine::new(config.clone());
    if engine.probe_isolation().await {
        println!("container runtime is reachable");
        Ok(())
    } else {
        eprintln!("container runtime is NOT reachable");
        std::process::exit(1);
    }
}

async fn init_config(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
