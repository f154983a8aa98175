use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use moor::commands::{config_cmd, diff_cmd, env, plugin, status, sync, watch_cmd, worktree_cmd};
use moor::config::ConfigError;
use moor::git::VcsError;
use moor::reconcile::ReconcileError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "moor")]
#[command(about = "Worktree state synchronization CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile persisted worktree records with `git worktree list`
    Sync {
        /// Repository root (defaults to the current directory)
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },

    /// Inspect worktrees
    Worktree {
        #[command(subcommand)]
        command: WorktreeCommands,
    },

    /// Show working-copy status
    Status {
        /// Repository root (defaults to the current directory)
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },

    /// Show the diff for a single file
    Diff {
        /// File to diff, relative to the repository root
        file: PathBuf,

        /// Repository root (defaults to the current directory)
        #[arg(short, long)]
        repo: Option<PathBuf>,

        /// Diff the staged (index) version instead of the working tree
        #[arg(long)]
        staged: bool,
    },

    /// Watch the repository and re-sync on change
    Watch {
        /// Repository root (defaults to the current directory)
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },

    /// Manage registered plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Inspect the resolved shell environment
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
}

#[derive(Subcommand)]
enum WorktreeCommands {
    /// List worktrees and their sync state
    List {
        /// Repository root (defaults to the current directory)
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PluginCommands {
    /// List registered plugins
    List,

    /// Register a plugin
    Add {
        /// Plugin name
        name: String,
    },

    /// Unregister a plugin
    Remove {
        /// Plugin name
        name: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,

    /// Restore the config file from its backup
    RestoreBackup,
}

#[derive(Subcommand)]
enum EnvCommands {
    /// Print the login-shell environment
    Show {
        /// Discard any cached environment and resolve again
        #[arg(long)]
        refresh: bool,

        /// Wait for resolution instead of falling back to the process env
        #[arg(long)]
        blocking: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "✗".red().bold());
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { repo } => sync::execute(repo),
        Commands::Worktree { command } => match command {
            WorktreeCommands::List { repo } => worktree_cmd::list(repo),
        },
        Commands::Status { repo } => status::execute(repo),
        Commands::Diff { file, repo, staged } => diff_cmd::execute(file, repo, staged),
        Commands::Watch { repo } => watch_cmd::execute(repo),
        Commands::Plugin { command } => match command {
            PluginCommands::List => plugin::list(),
            PluginCommands::Add { name } => plugin::add(name),
            PluginCommands::Remove { name } => plugin::remove(name),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Path => config_cmd::path(),
            ConfigCommands::RestoreBackup => config_cmd::restore_backup(),
        },
        Commands::Env { command } => match command {
            EnvCommands::Show { refresh, blocking } => env::show(refresh, blocking),
        },
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("MOOR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Map typed failures to distinct exit codes so scripts can branch on them.
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ConfigError>() {
            return match e {
                ConfigError::Parse { .. } => 2,
                ConfigError::Write { .. } => 4,
                ConfigError::BackupUnavailable { .. } => 5,
                ConfigError::NotFound { .. } => 1,
            };
        }
        if let Some(ReconcileError::PathMissing { .. }) = cause.downcast_ref::<ReconcileError>() {
            return 3;
        }
        if let Some(VcsError::PathMissing { .. }) = cause.downcast_ref::<VcsError>() {
            return 3;
        }
    }
    1
}
