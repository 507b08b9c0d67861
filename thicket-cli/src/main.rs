//! Thicket CLI - Command-line front end for file-backed repositories
//!
//! Each invocation loads a repository from an exported JSON document, runs a
//! single operation and writes the document back when the operation changed it.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thicket_core::prelude::*;
use thicket_core::versioning::short_id;

#[derive(Parser)]
#[command(name = "thicket")]
#[command(about = "Version control for structured data", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository file
    #[arg(long, global = true, env = "THICKET_REPO", default_value = "thicket.json")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new repository file
    Init {
        /// Initial snapshot as JSON
        #[arg(long)]
        data: Option<String>,
    },
    /// Record a snapshot
    Commit {
        /// Snapshot as JSON
        #[arg(long)]
        data: String,
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Show history from HEAD
    Log {
        /// Maximum number of entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show a commit, HEAD by default
    Show {
        /// Commit ID
        id: Option<String>,
    },
    /// List branches or create one
    Branch {
        /// Name of the branch to create
        name: Option<String>,
    },
    /// Checkout a branch or commit
    Checkout {
        /// Branch name or commit ID
        target: String,
    },
    /// Switch to a branch, creating it if needed
    Switch {
        /// Branch name
        name: String,
    },
    /// Structural diff between two commits
    Diff {
        /// Older commit ID
        from: String,
        /// Newer commit ID
        to: String,
    },
    /// Restore the data of an older commit
    Revert {
        /// Commit ID
        id: String,
    },
    /// Fold recent commits into one
    Squash {
        /// Number of commits to squash
        count: usize,
        /// Message of the squashed commit
        #[arg(short, long)]
        message: String,
    },
    /// Stash commands
    Stash {
        #[command(subcommand)]
        command: StashCommands,
    },
    /// Compare with another repository file
    Compare {
        /// Other repository file
        other: PathBuf,
    },
    /// Pull from another repository file
    Pull {
        /// Other repository file
        other: PathBuf,
        /// merge or rebase
        #[arg(long, default_value = "merge")]
        strategy: String,
    },
    /// Sync with another repository file, updating both
    Sync {
        /// Other repository file
        other: PathBuf,
        /// ours, theirs or manual
        #[arg(long, default_value = "theirs")]
        resolution: String,
    },
    /// Version information
    Version,
}

#[derive(Subcommand)]
enum StashCommands {
    /// Push a snapshot onto the stash
    Push {
        /// Snapshot as JSON
        #[arg(long)]
        data: String,
        /// Stash message
        #[arg(short, long, default_value = "WIP")]
        message: String,
    },
    /// Pop the most recent entry and print its data
    Pop,
    /// List stash entries
    List,
    /// Print an entry's data without removing it
    Apply {
        /// Stash index, most recent by default
        index: Option<usize>,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ThicketConfig::load()?;

    match cli.command {
        Commands::Version => {
            println!("thicket {}", env!("CARGO_PKG_VERSION"));
            println!("thicket-core {}", thicket_core::VERSION);
        }
        Commands::Init { data } => {
            if cli.repo.exists() {
                bail!("Repository file {} already exists", cli.repo.display());
            }

            let mut repo = Repository::with_config(config);
            if let Some(data) = data {
                let message = repo.config().initial_message.clone();
                repo.commit(parse_snapshot(&data)?, &message);
            }
            save_repository(&cli.repo, &repo)?;
            println!("Initialized repository at {}", cli.repo.display());
        }
        Commands::Commit { data, message } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            let id = repo.commit(parse_snapshot(&data)?, &message);
            save_repository(&cli.repo, &repo)?;
            println!("[{} {}] {}", repo.current_branch(), short(&repo, &id), message);
        }
        Commands::Log { limit } => {
            let repo = load_repository(&cli.repo, &config)?;
            let history = match limit {
                Some(limit) => repo.log(limit),
                None => repo.log_default(),
            };
            for entry in history {
                println!(
                    "{} {} ({}, {})",
                    short(&repo, &entry.id),
                    entry.message,
                    entry.branch,
                    entry.timestamp.to_rfc3339()
                );
            }
        }
        Commands::Show { id } => {
            let repo = load_repository(&cli.repo, &config)?;
            let Some(id) = id.or_else(|| repo.head().map(String::from)) else {
                bail!("Repository has no commits");
            };
            let commit = repo.get_commit_record(&id)?;
            println!("{}", serde_json::to_string_pretty(&commit)?);
        }
        Commands::Branch { name } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            match name {
                Some(name) => {
                    repo.branch(&name)?;
                    save_repository(&cli.repo, &repo)?;
                    println!("Created branch {}", name);
                }
                None => {
                    for branch in repo.list_branches() {
                        let marker = if branch.is_current { "*" } else { " " };
                        let head = branch
                            .head
                            .as_deref()
                            .map(|id| short(&repo, id))
                            .unwrap_or("-");
                        println!("{} {} {}", marker, branch.name, head);
                    }
                }
            }
        }
        Commands::Checkout { target } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            let result = repo.checkout(&target)?;
            save_repository(&cli.repo, &repo)?;
            println!("Switched to {}", result.current);
            if result.detached {
                println!("HEAD is detached; the next commit moves {}", repo.current_branch());
            }
        }
        Commands::Switch { name } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            let result = repo.switch_branch(&name)?;
            save_repository(&cli.repo, &repo)?;
            println!("Switched from {} to {}", result.previous, result.current);
        }
        Commands::Diff { from, to } => {
            let repo = load_repository(&cli.repo, &config)?;
            let changes = repo.diff_commits(&from, &to)?;
            if changes.is_empty() {
                println!("No changes");
            }
            for line in changes.summary() {
                println!("{}", line);
            }
        }
        Commands::Revert { id } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            let new_id = repo.revert(&id)?;
            save_repository(&cli.repo, &repo)?;
            println!("Reverted to {} as {}", short(&repo, &id), short(&repo, &new_id));
        }
        Commands::Squash { count, message } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            let id = repo.squash(count, &message)?;
            save_repository(&cli.repo, &repo)?;
            println!("Squashed into {}", short(&repo, &id));
        }
        Commands::Stash { command } => run_stash(&cli.repo, &config, command)?,
        Commands::Compare { other } => {
            let repo = load_repository(&cli.repo, &config)?;
            let remote = load_remote(&other, &config, &repo)?;
            let comparison = repo.compare_forks(&remote);

            match &comparison.common_ancestor {
                Some(ancestor) => println!("Common ancestor: {}", short(&repo, &ancestor.id)),
                None => println!("No common ancestor"),
            }
            println!("Ahead: {}", comparison.ahead_count);
            println!("Behind: {}", comparison.behind_count);
            println!("Diverged: {}", comparison.diverged);
            println!("Can fast-forward: {}", comparison.can_fast_forward);
        }
        Commands::Pull { other, strategy } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            let remote = load_remote(&other, &config, &repo)?;
            let result = repo.pull_with(&remote, &strategy)?;
            save_repository(&cli.repo, &repo)?;
            println!("{}", describe_pull(&result));
        }
        Commands::Sync { other, resolution } => {
            let mut repo = load_repository(&cli.repo, &config)?;
            let mut remote = load_remote(&other, &config, &repo)?;
            let result = repo.sync_with(&mut remote, &resolution)?;
            save_repository(&cli.repo, &repo)?;
            save_repository(&other, &remote)?;

            match result {
                SyncResult::UpToDate => println!("Already up to date"),
                SyncResult::Pulled(pull) => println!("{}", describe_pull(&pull)),
                SyncResult::Pushed { copied, .. } => {
                    println!("Pushed {} commits to {}", copied, other.display())
                }
                SyncResult::MergedOurs(merge) => {
                    println!("Merged keeping local data as {}", short(&repo, &merge.commit))
                }
            }
        }
    }

    Ok(())
}

fn run_stash(path: &Path, config: &ThicketConfig, command: StashCommands) -> Result<()> {
    let mut repo = load_repository(path, config)?;

    match command {
        StashCommands::Push { data, message } => {
            let index = repo.stash(parse_snapshot(&data)?, &message);
            save_repository(path, &repo)?;
            println!("Saved stash@{{{}}}", index);
        }
        StashCommands::Pop => {
            let data = repo.stash_pop()?;
            save_repository(path, &repo)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        StashCommands::List => {
            for entry in repo.stash_list().iter().rev() {
                println!("stash@{{{}}}: {} on {}", entry.index, entry.message, entry.branch);
            }
        }
        StashCommands::Apply { index } => {
            let data = repo.stash_apply(index)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}

fn describe_pull(result: &PullResult) -> String {
    match result {
        PullResult::UpToDate => "Already up to date".to_string(),
        PullResult::FastForward { copied, .. } => {
            format!("Fast-forwarded ({} commits copied)", copied)
        }
        PullResult::Merged(merge) => format!(
            "Merged {} remote commits into {} local",
            merge.behind, merge.ahead
        ),
        PullResult::Rebased(rebase) => {
            format!("Rebased {} commits", rebase.replayed_count())
        }
    }
}

fn short<'a>(repo: &Repository, id: &'a str) -> &'a str {
    short_id(id, repo.config().short_id_length)
}

fn parse_snapshot(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON snapshot: {}", raw))
}

fn load_repository(path: &Path, config: &ThicketConfig) -> Result<Repository> {
    read_repository(path, config, config.ids.build_generator())
}

/// Load a second repository that shares `local`'s id generator, so commits
/// made on either side during one invocation never reuse an id
fn load_remote(path: &Path, config: &ThicketConfig, local: &Repository) -> Result<Repository> {
    read_repository(path, config, local.id_generator())
}

fn read_repository(
    path: &Path,
    config: &ThicketConfig,
    ids: Arc<dyn IdGenerator>,
) -> Result<Repository> {
    let serialized = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read repository {}", path.display()))?;

    let mut repo = Repository::builder()
        .config(config.clone())
        .id_generator(ids)
        .build()?;
    repo.import(&serialized)
        .with_context(|| format!("Failed to load repository {}", path.display()))?;

    tracing::debug!(path = %path.display(), commits = repo.commit_count(), "Loaded repository");
    Ok(repo)
}

fn save_repository(path: &Path, repo: &Repository) -> Result<()> {
    std::fs::write(path, repo.export()?)
        .with_context(|| format!("Failed to write repository {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load_repository() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("repo.json");

        let mut repo = Repository::with_data(json!({"a": 1}));
        repo.branch("feature").expect("Failed to create branch");
        save_repository(&path, &repo).expect("Failed to save");

        let loaded = load_repository(&path, &ThicketConfig::default()).expect("Failed to load");
        assert_eq!(loaded.get_data().expect("data"), Some(json!({"a": 1})));
        assert!(loaded.has_branch("feature"));
    }

    #[test]
    fn test_remote_loaded_from_a_copy_gets_distinct_ids() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let local_path = dir.path().join("local.json");
        let remote_path = dir.path().join("remote.json");
        let config = ConfigBuilder::new().sequential_ids("c").build();

        let mut origin = Repository::builder()
            .config(config.clone())
            .initial_data(json!({"a": 1}))
            .build()
            .expect("Failed to create repository");
        origin.commit(json!({"a": 2}), "two");
        save_repository(&local_path, &origin).expect("Failed to save");
        save_repository(&remote_path, &origin).expect("Failed to save");

        let mut local = load_repository(&local_path, &config).expect("Failed to load");
        let mut remote = load_remote(&remote_path, &config, &local).expect("Failed to load");
        let local_id = local.commit(json!({"a": "local"}), "local");
        let remote_id = remote.commit(json!({"a": "remote"}), "remote");

        assert_ne!(local_id, remote_id);
        let result = local
            .sync(&mut remote, ConflictResolution::Theirs)
            .expect("Failed to sync");
        assert!(matches!(result, SyncResult::Pulled(PullResult::Merged(_))));
        assert_eq!(local.get_data().expect("data"), Some(json!({"a": "remote"})));
    }

    #[test]
    fn test_load_missing_repository() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = load_repository(&dir.path().join("absent.json"), &ThicketConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_snapshot_rejects_invalid_json() {
        assert_eq!(parse_snapshot("[1, 2]").expect("valid"), json!([1, 2]));
        assert!(parse_snapshot("{oops").is_err());
    }

    #[test]
    fn test_cli_parses_nested_stash_command() {
        let cli = Cli::parse_from(["thicket", "--repo", "r.json", "stash", "apply", "2"]);
        assert_eq!(cli.repo, PathBuf::from("r.json"));
        assert!(matches!(
            cli.command,
            Commands::Stash { command: StashCommands::Apply { index: Some(2) } }
        ));
    }
}
