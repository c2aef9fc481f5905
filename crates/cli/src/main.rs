mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depman_lib::config::Settings;
use depman_lib::download::ALL_ARTIFACTS;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd::*;
use crate::output::print_error;

/// depman - record and verify the builds a CI build depends on
#[derive(Parser)]
#[command(name = "depman")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Config file (default: config.toml in the user config directory)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// CI server base URL
  #[arg(long, global = true)]
  server: Option<String>,

  /// Job that archives third-party artifacts
  #[arg(long, global = true)]
  repository: Option<String>,

  /// Manifest file name, locally and among build artifacts
  #[arg(long, global = true)]
  manifest: Option<String>,

  /// CI credentials as user:password
  #[arg(short, long, global = true)]
  credentials: Option<String>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Write the manifest for a build; on a dependency conflict the build is aborted
  Build {
    /// Job name
    job: String,
    /// Build number
    build: u64,
  },

  /// Add a CI project, and the projects its manifest lists, to the local manifest
  AddProject {
    /// Job name
    name: String,
  },

  /// Add a repository artifact to the local manifest
  AddArtifact {
    /// Artifact name
    name: String,
  },

  /// Download the artifacts of the builds listed in the local manifest
  Download {
    /// Target folder
    folder: PathBuf,
    /// Only artifacts whose name matches this pattern from the start
    #[arg(short, long, default_value = ALL_ARTIFACTS)]
    pattern: String,
  },

  /// Show revision changes of a job between two manifests
  Compare {
    /// Older manifest
    old: PathBuf,
    /// Newer manifest
    new: PathBuf,
    /// Job to compare
    job: String,
    /// Show svn diff instead of svn log
    #[arg(short, long)]
    diff: bool,
  },

  /// Fail if the last stable build of a job is older than the given number of hours
  AssertJobAge {
    /// Job name
    job: String,
    /// Maximum age in hours
    hours: u64,
  },

  /// Fail if a dependency of a build is older than the given number of hours
  AssertDependencyAge {
    /// Master job name
    master: String,
    /// Master build number
    build: u64,
    /// Dependency name
    dependency: String,
    /// Maximum age in hours
    hours: u64,
  },

  /// Build a package from the artifacts declared by the jobs of a view
  Package {
    /// View name
    view: String,
    /// Declaration keyword in the job descriptions
    keyword: String,
    /// Package name, also the archive's top-level directory
    name: String,
    /// Download folder
    #[arg(short, long, default_value = "resources")]
    download: PathBuf,
    /// Additional artifact pattern
    #[arg(short, long)]
    pattern: Option<String>,
    /// Remove md5 files before archiving
    #[arg(short = 'm', long)]
    remove_md5s: bool,
    /// Owner of the view (default: view_user from settings)
    #[arg(short, long)]
    user: Option<String>,
  },
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn settings(cli: &Cli) -> Result<Settings> {
  let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
  if let Some(server) = &cli.server {
    settings.server = server.clone();
  }
  if let Some(repository) = &cli.repository {
    settings.repository_project = repository.clone();
  }
  if let Some(manifest) = &cli.manifest {
    settings.manifest_filename = manifest.clone();
  }
  if let Some(credentials) = &cli.credentials {
    settings.credentials = Some(credentials.clone());
  }
  debug!(
    server = %settings.server,
    repository = %settings.repository_project,
    manifest = %settings.manifest_filename,
    "settings resolved"
  );
  Ok(settings)
}

fn run(cli: Cli) -> Result<()> {
  let settings = settings(&cli)?;

  match cli.command {
    Commands::Build { job, build } => cmd_build(&settings, &job, build),
    Commands::AddProject { name } => cmd_add_project(&settings, &name),
    Commands::AddArtifact { name } => cmd_add_artifact(&settings, &name),
    Commands::Download { folder, pattern } => cmd_download(&settings, &folder, &pattern),
    Commands::Compare { old, new, job, diff } => cmd_compare(&settings, &old, &new, &job, diff),
    Commands::AssertJobAge { job, hours } => cmd_assert_job_age(&settings, &job, hours),
    Commands::AssertDependencyAge {
      master,
      build,
      dependency,
      hours,
    } => cmd_assert_dependency_age(&settings, &master, build, &dependency, hours),
    Commands::Package {
      view,
      keyword,
      name,
      download,
      pattern,
      remove_md5s,
      user,
    } => cmd_package(
      &settings,
      PackageArgs {
        view,
        keyword,
        name,
        download,
        pattern,
        remove_md5s,
        user,
      },
    ),
  }
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  if let Err(e) = run(cli) {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}
