//! Jenkins Triage CLI
//!
//! The `jenkins-triage` command groups a job's failed builds by how closely
//! their errors match the most recent failure.
//!
//! ## Commands
//!
//! - `errors`: cluster failed builds by extracted error lines
//! - `gather`: cluster every build by the lines between two markers
//! - `extract`: run extraction over a saved console log, offline

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};

use jenkins_client::{JenkinsClient, JenkinsConfig};
use triage_core::{
    extract, select_strategy, Delimiters, Extraction, Triage, TriageConfig, TriageReport,
};

#[derive(Parser)]
#[command(name = "jenkins-triage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify and cluster Jenkins build failures", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Triage settings file (TOML)
    #[arg(long, global = true, env = "JENKINS_TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster the failed builds of a job by their error lines
    Errors {
        /// Job name; folders as `folder/job`
        job: String,

        #[command(flatten)]
        jenkins: JenkinsArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Cluster every build of a job by the lines between two markers
    Gather {
        /// Job name; folders as `folder/job`
        job: String,

        /// Line that opens the region to collect
        #[arg(long)]
        start_delimiter: String,

        /// Line that closes the region to collect
        #[arg(long)]
        end_delimiter: String,

        #[command(flatten)]
        jenkins: JenkinsArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show what would be extracted from a saved console log
    Extract {
        /// Console log file
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, requires = "end_delimiter")]
        start_delimiter: Option<String>,

        #[arg(long, requires = "start_delimiter")]
        end_delimiter: Option<String>,
    },
}

#[derive(Args)]
struct JenkinsArgs {
    /// Jenkins base URL
    #[arg(long, env = "JENKINS_URL")]
    jenkins_url: String,

    #[arg(long, env = "JENKINS_USERNAME")]
    jenkins_username: Option<String>,

    /// API token for basic auth
    #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
    jenkins_token: Option<String>,

    /// Label axis of nested matrix views
    #[arg(long)]
    nested_label: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl JenkinsArgs {
    fn to_config(&self) -> JenkinsConfig {
        let mut config = JenkinsConfig::new(&self.jenkins_url);
        config.username = self.jenkins_username.clone();
        config.token = self.jenkins_token.clone();
        if let Some(label) = &self.nested_label {
            config = config.with_nested_label(label);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(secs);
        }
        config
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    triage_core::init_tracing(cli.json_logs, level);

    let config = TriageConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load triage configuration")?;

    match cli.command {
        Commands::Errors {
            job,
            jenkins,
            format,
        } => cmd_errors(&config, jenkins.to_config(), &job, format).await,
        Commands::Gather {
            job,
            start_delimiter,
            end_delimiter,
            jenkins,
            format,
        } => {
            cmd_gather(
                &config,
                jenkins.to_config(),
                &job,
                &start_delimiter,
                &end_delimiter,
                format,
            )
            .await
        }
        Commands::Extract {
            file,
            start_delimiter,
            end_delimiter,
        } => cmd_extract(
            &config,
            &file,
            Delimiters::from_options(start_delimiter, end_delimiter).as_ref(),
        ),
    }
}

/// Ask for the API token on the terminal when only a username was given.
///
/// Without a terminal the requests go out with the username alone, which
/// Jenkins usually rejects; say so up front.
fn prompt_for_token(jenkins: &mut JenkinsConfig, interactive: bool) -> Result<()> {
    let Some(username) = jenkins.username.clone() else {
        return Ok(());
    };
    if !jenkins.needs_token() {
        return Ok(());
    }

    if !interactive {
        warn!(
            username = %username,
            "no Jenkins API token supplied (set JENKINS_TOKEN or pass --jenkins-token)"
        );
        return Ok(());
    }

    let token = dialoguer::Password::new()
        .with_prompt(format!("Jenkins API token for {}", username))
        .interact()
        .context("Failed to read Jenkins API token")?;
    jenkins.token = Some(token);
    Ok(())
}

fn build_triage(config: &TriageConfig, mut jenkins: JenkinsConfig) -> Result<Triage> {
    prompt_for_token(&mut jenkins, std::io::stdin().is_terminal())?;
    let client = JenkinsClient::new(jenkins).context("Failed to build Jenkins client")?;
    Triage::new(Arc::new(client), config).context("Invalid triage configuration")
}

async fn cmd_errors(
    config: &TriageConfig,
    jenkins: JenkinsConfig,
    job: &str,
    format: OutputFormat,
) -> Result<()> {
    let triage = build_triage(config, jenkins)?;
    info!("Triaging failed builds of {}", job);

    let report = triage
        .errors(job)
        .await
        .with_context(|| format!("Failed to list builds of {}", job))?;
    print_report(&report, format)
}

async fn cmd_gather(
    config: &TriageConfig,
    jenkins: JenkinsConfig,
    job: &str,
    start: &str,
    end: &str,
    format: OutputFormat,
) -> Result<()> {
    let delimiters =
        Delimiters::new(start, end).context("Start and end delimiters must be non-empty")?;
    let triage = build_triage(config, jenkins)?;
    info!("Gathering delimited lines from builds of {}", job);

    let report = triage
        .gather(job, &delimiters)
        .await
        .with_context(|| format!("Failed to list builds of {}", job))?;
    print_report(&report, format)
}

fn cmd_extract(config: &TriageConfig, file: &Path, delimiters: Option<&Delimiters>) -> Result<()> {
    print!("{}", render_extract(config, file, delimiters)?);
    Ok(())
}

/// Offline extraction: nested references are listed, never fetched.
fn render_extract(
    config: &TriageConfig,
    file: &Path,
    delimiters: Option<&Delimiters>,
) -> Result<String> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read console log {}", file.display()))?;
    let noise = config
        .noise_filter()
        .context("Invalid ignore patterns")?;

    let strategy = select_strategy(&text, delimiters);
    let mut out = format!("Strategy: {}\n", strategy);

    match extract(&text, strategy, delimiters, &noise) {
        Extraction::Lines(errors) => {
            out.push_str(&format!("{} line(s):\n", errors.len()));
            for line in &errors {
                out.push_str(&format!("\t{}\n", line));
            }
        }
        Extraction::References(references) => {
            out.push_str(&format!("{} nested reference(s):\n", references.len()));
            for r in references {
                out.push_str(&format!("\t{} (build #{})\n", r.target, r.build));
            }
        }
    }

    Ok(out)
}

fn print_report(report: &TriageReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}
