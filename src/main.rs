use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jira_webform::files::NoFiles;
use jira_webform::{
    AuthConfig, DirectoryResolver, FileResolver, JiraSubmissionClient, Submission,
    SubmissionOutcome, TrackerConfig,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "jira_webform")]
#[command(about = "Turn web form submissions into Jira issues with attachments")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SubmissionArgs {
    /// Form data as key=value pairs
    #[arg(short = 'd', long = "data")]
    data: Vec<String>,
    /// JSON file containing form data
    #[arg(short = 'j', long = "json")]
    json_file: Option<PathBuf>,
    /// TOML file containing form data
    #[arg(short = 't', long = "toml")]
    toml_file: Option<PathBuf>,
    /// Form title used in the issue summary (defaults to the formTitle field)
    #[arg(long)]
    title: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file
    Init {
        /// Path to save the config file
        #[arg(short, long, default_value = "jira_webform.pvt.toml")]
        config: PathBuf,
    },
    /// Verify the configured credentials against the tracker
    Check {
        /// Path to the config file
        #[arg(short, long, default_value = "jira_webform.pvt.toml")]
        config: PathBuf,
        /// Credentials as user:password, overriding the config file
        #[arg(long)]
        credentials: Option<String>,
    },
    /// Print the issue payload a submission would produce, without sending it
    Preview {
        /// Path to the config file
        #[arg(short, long, default_value = "jira_webform.pvt.toml")]
        config: PathBuf,
        #[command(flatten)]
        submission: SubmissionArgs,
    },
    /// Create an issue from a submission and upload its attachments
    Submit {
        /// Path to the config file
        #[arg(short, long, default_value = "jira_webform.pvt.toml")]
        config: PathBuf,
        /// Credentials as user:password, overriding the config file
        #[arg(long)]
        credentials: Option<String>,
        /// Directory holding the files referenced by file fields
        #[arg(short, long)]
        files: Option<PathBuf>,
        #[command(flatten)]
        submission: SubmissionArgs,
    },
}

/// Prompt for credentials if not set in config
fn ensure_credentials(config: &mut TrackerConfig, pair: Option<&str>) -> Result<()> {
    if let Some(pair) = pair {
        config.auth = AuthConfig::from_pair(pair)?;
    }

    if config.auth.username.is_empty() {
        print!("Enter username: ");
        io::stdout().flush()?;
        let mut username = String::new();
        io::stdin().read_line(&mut username)?;
        config.auth.username = username.trim().to_string();

        if config.auth.username.is_empty() {
            return Err(anyhow::anyhow!("Username cannot be empty"));
        }
    }

    if config.auth.password.is_empty() {
        let password = rpassword::prompt_password("Enter password: ")?;
        if password.is_empty() {
            return Err(anyhow::anyhow!("Password cannot be empty"));
        }
        config.auth.password = password;
    }

    jira_webform::log_info!("Credentials configured for user: {}", config.auth.username);
    Ok(())
}

fn read_source(path: Option<&PathBuf>, kind: &str) -> Result<Option<String>> {
    path.map(|path| {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {} file: {}", kind, path.display()))
    })
    .transpose()
}

/// Collect fields from TOML, then JSON, then -d pairs; later sources win.
fn load_submission(args: SubmissionArgs) -> Result<Submission> {
    let toml_content = read_source(args.toml_file.as_ref(), "TOML")?;
    let json_content = read_source(args.json_file.as_ref(), "JSON")?;
    let fields = jira_webform::form::collect_fields(
        toml_content.as_deref(),
        json_content.as_deref(),
        &args.data,
    )?;

    if fields.is_empty() {
        return Err(anyhow::anyhow!(
            "No form data provided. Use -d key=value, -j data.json, or -t data.toml"
        ));
    }

    Ok(match args.title {
        Some(title) => Submission::new(title, fields),
        None => Submission::from_fields(fields),
    })
}

fn report(outcome: &SubmissionOutcome) -> ExitCode {
    println!("{}", outcome.user_message());
    match outcome {
        SubmissionOutcome::Success { attachments, .. } => {
            for attachment in attachments {
                let status = if attachment.uploaded { "uploaded" } else { "FAILED" };
                println!("  attachment {}: {}", attachment.file_name, status);
            }
            ExitCode::SUCCESS
        }
        SubmissionOutcome::ValidationError { messages } => {
            for message in messages {
                eprintln!("  {}", message);
            }
            ExitCode::FAILURE
        }
        SubmissionOutcome::UnknownError { raw } => {
            eprintln!("  tracker response: {}", raw);
            ExitCode::FAILURE
        }
        SubmissionOutcome::TransportError { cause } => {
            eprintln!("  cause: {}", cause);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    jira_webform::logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Init { config } => {
            let default_config = jira_webform::config::create_default_config();
            jira_webform::config::save_config(&default_config, &config)?;
            println!("Configuration file created at: {}", config.display());
            println!("Please edit the file with your credentials and settings.");
        }

        Commands::Check { config, credentials } => {
            let mut config = jira_webform::config::load_config(&config)?;
            ensure_credentials(&mut config, credentials.as_deref())?;

            println!("Authenticating...");
            jira_webform::auth::verify_credentials(&reqwest::Client::new(), &config).await?;
            println!("Authentication successful!");
        }

        Commands::Preview { config, submission } => {
            let config = jira_webform::config::load_config(&config)?;
            let submission = load_submission(submission)?;
            let client = JiraSubmissionClient::new(config)?;

            let payload = client.preview(&submission)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }

        Commands::Submit {
            config,
            credentials,
            files,
            submission,
        } => {
            let mut config = jira_webform::config::load_config(&config)?;
            ensure_credentials(&mut config, credentials.as_deref())?;
            let submission = load_submission(submission)?;
            let client = JiraSubmissionClient::new(config)?;

            let resolver: Box<dyn FileResolver> = match files {
                Some(dir) => Box::new(DirectoryResolver::new(dir)),
                None => Box::new(NoFiles),
            };

            println!("Submitting form with {} fields...", submission.fields.len());
            let outcome = client.submit(&submission, resolver.as_ref()).await?;
            return Ok(report(&outcome));
        }
    }

    Ok(ExitCode::SUCCESS)
}
