//! AMS CLI - Command-line tool for the admin console
//!
//! Talks to a running AMS server over HTTP: health checks, website backups
//! and the public job list.

use clap::{Parser, Subcommand};
use reqwest::{redirect, Client, StatusCode};
use serde_json::Value;
use std::process;
use std::time::Duration;
use tracing::{error, info};

/// AMS CLI - Admin console tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL to connect to
    #[arg(short, long, default_value = "http://localhost:8080", env = "AMS_URL")]
    url: String,

    /// Staff user id for admin commands
    #[arg(long, env = "AMS_USER")]
    user: Option<String>,

    /// Staff password for admin commands
    #[arg(long, env = "AMS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Quick health check (for Docker healthcheck)
    Health,

    /// Website backup commands
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Job posting commands
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },
}

#[derive(Subcommand, Debug)]
enum BackupCommands {
    /// Start a backup
    Start,

    /// Show backup progress
    Progress {
        /// Keep polling until the backup finishes
        #[arg(short, long)]
        wait: bool,
    },

    /// Cancel the running backup
    Cancel,

    /// Download the latest archive
    Download {
        /// Where to write the archive
        #[arg(short, long, default_value = "backup.zip")]
        output: String,
    },
}

#[derive(Subcommand, Debug)]
enum JobCommands {
    /// List open jobs
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match build_client() {
        Ok(client) => match cli.command {
            Commands::Health => handle_health(&client, &cli.url).await,
            Commands::Jobs { command } => handle_jobs(&client, &cli.url, command).await,
            Commands::Backup { command } => {
                match login(&client, &cli.url, cli.user.as_deref(), cli.password.as_deref()).await {
                    Ok(()) => handle_backup(&client, &cli.url, command).await,
                    Err(e) => Err(e),
                }
            }
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

/// Cookie-keeping client that does not follow redirects, so the login
/// response can be inspected
fn build_client() -> anyhow::Result<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()?)
}

async fn login(
    client: &Client,
    base_url: &str,
    user: Option<&str>,
    password: Option<&str>,
) -> anyhow::Result<()> {
    let (Some(user), Some(password)) = (user, password) else {
        anyhow::bail!("Admin commands need --user and --password (or AMS_USER / AMS_PASSWORD)");
    };

    let url = format!("{}/login", base_url);
    let response = client
        .post(&url)
        .form(&[("userid", user), ("password", password)])
        .send()
        .await?;

    match response.status() {
        StatusCode::SEE_OTHER | StatusCode::FOUND => {
            info!(user, "Logged in");
            Ok(())
        }
        StatusCode::UNAUTHORIZED => anyhow::bail!("Login refused for '{}'", user),
        status => anyhow::bail!("Login failed with status: {}", status),
    }
}

async fn handle_health(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", base_url);
    let response = client.get(&url).send().await?;

    if response.status().is_success() {
        let json: Value = response.json().await?;
        println!("{}", serde_json::to_string_pretty(&json)?);
        Ok(())
    } else {
        anyhow::bail!("Health check failed with status: {}", response.status())
    }
}

async fn handle_jobs(client: &Client, base_url: &str, command: JobCommands) -> anyhow::Result<()> {
    match command {
        JobCommands::List => {
            let url = format!("{}/get-jobs", base_url);
            let jobs: Vec<Value> = client.get(&url).send().await?.json().await?;

            if jobs.is_empty() {
                println!("No open jobs");
            }
            for job in &jobs {
                println!(
                    "#{:<4} {:<30} {:<25} {:<15} expires {}",
                    job["id"],
                    job["positions"].as_str().unwrap_or(""),
                    job["company"].as_str().unwrap_or(""),
                    job["place"].as_str().unwrap_or(""),
                    job["expiry"].as_str().unwrap_or("never"),
                );
            }
        }
    }
    Ok(())
}

/// Turn an error payload into a readable failure
async fn expect_success(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response.json().await?;
    if status.is_success() {
        Ok(body)
    } else {
        anyhow::bail!(
            "{} ({})",
            body["message"].as_str().unwrap_or("request failed"),
            status
        )
    }
}

fn print_progress(progress: &Value) {
    println!(
        "{:>3}%  {}/{} files  {}",
        progress["percent"], progress["current"], progress["total"], progress["status"].as_str().unwrap_or("")
    );
}

async fn handle_backup(
    client: &Client,
    base_url: &str,
    command: BackupCommands,
) -> anyhow::Result<()> {
    match command {
        BackupCommands::Start => {
            let url = format!("{}/start-backup", base_url);
            let response = expect_success(client.post(&url).send().await?).await?;
            println!("{}", response["message"].as_str().unwrap_or("Backup started"));
        }
        BackupCommands::Progress { wait } => {
            let url = format!("{}/backup-progress", base_url);
            loop {
                let progress = expect_success(client.get(&url).send().await?).await?;
                print_progress(&progress);
                if !wait || progress["running"] != Value::Bool(true) {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
        BackupCommands::Cancel => {
            let url = format!("{}/cancel-backup", base_url);
            let response = expect_success(client.post(&url).send().await?).await?;
            println!("{}", response["message"].as_str().unwrap_or("Cancellation requested"));
        }
        BackupCommands::Download { output } => {
            let url = format!("{}/download-backup", base_url);
            let response = client.get(&url).send().await?;
            if !response.status().is_success() {
                expect_success(response).await?;
                return Ok(());
            }
            let bytes = response.bytes().await?;
            tokio::fs::write(&output, &bytes).await?;
            info!(path = %output, size = bytes.len(), "Backup downloaded");
        }
    }
    Ok(())
}
