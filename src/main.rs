mod cli;
mod config;
mod error;
mod harbor;
mod models;
mod output;
mod policy;
mod prompt;
mod ranking;
mod repo_retention;
mod session;
mod tag_retention;

use std::io;
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use reqwest::Method;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::GeneralConfig;
use harbor::HarborClient;
use policy::RetentionPolicy;
use session::Session;
use tag_retention::TagRetentionArgs;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        println!("error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "harborctl=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::RpRepos => {
            let policy = RetentionPolicy::load(&cli.policy)?;
            let client = authenticated_client(&cli)?;
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            repo_retention::run(&client, &policy, Utc::now(), stdin.lock(), &mut stdout).await?;
        }
        Command::RpTags(args) => {
            let client = authenticated_client(&cli)?;
            let args = TagRetentionArgs {
                day: args.day,
                max: args.max,
                repo_name: args.repo_name.clone().filter(|name| !name.is_empty()),
            };
            tag_retention::run(&client, &args, Utc::now()).await?;
        }
        Command::RpShow => {
            let policy = RetentionPolicy::load(&cli.policy)?;
            let rendered =
                serde_json::to_string_pretty(&policy).context("Failed to render retention policy")?;
            println!("{}", rendered);
        }
        Command::Login(args) => {
            if std::env::var_os("HARBOR_PASSWORD").is_none() {
                println!("WARNING! Using --password via the CLI is insecure.");
            }
            let client = anonymous_client(&cli)?;
            let (session, raw) = client.login(&args.username, &args.password).await?;
            session.save(&cli.session_file)?;
            output::print_raw(&raw);
            debug!("session saved to {}", cli.session_file.display());
        }
        Command::Logout => {
            let client = authenticated_client(&cli)?;
            let raw = client.logout().await?;
            Session::remove(&cli.session_file)?;
            output::print_raw(&raw);
        }
        Command::Statistics => {
            passthrough(&cli, Method::GET, "/api/statistics".to_string(), &[]).await?;
        }
        Command::Search(args) => {
            passthrough(&cli, Method::GET, "/api/search".to_string(), &[("q", args.query.as_str())]).await?;
        }
        Command::ReposTop(args) => {
            let count = args.count.to_string();
            passthrough(
                &cli,
                Method::GET,
                "/api/repositories/top".to_string(),
                &[("count", count.as_str())],
            )
            .await?;
        }
        Command::TagsList(args) => {
            passthrough(&cli, Method::GET, format!("/api/repositories/{}/tags", args.repo_name), &[]).await?;
        }
        Command::RepoDel(args) => {
            passthrough(&cli, Method::DELETE, format!("/api/repositories/{}", args.repo_name), &[]).await?;
        }
        Command::TagDel(args) => {
            passthrough(
                &cli,
                Method::DELETE,
                format!("/api/repositories/{}/tags/{}", args.repo_name, args.tag),
                &[],
            )
            .await?;
        }
    }
    Ok(())
}

fn base_url(cli: &Cli) -> Result<(String, bool)> {
    match &cli.url {
        Some(url) => {
            let insecure = GeneralConfig::insecure_flag(&cli.config)?;
            Ok((url.clone(), insecure))
        }
        None => {
            let config = GeneralConfig::load(&cli.config)?;
            Ok((config.base_url(), config.insecure))
        }
    }
}

fn anonymous_client(cli: &Cli) -> Result<HarborClient> {
    let (url, insecure) = base_url(cli)?;
    debug!("using Harbor at {}", url);
    HarborClient::new(&url, insecure)
}

fn authenticated_client(cli: &Cli) -> Result<HarborClient> {
    let session = Session::load(&cli.session_file)?;
    Ok(anonymous_client(cli)?.with_session(session))
}

async fn passthrough(cli: &Cli, method: Method, path: String, query: &[(&str, &str)]) -> Result<()> {
    let client = authenticated_client(cli)?;
    let raw = client.raw(method.clone(), &path, query).await?;
    println!("==> {} {}", method, raw.url);
    output::print_raw(&raw);
    Ok(())
}
