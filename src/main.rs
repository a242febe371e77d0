mod config;
mod generator;
mod github;
mod workflow;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::generator::ClaudeClient;
use crate::github::GitHubClient;
use crate::workflow::Outcome;

/// prd — CLI tool that takes a GitHub pull request or compare URL,
/// generates a title and description from the diff, and writes the
/// description back to the pull request.
#[derive(Parser, Debug)]
#[command(name = "prd", version, about)]
struct Cli {
    /// GitHub pull request or compare URL
    /// (e.g., https://github.com/org/repo/pull/42
    /// or https://github.com/org/repo/compare/main...feature)
    url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let url = cli
        .url
        .as_deref()
        .ok_or("a URL is required. Usage: prd <url>")?;

    let _main_span = info_span!("prd", url = %url).entered();

    info!("loading configuration");
    let config = Config::load()?;
    // Pre-flight: both credentials must resolve before any network call.
    let github_token = config.github_token()?;
    let anthropic_key = config.anthropic_api_key()?;

    info!("parsing target URL");
    let target = github::parse_target_url(url)?;
    debug!(?target, "parsed target");

    let host = GitHubClient::new(github_token);
    let model = ClaudeClient::new(anthropic_key, config.model());

    let outcome = workflow::run(&host, &model, target).await?;
    render_outcome(&outcome);
    info!("done");

    Ok(())
}

fn render_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Updated { pr_url, content } => {
            println!();
            println!("{} {}", "title:".green().bold(), content.title);
            println!();
            println!("{}", content.description);
            println!();
            println!(
                "{} updated pull request description: {pr_url}",
                "✓".green().bold()
            );
        }
        Outcome::Preview {
            base,
            head,
            content,
        } => {
            println!();
            println!("{} {}", "title:".green().bold(), content.title);
            println!();
            println!("{}", content.description);
            println!();
            println!(
                "{} {base}...{head} has no pull request; nothing was written back",
                "✓".green().bold()
            );
        }
        Outcome::NoChanges { base, head } => {
            println!(
                "{} no changes between {base} and {head}",
                "✓".green().bold()
            );
        }
    }
}
