use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mailroute::config::Config;
use mailroute::{EmailRequest, LogSink, Recipients, SendError};

/// mailroute - route email through a chain of delivery providers
///
/// Providers and the retry policy come from a JSON config file.
///
/// Examples:
///   mailroute --config providers.json providers
///   mailroute --config providers.json send --to user@example.com --subject Hi --text Hello
#[derive(Parser, Debug)]
#[command(author, version = env!("MAILROUTE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider configuration file (also via MAILROUTE_CONFIG)
    #[arg(
        long = "config",
        short = 'c',
        env = "MAILROUTE_CONFIG",
        value_name = "PATH",
        global = true
    )]
    pub config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send one email
    Send(SendArgs),

    /// List configured providers in fallback order
    Providers,
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Recipient address (repeatable)
    #[arg(long, required = true, value_name = "ADDRESS")]
    pub to: Vec<String>,

    #[arg(long)]
    pub subject: String,

    /// HTML body
    #[arg(long)]
    pub html: Option<String>,

    /// Plain text body
    #[arg(long)]
    pub text: Option<String>,

    /// Sender override
    #[arg(long, value_name = "ADDRESS")]
    pub from: Option<String>,

    #[arg(long, value_name = "ADDRESS")]
    pub cc: Vec<String>,

    #[arg(long, value_name = "ADDRESS")]
    pub bcc: Vec<String>,

    /// Provider name, or "auto" to fall back across all providers
    #[arg(long, default_value = "auto")]
    pub provider: String,
}

impl SendArgs {
    fn into_request(self) -> EmailRequest {
        let mut request = EmailRequest::new(recipients(self.to), self.subject).provider(self.provider);
        request.html = self.html;
        request.text = self.text;
        request.from = self.from;
        if !self.cc.is_empty() {
            request.cc = Some(recipients(self.cc));
        }
        if !self.bcc.is_empty() {
            request.bcc = Some(recipients(self.bcc));
        }
        request
    }
}

fn recipients(mut addresses: Vec<String>) -> Recipients {
    if addresses.len() == 1 {
        Recipients::One(addresses.remove(0))
    } else {
        Recipients::Many(addresses)
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn report(err: &SendError) {
    eprintln!("error: {} [{}]", err, err.kind().code());
    for inner in err.errors() {
        eprintln!(
            "  {}: {} [{}]",
            inner.provider_name().unwrap_or("-"),
            inner,
            inner.kind().code()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let runtime = config.build_runtime(Arc::new(LogSink))?;

    match cli.command {
        Commands::Providers => {
            for name in runtime.list_providers() {
                println!("{}", name);
            }
        }
        Commands::Send(args) => {
            let request = args.into_request();
            match runtime.send(&request).await {
                Ok(response) => {
                    let json = serde_json::to_string_pretty(&response)
                        .context("Failed to serialize response")?;
                    println!("{}", json);
                }
                Err(err) => {
                    report(&err);
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
