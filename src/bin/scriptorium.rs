//! scriptorium — content generation CLI
//!
//! Runs the generator in-process with configuration from
//! `~/.scriptorium/config.toml` and prints results as JSON.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scriptorium::config::{Config, Secrets};
use scriptorium::types::DEFAULT_MODEL;
use scriptorium::{ContentType, GenerationRequest, ScriptoriumBuilder};

/// Scriptorium CLI
#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(version = scriptorium::PKG_VERSION)]
#[command(about = "AI content generation")]
struct Args {
    /// Config file (default: ~/.scriptorium/config.toml)
    #[arg(short, long, env = "SCRIPTORIUM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate content for a single prompt
    Generate {
        /// Prompt text (or omit to read from stdin)
        prompt: Option<String>,
        /// Content type (see `types`)
        #[arg(short = 't', long, default_value = "text")]
        content_type: String,
        /// Model to use
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        style: Option<String>,
        /// Extra parameter as key=value (repeatable), e.g. platform=linkedin
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Generate content for a JSON array of requests
    Batch {
        /// File with a JSON array of requests (or omit to read from stdin)
        file: Option<PathBuf>,
    },

    /// Rewrite a prompt for a content type
    Optimize {
        /// Prompt text (or omit to read from stdin)
        prompt: Option<String>,
        #[arg(short = 't', long, default_value = "text")]
        content_type: String,
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,
    },

    /// List supported content types
    Types,

    /// Show which local pipelines are available
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    // No generator needed to list types.
    if matches!(args.command, Command::Types) {
        return print_types();
    }

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let generator = ScriptoriumBuilder::from_config(&config, &secrets)?
        .init()
        .await?;

    match args.command {
        Command::Generate {
            prompt,
            content_type,
            model,
            max_tokens,
            temperature,
            language,
            style,
            params,
        } => {
            let mut request =
                GenerationRequest::new(resolve_text(prompt, "generate")?, content_type).model(model);
            if let Some(n) = max_tokens {
                request = request.max_tokens(n);
            }
            if let Some(t) = temperature {
                request = request.temperature(t);
            }
            if let Some(l) = language {
                request = request.language(l);
            }
            if let Some(s) = style {
                request = request.style(s);
            }
            for (key, value) in params {
                request = request.param(key, value);
            }

            let result = generator.generate(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Batch { file } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => resolve_text(None, "batch")?,
            };
            let requests: Vec<GenerationRequest> = serde_json::from_str(&input)?;
            let items = generator.generate_batch(&requests).await;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }

        Command::Optimize {
            prompt,
            content_type,
            model,
        } => {
            let prompt = resolve_text(prompt, "optimize")?;
            let optimized = generator
                .optimize_prompt(&prompt, &content_type, &model)
                .await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "original": prompt,
                    "optimized": optimized,
                }))?
            );
        }

        Command::Status => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "version": scriptorium::version_string(),
                    "local_models": generator.local_status(),
                }))?
            );
        }

        Command::Types => print_types()?,
    }

    Ok(())
}

fn print_types() -> Result<(), Box<dyn std::error::Error>> {
    let types: Vec<&str> = ContentType::all().iter().map(|ct| ct.as_str()).collect();
    println!("{}", serde_json::to_string_pretty(&types)?);
    Ok(())
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

/// Resolve text input from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_is_pipe = !io::stdin().is_terminal();
    let stdin_text = if stdin_is_pipe {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    } else {
        None
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no input provided (pass text as argument or via stdin)").into())
        }
    }
}
