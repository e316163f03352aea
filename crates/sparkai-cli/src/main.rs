//! sparkai: command-line chat against the Spark API.
//!
//! With a prompt argument, sends one request and prints the reply. Without
//! one, reads prompts line by line from stdin, keeping the conversation.

mod repl;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sparkai::accumulator::CallbackError;
use sparkai::{
    ChatClient, ChatResponse, Chunk, Conversation, HistoryStore, SparkClient, SparkConfig,
    SparkError,
};

#[derive(Parser)]
#[command(name = "sparkai", version, about = "Chat with the iFlytek Spark API")]
struct Args {
    /// TOML config file, overlaid on the SPARKAI_* environment variables.
    /// Defaults to sparkai/config.toml in the user config directory if present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model domain, e.g. generalv3.5.
    #[arg(short, long)]
    domain: Option<String>,

    #[arg(long)]
    temperature: Option<f64>,

    #[arg(long)]
    top_k: Option<u32>,

    #[arg(long)]
    max_tokens: Option<u32>,

    /// System prompt sent before the conversation.
    #[arg(short, long)]
    system: Option<String>,

    /// Keep history in a JSON-lines file. Without a value, uses
    /// sparkai/history.jsonl in the user data directory.
    #[arg(long, value_name = "FILE")]
    history: Option<Option<PathBuf>>,

    /// Print the reply only once it is complete.
    #[arg(long)]
    no_stream: bool,

    /// Prompt to send. Starts an interactive session when omitted.
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sparkai=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), SparkError> {
    let client = SparkClient::new(load_config(&args)?)?;
    let mut conversation = build_conversation(&args)?;

    match args.prompt {
        Some(ref prompt) => ask(&client, &mut conversation, prompt, !args.no_stream).await,
        None => repl::run(&client, &mut conversation, !args.no_stream).await,
    }
}

fn load_config(args: &Args) -> Result<SparkConfig, SparkError> {
    let default_path = dirs::config_dir()
        .map(|d| d.join("sparkai").join("config.toml"))
        .filter(|p| p.is_file());

    let mut config = match args.config.as_ref().or(default_path.as_ref()) {
        Some(path) => SparkConfig::load_from_path(path)?,
        None => SparkConfig::from_env()?,
    };

    if let Some(ref domain) = args.domain {
        config = config.with_domain(domain.clone());
    }
    if let Some(temperature) = args.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(top_k) = args.top_k {
        config = config.with_top_k(top_k);
    }
    if let Some(max_tokens) = args.max_tokens {
        config = config.with_max_tokens(max_tokens);
    }
    Ok(config)
}

fn build_conversation(args: &Args) -> Result<Conversation, SparkError> {
    let mut conversation = Conversation::new();
    if let Some(ref system) = args.system {
        conversation = conversation.with_system_prompt(system.clone());
    }

    let history_path = match &args.history {
        None => None,
        Some(Some(path)) => Some(path.clone()),
        Some(None) => Some(
            dirs::data_dir()
                .ok_or_else(|| SparkError::Config("no user data directory for history".into()))?
                .join("sparkai")
                .join("history.jsonl"),
        ),
    };
    if let Some(path) = history_path {
        tracing::debug!(path = %path.display(), "Using history file");
        conversation = conversation.with_history(HistoryStore::open(path)?)?;
    }
    Ok(conversation)
}

/// Send one prompt and print the reply to stdout.
pub(crate) async fn ask(
    client: &dyn ChatClient,
    conversation: &mut Conversation,
    prompt: &str,
    stream: bool,
) -> Result<(), SparkError> {
    let response = if stream {
        let sink = |chunk: &Chunk| -> Result<(), CallbackError> {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(chunk.delta().as_bytes())?;
            stdout.flush()?;
            Ok(())
        };
        conversation.ask_streaming(client, prompt, &sink).await?
    } else {
        conversation.ask(client, prompt).await?
    };

    match response {
        // Streamed text is already on screen.
        ChatResponse::Message { content, .. } => {
            if stream {
                println!();
            } else {
                println!("{content}");
            }
        }
        ChatResponse::FunctionCall { call, .. } => {
            if stream {
                println!();
            }
            println!("function_call: {}({})", call.name, call.arguments);
        }
    }
    Ok(())
}
