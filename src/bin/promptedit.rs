//! CLI for promptedit - edit images with natural-language instructions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use promptedit::session::AttemptId;
use promptedit::{
    EditorSession, FileInput, FileSource, GeminiClient, GeminiModel, GenerationClient,
    GenerationResult, HttpTransport, Phase, UploadOutcome, DEFAULT_DOWNLOAD_FILENAME,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "promptedit")]
#[command(about = "Edit images with natural-language instructions via Google Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gemini model to use
    #[arg(short, long, value_enum, global = true, default_value = "nano-banana")]
    model: ModelArg,

    /// API key (defaults to GEMINI_API_KEY, then GOOGLE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit one image and save the result
    Edit(EditArgs),

    /// Start an interactive editing session
    Session,

    /// Check that an API key is configured
    Check(CheckArgs),
}

#[derive(Args)]
struct EditArgs {
    /// Image to edit
    input: PathBuf,

    /// How the image should change
    instruction: String,

    /// Output file path
    #[arg(short, long, default_value = DEFAULT_DOWNLOAD_FILENAME)]
    output: PathBuf,
}

#[derive(Args)]
struct CheckArgs {
    /// Also contact the API to verify the key and model
    #[arg(long)]
    online: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::NanoBanana => GeminiModel::NanoBanana,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut builder = GeminiClient::builder().model(cli.model.into());
    if let Some(key) = cli.api_key {
        builder = builder.api_key(key);
    }
    let client = builder.build();

    match cli.command {
        Commands::Edit(args) => edit_image(&client, args, cli.json).await?,
        Commands::Session => {
            client.check_configuration()?;
            run_session(Arc::new(client)).await?;
        }
        Commands::Check(args) => check(&client, args, cli.json).await?,
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn edit_image(
    client: &GeminiClient<HttpTransport>,
    args: EditArgs,
    json_output: bool,
) -> anyhow::Result<()> {
    client.check_configuration()?;
    if args.instruction.trim().is_empty() {
        anyhow::bail!("instruction must not be empty");
    }

    let mut session = EditorSession::new();
    let file = FileInput::from_path(&args.input)?;
    if session.upload(FileSource::Picked(file)) != UploadOutcome::Accepted {
        anyhow::bail!(
            "{}: {}",
            args.input.display(),
            session.message().unwrap_or("not an image")
        );
    }
    session.set_prompt(&args.instruction);
    session.generate(client).await;

    let Phase::Done(image) = session.phase() else {
        anyhow::bail!(session
            .message()
            .unwrap_or(promptedit::GENERIC_FAILURE_MESSAGE)
            .to_string());
    };
    let size = session.download(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "size_bytes": size,
            "media_type": image.media_type,
            "model": image.model,
            "duration_ms": image.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Edited image: {} ({} bytes) via {}",
            args.output.display(),
            size,
            client.model()
        );
        if let Some(duration) = image.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn check(
    client: &GeminiClient<HttpTransport>,
    args: CheckArgs,
    json_output: bool,
) -> anyhow::Result<()> {
    client.check_configuration()?;
    if args.online {
        client.health_check().await?;
    }

    if json_output {
        let result = serde_json::json!({
            "configured": true,
            "online_checked": args.online,
            "model": client.model(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if args.online {
        println!("API key accepted for {}", client.model());
    } else {
        println!("API key configured for {}", client.model());
    }
    Ok(())
}

const SESSION_HELP: &str = "\
commands:
  upload <path>        load an image to edit
  drop <path>...       drop files; the first one is used
  prompt <text>        set the edit instruction
  generate             send the image and instruction to Gemini
  download [path]      save the result (default: edited-image.png)
  reset                clear image, prompt and result
  status               show the session state
  help                 show this help
  quit                 leave the session";

type InFlight = Option<(AttemptId, JoinHandle<GenerationResult>)>;

async fn run_session(client: Arc<GeminiClient<HttpTransport>>) -> anyhow::Result<()> {
    let mut session = EditorSession::new();
    let mut in_flight: InFlight = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("promptedit session using {} (type `help` for commands)", client.model());

    loop {
        tokio::select! {
            (attempt, result) = wait_for(&mut in_flight) => {
                in_flight = None;
                session.complete_generate(attempt, result);
                print_status(&session);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
                let rest = rest.trim();
                match command {
                    "upload" => upload(&mut session, vec![rest], false),
                    "drop" => upload(&mut session, rest.split_whitespace().collect(), true),
                    "prompt" => {
                        session.set_prompt(rest);
                        print_status(&session);
                    }
                    "generate" => match session.begin_generate() {
                        Some(pending) => {
                            let client = Arc::clone(&client);
                            let handle = tokio::spawn(async move {
                                client.generate(&pending.request).await
                            });
                            in_flight = Some((pending.attempt, handle));
                            println!("Generating...");
                        }
                        None => println!("{}", generate_disabled_reason(&session)),
                    },
                    "download" => {
                        let path = if rest.is_empty() { DEFAULT_DOWNLOAD_FILENAME } else { rest };
                        match session.download(path) {
                            Ok(size) => println!("Saved {} ({} bytes)", path, size),
                            Err(e) => println!("{}", e),
                        }
                    }
                    "reset" => {
                        session.reset();
                        print_status(&session);
                    }
                    "status" => print_status(&session),
                    "help" => println!("{}", SESSION_HELP),
                    "quit" | "exit" => break,
                    other => println!("unknown command `{}` (type `help`)", other),
                }
            }
        }
    }

    Ok(())
}

/// Resolves when the in-flight attempt finishes; pending forever when idle.
async fn wait_for(in_flight: &mut InFlight) -> (AttemptId, GenerationResult) {
    match in_flight {
        Some((attempt, handle)) => {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(promptedit::EditorError::generation_failed(e.to_string())),
            };
            (*attempt, result)
        }
        None => std::future::pending().await,
    }
}

fn upload(session: &mut EditorSession, paths: Vec<&str>, dropped: bool) {
    // A drop only uses its first file, so later paths are never read.
    let first = paths.into_iter().find(|p| !p.is_empty());
    let source = match (first, dropped) {
        (_, true) => FileSource::from_dropped_paths(first),
        (Some(path), false) => FileInput::from_path(path).map(FileSource::Picked),
        (None, false) => Ok(FileSource::Dropped(Vec::new())),
    };

    let source = match source {
        Ok(source) => source,
        Err(e) => {
            println!("{}: {}", first.unwrap_or_default(), e);
            return;
        }
    };

    match session.upload(source) {
        UploadOutcome::Empty => println!("no file given"),
        UploadOutcome::Accepted | UploadOutcome::Rejected => print_status(session),
    }
}

fn generate_disabled_reason(session: &EditorSession) -> &'static str {
    if session.is_loading() {
        "A generation is already in progress."
    } else if session.image().is_none() {
        "Upload an image first."
    } else {
        "Set a prompt first."
    }
}

fn print_status(session: &EditorSession) {
    let image = session
        .image()
        .map(|i| format!("{} ({} bytes encoded)", i.media_type, i.encoded_len()))
        .unwrap_or_else(|| "none".to_string());
    println!("[{}] image: {}", session.phase().name(), image);
    if !session.prompt().is_empty() {
        println!("  prompt: {}", session.prompt());
    }
    if let Some(result) = session.result() {
        println!(
            "  result: {} ({} chars encoded), `download` to save",
            result.media_type,
            result.encoded_data.len()
        );
    }
    if let Some(message) = session.message() {
        println!("  ! {}", message);
    }
}
