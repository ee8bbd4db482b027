mod generate;
mod note;

use anyhow::Result;
use cardsmith_common::{logger, CardsmithError, FlashcardType, Overrides, Provider, Settings};
use cardsmith_llm::{models_for, FlashcardGenerator, ReqwestTransport};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::generate::{generate_into_note, GenerateJob};
use crate::note::{LineRange, NoteDocument};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "cardsmith")]
#[command(about = "Cardsmith - generate flashcards from markdown notes with a language model", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate flashcards and append them to a note
    Generate(GenerateArgs),

    /// List known models
    Models {
        /// Only list models of this provider
        #[arg(long)]
        provider: Option<Provider>,
    },

    /// List configured presets
    Presets,

    /// List flashcard types
    Types,
}

#[derive(Args)]
struct GenerateArgs {
    /// Markdown note to read and append to
    note: PathBuf,

    /// Provider (openai, claude)
    #[arg(long)]
    provider: Option<Provider>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Flashcard type (label or key, e.g. "cloze" or "Basic (Cantonese)")
    #[arg(long = "type")]
    flashcard_type: Option<FlashcardType>,

    /// Number of flashcards to generate
    #[arg(long, allow_negative_numbers = true)]
    count: Option<i64>,

    /// Additional instructions for the model
    #[arg(long)]
    extra: Option<String>,

    /// Maximum output tokens
    #[arg(long, allow_negative_numbers = true)]
    max_tokens: Option<i64>,

    /// Wait for the full response instead of streaming
    #[arg(long)]
    no_stream: bool,

    /// Tag inserted before the generated cards
    #[arg(long)]
    tag: Option<String>,

    /// Run a preset (id or name) instead of a single generation
    #[arg(long)]
    preset: Option<String>,

    /// Only send these lines of the note (START:END, 1-based)
    #[arg(long)]
    lines: Option<LineRange>,

    /// Print the cards without modifying the note
    #[arg(long)]
    dry_run: bool,
}

impl GenerateArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider,
            model: self.model.clone(),
            flashcard_type: self.flashcard_type,
            flashcards_count: self.count,
            additional_prompt: self.extra.clone(),
            max_tokens: self.max_tokens,
            streaming: self.no_stream.then_some(false),
            tag: self.tag.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error generating flashcards: {:#}", e);
        let code = e
            .downcast_ref::<CardsmithError>()
            .map(CardsmithError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    load_dotenv_from_project_root();

    let settings = Settings::load(cli.config.as_deref())?;

    let level = logger::parse_log_level(cli.log_level.as_deref().unwrap_or(&settings.log_level));
    let level = level.to_string().to_lowercase();
    match &settings.log_dir {
        Some(dir) => logger::setup_logging(dir, &level)?,
        None => logger::setup_console_logging(&level)?,
    }

    match cli.command {
        Commands::Generate(args) => run_generate(&settings, args).await?,
        Commands::Models { provider } => {
            let providers = match provider {
                Some(p) => vec![p],
                None => vec![Provider::OpenAi, Provider::Claude],
            };
            for provider in providers {
                println!("{}:", provider.display_name());
                for model in models_for(provider) {
                    println!("  {}", model);
                }
            }
        }
        Commands::Presets => {
            if settings.presets.is_empty() {
                println!("No presets configured");
            }
            for preset in &settings.presets {
                println!("{} ({})", preset.name, preset.id);
                for item in &preset.items {
                    println!("  - {}", item.label());
                }
            }
        }
        Commands::Types => {
            for flashcard_type in FlashcardType::ALL {
                println!("{:<20} {}", flashcard_type.key(), flashcard_type.label());
            }
        }
    }

    Ok(())
}

async fn run_generate(settings: &Settings, args: GenerateArgs) -> Result<()> {
    let settings = settings.with_overrides(&args.overrides());
    settings.validate()?;

    let mut note = NoteDocument::open(&args.note).await?;
    let transport = Arc::new(ReqwestTransport::new()?);
    let generator = FlashcardGenerator::new(transport, &settings);
    let job = GenerateJob {
        preset: args.preset.clone(),
        lines: args.lines,
        echo: true,
    };

    tracing::info!("Generating flashcards for {}", args.note.display());
    let result = generate_into_note(&generator, &settings, &mut note, &job).await;
    println!();

    // Partial output is kept on failure
    if !args.dry_run {
        note.save().await?;
    }

    result?;
    if args.dry_run {
        tracing::info!("Dry run: {} left unchanged", args.note.display());
    } else {
        tracing::info!("Flashcards successfully generated into {}", args.note.display());
    }

    Ok(())
}
