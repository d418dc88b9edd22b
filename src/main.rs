use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use vocab_trainer::config::Config;
use vocab_trainer::logging::init_tracing;
use vocab_trainer::{
    JsonFileStore, NewWord, NextOutcome, Question, StartOutcome, Trainer, TrainerError, Word,
};

#[derive(Parser)]
#[command(name = "vocab-trainer", about = "Spaced-repetition vocabulary trainer", version)]
struct Cli {
    /// Directory holding words.json (default: DATA_DIR or the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format for listings
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Add a word
    Add {
        text: String,
        translation: String,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        example: Option<String>,
        #[arg(long)]
        topic: Option<String>,
    },
    /// List every word
    List,
    /// List words due for review
    Due,
    /// Review all due words
    Quiz,
    /// Delete a word by id
    Delete { id: String },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Trainer(#[from] TrainerError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    let _log_guard = init_tracing(&config.log_level, config.log_dir.as_deref());

    let adapter = Arc::new(JsonFileStore::new(config.words_path()));
    let mut trainer = Trainer::open(adapter).await;

    match run(&mut trainer, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(trainer: &mut Trainer, cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Add {
            text,
            translation,
            language,
            example,
            topic,
        } => {
            let mut input = NewWord::new(text, translation);
            if let Some(language) = language {
                input = input.with_language(language);
            }
            if let Some(example) = example {
                input = input.with_example(example);
            }
            if let Some(topic) = topic {
                input = input.with_topic(topic);
            }
            let word = trainer.add_word(input).await?;
            println!("added {} ({})", word.text, word.id);
        }
        Command::List => print_words(trainer.store().words().iter(), &cli.format)?,
        Command::Due => print_words(trainer.due_words().into_iter(), &cli.format)?,
        Command::Quiz => quiz(trainer).await?,
        Command::Delete { id } => {
            let word = trainer.delete_word(&id).await?;
            println!("deleted {}", word.text);
        }
    }
    Ok(())
}

fn print_words<'a>(
    words: impl Iterator<Item = &'a Word>,
    format: &OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let words: Vec<&Word> = words.collect();
            println!("{}", serde_json::to_string_pretty(&words)?);
        }
        OutputFormat::Plain => {
            for word in words {
                let next = word
                    .next_review_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "now".to_string());
                println!(
                    "{}  {} -> {}  [{}] next: {}  ({}/{} correct)",
                    word.id,
                    word.text,
                    word.translation_text().unwrap_or("-"),
                    word.language,
                    next,
                    word.correct_count,
                    word.review_count,
                );
            }
        }
    }
    Ok(())
}

async fn quiz(trainer: &mut Trainer) -> Result<(), CliError> {
    let mut question = match trainer.start_session()? {
        StartOutcome::EmptyPool => {
            println!("Nothing is due for review.");
            return Ok(());
        }
        StartOutcome::Started(question) => question,
    };
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_question(trainer, &question);
        let Some(selected) = read_choice(&mut input, &question).await? else {
            trainer.reset_session();
            println!("Session abandoned.");
            return Ok(());
        };

        let outcome = trainer.answer(&selected).await?;
        if outcome.was_correct {
            println!("Correct. Next review in {} day(s).", outcome.word.interval_days.unwrap_or(1));
        } else {
            println!("Wrong, it is \"{}\".", outcome.correct_answer);
        }

        if let Some(summary) = outcome.summary {
            println!(
                "Done: {} of {} correct ({}%).",
                summary.correct, summary.total, summary.accuracy
            );
            return Ok(());
        }

        question = match trainer.next()? {
            NextOutcome::Question(question) => question,
            NextOutcome::Finished(_) => return Ok(()),
        };
    }
}

fn print_question(trainer: &Trainer, question: &Question) {
    let (index, total) = trainer.session().progress().unwrap_or((0, 1));
    println!();
    println!("[{}/{}] {}", index + 1, total, question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
}

/// Reads until the user picks an option by number or by its exact text.
/// `None` on end of input.
async fn read_choice(
    input: &mut Lines<BufReader<Stdin>>,
    question: &Question,
) -> Result<Option<String>, CliError> {
    loop {
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if let Some(option) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.options.get(i))
        {
            return Ok(Some(option.clone()));
        }
        if let Some(option) = question.options.iter().find(|o| o.as_str() == line) {
            return Ok(Some(option.clone()));
        }
        println!("Pick 1-{}.", question.options.len());
    }
}
