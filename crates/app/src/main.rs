use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::HistoryLedger;
use services::{Clock, QuizFlowService, SessionPhase, SessionReport};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run   [--bank <csv>] [--quotas <toml>]");
    eprintln!("  cargo run -p app -- stats [--bank <csv>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bank questions.csv");
    eprintln!("  quotas: the built-in exam table (26 questions across 5 categories)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BANK, QUIZ_QUOTAS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

struct Args {
    bank: PathBuf,
    quotas: Option<PathBuf>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut bank = std::env::var("QUIZ_BANK")
            .ok()
            .map_or_else(|| PathBuf::from("questions.csv"), PathBuf::from);
        let mut quotas = std::env::var("QUIZ_QUOTAS").ok().map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    bank = PathBuf::from(require_value(args, "--bank")?);
                }
                "--quotas" => {
                    quotas = Some(PathBuf::from(require_value(args, "--quotas")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { bank, quotas })
    }
}

/// Prompt for an option number until one parses, `None` on closed stdin.
fn read_choice(input: &mut impl BufRead, max: usize) -> io::Result<Option<usize>> {
    loop {
        print!("Select your answer (1-{max}): ");
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=max).contains(&n) => return Ok(Some(n - 1)),
            _ => println!("Please enter a number between 1 and {max}."),
        }
    }
}

fn confirm(input: &mut impl BufRead, prompt: &str) -> io::Result<bool> {
    loop {
        print!("{prompt} (y/n): ");
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer y or n."),
        }
    }
}

fn print_review(report: &SessionReport) {
    println!();
    println!("Review:");
    for line in &report.lines {
        println!("  Q: {}", line.question);
        let chosen = line.chosen_option.as_deref().unwrap_or("not answered");
        let correct = line.correct_option.as_deref().unwrap_or("unknown");
        println!("     your answer: {chosen} | correct: {correct}");
        if line.integrity_flagged {
            println!("     note: this question has no usable answer key");
        }
        println!(
            "     history: asked {}, correct {}, wrong {}",
            line.history.times_asked(),
            line.history.correct_answers(),
            line.history.wrong_answers()
        );
    }
}

async fn run_quiz(flow: &QuizFlowService, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let quotas = match &args.quotas {
        Some(path) => config::load_quotas(path)?,
        None => config::default_quotas()?,
    };

    // The ledger outlives individual sessions: restarts reuse it.
    let mut ledger: HistoryLedger = flow.load_history().await?;
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        let mut session = flow.start_session(&quotas).await?;

        while session.phase() == SessionPhase::Presenting {
            let prompt = session.present_current()?;
            println!();
            println!("{}. {}", prompt.index + 1, prompt.question);
            for (i, option) in prompt.options.iter().enumerate() {
                println!("  {}) {}", i + 1, option);
            }

            let Some(choice) = read_choice(&mut input, prompt.options.len())? else {
                println!();
                println!("Input closed, leaving the quiz.");
                return Ok(());
            };
            let selected = prompt.options[choice].clone();
            let outcome = flow
                .submit_answer(&mut session, &mut ledger, prompt.index, &selected)
                .await?;

            if outcome.answer.was_correct {
                println!("✅ Correct!");
            } else {
                match &outcome.answer.correct_option {
                    Some(text) => println!("❌ Incorrect! Correct answer was: {text}"),
                    None => println!("❌ Incorrect! This question has no usable answer key."),
                }
            }

            if let Some(err) = outcome.persist_error {
                eprintln!("warning: history could not be saved: {err}");
                while confirm(&mut input, "Retry saving history?")? {
                    match flow.persist_history(&ledger).await {
                        Ok(()) => {
                            println!("History saved.");
                            break;
                        }
                        Err(retry_err) => eprintln!("warning: retry failed: {retry_err}"),
                    }
                }
            }
        }

        let report = flow.report(&session, &ledger)?;
        println!();
        println!("Quiz Completed! Your Score: {}", report.summary);
        print_review(&report);

        println!();
        if !confirm(&mut input, "Restart Quiz?")? {
            return Ok(());
        }
    }
}

async fn print_stats(flow: &QuizFlowService) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = flow.load_history().await?;

    println!("{:<60} {:>11} {:>8} {:>6}", "Question", "Times Asked", "Correct", "Wrong");
    let mut asked_total = 0_u64;
    for (question, record) in ledger.iter() {
        println!(
            "{question:<60} {:>11} {:>8} {:>6}",
            record.times_asked(),
            record.correct_answers(),
            record.wrong_answers()
        );
        asked_total += u64::from(record.times_asked());
    }
    println!();
    println!("{} questions tracked, {asked_total} attempts recorded.", ledger.len());
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: run the quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let args = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::csv(&args.bank);
    let clock = Clock::default_clock();
    let flow = QuizFlowService::new(clock, Arc::clone(&storage.bank), Arc::clone(&storage.history));

    match cmd {
        Command::Run => run_quiz(&flow, &args).await,
        Command::Stats => print_stats(&flow).await,
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
