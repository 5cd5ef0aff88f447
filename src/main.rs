//! Sorting Hat CLI
//!
//! Usage:
//!   sortinghat                              # Standard quiz with the built-in bank
//!   sortinghat --mode quick                 # Shorter quiz, one tie-breaker round
//!   sortinghat --bank ./my_bank             # Load bank files from a directory
//!   sortinghat --bank ./my_bank --validate  # Check a bank and exit
//!   sortinghat --json                       # One JSON screen per line on stdout

use clap::Parser;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use sortinghat::core::{ItemBank, QuizDriver, QuizMode, QuizSession, ScoringConfig, TokioScheduler};
use sortinghat::types::{CategoryPair, ChoiceOption, QuizError, Screen, SortingResult, TieBreakerState};
use sortinghat::{INTERLUDE_DELAY_MS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "sortinghat",
    version = VERSION,
    about = "Sorting Hat - adaptive house-sorting quiz",
    long_about = "Sorts you into a house from 1-5 Likert answers.\n\n\
                  Each answer is mapped to a latent trait level and weighted by how\n\
                  long you took to answer. If the houses end up close, the hat asks\n\
                  pairwise forced-choice questions to break the tie.\n\n\
                  Modes:\n  \
                  quick     - short form, 1 tie-breaker round\n  \
                  standard  - standard form, 2 tie-breaker rounds\n  \
                  thorough  - every statement, 3 tie-breaker rounds"
)]
struct Args {
    /// Bank directory with categories.json, likert_items.json and forced_choice_items.json
    #[arg(short, long)]
    bank: Option<PathBuf>,

    /// Quiz length
    #[arg(short, long, value_enum, default_value_t = QuizMode::Standard)]
    mode: QuizMode,

    /// Seed for item shuffling (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Interlude pause before each tie-breaker round (ms)
    #[arg(long, default_value_t = INTERLUDE_DELAY_MS)]
    interlude_ms: u64,

    /// Output screens as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show tie-breaker state and trait scores; debug logging
    #[arg(long)]
    verbose: bool,

    /// Load and validate the bank, print a summary and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    let bank = match load_bank(&args) {
        Ok(bank) => bank,
        Err(e) => {
            eprintln!("Bank error [{}]: {}", e.code(), e);
            std::process::exit(2);
        }
    };

    if args.validate {
        print_bank_summary(&bank, &args);
        return;
    }

    if let Err(e) = run_quiz(bank, &args).await {
        eprintln!("Quiz error [{}]: {}", e.code(), e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for --json
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "sortinghat=debug" } else { "sortinghat=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_bank(args: &Args) -> Result<ItemBank, QuizError> {
    match &args.bank {
        Some(dir) => ItemBank::load_dir(dir),
        None => ItemBank::builtin(),
    }
}

/// Run one quiz to completion
async fn run_quiz(bank: ItemBank, args: &Args) -> Result<(), QuizError> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let session = QuizSession::new(
        Arc::new(bank),
        args.mode,
        ScoringConfig::default(),
        StdRng::seed_from_u64(seed),
    )?;
    let (driver, mut screens) = QuizDriver::new(
        session,
        Arc::new(TokioScheduler),
        Duration::from_millis(args.interlude_ms),
    );

    if !args.json {
        print_header(args.mode, args.no_color);
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    while let Some(update) = screens.recv().await {
        let screen = update?;
        if args.json {
            print_json(&screen);
        }

        match screen {
            Screen::Likert { text, number, total, .. } => {
                if !args.json {
                    println!();
                    println!("{} {}", format!("[{}/{}]", number, total).dimmed(), text.bold());
                    println!("{}", "  1 = strongly disagree  3 = neutral  5 = strongly agree".dimmed());
                }
                let started = Instant::now();
                let Some(response) = read_likert(&mut input, args.json).await else {
                    quit(args.json);
                    return Ok(());
                };
                driver.submit_likert(response, started.elapsed().as_secs_f64())?;
            }

            Screen::Interlude { message, .. } => {
                if !args.json {
                    println!();
                    println!("{}", message.magenta().italic());
                }
            }

            Screen::ForcedChoice { stem, left, right, number, total, .. } => {
                if !args.json {
                    if args.verbose {
                        print_tie_breaker_state(&driver, args.no_color);
                    }
                    println!();
                    println!("{} {}", format!("[{}/{}]", number, total).dimmed(), stem.bold());
                    print_option(&left);
                    print_option(&right);
                }
                let started = Instant::now();
                loop {
                    let Some(key) = read_choice(&mut input, args.json).await else {
                        quit(args.json);
                        return Ok(());
                    };
                    match driver.submit_forced_choice(&key, started.elapsed().as_secs_f64()) {
                        Ok(()) => break,
                        Err(QuizError::UnknownOptionKey { .. }) => {
                            if !args.json {
                                println!("{}", format!("  Please answer {} or {}", left.key, right.key).yellow());
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            Screen::Results(result) => {
                if !args.json {
                    print_result(&result, args);
                }
                break;
            }
        }
    }
    Ok(())
}

fn quit(json: bool) {
    if !json {
        println!("\nQuiz abandoned.");
    }
}

// =============================================================================
// INPUT
// =============================================================================

async fn next_line(input: &mut Lines<BufReader<Stdin>>, prompt: bool) -> Option<String> {
    if prompt {
        print!("> ");
        std::io::stdout().flush().ok();
    }
    match input.next_line().await {
        Ok(Some(line)) => {
            let line = line.trim().to_string();
            if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                None
            } else {
                Some(line)
            }
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "stdin read failed");
            None
        }
    }
}

/// A response in [1, 5]; fractions allowed
async fn read_likert(input: &mut Lines<BufReader<Stdin>>, json: bool) -> Option<f64> {
    loop {
        let line = next_line(input, !json).await?;
        match line.parse::<f64>() {
            Ok(v) if (1.0..=5.0).contains(&v) => return Some(v),
            _ => {
                if !json {
                    println!("{}", "  Please enter a number from 1 to 5".yellow());
                }
            }
        }
    }
}

async fn read_choice(input: &mut Lines<BufReader<Stdin>>, json: bool) -> Option<String> {
    loop {
        let line = next_line(input, !json).await?;
        if !line.is_empty() {
            return Some(line);
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_header(mode: QuizMode, no_color: bool) {
    if no_color {
        println!("========================================");
        println!("  Sorting Hat v{} - {} quiz", VERSION, mode);
        println!("========================================");
    } else {
        println!("\x1b[1m╔════════════════════════════════════════╗\x1b[0m");
        println!("\x1b[1m║  Sorting Hat v{} - {:<9} quiz     ║\x1b[0m", VERSION, mode.label());
        println!("\x1b[1m╚════════════════════════════════════════╝\x1b[0m");
    }
    println!("Answer each statement from 1 to 5. Type 'quit' to stop.");
}

fn print_option(option: &ChoiceOption) {
    println!("  {}  {}", format!("{})", option.key).cyan().bold(), option.text);
}

fn print_json(screen: &Screen) {
    match serde_json::to_string(screen) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!(error = %e, "screen serialization failed"),
    }
}

fn print_tie_breaker_state(driver: &QuizDriver, no_color: bool) {
    let snapshot = driver.with_session(|s| {
        s.tie_breaker()
            .map(|tb| (tb.state().clone(), tb.tie_group().to_vec(), tb.rounds_remaining()))
    });
    let Some((state, group, rounds)) = snapshot else {
        return;
    };
    let (color, reset) = if no_color {
        ("", "")
    } else {
        (state.color_code(), TieBreakerState::color_reset())
    };
    println!(
        "{}  [{}] tie group: {} | rounds left: {}{}",
        color,
        state,
        group.join(", "),
        rounds,
        reset
    );
}

fn print_result(result: &SortingResult, args: &Args) {
    println!();
    if args.no_color {
        println!("{}", result.to_parseable_string());
    } else {
        print!("{}", result.to_terminal_string());
    }
    if args.verbose {
        println!();
        println!("Trait profile:");
        for t in &result.traits {
            println!("  {:<12} {:>8.3}", t.trait_name, t.score);
        }
    }
}

fn print_bank_summary(bank: &ItemBank, args: &Args) {
    let pairs: Vec<(String, usize)> = CategoryPair::all_pairs(bank.categories())
        .into_iter()
        .map(|pair| {
            let n = bank
                .forced_choice_items()
                .iter()
                .filter(|i| i.category_pair == pair)
                .count();
            (pair.to_string(), n)
        })
        .collect();

    if args.json {
        let summary = serde_json::json!({
            "valid": true,
            "categories": bank.categories(),
            "traits": bank.traits(),
            "likert": {
                "quick": bank.likert_count(QuizMode::Quick),
                "standard": bank.likert_count(QuizMode::Standard),
                "thorough": bank.likert_count(QuizMode::Thorough),
            },
            "forced_choice": pairs.iter().map(|(p, n)| serde_json::json!({ "pair": p, "items": n })).collect::<Vec<_>>(),
        });
        println!("{}", summary);
        return;
    }

    println!("{}", "Bank OK".green().bold());
    println!("  categories: {}", bank.categories().join(", "));
    println!("  traits:     {}", bank.traits().join(", "));
    println!(
        "  likert:     quick {} | standard {} | thorough {}",
        bank.likert_count(QuizMode::Quick),
        bank.likert_count(QuizMode::Standard),
        bank.likert_count(QuizMode::Thorough)
    );
    println!("  forced choice:");
    for (pair, n) in pairs {
        let line = format!("    {:<28} {}", pair, n);
        if n == 0 {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
    }
}
