//! Terminal session driver.
//! Manages items in the configured store and runs active-recall sessions.

use anyhow::{Context, bail};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use timequest::database::db::SqliteStore;
use timequest::export::json::{export_json_to_path, import_json};
use timequest::{
    Backend, Config, ItemCollection, ItemStore, LearningItem, LearningSession, Policy, Rating,
    SessionError, StoreError,
};
use tracing::warn;

/// TimeQuest - active recall with spaced repetition
#[derive(Parser)]
#[command(name = "timequest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Active recall with spaced repetition in the terminal")]
pub struct Cli {
    /// Data file (JSON collection or SQLite database)
    #[arg(long, global = true, env = "TIMEQUEST_DATA")]
    data: Option<PathBuf>,

    /// Storage backend: json or sqlite
    #[arg(long, global = true, env = "TIMEQUEST_BACKEND", default_value = "json")]
    backend: Backend,

    /// Scheduling policy for new items: light or simple
    #[arg(long, global = true, env = "TIMEQUEST_POLICY", default_value = "light")]
    policy: Policy,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new item
    Add { prompt: String, answer: String },

    /// List all items with their schedule
    List,

    /// Change prompt and answer of an item
    Edit {
        id: String,
        prompt: String,
        answer: String,
    },

    /// Delete an item
    Remove { id: String },

    /// Review every item that is due
    Learn {
        /// Keep stored order instead of shuffling
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Show collection statistics
    Stats,

    /// Write all items to a JSON collection file
    Export { output: PathBuf },

    /// Add or replace items from a JSON collection file
    Import { file: PathBuf },

    /// Move the simulated clock one day forward (sqlite backend only)
    AdvanceDay,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::resolve(cli.data, cli.backend, cli.policy);

    match cli.command {
        Commands::Add { prompt, answer } => {
            add_item(open_store(&config)?.as_mut(), &config, prompt, answer)
        }
        Commands::List => list_items(open_store(&config)?.as_mut()),
        Commands::Edit { id, prompt, answer } => {
            edit_item(open_store(&config)?.as_mut(), &id, prompt, answer)
        }
        Commands::Remove { id } => remove_item(open_store(&config)?.as_mut(), &id),
        Commands::Learn { no_shuffle } => learn(open_store(&config)?.as_mut(), !no_shuffle),
        Commands::Stats => show_stats(open_store(&config)?.as_mut()),
        Commands::Export { output } => export(open_store(&config)?.as_mut(), &output),
        Commands::Import { file } => import(open_store(&config)?.as_mut(), &file),
        Commands::AdvanceDay => advance_day(&config),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Box<dyn ItemStore>> {
    config
        .open_store()
        .with_context(|| format!("opening {}", config.data_path.display()))
}

/// Loads the store into a collection, reporting repaired fields to the user.
fn load_collection(store: &mut dyn ItemStore) -> anyhow::Result<ItemCollection> {
    let loaded = store.load_all()?;
    if !loaded.repairs.is_empty() {
        eprintln!(
            "Repaired {} out-of-range scheduling values while loading.",
            loaded.repairs.len()
        );
    }
    Ok(ItemCollection::from_items(loaded.items))
}

fn add_item(
    store: &mut dyn ItemStore,
    config: &Config,
    prompt: String,
    answer: String,
) -> anyhow::Result<()> {
    if prompt.trim().is_empty() || answer.trim().is_empty() {
        bail!("prompt and answer must not be empty");
    }
    let item = LearningItem::new(prompt, answer, config.policy, store.current_time()?);
    store.put(&item)?;
    println!("Added {} ({} policy)", item.id(), config.policy);
    Ok(())
}

fn list_items(store: &mut dyn ItemStore) -> anyhow::Result<()> {
    let collection = load_collection(store)?;
    let now = store.current_time()?;

    if collection.is_empty() {
        println!("No items yet.");
        return Ok(());
    }

    for item in collection.items() {
        let status = match item.next_due_at() {
            Some(due_at) if !item.is_due(now) => format!("next review {}", format_date(due_at)),
            _ => "due".to_string(),
        };
        println!("{}  [{}]  {}", item.id(), status, item.prompt());
    }
    Ok(())
}

fn edit_item(
    store: &mut dyn ItemStore,
    id: &str,
    prompt: String,
    answer: String,
) -> anyhow::Result<()> {
    let mut item = store
        .get(id)?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    item.set_content(prompt, answer);
    store.put(&item)?;
    println!("Updated {id}");
    Ok(())
}

fn remove_item(store: &mut dyn ItemStore, id: &str) -> anyhow::Result<()> {
    if !store.remove(id)? {
        return Err(StoreError::NotFound(id.to_string()).into());
    }
    println!("Removed {id}");
    Ok(())
}

fn learn(store: &mut dyn ItemStore, shuffle: bool) -> anyhow::Result<()> {
    let collection = load_collection(store)?;
    let mut session = LearningSession::new_from_due_items(&collection, store.current_time()?);

    if session.is_completed() {
        println!("Nothing is due. Well done!");
        return Ok(());
    }
    if shuffle {
        session.shuffle(&mut rand::rng());
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    println!("{} items to review", session.total_count());

    while let Some(item) = session.current_item() {
        let policy = item.policy();
        println!();
        println!("{}", session.progress_message());
        println!("Q: {}", item.prompt());
        if prompt_line(&mut input, "Press Enter to see the answer...")?.is_none() {
            break;
        }
        if let Some(answer) = session.reveal_answer() {
            println!("A: {answer}");
        }

        let updated = loop {
            let scale = Rating::ALL
                .iter()
                .map(|rating| format!("{}={}", rating.value(), policy.label(*rating)))
                .collect::<Vec<_>>()
                .join(", ");
            let Some(line) = prompt_line(&mut input, &format!("How was it? ({scale}): "))? else {
                return finish_session(&session);
            };
            let Ok(value) = line.trim().parse::<u8>() else {
                println!("Please enter a number between 1 and 4.");
                continue;
            };
            match session.grade_current(value, store.current_time()?) {
                Ok(item) => break item.clone(),
                Err(SessionError::Scheduler(err)) => println!("{err}"),
                Err(err) => return Err(err.into()),
            }
        };

        store.put(&updated)?;
        println!("Next review in {} days", updated.interval_days());
    }

    finish_session(&session)
}

fn finish_session(session: &LearningSession) -> anyhow::Result<()> {
    println!();
    println!("{}", session.progress_message());
    for rating in Rating::ALL {
        let count = session.count_for(rating);
        if count > 0 {
            println!("  {}: {count}", rating.value());
        }
    }
    if session.remaining_count() > 0 {
        warn!(remaining = session.remaining_count(), "session ended early");
    }
    Ok(())
}

/// Prints `message` and reads one line. Returns `None` at end of input.
fn prompt_line(input: &mut impl BufRead, message: &str) -> anyhow::Result<Option<String>> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn show_stats(store: &mut dyn ItemStore) -> anyhow::Result<()> {
    let collection = load_collection(store)?;
    let stats = collection.stats(store.current_time()?);

    println!("Total items:   {}", stats.total);
    println!("Due now:       {}", stats.due);
    println!("Not due:       {}", stats.total - stats.due);
    println!("Total reviews: {}", stats.total_reviews);
    if let Some(average) = stats.average_reviews() {
        println!("Reviews/item:  {average:.1}");
    }
    println!(
        "Stages:        {} new, {} learning, {} mature",
        stats.new, stats.learning, stats.mature
    );

    if !stats.interval_distribution.is_empty() {
        println!();
        println!("Intervals:");
        for (days, count) in &stats.interval_distribution {
            println!("  {days:>4} days: {count} items");
        }
    }
    Ok(())
}

fn export(store: &mut dyn ItemStore, output: &Path) -> anyhow::Result<()> {
    let collection = load_collection(store)?;
    export_json_to_path(collection.items(), output, Utc::now())?;
    println!("Exported {} items to {}", collection.len(), output.display());
    Ok(())
}

fn import(store: &mut dyn ItemStore, file: &Path) -> anyhow::Result<()> {
    let loaded = import_json(file).with_context(|| format!("reading {}", file.display()))?;
    if !loaded.repairs.is_empty() {
        eprintln!(
            "Repaired {} out-of-range scheduling values in {}.",
            loaded.repairs.len(),
            file.display()
        );
    }
    for item in &loaded.items {
        store.put(item)?;
    }
    println!("Imported {} items", loaded.items.len());
    Ok(())
}

fn advance_day(config: &Config) -> anyhow::Result<()> {
    if config.backend != Backend::Sqlite {
        bail!("the simulated clock is only available with the sqlite backend");
    }
    let store = SqliteStore::open(&config.data_path)?;
    let now = store.advance_day()?;
    println!("Simulated date is now {}", format_date(now));
    Ok(())
}

fn format_date(time: DateTime<Utc>) -> String {
    if time == DateTime::<Utc>::MAX_UTC {
        return "never".to_string();
    }
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}
