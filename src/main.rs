use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use gamebook_companion::config::AppConfig;
use gamebook_companion::core::dice::{DiceEngine, DiceKind, RollHistory};
use gamebook_companion::core::rules::{self, classic};
use gamebook_companion::core::session::CharacterSession;
use gamebook_companion::core::undo::UndoController;
use gamebook_companion::database::{
    Character, CharacterRepository, EnvelopeRepository, EnvelopeStore, FileBackingStore,
    FileRepository,
};

#[derive(Parser)]
#[command(name = "gamebook-companion", about = "Character sheets for solo adventure books")]
#[command(version)]
struct Cli {
    /// Use this data directory instead of the configured one
    #[arg(long, global = true, env = "GAMEBOOK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every character
    List,

    /// Show one character (defaults to the active one)
    Show { id: Option<String> },

    /// Roll a new classic character and make it active
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        book: String,
        /// RNG seed for reproducible rolls
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Make a character active
    Select { id: String },

    /// Delete a character
    Delete { id: String },

    /// Roll dice without touching any character
    Roll {
        /// 1d6 or 2d6
        dice: DiceKind,
        #[arg(long)]
        label: Option<String>,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        times: usize,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Eat a meal to restore stamina
    Eat { id: Option<String> },

    /// Test your luck with 2d6
    Luck {
        id: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print (or write) a backup of all characters
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all characters with a backup
    Import {
        file: PathBuf,
        /// Confirm that existing characters will be replaced
        #[arg(long)]
        yes: bool,
    },
}

fn open_repository(config: &AppConfig) -> FileRepository {
    let store = EnvelopeStore::new(FileBackingStore::new(config.data_dir()))
        .with_key(config.storage.storage_key.clone())
        .with_corruption_policy(config.storage.on_corruption);
    EnvelopeRepository::new(store)
}

fn dice(seed: Option<u64>) -> DiceEngine {
    match seed {
        Some(seed) => DiceEngine::seeded(seed),
        None => DiceEngine::new(),
    }
}

fn print_character(character: &Character) {
    println!("{} ({})", character.name, character.id);
    println!("  book: {}  page: {}", character.book_title, character.current_page);
    if let Some(sheet) = character.sheet.as_classic() {
        println!(
            "  skill {}/{}  stamina {}/{}  luck {}/{}",
            sheet.current_skill,
            sheet.initial_skill,
            sheet.current_stamina,
            sheet.initial_stamina,
            sheet.current_luck,
            sheet.initial_luck
        );
        println!(
            "  fear {}/{}  meals {}  gold {}",
            sheet.current_fear, sheet.max_fear, sheet.meals, sheet.gold
        );
        for item in &sheet.inventory {
            println!("  - {}", item.name);
        }
        for enemy in &sheet.combat_enemies {
            println!("  vs {} (skill {}, stamina {})", enemy.name, enemy.skill, enemy.stamina);
        }
    }
    if rules::registry().is_dead(character) {
        println!("  DEAD");
    } else if rules::registry().is_critical(character) {
        println!("  CRITICAL");
    }
    if !character.notes.is_empty() {
        println!("  notes: {}", character.notes);
    }
}

/// Load `id`, or the active character when none is given.
async fn load_session(
    session: &mut CharacterSession<FileRepository>,
    id: Option<String>,
) -> anyhow::Result<Character> {
    let loaded = match id {
        Some(id) => session.load(&id).await?.cloned(),
        None => session.resume().await?.cloned(),
    };
    loaded.context("No such character (create or select one first)")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();
    if cli.data_dir.is_some() {
        config.storage.data_dir = cli.data_dir;
    }

    let _log_guard = gamebook_companion::core::logging::init(&config.logging, &config.log_dir());
    tracing::debug!("{} v{} starting", gamebook_companion::NAME, gamebook_companion::VERSION);

    let repository = open_repository(&config);

    match cli.command {
        Commands::List => {
            let active = repository.get_last_character_id().await?;
            for character in repository.get_characters().await? {
                let marker = if active.as_deref() == Some(character.id.as_str()) { "*" } else { " " };
                println!("{} {}  {}  ({})", marker, character.id, character.name, character.book_title);
            }
        }
        Commands::Show { id } => {
            let mut session = CharacterSession::new(repository, UndoController::new(config.undo.window()));
            let character = load_session(&mut session, id).await?;
            print_character(&character);
        }
        Commands::Create { name, book, seed } => {
            let creation = classic::ClassicCreation::roll(&mut dice(seed));
            let character = classic::new_classic_character(name, book, creation);
            let saved = repository.save_character(&character).await?;
            repository.set_last_character_id(&saved.id).await?;
            print_character(&saved);
        }
        Commands::Select { id } => {
            if repository.get_character(&id).await?.is_none() {
                bail!("No character with id {}", id);
            }
            repository.set_last_character_id(&id).await?;
            println!("Active character: {}", id);
        }
        Commands::Delete { id } => {
            if !repository.delete_character(&id).await? {
                bail!("No character with id {}", id);
            }
            println!("Deleted {}", id);
        }
        Commands::Roll { dice: kind, label, times, seed } => {
            let mut engine = dice(seed);
            let mut history = RollHistory::new(config.dice.history_limit);
            for _ in 0..times {
                history.push(engine.roll_record(kind, label.as_deref()));
            }
            for roll in history.iter() {
                let label = roll.label.as_deref().unwrap_or("");
                println!("{} {:?} = {} {}", roll.kind, roll.values, roll.total, label);
            }
        }
        Commands::Eat { id } => {
            let mut session = CharacterSession::new(repository, UndoController::new(config.undo.window()));
            let character = load_session(&mut session, id).await?;
            let sheet = character.sheet.as_classic().context("Character has no classic sheet")?;

            match classic::eat_meal(sheet).into_patch() {
                None => println!("No meals left."),
                Some(patch) => {
                    session.update(&patch.into(), Some("Ate a meal")).await?;
                    if let Some(current) = session.current() {
                        print_character(current);
                    }
                }
            }
        }
        Commands::Luck { id, seed } => {
            let mut session = CharacterSession::new(repository, UndoController::new(config.undo.window()));
            let character = load_session(&mut session, id).await?;
            let sheet = character.sheet.as_classic().context("Character has no classic sheet")?;

            let roll = dice(seed).roll_record(DiceKind::TwoD6, Some("Test your luck"));
            let outcome = classic::test_luck(sheet, roll.total);
            session.update(&outcome.patch().into(), Some("Tested luck")).await?;

            println!(
                "Rolled {:?} = {} against luck {}: {}",
                roll.values,
                roll.total,
                sheet.current_luck,
                if outcome.lucky { "LUCKY" } else { "UNLUCKY" }
            );
            println!("Luck is now {}", outcome.new_luck);
        }
        Commands::Export { output } => {
            let text = repository.export_data().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", text),
            }
        }
        Commands::Import { file, yes } => {
            if !yes {
                bail!("Import replaces every character; pass --yes to confirm");
            }
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            repository.import_data(&text).await?;
            println!("Imported {}", file.display());
        }
    }

    Ok(())
}
