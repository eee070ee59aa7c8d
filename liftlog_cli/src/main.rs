use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use liftlog_core::progress::{current_streak, personal_records};
use liftlog_core::*;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout log with history, stats and backups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a finished workout
    Log {
        /// Workout name
        #[arg(long)]
        name: String,

        /// Start time (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<String>,

        /// End time (RFC 3339), defaults to now
        #[arg(long)]
        end: Option<String>,

        /// Completed set as EXERCISE/MUSCLE=WEIGHTxREPS (repeatable)
        #[arg(long = "set", required = true)]
        sets: Vec<String>,
    },

    /// List workouts, optionally for one date (YYYY-MM-DD)
    List {
        #[arg(long)]
        date: Option<String>,
    },

    /// Show one workout as JSON
    Show { id: String },

    /// Delete a workout
    Delete { date: String, id: String },

    /// Change a workout's start and end time
    EditTime {
        id: String,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: Option<String>,
    },

    /// Print aggregate statistics
    Stats,

    /// Print personal records and the current streak
    Records,

    /// Print storage diagnostics
    Storage,

    /// Check that stored history parses
    Health,

    /// Export history
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },

    /// Import a JSON export, replacing history
    Import { file: PathBuf },

    /// Delete all stored data
    Clear,

    /// Run storage maintenance now
    Maintain,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    liftlog_core::logging::init_with_level(&config.logging.level);

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let storage = WorkoutStorage::new(FileStore::new(data_dir));
    let mut store = WorkoutStore::with_schedule(storage, config.maintenance.schedule());

    match cli.command {
        Commands::Log {
            name,
            start,
            end,
            sets,
        } => cmd_log(&mut store, name, start, end, &sets),
        Commands::List { date } => cmd_list(&store, date),
        Commands::Show { id } => match store.workout_by_id(&id) {
            Some(session) => print_json(session),
            None => Err(Error::Other(format!("No workout with id {}", id))),
        },
        Commands::Delete { date, id } => {
            if store.workouts_by_date(&date).iter().all(|s| s.id != id) {
                return Err(Error::Other(format!("No workout {} on {}", id, date)));
            }
            store.delete_workout(&date, &id);
            println!("✓ Deleted workout {}", id);
            Ok(())
        }
        Commands::EditTime { id, start, end } => {
            if store.workout_by_id(&id).is_none() {
                return Err(Error::Other(format!("No workout with id {}", id)));
            }
            let start = parse_time(&start)?;
            let end = end.as_deref().map(parse_time).transpose()?;
            store.edit_workout_time(&id, start, end);
            if let Some(minutes) = store.workout_by_id(&id).and_then(|s| s.duration) {
                println!("✓ Updated workout {} ({} min)", id, minutes);
            } else {
                println!("✓ Updated workout {}", id);
            }
            Ok(())
        }
        Commands::Stats => print_json(&store.state().stats),
        Commands::Records => {
            let records = personal_records(store.history());
            let streak = current_streak(store.history(), Utc::now().date_naive());
            print_json(&serde_json::json!({
                "streak": streak,
                "personalRecords": records,
            }))
        }
        Commands::Storage => print_json(&store.storage_stats()),
        Commands::Health => {
            if store.storage().is_healthy() {
                println!("healthy");
                Ok(())
            } else {
                Err(Error::Storage("stored history is unreadable".into()))
            }
        }
        Commands::Export { output, format } => cmd_export(&store, output, format),
        Commands::Import { file } => {
            let blob = std::fs::read_to_string(&file)?;
            if store.import_data(&blob) {
                println!(
                    "✓ Imported {} workouts",
                    store.history().session_count()
                );
                Ok(())
            } else {
                Err(Error::Import(format!(
                    "{} is not a liftlog export",
                    file.display()
                )))
            }
        }
        Commands::Clear => {
            store.clear_all_data();
            println!("✓ Cleared all workout data");
            Ok(())
        }
        Commands::Maintain => {
            if store.run_maintenance(Utc::now()) {
                println!("✓ Maintenance complete");
                Ok(())
            } else {
                Err(Error::Storage(
                    "stored history is unreadable and no backup could repair it".into(),
                ))
            }
        }
    }
}

fn cmd_log<S: HistoryStorage>(
    store: &mut WorkoutStore<S>,
    name: String,
    start: Option<String>,
    end: Option<String>,
    sets: &[String],
) -> Result<()> {
    let now = Utc::now();
    let start = start.as_deref().map(parse_time).transpose()?.unwrap_or(now);
    let end = end.as_deref().map(parse_time).transpose()?.unwrap_or(now);
    if end < start {
        return Err(Error::Parse("end time is before start time".into()));
    }

    store.start_workout(WorkoutSession::new(name, start));

    let mut exercises: Vec<WorkoutExercise> = Vec::new();
    for raw in sets {
        let parsed = parse_set(raw)?;
        let position = exercises
            .iter()
            .position(|e| e.exercise.name == parsed.exercise);
        let entry = match position {
            Some(i) => &mut exercises[i],
            None => {
                let id = parsed.exercise.to_lowercase().replace(' ', "-");
                exercises.push(WorkoutExercise::new(
                    Exercise::new(id, parsed.exercise.clone(), parsed.muscle_group.clone(), ""),
                    0,
                ));
                let last = exercises.len() - 1;
                &mut exercises[last]
            }
        };
        let mut set = WorkoutSet::new(parsed.weight, parsed.reps);
        set.completed = true;
        entry.sets.push(set);
    }
    store.update_workout(WorkoutPatch {
        exercises: Some(exercises),
        ..Default::default()
    });

    let Some(current) = store.current_workout().cloned() else {
        return Err(Error::Other("no workout in progress".into()));
    };
    let finished = current.finished_at(end);
    let summary = format!(
        "✓ Logged {} ({} sets, volume {})",
        finished.id, finished.completed_sets, finished.total_volume
    );
    store.finish_workout(finished);
    println!("{}", summary);
    Ok(())
}

fn cmd_list<S: HistoryStorage>(store: &WorkoutStore<S>, date: Option<String>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut print = |date: &str, session: &WorkoutSession| {
        writeln!(
            out,
            "{}  {}  {}  {} sets  volume {}",
            date,
            session.id,
            session.name,
            session.completed_sets,
            session.total_volume
        )
    };

    match date {
        Some(date) => {
            for session in store.workouts_by_date(&date) {
                print(date.as_str(), session)?;
            }
        }
        None => {
            for (date, session) in store.history().entries() {
                print(date, session)?;
            }
        }
    }
    Ok(())
}

fn cmd_export<S: HistoryStorage>(
    store: &WorkoutStore<S>,
    output: Option<PathBuf>,
    format: ExportFormat,
) -> Result<()> {
    match (format, output) {
        (ExportFormat::Json, Some(path)) => {
            std::fs::write(&path, store.export_data())?;
            println!("✓ Exported to {}", path.display());
        }
        (ExportFormat::Json, None) => println!("{}", store.export_data()),
        (ExportFormat::Csv, Some(path)) => {
            let file = std::fs::File::create(&path)?;
            let rows = csv_export::write_sets_csv(store.history(), file)?;
            println!("✓ Exported {} sets to {}", rows, path.display());
        }
        (ExportFormat::Csv, None) => {
            csv_export::write_sets_csv(store.history(), io::stdout().lock())?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("invalid time {:?}: {}", raw, e)))
}

struct ParsedSet {
    exercise: String,
    muscle_group: String,
    weight: f64,
    reps: u32,
}

/// Parse `EXERCISE/MUSCLE=WEIGHTxREPS`, e.g. `Back Squat/Legs=100x5`
fn parse_set(raw: &str) -> Result<ParsedSet> {
    let invalid = || Error::Parse(format!("invalid set {:?}, expected EXERCISE/MUSCLE=WEIGHTxREPS", raw));

    let (label, load) = raw.rsplit_once('=').ok_or_else(invalid)?;
    let (exercise, muscle_group) = label.rsplit_once('/').ok_or_else(invalid)?;
    let (weight, reps) = load.split_once(['x', 'X']).ok_or_else(invalid)?;

    let exercise = exercise.trim();
    let muscle_group = muscle_group.trim();
    if exercise.is_empty() || muscle_group.is_empty() {
        return Err(invalid());
    }
    let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(invalid());
    }
    let reps: u32 = reps.trim().parse().map_err(|_| invalid())?;

    Ok(ParsedSet {
        exercise: exercise.to_string(),
        muscle_group: muscle_group.to_string(),
        weight,
        reps,
    })
}
