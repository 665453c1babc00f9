//! Liftlog CLI - local-first workout tracking

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use liftlog_core::config::Config;
use liftlog_core::domain::catalog::{builtin, ExerciseType, MuscleGroup};
use liftlog_core::domain::tracking::{SessionStore, SetType, TrackedSet, WorkoutManager, WorkoutRepository};
use liftlog_core::storage::{Database, DatabaseConfig};
use liftlog_core::sync::{StaticTokenProvider, SyncClient};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(author, version, about = "Local-first workout tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available workout templates
    Templates,

    /// Start a workout from a template
    Start {
        /// Template name (prefix match, e.g. "push")
        template: String,
    },

    /// Log a set on the active workout
    Log {
        /// Exercise index within the workout
        exercise: usize,
        /// Repetitions performed
        reps: u32,
        /// Weight used
        weight: f64,
        /// Count as a warm-up set
        #[arg(long)]
        warmup: bool,
    },

    /// Edit a previously logged set
    EditSet {
        exercise: usize,
        set: usize,
        reps: u32,
        weight: f64,
        #[arg(long)]
        warmup: bool,
    },

    /// Remove a logged set
    RemoveSet { exercise: usize, set: usize },

    /// Show the active workout
    Status,

    /// End the active workout and store it
    End,

    /// Discard the active workout without storing it
    Abandon,

    /// List completed workouts
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a completed workout
    Show { id: String },

    /// Delete a completed workout
    Delete { id: String },

    /// Show aggregate statistics
    Stats,

    /// Show best-set progress for an exercise
    Progress {
        /// Exercise name, e.g. "Barbell Bench Press"
        exercise: String,
    },

    /// Show volume per day over a trailing window
    Volume {
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Show top exercises by total volume
    Top {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Upload completed workouts that have not been synced yet
    Sync,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liftlog=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    // Config commands run without touching the database.
    if let Commands::Config { action } = &cli.command {
        return run_config(action);
    }
    if let Commands::Templates = &cli.command {
        for template in builtin::all() {
            println!("{} ({} exercises)", template.name, template.exercises.len());
            for (index, exercise) in template.exercises.iter().enumerate() {
                println!(
                    "  [{}] {} - {} warm-up + {} working, {} reps",
                    index,
                    exercise.exercise_type.name,
                    exercise.warmup_sets,
                    exercise.working_sets,
                    exercise.rep_range
                );
            }
        }
        return Ok(());
    }

    let config = Config::load()?;
    let data_dir = config.data_dir()?;

    // An unusable local store is fatal at startup.
    let database = Database::new(DatabaseConfig::with_path(data_dir.join("liftlog.db")))
        .await
        .context("Failed to open local storage")?;

    let store = SessionStore::open(
        data_dir.join("active_workout.json"),
        Duration::from_secs(config.session.autosave_interval_secs),
    );
    let repository = WorkoutRepository::new(database.pool().clone());

    let sync = match std::env::var("LIFTLOG_TOKEN") {
        Ok(token) if !token.is_empty() => Some(Arc::new(
            SyncClient::builder()
                .base_url(&config.api.base_url)
                .environment(&config.api.environment)
                .timeout_secs(config.api.timeout_secs)
                .token_provider(Arc::new(StaticTokenProvider::new(token)))
                .device_path(data_dir.join("device.json"))
                .build()?,
        )),
        _ => None,
    };

    let user_id = std::env::var("LIFTLOG_USER").ok().filter(|s| !s.is_empty());
    let manager = WorkoutManager::new(store, repository, sync, user_id).await?;

    run(cli.command, &manager).await
}

async fn run(command: Commands, manager: &WorkoutManager) -> anyhow::Result<()> {
    match command {
        Commands::Templates | Commands::Config { .. } => unreachable!("handled before setup"),

        Commands::Start { template } => {
            let Some(template) = builtin::find(&template) else {
                return Err(liftlog_core::Error::TemplateNotFound(template).into());
            };
            let workout = manager.start_workout(&template).await?;
            println!(
                "Started '{}' with {} exercises.",
                workout.template_name,
                workout.tracked_exercises.len()
            );
        }

        Commands::Log { exercise, reps, weight, warmup } => {
            let set = build_set(manager, exercise, reps, weight, warmup).await?;
            let name = set.exercise_type.name.clone();
            manager.log_set(exercise, set).await;
            println!("Logged {} x {} on {}.", reps, weight, name);
        }

        Commands::EditSet { exercise, set, reps, weight, warmup } => {
            let set_type = if warmup { SetType::Warmup } else { SetType::Working };
            manager.update_set(exercise, set, reps, weight, set_type).await;
            println!("Set updated.");
        }

        Commands::RemoveSet { exercise, set } => {
            manager.remove_set(exercise, set).await;
            println!("Set removed.");
        }

        Commands::Status => match manager.active_session().await {
            Some(workout) => {
                println!(
                    "Active: {} (started {})",
                    workout.template_name,
                    workout
                        .start_time
                        .map(|t| t.format("%H:%M").to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                for (index, exercise) in workout.tracked_exercises.iter().enumerate() {
                    println!("  [{}] {} - {} sets", index, exercise.exercise_name, exercise.tracked_sets.len());
                    for (set_index, set) in exercise.tracked_sets.iter().enumerate() {
                        println!(
                            "      [{}] {} x {} ({})",
                            set_index, set.reps, set.weight, set.set_type
                        );
                    }
                }
            }
            None => println!("No workout in progress."),
        },

        Commands::End => {
            let finished = manager.end_workout().await?;
            println!(
                "Finished '{}': {} sets, {:.0} volume, {}.",
                finished.template_name,
                finished.total_sets(),
                finished.volume(),
                format_duration(finished.duration_secs.unwrap_or(0))
            );
        }

        Commands::Abandon => match manager.abandon_workout().await {
            Some(workout) => println!("Abandoned '{}'.", workout.template_name),
            None => println!("No workout in progress."),
        },

        Commands::History { limit } => {
            let mut sessions = manager.recent_sessions().await;
            if let Some(limit) = limit {
                sessions.truncate(limit);
            }
            if sessions.is_empty() {
                println!("No completed workouts yet.");
            }
            for workout in sessions {
                println!(
                    "{}  {}  {}  {} sets  {:.0} volume",
                    workout.id,
                    workout.date.format("%Y-%m-%d"),
                    workout.template_name,
                    workout.total_sets(),
                    workout.volume()
                );
            }
        }

        Commands::Show { id } => {
            let id = parse_id(&id)?;
            match manager.completed_workout(id).await? {
                Some(workout) => {
                    println!(
                        "{} on {} ({})",
                        workout.template_name,
                        workout.date.format("%Y-%m-%d %H:%M"),
                        format_duration(workout.duration_secs.unwrap_or(0))
                    );
                    for exercise in &workout.tracked_exercises {
                        println!("  {}", exercise.exercise_name);
                        for set in &exercise.tracked_sets {
                            println!("    {} x {} ({})", set.reps, set.weight, set.set_type);
                        }
                    }
                }
                None => return Err(liftlog_core::Error::WorkoutNotFound(id.to_string()).into()),
            }
        }

        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            if manager.delete_completed(id).await? {
                println!("Deleted workout {}.", id);
            } else {
                return Err(liftlog_core::Error::WorkoutNotFound(id.to_string()).into());
            }
        }

        Commands::Stats => {
            let stats = manager.stats().await;
            println!("Workouts: {}", stats.total_workouts);
            println!("Sets:     {}", stats.total_sets);
            println!("Reps:     {}", stats.total_reps);
            println!("Volume:   {:.0}", stats.total_volume);
            if !stats.count_by_template.is_empty() {
                println!("By template:");
                let mut by_template: Vec<_> = stats.count_by_template.iter().collect();
                by_template.sort_by(|a, b| b.1.cmp(a.1));
                for (name, count) in by_template {
                    println!("  {} x{}", name, count);
                }
            }
        }

        Commands::Progress { exercise } => {
            let progress = manager.exercise_progress(&exercise).await?;
            if progress.is_empty() {
                println!("No working sets recorded for '{}'.", exercise);
            }
            for point in progress {
                println!(
                    "{}  {} x {}",
                    point.date.format("%Y-%m-%d"),
                    point.reps,
                    point.weight
                );
            }
        }

        Commands::Volume { days } => {
            for (date, volume) in manager.volume_by_day(days).await {
                println!("{}  {:.0}", date, volume);
            }
        }

        Commands::Top { limit } => {
            for (rank, (name, volume)) in manager
                .top_exercises_by_volume(limit)
                .await
                .into_iter()
                .enumerate()
            {
                println!("{}. {}  {:.0}", rank + 1, name, volume);
            }
        }

        Commands::Sync => {
            let count = manager.sync_pending().await?;
            if count == 0 {
                println!("Nothing to sync.");
            } else {
                println!("Synced {} workout(s).", count);
            }
        }
    }

    Ok(())
}

/// Build a tracked set for the exercise at `index` of the active workout
async fn build_set(
    manager: &WorkoutManager,
    index: usize,
    reps: u32,
    weight: f64,
    warmup: bool,
) -> anyhow::Result<TrackedSet> {
    let Some(active) = manager.active_session().await else {
        bail!("No workout in progress. Run `liftlog start <template>` first.");
    };
    let Some(exercise) = active.tracked_exercises.get(index) else {
        bail!(
            "Exercise index {} out of range (0-{}).",
            index,
            active.tracked_exercises.len().saturating_sub(1)
        );
    };

    let muscle_groups = exercise
        .muscle_groups
        .iter()
        .filter_map(|tag| MuscleGroup::from_str(tag))
        .collect();
    let set_type = if warmup { SetType::Warmup } else { SetType::Working };

    Ok(TrackedSet::new(
        reps,
        weight,
        set_type,
        ExerciseType::new(exercise.exercise_name.clone(), muscle_groups),
    ))
}

fn run_config(action: &ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list() {
                println!("{} = {}", key, value);
            }
        }
    }
    Ok(())
}

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("Invalid workout id: {}", id))
}

fn format_duration(secs: i64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
