/// Command-line interface for the Tendensee habit tracker
///
/// This binary exercises the service facade: creating habits, toggling
/// completions, and printing streak/strength statistics. It sets up logging,
/// resolves the database location, and dispatches one subcommand per run.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use tendensee::stats;
use tendensee::{GoalType, HabitDraft, HabitId, HabitService, SchedulingType};

/// Get the default database path with a fallback strategy
fn default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let potential_dirs = [
        dirs::data_dir().map(|mut p| {
            p.push("tendensee");
            p
        }),
        dirs::home_dir().map(|mut p| {
            p.push(".tendensee");
            p
        }),
        std::env::current_dir().ok().map(|mut p| {
            p.push(".tendensee");
            p
        }),
    ];

    for dir in potential_dirs.iter().flatten() {
        if std::fs::create_dir_all(dir).is_ok() {
            let mut db_path = dir.clone();
            db_path.push("habits.db");
            return Ok(db_path);
        }
    }

    let mut temp_path = std::env::temp_dir();
    temp_path.push("tendensee");
    std::fs::create_dir_all(&temp_path)?;
    temp_path.push("habits.db");

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScheduleArg {
    Daily,
    Weekly,
    SpecificDays,
}

impl From<ScheduleArg> for SchedulingType {
    fn from(arg: ScheduleArg) -> Self {
        match arg {
            ScheduleArg::Daily => SchedulingType::Daily,
            ScheduleArg::Weekly => SchedulingType::Weekly,
            ScheduleArg::SpecificDays => SchedulingType::SpecificDays,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GoalArg {
    AtLeast,
    Exactly,
    AtMost,
}

impl From<GoalArg> for GoalType {
    fn from(arg: GoalArg) -> Self {
        match arg {
            GoalArg::AtLeast => GoalType::AtLeast,
            GoalArg::Exactly => GoalType::Exactly,
            GoalArg::AtMost => GoalType::AtMost,
        }
    }
}

/// Command line arguments for the Tendensee CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's data directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new habit
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// ARGB color as hex, e.g. FF4CAF50
        #[arg(long, default_value = "FF4CAF50")]
        color: String,
        #[arg(long, value_enum, default_value = "daily")]
        schedule: ScheduleArg,
        /// Times per week, for weekly schedules
        #[arg(long, default_value_t = 1)]
        frequency: u32,
        /// Weekday indices for specific-days schedules, e.g. "1,3,5" (Mon=1)
        #[arg(long, default_value = "")]
        days: String,
        #[arg(long, value_enum, default_value = "at-least")]
        goal: GoalArg,
        #[arg(long, default_value_t = 1.0)]
        target: f64,
    },
    /// List habits
    List {
        /// Include archived habits
        #[arg(long)]
        archived: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Mark a habit completed for a date (defaults to today)
    Done {
        id: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 1.0)]
        value: f64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove a habit's completion for a date (defaults to today)
    Undone {
        id: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show streak and completion statistics for a habit
    Stats { id: i64 },
    /// Archive a habit, or restore it with --restore
    Archive {
        id: i64,
        #[arg(long)]
        restore: bool,
    },
    /// Delete a habit and all its records
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("tendensee={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => default_database_path()?,
    };
    info!("Using database at: {}", db_path.display());

    let service = HabitService::open(&db_path)?;

    match args.command {
        Command::Add {
            title,
            description,
            color,
            schedule,
            frequency,
            days,
            goal,
            target,
        } => {
            let draft = HabitDraft {
                title,
                description,
                color: u32::from_str_radix(color.trim_start_matches("0x"), 16)
                    .map_err(|_| format!("Invalid color: {}", color))?,
                scheduling: schedule.into(),
                frequency,
                days_of_week: days,
                goal_type: goal.into(),
                goal_target: target,
            };
            let id = service.add_habit(draft).await?;
            println!("Created habit {}", id);
        }
        Command::List { archived, json } => {
            let habits = service.list_habits(archived).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else if habits.is_empty() {
                println!("No habits yet.");
            } else {
                for habit in habits {
                    let flag = if habit.is_archived { " [archived]" } else { "" };
                    println!(
                        "{:>4}  {}{}  ({}, goal {} {})",
                        habit.id,
                        habit.title,
                        flag,
                        habit.scheduling.as_str(),
                        habit.goal_type.as_str(),
                        habit.goal_target,
                    );
                }
            }
        }
        Command::Done {
            id,
            date,
            value,
            note,
        } => {
            let habit_id = HabitId(id);
            let date = date.unwrap_or_else(tendensee::day::today);
            require_habit(&service, habit_id).await?;
            service
                .toggle_completion(habit_id, date, true, value, note)
                .await?;
            println!("Marked habit {} done for {}", habit_id, date);
        }
        Command::Undone { id, date } => {
            let habit_id = HabitId(id);
            let date = date.unwrap_or_else(tendensee::day::today);
            require_habit(&service, habit_id).await?;
            service
                .toggle_completion(habit_id, date, false, 1.0, None)
                .await?;
            println!("Cleared habit {} for {}", habit_id, date);
        }
        Command::Stats { id } => {
            let habit_id = HabitId(id);
            let habit = require_habit(&service, habit_id).await?;
            let records = service.records_for_habit(habit_id).await?;

            println!("{}", habit.title);
            println!("  Current streak:  {} days", stats::current_streak(&records));
            println!("  Best streak:     {} days", stats::best_streak(&records));
            println!(
                "  7-day rate:      {}%",
                stats::completion_rate(&records, 7) as u32
            );
            println!(
                "  30-day rate:     {}%",
                stats::completion_rate(&records, 30) as u32
            );
            println!("  Strength:        {}/100", stats::strength(&records));
        }
        Command::Archive { id, restore } => {
            let habit_id = HabitId(id);
            service.set_archived(habit_id, !restore).await?;
            if restore {
                println!("Restored habit {}", habit_id);
            } else {
                println!("Archived habit {}", habit_id);
            }
        }
        Command::Delete { id } => {
            let habit_id = HabitId(id);
            service.delete_habit(habit_id).await?;
            println!("Deleted habit {} and its records", habit_id);
        }
    }

    Ok(())
}

/// Resolve a habit id or exit with a readable message
async fn require_habit(
    service: &HabitService,
    habit_id: HabitId,
) -> Result<tendensee::Habit, Box<dyn std::error::Error>> {
    service
        .get_habit_by_id(habit_id)
        .await?
        .ok_or_else(|| format!("No habit with id {}", habit_id).into())
}
