//! rehab-coach - self-guided rehab coach
//!
//! Check in, get a mode, work through drills that back off on bad feedback.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use rehab_coach::coach::{
    rank, rank_all, start_session, CalibrationProfile, CheckIn, DrillFeedback, Mode, ProblemZone,
    Sensation,
};
use rehab_coach::config::CoachConfig;
use rehab_coach::error::CoachError;
use rehab_coach::db::{Database, FeedbackRecord, Store, StoredSession};
use rehab_coach::drills::{BodyPart, Catalog, Drill};
use rehab_coach::tui::App;

#[derive(Parser)]
#[command(name = "rehab-coach")]
#[command(author, version, about = "Self-guided rehab coach")]
struct Cli {
    /// SQLite database path
    #[arg(long, env = "REHAB_DB", default_value = "rehab.db", global = true)]
    db: String,

    /// JSON file overriding thresholds
    #[arg(long, env = "REHAB_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List drills
    Drills {
        #[arg(short, long)]
        body_part: Option<BodyPart>,
    },

    /// Replace the calibration profile of a body part
    Calibrate {
        body_part: BodyPart,

        /// Problem zone as index:severity (repeatable)
        #[arg(short, long = "zone")]
        zones: Vec<ProblemZone>,
    },

    /// Show the calibrated focus zone
    Focus { body_part: BodyPart },

    /// Check in and start a session
    CheckIn {
        body_part: BodyPart,

        /// Pain right now, 0-10
        #[arg(short, long)]
        pain: u8,

        /// Confidence in the body part, 0-10
        #[arg(short, long)]
        confidence: u8,

        /// Symptom tag (repeatable)
        #[arg(short, long = "sensation", value_enum)]
        sensations: Vec<Sensation>,

        /// Anything else worth mentioning
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show the active session
    Session { body_part: BodyPart },

    /// Report how the current drill went
    Feedback {
        body_part: BodyPart,

        /// Pain during the drill, 0-10
        #[arg(short, long)]
        pain: u8,

        /// The drill felt unstable
        #[arg(short, long)]
        unstable: bool,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Recent feedback for a body part
    History {
        body_part: BodyPart,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Open the session dashboard
    Tui { body_part: BodyPart },
}

fn print_drill(drill: &Drill) {
    println!("{} [{}]", drill.title, drill.dosage.format());
    println!("  {}", drill.intent);
    for cue in drill.cues {
        println!("  - {}", cue);
    }
}

fn print_session(catalog: &Catalog, session: &StoredSession) -> Result<()> {
    let progress = &session.progress;
    let state = &progress.state;

    if state.is_blocked() {
        println!("Session for {} is BLOCKED.", state.body_part);
        if let Some(flag) = &session.flag {
            println!("{}", flag.title);
            println!("{}", flag.description);
            println!(">> {}", flag.recommended_action);
        }
        return Ok(());
    }

    println!("{} | mode {} | drill {}/{}", state.body_part, state.mode, (progress.position + 1).min(state.plan.len()), state.plan.len());
    if let Some(focus) = &session.focus {
        println!("Focus zone: {} (severity {:.1})", focus.label, focus.severity);
    }
    println!("{:-<50}", "");

    match progress.current_drill_id() {
        Some(id) => print_drill(catalog.drill(id)?),
        None => println!("Session complete."),
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = CoachConfig::load(cli.config.as_deref())?;
    let catalog = Catalog::builtin();
    catalog.validate()?;

    let db = Database::open(&cli.db)?;

    match cli.command {
        Commands::Drills { body_part } => {
            let parts = match body_part {
                Some(bp) => vec![bp],
                None => BodyPart::all().to_vec(),
            };
            for bp in parts {
                println!("== {}", bp);
                for drill in catalog.drills_for(bp) {
                    println!("{:28} | {:28} | {}", drill.id, drill.title, drill.dosage.format());
                }
            }
        }

        Commands::Calibrate { body_part, zones } => {
            let profile = CalibrationProfile::new(body_part, zones);
            // refuse to store a profile that would not resolve
            let ranked = rank_all(&profile, &catalog)?;
            db.save_profile(&profile)?;
            info!(%body_part, zones = ranked.len(), "Calibration saved");

            println!("Calibration saved for {}", body_part);
            for zone in ranked {
                println!("  {:32} severity {:.1}", zone.label, zone.severity);
            }
        }

        Commands::Focus { body_part } => {
            let Some(profile) = db.load_profile(body_part)? else {
                println!("{} is not calibrated yet.", body_part);
                return Ok(());
            };
            match rank(&profile, &catalog) {
                Ok(Some(focus)) => println!("Focus: {} (severity {:.1})", focus.label, focus.severity),
                Ok(None) => println!("No problem zones calibrated for {}.", body_part),
                Err(e) if e.requires_recalibration() => {
                    println!("Calibration for {} is unusable ({}). Please recalibrate.", body_part, e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::CheckIn { body_part, pain, confidence, sensations, note } => {
            let mut check_in = CheckIn::new(body_part, pain, confidence).with_sensations(sensations);
            check_in.free_text = note;

            let profile = db.load_profile(body_part)?;
            let start = start_session(&check_in, profile.as_ref(), &catalog, &config.triage)?;
            if let Some(issue) = &start.calibration_issue {
                println!("Note: calibration ignored ({}). Please recalibrate.", issue);
            }

            let session = StoredSession::new(start.state, start.triage.flag, start.focus);
            db.save_session(&session)?;
            info!(%body_part, mode = %session.progress.state.mode, "Session started");
            print_session(&catalog, &session)?;
        }

        Commands::Session { body_part } => match db.load_session(body_part)? {
            Some(session) => print_session(&catalog, &session)?,
            None => println!("No session for {}. Run check-in first.", body_part),
        },

        Commands::Feedback { body_part, pain, unstable, notes } => {
            let Some(mut session) = db.load_session(body_part)? else {
                bail!("no session for {}; run check-in first", body_part);
            };
            if session.progress.state.is_blocked() {
                print_session(&catalog, &session)?;
                return Err(CoachError::SessionBlocked.into());
            }
            let Some(drill_id) = session.progress.current_drill_id().map(str::to_string) else {
                bail!("session for {} is already complete; check in again to start a new one", body_part);
            };

            let feedback = DrillFeedback { drill_id, pain, felt_stable: !unstable, notes };
            let previous = session.progress.state.mode;
            session.progress = session.progress.record(&feedback, &catalog, &config.session)?;
            session.updated_at = Utc::now();

            db.save_session(&session)?;
            db.log_feedback(&FeedbackRecord {
                id: None,
                date: session.updated_at,
                body_part,
                feedback,
                mode_after: session.progress.state.mode,
            })?;

            if session.progress.state.mode == Mode::Reset && previous != Mode::Reset {
                println!("Backing off: switching to the RESET plan.");
            }
            print_session(&catalog, &session)?;
        }

        Commands::History { body_part, limit } => {
            let history = db.feedback_history(body_part)?;
            println!("Recent feedback for {}:", body_part);
            println!("{:-<60}", "");
            for r in history.iter().take(limit) {
                println!(
                    "{} | {:28} | pain {:2} | {} | {} | {}",
                    r.date.format("%Y-%m-%d %H:%M"),
                    r.feedback.drill_id,
                    r.feedback.pain,
                    if r.feedback.felt_stable { "stable" } else { "unstable" },
                    r.mode_after,
                    r.feedback.notes.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::Tui { body_part } => {
            let mut app = App::new(db, catalog, body_part)?;
            app.run()?;
        }
    }

    Ok(())
}
