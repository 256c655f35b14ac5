mod ai;
mod app;
mod gateway;
mod insights;
mod models;
mod report;
mod store;
mod tui;
mod wizard;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use gateway::Gateway;
use models::{
    resolve_choice, AnswerKind, GoalField, ProfileField, SmartGoal, Step, SurveyData, LEADERSHIP_STYLES,
    MBTI_TYPES, SURVEY_QUESTIONS,
};
use store::Store;
use wizard::Event;

#[derive(Parser)]
#[command(name = "hospitour")]
#[command(about = "Hospitality & tourism career wizard - audit your skills and build a SMART development plan")]
struct Cli {
    /// AI model (gemini, gemini-pro, sonnet, haiku, gpt-4o, gpt-4o-mini)
    #[arg(long, global = true, env = "HOSPITOUR_MODEL", default_value = "gemini")]
    model: String,

    /// Directory holding the saved session and log file
    #[arg(long, global = true, env = "HOSPITOUR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive wizard (default)
    Wizard,

    /// Show where you are in the wizard
    Status,

    /// Show strengths and focus areas derived from your audits
    Insights,

    /// Update profile fields
    Profile {
        /// Full name
        #[arg(long)]
        name: Option<String>,

        /// MBTI personality type, e.g. "INTJ-A"
        #[arg(long)]
        mbti: Option<String>,

        /// Leadership style (Democratic, Authoritative, Coaching, Pacesetting, Affiliative, Coercive)
        #[arg(long)]
        leadership: Option<String>,

        /// 5-year career goal
        #[arg(long)]
        goal: Option<String>,

        /// Why this career goal
        #[arg(long)]
        reason: Option<String>,
    },

    /// Manage plan objectives
    Goals {
        #[command(subcommand)]
        command: GoalCommands,
    },

    /// Generate the development plan from the saved audits
    Generate,

    /// Answer the feedback survey and export the Word report
    Export {
        /// Directory to write the report to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Survey answers as a JSON file (prompted on stdin if omitted)
        #[arg(short, long)]
        survey: Option<PathBuf>,
    },

    /// Erase all saved progress
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// List objectives
    List,

    /// Show an objective in full
    Show {
        /// Objective number or ID
        goal: String,
    },

    /// Add a new objective
    Add {
        /// Skill the objective develops
        #[arg(short, long)]
        skill: Option<String>,

        /// Planned activity
        #[arg(short, long)]
        activity: Option<String>,
    },

    /// Change one field of an objective
    Set {
        /// Objective number or ID
        goal: String,

        /// Field (skill, type, activity, resources, criteria, date, rationale)
        field: String,

        /// New value
        value: String,
    },

    /// Toggle an objective between complete and pending
    Complete {
        /// Objective number or ID
        goal: String,
    },

    /// Delete an objective
    Delete {
        /// Objective number or ID
        goal: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Ask the AI coach to check an objective against SMART criteria
    Evaluate {
        /// Objective number or ID
        goal: String,
    },

    /// Ask the AI coach for feedback on the whole plan
    Review,
}

fn init_logging(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    let log_path = data_dir.join("hospitour.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(store::default_data_dir);
    init_logging(&data_dir)?;

    let store = Store::open(Some(&data_dir))?;
    let gateway = Gateway::from_model(&cli.model)?;
    let report_dir = match &cli.command {
        Some(Commands::Export { output, .. }) => output.clone(),
        _ => PathBuf::from("."),
    };
    let mut app = App::new(store, gateway, report_dir);

    match cli.command.unwrap_or(Commands::Wizard) {
        Commands::Wizard => {
            tracing::info!(model = %cli.model, "Starting wizard");
            tui::run_wizard(&mut app)?;
        }

        Commands::Status => print_status(&app),

        Commands::Insights => {
            let insights = app.wizard.insights();
            println!("Strengths:");
            for s in &insights.strengths {
                println!("  + {}", s);
            }
            println!("\nFocus areas:");
            if insights.focus_areas.is_empty() {
                println!("  (none)");
            }
            for s in &insights.focus_areas {
                println!("  - {}", s);
            }
        }

        Commands::Profile {
            name,
            mbti,
            leadership,
            goal,
            reason,
        } => {
            let mut updates: Vec<(ProfileField, String)> = Vec::new();
            if let Some(name) = name {
                updates.push((ProfileField::Name, name));
            }
            if let Some(mbti) = mbti {
                let resolved = resolve_choice(&mbti, &MBTI_TYPES)
                    .ok_or_else(|| anyhow!("Unknown MBTI type '{}'", mbti))?;
                updates.push((ProfileField::Mbti, resolved.to_string()));
            }
            if let Some(style) = leadership {
                let resolved = resolve_choice(&style, &LEADERSHIP_STYLES)
                    .ok_or_else(|| anyhow!("Unknown leadership style '{}'. Options: {}", style, LEADERSHIP_STYLES.join(", ")))?;
                updates.push((ProfileField::LeadershipStyle, resolved.to_string()));
            }
            if let Some(goal) = goal {
                updates.push((ProfileField::CareerGoal, goal));
            }
            if let Some(reason) = reason {
                updates.push((ProfileField::CareerReason, reason));
            }

            if updates.is_empty() {
                let profile = &app.wizard.session.profile;
                for field in ProfileField::ALL {
                    println!("{:<22} {}", format!("{}:", field.label()), profile.get(field));
                }
            } else {
                for (field, value) in updates {
                    println!("{}: {}", field.label(), value);
                    app.dispatch_inline(Event::SetProfile(field, value));
                }
                fail_on_error(&app)?;
            }
        }

        Commands::Goals { command } => run_goal_command(&mut app, command)?,

        Commands::Generate => {
            app.dispatch_inline(Event::JumpTo(Step::Profile));
            while app.wizard.current_step != Step::Swot {
                let before = app.wizard.current_step;
                app.dispatch_inline(Event::Next);
                fail_on_error(&app)?;
                if app.wizard.current_step == before {
                    bail!("Could not reach the SWOT step");
                }
            }

            println!("Generating your development plan with {}...", cli.model);
            app.dispatch_inline(Event::GeneratePdp);
            fail_on_error(&app)?;

            if let Some(pdp) = &app.wizard.session.pdp_result {
                println!("\n{}\n", textwrap::fill(&pdp.introduction, 78));
            }
            print_goal_table(app.wizard.goals());
        }

        Commands::Export { output, survey } => {
            if app.wizard.session.pdp_result.is_none() {
                bail!("No development plan yet. Run `hospitour generate` first.");
            }
            let answers = match survey {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read survey file: {}", path.display()))?;
                    serde_json::from_str::<SurveyData>(&raw)
                        .with_context(|| format!("Invalid survey file: {}", path.display()))?
                }
                None => prompt_survey()?,
            };

            if app.wizard.current_step == Step::Results {
                app.dispatch_inline(Event::Next);
            }
            app.dispatch_inline(Event::SubmitSurvey(answers));
            fail_on_error(&app)?;
            match &app.wizard.notice {
                Some(notice) => println!("{}", notice),
                None => println!("Report written to {}", output.display()),
            }
        }

        Commands::Reset { yes } => {
            if !yes && !confirm("Reset all progress? This cannot be undone.")? {
                println!("Cancelled.");
                return Ok(());
            }
            app.dispatch_inline(Event::RequestReset);
            app.dispatch_inline(Event::Confirm);
            fail_on_error(&app)?;
            println!("All progress has been reset.");
        }
    }

    Ok(())
}

fn run_goal_command(app: &mut App, command: GoalCommands) -> Result<()> {
    match command {
        GoalCommands::List => {
            if app.wizard.goals().is_empty() {
                println!("No objectives yet. Run `hospitour generate` to create a plan.");
            } else {
                print_goal_table(app.wizard.goals());
            }
        }

        GoalCommands::Show { goal } => {
            let id = find_goal(app, &goal)?;
            let goal = app
                .wizard
                .goal(&id)
                .ok_or_else(|| anyhow!("Objective '{}' not found", id))?;
            println!("Objective {}", goal.id);
            for field in GoalField::ALL {
                println!("{:<18} {}", format!("{}:", field.label()), goal.get(field));
            }
            println!("{:<18} {}", "Status:", if goal.is_completed() { "Complete" } else { "Pending" });
            if let Some(feedback) = &goal.feedback {
                println!("\n--- AI Coach ({}/100, {}) ---", feedback.score, if feedback.is_smart { "SMART" } else { "not yet SMART" });
                println!("{}", textwrap::fill(&feedback.critique, 78));
                println!("{}", textwrap::fill(&feedback.suggestions, 78));
            }
        }

        GoalCommands::Add { skill, activity } => {
            app.dispatch_inline(Event::AddGoal);
            fail_on_error(app)?;
            let id = app
                .wizard
                .goals()
                .last()
                .map(|g| g.id.clone())
                .ok_or_else(|| anyhow!("Objective was not added"))?;
            for (field, value) in [(GoalField::Skill, skill), (GoalField::Activity, activity)] {
                if let Some(value) = value {
                    app.dispatch_inline(Event::UpdateGoal { id: id.clone(), field, value });
                }
            }
            fail_on_error(app)?;
            println!("Added objective {}", id);
        }

        GoalCommands::Set { goal, field, value } => {
            let id = find_goal(app, &goal)?;
            let field = GoalField::parse(&field).ok_or_else(|| {
                anyhow!(
                    "Unknown field '{}'. Options: skill, type, activity, resources, criteria, date, rationale",
                    field
                )
            })?;
            app.dispatch_inline(Event::UpdateGoal { id: id.clone(), field, value });
            fail_on_error(app)?;
            println!("Updated {} of objective {}", field.label(), id);
        }

        GoalCommands::Complete { goal } => {
            let id = find_goal(app, &goal)?;
            app.dispatch_inline(Event::ToggleGoalComplete(id.clone()));
            fail_on_error(app)?;
            let done = app.wizard.goal(&id).is_some_and(|g| g.is_completed());
            println!("Objective {} marked {}", id, if done { "complete" } else { "pending" });
        }

        GoalCommands::Delete { goal, yes } => {
            let id = find_goal(app, &goal)?;
            app.dispatch_inline(Event::RequestDeleteGoal(id.clone()));
            if yes || confirm(&format!("Delete objective {}?", id))? {
                app.dispatch_inline(Event::Confirm);
                fail_on_error(app)?;
                println!("Deleted objective {}", id);
            } else {
                app.dispatch_inline(Event::Cancel);
                println!("Cancelled.");
            }
        }

        GoalCommands::Evaluate { goal } => {
            let id = find_goal(app, &goal)?;
            println!("Asking the AI coach...");
            app.dispatch_inline(Event::RequestGoalEvaluation(id.clone()));
            fail_on_error(app)?;
            let feedback = app
                .wizard
                .goal(&id)
                .and_then(|g| g.feedback.as_ref())
                .ok_or_else(|| anyhow!("No feedback received"))?;
            println!("Score: {}/100 ({})", feedback.score, if feedback.is_smart { "SMART" } else { "not yet SMART" });
            println!("\n{}", textwrap::fill(&feedback.critique, 78));
            println!("\n{}", textwrap::fill(&feedback.suggestions, 78));
        }

        GoalCommands::Review => {
            if app.wizard.goals().is_empty() {
                bail!("No objectives to review.");
            }
            println!("Asking the AI coach...");
            app.dispatch_inline(Event::RequestPlanReview);
            if let Some(review) = &app.wizard.plan_review {
                println!("\n{}", textwrap::fill(review, 78));
            }
        }
    }
    Ok(())
}

fn print_status(app: &App) {
    let w = &app.wizard;
    let profile = &w.session.profile;

    println!("Current step: {}", w.current_step.label());
    let completed: Vec<&str> = w.session.completed_steps.iter().map(|s| s.label()).collect();
    println!("Completed:    {}", completed.join(", "));
    println!();
    println!("Name:         {}", if profile.name.is_empty() { "-" } else { profile.name.as_str() });
    println!("Career goal:  {}", profile.career_goal);
    println!("MBTI:         {}", profile.mbti);
    println!("Leadership:   {}", profile.leadership_style);
    if let Some(pdp) = &w.session.pdp_result {
        let (done, total, pct) = pdp.progress();
        println!("Progress:     {}/{} objectives ({:.0}%)", done, total, pct);
    }
    println!();
    println!("AI model:     {}", app.gateway().model_name().unwrap_or("not configured"));
    println!("Saved at:     {}", app.store().path().display());
}

fn print_goal_table(goals: &[SmartGoal]) {
    println!("{:<3} {:<8} {:<11} {:<8} {:<28} {:<14}", "#", "ID", "TYPE", "STATUS", "SKILL", "TARGET");
    println!("{}", "-".repeat(76));
    for (i, goal) in goals.iter().enumerate() {
        println!(
            "{:<3} {:<8} {:<11} {:<8} {:<28} {:<14}",
            i + 1,
            goal.id,
            goal.goal_type.as_str(),
            if goal.is_completed() { "done" } else { "pending" },
            truncate(&goal.skill, 26),
            truncate(&goal.target_date, 14)
        );
    }
}

/// Resolve a 1-based objective number or an objective id.
fn find_goal(app: &App, key: &str) -> Result<String> {
    let goals = app.wizard.goals();
    if let Some(goal) = goals.iter().find(|g| g.id == key) {
        return Ok(goal.id.clone());
    }
    if let Ok(n) = key.parse::<usize>() {
        if let Some(goal) = n.checked_sub(1).and_then(|i| goals.get(i)) {
            return Ok(goal.id.clone());
        }
    }
    Err(anyhow!("Objective '{}' not found", key))
}

fn fail_on_error(app: &App) -> Result<()> {
    match &app.wizard.error {
        Some(error) => Err(anyhow!("{}", error)),
        None => Ok(()),
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn prompt_survey() -> Result<SurveyData> {
    let mut survey = SurveyData::default();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("Feedback survey (press Enter to keep the default shown in brackets)\n");
    for (i, question) in SURVEY_QUESTIONS.iter().enumerate() {
        let hint = match question.kind {
            AnswerKind::Rating => "1-5",
            AnswerKind::YesNo => "y/n",
            AnswerKind::Text => "text",
        };
        loop {
            print!("Q{}. {} ({}) [{}]: ", i + 1, question.prompt, hint, survey.answer(i));
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                return Ok(survey);
            };
            let line = line?;
            if line.trim().is_empty() {
                break;
            }
            match survey.set_answer(i, &line) {
                Ok(()) => break,
                Err(e) => println!("  {}", e),
            }
        }
    }
    Ok(survey)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
