mod command;
mod render;

use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mockmate_core::history::{HistoryRepository, SessionHistoryRecord};
use mockmate_core::interview::{SessionContext, SessionControls, SessionMode, SessionType};
use mockmate_core::persona::default_roster;
use mockmate_core::secret::SecretService;
use mockmate_core::session::{SessionOutcome, SessionPhase, SessionRunner, SessionSnapshot};
use mockmate_infrastructure::{
    ConfigService, JsonHistoryRepository, MockmatePaths, SecretServiceImpl,
};
use mockmate_interaction::MockmateServices;

use crate::command::{COMMANDS, Command, parse_panel};

type Repl = Editor<CliHelper, DefaultHistory>;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Daily rolling log file under `<config_dir>/logs/`. Defaults to
/// `mockmate=info`; `RUST_LOG` overrides.
fn init_logging(paths: &MockmatePaths) -> Result<WorkerGuard> {
    let logs_dir = paths.logs_dir()?;
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("creating log directory {}", logs_dir.display()))?;
    let appender = tracing_appender::rolling::daily(&logs_dir, "mockmate.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mockmate=info,mockmate_core=info,mockmate_interaction=info,mockmate_infrastructure=info".into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Ok(guard)
}

/// Reads one line; `None` on Ctrl-C or Ctrl-D.
fn ask(rl: &mut Repl, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn ask_or(rl: &mut Repl, prompt: &str, default: &str) -> Result<Option<String>> {
    Ok(ask(rl, prompt)?.map(|answer| {
        if answer.is_empty() {
            default.to_string()
        } else {
            answer
        }
    }))
}

/// Collects role, goal, session type, mode and panel, generating a plan
/// for structured sessions.
async fn build_context(rl: &mut Repl, services: &MockmateServices) -> Result<Option<SessionContext>> {
    let Some(intent) = ask(rl, "What are you preparing for? ")? else {
        return Ok(None);
    };

    let mut suggested_role = String::new();
    let mut suggested_panel = vec!["p1".to_string(), "p2".to_string()];
    if !intent.is_empty() {
        println!("{}", "Calibrating a panel for your goal...".bright_black());
        match services.interviewer().calibrate_intent(&intent).await {
            Ok(calibration) => {
                suggested_role = calibration.recommended_role;
                suggested_panel = calibration.recommended_panel_ids;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Intent calibration failed");
                println!("{}", format!("Calibration unavailable: {err}").yellow());
            }
        }
    }

    let role_prompt = if suggested_role.is_empty() {
        "Target role: ".to_string()
    } else {
        format!("Target role [{suggested_role}]: ")
    };
    let Some(role) = ask_or(rl, &role_prompt, &suggested_role)? else {
        return Ok(None);
    };
    if role.is_empty() {
        bail!("a target role is required");
    }

    let Some(kind) = ask_or(rl, "Session type, (s)tructured or (c)onversational [c]: ", "c")? else {
        return Ok(None);
    };
    let session_type = if kind.starts_with('s') {
        SessionType::Structured
    } else {
        SessionType::Conversational
    };

    let Some(mode) = ask_or(rl, "Mode, (e)xam or (c)oach [e]: ", "e")? else {
        return Ok(None);
    };
    let session_mode = if mode.starts_with('c') {
        SessionMode::Coach
    } else {
        SessionMode::Exam
    };

    println!("{}", "Available panelists:".bold());
    render::print_panel(services.roster());
    let default_panel = suggested_panel.join(",");
    let Some(panel) = ask_or(rl, &format!("Panel ids [{default_panel}]: "), &default_panel)? else {
        return Ok(None);
    };
    let panel: Vec<String> = parse_panel(&panel)
        .into_iter()
        .filter(|id| {
            let known = services.roster().contains(id);
            if !known {
                println!("{}", format!("Ignoring unknown panelist '{id}'").yellow());
            }
            known
        })
        .collect();

    let mut context = SessionContext::new(role.clone(), session_type, panel.clone())
        .with_intent(intent.clone())
        .with_mode(session_mode);
    context.validate()?;

    if session_type == SessionType::Structured {
        let Some(count) = ask_or(rl, "Number of questions [7]: ", "7")? else {
            return Ok(None);
        };
        let controls = SessionControls {
            total_questions: count.parse().unwrap_or(7).max(1),
            session_mode,
            ..SessionControls::default()
        };
        println!("{}", "Researching the role and building your plan...".bright_black());
        let goal = if intent.is_empty() { role.as_str() } else { intent.as_str() };
        let plan = services
            .interviewer()
            .generate_plan(goal, &role, None, controls, &panel)
            .await?;
        for link in &plan.research_links {
            println!("  {} {}", "source:".bright_black(), link.title);
        }
        context = context.with_plan(plan);
    }

    Ok(Some(context))
}

/// Drives one session until it reaches a terminal outcome or the user quits.
async fn run_session(rl: &mut Repl, runner: &SessionRunner) -> Result<Option<SessionOutcome>> {
    println!("{}", "Connecting to your panel...".bright_black());
    let mut snapshot = runner.start().await?;
    render::print_snapshot(&snapshot);

    loop {
        if let Some(outcome) = snapshot.outcome.clone() {
            return Ok(Some(outcome));
        }

        let Some(line) = ask(rl, ">> ")? else {
            println!("{}", "Leaving without a report.".bright_black());
            return Ok(None);
        };

        // Confirmation dialogs answer with a single letter.
        let result = match snapshot.phase {
            SessionPhase::ConfirmingSkip => match line.as_str() {
                "y" | "yes" => runner.confirm_skip().await,
                _ => runner.cancel_skip().await,
            },
            SessionPhase::ConfirmingExit => match line.as_str() {
                "r" => {
                    println!("{}", "Preparing your report...".bright_black());
                    runner.exit_with_report().await
                }
                "d" => runner.exit_and_discard().await,
                _ => runner.resume().await,
            },
            _ => {
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(&line);
                match dispatch(runner, command, &snapshot).await? {
                    Some(result) => result,
                    None => return Ok(None),
                }
            }
        };

        match result {
            Ok(next) => {
                snapshot = next;
                if snapshot.phase == SessionPhase::ReportPending {
                    println!("{}", "Preparing your report...".bright_black());
                }
                render::print_snapshot(&snapshot);
            }
            Err(err) => println!("{}", format!("Error: {err}").red()),
        }
    }
}

/// Runs `command`. `Ok(None)` means the user asked to quit.
async fn dispatch(
    runner: &SessionRunner,
    command: Command,
    snapshot: &SessionSnapshot,
) -> Result<Option<mockmate_core::Result<SessionSnapshot>>> {
    let result = match command {
        Command::Answer(text) => runner.capture_answer(&text).await,
        Command::Confirm => {
            let result = runner.confirm().await;
            if matches!(&result, Ok(s) if s.phase == SessionPhase::LoadingQuestion) {
                println!("{}", "Waiting for the next question...".bright_black());
            }
            result
        }
        Command::Redo => runner.discard().await,
        Command::Skip => runner.request_skip().await,
        Command::Exit => runner.request_exit().await,
        Command::Code(code) => {
            println!("{}", "Reviewing your code...".bright_black());
            runner.submit_code(&code).await
        }
        Command::Hint => {
            match runner.request_hint().await {
                Ok(hint) => println!("{} {}", "Hint:".bright_green(), hint),
                Err(err) => println!("{}", format!("No hint: {err}").yellow()),
            }
            return Ok(Some(Ok(snapshot.clone())));
        }
        Command::Status => {
            render::print_status(snapshot);
            return Ok(Some(Ok(snapshot.clone())));
        }
        Command::Help => {
            println!(
                "{}",
                "Type your answer, then /confirm or /redo. Also: /skip /exit /hint /code <text> /status /quit"
                    .bright_black()
            );
            return Ok(Some(Ok(snapshot.clone())));
        }
        Command::Quit => return Ok(None),
        Command::Unknown(name) => {
            println!("{}", format!("Unknown command {name}. Try /help.").bright_black());
            return Ok(Some(Ok(snapshot.clone())));
        }
    };
    Ok(Some(result))
}

/// The entry point for the MockMate rehearsal REPL.
///
/// 1. Loads configuration and secrets from `~/.config/mockmate/`
/// 2. Collects the session setup and, for structured sessions, a plan
/// 3. Runs the interview loop on top of `SessionRunner`
/// 4. Prints the report and appends a summary to the session history
#[tokio::main]
async fn main() -> Result<()> {
    let paths = MockmatePaths::default();
    let _log_guard = init_logging(&paths)?;

    let config = ConfigService::new(&paths)?.get_config()?;
    let secrets = SecretServiceImpl::new(&paths)?.load_secrets().await?;
    let services = match MockmateServices::from_config(&config, &secrets, default_roster()) {
        Ok(services) => services,
        Err(err) => {
            let secret_path = paths.ensure_secret_file()?;
            eprintln!("{}", format!("{err}").red());
            eprintln!(
                "{}",
                format!(
                    "Add your Gemini API key to {} or set GEMINI_API_KEY.",
                    secret_path.display()
                )
                .bright_black()
            );
            return Ok(());
        }
    };
    let history = JsonHistoryRepository::new(&paths)?;

    let mut rl: Repl = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== MockMate ===".bright_magenta().bold());
    println!("{}", "Rehearse an interview with an AI panel. Ctrl-D leaves at any prompt.".bright_black());
    println!();

    let Some(context) = build_context(&mut rl, &services).await? else {
        println!("{}", "Goodbye!".bright_green());
        return Ok(());
    };
    let role = context.candidate_role.clone();
    let session_type = context.session_type;
    tracing::info!(%role, %session_type, panel = ?context.selected_panel_ids, "Starting rehearsal");

    let runner = services.session_runner(context);
    let Some(outcome) = run_session(&mut rl, &runner).await? else {
        println!("{}", "Goodbye!".bright_green());
        return Ok(());
    };

    render::print_outcome(&outcome);
    if let Some(report) = outcome.report() {
        let record = SessionHistoryRecord::from_report(report, &role, session_type);
        match history.append(record).await {
            Ok(()) => println!("{}", "Saved to your session history.".bright_black()),
            Err(err) => {
                tracing::warn!(error = %err, "Could not save session history");
                println!("{}", format!("History not saved: {err}").yellow());
            }
        }
    }

    Ok(())
}
