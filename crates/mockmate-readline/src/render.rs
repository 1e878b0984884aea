//! Terminal rendering of session state and reports.

use colored::Colorize;
use mockmate_core::interview::FinalReport;
use mockmate_core::persona::PersonaRoster;
use mockmate_core::session::{SessionOutcome, SessionPhase, SessionSnapshot};

pub fn print_panel(roster: &PersonaRoster) {
    for persona in roster.all() {
        println!(
            "  {} {} {}",
            format!("{:>3}", persona.id).bright_cyan(),
            persona.display_label().bold(),
            format!("- {}", persona.blurb).bright_black()
        );
    }
}

/// Prints whatever the candidate needs to act on in `snapshot`.
pub fn print_snapshot(snapshot: &SessionSnapshot) {
    match snapshot.phase {
        SessionPhase::Presenting => {
            if let (Some(question), Some(interviewer)) = (&snapshot.question, &snapshot.interviewer)
            {
                println!();
                println!(
                    "{}",
                    format!(
                        "[{}/{}] {}",
                        snapshot.turns_recorded + 1,
                        snapshot.total_questions,
                        interviewer
                    )
                    .bright_magenta()
                );
                for line in question.lines() {
                    println!("{}", line.bright_blue());
                }
            }
        }
        SessionPhase::Reviewing => {
            if let Some(draft) = &snapshot.draft {
                println!("{}", "Your answer:".bright_yellow());
                for line in draft.response.lines() {
                    println!("  {line}");
                }
                if let Some(feedback) = &draft.code_feedback {
                    println!("{}", "Code review:".bright_yellow());
                    for line in feedback.lines() {
                        println!("  {}", line.bright_black());
                    }
                }
                println!("{}", "Type /confirm to submit or /redo to answer again.".bright_black());
            }
        }
        SessionPhase::ConfirmingSkip => {
            println!("{}", "Skip this question? It is recorded as skipped. (y/n)".bright_yellow());
        }
        SessionPhase::ConfirmingExit => {
            println!(
                "{}",
                "Leave the interview? (r) report on answers so far, (d) discard, (c) continue"
                    .bright_yellow()
            );
        }
        _ => {}
    }
}

pub fn print_status(snapshot: &SessionSnapshot) {
    println!(
        "{} {}  {} {}/{}  {} {}",
        "phase:".bright_black(),
        snapshot.phase,
        "answered:".bright_black(),
        snapshot.turns_recorded,
        snapshot.total_questions,
        "session:".bright_black(),
        snapshot.session_id
    );
}

pub fn print_outcome(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Completed { report, channel } => {
            println!();
            println!("{}", format!("=== Interview report ({channel}) ===").bright_magenta().bold());
            print_report(report);
        }
        SessionOutcome::Aborted { reason } => {
            println!("{}", format!("Session ended: {reason}").yellow());
        }
    }
}

fn print_report(report: &FinalReport) {
    println!("{}", report.overall_summary);

    if let Some(readiness) = &report.readiness {
        println!();
        println!("{} {}", "Readiness:".bold(), readiness.status.bright_green());
        if !readiness.reasoning.is_empty() {
            println!("  {}", readiness.reasoning.bright_black());
        }
    }
    if let Some(score) = report.average_score() {
        println!("{} {:.1}/5", "Average score:".bold(), score);
    }

    for advisor in &report.advisory_panel {
        println!();
        println!("{}", advisor.persona.bright_cyan());
        if !advisor.summary.is_empty() {
            println!("  {}", advisor.summary);
        }
        for score in &advisor.scores {
            println!("  {:<32} {:.1}", score.skill, score.score);
        }
    }

    println!();
    println!("{}", "Question by question".bold());
    for (index, entry) in report.question_performance.iter().enumerate() {
        println!("{}", format!("Q{}. {}", index + 1, entry.question_text).bright_blue());
        println!("  {} {}", "You:".bright_black(), entry.user_transcript);
        if !entry.feedback.is_empty() {
            println!("  {} {}", "Feedback:".bright_black(), entry.feedback);
        }
        if !entry.max_impact_response.is_empty() {
            println!("  {} {}", "Stronger answer:".bright_black(), entry.max_impact_response);
        }
    }

    if let Some(risk) = &report.biggest_risk_area {
        println!();
        println!("{} {}", "Biggest risk:".bold(), risk.title.red());
        if let Some(mitigation) = &risk.mitigation {
            println!("  {} {}", "Mitigation:".bright_black(), mitigation);
        }
    }

    let redo = &report.coach_pack.redo_now;
    if !redo.question.is_empty() {
        println!();
        println!("{} {}", "Redo now:".bold(), redo.question);
        println!("  {}", redo.instruction.bright_black());
    }
    for drill in &report.coach_pack.micro_drills {
        println!("  {} {}: {}", "Drill".bright_cyan(), drill.weakness, drill.drill_prompt);
    }
}
