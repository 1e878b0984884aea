//! Prompt templates for the Gemini-backed services.

use minijinja::{Environment, Value};
use mockmate_core::error::{MockmateError, Result};
use once_cell::sync::Lazy;

pub const OPENING: &str = "opening";
pub const FOLLOWUP: &str = "followup";
pub const HINT: &str = "hint";
pub const CODE_REVIEW: &str = "code_review";
pub const TRANSCRIBE: &str = "transcribe";
pub const REPORT: &str = "report";
pub const CALIBRATE: &str = "calibrate";
pub const PLAN: &str = "plan";

/// Reply a generator gives when it has nothing further to ask.
pub const END_OF_INTERVIEW: &str = "END_OF_INTERVIEW";

const OPENING_TEMPLATE: &str = r#"You are {{ interviewer.name }}, {{ interviewer.title }}, opening a professional mock interview for the role: {{ role }}.
{% if intent %}Candidate's goal: {{ intent }}
{% endif %}{% if company_brief %}Company context: {{ company_brief }}
{% endif %}Your focus: {{ interviewer.focus }}
Greet the candidate in one sentence and ask the first question. Reply with the greeting and question only."#;

const FOLLOWUP_TEMPLATE: &str = r#"You are {{ interviewer.name }}, {{ interviewer.title }}, on a mock interview panel for the role: {{ role }}.
Your focus: {{ interviewer.focus }}
{% if company_brief %}Company context: {{ company_brief }}
{% endif %}Conversation so far:
{% for turn in transcript %}Q ({{ turn.interviewer }}): {{ turn.question }}
A: {{ turn.candidateResponse }}
{% endfor %}
Ask the next logical interview question. Build on the candidate's previous answers and do not repeat a question.
If the interview has covered enough ground, reply with exactly {{ end_marker }}.
Reply with the question only."#;

const HINT_TEMPLATE: &str = r#"Provide a subtle hint for the following interview question: "{{ question }}".
{% if signals %}The candidate should ideally address: {{ signals | join(", ") }}.
{% endif %}Keep it cryptic but helpful, in at most two sentences."#;

const CODE_REVIEW_TEMPLATE: &str = r#"Perform a technical code review of the candidate's solution for a {{ role }} interview.
Question: {{ question }}
Solution:
{{ code }}
Comment on correctness, complexity and readability in a short paragraph."#;

const TRANSCRIBE_TEMPLATE: &str = "Transcribe the audio exactly. Reply with the transcription only.";

const REPORT_TEMPLATE: &str = r#"You are a world-class interview panel analyzing a mock interview for: {{ role }}.
Context: {{ company_brief or "N/A" }}
Panel: {{ panel | join(", ") }}
Transcript:
{% for turn in transcript %}Q{{ loop.index }} ({{ turn.interviewer }}): {{ turn.question }}
A: {{ turn.candidateResponse }}
{% endfor %}
Answers recorded as [SKIPPED] were skipped by the candidate.
Return a JSON object with the keys overallSummary, readiness {status: READY|ALMOST_READY|NOT_READY, reasoning},
advisoryPanel [{persona, summary, scores [{skill, score 1-5}]}],
questionPerformance (exactly one entry per transcript question, in order) [{question_text, question_phase, user_transcript, max_impact_response, feedback}],
biggestRiskArea {title, observation, consequence, mitigation},
coachPack {title, redoNow {question, instruction}, micro_drills [{weakness, drill_prompt, focus_point}]}.
Copy each answer verbatim into user_transcript."#;

const CALIBRATE_TEMPLATE: &str = r#"Analyze this interview rehearsal goal: "{{ intent }}".
Available panelists:
{% for persona in personas %}- {{ persona.id }}: {{ persona.name }}, {{ persona.title }} ({{ persona.focus }})
{% endfor %}
Return JSON: {"recommendedPanelIDs": string[], "recommendedRole": string}. Choose two to four panelists by id."#;

const PLAN_TEMPLATE: &str = r#"Build a comprehensive interview plan for: {{ intent }}.
Target role: {{ role }}
{% if jd_text %}Job description:
{{ jd_text }}
{% endif %}Panel ids: {{ panel | join(", ") }}
Total questions: {{ controls.totalQuestions }}, difficulty: {{ controls.difficulty }}, include behavioral: {{ controls.includeBehavioral }}, include coding: {{ controls.includeCoding }}.
Return JSON with keys meta, questionSet and orderingNotes. Each questionSet entry has id, phase (knowledge|process|scenario|behavioral|coding),
difficulty (L1-L5), type, question, expectedSignals, failureModes and personaWeights (panel id to weight between 0 and 1)."#;

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    for (name, source) in [
        (OPENING, OPENING_TEMPLATE),
        (FOLLOWUP, FOLLOWUP_TEMPLATE),
        (HINT, HINT_TEMPLATE),
        (CODE_REVIEW, CODE_REVIEW_TEMPLATE),
        (TRANSCRIBE, TRANSCRIBE_TEMPLATE),
        (REPORT, REPORT_TEMPLATE),
        (CALIBRATE, CALIBRATE_TEMPLATE),
        (PLAN, PLAN_TEMPLATE),
    ] {
        if let Err(err) = env.add_template(name, source) {
            tracing::error!(template = name, error = %err, "Invalid prompt template");
        }
    }
    env
});

/// Renders the named template with `ctx`.
pub fn render(name: &str, ctx: Value) -> Result<String> {
    let template = ENV
        .get_template(name)
        .map_err(|e| MockmateError::internal(format!("prompt template '{name}': {e}")))?;
    template
        .render(ctx)
        .map_err(|e| MockmateError::internal(format!("rendering prompt '{name}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use mockmate_core::interview::InterviewTurn;

    #[test]
    fn every_template_is_registered() {
        for name in [OPENING, FOLLOWUP, HINT, CODE_REVIEW, TRANSCRIBE, REPORT, CALIBRATE, PLAN] {
            assert!(ENV.get_template(name).is_ok(), "missing template {name}");
        }
    }

    #[test]
    fn hint_mentions_signals_only_when_present() {
        let with = render(
            HINT,
            context! { question => "Design a cache", signals => vec!["eviction", "TTL"] },
        )
        .unwrap();
        assert!(with.contains("eviction, TTL"));

        let without = render(
            HINT,
            context! { question => "Design a cache", signals => Vec::<String>::new() },
        )
        .unwrap();
        assert!(!without.contains("ideally address"));
    }

    #[test]
    fn report_prompt_lists_turns_in_order() {
        let turns = vec![
            InterviewTurn::answered("p1", "Asha", "Q one", "A one"),
            InterviewTurn::skipped("p2", "Vikram", "Q two"),
        ];
        let prompt = render(
            REPORT,
            context! { role => "SRE", company_brief => None::<String>, panel => vec!["p1", "p2"], transcript => turns },
        )
        .unwrap();
        let first = prompt.find("Q1 (Asha): Q one").unwrap();
        let second = prompt.find("Q2 (Vikram): Q two").unwrap();
        assert!(first < second);
        assert!(prompt.contains("A: [SKIPPED]"));
        assert!(prompt.contains("Context: N/A"));
    }
}
