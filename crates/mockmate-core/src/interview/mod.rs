//! Interview domain module.
//!
//! # Module Structure
//!
//! - `context`: Per-session configuration (`SessionContext`, `InterviewPlan`, `SessionControls`)
//! - `blueprint`: Planned questions (`QuestionBlueprint`, `PersonaWeights`)
//! - `turn`: Confirmed exchanges and the append-only `Transcript`
//! - `report`: The synthesized `FinalReport`

mod blueprint;
mod context;
mod report;
mod turn;

pub use blueprint::{Difficulty, PersonaWeights, QuestionBlueprint, QuestionKind, QuestionPhase};
pub use context::{
    DEFAULT_TOTAL_QUESTIONS, InterviewPlan, PhaseMix, PlanDifficulty, PlanMeta, PlanMode,
    ResearchLink, SessionContext, SessionControls, SessionMode, SessionType, TimePerQuestion,
};
pub use report::{
    AdvisorAssessment, Bars, CoachPack, FinalReport, MicroDrill, QuestionPerformance, Readiness,
    RedoNow, RiskArea, SkillScore,
};
pub use turn::{InterviewTurn, SKIPPED_SENTINEL, Transcript};
