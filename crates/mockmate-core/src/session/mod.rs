//! Session orchestration module.
//!
//! # Module Structure
//!
//! - `phase`: Phases, operation ids and terminal outcomes
//! - `event`: Events published to the presentation layer
//! - `attribution`: Which panelist asks a bound question
//! - `question_source`: Plan lookup and generator-backed questions
//! - `report`: Report requests and the quota fallback
//! - `machine`: The synchronous state machine (`SessionStateMachine`)
//! - `runner`: Async driver that executes machine effects (`SessionRunner`)
//!
//! # Usage
//!
//! ```ignore
//! use mockmate_core::session::{SessionRunner, SessionStateMachine, ReportRequester};
//!
//! let machine = SessionStateMachine::new(context, default_roster());
//! let runner = SessionRunner::new(machine, ReportRequester::new(primary))
//!     .with_question_source(ConversationalSource::new(generator));
//! runner.start().await?;
//! ```

mod attribution;
mod event;
mod machine;
mod phase;
mod question_source;
mod report;
mod runner;

pub use attribution::attribute;
pub use event::SessionEvent;
pub use machine::{Draft, PresentedQuestion, SessionEffect, SessionSnapshot, SessionStateMachine};
pub use phase::{
    AbortReason, OperationId, OperationKind, ReportChannel, SessionOutcome, SessionPhase,
};
pub use question_source::{ConversationalSource, PlanLookup, StructuredPlan};
pub use report::{DEFAULT_REPORT_TIMEOUT, ReportOutcome, ReportRequester};
pub use runner::SessionRunner;
