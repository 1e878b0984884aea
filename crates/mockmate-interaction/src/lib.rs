//! Remote service adapters for MockMate.
//!
//! Implements the service traits of `mockmate-core` over the Gemini REST API
//! and the authenticated report backend.

pub mod backend_report_client;
pub mod gemini_api_agent;
pub mod gemini_interviewer;
pub mod prompts;
pub mod report_synthesizer;
pub mod response;
pub mod services;

pub use backend_report_client::BackendReportClient;
pub use gemini_api_agent::{GeminiApiAgent, GeminiReply};
pub use gemini_interviewer::{GeminiInterviewer, IntentCalibration};
pub use report_synthesizer::GeminiReportSynthesizer;
pub use services::MockmateServices;
