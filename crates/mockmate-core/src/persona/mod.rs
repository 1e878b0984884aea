//! Persona domain module.
//!
//! # Module Structure
//!
//! - `model`: Panel persona model (`Persona`, `PersonaDomain`) and the typed
//!   `PersonaRoster` lookup
//! - `preset`: Built-in interviewer personas
//!
//! # Usage
//!
//! ```ignore
//! use mockmate_core::persona::{default_roster, Persona, PersonaRoster};
//! ```

mod model;
mod preset;

// Re-export public API
pub use model::{Persona, PersonaDomain, PersonaRoster};
pub use preset::{DEV_LEAD_ID, default_roster, get_default_presets};
