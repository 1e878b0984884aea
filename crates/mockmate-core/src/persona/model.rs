//! Panel persona domain model.
//!
//! Represents the interviewers that can sit on a rehearsal panel. Personas are
//! always referenced by their stable `id`; the display label is derived from
//! the record and never parsed back into an identity.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad domain a persona is suited for.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum PersonaDomain {
    General,
    Tech,
    Business,
    Healthcare,
    Creative,
}

/// An interviewer persona on the rehearsal panel.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Persona {
    /// Stable identifier (e.g. `p1`, `s3`)
    pub id: String,
    /// Display name of the persona
    pub name: String,
    /// Job title shown next to the name
    pub title: String,
    /// Topics this persona probes
    pub focus: String,
    /// Domains this persona is relevant for
    #[serde(default)]
    pub domains: Vec<PersonaDomain>,
    /// One-line description for panel selection
    #[serde(default)]
    pub blurb: String,
}

impl Persona {
    /// Label shown to the candidate, e.g. `Asha — Talent Acq. Manager`.
    pub fn display_label(&self) -> String {
        format!("{} — {}", self.name, self.title)
    }
}

/// Typed lookup over the known personas.
#[derive(Debug, Clone, Default)]
pub struct PersonaRoster {
    personas: Vec<Persona>,
}

impl PersonaRoster {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Display label for `id`, falling back to the raw id for unknown
    /// interviewers (e.g. a generic "Interviewer" returned by a generator).
    pub fn label_for(&self, id: &str) -> String {
        self.get(id)
            .map(Persona::display_label)
            .unwrap_or_else(|| id.to_string())
    }

    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    /// Personas applicable to `domain`, in roster order.
    pub fn for_domain(&self, domain: PersonaDomain) -> Vec<&Persona> {
        self.personas
            .iter()
            .filter(|p| p.domains.contains(&domain))
            .collect()
    }
}
