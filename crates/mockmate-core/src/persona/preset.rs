//! Default panel presets.
//!
//! Provides the built-in interviewer personas available to every rehearsal.

use super::model::{Persona, PersonaDomain, PersonaRoster};

/// Id of the Dev Lead preset; coding questions are attributed to this persona
/// whenever it sits on the panel.
pub const DEV_LEAD_ID: &str = "p2";

fn persona(
    id: &str,
    name: &str,
    title: &str,
    focus: &str,
    domains: &[PersonaDomain],
    blurb: &str,
) -> Persona {
    Persona {
        id: id.to_string(),
        name: name.to_string(),
        title: title.to_string(),
        focus: focus.to_string(),
        domains: domains.to_vec(),
        blurb: blurb.to_string(),
    }
}

/// Returns the official preset personas, in selection-screen order.
pub fn get_default_presets() -> Vec<Persona> {
    use PersonaDomain::*;

    vec![
        persona(
            "p1",
            "Asha",
            "Talent Acq. Manager",
            "Culture, Communication, STAR Method",
            &[General],
            "Assesses culture fit and communication.",
        ),
        persona(
            "s1",
            "Eleanor",
            "HR Director",
            "Compensation, Team Dynamics, Retention",
            &[General, Business],
            "Focuses on senior-level HR topics and organizational strategy.",
        ),
        persona(
            DEV_LEAD_ID,
            "Vikram",
            "Dev Lead",
            "Code, Systems Design, Tool Rigor",
            &[Tech],
            "Validates technical execution and tool knowledge.",
        ),
        persona(
            "s2",
            "Kenji",
            "Data Scientist",
            "Modeling, Statistics, Bias Detection",
            &[Tech],
            "Analyzes statistical rigor and modeling choices.",
        ),
        persona(
            "p3",
            "Maya",
            "Project/Ops Manager",
            "Risk, Timeline, Stakeholder Mgmt",
            &[Business, Tech],
            "Evaluates project ownership and business ROI.",
        ),
        persona(
            "s4",
            "Marcus",
            "Executive Sponsor",
            "Strategic Alignment, Vision, Budget",
            &[Business],
            "Connects responses to high-level business vision. Typically for senior/lead roles.",
        ),
        persona(
            "s6",
            "Chloe",
            "Marketing Lead",
            "Go-to-Market, Brand, User Acquisition",
            &[Business, Creative],
            "Evaluates market awareness and growth mindset.",
        ),
        persona(
            "s3",
            "Isabelle",
            "Domain Expert",
            "Compliance, Regulation, Subject Matter Depth",
            &[General],
            "Ensures deep subject matter expertise.",
        ),
        persona(
            "s5",
            "Dr. Ben Carter",
            "Clinical Supervisor",
            "Patient Care, Medical Ethics, Clinical Protocols",
            &[Healthcare],
            "Assesses clinical knowledge and patient empathy.",
        ),
    ]
}

/// Roster over [`get_default_presets`].
pub fn default_roster() -> PersonaRoster {
    PersonaRoster::new(get_default_presets())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn preset_ids_are_unique() {
        let presets = get_default_presets();
        let ids: HashSet<_> = presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), presets.len());
    }

    #[test]
    fn roster_labels_by_id() {
        let roster = default_roster();
        assert_eq!(roster.label_for("p1"), "Asha — Talent Acq. Manager");
        assert_eq!(roster.label_for(DEV_LEAD_ID), "Vikram — Dev Lead");
        assert_eq!(roster.label_for("Interviewer"), "Interviewer");
    }

    #[test]
    fn roster_filters_by_domain() {
        let roster = default_roster();
        let tech: Vec<_> = roster
            .for_domain(PersonaDomain::Tech)
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(tech, vec!["p2", "s2", "p3"]);
    }
}
