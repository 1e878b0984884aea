//! Interviewer attribution for bound questions.

use crate::interview::{QuestionBlueprint, SessionContext};
use crate::persona::DEV_LEAD_ID;

/// Picks the panelist who asks `blueprint`.
///
/// Coding questions go to the Dev Lead when that persona is on the panel.
/// Otherwise the highest weight among selected panelists wins, with ties
/// going to the first declared weight. Without a usable weight the lead
/// panelist asks.
pub fn attribute<'a>(
    blueprint: Option<&'a QuestionBlueprint>,
    context: &'a SessionContext,
) -> Option<&'a str> {
    let panel = &context.selected_panel_ids;

    if let Some(bp) = blueprint {
        if bp.is_coding()
            && let Some(dev_lead) = panel.iter().find(|id| id.as_str() == DEV_LEAD_ID)
        {
            return Some(dev_lead.as_str());
        }
        if let Some(id) = bp.persona_weights.strongest_among(panel) {
            return Some(id);
        }
    }

    context.lead_panelist()
}
