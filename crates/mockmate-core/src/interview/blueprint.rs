//! Question blueprints: one planned interview question each.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use strum::{Display, EnumString};

/// Interview phase a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionPhase {
    Knowledge,
    Process,
    Scenario,
    Behavioral,
    Coding,
}

/// Difficulty ladder, `L1` (recall) to `L5` (expert judgement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum Difficulty {
    L1,
    L2,
    L3,
    L4,
    L5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionKind {
    Recall,
    Concept,
    Process,
    Case,
    Roleplay,
    Algorithm,
}

/// Per-panelist relevance weights in declaration order.
///
/// Serialized as a JSON object (`{"p1": 0.7, "p2": 0.3}`); key order of the
/// source document is preserved because ties are broken by it. Weights are
/// clamped into `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaWeights(Vec<(String, f64)>);

impl PersonaWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a weight. A repeated id keeps its first position and takes
    /// the new weight.
    pub fn with(mut self, persona_id: impl Into<String>, weight: f64) -> Self {
        self.insert(persona_id.into(), weight);
        self
    }

    fn insert(&mut self, persona_id: String, weight: f64) {
        let weight = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self.0.iter_mut().find(|(id, _)| *id == persona_id) {
            Some(entry) => entry.1 = weight,
            None => self.0.push((persona_id, weight)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, w)| (id.as_str(), *w))
    }

    pub fn get(&self, persona_id: &str) -> Option<f64> {
        self.iter().find(|(id, _)| *id == persona_id).map(|(_, w)| w)
    }

    /// Highest-weighted persona among `panel`, first-declared on exact ties.
    ///
    /// Returns `None` when no weighted persona sits on the panel or every
    /// matching weight is zero.
    pub fn strongest_among<'a>(&'a self, panel: &[String]) -> Option<&'a str> {
        let mut best: Option<(&str, f64)> = None;
        for (id, weight) in self.iter() {
            if weight <= 0.0 || !panel.iter().any(|p| p == id) {
                continue;
            }
            match best {
                Some((_, top)) if weight <= top => {}
                _ => best = Some((id, weight)),
            }
        }
        best.map(|(id, _)| id)
    }
}

impl Serialize for PersonaWeights {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, weight) in &self.0 {
            map.serialize_entry(id, weight)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PersonaWeights {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeightsVisitor;

        impl<'de> Visitor<'de> for WeightsVisitor {
            type Value = PersonaWeights;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of persona id to weight")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut weights = PersonaWeights::new();
                while let Some((id, weight)) = access.next_entry::<String, f64>()? {
                    weights.insert(id, weight);
                }
                Ok(weights)
            }
        }

        deserializer.deserialize_map(WeightsVisitor)
    }
}

/// One planned question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBlueprint {
    pub id: String,
    pub phase: QuestionPhase,
    pub difficulty: Difficulty,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionKind>,
    pub question: String,
    #[serde(default)]
    pub expected_signals: Vec<String>,
    #[serde(default)]
    pub failure_modes: Vec<String>,
    #[serde(default)]
    pub persona_weights: PersonaWeights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_time_sec: Option<u32>,
}

impl QuestionBlueprint {
    pub fn new(
        id: impl Into<String>,
        phase: QuestionPhase,
        difficulty: Difficulty,
        question: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            phase,
            difficulty,
            kind: None,
            question: question.into(),
            expected_signals: Vec::new(),
            failure_modes: Vec::new(),
            persona_weights: PersonaWeights::new(),
            est_time_sec: None,
        }
    }

    pub fn with_weights(mut self, weights: PersonaWeights) -> Self {
        self.persona_weights = weights;
        self
    }

    pub fn with_expected_signals(mut self, signals: Vec<String>) -> Self {
        self.expected_signals = signals;
        self
    }

    pub fn is_coding(&self) -> bool {
        self.phase == QuestionPhase::Coding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn weights_keep_document_order() {
        let json = r#"{"s2": 0.4, "p1": 0.9, "p3": 0.4}"#;
        let weights: PersonaWeights = serde_json::from_str(json).unwrap();
        let ids: Vec<_> = weights.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["s2", "p1", "p3"]);

        let back = serde_json::to_string(&weights).unwrap();
        assert_eq!(back, r#"{"s2":0.4,"p1":0.9,"p3":0.4}"#);
    }

    #[test]
    fn strongest_prefers_highest_then_first_declared() {
        let weights = PersonaWeights::new()
            .with("p3", 0.5)
            .with("p1", 0.8)
            .with("s2", 0.8);
        assert_eq!(weights.strongest_among(&panel(&["p1", "s2", "p3"])), Some("p1"));
    }

    #[test]
    fn strongest_ignores_personas_off_the_panel() {
        let weights = PersonaWeights::new().with("s4", 1.0).with("p3", 0.2);
        assert_eq!(weights.strongest_among(&panel(&["p1", "p3"])), Some("p3"));
        assert_eq!(weights.strongest_among(&panel(&["p1"])), None);
    }

    #[test]
    fn all_zero_weights_have_no_winner() {
        let weights = PersonaWeights::new().with("p1", 0.0).with("p2", 0.0);
        assert_eq!(weights.strongest_among(&panel(&["p1", "p2"])), None);
    }

    #[test]
    fn weights_are_clamped() {
        let weights = PersonaWeights::new().with("p1", 3.0).with("p2", -1.0);
        assert_eq!(weights.get("p1"), Some(1.0));
        assert_eq!(weights.get("p2"), Some(0.0));
    }

    #[test]
    fn blueprint_parses_plan_json() {
        let json = r#"{
            "id": "q-7",
            "phase": "coding",
            "difficulty": "L3",
            "type": "algorithm",
            "question": "Reverse a linked list.",
            "expectedSignals": ["pointer handling"],
            "personaWeights": {"p2": 1.0},
            "estTimeSec": 300,
            "rubric": {}
        }"#;
        let bp: QuestionBlueprint = serde_json::from_str(json).unwrap();
        assert!(bp.is_coding());
        assert_eq!(bp.kind, Some(QuestionKind::Algorithm));
        assert_eq!(bp.difficulty, Difficulty::L3);
        assert_eq!(bp.est_time_sec, Some(300));
        assert_eq!(bp.phase.to_string(), "coding");
    }
}
