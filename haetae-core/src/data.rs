//! Static narrative content and its per-persona selection rules.
//!
//! Incidents and notices combine persona-authored records with the global
//! pool; messages, approvals, schedules, and inspections are persona-only
//! with an ordinary fallback for synthesized agents. Segwang mode swaps in
//! its own substitute datasets. All of this is immutable base content:
//! session mutation never touches it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agent::Agent;
use crate::records::{
    ApprovalDocument, Equipment, Incident, InspectionRequest, Message, Notification, Schedule,
    VisitLocation,
};

/// Content authored for a single persona (or the ordinary fallback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PersonaContent {
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub approvals: Vec<ApprovalDocument>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub inspections: Vec<InspectionRequest>,
}

/// Content shared by every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GlobalContent {
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub locations: Vec<VisitLocation>,
}

/// Substitute datasets for the corrupted continuity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SegwangContent {
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub approvals: Vec<ApprovalDocument>,
}

/// Container for all static narrative data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NarrativeData {
    #[serde(default)]
    pub global: GlobalContent,
    #[serde(default)]
    pub ordinary: PersonaContent,
    #[serde(default)]
    pub personas: HashMap<String, PersonaContent>,
    #[serde(default)]
    pub segwang: SegwangContent,
}

impl NarrativeData {
    /// Create empty narrative data (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load narrative data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The dataset shipped with the crate.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static DATA: Lazy<NarrativeData> = Lazy::new(|| {
            NarrativeData::from_json(include_str!("../assets/narrative.json"))
                .expect("bundled narrative data parses")
        });
        &DATA
    }

    fn persona_content(&self, agent: &Agent) -> &PersonaContent {
        agent
            .persona_key()
            .and_then(|key| self.personas.get(key))
            .unwrap_or(&self.ordinary)
    }

    /// Persona incidents ahead of the global pool.
    #[must_use]
    pub fn incidents_for(&self, agent: &Agent) -> Vec<Incident> {
        let persona = self.persona_content(agent);
        persona
            .incidents
            .iter()
            .chain(self.global.incidents.iter())
            .cloned()
            .collect()
    }

    /// Persona notices ahead of the global pool.
    #[must_use]
    pub fn notifications_for(&self, agent: &Agent) -> Vec<Notification> {
        let persona = self.persona_content(agent);
        persona
            .notifications
            .iter()
            .chain(self.global.notifications.iter())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn messages_for(&self, agent: &Agent) -> Vec<Message> {
        self.persona_content(agent).messages.clone()
    }

    #[must_use]
    pub fn approvals_for(&self, agent: &Agent) -> Vec<ApprovalDocument> {
        self.persona_content(agent).approvals.clone()
    }

    #[must_use]
    pub fn schedules_for(&self, agent: &Agent) -> Vec<Schedule> {
        self.persona_content(agent).schedules.clone()
    }

    #[must_use]
    pub fn inspections_for(&self, agent: &Agent) -> Vec<InspectionRequest> {
        self.persona_content(agent).inspections.clone()
    }

    #[must_use]
    pub fn equipment(&self) -> &[Equipment] {
        &self.global.equipment
    }

    #[must_use]
    pub fn locations(&self) -> &[VisitLocation] {
        &self.global.locations
    }

    #[must_use]
    pub fn equipment_by_id(&self, id: &str) -> Option<&Equipment> {
        self.global.equipment.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn location_by_id(&self, id: &str) -> Option<&VisitLocation> {
        self.global.locations.iter().find(|loc| loc.id == id)
    }
}
