//! Trigger conditions and the engine that decides whether narrative
//! events are currently active.
//!
//! `check` is a pure predicate over the condition variants; the temporal
//! variants (`Login`, `TimeElapsed`, `ButtonClick`, `PageVisit`) pass
//! unconditionally here because their gating is realized by a caller-side
//! timer or event hook, not by this engine. One-shot delivery is enforced
//! through the triggered-id set: an id fires at most once per session.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agent::Agent;

/// Declarative trigger condition, tagged by `type` in stored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TriggerCondition {
    #[serde(rename = "login")]
    Login,
    #[serde(rename = "time-elapsed")]
    TimeElapsed { delay_ms: u64 },
    #[serde(rename = "date-range")]
    DateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[serde(rename = "random")]
    Random { probability: f64 },
    #[serde(rename = "button-click")]
    ButtonClick { target: String },
    #[serde(rename = "page-visit")]
    PageVisit { target: String },
    #[serde(rename = "condition")]
    Custom { key: String },
}

/// Who an interaction is addressed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipient {
    Many(Vec<String>),
    One(String),
}

impl Recipient {
    /// The source data uses the literal string `"all"` for broadcasts.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::One(id) if id == "all")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Message,
    Note,
    Approval,
    Notification,
    EasterEgg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionPriority {
    High,
    #[default]
    Normal,
    Low,
}

/// A narrative payload bound to a trigger condition and a recipient spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub kind: InteractionKind,
    pub from: String,
    pub to: Recipient,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    pub trigger: TriggerCondition,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: InteractionPriority,
}

type CustomPredicate = Box<dyn Fn() -> bool>;

/// Owns the session's triggered-id and read-id sets plus the per-id fire
/// timestamps, and evaluates trigger conditions.
///
/// The id sets are insertion-ordered and deduplicated; they only grow for
/// the lifetime of the session. Fire timestamps are session-memory only:
/// a reload keeps the ids but loses the fresh timestamps, matching the
/// tab-scoped lifetime of the rest of the narrative state.
#[derive(Default)]
pub struct TriggerEngine {
    triggered: Vec<String>,
    read: Vec<String>,
    fired_at: HashMap<String, DateTime<Utc>>,
    conditions: HashMap<String, CustomPredicate>,
}

impl TriggerEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the engine from persisted id sets (page reload path).
    #[must_use]
    pub fn from_parts(triggered: Vec<String>, read: Vec<String>) -> Self {
        Self {
            triggered,
            read,
            ..Self::default()
        }
    }

    /// Evaluate a condition. `Random` draws fresh entropy on every call;
    /// repeated evaluations are independent, never memoized.
    pub fn check(
        &self,
        condition: &TriggerCondition,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> bool {
        match condition {
            TriggerCondition::DateRange { start, end } => *start <= now && now <= *end,
            TriggerCondition::Random { probability } => rng.r#gen::<f64>() < *probability,
            TriggerCondition::Custom { key } => {
                self.conditions.get(key).is_some_and(|predicate| predicate())
            }
            // Gated by caller-side timers or event hooks.
            TriggerCondition::Login
            | TriggerCondition::TimeElapsed { .. }
            | TriggerCondition::ButtonClick { .. }
            | TriggerCondition::PageVisit { .. } => true,
        }
    }

    /// Register the predicate behind a `Custom { key }` condition.
    /// Unregistered keys evaluate to false.
    pub fn register_condition(&mut self, key: impl Into<String>, predicate: CustomPredicate) {
        self.conditions.insert(key.into(), predicate);
    }

    #[must_use]
    pub fn is_recipient(interaction: &Interaction, agent: &Agent) -> bool {
        match &interaction.to {
            Recipient::One(id) => id == "all" || *id == agent.id,
            Recipient::Many(ids) => ids.iter().any(|id| *id == agent.id),
        }
    }

    /// Interactions the agent can currently receive: recipient match first,
    /// then trigger evaluation.
    pub fn available<'a>(
        &self,
        interactions: &'a [Interaction],
        agent: &Agent,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Vec<&'a Interaction> {
        interactions
            .iter()
            .filter(|interaction| Self::is_recipient(interaction, agent))
            .filter(|interaction| self.check(&interaction.trigger, now, rng))
            .collect()
    }

    /// Idempotently record `id` as fired. Returns true only on the first
    /// call for a given id; the recorded set never holds duplicates.
    pub fn fire(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        if self.has_fired(id) {
            return false;
        }
        self.triggered.push(id.to_string());
        self.fired_at.insert(id.to_string(), now);
        log::debug!("narrative trigger fired: {id}");
        true
    }

    #[must_use]
    pub fn has_fired(&self, id: &str) -> bool {
        self.triggered.iter().any(|fired| fired == id)
    }

    #[must_use]
    pub fn fired_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.fired_at.get(id).copied()
    }

    #[must_use]
    pub fn triggered_ids(&self) -> &[String] {
        &self.triggered
    }

    /// Idempotent read-record for notices and messages.
    pub fn mark_read(&mut self, id: &str) -> bool {
        if self.is_read(id) {
            return false;
        }
        self.read.push(id.to_string());
        true
    }

    #[must_use]
    pub fn is_read(&self, id: &str) -> bool {
        self.read.iter().any(|read| read == id)
    }

    #[must_use]
    pub fn read_ids(&self) -> &[String] {
        &self.read
    }

    pub fn reset(&mut self) {
        self.triggered.clear();
        self.read.clear();
        self.fired_at.clear();
    }
}
