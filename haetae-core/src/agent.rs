//! Agents: the logged-in identities of the portal.
//!
//! Named personas come from a fixed registry; any other non-empty login
//! key gets a procedurally synthesized agent. Either way the agent is
//! exclusively owned by the session until logout clears it.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::records::{EquipmentCategory, IncidentStatus};

/// The three field departments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    /// 백호반 - investigation.
    Baekho,
    /// 현무반 - rescue.
    Hyunmu,
    /// 주작반 - cleanup.
    Jujak,
}

impl Department {
    pub const ALL: [Self; 3] = [Self::Baekho, Self::Hyunmu, Self::Jujak];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baekho => "baekho",
            Self::Hyunmu => "hyunmu",
            Self::Jujak => "jujak",
        }
    }

    /// Korean squad label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Baekho => "백호반",
            Self::Hyunmu => "현무반",
            Self::Jujak => "주작반",
        }
    }

    /// The in-progress incident status this department's acceptance maps to.
    #[must_use]
    pub const fn working_status(self) -> IncidentStatus {
        match self {
            Self::Baekho => IncidentStatus::Investigating,
            Self::Hyunmu => IncidentStatus::Rescuing,
            Self::Jujak => IncidentStatus::Cleaning,
        }
    }

    /// Prefix for synthesized "current task" schedule titles.
    #[must_use]
    pub const fn action_prefix(self) -> &'static str {
        match self {
            Self::Baekho => "현장 조사",
            Self::Hyunmu => "긴급 출동",
            Self::Jujak => "사후 정리",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AgentStatus {
    #[default]
    #[serde(rename = "정상")]
    Normal,
    #[serde(rename = "부상")]
    Injured,
    #[serde(rename = "오염")]
    Contaminated,
    #[serde(rename = "실종")]
    Missing,
    #[serde(rename = "사망")]
    Deceased,
    #[serde(rename = "퇴사")]
    Resigned,
    #[serde(rename = "휴직")]
    OnLeave,
}

impl AgentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "정상",
            Self::Injured => "부상",
            Self::Contaminated => "오염",
            Self::Missing => "실종",
            Self::Deceased => "사망",
            Self::Resigned => "퇴사",
            Self::OnLeave => "휴직",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RentalStatus {
    #[default]
    #[serde(rename = "정상")]
    Ok,
    #[serde(rename = "연체")]
    Overdue,
    #[serde(rename = "반납완료")]
    Returned,
}

/// An equipment rental/issuance held by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRecord {
    pub id: String,
    pub equipment_name: String,
    pub category: EquipmentCategory,
    pub rental_date: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: RentalStatus,
    pub quantity: u32,
}

/// The logged-in persona. Named personas carry a `persona_key` that keys
/// their authored narrative content; synthesized agents have none and fall
/// back to the ordinary datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub persona_key: Option<String>,
    pub codename: String,
    pub department: Department,
    #[serde(default)]
    pub team: Option<String>,
    pub rank: String,
    #[serde(default)]
    pub grade: Option<u8>,
    pub extension: String,
    #[serde(default)]
    pub status: AgentStatus,
    pub contamination: u8,
    #[serde(default)]
    pub total_incidents: u32,
    #[serde(default)]
    pub special_cases: u32,
    #[serde(default)]
    pub rentals: Vec<RentalRecord>,
    #[serde(default)]
    pub purification_history: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub funeral_preference: Option<String>,
}

impl Agent {
    /// Resigned agents are gone from the roster; messages to them bounce.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != AgentStatus::Resigned
    }

    #[must_use]
    pub fn persona_key(&self) -> Option<&str> {
        self.persona_key.as_deref()
    }
}

/// Codenames handed to synthesized agents.
pub const RANDOM_CODENAMES: [&str; 4] = ["참새", "들쥐", "잠자리", "족제비"];

const SYNTH_RANK: &str = "실무관";
const SYNTH_GRADE: u8 = 9;
const SYNTH_CONTAMINATION_MAX: u8 = 40;
const ID_SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_SUFFIX_LEN: usize = 5;

/// Synthesize an agent for an unregistered login key.
///
/// Department and codename are uniform draws, the team is 1-3, rank and
/// grade are fixed at the entry level, contamination starts somewhere in
/// `[0, 40)`, and the history counters are randomized for flavor.
#[must_use]
pub fn synthesize_agent(name: &str, rng: &mut impl Rng) -> Agent {
    let department = Department::ALL[rng.gen_range(0..Department::ALL.len())];
    let codename = RANDOM_CODENAMES[rng.gen_range(0..RANDOM_CODENAMES.len())];
    let team = rng.gen_range(1..=3u8);
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();

    Agent {
        id: format!("agent-{suffix}"),
        name: name.to_string(),
        persona_key: None,
        codename: codename.to_string(),
        department,
        team: Some(format!("{team}팀")),
        rank: SYNTH_RANK.to_string(),
        grade: Some(SYNTH_GRADE),
        extension: format!("{}", rng.gen_range(1000..=9999)),
        status: AgentStatus::Normal,
        contamination: rng.gen_range(0..SYNTH_CONTAMINATION_MAX),
        total_incidents: rng.gen_range(0..50),
        special_cases: rng.gen_range(0..5),
        rentals: Vec::new(),
        purification_history: Vec::new(),
        funeral_preference: None,
    }
}

/// Fixed registry of named personas, looked up by persona key or by
/// display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentRegistry(Vec<Agent>);

impl AgentRegistry {
    #[must_use]
    pub const fn empty() -> Self {
        Self(vec![])
    }

    /// Load the registry from a JSON map of persona key to agent record.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid agent data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let map: std::collections::BTreeMap<String, Agent> = serde_json::from_str(json)?;
        let agents = map
            .into_iter()
            .map(|(key, mut agent)| {
                agent.persona_key = Some(key);
                agent
            })
            .collect();
        Ok(Self(agents))
    }

    /// The built-in persona roster shipped with the crate.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static REGISTRY: Lazy<AgentRegistry> = Lazy::new(|| {
            AgentRegistry::from_json(include_str!("../assets/agents.json"))
                .expect("bundled agent roster parses")
        });
        &REGISTRY
    }

    #[must_use]
    pub fn by_key(&self, key: &str) -> Option<&Agent> {
        self.0.iter().find(|agent| agent.persona_key() == Some(key))
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Agent> {
        self.0.iter().find(|agent| agent.name == name)
    }

    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&Agent> {
        self.0.iter().find(|agent| agent.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a AgentRegistry {
    type Item = &'a Agent;
    type IntoIter = std::slice::Iter<'a, Agent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn builtin_registry_resolves_key_and_name() {
        let registry = AgentRegistry::builtin();
        let by_key = registry.by_key("parkhonglim").expect("parkhonglim");
        assert_eq!(by_key.name, "박홍림");
        assert_eq!(by_key.department, Department::Hyunmu);

        let by_name = registry.by_name("박홍림").expect("박홍림");
        assert_eq!(by_name.id, by_key.id);
    }

    #[test]
    fn builtin_registry_has_a_resigned_persona() {
        let registry = AgentRegistry::builtin();
        let gone = registry.by_key("koyoungeun").expect("koyoungeun");
        assert_eq!(gone.status, AgentStatus::Resigned);
        assert!(!gone.is_active());
    }

    #[test]
    fn synthesized_agents_stay_in_bounds() {
        let mut rng = ChaCha20Rng::seed_from_u64(0xA6E);
        for _ in 0..200 {
            let agent = synthesize_agent("이평범", &mut rng);
            assert!(Department::ALL.contains(&agent.department));
            assert!(agent.contamination < SYNTH_CONTAMINATION_MAX);
            assert_eq!(agent.rank, SYNTH_RANK);
            assert_eq!(agent.grade, Some(SYNTH_GRADE));
            assert!(agent.id.starts_with("agent-"));
            assert!(RANDOM_CODENAMES.contains(&agent.codename.as_str()));
            assert!(agent.rentals.is_empty());
            assert!(agent.purification_history.is_empty());
        }
    }

    #[test]
    fn registry_from_json_attaches_persona_keys() {
        let json = r#"{
            "test": {
                "id": "agent-t01",
                "name": "테스트",
                "codename": "시험",
                "department": "jujak",
                "rank": "주무관",
                "extension": "9999",
                "status": "정상",
                "contamination": 3
            }
        }"#;
        let registry = AgentRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 1);
        let agent = registry.by_key("test").unwrap();
        assert_eq!(agent.persona_key(), Some("test"));
        assert_eq!(agent.department, Department::Jujak);
    }

    #[test]
    fn department_mappings_line_up() {
        assert_eq!(
            Department::Hyunmu.working_status(),
            IncidentStatus::Rescuing
        );
        assert_eq!(Department::Baekho.action_prefix(), "현장 조사");
        assert_eq!(Department::Jujak.label(), "주작반");
    }
}
