//! Login-key resolution and the persisted current-agent slot.

use rand::Rng;
use thiserror::Error;

use crate::agent::{Agent, AgentRegistry, synthesize_agent};
use crate::store::{SessionStore, StorageBackend, keys};

/// Login is a narrative gate, not security: the only way to fail is to
/// present nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("login key is empty")]
    EmptyKey,
}

/// Resolve a login key to an agent.
///
/// Lookup order: persona key, then display name, then synthesis for any
/// other non-empty key. The empty (or all-whitespace) key fails.
pub fn resolve_login(
    registry: &AgentRegistry,
    key: &str,
    rng: &mut impl Rng,
) -> Result<Agent, LoginError> {
    let key = key.trim();

    if let Some(agent) = registry.by_key(key) {
        return Ok(agent.clone());
    }
    if let Some(agent) = registry.by_name(key) {
        return Ok(agent.clone());
    }
    if !key.is_empty() {
        return Ok(synthesize_agent(key, rng));
    }
    Err(LoginError::EmptyKey)
}

/// Load the persisted current agent, if any. Date fields come back from
/// their ISO string form through serde.
#[must_use]
pub fn load_current_agent<B: StorageBackend>(store: &SessionStore<B>) -> Option<Agent> {
    store.load::<Option<Agent>>(keys::AGENT_SESSION, None)
}

pub fn save_current_agent<B: StorageBackend>(store: &mut SessionStore<B>, agent: &Agent) {
    store.save(keys::AGENT_SESSION, agent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Department;
    use crate::store::MemoryBackend;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn named_persona_resolves_by_key_and_name_to_same_agent() {
        let registry = AgentRegistry::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let by_key = resolve_login(registry, "parkhonglim", &mut rng).unwrap();
        let by_name = resolve_login(registry, "박홍림", &mut rng).unwrap();
        assert_eq!(by_key.id, by_name.id);

        // Stable across repeated logins.
        let again = resolve_login(registry, "박홍림", &mut rng).unwrap();
        assert_eq!(again.id, by_key.id);
    }

    #[test]
    fn unknown_key_synthesizes_an_agent() {
        let registry = AgentRegistry::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let agent = resolve_login(registry, "  이평범  ", &mut rng).unwrap();
        assert_eq!(agent.name, "이평범");
        assert!(agent.persona_key().is_none());
        assert!(Department::ALL.contains(&agent.department));
        assert!(agent.contamination < 40);
    }

    #[test]
    fn empty_key_fails() {
        let registry = AgentRegistry::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        assert_eq!(
            resolve_login(registry, "", &mut rng),
            Err(LoginError::EmptyKey)
        );
        assert_eq!(
            resolve_login(registry, "   ", &mut rng),
            Err(LoginError::EmptyKey)
        );
    }

    #[test]
    fn current_agent_round_trips_through_the_store() {
        let registry = AgentRegistry::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let agent = resolve_login(registry, "김솔음", &mut rng).unwrap();

        let mut store = SessionStore::new(MemoryBackend::new());
        assert!(load_current_agent(&store).is_none());
        save_current_agent(&mut store, &agent);

        let restored = load_current_agent(&store).expect("agent restored");
        assert_eq!(restored, agent);
        assert_eq!(restored.purification_history, agent.purification_history);
    }
}
