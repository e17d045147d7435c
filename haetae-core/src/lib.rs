//! Haetae Portal Engine
//!
//! Platform-agnostic session and narrative-state logic for the Haetae
//! bureau portal. This crate tracks the logged-in agent's mutable state
//! (contamination, game-over, one-shot narrative triggers, accepted
//! tasks), combines it with static narrative data into the derived views
//! the portal renders, and drives the timed and probabilistic narrative
//! events - all without UI or platform-specific dependencies.

pub mod agent;
pub mod aggregate;
pub mod data;
pub mod eggs;
pub mod game;
pub mod identity;
pub mod mode;
pub mod records;
pub mod scheduler;
pub mod sequence;
pub mod session;
pub mod store;
pub mod trigger;

// Re-export commonly used types
pub use agent::{Agent, AgentRegistry, AgentStatus, Department, RentalRecord, synthesize_agent};
pub use aggregate::{
    combined_approvals, combined_inspections, combined_messages, combined_notifications,
    combined_schedules, processed_incidents,
};
pub use data::{NarrativeData, PersonaContent};
pub use eggs::{EasterEgg, EggAudience, ToastSpec, ToastVariant, builtin_eggs};
pub use game::{CONTAMINATION_MAX, GAME_TICK_MS, GameController, GameOverType, GameSnapshot};
pub use identity::{LoginError, resolve_login};
pub use mode::BureauMode;
pub use records::{
    ApprovalDocument, ApprovalStatus, ApprovalType, DangerLevel, Equipment, Incident,
    IncidentStatus, InspectionRequest, InspectionType, Message, Notification, Schedule,
    ScheduleType, VisitLocation,
};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock, TimerHandle};
pub use sequence::{ExecutionSequence, SequenceConfig, SequenceStage};
pub use session::{PortalEvent, PortalSession};
pub use store::{MemoryBackend, SessionStore, StorageBackend};
pub use trigger::{Interaction, Recipient, TriggerCondition, TriggerEngine};

/// Trait for abstracting narrative content loading.
/// Platform-specific implementations should provide this.
pub trait ContentSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the named-persona registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be loaded or parsed.
    fn load_registry(&self) -> Result<AgentRegistry, Self::Error>;

    /// Load the static narrative datasets.
    ///
    /// # Errors
    ///
    /// Returns an error if the narrative data cannot be loaded or parsed.
    fn load_narrative(&self) -> Result<NarrativeData, Self::Error>;

    /// Load the easter-egg catalog. Defaults to the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_eggs(&self) -> Result<Vec<EasterEgg>, Self::Error> {
        Ok(builtin_eggs().to_vec())
    }
}

/// Content source backed by the datasets bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinContent;

impl ContentSource for BuiltinContent {
    type Error = std::convert::Infallible;

    fn load_registry(&self) -> Result<AgentRegistry, Self::Error> {
        Ok(AgentRegistry::builtin().clone())
    }

    fn load_narrative(&self) -> Result<NarrativeData, Self::Error> {
        Ok(NarrativeData::builtin().clone())
    }
}

/// Engine binding a content source to session construction.
pub struct PortalEngine<L>
where
    L: ContentSource,
{
    source: L,
}

impl<L> PortalEngine<L>
where
    L: ContentSource,
{
    /// Create a new engine with the provided content source.
    pub const fn new(source: L) -> Self {
        Self { source }
    }

    /// Open a session over `backend` with the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the narrative content cannot be loaded.
    pub fn open_session<B: StorageBackend>(
        &self,
        backend: B,
        seed: u64,
    ) -> Result<PortalSession<B>, L::Error> {
        self.open_session_with_clock(backend, seed, SystemClock)
    }

    /// Open a session with an explicit clock (deterministic tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the narrative content cannot be loaded.
    pub fn open_session_with_clock<B: StorageBackend, C: Clock>(
        &self,
        backend: B,
        seed: u64,
        clock: C,
    ) -> Result<PortalSession<B, C>, L::Error> {
        let registry = self.source.load_registry()?;
        let narrative = self.source.load_narrative()?;
        let eggs = self.source.load_eggs()?;
        Ok(PortalSession::new(
            backend, registry, narrative, eggs, seed, clock,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureSource;

    impl ContentSource for FixtureSource {
        type Error = Infallible;

        fn load_registry(&self) -> Result<AgentRegistry, Self::Error> {
            Ok(AgentRegistry::empty())
        }

        fn load_narrative(&self) -> Result<NarrativeData, Self::Error> {
            Ok(NarrativeData::empty())
        }

        fn load_eggs(&self) -> Result<Vec<EasterEgg>, Self::Error> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn engine_opens_sessions_over_fixture_content() {
        let engine = PortalEngine::new(FixtureSource);
        let mut session = engine.open_session(MemoryBackend::new(), 0xABCD).unwrap();

        // No registry: every non-empty key synthesizes.
        let agent = session.login("아무개").unwrap();
        assert!(agent.persona_key().is_none());
        assert!(session.incidents().is_empty());

        session.logout();
        assert_eq!(session.login(""), Err(LoginError::EmptyKey));
        assert!(session.agent().is_none());
    }

    #[test]
    fn builtin_content_resolves_named_personas() {
        let engine = PortalEngine::new(BuiltinContent);
        let mut session = engine.open_session(MemoryBackend::new(), 7).unwrap();
        let agent = session.login("박홍림").unwrap();
        assert_eq!(agent.department, Department::Hyunmu);
        assert!(!session.incidents().is_empty());
    }
}
