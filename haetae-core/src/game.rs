//! Contamination meter and game-over state for the active agent.
//!
//! The controller is an explicitly constructed state container: one per
//! session, no hidden globals. Threshold detection happens inside the
//! mutation itself, never as a separate polling step.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::mode::BureauMode;

/// Upper bound of the contamination meter.
pub const CONTAMINATION_MAX: u8 = 100;
/// Period of the drift loop tick.
pub const GAME_TICK_MS: u64 = 10_000;
/// Contamination gained per drift tick.
const DRIFT_PER_TICK: u8 = 1;

/// Personas whose contamination can pin at the maximum without ending the
/// session.
const THRESHOLD_EXEMPT: [&str; 1] = ["parkhonglim"];
/// Personas whose meter does not drift at all; the loop is never armed
/// for them.
const LOOP_EXEMPT: [&str; 2] = ["parkhonglim", "janghyeowoon"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameOverType {
    #[default]
    None,
    Contamination,
    ForbiddenLogin,
}

impl GameOverType {
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Persisted shape of the controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameSnapshot {
    pub contamination: u8,
    pub game_over: GameOverType,
    #[serde(default)]
    pub agent_id: Option<String>,
}

fn threshold_exempt(agent: &Agent) -> bool {
    agent
        .persona_key()
        .is_some_and(|key| THRESHOLD_EXEMPT.contains(&key))
}

/// Whether the drift loop should run for this agent at all.
#[must_use]
pub fn loop_exempt(agent: &Agent) -> bool {
    agent
        .persona_key()
        .is_some_and(|key| LOOP_EXEMPT.contains(&key))
}

/// Owns contamination and game-over state for exactly one agent identity
/// at a time.
#[derive(Debug, Clone, Default)]
pub struct GameController {
    contamination: u8,
    game_over: GameOverType,
    agent_id: Option<String>,
}

impl GameController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state for a newly resolved identity: contamination returns to
    /// the agent's baseline and any previous game-over is cleared. State is
    /// never merged across identities.
    pub fn initialize_for_agent(&mut self, agent: &Agent) {
        self.contamination = agent.contamination.min(CONTAMINATION_MAX);
        self.game_over = GameOverType::None;
        self.agent_id = Some(agent.id.clone());
    }

    /// Same-identity restore (page reload): adopt the persisted snapshot
    /// and re-derive the contamination game-over flag instead of trusting
    /// or silently clearing it.
    pub fn restore_from_session(&mut self, snapshot: &GameSnapshot, agent: &Agent) {
        self.contamination = snapshot.contamination.min(CONTAMINATION_MAX);
        self.game_over = snapshot.game_over;
        self.agent_id = Some(agent.id.clone());

        if self.contamination >= CONTAMINATION_MAX && !threshold_exempt(agent) {
            self.game_over = GameOverType::Contamination;
        } else if self.game_over == GameOverType::Contamination
            && self.contamination < CONTAMINATION_MAX
        {
            self.game_over = GameOverType::None;
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            contamination: self.contamination,
            game_over: self.game_over,
            agent_id: self.agent_id.clone(),
        }
    }

    #[must_use]
    pub const fn contamination(&self) -> u8 {
        self.contamination
    }

    #[must_use]
    pub const fn game_over(&self) -> GameOverType {
        self.game_over
    }

    #[must_use]
    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    #[must_use]
    pub fn tracks(&self, agent: &Agent) -> bool {
        self.agent_id.as_deref() == Some(agent.id.as_str())
    }

    /// Set the meter to `value`, clamped to `[0, 100]`. Crossing the
    /// maximum flips the game-over flag as part of this mutation. Without
    /// an active identity this is a silent no-op.
    pub fn update_contamination(&mut self, value: i32, agent: &Agent, mode: BureauMode) {
        if self.agent_id.is_none() {
            return;
        }
        let clamped = value.clamp(0, i32::from(CONTAMINATION_MAX)) as u8;
        self.contamination = clamped;

        if clamped >= CONTAMINATION_MAX
            && !threshold_exempt(agent)
            && mode != BureauMode::Segwang
        {
            self.game_over = GameOverType::Contamination;
        }
    }

    /// Lower the meter (purification), saturating at zero. No-op without
    /// an active identity.
    pub fn decrease_contamination(&mut self, amount: u8) {
        if self.agent_id.is_none() {
            return;
        }
        self.contamination = self.contamination.saturating_sub(amount);
    }

    /// Force a game-over independent of contamination (the forbidden-login
    /// branch).
    pub fn trigger_game_over(&mut self, kind: GameOverType) {
        self.game_over = kind;
    }

    /// One drift-loop tick. Returns true when the meter changed.
    pub fn tick(&mut self, agent: &Agent, mode: BureauMode) -> bool {
        if self.agent_id.is_none() || self.game_over.is_over() {
            return false;
        }
        let next = self.contamination.saturating_add(DRIFT_PER_TICK);
        if next >= CONTAMINATION_MAX {
            self.contamination = CONTAMINATION_MAX;
            if !loop_exempt(agent) && !threshold_exempt(agent) && mode != BureauMode::Segwang {
                self.game_over = GameOverType::Contamination;
            }
        } else {
            self.contamination = next;
        }
        true
    }

    /// Drop all state (logout).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRegistry;

    fn ordinary_agent() -> Agent {
        AgentRegistry::builtin().by_key("solum").unwrap().clone()
    }

    fn exempt_agent() -> Agent {
        AgentRegistry::builtin()
            .by_key("parkhonglim")
            .unwrap()
            .clone()
    }

    #[test]
    fn update_clamps_and_flags_game_over() {
        let agent = ordinary_agent();
        let mut game = GameController::new();
        game.initialize_for_agent(&agent);

        game.update_contamination(150, &agent, BureauMode::Ordinary);
        assert_eq!(game.contamination(), 100);
        assert_eq!(game.game_over(), GameOverType::Contamination);

        game.initialize_for_agent(&agent);
        game.update_contamination(-20, &agent, BureauMode::Ordinary);
        assert_eq!(game.contamination(), 0);
        assert_eq!(game.game_over(), GameOverType::None);
    }

    #[test]
    fn decrease_saturates_at_zero() {
        let agent = ordinary_agent();
        let mut game = GameController::new();
        game.initialize_for_agent(&agent);
        game.update_contamination(5, &agent, BureauMode::Ordinary);
        game.decrease_contamination(30);
        assert_eq!(game.contamination(), 0);
    }

    #[test]
    fn mutations_without_identity_are_silent_noops() {
        let agent = ordinary_agent();
        let mut game = GameController::new();
        game.update_contamination(80, &agent, BureauMode::Ordinary);
        game.decrease_contamination(10);
        assert_eq!(game.contamination(), 0);
        assert_eq!(game.game_over(), GameOverType::None);
    }

    #[test]
    fn threshold_exempt_persona_pins_without_ending() {
        let agent = exempt_agent();
        let mut game = GameController::new();
        game.initialize_for_agent(&agent);
        game.update_contamination(200, &agent, BureauMode::Ordinary);
        assert_eq!(game.contamination(), 100);
        assert_eq!(game.game_over(), GameOverType::None);
    }

    #[test]
    fn segwang_mode_suppresses_contamination_game_over() {
        let agent = ordinary_agent();
        let mut game = GameController::new();
        game.initialize_for_agent(&agent);
        game.update_contamination(130, &agent, BureauMode::Segwang);
        assert_eq!(game.contamination(), 100);
        assert_eq!(game.game_over(), GameOverType::None);
    }

    #[test]
    fn restore_rederives_the_contamination_flag() {
        let agent = ordinary_agent();
        let mut game = GameController::new();

        let pinned = GameSnapshot {
            contamination: 100,
            game_over: GameOverType::None,
            agent_id: Some(agent.id.clone()),
        };
        game.restore_from_session(&pinned, &agent);
        assert_eq!(game.game_over(), GameOverType::Contamination);

        let stale_flag = GameSnapshot {
            contamination: 40,
            game_over: GameOverType::Contamination,
            agent_id: Some(agent.id.clone()),
        };
        game.restore_from_session(&stale_flag, &agent);
        assert_eq!(game.game_over(), GameOverType::None);
        assert_eq!(game.contamination(), 40);
    }

    #[test]
    fn restore_keeps_forbidden_flag() {
        let agent = ordinary_agent();
        let mut game = GameController::new();
        let snapshot = GameSnapshot {
            contamination: 12,
            game_over: GameOverType::ForbiddenLogin,
            agent_id: Some(agent.id.clone()),
        };
        game.restore_from_session(&snapshot, &agent);
        assert_eq!(game.game_over(), GameOverType::ForbiddenLogin);
    }

    #[test]
    fn tick_drifts_until_threshold() {
        let agent = ordinary_agent();
        let mut game = GameController::new();
        game.initialize_for_agent(&agent);
        game.update_contamination(98, &agent, BureauMode::Ordinary);

        assert!(game.tick(&agent, BureauMode::Ordinary));
        assert_eq!(game.contamination(), 99);
        assert!(game.tick(&agent, BureauMode::Ordinary));
        assert_eq!(game.contamination(), 100);
        assert_eq!(game.game_over(), GameOverType::Contamination);

        // Ticks after game over change nothing.
        assert!(!game.tick(&agent, BureauMode::Ordinary));
    }

    #[test]
    fn loop_exemption_lists_the_two_personas() {
        assert!(loop_exempt(&exempt_agent()));
        assert!(!loop_exempt(&ordinary_agent()));
        let synthesized = crate::agent::synthesize_agent(
            "행인",
            &mut <rand_chacha::ChaCha20Rng as rand::SeedableRng>::seed_from_u64(5),
        );
        assert!(!loop_exempt(&synthesized));
    }
}
