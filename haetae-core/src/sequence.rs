//! The forbidden-login execution sequence.
//!
//! A staged state machine consuming the game-over signal: screen freeze,
//! red flash, a single sentencing character, a hold, then a typed-text
//! fill that accelerates geometrically until its time budget runs out and
//! the session is forcibly ended. The machine owns timing math and text;
//! the session arms one timer per step and a shell renders `text()`.

use serde::{Deserialize, Serialize};

/// Sentencing character shown alone before the fill begins.
pub const MAIN_CHAR: char = '狱';
/// Sentence typed repeatedly during the fill stage.
pub const SENTENCE: &str = " 죄인은 오랏줄을 받으라\n";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub freeze_ms: u64,
    pub flash_ms: u64,
    pub initial_typing_ms: u64,
    pub hold_ms: u64,
    /// Elapsed-time budget for the fill stage; reaching it forces logout.
    pub fill_budget_ms: u64,
    pub initial_delay_ms: f64,
    pub min_delay_ms: f64,
    pub acceleration: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            freeze_ms: 3_000,
            flash_ms: 2_000,
            initial_typing_ms: 2_000,
            hold_ms: 3_000,
            fill_budget_ms: 10_000,
            initial_delay_ms: 200.0,
            min_delay_ms: 5.0,
            acceleration: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStage {
    #[default]
    Idle,
    Freeze,
    Flash,
    InitialTyping,
    Hold,
    FillTyping,
    Finished,
}

/// What the owner should do after a step: wait `delay_ms` and step again,
/// or (on `finished`) tear the session down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceStep {
    pub delay_ms: Option<u64>,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct ExecutionSequence {
    config: SequenceConfig,
    stage: SequenceStage,
    text: String,
    fill_index: usize,
    fill_elapsed_ms: f64,
    current_delay_ms: f64,
}

impl Default for ExecutionSequence {
    fn default() -> Self {
        Self::new(SequenceConfig::default())
    }
}

impl ExecutionSequence {
    #[must_use]
    pub fn new(config: SequenceConfig) -> Self {
        Self {
            current_delay_ms: config.initial_delay_ms,
            config,
            stage: SequenceStage::Idle,
            text: String::new(),
            fill_index: 0,
            fill_elapsed_ms: 0.0,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> SequenceStage {
        self.stage
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        !matches!(self.stage, SequenceStage::Idle | SequenceStage::Finished)
    }

    /// Enter the first stage. Returns the delay before the next `step`.
    pub fn begin(&mut self) -> u64 {
        self.reset();
        self.stage = SequenceStage::Freeze;
        self.config.freeze_ms
    }

    /// Advance one step. In the staged phases this transitions to the next
    /// stage; in the fill phase it types one character with a decaying
    /// delay until the budget expires.
    pub fn step(&mut self) -> SequenceStep {
        match self.stage {
            SequenceStage::Idle | SequenceStage::Finished => SequenceStep {
                delay_ms: None,
                finished: false,
            },
            SequenceStage::Freeze => {
                self.stage = SequenceStage::Flash;
                SequenceStep {
                    delay_ms: Some(self.config.flash_ms),
                    finished: false,
                }
            }
            SequenceStage::Flash => {
                self.stage = SequenceStage::InitialTyping;
                self.text.push(MAIN_CHAR);
                SequenceStep {
                    delay_ms: Some(self.config.initial_typing_ms),
                    finished: false,
                }
            }
            SequenceStage::InitialTyping => {
                self.stage = SequenceStage::Hold;
                SequenceStep {
                    delay_ms: Some(self.config.hold_ms),
                    finished: false,
                }
            }
            SequenceStage::Hold => {
                self.stage = SequenceStage::FillTyping;
                self.type_one()
            }
            SequenceStage::FillTyping => self.type_one(),
        }
    }

    fn type_one(&mut self) -> SequenceStep {
        if self.fill_elapsed_ms >= self.config.fill_budget_ms as f64 {
            self.stage = SequenceStage::Finished;
            return SequenceStep {
                delay_ms: None,
                finished: true,
            };
        }

        let chars: Vec<char> = SENTENCE.chars().collect();
        self.text.push(chars[self.fill_index % chars.len()]);
        self.fill_index += 1;

        let delay = self.current_delay_ms;
        self.fill_elapsed_ms += delay;
        self.current_delay_ms =
            (self.current_delay_ms * self.config.acceleration).max(self.config.min_delay_ms);

        SequenceStep {
            delay_ms: Some(delay.round() as u64),
            finished: false,
        }
    }

    pub fn reset(&mut self) {
        let config = self.config;
        *self = Self::new(config);
    }
}
