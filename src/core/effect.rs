//! Typed control-signal protocol between subsystems and the orchestrator
//!
//! Combat and survival cannot mutate the full game state from inside a
//! resolution call, so they return explicit effects alongside their
//! narrative messages. The orchestrator applies the effects and displays
//! only the messages.

use crate::escape::RouteId;

/// A state mutation requested by a subsystem
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Reduce player health by this amount
    DamagePlayer(i32),
    /// The equipped weapon was destroyed
    BreakWeapon,
    /// Raise the global alert level (capped at 10)
    RaiseAlert(f32),
    /// The current enemy group was destroyed
    EnemyDied,
    /// The player's health reached zero
    PlayerDied,
    /// Day 30 was survived
    SurvivalVictory,
    /// An escape route's final step completed
    EscapeVictory(RouteId),
}

/// Messages plus requested effects from a single subsystem call
#[derive(Debug, Clone, Default)]
pub struct ActionOutput {
    pub messages: Vec<String>,
    pub effects: Vec<Effect>,
}

impl ActionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msg(&mut self, text: impl Into<String>) {
        self.messages.push(text.into());
    }

    pub fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn merge(&mut self, other: ActionOutput) {
        self.messages.extend(other.messages);
        self.effects.extend(other.effects);
    }

    pub fn has(&self, effect: &Effect) -> bool {
        self.effects.contains(effect)
    }
}

/// Result of dispatching one exploring-mode command
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    pub output: ActionOutput,
    /// In-game minutes the command consumed (0 = free action)
    pub time_elapsed: u32,
    /// Whether the player changed rooms (triggers encounter checks)
    pub moved: bool,
}

impl StepResult {
    pub fn message(text: impl Into<String>) -> Self {
        let mut output = ActionOutput::new();
        output.msg(text);
        Self {
            output,
            time_elapsed: 0,
            moved: false,
        }
    }

    pub fn with_time(mut self, minutes: u32) -> Self {
        self.time_elapsed = minutes;
        self
    }
}
