//! Turn history buffer
//!
//! Append-only log of user and model turns. The whole buffer is handed to
//! the model on every active turn, and rendered as a transcript on export.

use crate::llm::LlmMessage;
use crate::state_machine::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    fn label(self) -> &'static str {
        match self {
            TurnRole::User => "USER",
            TurnRole::Model => "MODEL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// Model turn consisting solely of an interrupt record
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub interrupt: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnHistory {
    turns: Vec<Turn>,
}

impl TurnHistory {
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(TurnRole::User, content.into(), false);
    }

    pub fn push_model(&mut self, content: impl Into<String>) {
        self.push(TurnRole::Model, content.into(), false);
    }

    /// Record a model-role turn that carries only an interrupt record
    pub fn push_interrupt(&mut self, content: impl Into<String>) {
        self.push(TurnRole::Model, content.into(), true);
    }

    fn push(&mut self, role: TurnRole, content: String, interrupt: bool) {
        self.turns.push(Turn {
            role,
            content,
            interrupt,
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Inference context. With `exclude_interrupts`, each interrupt-only
    /// model turn is dropped together with the user turn that provoked it.
    pub fn to_messages(&self, exclude_interrupts: bool) -> Vec<LlmMessage> {
        let mut messages: Vec<LlmMessage> = Vec::with_capacity(self.turns.len());
        for turn in &self.turns {
            if exclude_interrupts && turn.interrupt {
                if messages
                    .last()
                    .is_some_and(|m| m.role == crate::llm::MessageRole::User)
                {
                    messages.pop();
                }
                continue;
            }
            messages.push(match turn.role {
                TurnRole::User => LlmMessage::user(turn.content.clone()),
                TurnRole::Model => LlmMessage::model(turn.content.clone()),
            });
        }
        messages
    }

    /// Markdown transcript used by export
    pub fn render_transcript(&self, mode: Option<Mode>, at: DateTime<Utc>) -> String {
        let mode = mode.map_or("None", Mode::as_str);
        let mut log = format!(
            "# OECS Session Log\nMode: {mode}\nTime: {}\n\n",
            at.format("%Y-%m-%d %H:%M:%S%.6f")
        );
        for turn in &self.turns {
            let _ = write!(log, "**{}**: {}\n\n", turn.role.label(), turn.content);
        }
        log
    }
}
