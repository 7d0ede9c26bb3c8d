use serde::{Deserialize, Serialize};
use std::fmt;

use crate::survey::TraitScores;

/// Below this, a trait counts as low.
pub const LOW_THRESHOLD: u8 = 50;
/// Above this, openness counts as high.
pub const HIGH_OPENNESS_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persona {
    Supportive,
    Quiet,
    Poetic,
    Dependable,
}

impl Persona {
    /// Ordered rules; the first one that matches decides.
    pub fn select(scores: &TraitScores) -> Self {
        if scores.emotional_stability < LOW_THRESHOLD {
            Persona::Supportive
        } else if scores.extraversion < LOW_THRESHOLD {
            Persona::Quiet
        } else if scores.openness > HIGH_OPENNESS_THRESHOLD {
            Persona::Poetic
        } else {
            Persona::Dependable
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Persona::Supportive => "You are a calm and emotionally supportive AI.",
            Persona::Quiet => "You are a quiet and thoughtful AI.",
            Persona::Poetic => "You are a poetic and reflective AI.",
            Persona::Dependable => "You are a dependable and logical AI.",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prompt())
    }
}
