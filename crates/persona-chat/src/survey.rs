//! Big Five survey: question bank, ratings and trait scoring.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const DEFAULT_RATING: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalityTrait {
    Extraversion,
    Agreeableness,
    Conscientiousness,
    EmotionalStability,
    Openness,
}

impl PersonalityTrait {
    /// Column order of the profile worksheet.
    pub const ALL: [PersonalityTrait; 5] = [
        PersonalityTrait::Extraversion,
        PersonalityTrait::Agreeableness,
        PersonalityTrait::Conscientiousness,
        PersonalityTrait::EmotionalStability,
        PersonalityTrait::Openness,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PersonalityTrait::Extraversion => "Extraversion",
            PersonalityTrait::Agreeableness => "Agreeableness",
            PersonalityTrait::Conscientiousness => "Conscientiousness",
            PersonalityTrait::EmotionalStability => "Emotional Stability",
            PersonalityTrait::Openness => "Openness",
        }
    }

    fn index(self) -> usize {
        match self {
            PersonalityTrait::Extraversion => 0,
            PersonalityTrait::Agreeableness => 1,
            PersonalityTrait::Conscientiousness => 2,
            PersonalityTrait::EmotionalStability => 3,
            PersonalityTrait::Openness => 4,
        }
    }
}

impl fmt::Display for PersonalityTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub statement: &'static str,
    pub measures: PersonalityTrait,
    /// Agreement counts against the trait; scored as `6 - rating`.
    pub reversed: bool,
}

const fn question(statement: &'static str, measures: PersonalityTrait, reversed: bool) -> Question {
    Question { statement, measures, reversed }
}

pub const QUESTION_COUNT: usize = 10;

pub const QUESTIONS: [Question; QUESTION_COUNT] = [
    question("I am the life of the party", PersonalityTrait::Extraversion, false),
    question("I don't talk a lot", PersonalityTrait::Extraversion, true),
    question("I sympathize with others' feelings", PersonalityTrait::Agreeableness, false),
    question("I am not interested in other people's problems", PersonalityTrait::Agreeableness, true),
    question("I get chores done right away", PersonalityTrait::Conscientiousness, false),
    question("I often forget to put things back in their proper place", PersonalityTrait::Conscientiousness, true),
    question("I am relaxed most of the time", PersonalityTrait::EmotionalStability, false),
    question("I get upset easily", PersonalityTrait::EmotionalStability, true),
    question("I have a vivid imagination", PersonalityTrait::Openness, false),
    question("I am not interested in abstract ideas", PersonalityTrait::Openness, true),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatingError {
    #[error("rating for question {question} must be between 1 and 5, got {value}")]
    OutOfRange { question: usize, value: String },
}

/// One answer per question, each in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratings([u8; QUESTION_COUNT]);

impl Default for Ratings {
    fn default() -> Self {
        Self([DEFAULT_RATING; QUESTION_COUNT])
    }
}

impl Ratings {
    pub fn new(values: [u8; QUESTION_COUNT]) -> Result<Self, RatingError> {
        for (question, value) in values.iter().enumerate() {
            if !(MIN_RATING..=MAX_RATING).contains(value) {
                return Err(RatingError::OutOfRange {
                    question: question + 1,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self(values))
    }

    /// Read `q0`..`q9` from submitted form fields. Absent fields keep the
    /// default rating.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, RatingError> {
        let mut values = [DEFAULT_RATING; QUESTION_COUNT];
        for (index, slot) in values.iter_mut().enumerate() {
            let Some(raw) = fields.get(&field_name(index)) else {
                continue;
            };
            *slot = raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|v| (MIN_RATING..=MAX_RATING).contains(v))
                .ok_or_else(|| RatingError::OutOfRange {
                    question: index + 1,
                    value: raw.clone(),
                })?;
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[u8; QUESTION_COUNT] {
        &self.0
    }
}

/// Form field carrying the answer to question `index`.
pub fn field_name(index: usize) -> String {
    format!("q{}", index)
}

/// Per-trait scores, 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitScores {
    pub extraversion: u8,
    pub agreeableness: u8,
    pub conscientiousness: u8,
    pub emotional_stability: u8,
    pub openness: u8,
}

impl TraitScores {
    pub fn new(
        extraversion: u8,
        agreeableness: u8,
        conscientiousness: u8,
        emotional_stability: u8,
        openness: u8,
    ) -> Self {
        Self {
            extraversion,
            agreeableness,
            conscientiousness,
            emotional_stability,
            openness,
        }
    }

    fn from_array(values: [u8; 5]) -> Self {
        Self::new(values[0], values[1], values[2], values[3], values[4])
    }

    pub fn get(&self, t: PersonalityTrait) -> u8 {
        match t {
            PersonalityTrait::Extraversion => self.extraversion,
            PersonalityTrait::Agreeableness => self.agreeableness,
            PersonalityTrait::Conscientiousness => self.conscientiousness,
            PersonalityTrait::EmotionalStability => self.emotional_stability,
            PersonalityTrait::Openness => self.openness,
        }
    }

    /// `(trait, score)` in profile column order.
    pub fn iter(&self) -> impl Iterator<Item = (PersonalityTrait, u8)> + '_ {
        PersonalityTrait::ALL.iter().map(move |t| (*t, self.get(*t)))
    }
}

/// Average each trait's (reflected) ratings and scale to 100.
pub fn score(ratings: &Ratings) -> TraitScores {
    let mut sums = [0u32; 5];
    let mut counts = [0u32; 5];

    for (question, rating) in QUESTIONS.iter().zip(ratings.values()) {
        let value = if question.reversed { 6 - rating } else { *rating };
        let slot = question.measures.index();
        sums[slot] += u32::from(value);
        counts[slot] += 1;
    }

    let mut scores = [0u8; 5];
    for slot in 0..5 {
        if counts[slot] > 0 {
            let average = f64::from(sums[slot]) / f64::from(counts[slot]);
            scores[slot] = (average * 20.0).round() as u8;
        }
    }
    TraitScores::from_array(scores)
}
