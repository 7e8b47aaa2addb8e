//! Closed set of content kinds.
//!
//! Stored rows carry the kind as free text (`type`, and `content5` for the
//! game sub-kind). They are parsed once into `ContentKind`; unknown values
//! are rejected rather than treated as a default.

use serde::Serialize;

use crate::models::calendar::ContentRow;
use crate::scoring::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Plain,
    Hangman,
    CitationQuiz,
    TriviaQuiz,
}

impl GameKind {
    pub fn from_slot(slot: &str) -> Option<Self> {
        match slot.trim() {
            "jeu" => Some(GameKind::Plain),
            "pendu" => Some(GameKind::Hangman),
            "quiz-citation" => Some(GameKind::CitationQuiz),
            "quiz-noel" => Some(GameKind::TriviaQuiz),
            _ => None,
        }
    }

    pub fn is_quiz(self) -> bool {
        matches!(self, GameKind::CitationQuiz | GameKind::TriviaQuiz)
    }
}

/// What slot 4 means for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GameExtra {
    Explanation(String),
    Video(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Game {
    pub kind: GameKind,
    pub answer: Option<String>,
    pub extra: Option<GameExtra>,
}

/// Result of checking a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCheck {
    pub correct: bool,
    pub expected: String,
    pub extra: Option<GameExtra>,
}

impl Game {
    /// Compares with slot 3. Hangman words are typed, so they match trimmed
    /// and case-insensitive; quiz answers are picked from a list and must
    /// match exactly. `None` when the game has no recorded answer.
    pub fn check_answer(&self, given: &str) -> Option<AnswerCheck> {
        let expected = self.answer.as_deref()?;
        let correct = match self.kind {
            GameKind::Hangman => given.trim().to_lowercase() == expected.trim().to_lowercase(),
            _ => given == expected,
        };
        Some(AnswerCheck {
            correct,
            expected: expected.to_string(),
            extra: self.extra.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentKind {
    Quote,
    Recipe,
    Anecdote,
    Idea,
    Game(Game),
}

impl ContentKind {
    /// Parses the `type` column, plus slots 3-5 for games.
    pub fn parse(
        content_type: &str,
        answer: Option<&str>,
        extra: Option<&str>,
        sub_kind: Option<&str>,
    ) -> Result<Self, ScoringError> {
        let invalid = || ScoringError::InvalidContentKind {
            content_type: content_type.to_string(),
            sub_kind: sub_kind.map(str::to_string),
        };

        match content_type.trim() {
            "quote" => Ok(ContentKind::Quote),
            "recipe" => Ok(ContentKind::Recipe),
            "anecdote" => Ok(ContentKind::Anecdote),
            "idea" => Ok(ContentKind::Idea),
            "game" => {
                let kind = sub_kind.and_then(GameKind::from_slot).ok_or_else(invalid)?;
                let extra = non_empty(extra).map(|s| match kind {
                    GameKind::CitationQuiz => GameExtra::Video(s),
                    _ => GameExtra::Explanation(s),
                });
                Ok(ContentKind::Game(Game {
                    kind,
                    answer: non_empty(answer),
                    extra,
                }))
            }
            _ => Err(invalid()),
        }
    }

    pub fn as_game(&self) -> Option<&Game> {
        match self {
            ContentKind::Game(game) => Some(game),
            _ => None,
        }
    }
}

impl TryFrom<&ContentRow> for ContentKind {
    type Error = ScoringError;

    fn try_from(row: &ContentRow) -> Result<Self, Self::Error> {
        ContentKind::parse(
            &row.content_type,
            row.content3.as_deref(),
            row.content4.as_deref(),
            row.content5.as_deref(),
        )
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
