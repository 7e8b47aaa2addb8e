use serde::Serialize;

use crate::content::kind::{ContentKind, GameKind};
use crate::models::calendar::ContentRow;
use crate::scoring::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamesTitle {
    Game,
    Quiz,
}

/// A day's games as the client presents them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DayGames {
    pub hangman: Option<ContentRow>,
    pub game: Option<ContentRow>,
    pub citation_quiz: Vec<ContentRow>,
    pub trivia_quiz: Vec<ContentRow>,
    /// Kind of the last game listed, used as the section heading.
    pub title: Option<GamesTitle>,
}

impl DayGames {
    pub fn is_empty(&self) -> bool {
        self.hangman.is_none()
            && self.game.is_none()
            && self.citation_quiz.is_empty()
            && self.trivia_quiz.is_empty()
    }
}

/// Sorts a day's contents into game slots. Non-game contents are ignored;
/// a second hangman or plain game replaces the first.
pub fn group_games(contents: &[ContentRow]) -> Result<DayGames, ScoringError> {
    let mut games = DayGames::default();

    for row in contents {
        let kind = ContentKind::try_from(row)?;
        let Some(game) = kind.as_game() else {
            continue;
        };
        match game.kind {
            GameKind::Hangman => games.hangman = Some(row.clone()),
            GameKind::Plain => games.game = Some(row.clone()),
            GameKind::CitationQuiz => games.citation_quiz.push(row.clone()),
            GameKind::TriviaQuiz => games.trivia_quiz.push(row.clone()),
        }
        games.title = Some(if game.kind.is_quiz() {
            GamesTitle::Quiz
        } else {
            GamesTitle::Game
        });
    }

    Ok(games)
}
