use serde::{Deserialize, Serialize};

/// Result of toggling a game in a [`GameSelection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The selection is full; nothing changed.
    LimitReached,
}

/// Games a player pins to their profile, in the order they were picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSelection {
    games: Vec<String>,
    max: usize,
}

impl GameSelection {
    /// Creates an empty selection holding at most `max` games.
    pub fn new(max: usize) -> Self {
        Self {
            games: Vec::new(),
            max,
        }
    }

    /// Starts from an existing pick list.
    ///
    /// Duplicates are dropped. A stored list longer than `max` is kept as is
    /// so nothing is lost silently, but no game can be added until enough
    /// are removed.
    pub fn from_games(games: impl IntoIterator<Item = String>, max: usize) -> Self {
        let mut selection = Self::new(max);
        for game in games {
            if !selection.contains(&game) {
                selection.games.push(game);
            }
        }
        selection
    }

    /// Removes `game` if selected, adds it otherwise.
    pub fn toggle(&mut self, game: &str) -> ToggleOutcome {
        if let Some(index) = self.games.iter().position(|g| g == game) {
            self.games.remove(index);
            return ToggleOutcome::Removed;
        }
        if self.is_full() {
            return ToggleOutcome::LimitReached;
        }
        self.games.push(game.to_string());
        ToggleOutcome::Added
    }

    pub fn contains(&self, game: &str) -> bool {
        self.games.iter().any(|g| g == game)
    }

    pub fn games(&self) -> &[String] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn is_full(&self) -> bool {
        self.games.len() >= self.max
    }
}
