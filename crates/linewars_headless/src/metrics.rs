//! Match metrics collection for balance analysis.

use std::collections::BTreeMap;

use linewars_core::action::ActionOutcome;
use linewars_core::components::PlayerId;
use linewars_core::player::Player;
use linewars_core::simulation::TickEvents;
use serde::{Deserialize, Serialize};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    /// A base fell.
    BaseDestroyed,
    /// The tick cap was reached first; counts as a draw.
    Timeout,
}

/// Complete metrics for a single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique match identifier.
    pub game_id: String,
    /// Random seed used.
    pub seed: u64,
    /// Total match duration in ticks.
    pub duration_ticks: u64,
    /// Winning player (None = draw).
    pub winner: Option<PlayerId>,
    /// How the match ended.
    pub end_condition: EndCondition,
    /// Player one, then player two.
    pub players: [PlayerMetrics; 2],
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create metrics for a match about to start.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64, controllers: [&str; 2]) -> Self {
        Self {
            game_id: game_id.into(),
            seed,
            duration_ticks: 0,
            winner: None,
            end_condition: EndCondition::Timeout,
            players: [
                PlayerMetrics::new(PlayerId::One, controllers[0]),
                PlayerMetrics::new(PlayerId::Two, controllers[1]),
            ],
            final_state_hash: 0,
        }
    }

    /// Metrics of one player.
    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerMetrics {
        &mut self.players[player.index()]
    }

    /// Count the outcome of a submitted input.
    pub fn record_outcome(&mut self, player: PlayerId, outcome: ActionOutcome) {
        let metrics = self.player_mut(player);
        match outcome {
            ActionOutcome::Applied => metrics.actions_applied += 1,
            ActionOutcome::Rejected | ActionOutcome::MatchOver => metrics.actions_rejected += 1,
        }
    }

    /// Fold one tick's events into the running totals.
    pub fn record_tick(&mut self, events: &TickEvents) {
        for (metrics, report) in self.players.iter_mut().zip(&events.reports) {
            metrics.hits += report.hits;
            metrics.kills += report.kills.len() as u32;
            metrics.base_hits += report.base_hits;
            if report.backlog_spawned.is_some() {
                metrics.backlog_spawns += 1;
            }
        }
    }

    /// Finalize with the end state of the match.
    pub fn finalize(
        &mut self,
        duration: u64,
        winner: Option<PlayerId>,
        players: [&Player; 2],
        final_state_hash: u64,
    ) {
        self.duration_ticks = duration;
        self.winner = winner;
        self.end_condition = if winner.is_some() {
            EndCondition::BaseDestroyed
        } else {
            EndCondition::Timeout
        };
        for (metrics, player) in self.players.iter_mut().zip(players) {
            metrics.finish(player);
        }
        self.final_state_hash = final_state_hash;
    }
}

/// Metrics for one player in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    /// Which player.
    pub player: PlayerId,
    /// Controller name.
    pub controller: String,

    // === Inputs ===
    /// Inputs that changed the match.
    pub actions_applied: u32,
    /// Inputs that were refused.
    pub actions_rejected: u32,

    // === Combat ===
    /// Shots landed by this player's buildings.
    pub hits: u32,
    /// Opponent units killed.
    pub kills: u32,
    /// Own units that reached the opponent's base.
    pub base_hits: u32,
    /// Units created from the spawn backlog.
    pub backlog_spawns: u32,

    // === Final state ===
    /// Units spawned over the match.
    pub units_spawned: u32,
    /// Base health at the end.
    pub final_health: i32,
    /// Gold at the end, truncated.
    pub final_gold: i64,
    /// Income at the end, truncated.
    pub final_income: i64,
    /// Level at the end.
    pub final_level: u32,
    /// Score at the end.
    pub final_score: i64,
}

impl PlayerMetrics {
    /// Create empty metrics.
    #[must_use]
    pub fn new(player: PlayerId, controller: impl Into<String>) -> Self {
        Self {
            player,
            controller: controller.into(),
            actions_applied: 0,
            actions_rejected: 0,
            hits: 0,
            kills: 0,
            base_hits: 0,
            backlog_spawns: 0,
            units_spawned: 0,
            final_health: 0,
            final_gold: 0,
            final_income: 0,
            final_level: 0,
            final_score: 0,
        }
    }

    fn finish(&mut self, player: &Player) {
        self.units_spawned = player.spawn_count;
        self.final_health = player.health;
        self.final_gold = player.gold.to_num::<i64>();
        self.final_income = player.income.to_num::<i64>();
        self.final_level = player.level;
        self.final_score = player.score().to_num::<i64>();
    }
}

/// Summary statistics across a batch of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches.
    pub total_games: u32,
    /// Wins per player (`player_one`, `player_two`).
    pub wins: BTreeMap<String, u32>,
    /// Matches that hit the tick cap.
    pub draws: u32,
    /// Win rate per player.
    pub win_rates: BTreeMap<String, f64>,
    /// Average match duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Average final score per player.
    pub avg_score: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Calculate summary from match metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = games.len() as f64;
        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Self::default()
        };
        for player in PlayerId::BOTH {
            summary.wins.insert(player.to_string(), 0);
        }

        let mut duration_sum = 0u64;
        let mut score_sums = [0i64; 2];
        for game in games {
            match game.winner {
                Some(winner) => *summary.wins.entry(winner.to_string()).or_insert(0) += 1,
                None => summary.draws += 1,
            }
            duration_sum = duration_sum.saturating_add(game.duration_ticks);
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);
            for (sum, player) in score_sums.iter_mut().zip(&game.players) {
                *sum = sum.saturating_add(player.final_score);
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / total;
        summary.win_rates = summary
            .wins
            .iter()
            .map(|(player, wins)| (player.clone(), f64::from(*wins) / total))
            .collect();
        for (player, sum) in PlayerId::BOTH.iter().zip(score_sums) {
            summary.avg_score.insert(player.to_string(), sum as f64 / total);
        }
        summary
    }

    /// Whether neither side's win rate exceeds the other's by more than
    /// `threshold`.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        let rate = |p: PlayerId| self.win_rates.get(&p.to_string()).copied().unwrap_or(0.0);
        (rate(PlayerId::One) - rate(PlayerId::Two)).abs() <= threshold
    }

    /// The player winning noticeably more often, if any.
    #[must_use]
    pub fn dominant_player(&self, threshold: f64) -> Option<&String> {
        if self.is_balanced(threshold) {
            return None;
        }
        self.win_rates
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(player, _)| player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(seed: u64, winner: Option<PlayerId>, duration: u64) -> GameMetrics {
        let mut metrics = GameMetrics::new(format!("game_{seed}"), seed, ["greedy", "idle"]);
        metrics.duration_ticks = duration;
        metrics.winner = winner;
        metrics.players[0].final_score = 200;
        metrics
    }

    #[test]
    fn test_summary_counts() {
        let games = vec![
            game(0, Some(PlayerId::One), 100),
            game(1, Some(PlayerId::One), 300),
            game(2, Some(PlayerId::Two), 200),
            game(3, None, 400),
        ];
        let summary = BatchSummary::from_games(&games);

        assert_eq!(summary.total_games, 4);
        assert_eq!(summary.wins["player_one"], 2);
        assert_eq!(summary.wins["player_two"], 1);
        assert_eq!(summary.draws, 1);
        assert!((summary.win_rates["player_one"] - 0.5).abs() < 1e-9);
        assert!((summary.avg_duration_ticks - 250.0).abs() < 1e-9);
        assert_eq!(summary.min_duration_ticks, 100);
        assert_eq!(summary.max_duration_ticks, 400);
        assert!((summary.avg_score["player_one"] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_balance_checks() {
        let games = vec![
            game(0, Some(PlayerId::One), 100),
            game(1, Some(PlayerId::One), 100),
            game(2, Some(PlayerId::One), 100),
            game(3, Some(PlayerId::Two), 100),
        ];
        let summary = BatchSummary::from_games(&games);
        assert!(!summary.is_balanced(0.2));
        assert_eq!(summary.dominant_player(0.2).map(String::as_str), Some("player_one"));
        assert!(summary.is_balanced(0.6));
        assert_eq!(summary.dominant_player(0.6), None);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_games(&[]);
        assert_eq!(summary.total_games, 0);
        assert!(summary.win_rates.is_empty());
    }

    #[test]
    fn test_record_outcome() {
        let mut metrics = GameMetrics::new("g", 0, ["a", "b"]);
        metrics.record_outcome(PlayerId::Two, ActionOutcome::Applied);
        metrics.record_outcome(PlayerId::Two, ActionOutcome::Rejected);
        metrics.record_outcome(PlayerId::Two, ActionOutcome::Applied);
        assert_eq!(metrics.players[1].actions_applied, 2);
        assert_eq!(metrics.players[1].actions_rejected, 1);
        assert_eq!(metrics.players[0].actions_applied, 0);
    }
}
