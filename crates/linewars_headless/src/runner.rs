//! Headless runner: a JSON-lines session around one match.

use std::io::{BufRead, Write};

use linewars_core::data::MatchConfig;
use linewars_core::simulation::Match;

use crate::protocol::{Command, ProtocolError, Response};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Match configuration.
    pub match_config: MatchConfig,
    /// Seed of the first episode.
    pub seed: u64,
}

/// Headless runner for agent-controlled matches.
#[derive(Debug)]
pub struct HeadlessRunner {
    game: Match,
}

impl HeadlessRunner {
    /// Create a runner with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the match configuration is invalid.
    pub fn new(config: HeadlessConfig) -> Result<Self, ProtocolError> {
        let game = Match::new(config.match_config, config.seed)?;
        Ok(Self { game })
    }

    /// The match being driven.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// Run the session until `quit` or end of input.
    ///
    /// Malformed lines and refused commands produce an `error` response and
    /// the session continues.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<(), ProtocolError> {
        send(&mut output, &Response::ready(&self.game))?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match Command::from_json(line) {
                Ok(Command::Quit) => {
                    send(&mut output, &Response::Bye)?;
                    tracing::info!(tick = self.game.tick_count(), "Session ended");
                    return Ok(());
                }
                Ok(cmd) => self.handle(&cmd),
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected input line");
                    Response::error(e.to_string(), None)
                }
            };
            send(&mut output, &response)?;
        }

        tracing::info!(tick = self.game.tick_count(), "Input closed");
        Ok(())
    }

    /// Execute one command and build its response.
    pub fn handle(&mut self, cmd: &Command) -> Response {
        match self.execute(cmd) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(cmd = cmd.name(), error = %e, "Command failed");
                Response::error(e.to_string(), Some(cmd.name()))
            }
        }
    }

    fn execute(&mut self, cmd: &Command) -> Result<Response, ProtocolError> {
        let response = match *cmd {
            Command::Reset { seed } => {
                match seed {
                    Some(seed) => self.game.reseed(seed),
                    None => self.game.reset(),
                }
                tracing::debug!(seed = self.game.seed(), "Episode reset");
                Response::ready(&self.game)
            }
            Command::Observe {
                player,
                representation,
            } => Response::Observation {
                tick: self.game.tick_count(),
                player,
                observation: self.game.get_state(player, representation),
            },
            Command::Step {
                player,
                action,
                intensity,
                representation,
            } => {
                let result = self.game.step(player, action, intensity, representation)?;
                Response::Step { player, result }
            }
            Command::Tick { count } => {
                for _ in 0..count {
                    if self.game.is_over() {
                        break;
                    }
                    self.game.tick();
                }
                Response::Ticked {
                    tick: self.game.tick_count(),
                    winner: self.game.winner(),
                }
            }
            Command::Hash => Response::Hash {
                tick: self.game.tick_count(),
                hash: self.game.state_hash(),
            },
            Command::Status => Response::status(&self.game),
            Command::Quit => Response::Bye,
        };
        Ok(response)
    }
}

fn send<W: Write>(output: &mut W, response: &Response) -> Result<(), ProtocolError> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linewars_core::action::ActionOutcome;
    use linewars_core::components::PlayerId;
    use linewars_core::observation::Representation;

    fn runner() -> HeadlessRunner {
        HeadlessRunner::new(HeadlessConfig {
            match_config: MatchConfig::default(),
            seed: 42,
        })
        .unwrap()
    }

    #[test]
    fn test_step_spawns_unit() {
        let mut runner = runner();
        let response = runner.handle(&Command::Step {
            player: PlayerId::One,
            action: 2,
            intensity: 0.0,
            representation: Representation::Features,
        });

        let Response::Step { result, .. } = response else {
            panic!("expected step response, got {response:?}");
        };
        assert_eq!(result.info.outcome, ActionOutcome::Applied);
        assert_eq!(result.info.tick, 1);
        assert!(!result.terminal);
        assert_eq!(runner.game().player(PlayerId::One).spawn_count, 1);
    }

    #[test]
    fn test_invalid_action_is_error_response() {
        let mut runner = runner();
        let response = runner.handle(&Command::Step {
            player: PlayerId::One,
            action: 99,
            intensity: 0.5,
            representation: Representation::Layers,
        });
        assert!(matches!(response, Response::Error { cmd: Some(ref c), .. } if c == "step"));
        assert_eq!(runner.game().tick_count(), 0);
    }

    #[test]
    fn test_reset_with_seed() {
        let mut runner = runner();
        runner.handle(&Command::Tick { count: 5 });
        let response = runner.handle(&Command::Reset { seed: Some(3) });
        assert!(matches!(response, Response::Ready { tick: 0, seed: 3, .. }));
    }

    #[test]
    fn test_session_over_buffers() {
        let input = concat!(
            r#"{"cmd":"tick","count":3}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"cmd":"hash"}"#,
            "\n",
            r#"{"cmd":"quit"}"#,
            "\n",
            r#"{"cmd":"tick"}"#,
            "\n",
        );
        let mut output = Vec::new();
        runner().run(input.as_bytes(), &mut output).unwrap();

        let lines: Vec<Response> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 5);
        assert!(matches!(lines[0], Response::Ready { tick: 0, seed: 42, .. }));
        assert!(matches!(lines[1], Response::Ticked { tick: 3, winner: None }));
        assert!(matches!(lines[2], Response::Error { cmd: None, .. }));
        assert!(matches!(lines[3], Response::Hash { tick: 3, .. }));
        assert_eq!(lines[4], Response::Bye);
    }
}
