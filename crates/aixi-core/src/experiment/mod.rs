//! Experiment driver: the agent/environment interaction loop.
//!
//! A game alternates training phases (random exploration allowed) and
//! evaluation phases (always plan) until it has lasted twice the scaled cycle
//! total. Each environment episode inside a game ends when the environment
//! reports it is finished; the environment and search tree are then reset
//! while the agent keeps its model.

mod error;
pub mod telemetry;

pub use error::ExperimentError;
pub use telemetry::{CycleRecord, JsonlWriter, MemorySink, NullSink, TelemetrySink};

use std::time::Instant;

use aixi_common::{Action, Error, Percept};
use aixi_config::{validate_experiment, AgentParams, ExperimentConfig};
use rand::Rng;
use serde::Serialize;

use crate::agent::Agent;
use crate::environment::{build_environment, Environment};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::search::search;

/// Mutable schedule state threaded through every cycle of a game.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Game index within a transfer run.
    pub game: usize,
    /// Cycle within the current episode, starting at 1.
    pub cycle: u64,
    /// Cycles completed in this game.
    pub global_cycle: u64,
    /// Whether the training phase is active.
    pub explore: bool,
    pub explore_rate: f64,
    pub explore_decay: f64,
    /// Global cycle at which the phase flips next.
    pub next_phase_switch: u64,
    pub training_len: u64,
    pub evaluation_len: u64,
    /// The game stops once `global_cycle` reaches this.
    pub run_length: u64,
    pub terminate_lifetime: Option<u64>,
}

impl RunContext {
    /// Fresh schedule for one game; it starts in a training phase.
    pub fn new(config: &ExperimentConfig, game: usize) -> Self {
        let schedule = &config.schedule;
        Self {
            game,
            cycle: 1,
            global_cycle: 0,
            explore: true,
            explore_rate: config.exploration.rate,
            explore_decay: config.exploration.decay,
            next_phase_switch: schedule.training_phase_len(),
            training_len: schedule.training_phase_len(),
            evaluation_len: schedule.evaluation_phase_len(),
            run_length: schedule.run_length(),
            terminate_lifetime: schedule.terminate_lifetime,
        }
    }

    pub fn is_done(&self) -> bool {
        self.global_cycle >= self.run_length
    }

    /// Flip between training and evaluation when the switch point is
    /// reached. Returns the new phase on a flip.
    pub fn advance_phase(&mut self) -> Option<bool> {
        if self.global_cycle != self.next_phase_switch {
            return None;
        }
        self.explore = !self.explore;
        self.next_phase_switch += if self.explore {
            self.training_len
        } else {
            self.evaluation_len
        };
        Some(self.explore)
    }

    fn stage(&self) -> Stage {
        if self.explore {
            Stage::Train
        } else {
            Stage::Evaluate
        }
    }
}

/// What one call to [`run_episode`] did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeOutcome {
    pub cycles: u64,
    pub reward: u64,
    pub evaluation_cycles: u64,
    pub evaluation_reward: u64,
    /// The environment reported the end of the episode.
    pub finished: bool,
    /// The agent's lifetime limit was reached.
    pub terminated: bool,
}

/// Results for one game of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub game: usize,
    pub label: String,
    pub environment: String,
    pub cycles: u64,
    pub episodes: u64,
    pub reward: u64,
    pub average_reward: f64,
    pub evaluation_cycles: u64,
    pub evaluation_reward: u64,
    pub evaluation_average_reward: f64,
    pub terminated: bool,
}

/// Results for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentSummary {
    pub schema_version: String,
    pub run_id: String,
    pub games: Vec<GameSummary>,
    pub lifetime: u64,
    pub total_reward: u64,
    pub average_reward: f64,
    pub model_nodes: usize,
    pub elapsed_ms: u64,
}

fn ratio(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Environment seed derived from the experiment seed so that agent and
/// environment draw from different streams.
fn environment_seed(config: &ExperimentConfig) -> Option<u64> {
    config.seed.map(|seed| seed.wrapping_add(0x9e37_79b9_7f4a_7c15))
}

fn check_interface(env: &dyn Environment, params: &AgentParams) -> aixi_common::Result<()> {
    if env.num_actions() != params.actions {
        return Err(Error::Config(format!(
            "environment '{}' has {} actions but the agent has {}",
            env.name(),
            env.num_actions(),
            params.actions
        )));
    }
    if env.observation_bits() > params.observation_bits {
        return Err(Error::WidthMismatch {
            name: env.name().to_string(),
            what: "observation",
            required: env.observation_bits(),
            configured: params.observation_bits,
        });
    }
    if env.reward_bits() > params.reward_bits {
        return Err(Error::WidthMismatch {
            name: env.name().to_string(),
            what: "reward",
            required: env.reward_bits(),
            configured: params.reward_bits,
        });
    }
    Ok(())
}

fn check_percept(agent: &Agent, percept: Percept) -> aixi_common::Result<()> {
    let params = agent.params();
    if !agent.is_observation_ok(percept.observation) {
        return Err(Error::ValueOutOfRange {
            value: percept.observation,
            bits: params.observation_bits,
        });
    }
    if !agent.is_reward_ok(percept.reward) {
        return Err(Error::ValueOutOfRange {
            value: percept.reward,
            bits: params.reward_bits,
        });
    }
    Ok(())
}

/// Run one environment episode.
///
/// Stops when the environment finishes, the game's cycle budget is spent, or
/// the agent outlives `terminate_lifetime`. The agent's last update is always
/// an action when this returns.
pub fn run_episode(
    agent: &mut Agent,
    env: &mut dyn Environment,
    ctx: &mut RunContext,
    sink: &dyn TelemetrySink,
    log: &LogContext,
) -> Result<EpisodeOutcome, ExperimentError> {
    let mut outcome = EpisodeOutcome::default();
    // Action whose search subtree can be kept for the next cycle.
    let mut planned: Option<Action> = None;
    ctx.cycle = 1;

    while !ctx.is_done() {
        if let Some(limit) = ctx.terminate_lifetime {
            if agent.lifetime() > limit {
                log_event!(
                    log,
                    INFO,
                    event_names::LIFETIME_TERMINATED,
                    ctx.stage(),
                    "terminating lifetime",
                    lifetime = agent.lifetime()
                );
                outcome.terminated = true;
                break;
            }
        }

        let percept = env.percept();
        check_percept(agent, percept).map_err(|source| ExperimentError::Cycle {
            global_cycle: ctx.global_cycle,
            source,
        })?;

        match planned {
            Some(action) if agent.params().reuse_search_tree => {
                agent.search_tree_prune(action, percept)
            }
            _ => agent.search_tree_reset(),
        }
        agent.model_update_percept(percept.observation, percept.reward);
        let finished = env.is_finished();

        if let Some(explore) = ctx.advance_phase() {
            log_event!(
                log,
                INFO,
                event_names::PHASE_SWITCHED,
                ctx.stage(),
                if explore {
                    "starting training phase"
                } else {
                    "starting evaluation phase"
                },
                global_cycle = ctx.global_cycle
            );
        }

        let explored = ctx.explore && agent.rng_mut().random::<f64>() < ctx.explore_rate;
        planned = None;
        let action = if explored {
            agent.gen_random_action()
        } else if agent.history_size() >= agent.max_tree_depth() {
            let action = search(agent);
            planned = Some(action);
            action
        } else {
            agent.gen_random_action()
        };
        agent.model_update_action(action);

        let record = CycleRecord {
            game: ctx.game,
            environment: env.name().to_string(),
            global_cycle: ctx.global_cycle,
            cycle: ctx.cycle,
            observation: percept.observation,
            reward: percept.reward,
            action,
            explore_on: ctx.explore,
            explored,
            explore_rate: ctx.explore_rate,
            total_reward: agent.total_reward(),
            average_reward: agent.average_reward(),
            finished,
        };
        sink.record(&record)?;

        let stage = if agent.history_size() < agent.max_tree_depth() {
            Stage::Prime
        } else {
            ctx.stage()
        };
        log_event!(
            log,
            DEBUG,
            event_names::CYCLE_COMPLETED,
            stage,
            "cycle",
            global_cycle = record.global_cycle,
            cycle = record.cycle,
            observation = record.observation,
            reward = record.reward,
            action = record.action,
            explored = record.explored,
            search_tree_size = agent.search_tree().size()
        );

        outcome.cycles += 1;
        outcome.reward += percept.reward;
        if !ctx.explore {
            outcome.evaluation_cycles += 1;
            outcome.evaluation_reward += percept.reward;
        }
        ctx.global_cycle += 1;

        // The finishing percept is modelled but no action is sent back.
        if finished {
            outcome.finished = true;
            break;
        }

        env.perform_action(action)
            .map_err(|source| ExperimentError::Cycle {
                global_cycle: record.global_cycle,
                source,
            })?;

        if ctx.explore {
            ctx.explore_rate *= ctx.explore_decay;
        }
        ctx.cycle += 1;
    }

    Ok(outcome)
}

/// Play one game: repeat episodes until the game's cycle budget is spent.
pub fn run_game(
    agent: &mut Agent,
    env: &mut dyn Environment,
    config: &ExperimentConfig,
    game: usize,
    sink: &dyn TelemetrySink,
    log: &LogContext,
) -> Result<GameSummary, ExperimentError> {
    check_interface(env, agent.params())?;
    let mut ctx = RunContext::new(config, game);
    let mut summary = GameSummary {
        game,
        label: config.label().to_string(),
        environment: env.name().to_string(),
        cycles: 0,
        episodes: 0,
        reward: 0,
        average_reward: 0.0,
        evaluation_cycles: 0,
        evaluation_reward: 0,
        evaluation_average_reward: 0.0,
        terminated: false,
    };

    log_event!(
        log,
        INFO,
        event_names::GAME_STARTED,
        Stage::Init,
        "game started",
        game = game,
        environment = env.name(),
        run_length = ctx.run_length
    );

    while !ctx.is_done() {
        let outcome = run_episode(agent, env, &mut ctx, sink, log)?;
        summary.episodes += 1;
        summary.cycles += outcome.cycles;
        summary.reward += outcome.reward;
        summary.evaluation_cycles += outcome.evaluation_cycles;
        summary.evaluation_reward += outcome.evaluation_reward;

        if outcome.finished {
            log_event!(
                log,
                DEBUG,
                event_names::EPISODE_FINISHED,
                ctx.stage(),
                "episode finished",
                episode = summary.episodes,
                cycles = outcome.cycles,
                reward = outcome.reward
            );
        }

        env.reset();
        agent.search_tree_reset();

        if outcome.terminated {
            summary.terminated = true;
            break;
        }
    }
    sink.flush()?;

    summary.average_reward = ratio(summary.reward, summary.cycles);
    summary.evaluation_average_reward =
        ratio(summary.evaluation_reward, summary.evaluation_cycles);
    Ok(summary)
}

fn summarize(agent: &Agent, games: Vec<GameSummary>, log: &LogContext, started: Instant) -> ExperimentSummary {
    ExperimentSummary {
        schema_version: aixi_common::SCHEMA_VERSION.to_string(),
        run_id: log.run_id.clone(),
        games,
        lifetime: agent.lifetime(),
        total_reward: agent.total_reward(),
        average_reward: agent.average_reward(),
        model_nodes: agent.context_tree().size(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}

/// Run a single-game experiment from a validated configuration.
pub fn run_experiment(
    config: &ExperimentConfig,
    sink: &dyn TelemetrySink,
    log: &LogContext,
) -> Result<ExperimentSummary, ExperimentError> {
    validate_experiment(config)?;
    let started = Instant::now();
    let params = config.agent_params()?;
    let mut agent = Agent::new(params, config.seed);
    let mut env = build_environment(&config.environment, environment_seed(config))?;

    log_event!(
        log,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "run started",
        environment = config.environment.name(),
        ct_depth = config.agent.ct_depth,
        horizon = config.agent.horizon
    );

    let game = run_game(&mut agent, env.as_mut(), config, 0, sink, log)?;
    let summary = summarize(&agent, vec![game], log, started);

    log_event!(
        log,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "run finished",
        total_reward = summary.total_reward,
        lifetime = summary.lifetime
    );
    Ok(summary)
}

/// Transfer run: play `first`, then `second`, then `first` again with one
/// agent. The model carries over between games; planner settings and widths
/// follow the game being played.
pub fn run_transfer(
    first: &ExperimentConfig,
    second: &ExperimentConfig,
    sink: &dyn TelemetrySink,
    log: &LogContext,
) -> Result<ExperimentSummary, ExperimentError> {
    validate_experiment(first)?;
    validate_experiment(second)?;
    let started = Instant::now();
    let first_params = first.agent_params()?;
    let second_params = second.agent_params()?;
    let mut agent = Agent::new(first_params.clone(), first.seed);

    log_event!(
        log,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "transfer run started",
        first = first.environment.name(),
        second = second.environment.name()
    );

    let schedule = [(first, &first_params), (second, &second_params), (first, &first_params)];
    let mut games = Vec::with_capacity(schedule.len());
    for (game, (config, params)) in schedule.into_iter().enumerate() {
        if game > 0 {
            agent.reconfigure(params.clone());
        }
        let mut env = build_environment(&config.environment, environment_seed(config))?;
        let game_log = log.with_experiment(config.label());
        games.push(run_game(&mut agent, env.as_mut(), config, game, sink, &game_log)?);
    }

    let summary = summarize(&agent, games, log, started);
    log_event!(
        log,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "transfer run finished",
        total_reward = summary.total_reward,
        lifetime = summary.lifetime
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aixi_common::{Observation, Reward};
    use aixi_config::{AgentConfig, EnvironmentConfig, EnvironmentInterface, ExplorationConfig, ScheduleConfig};

    fn quick_config(environment: EnvironmentConfig, total_cycles: u64) -> ExperimentConfig {
        ExperimentConfig {
            environment,
            agent: AgentConfig {
                ct_depth: 4,
                horizon: 3,
                search_timeout_secs: 60.0,
                max_simulations: Some(4),
                ..Default::default()
            },
            exploration: ExplorationConfig {
                rate: 0.5,
                decay: 0.99,
            },
            schedule: ScheduleConfig {
                total_cycles,
                ..Default::default()
            },
            seed: Some(17),
            ..Default::default()
        }
    }

    fn log() -> LogContext {
        LogContext::new("run-test", "unit")
    }

    #[test]
    fn test_phase_schedule() {
        let config = quick_config(EnvironmentConfig::default(), 100);
        let mut ctx = RunContext::new(&config, 0);
        assert!(ctx.explore);
        assert_eq!(ctx.run_length, 200);

        let mut switches = Vec::new();
        while !ctx.is_done() {
            if let Some(explore) = ctx.advance_phase() {
                switches.push((ctx.global_cycle, explore));
            }
            ctx.global_cycle += 1;
        }
        assert_eq!(
            &switches[..4],
            &[(20, false), (30, true), (50, false), (60, true)]
        );
    }

    #[test]
    fn test_coin_flip_runs_full_length() {
        let config = quick_config(EnvironmentConfig::CoinFlip { p: 0.7 }, 25);
        let sink = MemorySink::new();
        let summary = run_experiment(&config, &sink, &log()).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 50);
        assert_eq!(summary.games.len(), 1);
        assert_eq!(summary.games[0].cycles, 50);
        assert_eq!(summary.games[0].episodes, 1);
        assert_eq!(summary.lifetime, 50);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.global_cycle, i as u64);
            assert_eq!(record.cycle, i as u64 + 1);
            assert!(record.action < 2);
            assert!(!record.finished);
            if record.explored {
                assert!(record.explore_on);
            }
        }
        let rewards: u64 = records.iter().map(|r| r.reward).sum();
        assert_eq!(rewards, summary.total_reward);
    }

    #[test]
    fn test_exploration_rate_decays_in_training() {
        let mut config = quick_config(EnvironmentConfig::CoinFlip { p: 0.5 }, 50);
        config.exploration = ExplorationConfig {
            rate: 1.0,
            decay: 0.5,
        };
        let sink = MemorySink::new();
        run_experiment(&config, &sink, &log()).unwrap();

        let records = sink.records();
        assert!((records[0].explore_rate - 1.0).abs() < 1e-12);
        assert!((records[1].explore_rate - 0.5).abs() < 1e-12);
        assert!((records[2].explore_rate - 0.25).abs() < 1e-12);
        // Evaluation cycles never explore and leave the rate alone.
        let evaluation: Vec<_> = records.iter().filter(|r| !r.explore_on).collect();
        assert!(!evaluation.is_empty());
        assert!(evaluation.iter().all(|r| !r.explored));
    }

    #[test]
    fn test_finished_episodes_restart_cycle_count() {
        let mut config = quick_config(
            EnvironmentConfig::CheeseMaze {
                layout: aixi_config::environment::default_maze_layout(),
                start: None,
            },
            100,
        );
        config.exploration.rate = 1.0;
        config.exploration.decay = 1.0;
        let sink = MemorySink::new();
        let summary = run_experiment(&config, &sink, &log()).unwrap();

        let records = sink.records();
        assert_eq!(records.len() as u64, summary.games[0].cycles);
        for pair in records.windows(2) {
            if pair[0].finished {
                assert_eq!(pair[1].cycle, 1);
            } else {
                assert_eq!(pair[1].cycle, pair[0].cycle + 1);
            }
        }
        let finished = records.iter().filter(|r| r.finished).count() as u64;
        let open_tail = u64::from(!records.last().unwrap().finished);
        assert_eq!(summary.games[0].episodes, finished + open_tail);
    }

    #[test]
    fn test_terminate_lifetime_ends_game() {
        let mut config = quick_config(EnvironmentConfig::CoinFlip { p: 0.7 }, 1000);
        config.schedule.terminate_lifetime = Some(10);
        let sink = MemorySink::new();
        let summary = run_experiment(&config, &sink, &log()).unwrap();

        assert!(summary.games[0].terminated);
        assert_eq!(sink.len(), 11);
        assert_eq!(summary.lifetime, 11);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = quick_config(
            EnvironmentConfig::CheeseMaze {
                layout: aixi_config::environment::default_maze_layout(),
                start: None,
            },
            10,
        );
        config.agent.observation_bits = Some(1);
        let err = run_experiment(&config, &NullSink, &log()).unwrap_err();
        assert_eq!(err.code(), 65);
    }

    struct Loud;

    impl Environment for Loud {
        fn name(&self) -> &'static str {
            "loud"
        }
        fn interface(&self) -> EnvironmentInterface {
            EnvironmentInterface {
                actions: 2,
                observation_bits: 1,
                reward_bits: 1,
            }
        }
        fn observation(&self) -> Observation {
            3
        }
        fn reward(&self) -> Reward {
            0
        }
        fn perform_action(&mut self, _action: Action) -> aixi_common::Result<()> {
            Ok(())
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn test_oversized_percept_is_an_error() {
        let config = quick_config(EnvironmentConfig::default(), 10);
        let mut agent = Agent::new(config.agent_params().unwrap(), Some(1));
        let mut ctx = RunContext::new(&config, 0);
        let err = run_episode(&mut agent, &mut Loud, &mut ctx, &NullSink, &log()).unwrap_err();
        assert_eq!(err.code(), 21);
        assert_eq!(agent.history_size(), 0);
    }

    #[test]
    fn test_transfer_plays_three_games() {
        let first = quick_config(EnvironmentConfig::CoinFlip { p: 0.7 }, 10);
        let mut second = quick_config(EnvironmentConfig::BiasedRockPaperScissors, 10);
        second.agent.ct_depth = 6;
        let sink = MemorySink::new();
        let summary = run_transfer(&first, &second, &sink, &log()).unwrap();

        assert_eq!(summary.games.len(), 3);
        assert_eq!(summary.games[0].environment, "coin-flip");
        assert_eq!(summary.games[1].environment, "biased-rock-paper-scissors");
        assert_eq!(summary.games[2].environment, "coin-flip");
        assert_eq!(summary.lifetime, 60);

        let records = sink.records();
        assert_eq!(records.len(), 60);
        assert!(records[20..40].iter().all(|r| r.game == 1 && r.action < 3));
        assert_eq!(records[40].global_cycle, 0);
    }
}
