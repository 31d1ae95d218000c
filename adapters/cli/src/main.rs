#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Laser Arena episodes.
//!
//! The runner drives the environment with a built-in policy for a fixed
//! number of ticks, printing per-episode summaries and, on request, an
//! ASCII rendering of the arena after every tick.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use laser_arena_core::{CellKind, Event, HazardPhase};
use laser_arena_system_episode::{Config, Environment};
use laser_arena_system_policy::{Greedy, Policy, Random};
use laser_arena_world::{query, World};

/// Built-in policies selectable from the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyKind {
    /// Chase the coin one axis at a time.
    Greedy,
    /// Sample uniformly over the action space.
    Random,
}

/// Headless episode runner for the Laser Arena environment.
#[derive(Debug, Parser)]
#[command(name = "laser-arena", about = "Headless Laser Arena episode runner")]
struct Args {
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 2_500)]
    ticks: u32,

    /// Simulated milliseconds advanced per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Policy driving the player.
    #[arg(long, value_enum, default_value_t = PolicyKind::Greedy)]
    policy: PolicyKind,

    /// Seed for the random policy.
    #[arg(long, default_value_t = 7)]
    policy_seed: u64,

    /// JSON file overriding the default environment configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render the arena after every tick.
    #[arg(long)]
    render: bool,

    /// Log every notable world event.
    #[arg(long)]
    verbose: bool,
}

/// Entry point for the Laser Arena command-line interface.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let mut env = Environment::new(config).context("failed to construct the environment")?;
    let mut policy: Box<dyn Policy> = match args.policy {
        PolicyKind::Greedy => Box::new(Greedy),
        PolicyKind::Random => Box::new(Random::new(args.policy_seed)),
    };

    let dt = Duration::from_millis(args.tick_ms);
    let mut episodes_completed = 0u32;
    let mut episode_reward = 0.0f32;

    for _ in 0..args.ticks {
        let report = env.tick(dt, policy.as_mut());
        episode_reward += report.reward;

        if args.verbose {
            for event in env.last_events() {
                if let Some(line) = describe(event) {
                    println!("{line}");
                }
            }
        }
        if args.render {
            println!("{}", render(env.world()));
        }

        if let Some(score) = report.ended_with_score {
            episodes_completed += 1;
            println!(
                "episode {episodes_completed} over: score {score}, reward {episode_reward:.2}, lanes {}",
                env.lane_count()
            );
            episode_reward = 0.0;
        }
    }

    println!(
        "ran {} ticks: {episodes_completed} episodes completed, current score {}, previous score {}",
        args.ticks,
        query::score(env.world()),
        query::previous_score(env.world()),
    );
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::HazardActivated { hazard, cell } => Some(format!(
            "hazard {} arming at ({}, {})",
            hazard.get(),
            cell.x(),
            cell.y()
        )),
        Event::HazardDischarged { hazard, target, hit } => Some(format!(
            "hazard {} fired at ({}, {}): {}",
            hazard.get(),
            target.x(),
            target.y(),
            if *hit { "hit" } else { "miss" }
        )),
        Event::PlayerDamaged { remaining, .. } => {
            Some(format!("player hit, {} health left", remaining.get()))
        }
        Event::CoinCollected { score, .. } => Some(format!("coin collected, score {score}")),
        Event::EpisodeEnded { episode, score } => {
            Some(format!("episode {} ended with score {score}", episode.get()))
        }
        Event::EpisodeStarted { episode } => Some(format!("episode {} started", episode.get())),
        _ => None,
    }
}

fn render(world: &World) -> String {
    let grid = query::grid(world);
    let bounds = query::bounds(world);
    let player = query::player(world);
    let coin = query::coin(world);
    let hazards = query::hazard_view(world).into_vec();

    let mut out = String::new();
    for y in (bounds.min_y()..=bounds.max_y()).rev() {
        for x in bounds.min_x()..=bounds.max_x() {
            let cell = laser_arena_core::GridCoord::new(x, y);
            let glyph = if cell == player {
                '@'
            } else if cell == coin {
                'o'
            } else if let Some(snapshot) = hazards.iter().find(|snapshot| snapshot.cell == cell) {
                match snapshot.phase {
                    HazardPhase::Idle => ':',
                    HazardPhase::Prepping => '!',
                    HazardPhase::Firing => '*',
                    HazardPhase::Cooldown => '~',
                }
            } else {
                match grid.kind(cell) {
                    Some(CellKind::Wall) => '#',
                    _ => ' ',
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
