//! Headless Skirmish Runner
//!
//! Plays a scripted battle using the engine's own primitives and prints a
//! JSON or text result. The decision script lives here - the engine only
//! exposes move/attack/turn operations.

use clap::Parser;
use gridclash::engine::{
    AttackStyle, BattleGrid, BattleOutcome, GridCoord, Role, Team, UnitConfig, UnitId,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run a scripted grid battle and output the result")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum rounds before calling the battle a stalemate
    #[arg(long, default_value_t = 50)]
    max_rounds: u32,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable verbose engine logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishResult {
    outcome: String,
    rounds: u32,
    player_alive: usize,
    enemy_alive: usize,
    seed: u64,
    log: Vec<String>,
}

fn player_roster() -> Vec<UnitConfig> {
    vec![
        UnitConfig {
            name: "Knight".into(),
            role: Role::Player,
            team: Team::Player,
            max_hp: 55,
            attack: 13,
            defense: 8,
            speed: 21,
            luck: 5,
            attack_range: 1,
            attack_style: AttackStyle::Melee,
            movement_range: 3,
        },
        UnitConfig {
            name: "Archer".into(),
            role: Role::Ally,
            team: Team::Player,
            max_hp: 40,
            attack: 11,
            defense: 4,
            speed: 15,
            luck: 8,
            attack_range: 5,
            attack_style: AttackStyle::Ranged,
            movement_range: 3,
        },
        UnitConfig {
            name: "Mage".into(),
            role: Role::Ally,
            team: Team::Player,
            max_hp: 35,
            attack: 14,
            defense: 3,
            speed: 12,
            luck: 6,
            attack_range: 4,
            attack_style: AttackStyle::Magic,
            movement_range: 2,
        },
    ]
}

fn enemy_roster() -> Vec<UnitConfig> {
    vec![
        UnitConfig {
            name: "Warlord".into(),
            role: Role::Boss,
            team: Team::Enemy,
            max_hp: 70,
            attack: 12,
            defense: 7,
            speed: 14,
            luck: 4,
            attack_range: 1,
            attack_style: AttackStyle::Melee,
            movement_range: 3,
        },
        UnitConfig {
            name: "Raider".into(),
            role: Role::Minion,
            team: Team::Enemy,
            max_hp: 45,
            attack: 10,
            defense: 5,
            speed: 16,
            luck: 3,
            attack_range: 1,
            attack_style: AttackStyle::Melee,
            movement_range: 4,
        },
        UnitConfig {
            name: "Hexer".into(),
            role: Role::Minion,
            team: Team::Enemy,
            max_hp: 38,
            attack: 12,
            defense: 3,
            speed: 11,
            luck: 5,
            attack_range: 4,
            attack_style: AttackStyle::Magic,
            movement_range: 2,
        },
    ]
}

fn nearest_enemy(grid: &BattleGrid, id: UnitId) -> Option<GridCoord> {
    let unit = grid.unit(id)?;
    let foes = match unit.team {
        Team::Player => Team::Enemy,
        Team::Enemy => Team::Player,
    };
    grid.team_units(foes)
        .into_iter()
        .filter_map(|fid| grid.unit(fid))
        .filter(|u| u.alive)
        .map(|u| u.position)
        .min_by_key(|pos| unit.position.chebyshev_distance(pos))
}

fn in_attack_range(grid: &BattleGrid, id: UnitId, target: GridCoord) -> bool {
    grid.unit(id)
        .map_or(false, |u| u.position.chebyshev_distance(&target) <= u.attack_range)
}

/// Greedy script: close on the nearest enemy, attack when in range.
fn play_turn(grid: &mut BattleGrid, id: UnitId) {
    let Some(target) = nearest_enemy(grid, id) else {
        return;
    };

    if !in_attack_range(grid, id, target) {
        if let Ok(options) = grid.movement_range(id) {
            let current = grid
                .unit(id)
                .map(|u| u.position.chebyshev_distance(&target))
                .unwrap_or(0);
            let dest = options
                .into_iter()
                .min_by_key(|c| (c.chebyshev_distance(&target), c.row, c.col));
            if let Some(dest) = dest {
                if dest.chebyshev_distance(&target) < current {
                    let _ = grid.move_unit(id, dest);
                }
            }
        }
    }

    if let Some(target) = nearest_enemy(grid, id) {
        if in_attack_range(grid, id, target) {
            let _ = grid.perform_attack(id, target);
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut grid = BattleGrid::with_seed(seed);
    grid.setup_battle(player_roster(), enemy_roster());

    while !grid.is_ended() && grid.round() <= args.max_rounds {
        let Some(active) = grid.active_unit() else {
            break;
        };
        play_turn(&mut grid, active);
        if grid.is_ended() {
            break;
        }
        if grid.end_current_turn().is_err() {
            break;
        }
    }

    let outcome = match grid.outcome() {
        BattleOutcome::Victory => "victory",
        BattleOutcome::Defeat => "defeat",
        BattleOutcome::Undecided => "stalemate",
    };

    let result = SkirmishResult {
        outcome: outcome.to_string(),
        rounds: grid.round(),
        player_alive: grid.living_count(Team::Player),
        enemy_alive: grid.living_count(Team::Enemy),
        seed,
        log: grid.log_tail(20).into_iter().map(|e| e.message).collect(),
    };

    if args.format == "text" {
        println!("outcome: {} after {} rounds", result.outcome, result.rounds);
        println!("player units alive: {}", result.player_alive);
        println!("enemy units alive: {}", result.enemy_alive);
        for line in &result.log {
            println!("  {}", line);
        }
    } else {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("failed to serialize result: {}", e),
        }
    }
}
