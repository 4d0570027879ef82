//! Integration tests for GA Life

use ga_life::checkpoint::{load_state, save_state, Checkpoint, CheckpointError, CheckpointManager};
use ga_life::influence::compute_influence;
use ga_life::probability::{birth_probability, survival_probability};
use ga_life::stats::cluster_sizes;
use ga_life::validation::{validate_state, ValidationError};
use ga_life::{
    advance, advance_parallel, create_grid, hash_grid, Cell, Config, Gene, GeneValue, Grid,
    Mulberry32, SimParams, Simulation, DEFAULT_PARAMS,
};

fn run_ticks(seed: u32, ticks: usize) -> Grid {
    let mut rng = Mulberry32::new(seed);
    let mut grid = create_grid(10, 10, 0.25, &mut rng).unwrap();
    for _ in 0..ticks {
        grid = advance(&grid, &DEFAULT_PARAMS, &mut rng).grid;
    }
    grid
}

#[test]
fn test_reproducible_reference_run() {
    let first = run_ticks(12345, 5);
    let second = run_ticks(12345, 5);
    assert_eq!(hash_grid(&first), hash_grid(&second));
    assert_eq!(hash_grid(&first), "f5e8a3d6");
}

#[test]
fn test_seeds_diverge() {
    let one = hash_grid(&run_ticks(1, 5));
    let two = hash_grid(&run_ticks(2, 5));
    assert_ne!(one, two);
    assert_eq!(one, "8777a95b");
    assert_eq!(two, "310cfbe0");
}

#[test]
fn test_rng_resumability() {
    let mut rng = Mulberry32::new(12345);
    let a = rng.next_f64();
    let state = rng.state();
    let b = rng.next_f64();

    let mut resumed = Mulberry32::new(0);
    resumed.set_state(state);
    let c = resumed.next_f64();

    assert_eq!(c, b);
    assert_ne!(a, b);
}

#[test]
fn test_single_cell_torus_influence() {
    let mut grid = Grid::new(1, 1).unwrap();
    grid.set_cell(0, Cell::newborn(Gene::uniform(GeneValue::Ten)));
    assert_eq!(compute_influence(&grid), vec![76.0]);
}

#[test]
fn test_probability_bounds() {
    let params_sets = [
        DEFAULT_PARAMS,
        SimParams { alpha: 50.0, delta: 0.5, ..DEFAULT_PARAMS },
        SimParams { gamma: 0.3, delta: -2.0, ..DEFAULT_PARAMS },
        SimParams { beta: 3.0, gamma: 2.5, ..DEFAULT_PARAMS },
        SimParams { alpha: -4.0, gamma: 0.5, ..DEFAULT_PARAMS },
    ];
    for params in &params_sets {
        for step in -400..=400 {
            let s = step as f64 * 0.5;
            for p in [survival_probability(s, params), birth_probability(s, params)] {
                assert!((0.0..=1.0).contains(&p), "s {} gave {}", s, p);
            }
        }
    }
}

#[test]
fn test_conservation_and_statistics_over_long_run() {
    let mut config = Config::default();
    config.world.width = 30;
    config.world.height = 20;
    config.terrain.double_fraction = 0.15;
    config.terrain.half_fraction = 0.15;
    let mut sim = Simulation::new_with_seed(config, 4242).unwrap();

    for _ in 0..30 {
        let before = sim.population() as i64;
        let stats = sim.step().clone();
        let after = sim.grid.alive_count() as i64;
        assert_eq!(stats.births as i64 - stats.deaths as i64, after - before);
        assert_eq!(stats.alive_count as i64, after);

        assert!(stats.gene_entropy >= 0.0);
        assert!(stats.gene_entropy <= 5f64.log2() + 1e-12);
        assert!(stats.largest_cluster_size <= stats.alive_count);
        assert_eq!(stats.cluster_count == 0, stats.alive_count == 0);

        let members: Vec<bool> = sim.grid.cells().iter().map(|c| c.is_alive()).collect();
        let sizes = cluster_sizes(&sim.grid, &members);
        assert_eq!(sizes.iter().sum::<usize>(), stats.alive_count);
        assert_eq!(sizes.len(), stats.cluster_count);

        let breakdown = &stats.terrain_breakdown;
        assert_eq!(
            breakdown.normal.alive_count + breakdown.double.alive_count + breakdown.half.alive_count,
            stats.alive_count
        );
    }
}

#[test]
fn test_state_file_resume_matches_continuous_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut config = Config::default();
    config.world.width = 20;
    config.world.height = 15;

    let mut continuous = Simulation::new_with_seed(config.clone(), 777).unwrap();
    continuous.run(20);

    let mut first = Simulation::new_with_seed(config, 777).unwrap();
    first.run(10);
    save_state(&path, &first.to_state()).unwrap();

    let loaded = load_state(&path).unwrap();
    assert_eq!(loaded.tick, 10);
    let mut resumed = Simulation::from_state(loaded, Config::default());
    resumed.run(10);

    assert_eq!(resumed.tick, 20);
    assert_eq!(resumed.hash(), continuous.hash());
}

#[test]
fn test_parallel_state_file_resume_matches_continuous_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut config = Config::default();
    config.world.width = 20;
    config.world.height = 15;
    config.run.parallel = true;

    let mut continuous = Simulation::new_with_seed(config.clone(), 777).unwrap();
    continuous.run(12);

    let mut first = Simulation::new_with_seed(config, 777).unwrap();
    first.run(6);
    save_state(&path, &first.to_state()).unwrap();

    let mut resumed = Simulation::from_state(load_state(&path).unwrap(), Config::default());
    assert!(resumed.config.run.parallel);
    resumed.run(6);

    assert_eq!(resumed.hash(), continuous.hash());
}

#[test]
fn test_resumed_history_matches_continuous_run() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let checkpoint_path = dir.path().join("checkpoint.bin");

    let mut config = Config::default();
    config.world.width = 20;
    config.world.height = 15;
    config.logging.stats_interval = 1;

    let mut continuous = Simulation::new_with_seed(config.clone(), 4321).unwrap();
    continuous.run(12);

    let mut first = Simulation::new_with_seed(config, 4321).unwrap();
    first.run(6);
    save_state(&state_path, &first.to_state()).unwrap();
    first.create_checkpoint().save(&checkpoint_path).unwrap();

    let from_json = Simulation::from_state(load_state(&state_path).unwrap(), Config::default());
    let from_binary = Simulation::from_checkpoint(Checkpoint::load(&checkpoint_path).unwrap());

    for mut resumed in [from_json, from_binary] {
        let at_resume = resumed.stats_history.get_at(6).unwrap().stats.clone();
        assert_eq!(at_resume, continuous.stats_history.get_at(6).unwrap().stats);
        assert!(at_resume.births + at_resume.deaths > 0);

        resumed.run(6);
        let counts = |sim: &Simulation| -> Vec<(u64, usize, usize, usize)> {
            sim.stats_history
                .snapshots
                .iter()
                .map(|r| (r.tick, r.stats.births, r.stats.deaths, r.stats.alive_count))
                .collect()
        };
        assert_eq!(counts(&resumed), counts(&continuous));
        assert_eq!(resumed.stats_history, continuous.stats_history);
    }
}

#[test]
fn test_state_without_rng_state_reseeds() {
    let sim = Simulation::new_with_seed(Config::default(), 5).unwrap();
    let mut state = sim.to_state();
    state.rng_state = None;
    state.tick = Some(0);

    let restored = Simulation::from_state(validate_state(&state).unwrap(), Config::default());
    assert_eq!(restored.rng_state(), Mulberry32::new(5).state());
    assert_eq!(restored.tick, 0);
    assert_eq!(restored.grid, sim.grid);
}

#[test]
fn test_future_schema_rejected() {
    let sim = Simulation::new_with_seed(Config::default(), 5).unwrap();
    let mut state = sim.to_state();
    state.schema_version = Some(2);
    assert!(matches!(
        validate_state(&state),
        Err(ValidationError::SchemaVersion { found: 2, .. })
    ));
}

#[test]
fn test_malformed_json_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"grid": {"width": 2}}"#).unwrap();
    assert!(matches!(load_state(&path), Err(CheckpointError::Json(_))));

    let path = dir.path().join("live_zero.json");
    let json = r#"{
        "grid": {
            "width": 1, "height": 1,
            "cells": [{ "isAlive": true, "gene": [0, 0, 0, 0], "age": 1 }],
            "terrain": ["normal"]
        },
        "params": {
            "alpha": 4, "beta": -0.15, "gamma": 1, "mu": 20, "nu": 27.5,
            "delta": -0.07, "epsilon": 0.03, "p_mut": 0.02
        },
        "seed": 1
    }"#;
    std::fs::write(&path, json).unwrap();
    assert!(matches!(
        load_state(&path),
        Err(CheckpointError::Validation(ValidationError::LiveGene { index: 0, .. }))
    ));
}

#[test]
fn test_checkpoint_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.world.width = 25;
    config.world.height = 25;

    let mut sim = Simulation::new_with_seed(config, 54321).unwrap();
    sim.run(15);

    let mut manager = CheckpointManager::new(dir.path(), 5, 3).unwrap();
    let path = manager.save(&sim.create_checkpoint()).unwrap();
    assert_eq!(manager.find_latest(), Some(path.clone()));

    let loaded = Checkpoint::load(&path).unwrap();
    assert_eq!(loaded.tick, 15);
    assert_eq!(loaded.seed, sim.seed());

    let mut restored = Simulation::from_checkpoint(loaded);
    assert_eq!(restored.population(), sim.population());

    restored.run(10);
    sim.run(10);
    assert_eq!(restored.tick, 25);
    assert_eq!(restored.hash(), sim.hash());
}

#[test]
fn test_parallel_mode_is_reproducible_per_seed() {
    let run = |seed: u32| {
        let mut rng = Mulberry32::new(seed);
        let mut grid = create_grid(40, 30, 0.3, &mut rng).unwrap();
        for _ in 0..8 {
            grid = advance_parallel(&grid, &DEFAULT_PARAMS, &mut rng).grid;
        }
        hash_grid(&grid)
    };
    assert_eq!(run(10), run(10));
    assert_ne!(run(10), run(11));
}

#[test]
fn test_parallel_simulation_flag() {
    let mut config = Config::default();
    config.world.width = 16;
    config.world.height = 16;
    config.run.parallel = true;

    let mut a = Simulation::new_with_seed(config.clone(), 3).unwrap();
    let mut b = Simulation::new_with_seed(config, 3).unwrap();
    a.run(5);
    b.run(5);
    assert_eq!(a.hash(), b.hash());
}
