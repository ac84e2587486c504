//! End-to-end checks of the simulation core.
//!
//! These tests drive the public API the way a host application would and
//! verify determinism, matrix completeness, neighbor completeness and the
//! force law on hand-computed inputs.

use particle_life::physics::reflect;
use particle_life::prelude::*;
use particle_life::spatial::MAX_GRID_RESOLUTION;
use particle_life::{SpatialConfig, SpatialGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn four_species() -> RuleMatrix {
    RuleMatrix::from_names(["green", "red", "yellow", "blue"]).unwrap()
}

fn assert_complete(rules: &RuleMatrix) {
    let k = rules.len();
    assert!(k >= 1);
    assert_eq!(rules.dense().size(), k);
    let sparse = rules.sparse();
    let names: Vec<&str> = rules.species().names().collect();
    for a in &names {
        for b in &names {
            assert!(sparse[*a][*b].is_finite(), "missing {a} -> {b}");
        }
    }
}

// ============================================================================
// Rule matrix properties
// ============================================================================

#[test]
fn test_randomize_is_bit_identical_for_equal_seeds() {
    let mut a = four_species();
    let mut b = four_species();
    a.randomize(&mut Mulberry32::new(42));
    b.randomize(&mut Mulberry32::new(42));
    let sa = a.sparse();
    a.flatten(&sa);
    let sb = b.sparse();
    b.flatten(&sb);
    let bits = |m: &RuleMatrix| m.dense().data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn test_matrix_complete_after_random_mutations() {
    let mut rules = four_species();
    let mut rng = Mulberry32::new(1234);
    let mut choices = StdRng::seed_from_u64(5);
    rules.randomize(&mut rng);

    for step in 0..200 {
        match choices.gen_range(0..5) {
            0 => {
                let name = rules.species().next_default_name();
                rules
                    .add_species(Species::new(name, Vec3::ONE), &mut rng)
                    .unwrap();
            }
            1 => {
                let _ = rules.remove_species();
            }
            2 => {
                let index = choices.gen_range(0..rules.len());
                let old = rules.species().get(index).unwrap().name.clone();
                rules
                    .rename_species(&old, &format!("renamed{step}"))
                    .unwrap();
            }
            3 => rules.randomize(&mut rng),
            _ => rules.symmetrize(),
        }
        assert_complete(&rules);
    }
}

#[test]
fn test_symmetrize_twice_equals_once() {
    let mut rules = four_species();
    rules.randomize(&mut Mulberry32::new(9));
    rules.symmetrize();
    let once = rules.dense().clone();
    rules.symmetrize();
    assert_eq!(rules.dense(), &once);
}

#[test]
fn test_rename_to_fresh_name_relabels_everything() {
    let mut rules = four_species();
    rules.randomize(&mut Mulberry32::new(31));
    let before = rules.sparse();
    rules.rename_species("yellow", "gold").unwrap();
    let after = rules.sparse();

    let relabel = |n: &String| if n == "yellow" { "gold".to_string() } else { n.clone() };
    let expected: SparseRules = before
        .iter()
        .map(|(from, row)| {
            (
                relabel(from),
                row.iter().map(|(to, v)| (relabel(to), *v)).collect(),
            )
        })
        .collect();
    assert_eq!(after, expected);
}

#[test]
fn test_change_events_follow_mutations() {
    let mut rules = four_species();
    let events = rules.subscribe();
    let mut rng = Mulberry32::new(3);
    rules.randomize(&mut rng);
    rules
        .add_species(Species::new("cyan", Vec3::new(0.0, 1.0, 1.0)), &mut rng)
        .unwrap();
    rules.rename_species("cyan", "teal").unwrap();
    rules.remove_species().unwrap();

    let received: Vec<RuleEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            RuleEvent::Randomized,
            RuleEvent::SpeciesAdded { index: 4, name: "cyan".into() },
            RuleEvent::SpeciesRenamed { index: 4, old: "cyan".into(), new: "teal".into() },
            RuleEvent::SpeciesRemoved { index: 4, name: "teal".into() },
        ]
    );
}

// ============================================================================
// Spatial grid
// ============================================================================

#[test]
fn test_grid_neighbors_superset_of_brute_force() {
    let domain = 1000.0;
    let cutoff = 2000.0;
    let mut rng = StdRng::seed_from_u64(200);
    let particles: Vec<Particle> = (0..200)
        .map(|_| {
            Particle::at_rest(
                DVec3::new(
                    rng.gen_range(0.0..domain),
                    rng.gen_range(0.0..domain),
                    rng.gen_range(0.0..domain),
                ),
                0,
            )
        })
        .collect();

    let mut grid = SpatialGrid::new();
    grid.rebuild(&particles, domain, cutoff);

    for (i, a) in particles.iter().enumerate() {
        let found: std::collections::HashSet<usize> = grid.neighbors_of(i).collect();
        for (j, b) in particles.iter().enumerate() {
            if a.position.distance_squared(b.position) < cutoff {
                assert!(found.contains(&j), "grid missed pair ({i}, {j})");
            }
        }
    }
}

#[test]
fn test_grid_neighbors_complete_in_dense_cluster() {
    // Many particles straddling cell borders.
    let domain = 500.0;
    let cutoff = 2500.0;
    let mut rng = StdRng::seed_from_u64(7);
    let particles: Vec<Particle> = (0..300)
        .map(|_| {
            Particle::at_rest(
                DVec3::new(
                    rng.gen_range(95.0..105.0),
                    rng.gen_range(45.0..155.0),
                    rng.gen_range(0.0..domain),
                ),
                0,
            )
        })
        .collect();
    let mut grid = SpatialGrid::new();
    grid.rebuild(&particles, domain, cutoff);
    for (i, a) in particles.iter().enumerate() {
        let found: Vec<usize> = grid.neighbors_of(i).collect();
        for (j, b) in particles.iter().enumerate() {
            if a.position.distance_squared(b.position) < cutoff {
                assert!(found.contains(&j));
            }
        }
    }
}

fn assert_neighbors_complete(particles: &[Particle], domain: f64, cutoff: f64) {
    let mut grid = SpatialGrid::new();
    grid.rebuild(particles, domain, cutoff);
    let mut pairs = 0;
    for (i, a) in particles.iter().enumerate() {
        let found: std::collections::HashSet<usize> = grid.neighbors_of(i).collect();
        for (j, b) in particles.iter().enumerate() {
            if i != j && a.position.distance_squared(b.position) < cutoff {
                assert!(found.contains(&j), "grid missed pair ({i}, {j})");
                pairs += 1;
            }
        }
    }
    assert!(pairs > 0, "no pairs within the cutoff were exercised");
}

#[test]
fn test_grid_neighbors_complete_at_max_resolution() {
    // Radius 1 in a 5000 cube caps the grid at 128 cells of edge 39.0625.
    let domain = 5000.0;
    let cutoff = 1.0;
    let config = SpatialConfig::for_domain(domain, cutoff);
    assert_eq!(config.grid_resolution, MAX_GRID_RESOLUTION);

    let mut rng = StdRng::seed_from_u64(128);
    let particles: Vec<Particle> = (0..300)
        .map(|_| {
            Particle::at_rest(
                DVec3::new(
                    rng.gen_range(38.0..40.2),
                    rng.gen_range(0.0..2.0),
                    rng.gen_range(4998.0..5000.0),
                ),
                0,
            )
        })
        .collect();
    assert_neighbors_complete(&particles, domain, cutoff);
}

#[test]
fn test_grid_neighbors_complete_outside_cube() {
    // Fast particles reflect once and can land beyond either wall.
    let domain = 1000.0;
    let cutoff = 2500.0;
    let mut rng = StdRng::seed_from_u64(11);
    let particles: Vec<Particle> = (0..300)
        .map(|_| {
            let mut raw = DVec3::new(
                rng.gen_range(1990.0..2100.0),
                rng.gen_range(-120.0..-80.0),
                rng.gen_range(2950.0..3050.0),
            );
            let mut vel = DVec3::ONE;
            reflect(&mut raw.x, &mut vel.x, domain);
            reflect(&mut raw.y, &mut vel.y, domain);
            reflect(&mut raw.z, &mut vel.z, domain);
            Particle::new(raw, vel, 0)
        })
        .collect();
    assert!(particles
        .iter()
        .any(|p| p.position.x < 0.0 || p.position.z < 0.0));
    assert_neighbors_complete(&particles, domain, cutoff);
}

// ============================================================================
// Integrator
// ============================================================================

#[test]
fn test_reflection_conserves_speed() {
    let domain = 1000.0;
    let eps = 0.25;
    let mut pos = domain + eps;
    let mut vel = 3.0;
    reflect(&mut pos, &mut vel, domain);
    assert_eq!(pos, domain - eps);
    assert_eq!(vel, -3.0);

    let rules = DenseMatrix::new(1);
    let mut particles = vec![Particle::new(DVec3::new(999.5, 10.0, 10.0), DVec3::X, 0)];
    let params = PhysicsParams {
        domain_size: domain,
        cutoff: 10_000.0,
        time_scale: 1.0,
        viscosity: 0.0,
    };
    Integrator::new().step(&mut particles, &rules, &params, None);
    assert_eq!(particles[0].position.x, 999.5);
    assert_eq!(particles[0].velocity.x, -1.0);
}

#[test]
fn test_two_species_scenario() {
    let mut rules = RuleMatrix::from_names(["A", "B"]).unwrap();
    rules.randomize(&mut Mulberry32::new(42));
    let mut sparse = SparseRules::new();
    for (from, to, v) in [("A", "A", 0.5), ("A", "B", -1.0), ("B", "A", 1.0), ("B", "B", 0.0)] {
        sparse.entry(from.into()).or_default().insert(to.into(), v);
    }
    rules.flatten(&sparse);

    let pa = DVec3::new(400.0, 300.0, 200.0);
    let pb = DVec3::new(406.0, 308.0, 200.0);
    let mut particles = vec![Particle::at_rest(pa, 0), Particle::at_rest(pb, 1)];
    let params = PhysicsParams {
        domain_size: 1000.0,
        cutoff: 10_000.0,
        time_scale: 0.5,
        viscosity: 0.0,
    };
    let mut integrator = Integrator::new();
    let activity = integrator.step(&mut particles, rules.dense(), &params, None);

    // |pa - pb| = 10
    let fa = (pa - pb) * (-1.0 / 10.0);
    let fb = (pb - pa) * (1.0 / 10.0);
    assert!((integrator.forces()[0] - fa).length() < 1e-9);
    assert!((integrator.forces()[1] - fb).length() < 1e-9);
    assert!(integrator.forces()[0].length() > 0.0);

    let va = fa * 0.5;
    let vb = fb * 0.5;
    assert!((particles[0].velocity - va).length() < 1e-9);
    assert!((particles[1].position - (pb + vb)).length() < 1e-9);
    let expected = (va.abs().element_sum() + vb.abs().element_sum()) / 2.0;
    assert!((activity - expected).abs() < 1e-9);
}

#[test]
fn test_grid_forces_match_brute_force() {
    let config = SimConfig::default()
        .with_seed(42)
        .with_particles_per_species(50);
    let mut sim = Simulation::new(config).unwrap();
    let before = sim.particles().as_slice().to_vec();
    sim.step().unwrap();

    let rules = sim.rules().dense();
    let cutoff = sim.config().cutoff;
    for (i, a) in before.iter().enumerate() {
        let mut f = DVec3::ZERO;
        for (j, b) in before.iter().enumerate() {
            let d = a.position - b.position;
            let d2 = d.length_squared();
            if i != j && d2 > 0.0 && d2 < cutoff {
                f += d * (rules.get(a.species_index(), b.species_index()) / d2.sqrt());
            }
        }
        assert!((sim.integrator().forces()[i] - f).length() < 1e-9);
    }
}

// ============================================================================
// Simulation
// ============================================================================

#[test]
fn test_single_species_removal_is_refused() {
    let config = SimConfig::default()
        .with_particles_per_species(10)
        .with_species(vec![SpeciesConfig::new("only", [0.5, 0.5, 0.5])]);
    let mut sim = Simulation::new(config).unwrap();
    let events = sim.subscribe();
    let particles = sim.particles().as_slice().to_vec();
    let sparse = sim.rules().sparse();

    assert_eq!(sim.remove_species(), Err(SpeciesError::LastSpecies));
    assert_eq!(sim.particles().as_slice(), particles.as_slice());
    assert_eq!(sim.rules().sparse(), sparse);
    assert!(events.try_recv().is_err());
}

#[test]
fn test_seeded_runs_reproduce() {
    let run = || {
        let mut sim = Simulation::new(
            SimConfig::default()
                .with_seed(777)
                .with_particles_per_species(40),
        )
        .unwrap();
        sim.add_species(40).unwrap();
        sim.symmetrize_rules();
        for _ in 0..10 {
            sim.step();
        }
        (
            sim.rules().dense().clone(),
            sim.particles().as_slice().to_vec(),
            sim.seed(),
        )
    };
    let (rules_a, particles_a, seed_a) = run();
    let (rules_b, particles_b, seed_b) = run();
    assert_eq!(rules_a, rules_b);
    assert_eq!(particles_a, particles_b);
    assert_eq!(seed_a, seed_b);
}

#[test]
fn test_long_run_stays_finite() {
    let mut sim = Simulation::new(
        SimConfig::default()
            .with_seed(5)
            .with_particles_per_species(100),
    )
    .unwrap();
    for _ in 0..50 {
        assert!(sim.step().unwrap().is_finite());
    }
    let species = sim.rules().len();
    assert!(sim
        .particles()
        .iter()
        .all(|p| p.position.is_finite() && p.species_index() < species));
}
