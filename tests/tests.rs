use vicsek::simulation::observables::{average_velocity, density_distribution_y, velocity_distribution_y};
use vicsek::simulation::states::{Kinematics, NVec2, Particle, System};
use vicsek::{Border, BorderBounce, BorderWrap, Ensemble, Error, Scenario, ScenarioConfig, Sweep};
use vicsek::{noise_sweep, steps_to_equilibrium};
use vicsek::simulation::params::Parameters;
use vicsek::{vicsek_integrator, InteractionSet, Polygon, VicsekAlignment};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;

/// Shorthand for a 2d vector
fn v(x: f64, y: f64) -> NVec2 {
    NVec2::new(x, y)
}

/// Square from (-h, -h) to (h, h), counter-clockwise.
/// Edge 0 is the bottom, edge 1 the right side.
pub fn square_border(h: f64) -> BorderBounce {
    BorderBounce::new(vec![v(-h, -h), v(h, -h), v(h, h), v(-h, h)]).unwrap()
}

/// Strip whose edge 0 is the horizontal segment (-5, 0) -> (5, 0)
pub fn floor_border() -> BorderBounce {
    BorderBounce::new(vec![v(-5.0, 0.0), v(5.0, 0.0), v(5.0, 10.0), v(-5.0, 10.0)]).unwrap()
}

/// Scenario YAML with the given border section and overrides
pub fn scenario_yaml(border: &str, particles: usize, noise: f64, radius: f64) -> ScenarioConfig {
    let yaml = format!(
        r#"
engine:
  border: "{border}"
  ensemble: 3
parameters:
  particles: {particles}
  domain: [ 10.0, 10.0 ]
  radius: {radius}
  speed: 0.3
  dt: 1.0
  noise: {noise}
  seed: 42
  steps: 100
"#
    );
    serde_yaml::from_str(&yaml).unwrap()
}

fn close(a: NVec2, b: NVec2) -> bool {
    (a - b).norm() < 1e-9
}

// ==================================================================================
// Border bounce tests
// ==================================================================================

#[test]
fn bounce_perpendicular_reverses_velocity() {
    let border = square_border(1.0);
    let state = Kinematics::new(v(0.0, 0.0), v(1.0, 0.0));

    let r = border.reflect(&state, 1).unwrap();

    assert!((r.incidence - 90.0).abs() < 1e-12);
    assert!((r.rotation + 180.0).abs() < 1e-9, "rotation {}", r.rotation);
    assert!(close(r.intersection, v(1.0, 0.0)), "intersection {:?}", r.intersection);
    assert!(close(r.state.velocity, v(-1.0, 0.0)), "velocity {:?}", r.state.velocity);
    assert!(close(r.state.position, v(1.0, 0.0)), "position {:?}", r.state.position);
}

#[test]
fn bounce_oblique_mirrors_across_border() {
    let border = floor_border();
    let state = Kinematics::new(v(0.0, 0.5), v(1.0, -1.0));

    let r = border.reflect(&state, 0).unwrap();

    assert!((r.incidence - 45.0).abs() < 1e-9);
    assert!(close(r.intersection, v(0.5, 0.0)));
    assert!(close(r.state.velocity, v(1.0, 1.0)), "velocity {:?}", r.state.velocity);
    assert!(close(r.state.position, v(1.0, 0.5)), "position {:?}", r.state.position);
    assert!((r.state.velocity.norm() - state.velocity.norm()).abs() < 1e-12);
}

#[test]
fn bounce_interact_matches_reflect() {
    let border = floor_border();
    let state = Kinematics::new(v(0.0, 1.0), v(1.0, -2.0));
    let r = border.reflect(&state, 0).unwrap();
    assert_eq!(border.interact(&state, 0).unwrap(), r.state);
}

#[test]
fn bounce_right_angle_rotation_agrees_from_both_sides() {
    let border = square_border(1.0);
    let from_inside = Kinematics::new(v(0.0, 0.0), v(2.0, 0.0));
    let from_outside = Kinematics::new(v(2.0, 0.0), v(-2.0, 0.0));

    let a = border.reflect(&from_inside, 1).unwrap();
    let b = border.reflect(&from_outside, 1).unwrap();

    assert!((a.rotation + 180.0).abs() < 1e-9, "rotation {}", a.rotation);
    assert!((b.rotation + 180.0).abs() < 1e-9, "rotation {}", b.rotation);
    assert!(close(b.state.velocity, v(2.0, 0.0)));
}

#[test]
fn bounce_preserves_speed() {
    let border = BorderBounce::new(vec![v(0.0, 0.0), v(8.0, 1.0), v(3.0, 7.0)]).unwrap();
    let start = v(4.0, 2.5);
    let mut bounced = 0;

    for k in 0..72 {
        let angle = (k as f64 * 5.0 + 1.0).to_radians();
        let velocity = v(angle.cos(), angle.sin()) * 9.0;
        let state = Kinematics::new(start, velocity);
        let Some(edge) = border.crossed_edge(&state, None) else { continue };

        let r = border.reflect(&state, edge).unwrap();
        assert!(
            (r.state.velocity.norm() - velocity.norm()).abs() < 1e-9,
            "speed changed at {k}: {} vs {}",
            r.state.velocity.norm(),
            velocity.norm()
        );
        // post-bounce point sits as far from the hit as the unobstructed one
        let before = (state.next_position() - r.intersection).norm();
        let after = (r.state.position - r.intersection).norm();
        assert!((before - after).abs() < 1e-9);
        bounced += 1;
    }
    assert!(bounced > 0);
}

#[test]
fn bounce_is_an_involution() {
    let border = floor_border();

    let incoming = Kinematics::new(v(0.0, 1.0), v(1.0, -2.0));
    let out = border.reflect(&incoming, 0).unwrap();
    assert!(close(out.state.velocity, v(1.0, 2.0)));
    assert!(close(out.state.position, v(1.0, 1.0)));

    // the mirrored trajectory, approaching from the other side
    let mirrored = Kinematics::new(v(0.0, -1.0), out.state.velocity);
    let back = border.reflect(&mirrored, 0).unwrap();
    assert!(close(back.intersection, out.intersection));
    assert!(close(back.state.velocity, incoming.velocity), "velocity {:?}", back.state.velocity);
    assert!(close(back.state.position, incoming.next_position()));
}

#[test]
fn bounce_rejects_collinear_travel() {
    let border = square_border(1.0);
    let state = Kinematics::new(v(1.0, -2.0), v(0.0, 3.0));
    let err = border.reflect(&state, 1).unwrap_err();
    assert!(matches!(err, Error::Degenerate(_)), "got {err}");
}

#[test]
fn bounce_rejects_missing_crossing_and_zero_step() {
    let border = square_border(1.0);

    let short = Kinematics::new(v(0.0, 0.0), v(0.5, 0.0));
    assert!(matches!(border.reflect(&short, 1), Err(Error::NoCrossing { edge: 1 })));

    let still = Kinematics::new(v(0.0, 0.0), v(0.0, 0.0));
    assert!(matches!(border.reflect(&still, 1), Err(Error::Degenerate(_))));
}

#[test]
fn wrap_border_interact_keeps_velocity() {
    let border = BorderWrap::new(v(4.0, 4.0)).unwrap();
    let state = Kinematics::new(v(3.9, 1.0), v(0.2, 0.0));
    let out = border.interact(&state, 1).unwrap();
    assert!(close(out.position, v(0.1, 1.0)));
    assert_eq!(out.velocity, state.velocity);
    assert!(matches!(border.interact(&state, 9), Err(Error::EdgeIndex { .. })));
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn bounce_run_stays_inside_at_constant_speed() {
    let cfg = scenario_yaml("bounce", 200, 90.0, 1.0);
    let mut scenario = Scenario::build_scenario(&cfg).unwrap();
    let speed = scenario.parameters.speed;

    scenario.integrate_for(200, 90.0).unwrap();

    assert_eq!(scenario.system.steps, 200);
    assert!((scenario.system.t - 200.0).abs() < 1e-9);
    for (i, p) in scenario.system.particles.iter().enumerate() {
        assert!(scenario.border.contains(p.x), "particle {i} escaped to {:?}", p.x);
        assert!((p.v.norm() - speed).abs() < 1e-9, "particle {i} speed {}", p.v.norm());
    }
}

#[test]
fn wrap_run_stays_in_box() {
    let cfg = scenario_yaml("wrap", 200, 120.0, 1.0);
    let mut scenario = Scenario::build_scenario(&cfg).unwrap();
    scenario.integrate_for(100, 120.0).unwrap();
    for p in &scenario.system.particles {
        assert!(p.x.x >= 0.0 && p.x.x < 10.0 && p.x.y >= 0.0 && p.x.y < 10.0);
    }
}

#[test]
fn noiseless_global_alignment_orders_fully() {
    // radius covers the whole periodic box, every particle sees every other
    let cfg = scenario_yaml("wrap", 50, 0.0, 20.0);
    let mut scenario = Scenario::build_scenario(&cfg).unwrap();
    assert!(scenario.order_parameter() < 0.9);

    scenario.step().unwrap();

    assert!((scenario.order_parameter() - 1.0).abs() < 1e-9);
}

#[test]
fn isolated_particles_keep_heading_without_noise() {
    let cfg = scenario_yaml("wrap", 20, 0.0, 0.0);
    let mut scenario = Scenario::build_scenario(&cfg).unwrap();
    let before: Vec<NVec2> = scenario.system.particles.iter().map(|p| p.v).collect();
    scenario.integrate_for(5, 0.0).unwrap();
    for (p, v0) in scenario.system.particles.iter().zip(before.iter()) {
        assert!(close(p.v, *v0));
    }
}

#[test]
fn same_seed_same_trajectory() {
    let cfg = scenario_yaml("bounce", 100, 60.0, 1.0);
    let mut a = Scenario::build_scenario(&cfg).unwrap();
    let mut b = Scenario::build_scenario(&cfg).unwrap();
    let mut c = Scenario::build_with_seed(&cfg, 43).unwrap();

    a.integrate_for(30, 60.0).unwrap();
    b.integrate_for(30, 60.0).unwrap();
    c.integrate_for(30, 60.0).unwrap();

    assert_eq!(a.system.particles, b.system.particles);
    assert_ne!(a.system.particles, c.system.particles);
}

/// Bounce border whose `fail_at`-th resolve call fails
struct FlakyBorder {
    inner: BorderBounce,
    calls: Cell<usize>,
    fail_at: usize,
}

impl Border for FlakyBorder {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn polygon(&self) -> &Polygon {
        self.inner.polygon()
    }

    fn interact(&self, state: &Kinematics, index: usize) -> vicsek::Result<Kinematics> {
        self.inner.interact(state, index)
    }

    fn resolve(&self, state: &Kinematics) -> vicsek::Result<Kinematics> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call == self.fail_at {
            return Err(Error::Degenerate("injected".into()));
        }
        self.inner.resolve(state)
    }
}

#[test]
fn failed_step_leaves_system_untouched() {
    let border = FlakyBorder { inner: square_border(5.0), calls: Cell::new(0), fail_at: 2 };
    let params = Parameters {
        particles: 4,
        domain: v(10.0, 10.0),
        radius: 1.0,
        speed: 0.5,
        dt: 1.0,
        noise: 30.0,
        damping: 1.0,
        seed: 7,
        steps: 1,
    };
    let interactions = InteractionSet::new().with(VicsekAlignment { radius2: params.radius2() });
    let mut sys = System::new(vec![
        Particle { x: v(-3.0, -3.0), v: v(0.5, 0.0) },
        Particle { x: v(3.0, -3.0), v: v(0.0, 0.5) },
        Particle { x: v(3.0, 3.0), v: v(-0.5, 0.0) },
        Particle { x: v(-3.0, 3.0), v: v(0.0, -0.5) },
    ]);
    let before = sys.particles.clone();
    let mut rng = StdRng::seed_from_u64(params.seed);

    let result = vicsek_integrator(&mut sys, &interactions, &border, &params, params.noise, &mut rng);

    assert!(matches!(result, Err(Error::Degenerate(_))));
    assert_eq!(sys.particles, before);
    assert_eq!(sys.steps, 0);
    assert_eq!(sys.t, 0.0);
}

// ==================================================================================
// Observable tests
// ==================================================================================

fn hand_system() -> System {
    System::new(vec![
        Particle { x: v(1.0, 1.0), v: v(1.0, 0.0) },
        Particle { x: v(2.0, 1.5), v: v(0.0, 1.0) },
        Particle { x: v(3.0, 8.0), v: v(-1.0, 0.0) },
    ])
}

#[test]
fn average_velocity_of_hand_system() {
    let sys = hand_system();
    assert!(close(average_velocity(&sys), v(0.0, 1.0 / 3.0)));
    assert_eq!(average_velocity(&System::new(Vec::new())), NVec2::zeros());
}

#[test]
fn slice_distributions_of_hand_system() {
    let sys = hand_system();
    let bounds = (v(0.0, 0.0), v(10.0, 10.0));

    let veloc = velocity_distribution_y(&sys, bounds, 2).unwrap();
    assert!(close(veloc[0], v(0.5, 0.5)));
    assert!(close(veloc[1], v(-1.0, 0.0)));

    let dens = density_distribution_y(&sys, bounds, 5).unwrap();
    // slice area 2 x 10
    assert!((dens[0] - 2.0 / 20.0).abs() < 1e-12);
    assert!((dens[4] - 1.0 / 20.0).abs() < 1e-12);
    assert_eq!(dens[2], 0.0);

    assert!(matches!(density_distribution_y(&sys, bounds, 0), Err(Error::InvalidParam(_))));
}

#[test]
fn averaged_density_accounts_for_every_particle() {
    let cfg = scenario_yaml("bounce", 120, 60.0, 1.0);
    let mut scenario = Scenario::build_scenario(&cfg).unwrap();

    let avg = scenario.integrate_with_averaging_for(10, 60.0, 4).unwrap();

    // slice area 2.5 x 10
    let total: f64 = avg.density.iter().map(|d| d * 25.0).sum();
    assert!((total - 120.0).abs() < 1e-9, "total {total}");
    assert!(avg.velocity.iter().all(|s| *s >= 0.0 && *s <= 0.3 + 1e-12));
}

// ==================================================================================
// Ensemble and experiment tests
// ==================================================================================

#[test]
fn ensemble_members_differ_by_seed() {
    let cfg = scenario_yaml("wrap", 40, 30.0, 1.0);
    let mut ensemble = Ensemble::build(&cfg).unwrap();
    assert_eq!(ensemble.len(), 3);

    let m = ensemble.members();
    assert_ne!(m[0].system.particles, m[1].system.particles);
    assert_eq!(m[2].parameters.seed, 44);

    ensemble.integrate(30.0).unwrap();
    let avg = ensemble.averaged_abs_velocity();
    assert!((0.0..=0.3 + 1e-12).contains(&avg));
}

#[test]
fn sweep_writes_one_row_per_level() {
    let cfg = scenario_yaml("wrap", 30, 0.0, 1.0);
    let mut ensemble = Ensemble::build(&cfg).unwrap();
    let sweep = Sweep {
        start: 40.0,
        end: 0.0,
        step: 20.0,
        equilibrate_high: 2,
        equilibrate_low: 1,
        samples: 3,
    };
    assert_eq!(sweep.levels(), vec![40.0, 20.0, 0.0]);

    let mut out = Vec::new();
    let points = noise_sweep(&mut ensemble, &sweep, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(points.len(), 3);
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("# particles = 30"));
    assert_eq!(lines[1], "noise,velocity");
    assert!(lines[4].starts_with("0,"));
    // 3 members x (2 + 3 + 1 + 3 + 1 + 3) steps
    assert_eq!(ensemble.members()[0].system.steps, 13);
}

#[test]
fn sweep_rejects_bad_ranges() {
    let sweep = Sweep {
        start: 0.0,
        end: 10.0,
        step: 1.0,
        equilibrate_high: 0,
        equilibrate_low: 0,
        samples: 1,
    };
    assert!(sweep.validate().is_err());
}

#[test]
fn sweep_rejects_unbounded_level_count() {
    let sweep = Sweep {
        start: 1e30,
        end: 0.0,
        step: 1e-9,
        equilibrate_high: 0,
        equilibrate_low: 0,
        samples: 1,
    };
    assert!(matches!(sweep.validate(), Err(Error::InvalidParam(_))));
}

#[test]
fn ordered_state_equilibrates_immediately() {
    let cfg = scenario_yaml("wrap", 30, 0.0, 20.0);
    let mut scenario = Scenario::build_scenario(&cfg).unwrap();
    let steps = steps_to_equilibrium(&mut scenario, 0.0, 5, 1e-6, 100).unwrap();
    assert_eq!(steps, Some(10));
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn invalid_parameters_are_rejected() {
    let mut cfg = scenario_yaml("bounce", 10, 30.0, 1.0);
    cfg.parameters.speed = Some(-1.0);
    assert!(matches!(Scenario::build_scenario(&cfg), Err(Error::InvalidParam(_))));

    let mut cfg = scenario_yaml("bounce", 10, 30.0, 1.0);
    cfg.parameters.domain = vec![1.0];
    assert!(matches!(Scenario::build_scenario(&cfg), Err(Error::InvalidParam(_))));

    let mut cfg = scenario_yaml("wrap", 10, 30.0, 1.0);
    cfg.corners = Some(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
    assert!(matches!(Scenario::build_scenario(&cfg), Err(Error::InvalidParam(_))));
}

#[test]
fn explicit_particles_and_corners_from_yaml() {
    let mut cfg = scenario_yaml("bounce", 999, 30.0, 1.0);
    let extra: ScenarioConfig = serde_yaml::from_str(
        r#"
engine: { border: "bounce" }
parameters: { particles: 0, domain: [1.0, 1.0], radius: 1.0, noise: 0.0, seed: 0 }
corners: [ [0.0, 0.0], [6.0, 0.0], [3.0, 5.0] ]
particles:
  - { x: [3.0, 1.0], v: [0.0, 0.3] }
  - { x: [2.0, 0.5], v: [0.3, 0.0] }
"#,
    )
    .unwrap();
    cfg.corners = extra.corners;
    cfg.particles = extra.particles.clone();

    let scenario = Scenario::build_scenario(&cfg).unwrap();
    assert_eq!(scenario.system.len(), 2);
    assert_eq!(scenario.parameters.particles, 2);
    assert_eq!(scenario.border.polygon().edge_count(), 3);

    // a particle outside the triangle is refused
    let mut outside = extra.particles.unwrap();
    outside[0].x = vec![5.9, 4.0];
    cfg.particles = Some(outside);
    assert!(matches!(Scenario::build_scenario(&cfg), Err(Error::InvalidParam(_))));
}

#[test]
fn bundled_scenarios_parse() {
    let dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    for name in ["square.yaml", "triangle.yaml", "periodic_sweep.yaml"] {
        let text = std::fs::read_to_string(dir.join(name)).unwrap();
        let cfg: ScenarioConfig = serde_yaml::from_str(&text).unwrap();
        assert!(cfg.parameters.particles > 0, "{name}");
    }
}
