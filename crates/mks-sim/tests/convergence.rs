// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

#[path = "support/pool.rs"]
mod pool;

use mks_core::{MakespanConfig, OutcomeTag, ScanConfig, SimulationConfig, TaskOutcome, TimingConfig};
use mks_eval::{
    MeanTimes, OutcomeProbabilities, monitored_makespan, renewal_reward_makespan,
    simulator_protocol,
};
use mks_sim::MakespanSimulator;
use pool::{episode, marker_classifier};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn config(trials: usize) -> MakespanConfig {
    MakespanConfig {
        timing: TimingConfig {
            timestep_s: 1.0,
            window_width: 4,
        },
        onset: None,
        scan: ScanConfig {
            confidence: 0.9,
            batch_size: 64,
        },
        simulation: SimulationConfig {
            trials,
            seed: Some(2024),
            max_draws_per_trial: 10_000,
            cache_episode_outcomes: true,
        },
    }
}

#[test]
fn two_episode_pool_converges_to_monitored_equation() {
    // One success the classifier always confirms, one it never decides on.
    let pool = [
        episode(190, 1.0, None, TaskOutcome::Success),
        episode(210, 0.0, None, TaskOutcome::Success),
    ];
    let mut sim = MakespanSimulator::new(&pool, marker_classifier(0.0), &config(200_000))
        .expect("valid simulator");
    let report = sim.run_from_config().expect("simulation should finish");

    let perf = &report.performance;
    assert_eq!(perf.total(), 200_000);
    assert_eq!(
        perf.get(OutcomeTag::TP) + perf.get(OutcomeTag::NCS),
        200_000
    );

    let metrics = &report.metrics;
    let times = MeanTimes {
        mts: metrics.mts.try_value("MTS").expect("successes were drawn"),
        mtf: 0.0,
        mtn: 0.0,
    };
    let probabilities = OutcomeProbabilities::from_metrics(metrics)
        .expect("all probabilities are defined");
    let equation = monitored_makespan(&times, &probabilities)
        .try_value("EMS")
        .expect("denominator is positive");
    let simulated = report.mean().try_value("mean").expect("trials ran");

    assert!(
        (simulated - equation).abs() / equation < 0.01,
        "simulated {simulated} vs equation {equation}"
    );
    assert!((simulated - 200.0).abs() < 0.5, "simulated {simulated}");

    let renewal = renewal_reward_makespan(&simulator_protocol(perf).expect("costs defined"))
        .try_value("renewal")
        .expect("absorbing mass is positive");
    assert!((renewal - simulated).abs() < 1e-9 * simulated.max(1.0) + 0.05);

    // Only positives occurred, so the per-run analytic EMS stays undefined.
    assert!(!metrics.ems.is_defined());
}

#[test]
fn simulation_with_retries_matches_renewal_model() {
    let pool = [
        episode(120, 1.0, None, TaskOutcome::Success),
        episode(80, -1.0, None, TaskOutcome::Failure),
        episode(100, 0.0, None, TaskOutcome::Failure),
    ];
    let mut sim = MakespanSimulator::new(&pool, marker_classifier(20.0), &config(50_000))
        .expect("valid simulator");
    let report = sim
        .run(&mut StdRng::seed_from_u64(99))
        .expect("simulation should finish");

    // TP charges 120, TN charges (17 + 4) = 21, NCF charges 100: each a third.
    // E = (120 + 21 + 100) / 3 / (1/3) = 241.
    let simulated = report.mean().try_value("mean").expect("trials ran");
    assert!((simulated - 241.0).abs() / 241.0 < 0.02, "simulated {simulated}");

    let mtn = report.metrics.mtn.try_value("MTN").expect("negatives occurred");
    assert_eq!(mtn, 21.0);
    assert!(report.metrics.ems.is_defined());

    let classes = simulator_protocol(&report.performance).expect("defined");
    let renewal = renewal_reward_makespan(&classes)
        .try_value("renewal")
        .expect("defined");
    assert!((renewal - simulated).abs() / simulated < 0.02);
}

#[test]
fn mixed_pool_simulation_ends_at_false_positives_while_equation_retries_them() {
    // Decisions land on window 7, charged (7 + 4) s. Every success runs 40 s
    // and every failure 30 s, so per-tag means equal the per-truth means.
    let pool = [
        episode(40, 1.0, None, TaskOutcome::Success),
        episode(40, 1.0, None, TaskOutcome::Success),
        episode(40, -1.0, None, TaskOutcome::Success),
        episode(40, 0.0, None, TaskOutcome::Success),
        episode(30, -1.0, None, TaskOutcome::Failure),
        episode(30, -1.0, None, TaskOutcome::Failure),
        episode(30, 1.0, None, TaskOutcome::Failure),
        episode(30, 0.0, None, TaskOutcome::Failure),
    ];
    let mut sim = MakespanSimulator::new(&pool, marker_classifier(10.0), &config(200_000))
        .expect("valid simulator");
    let report = sim.run_from_config().expect("simulation should finish");
    let perf = &report.performance;
    for tag in OutcomeTag::ALL {
        assert!(perf.get(tag) > 0, "{tag:?} never drawn");
    }

    let metrics = &report.metrics;
    assert_eq!(metrics.mts.try_value("MTS").expect("defined"), 40.0);
    assert_eq!(metrics.mtf.try_value("MTF").expect("defined"), 30.0);
    assert_eq!(metrics.mtn.try_value("MTN").expect("defined"), 11.0);

    // The trial loop is exactly the renewal model in which FP is absorbing.
    let simulated = report.mean().try_value("mean").expect("trials ran");
    let renewal = renewal_reward_makespan(&simulator_protocol(perf).expect("costs defined"))
        .try_value("renewal")
        .expect("absorbing mass is positive");
    assert!((renewal - simulated).abs() <= 1e-9 * simulated);

    // Pool fractions: sum(p * c) = 26.625 over absorbing mass P_TP + P_FP + P_NCS = 0.5.
    assert!((simulated - 53.25).abs() / 53.25 < 0.01, "simulated {simulated}");

    // The monitored equation treats FP as a retry: its denominator is
    // P_TP + P_NCS, and it adds 1 / (P_TP + P_NCS).
    let p = OutcomeProbabilities::from_metrics(metrics).expect("all probabilities defined");
    let wins = p.p_tp + p.p_ncs;
    let equation = metrics.ems.try_value("EMS").expect("both polarities drawn");
    let expected = (renewal * (wins + p.p_fp) + 1.0) / wins;
    assert!(
        (equation - expected).abs() <= 1e-9 * equation,
        "equation {equation} vs {expected}"
    );
    // Around 73.7 against the simulated 53.25.
    assert!(equation > simulated * 1.3, "equation {equation}, simulated {simulated}");
}
