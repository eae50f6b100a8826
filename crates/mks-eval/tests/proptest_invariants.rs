// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mks_core::{MetricValue, OutcomeTag};
use mks_eval::{
    MeanTimes, OutcomeProbabilities, PerformanceAccumulator, RenewalClass, monitored_makespan,
    reactive_makespan, renewal_reward_makespan,
};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

const MIN_PROPTEST_CASES: u32 = 512;
const REL_TOL: f64 = 1e-9;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

fn relative_close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= REL_TOL * (1.0 + expected.abs())
}

fn defined(value: MetricValue) -> f64 {
    value.try_value("property").expect("metric should be defined")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        failure_persistence: Some(Box::new(FileFailurePersistence::Direct("proptest-regressions/tests/proptest_invariants.txt"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn probabilities_sum_to_one_and_rates_stay_in_unit_interval(
        counts in prop::array::uniform6(0u64..50),
    ) {
        let mut acc = PerformanceAccumulator::new();
        for (tag, n) in OutcomeTag::ALL.iter().zip(counts) {
            for _ in 0..n {
                acc.count(*tag).expect("no overflow");
            }
        }
        let total: u64 = counts.iter().sum();
        prop_assert_eq!(acc.total(), total);

        if total == 0 {
            prop_assert!(OutcomeTag::ALL.iter().all(|t| !acc.probability(*t).is_defined()));
        } else {
            let sum: f64 = OutcomeTag::ALL.iter().map(|t| defined(acc.probability(*t))).sum();
            prop_assert!(relative_close(sum, 1.0));
        }

        let rates = acc.confusion_rates();
        for rate in [rates.tp, rates.fn_, rates.tn, rates.fp, rates.nc] {
            if let Some(v) = rate.as_option() {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
        prop_assert_eq!(rates.tp.is_defined(), counts[0] + counts[3] > 0);
    }

    #[test]
    fn reactive_equals_renewal_model_without_the_unit_offset(
        mts in 0.1f64..100.0,
        mtf in 0.1f64..100.0,
        p_success in 0.05f64..=1.0,
    ) {
        let p_failure = 1.0 - p_success;
        let reactive = defined(reactive_makespan(mts, mtf, p_success, p_failure));
        let renewal = defined(renewal_reward_makespan(&[
            RenewalClass { probability: p_success, mean_cost: mts, absorbing: true },
            RenewalClass { probability: p_failure, mean_cost: mtf, absorbing: false },
        ]));
        prop_assert!(relative_close(reactive, renewal + 1.0 / p_success));
    }

    #[test]
    fn monitored_agrees_with_renewal_model_when_no_false_positives(
        mts in 0.1f64..100.0,
        mtf in 0.1f64..100.0,
        mtn in 0.1f64..100.0,
        weights in prop::array::uniform5(0.0f64..1.0),
    ) {
        let total: f64 = weights.iter().sum::<f64>() + 1.0;
        // The extra 1.0 keeps P_TP strictly positive.
        let p = OutcomeProbabilities {
            p_tp: (weights[0] + 1.0) / total,
            p_fn: weights[1] / total,
            p_tn: weights[2] / total,
            p_fp: 0.0,
            p_ncs: weights[3] / total,
            p_ncf: weights[4] / total,
        };
        let times = MeanTimes { mts, mtf, mtn };
        let monitored = defined(monitored_makespan(&times, &p));
        let absorbing = p.p_tp + p.p_ncs;
        let renewal = defined(renewal_reward_makespan(&[
            RenewalClass { probability: p.p_tp, mean_cost: mts, absorbing: true },
            RenewalClass { probability: p.p_ncs, mean_cost: mts, absorbing: true },
            RenewalClass { probability: p.p_ncf, mean_cost: mtf, absorbing: false },
            RenewalClass { probability: p.p_tn, mean_cost: mtn, absorbing: false },
            RenewalClass { probability: p.p_fn, mean_cost: mtn, absorbing: false },
        ]));
        prop_assert!(relative_close(monitored, renewal + 1.0 / absorbing));
    }

    #[test]
    fn monitored_charges_false_positives_as_failed_runs_and_retries(
        mts in 0.1f64..100.0,
        mtf in 0.1f64..100.0,
        mtn in 0.1f64..100.0,
        weights in prop::array::uniform6(0.0f64..1.0),
    ) {
        let total: f64 = weights.iter().sum::<f64>() + 1.0;
        let p = OutcomeProbabilities {
            p_tp: (weights[0] + 1.0) / total,
            p_fn: weights[1] / total,
            p_tn: weights[2] / total,
            p_fp: weights[3] / total,
            p_ncs: weights[4] / total,
            p_ncf: weights[5] / total,
        };
        let times = MeanTimes { mts, mtf, mtn };
        let monitored = defined(monitored_makespan(&times, &p));
        let classes = [
            RenewalClass { probability: p.p_tp, mean_cost: mts, absorbing: true },
            RenewalClass { probability: p.p_ncs, mean_cost: mts, absorbing: true },
            RenewalClass { probability: p.p_fp, mean_cost: mtf, absorbing: false },
            RenewalClass { probability: p.p_ncf, mean_cost: mtf, absorbing: false },
            RenewalClass { probability: p.p_tn, mean_cost: mtn, absorbing: false },
            RenewalClass { probability: p.p_fn, mean_cost: mtn, absorbing: false },
        ];
        let retrying = defined(renewal_reward_makespan(&classes));
        let wins = p.p_tp + p.p_ncs;
        prop_assert!(relative_close(monitored, retrying + 1.0 / wins));

        // Ending the task at FP instead can only shorten the makespan.
        let mut ending = classes;
        ending[2].absorbing = true;
        let ended = defined(renewal_reward_makespan(&ending));
        prop_assert!(ended <= retrying * (1.0 + REL_TOL));
    }
}
