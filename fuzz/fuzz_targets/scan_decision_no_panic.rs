// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use mks_core::{DecisionOutcome, TaskOutcome};
use mks_monitor::{DecisionScanner, scan_for_decision};

fn build_probability(mode_seed: u8, cursor: &mut common::ByteCursor<'_>) -> f64 {
    match mode_seed % 6 {
        0 => f64::from(cursor.next_u8()) / 255.0,
        1 => cursor.next_f64(),
        2 => 0.0,
        3 => 1.0,
        4 => f64::NAN,
        _ => -f64::from(cursor.next_u8()),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let truth = if cursor.next_u8() & 1 == 0 {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failure
    };
    let threshold = f64::from(cursor.next_u8()) / 255.0;
    let rows_len = common::bounded(cursor.next_u8(), 0, 128);

    let mut rows = Vec::with_capacity(rows_len);
    for _ in 0..rows_len {
        let mode = cursor.next_u8();
        let a = build_probability(mode, &mut cursor);
        let b = build_probability(mode >> 3, &mut cursor);
        rows.push([a, b]);
    }

    let Ok(decision) = scan_for_decision(&rows, truth, threshold) else {
        return;
    };

    let crossed = rows.iter().position(|row| {
        let confidence = row[0].max(row[1]);
        confidence > 0.0 && confidence >= threshold
    });
    match crossed {
        None => {
            assert_eq!(decision.outcome, DecisionOutcome::NC);
            assert_eq!(decision.index, rows.len());
        }
        Some(first) => {
            assert_ne!(decision.outcome, DecisionOutcome::NC);
            assert_eq!(decision.index, first);
            assert_eq!(decision.outcome.is_positive(), rows[first][0] > rows[first][1]);
        }
    }

    let mut scanner = DecisionScanner::new(truth, threshold).expect("threshold in [0, 1]");
    let split = common::bounded(cursor.next_u8(), 0, rows.len());
    let consumed = scanner.push_all(&rows[..split]);
    if !scanner.is_decided() {
        scanner.push_all(&rows[consumed..]);
    }
    assert_eq!(scanner.finish(), decision);
});
