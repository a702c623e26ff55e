//! Timing side-channel check for `constant_time_eq`.
//!
//! Compares timings for equal inputs (class A) against inputs differing in
//! the first byte (class B), where an early-exit comparison would be fastest.
//! Each sample times a batch of comparisons to lift the signal above timer
//! resolution. |t| > 4.5 would indicate leakage at >99.999% confidence.

use keyguard_core::constant_time_eq;
use std::hint::black_box;
use std::time::Instant;

const SAMPLES: usize = 10_000;
const BATCH: usize = 64;
const T_THRESHOLD: f64 = 4.5;

#[inline(never)]
fn timed_batch(a: &[u8], b: &[u8]) -> f64 {
    let start = Instant::now();
    for _ in 0..BATCH {
        black_box(constant_time_eq(black_box(a), black_box(b)));
    }
    #[allow(clippy::cast_precision_loss)]
    let nanos = start.elapsed().as_nanos() as f64;
    nanos
}

/// Welch's t-statistic for two independent samples.
#[allow(clippy::cast_precision_loss)]
fn welch_t_statistic(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return f64::NAN;
    }
    let n_a = a.len() as f64;
    let n_b = b.len() as f64;
    let mean_a: f64 = a.iter().sum::<f64>() / n_a;
    let mean_b: f64 = b.iter().sum::<f64>() / n_b;
    let var_a: f64 = a.iter().map(|x| (x - mean_a).powi(2)).sum::<f64>() / (n_a - 1.0);
    let var_b: f64 = b.iter().map(|x| (x - mean_b).powi(2)).sum::<f64>() / (n_b - 1.0);
    let denominator = (var_a / n_a + var_b / n_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (mean_a - mean_b) / denominator
}

/// Drop the slowest 10% of each class (preemption, page faults).
fn trimmed(mut samples: Vec<f64>) -> Vec<f64> {
    samples.sort_by(f64::total_cmp);
    let keep = samples.len() * 9 / 10;
    samples.truncate(keep);
    samples
}

#[test]
fn constant_time_eq_no_timing_leak() {
    let secret = [0x5Au8; 64];
    let equal = secret;
    let mut first_byte_differs = secret;
    first_byte_differs[0] ^= 0xFF;

    for _ in 0..1_000 {
        timed_batch(&secret, &equal);
        timed_batch(&secret, &first_byte_differs);
    }

    let mut times_a = Vec::with_capacity(SAMPLES);
    let mut times_b = Vec::with_capacity(SAMPLES);
    for i in 0..SAMPLES {
        // Alternate which class goes first to cancel ordering effects.
        if i % 2 == 0 {
            times_a.push(timed_batch(&secret, &equal));
            times_b.push(timed_batch(&secret, &first_byte_differs));
        } else {
            times_b.push(timed_batch(&secret, &first_byte_differs));
            times_a.push(timed_batch(&secret, &equal));
        }
    }

    let t = welch_t_statistic(&trimmed(times_a), &trimmed(times_b));
    eprintln!("constant_time_eq: |t| = {:.2} (threshold {T_THRESHOLD})", t.abs());
    assert!(
        t.abs() < T_THRESHOLD,
        "timing leak: |t| = {:.2} exceeds {T_THRESHOLD}",
        t.abs()
    );
}

#[test]
fn welch_t_test_identical_distributions() {
    let a = vec![1.0; 100];
    let b = vec![1.0; 100];
    assert!(welch_t_statistic(&a, &b).abs() < 0.001);
}

#[test]
fn welch_t_test_different_distributions() {
    let a: Vec<f64> = (0..1000).map(|i| 100.0 + f64::from(i % 3)).collect();
    let b: Vec<f64> = (0..1000).map(|i| 200.0 + f64::from(i % 3)).collect();
    assert!(welch_t_statistic(&a, &b).abs() > 100.0);
}
