//! Batch verification walkthrough.
//!
//! Runs a few rounds through a `CheckQueue`, including a failing round
//! and a round finished by a scoped controller, and prints per-round
//! metrics. Set `VOUCH_LOG=vouch_engine=debug` to see engine logging.
//!
//! Run with: `cargo run --example batch_verify -p vouch-bench`

use std::time::Instant;

use tracing::info;
use tracing_subscriber::EnvFilter;
use vouch_bench::{build_round, reference_profile, WorkloadProfile};
use vouch_engine::{CheckQueue, CheckQueueControl, ConfigError, QueueConfig, RoundMetrics};
use vouch_test_utils::SpinCheck;

fn init_tracing() {
    let filter = std::env::var("VOUCH_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .try_init();
}

fn report(label: &str, m: &RoundMetrics) {
    println!(
        "  {label:<16} round={:<3} result={:<5} submitted={:<6} evaluated={:<6} skipped={:<6} batches={:<5} master={:<4} wait={}us",
        m.round.0, m.result, m.submitted, m.evaluated, m.skipped, m.batches, m.master_batches, m.wait_us,
    );
}

fn main() -> Result<(), ConfigError> {
    init_tracing();

    let config = QueueConfig::default();
    let mut queue: CheckQueue<SpinCheck> = CheckQueue::new(config)?;
    info!(participants = queue.participants(), "queue ready");
    println!("participants: {}", queue.participants());

    // A passing round.
    let profile = reference_profile();
    let (checks, expected) = build_round(&profile, 1);
    let start = Instant::now();
    queue.add(checks);
    let ok = queue.wait();
    assert_eq!(ok, expected);
    report("passing", queue.last_round());
    println!("  elapsed: {:?}", start.elapsed());

    // A failing round: most checks are skipped once a failure is seen.
    let failing = WorkloadProfile {
        fail_per_million: 5_000,
        ..profile.clone()
    };
    let (checks, expected) = build_round(&failing, 2);
    queue.add(checks);
    let ok = queue.wait();
    assert_eq!(ok, expected);
    report("failing", queue.last_round());

    // A round submitted in pieces and finished by the controller's drop.
    {
        let mut control = CheckQueueControl::new(Some(&mut queue));
        for seed in 10..14 {
            let (checks, _) = build_round(&profile, seed);
            control.add(checks);
        }
    }
    report("controller", queue.last_round());

    // An empty round.
    queue.wait();
    report("empty", queue.last_round());

    println!("rounds completed: {}", queue.rounds_completed());
    Ok(())
}
