//! Queue lifecycle: thread ownership, detached workers, teardown, and
//! the scoped controller.

use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use vouch_engine::{CheckQueue, CheckQueueControl, QueueConfig};
use vouch_test_utils::{CallCounter, ConstCheck, CountingCheck, RecordingCheck, SleepCheck};

#[test]
fn workers_run_on_named_threads() {
    let cfg = QueueConfig {
        thread_name_prefix: "sigcheck".to_string(),
        ..QueueConfig::with_participants(3)
    };
    let mut q = CheckQueue::new(cfg).unwrap();
    let (tx, rx) = unbounded();
    q.add((0..400).map(|_| {
        let tx = tx.clone();
        move || {
            let name = thread::current().name().map(str::to_owned);
            let _ = tx.send(name);
            thread::sleep(Duration::from_micros(50));
            true
        }
    }));
    assert!(q.wait());

    let names: Vec<Option<String>> = rx.try_iter().collect();
    assert_eq!(names.len(), 400);
    for name in names.into_iter().flatten() {
        assert!(
            name == "sigcheck-1" || name == "sigcheck-2" || !name.starts_with("sigcheck"),
            "unexpected worker thread name {name}"
        );
    }
}

#[test]
fn detached_workers_complete_rounds() {
    let (mut q, workers) =
        CheckQueue::with_detached_workers(QueueConfig::with_participants(4)).unwrap();
    let handles: Vec<_> = workers
        .into_iter()
        .map(|w| thread::spawn(move || w.run()))
        .collect();

    let counter = CallCounter::new();
    for _ in 0..20 {
        q.add((0..250).map(|_| counter.check(true)));
        assert!(q.wait());
    }
    assert_eq!(counter.calls(), 5000);

    q.add([counter.check(false)]);
    assert!(!q.wait());

    drop(q);
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn drop_with_open_round_does_not_hang() {
    let counter = CallCounter::new();
    let q = {
        let mut q = CheckQueue::new(QueueConfig::with_participants(4)).unwrap();
        q.add((0..10_000).map(|_| counter.check(true)));
        q
    };
    drop(q);
    // Some prefix of the published checks may have run before shutdown.
    assert!(counter.calls() <= 10_000);
}

#[test]
fn drop_mid_evaluation_joins_workers() {
    let mut q = CheckQueue::new(QueueConfig {
        flush_threshold: 1,
        ..QueueConfig::with_participants(3)
    })
    .unwrap();
    q.add((0..6).map(|_| SleepCheck {
        duration: Duration::from_millis(20),
        verdict: true,
    }));
    // Give workers time to claim something.
    thread::sleep(Duration::from_millis(5));
    drop(q);
}

#[test]
fn queue_is_reusable_after_failure_with_detached_workers() {
    let (mut q, workers) =
        CheckQueue::with_detached_workers(QueueConfig::with_participants(2)).unwrap();
    let handles: Vec<_> = workers
        .into_iter()
        .map(|w| thread::spawn(move || w.run()))
        .collect();

    q.add([ConstCheck(false), ConstCheck(true)]);
    assert!(!q.wait());
    q.add([ConstCheck(true)]);
    assert!(q.wait());

    drop(q);
    for h in handles {
        h.join().unwrap();
    }
}

// ── Scoped controller ───────────────────────────────────────────

#[test]
fn controller_drop_completes_round() {
    let counter = CallCounter::new();
    let mut q: CheckQueue<CountingCheck> =
        CheckQueue::new(QueueConfig::with_participants(4)).unwrap();
    {
        let mut control = CheckQueueControl::new(Some(&mut q));
        control.add((0..300).map(|_| counter.check(true)));
    }
    assert!(q.is_idle());
    assert_eq!(q.rounds_completed(), 1);
    assert!(q.last_round().result);
    assert_eq!(counter.calls(), 300);
}

#[test]
fn controller_finishes_round_on_early_return() {
    fn verify_block(
        q: &mut CheckQueue<CountingCheck>,
        counter: &CallCounter,
        header_ok: bool,
    ) -> Result<(), &'static str> {
        let mut control = CheckQueueControl::new(Some(q));
        control.add((0..100).map(|_| counter.check(true)));
        if !header_ok {
            return Err("header invalid");
        }
        if !control.wait() {
            return Err("check failed");
        }
        Ok(())
    }

    let counter = CallCounter::new();
    let mut q = CheckQueue::new(QueueConfig::with_participants(3)).unwrap();
    assert_eq!(verify_block(&mut q, &counter, false), Err("header invalid"));
    assert!(q.is_idle());
    assert_eq!(counter.calls(), 100);
}

#[test]
fn controller_finishes_round_during_unwind() {
    let counter = CallCounter::new();
    let mut q = CheckQueue::new(QueueConfig::with_participants(3)).unwrap();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut control = CheckQueueControl::new(Some(&mut q));
        control.add((0..50).map(|_| counter.check(true)));
        panic!("caller bug");
    }));
    assert!(result.is_err());
    assert!(q.is_idle());
    assert_eq!(counter.calls(), 50);
}

#[test]
fn controller_without_queue_discards_checks() {
    let (tx, rx) = unbounded();
    {
        let mut control: CheckQueueControl<'_, RecordingCheck> = CheckQueueControl::new(None);
        control.add((0..10).map(|i| RecordingCheck::new(i, false, &tx)));
        assert!(control.wait());
    }
    assert!(rx.try_recv().is_err());
}
