/*!
 * Reader-Writer Gate Integration Tests
 *
 * Admission scenarios with real threads: who blocks whom, and what the gate
 * state looks like before and after.
 */

use rw_gate::{CallerId, GateError, GatedCell, ReaderWriterGate, Role};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_single_writer_never_blocks() {
    let gate = ReaderWriterGate::new();
    let writer = CallerId::new(1);

    let start = Instant::now();
    gate.begin_write(writer);
    assert!(gate.writer_active());
    gate.end_write(writer).unwrap();

    gate.begin_write(writer);
    gate.end_write(writer).unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));

    let stats = gate.stats();
    assert_eq!(stats.writes_admitted, 2);
    assert_eq!(stats.writer_permit_waits, 0);
    assert!(!gate.is_write_locked());
}

#[test]
fn test_concurrent_readers_share_access() {
    let gate = Arc::new(ReaderWriterGate::new());
    let all_inside = Arc::new(Barrier::new(4));
    let checked = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..3u64)
        .map(|i| {
            let gate = gate.clone();
            let all_inside = all_inside.clone();
            let checked = checked.clone();
            thread::spawn(move || {
                let caller = CallerId::new(i);
                gate.begin_read(caller);
                all_inside.wait();
                checked.wait();
                gate.end_read(caller).unwrap();
            })
        })
        .collect();

    // Only reachable if all three readers are inside at once
    all_inside.wait();
    assert_eq!(gate.active_readers(), 3);
    assert!(gate.is_write_locked());
    assert!(!gate.writer_active());
    checked.wait();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(gate.active_readers(), 0);
    assert!(!gate.is_write_locked());

    let stats = gate.stats();
    assert_eq!(stats.reads_admitted, 3);
    assert_eq!(stats.reader_group_acquisitions, 1);
    assert_eq!(stats.reader_permit_waits, 0);
    assert_eq!(stats.peak_concurrent_readers, 3);
}

#[test]
fn test_active_reader_blocks_writer() {
    let gate = Arc::new(ReaderWriterGate::new());
    let admitted = Arc::new(AtomicBool::new(false));

    gate.begin_read(CallerId::new(1));

    let writer = {
        let gate = gate.clone();
        let admitted = admitted.clone();
        thread::spawn(move || {
            let caller = CallerId::new(2);
            gate.begin_write(caller);
            admitted.store(true, Ordering::SeqCst);
            // Reader must be gone by now
            let readers = gate.active_readers();
            gate.end_write(caller).unwrap();
            readers
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!admitted.load(Ordering::SeqCst));

    gate.end_read(CallerId::new(1)).unwrap();
    assert_eq!(writer.join().unwrap(), 0);
    assert!(admitted.load(Ordering::SeqCst));
    assert_eq!(gate.stats().writer_permit_waits, 1);
}

#[test]
fn test_active_writer_blocks_readers_then_admits_them_together() {
    let gate = Arc::new(ReaderWriterGate::new());
    let entered = Arc::new(AtomicUsize::new(0));
    let both_inside = Arc::new(Barrier::new(2));

    gate.begin_write(CallerId::new(0));

    let readers: Vec<_> = (1..=2u64)
        .map(|i| {
            let gate = gate.clone();
            let entered = entered.clone();
            let both_inside = both_inside.clone();
            thread::spawn(move || {
                let caller = CallerId::new(i);
                gate.begin_read(caller);
                entered.fetch_add(1, Ordering::SeqCst);
                // Only passes once the other reader is admitted too
                both_inside.wait();
                gate.end_read(caller).unwrap();
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(entered.load(Ordering::SeqCst), 0);
    assert_eq!(gate.active_readers(), 0);

    gate.end_write(CallerId::new(0)).unwrap();

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(entered.load(Ordering::SeqCst), 2);
    assert_eq!(gate.active_readers(), 0);
    assert!(!gate.is_write_locked());
    // One group, one permit take
    let stats = gate.stats();
    assert_eq!(stats.reader_group_acquisitions, 1);
    assert_eq!(stats.reader_permit_waits, 1);
    assert_eq!(stats.peak_concurrent_readers, 2);
}

#[test]
fn test_writers_exclude_each_other_and_readers() {
    let gate = Arc::new(ReaderWriterGate::new());
    let readers_inside = Arc::new(AtomicUsize::new(0));
    let writers_inside = Arc::new(AtomicUsize::new(0));
    let violations = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for i in 0..8u64 {
        let gate = gate.clone();
        let readers_inside = readers_inside.clone();
        let writers_inside = writers_inside.clone();
        let violations = violations.clone();
        handles.push(thread::spawn(move || {
            let caller = CallerId::new(i);
            for round in 0..200 {
                if (i + round) % 4 == 0 {
                    let _guard = gate.write(caller);
                    let writers = writers_inside.fetch_add(1, Ordering::SeqCst) + 1;
                    if writers != 1 || readers_inside.load(Ordering::SeqCst) != 0 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                    thread::yield_now();
                    writers_inside.fetch_sub(1, Ordering::SeqCst);
                } else {
                    let _guard = gate.read(caller);
                    readers_inside.fetch_add(1, Ordering::SeqCst);
                    if writers_inside.load(Ordering::SeqCst) != 0 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                    if gate.active_readers() == 0 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                    thread::yield_now();
                    readers_inside.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert_eq!(gate.active_readers(), 0);
    assert!(!gate.is_write_locked());

    let stats = gate.stats();
    assert_eq!(stats.reads_admitted + stats.writes_admitted, 8 * 200);
}

#[test]
fn test_readers_alone_never_wait_for_permit() {
    let gate = Arc::new(ReaderWriterGate::new());

    let handles: Vec<_> = (0..6u64)
        .map(|i| {
            let gate = gate.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    gate.with_read(CallerId::new(i), thread::yield_now);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = gate.stats();
    assert_eq!(stats.reads_admitted, 6 * 500);
    assert_eq!(stats.reader_permit_waits, 0);
    assert_eq!(stats.writer_permit_waits, 0);
    assert!(stats.reader_group_acquisitions >= 1);
}

#[test]
fn test_error_in_body_propagates_after_release() {
    let gate = ReaderWriterGate::new();

    let result: Result<(), String> = gate.with_read(CallerId::new(1), || {
        assert_eq!(gate.active_readers(), 1);
        Err("parse failure".to_string())
    });
    assert_eq!(result, Err("parse failure".to_string()));
    assert_eq!(gate.active_readers(), 0);

    let result: Result<(), String> = gate.with_write(CallerId::new(2), || Err("disk full".into()));
    assert!(result.is_err());
    assert!(!gate.writer_active());
    assert!(!gate.is_write_locked());
}

#[test]
fn test_panic_in_body_releases_access() {
    let cell = Arc::new(GatedCell::new(Vec::<u32>::new()));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        cell.with_write(CallerId::new(1), |items| {
            items.push(1);
            panic!("writer failed halfway");
        })
    }));
    assert!(outcome.is_err());
    assert!(!cell.gate().is_write_locked());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _guard = cell.read(CallerId::new(2));
        panic!("reader failed");
    }));
    assert!(outcome.is_err());
    assert_eq!(cell.gate().active_readers(), 0);

    // The gate is still usable; the partial write is visible
    assert_eq!(cell.with_read(CallerId::new(3), |items| items.clone()), vec![1]);
}

#[test]
fn test_overlapping_readers_starve_writer() {
    let gate = Arc::new(ReaderWriterGate::new());
    gate.begin_read(CallerId::new(100));

    let writer = {
        let gate = gate.clone();
        thread::spawn(move || gate.begin_write_timeout(CallerId::new(0), Duration::from_millis(200)))
    };

    // Keep the reader group alive by always entering before the previous
    // reader leaves; the count never reaches zero
    let mut holder = 100u64;
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(400) {
        let next = holder + 1;
        gate.begin_read(CallerId::new(next));
        gate.end_read(CallerId::new(holder)).unwrap();
        holder = next;
        thread::sleep(Duration::from_millis(5));
    }

    let err = writer.join().unwrap().unwrap_err();
    assert!(matches!(err, GateError::Timeout { role: Role::Writer, .. }));
    assert!(!gate.writer_active());

    gate.end_read(CallerId::new(holder)).unwrap();

    // Once the group drains the writer gets in immediately
    gate.try_begin_write(CallerId::new(0)).unwrap();
    gate.end_write(CallerId::new(0)).unwrap();
    assert_eq!(gate.stats().write_timeouts, 1);
}

#[test]
fn test_unmatched_end_calls_are_rejected() {
    let gate = ReaderWriterGate::new();

    assert_eq!(
        gate.end_read(CallerId::new(5)),
        Err(GateError::ReadNotHeld { caller: CallerId::new(5) })
    );
    assert_eq!(
        gate.end_write(CallerId::new(6)),
        Err(GateError::WriteNotHeld { caller: CallerId::new(6) })
    );

    // A reader group holds the permit, but no writer is inside
    gate.begin_read(CallerId::new(7));
    assert!(gate.end_write(CallerId::new(7)).unwrap_err().is_misuse());
    assert_eq!(gate.active_readers(), 1);
    assert!(gate.is_write_locked());
    gate.end_read(CallerId::new(7)).unwrap();
    assert!(!gate.is_write_locked());
}

#[test]
fn test_timed_out_reader_leaves_no_trace() {
    let gate = Arc::new(ReaderWriterGate::new());
    gate.begin_write(CallerId::new(1));

    let reader = {
        let gate = gate.clone();
        thread::spawn(move || gate.begin_read_timeout(CallerId::new(2), Duration::from_millis(50)))
    };
    let err = reader.join().unwrap().unwrap_err();
    assert!(matches!(err, GateError::Timeout { role: Role::Reader, .. }));
    assert_eq!(gate.active_readers(), 0);

    gate.end_write(CallerId::new(1)).unwrap();
    gate.begin_read_timeout(CallerId::new(2), Duration::from_millis(50)).unwrap();
    assert_eq!(gate.active_readers(), 1);
    gate.end_read(CallerId::new(2)).unwrap();
    assert_eq!(gate.stats().read_timeouts, 1);
}
