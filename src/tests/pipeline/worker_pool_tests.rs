//! Tests for the threaded decode pipeline.

use std::sync::Arc;

use crate::binding::{BindingTable, ParseOptions};
use crate::config::{HeaderMode, ParserConfig};
use crate::error::{CsvError, ErrorKind};
use crate::pipeline::{Filled, WorkerPool};

crate::csv_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Tick {
        pub seq: u64,
        pub price: f64,
    }
}

fn table() -> Arc<BindingTable<Tick>> {
    let cfg = ParserConfig::default().with_header_mode(HeaderMode::None);
    Arc::new(BindingTable::build(&cfg).unwrap())
}

fn pool(workers: usize, queue: usize) -> WorkerPool<Tick> {
    WorkerPool::start(table(), workers, queue, 64, ParseOptions::default()).unwrap()
}

/// Produces `lines` one at a time, numbering them from 1.
fn feeder(lines: Vec<String>) -> impl FnMut(&mut [u8]) -> crate::error::Result<Option<(usize, usize)>> {
    let mut next = 0usize;
    move |buf: &mut [u8]| {
        let Some(line) = lines.get(next) else {
            return Ok(None);
        };
        next += 1;
        let n = line.len().min(buf.len());
        buf[..n].copy_from_slice(&line.as_bytes()[..n]);
        Ok(Some((line.len(), next)))
    }
}

fn ticks(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{i},{}.5", i * 2)).collect()
}

#[test]
fn fills_every_slot_in_order() {
    let mut pool = pool(4, 8);
    assert_eq!(pool.workers(), 4);
    assert!(pool.is_running());

    let mut dest = vec![Tick::default(); 1000];
    let filled = pool.fill(&mut dest, 0, feeder(ticks(1000))).unwrap();
    assert_eq!(
        filled,
        Filled {
            rows: 1000,
            more_data: true
        }
    );
    for (i, tick) in dest.iter().enumerate() {
        assert_eq!(tick.seq, i as u64);
        assert_eq!(tick.price, (i * 2) as f64 + 0.5);
    }
}

#[test]
fn reports_end_of_source_and_honours_offset() {
    let mut pool = pool(2, 4);
    let mut dest = vec![Tick::default(); 10];
    let filled = pool.fill(&mut dest, 3, feeder(ticks(5))).unwrap();
    assert_eq!(filled.rows, 5);
    assert!(!filled.more_data);

    assert_eq!(dest[..3], vec![Tick::default(); 3][..]);
    assert_eq!(dest[3].seq, 0);
    assert_eq!(dest[7].seq, 4);
    assert_eq!(dest[8], Tick::default());
}

#[test]
fn batches_continue_where_the_source_left_off() {
    let mut pool = pool(3, 2);
    let mut next = feeder(ticks(25));
    let mut seen = Vec::new();
    let mut dest = vec![Tick::default(); 10];

    loop {
        let filled = pool.fill(&mut dest, 0, &mut next).unwrap();
        seen.extend(dest[..filled.rows].iter().map(|t| t.seq));
        if !filled.more_data {
            break;
        }
    }
    assert_eq!(seen, (0..25).collect::<Vec<u64>>());
}

#[test]
fn worker_errors_surface_after_the_batch() {
    let mut pool = pool(2, 4);
    let mut lines = ticks(50);
    lines[20] = "20,not-a-price".into();

    let mut dest = vec![Tick::default(); 50];
    let err = pool.fill(&mut dest, 0, feeder(lines)).unwrap_err();
    assert!(err.is(ErrorKind::FieldConversion));
    assert_eq!(err.line, Some(21));

    // The pool stays usable for the next batch.
    let filled = pool.fill(&mut dest, 0, feeder(ticks(3))).unwrap();
    assert_eq!(filled.rows, 3);
    assert_eq!(dest[2].seq, 2);
}

#[test]
fn producer_errors_are_returned() {
    let mut pool = pool(2, 4);
    let mut calls = 0;
    let mut dest = vec![Tick::default(); 8];
    let err = pool
        .fill(&mut dest, 0, |buf: &mut [u8]| {
            calls += 1;
            if calls == 3 {
                return Err(CsvError::configuration("source went away"));
            }
            buf[..3].copy_from_slice(b"1,2");
            Ok(Some((3, calls)))
        })
        .unwrap_err();
    assert_eq!(err.message, "source went away");
}

#[test]
fn truncated_lines_decode_their_prefix() {
    let mut pool = WorkerPool::start(table(), 1, 2, 4, ParseOptions::default()).unwrap();
    let mut dest = vec![Tick::default(); 1];
    pool.fill(&mut dest, 0, feeder(vec!["12,3456789".into()]))
        .unwrap();
    assert_eq!(dest[0].seq, 12);
    assert_eq!(dest[0].price, 3.0);
}

#[test]
fn stop_is_idempotent() {
    let mut pool = pool(2, 4);
    pool.stop();
    assert!(!pool.is_running());
    assert_eq!(pool.workers(), 0);
    pool.stop();
}
