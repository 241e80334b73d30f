use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, trace};

use super::{Shared, WorkItem};
use crate::binding::{CsvRecord, ParseOptions};
use crate::decode::RowDecoder;
use crate::error::{CsvError, ErrorKind};
use crate::queue::SpinWait;
use crate::reader::line_text;

/// Body of one worker thread: pop, decode, recycle, until stopped.
///
/// The stop flag is only honoured once the queue is empty, so every issued
/// item is completed before the worker exits.
pub(super) fn run<T: CsvRecord>(id: usize, shared: Arc<Shared<T>>, opts: ParseOptions) {
    trace!(worker = id, "worker started");
    let mut decoder = RowDecoder::new(opts);
    let mut spinner = SpinWait::new();
    let mut decoded = 0usize;

    loop {
        match shared.queue.try_pop() {
            Some(item) => {
                spinner.reset();
                process(&shared, &mut decoder, &item);
                shared.buffers.give(item.buf);
                shared.completed.fetch_add(1, Ordering::Release);
                decoded += 1;
            }
            None if shared.stop.load(Ordering::Acquire) => break,
            None => spinner.spin_once(),
        }
    }

    debug!(worker = id, rows = decoded, "worker stopped");
}

fn process<T: CsvRecord>(shared: &Shared<T>, decoder: &mut RowDecoder, item: &WorkItem) {
    // Once a batch has failed the remaining items are only recycled.
    if shared.failed.load(Ordering::Acquire) {
        return;
    }

    let dest = shared.dest.load(Ordering::Acquire);
    let text = line_text(&item.buf, item.len);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the producer publishes `dest` for the whole batch and does
        // not return until every issued item is completed. Each item carries
        // a distinct `dest_index` below the published length, so no two
        // threads ever touch the same record.
        let record = unsafe { &mut *dest.add(item.dest_index) };
        decoder.decode(record, text, item.line_no, &shared.table)
    }));

    let error = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e,
        Err(_) => CsvError {
            kind: ErrorKind::FieldConversion,
            line: Some(item.line_no),
            message: format!("Decoding panicked at line number {}.", item.line_no),
            source: None,
        },
    };
    shared.record_error(error);
}
