//! Lock-free queueing primitives for the threaded pipeline.
//!
//! This module provides:
//! - `CircularBuffer`: Bounded power-of-two ring shared between threads
//! - `BufferPool`: Free list of pre-sized line buffers built on the ring
//! - `SpinWait`: Escalating spin/yield/sleep back-off used by every wait

mod circular;
mod pool;
mod spin;

pub use circular::{CircularBuffer, Drain};
pub use pool::BufferPool;
pub use spin::SpinWait;
