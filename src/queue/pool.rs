use super::{CircularBuffer, SpinWait};

/// Pool of pre-sized line buffers shared between the producer and workers.
///
/// The producer is the only taker; every worker gives buffers back, so the
/// underlying ring is used multi-producer/single-consumer.
#[derive(Debug)]
pub struct BufferPool {
    free: CircularBuffer<Box<[u8]>>,
    buffer_len: usize,
    total: usize,
}

impl BufferPool {
    /// Allocate `count` buffers of `buffer_len` bytes each.
    pub fn new(count: usize, buffer_len: usize) -> Self {
        let free = CircularBuffer::new(count);
        for _ in 0..count {
            // Capacity is at least `count`, so this never spins.
            free.push(vec![0u8; buffer_len].into_boxed_slice());
        }
        Self {
            free,
            buffer_len,
            total: count,
        }
    }

    /// Take a free buffer, spinning until one is returned.
    pub fn take(&self) -> Box<[u8]> {
        let mut spinner = SpinWait::new();
        loop {
            if let Some(buf) = self.free.try_pop() {
                return buf;
            }
            spinner.spin_once();
        }
    }

    pub fn give(&self, buf: Box<[u8]>) {
        debug_assert_eq!(buf.len(), self.buffer_len);
        self.free.push(buf);
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }
}
