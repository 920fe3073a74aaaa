/*!
    fixed capacity byte queues shared between interrupt and task context

    a [Fifo] wraps a [heapless::spsc::Queue] and is split once into a [Producer] and a [Consumer]. Each handle is
    owned by exactly one execution context, so the queue needs no lock: the producer alone moves the write index,
    the consumer alone moves the read index.

    One slot is kept empty to tell a full queue from an empty one, so a `Fifo<N>` holds at most `N - 1` bytes and
    `readable() + writable() == N - 1` at any time.
*/

use heapless::spsc;

use crate::{Error, Result};


/// ring buffer storage, see module documentation
pub struct Fifo<const N: usize> {
    queue: spsc::Queue<u8, N>,
}

impl<const N: usize> Fifo<N> {
    pub const fn new() -> Self {
        const { assert!(N >= 2, "a fifo needs at least one usable slot") };
        Self {queue: spsc::Queue::new()}
    }
    /// empty the queue and hand out its two ends
    ///
    /// borrowing mutably guarantees there is only ever one producer and one consumer alive
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        self.queue = spsc::Queue::new();
        let (producer, consumer) = self.queue.split();
        (Producer {queue: producer}, Consumer {queue: consumer})
    }
    /// maximum number of bytes the queue can hold
    pub fn capacity(&self) -> usize {self.queue.capacity()}
    /// bytes available to read
    pub fn readable(&self) -> usize {self.queue.len()}
    /// bytes that can be written without overflow
    pub fn writable(&self) -> usize {
        self.queue.capacity() - self.queue.len()
    }
}

impl<const N: usize> Default for Fifo<N> {
    fn default() -> Self {Self::new()}
}


/// writing end of a [Fifo]
pub struct Producer<'f, const N: usize> {
    queue: spsc::Producer<'f, u8>,
}
impl<const N: usize> Producer<'_, N> {
    /// append one byte, fails with [Error::Overflow] when full, leaving the content untouched
    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.queue.enqueue(byte).map_err(|_| Error::Overflow)
    }
    /// append all bytes or none of them
    pub fn push_all(&mut self, bytes: &[u8]) -> Result<()> {
        // the consumer can only make room meanwhile, so checking once is enough
        if self.writable() < bytes.len() {
            return Err(Error::Overflow);
        }
        for &byte in bytes {
            self.push(byte)?;
        }
        Ok(())
    }
    pub fn readable(&self) -> usize {self.queue.len()}
    pub fn writable(&self) -> usize {self.queue.capacity() - self.queue.len()}
}

/// reading end of a [Fifo]
pub struct Consumer<'f, const N: usize> {
    queue: spsc::Consumer<'f, u8>,
}
impl<const N: usize> Consumer<'_, N> {
    /// take the oldest byte, fails with [Error::Underflow] when empty
    pub fn pop(&mut self) -> Result<u8> {
        self.queue.dequeue().ok_or(Error::Underflow)
    }
    /// discard everything currently readable
    pub fn clear(&mut self) {
        while self.queue.dequeue().is_some() {}
    }
    pub fn readable(&self) -> usize {self.queue.len()}
    pub fn writable(&self) -> usize {self.queue.capacity() - self.queue.len()}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut fifo = Fifo::<8>::new();
        let (mut tx, mut rx) = fifo.split();
        // go around the ring several times
        let mut next = 0u8;
        let mut expected = 0u8;
        for round in 0 .. 20 {
            for _ in 0 .. 1 + round % 7 {
                tx.push(next).unwrap();
                next = next.wrapping_add(1);
                assert_eq!(tx.readable() + tx.writable(), 7);
            }
            while let Ok(byte) = rx.pop() {
                assert_eq!(byte, expected);
                expected = expected.wrapping_add(1);
                assert_eq!(rx.readable() + rx.writable(), 7);
            }
        }
        assert_eq!(next, expected);
    }

    #[test]
    fn overflow_keeps_content() {
        let mut fifo = Fifo::<4>::new();
        let (mut tx, mut rx) = fifo.split();
        tx.push(1).unwrap();
        tx.push(2).unwrap();
        tx.push(3).unwrap();
        assert_eq!(tx.writable(), 0);
        assert_eq!(tx.push(4), Err(Error::Overflow));
        assert_eq!(tx.readable(), 3);
        assert_eq!(rx.pop(), Ok(1));
        assert_eq!(rx.pop(), Ok(2));
        assert_eq!(rx.pop(), Ok(3));
        assert_eq!(rx.pop(), Err(Error::Underflow));
    }

    #[test]
    fn push_all_is_atomic() {
        let mut fifo = Fifo::<6>::new();
        let (mut tx, mut rx) = fifo.split();
        tx.push_all(&[1, 2]).unwrap();
        assert_eq!(tx.push_all(&[3, 4, 5, 6]), Err(Error::Overflow));
        assert_eq!(tx.readable(), 2);
        tx.push_all(&[3, 4, 5]).unwrap();
        assert_eq!(tx.writable(), 0);
        rx.clear();
        assert_eq!(rx.readable(), 0);
        assert_eq!(rx.writable(), 5);
    }

    #[test]
    fn link_sized() {
        let mut fifo = Fifo::<21>::new();
        assert_eq!(fifo.capacity(), 20);
        let (mut tx, mut rx) = fifo.split();
        for byte in 0 .. 25u8 {
            let pushed = tx.push(byte);
            if byte < 20 {
                assert_eq!(pushed, Ok(()));
            }
            else {
                assert_eq!(pushed, Err(Error::Overflow));
            }
            assert_eq!(tx.readable(), usize::from(byte.min(19)) + 1);
            assert_eq!(rx.readable() + rx.writable(), 20);
        }
        for byte in 0 .. 20u8 {
            assert_eq!(rx.pop(), Ok(byte));
        }
        assert_eq!(rx.pop(), Err(Error::Underflow));
    }

    #[test]
    fn split_resets() {
        let mut fifo = Fifo::<5>::new();
        {
            let (mut tx, _) = fifo.split();
            tx.push_all(&[9, 9, 9]).unwrap();
        }
        let (tx, mut rx) = fifo.split();
        assert_eq!(tx.readable(), 0);
        assert_eq!(rx.pop(), Err(Error::Underflow));
    }

    #[test]
    fn concurrent_ends() {
        const COUNT: usize = 100_000;
        let mut fifo = Fifo::<21>::new();
        let (mut tx, mut rx) = fifo.split();
        std::thread::scope(|scope| {
            scope.spawn(move || {
                let mut sent = 0;
                while sent < COUNT {
                    if tx.push(sent as u8).is_ok() {
                        sent += 1;
                    }
                    else {
                        std::thread::yield_now();
                    }
                }
            });
            scope.spawn(move || {
                let mut received = 0;
                while received < COUNT {
                    match rx.pop() {
                        Ok(byte) => {
                            assert_eq!(byte, received as u8);
                            received += 1;
                        },
                        Err(_) => std::thread::yield_now(),
                    }
                }
            });
        });
    }
}
