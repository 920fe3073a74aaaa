/*!
    serial link carrying motor speed and angle settings between two nodes over a uart

    every message is a fixed 5 bytes frame `[start, speed, angle, crc high, crc low]` checked by a CRC16.
    Bytes are moved between the uart and two ring buffers by an interrupt handler ([transport]), while the
    application task extracts and produces frames from those buffers ([link]). Hardware RTS/CTS handshake keeps
    either side from overrunning the other ([flow]).

    - [fifo] lock-free single producer / single consumer byte queues shared between interrupt and task
    - [crc] checksum shared by both ends of the link
    - [frame] wire layout and motion settings
    - [link] task side: receive and transmit frames once per service cycle
    - [transport] interrupt side: uart registers to ring buffers
    - [hw] traits the platform implements for its uart, handshake lines and interrupt controller
    - [sim] in-memory hardware for tests and bench bring-up
*/
#![no_std]
#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
#[cfg(feature = "host")]
mod mutex;

pub mod crc;
pub mod fifo;
pub mod flow;
pub mod frame;
pub mod hw;
pub mod link;
pub mod sim;
pub mod transport;
#[cfg(feature = "host")]
pub mod host;

pub use error::{Error, Result};
pub use frame::{Frame, MotionSettings, FRAME_SIZE, START};
pub use link::{CommStatus, Config, Link, Messenger};
pub use transport::Transport;
