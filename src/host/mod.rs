/*!
    PC side of the link, for driving or monitoring a node from a `std` host

    the [Peer] speaks the same frames as a node, over any async byte stream or directly over a serial port with
    hardware RTS/CTS flow control. Unlike a node it does not need a service cycle: receiving waits for the next
    valid frame, realigning on the stream as needed.
*/

mod peer;

pub use peer::Peer;

use thiserror::Error;

/// error regarding host communication
#[derive(Error, Debug)]
pub enum Error {
    #[error("problem with uart bus")]
    Bus(#[from] std::io::Error),
    #[error("no valid frame arrived in expected time")]
    Timeout,
}
