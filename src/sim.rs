/*!
    in-memory uart for tests and bench bring-up

    [SimPort] implements all the hardware traits with a small hardware-like receive and transmit register, per
    source interrupt flags and injectable line errors. [wire] connects two ports back to back the way a null modem
    cable would: transmitted bytes land in the other receiver and each side's RTS drives the other's CTS.
*/

use heapless::Deque;

use crate::hw::{Handshake, Interrupts, LineErrors, Source, Uart};


/// depth of the simulated hardware registers, like the 4 to 8 bytes fifos found in microcontroller uarts
pub const DEPTH: usize = 8;

/// simulated uart with handshake lines and interrupt controller
#[derive(Debug)]
pub struct SimPort {
    receiver: Deque<u8, DEPTH>,
    transmitter: Deque<u8, DEPTH>,
    errors: LineErrors,
    /// RTS we drive, true holds the peer
    rts: bool,
    /// CTS driven by the peer
    cts: bool,
    pending: [bool; 3],
    enabled: [bool; 3],
    /// bytes that arrived while the receiver was full or in overrun
    lost: usize,
}

impl SimPort {
    /// port with all interrupts disabled and the peer allowing us to send
    pub fn new() -> Self {
        Self {
            receiver: Deque::new(),
            transmitter: Deque::new(),
            errors: LineErrors::default(),
            rts: false,
            cts: true,
            pending: [false; 3],
            enabled: [false; 3],
            lost: 0,
        }
    }

    /// a byte arrives on the line
    ///
    /// a full receiver or one still in overrun loses it and flags an overrun
    pub fn deliver(&mut self, byte: u8) {
        if self.errors.overrun() || self.receiver.push_back(byte).is_err() {
            self.lost += 1;
            self.errors.set_overrun(true);
            self.pending[index(Source::Error)] = true;
        }
        self.pending[index(Source::Receive)] = true;
    }
    /// a byte arrives with parity or framing errors
    pub fn deliver_corrupted(&mut self, byte: u8, errors: LineErrors) {
        self.deliver(byte);
        if errors.parity() {self.errors.set_parity(true)}
        if errors.framing() {self.errors.set_framing(true)}
        if errors.overrun() {self.errors.set_overrun(true)}
        self.pending[index(Source::Error)] = true;
    }
    /// next byte leaving the transmitter
    pub fn take_sent(&mut self) -> Option<u8> {
        let byte = self.transmitter.pop_front();
        if byte.is_some() {
            // room appeared in the transmit register
            self.pending[index(Source::Transmit)] = true;
        }
        byte
    }
    pub fn set_cts(&mut self, clear: bool) {
        self.cts = clear;
    }
    /// RTS level we drive, true when holding the peer off
    pub fn rts(&self) -> bool {self.rts}
    /// some enabled source is pending, the interrupt handler should run
    pub fn interrupt_requested(&self) -> bool {
        [Source::Error, Source::Receive, Source::Transmit].into_iter()
            .any(|source| self.is_active(source))
    }
    /// bytes waiting in the receive register
    pub fn received(&self) -> usize {self.receiver.len()}
    /// bytes lost by the hardware receiver
    pub fn lost(&self) -> usize {self.lost}
}

impl Default for SimPort {
    fn default() -> Self {Self::new()}
}

impl Uart for SimPort {
    fn receive_available(&self) -> bool {
        !self.receiver.is_empty()
    }
    fn receive(&mut self) -> u8 {
        // reading the data register releases parity and framing flags
        self.errors.set_parity(false);
        self.errors.set_framing(false);
        self.receiver.pop_front().unwrap_or_default()
    }
    fn transmit_full(&self) -> bool {
        self.transmitter.is_full()
    }
    fn transmit(&mut self, byte: u8) {
        // real hardware would silently drop it as well
        let _ = self.transmitter.push_back(byte);
    }
    fn line_errors(&self) -> LineErrors {
        self.errors
    }
    fn clear_overrun(&mut self) {
        self.errors.set_overrun(false);
    }
}

impl Handshake for SimPort {
    fn set_rts(&mut self, hold: bool) {
        self.rts = hold;
    }
    fn clear_to_send(&self) -> bool {
        self.cts
    }
}

impl Interrupts for SimPort {
    fn is_pending(&self, source: Source) -> bool {
        self.pending[index(source)]
    }
    fn is_enabled(&self, source: Source) -> bool {
        self.enabled[index(source)]
    }
    fn enable(&mut self, source: Source) {
        self.enabled[index(source)] = true;
        // an idle transmitter requests data as soon as allowed to
        if source == Source::Transmit && !self.transmitter.is_full() {
            self.pending[index(source)] = true;
        }
    }
    fn disable(&mut self, source: Source) {
        self.enabled[index(source)] = false;
    }
    fn clear(&mut self, source: Source) {
        // receive is level triggered, it stays raised while data is waiting
        self.pending[index(source)] = source == Source::Receive && !self.receiver.is_empty();
    }
}

fn index(source: Source) -> usize {
    match source {
        Source::Error => 0,
        Source::Receive => 1,
        Source::Transmit => 2,
    }
}

/// move everything `from` transmitted into `to`, and update `from`'s CTS from `to`'s RTS
///
/// returns the number of bytes moved
pub fn wire(from: &mut SimPort, to: &mut SimPort) -> usize {
    from.set_cts(!to.rts());
    let mut moved = 0;
    while let Some(byte) = from.take_sent() {
        to.deliver(byte);
        moved += 1;
    }
    moved
}
