/*!
    interrupt side of the link

    [Transport::on_interrupt] runs in the uart interrupt. It moves bytes between the uart registers and the ring
    buffers and raises RTS when the receive buffer fills up. It never blocks and never waits for the task: every
    loop is bounded by the hardware FIFO depth or the transmit buffer content.
*/

use log::*;

use crate::{
    fifo::{Producer, Consumer},
    flow::Watermarks,
    hw::{Handshake, Interrupts, Probe, Source, Uart},
    };


/// counters kept by the [Transport]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// bytes stored in the receive buffer
    pub received: u32,
    /// bytes handed to the transmitter
    pub sent: u32,
    /// bytes lost because the receive buffer was full
    pub dropped: u32,
    /// error interrupts handled
    pub line_errors: u32,
}

/// interrupt end of a link, created by [Link::split](crate::Link::split)
pub struct Transport<'l, const RX: usize, const TX: usize, P: Probe = ()> {
    receive: Producer<'l, RX>,
    transmit: Consumer<'l, TX>,
    watermarks: Watermarks,
    probe: P,
    stats: TransportStats,
}

impl<'l, const RX: usize, const TX: usize> Transport<'l, RX, TX> {
    pub(crate) fn new(receive: Producer<'l, RX>, transmit: Consumer<'l, TX>, watermarks: Watermarks) -> Self {
        Self {
            receive,
            transmit,
            watermarks,
            probe: (),
            stats: TransportStats::default(),
        }
    }
}

impl<'l, const RX: usize, const TX: usize, P: Probe> Transport<'l, RX, TX, P> {
    /// report interrupt events to the given probe
    pub fn with_probe<Q: Probe>(self, probe: Q) -> Transport<'l, RX, TX, Q> {
        Transport {
            receive: self.receive,
            transmit: self.transmit,
            watermarks: self.watermarks,
            probe,
            stats: self.stats,
        }
    }

    /// handle one uart interrupt, the three sources are checked in turn
    pub fn on_interrupt<H: Uart + Handshake + Interrupts>(&mut self, hw: &mut H) {
        self.probe.interrupt_enter();

        if hw.is_active(Source::Error) {
            self.on_error(hw);
        }
        if hw.is_active(Source::Receive) {
            self.on_receive(hw);
        }
        if hw.is_active(Source::Transmit) {
            self.on_transmit(hw);
        }
        // nothing may stay queued behind a pending transmit interrupt, the task enables it again when needed
        hw.disable(Source::Transmit);
        hw.clear(Source::Transmit);

        self.probe.interrupt_exit();
    }

    /// discard whatever the receiver holds to get rid of the fault
    fn on_error<H: Uart + Interrupts>(&mut self, hw: &mut H) {
        hw.clear(Source::Error);
        let errors = hw.line_errors();
        let mut discarded = 0usize;
        while hw.receive_available() {
            hw.receive();
            discarded += 1;
        }
        // reading clears parity and framing, not overrun
        if hw.line_errors().overrun() {
            hw.clear_overrun();
        }
        self.stats.line_errors = self.stats.line_errors.wrapping_add(1);
        debug!("uart line error {:?}, {} bytes discarded", errors, discarded);
    }

    fn on_receive<H: Uart + Handshake + Interrupts>(&mut self, hw: &mut H) {
        let errors = hw.line_errors();
        if !errors.any() {
            if hw.receive_available() {
                let byte = hw.receive();
                match self.receive.push(byte) {
                    Ok(()) => self.stats.received = self.stats.received.wrapping_add(1),
                    Err(_) => {
                        self.stats.dropped = self.stats.dropped.wrapping_add(1);
                        trace!("receive buffer full, byte {:#04x} lost", byte);
                    },
                }
            }
            self.probe.byte_received();
            hw.clear(Source::Receive);
        }
        else if errors.overrun() {
            hw.clear_overrun();
        }

        if self.watermarks.must_hold(self.receive.writable()) {
            hw.set_rts(true);
        }
    }

    fn on_transmit<H: Uart + Handshake + Interrupts>(&mut self, hw: &mut H) {
        if self.may_send(hw) {
            while self.may_send(hw) {
                if let Ok(byte) = self.transmit.pop() {
                    hw.transmit(byte);
                    self.stats.sent = self.stats.sent.wrapping_add(1);
                    self.probe.byte_sent();
                }
            }
            if self.transmit.readable() == 0 {
                hw.disable(Source::Transmit);
            }
        }
        else {
            hw.disable(Source::Transmit);
            hw.clear(Source::Transmit);
        }
    }

    /// the peer accepts data, we have some, and the uart has room for it
    fn may_send<H: Uart + Handshake>(&self, hw: &H) -> bool {
        hw.clear_to_send() && self.transmit.readable() > 0 && !hw.transmit_full()
    }

    pub fn stats(&self) -> TransportStats {self.stats}
    /// free space in the receive buffer
    pub fn receive_space(&self) -> usize {self.receive.writable()}
    /// bytes still waiting to be sent
    pub fn queued(&self) -> usize {self.transmit.readable()}
}
