/*!
    hardware seams of the link

    the platform implements these traits over its uart, handshake pins and interrupt controller. Implementations
    are expected to be thin register accessors: one instance is held by the interrupt handler and another by the
    application task, both pointing at the same peripheral.
*/

use bilge::prelude::*;


/// interrupt sources of the uart
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// parity, framing or overrun detected
    Error,
    /// a byte arrived
    Receive,
    /// room in the transmit register
    Transmit,
}

/// receiver error flags
#[bitsize(8)]
#[derive(Copy, Clone, FromBits, DebugBits, PartialEq, Default)]
pub struct LineErrors {
    pub parity: bool,
    pub framing: bool,
    /// unlike the others, reading the received data does not clear it
    pub overrun: bool,
    _reserved: u5,
}
impl LineErrors {
    pub fn any(&self) -> bool {
        self.parity() || self.framing() || self.overrun()
    }
}

/// uart data registers
pub trait Uart {
    /// a received byte is waiting in the hardware
    fn receive_available(&self) -> bool;
    /// take a received byte from the hardware
    fn receive(&mut self) -> u8;
    /// the hardware cannot accept another byte to send
    fn transmit_full(&self) -> bool;
    /// hand a byte to the transmitter
    fn transmit(&mut self, byte: u8);
    /// current receiver error flags
    fn line_errors(&self) -> LineErrors;
    fn clear_overrun(&mut self);
}

/// RTS/CTS lines
pub trait Handshake {
    /// drive RTS, `true` asks the peer to stop sending
    fn set_rts(&mut self, hold: bool);
    /// CTS as driven by the peer, `true` when we may send
    fn clear_to_send(&self) -> bool;
}

/// per source control of the uart interrupts
pub trait Interrupts {
    fn is_pending(&self, source: Source) -> bool;
    fn is_enabled(&self, source: Source) -> bool;
    fn enable(&mut self, source: Source);
    fn disable(&mut self, source: Source);
    /// acknowledge a pending source
    fn clear(&mut self, source: Source);

    /// the source is raised and allowed to interrupt
    fn is_active(&self, source: Source) -> bool {
        self.is_pending(source) && self.is_enabled(source)
    }
}

/**
    observation points of the link, for indicator leds or scope pins

    everything defaults to doing nothing. Calls from the interrupt handler must stay short.
*/
pub trait Probe {
    fn interrupt_enter(&mut self) {}
    fn interrupt_exit(&mut self) {}
    fn byte_received(&mut self) {}
    fn byte_sent(&mut self) {}
    /// a frame with a valid start marker failed its checksum
    fn crc_mismatch(&mut self) {}
}
impl Probe for () {}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_errors() {
        let mut errors = LineErrors::default();
        assert!(!errors.any());
        errors.set_overrun(true);
        assert!(errors.any());
        assert!(!errors.parity());
        assert_eq!(LineErrors::from(0b001u8).parity(), true);
        assert_eq!(LineErrors::from(0b010u8).framing(), true);
        assert_eq!(LineErrors::from(0b100u8).overrun(), true);
    }
}
