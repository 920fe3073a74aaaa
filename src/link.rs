/*!
    task side of the link

    a [Link] owns the two ring buffers. It is split once at startup into a [Messenger], serviced by the application
    once per cycle, and a [Transport], invoked by the uart interrupt. The receive buffer is only ever filled by the
    transport and drained by the messenger, the transmit buffer the other way around.

    ```ignore
    let (mut messenger, mut transport) = link.split(Config::default());
    messenger.initialize(&mut pins);
    // every service cycle
    let status = messenger.receive_frame(&mut pins, &mut remote);
    if messenger.send_due() {
        messenger.transmit_frame(&mut pins, &outgoing);
    }
    // in the uart interrupt
    transport.on_interrupt(&mut uart);
    ```
*/

use log::*;

use crate::{
    fifo::{Fifo, Producer, Consumer},
    flow::Watermarks,
    frame::{Frame, MotionSettings, FRAME_SIZE, START},
    hw::{Handshake, Interrupts, Probe, Source},
    transport::Transport,
    };


/// ring buffer size for each direction: 4 frames, plus the slot always kept empty
pub const FIFO_SIZE: usize = 4 * FRAME_SIZE + 1;

/// tuning of the link
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// number of consecutive cycles without a valid frame tolerated before falling back to local control
    pub resync_limit: u8,
    /// RTS levels
    pub watermarks: Watermarks,
    /// number of service cycles skipped between two transmitted frames
    pub send_period: u8,
}
impl Config {
    pub const DEFAULT: Self = Self {
        resync_limit: 9,
        watermarks: Watermarks::DEFAULT,
        send_period: 5,
    };
    /// check the configuration is consistent with a receive buffer of the given usable capacity
    pub fn validate(&self, capacity: usize) -> Result<(), &'static str> {
        self.watermarks.validate(capacity)?;
        if capacity < FRAME_SIZE {
            return Err("receive buffer cannot hold a frame");
        }
        Ok(())
    }
}
impl Default for Config {
    fn default() -> Self {Self::DEFAULT}
}

/// where the motion settings currently come from
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CommStatus {
    /// on-device inputs, the link has been silent or invalid for too long
    #[default]
    Local = 0,
    /// last validated frame from the peer
    Remote = 1,
}
impl From<CommStatus> for u8 {
    fn from(status: CommStatus) -> u8 {status as u8}
}

/// counters kept by the [Messenger]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// valid frames received
    pub frames: u32,
    /// frames with a start marker whose checksum failed
    pub crc_errors: u32,
    /// outgoing frames dropped because the transmit buffer was full
    pub dropped_frames: u32,
}


/// both ring buffers of a link, see module documentation
pub struct Link<const RX: usize = FIFO_SIZE, const TX: usize = FIFO_SIZE> {
    receive: Fifo<RX>,
    transmit: Fifo<TX>,
}
impl<const RX: usize, const TX: usize> Link<RX, TX> {
    pub const fn new() -> Self {
        Self {
            receive: Fifo::new(),
            transmit: Fifo::new(),
        }
    }
    /// empty both buffers and hand out the task and interrupt ends of the link
    pub fn split(&mut self, config: Config) -> (Messenger<'_, RX, TX>, Transport<'_, RX, TX>) {
        debug_assert_eq!(config.validate(self.receive.capacity()), Ok(()));
        let (receive_producer, receive_consumer) = self.receive.split();
        let (transmit_producer, transmit_consumer) = self.transmit.split();
        (
            Messenger::new(receive_consumer, transmit_producer, config),
            Transport::new(receive_producer, transmit_consumer, config.watermarks),
        )
    }
}
impl<const RX: usize, const TX: usize> Default for Link<RX, TX> {
    fn default() -> Self {Self::new()}
}


/// counts service cycles to rate limit transmission
#[derive(Copy, Clone, Debug, Default)]
pub struct SendPacer {
    period: u8,
    count: u8,
}
impl SendPacer {
    pub const fn new(period: u8) -> Self {
        Self {period, count: 0}
    }
    /// advance one cycle, return true once every `period + 1` cycles
    pub fn tick(&mut self) -> bool {
        if self.count >= self.period {
            self.count = 0;
            true
        }
        else {
            self.count += 1;
            false
        }
    }
}


/// task end of a link: frames in and out of the ring buffers
pub struct Messenger<'l, const RX: usize, const TX: usize, P: Probe = ()> {
    receive: Consumer<'l, RX>,
    transmit: Producer<'l, TX>,
    config: Config,
    probe: P,
    /// consecutive cycles without a valid frame
    resync: u8,
    status: CommStatus,
    pacer: SendPacer,
    stats: LinkStats,
}

impl<'l, const RX: usize, const TX: usize> Messenger<'l, RX, TX> {
    fn new(receive: Consumer<'l, RX>, transmit: Producer<'l, TX>, config: Config) -> Self {
        Self {
            receive,
            transmit,
            config,
            probe: (),
            resync: 0,
            status: CommStatus::Local,
            pacer: SendPacer::new(config.send_period),
            stats: LinkStats::default(),
        }
    }
}

impl<'l, const RX: usize, const TX: usize, P: Probe> Messenger<'l, RX, TX, P> {
    /// report link events to the given probe
    pub fn with_probe<Q: Probe>(self, probe: Q) -> Messenger<'l, RX, TX, Q> {
        Messenger {
            receive: self.receive,
            transmit: self.transmit,
            config: self.config,
            probe,
            resync: self.resync,
            status: self.status,
            pacer: self.pacer,
            stats: self.stats,
        }
    }

    /// start the link from a clean state, with the peer held off until the first receive cycle
    ///
    /// must be called before the uart interrupts are enabled
    pub fn initialize<H: Handshake>(&mut self, hw: &mut H) {
        self.receive.clear();
        self.resync = 0;
        self.status = CommStatus::Local;
        self.pacer = SendPacer::new(self.config.send_period);
        hw.set_rts(true);
        debug!("link initialized, {} bytes per direction", self.receive.writable());
    }

    /**
        try to extract one frame from the receive buffer, once per service cycle

        on a valid frame, `settings` receives the speed and angle from the wire and the link switches to remote
        control. Otherwise `settings` is left untouched, and the link falls back to local control after
        [Config::resync_limit] bad cycles in a row.

        Exactly one candidate start byte is consumed per cycle when no complete frame is available, so a
        misaligned stream realigns one byte per cycle.
    */
    pub fn receive_frame<H: Handshake>(&mut self, hw: &mut H, settings: &mut MotionSettings) -> CommStatus {
        let available = self.receive.readable();
        let start = self.receive.pop().ok();

        match start {
            Some(START) if available >= FRAME_SIZE => {
                let mut bytes = [START; FRAME_SIZE];
                for byte in &mut bytes[1 ..] {
                    // cannot underflow, availability checked above and we are the only reader
                    *byte = self.receive.pop().unwrap_or_default();
                }
                match Frame::decode(&bytes) {
                    Ok(frame) => {
                        settings.speed = frame.speed;
                        settings.angle = frame.angle;
                        settings.abs_speed = frame.speed.unsigned_abs();
                        if self.status != CommStatus::Remote {
                            debug!("remote control from frame {:?}", frame);
                        }
                        self.resync = 0;
                        self.status = CommStatus::Remote;
                        self.stats.frames = self.stats.frames.wrapping_add(1);
                    },
                    Err(err) => {
                        trace!("rejected frame: {}", err);
                        self.stats.crc_errors = self.stats.crc_errors.wrapping_add(1);
                        if self.resync < self.config.resync_limit {
                            self.resync += 1;
                            self.probe.crc_mismatch();
                        }
                    },
                }
            },
            _ => {
                if self.resync < self.config.resync_limit {
                    self.resync += 1;
                    trace!("no frame this cycle ({}/{})", self.resync, self.config.resync_limit);
                }
                else {
                    if self.status == CommStatus::Remote {
                        warn!("no valid frame for {} cycles, back to local control", self.resync);
                    }
                    self.status = CommStatus::Local;
                    self.resync = 0;
                }
            },
        }

        if self.config.watermarks.may_release(self.receive.writable()) {
            hw.set_rts(false);
        }
        self.status
    }

    /**
        queue a frame carrying `settings` for transmission

        `settings` must be within [SPEED_RANGE](crate::frame::SPEED_RANGE) and
        [ANGLE_RANGE](crate::frame::ANGLE_RANGE). The frame is dropped for this cycle if the transmit buffer cannot hold
        it entirely. When the peer allows
        sending, the transmit interrupt is enabled so the [Transport] drains the buffer.
    */
    pub fn transmit_frame<H: Handshake + Interrupts>(&mut self, hw: &mut H, settings: &MotionSettings) {
        debug_assert!(settings.in_range(), "setpoints out of range: {:?}", settings);
        if self.transmit.writable() >= FRAME_SIZE {
            let frame = Frame::new(settings.speed, settings.angle);
            if let Err(err) = self.transmit.push_all(&frame.encode()) {
                // only the interrupt reads this buffer, it cannot shrink the free space
                debug!("frame not queued: {}", err);
            }
        }
        else {
            trace!("transmit buffer full, frame dropped");
            self.stats.dropped_frames = self.stats.dropped_frames.wrapping_add(1);
        }

        if hw.clear_to_send() && self.transmit.readable() > 0 {
            hw.enable(Source::Transmit);
        }
    }

    /// advance the send pacer, true when a frame should be transmitted this cycle
    pub fn send_due(&mut self) -> bool {
        self.pacer.tick()
    }

    pub fn status(&self) -> CommStatus {self.status}
    /// consecutive bad cycles counted so far
    pub fn resync_count(&self) -> u8 {self.resync}
    pub fn stats(&self) -> LinkStats {self.stats}
    pub fn config(&self) -> &Config {&self.config}
    /// bytes waiting in the receive buffer
    pub fn pending(&self) -> usize {self.receive.readable()}
    /// free space in the receive buffer
    pub fn receive_space(&self) -> usize {self.receive.writable()}
    /// bytes not yet handed to the uart
    pub fn queued(&self) -> usize {self.transmit.readable()}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer() {
        let mut pacer = SendPacer::new(5);
        let due: heapless::Vec<bool, 18> = (0 .. 18).map(|_| pacer.tick()).collect();
        assert_eq!(due.iter().filter(|&&due| due).count(), 3);
        assert!(due[5] && due[11] && due[17]);
        // a zero period sends every cycle
        let mut pacer = SendPacer::new(0);
        assert!(pacer.tick() && pacer.tick());
    }

    #[test]
    fn config() {
        let config = Config::default();
        assert_eq!(config.resync_limit, 9);
        assert_eq!(config.watermarks, Watermarks {hold: 6, release: 10});
        assert_eq!(config.validate(FIFO_SIZE - 1), Ok(()));
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn status_values() {
        assert_eq!(u8::from(CommStatus::Local), 0);
        assert_eq!(u8::from(CommStatus::Remote), 1);
        assert_eq!(CommStatus::default(), CommStatus::Local);
    }
}
