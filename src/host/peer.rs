use log::*;
use serial2_tokio::{SerialPort, CharSize, StopBits, Parity, FlowControl};
use tokio::io::{AsyncRead, AsyncWrite, AsyncReadExt, AsyncWriteExt};
use std::{
    path::Path,
    time::Duration,
    sync::atomic::{AtomicUsize, Ordering},
    };

use crate::{
    mutex::*,
    frame::{Frame, MotionSettings, FRAME_SIZE},
    };
use super::Error;


/// default time waited for a frame, a node sends one every 6 service cycles
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/**
    async counterpart of a node

    sending and receiving use separate halves of the stream, so both can run concurrently from the same `&Peer`
*/
pub struct Peer<R, W> {
    receive: BusyMutex<Receiver<R>>,
    transmit: BusyMutex<W>,
    timeout: Duration,
    /// bytes skipped while realigning on frames, for diagnostics
    skipped: AtomicUsize,
}

/// reading half with the bytes gathered so far toward the next frame
struct Receiver<R> {
    stream: R,
    window: [u8; FRAME_SIZE],
    filled: usize,
}

impl Peer<SerialPort, SerialPort> {
    /// open the given serial port with 8N1 framing and RTS/CTS flow control
    pub fn open(path: impl AsRef<Path>, rate: u32) -> Result<Self, Error> {
        let receive = SerialPort::open(path, |mut settings: serial2_tokio::Settings| {
                settings.set_raw();
                settings.set_baud_rate(rate)?;
                settings.set_char_size(CharSize::Bits8);
                settings.set_stop_bits(StopBits::One);
                settings.set_parity(Parity::None);
                settings.set_flow_control(FlowControl::RtsCts);
                Ok(settings)
                })?;
        let transmit = receive.try_clone()?;
        Ok(Self::new(receive, transmit))
    }
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Peer<R, W> {
    pub fn new(receive: R, transmit: W) -> Self {
        Self {
            receive: BusyMutex::from(Receiver {
                stream: receive,
                window: [0; FRAME_SIZE],
                filled: 0,
                }),
            transmit: BusyMutex::from(transmit),
            timeout: DEFAULT_TIMEOUT,
            skipped: Default::default(),
        }
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn timeout(&self) -> Duration {self.timeout}
    /// total bytes discarded so far while looking for frames
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// send one frame carrying the given setpoints
    pub async fn send(&self, settings: &MotionSettings) -> Result<(), Error> {
        debug_assert!(settings.in_range(), "setpoints out of range: {:?}", settings);
        let frame = Frame::new(settings.speed, settings.angle);
        let mut bus = self.transmit.lock().await;
        bus.write_all(&frame.encode()).await?;
        bus.flush().await?;
        trace!("sent {:?}", frame);
        Ok(())
    }

    /// wait for the next valid frame and return its setpoints
    ///
    /// bytes read before a timeout are kept and the search resumes from them on the next call
    pub async fn receive(&self) -> Result<MotionSettings, Error> {
        tokio::time::timeout(self.timeout, self.catch_frame()).await
            .map_err(|_| Error::Timeout)?
            .map(|frame| frame.settings())
    }

    /// send our setpoints then wait for the node's
    pub async fn exchange(&self, settings: &MotionSettings) -> Result<MotionSettings, Error> {
        self.send(settings).await?;
        self.receive().await
    }

    async fn catch_frame(&self) -> Result<Frame, Error> {
        let mut guard = self.receive.lock().await;
        let receiver = &mut *guard;
        // every await point leaves `window[.. filled]` consistent, so dropping this future loses nothing
        loop {
            while receiver.filled < FRAME_SIZE {
                let read = receiver.stream.read(&mut receiver.window[receiver.filled ..]).await?;
                if read == 0 {
                    return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
                }
                receiver.filled += read;
            }
            // slide one byte at a time until start marker and checksum agree
            match Frame::decode(&receiver.window) {
                Ok(frame) => {
                    receiver.filled = 0;
                    break Ok(frame)
                },
                Err(err) => {
                    debug!("catching up frame: {}", err);
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                    receiver.window.rotate_left(1);
                    receiver.filled -= 1;
                },
            }
        }
    }
}

