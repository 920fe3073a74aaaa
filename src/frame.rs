/*!
    wire layout of the frames exchanged on the link

    ```text
    [START][SPEED: i8][ANGLE: i8][CRC high][CRC low]
    ```

    The checksum covers the first three bytes. There is no escaping: [START] is `-86` as a signed byte, a value the
    speed and angle payloads are allowed to take as well, so a misaligned reader can mistake a payload byte for a
    start marker. The checksum then rejects the candidate, except for the unavoidable 1/65536 collisions.
*/

use core::ops::RangeInclusive;
use packbytes::{FromBytes, ToBytes, ByteArray};

use crate::{
    crc::{SEED, update_crc16},
    Error, Result,
    };


/// start marker, `0xAA` or `-86` when read as a signed byte
pub const START: u8 = 0xAA;
/// number of bytes of a frame on the wire
pub const FRAME_SIZE: usize = <Frame as FromBytes>::Bytes::SIZE;
/// valid speed settings
pub const SPEED_RANGE: RangeInclusive<i8> = -99 ..= 99;
/// valid angle settings
pub const ANGLE_RANGE: RangeInclusive<i8> = -90 ..= 90;

/// one message of the link, fields are serialized big endian in declaration order
#[derive(Copy, Clone, FromBytes, ToBytes, Debug, Default, PartialEq)]
pub struct Frame {
    /// always [START] for a valid frame
    pub start: u8,
    pub speed: i8,
    pub angle: i8,
    /// CRC16 of the 3 previous bytes
    pub crc: u16,
}

impl Frame {
    /// build a frame carrying the given setpoints, with its checksum
    pub fn new(speed: i8, angle: i8) -> Self {
        Self {
            start: START,
            speed,
            angle,
            crc: checksum(START, speed, angle),
        }
    }
    /// bytes to put on the wire
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut bytes = [0; FRAME_SIZE];
        bytes.copy_from_slice(self.to_be_bytes().as_ref());
        bytes
    }
    /// parse and validate bytes received from the wire
    pub fn decode(bytes: &[u8; FRAME_SIZE]) -> Result<Self> {
        let mut raw = <Self as FromBytes>::Bytes::zeroed();
        raw.as_mut().copy_from_slice(bytes);
        let frame = Self::from_be_bytes(raw);
        frame.check()?;
        Ok(frame)
    }
    /// verify start marker and checksum
    pub fn check(&self) -> Result<()> {
        if self.start != START {
            return Err(Error::BadStart(self.start));
        }
        let expected = checksum(self.start, self.speed, self.angle);
        if expected != self.crc {
            return Err(Error::CrcMismatch {expected, received: self.crc});
        }
        Ok(())
    }
    /// setpoints carried by this frame
    pub fn settings(&self) -> MotionSettings {
        MotionSettings::new(self.speed, self.angle)
    }
}

/// CRC16 of a frame header, as computed by both ends
pub fn checksum(start: u8, speed: i8, angle: i8) -> u16 {
    let crc = update_crc16(SEED, start);
    let crc = update_crc16(crc, speed as u8);
    update_crc16(crc, angle as u8)
}


/// speed and angle setpoints, in the form used by the motor drive
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MotionSettings {
    /// signed speed setpoint, in [SPEED_RANGE]
    pub speed: i8,
    /// signed angle setpoint, in [ANGLE_RANGE]
    pub angle: i8,
    /// magnitude of `speed`
    pub abs_speed: u8,
    /// magnitude of `angle`
    pub abs_angle: u8,
}
impl MotionSettings {
    pub fn new(speed: i8, angle: i8) -> Self {
        Self {
            speed,
            angle,
            abs_speed: speed.unsigned_abs(),
            abs_angle: angle.unsigned_abs(),
        }
    }
    /// true if both setpoints are within their nominal range
    pub fn in_range(&self) -> bool {
        SPEED_RANGE.contains(&self.speed) && ANGLE_RANGE.contains(&self.angle)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(FRAME_SIZE, 5);
        assert_eq!(START as i8, -86);
        let frame = Frame::new(42, -30);
        assert_eq!(frame.encode(), [0xAA, 42, 0xE2, 0x82, 0x80]);
    }

    #[test]
    fn decode_valid() {
        let frame = Frame::decode(&[0xAA, 42, 0xE2, 0x82, 0x80]).unwrap();
        assert_eq!(frame.speed, 42);
        assert_eq!(frame.angle, -30);
        assert_eq!(frame.settings(), MotionSettings {speed: 42, angle: -30, abs_speed: 42, abs_angle: 30});
    }

    #[test]
    fn single_bit_flips_are_rejected() {
        let bytes = Frame::new(42, -30).encode();
        for index in 0 .. FRAME_SIZE {
            for bit in 0 .. 8 {
                let mut corrupted = bytes;
                corrupted[index] ^= 1 << bit;
                let result = Frame::decode(&corrupted);
                if index == 0 {
                    assert_eq!(result, Err(Error::BadStart(corrupted[0])));
                }
                else {
                    assert!(matches!(result, Err(Error::CrcMismatch {..})), "byte {} bit {}", index, bit);
                }
            }
        }
    }

    #[test]
    fn payload_may_equal_start_marker() {
        // the sentinel is a legal speed and angle, it is carried untouched
        let frame = Frame::new(START as i8, START as i8);
        assert!(frame.settings().in_range());
        assert_eq!(Frame::decode(&frame.encode()), Ok(frame));
    }

    #[test]
    fn ranges() {
        assert!(MotionSettings::new(-99, 90).in_range());
        assert!(!MotionSettings::new(100, 0).in_range());
        assert!(!MotionSettings::new(0, -91).in_range());
        assert_eq!(MotionSettings::new(-128, -90).abs_speed, 128);
    }
}
