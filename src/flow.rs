/*!
    RTS/CTS flow control policy

    RTS is raised to hold the peer off when the receive buffer is nearly full, and only dropped again once the
    buffer has drained to a higher level. The gap between both levels keeps the line from chattering when the
    occupancy hovers around a single threshold.

    The interrupt handler only ever raises RTS (it is the one filling the buffer), the application task only ever
    drops it (it is the one draining). Both use the same [Watermarks].
*/

use crate::frame::FRAME_SIZE;


/// receive buffer free space levels driving RTS
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Watermarks {
    /// hold the peer when free space falls to this level or below
    pub hold: usize,
    /// release the peer when free space reaches this level or above
    pub release: usize,
}
impl Watermarks {
    pub const DEFAULT: Self = Self {
        hold: 6,
        release: 2 * FRAME_SIZE,
    };
    /// the peer must be stopped
    pub fn must_hold(&self, space: usize) -> bool {
        space <= self.hold
    }
    /// the peer may be allowed to send again
    pub fn may_release(&self, space: usize) -> bool {
        space >= self.release
    }
    /// check the band is not empty and fits a buffer of the given usable capacity
    pub fn validate(&self, capacity: usize) -> Result<(), &'static str> {
        if self.hold >= self.release {
            return Err("hold level must be below release level");
        }
        if self.release > capacity {
            return Err("release level exceeds buffer capacity");
        }
        Ok(())
    }
}
impl Default for Watermarks {
    fn default() -> Self {Self::DEFAULT}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hysteresis() {
        let marks = Watermarks::default();
        assert!(marks.must_hold(0));
        assert!(marks.must_hold(6));
        assert!(!marks.must_hold(7));
        // in the band, neither transition applies
        for space in 7 .. 10 {
            assert!(!marks.must_hold(space));
            assert!(!marks.may_release(space));
        }
        assert!(marks.may_release(10));
        assert!(marks.may_release(20));
    }

    #[test]
    fn validate() {
        assert_eq!(Watermarks::default().validate(20), Ok(()));
        assert!(Watermarks::default().validate(8).is_err());
        assert!(Watermarks {hold: 10, release: 10}.validate(20).is_err());
    }
}
