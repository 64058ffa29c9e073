//! Epoch encoding for the wire.
//!
//! The data service represents instants as whole seconds since the Unix epoch
//! plus an optional nanosecond remainder. The remainder is only sent when it is
//! nonzero; older servers do not understand the `*_nanos` fields at all.

use chrono::{DateTime, TimeZone, Utc};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// An instant split into its wire components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireEpoch {
    /// Whole seconds since the epoch, floored
    pub seconds: i64,
    /// Sub-second remainder in `1..1_000_000_000`, `None` when zero
    pub nanos: Option<u32>,
}

/// Split an instant into floored seconds and a nonzero nanosecond remainder.
///
/// chrono keeps the sub-second part non-negative, so `timestamp()` is already
/// the floor for instants before the epoch. Leap-second instants carry a
/// sub-second part of one second or more and are folded into the next second.
pub fn to_wire_epoch<Tz: TimeZone>(instant: &DateTime<Tz>) -> WireEpoch {
    let mut seconds = instant.timestamp();
    let mut nanos = instant.timestamp_subsec_nanos();
    if nanos >= NANOS_PER_SEC {
        seconds = seconds.saturating_add(1);
        nanos -= NANOS_PER_SEC;
    }
    WireEpoch {
        seconds,
        nanos: (nanos != 0).then_some(nanos),
    }
}

/// Rebuild an instant from its wire components.
pub fn from_wire_epoch(seconds: i64, nanos: u32) -> Option<DateTime<Utc>> {
    if nanos >= NANOS_PER_SEC {
        return None;
    }
    DateTime::from_timestamp(seconds, nanos)
}

/// Interpret an integer as whole seconds since the epoch.
///
/// Saturates at the bounds chrono can represent.
pub fn from_epoch_seconds(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or(if seconds < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Values accepted wherever a query takes a point in time.
///
/// Integers are epoch seconds; timestamps in any zone pass through as the same
/// absolute instant.
pub trait IntoTimestamp {
    fn into_timestamp(self) -> DateTime<Utc>;
}

impl<Tz: TimeZone> IntoTimestamp for DateTime<Tz> {
    fn into_timestamp(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoTimestamp for i64 {
    fn into_timestamp(self) -> DateTime<Utc> {
        from_epoch_seconds(self)
    }
}

impl IntoTimestamp for i32 {
    fn into_timestamp(self) -> DateTime<Utc> {
        from_epoch_seconds(i64::from(self))
    }
}

impl IntoTimestamp for u32 {
    fn into_timestamp(self) -> DateTime<Utc> {
        from_epoch_seconds(i64::from(self))
    }
}
