//! 12-byte object identifiers and their generator.
//!
//! Layout, all multi-byte fields big-endian:
//!
//! ```text
//! | seconds (4) | machine (3) | process (2) | counter (3) |
//! ```
//!
//! Identifiers from one generator sort by creation second, then by counter
//! within a second (modulo counter wraparound).

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;

use crate::error::ObjectIdError;
use crate::limits::OBJECT_ID_SIZE;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// A 12-byte globally unique identifier with an embedded creation time.
///
/// Equality and ordering are byte-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    bytes: [u8; OBJECT_ID_SIZE],
}

impl ObjectId {
    /// Generates a new identifier with the process-wide default generator.
    pub fn new() -> Self {
        default_generator().generate()
    }

    /// Wraps 12 raw bytes.
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parses 24 hexadecimal characters (either case).
    pub fn parse_str(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != OBJECT_ID_SIZE * 2 {
            return Err(ObjectIdError::InvalidLength { len: s.len() });
        }
        let mut bytes = [0u8; OBJECT_ID_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self { bytes })
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> &[u8; OBJECT_ID_SIZE] {
        &self.bytes
    }

    /// Returns the 24-character lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Seconds since the Unix epoch at generation time.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    /// Generation time in milliseconds since the Unix epoch.
    pub fn generation_time_millis(&self) -> i64 {
        self.timestamp() as i64 * 1000
    }

    /// The 3-byte machine discriminator.
    pub fn machine(&self) -> [u8; 3] {
        [self.bytes[4], self.bytes[5], self.bytes[6]]
    }

    /// The 2-byte process discriminator.
    pub fn process(&self) -> u16 {
        u16::from_be_bytes([self.bytes[7], self.bytes[8]])
    }

    /// The 24-bit counter value.
    pub fn counter(&self) -> u32 {
        u32::from_be_bytes([0, self.bytes[9], self.bytes[10], self.bytes[11]])
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<[u8; OBJECT_ID_SIZE]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}

/// Produces [`ObjectId`]s for one machine/process pair.
///
/// The generator is thread-safe; the counter is the only mutable state and
/// wraps silently at 2^24.
#[derive(Debug)]
pub struct ObjectIdGenerator {
    machine: [u8; 3],
    process: u16,
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    /// Creates a generator with a random machine discriminator, the current
    /// process id and a random counter start.
    pub fn new() -> Self {
        let machine: [u8; 3] = rand::random();
        let process = std::process::id() as u16;
        let start = rand::random::<u32>() & COUNTER_MASK;
        log::debug!(
            "seeded object id generator: machine={} process={} counter={}",
            hex::encode(machine),
            process,
            start
        );
        Self::with_parts(machine, process, start)
    }

    /// Creates a generator with explicit discriminators and counter start.
    pub const fn with_parts(machine: [u8; 3], process: u16, counter_start: u32) -> Self {
        Self {
            machine,
            process,
            counter: AtomicU32::new(counter_start & COUNTER_MASK),
        }
    }

    /// Generates an identifier stamped with the current wall-clock second.
    pub fn generate(&self) -> ObjectId {
        self.generate_at(unix_seconds())
    }

    /// Generates an identifier stamped with `seconds`.
    pub fn generate_at(&self, seconds: u32) -> ObjectId {
        let counter = self.next_counter();
        let mut bytes = [0u8; OBJECT_ID_SIZE];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..7].copy_from_slice(&self.machine);
        bytes[7..9].copy_from_slice(&self.process.to_be_bytes());
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..]);
        ObjectId::from_bytes(bytes)
    }

    /// The counter value the next identifier will carry.
    pub fn counter_value(&self) -> u32 {
        self.counter.load(Ordering::Relaxed) & COUNTER_MASK
    }

    fn next_counter(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref DEFAULT_GENERATOR: ObjectIdGenerator = ObjectIdGenerator::new();
}

/// The process-wide generator, seeded on first use and never reset.
pub fn default_generator() -> &'static ObjectIdGenerator {
    &DEFAULT_GENERATOR
}

fn unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
