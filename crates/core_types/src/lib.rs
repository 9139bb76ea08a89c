use std::fmt;

pub type SessionId = u64;
pub type RequestId = u64;

/// Per-editor-session widget number.
///
/// Always negative so it cannot collide with persisted widget ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetNumber(i64);

impl WidgetNumber {
    /// Number used when a request does not name one.
    pub const DEFAULT: WidgetNumber = WidgetNumber(-1);

    /// Derive the disposable number for a session: `-(session_id)`, never zero.
    pub fn for_session(session_id: SessionId) -> Self {
        let raw = i64::try_from(session_id).unwrap_or(i64::MAX).max(1);
        WidgetNumber(-raw)
    }

    /// Wrap a raw number coming off the wire.
    ///
    /// Positive numbers are accepted as-is; the renderer never persists anything.
    pub const fn from_raw(raw: i64) -> Self {
        WidgetNumber(raw)
    }

    pub const fn as_raw(self) -> i64 {
        self.0
    }

    pub const fn is_disposable(self) -> bool {
        self.0 < 0
    }
}

impl Default for WidgetNumber {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WidgetNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of a canonical instance serialization.
///
/// Two instances with the same fields and values hash equal regardless of where
/// they were produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceHash(pub u64);

impl InstanceHash {
    /// FNV-1a over the canonical bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        let mut hash = OFFSET;
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(PRIME);
        }
        InstanceHash(hash)
    }
}

impl fmt::Display for InstanceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
