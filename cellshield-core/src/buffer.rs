//! Bounded response buffer
//!
//! Bytes received during a transaction are accumulated here and searched for
//! response markers. The buffer is linear, not circular: once full, further
//! bytes are dropped and the earliest `N - 1` bytes are retained. The last
//! slot is reserved so the stored region can always be handed out as a
//! terminated string.

/// Default buffer size, matching the module's longest routine reply
pub const DEFAULT_RESPONSE_LEN: usize = 64;

/// Fixed-capacity receive accumulator
#[derive(Debug, Clone)]
pub struct ResponseBuffer<const N: usize = DEFAULT_RESPONSE_LEN> {
    data: [u8; N],
    len: usize,
    overflowed: bool,
}

impl<const N: usize> Default for ResponseBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ResponseBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            len: 0,
            overflowed: false,
        }
    }

    /// Number of bytes that can be stored
    pub const fn capacity(&self) -> usize {
        N.saturating_sub(1)
    }

    /// Number of bytes currently stored
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is stored
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when further appends will be dropped
    pub const fn is_full(&self) -> bool {
        self.len >= self.capacity()
    }

    /// True if at least one byte was dropped since the last clear
    ///
    /// Diagnostic only; matching and timeouts behave the same either way.
    pub const fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Zero the storage and reset length and overflow flag
    pub fn clear(&mut self) {
        self.data = [0; N];
        self.len = 0;
        self.overflowed = false;
    }

    /// Store one byte
    ///
    /// Returns `false` (and sets the overflow flag) if the buffer is full.
    pub fn append(&mut self, byte: u8) -> bool {
        if self.is_full() {
            self.overflowed = true;
            return false;
        }
        self.data[self.len] = byte;
        self.len += 1;
        true
    }

    /// Stored bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Stored bytes as text, if they are valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    /// Offset of the first occurrence of `needle` in the stored region
    ///
    /// An empty needle matches at offset 0. Embedded NUL bytes are searched
    /// like any other byte.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        find(self.as_bytes(), needle)
    }

    /// True if `needle` occurs in the stored region
    pub fn contains(&self, needle: &[u8]) -> bool {
        self.find(needle).is_some()
    }
}

/// Plain substring scan
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filled<const N: usize>(bytes: &[u8]) -> ResponseBuffer<N> {
        let mut buf = ResponseBuffer::<N>::new();
        for &b in bytes {
            buf.append(b);
        }
        buf
    }

    #[test]
    fn test_append_and_find() {
        let buf: ResponseBuffer<64> = filled(b"\r\nOK\r\n");
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.find(b"OK"), Some(2));
        assert_eq!(buf.find(b"ERROR"), None);
        assert_eq!(buf.as_str(), Some("\r\nOK\r\n"));
        assert!(!buf.overflowed());
    }

    #[test]
    fn test_empty_needle_matches_at_start() {
        let buf: ResponseBuffer<8> = ResponseBuffer::new();
        assert_eq!(buf.find(b""), Some(0));
    }

    #[test]
    fn test_overflow_keeps_prefix() {
        let mut buf: ResponseBuffer<8> = filled(b"abcdefg");
        assert!(buf.is_full());
        assert!(!buf.append(b'h'));
        assert!(buf.overflowed());
        assert_eq!(buf.as_bytes(), b"abcdefg");
        // The tail never made it in
        assert_eq!(buf.find(b"h"), None);
    }

    #[test]
    fn test_find_searches_full_buffer() {
        let buf: ResponseBuffer<8> = filled(b"xxxxxOK");
        assert!(buf.is_full());
        assert_eq!(buf.find(b"OK"), Some(5));
    }

    #[test]
    fn test_find_past_nul() {
        let buf: ResponseBuffer<16> = filled(b"\0\0OK");
        assert_eq!(buf.find(b"OK"), Some(2));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut buf: ResponseBuffer<4> = filled(b"OKOK");
        assert!(buf.overflowed());
        buf.clear();
        assert!(buf.is_empty());
        assert!(!buf.overflowed());
        assert_eq!(buf.find(b"OK"), None);
    }

    #[test]
    fn test_zero_sized_buffer() {
        let mut buf: ResponseBuffer<0> = ResponseBuffer::new();
        assert_eq!(buf.capacity(), 0);
        assert!(!buf.append(b'a'));
        assert!(buf.overflowed());
    }

    proptest! {
        #[test]
        fn prop_length_never_exceeds_capacity(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
            let buf: ResponseBuffer<64> = filled(&bytes);
            prop_assert!(buf.len() <= 63);
            prop_assert_eq!(buf.overflowed(), bytes.len() > 63);
        }

        #[test]
        fn prop_prefix_is_retained(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
            let buf: ResponseBuffer<64> = filled(&bytes);
            let kept = bytes.len().min(63);
            prop_assert_eq!(buf.as_bytes(), &bytes[..kept]);
        }

        #[test]
        fn prop_clear_is_idempotent(bytes in proptest::collection::vec(any::<u8>(), 0..100)) {
            let mut once: ResponseBuffer<32> = filled(&bytes);
            once.clear();
            let mut twice: ResponseBuffer<32> = filled(&bytes);
            twice.clear();
            twice.clear();
            prop_assert_eq!(once.as_bytes(), twice.as_bytes());
            prop_assert_eq!(once.overflowed(), twice.overflowed());
            prop_assert!(twice.is_empty());
        }

        #[test]
        fn prop_find_agrees_with_naive_scan(
            bytes in proptest::collection::vec(0u8..4, 0..40),
            needle in proptest::collection::vec(0u8..4, 1..4),
        ) {
            let buf: ResponseBuffer<64> = filled(&bytes);
            let naive = (0..bytes.len())
                .find(|&i| bytes[i..].starts_with(&needle));
            prop_assert_eq!(buf.find(&needle), naive);
        }
    }
}
