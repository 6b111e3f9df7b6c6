//! The program image the ISR serves reads from (C3's memory model).
//!
//! There is no general-purpose RAM on the fast path: only a read-only
//! program image, an optional fast cache mirroring its head, and the
//! lazily-captured base address every offset is computed relative to.

use crate::error::ConfigError;
use crate::tuning::{CACHE_SIZES, MAX_CACHE};

/// The read-only program image and its optional fast-storage cache.
pub struct ProgramImage {
    bytes: [u8; MAX_CACHE],
    length: u16,
    cache: [u8; MAX_CACHE],
    cache_len: u16,
    cache_capacity: u16,
    cache_active: bool,
    base_addr: u16,
    base_valid: bool,
    loaded: bool,
}

impl ProgramImage {
    /// Construct an empty, unloaded image with the default 256-byte cache capacity.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; MAX_CACHE],
            length: 0,
            cache: [0; MAX_CACHE],
            cache_len: 0,
            cache_capacity: 256,
            cache_active: false,
            base_addr: 0,
            base_valid: false,
            loaded: false,
        }
    }

    /// `set_cache_size(bytes)`: accepted sizes are `{128, 256, 512, 1024}`.
    /// Does not itself touch the cache contents or `cache_active`; a
    /// subsequent `load_program_to_cache` rebuilds the cache at the new size.
    pub fn set_cache_size(&mut self, bytes: u16) -> Result<(), ConfigError> {
        if !CACHE_SIZES.contains(&bytes) {
            return Err(ConfigError::InvalidCacheSize { requested_bytes: bytes });
        }
        self.cache_capacity = bytes;
        Ok(())
    }

    /// `set_program(bytes, length)`: load the program image with the cache
    /// left inactive. Must be called with interrupts masked by the caller.
    pub fn set_program(&mut self, bytes: &[u8], length: u16) -> Result<(), ConfigError> {
        if bytes.is_empty() || length == 0 {
            return Err(ConfigError::EmptyProgram);
        }
        self.cache_active = false;
        let n = (length as usize).min(bytes.len()).min(MAX_CACHE);
        self.bytes[..n].copy_from_slice(&bytes[..n]);
        self.length = n as u16;
        self.loaded = true;
        Ok(())
    }

    /// `load_program_to_cache(bytes, length)`: load the program image and, if
    /// it fits within `cache_capacity`, activate the cache; otherwise fall
    /// back to serving from the slower `bytes` path only.
    ///
    /// Update order on success matches the invariant in the data model:
    /// deactivate, rewrite cache, set length, activate — so the ISR never
    /// observes a partially-written cache. The caller masks interrupts for
    /// the duration of this call.
    pub fn load_program_to_cache(&mut self, bytes: &[u8], length: u16) -> Result<(), ConfigError> {
        self.set_program(bytes, length)?;
        self.cache_active = false;
        if self.length <= self.cache_capacity {
            let n = self.length as usize;
            self.cache[..n].copy_from_slice(&self.bytes[..n]);
            self.cache_len = self.length;
            self.cache_active = true;
        }
        Ok(())
    }

    /// Whether the ISR may serve bytes from this image at all.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The configured cache capacity, in bytes.
    #[must_use]
    pub const fn cache_capacity(&self) -> u16 {
        self.cache_capacity
    }

    /// Whether the cache is currently active.
    #[must_use]
    pub const fn cache_active(&self) -> bool {
        self.cache_active
    }

    /// Program length in bytes.
    #[must_use]
    pub const fn length(&self) -> u16 {
        self.length
    }

    /// The captured base address, if any fetch has occurred since the last reset.
    #[must_use]
    pub const fn base_addr(&self) -> Option<u16> {
        if self.base_valid { Some(self.base_addr) } else { None }
    }

    /// Reset the base-address capture (called by `reset_isr_state`).
    pub fn invalidate_base(&mut self) {
        self.base_valid = false;
        self.base_addr = 0;
    }

    /// Serve one byte for a read at `address`, capturing the base address on
    /// the first call since the last [`invalidate_base`](Self::invalidate_base).
    ///
    /// This is the hot-path read used directly by the ISR: no panics, no
    /// allocation, and a `0x00` filler whenever the program isn't loaded or
    /// the offset runs past the end of the image (a fetch past `HALT` is not
    /// an error).
    pub fn serve_read(&mut self, address: u16) -> u8 {
        if !self.loaded {
            return 0x00;
        }
        if !self.base_valid {
            self.base_addr = address;
            self.base_valid = true;
        }
        let offset = address.wrapping_sub(self.base_addr);
        if self.cache_active && offset < self.cache_len {
            self.cache[offset as usize]
        } else if offset < self.length {
            self.bytes[offset as usize]
        } else {
            0x00
        }
    }
}

impl Default for ProgramImage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_serves_loaded_bytes_relative_to_base() {
        let mut img = ProgramImage::new();
        img.load_program_to_cache(&[0x11, 0x22, 0x33], 3).unwrap();
        assert!(img.cache_active());
        // First fetch at a non-zero bus address establishes the base.
        assert_eq!(img.serve_read(0x4000), 0x11);
        assert_eq!(img.base_addr(), Some(0x4000));
        assert_eq!(img.serve_read(0x4001), 0x22);
        assert_eq!(img.serve_read(0x4002), 0x33);
        // Past the end of the program: harmless filler, not an error.
        assert_eq!(img.serve_read(0x4003), 0x00);
    }

    #[test]
    fn oversized_program_falls_back_to_slow_path() {
        let mut img = ProgramImage::new();
        img.set_cache_size(128).unwrap();
        let data = [0xAAu8; 200];
        img.load_program_to_cache(&data, 200).unwrap();
        assert!(!img.cache_active());
        assert_eq!(img.serve_read(0x0000), 0xAA);
    }

    #[test]
    fn unloaded_image_serves_filler() {
        let mut img = ProgramImage::new();
        assert_eq!(img.serve_read(0x1234), 0x00);
        assert!(img.base_addr().is_none());
    }

    #[test]
    fn invalid_cache_size_rejected_without_side_effects() {
        let mut img = ProgramImage::new();
        let before = img.cache_capacity();
        assert_eq!(
            img.set_cache_size(300),
            Err(ConfigError::InvalidCacheSize { requested_bytes: 300 })
        );
        assert_eq!(img.cache_capacity(), before);
    }

    #[test]
    fn reset_isr_state_forgets_base_address() {
        let mut img = ProgramImage::new();
        img.set_program(&[0x76], 1).unwrap();
        img.serve_read(0x5000);
        assert_eq!(img.base_addr(), Some(0x5000));
        img.invalidate_base();
        assert!(img.base_addr().is_none());
        img.serve_read(0x6000);
        assert_eq!(img.base_addr(), Some(0x6000));
    }
}
