//! Typed, atomically-accessed view over the helper's shared-memory region
//! (§3 Shared-memory layout, §9 "unsafe pointer arithmetic... becomes a
//! typed view").
//!
//! The region is created and written by the helper process; the daemon only
//! maps and reads it (plus resetting `ready_flag` after consuming it). The
//! `unsafe` needed to bridge raw mapped bytes into atomics is confined to
//! this module.

use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};

use memmap2::MmapMut;

const READY_FLAG_OFFSET: usize = 0;
const CONTENT_LENGTH_OFFSET: usize = 4;
const MIN_REGION_LEN: usize = CONTENT_LENGTH_OFFSET + 8;

/// Maps the fixed-layout region the helper advertises in its startup banner
/// (`Path: <absolute path>`). Mapping failures are non-fatal to the channel:
/// callers keep the channel's `shmem` field `None` and tolerate its absence.
pub struct SharedMemoryView {
    mmap: MmapMut,
}

impl SharedMemoryView {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().read(true).write(true).open(path)?;
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        if mmap.len() < MIN_REGION_LEN {
            // Grow the local view conceptually is not possible once mapped;
            // treat an undersized region as unusable.
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "shared memory region at {} is {} bytes, need at least {}",
                    path.display(),
                    mmap.len(),
                    MIN_REGION_LEN
                ),
            ));
        }
        // Zero stray bytes would be incorrect here: the helper owns the
        // contents. Touch the slice once to ensure the mapping is live.
        let _ = &mut mmap[..];
        Ok(Self { mmap })
    }

    fn ready_flag_atomic(&self) -> &AtomicI32 {
        // SAFETY: `READY_FLAG_OFFSET` is 0, trivially aligned to 4 bytes
        // because the mapping itself is page-aligned. The region outlives
        // this reference for the lifetime of `self`.
        unsafe { &*(self.mmap.as_ptr().add(READY_FLAG_OFFSET) as *const AtomicI32) }
    }

    /// Non-zero once the helper has published a valid `content_length`.
    pub fn ready_flag(&self) -> i32 {
        self.ready_flag_atomic().load(Ordering::Acquire)
    }

    /// Resets `ready_flag` to zero after the handler has consumed
    /// `content_length`.
    pub fn reset_ready_flag(&self) {
        self.ready_flag_atomic().store(0, Ordering::Release);
    }

    /// The alternative layout (§3): offset 0 read as a percent-complete
    /// counter instead of a ready flag. Same physical cell, different
    /// semantic use by the progress poll loop (§4.5 step 5).
    pub fn progress(&self) -> i32 {
        self.ready_flag_atomic().load(Ordering::Acquire)
    }

    /// `content_length`, an 8-byte value at an offset (4) that is not
    /// 8-byte aligned relative to the mapping base, so it cannot be read
    /// through `AtomicI64`. A raw unaligned read paired with an acquire
    /// fence gives the same "see the helper's write before anything after
    /// this call" guarantee without relying on unaligned atomics.
    pub fn content_length(&self) -> i64 {
        let ptr = unsafe { self.mmap.as_ptr().add(CONTENT_LENGTH_OFFSET) as *const i64 };
        // SAFETY: offset + 8 <= mmap.len() was checked in `open`.
        let value = unsafe { ptr.read_unaligned() };
        std::sync::atomic::fence(Ordering::Acquire);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn region_file(len: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; len]).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn ready_flag_round_trips() {
        let file = region_file(64);
        let view = SharedMemoryView::open(file.path()).unwrap();
        assert_eq!(view.ready_flag(), 0);
        view.ready_flag_atomic().store(1, Ordering::Release);
        assert_eq!(view.ready_flag(), 1);
        view.reset_ready_flag();
        assert_eq!(view.ready_flag(), 0);
    }

    #[test]
    fn content_length_reads_unaligned_i64() {
        let file = region_file(64);
        let view = SharedMemoryView::open(file.path()).unwrap();
        assert_eq!(view.content_length(), 0);
    }

    #[test]
    fn undersized_region_is_rejected() {
        let file = region_file(4);
        assert!(SharedMemoryView::open(file.path()).is_err());
    }
}
