//! Decrypted text must not survive in freed heap blocks.
//!
//! This binary installs an allocator that, while armed, scans every block
//! being freed or moved for the in-memory form of a marker character.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use memvault_integration_tests::fallback_storage;
use memvault_secrets::{SecureChar, SecureString, TextEncoding};

const MARKER: char = '🔑';

static ARMED: AtomicBool = AtomicBool::new(false);
static LEAKS: AtomicUsize = AtomicUsize::new(0);
static SERIAL: Mutex<()> = Mutex::new(());

struct ScanningAllocator;

impl ScanningAllocator {
    unsafe fn scan(ptr: *mut u8, size: usize) {
        if !ARMED.load(Ordering::Relaxed) {
            return;
        }
        let needle = (MARKER as u32).to_ne_bytes();
        let block = std::slice::from_raw_parts(ptr, size);
        if block.windows(needle.len()).any(|w| w == needle) {
            LEAKS.fetch_add(1, Ordering::Relaxed);
        }
    }
}

unsafe impl GlobalAlloc for ScanningAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        Self::scan(ptr, layout.size());
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        Self::scan(ptr, layout.size());
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOCATOR: ScanningAllocator = ScanningAllocator;

/// Run `f` with scanning enabled and return how many freed blocks held the marker.
fn leaked_blocks(f: impl FnOnce()) -> usize {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    LEAKS.store(0, Ordering::SeqCst);
    ARMED.store(true, Ordering::SeqCst);
    f();
    ARMED.store(false, Ordering::SeqCst);
    LEAKS.load(Ordering::SeqCst)
}

fn marker_text() -> String {
    let mut text = String::from(MARKER);
    text.push_str(&"a".repeat(100));
    text
}

#[test]
fn test_string_queries_leave_no_plaintext_chars() {
    let text = marker_text();
    for encoding in [TextEncoding::Utf8, TextEncoding::Utf16Le, TextEncoding::Utf16Be] {
        let storage = fallback_storage();
        let mut secure = SecureString::with_storage(storage, encoding, b"").unwrap();
        secure.set_str(&text).unwrap();

        let leaks = leaked_blocks(|| {
            let chars = secure.to_chars().unwrap();
            assert_eq!(chars.len(), 101);
            drop(chars);

            let parts = secure.split(&['x']).unwrap();
            assert_eq!(parts.len(), 1);
            drop(parts);

            let tail = secure.substring(1, None).unwrap();
            assert_eq!(tail.len(), 100);
            drop(tail);

            assert_eq!(secure.index_of_char('a').unwrap(), Some(1));
            assert_eq!(secure.index_of_str("🔑a").unwrap(), Some(0));
            assert_eq!(secure.expose().unwrap().as_str(), text);
        });
        assert_eq!(leaks, 0, "{encoding}: freed buffers held decrypted characters");
    }
}

#[test]
fn test_char_read_leaves_no_plaintext_chars() {
    let storage = fallback_storage();
    let mut c = SecureChar::with_storage(storage, TextEncoding::Utf16Le, b"").unwrap();
    c.set(MARKER).unwrap();

    let leaks = leaked_blocks(|| {
        assert_eq!(c.get().unwrap(), MARKER);
    });
    assert_eq!(leaks, 0);
}
