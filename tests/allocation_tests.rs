//! Allocation failure during the merge, driven by a capped global allocator.
//!
//! Kept in its own test binary so the allocator does not affect other tests.

use hevc_bitstream::tree::merge::{MergeContext, merge_tree};
use hevc_bitstream::tree::workers::produce_units;
use hevc_bitstream::{
    BitBuffer, BitstreamError, BitstreamWriter, EncoderConfig, EntropyTerminator, Frame,
    PictureState, UnitEncoder, UnitInfo,
};
use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Refuses any single allocation larger than `LIMIT` bytes.
struct Capped;

static LIMIT: AtomicUsize = AtomicUsize::new(usize::MAX);

unsafe impl GlobalAlloc for Capped {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.size() > LIMIT.load(Ordering::SeqCst) {
            return ptr::null_mut();
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: Capped = Capped;

const UNIT_BYTES: usize = 4 << 20;

struct RawBins;

impl EntropyTerminator for RawBins {
    fn encode_bin_trm(&mut self, stream: &mut BitBuffer, bin: bool) {
        stream.write_flag(bin);
    }

    fn flush(&mut self, stream: &mut BitBuffer) {
        stream.align_zero();
    }
}

/// Fills its unit with a few megabytes.
struct LargeUnits;

impl UnitEncoder for LargeUnits {
    type Coder = RawBins;

    fn encode_unit(&self, _unit: &UnitInfo, stream: &mut BitBuffer) -> hevc_bitstream::Result<RawBins> {
        stream.write_bytes(&vec![0x5A; UNIT_BYTES]);
        Ok(RawBins)
    }
}

#[test]
fn test_merge_reports_out_of_memory() {
    let config = EncoderConfig::new(64, 64);
    let picture = PictureState::idr(0, 32);
    let frame = Frame::for_config(&config);
    let writer = BitstreamWriter::new(config.clone()).unwrap();

    let mut tree = writer.plan().unwrap();
    produce_units(&mut tree, &LargeUnits).unwrap();
    let unit = tree.units()[0];
    assert!(tree.node(unit).stream.tell_bits() > UNIT_BYTES * 8);

    let ctx = MergeContext { config: &config, picture: &picture, frame: &frame };
    LIMIT.store(1 << 20, Ordering::SeqCst);
    let result = merge_tree(&mut tree, &ctx);
    LIMIT.store(usize::MAX, Ordering::SeqCst);

    assert!(matches!(result, Err(BitstreamError::OutOfMemory(_))));
    println!("Merge of a {} byte unit failed cleanly", UNIT_BYTES);
}
