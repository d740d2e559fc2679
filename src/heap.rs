// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Heap usage snapshots for the profiler.
//!
//! Memory figures are live-heap deltas, not allocation totals. The `duel`
//! binary installs [`TrackingAllocator`] as its global allocator; in any
//! process that does not, [`AllocatorProbe`] reads zero and every delta is zero.
use std::alloc::GlobalAlloc;
use std::alloc::Layout;
use std::alloc::System;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);

/// Source of heap-usage snapshots.
pub trait HeapProbe: Send + Sync {
  /// Bytes currently in use on the heap.
  fn heap_used(&self) -> u64;
}

/// System allocator wrapper that keeps a count of live bytes.
pub struct TrackingAllocator;

// SAFETY: every call is forwarded unchanged to the system allocator; the
// counter is only updated after a successful allocation.
unsafe impl GlobalAlloc for TrackingAllocator {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    let ptr = unsafe { System.alloc(layout) };
    if !ptr.is_null() {
      LIVE_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
    }
    ptr
  }

  unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
    let ptr = unsafe { System.alloc_zeroed(layout) };
    if !ptr.is_null() {
      LIVE_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
    }
    ptr
  }

  unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
    unsafe { System.dealloc(ptr, layout) };
    LIVE_BYTES.fetch_sub(layout.size() as u64, Ordering::Relaxed);
  }

  unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
    let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
    if !new_ptr.is_null() {
      LIVE_BYTES.fetch_add(new_size as u64, Ordering::Relaxed);
      LIVE_BYTES.fetch_sub(layout.size() as u64, Ordering::Relaxed);
    }
    new_ptr
  }
}

/// Live bytes recorded by [`TrackingAllocator`].
pub fn live_bytes() -> u64 {
  LIVE_BYTES.load(Ordering::Relaxed)
}

/// Reads the [`TrackingAllocator`] counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatorProbe;

impl HeapProbe for AllocatorProbe {
  fn heap_used(&self) -> u64 {
    live_bytes()
  }
}
