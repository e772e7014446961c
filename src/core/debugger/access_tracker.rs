// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Guest memory ranges touched by a draw call

use crate::core::memory::GuestMemory;
use std::collections::BTreeMap;

/// Coalescing set of physical memory ranges
///
/// Overlapping and touching ranges are merged on insertion so the recorder
/// receives each byte at most once per draw.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryAccessTracker {
    /// start -> size
    ranges: BTreeMap<u32, u32>,
}

impl MemoryAccessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `size` bytes starting at `paddr` were read
    pub fn add_access(&mut self, paddr: u32, size: u32) {
        if size == 0 {
            return;
        }
        let entry = self.ranges.entry(paddr).or_insert(0);
        *entry = (*entry).max(size);
        self.simplify();
    }

    fn simplify(&mut self) {
        let mut merged: BTreeMap<u32, u32> = BTreeMap::new();
        let mut current: Option<(u32, u64)> = None;

        for (&start, &size) in &self.ranges {
            let end = start as u64 + size as u64;
            current = match current {
                // The +1 also folds ranges that merely touch
                Some((cur_start, cur_end)) if cur_end + 1 >= start as u64 => {
                    Some((cur_start, cur_end.max(end)))
                }
                Some((cur_start, cur_end)) => {
                    merged.insert(cur_start, (cur_end - cur_start as u64) as u32);
                    Some((start, end))
                }
                None => Some((start, end)),
            };
        }
        if let Some((start, end)) = current {
            merged.insert(start, (end - start as u64) as u32);
        }
        self.ranges = merged;
    }

    /// Merged ranges as `(start, size)` in address order
    pub fn ranges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.ranges.iter().map(|(&start, &size)| (start, size))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Hand every range's bytes to `sink`
    ///
    /// Ranges that are not fully backed by guest memory are skipped.
    pub fn for_each_range<F>(&self, memory: &dyn GuestMemory, mut sink: F)
    where
        F: FnMut(&[u8], u32),
    {
        for (start, size) in self.ranges() {
            match memory.physical_slice(start, size as usize) {
                Some(data) => sink(data, start),
                None => log::warn!(
                    "Skipping unbacked traced range 0x{:08X}+0x{:X}",
                    start,
                    size
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::{PhysicalMemory, FCRAM_PADDR};
    use proptest::prelude::*;

    #[test]
    fn test_disjoint_ranges_stay_separate() {
        let mut tracker = MemoryAccessTracker::new();
        tracker.add_access(0x100, 0x10);
        tracker.add_access(0x200, 0x10);
        assert_eq!(tracker.ranges().collect::<Vec<_>>(), [(0x100, 0x10), (0x200, 0x10)]);
    }

    #[test]
    fn test_overlapping_and_touching_ranges_merge() {
        let mut tracker = MemoryAccessTracker::new();
        tracker.add_access(0x100, 0x10);
        tracker.add_access(0x108, 0x10);
        tracker.add_access(0x118, 0x8);
        assert_eq!(tracker.ranges().collect::<Vec<_>>(), [(0x100, 0x20)]);
    }

    #[test]
    fn test_same_start_keeps_largest() {
        let mut tracker = MemoryAccessTracker::new();
        tracker.add_access(0x40, 0x20);
        tracker.add_access(0x40, 0x4);
        assert_eq!(tracker.ranges().collect::<Vec<_>>(), [(0x40, 0x20)]);
    }

    #[test]
    fn test_for_each_range_reads_memory() {
        let mut memory = PhysicalMemory::with_fcram_size(0x1000);
        assert!(memory.write_block(FCRAM_PADDR, &[1, 2, 3, 4]));

        let mut tracker = MemoryAccessTracker::new();
        tracker.add_access(FCRAM_PADDR, 4);
        tracker.add_access(0x0000_1000, 4); // unbacked

        let mut seen = Vec::new();
        tracker.for_each_range(&memory, |data, addr| seen.push((addr, data.to_vec())));
        assert_eq!(seen, vec![(FCRAM_PADDR, vec![1, 2, 3, 4])]);
    }

    proptest! {
        #[test]
        fn prop_ranges_never_touch(
            accesses in prop::collection::vec((0u32..0x1000, 1u32..0x40), 1..32)
        ) {
            let mut tracker = MemoryAccessTracker::new();
            for (start, size) in &accesses {
                tracker.add_access(*start, *size);
            }
            let ranges: Vec<_> = tracker.ranges().collect();
            for pair in ranges.windows(2) {
                prop_assert!(pair[0].0 + pair[0].1 + 1 < pair[1].0);
            }
            // Every access is covered
            for (start, size) in accesses {
                prop_assert!(ranges.iter().any(|&(s, n)| s <= start && start + size <= s + n));
            }
        }
    }
}
