// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::{collections::HashMap, sync::Arc};

use rand::Rng;

use crate::region::RegionInfo;

struct RegionEntry {
    region: Arc<RegionInfo>,
    /// Position of this region's id in `ids`, kept current across
    /// swap-removes.
    pos: usize,
}

/// Region snapshots keyed by id, with a parallel id vector so one region can
/// be drawn uniformly in O(1), and running totals of approximate size/keys.
#[derive(Default)]
pub struct RegionMap {
    entries: HashMap<u64, RegionEntry>,
    ids: Vec<u64>,
    total_size: i64,
    total_keys: i64,
}

impl RegionMap {
    pub fn new() -> RegionMap {
        RegionMap::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Arc<RegionInfo>> {
        self.entries.get(&id).map(|e| &e.region)
    }

    /// Inserts or replaces the snapshot for `region.id`. Replacement leaves
    /// the id vector untouched and adjusts the totals by the delta.
    pub fn put(&mut self, region: Arc<RegionInfo>) {
        let id = region.id;
        if let Some(entry) = self.entries.get_mut(&id) {
            self.total_size += region.approximate_size - entry.region.approximate_size;
            self.total_keys += region.approximate_keys - entry.region.approximate_keys;
            entry.region = region;
            return;
        }
        self.total_size += region.approximate_size;
        self.total_keys += region.approximate_keys;
        self.entries.insert(
            id,
            RegionEntry {
                region,
                pos: self.ids.len(),
            },
        );
        self.ids.push(id);
    }

    /// Removes `id` if present. The id vector shrinks by a swap-remove; the
    /// id moved into the vacated slot gets its recorded position updated.
    pub fn delete(&mut self, id: u64) {
        if let Some(entry) = self.entries.remove(&id) {
            self.ids.swap_remove(entry.pos);
            if let Some(&moved) = self.ids.get(entry.pos) {
                self.entries.get_mut(&moved).unwrap().pos = entry.pos;
            }
            self.total_size -= entry.region.approximate_size;
            self.total_keys -= entry.region.approximate_keys;
        }
    }

    /// Uniformly draws one resident region. O(1).
    pub fn random_region(&self) -> Option<&Arc<RegionInfo>> {
        if self.ids.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..self.ids.len());
        self.get(self.ids[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RegionInfo>> {
        self.entries.values().map(|e| &e.region)
    }

    pub fn total_size(&self) -> i64 {
        self.total_size
    }

    pub fn total_keys(&self) -> i64 {
        self.total_keys
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::metapb;

    fn new_region(id: u64, size: i64, keys: i64) -> Arc<RegionInfo> {
        let mut info = RegionInfo::new(
            metapb::Region {
                id,
                ..Default::default()
            },
            None,
        );
        info.approximate_size = size;
        info.approximate_keys = keys;
        Arc::new(info)
    }

    fn check_positions(map: &RegionMap) {
        assert_eq!(map.ids.len(), map.entries.len());
        for (i, id) in map.ids.iter().enumerate() {
            assert_eq!(map.entries[id].pos, i);
        }
    }

    #[test]
    fn test_put_get_delete() {
        let mut map = RegionMap::new();
        assert_eq!(map.len(), 0);
        assert!(map.get(1).is_none());
        assert!(map.random_region().is_none());

        map.put(new_region(1, 10, 100));
        map.put(new_region(2, 20, 200));
        map.put(new_region(3, 30, 300));
        assert_eq!(map.len(), 3);
        assert_eq!(map.total_size(), 60);
        assert_eq!(map.total_keys(), 600);
        check_positions(&map);

        // Replacing a resident id adjusts totals by the delta and keeps the
        // id vector stable.
        map.put(new_region(2, 25, 250));
        assert_eq!(map.len(), 3);
        assert_eq!(map.total_size(), 65);
        assert_eq!(map.total_keys(), 650);
        check_positions(&map);

        map.delete(1);
        assert_eq!(map.len(), 2);
        assert_eq!(map.total_size(), 55);
        assert!(map.get(1).is_none());
        check_positions(&map);

        // Deleting an absent id is a no-op.
        map.delete(1);
        assert_eq!(map.len(), 2);
        assert_eq!(map.total_size(), 55);

        map.delete(3);
        map.delete(2);
        assert_eq!(map.len(), 0);
        assert_eq!(map.total_size(), 0);
        assert_eq!(map.total_keys(), 0);
        check_positions(&map);
    }

    #[test]
    fn test_delete_last_position() {
        let mut map = RegionMap::new();
        for id in 1..=4 {
            map.put(new_region(id, 1, 1));
        }
        // Removing the id currently occupying the last vector slot must not
        // disturb any other position.
        map.delete(4);
        check_positions(&map);
        map.delete(1);
        check_positions(&map);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_random_uniform_after_swap_remove() {
        let mut map = RegionMap::new();
        for id in 1..=100 {
            map.put(new_region(id, 1, 1));
        }
        for id in (1..=100).step_by(2) {
            map.delete(id);
        }
        assert_eq!(map.len(), 50);
        check_positions(&map);

        let draws = 50_000;
        let mut counts: HashMap<u64, u64> = HashMap::new();
        for _ in 0..draws {
            let region = map.random_region().unwrap();
            *counts.entry(region.id).or_default() += 1;
        }

        // Every remaining id must be drawn close to uniformly: the per-id
        // count is binomial with mean 1000 and sigma ~31.3, so a 6-sigma
        // window is [812, 1188].
        assert_eq!(counts.len(), 50);
        for (id, count) in counts {
            assert_eq!(id % 2, 0);
            assert!(
                (812..=1188).contains(&count),
                "id {} drawn {} times",
                id,
                count
            );
        }
    }
}
