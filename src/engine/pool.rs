use crate::engine::motion::{BoundaryOutcome, BoundaryPolicy, Entity, World};
use crate::engine::Vec2;

/// Reset-on-release policy of a pooled item
pub trait Poolable {
    fn reset(&mut self);
}

/// Handle to a pool slot. The generation makes a handle go stale once its
/// slot is released, so it can't release whoever acquires the slot next.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: usize,
    generation: u32,
}

impl SlotId {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug)]
struct Slot<T> {
    item: T,
    active: bool,
    generation: u32,
}

/// Fixed-capacity recycling pool.
///
/// ┌──────────── Slot lifecycle ────────────┐
/// │  inactive ──acquire()──► active        │
/// │  active   ──release()──► inactive      │
/// │  full     ──acquire()──► None (dropped)│
/// └────────────────────────────────────────┘
///
/// Never grows: `active_count() <= capacity()` always holds.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    active: usize,
    dropped: u64,
}

impl<T: Poolable> Pool<T> {
    pub fn new(capacity: usize, mut factory: impl FnMut(usize) -> T) -> Self {
        let slots = (0..capacity)
            .map(|index| Slot {
                item: factory(index),
                active: false,
                generation: 0,
            })
            .collect();
        Pool {
            slots,
            active: 0,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn is_exhausted(&self) -> bool {
        self.active == self.slots.len()
    }

    /// Acquisitions refused because every slot was active
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// First inactive slot, marked active. `None` when exhausted.
    pub fn acquire(&mut self) -> Option<(SlotId, &mut T)> {
        let Some(index) = self.slots.iter().position(|slot| !slot.active) else {
            self.dropped += 1;
            return None;
        };
        let slot = &mut self.slots[index];
        slot.active = true;
        slot.generation = slot.generation.wrapping_add(1);
        self.active += 1;
        Some((
            SlotId {
                index,
                generation: slot.generation,
            },
            &mut slot.item,
        ))
    }

    /// Returns false (and does nothing) for inactive slots and stale ids
    pub fn release(&mut self, id: SlotId) -> bool {
        match self.slots.get_mut(id.index) {
            Some(slot) if slot.active && slot.generation == id.generation => {
                slot.active = false;
                slot.item.reset();
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self, id: SlotId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slot(id).map(|slot| &slot.item)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.active && slot.generation == id.generation)
            .map(|slot| &mut slot.item)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| {
                (
                    SlotId {
                        index,
                        generation: slot.generation,
                    },
                    &slot.item,
                )
            })
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (SlotId, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| {
                (
                    SlotId {
                        index,
                        generation: slot.generation,
                    },
                    &mut slot.item,
                )
            })
    }

    /// Releases every active item matching `predicate`, returns their ids
    pub fn release_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Vec<SlotId> {
        let doomed: Vec<SlotId> = self
            .iter_active()
            .filter(|(_, item)| predicate(*item))
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            self.release(*id);
        }
        doomed
    }

    fn slot(&self, id: SlotId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.active && slot.generation == id.generation)
    }
}

impl Pool<Entity> {
    /// Acquire, then place and launch
    pub fn spawn(&mut self, position: Vec2, velocity: Vec2) -> Option<SlotId> {
        let (id, entity) = self.acquire()?;
        entity.body.position = position;
        entity.body.velocity = velocity;
        entity.visible = true;
        Some(id)
    }

    /// Integrates every active entity by `dt` seconds
    pub fn integrate(&mut self, dt: f64) {
        for (_, entity) in self.iter_active_mut() {
            entity.body.integrate(dt);
        }
    }

    /// Per-frame recycling scan, O(capacity)
    pub fn recycle_outside(&mut self, world: &World, margin: f64) -> Vec<SlotId> {
        let policy = BoundaryPolicy::Recycle { margin };
        self.release_where(|entity| {
            let mut body = entity.body;
            policy.apply(&mut body, world) == BoundaryOutcome::OutOfBounds
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::motion::PARKED;
    use crate::engine::Size;
    use approx::assert_relative_eq;

    fn entity_pool(capacity: usize) -> Pool<Entity> {
        Pool::new(capacity, |_| Entity::parked(Size::new(8.0, 8.0)))
    }

    #[test]
    fn exhaustion_drops_requests_silently() {
        let mut pool = entity_pool(5);
        let spawned = (0..10)
            .filter_map(|i| pool.spawn(Vec2::new(i as f64, 0.0), Vec2::new(100.0, 0.0)))
            .count();

        assert_eq!(spawned, 5);
        assert_eq!(pool.active_count(), 5);
        assert_eq!(pool.dropped_count(), 5);
        assert!(pool.is_exhausted());
        assert!(pool.active_count() <= pool.capacity());
    }

    #[test]
    fn double_release_is_a_no_op() {
        let mut pool = entity_pool(3);
        let first = pool.spawn(Vec2::ZERO, Vec2::ZERO).unwrap();
        pool.spawn(Vec2::ZERO, Vec2::ZERO).unwrap();

        assert!(pool.release(first));
        assert!(!pool.release(first));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn releasing_everything_twice_never_underflows() {
        let mut pool = entity_pool(2);
        let ids: Vec<_> = (0..2)
            .filter_map(|_| pool.spawn(Vec2::ZERO, Vec2::ZERO))
            .collect();
        for id in ids.iter().chain(ids.iter()) {
            pool.release(*id);
        }
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn stale_id_cannot_release_reused_slot() {
        let mut pool = entity_pool(1);
        let old = pool.spawn(Vec2::ZERO, Vec2::ZERO).unwrap();
        pool.release(old);
        let new = pool.spawn(Vec2::new(1.0, 1.0), Vec2::ZERO).unwrap();

        assert_eq!(old.index(), new.index());
        assert!(!pool.release(old));
        assert!(pool.is_active(new));
        assert_eq!(pool.get(new).unwrap().position(), Vec2::new(1.0, 1.0));
        assert!(pool.get(old).is_none());
    }

    #[test]
    fn release_resets_entity() {
        let mut pool = entity_pool(1);
        let id = pool.spawn(Vec2::new(50.0, 60.0), Vec2::new(3.0, 4.0)).unwrap();
        assert!(pool.get(id).unwrap().visible);

        pool.release(id);
        let (_, entity) = pool.acquire().unwrap();
        assert_eq!(entity.body.velocity, Vec2::ZERO);
        assert_eq!(entity.body.position, PARKED);
        assert!(!entity.visible);
    }

    #[test]
    fn acquire_reuses_slots_instead_of_growing() {
        let mut pool = entity_pool(2);
        for _ in 0..50 {
            let id = pool.spawn(Vec2::ZERO, Vec2::ZERO).unwrap();
            pool.release(id);
        }
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.dropped_count(), 0);
    }

    #[test]
    fn recycle_scan_releases_only_offscreen_entities() {
        let world = World::new(800.0, 600.0);
        let mut pool = entity_pool(4);
        let gone = pool.spawn(Vec2::new(815.0, 100.0), Vec2::new(500.0, 0.0)).unwrap();
        let stays = pool.spawn(Vec2::new(400.0, 100.0), Vec2::new(500.0, 0.0)).unwrap();

        pool.integrate(0.02);
        let recycled = pool.recycle_outside(&world, 20.0);

        assert_eq!(recycled, vec![gone]);
        assert!(pool.is_active(stays));
        assert_eq!(pool.active_count(), 1);
        assert_relative_eq!(pool.get(stays).unwrap().position().x, 410.0);
    }

    #[test]
    fn iter_active_skips_inactive_slots() {
        let mut pool = entity_pool(3);
        let a = pool.spawn(Vec2::ZERO, Vec2::ZERO).unwrap();
        let b = pool.spawn(Vec2::ZERO, Vec2::ZERO).unwrap();
        pool.release(a);
        let ids: Vec<_> = pool.iter_active().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b]);
    }
}
