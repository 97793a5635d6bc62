//! Fixed-capacity enemy pool.
//!
//! Slots are never freed, only marked dead and handed back through a free
//! list, so a spawn is a pop and a despawn is a push. Spawning into a full
//! pool is dropped on the floor.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::entities::Enemy;

#[derive(Clone, Debug)]
pub struct EnemyPool {
    template: Enemy,
    slots: Vec<Enemy>,
    /// Dead slot indices, lowest first.
    free: BinaryHeap<Reverse<usize>>,
}

impl EnemyPool {
    pub fn new(template: Enemy, capacity: usize) -> Self {
        let mut template = template;
        template.alive = false;
        EnemyPool {
            slots: vec![template.clone(); capacity],
            free: (0..capacity).map(Reverse).collect(),
            template,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Enemy> {
        self.slots.get(index)
    }

    /// Reinitialise the lowest dead slot from the template at (`x`, `y`).
    /// Returns `None` without touching the pool when every slot is alive.
    pub fn spawn(&mut self, x: i32, y: i32) -> Option<usize> {
        let Reverse(index) = self.free.pop()?;
        let slot = &mut self.slots[index];
        *slot = self.template.clone();
        slot.x = x;
        slot.y = y;
        slot.alive = true;
        trace!(index, x, y, kind = ?slot.kind, "enemy spawned");
        Some(index)
    }

    /// Mark a slot dead and make it available to the next spawn.
    pub fn kill(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.alive {
                slot.alive = false;
                self.free.push(Reverse(index));
            }
        }
    }

    /// Apply `amount` damage to a live slot, killing it at zero health.
    /// Returns whether the enemy died.
    pub fn hurt(&mut self, index: usize, amount: i32) -> bool {
        let Some(slot) = self.slots.get_mut(index).filter(|e| e.alive) else {
            return false;
        };
        slot.health -= amount;
        if slot.health <= 0 {
            self.kill(index);
            return true;
        }
        false
    }

    /// Bring back up to `batch` dead slots, asking `place` for each
    /// position. Returns how many came back.
    pub fn revive_dead(&mut self, batch: usize, mut place: impl FnMut(&Enemy) -> (i32, i32)) -> usize {
        let mut revived = 0;
        while revived < batch {
            let (x, y) = place(&self.template);
            if self.spawn(x, y).is_none() {
                break;
            }
            revived += 1;
        }
        revived
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = (usize, &Enemy)> {
        self.slots.iter().enumerate().filter(|(_, e)| e.alive)
    }

    pub fn iter_alive_mut(&mut self) -> impl Iterator<Item = (usize, &mut Enemy)> {
        self.slots.iter_mut().enumerate().filter(|(_, e)| e.alive)
    }

    /// Kill everything.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            self.kill(index);
        }
    }
}
