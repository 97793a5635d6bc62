//! In-flight bullets as a singly linked list.
//!
//! Nodes live in a slab and link to each other by index. Unlinked nodes
//! go on a free list and are reused by the next shot.

use crate::entities::{Bullet, Rect};
use crate::sprite::SpriteId;

#[derive(Clone, Debug)]
struct Node {
    bullet: Bullet,
    next: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct BulletList {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    len: usize,
}

impl BulletList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Prepend a bullet heading from `origin` toward `target` at `speed`
    /// pixels per tick. A target on top of the origin fires straight up.
    pub fn fire(
        &mut self,
        origin: (i32, i32),
        target: (i32, i32),
        speed: f32,
        damage: i32,
        sprite: SpriteId,
    ) {
        let dx = (target.0 - origin.0) as f32;
        let dy = (target.1 - origin.1) as f32;
        let distance = (dx * dx + dy * dy).sqrt();
        let (vx, vy) = if distance > f32::EPSILON {
            (dx / distance * speed, dy / distance * speed)
        } else {
            (0.0, -speed)
        };

        self.push_front(Bullet {
            x: origin.0 as f32,
            y: origin.1 as f32,
            vx,
            vy,
            damage,
            sprite,
        });
    }

    pub fn push_front(&mut self, bullet: Bullet) {
        let node = Node {
            bullet,
            next: self.head,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.head = Some(index);
        self.len += 1;
    }

    /// Move every bullet one step along its heading and unlink the ones
    /// that left `playfield`. Returns how many were removed.
    pub fn advance(&mut self, playfield: Rect) -> usize {
        self.retain(|b| {
            b.x += b.vx;
            b.y += b.vy;
            let (x, y) = b.position();
            playfield.contains(x, y)
        })
    }

    /// Walk the list once, unlinking every bullet `keep` rejects.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut Bullet) -> bool) -> usize {
        let mut removed = 0;
        let mut prev: Option<usize> = None;
        let mut cursor = self.head;

        while let Some(index) = cursor {
            let Some(node) = self.nodes.get_mut(index).and_then(Option::as_mut) else {
                break;
            };
            let next = node.next;

            if keep(&mut node.bullet) {
                prev = Some(index);
            } else {
                match prev {
                    None => self.head = next,
                    Some(p) => {
                        if let Some(prev_node) = self.nodes[p].as_mut() {
                            prev_node.next = next;
                        }
                    }
                }
                self.nodes[index] = None;
                self.free.push(index);
                self.len -= 1;
                removed += 1;
            }
            cursor = next;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.len = 0;
    }

    /// Front to back, newest first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}

pub struct Iter<'a> {
    list: &'a BulletList,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Bullet;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.nodes.get(self.cursor?)?.as_ref()?;
        self.cursor = node.next;
        Some(&node.bullet)
    }
}
