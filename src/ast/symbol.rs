//! Bound-variable identity.
//!
//! A [`Symbol`] is a handle into a [`SymbolTable`] arena: a slot index plus
//! the generation the slot had when the symbol was allocated. Symbols compare
//! by that pair only, never by their name hint, so two comprehensions built
//! with distinct fresh symbols are never equal.

use super::{Comprehension, Node};
use serde::{Deserialize, Serialize};

/// A bound variable introduced by a comprehension generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    slot: u32,
    generation: u32,
}

impl Symbol {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.generation == 0 {
            write!(f, "s{}", self.slot)
        } else {
            write!(f, "s{}#{}", self.slot, self.generation)
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    hint: String,
    generation: u32,
    live: bool,
}

/// Generational arena of bound-variable slots.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table whose symbols cannot collide with any symbol bound or
    /// referenced inside `node`.
    pub fn above(node: &Node) -> Self {
        let mut max = None;
        node.visit_symbols(&mut |sym: Symbol| max = max.max(Some(sym.slot)));
        Self::reserved(max)
    }

    /// Same as [`SymbolTable::above`] for a bare comprehension.
    pub fn above_comprehension(c: &Comprehension) -> Self {
        let mut max = None;
        c.visit_symbols(&mut |sym: Symbol| max = max.max(Some(sym.slot)));
        Self::reserved(max)
    }

    // Slots up to `max` are dead and never handed out again.
    fn reserved(max: Option<u32>) -> Self {
        let count = max.map(|m| m as usize + 1).unwrap_or(0);
        let slots = (0..count)
            .map(|_| Slot {
                hint: String::new(),
                generation: 0,
                live: false,
            })
            .collect();
        Self {
            slots,
            free: Vec::new(),
        }
    }

    /// Allocate a fresh symbol. Freed slots are reused with a bumped generation.
    pub fn fresh(&mut self, hint: impl Into<String>) -> Symbol {
        let hint = hint.into();
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.generation += 1;
            entry.live = true;
            entry.hint = hint;
            return Symbol {
                slot,
                generation: entry.generation,
            };
        }
        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            hint,
            generation: 0,
            live: true,
        });
        Symbol {
            slot,
            generation: 0,
        }
    }

    /// Free a symbol's slot. Returns false if it was already stale.
    pub fn release(&mut self, sym: Symbol) -> bool {
        if !self.is_live(sym) {
            return false;
        }
        self.slots[sym.slot as usize].live = false;
        self.free.push(sym.slot);
        true
    }

    pub fn is_live(&self, sym: Symbol) -> bool {
        self.slots
            .get(sym.slot as usize)
            .is_some_and(|s| s.live && s.generation == sym.generation)
    }

    /// The name hint given at allocation, if the symbol is still live.
    pub fn hint(&self, sym: Symbol) -> Option<&str> {
        if self.is_live(sym) {
            Some(self.slots[sym.slot as usize].hint.as_str())
        } else {
            None
        }
    }

    /// Number of live symbols.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_symbols_are_distinct() {
        let mut table = SymbolTable::new();
        let a = table.fresh("users");
        let b = table.fresh("users");
        assert_ne!(a, b);
        assert_eq!(table.hint(a), Some("users"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_reused_slot_bumps_generation() {
        let mut table = SymbolTable::new();
        let a = table.fresh("a");
        assert!(table.release(a));
        assert!(!table.release(a));

        let b = table.fresh("b");
        assert_eq!(a.slot(), b.slot());
        assert_eq!(b.generation(), a.generation() + 1);
        assert_ne!(a, b);
        assert!(!table.is_live(a));
        assert_eq!(table.hint(a), None);
        assert_eq!(table.hint(b), Some("b"));
    }

    #[test]
    fn test_above_skips_existing_slots() {
        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let o = table.fresh("o");
        let node = Node::Comprehension(Box::new(
            Comprehension::new()
                .from(u, Node::table("users"))
                .from(o, Node::table("orders")),
        ));

        let mut above = SymbolTable::above(&node);
        let fresh = above.fresh("paged");
        assert!(fresh.slot() > o.slot());
        assert!(fresh.slot() > u.slot());
    }
}
