//! Per-call bookkeeping for shared instances. Ids are handed out in the order in which instances are first met, which
//! is the same order on the writing and on the reading side.

use crate::error::{Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

/// Maps the addresses of already written instances to their ids.
#[derive(Debug, Default)]
pub(crate) struct ReferenceTracker {
    ids: HashMap<usize, u32>,
}

impl ReferenceTracker {

    /// Returns the id of an instance at `address` which was already met, otherwise assigns the next id and returns
    /// `None`.
    pub(crate) fn track(&mut self, address: usize) -> Option<u32> {
        match self.ids.get(&address) {
            Some(id) => Some(*id),
            None     => {
                let id = self.ids.len() as u32;
                self.ids.insert(address, id);
                None
            }
        }
    }

}

/// Holds already read instances by id.
#[derive(Default)]
pub(crate) struct ReferenceTable {
    slots: Vec<Option<Rc<dyn Any>>>,
}

impl ReferenceTable {

    /// Reserves the next id for an instance which is about to be read.
    pub(crate) fn reserve(&mut self) -> u32 {
        self.slots.push(None);
        (self.slots.len() - 1) as u32
    }

    pub(crate) fn fill(&mut self, id: u32, instance: Rc<dyn Any>) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = Some(instance);
        }
    }

    /// Looks up a finished instance. Ids which were never reserved or whose instance is still being read are unknown.
    pub(crate) fn get(&self, id: u32) -> Result<Rc<dyn Any>> {
        self.slots.get(id as usize).and_then(Option::clone).ok_or(Error::UnknownReference(id))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_first_sight() {
        let mut tracker = ReferenceTracker::default();
        assert_eq!(None, tracker.track(0x10));
        assert_eq!(None, tracker.track(0x20));
        assert_eq!(Some(0), tracker.track(0x10));
        assert_eq!(Some(1), tracker.track(0x20));
    }

    #[test]
    fn unfinished_slots_are_unknown() {
        let mut table = ReferenceTable::default();
        let id = table.reserve();
        assert_eq!(Some(Error::UnknownReference(0)), table.get(id).err());
        table.fill(id, Rc::new(7u8));
        assert_eq!(Some(&7u8), table.get(id).unwrap().downcast_ref::<u8>());
        assert!(table.get(1).is_err());
    }

}
