use std::collections::BTreeSet;

use crate::instruction::InstId;
use crate::module::Module;

/// A value identifier.
///
/// `Id` is the arena key for a module's id table: two `Id`s compare equal
/// only when they name the same arena slot, which is the identity
/// semantics the format requires (a concrete numeric value is handed out
/// to at most one slot, enforced by [`Module::id_for_value`], so value
/// equality and identity equality agree in practice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(pub(crate) u32);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct IdSlot {
    pub(crate) value: u32,
    pub(crate) is_temp: bool,
    pub(crate) inst: Option<InstId>,
    pub(crate) uses: BTreeSet<InstId>,
}

impl Module {
    /// Return the `Id` for a concrete numeric value, creating it the
    /// first time it is seen. Used by the binary/text readers so that
    /// every reference to the same numeric value resolves to the same
    /// `Id` (invariant 2 in the data model: at most one Id per concrete
    /// value).
    pub fn id_for_value(&mut self, value: u32) -> Id {
        if let Some(id) = self.concrete_ids.get(&value) {
            return *id;
        }
        let slot = IdSlot { value, is_temp: false, inst: None, uses: BTreeSet::new() };
        self.ids.push(Some(slot));
        let id = Id((self.ids.len() - 1) as u32);
        self.concrete_ids.insert(value, id);
        self.bound = self.bound.max(value + 1);
        id
    }

    /// Allocate a fresh temporary id. Temporary ids must be replaced by
    /// concrete ids via [`Module::renumber_temp_ids`] before the module
    /// is serialized.
    pub fn new_temporary_id(&mut self) -> Id {
        self.temp_counter += 1;
        let slot = IdSlot { value: self.temp_counter, is_temp: true, inst: None, uses: BTreeSet::new() };
        self.ids.push(Some(slot));
        Id((self.ids.len() - 1) as u32)
    }

    pub(crate) fn id_slot(&self, id: Id) -> &IdSlot {
        self.ids[id.0 as usize].as_ref().expect("id used after destruction")
    }

    pub(crate) fn id_slot_mut(&mut self, id: Id) -> &mut IdSlot {
        self.ids[id.0 as usize].as_mut().expect("id used after destruction")
    }

    /// True if `id` has not yet been renumbered to a concrete value.
    pub fn is_temporary(&self, id: Id) -> bool {
        self.id_slot(id).is_temp
    }

    /// The numeric value `id` occupies in the module's id space.
    ///
    /// This is distinct from `Id`'s own `Display` impl, which prints the
    /// arena slot index for debugging and is never the right thing for
    /// emitted output. Binary and text writers must call this to get the
    /// number (or `%`-prefixed number) that belongs in the serialized
    /// form. Panics if `id` is still temporary; callers should run
    /// [`Module::renumber_temp_ids`] first.
    pub fn id_value(&self, id: Id) -> u32 {
        let slot = self.id_slot(id);
        assert!(!slot.is_temp, "id_value called on an unrenumbered temporary id");
        slot.value
    }

    /// The instruction that defines `id`, if any. A `None` result for an
    /// id referenced from user-written input signals a use-before-def;
    /// callers performing post-parse verification should check this.
    pub fn defining_inst(&self, id: Id) -> Option<InstId> {
        self.id_slot(id).inst
    }

    pub(crate) fn add_use(&mut self, id: Id, inst: InstId) {
        self.id_slot_mut(id).uses.insert(inst);
    }

    pub(crate) fn remove_use(&mut self, id: Id, inst: InstId) {
        self.id_slot_mut(id).uses.remove(&inst);
    }

    /// All instructions using `id`, in arena order (stable but otherwise
    /// arbitrary, matching the reference implementation's use of an
    /// unordered set).
    pub fn uses_of(&self, id: Id) -> Vec<InstId> {
        self.id_slot(id).uses.iter().copied().collect()
    }
}
