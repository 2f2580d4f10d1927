//! # Validator Registry
//!
//! Credential to slot mapping on top of the slot allocator. Enforces one live
//! entry per credential. Economic side effects (custody transfers, logs) live
//! in the service; this module only keeps the bookkeeping consistent.

use super::slot_allocator::SlotAllocator;
use crate::domain::{Address, ManagerError, SlotIndex, Validator, Wei};
use std::collections::HashMap;

/// Registry of live validators.
#[derive(Clone, Debug, Default)]
pub struct ValidatorRegistry {
    allocator: SlotAllocator,
    /// Indexed by slot; `None` for vacated slots.
    validators: Vec<Option<Validator>>,
    by_credential: HashMap<Address, SlotIndex>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `credential` may register. Does not write.
    pub fn check_can_register(&self, credential: &Address) -> Result<(), ManagerError> {
        if self.by_credential.contains_key(credential) {
            return Err(ManagerError::AlreadyRegistered(*credential));
        }
        Ok(())
    }

    /// Register a validator and return its slot.
    pub fn insert(
        &mut self,
        credential: Address,
        withdrawal_address: Address,
        deposit: Wei,
    ) -> Result<SlotIndex, ManagerError> {
        self.check_can_register(&credential)?;

        let slot = self.allocator.peek_next();
        if self.get(slot).is_some() {
            return Err(ManagerError::InvariantViolation(format!(
                "allocator would hand out occupied slot {}",
                slot
            )));
        }

        let slot = self.allocator.allocate();
        let index = slot as usize;
        if index >= self.validators.len() {
            self.validators.resize(index + 1, None);
        }
        self.validators[index] =
            Some(Validator::new(credential, slot, withdrawal_address, deposit));
        self.by_credential.insert(credential, slot);
        Ok(slot)
    }

    /// Remove the validator at `slot` and free the slot.
    pub fn remove(&mut self, slot: SlotIndex) -> Result<Validator, ManagerError> {
        let validator = self
            .get(slot)
            .cloned()
            .ok_or(ManagerError::InvalidSlot(slot))?;

        self.allocator.free(slot)?;
        self.validators[slot as usize] = None;
        self.by_credential.remove(&validator.credential);
        Ok(validator)
    }

    /// Validator occupying `slot`, if any.
    pub fn get(&self, slot: SlotIndex) -> Option<&Validator> {
        self.validators.get(slot as usize).and_then(Option::as_ref)
    }

    /// Whether `credential` has a live entry.
    pub fn is_deposited(&self, credential: &Address) -> bool {
        self.by_credential.contains_key(credential)
    }

    /// Number of live validators.
    pub fn count_live(&self) -> u64 {
        self.allocator.live_count()
    }

    /// Slot high-water mark.
    pub fn max_index(&self) -> SlotIndex {
        self.allocator.max_index()
    }

    /// Slot allocator (read-only, for the sampler).
    pub fn allocator(&self) -> &SlotAllocator {
        &self.allocator
    }
}
