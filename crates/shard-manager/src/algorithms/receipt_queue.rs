//! # Cross-Shard Receipt Queue
//!
//! Append-only, globally ordered. Receipt ids are positions in the queue, so
//! they start at 0 and are never reused.

use crate::domain::{Address, ManagerError, Receipt, ReceiptId};

/// Queue of pending cross-shard calls.
#[derive(Clone, Debug, Default)]
pub struct ReceiptQueue {
    receipts: Vec<Receipt>,
}

impl ReceiptQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next pushed receipt will get.
    pub fn next_id(&self) -> ReceiptId {
        self.receipts.len() as ReceiptId
    }

    /// Append a receipt and return its id.
    pub fn push(&mut self, receipt: Receipt) -> ReceiptId {
        let id = self.next_id();
        self.receipts.push(receipt);
        id
    }

    /// Receipt by id.
    pub fn get(&self, id: ReceiptId) -> Option<&Receipt> {
        self.receipts.get(id as usize)
    }

    /// Check that `caller` may reprice receipt `id`. Does not write.
    pub fn check_update(&self, id: ReceiptId, caller: &Address) -> Result<(), ManagerError> {
        let receipt = self.get(id).ok_or(ManagerError::UnknownReceipt(id))?;
        if receipt.origin_sender != *caller {
            return Err(ManagerError::Unauthorized {
                receipt_id: id,
                caller: *caller,
            });
        }
        Ok(())
    }

    /// Change the gas price; only the origin sender may.
    pub fn update_gasprice(
        &mut self,
        id: ReceiptId,
        caller: &Address,
        gasprice: u64,
    ) -> Result<(), ManagerError> {
        self.check_update(id, caller)?;
        if let Some(receipt) = self.receipts.get_mut(id as usize) {
            receipt.gasprice = gasprice;
        }
        Ok(())
    }

    /// Number of receipts ever created.
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    /// Whether no receipt has been created.
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(sender: u8, gasprice: u64) -> Receipt {
        Receipt {
            shard_id: 1,
            to: [9u8; 20],
            value: 10,
            startgas: 21_000,
            gasprice,
            data: vec![1, 2, 3],
            origin_sender: [sender; 20],
        }
    }

    #[test]
    fn test_ids_sequential_from_zero() {
        let mut queue = ReceiptQueue::new();
        for expected in 0..5 {
            assert_eq!(queue.push(receipt(1, 1)), expected);
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.next_id(), 5);
    }

    #[test]
    fn test_origin_can_update_gasprice() {
        let mut queue = ReceiptQueue::new();
        let id = queue.push(receipt(1, 5));
        queue.update_gasprice(id, &[1u8; 20], 50).unwrap();
        assert_eq!(queue.get(id).unwrap().gasprice, 50);
        assert_eq!(queue.get(id).unwrap().data, vec![1, 2, 3]);
    }

    #[test]
    fn test_non_origin_update_rejected() {
        let mut queue = ReceiptQueue::new();
        let id = queue.push(receipt(1, 5));
        let err = queue.update_gasprice(id, &[2u8; 20], 50).unwrap_err();
        assert!(matches!(err, ManagerError::Unauthorized { receipt_id: 0, .. }));
        assert_eq!(queue.get(id).unwrap().gasprice, 5);
    }

    #[test]
    fn test_unknown_receipt_rejected() {
        let mut queue = ReceiptQueue::new();
        assert_eq!(
            queue.update_gasprice(3, &[1u8; 20], 1),
            Err(ManagerError::UnknownReceipt(3))
        );
        assert!(queue.get(3).is_none());
    }
}
