//! Ledger state snapshot

use std::collections::BTreeMap;
use tessera_primitives::Address;
use tessera_types::Account;

/// Full ledger state: every account plus the address allocator.
///
/// The emulator keeps one committed copy and one working copy per pending
/// block; transactions run against a clone of the working copy which replaces
/// it only when execution succeeds.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    accounts: BTreeMap<Address, Account>,
    next_address: u64,
}

impl LedgerState {
    /// Empty state whose first allocated address is `first_address`
    pub fn new(first_address: Address) -> Self {
        Self {
            accounts: BTreeMap::new(),
            next_address: first_address.to_u64(),
        }
    }

    /// Account at `address`
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Mutable account at `address`
    pub fn account_mut(&mut self, address: &Address) -> Option<&mut Account> {
        self.accounts.get_mut(address)
    }

    /// Insert or replace an account
    pub fn set_account(&mut self, account: Account) {
        self.accounts.insert(account.address, account);
    }

    /// Reserve the next sequential address
    pub fn allocate_address(&mut self) -> Address {
        let address = Address::from_u64(self.next_address);
        self.next_address += 1;
        address
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True when no accounts exist
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
