//! LSP14 two-step ownership, as kept by the account the key manager controls.
//!
//! Transfer: the owner nominates a pending owner, who accepts in a later call.
//! Renounce: a first call starts a countdown; a second call inside
//! `[start + DELAY, start + DELAY + PERIOD]` clears ownership for good.

use stylus_sdk::alloy_primitives::{Address, U256};

use crate::{
    constants::{RENOUNCE_OWNERSHIP_CONFIRMATION_DELAY, RENOUNCE_OWNERSHIP_CONFIRMATION_PERIOD},
    errors::{
        CannotTransferOwnershipToSelf, LSP14CallerNotPendingOwner,
        LSP14MustAcceptOwnershipInSeparateTransaction, NotInRenounceOwnershipInterval, OwnableError,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnershipEvent {
    OwnershipTransferStarted { previous_owner: Address, new_owner: Address },
    OwnershipTransferred { previous_owner: Address, new_owner: Address },
    RenounceOwnershipInitiated,
    OwnershipRenounced,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ownable2Step {
    owner: Address,
    pending_owner: Address,
    renounce_started_at: u64,
    transfer_in_progress: bool,
}

impl Ownable2Step {
    pub fn new(owner: Address) -> Self {
        Self { owner, ..Self::default() }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pending_owner(&self) -> Address {
        self.pending_owner
    }

    pub fn renounce_started_at(&self) -> u64 {
        self.renounce_started_at
    }

    pub fn only_owner(&self, caller: Address) -> Result<(), OwnableError> {
        if caller != self.owner {
            return Err(OwnableError::caller_not_the_owner(caller));
        }
        Ok(())
    }

    /// Nominate `new_owner`. The transfer stays "in progress" until [`Self::finish_transfer`],
    /// so the nominee cannot accept from inside the notification it receives.
    pub fn begin_transfer(
        &mut self,
        caller: Address,
        new_owner: Address,
        self_address: Address,
    ) -> Result<OwnershipEvent, OwnableError> {
        self.only_owner(caller)?;
        if new_owner == self_address {
            return Err(OwnableError::CannotTransferOwnershipToSelf(CannotTransferOwnershipToSelf {}));
        }
        self.pending_owner = new_owner;
        self.renounce_started_at = 0;
        self.transfer_in_progress = true;
        Ok(OwnershipEvent::OwnershipTransferStarted { previous_owner: self.owner, new_owner })
    }

    pub fn finish_transfer(&mut self) {
        self.transfer_in_progress = false;
    }

    pub fn accept(&mut self, caller: Address) -> Result<OwnershipEvent, OwnableError> {
        if self.transfer_in_progress {
            return Err(OwnableError::MustAcceptOwnershipInSeparateTransaction(
                LSP14MustAcceptOwnershipInSeparateTransaction {},
            ));
        }
        if caller != self.pending_owner {
            return Err(OwnableError::CallerNotPendingOwner(LSP14CallerNotPendingOwner { caller }));
        }
        let previous_owner = self.owner;
        self.owner = self.pending_owner;
        self.pending_owner = Address::ZERO;
        self.renounce_started_at = 0;
        Ok(OwnershipEvent::OwnershipTransferred { previous_owner, new_owner: self.owner })
    }

    /// First call (or a call after the window lapsed) starts the countdown; a call inside the
    /// window confirms. Returns the events to emit.
    pub fn renounce(
        &mut self,
        caller: Address,
        block_number: u64,
    ) -> Result<alloc::vec::Vec<OwnershipEvent>, OwnableError> {
        self.only_owner(caller)?;

        let start = self.renounce_started_at;
        let confirmation_start = start.saturating_add(RENOUNCE_OWNERSHIP_CONFIRMATION_DELAY);
        let confirmation_end = confirmation_start.saturating_add(RENOUNCE_OWNERSHIP_CONFIRMATION_PERIOD);

        if start == 0 || block_number > confirmation_end {
            self.renounce_started_at = block_number;
            return Ok(alloc::vec![OwnershipEvent::RenounceOwnershipInitiated]);
        }
        if block_number < confirmation_start {
            return Err(OwnableError::NotInRenounceOwnershipInterval(NotInRenounceOwnershipInterval {
                renounceOwnershipStart: U256::from(confirmation_start),
                renounceOwnershipEnd: U256::from(confirmation_end),
            }));
        }

        let previous_owner = self.owner;
        self.owner = Address::ZERO;
        self.pending_owner = Address::ZERO;
        self.renounce_started_at = 0;
        Ok(alloc::vec![
            OwnershipEvent::OwnershipTransferred { previous_owner, new_owner: Address::ZERO },
            OwnershipEvent::OwnershipRenounced,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat_byte(0x01);
    const NEXT: Address = Address::repeat_byte(0x02);
    const ACCOUNT: Address = Address::repeat_byte(0xac);

    fn interval(start: u64) -> OwnableError {
        OwnableError::NotInRenounceOwnershipInterval(NotInRenounceOwnershipInterval {
            renounceOwnershipStart: U256::from(start + 100),
            renounceOwnershipEnd: U256::from(start + 200),
        })
    }

    #[test]
    fn two_step_transfer() {
        let mut ownable = Ownable2Step::new(OWNER);
        assert_eq!(
            ownable.begin_transfer(NEXT, NEXT, ACCOUNT),
            Err(OwnableError::caller_not_the_owner(NEXT))
        );
        assert_eq!(
            ownable.begin_transfer(OWNER, NEXT, ACCOUNT),
            Ok(OwnershipEvent::OwnershipTransferStarted { previous_owner: OWNER, new_owner: NEXT })
        );
        assert_eq!(ownable.owner(), OWNER);
        assert_eq!(ownable.pending_owner(), NEXT);

        assert!(matches!(
            ownable.accept(NEXT),
            Err(OwnableError::MustAcceptOwnershipInSeparateTransaction(_))
        ));
        ownable.finish_transfer();

        assert!(matches!(ownable.accept(OWNER), Err(OwnableError::CallerNotPendingOwner(_))));
        assert_eq!(
            ownable.accept(NEXT),
            Ok(OwnershipEvent::OwnershipTransferred { previous_owner: OWNER, new_owner: NEXT })
        );
        assert_eq!(ownable.owner(), NEXT);
        assert_eq!(ownable.pending_owner(), Address::ZERO);
    }

    #[test]
    fn cannot_transfer_to_self() {
        let mut ownable = Ownable2Step::new(OWNER);
        assert!(matches!(
            ownable.begin_transfer(OWNER, ACCOUNT, ACCOUNT),
            Err(OwnableError::CannotTransferOwnershipToSelf(_))
        ));
    }

    #[test]
    fn renounce_window_bounds() {
        let mut ownable = Ownable2Step::new(OWNER);
        assert_eq!(ownable.renounce(OWNER, 1_000), Ok(alloc::vec![OwnershipEvent::RenounceOwnershipInitiated]));
        assert_eq!(ownable.renounce_started_at(), 1_000);

        assert_eq!(ownable.renounce(OWNER, 1_099), Err(interval(1_000)));
        assert_eq!(
            ownable.renounce(OWNER, 1_100),
            Ok(alloc::vec![
                OwnershipEvent::OwnershipTransferred { previous_owner: OWNER, new_owner: Address::ZERO },
                OwnershipEvent::OwnershipRenounced,
            ])
        );
        assert_eq!(ownable.owner(), Address::ZERO);
        assert_eq!(ownable.renounce_started_at(), 0);
    }

    #[test]
    fn renounce_confirms_on_last_block_of_window() {
        let mut ownable = Ownable2Step::new(OWNER);
        ownable.renounce(OWNER, 50).unwrap();
        assert_eq!(ownable.renounce(OWNER, 250).unwrap().len(), 2);
        assert_eq!(ownable.owner(), Address::ZERO);
    }

    #[test]
    fn lapsed_window_restarts() {
        let mut ownable = Ownable2Step::new(OWNER);
        ownable.renounce(OWNER, 50).unwrap();
        assert_eq!(ownable.renounce(OWNER, 251), Ok(alloc::vec![OwnershipEvent::RenounceOwnershipInitiated]));
        assert_eq!(ownable.renounce_started_at(), 251);
        assert_eq!(ownable.owner(), OWNER);
    }

    #[test]
    fn renounce_keeps_pending_owner_until_confirmed() {
        let mut ownable = Ownable2Step::new(OWNER);
        ownable.begin_transfer(OWNER, NEXT, ACCOUNT).unwrap();
        ownable.finish_transfer();
        ownable.renounce(OWNER, 10).unwrap();
        assert_eq!(ownable.pending_owner(), NEXT);
        ownable.renounce(OWNER, 110).unwrap();
        assert_eq!(ownable.pending_owner(), Address::ZERO);
    }

    #[test]
    fn transfer_resets_renounce_countdown() {
        let mut ownable = Ownable2Step::new(OWNER);
        ownable.renounce(OWNER, 10).unwrap();
        ownable.begin_transfer(OWNER, NEXT, ACCOUNT).unwrap();
        ownable.finish_transfer();
        assert_eq!(ownable.renounce_started_at(), 0);
        assert_eq!(ownable.renounce(OWNER, 120), Ok(alloc::vec![OwnershipEvent::RenounceOwnershipInitiated]));
    }

    #[test]
    fn only_owner_may_renounce() {
        let mut ownable = Ownable2Step::new(OWNER);
        assert_eq!(ownable.renounce(NEXT, 10), Err(OwnableError::caller_not_the_owner(NEXT)));
    }
}
