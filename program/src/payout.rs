use solana_program::{
    account_info::AccountInfo, msg, program_error::ProgramError, pubkey::Pubkey, rent::Rent,
};

/// Holds the prize pool and pays it out
pub trait PrizeVault {
    /// Lamports available as prize
    fn balance(&self) -> u64;

    /// Move `amount` lamports to `winner`
    fn pay_out(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError>;
}

/// Pool balance of an account: everything above its rent-exempt minimum
pub fn pool_balance(lamports: u64, rent_exempt_minimum: u64) -> u64 {
    lamports.saturating_sub(rent_exempt_minimum)
}

/// Pays from the lamports of the program-owned raffle account
pub struct LamportVault<'a, 'info> {
    pub pool: &'a AccountInfo<'info>,
    /// Account supplied by the caller to receive the prize
    pub recipient: &'a AccountInfo<'info>,
    pub rent_exempt_minimum: u64,
}

impl<'a, 'info> LamportVault<'a, 'info> {
    pub fn new(
        pool: &'a AccountInfo<'info>,
        recipient: &'a AccountInfo<'info>,
        rent: &Rent,
    ) -> Self {
        Self {
            pool,
            recipient,
            rent_exempt_minimum: rent.minimum_balance(pool.data_len()),
        }
    }
}

impl<'a, 'info> PrizeVault for LamportVault<'a, 'info> {
    fn balance(&self) -> u64 {
        pool_balance(self.pool.lamports(), self.rent_exempt_minimum)
    }

    fn pay_out(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.recipient.key != winner {
            msg!("Prize account {} is not the winner {}", self.recipient.key, winner);
            return Err(ProgramError::InvalidArgument);
        }
        if self.recipient.key == self.pool.key || !self.recipient.is_writable {
            msg!("Prize account {} cannot receive lamports", self.recipient.key);
            return Err(ProgramError::InvalidArgument);
        }
        if amount > self.balance() {
            return Err(ProgramError::InsufficientFunds);
        }

        let pool_lamports = self
            .pool
            .lamports()
            .checked_sub(amount)
            .ok_or(ProgramError::InsufficientFunds)?;
        let recipient_lamports = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(ProgramError::InvalidArgument)?;

        **self.pool.try_borrow_mut_lamports()? = pool_lamports;
        **self.recipient.try_borrow_mut_lamports()? = recipient_lamports;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_balance_excludes_rent_reserve() {
        assert_eq!(pool_balance(1_100_000, 1_000_000), 100_000);
        assert_eq!(pool_balance(900_000, 1_000_000), 0);
    }

    #[test]
    fn pays_only_the_drawn_winner() {
        let owner = Pubkey::new_unique();
        let pool_key = Pubkey::new_unique();
        let winner_key = Pubkey::new_unique();
        let mut pool_lamports = 1_500;
        let mut winner_lamports = 10;
        let mut pool_data = vec![0u8; 8];
        let mut winner_data = vec![];
        let pool = AccountInfo::new(
            &pool_key,
            false,
            true,
            &mut pool_lamports,
            &mut pool_data,
            &owner,
            false,
            0,
        );
        let recipient = AccountInfo::new(
            &winner_key,
            false,
            true,
            &mut winner_lamports,
            &mut winner_data,
            &owner,
            false,
            0,
        );
        let mut vault = LamportVault {
            pool: &pool,
            recipient: &recipient,
            rent_exempt_minimum: 1_000,
        };

        assert_eq!(vault.balance(), 500);
        assert_eq!(
            vault.pay_out(&Pubkey::new_unique(), 500),
            Err(ProgramError::InvalidArgument)
        );
        assert_eq!(vault.pay_out(&winner_key, 501), Err(ProgramError::InsufficientFunds));

        vault.pay_out(&winner_key, 500).unwrap();
        assert_eq!(vault.balance(), 0);
        assert_eq!(pool.lamports(), 1_000);
        assert_eq!(recipient.lamports(), 510);
    }
}
