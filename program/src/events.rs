use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, program_error::ProgramError, pubkey::Pubkey};

/// Observable raffle events, logged for indexers and tests
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player was admitted to the current round
    RaffleEntered {
        player: Pubkey,
        amount: u64,
        round: u64,
    },
    /// Entries closed and randomness was requested
    RequestedRaffleWinner { request_id: u64, round: u64 },
    /// The pool was paid out and a new round opened
    WinnerPicked {
        winner: Pubkey,
        prize: u64,
        round: u64,
    },
}

impl RaffleEvent {
    /// Write the event to the program log, readable and as a borsh `Program data:` record
    pub fn emit(&self) -> Result<(), ProgramError> {
        match self {
            RaffleEvent::RaffleEntered {
                player,
                amount,
                round,
            } => msg!("RaffleEntered: Player={}, Amount={}, Round={}", player, amount, round),
            RaffleEvent::RequestedRaffleWinner { request_id, round } => {
                msg!("RequestedRaffleWinner: RequestId={}, Round={}", request_id, round)
            }
            RaffleEvent::WinnerPicked {
                winner,
                prize,
                round,
            } => msg!("WinnerPicked: Winner={}, Prize={}, Round={}", winner, prize, round),
        }

        let data = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        sol_log_data(&[data.as_slice()]);
        Ok(())
    }
}
