// Raffle state machine
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};
use std::fmt;
use vrf_coordinator::RandomnessRequest;

use crate::{
    config::{RaffleParams, NUM_WORDS, REQUEST_CONFIRMATIONS},
    error::RaffleError,
    events::RaffleEvent,
    oracle::RandomnessOracle,
    payout::PrizeVault,
};

/// Whether the raffle accepts entries
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RafflePhase {
    Open,
    /// A randomness request is in flight, entries are locked
    Calculating,
}

impl fmt::Display for RafflePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RafflePhase::Open => write!(f, "open"),
            RafflePhase::Calculating => write!(f, "calculating"),
        }
    }
}

/// The upkeep conditions evaluated at one point in time, with the values behind them
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
    pub balance: u64,
    pub num_players: u64,
    pub phase: RafflePhase,
}

impl UpkeepStatus {
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

impl fmt::Display for UpkeepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "balance={}, players={}, phase={}, time_passed={}",
            self.balance, self.num_players, self.phase, self.time_passed
        )
    }
}

/// Raffle account
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    /// Is the raffle initialized
    pub is_initialized: bool,
    /// Bump of the raffle PDA
    pub bump: u8,
    /// Account that created the raffle, part of the PDA seeds
    pub creator: Pubkey,
    /// Coordinator program serving randomness requests
    pub coordinator: Pubkey,
    pub params: RaffleParams,
    pub phase: RafflePhase,
    /// Start of the current round
    pub last_timestamp: UnixTimestamp,
    /// Winner of the previous round
    pub recent_winner: Option<Pubkey>,
    /// Request the raffle waits for while calculating
    pub pending_request_id: Option<u64>,
    /// Number of completed rounds
    pub round: u64,
    /// Entries of the current round, one per paid entry
    pub players: Vec<Pubkey>,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Encoded size of `RaffleParams`
    pub const PARAMS_LEN: usize = 8 + 8 + 32 + 8 + 4 + 4;

    /// Encoded size of a raffle with no players, including the list length prefix
    pub const BASE_LEN: usize = 1 + 1 + 32 + 32 + Self::PARAMS_LEN + 1 + 8 + 33 + 9 + 8 + 4;

    /// Account size for a raffle holding up to `max_players` entries
    pub fn space(max_players: u32) -> usize {
        Self::BASE_LEN + 32 * max_players as usize
    }

    pub fn new(
        creator: Pubkey,
        bump: u8,
        coordinator: Pubkey,
        params: RaffleParams,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            is_initialized: true,
            bump,
            creator,
            coordinator,
            params,
            phase: RafflePhase::Open,
            last_timestamp: now,
            recent_winner: None,
            pending_request_id: None,
            round: 0,
            players: Vec::new(),
        }
    }

    /// Decode a raffle from account data. The allocation is sized for a full round, so
    /// trailing bytes are expected and ignored.
    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let raffle =
            Self::deserialize(&mut &data[..]).map_err(|_| ProgramError::InvalidAccountData)?;
        if !raffle.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }

    pub fn save(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        let mut writer = data;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    pub fn entrance_fee(&self) -> u64 {
        self.params.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.params.interval
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn phase(&self) -> RafflePhase {
        self.phase
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    /// Request sent to the oracle when a round closes
    pub fn randomness_request(&self) -> RandomnessRequest {
        RandomnessRequest {
            key_hash: self.params.gas_lane,
            subscription_id: self.params.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: self.params.callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }

    /// Admit `player` to the current round for `amount` lamports
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<RaffleEvent, RaffleError> {
        if amount < self.params.entrance_fee {
            return Err(RaffleError::InsufficientPayment {
                required: self.params.entrance_fee,
                tendered: amount,
            });
        }
        if self.phase != RafflePhase::Open {
            return Err(RaffleError::RoundClosed);
        }
        if self.players.len() >= self.params.max_players as usize {
            return Err(RaffleError::RaffleFull {
                max_players: self.params.max_players,
            });
        }

        self.players.push(player);
        Ok(RaffleEvent::RaffleEntered {
            player,
            amount,
            round: self.round,
        })
    }

    /// Evaluate the upkeep conditions at `now` for a pool holding `balance` lamports
    pub fn check_upkeep(&self, now: UnixTimestamp, balance: u64) -> UpkeepStatus {
        let elapsed = now.saturating_sub(self.last_timestamp);
        UpkeepStatus {
            is_open: self.phase == RafflePhase::Open,
            time_passed: elapsed >= 0 && elapsed as u64 >= self.params.interval,
            has_players: !self.players.is_empty(),
            has_balance: balance > 0,
            balance,
            num_players: self.players.len() as u64,
            phase: self.phase,
        }
    }

    /// Close the round and request randomness for the draw
    pub fn perform_upkeep<O: RandomnessOracle + ?Sized>(
        &mut self,
        now: UnixTimestamp,
        balance: u64,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        let status = self.check_upkeep(now, balance);
        if !status.upkeep_needed() {
            return Err(RaffleError::UpkeepNotNeeded(status));
        }

        self.phase = RafflePhase::Calculating;
        let request_id = match oracle.request_random_words(&self.randomness_request()) {
            Ok(request_id) => request_id,
            Err(error) => {
                self.phase = RafflePhase::Open;
                return Err(RaffleError::OracleRequestFailed(error));
            }
        };
        self.pending_request_id = Some(request_id);

        Ok(RaffleEvent::RequestedRaffleWinner {
            request_id,
            round: self.round,
        })
    }

    /// Draw the winner of the pending request, pay out the pool and open the next round
    pub fn fulfill_random_words<V: PrizeVault + ?Sized>(
        &mut self,
        request_id: u64,
        random_words: &[u64],
        now: UnixTimestamp,
        vault: &mut V,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.phase != RafflePhase::Calculating || self.pending_request_id != Some(request_id) {
            return Err(RaffleError::RequestMismatch {
                expected: self.pending_request_id,
                received: request_id,
            });
        }
        let random_word = *random_words.first().ok_or(RaffleError::MissingRandomWords)?;
        let index =
            winner_index(random_word, self.players.len()).ok_or(RaffleError::NoPlayers)?;
        let winner = self.players[index];
        let round = self.round;
        let next_round = round.checked_add(1).ok_or(RaffleError::Overflow)?;
        let prize = vault.balance();

        // The round is closed before the transfer
        let players = std::mem::take(&mut self.players);
        let previous_winner = self.recent_winner.replace(winner);
        let previous_timestamp = std::mem::replace(&mut self.last_timestamp, now);
        self.phase = RafflePhase::Open;
        self.pending_request_id = None;
        self.round = next_round;

        if let Err(error) = vault.pay_out(&winner, prize) {
            msg!("Payout of {} lamports to {} failed: {}", prize, winner, error);
            self.players = players;
            self.recent_winner = previous_winner;
            self.last_timestamp = previous_timestamp;
            self.phase = RafflePhase::Calculating;
            self.pending_request_id = Some(request_id);
            self.round = round;
            return Err(RaffleError::PayoutFailed { winner });
        }

        Ok(RaffleEvent::WinnerPicked {
            winner,
            prize,
            round,
        })
    }
}

/// Slot of the winning entry for a random word, by plain modulo reduction.
/// `None` when there are no entries.
pub fn winner_index(random_word: u64, num_players: usize) -> Option<usize> {
    if num_players == 0 {
        return None;
    }
    Some((random_word % num_players as u64) as usize)
}
