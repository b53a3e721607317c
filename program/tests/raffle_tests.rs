use borsh::BorshDeserialize;
use solana_program_test::*;
use solana_sdk::{
    clock::Clock,
    instruction::{Instruction, InstructionError},
    native_token::LAMPORTS_PER_SOL,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::{Transaction, TransactionError},
};

use autoraffle::{
    config::RaffleParams,
    error::RaffleError,
    find_raffle_address, instruction,
    processor::Processor,
    state::{Raffle, RafflePhase},
};
use vrf_coordinator::{
    derive_random_words, error::CoordinatorError, find_coordinator_address, find_request_address,
    state::{CoordinatorState, RequestRecord},
};

const FEE: u64 = LAMPORTS_PER_SOL / 10;

struct TestRaffle {
    context: ProgramTestContext,
    program_id: Pubkey,
    coordinator_id: Pubkey,
    raffle: Pubkey,
}

// Start both programs, initialize the coordinator and a development raffle owned by the payer
async fn setup() -> TestRaffle {
    let program_id = Pubkey::new_unique();
    let coordinator_id = Pubkey::new_unique();

    let mut program_test =
        ProgramTest::new("autoraffle", program_id, processor!(Processor::process));
    program_test.add_program(
        "vrf_coordinator",
        coordinator_id,
        processor!(vrf_coordinator::processor::Processor::process),
    );
    let mut context = program_test.start_with_context().await;

    let creator = context.payer.pubkey();
    let instructions = [
        vrf_coordinator::instruction::initialize(&coordinator_id, &creator).unwrap(),
        instruction::initialize_raffle(
            &program_id,
            &creator,
            &coordinator_id,
            RaffleParams::development(),
        )
        .unwrap(),
    ];
    send(&mut context, &instructions, &[]).await.unwrap();

    let (raffle, _) = find_raffle_address(&program_id, &creator);
    TestRaffle {
        context,
        program_id,
        coordinator_id,
        raffle,
    }
}

async fn send(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = context
        .banks_client
        .get_new_latest_blockhash(&context.last_blockhash)
        .await
        .unwrap();
    context.last_blockhash = blockhash;
    let mut all_signers = vec![&context.payer];
    all_signers.extend_from_slice(signers);
    let transaction = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &all_signers,
        blockhash,
    );
    context.banks_client.process_transaction(transaction).await
}

fn assert_instruction_error(result: Result<(), BanksClientError>, expected: InstructionError) {
    assert_eq!(
        result.unwrap_err().unwrap(),
        TransactionError::InstructionError(0, expected)
    );
}

fn assert_raffle_error(result: Result<(), BanksClientError>, expected: RaffleError) {
    assert_instruction_error(result, InstructionError::Custom(expected.code()));
}

async fn funded_player(test: &mut TestRaffle) -> Keypair {
    let player = Keypair::new();
    let fund = system_instruction::transfer(
        &test.context.payer.pubkey(),
        &player.pubkey(),
        LAMPORTS_PER_SOL,
    );
    send(&mut test.context, &[fund], &[]).await.unwrap();
    player
}

async fn enter(
    test: &mut TestRaffle,
    player: &Keypair,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = instruction::enter(&test.program_id, &player.pubkey(), &test.raffle, amount).unwrap();
    send(&mut test.context, &[ix], &[player]).await
}

async fn perform_upkeep(test: &mut TestRaffle) -> Result<(), BanksClientError> {
    let request_id = coordinator_state(test).await.next_request_id;
    let ix = instruction::perform_upkeep(
        &test.program_id,
        &test.context.payer.pubkey(),
        &test.raffle,
        &test.coordinator_id,
        request_id,
        vec![],
    )
    .unwrap();
    send(&mut test.context, &[ix], &[]).await
}

async fn fulfill(
    test: &mut TestRaffle,
    request_id: u64,
    winner: &Pubkey,
) -> Result<(), BanksClientError> {
    let ix = vrf_coordinator::instruction::fulfill_random_words(
        &test.coordinator_id,
        &test.context.payer.pubkey(),
        request_id,
        vec![],
        &test.program_id,
        &instruction::fulfillment_accounts(&test.raffle, winner),
    )
    .unwrap();
    send(&mut test.context, &[ix], &[]).await
}

async fn advance_clock(test: &mut TestRaffle, seconds: i64) {
    let mut clock: Clock = test.context.banks_client.get_sysvar().await.unwrap();
    clock.unix_timestamp += seconds;
    test.context.set_sysvar(&clock);
}

// Run CheckUpkeep without committing it and decode the `(upkeep_needed, perform_data)` it returns
async fn simulate_check_upkeep(test: &mut TestRaffle) -> (bool, Vec<u8>) {
    let ix = instruction::check_upkeep(&test.program_id, &test.raffle, vec![]).unwrap();
    let blockhash = test
        .context
        .banks_client
        .get_new_latest_blockhash(&test.context.last_blockhash)
        .await
        .unwrap();
    test.context.last_blockhash = blockhash;
    let transaction = Transaction::new_signed_with_payer(
        &[ix],
        Some(&test.context.payer.pubkey()),
        &[&test.context.payer],
        blockhash,
    );
    let simulation = test
        .context
        .banks_client
        .simulate_transaction(transaction)
        .await
        .unwrap();
    assert!(matches!(simulation.result, Some(Ok(()))));

    let return_data = simulation.simulation_details.unwrap().return_data;
    if let Some(return_data) = &return_data {
        assert_eq!(return_data.program_id, test.program_id);
    }
    let mut data = return_data.map(|r| r.data).unwrap_or_default();
    // Recorded return data drops trailing zero bytes; restore the bool and length prefix
    if data.len() < 5 {
        data.resize(5, 0);
    }
    <(bool, Vec<u8>)>::try_from_slice(&data).unwrap()
}

async fn raffle_state(test: &mut TestRaffle) -> Raffle {
    let account = test
        .context
        .banks_client
        .get_account(test.raffle)
        .await
        .unwrap()
        .unwrap();
    Raffle::load(&account.data).unwrap()
}

async fn coordinator_state(test: &mut TestRaffle) -> CoordinatorState {
    let (state, _) = find_coordinator_address(&test.coordinator_id);
    let account = test
        .context
        .banks_client
        .get_account(state)
        .await
        .unwrap()
        .unwrap();
    CoordinatorState::unpack(&account.data).unwrap()
}

async fn balance(test: &mut TestRaffle, address: Pubkey) -> u64 {
    test.context.banks_client.get_balance(address).await.unwrap()
}

#[tokio::test]
async fn test_initialize_raffle() {
    let mut test = setup().await;

    let account = test
        .context
        .banks_client
        .get_account(test.raffle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.owner, test.program_id);
    assert_eq!(account.data.len(), Raffle::space(100));

    let raffle = raffle_state(&mut test).await;
    assert_eq!(raffle.creator, test.context.payer.pubkey());
    assert_eq!(raffle.coordinator, test.coordinator_id);
    assert_eq!(raffle.params, RaffleParams::development());
    assert_eq!(raffle.phase(), RafflePhase::Open);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.recent_winner(), None);

    // a creator has one raffle
    let again = instruction::initialize_raffle(
        &test.program_id,
        &test.context.payer.pubkey(),
        &test.coordinator_id,
        RaffleParams::development(),
    )
    .unwrap();
    assert_instruction_error(
        send(&mut test.context, &[again], &[]).await,
        InstructionError::AccountAlreadyInitialized,
    );
}

#[tokio::test]
async fn test_initialize_rejects_invalid_params() {
    let mut test = setup().await;
    let creator = Keypair::new();
    let params = RaffleParams {
        max_players: 0,
        ..RaffleParams::development()
    };
    let fund = system_instruction::transfer(
        &test.context.payer.pubkey(),
        &creator.pubkey(),
        LAMPORTS_PER_SOL,
    );
    send(&mut test.context, &[fund], &[]).await.unwrap();

    let ix = instruction::initialize_raffle(
        &test.program_id,
        &creator.pubkey(),
        &test.coordinator_id,
        params,
    )
    .unwrap();
    assert_raffle_error(
        send(&mut test.context, &[ix], &[&creator]).await,
        RaffleError::InvalidParams("max players out of range"),
    );
}

#[tokio::test]
async fn test_enter() {
    let mut test = setup().await;
    let player = funded_player(&mut test).await;
    let raffle_address = test.raffle;
    let pool_before = balance(&mut test, raffle_address).await;

    assert_raffle_error(
        enter(&mut test, &player, 50_000).await,
        RaffleError::InsufficientPayment {
            required: FEE,
            tendered: 50_000,
        },
    );
    assert_eq!(raffle_state(&mut test).await.number_of_players(), 0);

    enter(&mut test, &player, FEE).await.unwrap();

    let raffle = raffle_state(&mut test).await;
    assert_eq!(raffle.player(0), Some(&player.pubkey()));
    assert_eq!(balance(&mut test, raffle_address).await, pool_before + FEE);
}

#[tokio::test]
async fn test_check_upkeep() {
    let mut test = setup().await;

    let ix = instruction::check_upkeep(&test.program_id, &test.raffle, vec![]).unwrap();
    send(&mut test.context, &[ix], &[]).await.unwrap();
    assert_eq!(raffle_state(&mut test).await.phase(), RafflePhase::Open);

    // a fresh raffle has no players and no pool
    assert_eq!(simulate_check_upkeep(&mut test).await, (false, vec![]));

    let player = funded_player(&mut test).await;
    enter(&mut test, &player, FEE).await.unwrap();
    assert_eq!(simulate_check_upkeep(&mut test).await, (false, vec![]));

    advance_clock(&mut test, 30).await;
    assert_eq!(simulate_check_upkeep(&mut test).await, (true, vec![]));

    let payer = test.context.payer.pubkey();
    let ix = instruction::check_upkeep(&test.program_id, &payer, vec![]).unwrap();
    assert_instruction_error(
        send(&mut test.context, &[ix], &[]).await,
        InstructionError::IncorrectProgramId,
    );
}

#[tokio::test]
async fn test_perform_upkeep() {
    let mut test = setup().await;
    let player = funded_player(&mut test).await;
    enter(&mut test, &player, FEE).await.unwrap();

    // the round has not lasted the interval yet
    let result = perform_upkeep(&mut test).await;
    assert_eq!(
        result.unwrap_err().unwrap(),
        TransactionError::InstructionError(0, InstructionError::Custom(5))
    );

    advance_clock(&mut test, 30).await;
    perform_upkeep(&mut test).await.unwrap();

    let raffle = raffle_state(&mut test).await;
    assert_eq!(raffle.phase(), RafflePhase::Calculating);
    assert_eq!(raffle.pending_request_id(), Some(1));
    assert_eq!(coordinator_state(&mut test).await.next_request_id, 2);

    let (record, _) = find_request_address(&test.coordinator_id, 1);
    let record = test
        .context
        .banks_client
        .get_account(record)
        .await
        .unwrap()
        .unwrap();
    let record = RequestRecord::unpack(&record.data).unwrap();
    assert_eq!(record.consumer, test.raffle);
    assert_eq!(record.consumer_program, test.program_id);
    assert_eq!(record.num_words, 1);
    assert!(!record.fulfilled);

    // entries are locked until the draw
    let late = funded_player(&mut test).await;
    assert_raffle_error(enter(&mut test, &late, FEE).await, RaffleError::RoundClosed);
}

#[tokio::test]
async fn test_fulfill_pays_winner() {
    let mut test = setup().await;
    let players = [funded_player(&mut test).await, funded_player(&mut test).await];
    for player in players.iter() {
        enter(&mut test, player, FEE).await.unwrap();
    }
    advance_clock(&mut test, 31).await;
    perform_upkeep(&mut test).await.unwrap();

    let word = derive_random_words(1, 1)[0];
    let winner = players[(word % 2) as usize].pubkey();
    let loser = players[1 - (word % 2) as usize].pubkey();

    // the coordinator must hand over the drawn player's account
    assert_raffle_error(
        fulfill(&mut test, 1, &loser).await,
        RaffleError::PayoutFailed { winner },
    );
    assert_eq!(raffle_state(&mut test).await.phase(), RafflePhase::Calculating);

    let winner_before = balance(&mut test, winner).await;
    fulfill(&mut test, 1, &winner).await.unwrap();

    assert_eq!(balance(&mut test, winner).await, winner_before + 2 * FEE);
    let rent = test.context.banks_client.get_rent().await.unwrap();
    let raffle_address = test.raffle;
    assert_eq!(
        balance(&mut test, raffle_address).await,
        rent.minimum_balance(Raffle::space(100))
    );

    let raffle = raffle_state(&mut test).await;
    assert_eq!(raffle.recent_winner(), Some(winner));
    assert_eq!(raffle.phase(), RafflePhase::Open);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.pending_request_id(), None);
    assert_eq!(raffle.round, 1);

    // a request is answered once
    assert_instruction_error(
        fulfill(&mut test, 1, &winner).await,
        InstructionError::Custom(CoordinatorError::RequestAlreadyFulfilled as u32),
    );

    // the next round accepts entries again
    enter(&mut test, &players[0], FEE).await.unwrap();
}

#[tokio::test]
async fn test_fulfill_requires_coordinator() {
    let mut test = setup().await;
    let player = funded_player(&mut test).await;
    enter(&mut test, &player, FEE).await.unwrap();
    advance_clock(&mut test, 30).await;
    perform_upkeep(&mut test).await.unwrap();

    let imposter = Keypair::new();
    let ix = instruction::fulfill_random_words(
        &test.program_id,
        &imposter.pubkey(),
        &test.raffle,
        &player.pubkey(),
        1,
        vec![0],
    )
    .unwrap();
    assert_raffle_error(
        send(&mut test.context, &[ix], &[&imposter]).await,
        RaffleError::InvalidOracleCaller,
    );

    let raffle = raffle_state(&mut test).await;
    assert_eq!(raffle.phase(), RafflePhase::Calculating);
    assert_eq!(raffle.number_of_players(), 1);
}
