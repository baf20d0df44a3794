use solana_program::pubkey::Pubkey;

use timed_raffle::{
    config::{Cluster, RaffleConfig},
    error::RaffleError,
    event::RaffleEvent,
    mock::{InMemoryLedger, ManualClock, MockVrfCoordinator, BASE_FEE, GAS_PRICE},
    ports::RandomnessRequest,
    raffle::Raffle,
    state::RafflePhase,
    trigger::TriggerReason,
};

const START: i64 = 1_700_000_000;
const FEE: u64 = 1;
const INTERVAL: i64 = 10;
const CALLBACK_GAS_LIMIT: u32 = 500_000;
const SUBSCRIPTION_FUNDING: u64 = 10_000_000_000_000_000;

type TestRaffle = Raffle<ManualClock, InMemoryLedger, MockVrfCoordinator>;

// Raffle registered on a funded mock subscription with the given fee/interval
fn setup_with(entry_fee: u64, interval: i64) -> TestRaffle {
    let address = Pubkey::new_unique();
    let mut coordinator = MockVrfCoordinator::default();
    let subscription_id = coordinator.create_subscription();
    coordinator
        .fund_subscription(subscription_id, SUBSCRIPTION_FUNDING)
        .unwrap();
    coordinator.add_consumer(subscription_id, address).unwrap();

    let config = RaffleConfig {
        entry_fee,
        interval,
        randomness: RandomnessRequest::new([1u8; 32], subscription_id, CALLBACK_GAS_LIMIT),
    };

    Raffle::new(
        address,
        config,
        ManualClock::new(START),
        InMemoryLedger::new(),
        coordinator,
    )
    .unwrap()
}

fn setup() -> TestRaffle {
    setup_with(FEE, INTERVAL)
}

// Deposits into the vault alongside the entry, as the program does
fn enter(raffle: &mut TestRaffle, player: Pubkey, amount: u64) -> Result<(), RaffleError> {
    raffle.enter(player, amount)?;
    raffle.ledger_mut().deposit(amount);
    Ok(())
}

fn players(count: usize) -> Vec<Pubkey> {
    (0..count).map(|_| Pubkey::new_unique()).collect()
}

#[test]
fn test_initializes_open_round() {
    let raffle = setup();
    let round = raffle.round();

    assert_eq!(round.phase(), RafflePhase::Open);
    assert_eq!(round.entry_fee(), FEE);
    assert_eq!(round.interval(), INTERVAL);
    assert_eq!(round.last_round_timestamp(), START);
    assert_eq!(round.pot(), 0);
    assert_eq!(round.number_of_players(), 0);
    assert_eq!(round.pending_request_id(), None);
    assert_eq!(round.recent_winner(), None);
    assert_eq!(raffle.randomness().request_confirmations, 3);
    assert_eq!(raffle.randomness().num_words, 1);
    assert!(round.check_invariants());
}

#[test]
fn test_rejects_invalid_config() {
    let config = RaffleConfig {
        interval: 0,
        ..RaffleConfig::for_cluster(Cluster::Localnet).unwrap()
    };
    let result = Raffle::new(
        Pubkey::new_unique(),
        config,
        ManualClock::new(START),
        InMemoryLedger::new(),
        MockVrfCoordinator::default(),
    );
    assert_eq!(result.err(), Some(RaffleError::InvalidConfig));
}

#[test]
fn test_entry_below_fee_is_rejected() {
    let mut raffle = setup_with(100, INTERVAL);
    let player = Pubkey::new_unique();

    for amount in [0, 1, 50, 99] {
        assert_eq!(raffle.enter(player, amount), Err(RaffleError::InsufficientFee));
    }

    assert_eq!(raffle.round().pot(), 0);
    assert!(raffle.round().players().is_empty());
    assert!(raffle.events().is_empty());
}

#[test]
fn test_records_player_and_emits_entered() {
    let mut raffle = setup();
    let player = Pubkey::new_unique();

    enter(&mut raffle, player, FEE).unwrap();

    assert_eq!(raffle.round().player(0), Some(&player));
    assert_eq!(raffle.round().player(1), None);
    assert_eq!(
        raffle.events(),
        &[RaffleEvent::Entered { player, pot: FEE }]
    );
}

#[test]
fn test_pot_tracks_entries() {
    let mut raffle = setup_with(25, INTERVAL);
    let player = Pubkey::new_unique();

    // The same player may enter repeatedly
    for count in 1..=5u64 {
        enter(&mut raffle, player, 25).unwrap();
        assert_eq!(raffle.round().pot(), 25 * count);
        assert!(raffle.round().check_invariants());
    }
    assert_eq!(raffle.round().number_of_players(), 5);
}

#[test]
fn test_overpayment_goes_to_pot() {
    let mut raffle = setup_with(10, INTERVAL);

    enter(&mut raffle, Pubkey::new_unique(), 15).unwrap();

    assert_eq!(raffle.round().pot(), 15);
    assert!(raffle.round().check_invariants());
}

#[test]
fn test_pot_overflow_is_rejected() {
    let mut raffle = setup();
    enter(&mut raffle, Pubkey::new_unique(), u64::MAX).unwrap();

    assert_eq!(
        raffle.enter(Pubkey::new_unique(), 1),
        Err(RaffleError::AmountOverflow)
    );
    assert_eq!(raffle.round().number_of_players(), 1);
    assert_eq!(raffle.round().pot(), u64::MAX);
}

#[test]
fn test_trigger_needs_players_time_and_open_round() {
    let mut raffle = setup();

    raffle.clock_mut().advance(INTERVAL + 5);
    assert_eq!(raffle.check_trigger().reason, TriggerReason::NoPlayers);

    let mut raffle = setup();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();

    raffle.clock_mut().advance(INTERVAL - 1);
    assert!(!raffle.check_trigger().ready);

    raffle.clock_mut().advance(1);
    assert!(raffle.check_trigger().ready);
    // Evaluating the trigger never changes the round
    assert!(raffle.check_trigger().ready);
    assert_eq!(raffle.round().phase(), RafflePhase::Open);

    raffle.close_and_request_randomness().unwrap();
    assert_eq!(raffle.check_trigger().reason, TriggerReason::NotOpen);
}

#[test]
fn test_close_rejected_when_not_due() {
    let mut raffle = setup();

    assert_eq!(
        raffle.close_and_request_randomness(),
        Err(RaffleError::UpkeepNotNeeded)
    );

    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL - 1);
    assert_eq!(
        raffle.close_and_request_randomness(),
        Err(RaffleError::UpkeepNotNeeded)
    );

    assert_eq!(raffle.round().phase(), RafflePhase::Open);
    assert_eq!(raffle.round().pending_request_id(), None);
}

#[test]
fn test_close_moves_to_calculating_and_emits_request_id() {
    let mut raffle = setup();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL + 1);

    let request_id = raffle.close_and_request_randomness().unwrap();

    assert!(request_id > 0);
    assert_eq!(raffle.round().phase(), RafflePhase::Calculating);
    assert_eq!(raffle.round().pending_request_id(), Some(request_id));
    assert!(raffle.oracle().is_pending(request_id));
    assert_eq!(
        raffle.events().last(),
        Some(&RaffleEvent::RoundClosed { request_id })
    );
    assert!(raffle.round().check_invariants());
}

#[test]
fn test_no_entries_or_second_close_while_calculating() {
    let mut raffle = setup();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL);
    let request_id = raffle.close_and_request_randomness().unwrap();

    assert_eq!(
        raffle.enter(Pubkey::new_unique(), FEE),
        Err(RaffleError::RoundNotOpen)
    );
    assert_eq!(
        raffle.close_and_request_randomness(),
        Err(RaffleError::RoundNotOpen)
    );

    assert_eq!(raffle.round().number_of_players(), 1);
    assert_eq!(raffle.round().pot(), FEE);
    assert_eq!(raffle.round().pending_request_id(), Some(request_id));
}

#[test]
fn test_oracle_refusal_keeps_round_open() {
    let config = RaffleConfig {
        entry_fee: FEE,
        interval: INTERVAL,
        // No subscription was created on this coordinator
        randomness: RandomnessRequest::new([1u8; 32], 77, CALLBACK_GAS_LIMIT),
    };
    let mut raffle = Raffle::new(
        Pubkey::new_unique(),
        config,
        ManualClock::new(START),
        InMemoryLedger::new(),
        MockVrfCoordinator::default(),
    )
    .unwrap();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL);

    assert_eq!(
        raffle.close_and_request_randomness(),
        Err(RaffleError::RandomnessRequestFailed)
    );
    assert_eq!(raffle.round().phase(), RafflePhase::Open);
    assert_eq!(raffle.round().pending_request_id(), None);
    assert!(raffle.check_trigger().ready);
}

#[test]
fn test_unregistered_consumer_is_refused() {
    let mut coordinator = MockVrfCoordinator::default();
    let subscription_id = coordinator.create_subscription();
    coordinator
        .fund_subscription(subscription_id, SUBSCRIPTION_FUNDING)
        .unwrap();
    // Someone else is registered, but not this raffle
    coordinator
        .add_consumer(subscription_id, Pubkey::new_unique())
        .unwrap();

    let config = RaffleConfig {
        entry_fee: FEE,
        interval: INTERVAL,
        randomness: RandomnessRequest::new([1u8; 32], subscription_id, CALLBACK_GAS_LIMIT),
    };
    let mut raffle = Raffle::new(
        Pubkey::new_unique(),
        config,
        ManualClock::new(START),
        InMemoryLedger::new(),
        coordinator,
    )
    .unwrap();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL);

    assert_eq!(
        raffle.close_and_request_randomness(),
        Err(RaffleError::RandomnessRequestFailed)
    );
    assert_eq!(raffle.round().phase(), RafflePhase::Open);

    // Registering the raffle lets the same round close
    let address = *raffle.address();
    raffle
        .oracle_mut()
        .add_consumer(subscription_id, address)
        .unwrap();
    let request_id = raffle.close_and_request_randomness().unwrap();
    assert_eq!(request_id, 1);
    assert_eq!(raffle.round().phase(), RafflePhase::Calculating);
}

#[test]
fn test_add_consumer_needs_subscription() {
    let mut coordinator = MockVrfCoordinator::default();
    assert_eq!(
        coordinator
            .add_consumer(9, Pubkey::new_unique())
            .unwrap_err()
            .to_string(),
        "invalid subscription"
    );
}

#[test]
fn test_fulfillment_needs_subscription_balance() {
    let address = Pubkey::new_unique();
    let mut coordinator = MockVrfCoordinator::default();
    let subscription_id = coordinator.create_subscription();
    coordinator.add_consumer(subscription_id, address).unwrap();
    // One lamport short of a single fulfillment
    coordinator
        .fund_subscription(
            subscription_id,
            BASE_FEE + GAS_PRICE * CALLBACK_GAS_LIMIT as u64 - 1,
        )
        .unwrap();

    let config = RaffleConfig {
        entry_fee: FEE,
        interval: INTERVAL,
        randomness: RandomnessRequest::new([1u8; 32], subscription_id, CALLBACK_GAS_LIMIT),
    };
    let mut raffle = Raffle::new(
        address,
        config,
        ManualClock::new(START),
        InMemoryLedger::new(),
        coordinator,
    )
    .unwrap();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL);
    let request_id = raffle.close_and_request_randomness().unwrap();

    assert_eq!(
        raffle
            .oracle_mut()
            .fulfill_random_words(request_id)
            .unwrap_err()
            .to_string(),
        "insufficient subscription balance"
    );
    assert!(raffle.oracle().is_pending(request_id));
}

#[test]
fn test_select_winner_is_deterministic() {
    let mut raffle = setup();
    let entrants = players(3);
    for player in &entrants {
        enter(&mut raffle, *player, FEE).unwrap();
    }

    for _ in 0..3 {
        assert_eq!(raffle.round().select_winner(7), Some(entrants[1]));
    }
    assert_eq!(raffle.round().select_winner(0), Some(entrants[0]));
    assert_eq!(raffle.round().select_winner(u64::MAX), Some(entrants[0]));
}

#[test]
fn test_select_winner_empty_round() {
    let raffle = setup();
    assert_eq!(raffle.round().select_winner(7), None);
}

#[test]
fn test_mismatched_fulfillment_is_ignored() {
    let mut raffle = setup();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL);
    let request_id = raffle.close_and_request_randomness().unwrap();
    let before = raffle.round().clone();
    let events_before = raffle.events().len();

    assert_eq!(raffle.on_randomness_fulfilled(request_id + 1, 4), Ok(None));

    assert_eq!(raffle.round(), &before);
    assert_eq!(raffle.events().len(), events_before);
    assert!(raffle.ledger().transfers().is_empty());
}

#[test]
fn test_fulfillment_while_open_is_ignored() {
    let mut raffle = setup();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    let before = raffle.round().clone();

    assert_eq!(raffle.on_randomness_fulfilled(1, 4), Ok(None));
    assert_eq!(raffle.round(), &before);
}

#[test]
fn test_round_reset_end_to_end() {
    let mut raffle = setup();
    let entrants = players(3);
    for player in &entrants {
        enter(&mut raffle, *player, FEE).unwrap();
    }
    assert_eq!(raffle.round().pot(), 3);

    raffle.clock_mut().advance(INTERVAL);
    assert!(raffle.check_trigger().ready);

    let request_id = raffle.close_and_request_randomness().unwrap();
    assert_eq!(raffle.round().phase(), RafflePhase::Calculating);

    let words = raffle
        .oracle_mut()
        .fulfill_random_words_with_override(request_id, vec![4])
        .unwrap();
    raffle.clock_mut().advance(3);
    let winner = raffle.on_randomness_fulfilled(request_id, words[0]).unwrap();

    assert_eq!(winner, Some(entrants[1]));
    assert_eq!(raffle.ledger().transfers(), &[(entrants[1], 3)]);
    assert_eq!(raffle.ledger().balance_of(&entrants[1]), 3);
    assert_eq!(raffle.ledger().vault_balance(), 0);

    let round = raffle.round();
    assert_eq!(round.phase(), RafflePhase::Open);
    assert!(round.players().is_empty());
    assert_eq!(round.pot(), 0);
    assert_eq!(round.recent_winner(), Some(entrants[1]));
    assert_eq!(round.pending_request_id(), None);
    assert_eq!(round.last_round_timestamp(), START + INTERVAL + 3);
    assert!(round.check_invariants());
    assert_eq!(
        raffle.events().last(),
        Some(&RaffleEvent::WinnerPicked {
            winner: entrants[1],
            payout: 3
        })
    );
}

#[test]
fn test_duplicate_fulfillment_after_settle_is_noop() {
    let mut raffle = setup();
    let entrants = players(2);
    for player in &entrants {
        enter(&mut raffle, *player, FEE).unwrap();
    }
    raffle.clock_mut().advance(INTERVAL);
    let request_id = raffle.close_and_request_randomness().unwrap();
    raffle.on_randomness_fulfilled(request_id, 1).unwrap();

    // Next round already has an entry when the replay arrives
    enter(&mut raffle, entrants[0], FEE).unwrap();
    let before = raffle.round().clone();

    assert_eq!(raffle.on_randomness_fulfilled(request_id, 1), Ok(None));
    assert_eq!(raffle.round(), &before);
    assert_eq!(raffle.ledger().transfers().len(), 1);
}

#[test]
fn test_next_round_uses_new_request_id() {
    let mut raffle = setup();

    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL);
    let first = raffle.close_and_request_randomness().unwrap();
    let words = raffle.oracle_mut().fulfill_random_words(first).unwrap();
    raffle.on_randomness_fulfilled(first, words[0]).unwrap();

    // The interval restarts from the settlement time
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    assert!(!raffle.check_trigger().ready);
    raffle.clock_mut().advance(INTERVAL);
    let second = raffle.close_and_request_randomness().unwrap();

    assert_ne!(first, second);
    assert_eq!(raffle.on_randomness_fulfilled(first, 0), Ok(None));
    assert_eq!(raffle.round().pending_request_id(), Some(second));
}

#[test]
fn test_transfer_failure_freezes_round() {
    let mut raffle = setup();
    let entrants = players(3);
    for player in &entrants {
        enter(&mut raffle, *player, FEE).unwrap();
    }
    raffle.clock_mut().advance(INTERVAL);
    let request_id = raffle.close_and_request_randomness().unwrap();
    raffle.ledger_mut().set_reject_transfers(true);

    assert_eq!(
        raffle.on_randomness_fulfilled(request_id, 4),
        Err(RaffleError::TransferFailed)
    );

    let round = raffle.round();
    assert_eq!(round.phase(), RafflePhase::Calculating);
    assert_eq!(round.pending_request_id(), None);
    assert!(round.is_frozen());
    assert_eq!(round.pot(), 3);
    assert_eq!(round.players(), entrants.as_slice());
    assert_eq!(round.recent_winner(), None);
    assert_eq!(raffle.ledger().vault_balance(), 3);
    assert_eq!(
        raffle.events().last(),
        Some(&RaffleEvent::SettlementFailed {
            winner: entrants[1],
            amount: 3
        })
    );

    // Replays cannot retry the payout, and the round stays closed
    raffle.ledger_mut().set_reject_transfers(false);
    assert_eq!(raffle.on_randomness_fulfilled(request_id, 4), Ok(None));
    assert_eq!(
        raffle.enter(Pubkey::new_unique(), FEE),
        Err(RaffleError::RoundNotOpen)
    );
    assert_eq!(
        raffle.close_and_request_randomness(),
        Err(RaffleError::RoundNotOpen)
    );
    assert!(raffle.ledger().transfers().is_empty());
}

#[test]
fn test_drain_events() {
    let mut raffle = setup();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();

    let drained = raffle.drain_events();
    assert_eq!(drained.len(), 2);
    assert!(raffle.events().is_empty());
}

#[test]
fn test_mock_coordinator_rejects_unknown_requests() {
    let mut raffle = setup();

    assert_eq!(
        raffle.oracle_mut().fulfill_random_words(0).unwrap_err().to_string(),
        "nonexistent request"
    );
    assert!(raffle.oracle_mut().fulfill_random_words(1).is_err());

    enter(&mut raffle, Pubkey::new_unique(), FEE).unwrap();
    raffle.clock_mut().advance(INTERVAL);
    let request_id = raffle.close_and_request_randomness().unwrap();
    let subscription_id = raffle.randomness().subscription_id;
    let balance_before = raffle.oracle().subscription_balance(subscription_id).unwrap();

    let words = raffle.oracle_mut().fulfill_random_words(request_id).unwrap();
    assert_eq!(words.len(), 1);
    assert!(!raffle.oracle().is_pending(request_id));
    assert_eq!(
        raffle.oracle().subscription_balance(subscription_id),
        Some(balance_before - BASE_FEE - GAS_PRICE * CALLBACK_GAS_LIMIT as u64)
    );

    // A request is answered once
    assert!(raffle.oracle_mut().fulfill_random_words(request_id).is_err());
}

#[test]
fn test_invariants_hold_across_rounds() {
    let mut raffle = setup_with(5, INTERVAL);

    for round in 0..4u64 {
        let entrants = players(round as usize + 1);
        for player in &entrants {
            enter(&mut raffle, *player, 5).unwrap();
            assert!(raffle.round().check_invariants());
        }
        raffle.clock_mut().advance(INTERVAL);
        let request_id = raffle.close_and_request_randomness().unwrap();
        assert!(raffle.round().check_invariants());

        let words = raffle.oracle_mut().fulfill_random_words(request_id).unwrap();
        let winner = raffle
            .on_randomness_fulfilled(request_id, words[0])
            .unwrap()
            .unwrap();
        assert!(entrants.contains(&winner));
        assert!(raffle.round().check_invariants());
    }

    assert_eq!(raffle.ledger().vault_balance(), 0);
    let paid: u64 = raffle.ledger().transfers().iter().map(|(_, amount)| amount).sum();
    assert_eq!(paid, 5 * (1 + 2 + 3 + 4));
}
