//! Integration tests for building the bracket when a tournament starts.

mod common;

use common::Fixture;
use std::collections::{BTreeMap, HashMap};
use tournament_bracket::{
    create_tournament, get_bracket, start_tournament, BracketError, Caller, MemoryStore,
    TournamentState,
};

#[tokio::test]
async fn bracket_has_n_minus_one_matches_over_log2_n_stages() {
    for players in [2usize, 4, 8, 16] {
        let (fx, _) = Fixture::with_players(players).await;
        start_tournament(&fx.store, fx.tournament_id).await.unwrap();

        let bracket = get_bracket(&fx.store, fx.tournament_id).await.unwrap();
        assert_eq!(bracket.matches.len(), players - 1);

        let mut per_stage: BTreeMap<u32, usize> = BTreeMap::new();
        for m in &bracket.matches {
            *per_stage.entry(m.tournament_round_text.parse().unwrap()).or_default() += 1;
        }
        let expected: BTreeMap<u32, usize> = (1..=players.trailing_zeros())
            .map(|level| (level, players >> level))
            .collect();
        assert_eq!(per_stage, expected, "{players} players");
    }
}

#[tokio::test]
async fn every_feeder_has_exactly_one_sibling() {
    let (fx, _) = Fixture::with_players(8).await;
    start_tournament(&fx.store, fx.tournament_id).await.unwrap();
    let bracket = get_bracket(&fx.store, fx.tournament_id).await.unwrap();

    let finals: Vec<_> = bracket.matches.iter().filter(|m| m.next_match_id.is_none()).collect();
    assert_eq!(finals.len(), 1);
    assert!(finals[0].participants.iter().all(|p| p.id.is_none()));

    let mut feeders: HashMap<i32, usize> = HashMap::new();
    for next in bracket.matches.iter().filter_map(|m| m.next_match_id) {
        *feeders.entry(next).or_default() += 1;
    }
    assert_eq!(feeders.len(), 3);
    assert!(feeders.values().all(|&count| count == 2));
    for next in feeders.keys() {
        assert!(bracket.find(*next).is_some());
    }
}

#[tokio::test]
async fn four_players_seed_by_registration_order() {
    let (fx, ids) = Fixture::with_players(4).await;
    start_tournament(&fx.store, fx.tournament_id).await.unwrap();
    let bracket = get_bracket(&fx.store, fx.tournament_id).await.unwrap();

    let names: Vec<&str> = bracket.matches.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Match 1", "Match 2", "Match 3"]);

    let seats = |i: usize| -> Vec<Option<i32>> {
        bracket.matches[i].participants.iter().map(|p| p.id).collect()
    };
    assert_eq!(seats(0), vec![Some(ids[0]), Some(ids[1])]);
    assert_eq!(seats(1), vec![Some(ids[2]), Some(ids[3])]);
    assert_eq!(seats(2), vec![None, None]);

    let final_id = bracket.matches[2].id;
    assert_eq!(bracket.matches[0].next_match_id, Some(final_id));
    assert_eq!(bracket.matches[1].next_match_id, Some(final_id));
    assert_eq!(bracket.matches[2].next_match_id, None);
}

#[tokio::test]
async fn rejects_counts_that_are_not_a_power_of_two() {
    let (fx, _) = Fixture::with_players(3).await;
    assert!(matches!(
        start_tournament(&fx.store, fx.tournament_id).await,
        Err(BracketError::ParticipantCountNotPowerOfTwo(3))
    ));

    let (fx, _) = Fixture::with_players(6).await;
    assert!(matches!(
        start_tournament(&fx.store, fx.tournament_id).await,
        Err(BracketError::ParticipantCountNotPowerOfTwo(6))
    ));
    // Nothing was written.
    let bracket = get_bracket(&fx.store, fx.tournament_id).await.unwrap();
    assert!(bracket.matches.is_empty());
}

#[tokio::test]
async fn rejects_fewer_than_two_participants() {
    let (fx, _) = Fixture::with_players(1).await;
    assert!(matches!(
        start_tournament(&fx.store, fx.tournament_id).await,
        Err(BracketError::NotEnoughParticipants(1))
    ));
    let (fx, _) = Fixture::with_players(0).await;
    assert!(matches!(
        start_tournament(&fx.store, fx.tournament_id).await,
        Err(BracketError::NotEnoughParticipants(0))
    ));
}

#[tokio::test]
async fn second_start_is_rejected() {
    let (fx, _) = Fixture::with_players(4).await;
    start_tournament(&fx.store, fx.tournament_id).await.unwrap();
    let err = start_tournament(&fx.store, fx.tournament_id).await.unwrap_err();
    assert!(matches!(err, BracketError::AlreadyStarted(_)));

    let bracket = get_bracket(&fx.store, fx.tournament_id).await.unwrap();
    assert_eq!(bracket.matches.len(), 3);
}

#[tokio::test]
async fn concurrent_starts_build_one_bracket() {
    let (fx, _) = Fixture::with_players(4).await;
    let (a, b) = tokio::join!(
        start_tournament(&fx.store, fx.tournament_id),
        start_tournament(&fx.store, fx.tournament_id)
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(BracketError::AlreadyStarted(_)))));

    let bracket = get_bracket(&fx.store, fx.tournament_id).await.unwrap();
    assert_eq!(bracket.matches.len(), 3);
}

#[tokio::test]
async fn pending_tournament_cannot_start() {
    let store = MemoryStore::new();
    let manager = Caller::user(store.add_user("Mia", "Manager").await);
    let t = create_tournament(&store, Some(&manager), &common::person_details(4))
        .await
        .unwrap();
    assert!(matches!(
        start_tournament(&store, t.id).await,
        Err(BracketError::InvalidState {
            expected: TournamentState::Accepted,
            actual: TournamentState::Pending
        })
    ));
}

#[tokio::test]
async fn unknown_tournament_is_not_found() {
    let store = MemoryStore::new();
    assert!(matches!(
        start_tournament(&store, 404).await,
        Err(BracketError::TournamentNotFound(404))
    ));
}
