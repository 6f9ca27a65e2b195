//! Shared fixtures: tournaments with accepted players in an in-memory store.

#![allow(dead_code)]

use tournament_bracket::{
    change_state, create_tournament, request_participation, resolve_participant, Caller,
    Decision, EntrantRefs, MemoryStore, ParticipantId, TournamentDetails, TournamentId,
    TournamentKind, TournamentState,
};

pub fn person_details(capacity: i32) -> TournamentDetails {
    TournamentDetails {
        name: "Autumn Open".to_string(),
        discipline: "Table tennis".to_string(),
        capacity,
        kind: TournamentKind::Person,
        prize: 100,
        min_team_size: None,
        max_team_size: None,
    }
}

/// Smallest valid capacity that fits `players`.
pub fn capacity_for(players: usize) -> i32 {
    players.max(2).next_power_of_two() as i32
}

pub struct Fixture {
    pub store: MemoryStore,
    pub manager: Caller,
    pub tournament_id: TournamentId,
}

impl Fixture {
    /// An `Accepted` tournament without participants.
    pub async fn accepted(capacity: i32) -> Self {
        let store = MemoryStore::new();
        let manager = Caller::user(store.add_user("Mia", "Manager").await);
        let tournament = create_tournament(&store, Some(&manager), &person_details(capacity))
            .await
            .unwrap();
        change_state(&store, Some(&manager), tournament.id, TournamentState::Accepted)
            .await
            .unwrap();
        Fixture {
            store,
            manager,
            tournament_id: tournament.id,
        }
    }

    /// An `Accepted` tournament with `players` accepted participants, returned in
    /// registration order (which is ascending id order).
    pub async fn with_players(players: usize) -> (Self, Vec<ParticipantId>) {
        let fixture = Self::accepted(capacity_for(players)).await;
        let mut ids = Vec::with_capacity(players);
        for n in 1..=players {
            let id = fixture.enter(&format!("Player{n}")).await;
            ids.push(id);
        }
        (fixture, ids)
    }

    /// Register a new player and accept them.
    pub async fn enter(&self, given_name: &str) -> ParticipantId {
        let user = Caller::user(self.store.add_user(given_name, "Doe").await);
        let refs = EntrantRefs {
            team_id: None,
            player_id: Some(user.id),
        };
        let participant = request_participation(&self.store, Some(&user), self.tournament_id, refs)
            .await
            .unwrap();
        resolve_participant(
            &self.store,
            Some(&self.manager),
            self.tournament_id,
            participant.id,
            Decision::Accept,
        )
        .await
        .unwrap();
        participant.id
    }
}
