//! PostgreSQL store. Schema lives in `migrations/`.

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::models::{
    ApprovalState, Entrant, Match, MatchId, MatchUpdate, Participant, ParticipantId, Slot,
    StageId, StagedMatch, Tournament, TournamentDetails, TournamentId, TournamentState, UserId,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;

const TOURNAMENT_COLUMNS: &str = "id, name, discipline, expected_members, type, manager_id, \
     prize, min_team_limit, max_team_limit, state";

const MATCH_COLUMNS: &str = "m.id, m.stage_id, m.next_match_id, m.name, \
     m.first_participant_id, m.first_participant_result_text, m.first_participant_is_winner, \
     m.second_participant_id, m.second_participant_result_text, m.second_participant_is_winner, \
     m.\"date\"";

/// Store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

fn parse_column<T: std::str::FromStr<Err = String>>(row: &PgRow, column: &str) -> StoreResult<T> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(StoreError::Corrupt)
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    Ok(Tournament {
        id: row.try_get("id")?,
        manager_id: row.try_get("manager_id")?,
        state: parse_column(row, "state")?,
        details: TournamentDetails {
            name: row.try_get("name")?,
            discipline: row.try_get("discipline")?,
            capacity: row.try_get("expected_members")?,
            kind: parse_column(row, "type")?,
            prize: row.try_get("prize")?,
            min_team_size: row.try_get("min_team_limit")?,
            max_team_size: row.try_get("max_team_limit")?,
        },
    })
}

fn participant_from_row(row: &PgRow) -> StoreResult<Participant> {
    let id: ParticipantId = row.try_get("id")?;
    let team_id: Option<i32> = row.try_get("team_id")?;
    let player_id: Option<i32> = row.try_get("player_id")?;
    let entrant = match (team_id, player_id) {
        (Some(team), None) => Entrant::Team(team),
        (None, Some(player)) => Entrant::Player(player),
        _ => {
            return Err(StoreError::Corrupt(format!(
                "participant {id} must reference exactly one of team or player"
            )))
        }
    };
    Ok(Participant {
        id,
        tournament_id: row.try_get("tournament_id")?,
        entrant,
        state: parse_column(row, "state")?,
    })
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    Ok(Match {
        id: row.try_get("id")?,
        stage_id: row.try_get("stage_id")?,
        name: row.try_get("name")?,
        next_match_id: row.try_get("next_match_id")?,
        first: Slot {
            participant_id: row.try_get("first_participant_id")?,
            result_text: row.try_get("first_participant_result_text")?,
            is_winner: row.try_get("first_participant_is_winner")?,
        },
        second: Slot {
            participant_id: row.try_get("second_participant_id")?,
            result_text: row.try_get("second_participant_result_text")?,
            is_winner: row.try_get("second_participant_is_winner")?,
        },
        date: row.try_get("date")?,
    })
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_tournament(
        &mut self,
        manager_id: UserId,
        details: &TournamentDetails,
    ) -> StoreResult<Tournament> {
        let sql = format!(
            "INSERT INTO tournament (name, discipline, expected_members, type, manager_id, prize, \
             min_team_limit, max_team_limit) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {TOURNAMENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&details.name)
            .bind(&details.discipline)
            .bind(details.capacity)
            .bind(details.kind.as_str())
            .bind(manager_id)
            .bind(details.prize)
            .bind(details.min_team_size)
            .bind(details.max_team_size)
            .fetch_one(&mut *self.tx)
            .await?;
        tournament_from_row(&row)
    }

    async fn tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournament WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournament WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn update_tournament(
        &mut self,
        id: TournamentId,
        details: &TournamentDetails,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE tournament SET name = $1, discipline = $2, expected_members = $3, type = $4, \
             prize = $5, min_team_limit = $6, max_team_limit = $7 WHERE id = $8",
        )
        .bind(&details.name)
        .bind(&details.discipline)
        .bind(details.capacity)
        .bind(details.kind.as_str())
        .bind(details.prize)
        .bind(details.min_team_size)
        .bind(details.max_team_size)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_tournament_state(
        &mut self,
        id: TournamentId,
        state: TournamentState,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE tournament SET state = $1 WHERE id = $2")
            .bind(state.as_str())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_tournament(&mut self, id: TournamentId) -> StoreResult<()> {
        sqlx::query("DELETE FROM tournament WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn participants(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT id, tournament_id, team_id, player_id, state FROM tournament_participant \
             WHERE tournament_id = $1 ORDER BY id",
        )
        .bind(tournament_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(participant_from_row).collect()
    }

    async fn insert_participant(
        &mut self,
        tournament_id: TournamentId,
        entrant: Entrant,
    ) -> StoreResult<Participant> {
        let row = sqlx::query(
            "INSERT INTO tournament_participant (tournament_id, team_id, player_id) \
             VALUES ($1, $2, $3) RETURNING id, tournament_id, team_id, player_id, state",
        )
        .bind(tournament_id)
        .bind(entrant.team_id())
        .bind(entrant.player_id())
        .fetch_one(&mut *self.tx)
        .await?;
        participant_from_row(&row)
    }

    async fn set_participant_state(
        &mut self,
        id: ParticipantId,
        state: ApprovalState,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE tournament_participant SET state = $1 WHERE id = $2")
            .bind(state.as_str())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn participant_names(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<HashMap<ParticipantId, String>> {
        let rows = sqlx::query(
            "SELECT tp.id, COALESCE(t.name, u.name || ' ' || u.surname) AS name \
             FROM tournament_participant tp \
             LEFT JOIN team t ON t.id = tp.team_id \
             LEFT JOIN app_user u ON u.id = tp.player_id \
             WHERE tp.tournament_id = $1",
        )
        .bind(tournament_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut names = HashMap::with_capacity(rows.len());
        for row in &rows {
            let name: Option<String> = row.try_get("name")?;
            if let Some(name) = name {
                names.insert(row.try_get("id")?, name);
            }
        }
        Ok(names)
    }

    async fn has_stages(&mut self, tournament_id: TournamentId) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM stage WHERE tournament_id = $1)")
            .bind(tournament_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn insert_stage(
        &mut self,
        tournament_id: TournamentId,
        level: i32,
    ) -> StoreResult<StageId> {
        let row = sqlx::query("INSERT INTO stage (tournament_id, level) VALUES ($1, $2) RETURNING id")
            .bind(tournament_id)
            .bind(level)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get("id")?)
    }

    async fn insert_match(
        &mut self,
        stage_id: StageId,
        name: &str,
        first: Option<ParticipantId>,
        second: Option<ParticipantId>,
    ) -> StoreResult<MatchId> {
        let row = sqlx::query(
            "INSERT INTO bracket_match (stage_id, name, first_participant_id, second_participant_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(stage_id)
        .bind(name)
        .bind(first)
        .bind(second)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.try_get("id")?)
    }

    async fn link_next_match(&mut self, feeders: &[MatchId], next: MatchId) -> StoreResult<()> {
        sqlx::query("UPDATE bracket_match SET next_match_id = $1 WHERE id = ANY($2)")
            .bind(next)
            .bind(feeders)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn bracket_matches(
        &mut self,
        tournament_id: TournamentId,
    ) -> StoreResult<Vec<StagedMatch>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS}, s.level FROM bracket_match m \
             INNER JOIN stage s ON s.id = m.stage_id \
             WHERE s.tournament_id = $1 ORDER BY s.id, m.id"
        );
        let rows = sqlx::query(&sql)
            .bind(tournament_id)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(StagedMatch {
                    level: row.try_get("level")?,
                    game: match_from_row(row)?,
                })
            })
            .collect()
    }

    async fn find_match(
        &mut self,
        tournament_id: TournamentId,
        id: MatchId,
    ) -> StoreResult<Option<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM bracket_match m \
             INNER JOIN stage s ON s.id = m.stage_id \
             WHERE m.id = $1 AND s.tournament_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(tournament_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn update_match(
        &mut self,
        tournament_id: TournamentId,
        update: &MatchUpdate,
    ) -> StoreResult<Option<Match>> {
        let sql = format!(
            "UPDATE bracket_match m SET name = $1, \"date\" = $2, \
             first_participant_id = $3, first_participant_result_text = $4, \
             first_participant_is_winner = $5, second_participant_id = $6, \
             second_participant_result_text = $7, second_participant_is_winner = $8 \
             WHERE m.id = $9 AND m.stage_id IN (SELECT id FROM stage WHERE tournament_id = $10) \
             RETURNING {MATCH_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&update.name)
            .bind(update.date)
            .bind(update.first.participant_id)
            .bind(&update.first.result_text)
            .bind(update.first.is_winner)
            .bind(update.second.participant_id)
            .bind(&update.second.result_text)
            .bind(update.second.is_winner)
            .bind(update.id)
            .bind(tournament_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn sibling_feeder(
        &mut self,
        next: MatchId,
        exclude: MatchId,
    ) -> StoreResult<Option<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM bracket_match m \
             WHERE m.next_match_id = $1 AND m.id <> $2 ORDER BY m.id LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(next)
            .bind(exclude)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn seat_participants(
        &mut self,
        id: MatchId,
        first: ParticipantId,
        second: ParticipantId,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE bracket_match SET first_participant_id = $1, second_participant_id = $2 \
             WHERE id = $3",
        )
        .bind(first)
        .bind(second)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
