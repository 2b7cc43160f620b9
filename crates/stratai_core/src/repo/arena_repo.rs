//! Arena battle persistence as serialized reducer state.

use crate::model::arena::{ArenaState, BattleId};
use crate::model::user::UserId;
use crate::repo::{RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension};

pub trait ArenaRepository {
    fn create_battle(&self, user_id: UserId, state: &ArenaState) -> RepoResult<()>;
    /// Loads a battle owned by `user_id`.
    fn get_battle(&self, id: BattleId, user_id: UserId) -> RepoResult<Option<ArenaState>>;
    fn save_battle(&self, user_id: UserId, state: &ArenaState) -> RepoResult<()>;
}

impl ArenaRepository for SqliteStore<'_> {
    fn create_battle(&self, user_id: UserId, state: &ArenaState) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO arena_battles (id, user_id, state_json) VALUES (?1, ?2, ?3);",
            params![
                state.id.to_string(),
                user_id.to_string(),
                encode_state(state)?,
            ],
        )?;
        Ok(())
    }

    fn get_battle(&self, id: BattleId, user_id: UserId) -> RepoResult<Option<ArenaState>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT state_json FROM arena_battles WHERE id = ?1 AND user_id = ?2;",
                params![id.to_string(), user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|value| {
            serde_json::from_str::<ArenaState>(&value).map_err(|err| {
                RepoError::InvalidData(format!("invalid arena_battles.state_json for {id}: {err}"))
            })
        })
        .transpose()
    }

    fn save_battle(&self, user_id: UserId, state: &ArenaState) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE arena_battles
             SET state_json = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND user_id = ?2;",
            params![
                state.id.to_string(),
                user_id.to_string(),
                encode_state(state)?,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "arena battle",
                id: state.id,
            });
        }
        Ok(())
    }
}

fn encode_state(state: &ArenaState) -> RepoResult<String> {
    serde_json::to_string(state)
        .map_err(|err| RepoError::InvalidData(format!("unserializable arena state: {err}")))
}
