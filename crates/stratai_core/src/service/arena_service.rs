//! Arena battle lifecycle.
//!
//! Battles are private to the user who started them. Every change goes
//! through [`ArenaState::reduce`]; this service loads, reduces and saves.

use crate::model::arena::{ArenaAction, ArenaState, BattleId};
use crate::model::user::UserId;
use crate::repo::area_repo::AreaRepository;
use crate::repo::arena_repo::ArenaRepository;
use crate::repo::member_repo::MemberRepository;
use crate::repo::space_repo::SpaceRepository;
use crate::service::access::visible_area;
use crate::service::{ServiceError, ServiceResult};
use log::info;
use uuid::Uuid;

pub struct ArenaService<R>
where
    R: ArenaRepository + AreaRepository + SpaceRepository + MemberRepository,
{
    repo: R,
}

impl<R> ArenaService<R>
where
    R: ArenaRepository + AreaRepository + SpaceRepository + MemberRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn start_battle(
        &self,
        actor: UserId,
        prompt: &str,
        models: &[String],
    ) -> ServiceResult<ArenaState> {
        let state = ArenaState::new(Uuid::new_v4(), prompt, models)?;
        self.repo.create_battle(actor, &state)?;
        info!(
            "event=arena_start module=service status=ok battle_id={} models={}",
            state.id,
            state.responses.len()
        );
        Ok(state)
    }

    pub fn get_battle(&self, actor: UserId, battle_id: BattleId) -> ServiceResult<ArenaState> {
        self.repo
            .get_battle(battle_id, actor)?
            .ok_or(ServiceError::not_found("battle", battle_id))
    }

    /// Reduces one action into the stored battle and persists the result.
    pub fn apply_action(
        &self,
        actor: UserId,
        battle_id: BattleId,
        action: &ArenaAction,
    ) -> ServiceResult<ArenaState> {
        let current = self.get_battle(actor, battle_id)?;

        if let ArenaAction::ContinueInSpace { space_id, area_id } = action {
            let (area, _) = visible_area(&self.repo, *area_id, actor)?;
            if area.space_id != *space_id {
                return Err(ServiceError::not_found("area", *area_id));
            }
        }

        let next = current.reduce(action)?;
        self.repo.save_battle(actor, &next)?;
        info!(
            "event=arena_action module=service status=ok battle_id={} action={} battle_status={:?}",
            battle_id,
            action.name(),
            next.status
        );
        Ok(next)
    }
}
