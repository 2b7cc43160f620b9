use rusqlite::Connection;
use stratai_core::db::open_db_in_memory;
use stratai_core::model::arena::{ArenaAction, BattleStatus, ResponseStatus, VoteOutcome};
use stratai_core::model::area::NewArea;
use stratai_core::repo::user_repo::UserRepository;
use stratai_core::{ArenaService, AreaService, ServiceError, SpaceService, SqliteStore};
use uuid::Uuid;

fn store(conn: &Connection) -> SqliteStore<'_> {
    SqliteStore::try_new(conn).unwrap()
}

fn models() -> Vec<String> {
    vec!["gpt-4o".to_string(), "claude-sonnet".to_string()]
}

fn completed(model: &str) -> ArenaAction {
    ArenaAction::ResponseCompleted {
        model: model.to_string(),
        content: format!("answer from {model}"),
    }
}

#[test]
fn battle_state_survives_reload() {
    let conn = open_db_in_memory().unwrap();
    let user = store(&conn).create_user("u@example.com", "U").unwrap();
    let arena = ArenaService::new(store(&conn));

    let battle = arena
        .start_battle(user.id, "  Compare sorting algorithms ", &models())
        .unwrap();
    assert_eq!(battle.prompt, "Compare sorting algorithms");
    assert_eq!(battle.status, BattleStatus::Streaming);

    arena
        .apply_action(
            user.id,
            battle.id,
            &ArenaAction::ResponseStarted {
                model: "gpt-4o".to_string(),
            },
        )
        .unwrap();
    arena.apply_action(user.id, battle.id, &completed("gpt-4o")).unwrap();
    arena
        .apply_action(
            user.id,
            battle.id,
            &ArenaAction::ResponseFailed {
                model: "claude-sonnet".to_string(),
                error: "rate limited".to_string(),
            },
        )
        .unwrap();

    let reloaded = ArenaService::new(store(&conn))
        .get_battle(user.id, battle.id)
        .unwrap();
    assert_eq!(reloaded.status, BattleStatus::Completed);
    assert_eq!(reloaded.responses[0].status, ResponseStatus::Done);
    assert_eq!(reloaded.responses[1].status, ResponseStatus::Failed);
    assert_eq!(reloaded.responses[1].error.as_deref(), Some("rate limited"));
}

#[test]
fn rejected_action_leaves_stored_state_untouched() {
    let conn = open_db_in_memory().unwrap();
    let user = store(&conn).create_user("u@example.com", "U").unwrap();
    let arena = ArenaService::new(store(&conn));
    let battle = arena.start_battle(user.id, "prompt", &models()).unwrap();

    let vote = ArenaAction::Vote {
        outcome: VoteOutcome::Tie,
    };
    assert!(matches!(
        arena.apply_action(user.id, battle.id, &vote),
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(arena.get_battle(user.id, battle.id).unwrap(), battle);
}

#[test]
fn battles_are_private_to_their_user() {
    let conn = open_db_in_memory().unwrap();
    let user = store(&conn).create_user("u@example.com", "U").unwrap();
    let other = store(&conn).create_user("o@example.com", "O").unwrap();
    let arena = ArenaService::new(store(&conn));
    let battle = arena.start_battle(user.id, "prompt", &models()).unwrap();

    assert!(matches!(
        arena.get_battle(other.id, battle.id),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        arena.apply_action(other.id, battle.id, &completed("gpt-4o")),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn invalid_model_lists_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let user = store(&conn).create_user("u@example.com", "U").unwrap();
    let arena = ArenaService::new(store(&conn));

    for models in [
        vec!["solo".to_string()],
        vec!["a".to_string(), "a".to_string()],
        vec!["  ".to_string(), "gpt-4o".to_string()],
        (0..5).map(|index| format!("m{index}")).collect(),
    ] {
        assert!(matches!(
            arena.start_battle(user.id, "prompt", &models),
            Err(ServiceError::Validation(_))
        ));
    }
}

#[test]
fn continue_in_space_requires_an_accessible_area() {
    let conn = open_db_in_memory().unwrap();
    let owner = store(&conn).create_user("owner@example.com", "Owner").unwrap();
    let player = store(&conn).create_user("p@example.com", "Player").unwrap();
    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    SpaceService::new(store(&conn))
        .add_space_member(owner.id, space.id, player.id, "member")
        .unwrap();
    let board = AreaService::new(store(&conn))
        .create_area(
            owner.id,
            space.id,
            &NewArea {
                name: "Board".to_string(),
                is_restricted: true,
                ..NewArea::default()
            },
        )
        .unwrap();

    let arena = ArenaService::new(store(&conn));
    let battle = arena.start_battle(player.id, "prompt", &models()).unwrap();
    for model in models() {
        arena.apply_action(player.id, battle.id, &completed(&model)).unwrap();
    }
    arena
        .apply_action(
            player.id,
            battle.id,
            &ArenaAction::Vote {
                outcome: VoteOutcome::Winner {
                    model: "claude-sonnet".to_string(),
                },
            },
        )
        .unwrap();

    let to = |space_id: Uuid, area_id: Uuid| ArenaAction::ContinueInSpace { space_id, area_id };
    assert!(matches!(
        arena.apply_action(player.id, battle.id, &to(space.id, board.id)),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        arena.apply_action(player.id, battle.id, &to(Uuid::new_v4(), general.id)),
        Err(ServiceError::NotFound { .. })
    ));

    let continued = arena
        .apply_action(player.id, battle.id, &to(space.id, general.id))
        .unwrap();
    assert_eq!(continued.status, BattleStatus::Continued);
    assert_eq!(continued.winning_model(), Some("claude-sonnet"));
    assert_eq!(continued.continued_in.unwrap().area_id, general.id);
}
