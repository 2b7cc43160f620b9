use rusqlite::Connection;
use stratai_core::db::open_db_in_memory;
use stratai_core::model::area::{Area, NewArea};
use stratai_core::model::member::{MemberTarget, Role};
use stratai_core::model::space::Space;
use stratai_core::model::user::User;
use stratai_core::repo::user_repo::UserRepository;
use stratai_core::service::access::effective_area_role;
use stratai_core::{
    AreaService, MemberService, RepoError, ServiceError, SpaceService, SqliteStore,
};

fn store(conn: &Connection) -> SqliteStore<'_> {
    SqliteStore::try_new(conn).unwrap()
}

struct Fixture {
    conn: Connection,
    owner: User,
    mate: User,
    space: Space,
    general: Area,
}

impl Fixture {
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        let owner = store(&conn)
            .create_user("owner@example.com", "Olivia Owner")
            .unwrap();
        let mate = store(&conn)
            .create_user("mate@example.com", "Marco Mate")
            .unwrap();
        let (space, general) = SpaceService::new(store(&conn))
            .create_space(owner.id, "Work")
            .unwrap();
        SpaceService::new(store(&conn))
            .add_space_member(owner.id, space.id, mate.id, "member")
            .unwrap();
        Self {
            conn,
            owner,
            mate,
            space,
            general,
        }
    }

    fn restricted_area(&self, name: &str) -> Area {
        AreaService::new(store(&self.conn))
            .create_area(
                self.owner.id,
                self.space.id,
                &NewArea {
                    name: name.to_string(),
                    is_restricted: true,
                    ..NewArea::default()
                },
            )
            .unwrap()
    }

    fn members(&self) -> MemberService<SqliteStore<'_>> {
        MemberService::new(store(&self.conn))
    }

    fn role_of(&self, area: &Area, user: &User) -> Option<Role> {
        effective_area_role(&store(&self.conn), area, user.id).unwrap()
    }
}

#[test]
fn space_owner_owns_every_area_and_members_get_a_floor_on_open_ones() {
    let fx = Fixture::new();
    let board = fx.restricted_area("Board");

    assert_eq!(fx.role_of(&fx.general, &fx.owner), Some(Role::Owner));
    assert_eq!(fx.role_of(&board, &fx.owner), Some(Role::Owner));
    assert_eq!(fx.role_of(&fx.general, &fx.mate), Some(Role::Member));
    assert_eq!(fx.role_of(&board, &fx.mate), None);
}

#[test]
fn explicit_grant_opens_a_restricted_area() {
    let fx = Fixture::new();
    let board = fx.restricted_area("Board");

    fx.members()
        .add_member(fx.owner.id, board.id, MemberTarget::User(fx.mate.id), "viewer")
        .unwrap();
    assert_eq!(fx.role_of(&board, &fx.mate), Some(Role::Viewer));
}

#[test]
fn group_membership_grants_area_access() {
    let fx = Fixture::new();
    let board = fx.restricted_area("Board");
    let group = store(&fx.conn)
        .create_group("Leadership", &[fx.mate.id])
        .unwrap();

    fx.members()
        .add_member(fx.owner.id, board.id, MemberTarget::Group(group.id), "admin")
        .unwrap();
    assert_eq!(fx.role_of(&board, &fx.mate), Some(Role::Admin));

    let listed = fx.members().list_members(fx.mate.id, board.id).unwrap();
    let group_row = listed
        .iter()
        .find(|view| view.member.target == MemberTarget::Group(group.id))
        .unwrap();
    assert_eq!(group_row.display_name, "Leadership");
    assert_eq!(group_row.email, None);
}

#[test]
fn duplicate_membership_is_a_conflict() {
    let fx = Fixture::new();
    let board = fx.restricted_area("Board");
    let target = MemberTarget::User(fx.mate.id);

    fx.members()
        .add_member(fx.owner.id, board.id, target, "member")
        .unwrap();
    assert!(matches!(
        fx.members().add_member(fx.owner.id, board.id, target, "admin"),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn owner_rows_are_immutable_and_owner_is_never_granted() {
    let fx = Fixture::new();
    let board = fx.restricted_area("Board");
    let owner_row = fx
        .members()
        .list_members(fx.owner.id, board.id)
        .unwrap()
        .into_iter()
        .find(|view| view.member.is_owner())
        .unwrap();

    assert!(matches!(
        fx.members()
            .remove_member(fx.owner.id, board.id, owner_row.member.id),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        fx.members()
            .update_member_role(fx.owner.id, board.id, owner_row.member.id, "viewer"),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        fx.members()
            .add_member(fx.owner.id, board.id, MemberTarget::User(fx.mate.id), "owner"),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn role_changes_and_removal_apply_to_non_owner_rows() {
    let fx = Fixture::new();
    let board = fx.restricted_area("Board");
    let member = fx
        .members()
        .add_member(fx.owner.id, board.id, MemberTarget::User(fx.mate.id), "viewer")
        .unwrap();

    let updated = fx
        .members()
        .update_member_role(fx.owner.id, board.id, member.id, "admin")
        .unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(fx.role_of(&board, &fx.mate), Some(Role::Admin));

    fx.members()
        .remove_member(fx.owner.id, board.id, member.id)
        .unwrap();
    assert_eq!(fx.role_of(&board, &fx.mate), None);
    assert!(matches!(
        fx.members().remove_member(fx.owner.id, board.id, member.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn non_managers_cannot_change_membership() {
    let fx = Fixture::new();
    let outsider = store(&fx.conn)
        .create_user("out@example.com", "Otto Outsider")
        .unwrap();

    assert!(matches!(
        fx.members().add_member(
            fx.mate.id,
            fx.general.id,
            MemberTarget::User(outsider.id),
            "viewer"
        ),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        fx.members()
            .add_member(fx.owner.id, fx.general.id, MemberTarget::User(outsider.id), "viewer"),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn candidate_search_filters_and_limits() {
    let fx = Fixture::new();
    for index in 0..12 {
        let user = store(&fx.conn)
            .create_user(&format!("tester{index}@example.com"), &format!("Tester {index:02}"))
            .unwrap();
        SpaceService::new(store(&fx.conn))
            .add_space_member(fx.owner.id, fx.space.id, user.id, "viewer")
            .unwrap();
    }
    store(&fx.conn).create_group("Testers Guild", &[]).unwrap();

    let members = fx.members();
    assert!(members
        .search_candidates(fx.owner.id, fx.general.id, " t ")
        .unwrap()
        .is_empty());

    let hits = members
        .search_candidates(fx.owner.id, fx.general.id, "TESTER")
        .unwrap();
    assert_eq!(hits.len(), 10);
    assert!(hits
        .iter()
        .all(|hit| matches!(hit.target, MemberTarget::User(_))));

    let hits = members
        .search_candidates(fx.owner.id, fx.general.id, "guild")
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name, "Testers Guild");

    let hits = members
        .search_candidates(fx.owner.id, fx.general.id, "olivia")
        .unwrap();
    assert!(hits.is_empty(), "existing members are excluded");

    let hits = members
        .search_candidates(fx.owner.id, fx.general.id, "100%")
        .unwrap();
    assert!(hits.is_empty(), "wildcards are matched literally");
}

#[test]
fn candidate_search_folds_non_ascii_case() {
    let fx = Fixture::new();
    let board = fx.restricted_area("Board");
    let emilie = store(&fx.conn)
        .create_user("emilie@example.com", "Émilie Durand")
        .unwrap();
    SpaceService::new(store(&fx.conn))
        .add_space_member(fx.owner.id, fx.space.id, emilie.id, "member")
        .unwrap();
    store(&fx.conn).create_group("Équipe Ventes", &[]).unwrap();

    let members = fx.members();
    for query in ["Émi", "émi", "ÉMILIE"] {
        let hits = members
            .search_candidates(fx.owner.id, board.id, query)
            .unwrap();
        assert_eq!(hits.len(), 1, "query {query:?}");
        assert_eq!(hits[0].target, MemberTarget::User(emilie.id));
    }

    let hits = members
        .search_candidates(fx.owner.id, board.id, "équipe")
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name, "Équipe Ventes");
}

#[test]
fn group_with_unknown_member_is_not_stored() {
    let fx = Fixture::new();
    let ghost = uuid::Uuid::new_v4();

    let err = store(&fx.conn)
        .create_group("Night Shift", &[fx.mate.id, ghost])
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "user", id } if id == ghost));

    let (groups, members): (i64, i64) = fx
        .conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM user_groups), (SELECT COUNT(*) FROM group_members);",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((groups, members), (0, 0));

    let group = store(&fx.conn)
        .create_group("Night Shift", &[fx.mate.id])
        .unwrap();
    assert_eq!(group.name, "Night Shift");
}
