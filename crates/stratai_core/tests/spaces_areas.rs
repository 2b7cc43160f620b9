use rusqlite::Connection;
use stratai_core::db::open_db_in_memory;
use stratai_core::model::area::{AreaPatch, NewArea};
use stratai_core::model::document::{Document, NewDocument};
use stratai_core::model::member::Role;
use stratai_core::model::space::SpaceId;
use stratai_core::model::user::User;
use stratai_core::repo::user_repo::UserRepository;
use stratai_core::{
    AreaService, DocumentService, ServiceError, SharingService, SpaceService, SqliteStore,
};
use uuid::Uuid;

fn store(conn: &Connection) -> SqliteStore<'_> {
    SqliteStore::try_new(conn).unwrap()
}

fn user(conn: &Connection, email: &str, name: &str) -> User {
    store(conn).create_user(email, name).unwrap()
}

fn new_area(name: &str, restricted: bool) -> NewArea {
    NewArea {
        name: name.to_string(),
        is_restricted: restricted,
        ..NewArea::default()
    }
}

fn general_count(conn: &Connection, space_id: Uuid) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM areas WHERE space_id = ?1 AND is_general = 1;",
        [space_id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn creating_space_seeds_owner_and_general_area() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");

    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "  Work  ")
        .unwrap();
    assert_eq!(space.name, "Work");
    assert!(general.is_general);
    assert!(!general.is_restricted);
    assert_eq!(general.name, "General");
    assert_eq!(general_count(&conn, space.id), 1);

    let (_, role) = SpaceService::new(store(&conn))
        .get_space(owner.id, space.id)
        .unwrap();
    assert_eq!(role, Role::Owner);
}

#[test]
fn blank_space_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let err = SpaceService::new(store(&conn))
        .create_space(owner.id, "   ")
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn spaces_are_hidden_from_non_members() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let stranger = user(&conn, "stranger@example.com", "Stranger");
    let (space, _) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();

    let service = SpaceService::new(store(&conn));
    assert!(matches!(
        service.get_space(stranger.id, space.id),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(service.list_spaces(stranger.id).unwrap().is_empty());
    assert_eq!(service.list_spaces(owner.id).unwrap().len(), 1);
}

#[test]
fn space_members_cannot_be_made_owner_or_added_twice() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let mate = user(&conn, "mate@example.com", "Mate");
    let service = SpaceService::new(store(&conn));
    let (space, _) = service.create_space(owner.id, "Work").unwrap();

    assert!(matches!(
        service.add_space_member(owner.id, space.id, mate.id, "owner"),
        Err(ServiceError::Validation(_))
    ));
    let member = service
        .add_space_member(owner.id, space.id, mate.id, "member")
        .unwrap();
    assert_eq!(member.role, Role::Member);
    assert!(matches!(
        service.add_space_member(owner.id, space.id, mate.id, "viewer"),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        service.add_space_member(mate.id, space.id, Uuid::new_v4(), "member"),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn area_names_are_unique_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let (space, _) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    let areas = AreaService::new(store(&conn));

    areas
        .create_area(owner.id, space.id, &new_area("Research", false))
        .unwrap();
    assert!(matches!(
        areas.create_area(owner.id, space.id, &new_area(" research ", false)),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        areas.create_area(owner.id, space.id, &new_area("general", false)),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn restricting_an_area_leaves_general_open() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    let areas = AreaService::new(store(&conn));
    let research = areas
        .create_area(owner.id, space.id, &new_area("Research", false))
        .unwrap();

    let patch = AreaPatch {
        is_restricted: Some(true),
        ..AreaPatch::default()
    };
    let updated = areas.update_area(owner.id, research.id, &patch).unwrap();
    assert!(updated.is_restricted);

    let general = areas.get_area(owner.id, general.id).unwrap();
    assert!(!general.is_restricted);
    assert_eq!(general_count(&conn, space.id), 1);
}

#[test]
fn general_area_cannot_be_renamed_restricted_or_deleted() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    let areas = AreaService::new(store(&conn));

    for patch in [
        AreaPatch {
            name: Some("Lobby".to_string()),
            ..AreaPatch::default()
        },
        AreaPatch {
            is_restricted: Some(true),
            ..AreaPatch::default()
        },
    ] {
        assert!(matches!(
            areas.update_area(owner.id, general.id, &patch),
            Err(ServiceError::Validation(_))
        ));
    }
    assert!(matches!(
        areas.delete_area(owner.id, general.id),
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(general_count(&conn, space.id), 1);
}

#[test]
fn plain_members_see_open_areas_but_cannot_manage_them() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let mate = user(&conn, "mate@example.com", "Mate");
    let (space, _) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    SpaceService::new(store(&conn))
        .add_space_member(owner.id, space.id, mate.id, "member")
        .unwrap();

    let areas = AreaService::new(store(&conn));
    let open = areas
        .create_area(owner.id, space.id, &new_area("Marketing", false))
        .unwrap();
    areas
        .create_area(owner.id, space.id, &new_area("Board", true))
        .unwrap();

    let names: Vec<String> = areas
        .list_areas(mate.id, space.id)
        .unwrap()
        .into_iter()
        .map(|area| area.name)
        .collect();
    assert_eq!(names, vec!["General".to_string(), "Marketing".to_string()]);

    let rename = AreaPatch {
        name: Some("Growth".to_string()),
        ..AreaPatch::default()
    };
    assert!(matches!(
        areas.update_area(mate.id, open.id, &rename),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn context_documents_must_belong_to_the_space() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    let areas = AreaService::new(store(&conn));

    let patch = AreaPatch {
        context_document_ids: Some(vec![Uuid::new_v4()]),
        ..AreaPatch::default()
    };
    assert!(matches!(
        areas.update_area(owner.id, general.id, &patch),
        Err(ServiceError::Validation(_))
    ));

    let patch = AreaPatch {
        context: Some("Prefer bullet points.".to_string()),
        context_document_ids: Some(Vec::new()),
        ..AreaPatch::default()
    };
    let updated = areas.update_area(owner.id, general.id, &patch).unwrap();
    assert_eq!(updated.context.as_deref(), Some("Prefer bullet points."));
    assert_eq!(updated.id, space_general_id(&conn, space.id));
}

fn upload(conn: &Connection, owner: &User, space_id: SpaceId, filename: &str) -> Document {
    DocumentService::new(store(conn))
        .create_document(
            owner.id,
            space_id,
            &NewDocument {
                filename: filename.to_string(),
                title: None,
                content: "confidential".to_string(),
            },
        )
        .unwrap()
}

fn context_patch(ids: Vec<Uuid>) -> AreaPatch {
    AreaPatch {
        context_document_ids: Some(ids),
        ..AreaPatch::default()
    }
}

#[test]
fn private_documents_cannot_become_area_context() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let mate = user(&conn, "mate@example.com", "Mate");
    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    SpaceService::new(store(&conn))
        .add_space_member(owner.id, space.id, mate.id, "member")
        .unwrap();
    let salaries = upload(&conn, &owner, space.id, "salaries.md");

    let areas = AreaService::new(store(&conn));
    let mine = areas
        .create_area(mate.id, space.id, &new_area("Mine", false))
        .unwrap();
    assert!(matches!(
        areas.update_area(mate.id, mine.id, &context_patch(vec![salaries.id])),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        areas.update_area(owner.id, general.id, &context_patch(vec![salaries.id])),
        Err(ServiceError::Validation(_))
    ));
    assert!(areas
        .get_area(mate.id, mine.id)
        .unwrap()
        .context_document_ids
        .is_empty());

    SharingService::new(store(&conn))
        .set_sharing(owner.id, salaries.id, "space", None)
        .unwrap();
    let updated = areas
        .update_area(mate.id, mine.id, &context_patch(vec![salaries.id]))
        .unwrap();
    assert_eq!(updated.context_document_ids, vec![salaries.id]);
}

#[test]
fn area_shared_documents_are_context_only_for_their_areas() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    let areas = AreaService::new(store(&conn));
    let research = areas
        .create_area(owner.id, space.id, &new_area("Research", true))
        .unwrap();
    let brief = upload(&conn, &owner, space.id, "brief.md");
    SharingService::new(store(&conn))
        .set_sharing(owner.id, brief.id, "areas", Some(&[research.id]))
        .unwrap();

    assert!(matches!(
        areas.update_area(owner.id, general.id, &context_patch(vec![brief.id])),
        Err(ServiceError::Validation(_))
    ));
    let updated = areas
        .update_area(owner.id, research.id, &context_patch(vec![brief.id]))
        .unwrap();
    assert_eq!(updated.context_document_ids, vec![brief.id]);
}

#[test]
fn narrowing_visibility_drops_context_links() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let (space, general) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    let areas = AreaService::new(store(&conn));
    let research = areas
        .create_area(owner.id, space.id, &new_area("Research", false))
        .unwrap();
    let notes = upload(&conn, &owner, space.id, "notes.md");
    let sharing = SharingService::new(store(&conn));
    sharing
        .set_sharing(owner.id, notes.id, "space", None)
        .unwrap();
    for area_id in [general.id, research.id] {
        areas
            .update_area(owner.id, area_id, &context_patch(vec![notes.id]))
            .unwrap();
    }

    sharing
        .set_sharing(owner.id, notes.id, "areas", Some(&[research.id]))
        .unwrap();
    assert!(areas
        .get_area(owner.id, general.id)
        .unwrap()
        .context_document_ids
        .is_empty());
    assert_eq!(
        areas
            .get_area(owner.id, research.id)
            .unwrap()
            .context_document_ids,
        vec![notes.id]
    );

    sharing
        .set_sharing(owner.id, notes.id, "private", None)
        .unwrap();
    assert!(areas
        .get_area(owner.id, research.id)
        .unwrap()
        .context_document_ids
        .is_empty());
    let links: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM area_context_documents WHERE document_id = ?1;",
            [notes.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(links, 0);
}

#[test]
fn deleted_area_disappears_and_frees_its_name() {
    let conn = open_db_in_memory().unwrap();
    let owner = user(&conn, "owner@example.com", "Owner");
    let (space, _) = SpaceService::new(store(&conn))
        .create_space(owner.id, "Work")
        .unwrap();
    let areas = AreaService::new(store(&conn));
    let research = areas
        .create_area(owner.id, space.id, &new_area("Research", false))
        .unwrap();

    areas.delete_area(owner.id, research.id).unwrap();
    assert!(matches!(
        areas.get_area(owner.id, research.id),
        Err(ServiceError::NotFound { .. })
    ));
    areas
        .create_area(owner.id, space.id, &new_area("Research", false))
        .unwrap();
}

fn space_general_id(conn: &Connection, space_id: Uuid) -> Uuid {
    let id: String = conn
        .query_row(
            "SELECT id FROM areas WHERE space_id = ?1 AND is_general = 1;",
            [space_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    Uuid::parse_str(&id).unwrap()
}
