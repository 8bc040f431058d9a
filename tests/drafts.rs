mod common;

use common::{course_record, fill_module, video, FakeCatalog};
use course_authoring::models::*;
use course_authoring::{AuthoringError, AuthoringSession, AuthoringSettings, ValidationError};

async fn saved_course_session() -> AuthoringSession<FakeCatalog> {
    let api = FakeCatalog::new();
    api.seed_course(course_record("course-1", "Intro to Python"));
    let (session, _) = AuthoringSession::load(api, &CourseId("course-1".into()), AuthoringSettings::default())
        .await
        .unwrap();
    session
}

#[test]
fn picking_then_discarding_releases_the_draft() {
    let mut session = AuthoringSession::new(FakeCatalog::new(), AuthoringSettings::default());
    let module = session.add_module();
    let picked = session.pick_files(&module, vec![video("intro.mp4")]).unwrap();
    let handle = picked.accepted[0];
    assert!(session.registry().is_live(handle));

    assert!(session.discard());

    assert!(!session.registry().is_live(handle));
    assert_eq!(session.registry().live_count(), 0);
    assert!(session.course().modules.is_empty());
}

#[tokio::test]
async fn module_drafts_revert_to_empty_after_discard() {
    let api = FakeCatalog::new();
    api.seed_course(course_record("course-1", "Intro to Python"));
    api.seed_modules(vec![ModuleRecord {
        id: "module-1".into(),
        title: Some("Variables".into()),
        ..Default::default()
    }]);
    let (mut session, _) = AuthoringSession::load(api, &CourseId("course-1".into()), AuthoringSettings::default())
        .await
        .unwrap();
    let module = ModuleId::Remote("module-1".into());

    let picked = session.pick_files(&module, vec![video("intro.mp4")]).unwrap();
    assert_eq!(session.course().module(&module).unwrap().draft_materials.len(), 1);

    session.discard();

    let restored = session.course().module(&module).unwrap();
    assert!(restored.draft_materials.is_empty());
    assert_eq!(restored.phase(), ModulePhase::Empty);
    assert!(session.preview_url(picked.accepted[0]).is_none());
}

#[test]
fn disallowed_files_are_rejected_without_allocating() {
    let mut session = AuthoringSession::new(FakeCatalog::new(), AuthoringSettings::default());
    let module = session.add_module();
    session
        .set_material_category(&module, MaterialCategory::Document)
        .unwrap();

    let picked = session
        .pick_files(
            &module,
            vec![
                PickedFile::new("slides.PDF", vec![1, 2]),
                video("intro.mp4"),
            ],
        )
        .unwrap();

    assert_eq!(picked.accepted.len(), 1);
    assert_eq!(
        picked.rejected,
        vec![ValidationError::DisallowedExtension {
            file_name: "intro.mp4".into(),
            category: MaterialCategory::Document,
        }]
    );
    assert_eq!(session.registry().live_count(), 1);
    assert!(session.api().calls().is_empty());
}

#[tokio::test]
async fn removing_a_draft_is_local_only() {
    let mut session = AuthoringSession::new(FakeCatalog::new(), AuthoringSettings::default());
    let module = session.add_module();
    let picked = session.pick_files(&module, vec![video("a.mp4"), video("b.mp4")]).unwrap();

    session
        .remove_material(&module, &MaterialKey::Draft(picked.accepted[0]))
        .await
        .unwrap();

    assert!(!session.registry().is_live(picked.accepted[0]));
    assert_eq!(session.course().modules[0].draft_materials.len(), 1);
    assert!(session.api().calls().is_empty());
}

#[tokio::test]
async fn renaming_a_draft_swaps_its_handle() {
    let mut session = AuthoringSession::new(FakeCatalog::new(), AuthoringSettings::default());
    let module = session.add_module();
    let picked = session.pick_files(&module, vec![video("a.mp4")]).unwrap();
    let old = picked.accepted[0];

    let renamed = session
        .rename_material(&module, &MaterialKey::Draft(old), "Week 1")
        .await
        .unwrap();

    let MaterialKey::Draft(new) = renamed else {
        panic!("expected a draft key");
    };
    assert!(!session.registry().is_live(old));
    assert!(session.registry().is_live(new));
    assert_eq!(session.course().modules[0].draft_materials[0].display_name, "Week 1.mp4");

    let err = session
        .rename_material(&module, &MaterialKey::Draft(new), "  ")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthoringError::Validation(ValidationError::MissingField(_))
    ));
}

#[tokio::test]
async fn committed_material_removal_waits_for_the_server() {
    let mut session = saved_course_session().await;
    let module = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));
    session.pick_files(&module, vec![video("a.mp4")]).unwrap();
    let report = session.save_module(&module, None).await.unwrap();
    let module = report.module_id;
    let material = session.course().module(&module).unwrap().committed_materials[0].id.clone();

    session.api().fail_on("delete_material");
    let err = session
        .remove_material(&module, &MaterialKey::Committed(material.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthoringError::Remote(_)));
    assert_eq!(session.course().module(&module).unwrap().committed_materials.len(), 1);

    session.api().clear_failures();
    session
        .remove_material(&module, &MaterialKey::Committed(material))
        .await
        .unwrap();
    assert!(session.course().module(&module).unwrap().committed_materials.is_empty());
}

#[tokio::test]
async fn committed_rename_keeps_extension_and_calls_server() {
    let mut session = saved_course_session().await;
    let module = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));
    session.pick_files(&module, vec![video("a.mp4")]).unwrap();
    let module = session.save_module(&module, None).await.unwrap().module_id;
    let material = session.course().module(&module).unwrap().committed_materials[0].id.clone();

    session
        .rename_material(&module, &MaterialKey::Committed(material.clone()), "Welcome")
        .await
        .unwrap();

    let committed = &session.course().module(&module).unwrap().committed_materials[0];
    assert_eq!(committed.display_name, "Welcome.mp4");
    assert_eq!(
        session.api().calls_starting_with("rename_material"),
        vec![format!("rename_material:{}:Welcome.mp4", material)]
    );
}

#[tokio::test]
async fn every_handle_is_released_by_teardown() {
    let mut session = saved_course_session().await;
    let first = session.add_module();
    let second = session.add_module();

    let a = session.pick_files(&first, vec![video("a.mp4"), video("b.mp4")]).unwrap();
    session.pick_files(&second, vec![video("c.mp4")]).unwrap();
    session
        .remove_material(&first, &MaterialKey::Draft(a.accepted[0]))
        .await
        .unwrap();
    session
        .rename_material(&first, &MaterialKey::Draft(a.accepted[1]), "renamed")
        .await
        .unwrap();
    session.remove_module(&second).await.unwrap();
    session.discard();

    let third = session.add_module();
    session.pick_files(&third, vec![video("d.mp4"), video("e.mp4")]).unwrap();
    session.edit(|course| course.modules.clear());
    let fourth = session.add_module();
    session.pick_files(&fourth, vec![video("f.mp4")]).unwrap();
    assert_eq!(session.registry().live_count(), 1);

    session.teardown();

    let registry = session.registry();
    assert_eq!(registry.live_count(), 0);
    assert_eq!(registry.allocated_total(), registry.released_total());
}
