mod common;

use common::{course_record, fill_module, video, FakeCatalog};
use course_authoring::models::*;
use course_authoring::progress::Section;
use course_authoring::{AuthoringError, AuthoringSession, AuthoringSettings, UploadProgress, ValidationError};

async fn saved_course_session() -> AuthoringSession<FakeCatalog> {
    let api = FakeCatalog::new();
    api.seed_course(course_record("course-1", "Intro to Python"));
    let (session, _) = AuthoringSession::load(api, &CourseId("course-1".into()), AuthoringSettings::default())
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn modules_need_a_saved_course() {
    let mut session = AuthoringSession::new(FakeCatalog::new(), AuthoringSettings::default());
    let module = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));

    let err = session.save_module(&module, None).await.unwrap_err();

    assert!(matches!(
        err,
        AuthoringError::Validation(ValidationError::CourseNotSaved(_))
    ));
    assert!(session.api().calls().is_empty());
}

#[tokio::test]
async fn blank_module_title_is_rejected() {
    let mut session = saved_course_session().await;
    let module = session.add_module();
    session.pick_files(&module, vec![video("a.mp4")]).unwrap();

    let err = session.save_module(&module, None).await.unwrap_err();

    assert!(matches!(
        err,
        AuthoringError::Validation(ValidationError::MissingField("module title"))
    ));
    assert!(session.api().calls_starting_with("create_module").is_empty());
    assert_eq!(session.course().modules[0].draft_materials.len(), 1);
}

#[tokio::test]
async fn uploads_commit_individually_and_report_failures() {
    let mut session = saved_course_session().await;
    let local = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));
    session
        .pick_files(&local, vec![video("a.mp4"), video("b.mp4"), video("c.mp4")])
        .unwrap();
    session.api().fail_on("upload:b.mp4");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<UploadProgress>();

    let report = session.save_module(&local, Some(tx)).await.unwrap();

    assert!(report.module_id.is_persisted());
    assert_eq!(report.uploaded, 2);
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.message(), "2 of 3 files uploaded, 1 failed: b.mp4");

    let module = session.course().module(&report.module_id).unwrap();
    assert!(!module.committing);
    assert_eq!(module.committed_materials.len(), 2);
    assert_eq!(module.draft_materials.len(), 1);
    assert_eq!(module.draft_materials[0].display_name, "b.mp4");
    assert_eq!(module.phase(), ModulePhase::HasDrafts);
    assert!(session.course().module(&local).is_none());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.percent() == 100));

    let materials = session.progress().section(Section::Materials).unwrap();
    assert_eq!(materials.score.ratio, 1.0);
    assert_eq!(session.registry().live_count(), 1);
}

#[tokio::test]
async fn failed_uploads_can_be_retried_manually() {
    let mut session = saved_course_session().await;
    let local = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));
    session.pick_files(&local, vec![video("a.mp4")]).unwrap();
    session.api().fail_on("upload");

    let report = session.save_module(&local, None).await.unwrap();
    assert_eq!(report.uploaded, 0);
    assert_eq!(session.api().calls_starting_with("upload").len(), 1);

    session.api().clear_failures();
    let module = report.module_id;
    let report = session.save_module(&module, None).await.unwrap();

    assert_eq!(report.uploaded, 1);
    assert!(report.failures.is_empty());
    assert_eq!(session.api().calls_starting_with("create_module").len(), 1);
    assert_eq!(session.api().calls_starting_with("update_module").len(), 1);
    assert_eq!(session.registry().live_count(), 0);
}

#[tokio::test]
async fn module_create_failure_skips_uploads() {
    let mut session = saved_course_session().await;
    let local = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));
    session.pick_files(&local, vec![video("a.mp4")]).unwrap();
    session.api().fail_on("create_module");

    let err = session.save_module(&local, None).await.unwrap_err();

    assert!(matches!(err, AuthoringError::Remote(_)));
    assert!(session.api().calls_starting_with("upload").is_empty());
    let module = session.course().module(&local).unwrap();
    assert!(!module.id.is_persisted());
    assert!(!module.committing);
    assert_eq!(module.draft_materials.len(), 1);
}

#[tokio::test]
async fn saved_module_survives_discard() {
    let mut session = saved_course_session().await;
    let local = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));
    session.pick_files(&local, vec![video("a.mp4")]).unwrap();
    let module = session.save_module(&local, None).await.unwrap().module_id;

    session.edit(|c| c.modules[0].title = "Unsaved title".into());
    session.discard();

    let restored = session.course().module(&module).unwrap();
    assert_eq!(restored.title, "Variables");
    assert_eq!(restored.committed_materials.len(), 1);
}

#[tokio::test]
async fn local_modules_are_removed_without_a_request() {
    let mut session = saved_course_session().await;
    let local = session.add_module();
    session.pick_files(&local, vec![video("a.mp4")]).unwrap();

    session.remove_module(&local).await.unwrap();

    assert!(session.course().modules.is_empty());
    assert!(session.api().calls_starting_with("delete_module").is_empty());
    assert_eq!(session.registry().live_count(), 0);
}

#[tokio::test]
async fn remote_modules_are_removed_after_the_server_confirms() {
    let mut session = saved_course_session().await;
    let local = session.add_module();
    session.edit(|c| fill_module(&mut c.modules[0], "Variables"));
    let module = session.save_module(&local, None).await.unwrap().module_id;

    session.api().fail_on("delete_module");
    assert!(session.remove_module(&module).await.is_err());
    assert_eq!(session.course().modules.len(), 1);

    session.api().clear_failures();
    session.remove_module(&module).await.unwrap();
    assert!(session.course().modules.is_empty());

    session.discard();
    assert!(session.course().modules.is_empty());
}
