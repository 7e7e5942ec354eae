//! End-to-end workflow over the fixture project: capture, review,
//! escalation and reload

use formzone_core::{
    BatchOpenReport, DuplicateResolution, EscalationOutcome, FormzoneError, IndexStrategy, Project,
    QcStrategy, RecordState,
};
use formzone_ledger::Comment;
use formzone_records::RecordStore;
use formzone_schema::{FieldKind, Zone};
use formzone_test_utils::temp_project;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::Path;

#[test]
fn open_project_reads_config_lookup_and_presets() {
    let (dir, _) = temp_project();
    let project = Project::open(dir.path()).unwrap();

    assert_eq!(project.config().validations.len(), 4);
    assert!(project.lookup().is_some());
    assert_eq!(project.presets(), ["Illegible", "Check with supervisor"]);
    assert_eq!(
        project.columns(),
        vec!["none", "x", "y", "colour", "name", "age", "school", "county", "total", "part_a", "part_b"]
    );
}

#[test]
fn toggle_twice_restores_value() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    let qc = QcStrategy::new(&project, &batch);

    assert!(qc.index().toggle_tick("a.tif", "x").unwrap());
    assert!(!qc.index().toggle_tick("a.tif", "x").unwrap());
    assert_eq!(qc.index().value("a.tif", "x").unwrap(), "");
}

#[test]
fn radio_group_holds_at_most_one_selection() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    let index = IndexStrategy::new(&project, &batch);

    index.select_radio("a.tif", "colour", "red").unwrap();
    index.select_radio("a.tif", "colour", "blue").unwrap();
    assert!(index.is_selected("a.tif", "colour", "blue").unwrap());
    assert!(!index.is_selected("a.tif", "colour", "red").unwrap());

    index.clear_radio("a.tif", "colour").unwrap();
    assert_eq!(index.value("a.tif", "colour").unwrap(), "");

    let err = index.select_radio("a.tif", "colour", "green").unwrap_err();
    assert!(matches!(err, FormzoneError::Store(_)));
    let err = index.select_radio("a.tif", "name", "red").unwrap_err();
    assert!(matches!(err, FormzoneError::WrongKind { .. }));
}

#[test]
fn typed_text_is_stored_even_when_flagged() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    let qc = QcStrategy::new(&project, &batch);

    assert!(qc.index().set_text("a.tif", "age", "forty").unwrap().is_some());
    assert_eq!(qc.index().value("a.tif", "age").unwrap(), "forty");
    assert!(qc.index().set_text("a.tif", "age", "40").unwrap().is_none());
}

#[test]
fn comment_on_grouped_button_is_filed_under_group() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    let qc = QcStrategy::new(&project, &batch);

    let red = {
        let schema = project.schema();
        let colour = schema.find("colour").unwrap().id();
        schema.child_named(colour, "red").unwrap().id()
    };
    let comment = qc.comment_on_field("a.tif", red, "faint mark").unwrap();
    assert_eq!(comment.field, "colour");
    assert_eq!(comment.page, 1);

    assert!(qc.render("a.tif", red).unwrap().flagged);
    let pages = qc.page_comments("a.tif", 1).unwrap();
    assert_eq!(pages.get("colour").map(String::as_str), Some("faint mark"));
}

#[test]
fn escalation_round_trip_through_qc() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    batch.add_document("b.tif").unwrap();
    let qc = QcStrategy::new(&project, &batch);
    qc.index().set_text("a.tif", "name", "Ann").unwrap();

    let outcome = qc.escalate("a.tif", Comment::new(1, "name", "check spelling")).unwrap();
    assert_eq!(outcome, EscalationOutcome::Moved);
    assert_eq!(batch.locate("a.tif"), Some(RecordState::UnderReview));
    assert_eq!(qc.index().value("a.tif", "name").unwrap(), "Ann");

    let checklist = qc.comment_checklist();
    assert_eq!(checklist.len(), 1);
    assert_eq!(checklist[0].state, RecordState::UnderReview);
    assert!(checklist[0].comment.escalated);

    assert_eq!(qc.deescalate("a.tif").unwrap(), 1);
    assert_eq!(batch.locate("a.tif"), Some(RecordState::Clean));
    let checklist = qc.comment_checklist();
    assert_eq!(checklist.len(), 1);
    assert!(!checklist[0].comment.escalated);

    let err = qc.deescalate("a.tif").unwrap_err();
    assert!(matches!(err, FormzoneError::Escalation(_)));
}

#[test]
fn review_views_cover_both_datasets() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    batch.add_document("b.tif").unwrap();
    let qc = QcStrategy::new(&project, &batch);
    qc.index().set_text("a.tif", "name", "Ann").unwrap();
    qc.index().set_text("b.tif", "name", "Bob").unwrap();
    qc.index().set_text("b.tif", "school", "S1").unwrap();
    qc.escalate("b.tif", Comment::new(1, "name", "?")).unwrap();

    assert_eq!(qc.review_fields(), ["name"]);
    assert_eq!(
        qc.field_review("name").unwrap(),
        vec![("a.tif".to_string(), "Ann".to_string()), ("b.tif".to_string(), "Bob".to_string())]
    );
    assert_eq!(
        qc.quick_review("b.tif").unwrap(),
        vec![("name".to_string(), "Bob".to_string()), ("school".to_string(), "S1".to_string())]
    );
    assert!(qc.field_review("nope").is_err());
}

#[test]
fn reload_settles_duplicates_left_by_interrupted_moves() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    {
        let (batch, _) = project.open_batch(&path).unwrap();
        batch.add_document("kept_review.tif").unwrap();
        batch.add_document("back_to_clean.tif").unwrap();
        batch.save().unwrap();
    }
    let before_escalation = std::fs::read_to_string(&path).unwrap();
    {
        let (batch, _) = project.open_batch(&path).unwrap();
        batch
            .escalate("kept_review.tif", Comment::new(1, "name", "unclear"))
            .unwrap();
    }
    // Clean file as before the move; the review file also carries an
    // unescalated copy of the other document.
    std::fs::write(&path, &before_escalation).unwrap();
    let review_path = formzone_core::review_path_for(&path);
    let mut review = std::fs::read_to_string(&review_path).unwrap();
    let stray = before_escalation
        .lines()
        .find(|line| line.starts_with("back_to_clean.tif"))
        .unwrap();
    review.push_str(stray);
    review.push('\n');
    std::fs::write(&review_path, review).unwrap();

    let (batch, report): (_, BatchOpenReport) = project.open_batch(&path).unwrap();
    let mut duplicates = report.duplicates.clone();
    duplicates.sort_by(|a, b| a.document.cmp(&b.document));
    assert_eq!(
        duplicates,
        vec![
            DuplicateResolution {
                document: "back_to_clean.tif".to_string(),
                kept: RecordState::Clean,
            },
            DuplicateResolution {
                document: "kept_review.tif".to_string(),
                kept: RecordState::UnderReview,
            },
        ]
    );
    assert_eq!(batch.locate("kept_review.tif"), Some(RecordState::UnderReview));
    assert_eq!(batch.locate("back_to_clean.tif"), Some(RecordState::Clean));
}

#[test]
fn older_batch_gains_new_column_empty() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    {
        let (batch, _) = project.open_batch(&path).unwrap();
        batch.add_document("a.tif").unwrap();
        QcStrategy::new(&project, &batch)
            .index()
            .set_text("a.tif", "name", "Ann")
            .unwrap();
        batch.save().unwrap();
    }

    project
        .design(|design, schema| {
            design.add_field(schema, 2, "postcode", FieldKind::TextField, Zone::new(0, 150, 80, 20))
        })
        .unwrap();
    let (batch, report) = project.open_batch(&path).unwrap();
    assert_eq!(report.clean.missing_columns, vec!["postcode"]);
    let index = IndexStrategy::new(&project, &batch);
    assert_eq!(index.value("a.tif", "name").unwrap(), "Ann");
    assert_eq!(index.value("a.tif", "postcode").unwrap(), "");
}

#[test]
fn index_comments_never_escalate() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    {
        let (batch, _) = project.open_batch(&path).unwrap();
        batch.add_document("a.tif").unwrap();
        let index = IndexStrategy::new(&project, &batch);

        let marked = Comment::new(1, "name", "smudged").into_escalated();
        assert!(index.add_comment("a.tif", marked).unwrap());
        index
            .edit_comment(
                "a.tif",
                &Comment::new(1, "name", "smudged"),
                Comment::new(1, "name", "very smudged").into_escalated(),
            )
            .unwrap();

        assert_eq!(batch.locate("a.tif"), Some(RecordState::Clean));
        assert!(!batch.with_ledger("a.tif", |l| Ok(l.has_escalation())).unwrap());
        batch.save().unwrap();
    }

    let (batch, report) = project.open_batch(&path).unwrap();
    assert!(!report.needs_save());
    assert_eq!(batch.locate("a.tif"), Some(RecordState::Clean));
    assert!(!batch.with_ledger("a.tif", |l| Ok(l.has_escalation())).unwrap());
}

#[test]
fn escalated_comment_in_clean_file_moves_under_review_on_open() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    {
        let (mut store, _) = RecordStore::load(&path, &project.schema()).unwrap();
        store.add_document("a.tif").unwrap();
        store.add_document("b.tif").unwrap();
        store
            .ledger_mut(0)
            .unwrap()
            .append(Comment::new(1, "name", "unclear").into_escalated());
        store.save(&path).unwrap();
    }

    let (batch, report) = project.open_batch(&path).unwrap();
    assert_eq!(report.moved_to_review, vec!["a.tif"]);
    assert!(report.needs_save());
    assert_eq!(batch.locate("a.tif"), Some(RecordState::UnderReview));
    assert_eq!(batch.locate("b.tif"), Some(RecordState::Clean));

    batch.save().unwrap();
    drop(batch);
    let (batch, report) = project.open_batch(&path).unwrap();
    assert!(report.moved_to_review.is_empty());
    assert_eq!(batch.locate("a.tif"), Some(RecordState::UnderReview));
}

/// Documents each file on disk holds, clean then review
fn keys_on_disk(project: &Project, path: &Path) -> (Vec<String>, Vec<String>) {
    let schema = project.schema();
    let (clean, _) = RecordStore::load(path, &schema).unwrap();
    let (review, _) = RecordStore::load(&formzone_core::review_path_for(path), &schema).unwrap();
    (clean.keys(), review.keys())
}

#[test]
fn failed_review_write_leaves_escalation_undone() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    batch.save().unwrap();
    std::fs::remove_file(batch.review_path()).unwrap();
    std::fs::create_dir(batch.review_path()).unwrap();

    let err = batch.escalate("a.tif", Comment::new(1, "name", "unclear")).unwrap_err();

    assert!(matches!(err, FormzoneError::Store(_)));
    assert_eq!(batch.locate("a.tif"), Some(RecordState::Clean));
    batch.read(|d| {
        assert!(d.review.is_empty());
        assert!(!d.clean.ledger(0).unwrap().has_escalation());
    });
    let schema = project.schema();
    let (clean, _) = RecordStore::load(&path, &schema).unwrap();
    assert_eq!(clean.keys(), vec!["a.tif"]);
}

#[test]
fn failed_clean_write_keeps_record_clean() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    batch.add_document("b.tif").unwrap();
    batch.save().unwrap();
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    assert!(batch.escalate("a.tif", Comment::new(1, "name", "unclear")).is_err());

    assert_eq!(batch.locate("a.tif"), Some(RecordState::Clean));
    std::fs::remove_dir(&path).unwrap();
    batch.save().unwrap();
    assert_eq!(
        keys_on_disk(&project, &path),
        (vec!["a.tif".to_string(), "b.tif".to_string()], vec![])
    );
}

#[test]
fn review_file_is_restored_when_clean_write_fails() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    batch.save().unwrap();
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    assert!(batch.escalate("a.tif", Comment::new(1, "name", "unclear")).is_err());

    let schema = project.schema();
    let (review, _) = RecordStore::load(&formzone_core::review_path_for(&path), &schema).unwrap();
    assert!(review.keys().is_empty());
}

#[test]
fn failed_deescalation_keeps_record_under_review() {
    let (dir, path) = temp_project();
    let project = Project::open(dir.path()).unwrap();
    let (batch, _) = project.open_batch(&path).unwrap();
    batch.add_document("a.tif").unwrap();
    batch.escalate("a.tif", Comment::new(1, "name", "unclear")).unwrap();
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    assert!(batch.deescalate("a.tif").is_err());

    assert_eq!(batch.locate("a.tif"), Some(RecordState::UnderReview));
    batch.read(|d| {
        assert!(d.clean.is_empty());
        assert!(d.review.ledger(0).unwrap().has_escalation());
    });
    std::fs::remove_dir(&path).unwrap();
    batch.save().unwrap();
    assert_eq!(keys_on_disk(&project, &path), (vec![], vec!["a.tif".to_string()]));
}

fn batch_with(project: &Project, dir: &std::path::Path, documents: usize) -> formzone_core::Batch {
    let (batch, _) = project.open_batch(dir.join("prop.csv")).unwrap();
    for n in 0..documents {
        batch.add_document(&format!("doc{n}.tif")).unwrap();
    }
    batch
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_document_lives_in_exactly_one_dataset(
        ops in prop::collection::vec((0usize..4, any::<bool>()), 1..12)
    ) {
        let (dir, _) = temp_project();
        let project = Project::open(dir.path()).unwrap();
        let batch = batch_with(&project, dir.path(), 4);

        for (doc, escalate) in ops {
            let key = format!("doc{doc}.tif");
            if escalate {
                batch.escalate(&key, Comment::new(1, "name", "check")).unwrap();
            } else {
                // De-escalating a clean record is rejected without side effects.
                let _ = batch.deescalate(&key);
            }
        }

        let (clean, review) = batch.read(|d| (d.clean.keys(), d.review.keys()));
        let clean: HashSet<_> = clean.into_iter().collect();
        let review: HashSet<_> = review.into_iter().collect();
        prop_assert!(clean.is_disjoint(&review));
        prop_assert_eq!(clean.len() + review.len(), 4);
        for key in &review {
            let escalated = batch
                .with_ledger(key, |ledger| Ok(ledger.has_escalation()))
                .unwrap();
            prop_assert!(escalated);
        }
    }
}
