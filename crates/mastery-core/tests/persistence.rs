//! Snapshot save/restore through the engine.

use mastery_core::catalog::{Catalog, Unit};
use mastery_core::engine::{EngineConfig, ProgressEngine};
use mastery_core::model::{GradedAnswer, NewQuestion, QuestionTypeAssignment};
use mastery_core::snapshot::StateSnapshot;

fn catalog(topics: &[&str]) -> Catalog {
    Catalog::from_units(vec![Unit {
        name: "Sorting".into(),
        subtopics: topics.iter().map(|t| t.to_string()).collect(),
    }])
    .unwrap()
}

fn populated_engine() -> ProgressEngine {
    let engine = ProgressEngine::new(
        catalog(&["Bubble", "Merge", "Quick"]),
        EngineConfig::default(),
    );
    engine
        .create_question(NewQuestion {
            id: "Q1".into(),
            text: "【計算題】Merge sort comparisons for n = 8?".into(),
            source: "generated".into(),
            author_student_id: Some("S2".into()),
            unit: "Sorting".into(),
            topic: "Bubble".into(),
        })
        .unwrap();
    engine
        .assign_type(&QuestionTypeAssignment {
            id: "Q1".into(),
            qa_type: "計算題".into(),
        })
        .unwrap();

    for (student, score) in [("S1", 9), ("S1", 8), ("S2", 3), ("S1", 10)] {
        engine
            .ingest_graded_answer(GradedAnswer {
                question_id: "Q1".into(),
                student_id: student.into(),
                answer_text: "17".into(),
                elapsed_seconds: 30.0,
                char_count: 2,
                suspected_copy: false,
                correct: score > 5,
                score: Some(score),
                feedback: None,
            })
            .unwrap();
    }
    engine.advance_if_ready("S1", "Bubble").unwrap();
    engine
}

#[test]
fn restored_engine_reproduces_every_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let original = populated_engine();
    original.snapshot().save_json(&path).unwrap();

    let restored = ProgressEngine::restore(
        catalog(&["Bubble", "Merge", "Quick"]),
        EngineConfig::default(),
        StateSnapshot::load_json(&path).unwrap(),
    );

    assert_eq!(restored.question("Q1").unwrap(), original.question("Q1").unwrap());
    assert_eq!(restored.subtopic_aggregates(), original.subtopic_aggregates());
    assert_eq!(restored.student_ids(), original.student_ids());
    for student in original.student_ids() {
        assert_eq!(
            restored.student_progress(&student).unwrap(),
            original.student_progress(&student).unwrap()
        );
        assert_eq!(
            restored.current_topic(&student, "Sorting").unwrap(),
            original.current_topic(&student, "Sorting").unwrap()
        );
    }

    let s1 = restored.student_progress("S1").unwrap();
    assert!(s1.completed_topics.contains("Bubble"));
    assert!(s1.topic_progress.contains_key("Merge"));
}

#[test]
fn restore_syncs_aggregates_to_a_changed_catalog() {
    let original = populated_engine();
    let snapshot = original.snapshot();

    let restored = ProgressEngine::restore(
        catalog(&["Bubble", "Heap"]),
        EngineConfig::default(),
        snapshot,
    );

    assert_eq!(restored.subtopic_aggregate("Bubble").unwrap().attempt_count, 4);
    assert_eq!(restored.subtopic_aggregate("Heap").unwrap().attempt_count, 0);
    assert!(restored.subtopic_aggregate("Merge").is_err());
}

#[test]
fn restored_engine_keeps_counting() {
    let original = populated_engine();
    let restored = ProgressEngine::restore(
        catalog(&["Bubble", "Merge", "Quick"]),
        EngineConfig::default(),
        original.snapshot(),
    );

    let outcome = restored
        .ingest_graded_answer(GradedAnswer {
            question_id: "Q1".into(),
            student_id: "S2".into(),
            answer_text: "17".into(),
            elapsed_seconds: 12.0,
            char_count: 2,
            suspected_copy: false,
            correct: true,
            score: Some(7),
            feedback: None,
        })
        .unwrap();
    assert_eq!(outcome.question_attempts, 5);
    assert_eq!(outcome.subtopic_attempts, 5);
    assert_eq!(outcome.topic_progress.attempts, 2);
    assert_eq!(outcome.topic_progress.average_score, 5.0);
}

#[test]
fn restore_moves_questions_with_their_topic() {
    let snapshot = populated_engine().snapshot();
    let regrouped = Catalog::from_units(vec![
        Unit {
            name: "Sorting".into(),
            subtopics: vec!["Merge".into(), "Quick".into()],
        },
        Unit {
            name: "Warm-up".into(),
            subtopics: vec!["Bubble".into()],
        },
    ])
    .unwrap();

    let restored = ProgressEngine::restore(regrouped, EngineConfig::default(), snapshot);
    assert_eq!(restored.question("Q1").unwrap().unit, "Warm-up");
    assert_eq!(restored.subtopic_aggregate("Bubble").unwrap().unit, "Warm-up");

    let outcome = restored
        .ingest_graded_answer(GradedAnswer {
            question_id: "Q1".into(),
            student_id: "S1".into(),
            answer_text: "17".into(),
            elapsed_seconds: 9.0,
            char_count: 2,
            suspected_copy: false,
            correct: true,
            score: Some(9),
            feedback: None,
        })
        .unwrap();
    assert_eq!(outcome.unit, "Warm-up");
    assert_eq!(outcome.unit_progress, 100.0);
    assert!(outcome.unit_completed);
}
