//! Concurrent ingestion against a shared engine.

use std::sync::Arc;
use std::thread;

use mastery_core::catalog::{Catalog, Unit};
use mastery_core::engine::{EngineConfig, ProgressEngine};
use mastery_core::model::{GradedAnswer, NewQuestion};

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

fn shared_engine() -> Arc<ProgressEngine> {
    let catalog = Catalog::from_units(vec![
        Unit {
            name: "Trees".into(),
            subtopics: vec!["Heaps".into(), "AVL".into()],
        },
        Unit {
            name: "Hashing".into(),
            subtopics: vec!["Probing".into()],
        },
    ])
    .unwrap();
    let engine = ProgressEngine::new(catalog, EngineConfig::default());
    for (id, unit, topic) in [
        ("Q-heap", "Trees", "Heaps"),
        ("Q-avl", "Trees", "AVL"),
        ("Q-probe", "Hashing", "Probing"),
    ] {
        engine
            .create_question(NewQuestion {
                id: id.into(),
                text: topic.into(),
                source: "test".into(),
                author_student_id: None,
                unit: unit.into(),
                topic: topic.into(),
            })
            .unwrap();
    }
    Arc::new(engine)
}

fn answer(question_id: &str, student_id: String, score: u8) -> GradedAnswer {
    GradedAnswer {
        question_id: question_id.into(),
        student_id,
        answer_text: String::new(),
        elapsed_seconds: 1.0,
        char_count: 0,
        suspected_copy: false,
        correct: true,
        score: Some(score),
        feedback: None,
    }
}

#[test]
fn one_subtopic_many_writers_keeps_exact_counts() {
    let engine = shared_engine();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let score = ((t + i) % 11) as u8;
                    engine
                        .ingest_graded_answer(answer("Q-heap", format!("S{t}"), score))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = THREADS * PER_THREAD;
    let expected_mean = (0..THREADS)
        .flat_map(|t| (0..PER_THREAD).map(move |i| ((t + i) % 11) as f64 * 10.0))
        .sum::<f64>()
        / total as f64;

    let aggregate = engine.subtopic_aggregate("Heaps").unwrap();
    assert_eq!(aggregate.attempt_count, total as u64);
    assert!(
        (aggregate.accuracy - expected_mean).abs() < 1e-6,
        "accuracy {} != {expected_mean}",
        aggregate.accuracy
    );

    let question = engine.question("Q-heap").unwrap();
    assert_eq!(question.attempt_count, total as u64);
    assert_eq!(question.responses.len(), total);
}

#[test]
fn one_student_many_writers_keeps_exact_attempts() {
    let engine = shared_engine();
    engine.ensure_student("S-shared");

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    engine
                        .ingest_graded_answer(answer("Q-probe", "S-shared".into(), 9))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let progress = engine.student_progress("S-shared").unwrap();
    let probing = progress.topic_progress["Probing"];
    assert_eq!(probing.attempts as usize, THREADS * PER_THREAD);
    assert_eq!(probing.average_score, 9.0);
    assert!(progress.completed_topics.contains("Probing"));
    assert!(progress.completed_units.contains("Hashing"));
    assert_eq!(progress.unit_progress["Hashing"], 100.0);
}

#[test]
fn independent_keys_do_not_interfere() {
    let engine = shared_engine();

    let handles: Vec<_> = ["Q-heap", "Q-avl", "Q-probe"]
        .into_iter()
        .enumerate()
        .map(|(n, question)| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    engine
                        .ingest_graded_answer(answer(question, format!("S{}", i % 5), (n * 3) as u8))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for (topic, accuracy) in [("Heaps", 0.0), ("AVL", 30.0), ("Probing", 60.0)] {
        let aggregate = engine.subtopic_aggregate(topic).unwrap();
        assert_eq!(aggregate.attempt_count, PER_THREAD as u64);
        assert!((aggregate.accuracy - accuracy).abs() < 1e-9);
    }
    assert_eq!(engine.student_ids().len(), 5);
}
