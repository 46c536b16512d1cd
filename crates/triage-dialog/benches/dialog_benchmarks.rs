//! Benchmarks for per-turn dialogue processing and transcript scoring.
//!
//! A turn (resolver, extraction, topics, policy) and a full diagnosis over a
//! long transcript should both stay well under a millisecond.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use triage_core::config::DialogConfig;
use triage_core::types::{Consent, Message, PatientProfile};
use triage_dialog::{DialogEngine, EntityExtractor, TriageScorer};

const UTTERANCES: &[&str] = &[
    "가슴이 너무 조이고 30분째 아파요",
    "두 시간 전부터 숨이 차요",
    "어제부터 배가 아프고 설사를 해요",
    "식은땀이 나고 열이 있어요",
    "네. 더 심해집니다.",
    "아니요. 활동 시에만 숨이 찹니다.",
    "잘 모르겠어요",
];

/// A transcript of `turns` user/assistant pairs.
fn build_transcript(turns: usize) -> Vec<Message> {
    (0..turns)
        .flat_map(|i| {
            [
                Message::user(UTTERANCES[i % UTTERANCES.len()]),
                Message::assistant("안정 시에도 숨이 차신가요?"),
            ]
        })
        .collect()
}

fn bench_extraction(c: &mut Criterion) {
    let extractor = EntityExtractor::new();

    let mut group = c.benchmark_group("extraction");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("extract_single_utterance", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let e = extractor.extract(UTTERANCES[idx % UTTERANCES.len()]);
            idx += 1;
            e
        });
    });

    group.finish();
}

fn bench_turns(c: &mut Criterion) {
    let engine = DialogEngine::new(DialogConfig::default());
    let consent = Consent {
        privacy: true,
        location: true,
    };

    let mut group = c.benchmark_group("dialogue");
    group.sample_size(100);

    // Fresh conversation per iteration so the policy never runs dry.
    group.bench_function("three_turn_dialogue", |b| {
        b.iter(|| {
            let mut conv = match engine.start(PatientProfile::default(), consent) {
                Ok(conv) => conv,
                Err(e) => panic!("start failed: {}", e),
            };
            for text in &UTTERANCES[4..7] {
                let _ = engine.submit(&mut conv, text);
            }
            conv
        });
    });

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let scorer = TriageScorer::new();
    let short = build_transcript(5);
    let long = build_transcript(200);

    let mut group = c.benchmark_group("scoring");
    group.bench_function("assess_10_messages", |b| b.iter(|| scorer.assess(&short)));
    group.bench_function("assess_400_messages", |b| b.iter(|| scorer.assess(&long)));
    group.finish();
}

criterion_group!(benches, bench_extraction, bench_turns, bench_scoring);
criterion_main!(benches);
