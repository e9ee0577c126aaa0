//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mentorflow::completion::StaticCompletion;
use mentorflow::core::{ConversationAggregator, Message};
use mentorflow::knowledge::KnowledgeStore;
use mentorflow::pipeline::{mentorship_pipeline, MentorshipWorkflow};
use mentorflow::stages::classify_framework;
use std::sync::Arc;

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let workflow = MentorshipWorkflow::new(
        Arc::new(KnowledgeStore::new()),
        Arc::new(StaticCompletion::new("function App() {}")),
    )
    .unwrap();

    for mentor in [false, true] {
        c.bench_function(&format!("mentorship_run/mentor={mentor}"), |b| {
            b.iter(|| {
                runtime
                    .block_on(workflow.run(
                        "bench-thread",
                        vec![Message::user("Tell me about React")],
                        black_box(mentor),
                    ))
                    .unwrap()
            });
        });
    }

    c.bench_function("compile_mentorship", |b| {
        let completion = Arc::new(StaticCompletion::new("ok"));
        b.iter(|| mentorship_pipeline(completion.clone()).unwrap());
    });
}

fn primitives_benchmark(c: &mut Criterion) {
    c.bench_function("classify_framework", |b| {
        b.iter(|| classify_framework(black_box("I would like to build a Node.js service")));
    });

    let history: Vec<Message> = (0..64).map(|i| Message::user(format!("m{i}"))).collect();
    c.bench_function("aggregator_merge_64", |b| {
        b.iter(|| {
            ConversationAggregator::merge(history.clone(), vec![Message::system("new")])
        });
    });
}

criterion_group!(benches, pipeline_benchmark, primitives_benchmark);
criterion_main!(benches);
