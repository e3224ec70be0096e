use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use turn_navigator::adapters::{Adapter, Platform};
use turn_navigator::tree::Element;
use turn_navigator::{Document, EngineConfig, Session, rescan};
use url::Url;

/// Synthetic ChatGPT thread with alternating turns; every fifth user turn names a file.
fn generate_thread(turns: usize) -> Document {
    let url = Url::parse("https://chatgpt.com/c/bench").expect("valid url");
    let mut doc = Document::new(url);
    let main = doc.create_element(Element::new("main").with_attr("id", "thread"));
    doc.append_child(doc.root(), main).expect("append main");

    for i in 0..turns {
        let role = if i % 2 == 0 { "user" } else { "assistant" };
        let turn = doc.create_element(
            Element::new("div")
                .with_attr("data-message-author-role", role)
                .with_attr("data-message-id", format!("m-{}", i)),
        );
        let body = doc.create_element(Element::new("div").with_class("markdown"));
        let text = if i % 10 == 0 {
            format!("Please review module_{}.rs and explain the borrow errors", i)
        } else {
            format!("Turn {} discussing ownership, lifetimes and trait objects in some depth", i)
        };
        let text = doc.create_text(text);
        doc.append_child(body, text).expect("append text");
        doc.append_child(turn, body).expect("append body");
        doc.append_child(main, turn).expect("append turn");
    }
    doc
}

fn bench_rescan(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescan");
    let adapter = Adapter::new(Platform::ChatGpt);
    let config = EngineConfig::default();

    for size in [50, 500, 2_000].iter() {
        let doc = generate_thread(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("cold", size), size, |b, _| {
            b.iter(|| {
                let mut session = Session::new(Platform::ChatGpt);
                rescan(&adapter, black_box(&doc), &mut session, &config);
                session.index().len()
            });
        });

        // Unchanged tree against a populated session: the steady state while idle.
        group.bench_with_input(BenchmarkId::new("warm", size), size, |b, _| {
            let mut session = Session::new(Platform::ChatGpt);
            rescan(&adapter, &doc, &mut session, &config);
            b.iter(|| rescan(&adapter, black_box(&doc), &mut session, &config));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rescan);
criterion_main!(benches);
