//! Cache and Field Access Benchmarks
//!
//! Benchmarks for cached versus fresh field reads, fingerprinting and
//! template solidification.
//!
//! Run with: `cargo bench --bench cache_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pagebind::cache::fingerprint;
use pagebind::prelude::*;
use std::rc::Rc;

fn form(fields: usize) -> Rc<MockDriver> {
    Rc::new(MockDriver::with_body(vec![MockElement::new("form")
        .id("form")
        .children(
            (0..fields).map(|i| MockElement::input("text").id(&format!("f{i}")).value("x")),
        )]))
}

fn page(driver: &Rc<MockDriver>, cache: bool) -> PageContext {
    let object = PageObjectBuilder::new("form")
        .with_field("first", FieldSpec::single("f0").value_only())
        .build()
        .unwrap();
    PageContext::with_config(
        driver.clone(),
        object,
        PageConfig::new().with_timeout(0).with_cache(cache),
    )
}

fn bench_field_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_read");

    for (name, cache) in [("cached", true), ("uncached", false)] {
        let driver = form(50);
        let page = page(&driver, cache);
        group.bench_function(BenchmarkId::from_parameter(name), |bench| {
            bench.iter(|| {
                let value = page.read_field(black_box("first")).unwrap();
                black_box(value.as_str().map(str::len));
            });
        });
    }

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for fields in [1, 10, 100] {
        let driver = form(fields);
        let scope = SearchContext::Element(driver.element_by_id("form").unwrap());
        group.bench_with_input(BenchmarkId::from_parameter(fields), &scope, |bench, scope| {
            bench.iter(|| black_box(fingerprint(&*driver, black_box(scope)).unwrap()));
        });
    }

    group.finish();
}

fn bench_solidify(c: &mut Criterion) {
    let mut group = c.benchmark_group("solidify");

    let templates = vec![
        ("sequential", Locator::css("tr:nth-child({}) > td:nth-child({})")),
        ("positional", Locator::css("li[data-id={1}][data-kind={0}]")),
    ];

    for (name, template) in templates {
        group.bench_with_input(BenchmarkId::from_parameter(name), &template, |bench, t| {
            bench.iter(|| black_box(t.solidify(black_box(&["3", "7"])).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_field_read, bench_fingerprint, bench_solidify);
criterion_main!(benches);
