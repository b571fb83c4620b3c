use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use nasse::prelude::*;
use nasse::router::{PathPattern, Router};
use serde_json::json;

const PATTERNS: &[&str] = &[
    "/",
    "/zoo/animals",
    "/zoo/animals/<int:id>",
    "/zoo/animals/<int:id>/toys/<toy_id>",
    "/zoo/<category>/animals/<int:id>/habitats/<habitat_id>/sections/<section_id>",
    "/inventory/<warehouse_id>/feeds/<feed_id>/items/<item_id>/batches/<batch_id>",
    "/complex/<a>/<b>/<c>/<d>/<e>/<f>/<g>/<h>/<i>",
    "/zoo/health",
];

const PATHS: &[&str] = &[
    "/zoo/animals/123",
    "/zoo/animals/123/toys/456",
    "/zoo/cats/animals/123/habitats/88/sections/5",
    "/inventory/1/feeds/2/items/3/batches/4",
    "/complex/1/2/3/4/5/6/7/8/9",
    "/zoo/health",
];

fn bench_route_resolve(c: &mut Criterion) {
    let mut router = Router::new();
    for (i, pattern) in PATTERNS.iter().enumerate() {
        router.insert(PathPattern::parse(pattern).unwrap(), i);
    }

    c.bench_function("route_resolve", |b| {
        b.iter(|| {
            for path in PATHS {
                let res = router.resolve(path);
                black_box(&res);
            }
        })
    });
}

fn bench_app_handle(c: &mut Criterion) {
    let mut app = App::new(Config::named("Bench"));
    app.route(
        Endpoint::builder()
            .path("/zoo/animals/<int:id>")
            .param(Parameter::new("fields").optional())
            .handler(Handler::from_fn(|ctx| {
                json!({"id": ctx.dynamics().get("id").cloned()})
            })),
    )
    .unwrap();

    c.bench_function("app_handle", |b| {
        b.iter(|| {
            let res = app.handle(IncomingRequest::get("/zoo/animals/123?fields=name"));
            black_box(res);
        })
    });
}

criterion_group!(benches, bench_route_resolve, bench_app_handle);
criterion_main!(benches);
