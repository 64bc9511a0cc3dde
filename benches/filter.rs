use criterion::{criterion_group, criterion_main, Criterion};
use veil_css::callback::RelativeUriCallback;
use veil_css::config::FilterConfig;
use veil_css::CssFilter;

const SHEET: &str = r#"@charset "utf-8";
@import url(base.css) screen;
body { margin: 0; padding: 0 1em; font: 12px/1.5 "Helvetica Neue", Arial, sans-serif; color: #333 }
h1, h2 > a.title, ul li:first-child { color: rgb(10, 20, 30) !important; text-decoration: none }
a:hover { background: url(img/hover.png) no-repeat left top }
div[lang|="en"] { border: 1px solid red; box-shadow: 1px 1px 2px black, inset 0 0 3px #fff }
@media print, tv { .noprint { display: none } p { page-break-after: always } }
badtag { color: red } p { foo: { bar }; color: blue }
"#;

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    group.significance_level(0.1).sample_size(200);

    let sheet = SHEET.repeat(50);
    let callback = RelativeUriCallback::new();
    let filter = CssFilter::new(FilterConfig::default(), &callback);

    group.bench_function("stylesheet", |b| {
        b.iter(|| filter.filter_str(&sheet))
    });
    group.bench_function("bytes", |b| {
        b.iter(|| filter.filter_bytes(sheet.as_bytes()))
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
