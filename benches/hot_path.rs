use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use storefront_gateway::api::sticky::merge_sticky;
use storefront_gateway::config::{Credential, UpstreamConfig, UpstreamFamily};
use storefront_gateway::query::QueryParams;
use storefront_gateway::transport::PreparedUpstream;

fn listing_body(count: u64) -> Vec<u8> {
    let posts: Vec<_> = (1..=count)
        .map(|id| {
            json!({
                "id": id,
                "slug": format!("post-{id}"),
                "title": { "rendered": format!("Post {id}") },
                "excerpt": { "rendered": "<p>Lorem ipsum dolor sit amet.</p>" },
                "_embedded": {
                    "author": [{ "id": 1, "name": "Editor" }],
                    "wp:featuredmedia": [{ "source_url": "https://cdn.example.com/a.jpg" }]
                }
            })
        })
        .collect();
    serde_json::to_vec(&posts).unwrap_or_default()
}

fn bench_sticky_merge(c: &mut Criterion) {
    let sticky = listing_body(1);
    let primary = listing_body(11);
    c.bench_function("sticky_merge_11_posts", |b| {
        b.iter(|| {
            black_box(
                merge_sticky(black_box(&sticky), black_box(&primary))
                    .expect("merge")
                    .expect("merged body"),
            )
        });
    });

    let empty_sticky = b"[]".to_vec();
    c.bench_function("sticky_merge_noop", |b| {
        b.iter(|| black_box(merge_sticky(black_box(&empty_sticky), black_box(&primary)).expect("merge")));
    });
}

fn bench_query_rewrite(c: &mut Criterion) {
    let raw = "page=1&per_page=12&categories=5&orderby=date&order=desc&search=shoes";
    c.bench_function("query_parse_and_set", |b| {
        b.iter(|| {
            let mut params = QueryParams::parse(black_box(Some(raw)));
            params.set("per_page", "11");
            params.append("_embed", "");
            black_box(params)
        });
    });
}

fn bench_endpoint_url(c: &mut Criterion) {
    let upstream = PreparedUpstream::new(
        UpstreamFamily::Content,
        &UpstreamConfig::new(
            "https://shop.example.com/wp-json/wp/v2",
            Credential::new("Basic d3A6c2VjcmV0"),
        ),
    );
    let params = QueryParams::parse(Some("per_page=11&categories=5&_embed="));
    c.bench_function("endpoint_url_posts", |b| {
        b.iter(|| {
            black_box(
                upstream
                    .endpoint_url(black_box("/posts"), black_box(&params))
                    .expect("endpoint url"),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_sticky_merge,
    bench_query_rewrite,
    bench_endpoint_url
);
criterion_main!(benches);
