use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nimbus_common::time::MockClock;
use nimbus_core::context::{Context, ContextKey};
use nimbus_core::credentials::Credential;
use nimbus_core::http::{Method, Request, Response};
use nimbus_core::pipeline::{Pipeline, RetryPolicy, Transport, TransportPolicy};
use nimbus_core::{ClientSecretCredential, CredentialPolicy, SdkResult};

static KEY: ContextKey = ContextKey::new("bench");

const TOKEN: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n\
    {\"access_token\":\"BenchToken\",\"expires_in\":3600}";
const OK: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}";

/// Answers token requests with a token and everything else with `200 {}`.
struct StaticTransport;

impl Transport for StaticTransport {
    fn send(&self, request: &Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
        if request.url().ends_with("/oauth2/v2.0/token") {
            response.write(TOKEN)
        } else {
            response.write(OK)
        }
    }
}

/// Calls `f` with the leaf of a chain `depth` nodes below `parent`; nodes
/// borrow their parent, so the chain lives in nested stack frames.
fn with_chain(parent: &Context<'_>, depth: usize, f: &mut dyn FnMut(&Context<'_>)) {
    let child = Context::with_expiration(Some(parent), i64::MAX);
    if depth == 0 {
        f(&child);
    } else {
        with_chain(&child, depth - 1, f);
    }
}

fn bench_context(c: &mut Criterion) {
    let root = Context::root();
    let bound = Context::with_value(Some(&root), &KEY, &42_u32);
    let deadline = Context::with_expiration(Some(&bound), 1_000);

    with_chain(&deadline, 16, &mut |leaf| {
        c.bench_function("context_expiration_depth_16", |b| {
            b.iter(|| black_box(leaf.expiration()));
        });
        c.bench_function("context_value_depth_16", |b| {
            b.iter(|| black_box(leaf.value_as::<u32>(&KEY).ok()));
        });
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let clock = MockClock::starting_at(100_000_000);
    let transport = StaticTransport;
    let mut credential =
        ClientSecretCredential::new("TenantID", "ClientID", "ClientSecret", None).unwrap();
    credential.set_scopes("https://storage.azure.com/.default").unwrap();
    let (retry, auth, terminal) =
        (RetryPolicy::default(), CredentialPolicy::new(&credential), TransportPolicy);
    let pipeline = Pipeline::new([&retry, &auth, &terminal], &clock, &transport);
    let ctx = Context::root();

    c.bench_function("pipeline_cached_token", |b| {
        b.iter(|| {
            let (mut url, mut headers, mut raw) = ([0u8; 128], [0u8; 256], [0u8; 256]);
            let mut request = Request::new(
                &ctx,
                Method::Get,
                "https://example.com/data",
                &mut url,
                &mut headers,
                b"",
            )
            .unwrap();
            let mut response = Response::new(&mut raw);
            pipeline.process(&mut request, &mut response).unwrap();
            black_box(response.status().unwrap())
        });
    });
}

fn bench_response_parse(c: &mut Criterion) {
    let mut raw = [0u8; 256];
    let mut response = Response::new(&mut raw);
    let raw_response: &[u8] = b"HTTP/1.1 503 Service Unavailable\r\n\
        Content-Type: text/plain\r\nretry-after-ms: 250\r\n\r\nbusy";
    response.write(raw_response).unwrap();

    c.bench_function("response_status_and_header", |b| {
        b.iter(|| {
            black_box(response.status().ok());
            black_box(response.header("retry-after-ms"));
            black_box(response.body().ok());
        });
    });
}

criterion_group!(benches, bench_context, bench_pipeline, bench_response_parse);
criterion_main!(benches);
