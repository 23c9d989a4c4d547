//! End-to-end binding with the standard plug-in set.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gleaner::{BindErrorKind, BindOptions, BindRequest, Binder, CoercionError, Record};
use gleaner_extract::{standard, ExtractError, JsonDecoder, JSON};
use http::Method;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn binder() -> Binder {
    init_tracing();
    standard().build().unwrap()
}

#[derive(Debug, Default, Record)]
struct ListIssues {
    #[bind(path = "repo")]
    repo: String,
    #[bind(query = "label", dedup, sort)]
    labels: Vec<String>,
    #[bind(query = "per_page", default = "30", clamp = "1,100")]
    per_page: u32,
    #[bind(query = "state", header = "x-default-state", default = "open", case = "lower")]
    state: String,
    #[bind(cookie = "session")]
    session: Option<String>,
    #[bind(header = "accept-language")]
    languages: Vec<String>,
}

#[test]
fn test_all_sources() {
    let req = BindRequest::builder()
        .uri("/repos/anvil/issues?label=bug&label=api&label=bug&per_page=500&state=CLOSED")
        .path_param("repo", "anvil")
        .header("cookie", "theme=dark; session=\"s-1\"")
        .header("accept-language", "en")
        .header("accept-language", "de")
        .build();

    let mut issues = ListIssues::default();
    binder().bind(&req, &mut issues).unwrap();

    assert_eq!(issues.repo, "anvil");
    assert_eq!(issues.labels, vec!["api", "bug"]);
    assert_eq!(issues.per_page, 100);
    assert_eq!(issues.state, "closed");
    assert_eq!(issues.session.as_deref(), Some("s-1"));
    assert_eq!(issues.languages, vec!["en", "de"]);
}

#[test]
fn test_defaults_and_fallbacks() {
    let req = BindRequest::builder()
        .uri("/repos/anvil/issues")
        .header("x-default-state", "All")
        .build();

    let mut issues = ListIssues::default();
    binder().bind(&req, &mut issues).unwrap();

    assert_eq!(issues.per_page, 30);
    assert_eq!(issues.state, "all");
    assert_eq!(issues.session, None);
    assert!(issues.labels.is_empty());
}

#[derive(Debug, Default, Record)]
struct Comment {
    #[bind(path = "id")]
    post_id: u64,
    #[bind(trim)]
    name: String,
    #[bind(body = "tags", trim, dedup)]
    tags: Vec<String>,
}

fn post(content_type: &str, body: &str) -> BindRequest {
    BindRequest::builder()
        .method(Method::POST)
        .uri("/posts/3/comments")
        .path_param("id", "3")
        .header("content-type", content_type)
        .body(body.to_string())
        .build()
}

#[test]
fn test_json_body_with_charset() {
    let req = post(
        "application/json; charset=utf-8",
        r#"{"name":" J ","tags":["a"," a","b"]}"#,
    );

    let mut comment = Comment::default();
    binder().bind(&req, &mut comment).unwrap();

    assert_eq!(comment.post_id, 3);
    assert_eq!(comment.name, "J");
    assert_eq!(comment.tags, vec!["a", "b"]);
}

#[test]
fn test_form_body() {
    let req = post(
        "application/x-www-form-urlencoded",
        "name=Ann+Lee&tags=x&tags=y&tags=x",
    );

    let mut comment = Comment::default();
    binder().bind(&req, &mut comment).unwrap();

    assert_eq!(comment.name, "Ann Lee");
    assert_eq!(comment.tags, vec!["x", "y"]);
}

#[test]
fn test_body_preserved_for_later_reads() {
    let binder = standard()
        .options(BindOptions::default().preserve_body(true))
        .build()
        .unwrap();
    let req = post(JSON, r#"{"name":"J"}"#);

    let mut comment = Comment::default();
    binder.bind(&req, &mut comment).unwrap();

    assert_eq!(comment.name, "J");
    assert_eq!(&req.read_body().unwrap()[..], br#"{"name":"J"}"#);
}

#[test]
fn test_unregistered_content_type_is_skipped() {
    let req = post("application/xml", "<comment><name>J</name></comment>");

    let mut comment = Comment::default();
    binder().bind(&req, &mut comment).unwrap();

    assert_eq!(comment.name, "");
    assert_eq!(comment.post_id, 3);
}

#[test]
fn test_oversized_body() {
    let binder = standard()
        .decoder("application/vnd.small+json", JsonDecoder::new().with_limit(8))
        .build()
        .unwrap();
    let req = post("application/vnd.small+json", r#"{"name":"much too long"}"#);

    let err = binder.bind(&req, &mut Comment::default()).unwrap_err();

    assert_eq!(err.kind(), BindErrorKind::Decode);
    let source = std::error::Error::source(&err).unwrap();
    assert!(matches!(
        source.downcast_ref::<ExtractError>(),
        Some(ExtractError::PayloadTooLarge { limit: 8, .. })
    ));
}

/// Reader that records whether it was ever polled.
struct Tracked {
    read: Arc<AtomicBool>,
}

impl Read for Tracked {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        self.read.store(true, Ordering::SeqCst);
        Ok(0)
    }
}

#[test]
fn test_oversized_stream_rejected_before_read() {
    let read = Arc::new(AtomicBool::new(false));
    let binder = standard()
        .options(BindOptions::default().preserve_body(true))
        .build()
        .unwrap();
    let req = BindRequest::builder()
        .method(Method::POST)
        .header("content-type", JSON)
        .header("content-length", "2097152")
        .reader(Tracked {
            read: Arc::clone(&read),
        })
        .build();

    let err = binder.bind(&req, &mut Comment::default()).unwrap_err();

    assert_eq!(err.kind(), BindErrorKind::Decode);
    let source = std::error::Error::source(&err).unwrap();
    assert!(matches!(
        source.downcast_ref::<ExtractError>(),
        Some(ExtractError::PayloadTooLarge { size: 2_097_152, .. })
    ));
    assert!(!read.load(Ordering::SeqCst));
}

#[derive(Debug, Default, Record)]
struct Limits {
    #[bind(query = "small")]
    small: i8,
    #[bind(query = "count")]
    count: u16,
    #[bind(query = "ratio")]
    ratio: f64,
}

#[test]
fn test_coercion_range_safety() {
    let binder = binder();

    let req = BindRequest::builder().uri("/?small=1000").build();
    let err = binder.bind(&req, &mut Limits::default()).unwrap_err();
    assert!(matches!(err.coercion(), Some(CoercionError::Overflow { .. })));

    let req = BindRequest::builder().uri("/?count=-1").build();
    let err = binder.bind(&req, &mut Limits::default()).unwrap_err();
    assert!(matches!(err.coercion(), Some(CoercionError::Sign { .. })));

    let req = BindRequest::builder().uri("/?ratio=42").build();
    let mut limits = Limits::default();
    binder.bind(&req, &mut limits).unwrap();
    assert!((limits.ratio - 42.0).abs() < f64::EPSILON);
}

#[test]
fn test_invalid_transform_annotation_is_fatal() {
    #[derive(Debug, Default, Record)]
    struct Shout {
        #[bind(query = "q", case = "loud")]
        q: String,
    }

    let req = BindRequest::builder().uri("/?q=hi").build();
    let err = binder().bind(&req, &mut Shout::default()).unwrap_err();

    assert_eq!(err.kind(), BindErrorKind::Transform);
    assert_eq!(err.field(), Some("q"));
}

#[derive(Debug, Default, Record)]
struct Member {
    #[bind(query = "name")]
    name: String,
    #[bind(query = "age")]
    age: u32,
}

#[test]
fn test_pooled_instances_do_not_leak() {
    let binder = standard().instance_pool_size(1).build().unwrap();

    let a = BindRequest::builder().uri("/?name=X&age=30").build();
    let first = binder
        .bind_pooled(&a, |m: &mut Member| (m.name.clone(), m.age))
        .unwrap();
    assert_eq!(first, ("X".to_string(), 30));

    let b = BindRequest::builder().uri("/?name=Y").build();
    let second = binder
        .bind_pooled(&b, |m: &mut Member| (m.name.clone(), m.age))
        .unwrap();
    assert_eq!(second, ("Y".to_string(), 0));
}
