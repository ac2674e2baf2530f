//! End-to-end behavior of the interceptor pipeline over fake transports.

use std::error::Error as _;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use waypoint_client::{
    BoxError, BoxFuture, Client, ClientError, FnInterceptor, FnTransport, HeaderInterceptor,
    HttpMethod, Interceptor, Next, QueryItem, Request, Response, Transport, Uri, redaction,
};

/// Serializes tests that depend on the process-wide redaction policy.
static REDACTION_LOCK: Mutex<()> = Mutex::new(());

fn redaction_guard() -> MutexGuard<'static, ()> {
    REDACTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(feature = "tracing")]
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn base_url() -> Uri {
    Uri::from_static("http://localhost:3000")
}

type Log = Arc<Mutex<Vec<String>>>;

/// A transport that records every request and answers `200 "ok"`.
#[derive(Clone, Default)]
struct RecordingTransport {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Request>>>,
}

impl RecordingTransport {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: Request, _base_url: Uri) -> BoxFuture<'_, Result<Response, BoxError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request);
        Box::pin(async { Ok(Response::new(200).with_body("ok")) })
    }
}

/// Records when the request passes on the way in and the response on the way out.
struct Tracer {
    label: &'static str,
    log: Log,
}

impl Interceptor for Tracer {
    fn intercept(
        &self,
        request: Request,
        base_url: Uri,
        next: Next,
    ) -> BoxFuture<'_, Result<Response, BoxError>> {
        Box::pin(async move {
            self.log.lock().unwrap().push(format!("{}>", self.label));
            let response = next.run(request, base_url).await?;
            self.log.lock().unwrap().push(format!("<{}", self.label));
            Ok(response)
        })
    }

    fn name(&self) -> &str {
        self.label
    }
}

fn failing_transport(message: &'static str) -> FnTransport<
    impl Fn(Request, Uri) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync,
> {
    FnTransport::new(move |_, _| Box::pin(async move { Err(BoxError::from(message)) }))
}

#[tokio::test]
async fn interceptors_run_outermost_first() {
    let log: Log = Arc::default();
    let transport_log = Arc::clone(&log);
    let transport = FnTransport::new(move |_, _| {
        transport_log.lock().unwrap().push("transport".to_owned());
        Box::pin(async { Ok(Response::new(200)) })
    });

    let client = Client::builder("http://localhost:3000")
        .transport(transport)
        .with_interceptor(Tracer { label: "m0", log: Arc::clone(&log) })
        .with_interceptor(Tracer { label: "m1", log: Arc::clone(&log) })
        .build()
        .unwrap();

    client.send(Request::new("/", HttpMethod::Get)).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        ["m0>", "m1>", "transport", "<m1", "<m0"]
    );
}

#[tokio::test]
async fn pass_through_interceptors_preserve_request_and_response() {
    let expected = Response::new(201)
        .with_header("Location", "/pets/1")
        .with_body("{\"id\":1}");
    let response_template = expected.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_transport = Arc::clone(&seen);
    let transport = FnTransport::new(move |request: Request, _| {
        seen_by_transport.lock().unwrap().push(request);
        let response = response_template.clone();
        Box::pin(async move { Ok(response) })
    });

    let identity = FnInterceptor::new(|request, base_url, next: Next| {
        Box::pin(async move { Ok(next.run(request, base_url).await?) })
    });
    let client = Client::new(base_url(), transport, vec![Arc::new(identity)]);

    let request = Request::new("/pets", HttpMethod::Post)
        .with_header("Content-Type", "application/json")
        .with_body("{\"name\":\"rex\"}");
    let response = client.send(request.clone()).await.unwrap();

    assert_eq!(response, expected);
    assert_eq!(*seen.lock().unwrap(), [request]);
}

#[tokio::test]
async fn short_circuit_skips_the_transport() {
    let transport = RecordingTransport::default();
    let cached = FnInterceptor::new(|_, _, _| {
        Box::pin(async { Ok(Response::new(304).with_body("cached")) })
    })
    .named("cache");

    let client = Client::builder("http://localhost:3000")
        .transport(transport.clone())
        .with_interceptor(cached)
        .with_interceptor(HeaderInterceptor::new("x-unused", "1"))
        .build()
        .unwrap();

    let response = client.send(Request::new("/pets", HttpMethod::Get)).await.unwrap();

    assert_eq!(response.status_code, 304);
    assert_eq!(response.body, "cached");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn transport_failure_carries_request_without_response() {
    let client = Client::new(
        base_url(),
        failing_transport("connection refused"),
        vec![Arc::new(HeaderInterceptor::new("x-trace", "1"))],
    );
    let request =
        Request::new("/pets", HttpMethod::Get).with_query(QueryItem::new("limit", "10"));

    let err = client.send(request.clone()).await.unwrap_err();

    assert!(err.is_transport_failure());
    // The caller's request, not the one the interceptor rewrote
    assert_eq!(err.request(), Some(&request));
    assert_eq!(err.base_url(), Some(&base_url()));
    assert!(err.response().is_none());
    assert_eq!(
        err.underlying().to_string(),
        "Transport failed with error: connection refused"
    );
}

#[tokio::test]
async fn handler_failure_carries_obtained_response() {
    let transport = FnTransport::new(|_, _| {
        Box::pin(async { Ok(Response::new(500).with_body("internal")) })
    });
    let status_check = FnInterceptor::new(|request, base_url, next: Next| {
        Box::pin(async move {
            let response = next.run(request, base_url).await?;
            if !response.is_success() {
                return Err(BoxError::from(format!(
                    "unexpected status {}",
                    response.status_code
                )));
            }
            Ok(response)
        })
    })
    .named("status-check");

    let client = Client::new(base_url(), transport, vec![Arc::new(status_check)]);
    let request = Request::new("/pets", HttpMethod::Get);

    let err = client.send(request.clone()).await.unwrap_err();

    assert!(err.is_handler_failure());
    assert_eq!(err.request(), Some(&request));
    assert_eq!(err.base_url(), Some(&base_url()));
    assert_eq!(err.response(), Some(&Response::new(500).with_body("internal")));
    assert_eq!(
        err.underlying().to_string(),
        "Handler \"status-check\" failed with error: unexpected status 500"
    );
}

#[tokio::test]
async fn inner_handler_failure_is_not_rewrapped() {
    let transport = RecordingTransport::default();
    let log: Log = Arc::default();
    let reject = FnInterceptor::new(|_, _, _| Box::pin(async { Err(BoxError::from("denied")) }))
        .named("inner");

    let client = Client::builder("http://localhost:3000")
        .transport(transport.clone())
        .with_interceptor(Tracer { label: "outer", log: Arc::clone(&log) })
        .with_interceptor(reject)
        .build()
        .unwrap();

    let err = client.send(Request::new("/", HttpMethod::Delete)).await.unwrap_err();

    assert_eq!(
        err.underlying().to_string(),
        "Handler \"inner\" failed with error: denied"
    );
    assert!(err.response().is_none());
    assert_eq!(transport.calls(), 0);
    // The outer interceptor saw the request but never a response
    assert_eq!(*log.lock().unwrap(), ["outer>"]);
}

#[tokio::test]
async fn error_from_another_client_is_reported_with_this_call() {
    let auth = Client::new(
        Uri::from_static("http://auth.internal"),
        failing_transport("auth down"),
        Vec::new(),
    );
    let refresh = FnInterceptor::new(move |request, base_url, next: Next| {
        let auth = auth.clone();
        Box::pin(async move {
            auth.send(Request::new("/token", HttpMethod::Post)).await?;
            Ok(next.run(request, base_url).await?)
        })
    })
    .named("token-refresh");

    let client = Client::new(base_url(), RecordingTransport::default(), vec![Arc::new(refresh)]);
    let request = Request::new("/pets", HttpMethod::Get);

    let err = client.send(request.clone()).await.unwrap_err();

    assert!(err.is_handler_failure());
    assert_eq!(err.request(), Some(&request));
    assert_eq!(err.base_url(), Some(&base_url()));
    assert!(err.response().is_none());

    // The other client's error stays reachable as the cause
    let cause = err
        .underlying()
        .source()
        .and_then(|source| source.downcast_ref::<ClientError>())
        .unwrap();
    assert_eq!(cause.request().map(|r| r.path.as_str()), Some("/token"));
    assert_eq!(cause.base_url(), Some(&Uri::from_static("http://auth.internal")));
}

#[tokio::test]
async fn bare_client_error_from_interceptor_gets_call_context() {
    let deny = FnInterceptor::new(|_, _, _| {
        Box::pin(async { Err(BoxError::from(ClientError::new(None, None, None, "denied"))) })
    })
    .named("deny");

    let client = Client::new(base_url(), RecordingTransport::default(), vec![Arc::new(deny)]);
    let request = Request::new("/pets", HttpMethod::Get);

    let err = client.send(request.clone()).await.unwrap_err();

    assert!(err.is_handler_failure());
    assert_eq!(err.request(), Some(&request));
    assert_eq!(err.base_url(), Some(&base_url()));
}

#[tokio::test]
async fn client_error_from_transport_is_a_transport_failure() {
    let transport = FnTransport::new(|_, _| {
        Box::pin(async { Err(BoxError::from(ClientError::new(None, None, None, "upstream"))) })
    });
    let identity = FnInterceptor::new(|request, base_url, next: Next| {
        Box::pin(async move { Ok(next.run(request, base_url).await?) })
    });

    let client = Client::new(base_url(), transport, vec![Arc::new(identity)]);
    let request = Request::new("/pets", HttpMethod::Get);

    let err = client.send(request.clone()).await.unwrap_err();

    assert!(err.is_transport_failure());
    assert_eq!(err.request(), Some(&request));
    assert_eq!(err.base_url(), Some(&base_url()));
    assert!(err.response().is_none());
}

#[tokio::test]
async fn forwarded_failure_keeps_response_obtained_before_it() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport_calls = Arc::clone(&calls);
    let transport = FnTransport::new(move |_, _| {
        let attempt = transport_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if attempt == 0 {
                Ok(Response::new(503).with_body("busy"))
            } else {
                Err(BoxError::from("reset"))
            }
        })
    });
    let retry_unavailable = FnInterceptor::new(|request: Request, base_url: Uri, next: Next| {
        Box::pin(async move {
            let response = next.run(request.clone(), base_url.clone()).await?;
            if response.status_code == 503 {
                return Ok(next.run(request, base_url).await?);
            }
            Ok(response)
        })
    })
    .named("retry-unavailable");

    let client = Client::new(base_url(), transport, vec![Arc::new(retry_unavailable)]);
    let request = Request::new("/pets", HttpMethod::Get);

    let err = client.send(request.clone()).await.unwrap_err();

    assert!(err.is_transport_failure());
    assert_eq!(err.request(), Some(&request));
    assert_eq!(err.response(), Some(&Response::new(503).with_body("busy")));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[cfg(feature = "tracing")]
#[tokio::test]
async fn header_and_logging_interceptors_scenario() {
    init_tracing();
    let _guard = redaction_guard();

    let transport = RecordingTransport::default();
    let client = Client::builder("http://localhost:3000")
        .transport(transport.clone())
        .with_interceptor(HeaderInterceptor::new("X-Trace", "1"))
        .with_interceptor(waypoint_client::LoggingInterceptor::new())
        .build()
        .unwrap();

    let response = client.send(Request::new("/pets", HttpMethod::Get)).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "ok");

    let seen = transport.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].header_fields, [waypoint_client::HeaderField::new("x-trace", "1")]);
    assert_eq!(seen[0].header_fields[0].to_string(), "x-trace: 1");
}

#[tokio::test]
async fn error_display_redacts_sensitive_headers() {
    let _guard = redaction_guard();
    redaction::reset();

    let client = Client::new(base_url(), failing_transport("timeout"), Vec::new());
    let request = Request::new("/me", HttpMethod::Get).with_header("Authorization", "Bearer secret");

    let err = client.send(request.clone()).await.unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("authorization: <redacted>"), "{rendered}");
    assert!(!rendered.contains("secret"), "{rendered}");

    redaction::replace(Vec::<String>::new());
    let err = client.send(request).await.unwrap_err();
    assert!(err.to_string().contains("authorization: Bearer secret"));

    redaction::reset();
}

#[tokio::test]
async fn one_client_serves_concurrent_sends() {
    fn assert_shareable<T: Clone + Send + Sync + 'static>() {}
    assert_shareable::<Client>();

    let transport = FnTransport::new(|request: Request, _| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(Response::new(200).with_body(request.path))
        })
    });
    let client = Client::builder("http://localhost:3000")
        .transport(transport)
        .with_interceptor(HeaderInterceptor::new("x-trace", "1"))
        .build()
        .unwrap();

    let sends = (0..50).map(|i| {
        let client = client.clone();
        async move {
            let path = format!("/items/{i}");
            let response = client.send(Request::new(path.clone(), HttpMethod::Get)).await?;
            Ok::<_, ClientError>((path, response))
        }
    });

    for result in futures::future::join_all(sends).await {
        let (path, response) = result.unwrap();
        assert_eq!(response.body, path);
    }
}

#[tokio::test]
async fn retry_interceptor_calls_next_twice() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport_calls = Arc::clone(&calls);
    let transport = FnTransport::new(move |_, _| {
        let attempt = transport_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if attempt == 0 {
                Err(BoxError::from("flaky"))
            } else {
                Ok(Response::new(200).with_body("second"))
            }
        })
    });

    let retry = FnInterceptor::new(|request: Request, base_url: Uri, next: Next| {
        Box::pin(async move {
            match next.run(request.clone(), base_url.clone()).await {
                Ok(response) => Ok(response),
                Err(err) if err.is_transport_failure() => Ok(next.run(request, base_url).await?),
                Err(err) => Err(BoxError::from(err)),
            }
        })
    })
    .named("retry");

    let client = Client::new(base_url(), transport, vec![Arc::new(retry)]);
    let response = client.send(Request::new("/", HttpMethod::Get)).await.unwrap();

    assert_eq!(response.body, "second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn timeout_interceptor_cancels_the_transport() {
    let completed = Arc::new(AtomicBool::new(false));
    let transport_completed = Arc::clone(&completed);
    let transport = FnTransport::new(move |_, _| {
        let completed = Arc::clone(&transport_completed);
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            completed.store(true, Ordering::SeqCst);
            Ok(Response::new(200))
        })
    });

    let timeout = FnInterceptor::new(|request, base_url, next: Next| {
        Box::pin(async move {
            match tokio::time::timeout(Duration::from_millis(20), next.run(request, base_url)).await {
                Ok(result) => Ok(result?),
                Err(elapsed) => Err(BoxError::from(elapsed)),
            }
        })
    })
    .named("timeout");

    let client = Client::new(base_url(), transport, vec![Arc::new(timeout)]);
    let err = client.send(Request::new("/slow", HttpMethod::Get)).await.unwrap_err();

    assert!(err.is_handler_failure());
    assert!(err.response().is_none());
    assert!(!completed.load(Ordering::SeqCst));
}
