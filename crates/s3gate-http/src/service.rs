//! The S3 HTTP service implementing hyper's `Service` trait.
//!
//! [`S3HttpService`] runs every request through the same pipeline:
//!
//! 1. Health check interception (`GET /_s3gate/health`)
//! 2. Context construction (addressing, classification)
//! 3. Common response headers (`x-amz-request-id`, `x-amz-id-2`, `Connection`)
//! 4. Pre-hook
//! 5. Optional SigV4 authentication
//! 6. Operation dispatch through the [`S3Callbacks`](crate::callbacks::S3Callbacks)
//! 7. Error response formatting
//! 8. Post-hook
//!
//! The stages are tracked by [`PipelineStage`].

use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use http::{HeaderValue, StatusCode};
use http_body::Body;
use hyper::body::Incoming;
use hyper::service::Service;
use s3gate_auth::sigv4::UNSIGNED_PAYLOAD;
use s3gate_auth::{
    AuthError, CredentialProvider, PayloadHash, SigV4Location, SignedRequest, hash_payload,
};
use s3gate_model::{S3Error, S3ErrorCode, S3Operation};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::address::BaseDomainMatcher;
use crate::body::S3ResponseBody;
use crate::callbacks::{Completion, PreHookOutcome, S3Callbacks};
use crate::context::{BoxError, ContextOptions, RequestBody, S3Context, build_context};
use crate::dispatch::dispatch;
use crate::response::{DEFAULT_SERVER, error_response};

/// Path answered by the built-in health check.
pub const HEALTH_CHECK_PATH: &str = "/_s3gate/health";

/// Configuration for the S3 HTTP service.
#[derive(Debug, Clone)]
pub struct S3HttpConfig {
    /// Always read the bucket from the first path segment.
    pub force_path_style: bool,
    /// Verify request signatures when a secret lookup is configured.
    pub enforce_signatures: bool,
    /// Region used when neither the credential scope nor the host names one.
    pub default_region: String,
    /// Value of the `Server` response header.
    pub server_name: String,
    /// Emit one `info!` line per completed request.
    pub log_requests: bool,
    /// Answer `GET /_s3gate/health` before routing.
    pub health_check: bool,
}

impl Default for S3HttpConfig {
    fn default() -> Self {
        Self {
            force_path_style: false,
            enforce_signatures: true,
            default_region: "us-east-1".to_owned(),
            server_name: DEFAULT_SERVER.to_owned(),
            log_requests: true,
            health_check: true,
        }
    }
}

/// What a secret lookup knows about the request being verified.
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    /// Access key that signed the request.
    pub access_key_id: &'a str,
    /// Addressed bucket.
    pub bucket: Option<&'a str>,
    /// Addressed key.
    pub key: Option<&'a str>,
    /// Resolved region.
    pub region: &'a str,
    /// Classified operation.
    pub operation: S3Operation,
}

/// Resolves the secret key of an access key.
#[async_trait]
pub trait SecretKeyLookup: Send + Sync + std::fmt::Debug {
    /// Returns the secret, or `None` when the access key is unknown.
    async fn secret_key(&self, request: LookupRequest<'_>) -> Option<String>;
}

/// Adapts a synchronous [`CredentialProvider`] into a [`SecretKeyLookup`].
#[derive(Debug)]
pub struct ProviderLookup<P>(pub P);

#[async_trait]
impl<P> SecretKeyLookup for ProviderLookup<P>
where
    P: CredentialProvider + std::fmt::Debug,
{
    async fn secret_key(&self, request: LookupRequest<'_>) -> Option<String> {
        self.0.get_secret_key(request.access_key_id).ok()
    }
}

/// Stage of the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Context built, nothing written yet.
    Start,
    /// Common headers set.
    HeadersSet,
    /// Pre-hook ran (or none is configured).
    PreHookRun,
    /// Signature verified, or verification is off.
    Authenticated,
    /// Operation known.
    Classified,
    /// Handler returned.
    HandlerInvoked,
    /// Response finished.
    ResponseSent,
    /// Post-hook ran.
    Completed,
    /// A step failed; an error response is pending.
    Errored,
}

impl PipelineStage {
    /// True when moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        use PipelineStage as S;
        matches!(
            (self, next),
            (S::Start, S::HeadersSet)
                | (S::HeadersSet, S::PreHookRun)
                | (S::PreHookRun, S::Authenticated | S::ResponseSent)
                | (S::Authenticated, S::Classified)
                | (S::Classified, S::HandlerInvoked)
                | (S::HandlerInvoked | S::Errored, S::ResponseSent)
                | (S::ResponseSent, S::Completed)
                | (
                    S::HeadersSet | S::PreHookRun | S::Authenticated | S::Classified,
                    S::Errored
                )
        )
    }
}

#[derive(Debug)]
struct Pipeline {
    stage: PipelineStage,
}

impl Pipeline {
    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal pipeline transition {:?} -> {next:?}",
            self.stage
        );
        debug!(from = ?self.stage, to = ?next, "pipeline stage");
        self.stage = next;
    }
}

/// The S3 HTTP service.
///
/// Cloning is cheap: configuration, callbacks and lookups are shared.
#[derive(Debug, Clone)]
pub struct S3HttpService {
    config: Arc<S3HttpConfig>,
    callbacks: Arc<S3Callbacks>,
    matcher: Option<Arc<dyn BaseDomainMatcher>>,
    secrets: Option<Arc<dyn SecretKeyLookup>>,
}

impl S3HttpService {
    /// Create a service serving `callbacks`.
    #[must_use]
    pub fn new(callbacks: S3Callbacks, config: S3HttpConfig) -> Self {
        Self {
            config: Arc::new(config),
            callbacks: Arc::new(callbacks),
            matcher: None,
            secrets: None,
        }
    }

    /// Resolve virtual-hosted requests against these base domains.
    #[must_use]
    pub fn with_base_domains(mut self, matcher: impl BaseDomainMatcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Verify signatures with secrets from `lookup`.
    #[must_use]
    pub fn with_secret_lookup(mut self, lookup: impl SecretKeyLookup + 'static) -> Self {
        self.secrets = Some(Arc::new(lookup));
        self
    }

    /// Verify signatures with secrets from a credential provider.
    #[must_use]
    pub fn with_credential_provider<P>(self, provider: P) -> Self
    where
        P: CredentialProvider + std::fmt::Debug + 'static,
    {
        self.with_secret_lookup(ProviderLookup(provider))
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &S3HttpConfig {
        &self.config
    }

    /// Run one request through the pipeline.
    ///
    /// Never fails: every error becomes an XML error response.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<S3ResponseBody>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        if self.config.health_check
            && req.method() == http::Method::GET
            && req.uri().path() == HEALTH_CHECK_PATH
        {
            return health_check_response();
        }

        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let (ctx, deferred) = build_context(
            parts,
            RequestBody::new(body),
            ContextOptions {
                force_path_style: self.config.force_path_style,
                default_region: &self.config.default_region,
                matcher: self.matcher.as_deref(),
            },
        );

        let span = info_span!(
            "s3_request",
            request_id = %ctx.request_id,
            method = %ctx.request.method,
            operation = %ctx.request.operation(),
        );
        self.run(ctx, deferred, started).instrument(span).await
    }

    async fn run(
        &self,
        mut ctx: S3Context,
        deferred: Option<S3Error>,
        started: Instant,
    ) -> http::Response<S3ResponseBody> {
        let mut pipeline = Pipeline {
            stage: PipelineStage::Start,
        };
        let keep_alive = !ctx
            .request
            .header(http::header::CONNECTION.as_str())
            .is_some_and(|v| v.eq_ignore_ascii_case("close"));

        set_common_headers(&mut ctx, keep_alive);
        pipeline.advance(PipelineStage::HeadersSet);

        let outcome = AssertUnwindSafe(self.process(&mut ctx, deferred, &mut pipeline))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                error!(
                    request_id = %ctx.request_id,
                    operation = %ctx.request.operation(),
                    panic = panic_message(panic.as_ref()),
                    "request pipeline panicked"
                );
                Err(S3Error::internal_error(
                    "We encountered an internal error. Please try again.",
                ))
            });

        let error_code = match outcome {
            Ok(()) => None,
            Err(mut err) => {
                log_failure(&ctx, &err);
                pipeline.advance(PipelineStage::Errored);
                if err.resource.is_none() {
                    err.resource = Some(ctx.request.uri.path().to_owned());
                }
                let code = err.code.as_str().to_owned();
                ctx.response = error_response(&err, &ctx.request_id);
                set_common_headers(&mut ctx, keep_alive);
                Some(code)
            }
        };

        let host = ctx.request.header(http::header::HOST.as_str()).map(str::to_owned);
        let response =
            std::mem::take(&mut ctx.response).finish(host.as_deref(), &self.config.server_name);
        pipeline.advance(PipelineStage::ResponseSent);

        let completion = Completion {
            operation: ctx.request.operation(),
            status: response.status(),
            error_code,
            elapsed: started.elapsed(),
        };
        if self.config.log_requests {
            info!(
                request_id = %ctx.request_id,
                operation = %completion.operation,
                bucket = ?ctx.request.bucket(),
                key = ?ctx.request.key(),
                status = completion.status.as_u16(),
                elapsed_ms = completion.elapsed.as_millis(),
                "handled S3 request"
            );
        }
        self.run_post_hook(&mut ctx, completion).await;
        pipeline.advance(PipelineStage::Completed);

        response
    }

    /// Every step between the common headers and the finished response.
    async fn process(
        &self,
        ctx: &mut S3Context,
        deferred: Option<S3Error>,
        pipeline: &mut Pipeline,
    ) -> Result<(), S3Error> {
        if let Some(pre_hook) = &self.callbacks.pre_hook {
            let outcome = pre_hook.call(ctx, ()).await?;
            pipeline.advance(PipelineStage::PreHookRun);
            if outcome == PreHookOutcome::Respond {
                debug!(request_id = %ctx.request_id, "pre-hook answered the request");
                return Ok(());
            }
        } else {
            pipeline.advance(PipelineStage::PreHookRun);
        }

        self.authenticate(ctx).await?;
        pipeline.advance(PipelineStage::Authenticated);

        if let Some(err) = deferred {
            return Err(err);
        }
        pipeline.advance(PipelineStage::Classified);

        dispatch(ctx, &self.callbacks).await?;
        pipeline.advance(PipelineStage::HandlerInvoked);
        Ok(())
    }

    /// Verify the request signature when enforcement is on.
    async fn authenticate(&self, ctx: &mut S3Context) -> Result<(), S3Error> {
        if !self.config.enforce_signatures {
            return Ok(());
        }
        let Some(secrets) = &self.secrets else {
            return Ok(());
        };

        // Anything but SigV4 is rejected before the body is read.
        let presigned = matches!(
            ctx.request.signature.sigv4().map_err(auth_error_to_s3)?.location,
            SigV4Location::Presigned { .. }
        );
        let declared = PayloadHash::from_header(ctx.request.header("x-amz-content-sha256"))
            .map_err(auth_error_to_s3)?;
        let payload_hash = if declared.needs_body() && !presigned {
            let body = ctx.request.body.buffer().await?;
            let computed = hash_payload(&body);
            declared.check(&computed).map_err(auth_error_to_s3)?;
            computed
        } else {
            declared.literal().unwrap_or(UNSIGNED_PAYLOAD).to_owned()
        };

        let access_key_id = ctx.request.access_key_id().map(str::to_owned);
        let secret = match access_key_id {
            Some(access_key_id) => {
                let bucket = ctx.request.bucket().map(str::to_owned);
                let key = ctx.request.key().map(str::to_owned);
                let lookup = LookupRequest {
                    access_key_id: &access_key_id,
                    bucket: bucket.as_deref(),
                    key: key.as_deref(),
                    region: &ctx.request.region,
                    operation: ctx.request.operation(),
                };
                secrets
                    .secret_key(lookup)
                    .await
                    .filter(|secret| !secret.is_empty())
            }
            None => None,
        };

        let signed = SignedRequest {
            method: ctx.request.method.as_str(),
            path: ctx.request.uri.path(),
            query: ctx.request.uri.query().unwrap_or(""),
            headers: &ctx.request.headers,
        };
        let result = s3gate_auth::authenticate(
            &ctx.request.signature,
            &signed,
            |_| secret,
            &payload_hash,
        )
        .map_err(auth_error_to_s3)?;

        debug!(
            request_id = %ctx.request_id,
            access_key_id = %result.access_key_id,
            "request signature verified"
        );
        ctx.request.auth = Some(result);
        Ok(())
    }

    async fn run_post_hook(&self, ctx: &mut S3Context, completion: Completion) {
        let Some(post_hook) = &self.callbacks.post_hook else {
            return;
        };
        let result = AssertUnwindSafe(post_hook.call(ctx, completion))
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(request_id = %ctx.request_id, error = %err, "post-hook failed");
            }
            Err(panic) => {
                error!(
                    request_id = %ctx.request_id,
                    panic = panic_message(panic.as_ref()),
                    "post-hook panicked"
                );
            }
        }
    }
}

impl Service<http::Request<Incoming>> for S3HttpService {
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Map an authentication failure to the error sent to the client.
#[must_use]
pub fn auth_error_to_s3(err: AuthError) -> S3Error {
    let code = match &err {
        AuthError::SignatureV2NotSupported | AuthError::SignatureDoesNotMatch => {
            S3ErrorCode::SignatureDoesNotMatch
        }
        AuthError::ContentSha256Mismatch(_) => S3ErrorCode::XAmzContentSHA256Mismatch,
        AuthError::RequestExpired => {
            return S3Error::with_message(S3ErrorCode::AccessDenied, "Request has expired")
                .with_source(err);
        }
        _ => S3ErrorCode::AccessDenied,
    };
    S3Error::with_message(code, err.to_string()).with_source(err)
}

fn set_common_headers(ctx: &mut S3Context, keep_alive: bool) {
    let headers = [
        ("x-amz-request-id", ctx.request_id.clone()),
        ("x-amz-id-2", ctx.trace_id.clone()),
        (
            http::header::CONNECTION.as_str(),
            if keep_alive { "keep-alive" } else { "close" }.to_owned(),
        ),
    ];
    for (name, value) in headers {
        if let Err(err) = ctx.response.set_header(name, &value) {
            debug!(header = name, error = %err, "could not set common header");
        }
    }
}

fn log_failure(ctx: &S3Context, err: &S3Error) {
    if err.status_code.is_server_error() {
        error!(
            request_id = %ctx.request_id,
            operation = %ctx.request.operation(),
            code = err.code.as_str(),
            error = %err,
            "S3 request failed"
        );
    } else {
        warn!(
            request_id = %ctx.request_id,
            operation = %ctx.request.operation(),
            code = err.code.as_str(),
            message = %err.message,
            "S3 request rejected"
        );
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn health_check_response() -> http::Response<S3ResponseBody> {
    let body = serde_json::json!({
        "status": "running",
        "service": "s3",
        "version": env!("CARGO_PKG_VERSION"),
    });
    let mut response = http::Response::new(S3ResponseBody::from_bytes(body.to_string()));
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    *response.status_mut() = StatusCode::OK;
    response
}
