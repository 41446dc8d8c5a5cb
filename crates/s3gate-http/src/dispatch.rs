//! S3 operation dispatch: routes a classified request to its handler.
//!
//! [`dispatch`] looks up the handler for the request's operation, decodes the
//! XML body of write operations, calls the handler, and writes its result into
//! the context's response:
//!
//! - XML documents with `Content-Type: application/xml`
//! - `204 No Content` for deletes
//! - object attributes as headers for reads and `HEAD`
//! - `206 Partial Content` with `Content-Range` for range reads
//!
//! Operations without a handler, and unclassified requests, go to the
//! default handler when one is registered and fail with `InvalidRequest`
//! otherwise.

use bytes::Bytes;
use futures::TryStreamExt;
use http::StatusCode;
use s3gate_model::output::BlobStream;
use s3gate_model::{
    GetObjectOutput, ObjectInfo, PutObjectOutput, ResolvedRange, S3Error, S3Operation,
    StreamingBlob,
};
use s3gate_xml::{S3Deserialize, S3Serialize, from_xml, to_xml};
use tracing::debug;

use crate::callbacks::S3Callbacks;
use crate::context::S3Context;
use crate::response::{ResponseError, S3Response, format_http_date};

const XML_CONTENT_TYPE: &str = "application/xml";
const DEFAULT_OBJECT_CONTENT_TYPE: &str = "binary/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatched {
    Handled,
    Unhandled,
}

/// Call the handler in `$slot`, or report the operation as unhandled.
///
/// `$input` is only evaluated once a handler exists, so request bodies are
/// not parsed for operations nobody serves.
macro_rules! call {
    ($slot:expr, $ctx:expr, $input:expr) => {
        match &$slot {
            Some(handler) => {
                let input = $input;
                handler.call($ctx, input).await?
            }
            None => return Ok(Dispatched::Unhandled),
        }
    };
}

/// Run the handler for the request's operation and write its result.
///
/// # Errors
///
/// Handler errors are returned verbatim. Body decoding failures are
/// `MalformedXML` (`InvalidRequest` for an empty multi-delete body).
pub async fn dispatch(ctx: &mut S3Context, callbacks: &S3Callbacks) -> Result<(), S3Error> {
    let operation = ctx.request.operation();
    debug!(
        %operation,
        bucket = ?ctx.request.bucket(),
        key = ?ctx.request.key(),
        "dispatching S3 operation"
    );

    if route(ctx, callbacks).await? == Dispatched::Handled {
        return Ok(());
    }

    match &callbacks.default_handler {
        Some(handler) => {
            debug!(%operation, "using default handler");
            handler.call(ctx, ()).await
        }
        None => Err(S3Error::invalid_request(format!(
            "No handler registered for {}",
            if operation == S3Operation::Unclassified {
                "this request"
            } else {
                operation.aws_name()
            }
        ))),
    }
}

#[allow(clippy::too_many_lines)]
async fn route(ctx: &mut S3Context, cb: &S3Callbacks) -> Result<Dispatched, S3Error> {
    use S3Operation as Op;

    match ctx.request.operation() {
        // Service
        Op::ServiceExists => {
            call!(cb.service.exists, ctx, ());
            set_region_header(ctx)?;
        }
        Op::ListBuckets => {
            let out = call!(cb.service.list_buckets, ctx, ());
            write_xml(&mut ctx.response, "ListAllMyBucketsResult", &out)?;
        }

        // Buckets
        Op::BucketCreate => {
            call!(cb.bucket.create, ctx, optional_xml_body(ctx).await?);
            if let Some(bucket) = ctx.request.bucket().map(|b| format!("/{b}")) {
                set_header_if_open(&mut ctx.response, http::header::LOCATION.as_str(), &bucket)?;
            }
        }
        Op::BucketDelete => call!(cb.bucket.delete, ctx, ()),
        Op::BucketExists => {
            call!(cb.bucket.exists, ctx, ());
            set_region_header(ctx)?;
        }
        Op::BucketRead => {
            let out = call!(cb.bucket.read, ctx, ());
            write_xml(&mut ctx.response, "ListBucketResult", &out)?;
        }
        Op::BucketReadAcl => {
            let out = call!(cb.bucket.read_acl, ctx, ());
            write_xml(&mut ctx.response, "AccessControlPolicy", &out)?;
        }
        Op::BucketWriteAcl => call!(cb.bucket.write_acl, ctx, xml_body(ctx).await?),
        Op::BucketReadLocation => {
            let out = call!(cb.bucket.read_location, ctx, ());
            write_xml(&mut ctx.response, "LocationConstraint", &out)?;
        }
        Op::BucketReadLogging => {
            let out = call!(cb.bucket.read_logging, ctx, ());
            write_xml(&mut ctx.response, "BucketLoggingStatus", &out)?;
        }
        Op::BucketWriteLogging => call!(cb.bucket.write_logging, ctx, xml_body(ctx).await?),
        Op::BucketReadTagging => {
            let out = call!(cb.bucket.read_tagging, ctx, ());
            write_xml(&mut ctx.response, "Tagging", &out)?;
        }
        Op::BucketWriteTagging => call!(cb.bucket.write_tagging, ctx, xml_body(ctx).await?),
        Op::BucketDeleteTagging => call!(cb.bucket.delete_tagging, ctx, ()),
        Op::BucketReadVersioning => {
            let out = call!(cb.bucket.read_versioning, ctx, ());
            write_xml(&mut ctx.response, "VersioningConfiguration", &out)?;
        }
        Op::BucketWriteVersioning => {
            call!(cb.bucket.write_versioning, ctx, xml_body(ctx).await?);
        }
        Op::BucketReadVersions => {
            let out = call!(cb.bucket.read_versions, ctx, ());
            write_xml(&mut ctx.response, "ListVersionsResult", &out)?;
        }
        Op::BucketReadWebsite => {
            let out = call!(cb.bucket.read_website, ctx, ());
            write_xml(&mut ctx.response, "WebsiteConfiguration", &out)?;
        }
        Op::BucketWriteWebsite => call!(cb.bucket.write_website, ctx, xml_body(ctx).await?),
        Op::BucketDeleteWebsite => call!(cb.bucket.delete_website, ctx, ()),
        Op::BucketListMultipartUploads => {
            let out = call!(cb.bucket.list_multipart_uploads, ctx, ());
            write_xml(&mut ctx.response, "ListMultipartUploadsResult", &out)?;
        }

        // Objects
        Op::ObjectCreate => {
            let out = call!(cb.object.create, ctx, ());
            write_put_headers(&mut ctx.response, &out)?;
        }
        Op::ObjectDelete => call!(cb.object.delete, ctx, ()),
        Op::ObjectDeleteMultiple => {
            let mut quiet = false;
            let mut out = call!(cb.object.delete_multiple, ctx, {
                let delete = delete_body(ctx).await?;
                quiet = delete.quiet;
                delete
            });
            if quiet {
                out.deleted.clear();
            }
            write_xml(&mut ctx.response, "DeleteResult", &out)?;
        }
        Op::ObjectExists => {
            let info = call!(cb.object.exists, ctx, ());
            write_object_headers(&mut ctx.response, &info)?;
            set_header_if_open(
                &mut ctx.response,
                http::header::CONTENT_LENGTH.as_str(),
                &info.content_length.to_string(),
            )?;
        }
        Op::ObjectRead => {
            let out = call!(cb.object.read, ctx, ());
            write_object(&mut ctx.response, out, None)?;
        }
        Op::ObjectReadRange => {
            let range = ctx
                .request
                .range
                .ok_or_else(|| S3Error::invalid_request("Range header is missing"))?;
            let out = call!(cb.object.read_range, ctx, range);
            let resolved = match out.content_range {
                Some(resolved) => resolved,
                None => range.resolve(out.info.content_length)?,
            };
            write_object(&mut ctx.response, out, Some(resolved))?;
        }
        Op::ObjectReadAcl => {
            let out = call!(cb.object.read_acl, ctx, ());
            write_xml(&mut ctx.response, "AccessControlPolicy", &out)?;
        }
        Op::ObjectWriteAcl => call!(cb.object.write_acl, ctx, xml_body(ctx).await?),
        Op::ObjectReadTagging => {
            let out = call!(cb.object.read_tagging, ctx, ());
            write_xml(&mut ctx.response, "Tagging", &out)?;
        }
        Op::ObjectWriteTagging => call!(cb.object.write_tagging, ctx, xml_body(ctx).await?),
        Op::ObjectDeleteTagging => call!(cb.object.delete_tagging, ctx, ()),
        Op::ObjectReadLegalHold => {
            let out = call!(cb.object.read_legal_hold, ctx, ());
            write_xml(&mut ctx.response, "LegalHold", &out)?;
        }
        Op::ObjectWriteLegalHold => {
            call!(cb.object.write_legal_hold, ctx, xml_body(ctx).await?);
        }
        Op::ObjectReadRetention => {
            let out = call!(cb.object.read_retention, ctx, ());
            write_xml(&mut ctx.response, "Retention", &out)?;
        }
        Op::ObjectWriteRetention => {
            call!(cb.object.write_retention, ctx, xml_body(ctx).await?);
        }
        Op::ObjectCreateMultipartUpload => {
            let out = call!(cb.object.create_multipart_upload, ctx, ());
            write_xml(&mut ctx.response, "InitiateMultipartUploadResult", &out)?;
        }
        Op::ObjectUploadPart => {
            let out = call!(
                cb.object.upload_part,
                ctx,
                ctx.request
                    .part_number()?
                    .ok_or_else(|| S3Error::invalid_argument("partNumber is required"))?
            );
            write_put_headers(&mut ctx.response, &out)?;
        }
        Op::ObjectCompleteMultipartUpload => {
            let out = call!(cb.object.complete_multipart_upload, ctx, xml_body(ctx).await?);
            write_xml(&mut ctx.response, "CompleteMultipartUploadResult", &out)?;
        }
        Op::ObjectAbortMultipartUpload => call!(cb.object.abort_multipart_upload, ctx, ()),
        Op::ObjectListParts => {
            let out = call!(cb.object.list_parts, ctx, ());
            write_xml(&mut ctx.response, "ListPartsResult", &out)?;
        }

        Op::Unclassified => return Ok(Dispatched::Unhandled),
    }

    if ctx.request.operation().is_delete() && !ctx.response.is_started() {
        ctx.response.set_status(StatusCode::NO_CONTENT)?;
    }
    Ok(Dispatched::Handled)
}

/// Decode a required XML body.
async fn xml_body<T: S3Deserialize>(ctx: &mut S3Context) -> Result<T, S3Error> {
    let payload = ctx.request.payload().await?;
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(S3Error::malformed_xml("request body is empty"));
    }
    Ok(from_xml(&payload)?)
}

/// Decode an XML body that may be absent.
async fn optional_xml_body<T: S3Deserialize>(ctx: &mut S3Context) -> Result<Option<T>, S3Error> {
    let payload = ctx.request.payload().await?;
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(from_xml(&payload)?))
}

async fn delete_body(ctx: &mut S3Context) -> Result<s3gate_model::types::Delete, S3Error> {
    let payload = ctx.request.payload().await?;
    if payload.is_empty() {
        return Err(S3Error::invalid_request(
            "Multi-object delete requires a Delete document",
        ));
    }
    Ok(from_xml(&payload)?)
}

fn write_xml<T: S3Serialize>(
    response: &mut S3Response,
    root: &str,
    value: &T,
) -> Result<(), S3Error> {
    let xml = to_xml(root, value)?;
    response.set_content_type(XML_CONTENT_TYPE)?;
    response.send(xml)?;
    Ok(())
}

/// Set a header unless the handler already started the body itself.
fn set_header_if_open(
    response: &mut S3Response,
    name: &str,
    value: &str,
) -> Result<(), ResponseError> {
    if response.is_started() {
        return Ok(());
    }
    response.set_header(name, value)
}

fn set_region_header(ctx: &mut S3Context) -> Result<(), S3Error> {
    let region = ctx.request.region.clone();
    set_header_if_open(&mut ctx.response, "x-amz-bucket-region", &region)?;
    Ok(())
}

fn write_put_headers(response: &mut S3Response, out: &PutObjectOutput) -> Result<(), S3Error> {
    if let Some(e_tag) = &out.e_tag {
        set_header_if_open(response, http::header::ETAG.as_str(), e_tag)?;
    }
    if let Some(version_id) = &out.version_id {
        set_header_if_open(response, "x-amz-version-id", version_id)?;
    }
    Ok(())
}

fn write_object_headers(response: &mut S3Response, info: &ObjectInfo) -> Result<(), S3Error> {
    if response.is_started() {
        return Ok(());
    }
    response.set_content_type(
        info.content_type
            .as_deref()
            .unwrap_or(DEFAULT_OBJECT_CONTENT_TYPE),
    )?;
    response.set_header(http::header::ACCEPT_RANGES, "bytes")?;
    if let Some(e_tag) = &info.e_tag {
        response.set_header(http::header::ETAG, e_tag)?;
    }
    if let Some(last_modified) = &info.last_modified {
        response.set_header(http::header::LAST_MODIFIED, &format_http_date(last_modified))?;
    }
    if let Some(version_id) = &info.version_id {
        response.set_header("x-amz-version-id", version_id)?;
    }
    if let Some(storage_class) = &info.storage_class {
        response.set_header("x-amz-storage-class", storage_class)?;
    }
    for (name, value) in &info.metadata {
        response.set_header(format!("x-amz-meta-{name}").as_str(), value)?;
    }
    Ok(())
}

/// Write object headers and body, applying `range` when given.
///
/// When the handler reported `content_range` the body is taken as already
/// sliced; otherwise it is sliced here.
fn write_object(
    response: &mut S3Response,
    out: GetObjectOutput,
    range: Option<ResolvedRange>,
) -> Result<(), S3Error> {
    if response.is_started() {
        return Ok(());
    }
    let GetObjectOutput {
        info,
        body,
        content_range,
    } = out;
    write_object_headers(response, &info)?;

    let (body, length) = match range {
        Some(range) => {
            response.set_status(StatusCode::PARTIAL_CONTENT)?;
            response.set_header(http::header::CONTENT_RANGE, &range.content_range())?;
            let body = if content_range.is_some() {
                body
            } else {
                slice_blob(body, &range)
            };
            (body, range.len())
        }
        None => (body, info.content_length),
    };

    match body {
        StreamingBlob::Bytes(data) => response.send(data)?,
        StreamingBlob::Stream(stream) => {
            response.set_content_length(length)?;
            response.stream(stream)?;
        }
    }
    Ok(())
}

fn slice_blob(body: StreamingBlob, range: &ResolvedRange) -> StreamingBlob {
    match body {
        StreamingBlob::Bytes(data) => {
            let start = to_usize(range.start).min(data.len());
            let end = to_usize(range.end).saturating_add(1).min(data.len());
            StreamingBlob::Bytes(data.slice(start..end.max(start)))
        }
        StreamingBlob::Stream(stream) => {
            StreamingBlob::Stream(slice_stream(stream, range.start, range.len()))
        }
    }
}

/// Keep the bytes in `[skip, skip + take)` of a stream.
fn slice_stream(stream: BlobStream, skip: u64, take: u64) -> BlobStream {
    let end = skip.saturating_add(take);
    let mut offset = 0u64;
    Box::pin(stream.try_filter_map(move |chunk: Bytes| {
        let chunk_start = offset;
        let chunk_end = offset + chunk.len() as u64;
        offset = chunk_end;
        let from = skip.max(chunk_start);
        let to = end.min(chunk_end);
        let kept = (from < to)
            .then(|| chunk.slice(to_usize(from - chunk_start)..to_usize(to - chunk_start)));
        futures::future::ready(Ok(kept))
    }))
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
