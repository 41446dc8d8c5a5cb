//! In-memory store served by the demo binary.
//!
//! [`MemoryStore`] keeps buckets in a [`DashMap`]; each bucket holds its
//! objects in key order so listings come out sorted. [`callbacks`] wires the
//! store into an [`S3Callbacks`] registry.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use md5::{Digest, Md5};
use s3gate_http::callbacks::{Handler, S3Callbacks};
use s3gate_http::context::{ListParams, ListType, S3Context};
use s3gate_model::s3_error;
use s3gate_model::types::{
    AccessControlPolicy, Bucket, BucketLocation, BucketVersioningStatus, CommonPrefix,
    CreateBucketConfiguration, Delete, DeleteError, DeleteResult, DeletedObject, EntryInfo,
    ListAllMyBucketsResult, ListBucketResult, Object, Owner, Tagging, VersioningConfiguration,
};
use s3gate_model::{
    ByteRange, GetObjectOutput, ObjectInfo, PutObjectOutput, S3Error, StreamingBlob,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Objects larger than this are returned as a stream of frames.
const STREAM_THRESHOLD: usize = 64 * 1024;
const STREAM_FRAME: usize = 16 * 1024;
const OWNER_ID: &str = "75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a";
const STANDARD: &str = "STANDARD";

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    e_tag: String,
    last_modified: DateTime<Utc>,
    metadata: BTreeMap<String, String>,
    version_id: Option<String>,
    tagging: Tagging,
    acl: Option<AccessControlPolicy>,
}

impl StoredObject {
    fn info(&self) -> ObjectInfo {
        ObjectInfo {
            content_length: self.data.len() as u64,
            content_type: self.content_type.clone(),
            e_tag: Some(self.e_tag.clone()),
            last_modified: Some(self.last_modified),
            version_id: self.version_id.clone(),
            storage_class: Some(STANDARD.to_owned()),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug)]
struct StoredBucket {
    created: DateTime<Utc>,
    region: String,
    objects: BTreeMap<String, StoredObject>,
    tagging: Option<Tagging>,
    acl: Option<AccessControlPolicy>,
    versioning: VersioningConfiguration,
}

/// A new object to store.
#[derive(Debug, Default)]
pub struct NewObject {
    /// Payload.
    pub data: Bytes,
    /// `Content-Type` sent with the upload.
    pub content_type: Option<String>,
    /// `x-amz-meta-*` headers, prefix stripped.
    pub metadata: BTreeMap<String, String>,
}

/// Buckets and objects held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: DashMap<String, StoredBucket>,
}

fn owner() -> Owner {
    Owner {
        id: Some(OWNER_ID.to_owned()),
        display_name: Some("s3gate".to_owned()),
    }
}

/// Quoted hex MD5 of `data`.
fn compute_etag(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(data)))
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bucket<R>(
        &self,
        name: &str,
        f: impl FnOnce(&StoredBucket) -> Result<R, S3Error>,
    ) -> Result<R, S3Error> {
        let bucket = self
            .buckets
            .get(name)
            .ok_or_else(|| S3Error::no_such_bucket(name))?;
        f(&bucket)
    }

    fn with_bucket_mut<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut StoredBucket) -> Result<R, S3Error>,
    ) -> Result<R, S3Error> {
        let mut bucket = self
            .buckets
            .get_mut(name)
            .ok_or_else(|| S3Error::no_such_bucket(name))?;
        f(&mut bucket)
    }

    fn with_object<R>(
        &self,
        bucket: &str,
        key: &str,
        f: impl FnOnce(&StoredObject) -> R,
    ) -> Result<R, S3Error> {
        self.with_bucket(bucket, |b| {
            b.objects
                .get(key)
                .map(f)
                .ok_or_else(|| S3Error::no_such_key(key))
        })
    }

    fn with_object_mut<R>(
        &self,
        bucket: &str,
        key: &str,
        f: impl FnOnce(&mut StoredObject) -> R,
    ) -> Result<R, S3Error> {
        self.with_bucket_mut(bucket, |b| {
            b.objects
                .get_mut(key)
                .map(f)
                .ok_or_else(|| S3Error::no_such_key(key))
        })
    }

    /// All buckets, sorted by name.
    #[must_use]
    pub fn list_buckets(&self) -> ListAllMyBucketsResult {
        let mut buckets: Vec<Bucket> = self
            .buckets
            .iter()
            .map(|entry| Bucket {
                name: entry.key().clone(),
                creation_date: entry.value().created,
            })
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        ListAllMyBucketsResult {
            owner: Some(owner()),
            buckets,
        }
    }

    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// `BucketAlreadyOwnedByYou` when it exists.
    pub fn create_bucket(&self, name: &str, region: &str) -> Result<(), S3Error> {
        match self.buckets.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(s3_error!(BucketAlreadyOwnedByYou).with_resource(name)),
            Entry::Vacant(slot) => {
                slot.insert(StoredBucket {
                    created: Utc::now(),
                    region: region.to_owned(),
                    objects: BTreeMap::new(),
                    tagging: None,
                    acl: None,
                    versioning: VersioningConfiguration::default(),
                });
                info!(bucket = name, region, "created bucket");
                Ok(())
            }
        }
    }

    /// Delete an empty bucket.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`, or `BucketNotEmpty` while it holds objects.
    pub fn delete_bucket(&self, name: &str) -> Result<(), S3Error> {
        let removed = self
            .buckets
            .remove_if(name, |_, bucket| bucket.objects.is_empty());
        if removed.is_some() {
            info!(bucket = name, "deleted bucket");
            return Ok(());
        }
        if self.buckets.contains_key(name) {
            Err(s3_error!(BucketNotEmpty).with_resource(name))
        } else {
            Err(S3Error::no_such_bucket(name))
        }
    }

    /// Check that a bucket exists.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn head_bucket(&self, name: &str) -> Result<(), S3Error> {
        self.with_bucket(name, |_| Ok(()))
    }

    /// The region the bucket was created in.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn bucket_location(&self, name: &str) -> Result<BucketLocation, S3Error> {
        self.with_bucket(name, |b| {
            Ok(BucketLocation {
                location_constraint: (b.region != "us-east-1").then(|| b.region.clone()),
            })
        })
    }

    /// List objects, v1 or v2 depending on `params.list_type`.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn list_objects(
        &self,
        name: &str,
        params: &ListParams,
    ) -> Result<ListBucketResult, S3Error> {
        self.with_bucket(name, |bucket| Ok(list_bucket(name, bucket, params)))
    }

    /// # Errors
    ///
    /// `NoSuchBucket`, or `NoSuchTagSet` when none was stored.
    pub fn bucket_tagging(&self, name: &str) -> Result<Tagging, S3Error> {
        self.with_bucket(name, |b| {
            b.tagging
                .clone()
                .ok_or_else(|| s3_error!(NoSuchTagSet).with_resource(name))
        })
    }

    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn put_bucket_tagging(&self, name: &str, tagging: Option<Tagging>) -> Result<(), S3Error> {
        self.with_bucket_mut(name, |b| {
            b.tagging = tagging;
            Ok(())
        })
    }

    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn bucket_acl(&self, name: &str) -> Result<AccessControlPolicy, S3Error> {
        self.with_bucket(name, |b| {
            Ok(b.acl
                .clone()
                .unwrap_or_else(|| AccessControlPolicy::private(owner())))
        })
    }

    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn put_bucket_acl(&self, name: &str, acl: AccessControlPolicy) -> Result<(), S3Error> {
        self.with_bucket_mut(name, |b| {
            b.acl = Some(acl);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn bucket_versioning(&self, name: &str) -> Result<VersioningConfiguration, S3Error> {
        self.with_bucket(name, |b| Ok(b.versioning.clone()))
    }

    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn put_bucket_versioning(
        &self,
        name: &str,
        versioning: VersioningConfiguration,
    ) -> Result<(), S3Error> {
        self.with_bucket_mut(name, |b| {
            b.versioning = versioning;
            Ok(())
        })
    }

    /// Store an object, replacing any previous one under `key`.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        object: NewObject,
    ) -> Result<PutObjectOutput, S3Error> {
        self.with_bucket_mut(bucket, |b| {
            let versioned = b.versioning.status == Some(BucketVersioningStatus::Enabled);
            let stored = StoredObject {
                e_tag: compute_etag(&object.data),
                data: object.data,
                content_type: object.content_type,
                last_modified: Utc::now(),
                metadata: object.metadata,
                version_id: versioned.then(|| Uuid::new_v4().simple().to_string()),
                tagging: Tagging::default(),
                acl: None,
            };
            debug!(bucket, key, size = stored.data.len(), "stored object");
            let output = PutObjectOutput {
                e_tag: Some(stored.e_tag.clone()),
                version_id: stored.version_id.clone(),
            };
            b.objects.insert(key.to_owned(), stored);
            Ok(output)
        })
    }

    /// Object attributes.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket` or `NoSuchKey`.
    pub fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo, S3Error> {
        self.with_object(bucket, key, StoredObject::info)
    }

    /// The whole object.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket` or `NoSuchKey`.
    pub fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput, S3Error> {
        let (info, data) = self.with_object(bucket, key, |o| (o.info(), o.data.clone()))?;
        Ok(GetObjectOutput {
            info,
            body: object_body(data),
            content_range: None,
        })
    }

    /// One byte range of the object.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`, `NoSuchKey`, or `InvalidRange` when the range starts
    /// past the end.
    pub fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        range: ByteRange,
    ) -> Result<GetObjectOutput, S3Error> {
        let (info, data) = self.with_object(bucket, key, |o| (o.info(), o.data.clone()))?;
        let resolved = range.resolve(info.content_length)?;
        let start = usize::try_from(resolved.start).map_err(|_| S3Error::invalid_range(key))?;
        let end = usize::try_from(resolved.end).map_err(|_| S3Error::invalid_range(key))?;
        Ok(GetObjectOutput {
            info,
            body: object_body(data.slice(start..=end)),
            content_range: Some(resolved),
        })
    }

    /// Delete an object. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<(), S3Error> {
        self.with_bucket_mut(bucket, |b| {
            b.objects.remove(key);
            Ok(())
        })
    }

    /// Delete several objects.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`.
    pub fn delete_objects(&self, bucket: &str, delete: Delete) -> Result<DeleteResult, S3Error> {
        self.with_bucket_mut(bucket, |b| {
            let mut result = DeleteResult::default();
            for target in delete.objects {
                if target.key.is_empty() {
                    result.errors.push(DeleteError {
                        key: target.key,
                        version_id: target.version_id,
                        code: "InvalidArgument".to_owned(),
                        message: "Object key must not be empty".to_owned(),
                    });
                    continue;
                }
                b.objects.remove(&target.key);
                result.deleted.push(DeletedObject {
                    key: target.key,
                    version_id: target.version_id,
                    ..DeletedObject::default()
                });
            }
            Ok(result)
        })
    }

    /// # Errors
    ///
    /// `NoSuchBucket` or `NoSuchKey`.
    pub fn object_tagging(&self, bucket: &str, key: &str) -> Result<Tagging, S3Error> {
        self.with_object(bucket, key, |o| o.tagging.clone())
    }

    /// # Errors
    ///
    /// `NoSuchBucket` or `NoSuchKey`.
    pub fn put_object_tagging(
        &self,
        bucket: &str,
        key: &str,
        tagging: Tagging,
    ) -> Result<(), S3Error> {
        self.with_object_mut(bucket, key, |o| o.tagging = tagging)
    }

    /// # Errors
    ///
    /// `NoSuchBucket` or `NoSuchKey`.
    pub fn object_acl(&self, bucket: &str, key: &str) -> Result<AccessControlPolicy, S3Error> {
        self.with_object(bucket, key, |o| {
            o.acl
                .clone()
                .unwrap_or_else(|| AccessControlPolicy::private(owner()))
        })
    }

    /// # Errors
    ///
    /// `NoSuchBucket` or `NoSuchKey`.
    pub fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: AccessControlPolicy,
    ) -> Result<(), S3Error> {
        self.with_object_mut(bucket, key, |o| o.acl = Some(acl))
    }
}

fn object_body(data: Bytes) -> StreamingBlob {
    if data.len() <= STREAM_THRESHOLD {
        return StreamingBlob::Bytes(data);
    }
    let frames: Vec<Result<Bytes, std::io::Error>> = (0..data.len())
        .step_by(STREAM_FRAME)
        .map(|start| Ok(data.slice(start..(start + STREAM_FRAME).min(data.len()))))
        .collect();
    StreamingBlob::from_stream(futures::stream::iter(frames))
}

fn list_bucket(name: &str, bucket: &StoredBucket, params: &ListParams) -> ListBucketResult {
    let prefix = params.prefix.clone().unwrap_or_default();
    let delimiter = params.delimiter.clone().filter(|d| !d.is_empty());
    let start = match params.list_type {
        ListType::V1 => params.marker.clone(),
        ListType::V2 => params
            .continuation_token
            .clone()
            .or_else(|| params.start_after.clone()),
    };
    let max_keys = usize::try_from(params.max_keys).unwrap_or(usize::MAX);

    let lower = match &start {
        Some(s) => Bound::Excluded(s.clone()),
        None => Bound::Unbounded,
    };

    let mut contents = Vec::new();
    let mut common_prefixes: Vec<CommonPrefix> = Vec::new();
    let mut last_emitted: Option<String> = None;
    let mut is_truncated = false;

    for (key, object) in bucket.objects.range((lower, Bound::Unbounded)) {
        if !key.starts_with(&prefix) {
            continue;
        }
        let rolled_up = delimiter.as_deref().and_then(|d| {
            key[prefix.len()..]
                .find(d)
                .map(|idx| key[..prefix.len() + idx + d.len()].to_owned())
        });
        if let Some(common) = &rolled_up {
            // A marker naming a common prefix skips everything under it.
            if start.as_deref() == Some(common.as_str())
                || common_prefixes.last().is_some_and(|p| &p.prefix == common)
            {
                continue;
            }
        }
        if contents.len() + common_prefixes.len() >= max_keys {
            is_truncated = true;
            break;
        }
        match rolled_up {
            Some(common) => {
                last_emitted = Some(common.clone());
                common_prefixes.push(CommonPrefix { prefix: common });
            }
            None => {
                last_emitted = Some(key.clone());
                contents.push(Object {
                    info: EntryInfo {
                        key: key.clone(),
                        last_modified: object.last_modified,
                        owner: Some(owner()),
                    },
                    e_tag: object.e_tag.clone(),
                    size: object.data.len() as u64,
                    storage_class: Some(STANDARD.to_owned()),
                });
            }
        }
    }

    let next = is_truncated.then_some(last_emitted).flatten();
    let mut result = ListBucketResult {
        name: name.to_owned(),
        prefix: params.prefix.clone(),
        delimiter,
        max_keys: params.max_keys,
        is_truncated,
        contents,
        common_prefixes,
        ..ListBucketResult::default()
    };
    match params.list_type {
        ListType::V1 => {
            result.marker = Some(params.marker.clone().unwrap_or_default());
            result.next_marker = next;
        }
        ListType::V2 => {
            let count = result.contents.len() + result.common_prefixes.len();
            result.key_count = Some(u32::try_from(count).unwrap_or(u32::MAX));
            result.continuation_token = params.continuation_token.clone();
            result.next_continuation_token = next;
            result.start_after = params.start_after.clone();
        }
    }
    result
}

fn bucket_name(ctx: &S3Context) -> Result<String, S3Error> {
    ctx.request
        .bucket()
        .map(str::to_owned)
        .ok_or_else(|| S3Error::invalid_request("A bucket name is required"))
}

fn object_name(ctx: &S3Context) -> Result<(String, String), S3Error> {
    let bucket = bucket_name(ctx)?;
    let key = ctx
        .request
        .key()
        .map(str::to_owned)
        .ok_or_else(|| S3Error::invalid_request("An object key is required"))?;
    Ok((bucket, key))
}

/// Wrap a synchronous store call as a handler.
fn sync_handler<I, O, F>(store: &Arc<MemoryStore>, f: F) -> Option<Handler<I, O>>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(&MemoryStore, &mut S3Context, I) -> Result<O, S3Error> + Send + Sync + 'static,
{
    let store = Arc::clone(store);
    Some(Handler::new(move |ctx, input| {
        let result = f(&store, ctx, input);
        async move { result }.boxed()
    }))
}

/// Build the handler registry serving `store`.
#[must_use]
pub fn callbacks(store: &Arc<MemoryStore>) -> S3Callbacks {
    let mut cb = S3Callbacks::default();

    cb.service.list_buckets = sync_handler(store, |s, _ctx, ()| Ok(s.list_buckets()));

    cb.bucket.create = sync_handler(store, |s, ctx, config: Option<CreateBucketConfiguration>| {
        let region = config
            .and_then(|c| c.location_constraint)
            .unwrap_or_else(|| ctx.request.region.clone());
        s.create_bucket(&bucket_name(ctx)?, &region)
    });
    cb.bucket.delete = sync_handler(store, |s, ctx, ()| s.delete_bucket(&bucket_name(ctx)?));
    cb.bucket.exists = sync_handler(store, |s, ctx, ()| s.head_bucket(&bucket_name(ctx)?));
    cb.bucket.read = sync_handler(store, |s, ctx, ()| {
        s.list_objects(&bucket_name(ctx)?, &ctx.request.list_params()?)
    });
    cb.bucket.read_location =
        sync_handler(store, |s, ctx, ()| s.bucket_location(&bucket_name(ctx)?));
    cb.bucket.read_acl = sync_handler(store, |s, ctx, ()| s.bucket_acl(&bucket_name(ctx)?));
    cb.bucket.write_acl = sync_handler(store, |s, ctx, acl| {
        s.put_bucket_acl(&bucket_name(ctx)?, acl)
    });
    cb.bucket.read_tagging =
        sync_handler(store, |s, ctx, ()| s.bucket_tagging(&bucket_name(ctx)?));
    cb.bucket.write_tagging = sync_handler(store, |s, ctx, tagging| {
        s.put_bucket_tagging(&bucket_name(ctx)?, Some(tagging))
    });
    cb.bucket.delete_tagging = sync_handler(store, |s, ctx, ()| {
        s.put_bucket_tagging(&bucket_name(ctx)?, None)
    });
    cb.bucket.read_versioning =
        sync_handler(store, |s, ctx, ()| s.bucket_versioning(&bucket_name(ctx)?));
    cb.bucket.write_versioning = sync_handler(store, |s, ctx, versioning| {
        s.put_bucket_versioning(&bucket_name(ctx)?, versioning)
    });

    let upload_store = Arc::clone(store);
    cb.object.create = Some(Handler::new(move |ctx, ()| {
        let store = Arc::clone(&upload_store);
        async move {
            let (bucket, key) = object_name(ctx)?;
            let object = NewObject {
                data: ctx.request.payload().await?,
                content_type: ctx.request.content_type().map(str::to_owned),
                metadata: ctx.request.user_metadata(),
            };
            store.put_object(&bucket, &key, object)
        }
        .boxed()
    }));
    cb.object.exists = sync_handler(store, |s, ctx, ()| {
        let (bucket, key) = object_name(ctx)?;
        s.head_object(&bucket, &key)
    });
    cb.object.read = sync_handler(store, |s, ctx, ()| {
        let (bucket, key) = object_name(ctx)?;
        s.get_object(&bucket, &key)
    });
    cb.object.read_range = sync_handler(store, |s, ctx, range| {
        let (bucket, key) = object_name(ctx)?;
        s.get_object_range(&bucket, &key, range)
    });
    cb.object.delete = sync_handler(store, |s, ctx, ()| {
        let (bucket, key) = object_name(ctx)?;
        s.delete_object(&bucket, &key)
    });
    cb.object.delete_multiple = sync_handler(store, |s, ctx, delete| {
        s.delete_objects(&bucket_name(ctx)?, delete)
    });
    cb.object.read_tagging = sync_handler(store, |s, ctx, ()| {
        let (bucket, key) = object_name(ctx)?;
        s.object_tagging(&bucket, &key)
    });
    cb.object.write_tagging = sync_handler(store, |s, ctx, tagging| {
        let (bucket, key) = object_name(ctx)?;
        s.put_object_tagging(&bucket, &key, tagging)
    });
    cb.object.delete_tagging = sync_handler(store, |s, ctx, ()| {
        let (bucket, key) = object_name(ctx)?;
        s.put_object_tagging(&bucket, &key, Tagging::default())
    });
    cb.object.read_acl = sync_handler(store, |s, ctx, ()| {
        let (bucket, key) = object_name(ctx)?;
        s.object_acl(&bucket, &key)
    });
    cb.object.write_acl = sync_handler(store, |s, ctx, acl| {
        let (bucket, key) = object_name(ctx)?;
        s.put_object_acl(&bucket, &key, acl)
    });

    cb
}
