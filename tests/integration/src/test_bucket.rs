//! Bucket integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{BucketVersioningStatus, Tag, Tagging, VersioningConfiguration};

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_list_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "create").await;

        let resp = client.list_buckets().send().await.expect("list_buckets");
        let names: Vec<_> = resp.buckets().iter().filter_map(|b| b.name()).collect();
        assert!(names.contains(&bucket.as_str()), "bucket should be listed");

        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("head_bucket");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_bucket_location() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "location").await;

        let resp = client
            .get_bucket_location()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_location");
        // us-east-1 is reported as an empty constraint.
        assert!(
            resp.location_constraint()
                .is_none_or(|c| c.as_str().is_empty() || c.as_str() == "us-east-1")
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_to_delete_non_empty_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nonempty").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("keep.txt")
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put_object");

        let err = client
            .delete_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("delete of non-empty bucket should fail");
        let code = err.into_service_error().meta().code().map(ToOwned::to_owned);
        assert_eq!(code.as_deref(), Some("BucketNotEmpty"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_bucket_tagging() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "tagging").await;

        let tagging = Tagging::builder()
            .tag_set(Tag::builder().key("env").value("dev").build().expect("tag"))
            .build()
            .expect("tagging");
        client
            .put_bucket_tagging()
            .bucket(&bucket)
            .tagging(tagging)
            .send()
            .await
            .expect("put_bucket_tagging");

        let resp = client
            .get_bucket_tagging()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_tagging");
        assert_eq!(resp.tag_set().len(), 1);
        assert_eq!(resp.tag_set()[0].key(), "env");
        assert_eq!(resp.tag_set()[0].value(), "dev");

        client
            .delete_bucket_tagging()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete_bucket_tagging");
        assert!(
            client
                .get_bucket_tagging()
                .bucket(&bucket)
                .send()
                .await
                .is_err(),
            "tagging should be gone"
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_enable_versioning() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "versioning").await;

        client
            .put_bucket_versioning()
            .bucket(&bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .expect("put_bucket_versioning");

        let resp = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_versioning");
        assert_eq!(resp.status(), Some(&BucketVersioningStatus::Enabled));

        let put = client
            .put_object()
            .bucket(&bucket)
            .key("v.txt")
            .body(ByteStream::from_static(b"v1"))
            .send()
            .await
            .expect("put_object");
        assert!(put.version_id().is_some(), "version id should be returned");

        cleanup_bucket(&client, &bucket).await;
    }
}
