//! Error handling integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_bucket_on_put() {
        let client = s3_client();
        let bucket = test_bucket_name("ghost");

        let err = client
            .put_object()
            .bucket(&bucket)
            .key("file.txt")
            .body(ByteStream::from_static(b"data"))
            .send()
            .await
            .expect_err("put to nonexistent bucket should fail");
        let code = err.into_service_error().meta().code().map(ToOwned::to_owned);
        assert_eq!(code.as_deref(), Some("NoSuchBucket"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_key_on_get() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nokey").await;

        let err = client
            .get_object()
            .bucket(&bucket)
            .key("nonexistent.txt")
            .send()
            .await
            .expect_err("get nonexistent key should fail");
        assert!(err.into_service_error().is_no_such_key());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_head_of_missing_bucket() {
        let client = s3_client();
        let bucket = test_bucket_name("nohead");

        let result = client.head_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "head of nonexistent bucket should fail");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsatisfiable_range() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "badrange").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("small.txt")
            .body(ByteStream::from_static(b"abc"))
            .send()
            .await
            .expect("put_object");

        let err = client
            .get_object()
            .bucket(&bucket)
            .key("small.txt")
            .range("bytes=10-20")
            .send()
            .await
            .expect_err("range past the end should fail");
        let code = err.into_service_error().meta().code().map(ToOwned::to_owned);
        assert_eq!(code.as_deref(), Some("InvalidRange"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_duplicate_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "dup").await;

        let result = client.create_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "second create should fail");

        cleanup_bucket(&client, &bucket).await;
    }
}
