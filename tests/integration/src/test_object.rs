//! Object integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{Delete, ObjectIdentifier};
    use bytes::Bytes;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_object() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "putget").await;

        let body = b"hello, s3gate!";
        client
            .put_object()
            .bucket(&bucket)
            .key("greeting.txt")
            .body(ByteStream::from_static(body))
            .content_type("text/plain")
            .metadata("owner", "alice")
            .send()
            .await
            .expect("put_object");

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("greeting.txt")
            .send()
            .await
            .expect("get_object");

        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.content_length(), Some(14));
        assert_eq!(
            resp.metadata().and_then(|m| m.get("owner")).map(String::as_str),
            Some("alice")
        );

        let data = resp
            .body
            .collect()
            .await
            .expect("collect body")
            .into_bytes();
        assert_eq!(data.as_ref(), body);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_head_object() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "head").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("file.bin")
            .body(ByteStream::from_static(b"binary data"))
            .send()
            .await
            .expect("put_object");

        let resp = client
            .head_object()
            .bucket(&bucket)
            .key("file.bin")
            .send()
            .await
            .expect("head_object");

        assert_eq!(resp.content_length(), Some(11));
        assert!(resp.e_tag().is_some(), "etag should be present");
        assert!(resp.last_modified().is_some());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_get_object_range() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "range").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("digits.txt")
            .body(ByteStream::from_static(b"0123456789"))
            .send()
            .await
            .expect("put_object");

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("digits.txt")
            .range("bytes=2-5")
            .send()
            .await
            .expect("get_object range");

        assert_eq!(resp.content_range(), Some("bytes 2-5/10"));
        assert_eq!(resp.content_length(), Some(4));
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"2345");

        let suffix = client
            .get_object()
            .bucket(&bucket)
            .key("digits.txt")
            .range("bytes=-3")
            .send()
            .await
            .expect("get_object suffix range");
        let data = suffix.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"789");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_large_object() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "large").await;

        let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
        client
            .put_object()
            .bucket(&bucket)
            .key("large.bin")
            .body(ByteStream::from(Bytes::from(payload.clone())))
            .send()
            .await
            .expect("put_object");

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("large.bin")
            .send()
            .await
            .expect("get_object");
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.len(), payload.len());
        assert_eq!(data.as_ref(), payload.as_slice());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_objects_in_batch() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "batch").await;

        for key in ["a.txt", "b.txt", "c.txt"] {
            client
                .put_object()
                .bucket(&bucket)
                .key(key)
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .expect("put_object");
        }

        let delete = Delete::builder()
            .objects(ObjectIdentifier::builder().key("a.txt").build().expect("id"))
            .objects(ObjectIdentifier::builder().key("b.txt").build().expect("id"))
            .build()
            .expect("delete");
        let resp = client
            .delete_objects()
            .bucket(&bucket)
            .delete(delete)
            .send()
            .await
            .expect("delete_objects");
        assert_eq!(resp.deleted().len(), 2);
        assert!(resp.errors().is_empty());

        let list = client
            .list_objects_v2()
            .bucket(&bucket)
            .send()
            .await
            .expect("list_objects_v2");
        let keys: Vec<_> = list.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, ["c.txt"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_get_default_object_acl() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "acl").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("private.txt")
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put_object");

        let resp = client
            .get_object_acl()
            .bucket(&bucket)
            .key("private.txt")
            .send()
            .await
            .expect("get_object_acl");
        assert!(resp.owner().is_some());
        assert_eq!(resp.grants().len(), 1);

        cleanup_bucket(&client, &bucket).await;
    }
}
