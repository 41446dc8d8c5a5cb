//! List objects integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    async fn populate_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
        let keys = [
            "photos/2024/jan/img1.jpg",
            "photos/2024/jan/img2.jpg",
            "photos/2024/feb/img3.jpg",
            "photos/2025/mar/img4.jpg",
            "documents/report.pdf",
            "documents/readme.txt",
            "root.txt",
        ];
        for key in keys {
            client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .unwrap_or_else(|e| panic!("put {key}: {e}"));
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_objects_v2() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "listv2").await;
        populate_bucket(&client, &bucket).await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .send()
            .await
            .expect("list_objects_v2");

        assert_eq!(resp.key_count(), Some(7));
        assert_eq!(resp.is_truncated(), Some(false));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_group_common_prefixes() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "delim").await;
        populate_bucket(&client, &bucket).await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .prefix("photos/")
            .delimiter("/")
            .send()
            .await
            .expect("list_objects_v2");

        let prefixes: Vec<_> = resp
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .collect();
        assert_eq!(prefixes, ["photos/2024/", "photos/2025/"]);
        assert!(resp.contents().is_empty());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_paginate_with_continuation_token() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "paginate").await;
        populate_bucket(&client, &bucket).await;

        let first = client
            .list_objects_v2()
            .bucket(&bucket)
            .max_keys(3)
            .send()
            .await
            .expect("first page");
        assert_eq!(first.contents().len(), 3);
        assert_eq!(first.is_truncated(), Some(true));
        let token = first
            .next_continuation_token()
            .expect("continuation token")
            .to_owned();

        let mut seen = first.contents().len();
        let mut next = Some(token);
        while let Some(token) = next.take() {
            let page = client
                .list_objects_v2()
                .bucket(&bucket)
                .max_keys(3)
                .continuation_token(token)
                .send()
                .await
                .expect("next page");
            seen += page.contents().len();
            if page.is_truncated() == Some(true) {
                next = page.next_continuation_token().map(ToOwned::to_owned);
            }
        }
        assert_eq!(seen, 7);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_objects_v1_with_marker() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "listv1").await;
        populate_bucket(&client, &bucket).await;

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .marker("photos/2024/jan/img2.jpg")
            .send()
            .await
            .expect("list_objects");

        let keys: Vec<_> = resp.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, ["photos/2025/mar/img4.jpg", "root.txt"]);

        cleanup_bucket(&client, &bucket).await;
    }
}
