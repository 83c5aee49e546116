use crate::DocumentSink;

/// `<stem>_v<version>`
pub fn versioned_stem(stem: &str, version: u32) -> String {
    format!("{stem}_v{version}")
}

/// Finds the version suffix to use when writing `<stem>.<extension>`.
///
/// Returns `None` when the plain name is free, otherwise the smallest `N >= 2`
/// for which `<stem>_vN.<extension>` does not exist yet.
pub async fn next_available_version<S: DocumentSink>(
    sink: &S,
    stem: &str,
    extension: &str,
) -> anyhow::Result<Option<u32>> {
    if !sink.exists(&format!("{stem}.{extension}")).await? {
        return Ok(None);
    }

    let mut version = 2;
    while sink
        .exists(&format!("{}.{extension}", versioned_stem(stem, version)))
        .await?
    {
        version += 1;
    }

    tracing::debug!(stem, version, "Base name taken, using versioned name");
    Ok(Some(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FsDocumentSink, MemoryDocumentSink};

    #[tokio::test]
    async fn test_free_base_name_needs_no_version() {
        let sink = MemoryDocumentSink::default();
        assert_eq!(next_available_version(&sink, "foo", "md").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_versions_increment_past_existing_files() {
        let sink = MemoryDocumentSink::default();
        sink.write("foo.md", "").await.unwrap();
        assert_eq!(
            next_available_version(&sink, "foo", "md").await.unwrap(),
            Some(2)
        );

        sink.write("foo_v2.md", "").await.unwrap();
        assert_eq!(
            next_available_version(&sink, "foo", "md").await.unwrap(),
            Some(3)
        );
    }

    #[tokio::test]
    async fn test_versioning_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsDocumentSink::new(dir.path());
        std::fs::write(dir.path().join("talk.md"), "x").unwrap();
        std::fs::write(dir.path().join("talk_v2.md"), "x").unwrap();
        std::fs::write(dir.path().join("talk_v3.md"), "x").unwrap();

        assert_eq!(
            next_available_version(&sink, "talk", "md").await.unwrap(),
            Some(4)
        );
        assert_eq!(versioned_stem("talk", 4), "talk_v4");
    }
}
