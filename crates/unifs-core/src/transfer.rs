//! Copy and move between virtual paths, possibly across adapters.
//!
//! Neither operation is atomic. A failed copy may leave a partial
//! destination behind, and a move whose source delete fails keeps the
//! destination copy. Both are left for the caller to reconcile.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::fs::FileSystem;

impl FileSystem {
    /// Copy a file. Source and destination adapters are resolved and
    /// connected independently and may be the same adapter.
    pub async fn copy_file(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (source_adapter, source_path) = self.resolve(source, cancel).await?;
        let (dest_adapter, dest_path) = self.resolve(destination, cancel).await?;

        let contents = source_adapter.read_file(&source_path, cancel).await?;
        dest_adapter
            .write_file(&dest_path, &contents, overwrite, cancel)
            .await?;

        tracing::debug!(%source, %destination, bytes = contents.len(), "copied file");
        Ok(())
    }

    /// Copy a file, then delete the source.
    ///
    /// If the delete fails the destination copy stays in place and the
    /// delete error is returned.
    pub async fn move_file(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.copy_file(source, destination, overwrite, cancel).await?;

        let (source_adapter, source_path) = self.resolve(source, cancel).await?;
        if let Err(e) = source_adapter.delete_file(&source_path, cancel).await {
            tracing::warn!(
                %source,
                %destination,
                error = %e,
                "move left destination copy behind: source delete failed"
            );
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::adapters::MemoryAdapter;
    use crate::error::ErrorKind;
    use crate::fs::FileSystem;
    use tokio_util::sync::CancellationToken;

    fn two_stores() -> FileSystem {
        let mut fs = FileSystem::new();
        fs.add_adapter(MemoryAdapter::new("a"));
        fs.add_adapter(MemoryAdapter::new("b"));
        fs
    }

    #[tokio::test]
    async fn copy_within_one_adapter() {
        let fs = two_stores();
        let cancel = CancellationToken::new();
        fs.write_file("a://src.txt", b"data", false, &cancel).await.unwrap();

        fs.copy_file("a://src.txt", "a://dst.txt", false, &cancel).await.unwrap();
        assert_eq!(fs.read_file("a://dst.txt", &cancel).await.unwrap(), b"data");
        assert!(fs.file_exists("a://src.txt", &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn copy_respects_overwrite() {
        let fs = two_stores();
        let cancel = CancellationToken::new();
        fs.write_file("a://src.txt", b"new", false, &cancel).await.unwrap();
        fs.write_file("b://dst.txt", b"old", false, &cancel).await.unwrap();

        let err = fs
            .copy_file("a://src.txt", "b://dst.txt", false, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileExists);
        assert_eq!(fs.read_file("b://dst.txt", &cancel).await.unwrap(), b"old");

        fs.copy_file("a://src.txt", "b://dst.txt", true, &cancel).await.unwrap();
        assert_eq!(fs.read_file("b://dst.txt", &cancel).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn copy_missing_source() {
        let fs = two_stores();
        let cancel = CancellationToken::new();
        let err = fs
            .copy_file("a://nope", "b://dst", false, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(!fs.file_exists("b://dst", &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn copy_to_unknown_adapter_reads_nothing() {
        let fs = two_stores();
        let cancel = CancellationToken::new();
        let err = fs
            .copy_file("a://nope", "z://dst", false, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AdapterNotFound);
    }
}
