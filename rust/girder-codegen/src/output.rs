//! Named in-memory output buffers and the end-of-run flush.
//!
//! Backends never touch the filesystem. They ask the [`OutputSet`] for a
//! buffer by relative path — the same canonicalized path always yields the
//! same buffer within a run — and write generated text into it. The driver
//! flushes every buffer to disk exactly once at the end.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::error;

use crate::error::CodegenError;

/// One in-memory output file.
#[derive(Debug, Default)]
pub struct OutputFile {
    buf: String,
}

impl OutputFile {
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }
}

impl fmt::Write for OutputFile {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

/// Path-keyed buffer map, flushed to a root directory at the end of a run.
#[derive(Debug, Default)]
pub struct OutputSet {
    files: BTreeMap<PathBuf, OutputFile>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the buffer for `path`, creating it lazily. Paths are normalized
    /// lexically (`./` and `../` segments removed), so `./a.ts` and `a.ts`
    /// share one buffer and no buffer can land outside the flush root.
    pub fn get_or_create(&mut self, path: impl AsRef<Path>) -> &mut OutputFile {
        let key = normalize(path.as_ref());
        self.files.entry(key).or_default()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&OutputFile> {
        self.files.get(&normalize(path.as_ref()))
    }

    /// Buffers in deterministic (sorted-path) order.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &OutputFile)> {
        self.files.iter().map(|(p, f)| (p.as_path(), f))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every buffer under `root`, creating parent directories as
    /// needed. A failed file is reported and skipped — files already written
    /// stay on disk, there is no cross-file transaction — and the aggregate
    /// failure is returned at the end. Callers must treat the output
    /// directory of a failed run as indeterminate and re-run generation.
    pub fn flush(&self, root: &Path) -> Result<(), CodegenError> {
        let mut failed: Vec<String> = Vec::new();

        for (path, file) in &self.files {
            let dest = root.join(path);
            let result = match dest.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    fs::create_dir_all(parent).and_then(|()| fs::write(&dest, file.as_str()))
                }
                _ => fs::write(&dest, file.as_str()),
            };
            if let Err(err) = result {
                error!(path = %dest.display(), %err, "failed to write output file");
                failed.push(format!("{}: {err}", dest.display()));
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(CodegenError::Flush {
                details: failed.join("; "),
            })
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir | Component::ParentDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    #[test]
    fn same_path_yields_same_buffer() {
        let mut out = OutputSet::new();
        out.get_or_create("api/client.ts").push_str("hello");
        out.get_or_create("./api/client.ts").push_str(" world");
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("api/client.ts").map(OutputFile::as_str), Some("hello world"));
    }

    #[test]
    fn buffers_support_fmt_write() {
        let mut out = OutputSet::new();
        let f = out.get_or_create("rpc.proto");
        write!(f, "syntax = {:?};", "proto3").expect("write");
        assert_eq!(f.as_str(), "syntax = \"proto3\";");
    }

    #[test]
    fn parent_components_cannot_escape_the_root() {
        let mut out = OutputSet::new();
        out.get_or_create("../escape.txt").push_str("contained");
        assert_eq!(
            out.get("escape.txt").map(OutputFile::as_str),
            Some("contained")
        );
    }

    #[test]
    fn flush_writes_nested_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut out = OutputSet::new();
        out.get_or_create("api/order/client.ts").push_str("// ts");
        out.get_or_create("rpc.proto").push_str("syntax");
        out.flush(dir.path()).expect("flush");

        let ts = std::fs::read_to_string(dir.path().join("api/order/client.ts")).expect("read");
        assert_eq!(ts, "// ts");
        let proto = std::fs::read_to_string(dir.path().join("rpc.proto")).expect("read");
        assert_eq!(proto, "syntax");
    }

    #[test]
    fn flush_reports_failures_but_writes_the_rest() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A plain file where a directory is needed makes that one write fail.
        std::fs::write(dir.path().join("blocked"), "not a dir").expect("seed");

        let mut out = OutputSet::new();
        out.get_or_create("blocked/inner.txt").push_str("never lands");
        out.get_or_create("ok.txt").push_str("fine");

        let err = out.flush(dir.path()).expect_err("flush must fail");
        assert!(matches!(err, CodegenError::Flush { .. }));

        let ok = std::fs::read_to_string(dir.path().join("ok.txt")).expect("read");
        assert_eq!(ok, "fine");
    }
}
