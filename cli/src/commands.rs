//! Subcommand implementations. Each writes its output to `out`.

use std::io::{self, Read, Write};
use std::time::UNIX_EPOCH;

use blobfs::{BlobFs, FileInfo, path};

/// Turn a user-supplied path into a logical path accepted by [`BlobFs::open`].
fn logical(arg: &str) -> io::Result<String> {
    path::normalize(arg).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{arg}: paths may not leave the root"),
        )
    })
}

fn describe(info: &FileInfo) -> String {
    let modified = info
        .mod_time()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or_else(|| "-".to_owned(), |d| d.as_secs().to_string());
    format!(
        "{:<9} {:>10} {:>12}",
        if info.is_dir() { "directory" } else { "file" },
        info.size(),
        modified
    )
}

/// List the entries of a directory, sorted by name. Directories get a
/// trailing slash.
pub fn ls(fs: &BlobFs, arg: &str, out: &mut impl Write) -> io::Result<()> {
    for entry in fs.read_dir(&logical(arg)?)? {
        if entry.is_dir() {
            writeln!(out, "{}/", entry.name())?;
        } else {
            writeln!(out, "{}", entry.name())?;
        }
    }
    Ok(())
}

/// Copy a file's contents to `out`.
pub fn cat(fs: &BlobFs, arg: &str, out: &mut impl Write) -> io::Result<()> {
    let mut file = fs.open(&logical(arg)?)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        out.write_all(&buf[..n])?;
    }
}

/// Print kind, size and modification time (seconds since the epoch).
pub fn stat(fs: &BlobFs, arg: &str, out: &mut impl Write) -> io::Result<()> {
    let info = fs.stat(&logical(arg)?)?;
    writeln!(out, "{} {}", describe(&info), info.name())
}

/// Print the tree below a directory, depth first, two spaces per level.
pub fn tree(fs: &BlobFs, arg: &str, out: &mut impl Write) -> io::Result<()> {
    let root = logical(arg)?;
    writeln!(out, "{root}")?;
    walk(fs, &root, 1, out)
}

fn walk(fs: &BlobFs, dir: &str, depth: usize, out: &mut impl Write) -> io::Result<()> {
    for entry in fs.read_dir(dir)? {
        let indent = "  ".repeat(depth);
        if entry.is_dir() {
            writeln!(out, "{indent}{}/", entry.name())?;
            walk(fs, entry.path(), depth + 1, out)?;
        } else {
            writeln!(out, "{indent}{}", entry.name())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobfs::MemoryBucket;
    use rstest::rstest;

    fn sample() -> BlobFs {
        let bucket = MemoryBucket::new();
        bucket.insert("v1/site/index.html", b"<html>".to_vec());
        bucket.insert("v1/site/css/main.css", b"body{}".to_vec());
        bucket.insert("v1/site/js/app/main.js", b"run()".to_vec());
        BlobFs::new("v1", "site", bucket).unwrap()
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[rstest]
    #[case::root(".", "css/\nindex.html\njs/\n")]
    #[case::empty_arg("", "css/\nindex.html\njs/\n")]
    #[case::nested("js", "app/\n")]
    #[case::slashes("/js/app/", "main.js\n")]
    fn ls_lists_children(#[case] arg: &str, #[case] expected: &str) {
        let fs = sample();
        assert_eq!(output(|out| ls(&fs, arg, out)), expected);
    }

    #[test]
    fn cat_copies_contents() {
        let fs = sample();
        assert_eq!(output(|out| cat(&fs, "css/main.css", out)), "body{}");
    }

    #[test]
    fn stat_describes_nodes() {
        let fs = sample();
        let file = output(|out| stat(&fs, "index.html", out));
        assert!(file.starts_with("file"));
        assert!(file.trim_end().ends_with("index.html"));

        let dir = output(|out| stat(&fs, "css", out));
        assert!(dir.starts_with("directory"));
        assert!(dir.contains(" - "));
    }

    #[test]
    fn tree_walks_depth_first() {
        let fs = sample();
        assert_eq!(
            output(|out| tree(&fs, ".", out)),
            ".\n  css/\n    main.css\n  index.html\n  js/\n    app/\n      main.js\n"
        );
    }

    #[rstest]
    #[case::missing("nope", io::ErrorKind::NotFound)]
    #[case::escape("../secret", io::ErrorKind::InvalidInput)]
    fn errors_map_to_io_kinds(#[case] arg: &str, #[case] kind: io::ErrorKind) {
        let fs = sample();
        let err = cat(&fs, arg, &mut io::sink()).unwrap_err();
        assert_eq!(err.kind(), kind);
    }
}
