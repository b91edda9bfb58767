/*!
The Binary Classifier (C3): a three-stage cascade deciding whether a file's
contents should be treated as binary (excluded from content output).
Grounded on `is_binary_by_extension`/`is_binary_by_content` in
`other_examples/67f6f07a_robin-collins-aibundle__src-fs-mod.rs` (extension
table, then NUL-byte, then a printable-ratio threshold) and on
`is_binary_file` in `other_examples/1253a6a4_wheevu-repo-context__src-scan-scanner.rs`,
which names the same cascade as a single testable unit.
*/

use std::fs::File;
use std::io::Read;
use std::path::Path;

const SNIFF_LEN: usize = 8192;
const PRINTABLE_RATIO_THRESHOLD: f64 = 0.85;

/// Classify `path` as binary or text using the extension/MIME guess, then
/// (if inconclusive) a content sniff of the first `SNIFF_LEN` bytes. A read
/// error at the sniff stage is treated as binary, the safe exclusion.
pub fn is_binary(path: &Path) -> bool {
    match mime_guess::from_path(path).first() {
        Some(mime) if mime.type_() == mime_guess::mime::TEXT => return false,
        Some(_) => return true,
        None => {}
    }

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return true,
    };
    let mut buf = vec![0u8; SNIFF_LEN];
    let n = match file.read(&mut buf) {
        Ok(n) => n,
        Err(_) => return true,
    };
    is_binary_content(&buf[..n])
}

/// The content-sniffing half of the cascade, split out so it can be tested
/// directly against in-memory byte slices without touching the filesystem.
fn is_binary_content(chunk: &[u8]) -> bool {
    if chunk.contains(&0u8) {
        return true;
    }
    if chunk.is_empty() {
        return false;
    }
    let printable = chunk
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b) || matches!(b, b'\t' | b'\n' | b'\r'))
        .count();
    let ratio = printable as f64 / chunk.len() as f64;
    ratio < PRINTABLE_RATIO_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn text_extension_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.rs");
        std::fs::write(&path, b"fn main() {}\n").unwrap();
        assert!(!is_binary(&path));
    }

    #[test]
    fn known_binary_extension_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"not really a png but has the extension").unwrap();
        assert!(is_binary(&path));
    }

    #[test]
    fn nul_byte_forces_binary() {
        assert!(is_binary_content(b"hello\0world"));
    }

    #[test]
    fn mostly_printable_is_text() {
        assert!(!is_binary_content(b"the quick brown fox\njumps over\tthe lazy dog\n"));
    }

    #[test]
    fn mostly_nonprintable_is_binary() {
        let chunk: Vec<u8> = (0..64u8).collect();
        assert!(is_binary_content(&chunk));
    }

    #[test]
    fn unknown_extension_falls_through_to_content_sniff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Makefile.extensionless_marker_xyz");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"all:\n\tcargo build\n").unwrap();
        assert!(!is_binary(&path));
    }
}
