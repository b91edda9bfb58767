/*!
The File Processor (C4): turns an included, non-binary file into either a
fenced content block or a bare relative path, decoding its bytes along the
way. The fence shape and lossy-decode framing are grounded on
`other_examples/42e0b89d_Dylan-Gallagher-dir2prompt__src-main.rs`'s
`read_file_limited`/`bytes_to_text`; the three-way decode cascade uses
`encoding_rs`, which this crate also carries for its wire-level buffer
transcoding, repurposed here for file content.
*/

use std::fs;
use std::path::Path;

use crate::orchestrator::SizeLedger;

/// What the File Processor produced for one entry: a line or block to
/// append to the output stream, or nothing if the file had to be skipped
/// (a recovered `FileReadError`, never surfaced to the caller).
pub enum Emitted {
    Block(String),
    Skipped,
}

/// Decode raw bytes with a UTF-8 -> Latin-1 -> CP-1252 cascade. Latin-1
/// (every byte maps directly to U+0000..=U+00FF) always
/// succeeds, so in this exact order CP-1252 is never actually reached; the
/// cascade is implemented in the stated order regardless; see DESIGN.md.
fn decode(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    decode_latin1(bytes)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[allow(dead_code)]
fn decode_cp1252(bytes: &[u8]) -> Option<String> {
    let (cow, _enc, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    if had_errors {
        None
    } else {
        Some(cow.into_owned())
    }
}

/// Process one included, non-binary file at `abs_path`, whose output path
/// relative to the project root is `rel_path`.
///
/// Updates `ledger` with the file's raw size (see `SizeLedger::record` for
/// how list-only mode still tracks the largest-files diagnostic without
/// counting toward the emitted-bytes total). Returns the text to append to
/// the output stream, or `Emitted::Skipped` if the file could not be read.
pub fn process_file(
    abs_path: &Path,
    rel_path: &str,
    list_only: bool,
    debug_explain: bool,
    ledger: &mut SizeLedger,
) -> Emitted {
    let bytes = match fs::read(abs_path) {
        Ok(b) => b,
        Err(e) => {
            log::debug!("skipping {}: {}", abs_path.display(), e);
            if debug_explain {
                return Emitted::Block(format!("note: skipped {rel_path} ({e})"));
            }
            return Emitted::Skipped;
        }
    };

    let raw_size = bytes.len() as u64;
    ledger.record(rel_path, raw_size, list_only);

    if list_only {
        Emitted::Block(rel_path.to_string())
    } else {
        let content = decode(&bytes);
        Emitted::Block(format!("```path={rel_path}\n{content}\n```"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_utf8() {
        assert_eq!(decode("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn decodes_invalid_utf8_via_latin1() {
        let bytes = vec![0xFF, 0x41];
        let s = decode(&bytes);
        assert_eq!(s.chars().next().unwrap(), '\u{FF}');
        assert_eq!(s.chars().nth(1).unwrap(), 'A');
    }

    #[test]
    fn cp1252_decodes_without_replacement() {
        // 0x93/0x94 are smart quotes in CP-1252, undefined in Latin-1's
        // direct 1:1 mapping but still decodable here on their own terms.
        let bytes = vec![0x93, b'h', b'i', 0x94];
        let s = decode_cp1252(&bytes).unwrap();
        assert!(s.contains("hi"));
    }

    #[test]
    fn list_only_emits_bare_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();
        let mut ledger = SizeLedger::new();
        match process_file(&file, "a.txt", true, false, &mut ledger) {
            Emitted::Block(s) => assert_eq!(s, "a.txt"),
            Emitted::Skipped => panic!("expected a block"),
        }
        assert_eq!(ledger.observed_bytes(), 0);
    }

    #[test]
    fn content_mode_emits_fence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();
        let mut ledger = SizeLedger::new();
        match process_file(&file, "a.txt", false, false, &mut ledger) {
            Emitted::Block(s) => {
                assert!(s.starts_with("```path=a.txt\n"));
                assert!(s.ends_with("```"));
                assert!(s.contains("hello"));
            }
            Emitted::Skipped => panic!("expected a block"),
        }
        assert_eq!(ledger.observed_bytes(), 5);
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist.txt");
        let mut ledger = SizeLedger::new();
        match process_file(&missing, "does-not-exist.txt", false, false, &mut ledger) {
            Emitted::Skipped => {}
            Emitted::Block(_) => panic!("expected skip"),
        }
    }
}
