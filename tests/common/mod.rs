#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::BufRead;

use pretty_assertions::assert_eq;

pub const SIMPLE: &str = "./tests/data/profiles/simple.cg";
pub const MULTI: &str = "./tests/data/profiles/multi.cg";

pub fn fixture(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("failed to read {}: {}", path, e))
}

/// Replace every node id (`n` followed by 64 hex digits) with `n1`, `n2`, ... in order of first
/// appearance, so that expected outputs do not depend on the hash.
pub fn normalize_ids(output: &str) -> String {
    const HASH_LEN: usize = 64;

    let mut ids: HashMap<&str, usize> = HashMap::new();
    let mut out = String::with_capacity(output.len());
    let mut rest = output;
    while let Some(at) = rest.find("\"n") {
        let (before, candidate) = rest.split_at(at + 2);
        out.push_str(before);
        let hash = candidate.get(..HASH_LEN).filter(|h| {
            h.bytes().all(|b| b.is_ascii_hexdigit()) && candidate[HASH_LEN..].starts_with('"')
        });
        match hash {
            Some(hash) => {
                let next = ids.len() + 1;
                let n = *ids.entry(hash).or_insert(next);
                out.push_str(&n.to_string());
                rest = &candidate[HASH_LEN..];
            }
            None => rest = candidate,
        }
    }
    out.push_str(rest);
    out
}

/// Compare `result` with the file at `expected_file` line by line.
///
/// With `ignore_indent`, leading and trailing whitespace is ignored, as are blank lines and
/// where exactly the lines break.
pub fn compare_results<R>(result: R, expected_file: &str, ignore_indent: bool)
where
    R: BufRead,
{
    let expected = fixture(expected_file);
    let result: Vec<String> = result.lines().map(|l| l.unwrap()).collect();

    if ignore_indent {
        fn flatten<'a>(lines: impl Iterator<Item = &'a str>) -> String {
            lines.map(str::trim).collect()
        }
        assert_eq!(
            flatten(result.iter().map(String::as_str)),
            flatten(expected.lines()),
            "\n{}",
            expected_file
        );
        return;
    }

    let mut expected = expected.lines();
    for (i, line) in result.iter().enumerate() {
        let want = expected.next().unwrap_or_else(|| {
            panic!(
                "\noutput has more lines than expected result file: {}",
                expected_file
            )
        });
        assert_eq!(line.as_str(), want, "\n{}:{}", expected_file, i + 1);
    }

    if expected.next().is_some() {
        panic!(
            "\n{} has more lines than output, beginning at line: {}",
            expected_file,
            result.len() + 1
        )
    }
}
