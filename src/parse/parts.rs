use super::{records_at, Options, Profile};
use crate::error::FormatError;

/// Lines starting with this separate the runs of a multi-run profile
/// (`==== NEW PROFILING FILE ==============================`).
pub const SEPARATOR: &str = "====";

/// One profiling run inside a (possibly) multi-run profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Part<'a> {
    /// Position among the non-empty parts of the input, starting at 0.
    pub index: usize,
    /// The 1-based line of the input that `text` starts at.
    pub first_line: usize,
    /// The part itself, header included.
    pub text: &'a str,
}

impl<'a> Part<'a> {
    /// The part's metadata lines (`version:`, `cmd:`, ...).
    pub fn header(&self, opt: &Options) -> impl Iterator<Item = &'a str> {
        self.text
            .lines()
            .skip_while(|l| l.trim().is_empty())
            .take(opt.header_lines)
    }

    /// Parse this part's records.
    pub fn records(&self, opt: &Options) -> Result<Profile, FormatError> {
        records_at(self.text, self.first_line, opt)
    }
}

/// Split a profile into its parts.
///
/// A profile without separators is a single part. Parts that contain nothing but whitespace
/// are skipped and do not get an index.
pub fn split(input: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut push = |start: usize, end: usize, first_line: usize| {
        let text = &input[start..end];
        if !text.trim().is_empty() {
            parts.push(Part {
                index: parts.len(),
                first_line,
                text,
            });
        }
    };

    let mut start = 0;
    let mut first_line = 1;
    let mut offset = 0;
    for (n, line) in input.split_inclusive('\n').enumerate() {
        let next = offset + line.len();
        if line.starts_with(SEPARATOR) {
            push(start, offset, first_line);
            start = next;
            first_line = n + 2;
        }
        offset = next;
    }
    push(start, input.len(), first_line);

    parts
}

/// Which parts of a multi-run profile to process.
///
/// The default selects every part.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    /// Only these part indices, if set.
    pub indices: Option<Vec<usize>>,
    /// Only parts whose header contains at least one of these strings, if not empty.
    pub include: Vec<String>,
    /// No part whose header contains any of these strings.
    pub exclude: Vec<String>,
}

impl Selection {
    /// Whether `part` should be processed.
    pub fn matches(&self, part: &Part<'_>, opt: &Options) -> bool {
        if let Some(ref indices) = self.indices {
            if !indices.contains(&part.index) {
                return false;
            }
        }

        if self.include.is_empty() && self.exclude.is_empty() {
            return true;
        }

        let header: Vec<&str> = part.header(opt).collect();
        let mentions = |needle: &String| header.iter().any(|line| line.contains(needle.as_str()));
        if self.exclude.iter().any(mentions) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(mentions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_RUNS: &str = "\
version: 1
cmd: /index.php
part: 1

events: Time Memory Cycles Peakmemory

fl=a.php
fn=a
1 1 0 0 0
==== NEW PROFILING FILE ====
version: 1
cmd: /admin.php
part: 1

events: Time Memory Cycles Peakmemory

fl=b.php
fn=b
1 2 0 0 0
";

    #[test]
    fn single_part() {
        let parts = split("version: 1\n");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].first_line, 1);
        assert_eq!(parts[0].text, "version: 1\n");
    }

    #[test]
    fn two_parts() {
        let parts = split(TWO_RUNS);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].index, 0);
        assert_eq!(parts[1].index, 1);
        assert_eq!(parts[1].first_line, 11);
        assert!(parts[1].text.starts_with("version: 1\ncmd: /admin.php"));

        let opt = Options::default();
        let second = parts[1].records(&opt).unwrap();
        assert_eq!(second.records[0].function, "b");
    }

    #[test]
    fn empty_parts_are_skipped() {
        let parts = split("==== NEW PROFILING FILE\n\n==== NEW PROFILING FILE\nversion: 1\n");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].index, 0);
        assert_eq!(parts[0].first_line, 4);
    }

    #[test]
    fn errors_point_into_the_whole_file() {
        let broken = TWO_RUNS.replace("fn=b", "fx=b");
        let parts = split(&broken);
        let err = parts[1].records(&Options::default()).unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedLine { line: 18, .. }));
    }

    #[test]
    fn selection() {
        let parts = split(TWO_RUNS);
        let opt = Options::default();

        let all = Selection::default();
        assert!(parts.iter().all(|p| all.matches(p, &opt)));

        let second = Selection {
            indices: Some(vec![1]),
            ..Selection::default()
        };
        assert!(!second.matches(&parts[0], &opt));
        assert!(second.matches(&parts[1], &opt));

        let admin = Selection {
            include: vec!["admin".into()],
            ..Selection::default()
        };
        assert!(!admin.matches(&parts[0], &opt));
        assert!(admin.matches(&parts[1], &opt));

        let no_admin = Selection {
            exclude: vec!["admin".into()],
            ..Selection::default()
        };
        assert!(no_admin.matches(&parts[0], &opt));
        assert!(!no_admin.matches(&parts[1], &opt));
    }
}
