/// Splitting of multi-run profiles into independently parsed parts.
pub mod parts;

use crate::costs::Costs;
use crate::error::FormatError;

const MAIN: &str = "{main}";
const FILENAME: &str = "fl=";
const FUNCTION: &str = "fn=";
const CALLED_FUNCTION: &str = "cfn=";
const CALLS: &str = "calls=";
const SUMMARY: &str = "summary:";
const COST_LINE: &str = "<line> <time> <memory> <cycles> <peakmemory>";

/// Number of metadata lines at the top of a profile (`version:`, `cmd:`, `part:`, a blank
/// line, `events:` and another blank line).
pub const DEFAULT_HEADER_LINES: usize = 6;

/// Options for the record parser.
#[derive(Clone, Debug)]
pub struct Options {
    /// How many metadata lines precede the first function block.
    ///
    /// Default is [`DEFAULT_HEADER_LINES`].
    pub header_lines: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            header_lines: DEFAULT_HEADER_LINES,
        }
    }
}

/// One function block of the profile.
///
/// A record describes a single invocation: where the function lives, what it cost on its own
/// (excluding everything it called), and how many calls it made. The calls themselves are
/// separate records; [`crate::tree::build`] puts them back under their caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// The file the function is defined in, or `php:internal` for built-ins.
    pub filename: String,
    /// The function name, e.g. `Foo->bar`, `Foo::baz`, `php::strlen` or `{main}`.
    pub function: String,
    /// The cost of this invocation alone.
    pub costs: Costs,
    /// The total of the `calls=` counts of this block's subcalls.
    pub subcalls: u64,
}

/// The result of parsing one profile (or one part of a multi-run profile).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    /// Every function block, in file order.
    pub records: Vec<Record>,
    /// The totals declared on the `summary:` line, if the profile had one.
    pub summary: Option<Costs>,
}

/// Parse a Cachegrind-format profile into its function records.
///
/// The format is line oriented. After the metadata header (see [`Options::header_lines`]) the
/// file is a sequence of blocks separated by blank lines:
///
/// ```text
/// fl=SomeClass.php
/// fn=SomeClass::getInstance
/// 398 76 1088 0 0
/// cfn=SomeClass->__construct
/// calls=1 0 0
/// 93 52 808 0 0
/// ```
///
/// The first two lines name the file and the function. The third is the function's own cost:
/// a line number followed by time, memory, cycles and peak memory, in that order. Then come
/// zero or more groups of three lines, one per call the function made: the callee, the number
/// of calls, and the cost of the call (which is the callee's inclusive cost, and is not used
/// here; the callee's own block carries its costs).
///
/// The block for `{main}` has a slightly different shape, with the profile totals in between:
///
/// ```text
/// fl=index.php
/// fn={main}
///
/// summary: 159 1088 0 10
///
/// 0 21 30 0 70
/// ```
///
/// Memory columns may be negative (the profiler records memory deltas); they are clamped to 0.
pub fn records(input: &str, opt: &Options) -> Result<Profile, FormatError> {
    records_at(input, 1, opt)
}

/// Like [`records`], but for input that starts at line `first_line` of a larger file.
pub(crate) fn records_at(
    input: &str,
    first_line: usize,
    opt: &Options,
) -> Result<Profile, FormatError> {
    let lines = Lines::new(input, first_line);
    let mut profile = Profile::default();

    let mut cur = opt.header_lines;
    while cur < lines.len() {
        if lines.is_blank(cur) {
            // tolerate more than one blank line between blocks
            cur += 1;
            continue;
        }

        let filename = lines.expect_prefix(cur, FILENAME)?;
        let function = lines.expect_prefix(cur + 1, FUNCTION)?;
        let costs = if function.starts_with(MAIN) {
            let summary = lines.expect_prefix(cur + 3, SUMMARY)?;
            profile.summary = Some(parse_costs(summary, lines.number(cur + 3))?);
            let costs = lines.cost_line(cur + 5)?;
            cur += 6;
            costs
        } else {
            let costs = lines.cost_line(cur + 2)?;
            cur += 3;
            costs
        };

        let mut subcalls = 0u64;
        while cur < lines.len() && !lines.is_blank(cur) {
            lines.expect_prefix(cur, CALLED_FUNCTION)?;
            let calls = lines.expect_prefix(cur + 1, CALLS)?;
            subcalls = subcalls.saturating_add(parse_calls(calls, lines.number(cur + 1))?);
            // the inclusive cost of the call; validated, but the callee's block is authoritative
            lines.cost_line(cur + 2)?;
            cur += 3;
        }

        trace!("{} ({}) made {} call(s)", function, filename, subcalls);
        profile.records.push(Record {
            filename: filename.to_owned(),
            function: function.to_owned(),
            costs,
            subcalls,
        });

        // the blank line that ends the block
        cur += 1;
    }

    debug!(
        "parsed {} record(s) starting at line {}",
        profile.records.len(),
        first_line
    );
    Ok(profile)
}

/// The input split into lines, with leading and trailing blank lines removed (but remembered,
/// so that error messages can still point at the right line of the file).
struct Lines<'a> {
    lines: Vec<&'a str>,
    first_line: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str, first_line: usize) -> Self {
        let mut lines: Vec<&str> = input.lines().collect();
        while lines.last().map_or(false, |l| l.trim().is_empty()) {
            lines.pop();
        }
        let leading = lines.iter().take_while(|l| l.trim().is_empty()).count();
        lines.drain(..leading);

        Lines {
            lines,
            first_line: first_line + leading,
        }
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    /// The 1-based line number of index `i` in the original input.
    fn number(&self, i: usize) -> usize {
        self.first_line + i
    }

    fn is_blank(&self, i: usize) -> bool {
        self.lines[i].trim().is_empty()
    }

    fn get(&self, i: usize, expected: &'static str) -> Result<&'a str, FormatError> {
        self.lines
            .get(i)
            .copied()
            .ok_or(FormatError::UnexpectedEof {
                line: self.number(i),
                expected,
            })
    }

    /// Read line `i`, which must start with `prefix`, and return what follows the prefix.
    fn expect_prefix(&self, i: usize, prefix: &'static str) -> Result<&'a str, FormatError> {
        let line = self.get(i, prefix)?;
        line.strip_prefix(prefix)
            .ok_or_else(|| FormatError::UnexpectedLine {
                line: self.number(i),
                expected: prefix,
                found: line.to_owned(),
            })
    }

    /// Read the cost line at `i`: a line number followed by the four cost columns.
    fn cost_line(&self, i: usize) -> Result<Costs, FormatError> {
        let line = self.get(i, COST_LINE)?;
        let invalid = || FormatError::InvalidNumber {
            line: self.number(i),
            found: line.to_owned(),
        };

        let mut fields = line.split_whitespace();
        fields
            .next()
            .and_then(|n| n.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        let costs = costs_from_fields(&mut fields).ok_or_else(invalid)?;
        Ok(costs)
    }
}

/// Parse the totals of a `summary:` line (whose prefix has already been removed).
fn parse_costs(fields: &str, line: usize) -> Result<Costs, FormatError> {
    costs_from_fields(&mut fields.split_whitespace()).ok_or_else(|| FormatError::InvalidNumber {
        line,
        found: format!("{}{}", SUMMARY, fields),
    })
}

/// Parse `<count> <unused> <unused>` (whose `calls=` prefix has already been removed).
fn parse_calls(fields: &str, line: usize) -> Result<u64, FormatError> {
    fields
        .split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| FormatError::InvalidNumber {
            line,
            found: format!("{}{}", CALLS, fields),
        })
}

/// Read time, memory, cycles and peak memory, in that order.
fn costs_from_fields<'a, I>(fields: &mut I) -> Option<Costs>
where
    I: Iterator<Item = &'a str>,
{
    let time = fields.next()?.parse().ok()?;
    let memory = memory_field(fields.next()?)?;
    let cycles = fields.next()?.parse().ok()?;
    let peak_memory = memory_field(fields.next()?)?;
    Some(Costs::new(time, memory, cycles, peak_memory))
}

fn memory_field(field: &str) -> Option<u64> {
    let value: i64 = field.parse().ok()?;
    Some(value.max(0) as u64)
}
