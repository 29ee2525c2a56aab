use std::collections::VecDeque;
use std::io::{self, Write};

use num_format::{Buffer, Locale};
use quick_xml::escape::escape;

use super::node_id;
use crate::costs::{CostKind, CostRatings};
use crate::tree::{CallTree, NodeId};

/// Names and paths longer than this are shortened in node labels.
const MAX_LABEL_LEN: usize = 35;

/// How much of a long file path to keep (from the end).
const FILE_TAIL: usize = 32;

/// How much of a long function name to keep from the start.
const FUNCTION_HEAD: usize = 20;
/// And from the end.
const FUNCTION_TAIL: usize = 12;

/// Edges are drawn between 1 and this many points wide, by share of the total time.
const MAX_PENWIDTH: f64 = 10.0;

/// Write `tree` as a Graphviz `digraph`.
///
/// Every node gets a table with its file, its function, and one row per cost field: the
/// inclusive cost, the field name, and the own cost, the latter coloured by its rating. Every
/// edge is labelled with the number of calls and, if any time was spent, the inclusive time in
/// milliseconds (assuming the profile measured microseconds). Edges are wider the larger the
/// share of the total time they lead to.
///
/// Nodes are written breadth-first from the root.
pub fn write<W>(tree: &CallTree, mut writer: W) -> io::Result<()>
where
    W: Write,
{
    let root = tree.root();
    let total_time = tree.inclusive_costs(root).time.max(1);

    writeln!(writer, "digraph {{")?;
    writeln!(writer, "node [shape=box,style=rounded];")?;
    writeln!(writer, "edge [color=orange];")?;

    let mut ms = Buffer::default();
    let mut queue = VecDeque::from(vec![root]);
    while let Some(id) = queue.pop_front() {
        let node = tree.node(id);
        let source = node_id(node);
        if id == root {
            writeln!(writer, "\"{}\" [label=\"{}\"];", source, node.function())?;
        } else {
            write_node(tree, id, &source, &mut writer)?;
        }

        for &child in node.children() {
            let target = tree.node(child);
            let time = tree.inclusive_costs(child).time;

            write!(
                writer,
                "\"{}\" -> \"{}\" [label=\"{}x",
                source,
                node_id(target),
                target.call_count()
            )?;
            if time > 0 {
                ms.write_formatted(&((time as f64 / 1000.0).round() as u64), &Locale::en);
                write!(writer, " [{} ms]", ms.as_str())?;
            }
            let share = time as f64 / total_time as f64;
            let penwidth = (share * MAX_PENWIDTH).ceil().max(1.0);
            writeln!(writer, "\",penwidth={}];", penwidth)?;

            queue.push_back(child);
        }
    }

    writeln!(writer, "}}")?;
    Ok(())
}

fn write_node<W>(tree: &CallTree, id: NodeId, name: &str, writer: &mut W) -> io::Result<()>
where
    W: Write,
{
    let node = tree.node(id);
    let own = node.costs();
    let inclusive = tree.inclusive_costs(id);
    let ratings = node
        .cost_ratings()
        .copied()
        .unwrap_or_else(|| CostRatings::rate(&own, &tree.summary()));

    write!(
        writer,
        "\"{}\" [label=<<table border=\"0\" cellborder=\"1\" cellspacing=\"0\">",
        name
    )?;
    write!(
        writer,
        "<tr><td colspan=\"3\">{}</td></tr>",
        escape(&shorten_file(node.filename()))
    )?;
    write!(
        writer,
        "<tr><td colspan=\"3\"><b>{}</b></td></tr>",
        escape(&shorten_function(node.function()))
    )?;

    let mut number = Buffer::default();
    for kind in CostKind::ALL {
        number.write_formatted(&inclusive.get(kind), &Locale::en);
        write!(writer, "<tr><td>{}</td>", number.as_str())?;
        write!(writer, "<td>{}</td>", kind.name())?;
        number.write_formatted(&own.get(kind), &Locale::en);
        write!(
            writer,
            "<td bgcolor=\"{}\">{}</td></tr>",
            color(ratings.get(kind)),
            number.as_str()
        )?;
    }

    writeln!(writer, "</table>>];")
}

fn color(rating: f64) -> &'static str {
    if rating < 0.8 {
        "lightgreen"
    } else if rating < 0.9 {
        "yellow"
    } else {
        "red"
    }
}

fn shorten_file(file: &str) -> String {
    let len = file.chars().count();
    if len <= MAX_LABEL_LEN {
        return file.to_owned();
    }
    let tail: String = file.chars().skip(len - FILE_TAIL).collect();
    format!("...{}", tail)
}

fn shorten_function(function: &str) -> String {
    let len = function.chars().count();
    if len <= MAX_LABEL_LEN {
        return function.to_owned();
    }
    let head: String = function.chars().take(FUNCTION_HEAD).collect();
    let tail: String = function.chars().skip(len - FUNCTION_TAIL).collect();
    format!("{}...{}", head, tail)
}
