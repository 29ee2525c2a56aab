use std::fs;
use std::io;
use std::path::Path;

use crate::costs::Costs;
use crate::filter::Filter;
use crate::parse::parts::{self, Selection};
use crate::tree::{self, rating, CallTree};
use crate::Error;

/// Options for turning a profile into a call tree.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// How to parse each part.
    pub parse: crate::parse::Options,

    /// Which parts of a multi-run profile to use.
    ///
    /// Default is every part.
    pub selection: Selection,

    /// Filters to run on each part's tree, in order, before it is merged into the result.
    pub filters: Vec<Filter>,
}

/// Read a profile from disk.
///
/// A file that holds nothing but whitespace is an error too: there is nothing to convert.
pub fn read(path: &Path) -> Result<String, Error> {
    let input = fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_owned(),
        source,
    })?;
    if input.trim().is_empty() {
        return Err(Error::File {
            path: path.to_owned(),
            source: io::Error::new(io::ErrorKind::InvalidData, "the profile is empty"),
        });
    }
    Ok(input)
}

/// Parse a (possibly multi-run) profile and fold the selected runs into a single call tree.
///
/// The runs are handled one after another: each is parsed, turned into a tree, cleaned up with
/// [`CallTree::combine_similar_subtrees`], filtered, and merged into the result, before the next
/// one is looked at. The returned tree carries [cost ratings](tree::rating) and is ready to be
/// rendered.
pub fn aggregate(input: &str, opt: &Options) -> Result<CallTree, Error> {
    let all = parts::split(input);
    if all.is_empty() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "the profile is empty",
        )));
    }

    let selected: Vec<_> = all
        .iter()
        .filter(|part| opt.selection.matches(part, &opt.parse))
        .collect();
    if selected.is_empty() {
        return Err(Error::Config(format!(
            "none of the {} part(s) of the profile is selected",
            all.len()
        )));
    }
    debug!("selected {} of {} part(s)", selected.len(), all.len());

    let mut aggregate = CallTree::new(Costs::ZERO);
    for part in selected {
        let profile = part.records(&opt.parse)?;
        let records = profile.records.len();

        let mut tree = tree::build(profile)?;
        tree.combine_similar_subtrees();
        for &filter in &opt.filters {
            tree.add_filter(filter);
        }
        if !tree.filters().is_empty() {
            let names: Vec<String> = tree.filters().iter().map(ToString::to_string).collect();
            debug!("part {}: running {}", part.index, names.join(", "));
        }
        tree.filter_tree();
        let nodes = tree.len();

        aggregate.combine_trees(tree);
        aggregate.compact();
        info!(
            "part {}: {} record(s), {} node(s) after filtering, {} node(s) in total",
            part.index,
            records,
            nodes,
            aggregate.len()
        );
    }

    rating::rate_costs(&mut aggregate);
    Ok(aggregate)
}
