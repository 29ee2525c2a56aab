use std::io::Write;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::node_id;
use crate::costs::Costs;
use crate::tree::{CallTree, NodeId};

type Map<K, V> = IndexMap<K, V, ahash::RandomState>;

/// Call sites grouped by file, then by class (`None` for plain functions), then by function or
/// method name, each in order of first appearance.
type Grouped<'a> = Map<&'a str, Map<Option<&'a str>, Map<&'a str, Vec<NodeId>>>>;

/// Write `tree` as an XML cost report.
///
/// ```xml
/// <costList time="159" mem="1088" cycles="0" peakmem="10">
///   <file name="/var/www/SomeClass.php">
///     <class name="SomeClass">
///       <method name="__construct">
///         <call id="n…" count="1">
///           <ownCosts time="45" mem="472" cycles="0" peakmem="0"/>
///           <inclusiveCosts time="52" mem="472" cycles="0" peakmem="10"/>
///           <calledFunctions>
///             <function file="php:internal" name="php::spl_autoload_register" id="n…" count="1"/>
///           </calledFunctions>
///         </call>
///       </method>
///     </class>
///   </file>
///   …
/// </costList>
/// ```
///
/// Functions named `Class->method` are listed as methods of their class; everything else
/// (including static calls) as a plain function.
pub fn write<W>(tree: &CallTree, writer: W) -> quick_xml::Result<()>
where
    W: Write,
{
    let mut files = Grouped::default();
    for id in tree.preorder().skip(1) {
        let node = tree.node(id);
        let (class, name) = match node.function().split_once("->") {
            Some((class, method)) => (Some(class), method),
            None => (None, node.function()),
        };
        files
            .entry(node.filename())
            .or_default()
            .entry(class)
            .or_default()
            .entry(name)
            .or_default()
            .push(id);
    }

    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let summary = cost_attributes(&tree.summary());
    xml.write_event(Event::Start(
        BytesStart::new("costList").with_attributes(summary.iter().map(as_attribute)),
    ))?;

    for (file, owners) in &files {
        xml.write_event(Event::Start(
            BytesStart::new("file").with_attributes([("name", *file)]),
        ))?;
        for (class, callables) in owners {
            let element = match class {
                Some(class) => {
                    xml.write_event(Event::Start(
                        BytesStart::new("class").with_attributes([("name", *class)]),
                    ))?;
                    "method"
                }
                None => "function",
            };

            for (name, calls) in callables {
                xml.write_event(Event::Start(
                    BytesStart::new(element).with_attributes([("name", *name)]),
                ))?;
                for &id in calls {
                    write_call(&mut xml, tree, id)?;
                }
                xml.write_event(Event::End(BytesEnd::new(element)))?;
            }

            if class.is_some() {
                xml.write_event(Event::End(BytesEnd::new("class")))?;
            }
        }
        xml.write_event(Event::End(BytesEnd::new("file")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("costList")))?;
    xml.write_event(Event::Eof)?;
    xml.into_inner().flush()?;
    Ok(())
}

fn write_call<W>(xml: &mut Writer<W>, tree: &CallTree, id: NodeId) -> quick_xml::Result<()>
where
    W: Write,
{
    let node = tree.node(id);
    let mut count = itoa::Buffer::new();
    let call_id = node_id(node);

    xml.write_event(Event::Start(BytesStart::new("call").with_attributes([
        ("id", call_id.as_str()),
        ("count", count.format(node.call_count())),
    ])))?;
    let own = cost_attributes(&node.costs());
    xml.write_event(Event::Empty(
        BytesStart::new("ownCosts").with_attributes(own.iter().map(as_attribute)),
    ))?;
    let inclusive = cost_attributes(&tree.inclusive_costs(id));
    xml.write_event(Event::Empty(
        BytesStart::new("inclusiveCosts").with_attributes(inclusive.iter().map(as_attribute)),
    ))?;

    if !node.children().is_empty() {
        xml.write_event(Event::Start(BytesStart::new("calledFunctions")))?;
        for &child in node.children() {
            let child = tree.node(child);
            let child_id = node_id(child);
            xml.write_event(Event::Empty(BytesStart::new("function").with_attributes([
                ("file", child.filename()),
                ("name", child.function()),
                ("id", child_id.as_str()),
                ("count", count.format(child.call_count())),
            ])))?;
        }
        xml.write_event(Event::End(BytesEnd::new("calledFunctions")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("call")))?;
    Ok(())
}

fn cost_attributes(costs: &Costs) -> [(&'static str, String); 4] {
    let mut buffer = itoa::Buffer::new();
    let mut format = |n: u64| buffer.format(n).to_owned();
    [
        ("time", format(costs.time)),
        ("mem", format(costs.memory)),
        ("cycles", format(costs.cycles)),
        ("peakmem", format(costs.peak_memory)),
    ]
}

fn as_attribute<'a>(&(key, ref value): &'a (&'static str, String)) -> (&'a str, &'a str) {
    (key, value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tree: &CallTree) -> String {
        let mut out = Vec::new();
        write(tree, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn report() {
        let mut tree = CallTree::new(Costs::new(159, 1088, 0, 10));
        let construct = tree.add_node(
            "SomeClass.php",
            "SomeClass->__construct",
            Costs::new(45, 472, 0, 0),
        );
        let register = tree.add_node(
            "php:internal",
            "php::spl_autoload_register",
            Costs::new(7, 336, 0, 10),
        );
        let helper = tree.add_node("SomeClass.php", "helper", Costs::new(1, 0, 0, 0));
        tree.add_child(tree.root(), construct);
        tree.add_child(construct, register);
        tree.add_child(tree.root(), helper);

        let xml = render(&tree);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(
            xml.contains("<costList time=\"159\" mem=\"1088\" cycles=\"0\" peakmem=\"10\">")
        );
        assert!(xml.trim_end().ends_with("</costList>"));

        // both calls from SomeClass.php share one <file>
        assert_eq!(xml.matches("<file name=\"SomeClass.php\">").count(), 1);
        assert!(xml.contains("<class name=\"SomeClass\">"));
        assert!(xml.contains("<method name=\"__construct\">"));
        assert!(xml.contains("<function name=\"helper\">"));
        assert!(xml.contains("<function name=\"php::spl_autoload_register\">"));

        assert!(xml.contains(&format!(
            "<call id=\"{}\" count=\"1\">",
            node_id(tree.node(construct))
        )));
        assert!(xml.contains("<ownCosts time=\"45\" mem=\"472\" cycles=\"0\" peakmem=\"0\"/>"));
        assert!(xml
            .contains("<inclusiveCosts time=\"52\" mem=\"472\" cycles=\"0\" peakmem=\"10\"/>"));
        assert!(xml.contains(&format!(
            "<function file=\"php:internal\" name=\"php::spl_autoload_register\" id=\"{}\" count=\"1\"/>",
            node_id(tree.node(register))
        )));
        // only the constructor called anything
        assert_eq!(xml.matches("<calledFunctions>").count(), 1);
    }

    #[test]
    fn names_are_escaped() {
        let mut tree = CallTree::new(Costs::ZERO);
        let a = tree.add_node("<eval>.php", "Foo->bar", Costs::ZERO);
        tree.add_child(tree.root(), a);
        let xml = render(&tree);
        assert!(xml.contains("<file name=\"&lt;eval&gt;.php\">"));
    }

    #[test]
    fn empty_tree() {
        let xml = render(&CallTree::new(Costs::new(1, 1, 1, 1)));
        assert!(xml.contains("<costList time=\"1\" mem=\"1\" cycles=\"1\" peakmem=\"1\">"));
        assert!(!xml.contains("<file"));
    }
}
