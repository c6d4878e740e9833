use std::io::{self, Write};

use crate::function::markup::parser::{Content, Element};
use crate::function::node::Node;
use crate::function::registry::NodeRegistry;
use crate::image::LoadReport;

/// A function node as read from a document, before its kind and shape are checked.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NodeInfo {
    pub(crate) name: String,
    pub(crate) iterations: Option<u32>,
    pub(crate) params: Vec<f64>,
    pub(crate) children: Vec<NodeInfo>,
}

/// The single top-level `<f>` under the document element.
pub(crate) fn root_function<'a>(root: &'a Element, report: &mut LoadReport) -> Option<&'a Element> {
    let mut found = None;
    for content in &root.content {
        match content {
            Content::Text { text, .. } => {
                report.error(format!("Unexpected character data : \"{}\"", text.trim()));
                return None;
            }
            Content::Element(e) if e.name == "f" => {
                if found.is_some() {
                    report.error("Multiple top level <f> elements encountered");
                    return None;
                }
                found = Some(e);
            }
            Content::Element(e) => {
                report.error(format!(
                    "Expected <f>, <type>, <i> or <p> but got \"{}\"",
                    e.name
                ));
                return None;
            }
        }
    }
    if found.is_none() {
        report.error("No root function node found");
    }
    found
}

impl NodeInfo {
    /// Read an `<f>` element and everything nested in it.
    pub(crate) fn from_element(f: &Element, report: &mut LoadReport) -> Option<Self> {
        let mut info = NodeInfo::default();
        for content in &f.content {
            let e = match content {
                Content::Text { text, .. } => {
                    report.error(format!("Unexpected character data : \"{}\"", text.trim()));
                    return None;
                }
                Content::Element(e) => e,
            };
            match e.name.as_str() {
                "type" => info.name = character_data(e, report)?,
                "i" => {
                    let s = character_data(e, report)?;
                    match s.parse::<u32>() {
                        Ok(n) => info.iterations = Some(n),
                        Err(_) => {
                            report.error(format!("Couldn't parse \"{s}\" as an integer"));
                            return None;
                        }
                    }
                }
                "p" => {
                    let s = character_data(e, report)?;
                    match s.parse::<f64>() {
                        Ok(v) => info.params.push(v),
                        Err(_) => {
                            report.error(format!("Couldn't parse \"{s}\" as a real"));
                            return None;
                        }
                    }
                }
                "f" => info.children.push(NodeInfo::from_element(e, report)?),
                other => {
                    report.error(format!(
                        "Expected <f>, <type>, <i> or <p> but got \"{other}\""
                    ));
                    return None;
                }
            }
        }
        Some(info)
    }
}

fn character_data(e: &Element, report: &mut LoadReport) -> Option<String> {
    let mut text = String::new();
    for content in &e.content {
        match content {
            Content::Text { text: t, .. } => text.push_str(t),
            Content::Element(child) => {
                report.error(format!(
                    "Expected character data but got start element \"{}\"",
                    child.name
                ));
                return None;
            }
        }
    }
    if text.trim().is_empty() {
        report.error(format!(
            "Expected character data but got end element \"{}\"",
            e.name
        ));
        return None;
    }
    Some(text.trim().to_owned())
}

impl Node {
    /// Build a checked node from document info, explaining any mismatch in `report`.
    pub(crate) fn create(
        registry: &NodeRegistry,
        info: &NodeInfo,
        report: &mut LoadReport,
    ) -> Option<Self> {
        let Some(reg) = registry.lookup(&info.name) else {
            report.error(format!("Unrecognised function name: {}", info.name));
            return None;
        };
        let name = &info.name;
        let c = reg.contract;

        if info.params.len() != c.params {
            report.error(format!(
                "For function {name}: expected {} parameters, but found {}",
                c.params,
                info.params.len()
            ));
            return None;
        }
        if info.children.len() != c.args {
            report.error(format!(
                "For function {name}: expected {} arguments, but found {}",
                c.args,
                info.children.len()
            ));
            return None;
        }
        match (c.iterative, info.iterations) {
            (true, None) => {
                report.error(format!(
                    "For function {name}: expected iteration count but none found"
                ));
                return None;
            }
            (true, Some(0)) => {
                report.error(format!(
                    "For function {name}: iteration count must be at least 1"
                ));
                return None;
            }
            (false, Some(_)) => {
                report.error(format!("For function {name}: unexpected iteration count"));
                return None;
            }
            _ => {}
        }

        let children = info
            .children
            .iter()
            .map(|child| Node::create(registry, child, report))
            .collect::<Option<Vec<_>>>()?;
        Some(Node {
            kind: reg.kind,
            params: info.params.clone(),
            children,
            iterations: info.iterations,
        })
    }

    /// Write this subtree as nested `<f>` elements, two spaces of indent per level.
    pub fn save_function<W: Write>(&self, out: &mut W, indent: usize) -> io::Result<()> {
        let margin = "  ".repeat(indent);
        writeln!(out, "{margin}<f>")?;
        writeln!(out, "{margin}  <type>{}</type>", self.kind.name())?;
        if let Some(n) = self.iterations {
            writeln!(out, "{margin}  <i>{n}</i>")?;
        }
        for p in &self.params {
            writeln!(out, "{margin}  <p>{p}</p>")?;
        }
        for child in &self.children {
            child.save_function(out, indent + 1)?;
        }
        writeln!(out, "{margin}</f>")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/function/serial.rs"]
mod tests;
