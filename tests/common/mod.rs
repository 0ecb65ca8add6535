//! A tiny in-memory DOM implementing `TreeDoc` for the test suites.
//!
//! Supports just enough selector syntax for the tests: a tag name, `#id`,
//! `.class`, `[attr]`, and `[attr=value]`, plus combinations like
//! `a[class=good]`.

#![allow(dead_code)]

use canopy::TreeDoc;

pub type NodeId = usize;

struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
}

pub struct TestDom {
    nodes: Vec<NodeData>,
}

impl TestDom {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                tag: "#document".to_string(),
                attrs: Vec::new(),
                text: String::new(),
            }],
        }
    }

    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeData {
            parent: Some(parent),
            children: Vec::new(),
            tag: tag.to_string(),
            attrs: Vec::new(),
            text: String::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node]
            .attrs
            .push((name.to_string(), value.to_string()));
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node].text = text.to_string();
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node]
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        (0..self.nodes.len()).find(|&node| self.attr(node, "id") == Some(id))
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.nodes[node].children.iter().rev().copied());
        }
        result
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        if let Some(tag) = &selector.tag {
            if self.nodes[node].tag != *tag {
                return false;
            }
        }
        if let Some(id) = &selector.id {
            if self.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(class) = &selector.class {
            let found = self
                .attr(node, "class")
                .is_some_and(|value| value.split_whitespace().any(|token| token == class));
            if !found {
                return false;
            }
        }
        if let Some((name, expected)) = &selector.attr {
            match self.attr(node, name) {
                Some(actual) => {
                    if let Some(expected) = expected {
                        if actual != expected {
                            return false;
                        }
                    }
                }
                None => return false,
            }
        }
        true
    }
}

impl TreeDoc for TestDom {
    type Id = NodeId;

    fn root(&self) -> NodeId {
        0
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node].children.clone()
    }

    fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node].tag
    }

    fn text(&self, node: NodeId) -> String {
        let mut text = self.nodes[node].text.clone();
        for &child in &self.nodes[node].children {
            text.push_str(&self.text(child));
        }
        text
    }

    fn select(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let selector = parse_selector(selector);
        self.descendants(scope)
            .into_iter()
            .filter(|&node| self.matches(node, &selector))
            .collect()
    }
}

#[derive(Default)]
struct Selector {
    tag: Option<String>,
    id: Option<String>,
    class: Option<String>,
    attr: Option<(String, Option<String>)>,
}

fn parse_selector(input: &str) -> Selector {
    let mut selector = Selector::default();
    let mut rest = input.trim();

    match rest.find(['#', '.', '[']) {
        Some(pos) => {
            if pos > 0 {
                selector.tag = Some(rest[..pos].to_string());
            }
            rest = &rest[pos..];
        }
        None => {
            if !rest.is_empty() {
                selector.tag = Some(rest.to_string());
            }
            rest = "";
        }
    }

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('#') {
            let end = stripped.find(['#', '.', '[']).unwrap_or(stripped.len());
            selector.id = Some(stripped[..end].to_string());
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('.') {
            let end = stripped.find(['#', '.', '[']).unwrap_or(stripped.len());
            selector.class = Some(stripped[..end].to_string());
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped.find(']').unwrap_or(stripped.len());
            let body = &stripped[..end];
            let (name, value) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };
            selector.attr = Some((name.to_string(), value));
            rest = stripped.get(end + 1..).unwrap_or("");
        } else {
            break;
        }
    }

    selector
}

/// `<div>Hooooooo</div>`, the one-liner document several suites start from.
pub fn single_div_doc() -> TestDom {
    let mut dom = TestDom::new();
    let div = dom.append(dom.root(), "div");
    dom.set_text(div, "Hooooooo");
    dom
}
