//! VNode Model - declarative descriptions of host nodes.
//!
//! Pure data, no behavior: the renderer consumes these, the selector index
//! is rebuilt from what the renderer stamps onto the host tree. Three kinds:
//!
//! - `Element` - one host element (tag, attributes, selector, children)
//! - `Text` - a text node
//! - `Component` - a deferred subtree, resolved by the renderer before the
//!   selector index runs; the rest of the driver never sees one
//!
//! Trees are normally built through the hyperscript helpers in
//! [`hyperscript`] rather than by hand.

mod hyperscript;

pub use hyperscript::*;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::types::Selector;

// =============================================================================
// Props
// =============================================================================

/// An attribute mapping passed alongside a selector in hyperscript calls.
///
/// Plain string attributes, with two reserved keys: `id` sets the element id
/// and `class`/`className` contributes class tokens (whitespace separated).
/// The selector slot is typed separately so opaque tokens fit through the
/// same surface as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Props {
    entries: BTreeMap<String, String>,
    selector: Option<Selector>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute (builder style).
    ///
    /// The reserved key `sel` is routed to the selector slot as a string
    /// token, mirroring `{sel: "inc"}` in attribute position.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        if key == "sel" {
            self.selector = Some(Selector::from(value));
        } else {
            self.entries.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Set the selector slot (builder style). Accepts strings and tokens.
    pub fn sel(mut self, selector: impl Into<Selector>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.selector.is_none()
    }

    /// Merge into an element: `id` wins over a shortcut id, class tokens
    /// append after shortcut classes, everything else lands in attributes.
    pub(crate) fn apply_to(&self, el: &mut ElementNode) {
        for (key, value) in &self.entries {
            match key.as_str() {
                "id" => el.id = Some(value.clone()),
                "class" | "className" => {
                    el.classes.extend(value.split_whitespace().map(String::from));
                }
                _ => {
                    el.attributes.insert(key.clone(), value.clone());
                }
            }
        }
        if let Some(selector) = &self.selector {
            el.selector = Some(selector.clone());
        }
    }
}

// =============================================================================
// VNode
// =============================================================================

/// One node of a virtual tree.
#[derive(Debug, Clone)]
pub enum VNode {
    Element(ElementNode),
    Text(String),
    Component(ComponentNode),
}

impl VNode {
    /// A text node.
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(content.into())
    }

    /// The element data, if this is an element node.
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            VNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// The text content, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            VNode::Text(content) => Some(content),
            _ => None,
        }
    }
}

impl From<&str> for VNode {
    fn from(content: &str) -> Self {
        VNode::text(content)
    }
}

impl From<String> for VNode {
    fn from(content: String) -> Self {
        VNode::text(content)
    }
}

/// One virtual element: tag, attributes, optional selector token, children.
///
/// The selector, once set, is fixed for this node's identity within a render
/// pass; the index compares it by value for strings and identity for tokens.
#[derive(Debug, Clone, Default)]
pub struct ElementNode {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub selector: Option<Selector>,
    pub children: Vec<VNode>,
}

impl ElementNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Components
// =============================================================================

/// A component produces a subtree when asked.
///
/// Blanket-implemented for closures, so both functional components and
/// state-carrying structs go through the same trait. The renderer resolves
/// component nodes recursively before any diffing or indexing happens.
pub trait Component {
    fn render(&self) -> VNode;
}

impl<F: Fn() -> VNode> Component for F {
    fn render(&self) -> VNode {
        self()
    }
}

/// A component reference inside a virtual tree.
#[derive(Clone)]
pub struct ComponentNode {
    component: Rc<dyn Component>,
}

impl ComponentNode {
    pub fn render(&self) -> VNode {
        self.component.render()
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComponentNode(..)")
    }
}

/// Wrap a component into a virtual node.
pub fn component(c: impl Component + 'static) -> VNode {
    VNode::Component(ComponentNode {
        component: Rc::new(c),
    })
}

// =============================================================================
// Tests
// =============================================================================
