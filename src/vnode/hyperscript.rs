//! Hyperscript builders - the call shapes applications build trees with.
//!
//! Rust has no argument overloading, so the original family of call shapes
//! `()`, `(text)`, `(children)`, `(selector)`, `(selector, props)`,
//! `(selector, children)`, `(selector, text)`, `(selector, props, children)`,
//! `(props, children)`, `(props, text)` is expressed as [`HyperArgs`] impls
//! over the corresponding types and tuples. The props-vs-children ambiguity of a dynamically typed surface
//! does not exist here: [`Props`] and `Vec<VNode>` are distinct types.
//!
//! A bare string argument follows the shortcut grammar:
//!
//! - in single-argument position, a string starting with `#` or `.` is a
//!   shortcut (`"#foo.bar"` sets id `foo` and class `bar`); any other string
//!   is a text child;
//! - in selector position (tuples), the leading plain token is the string
//!   selector, then `#id` / `.class` shortcuts apply in order
//!   (`"inc.red"` tags the node `inc` and adds class `red`).
//!
//! Empty segments are silently ignored; characters other than the `#` and
//! `.` delimiters pass through untouched.
//!
//! # Example
//!
//! ```ignore
//! use eddy_dom::vnode::{div, h1, button, Props};
//!
//! let tree = div(vec![
//!     h1("0"),
//!     button(("inc", Props::new().set("data-foo", "bar"), vec![])),
//! ]);
//! ```

use super::{ElementNode, Props, VNode};
use crate::types::{OpaqueToken, Selector};

// =============================================================================
// Shortcut parsing
// =============================================================================

enum Segment {
    Leading,
    Id,
    Class,
}

/// Parse a selector-position string: leading plain token, then `#`/`.`
/// shortcuts, in the order encountered.
pub(crate) fn apply_selector_shortcut(input: &str, el: &mut ElementNode) {
    let mut mode = Segment::Leading;
    let mut current = String::new();

    let mut flush = |mode: &Segment, current: &mut String, el: &mut ElementNode| {
        if current.is_empty() {
            return;
        }
        match mode {
            Segment::Leading => el.selector = Some(Selector::Str(std::mem::take(current))),
            Segment::Id => el.id = Some(std::mem::take(current)),
            Segment::Class => el.classes.push(std::mem::take(current)),
        }
        current.clear();
    };

    for ch in input.chars() {
        match ch {
            '#' => {
                flush(&mode, &mut current, el);
                mode = Segment::Id;
            }
            '.' => {
                flush(&mode, &mut current, el);
                mode = Segment::Class;
            }
            other => current.push(other),
        }
    }
    flush(&mode, &mut current, el);
}

// =============================================================================
// Argument traits
// =============================================================================

/// A value usable in selector position of a hyperscript call.
pub trait SelectorArg {
    fn apply_selector(self, el: &mut ElementNode);
}

impl SelectorArg for &str {
    fn apply_selector(self, el: &mut ElementNode) {
        apply_selector_shortcut(self, el);
    }
}

impl SelectorArg for String {
    fn apply_selector(self, el: &mut ElementNode) {
        apply_selector_shortcut(&self, el);
    }
}

impl SelectorArg for OpaqueToken {
    fn apply_selector(self, el: &mut ElementNode) {
        el.selector = Some(Selector::Token(self));
    }
}

impl SelectorArg for Selector {
    fn apply_selector(self, el: &mut ElementNode) {
        el.selector = Some(self);
    }
}

/// The argument family accepted by [`h`] and the tag helpers.
pub trait HyperArgs {
    fn apply(self, el: &mut ElementNode);
}

impl HyperArgs for () {
    fn apply(self, _el: &mut ElementNode) {}
}

impl HyperArgs for &str {
    fn apply(self, el: &mut ElementNode) {
        if self.starts_with('#') || self.starts_with('.') {
            apply_selector_shortcut(self, el);
        } else {
            el.children.push(VNode::text(self));
        }
    }
}

impl HyperArgs for String {
    fn apply(self, el: &mut ElementNode) {
        self.as_str().apply(el);
    }
}

impl HyperArgs for Vec<VNode> {
    fn apply(self, el: &mut ElementNode) {
        el.children.extend(self);
    }
}

impl HyperArgs for VNode {
    fn apply(self, el: &mut ElementNode) {
        el.children.push(self);
    }
}

impl HyperArgs for Props {
    fn apply(self, el: &mut ElementNode) {
        self.apply_to(el);
    }
}

impl HyperArgs for OpaqueToken {
    fn apply(self, el: &mut ElementNode) {
        self.apply_selector(el);
    }
}

impl HyperArgs for Selector {
    fn apply(self, el: &mut ElementNode) {
        self.apply_selector(el);
    }
}

// Selector-first tuples are expanded per selector type rather than written
// as one blanket impl over `SelectorArg`: the props-first tuples below must
// coexist, and coherence cannot prove `(Props, ..)` disjoint from a blanket
// `(S: SelectorArg, ..)`.
macro_rules! selector_first_args {
    ($($sel:ty)*) => {$(
        impl HyperArgs for ($sel, Props) {
            fn apply(self, el: &mut ElementNode) {
                self.0.apply_selector(el);
                self.1.apply_to(el);
            }
        }

        impl HyperArgs for ($sel, Vec<VNode>) {
            fn apply(self, el: &mut ElementNode) {
                self.0.apply_selector(el);
                el.children.extend(self.1);
            }
        }

        impl HyperArgs for ($sel, &str) {
            fn apply(self, el: &mut ElementNode) {
                self.0.apply_selector(el);
                el.children.push(VNode::text(self.1));
            }
        }

        impl HyperArgs for ($sel, String) {
            fn apply(self, el: &mut ElementNode) {
                self.0.apply_selector(el);
                el.children.push(VNode::text(self.1));
            }
        }

        impl HyperArgs for ($sel, Props, Vec<VNode>) {
            fn apply(self, el: &mut ElementNode) {
                self.0.apply_selector(el);
                self.1.apply_to(el);
                el.children.extend(self.2);
            }
        }
    )*};
}

selector_first_args! { &str String OpaqueToken Selector }

// Props-first shapes: the selector, if any, rides inside the props
// (`Props::new().sel(..)` or the reserved `sel` attribute key).
impl HyperArgs for (Props, Vec<VNode>) {
    fn apply(self, el: &mut ElementNode) {
        self.0.apply_to(el);
        el.children.extend(self.1);
    }
}

impl HyperArgs for (Props, &str) {
    fn apply(self, el: &mut ElementNode) {
        self.0.apply_to(el);
        el.children.push(VNode::text(self.1));
    }
}

impl HyperArgs for (Props, String) {
    fn apply(self, el: &mut ElementNode) {
        self.0.apply_to(el);
        el.children.push(VNode::text(self.1));
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Build an element node for an arbitrary tag.
///
/// Validation is deferred: an empty tag constructs fine and is rejected by
/// the renderer as a stream error.
pub fn h(tag: &str, args: impl HyperArgs) -> VNode {
    let mut el = ElementNode::new(tag);
    args.apply(&mut el);
    VNode::Element(el)
}

macro_rules! tag_helpers {
    ($($name:ident)*) => {$(
        #[doc = concat!("Hyperscript helper for `<", stringify!($name), ">`. Pass `()` for no arguments.")]
        pub fn $name(args: impl HyperArgs) -> VNode {
            h(stringify!($name), args)
        }
    )*};
}

tag_helpers! {
    a article aside button div footer form h1 h2 h3 h4 h5 h6 header img input
    label li main nav ol p pre section select span table tbody td textarea th
    thead tr ul
}

// =============================================================================
// Tests
// =============================================================================
