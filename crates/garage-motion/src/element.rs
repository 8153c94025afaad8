//! Host element model.
//!
//! `Element` is the minimal view of a host UI node the motion layer needs:
//! identity, classes, children, a layout box for viewport checks and an
//! inline style override map for the animated properties. Elements are shared
//! through `ElementRef` (`Rc<Element>`); scopes only keep `Weak` references.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::types::{Property, PropertySet};

/// Shared handle to a host element.
pub type ElementRef = Rc<Element>;

/// Identifier of an element, unique per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Inline style overrides applied by animations.
///
/// An empty map means the element shows its natural styling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    overrides: BTreeMap<Property, f64>,
}

impl InlineStyle {
    pub fn get(&self, property: Property) -> Option<f64> {
        self.overrides.get(&property).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }
}

#[derive(Debug)]
pub struct Element {
    id: ElementId,
    tag: String,
    classes: RefCell<Vec<String>>,
    children: RefCell<Vec<ElementRef>>,
    parent: RefCell<Weak<Element>>,
    /// Document offset of the element's top edge in pixels.
    top: Cell<f64>,
    height: Cell<f64>,
    style: RefCell<InlineStyle>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> ElementRef {
        Rc::new(Self {
            id: ElementId::next(),
            tag: tag.into(),
            classes: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            top: Cell::new(0.0),
            height: Cell::new(0.0),
            style: RefCell::new(InlineStyle::default()),
        })
    }

    /// Create an element carrying one class.
    pub fn with_class(tag: impl Into<String>, class: impl Into<String>) -> ElementRef {
        let element = Self::new(tag);
        element.add_class(class);
        element
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn add_class(&self, class: impl Into<String>) {
        let class = class.into();
        let mut classes = self.classes.borrow_mut();
        if !classes.contains(&class) {
            classes.push(class);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|c| c == class)
    }

    // ========================================================================
    // Tree
    // ========================================================================

    /// Append `child`, detaching it from any previous parent.
    pub fn append_child(self: &Rc<Self>, child: ElementRef) {
        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(&child);
        }
        *child.parent.borrow_mut() = Rc::downgrade(self);
        self.children.borrow_mut().push(child);
    }

    /// Remove `child`; returns false if it was not a child of this element.
    pub fn remove_child(&self, child: &ElementRef) -> bool {
        let mut children = self.children.borrow_mut();
        let before = children.len();
        children.retain(|c| !Rc::ptr_eq(c, child));
        let removed = children.len() != before;
        if removed {
            *child.parent.borrow_mut() = Weak::new();
        }
        removed
    }

    /// Remove and return the last child.
    pub fn pop_child(&self) -> Option<ElementRef> {
        let child = self.children.borrow_mut().pop()?;
        *child.parent.borrow_mut() = Weak::new();
        Some(child)
    }

    /// Snapshot of the current children in document order.
    pub fn children(&self) -> Vec<ElementRef> {
        self.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn parent(&self) -> Option<ElementRef> {
        self.parent.borrow().upgrade()
    }

    /// All descendants in depth-first document order.
    pub fn descendants(&self) -> Vec<ElementRef> {
        let mut out = Vec::new();
        for child in self.children.borrow().iter() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    // ========================================================================
    // Layout
    // ========================================================================

    pub fn set_layout(&self, top: f64, height: f64) {
        self.top.set(top);
        self.height.set(height);
    }

    pub fn top(&self) -> f64 {
        self.top.get()
    }

    pub fn height(&self) -> f64 {
        self.height.get()
    }

    // ========================================================================
    // Inline style
    // ========================================================================

    /// Current effective value: the override if present, else the natural value.
    pub fn style_value(&self, property: Property) -> f64 {
        self.style
            .borrow()
            .get(property)
            .unwrap_or_else(|| property.natural_value())
    }

    pub fn set_style(&self, property: Property, value: f64) {
        self.style.borrow_mut().overrides.insert(property, value);
    }

    pub fn apply_styles(&self, values: &PropertySet) {
        let mut style = self.style.borrow_mut();
        for (property, value) in values.iter() {
            if property != Property::Scalar {
                style.overrides.insert(property, value);
            }
        }
    }

    /// Snapshot of the current overrides.
    pub fn inline_style(&self) -> InlineStyle {
        self.style.borrow().clone()
    }

    /// Replace the overrides wholesale (used to restore a snapshot).
    pub fn restore_style(&self, snapshot: InlineStyle) {
        *self.style.borrow_mut() = snapshot;
    }

    pub fn clear_styles(&self) {
        self.style.borrow_mut().overrides.clear();
    }

    pub fn has_style_overrides(&self) -> bool {
        !self.style.borrow().is_empty()
    }
}

/// Rule selecting animation targets inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "class", rename_all = "snake_case")]
pub enum Selector {
    /// Immediate children of the container.
    #[default]
    Children,
    /// Immediate children carrying the class.
    ChildrenWithClass(String),
    /// Any descendant carrying the class, in document order.
    DescendantsWithClass(String),
}

impl Selector {
    /// Resolve against the container's current children.
    pub fn select(&self, container: &Element) -> Vec<ElementRef> {
        match self {
            Self::Children => container.children(),
            Self::ChildrenWithClass(class) => container
                .children()
                .into_iter()
                .filter(|c| c.has_class(class))
                .collect(),
            Self::DescendantsWithClass(class) => container
                .descendants()
                .into_iter()
                .filter(|c| c.has_class(class))
                .collect(),
        }
    }
}

/// A possibly-absent reference to a container element.
///
/// Owned by the host component and shared with bindings; empty before the
/// first render and after the element is torn down.
#[derive(Debug, Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<ElementRef>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(element: ElementRef) -> Self {
        let node = Self::new();
        node.set(element);
        node
    }

    pub fn set(&self, element: ElementRef) {
        *self.0.borrow_mut() = Some(element);
    }

    pub fn clear(&self) {
        self.0.borrow_mut().take();
    }

    pub fn get(&self) -> Option<ElementRef> {
        self.0.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}
