//! HAL device tree.
//!
//! Nodes live in an arena owned by the tree. Child lists hold arena indices
//! top-down from the root; the parent index is a back-reference used only
//! for upward walks.

use crate::consistency::{HalStructure, ROOT_UDI};
use crate::pipeline::context::SubmissionContext;
use crate::values::{Properties, TypedValue};

#[derive(Debug)]
pub struct DeviceNode {
    pub id: i64,
    pub udi: String,
    pub properties: Properties,
    children: Vec<usize>,
    parent: Option<usize>,
}

/// Device tree of one submission.
#[derive(Debug)]
pub struct DeviceTree<'c> {
    nodes: Vec<DeviceNode>,
    root: usize,
    ctx: &'c SubmissionContext,
}

impl<'c> DeviceTree<'c> {
    /// Build the tree from a structure that passed the consistency checks.
    ///
    /// Nodes are created in pre-order, children in document order.
    pub fn build(structure: &HalStructure<'_>, ctx: &'c SubmissionContext) -> Self {
        let mut nodes: Vec<DeviceNode> = Vec::with_capacity(structure.by_udi.len());
        let mut pending = vec![(structure.root, None)];

        while let Some((record, parent)) = pending.pop() {
            let index = nodes.len();
            nodes.push(DeviceNode {
                id: record.id,
                udi: record.udi.clone(),
                properties: record.properties.clone(),
                children: Vec::new(),
                parent,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }
            if let Some(kids) = structure.children.get(record.udi.as_str()) {
                pending.extend(kids.iter().rev().map(|kid| (*kid, Some(index))));
            }
        }

        log::debug!("{} DEVICE_TREE_BUILT nodes={}", ctx.log_context(), nodes.len());

        Self { nodes, root: 0, ctx }
    }

    pub fn root(&self) -> HalDevice<'_> {
        self.device(self.root)
    }

    pub fn device(&self, index: usize) -> HalDevice<'_> {
        assert!(index < self.nodes.len(), "device index {} out of range", index);
        HalDevice { tree: self, index }
    }

    pub fn find(&self, udi: &str) -> Option<HalDevice<'_>> {
        self.nodes
            .iter()
            .position(|node| node.udi == udi)
            .map(|index| self.device(index))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn context(&self) -> &'c SubmissionContext {
        self.ctx
    }
}

/// Borrowed view of one node; classification lives in `classify`.
#[derive(Clone, Copy)]
pub struct HalDevice<'t> {
    pub(crate) tree: &'t DeviceTree<'t>,
    pub(crate) index: usize,
}

impl<'t> HalDevice<'t> {
    fn node(&self) -> &'t DeviceNode {
        &self.tree.nodes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> i64 {
        self.node().id
    }

    pub fn udi(&self) -> &'t str {
        &self.node().udi
    }

    pub fn is_root(&self) -> bool {
        self.udi() == ROOT_UDI
    }

    pub fn properties(&self) -> &'t Properties {
        &self.node().properties
    }

    pub fn property(&self, name: &str) -> Option<&'t TypedValue> {
        self.node().properties.get(name)
    }

    pub fn str_property(&self, name: &str) -> Option<&'t str> {
        self.property(name).and_then(TypedValue::as_str)
    }

    pub fn int_property(&self, name: &str) -> Option<i64> {
        self.property(name).and_then(TypedValue::as_int)
    }

    pub fn parent(&self) -> Option<HalDevice<'t>> {
        self.node().parent.map(|index| self.tree.device(index))
    }

    pub fn children(&self) -> impl Iterator<Item = HalDevice<'t>> + 't {
        let tree = self.tree;
        self.node().children.iter().map(move |index| tree.device(*index))
    }

    pub(crate) fn child_indices(&self) -> &'t [usize] {
        &self.node().children
    }

    pub(crate) fn ctx(&self) -> &'t SubmissionContext {
        self.tree.ctx
    }
}

impl std::fmt::Debug for HalDevice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HalDevice")
            .field("id", &self.id())
            .field("udi", &self.udi())
            .finish()
    }
}
