//! Space allocation inside atlas pages.

mod box_tree;

pub(crate) use box_tree::{BoxTree, NodeId};
