

use crate::tree::TreeDoc;

/// A one-node document, just enough to give rules a concrete tree type in
/// tests that never touch the tree.
pub(crate) struct UnitDoc;

impl TreeDoc for UnitDoc {
    type Id = u32;

    fn root(&self) -> u32 {
        0
    }

    fn parent(&self, _node: u32) -> Option<u32> {
        None
    }

    fn children(&self, _node: u32) -> Vec<u32> {
        Vec::new()
    }

    fn tag(&self, _node: u32) -> &str {
        "root"
    }

    fn text(&self, _node: u32) -> String {
        String::new()
    }

    fn select(&self, _scope: u32, _selector: &str) -> Vec<u32> {
        Vec::new()
    }
}
