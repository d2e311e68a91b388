//! Reference resolution: stash ids for unattached nodes, paths for attached ones.

pub mod stash;
pub mod xpath;

pub use stash::NodeStash;
pub use xpath::{compute_xpath, evaluate_xpath, XPathExpr};
