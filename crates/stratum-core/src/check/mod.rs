/*!
# Static Checks

Analyses that read the tree before it is lowered and only report
diagnostics; they never rewrite anything.
*/

pub mod const_checker;

pub use const_checker::{CheckerState, ConstChecker};
