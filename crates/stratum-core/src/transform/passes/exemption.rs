//! Positions where a string literal keeps its base-language type.

use crate::transform::ValueSlot;
use crate::types::TypeTracker;

/// A literal stays a plain string when the position it fills is typed with
/// something other than `str`, or when it initializes a constant.
pub fn is_exempt(slot: &ValueSlot, tracker: &TypeTracker) -> bool {
    match slot {
        ValueSlot::Constant => true,
        ValueSlot::Typed(ty) => {
            let underlying = tracker.underlying(ty);
            underlying.is_known() && !underlying.is_byte_string()
        }
        ValueSlot::Untyped => false,
    }
}
