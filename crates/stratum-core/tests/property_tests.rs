/*!
# Property Tests

Laws the lowering relies on: reinterpretation undoes itself, and string
literals survive quoting and decoding byte for byte.
*/

use proptest::prelude::*;

use stratum_core::ast::quote;
use stratum_core::runtime::coerce::{coerce_in_place, coerced_len, ElementKind, Endianness};
use stratum_core::transform::passes::literalize::decode_string_literal;

fn element_kind() -> impl Strategy<Value = ElementKind> {
    prop_oneof![
        Just(ElementKind::U8),
        Just(ElementKind::I16),
        Just(ElementKind::U16),
        Just(ElementKind::I32),
        Just(ElementKind::F32),
        Just(ElementKind::U64),
        Just(ElementKind::F64),
    ]
}

fn endianness() -> impl Strategy<Value = Endianness> {
    prop_oneof![
        Just(Endianness::Little),
        Just(Endianness::Big),
        Just(Endianness::Native),
    ]
}

proptest! {
    #[test]
    fn coerce_to_wider_and_back_restores_bytes(
        bytes in proptest::collection::vec(any::<u8>(), 0..64),
        target in element_kind(),
        order in endianness(),
    ) {
        let whole = bytes.len() / target.size() * target.size();
        let original = bytes[..whole].to_vec();
        let mut storage = original.clone();

        let len = coerce_in_place(&mut storage, ElementKind::U8, target, order).len();
        prop_assert_eq!(len, whole);
        let back = coerce_in_place(&mut storage[..len], target, ElementKind::U8, order);
        prop_assert_eq!(back, &original[..]);
    }

    #[test]
    fn coerced_length_never_exceeds_storage(
        count in 0usize..256,
        src in element_kind(),
        dst in element_kind(),
    ) {
        let len = coerced_len(count, src, dst);
        prop_assert!(len * dst.size() <= count * src.size());
        prop_assert!(count * src.size() - len * dst.size() < dst.size());
    }

    #[test]
    fn quoted_text_decodes_to_its_bytes(text in "\\PC*") {
        prop_assert_eq!(decode_string_literal(&quote(&text)), Some(text.into_bytes()));
    }

    #[test]
    fn control_characters_survive_quoting(bytes in proptest::collection::vec(0u8..0x20, 0..16)) {
        let text: String = bytes.iter().map(|&b| b as char).collect();
        prop_assert_eq!(decode_string_literal(&quote(&text)), Some(bytes));
    }
}
