//! Reference model of the runtime's zero-copy reinterpretation helper.
//!
//! The runtime works on the slice's backing storage directly. This model does
//! the same on a `&mut [u8]`: the result is always a prefix of the input
//! buffer, byte-swapped in place when the requested byte order differs from
//! the host's. The lowering pass uses [`ElementKind`] to validate element
//! types; tests use the model to pin the helper's contract.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    Little,
    Big,
    #[default]
    Native,
}

impl Endianness {
    /// Name of the tag as written in source and exported by the runtime.
    pub fn tag(&self) -> &'static str {
        match self {
            Endianness::Little => "LittleEndian",
            Endianness::Big => "BigEndian",
            Endianness::Native => "NativeEndian",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "LittleEndian" => Some(Endianness::Little),
            "BigEndian" => Some(Endianness::Big),
            "NativeEndian" => Some(Endianness::Native),
            _ => None,
        }
    }

    /// Whether values stored in this order must be swapped to be read natively.
    pub fn needs_swap(&self) -> bool {
        match self {
            Endianness::Native => false,
            Endianness::Little => cfg!(target_endian = "big"),
            Endianness::Big => cfg!(target_endian = "little"),
        }
    }
}

/// Fixed-width element types the runtime can reinterpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ElementKind {
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "byte" | "uint8" => ElementKind::U8,
            "int8" => ElementKind::I8,
            "uint16" => ElementKind::U16,
            "int16" => ElementKind::I16,
            "uint32" => ElementKind::U32,
            "int32" | "rune" => ElementKind::I32,
            "uint64" => ElementKind::U64,
            "int64" => ElementKind::I64,
            "float32" => ElementKind::F32,
            "float64" => ElementKind::F64,
            "int" | "uint" | "uintptr" => {
                if cfg!(target_pointer_width = "64") {
                    if name == "int" {
                        ElementKind::I64
                    } else {
                        ElementKind::U64
                    }
                } else if name == "int" {
                    ElementKind::I32
                } else {
                    ElementKind::U32
                }
            }
            _ => return None,
        };
        Some(kind)
    }

    pub fn size(&self) -> usize {
        match self {
            ElementKind::U8 | ElementKind::I8 => 1,
            ElementKind::U16 | ElementKind::I16 => 2,
            ElementKind::U32 | ElementKind::I32 | ElementKind::F32 => 4,
            ElementKind::U64 | ElementKind::I64 | ElementKind::F64 => 8,
        }
    }
}

/// `floor(src_len * size(src) / size(dst))`
pub fn coerced_len(src_len: usize, src: ElementKind, dst: ElementKind) -> usize {
    src_len * src.size() / dst.size()
}

fn swap_chunks(storage: &mut [u8], width: usize) {
    if width < 2 {
        return;
    }
    for chunk in storage.chunks_exact_mut(width) {
        chunk.reverse();
    }
}

/// Reinterpret `storage`, holding `storage.len() / size(src)` elements of
/// `src`, as elements of `dst` stored in `order`.
///
/// Without a swap this only shortens the view. With a swap the `src` values
/// are first written back in `order`, then read as `dst` values in `order`;
/// applying the inverse coercion with the same `order` undoes both steps.
pub fn coerce_in_place(
    storage: &mut [u8],
    src: ElementKind,
    dst: ElementKind,
    order: Endianness,
) -> &mut [u8] {
    let src_len = storage.len() / src.size();
    let used = coerced_len(src_len, src, dst) * dst.size();
    let view = &mut storage[..used];
    if order.needs_swap() {
        swap_chunks(view, src.size());
        swap_chunks(view, dst.size());
    }
    view
}

/// Raw bit pattern of element `index` of `storage` read as `kind` in host order.
pub fn read_element(storage: &[u8], kind: ElementKind, index: usize) -> Option<u64> {
    let width = kind.size();
    let bytes = storage.get(index * width..(index + 1) * width)?;
    let mut buf = [0u8; 8];
    if cfg!(target_endian = "little") {
        buf[..width].copy_from_slice(bytes);
        Some(u64::from_le_bytes(buf))
    } else {
        buf[8 - width..].copy_from_slice(bytes);
        Some(u64::from_be_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_rule_floors() {
        assert_eq!(coerced_len(7, ElementKind::U8, ElementKind::U32), 1);
        assert_eq!(coerced_len(8, ElementKind::U8, ElementKind::U32), 2);
        assert_eq!(coerced_len(3, ElementKind::U16, ElementKind::U8), 6);
        assert_eq!(coerced_len(3, ElementKind::U16, ElementKind::U32), 1);
    }

    #[test]
    fn test_little_and_big_endian_reads() {
        let mut little = [0x01, 0x00, 0x00, 0x00];
        let view = coerce_in_place(&mut little, ElementKind::U8, ElementKind::U32, Endianness::Little);
        assert_eq!(read_element(view, ElementKind::U32, 0), Some(1));

        let mut big = [0x00, 0x00, 0x00, 0x01];
        let view = coerce_in_place(&mut big, ElementKind::U8, ElementKind::U32, Endianness::Big);
        assert_eq!(read_element(view, ElementKind::U32, 0), Some(1));
    }

    #[test]
    fn test_native_is_a_plain_view() {
        let mut storage = [1u8, 2, 3, 4, 5];
        let ptr = storage.as_ptr();
        let view = coerce_in_place(&mut storage, ElementKind::U8, ElementKind::U16, Endianness::Native);
        assert_eq!(view.len(), 4);
        assert_eq!(view.as_ptr(), ptr);
        assert_eq!(view, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_tags() {
        for order in [Endianness::Little, Endianness::Big, Endianness::Native] {
            assert_eq!(Endianness::from_tag(order.tag()), Some(order));
        }
        assert_eq!(Endianness::from_tag("MiddleEndian"), None);
        assert!(!Endianness::Native.needs_swap());
    }
}
