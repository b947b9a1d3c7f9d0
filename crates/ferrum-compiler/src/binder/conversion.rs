//! The conversion lattice: `Conversion::classify(from, to)` plus the
//! constant-folding narrowing helper `adjust_type`.

use crate::symbols::TypeSymbol;

use super::bound_tree::BoundConstant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    None,
    Identity,
    Implicit,
    Explicit,
}

impl Conversion {
    pub fn exists(self) -> bool {
        self != Conversion::None
    }

    pub fn is_implicit(self) -> bool {
        matches!(self, Conversion::Identity | Conversion::Implicit)
    }

    /// Classifies the conversion from `from` to `to`, per spec.md §4.4:
    /// identity; implicit same-signedness-family numeric widening, any
    /// type → `object`, `error` → anything; explicit any two numerics,
    /// `string ↔ numeric`, `char ↔ numeric`, `object → T`.
    pub fn classify(from: TypeSymbol, to: TypeSymbol) -> Conversion {
        if from == to {
            return Conversion::Identity;
        }
        if from == TypeSymbol::Error || to == TypeSymbol::Error {
            return Conversion::Implicit;
        }
        if to == TypeSymbol::Object && from != TypeSymbol::Void {
            return Conversion::Implicit;
        }
        if from.is_numeric() && to.is_numeric() {
            if Self::is_widening(from, to) {
                return Conversion::Implicit;
            }
            return Conversion::Explicit;
        }
        if (from == TypeSymbol::String && to.is_numeric()) || (from.is_numeric() && to == TypeSymbol::String) {
            return Conversion::Explicit;
        }
        if (from == TypeSymbol::Char && to.is_numeric()) || (from.is_numeric() && to == TypeSymbol::Char) {
            return Conversion::Explicit;
        }
        if from == TypeSymbol::Object {
            return Conversion::Explicit;
        }
        Conversion::None
    }

    /// Same-signedness-family widening: int8→int16→int32→int64,
    /// uint8→uint16→uint32→uint64, float32→float64→float128. Crossing
    /// families (signed↔unsigned) is always explicit even when the
    /// target is wider.
    fn is_widening(from: TypeSymbol, to: TypeSymbol) -> bool {
        if let (Some(from_rank), Some(to_rank)) = (from.integer_rank(), to.integer_rank()) {
            return from.is_signed() == to.is_signed() && from_rank < to_rank;
        }
        if let (Some(from_rank), Some(to_rank)) = (from.float_rank(), to.float_rank()) {
            return from_rank < to_rank;
        }
        false
    }
}

/// Narrows/widens a folded constant to `target`, matching the literal
/// boundary's silently-coercive behavior (Open Question (2), preserved
/// as-is — no diagnostic on narrowing, only a truncating/saturating cast
/// in the constant's representation).
pub fn adjust_type(value: BoundConstant, target: TypeSymbol) -> BoundConstant {
    match (&value, target) {
        (BoundConstant::Integer(n), _) if target.is_integer() => {
            let n = *n;
            BoundConstant::Integer(match target {
                TypeSymbol::Int8 => n as i8 as i128,
                TypeSymbol::Int16 => n as i16 as i128,
                TypeSymbol::Int32 => n as i32 as i128,
                TypeSymbol::Int64 => n as i64 as i128,
                TypeSymbol::UInt8 => n as u8 as i128,
                TypeSymbol::UInt16 => n as u16 as i128,
                TypeSymbol::UInt32 => n as u32 as i128,
                TypeSymbol::UInt64 => n as u64 as i128,
                _ => unreachable!(),
            })
        }
        (BoundConstant::Integer(n), TypeSymbol::Float32 | TypeSymbol::Float64 | TypeSymbol::Float128) => {
            BoundConstant::Float(*n as f64)
        }
        (BoundConstant::Float(f), _) if target.is_integer() => BoundConstant::Integer(*f as i128),
        (BoundConstant::Float(f), TypeSymbol::Float32) => BoundConstant::Float(*f as f32 as f64),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion_is_free() {
        assert_eq!(Conversion::classify(TypeSymbol::Int32, TypeSymbol::Int32), Conversion::Identity);
    }

    #[test]
    fn same_family_widening_is_implicit() {
        assert_eq!(Conversion::classify(TypeSymbol::Int8, TypeSymbol::Int32), Conversion::Implicit);
        assert_eq!(Conversion::classify(TypeSymbol::UInt8, TypeSymbol::UInt64), Conversion::Implicit);
    }

    #[test]
    fn cross_family_integer_conversion_is_explicit_even_when_wider() {
        assert_eq!(Conversion::classify(TypeSymbol::Int8, TypeSymbol::UInt32), Conversion::Explicit);
    }

    #[test]
    fn narrowing_requires_explicit_conversion() {
        assert_eq!(Conversion::classify(TypeSymbol::Int32, TypeSymbol::Int8), Conversion::Explicit);
    }

    #[test]
    fn anything_converts_implicitly_to_object() {
        assert_eq!(Conversion::classify(TypeSymbol::Bool, TypeSymbol::Object), Conversion::Implicit);
    }

    #[test]
    fn string_and_numeric_are_only_explicitly_convertible() {
        assert_eq!(Conversion::classify(TypeSymbol::String, TypeSymbol::Int32), Conversion::Explicit);
        assert_eq!(Conversion::classify(TypeSymbol::Int32, TypeSymbol::String), Conversion::Explicit);
    }

    #[test]
    fn unrelated_types_have_no_conversion() {
        assert_eq!(Conversion::classify(TypeSymbol::Bool, TypeSymbol::Char), Conversion::None);
    }

    #[test]
    fn narrowing_truncates_silently() {
        let narrowed = adjust_type(BoundConstant::Integer(300), TypeSymbol::Int8);
        assert_eq!(narrowed, BoundConstant::Integer(300i32 as i8 as i128));
    }
}
