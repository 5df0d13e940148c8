//! Atomic values and the `xs:` type lattice's dynamic operations:
//! `validate`/`cast` (spec.md §3 "Atomic type", §4.4). [`xpath_schema_type::Xs`]
//! supplies the static lattice (parent chains, `derives_from`); this module
//! supplies the runtime representation and the lexical casting rules.
//!
//! Grounded on the teacher's `xee-interpreter::atomic` module family
//! (`types.rs`, `cast_numeric.rs`, `cast_string.rs`), generalized to a
//! single `AtomicValue` enum since this crate does not carry the teacher's
//! full calendar/duration arithmetic (see DESIGN.md: date/time/duration and
//! binary types are supported as validated, castable, comparable lexical
//! values, not as a full arithmetic library — out of this core's budget).

use std::cmp::Ordering;
use std::str::FromStr;

use ibig::IBig;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

use xpath_schema_type::Xs;

use crate::error::Error;

/// A dynamically typed atomic value: one instance of some `Xs` type in
/// `anyAtomicType`'s subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicValue {
    UntypedAtomic(String),
    String(String, Xs),
    Boolean(bool),
    Decimal(Decimal),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Integer(IBig, Xs),
    QName(xpath_name::Name),
    /// Date/time/duration/gregorian/binary/anyURI-as-non-string values:
    /// kept as their canonical lexical form, tagged with the precise `Xs`
    /// subtype, since this core does not implement full calendar math.
    Lexical(String, Xs),
}

impl AtomicValue {
    pub fn schema_type(&self) -> Xs {
        match self {
            AtomicValue::UntypedAtomic(_) => Xs::UntypedAtomic,
            AtomicValue::String(_, ty) => *ty,
            AtomicValue::Boolean(_) => Xs::Boolean,
            AtomicValue::Decimal(_) => Xs::Decimal,
            AtomicValue::Float(_) => Xs::Float,
            AtomicValue::Double(_) => Xs::Double,
            AtomicValue::Integer(_, ty) => *ty,
            AtomicValue::QName(_) => Xs::QName,
            AtomicValue::Lexical(_, ty) => *ty,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AtomicValue::Decimal(_) | AtomicValue::Float(_) | AtomicValue::Double(_) | AtomicValue::Integer(..)
        )
    }

    /// The string value of this atomic item (`fn:string()` on an atomic,
    /// or the canonical lexical representation used for casts).
    pub fn display_string(&self) -> String {
        match self {
            AtomicValue::UntypedAtomic(s) | AtomicValue::String(s, _) | AtomicValue::Lexical(s, _) => s.clone(),
            AtomicValue::Boolean(b) => b.to_string(),
            AtomicValue::Decimal(d) => d.normalize().to_string(),
            AtomicValue::Float(f) => format_double(f.0 as f64),
            AtomicValue::Double(d) => format_double(d.0),
            AtomicValue::Integer(i, _) => i.to_string(),
            AtomicValue::QName(name) => name.to_full_name(),
        }
    }

    /// `validate(v)` (spec.md §3): does this value conform to `target`?
    /// For the primitive/derived numeric and string subtypes this is
    /// "is the value already an instance of, or castable without loss into,
    /// `target`"; full facet validation (pattern/enumeration/digits) is
    /// left to a schema-validator collaborator, not this core.
    pub fn validate(&self, target: Xs) -> bool {
        self.schema_type().derives_from(target) || self.cast(target).is_ok()
    }

    /// `cast(v) -> value|error` (spec.md §3/§4.4): W3C-defined lexical
    /// conversion. Fails with [`Error::FORG0001`] if not castable, and
    /// with [`Error::XPST0080`] if `target` can never be a cast target.
    pub fn cast(&self, target: Xs) -> Result<AtomicValue, Error> {
        if matches!(target, Xs::Notation | Xs::AnyAtomicType) {
            return Err(Error::XPST0080);
        }
        if self.schema_type().derives_from(target) {
            return Ok(self.clone());
        }
        if target.is_numeric() || matches!(target, Xs::Numeric) {
            return self.cast_to_numeric(target);
        }
        match target {
            Xs::Boolean => self.cast_to_boolean(),
            Xs::String
            | Xs::NormalizedString
            | Xs::Token
            | Xs::Language
            | Xs::NMTOKEN
            | Xs::Name
            | Xs::NCName
            | Xs::ID
            | Xs::IDREF
            | Xs::ENTITY
            | Xs::AnyURI => Ok(AtomicValue::String(self.display_string(), target)),
            Xs::UntypedAtomic => Ok(AtomicValue::UntypedAtomic(self.display_string())),
            Xs::QName => match self {
                AtomicValue::QName(name) => Ok(AtomicValue::QName(name.clone())),
                _ => Err(Error::FORG0001),
            },
            // Calendar/duration/binary targets: accept the lexical form
            // as-is (syntactic cast), matching the "Lexical" representation
            // documented above.
            Xs::Duration
            | Xs::YearMonthDuration
            | Xs::DayTimeDuration
            | Xs::DateTime
            | Xs::DateTimeStamp
            | Xs::Date
            | Xs::Time
            | Xs::GYearMonth
            | Xs::GYear
            | Xs::GMonthDay
            | Xs::GMonth
            | Xs::GDay
            | Xs::Base64Binary
            | Xs::HexBinary => Ok(AtomicValue::Lexical(self.display_string(), target)),
            _ => Err(Error::FORG0001),
        }
    }

    fn cast_to_boolean(&self) -> Result<AtomicValue, Error> {
        match self {
            AtomicValue::Boolean(b) => Ok(AtomicValue::Boolean(*b)),
            AtomicValue::Integer(i, _) => Ok(AtomicValue::Boolean(*i != IBig::from(0))),
            AtomicValue::Decimal(d) => Ok(AtomicValue::Boolean(!d.is_zero())),
            AtomicValue::Float(f) => Ok(AtomicValue::Boolean(f.0 != 0.0 && !f.0.is_nan())),
            AtomicValue::Double(d) => Ok(AtomicValue::Boolean(d.0 != 0.0 && !d.0.is_nan())),
            AtomicValue::String(s, _) | AtomicValue::UntypedAtomic(s) => match s.trim() {
                "true" | "1" => Ok(AtomicValue::Boolean(true)),
                "false" | "0" => Ok(AtomicValue::Boolean(false)),
                _ => Err(Error::FORG0001),
            },
            _ => Err(Error::FORG0001),
        }
    }

    fn cast_to_numeric(&self, target: Xs) -> Result<AtomicValue, Error> {
        let double = match self {
            AtomicValue::Integer(i, _) => ibig_to_f64(i),
            AtomicValue::Decimal(d) => d.to_string().parse::<f64>().map_err(|_| Error::FORG0001)?,
            AtomicValue::Float(f) => f.0 as f64,
            AtomicValue::Double(d) => d.0,
            AtomicValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            AtomicValue::String(s, _) | AtomicValue::UntypedAtomic(s) => {
                s.trim().parse::<f64>().map_err(|_| Error::FORG0001)?
            }
            _ => return Err(Error::FORG0001),
        };
        build_numeric(target, double)
    }
}

/// Build an [`AtomicValue`] of numeric type `target` from a lossless-enough
/// `f64`, enforcing derived-integer bounds with [`Error::FOAR0002`].
fn build_numeric(target: Xs, double: f64) -> Result<AtomicValue, Error> {
    match target {
        Xs::Double | Xs::Numeric => Ok(AtomicValue::Double(OrderedFloat(double))),
        Xs::Float => Ok(AtomicValue::Float(OrderedFloat(double as f32))),
        Xs::Decimal => {
            let decimal = Decimal::from_str(&format_double(double)).map_err(|_| Error::FORG0001)?;
            Ok(AtomicValue::Decimal(decimal))
        }
        integer_like => {
            if double.fract() != 0.0 || !double.is_finite() {
                return Err(Error::FORG0001);
            }
            let value = IBig::from_str(&format!("{double:.0}")).map_err(|_| Error::FORG0001)?;
            check_integer_bounds(integer_like, &value)?;
            Ok(AtomicValue::Integer(value, integer_like))
        }
    }
}

fn check_integer_bounds(ty: Xs, value: &IBig) -> Result<(), Error> {
    let zero = IBig::from(0);
    let in_bounds = match ty {
        Xs::NonPositiveInteger => *value <= zero,
        Xs::NegativeInteger => *value < zero,
        Xs::NonNegativeInteger | Xs::UnsignedLong | Xs::UnsignedInt | Xs::UnsignedShort | Xs::UnsignedByte => {
            *value >= zero
        }
        Xs::PositiveInteger => *value > zero,
        _ => true,
    };
    if !in_bounds {
        return Err(Error::FOAR0002);
    }
    let within = match ty {
        Xs::Long => *value >= IBig::from(i64::MIN) && *value <= IBig::from(i64::MAX),
        Xs::Int => *value >= IBig::from(i32::MIN) && *value <= IBig::from(i32::MAX),
        Xs::Short => *value >= IBig::from(i16::MIN) && *value <= IBig::from(i16::MAX),
        Xs::Byte => *value >= IBig::from(i8::MIN) && *value <= IBig::from(i8::MAX),
        Xs::UnsignedLong => *value <= IBig::from(u64::MAX),
        Xs::UnsignedInt => *value <= IBig::from(u32::MAX),
        Xs::UnsignedShort => *value <= IBig::from(u16::MAX),
        Xs::UnsignedByte => *value <= IBig::from(u8::MAX),
        _ => true,
    };
    if !within {
        return Err(Error::FOAR0002);
    }
    Ok(())
}

fn ibig_to_f64(value: &IBig) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::NAN)
}

/// XPath's double/float lexical form: `INF`/`-INF`/`NaN`, otherwise a plain
/// decimal rendering.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "INF".to_string()
        } else {
            "-INF".to_string()
        }
    } else if value == value.trunc() && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Three-way comparison used by `eq/ne/lt/le/gt/ge` on numeric operands
/// after promotion (spec.md §4.4's promotion lattice `integer -> decimal ->
/// float -> double`); `None` for NaN comparisons.
pub fn compare_numeric(a: &AtomicValue, b: &AtomicValue) -> Option<Ordering> {
    match (a, b) {
        (AtomicValue::Integer(x, _), AtomicValue::Integer(y, _)) => Some(x.cmp(y)),
        _ => {
            let (x, y) = (numeric_as_f64(a)?, numeric_as_f64(b)?);
            x.partial_cmp(&y)
        }
    }
}

fn numeric_as_f64(value: &AtomicValue) -> Option<f64> {
    match value {
        AtomicValue::Integer(i, _) => Some(ibig_to_f64(i)),
        AtomicValue::Decimal(d) => d.to_string().parse().ok(),
        AtomicValue::Float(f) => Some(f.0 as f64),
        AtomicValue::Double(d) => Some(d.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_casts_to_integer() {
        let value = AtomicValue::String("42".to_string(), Xs::String);
        let cast = value.cast(Xs::Integer).unwrap();
        assert_eq!(cast, AtomicValue::Integer(IBig::from(42), Xs::Integer));
    }

    #[test]
    fn non_integral_double_is_not_castable_to_integer() {
        let value = AtomicValue::Double(OrderedFloat(1.5));
        assert!(value.cast(Xs::Integer).is_err());
    }

    #[test]
    fn byte_overflow_is_foar0002() {
        let value = AtomicValue::Integer(IBig::from(1000), Xs::Integer);
        assert_eq!(value.cast(Xs::Byte).unwrap_err(), Error::FOAR0002);
    }

    #[test]
    fn any_atomic_type_is_not_a_cast_target() {
        let value = AtomicValue::Integer(IBig::from(1), Xs::Integer);
        assert_eq!(value.cast(Xs::AnyAtomicType).unwrap_err(), Error::XPST0080);
    }

    #[test]
    fn infinite_double_formats_as_inf() {
        assert_eq!(format_double(f64::INFINITY), "INF");
        assert_eq!(format_double(f64::NEG_INFINITY), "-INF");
        assert_eq!(format_double(f64::NAN), "NaN");
    }
}
