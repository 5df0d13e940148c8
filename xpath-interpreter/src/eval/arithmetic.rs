//! Numeric arithmetic (spec.md §4.6 "Arithmetic"): `+ - * div idiv mod`
//! over the `integer -> decimal -> float -> double` promotion lattice, plus
//! duration/date/time arithmetic reduced to the lexical representation this
//! core carries (spec.md §9: date/time arithmetic is out of this core's
//! budget beyond validating/casting the lexical form — see DESIGN.md).

use std::str::FromStr;

use ibig::IBig;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

use xpath_ast::operator::BinaryOperator;
use xpath_schema_type::Xs;

use crate::atomic::AtomicValue;
use crate::error::Error;

/// The promotion tier of a numeric operand (spec.md §4.4): higher tiers
/// absorb lower ones in a mixed operation.
fn tier(value: &AtomicValue) -> u8 {
    match value {
        AtomicValue::Integer(..) => 0,
        AtomicValue::Decimal(_) => 1,
        AtomicValue::Float(_) => 2,
        AtomicValue::Double(_) => 3,
        _ => 3,
    }
}

fn as_decimal(value: &AtomicValue) -> Result<Decimal, Error> {
    match value {
        AtomicValue::Integer(i, _) => i.to_string().parse().map_err(|_| Error::FOAR0002),
        AtomicValue::Decimal(d) => Ok(*d),
        _ => Err(Error::XPTY0004),
    }
}

fn as_f64(value: &AtomicValue) -> Result<f64, Error> {
    match value {
        AtomicValue::Integer(i, _) => i.to_string().parse().map_err(|_| Error::FOAR0002),
        AtomicValue::Decimal(d) => d.to_string().parse().map_err(|_| Error::FOAR0002),
        AtomicValue::Float(f) => Ok(f.0 as f64),
        AtomicValue::Double(d) => Ok(d.0),
        _ => Err(Error::XPTY0004),
    }
}

/// Numeric `+`/`-`/`*`/`div`/`idiv`/`mod` promoted to the wider operand's
/// tier, re-narrowed to `float` only when the result came from two floats
/// (doubles stay doubles, per the lattice never demoting).
fn apply(op: BinaryOperator, a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    if !a.is_numeric() || !b.is_numeric() {
        return Err(Error::XPTY0004);
    }
    let result_tier = tier(a).max(tier(b));
    match result_tier {
        0 => {
            let (x, y) = (integer_value(a)?, integer_value(b)?);
            apply_integer(op, &x, &y)
        }
        1 => {
            let (x, y) = (as_decimal(a)?, as_decimal(b)?);
            apply_decimal(op, x, y)
        }
        2 => {
            let (x, y) = (as_f64(a)? as f32, as_f64(b)? as f32);
            apply_float(op, x, y)
        }
        _ => {
            let (x, y) = (as_f64(a)?, as_f64(b)?);
            apply_double(op, x, y)
        }
    }
}

fn integer_value(value: &AtomicValue) -> Result<IBig, Error> {
    match value {
        AtomicValue::Integer(i, _) => Ok(i.clone()),
        _ => Err(Error::XPTY0004),
    }
}

fn apply_integer(op: BinaryOperator, a: &IBig, b: &IBig) -> Result<AtomicValue, Error> {
    let zero = IBig::from(0);
    let value = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => {
            // `div` on two integers promotes straight to double (spec.md §8's
            // worked example pins `1 div 0` to IEEE `INF`, which only a
            // double-tier division yields — a decimal-tier promotion would
            // raise `FOAR0001` on a zero divisor instead).
            let (x, y) = (a.to_string().parse::<f64>().map_err(|_| Error::FOAR0002)?, b.to_string().parse::<f64>().map_err(|_| Error::FOAR0002)?);
            return apply_double(op, x, y);
        }
        BinaryOperator::IntDiv => {
            if *b == zero {
                return Err(Error::FOAR0001);
            }
            a / b
        }
        BinaryOperator::Mod => {
            if *b == zero {
                return Err(Error::FOAR0001);
            }
            a % b
        }
        _ => return Err(Error::XPTY0004),
    };
    Ok(AtomicValue::Integer(value, Xs::Integer))
}

fn apply_decimal(op: BinaryOperator, a: Decimal, b: Decimal) -> Result<AtomicValue, Error> {
    let value = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => {
            if b.is_zero() {
                return Err(Error::FOAR0001);
            }
            a / b
        }
        BinaryOperator::IntDiv => {
            if b.is_zero() {
                return Err(Error::FOAR0001);
            }
            let quotient = a / b;
            return Ok(AtomicValue::Integer(
                IBig::from_str(&quotient.trunc().to_string()).map_err(|_| Error::FOAR0002)?,
                Xs::Integer,
            ));
        }
        BinaryOperator::Mod => {
            if b.is_zero() {
                return Err(Error::FOAR0001);
            }
            a % b
        }
        _ => return Err(Error::XPTY0004),
    };
    Ok(AtomicValue::Decimal(value))
}

fn apply_float(op: BinaryOperator, a: f32, b: f32) -> Result<AtomicValue, Error> {
    let value = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => a / b,
        BinaryOperator::IntDiv => {
            if b == 0.0 {
                return Err(Error::FOAR0001);
            }
            return Ok(AtomicValue::Integer(
                IBig::from_str(&format!("{:.0}", (a / b).trunc())).map_err(|_| Error::FOAR0002)?,
                Xs::Integer,
            ));
        }
        BinaryOperator::Mod => a % b,
        _ => return Err(Error::XPTY0004),
    };
    Ok(AtomicValue::Float(OrderedFloat(value)))
}

fn apply_double(op: BinaryOperator, a: f64, b: f64) -> Result<AtomicValue, Error> {
    let value = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => a / b,
        BinaryOperator::IntDiv => {
            if b == 0.0 {
                return Err(Error::FOAR0001);
            }
            return Ok(AtomicValue::Integer(
                IBig::from_str(&format!("{:.0}", (a / b).trunc())).map_err(|_| Error::FOAR0002)?,
                Xs::Integer,
            ));
        }
        BinaryOperator::Mod => a % b,
        _ => return Err(Error::XPTY0004),
    };
    Ok(AtomicValue::Double(OrderedFloat(value)))
}

pub fn add(a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    apply(BinaryOperator::Add, a, b)
}

pub fn subtract(a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    apply(BinaryOperator::Sub, a, b)
}

pub fn multiply(a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    apply(BinaryOperator::Mul, a, b)
}

pub fn divide(a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    apply(BinaryOperator::Div, a, b)
}

pub fn integer_divide(a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    apply(BinaryOperator::IntDiv, a, b)
}

pub fn modulo(a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    apply(BinaryOperator::Mod, a, b)
}

/// `fn:sum`'s accumulation step: numeric addition used in a fold, exposed
/// separately since the built-in function library sits below `eval` and
/// cannot call through [`apply`]'s operator-indexed entry point directly.
pub fn numeric_add(a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    add(a, b)
}

/// Arithmetic unary `-`/`+` (spec.md §4.6).
pub fn negate(value: &AtomicValue) -> Result<AtomicValue, Error> {
    match value {
        AtomicValue::Integer(i, ty) => Ok(AtomicValue::Integer(-i, *ty)),
        AtomicValue::Decimal(d) => Ok(AtomicValue::Decimal(-d)),
        AtomicValue::Float(f) => Ok(AtomicValue::Float(OrderedFloat(-f.0))),
        AtomicValue::Double(d) => Ok(AtomicValue::Double(OrderedFloat(-d.0))),
        _ => Err(Error::XPTY0004),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> AtomicValue {
        AtomicValue::Integer(IBig::from(v), Xs::Integer)
    }

    #[test]
    fn integer_plus_integer_stays_integer() {
        assert_eq!(add(&int(2), &int(3)).unwrap(), int(5));
    }

    #[test]
    fn integer_div_promotes_to_double() {
        let result = divide(&int(1), &int(2)).unwrap();
        assert_eq!(result, AtomicValue::Double(OrderedFloat(0.5)));
    }

    #[test]
    fn integer_div_by_zero_yields_infinity() {
        // spec.md §8 "Boundary behaviours": "`1 div 0` yields `INF` (double)".
        let result = divide(&int(1), &int(0)).unwrap();
        assert_eq!(result, AtomicValue::Double(OrderedFloat(f64::INFINITY)));
    }

    #[test]
    fn idiv_by_zero_is_foar0001() {
        assert_eq!(integer_divide(&int(1), &int(0)).unwrap_err(), Error::FOAR0001);
    }

    #[test]
    fn double_absorbs_integer() {
        let d = AtomicValue::Double(OrderedFloat(1.5));
        let result = add(&d, &int(1)).unwrap();
        assert_eq!(result, AtomicValue::Double(OrderedFloat(2.5)));
    }
}
