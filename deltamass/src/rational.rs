//! Arbitrary precision rational numbers for exact mass difference arithmetic.
//!
//! Mass differences are grouped at sub-Dalton resolution, and comparing millions of them
//! with `f64` lets rounding error leak into peak boundaries. [`ExactRational`] keeps every
//! value as a reduced fraction of two [`BigInt`]s so that `a - b` and `a <= b` mean exactly
//! what they say.
use std::fmt::Display;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use thiserror::Error;

/// The largest decimal exponent accepted when parsing, which bounds the size of
/// the integers a single string can produce.
const MAX_DECIMAL_EXPONENT: i64 = 4096;

/// An error that might occur while constructing an [`ExactRational`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RationalError {
    #[error("Attempted to construct a rational number with a zero denominator")]
    DivideByZero,
    #[error("Cannot represent {0} as an exact rational number")]
    InvalidArgument(f64),
    #[error("Failed to parse {0:?} as a rational number")]
    Parse(String),
}

/// An immutable, exact rational number stored in lowest terms with a positive denominator.
///
/// Equality, hashing and ordering are all defined on the mathematical value, so
/// `ExactRational::new(6, 4)` and `ExactRational::new(3, 2)` are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExactRational(BigRational);

impl ExactRational {
    /// Create a new rational from a numerator and denominator pair, reducing it to lowest terms.
    ///
    /// # Errors
    /// [`RationalError::DivideByZero`] if `denom` is zero.
    pub fn new<N: Into<BigInt>, D: Into<BigInt>>(numer: N, denom: D) -> Result<Self, RationalError> {
        let denom = denom.into();
        if denom.is_zero() {
            return Err(RationalError::DivideByZero);
        }
        Ok(Self(BigRational::new(numer.into(), denom)))
    }

    pub fn from_integer<N: Into<BigInt>>(value: N) -> Self {
        Self(BigRational::from_integer(value.into()))
    }

    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    pub fn minus_one() -> Self {
        Self(-BigRational::one())
    }

    /// Convert a float into the rational number it encodes exactly, binary
    /// representation error included.
    ///
    /// # Errors
    /// [`RationalError::InvalidArgument`] for NaN or infinite values.
    pub fn try_from_f64(value: f64) -> Result<Self, RationalError> {
        if !value.is_finite() {
            return Err(RationalError::InvalidArgument(value));
        }
        BigRational::from_float(value)
            .map(Self)
            .ok_or(RationalError::InvalidArgument(value))
    }

    /// Convert a float into the shortest decimal fraction that round-trips to it,
    /// so `79.02` becomes `7902/100` rather than the nearest binary fraction.
    ///
    /// This is the conversion used for masses and tolerances, which are decimal
    /// quantities that happen to travel as `f64`.
    ///
    /// # Errors
    /// [`RationalError::InvalidArgument`] for NaN or infinite values.
    pub fn from_decimal_f64(value: f64) -> Result<Self, RationalError> {
        if !value.is_finite() {
            return Err(RationalError::InvalidArgument(value));
        }
        // `Display` for f64 writes the shortest round-trip digits and never uses an exponent
        value.to_string().parse()
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// -1, 0 or 1 depending upon the sign of the value
    pub fn signum(&self) -> i8 {
        match self.0.numer().sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// The multiplicative inverse.
    ///
    /// # Errors
    /// [`RationalError::DivideByZero`] when the value is zero.
    pub fn invert(&self) -> Result<Self, RationalError> {
        if self.is_zero() {
            Err(RationalError::DivideByZero)
        } else {
            Ok(Self(self.0.recip()))
        }
    }

    /// The integral part of the value, truncated toward zero
    pub fn whole_part(&self) -> Self {
        Self(self.0.trunc())
    }

    /// The remainder after removing [`ExactRational::whole_part`], carrying the sign of the value
    pub fn fraction_part(&self) -> Self {
        Self(self.0.fract())
    }

    /// Division that reports a zero divisor instead of panicking
    ///
    /// # Errors
    /// [`RationalError::DivideByZero`] when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Self) -> Result<Self, RationalError> {
        if rhs.is_zero() {
            Err(RationalError::DivideByZero)
        } else {
            Ok(Self(&self.0 / &rhs.0))
        }
    }

    /// The nearest `f64`, or NaN if the value is beyond the range of `f64`
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    fn parse_decimal(text: &str) -> Result<Self, RationalError> {
        let fail = || RationalError::Parse(text.to_string());
        let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => {
                let exponent: i64 = text[i + 1..].parse().map_err(|_| fail())?;
                (&text[..i], exponent)
            }
            None => (text, 0),
        };
        if exponent.abs() > MAX_DECIMAL_EXPONENT {
            return Err(fail());
        }
        let (negative, digits) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if (whole.is_empty() && fraction.is_empty())
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(fail());
        }

        let mut numer: BigInt = format!("{whole}{fraction}").parse().map_err(|_| fail())?;
        if negative {
            numer = -numer;
        }
        let scale = exponent - fraction.len() as i64;
        let ten = BigInt::from(10u32);
        let value = if scale >= 0 {
            BigRational::from_integer(numer * num_traits::pow(ten, scale as usize))
        } else {
            BigRational::new(numer, num_traits::pow(ten, (-scale) as usize))
        };
        Ok(Self(value))
    }
}

impl Default for ExactRational {
    fn default() -> Self {
        Self::zero()
    }
}

impl Display for ExactRational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExactRational {
    type Err = RationalError;

    /// Parse either a fraction (`"-3/4"`) or a decimal literal (`"12.5"`, `"1e-3"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some((numer, denom)) = text.split_once('/') {
            let numer: BigInt = numer
                .trim()
                .parse()
                .map_err(|_| RationalError::Parse(text.to_string()))?;
            let denom: BigInt = denom
                .trim()
                .parse()
                .map_err(|_| RationalError::Parse(text.to_string()))?;
            Self::new(numer, denom)
        } else {
            Self::parse_decimal(text)
        }
    }
}

impl TryFrom<f64> for ExactRational {
    type Error = RationalError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_from_f64(value)
    }
}

impl From<i64> for ExactRational {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<BigInt> for ExactRational {
    fn from(value: BigInt) -> Self {
        Self::from_integer(value)
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<ExactRational> for ExactRational {
            type Output = ExactRational;

            fn $method(self, rhs: ExactRational) -> ExactRational {
                ExactRational(self.0.$method(rhs.0))
            }
        }

        impl<'a> $imp<&'a ExactRational> for ExactRational {
            type Output = ExactRational;

            fn $method(self, rhs: &'a ExactRational) -> ExactRational {
                ExactRational(self.0.$method(&rhs.0))
            }
        }

        impl<'a> $imp<ExactRational> for &'a ExactRational {
            type Output = ExactRational;

            fn $method(self, rhs: ExactRational) -> ExactRational {
                ExactRational((&self.0).$method(rhs.0))
            }
        }

        impl<'a, 'b> $imp<&'b ExactRational> for &'a ExactRational {
            type Output = ExactRational;

            fn $method(self, rhs: &'b ExactRational) -> ExactRational {
                ExactRational((&self.0).$method(&rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
// Panics on a zero divisor, like integer division. See `checked_div`.
forward_binop!(Div, div);

impl Neg for ExactRational {
    type Output = ExactRational;

    fn neg(self) -> Self::Output {
        ExactRational(-self.0)
    }
}

impl Neg for &ExactRational {
    type Output = ExactRational;

    fn neg(self) -> Self::Output {
        ExactRational(-&self.0)
    }
}

impl Sum for ExactRational {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ExactRational::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a ExactRational> for ExactRational {
    fn sum<I: Iterator<Item = &'a ExactRational>>(iter: I) -> Self {
        iter.fold(ExactRational::zero(), |acc, x| acc + x)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ExactRational {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ExactRational {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    fn r(numer: i64, denom: i64) -> ExactRational {
        ExactRational::new(numer, denom).unwrap()
    }

    #[test]
    fn test_properties() {
        let half = r(1, 2);
        assert_eq!(half.to_f64(), 0.5);
        assert_eq!(*half.numer(), BigInt::from(1));
        assert_eq!(*half.denom(), BigInt::from(2));
        assert_eq!(half.signum(), 1);
        assert_eq!(ExactRational::zero().to_f64(), 0.0);
        assert_eq!(ExactRational::one().to_f64(), 1.0);
        assert_eq!(ExactRational::minus_one().to_f64(), -1.0);
        assert_eq!(ExactRational::zero().signum(), 0);
    }

    #[test]
    fn test_reduced_form() {
        let x = r(6, -4);
        assert_eq!(*x.numer(), BigInt::from(-3));
        assert_eq!(*x.denom(), BigInt::from(2));
        assert_eq!(x, r(-3, 2));
        assert_eq!(x.to_f64(), -1.5);

        let mut seen = HashSet::new();
        seen.insert(r(3, 2));
        seen.insert(r(6, 4));
        seen.insert(r(-9, -6));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_whole_and_fraction() {
        let x = r(3, 2);
        assert_eq!(x.whole_part(), r(1, 1));
        assert_eq!(x.fraction_part(), r(1, 2));

        let y = r(-7, 4);
        assert_eq!(y.whole_part(), r(-1, 1));
        assert_eq!(y.fraction_part(), r(-3, 4));
        assert_eq!(y.whole_part() + y.fraction_part(), y);
    }

    #[test]
    fn test_constructor_failures() {
        assert_eq!(ExactRational::new(1, 0), Err(RationalError::DivideByZero));
        assert!(matches!(
            ExactRational::try_from_f64(f64::NAN),
            Err(RationalError::InvalidArgument(_))
        ));
        assert!(matches!(
            ExactRational::try_from_f64(f64::INFINITY),
            Err(RationalError::InvalidArgument(_))
        ));
        assert!(matches!(
            ExactRational::from_decimal_f64(f64::NEG_INFINITY),
            Err(RationalError::InvalidArgument(_))
        ));
        assert_eq!("1/0".parse::<ExactRational>(), Err(RationalError::DivideByZero));
        assert!(matches!(
            "12.a".parse::<ExactRational>(),
            Err(RationalError::Parse(_))
        ));
        assert!(matches!("".parse::<ExactRational>(), Err(RationalError::Parse(_))));
        assert!(matches!(".".parse::<ExactRational>(), Err(RationalError::Parse(_))));
    }

    #[test]
    fn test_from_float() {
        for v in [0.0, 0.5, -0.5, 1.0, -1.0, 100.0, -100.0, 0.1, 1234.5678] {
            assert_eq!(ExactRational::try_from_f64(v).unwrap().to_f64(), v);
            assert_eq!(ExactRational::from_decimal_f64(v).unwrap().to_f64(), v);
        }
        // The binary value of 0.1 is not one tenth, the decimal one is
        assert_ne!(ExactRational::try_from_f64(0.1).unwrap(), r(1, 10));
        assert_eq!(ExactRational::from_decimal_f64(0.1).unwrap(), r(1, 10));
        assert_eq!(ExactRational::from_decimal_f64(79.02).unwrap(), r(7902, 100));
        assert_eq!(ExactRational::try_from_f64(-0.5).unwrap(), r(-1, 2));
    }

    #[test]
    fn test_parse() {
        assert_eq!("-3/4".parse::<ExactRational>().unwrap(), r(-3, 4));
        assert_eq!(" 6 / 8 ".parse::<ExactRational>().unwrap(), r(3, 4));
        assert_eq!("12.5".parse::<ExactRational>().unwrap(), r(25, 2));
        assert_eq!("-0.25".parse::<ExactRational>().unwrap(), r(-1, 4));
        assert_eq!("+7".parse::<ExactRational>().unwrap(), r(7, 1));
        assert_eq!(".5".parse::<ExactRational>().unwrap(), r(1, 2));
        assert_eq!("1e-3".parse::<ExactRational>().unwrap(), r(1, 1000));
        assert_eq!("2.5E2".parse::<ExactRational>().unwrap(), r(250, 1));
        assert_eq!(r(-3, 4).to_string(), "-3/4");
        assert_eq!(r(4, 2).to_string(), "2");
    }

    #[test]
    fn test_arithmetic() {
        let one = ExactRational::one();
        assert_eq!(&one + &one, r(2, 1));
        assert_eq!(one.clone() - one.clone(), ExactRational::zero());
        assert_eq!(r(1, 2) * r(2, 3), r(1, 3));
        assert_eq!(r(1, 1) / r(2, 1), r(1, 2));
        assert_eq!(-r(1, 2), r(-1, 2));
        assert_eq!(r(-1, 2).abs(), r(1, 2));
        assert_eq!(r(2, 1).invert().unwrap(), r(1, 2));
        assert_eq!(r(-1, 2).invert().unwrap(), r(-2, 1));
        assert_eq!(ExactRational::zero().invert(), Err(RationalError::DivideByZero));
        assert_eq!(
            one.checked_div(&ExactRational::zero()),
            Err(RationalError::DivideByZero)
        );
        let total: ExactRational = [r(1, 2), r(1, 3), r(1, 6)].iter().sum();
        assert_eq!(total, one);
    }

    #[test]
    fn test_ordering() {
        assert!(r(1, 1) < r(2, 1));
        assert!(!(r(2, 1) < r(1, 1)));
        assert!(r(1, 1) <= r(1, 1));
        assert!(r(-1, 3) > r(-1, 2));
        assert!(r(1, 1) != r(2, 1));
        let mut values = vec![r(3, 2), r(1, 4), r(-5, 4)];
        values.sort();
        assert_eq!(values, vec![r(-5, 4), r(1, 4), r(3, 2)]);
        // no drift when accumulating values with no exact binary form
        let tenths: ExactRational = (0..10).map(|_| r(1, 10)).sum();
        assert_eq!(tenths, ExactRational::one());
    }
}
