use num_bigint::BigInt;
use num_traits::Zero;
use std::fmt;
use std::str::FromStr;

pub type FixedInt = i64;

/// An integer literal or result. The representation is chosen once, when the
/// literal is read, and both operands of a binary operation must agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integer {
    Fixed(FixedInt),
    Big(BigInt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    MixedRepresentations,
    Overflow(&'static str),
    DivideByZero,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::MixedRepresentations => {
                write!(f, "cannot mix fixed-width and arbitrary-precision integers")
            }
            NumericError::Overflow(op) => write!(f, "fixed-width integer overflow in {}", op),
            NumericError::DivideByZero => write!(f, "cannot divide by zero!"),
        }
    }
}

type Result<T = Integer> = std::result::Result<T, NumericError>;

impl Integer {
    /// Reads a decimal literal, falling back to the arbitrary-precision form
    /// when it does not fit in a fixed-width integer.
    pub fn parse(digits: &str) -> Option<Self> {
        match FixedInt::from_str(digits) {
            Ok(x) => Some(Integer::Fixed(x)),
            Err(_) => BigInt::from_str(digits).ok().map(Integer::Big),
        }
    }

    pub fn zero() -> Self {
        Integer::Fixed(0)
    }

    pub fn one() -> Self {
        Integer::Fixed(1)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Integer::Fixed(x) => *x == 0,
            Integer::Big(x) => x.is_zero(),
        }
    }

    pub fn to_big(&self) -> Self {
        match self {
            Integer::Fixed(x) => Integer::Big(BigInt::from(*x)),
            Integer::Big(_) => self.clone(),
        }
    }

    pub fn as_fixed(&self) -> Option<FixedInt> {
        match self {
            Integer::Fixed(x) => Some(*x),
            Integer::Big(_) => None,
        }
    }

    pub fn add(&self, other: &Self) -> Result {
        match (self, other) {
            (Integer::Fixed(x), Integer::Fixed(y)) => x
                .checked_add(*y)
                .map(Integer::Fixed)
                .ok_or(NumericError::Overflow("+")),
            (Integer::Big(x), Integer::Big(y)) => Ok(Integer::Big(x + y)),
            _ => Err(NumericError::MixedRepresentations),
        }
    }

    pub fn sub(&self, other: &Self) -> Result {
        match (self, other) {
            (Integer::Fixed(x), Integer::Fixed(y)) => x
                .checked_sub(*y)
                .map(Integer::Fixed)
                .ok_or(NumericError::Overflow("-")),
            (Integer::Big(x), Integer::Big(y)) => Ok(Integer::Big(x - y)),
            _ => Err(NumericError::MixedRepresentations),
        }
    }

    pub fn mul(&self, other: &Self) -> Result {
        match (self, other) {
            (Integer::Fixed(x), Integer::Fixed(y)) => x
                .checked_mul(*y)
                .map(Integer::Fixed)
                .ok_or(NumericError::Overflow("*")),
            (Integer::Big(x), Integer::Big(y)) => Ok(Integer::Big(x * y)),
            _ => Err(NumericError::MixedRepresentations),
        }
    }

    /// Truncates toward zero, for both representations.
    pub fn div(&self, other: &Self) -> Result {
        if other.is_zero() {
            return Err(NumericError::DivideByZero);
        }
        match (self, other) {
            (Integer::Fixed(x), Integer::Fixed(y)) => x
                .checked_div(*y)
                .map(Integer::Fixed)
                .ok_or(NumericError::Overflow("/")),
            (Integer::Big(x), Integer::Big(y)) => Ok(Integer::Big(x / y)),
            _ => Err(NumericError::MixedRepresentations),
        }
    }

    pub fn lt(&self, other: &Self) -> Result<bool> {
        match (self, other) {
            (Integer::Fixed(x), Integer::Fixed(y)) => Ok(x < y),
            (Integer::Big(x), Integer::Big(y)) => Ok(x < y),
            _ => Err(NumericError::MixedRepresentations),
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integer::Fixed(x) => write!(f, "{}", x),
            Integer::Big(x) => write!(f, "{}", x),
        }
    }
}

impl From<FixedInt> for Integer {
    fn from(x: FixedInt) -> Self {
        Integer::Fixed(x)
    }
}
