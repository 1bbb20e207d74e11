use crate::spec::SpecError;

/// Describes the number of values an option or positional consumes.
///
/// An arity is a `min..=max` range where the upper bound may be absent, meaning
/// the parameter consumes greedily.  The usual shapes are provided as
/// constants, inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
///
/// ### Example
/// ```
/// use argot::Arity;
///
/// assert_eq!(Arity::EXACTLY_ONE, Arity::new(1, Some(1)).unwrap());
/// assert_eq!(Arity::ONE_OR_MORE, Arity::new(1, None).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    min: usize,
    max: Option<usize>,
}

impl Arity {
    /// No values (the flag shape).
    pub const ZERO: Arity = Arity {
        min: 0,
        max: Some(0),
    };

    /// `?`: zero or one value.
    pub const ZERO_OR_ONE: Arity = Arity {
        min: 0,
        max: Some(1),
    };

    /// Precisely one value.
    pub const EXACTLY_ONE: Arity = Arity {
        min: 1,
        max: Some(1),
    };

    /// `*`: any number of values, including zero; captured greedily.
    pub const ZERO_OR_MORE: Arity = Arity { min: 0, max: None };

    /// `+`: at least one value; captured greedily.
    pub const ONE_OR_MORE: Arity = Arity { min: 1, max: None };

    /// Create a custom arity range.  `max: None` means unbounded.
    pub fn new(min: usize, max: Option<usize>) -> Result<Self, SpecError> {
        if let Some(upper) = max {
            if min > upper {
                return Err(SpecError::InvalidArity { min, max });
            }
        }

        Ok(Self { min, max })
    }

    /// The minimum number of values.
    pub fn min(&self) -> usize {
        self.min
    }

    /// The maximum number of values, or `None` when unbounded.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.max == Some(0)
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(upper) => write!(f, "{}..={}", self.min, upper),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// The policy for reconciling repeated occurrences of the same option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulationMode {
    /// Keep the most recent value; earlier occurrences still count.
    LastWins,
    /// Keep the first value; later occurrences still count.
    FirstWins,
    /// Reject the second occurrence outright.
    ErrorOnDuplicate,
    /// Concatenate the values of every occurrence, in input order.
    Collect,
    /// Ignore values; the result is the occurrence count.  Flags only.
    Count,
}

impl std::fmt::Display for AccumulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A parsed value attached to an option or positional in the parse tree.
///
/// The shape follows from the parameter's arity and accumulation mode: flags
/// produce [`Value::Bool`], `Count` accumulation produces [`Value::Count`],
/// single-value parameters produce [`Value::Str`], and everything else
/// produces [`Value::List`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A flag state.
    Bool(bool),
    /// An occurrence count.
    Count(usize),
    /// A single raw token value.
    Str(String),
    /// An ordered sequence of values.
    List(Vec<Value>),
}

impl Value {
    /// The flag state, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(state) => Some(*state),
            _ => None,
        }
    }

    /// The occurrence count, if this is a [`Value::Count`].
    pub fn as_count(&self) -> Option<usize> {
        match self {
            Value::Count(count) => Some(*count),
            _ => None,
        }
    }

    /// The raw token, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// The sequence, if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn from_tokens<I: IntoIterator<Item = S>, S: Into<String>>(tokens: I) -> Value {
        Value::List(
            tokens
                .into_iter()
                .map(|token| Value::Str(token.into()))
                .collect(),
        )
    }
}
