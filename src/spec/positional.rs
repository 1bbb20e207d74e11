use crate::constant::COMMAND_NAME;
use crate::model::{Arity, Value};
use crate::spec::SpecError;

/// Specification for a positional parameter.
///
/// Positionals are matched by position, in declaration order.  A positional
/// with [`Arity::EXACTLY_ONE`](crate::Arity::EXACTLY_ONE) binds a single
/// [`Value::Str`](crate::Value::Str); every other arity binds a
/// [`Value::List`](crate::Value::List).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSpec {
    name: String,
    arity: Arity,
}

impl PositionalSpec {
    /// Validate and freeze a positional specification.
    pub fn new(name: impl Into<String>, arity: Arity) -> Result<Self, SpecError> {
        let name = name.into();

        if name.is_empty() {
            return Err(SpecError::EmptyOptionName);
        }

        if !COMMAND_NAME.is_match(&name) {
            return Err(SpecError::InvalidOptionName(name));
        }

        Ok(Self { name, arity })
    }

    /// The parameter name, used to key the positional in the parse tree.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of values this positional binds.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub(crate) fn bind(&self, values: Vec<String>) -> Value {
        if self.arity == Arity::EXACTLY_ONE {
            let mut values = values;
            Value::Str(values.remove(0))
        } else {
            Value::from_tokens(values)
        }
    }
}
