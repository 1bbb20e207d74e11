use crate::constant::LONG_NAME;
use crate::model::{AccumulationMode, Arity, Value};
use crate::spec::SpecError;

/// Specification for a named option (`--name` / `-n`).
///
/// An `OptionSpec` is immutable once built.  Construction starts from one of
/// the two shapes, [`OptionSpec::flag`] or [`OptionSpec::value`], and runs
/// through an [`OptionBuilder`].
///
/// ### Example
/// ```
/// use argot::{AccumulationMode, Arity, OptionSpec};
///
/// let verbose = OptionSpec::flag("verbose")
///     .short('v')
///     .accumulation(AccumulationMode::Count)
///     .build()
///     .unwrap();
/// let region = OptionSpec::value("region", Arity::EXACTLY_ONE)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    name: String,
    long: Vec<String>,
    short: Vec<char>,
    arity: Arity,
    accumulation: AccumulationMode,
    is_flag: bool,
    negation_prefixes: Vec<String>,
    flag_const: Value,
    flatten_values: bool,
}

impl OptionSpec {
    /// Start a flag option: arity zero, value [`Value::Bool`] (or the
    /// configured constant) on occurrence.
    ///
    /// When `name` has more than one character it doubles as the long form;
    /// a single-character name doubles as the short form.
    pub fn flag(name: impl Into<String>) -> OptionBuilder {
        OptionBuilder::new(name.into(), Arity::ZERO, true)
    }

    /// Start a value-consuming option with the given arity.
    ///
    /// The zero arity is rejected at [`OptionBuilder::build`]; use
    /// [`OptionSpec::flag`] for that shape.
    pub fn value(name: impl Into<String>, arity: Arity) -> OptionBuilder {
        OptionBuilder::new(name.into(), arity, false)
    }

    /// The canonical option name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The long forms, in declaration order.
    pub fn long(&self) -> &[String] {
        &self.long
    }

    /// The short forms, in declaration order.
    pub fn short(&self) -> &[char] {
        &self.short
    }

    /// The number of values this option consumes per occurrence.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// The policy for repeated occurrences.
    pub fn accumulation(&self) -> AccumulationMode {
        self.accumulation
    }

    /// Whether this option is a flag (arity zero).
    pub fn is_flag(&self) -> bool {
        self.is_flag
    }

    /// The negation prefixes (ex: `no` enables `--no-verbose`).
    pub fn negation_prefixes(&self) -> &[String] {
        &self.negation_prefixes
    }

    /// The value recorded when the flag appears without `=value`.
    pub fn flag_const(&self) -> &Value {
        &self.flag_const
    }

    /// Whether collected multi-value occurrences are flattened one level.
    pub fn flatten_values(&self) -> bool {
        self.flatten_values
    }
}

/// Builder for an [`OptionSpec`]; validates and freezes on [`OptionBuilder::build`].
#[derive(Debug)]
pub struct OptionBuilder {
    name: String,
    long: Vec<String>,
    short: Vec<char>,
    arity: Arity,
    accumulation: AccumulationMode,
    is_flag: bool,
    negation_prefixes: Vec<String>,
    flag_const: Value,
    flatten_values: bool,
}

impl OptionBuilder {
    fn new(name: String, arity: Arity, is_flag: bool) -> Self {
        Self {
            name,
            long: Vec::default(),
            short: Vec::default(),
            arity,
            accumulation: AccumulationMode::LastWins,
            is_flag,
            negation_prefixes: Vec::default(),
            flag_const: Value::Bool(true),
            flatten_values: false,
        }
    }

    /// Add a long form beyond the default derived from the name.
    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.long.push(name.into());
        self
    }

    /// Add a short form.
    pub fn short(mut self, name: char) -> Self {
        self.short.push(name);
        self
    }

    /// Set the policy for repeated occurrences.
    pub fn accumulation(mut self, mode: AccumulationMode) -> Self {
        self.accumulation = mode;
        self
    }

    /// Add a negation prefix.  Flags with a boolean constant only.
    pub fn negation_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.negation_prefixes.push(prefix.into());
        self
    }

    /// Set the value recorded when the flag appears bare.  Flags only.
    pub fn flag_const(mut self, value: Value) -> Self {
        self.flag_const = value;
        self
    }

    /// Flatten collected multi-value occurrences one level.
    pub fn flatten_values(mut self) -> Self {
        self.flatten_values = true;
        self
    }

    /// Validate the invariants and freeze the specification.
    pub fn build(self) -> Result<OptionSpec, SpecError> {
        let Self {
            name,
            mut long,
            mut short,
            arity,
            accumulation,
            is_flag,
            negation_prefixes,
            flag_const,
            flatten_values,
        } = self;

        if name.is_empty() {
            return Err(SpecError::EmptyOptionName);
        }

        let single_char_name = name.chars().count() == 1;

        if !single_char_name && !LONG_NAME.is_match(&name) {
            return Err(SpecError::InvalidOptionName(name));
        }

        // A bare name doubles as its own long (or short) form.
        if long.is_empty() && short.is_empty() {
            if single_char_name {
                short.push(name.chars().next().expect("name is non-empty"));
            } else {
                long.push(name.clone());
            }
        }

        for long_name in &long {
            if long_name.is_empty() {
                return Err(SpecError::EmptyOptionName);
            }

            if !LONG_NAME.is_match(long_name) {
                return Err(SpecError::InvalidOptionName(long_name.clone()));
            }
        }

        for (index, long_name) in long.iter().enumerate() {
            if long[..index].contains(long_name) {
                return Err(SpecError::DuplicateOptionName(long_name.clone()));
            }
        }

        for short_name in &short {
            if !short_name.is_ascii_alphanumeric() {
                return Err(SpecError::InvalidShortName(short_name.to_string()));
            }
        }

        for (index, short_name) in short.iter().enumerate() {
            if short[..index].contains(short_name) {
                return Err(SpecError::DuplicateShortName(*short_name));
            }
        }

        if !is_flag && arity.is_zero() {
            return Err(SpecError::InvalidArity {
                min: arity.min(),
                max: arity.max(),
            });
        }

        let mode_mismatch = if is_flag {
            accumulation == AccumulationMode::Collect
        } else {
            accumulation == AccumulationMode::Count
        };

        if mode_mismatch {
            return Err(SpecError::FlagAccumulationMismatch {
                name,
                mode: accumulation,
            });
        }

        if !negation_prefixes.is_empty() {
            let negatable = is_flag && matches!(flag_const, Value::Bool(_));

            if !negatable {
                return Err(SpecError::NegationOnNonBooleanFlag(name));
            }

            for prefix in &negation_prefixes {
                let valid = match prefix.chars().count() {
                    0 => false,
                    1 => prefix.chars().all(|single| single.is_ascii_alphanumeric()),
                    _ => LONG_NAME.is_match(prefix),
                };

                if !valid {
                    return Err(SpecError::InvalidOptionName(prefix.clone()));
                }
            }
        }

        Ok(OptionSpec {
            name,
            long,
            short,
            arity,
            accumulation,
            is_flag,
            negation_prefixes,
            flag_const,
            flatten_values,
        })
    }
}
