//! The parse engine and its result model.

use thiserror::Error;

use crate::config::ParserConfig;
use crate::spec::CommandSpec;

mod engine;
mod result;

pub use result::{ParseResult, ParsedOption, ParsedPositional};

/// The errors raised while parsing a token sequence.
///
/// Every variant carries the offending token and/or its index in the input
/// sequence, plus the responsible specification names where resolvable.  The
/// variant itself is the machine-readable tag; the rendered messages are
/// stable but not contractual.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The token does not resolve to any configured option.
    #[error("Unknown option '{name}' (token {index}).")]
    UnknownOption {
        /// The name as typed, stripped of dashes.
        name: String,
        /// The index of the offending token.
        index: usize,
    },

    /// An abbreviation prefixes more than one option.
    #[error("Ambiguous option '{name}': matches {candidates:?} (token {index}).")]
    AmbiguousOption {
        /// The abbreviation as typed.
        name: String,
        /// Every matching long form, in declaration order.
        candidates: Vec<String>,
        /// The index of the offending token.
        index: usize,
    },

    /// A second occurrence of an option accumulating with
    /// [`ErrorOnDuplicate`](crate::AccumulationMode::ErrorOnDuplicate).
    #[error("Option '{name}' cannot be specified multiple times (token {index}).")]
    OptionRepeated {
        /// The canonical option name.
        name: String,
        /// The index of the repeated occurrence.
        index: usize,
    },

    /// A value was attached to an option that takes none.
    #[error("Option '{name}' does not accept a value (token {index}).")]
    OptionDoesNotAcceptValue {
        /// The name as typed.
        name: String,
        /// The index of the offending token.
        index: usize,
    },

    /// A value was attached to a flag while `allow_equals_for_flags` is off.
    #[error("Flag '{name}' cannot take a value (token {index}).")]
    FlagWithValue {
        /// The name as typed.
        name: String,
        /// The index of the offending token.
        index: usize,
    },

    /// A flag value is in neither the truthy nor the falsey set.
    #[error("Invalid value '{value}' for flag '{name}' (token {index}).")]
    InvalidFlagValue {
        /// The name as typed.
        name: String,
        /// The rejected value.
        value: String,
        /// The index of the offending token.
        index: usize,
    },

    /// Fewer values than the option's minimum arity were available.
    #[error(
        "Not enough values for option '{name}': expected at least {expected}, found {provided} (token {index})."
    )]
    InsufficientOptionValues {
        /// The canonical option name.
        name: String,
        /// The minimum arity.
        expected: usize,
        /// The number of values actually collected.
        provided: usize,
        /// The index of the option token.
        index: usize,
    },

    /// The token was required to name a subcommand but matches none.
    #[error("Unknown subcommand '{name}' (token {index}).")]
    UnknownSubcommand {
        /// The token as typed.
        name: String,
        /// The declared subcommand names, in declaration order.
        candidates: Vec<String>,
        /// The index of the offending token.
        index: usize,
    },

    /// An abbreviation prefixes more than one subcommand.
    #[error("Ambiguous subcommand '{name}': matches {candidates:?} (token {index}).")]
    AmbiguousSubcommand {
        /// The abbreviation as typed.
        name: String,
        /// Every matching name or alias, in declaration order.
        candidates: Vec<String>,
        /// The index of the offending token.
        index: usize,
    },

    /// Fewer positional tokens than the summed minimum arities were collected.
    #[error(
        "Not enough positional arguments for '{name}': expected at least {expected}, found {provided}."
    )]
    InsufficientPositionalArguments {
        /// The first unsatisfied positional, in declaration order.
        name: String,
        /// Its minimum arity.
        expected: usize,
        /// The number of tokens left for it.
        provided: usize,
    },

    /// A positional token was left over after every specification filled up.
    #[error("Unexpected positional argument '{value}' for command '{command}'.")]
    UnexpectedPositionalArgument {
        /// The leftover token.
        value: String,
        /// The command it could not be placed under.
        command: String,
    },

    /// The effective configuration for a command proved inconsistent.
    #[error("Invalid parser configuration: {reason}.")]
    InvalidConfiguration {
        /// What is wrong with the configuration.
        reason: String,
    },
}

/// The parser: a command specification paired with a configuration.
///
/// A `Parser` is immutable and reusable; [`Parser::parse`] holds no state
/// between calls and may run concurrently from multiple threads.
///
/// ### Example
/// ```
/// use argot::{CommandSpec, OptionSpec, Parser};
///
/// let spec = CommandSpec::named("tool")
///     .option(OptionSpec::flag("verbose").short('v').build().unwrap())
///     .build()
///     .unwrap();
/// let parser = Parser::new(spec);
///
/// let result = parser.parse(&["-v"]).unwrap();
/// assert!(result.option("verbose").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    spec: CommandSpec,
    config: ParserConfig,
}

impl Parser {
    /// Create a parser with the default configuration.
    pub fn new(spec: CommandSpec) -> Self {
        Self::with_config(spec, ParserConfig::default())
    }

    /// Create a parser with an explicit configuration.  A configuration
    /// override on the root specification still takes precedence.
    pub fn with_config(spec: CommandSpec, config: ParserConfig) -> Self {
        Self { spec, config }
    }

    /// The root command specification.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// The base configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a token sequence into a tree, or fail with the first error.
    ///
    /// The tokens are expected to be pre-split and to exclude the program
    /// name.  The input is never mutated; the result owns its data.
    pub fn parse<T: AsRef<str>>(&self, tokens: &[T]) -> Result<ParseResult, ParseError> {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        engine::run(&self.spec, &self.config, &tokens)
    }
}
