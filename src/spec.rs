//! The immutable command/option/positional specifications.

use thiserror::Error;

use crate::model::AccumulationMode;

mod command;
mod option;
mod positional;

pub use command::{CommandBuilder, CommandSpec};
pub use option::{OptionBuilder, OptionSpec};
pub use positional::PositionalSpec;

/// The errors raised while constructing a specification.
///
/// Every specification node validates its invariants when built; a node that
/// exists is well-formed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    /// Two parameters within one command share a name or long form.
    #[error("Cannot duplicate the parameter name '{0}'.")]
    DuplicateOptionName(String),

    /// Two options within one command share a short form.
    #[error("Cannot duplicate the short option '{0}'.")]
    DuplicateShortName(char),

    /// Two subcommands within one command share a name or alias.
    #[error("Cannot duplicate the subcommand name '{0}'.")]
    DuplicateSubcommandName(String),

    /// An option was declared without a name.
    #[error("Parameter name must not be empty.")]
    EmptyOptionName,

    /// A parameter name or long form violates the name grammar (leading
    /// dashes, `=`, whitespace, or too short).
    #[error("Invalid parameter name '{0}'.")]
    InvalidOptionName(String),

    /// A short form is not a single alphanumeric character.
    #[error("Invalid short option name '{0}'.")]
    InvalidShortName(String),

    /// A command name or alias violates the name grammar.
    #[error("Invalid command name '{0}'.")]
    InvalidCommandName(String),

    /// A negation form collides with a configured long name.
    #[error("Negation prefix '{prefix}' clashes with the long name '{long}'.")]
    ConflictingNegationPrefix {
        /// The offending prefix.
        prefix: String,
        /// The long name it collides with.
        long: String,
    },

    /// The arity bounds are inverted, or a value option was given the flag
    /// shape.
    #[error("Invalid arity (min={min}, max={max:?}).")]
    InvalidArity {
        /// The declared minimum.
        min: usize,
        /// The declared maximum, `None` meaning unbounded.
        max: Option<usize>,
    },

    /// The accumulation mode does not apply to the option's shape: flags
    /// cannot collect values, and only flags can count.
    #[error("Option '{name}' cannot use the accumulation mode {mode}.")]
    FlagAccumulationMismatch {
        /// The offending option.
        name: String,
        /// The rejected mode.
        mode: AccumulationMode,
    },

    /// More than one positional with an unbounded arity was declared.
    #[error("Cannot declare multiple unbounded positionals ('{first}' and '{second}').")]
    MultipleUnboundedPositionals {
        /// The first unbounded positional, in declaration order.
        first: String,
        /// The second unbounded positional.
        second: String,
    },

    /// Negation prefixes were configured on an option whose constant is not
    /// a boolean (or which is not a flag at all).
    #[error("Negation prefixes require a boolean flag constant on '{0}'.")]
    NegationOnNonBooleanFlag(String),

    /// A reserved token (`--`) was used as a name.
    #[error("'{0}' is reserved and cannot be used as a name.")]
    ReservedToken(String),
}
