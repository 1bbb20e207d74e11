//! `argot` is a syntactic command line argument parser.
//!
//! Given a sequence of raw tokens and a declarative command specification,
//! `argot` produces an immutable parse tree of options, positionals,
//! subcommands, and trailing extras.  It is deliberately *only* the syntax
//! layer: no type conversion, no defaults, no validation beyond the grammar,
//! no help rendering, no dispatch.  Those concerns belong to the caller,
//! which gets a fully resolved tree to traverse.
//!
//! What the syntax layer does cover, it covers completely:
//! * Long (`--name`) and short (`-n`) options, including `--name=value`
//!   inline forms and short-option clusters (`-abc`, `-n5`, `-n=5`).
//! * Arity ranges per option and positional, from flags to unbounded
//!   greedy captures.
//! * Five accumulation modes for repeated options: last-wins, first-wins,
//!   error, collect, and count.
//! * Abbreviation matching with ambiguity detection, configurable case
//!   sensitivity, and underscore/dash equivalence.
//! * Boolean flag negation (`--no-verbose`) and `--flag=yes` style values
//!   against configurable truthy/falsey sets.
//! * Negative number disambiguation (`-1` as a value, not an option).
//! * Strict (POSIX) vs. interleaved (GNU) option ordering, the `--`
//!   separator with per-command trailing capture, and an implicit
//!   catch-all positional.
//! * Arbitrarily nested subcommands, each with its own configuration
//!   inherited from its parent unless overridden.
//!
//! # Usage
//!
//! Build the specification once, then parse any number of token sequences:
//!
//! ```
//! use argot::{Arity, CommandSpec, OptionSpec, Parser, PositionalSpec, Value};
//!
//! let deploy = CommandSpec::named("deploy")
//!     .option(OptionSpec::value("region", Arity::EXACTLY_ONE).build().unwrap())
//!     .positional(PositionalSpec::new("env", Arity::EXACTLY_ONE).unwrap())
//!     .build()
//!     .unwrap();
//! let spec = CommandSpec::named("deploy-tool")
//!     .option(OptionSpec::flag("verbose").short('v').build().unwrap())
//!     .subcommand(deploy)
//!     .build()
//!     .unwrap();
//!
//! let parser = Parser::new(spec);
//! let result = parser
//!     .parse(&["--verbose", "deploy", "--region=us-east-1", "prod"])
//!     .unwrap();
//!
//! assert_eq!(result.option("verbose").unwrap().value(), &Value::Bool(true));
//!
//! let deploy = result.subcommand().unwrap();
//! assert_eq!(
//!     deploy.option("region").unwrap().value(),
//!     &Value::Str("us-east-1".to_string())
//! );
//! assert_eq!(
//!     deploy.positional("env").unwrap().value(),
//!     &Value::Str("prod".to_string())
//! );
//! ```
//!
//! # Errors
//!
//! Problems split into two disjoint taxonomies.  [`SpecError`] covers the
//! construction of specifications: a [`CommandSpec`], [`OptionSpec`], or
//! [`PositionalSpec`] that exists has already had its invariants checked.
//! [`ParseError`] covers everything a token sequence can do wrong, with the
//! offending token, its index, and the candidate lists needed to render a
//! useful message downstream.  A parse either returns one tree or one error;
//! there are no partial results.
//!
//! # Threading
//!
//! Specifications and configurations are immutable after construction and
//! freely shareable across threads.  [`Parser::parse`] keeps its state on
//! the stack; one parser may serve concurrent calls.
//!
//! # Features
//! * `debug`: internal `tracing` events from the parse engine.
#![deny(missing_docs)]

mod config;
mod constant;
mod model;
mod parser;
mod spec;

pub use config::ParserConfig;
pub use model::{AccumulationMode, Arity, Value};
pub use parser::{ParseError, ParseResult, ParsedOption, ParsedPositional, Parser};
pub use spec::{
    CommandBuilder, CommandSpec, OptionBuilder, OptionSpec, PositionalSpec, SpecError,
};
