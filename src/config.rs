use regex::Regex;

use crate::constant::*;
use crate::parser::ParseError;

/// The knobs controlling parser behavior.
///
/// A configuration applies to a whole command tree: subcommands inherit the
/// configuration of their parent unless their [`CommandSpec`](crate::CommandSpec)
/// carries an override.  The record is plain data; it is checked for
/// consistency when a parse begins, surfacing problems as
/// [`ParseError::InvalidConfiguration`].
///
/// ### Example
/// ```
/// use argot::ParserConfig;
///
/// let config = ParserConfig {
///     allow_abbreviations: true,
///     abbreviation_min_length: 2,
///     ..ParserConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Enable prefix matching for long options and subcommands
    /// (ex: `--verb` matches `--verbose`).
    pub allow_abbreviations: bool,
    /// Minimum typed length for an abbreviation to be considered.  Shorter
    /// inputs are unknown, never ambiguous.  Must be at least 1.
    pub abbreviation_min_length: usize,
    /// Match long option names byte-for-byte.  When cleared, ASCII case is
    /// folded; non-ASCII characters are compared as-is.
    pub case_sensitive_long: bool,
    /// Match short option characters byte-for-byte.
    pub case_sensitive_short: bool,
    /// Match subcommand names and aliases byte-for-byte.
    pub case_sensitive_subcommands: bool,
    /// Treat `_` and `-` as equivalent in long option names
    /// (ex: `--foo_bar` matches `--foo-bar`).
    pub normalize_underscores_to_dashes: bool,
    /// POSIX-style ordering: once a positional has been collected, later
    /// option-looking tokens are positionals.
    pub strict_option_order: bool,
    /// GNU-style ordering: options may appear between positionals.  Clearing
    /// this is equivalent to setting `strict_option_order`.
    pub allow_interleaved_options: bool,
    /// Treat tokens like `-1` or `-3.14` as values rather than short option
    /// clusters.  A registered short option always wins over this.
    pub allow_negative_numbers: bool,
    /// Custom pattern for negative number detection.  `None` uses the builtin
    /// pattern (integers, decimals, scientific notation).
    pub negative_number_pattern: Option<String>,
    /// Allow `--flag=value` against the truthy/falsey sets.
    pub allow_equals_for_flags: bool,
    /// Values that set a flag to `true` under `allow_equals_for_flags`,
    /// matched ASCII-case-insensitively.
    pub truthy_values: Vec<String>,
    /// Values that set a flag to `false` under `allow_equals_for_flags`,
    /// matched ASCII-case-insensitively.
    pub falsey_values: Vec<String>,
    /// Match subcommand aliases in addition to canonical names.
    pub allow_aliases: bool,
    /// When a command declares no positionals, capture stray tokens under a
    /// synthesized unbounded positional named `args` instead of erroring.
    pub implicit_catch_all_positional: bool,
    /// Prefer the positional interpretation for a token that fails subcommand
    /// resolution once positionals have started.
    pub stop_at_unknown_subcommand: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            allow_abbreviations: false,
            abbreviation_min_length: 3,
            case_sensitive_long: true,
            case_sensitive_short: true,
            case_sensitive_subcommands: true,
            normalize_underscores_to_dashes: true,
            strict_option_order: false,
            allow_interleaved_options: true,
            allow_negative_numbers: false,
            negative_number_pattern: None,
            allow_equals_for_flags: false,
            truthy_values: DEFAULT_TRUTHY_VALUES.map(String::from).to_vec(),
            falsey_values: DEFAULT_FALSEY_VALUES.map(String::from).to_vec(),
            allow_aliases: true,
            implicit_catch_all_positional: true,
            stop_at_unknown_subcommand: true,
        }
    }
}

impl ParserConfig {
    pub(crate) fn validate(&self) -> Result<(), ParseError> {
        if self.abbreviation_min_length < 1 {
            return Err(ParseError::InvalidConfiguration {
                reason: "abbreviation_min_length must be at least 1".to_string(),
            });
        }

        Self::check_flag_values("truthy_values", &self.truthy_values)?;
        Self::check_flag_values("falsey_values", &self.falsey_values)?;

        for truthy in &self.truthy_values {
            if self
                .falsey_values
                .iter()
                .any(|falsey| falsey.eq_ignore_ascii_case(truthy))
            {
                return Err(ParseError::InvalidConfiguration {
                    reason: format!("'{truthy}' is both a truthy and a falsey value"),
                });
            }
        }

        if self.allow_negative_numbers {
            let _ = self.number_pattern()?;
        }

        Ok(())
    }

    fn check_flag_values(field: &str, values: &[String]) -> Result<(), ParseError> {
        if values.is_empty() {
            return Err(ParseError::InvalidConfiguration {
                reason: format!("{field} must not be empty"),
            });
        }

        if values.iter().any(String::is_empty) {
            return Err(ParseError::InvalidConfiguration {
                reason: format!("{field} must not contain empty strings"),
            });
        }

        Ok(())
    }

    pub(crate) fn number_pattern(&self) -> Result<Regex, ParseError> {
        let pattern = self
            .negative_number_pattern
            .as_deref()
            .unwrap_or(DEFAULT_NEGATIVE_NUMBER_PATTERN);
        let regex = Regex::new(pattern).map_err(|error| ParseError::InvalidConfiguration {
            reason: format!("invalid negative number pattern: {error}"),
        })?;

        if regex.is_match("") {
            return Err(ParseError::InvalidConfiguration {
                reason: "negative number pattern must not match the empty string".to_string(),
            });
        }

        Ok(regex)
    }

    pub(crate) fn strict_ordering(&self) -> bool {
        self.strict_option_order || !self.allow_interleaved_options
    }

    pub(crate) fn is_truthy(&self, value: &str) -> bool {
        self.truthy_values
            .iter()
            .any(|truthy| truthy.eq_ignore_ascii_case(value))
    }

    pub(crate) fn is_falsey(&self, value: &str) -> bool {
        self.falsey_values
            .iter()
            .any(|falsey| falsey.eq_ignore_ascii_case(value))
    }
}
