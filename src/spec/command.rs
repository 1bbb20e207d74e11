use crate::config::ParserConfig;
use crate::constant::{COMMAND_NAME, SEPARATOR};
use crate::parser::ParseError;
use crate::spec::{OptionSpec, PositionalSpec, SpecError};

/// Specification for a command or subcommand.
///
/// A `CommandSpec` is the root of the declarative model: it owns its options,
/// positionals, and nested subcommands, and precomputes the name tables used
/// for resolution during parsing.  All cross-parameter invariants are checked
/// by [`CommandBuilder::build`]; a spec that exists is internally consistent.
///
/// ### Example
/// ```
/// use argot::{Arity, CommandSpec, OptionSpec, PositionalSpec};
///
/// let deploy = CommandSpec::named("deploy")
///     .option(OptionSpec::value("region", Arity::EXACTLY_ONE).build().unwrap())
///     .positional(PositionalSpec::new("env", Arity::EXACTLY_ONE).unwrap())
///     .build()
///     .unwrap();
/// let root = CommandSpec::named("deploy-tool")
///     .option(OptionSpec::flag("verbose").short('v').build().unwrap())
///     .subcommand(deploy)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    options: Vec<OptionSpec>,
    positionals: Vec<PositionalSpec>,
    subcommands: Vec<CommandSpec>,
    config: Option<ParserConfig>,
    long_entries: Vec<LongEntry>,
    short_entries: Vec<(char, usize)>,
    sub_entries: Vec<SubEntry>,
}

/// One row of the long-name resolution table.  Negation forms are expanded
/// eagerly, directly after the long name they negate.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LongEntry {
    name: String,
    option: usize,
    negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SubEntry {
    name: String,
    subcommand: usize,
    alias: bool,
}

/// A resolved long-form occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LongMatch {
    pub(crate) option: usize,
    pub(crate) negated: bool,
}

impl CommandSpec {
    /// Start building a command specification.
    pub fn named(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            aliases: Vec::default(),
            options: Vec::default(),
            positionals: Vec::default(),
            subcommands: Vec::default(),
            config: None,
        }
    }

    /// The canonical command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The command aliases, in declaration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The option specifications, in declaration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// The positional specifications, in declaration order.
    pub fn positionals(&self) -> &[PositionalSpec] {
        &self.positionals
    }

    /// The nested subcommand specifications, in declaration order.
    pub fn subcommands(&self) -> &[CommandSpec] {
        &self.subcommands
    }

    /// The configuration override for this command's subtree, if any.
    pub fn config(&self) -> Option<&ParserConfig> {
        self.config.as_ref()
    }

    pub(crate) fn subcommand_names(&self) -> Vec<String> {
        self.subcommands
            .iter()
            .map(|subcommand| subcommand.name.clone())
            .collect()
    }

    pub(crate) fn positional_min_sum(&self) -> usize {
        self.positionals
            .iter()
            .map(|positional| positional.arity().min())
            .sum()
    }

    /// Resolve a long-form name (stripped of dashes and any inline value).
    ///
    /// Exact matches win; then negation forms; then, when enabled,
    /// abbreviations with ambiguity detection across the candidates in
    /// declaration order.
    pub(crate) fn resolve_long(
        &self,
        name: &str,
        config: &ParserConfig,
        index: usize,
    ) -> Result<LongMatch, ParseError> {
        let search = normalize_long(name, config);

        let exact: Vec<&LongEntry> = self
            .long_entries
            .iter()
            .filter(|entry| normalize_long(&entry.name, config) == search)
            .collect();

        if let Some(first) = exact.first() {
            if exact
                .iter()
                .any(|entry| entry.option != first.option || entry.negated != first.negated)
            {
                return Err(ParseError::InvalidConfiguration {
                    reason: format!("normalization makes the option '{name}' ambiguous"),
                });
            }

            return Ok(LongMatch {
                option: first.option,
                negated: first.negated,
            });
        }

        if config.allow_abbreviations && name.chars().count() >= config.abbreviation_min_length {
            let candidates: Vec<&LongEntry> = self
                .long_entries
                .iter()
                .filter(|entry| normalize_long(&entry.name, config).starts_with(&search))
                .collect();

            if let Some(first) = candidates.first() {
                if candidates
                    .iter()
                    .all(|entry| entry.option == first.option && entry.negated == first.negated)
                {
                    return Ok(LongMatch {
                        option: first.option,
                        negated: first.negated,
                    });
                }

                return Err(ParseError::AmbiguousOption {
                    name: name.to_string(),
                    candidates: dedup_names(&candidates),
                    index,
                });
            }
        }

        Err(ParseError::UnknownOption {
            name: name.to_string(),
            index,
        })
    }

    /// Resolve a short-form character.  Abbreviation does not apply.
    pub(crate) fn resolve_short(
        &self,
        short: char,
        config: &ParserConfig,
        index: usize,
    ) -> Result<usize, ParseError> {
        self.short_entries
            .iter()
            .find(|(registered, _)| {
                if config.case_sensitive_short {
                    *registered == short
                } else {
                    registered.eq_ignore_ascii_case(&short)
                }
            })
            .map(|(_, option)| *option)
            .ok_or_else(|| ParseError::UnknownOption {
                name: short.to_string(),
                index,
            })
    }

    pub(crate) fn short_registered(&self, short: char, config: &ParserConfig) -> bool {
        self.resolve_short(short, config, 0).is_ok()
    }

    /// Resolve a token against the subcommand names (and aliases, when
    /// enabled).  `Ok(None)` means the token is not a subcommand; ambiguity
    /// under abbreviation is an error.
    pub(crate) fn resolve_subcommand(
        &self,
        token: &str,
        config: &ParserConfig,
        index: usize,
    ) -> Result<Option<usize>, ParseError> {
        let search = normalize_subcommand(token, config);
        let entries: Vec<&SubEntry> = self
            .sub_entries
            .iter()
            .filter(|entry| config.allow_aliases || !entry.alias)
            .collect();

        let exact: Vec<&&SubEntry> = entries
            .iter()
            .filter(|entry| normalize_subcommand(&entry.name, config) == search)
            .collect();

        if let Some(first) = exact.first() {
            if exact.iter().any(|entry| entry.subcommand != first.subcommand) {
                return Err(ParseError::InvalidConfiguration {
                    reason: format!("normalization makes the subcommand '{token}' ambiguous"),
                });
            }

            return Ok(Some(first.subcommand));
        }

        if config.allow_abbreviations && token.chars().count() >= config.abbreviation_min_length {
            let candidates: Vec<&&SubEntry> = entries
                .iter()
                .filter(|entry| normalize_subcommand(&entry.name, config).starts_with(&search))
                .collect();

            if let Some(first) = candidates.first() {
                if candidates
                    .iter()
                    .all(|entry| entry.subcommand == first.subcommand)
                {
                    return Ok(Some(first.subcommand));
                }

                return Err(ParseError::AmbiguousSubcommand {
                    name: token.to_string(),
                    candidates: candidates
                        .iter()
                        .map(|entry| entry.name.clone())
                        .collect(),
                    index,
                });
            }
        }

        Ok(None)
    }
}

fn normalize_long(name: &str, config: &ParserConfig) -> String {
    let mut normalized = if config.normalize_underscores_to_dashes {
        name.replace('_', "-")
    } else {
        name.to_string()
    };

    if !config.case_sensitive_long {
        normalized.make_ascii_lowercase();
    }

    normalized
}

fn normalize_subcommand(name: &str, config: &ParserConfig) -> String {
    if config.case_sensitive_subcommands {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

fn dedup_names(entries: &[&LongEntry]) -> Vec<String> {
    let mut names: Vec<String> = Vec::default();

    for entry in entries {
        if !names.contains(&entry.name) {
            names.push(entry.name.clone());
        }
    }

    names
}

/// Builder for a [`CommandSpec`]; validates the cross-parameter invariants
/// and builds the resolution tables on [`CommandBuilder::build`].
#[derive(Debug)]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    options: Vec<OptionSpec>,
    positionals: Vec<PositionalSpec>,
    subcommands: Vec<CommandSpec>,
    config: Option<ParserConfig>,
}

impl CommandBuilder {
    /// Add a command alias.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(name.into());
        self
    }

    /// Add an option.  Declaration order drives ambiguity candidate lists.
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Add a positional.  Declaration order drives value grouping.
    pub fn positional(mut self, positional: PositionalSpec) -> Self {
        self.positionals.push(positional);
        self
    }

    /// Add a nested subcommand.
    pub fn subcommand(mut self, subcommand: CommandSpec) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Override the parser configuration for this command's subtree.
    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config.replace(config);
        self
    }

    /// Validate the invariants, build the name tables, and freeze.
    pub fn build(self) -> Result<CommandSpec, SpecError> {
        let Self {
            name,
            aliases,
            options,
            positionals,
            subcommands,
            config,
        } = self;

        for command_name in std::iter::once(&name).chain(aliases.iter()) {
            if command_name == SEPARATOR {
                return Err(SpecError::ReservedToken(command_name.clone()));
            }

            if !COMMAND_NAME.is_match(command_name) {
                return Err(SpecError::InvalidCommandName(command_name.clone()));
            }
        }

        // Canonical option names and positional names share one namespace.
        let mut parameter_names: Vec<&str> = Vec::default();

        for parameter_name in options
            .iter()
            .map(|option| option.name())
            .chain(positionals.iter().map(|positional| positional.name()))
        {
            if parameter_names.contains(&parameter_name) {
                return Err(SpecError::DuplicateOptionName(parameter_name.to_string()));
            }

            parameter_names.push(parameter_name);
        }

        let mut long_entries: Vec<LongEntry> = Vec::default();
        let mut short_entries: Vec<(char, usize)> = Vec::default();

        for (index, option) in options.iter().enumerate() {
            for long in option.long() {
                if long_entries
                    .iter()
                    .any(|entry| !entry.negated && &entry.name == long)
                {
                    return Err(SpecError::DuplicateOptionName(long.clone()));
                }

                long_entries.push(LongEntry {
                    name: long.clone(),
                    option: index,
                    negated: false,
                });

                for prefix in option.negation_prefixes() {
                    long_entries.push(LongEntry {
                        name: format!("{prefix}-{long}"),
                        option: index,
                        negated: true,
                    });
                }
            }

            for short in option.short() {
                if short_entries.iter().any(|(registered, _)| registered == short) {
                    return Err(SpecError::DuplicateShortName(*short));
                }

                short_entries.push((*short, index));
            }
        }

        // Negation forms must not shadow a real long name.
        for entry in long_entries.iter().filter(|entry| entry.negated) {
            if long_entries
                .iter()
                .any(|other| !other.negated && other.name == entry.name)
            {
                let prefix = options[entry.option]
                    .negation_prefixes()
                    .iter()
                    .find(|prefix| entry.name.starts_with(prefix.as_str()))
                    .expect("a negated entry derives from one of its option's prefixes")
                    .clone();

                return Err(SpecError::ConflictingNegationPrefix {
                    prefix,
                    long: entry.name.clone(),
                });
            }
        }

        let mut unbounded: Option<&PositionalSpec> = None;

        for positional in &positionals {
            if positional.arity().max().is_none() {
                if let Some(first) = unbounded {
                    return Err(SpecError::MultipleUnboundedPositionals {
                        first: first.name().to_string(),
                        second: positional.name().to_string(),
                    });
                }

                unbounded.replace(positional);
            }
        }

        let mut sub_entries: Vec<SubEntry> = Vec::default();

        for (index, subcommand) in subcommands.iter().enumerate() {
            for (sub_name, alias) in std::iter::once((&subcommand.name, false)).chain(
                subcommand
                    .aliases
                    .iter()
                    .map(|sub_alias| (sub_alias, true)),
            ) {
                if sub_entries.iter().any(|entry| &entry.name == sub_name) {
                    return Err(SpecError::DuplicateSubcommandName(sub_name.clone()));
                }

                sub_entries.push(SubEntry {
                    name: sub_name.clone(),
                    subcommand: index,
                    alias,
                });
            }
        }

        Ok(CommandSpec {
            name,
            aliases,
            options,
            positionals,
            subcommands,
            config,
            long_entries,
            short_entries,
            sub_entries,
        })
    }
}
