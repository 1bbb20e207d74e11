use std::collections::HashMap;

use crate::config::ParserConfig;
use crate::constant::{CATCH_ALL_NAME, SEPARATOR};
use crate::model::{AccumulationMode, Value};
use crate::parser::{ParseError, ParseResult, ParsedOption, ParsedPositional};
use crate::spec::{CommandSpec, OptionSpec};

#[cfg(feature = "debug")]
use tracing::debug;

pub(crate) fn run(
    spec: &CommandSpec,
    config: &ParserConfig,
    tokens: &[&str],
) -> Result<ParseResult, ParseError> {
    parse_command(spec, config, tokens, 0, None)
}

/// One option accumulating across its occurrences.
#[derive(Debug)]
struct Accumulated {
    alias: String,
    value: Value,
    occurrences: usize,
}

/// Parse the tokens belonging to a single command level.
///
/// `base` is the absolute index of `tokens[0]` within the original input, so
/// that errors out of a subcommand's subtree still report input positions.
/// Entering a subcommand hands the entire tail to the recursive call; the
/// child result is stitched in and this level finalizes against the tokens
/// it consumed itself.
fn parse_command(
    spec: &CommandSpec,
    inherited: &ParserConfig,
    tokens: &[&str],
    base: usize,
    alias: Option<String>,
) -> Result<ParseResult, ParseError> {
    let config = spec.config().unwrap_or(inherited);
    config.validate()?;

    #[cfg(feature = "debug")]
    {
        debug!(
            "Parsing command '{name}' over {count} token(s).",
            name = spec.name(),
            count = tokens.len()
        );
    }

    let number_pattern = if config.allow_negative_numbers {
        Some(config.number_pattern()?)
    } else {
        None
    };
    let strict = config.strict_ordering();

    let mut accumulator: HashMap<String, Accumulated> = HashMap::default();
    let mut collected: Vec<String> = Vec::default();
    let mut extras: Vec<String> = Vec::default();
    let mut seen_positional = false;
    let mut trailing = false;
    let mut subcommand: Option<ParseResult> = None;

    let mut index = 0;
    while index < tokens.len() {
        let token = tokens[index];
        let absolute = base + index;

        if trailing {
            extras.push(token.to_string());
            index += 1;
            continue;
        }

        if token == SEPARATOR {
            trailing = true;
            index += 1;
            continue;
        }

        // Under strict ordering (or when no options exist at all), an
        // option-looking token after the first positional is a positional.
        let demoted = seen_positional && (strict || spec.options().is_empty());

        if token.starts_with("--") {
            if demoted {
                collected.push(token.to_string());
                index += 1;
                continue;
            }

            let consumed = parse_long(spec, config, &mut accumulator, tokens, index, base)?;
            index += 1 + consumed;
            continue;
        }

        if token.len() >= 2 && token.starts_with('-') {
            let first = token.chars().nth(1).expect("token has at least two bytes");
            let negative_number = number_pattern
                .as_ref()
                .map_or(false, |pattern| pattern.is_match(token))
                && !spec.short_registered(first, config);

            if !negative_number {
                if demoted {
                    collected.push(token.to_string());
                    index += 1;
                    continue;
                }

                let consumed = parse_cluster(spec, config, &mut accumulator, tokens, index, base)?;
                index += 1 + consumed;
                continue;
            }
        }

        let attempt_subcommand = !spec.subcommands().is_empty()
            && (!seen_positional || !config.stop_at_unknown_subcommand);

        if attempt_subcommand {
            if let Some(sub_index) = spec.resolve_subcommand(token, config, absolute)? {
                let sub_spec = &spec.subcommands()[sub_index];
                let sub_alias = (token != sub_spec.name()).then(|| token.to_string());

                #[cfg(feature = "debug")]
                {
                    debug!(
                        "Entering subcommand '{name}' at token {absolute}.",
                        name = sub_spec.name()
                    );
                }

                let child = parse_command(
                    sub_spec,
                    config,
                    &tokens[index + 1..],
                    base + index + 1,
                    sub_alias,
                )?;
                subcommand.replace(child);
                break;
            }

            if spec.positionals().is_empty() && !seen_positional {
                return Err(ParseError::UnknownSubcommand {
                    name: token.to_string(),
                    candidates: spec.subcommand_names(),
                    index: absolute,
                });
            }
        }

        collected.push(token.to_string());
        seen_positional = true;
        index += 1;
    }

    let positionals = group_positionals(collected, spec, config)?;
    let options = accumulator
        .into_iter()
        .map(|(name, accumulated)| {
            (
                name.clone(),
                ParsedOption::new(
                    name,
                    accumulated.alias,
                    accumulated.value,
                    accumulated.occurrences,
                ),
            )
        })
        .collect();

    Ok(ParseResult::new(
        spec.name().to_string(),
        alias,
        options,
        positionals,
        extras,
        subcommand.map(Box::new),
    ))
}

/// Parse a `--name[=value]` token.  Returns the number of extra tokens
/// consumed as option values.
fn parse_long(
    spec: &CommandSpec,
    config: &ParserConfig,
    accumulator: &mut HashMap<String, Accumulated>,
    tokens: &[&str],
    index: usize,
    base: usize,
) -> Result<usize, ParseError> {
    let token = tokens[index];
    let absolute = base + index;
    let body = &token[2..];
    let (name_part, inline) = match body.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (body, None),
    };

    if name_part.is_empty() {
        return Err(ParseError::UnknownOption {
            name: token.to_string(),
            index: absolute,
        });
    }

    let matched = spec.resolve_long(name_part, config, absolute)?;
    let option = &spec.options()[matched.option];

    if option.is_flag() {
        let value = match inline {
            Some(inline_value) => {
                flag_inline_value(config, name_part, &inline_value, matched.negated, absolute)?
            }
            None => flag_presence_value(option, matched.negated),
        };
        record(accumulator, option, name_part, value, absolute)?;
        return Ok(0);
    }

    let (value, consumed) = consume_values(spec, config, option, inline, tokens, index, base)?;
    record(accumulator, option, name_part, value, absolute)?;
    Ok(consumed)
}

/// Parse a `-abc` short-option cluster.  Flags may repeat within the
/// cluster; the first value-consuming option ends it, binding any attached
/// remainder as its first value.
fn parse_cluster(
    spec: &CommandSpec,
    config: &ParserConfig,
    accumulator: &mut HashMap<String, Accumulated>,
    tokens: &[&str],
    index: usize,
    base: usize,
) -> Result<usize, ParseError> {
    let token = tokens[index];
    let absolute = base + index;
    let body: Vec<char> = token.chars().skip(1).collect();
    let mut position = 0;

    while position < body.len() {
        let single = body[position];

        if single == '=' {
            return Err(ParseError::UnknownOption {
                name: token.to_string(),
                index: absolute,
            });
        }

        let option = &spec.options()[spec.resolve_short(single, config, absolute)?];
        let alias = single.to_string();
        let remainder: String = body[position + 1..].iter().collect();

        if option.is_flag() {
            if let Some(inline_value) = remainder.strip_prefix('=') {
                let value = flag_inline_value(config, &alias, inline_value, false, absolute)?;
                record(accumulator, option, &alias, value, absolute)?;
                return Ok(0);
            }

            record(
                accumulator,
                option,
                &alias,
                flag_presence_value(option, false),
                absolute,
            )?;
            position += 1;
            continue;
        }

        let inline = if remainder.is_empty() {
            None
        } else if let Some(stripped) = remainder.strip_prefix('=') {
            Some(stripped.to_string())
        } else {
            Some(remainder)
        };
        let (value, consumed) = consume_values(spec, config, option, inline, tokens, index, base)?;
        record(accumulator, option, &alias, value, absolute)?;
        return Ok(consumed);
    }

    Ok(0)
}

/// Collect the value(s) for one occurrence of a value-consuming option.
///
/// Single-value options bind the inline value or, failing that, the next raw
/// token whatever it looks like.  Optional-value options (`0..=1`) bind only
/// inline values.  Wider arities consume greedily up to the maximum, a
/// boundary token, or the reservation needed by the command's positionals.
fn consume_values(
    spec: &CommandSpec,
    config: &ParserConfig,
    option: &OptionSpec,
    inline: Option<String>,
    tokens: &[&str],
    index: usize,
    base: usize,
) -> Result<(Value, usize), ParseError> {
    let arity = option.arity();
    let absolute = base + index;

    if arity.max() == Some(1) {
        if let Some(value) = inline {
            return Ok((Value::Str(value), 0));
        }

        if arity.min() == 0 {
            return Ok((Value::Bool(true), 0));
        }

        return match tokens.get(index + 1) {
            Some(next) => Ok((Value::Str((*next).to_string()), 1)),
            None => Err(ParseError::InsufficientOptionValues {
                name: option.name().to_string(),
                expected: 1,
                provided: 0,
                index: absolute,
            }),
        };
    }

    let mut values: Vec<String> = Vec::default();

    if let Some(value) = inline {
        values.push(value);
    }

    let reserved = spec.positional_min_sum();
    let mut consumed = 0;

    loop {
        if let Some(limit) = arity.max() {
            if values.len() >= limit {
                break;
            }
        }

        let Some(next) = tokens.get(index + 1 + consumed) else {
            break;
        };

        if is_boundary(next, spec, config, base + index + 1 + consumed)? {
            break;
        }

        // Leave enough plain tokens behind to satisfy the positional minima.
        if reserved > 0 && values.len() >= arity.min() {
            let after = plain_run(
                &tokens[index + 2 + consumed..],
                spec,
                config,
                base + index + 2 + consumed,
            )?;

            if after < reserved {
                break;
            }
        }

        values.push((*next).to_string());
        consumed += 1;
    }

    if values.len() < arity.min() {
        return Err(ParseError::InsufficientOptionValues {
            name: option.name().to_string(),
            expected: arity.min(),
            provided: values.len(),
            index: absolute,
        });
    }

    Ok((Value::from_tokens(values), consumed))
}

fn is_boundary(
    token: &str,
    spec: &CommandSpec,
    config: &ParserConfig,
    absolute: usize,
) -> Result<bool, ParseError> {
    if token.len() >= 2 && token.starts_with('-') {
        return Ok(true);
    }

    Ok(spec.resolve_subcommand(token, config, absolute)?.is_some())
}

/// The length of the run of plain (non-option, non-subcommand) tokens at the
/// head of `tokens`.
fn plain_run(
    tokens: &[&str],
    spec: &CommandSpec,
    config: &ParserConfig,
    base: usize,
) -> Result<usize, ParseError> {
    let mut count = 0;

    for (offset, token) in tokens.iter().enumerate() {
        if is_boundary(token, spec, config, base + offset)? {
            break;
        }

        count += 1;
    }

    Ok(count)
}

fn flag_inline_value(
    config: &ParserConfig,
    alias: &str,
    value: &str,
    negated: bool,
    absolute: usize,
) -> Result<Value, ParseError> {
    if !config.allow_equals_for_flags {
        return Err(ParseError::FlagWithValue {
            name: alias.to_string(),
            index: absolute,
        });
    }

    if value.is_empty() {
        return Err(ParseError::OptionDoesNotAcceptValue {
            name: alias.to_string(),
            index: absolute,
        });
    }

    let state = if config.is_truthy(value) {
        true
    } else if config.is_falsey(value) {
        false
    } else {
        return Err(ParseError::InvalidFlagValue {
            name: alias.to_string(),
            value: value.to_string(),
            index: absolute,
        });
    };

    Ok(Value::Bool(if negated { !state } else { state }))
}

fn flag_presence_value(option: &OptionSpec, negated: bool) -> Value {
    if negated {
        match option.flag_const() {
            Value::Bool(state) => Value::Bool(!state),
            _ => unreachable!("negation prefixes require a boolean flag constant"),
        }
    } else {
        option.flag_const().clone()
    }
}

/// Fold one occurrence into the accumulator per the option's mode.
fn record(
    accumulator: &mut HashMap<String, Accumulated>,
    option: &OptionSpec,
    alias: &str,
    value: Value,
    index: usize,
) -> Result<(), ParseError> {
    match accumulator.get_mut(option.name()) {
        None => {
            let initial = match option.accumulation() {
                AccumulationMode::Count => Value::Count(1),
                AccumulationMode::Collect => match value {
                    Value::List(items) if option.flatten_values() => Value::List(items),
                    occurrence => Value::List(vec![occurrence]),
                },
                _ => value,
            };

            accumulator.insert(
                option.name().to_string(),
                Accumulated {
                    alias: alias.to_string(),
                    value: initial,
                    occurrences: 1,
                },
            );
        }
        Some(existing) => {
            existing.occurrences += 1;

            match option.accumulation() {
                AccumulationMode::LastWins => {
                    existing.value = value;
                    existing.alias = alias.to_string();
                }
                AccumulationMode::FirstWins => {
                    // The first occurrence stands, but the repeat still counts.
                }
                AccumulationMode::ErrorOnDuplicate => {
                    return Err(ParseError::OptionRepeated {
                        name: option.name().to_string(),
                        index,
                    });
                }
                AccumulationMode::Collect => {
                    existing.alias = alias.to_string();

                    match &mut existing.value {
                        Value::List(items) => match value {
                            Value::List(nested) if option.flatten_values() => items.extend(nested),
                            occurrence => items.push(occurrence),
                        },
                        _ => unreachable!("collect accumulators always hold a list"),
                    }
                }
                AccumulationMode::Count => {
                    existing.alias = alias.to_string();
                    existing.value = Value::Count(existing.occurrences);
                }
            }
        }
    }

    Ok(())
}

/// Distribute the collected positional tokens across the declared
/// specifications in declaration order, reserving enough items for the
/// minima of every specification further right.
fn group_positionals(
    collected: Vec<String>,
    spec: &CommandSpec,
    config: &ParserConfig,
) -> Result<HashMap<String, ParsedPositional>, ParseError> {
    let specs = spec.positionals();
    let mut grouped: HashMap<String, ParsedPositional> = HashMap::default();

    if specs.is_empty() {
        if collected.is_empty() {
            return Ok(grouped);
        }

        if config.implicit_catch_all_positional {
            grouped.insert(
                CATCH_ALL_NAME.to_string(),
                ParsedPositional::new(CATCH_ALL_NAME.to_string(), Value::from_tokens(collected)),
            );
            return Ok(grouped);
        }

        return Err(ParseError::UnexpectedPositionalArgument {
            value: collected
                .into_iter()
                .next()
                .expect("collected is non-empty"),
            command: spec.name().to_string(),
        });
    }

    let total_min: usize = specs.iter().map(|positional| positional.arity().min()).sum();

    if collected.len() < total_min {
        let mut consumed = 0;

        for positional in specs {
            let remaining = collected.len().saturating_sub(consumed);

            if remaining < positional.arity().min() {
                return Err(ParseError::InsufficientPositionalArguments {
                    name: positional.name().to_string(),
                    expected: positional.arity().min(),
                    provided: remaining,
                });
            }

            consumed += positional.arity().min();
        }

        unreachable!("the minimum check must identify an unsatisfied positional");
    }

    let mut cursor = 0;

    for (position, positional) in specs.iter().enumerate() {
        let subsequent_min: usize = specs[position + 1..]
            .iter()
            .map(|later| later.arity().min())
            .sum();
        let available = (collected.len() - cursor).saturating_sub(subsequent_min);
        let take = match positional.arity().max() {
            None => available,
            Some(limit) => limit.min(available),
        };

        let values: Vec<String> = collected[cursor..cursor + take].to_vec();
        cursor += take;
        grouped.insert(
            positional.name().to_string(),
            ParsedPositional::new(positional.name().to_string(), positional.bind(values)),
        );
    }

    if cursor < collected.len() {
        return Err(ParseError::UnexpectedPositionalArgument {
            value: collected[cursor].clone(),
            command: spec.name().to_string(),
        });
    }

    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Arity;
    use crate::spec::PositionalSpec;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn verbose_flag(accumulation: AccumulationMode) -> OptionSpec {
        OptionSpec::flag("verbose")
            .short('v')
            .negation_prefix("no")
            .accumulation(accumulation)
            .build()
            .unwrap()
    }

    fn deploy_tool(accumulation: AccumulationMode) -> CommandSpec {
        let deploy = CommandSpec::named("deploy")
            .alias("dep")
            .option(
                OptionSpec::value("region", Arity::EXACTLY_ONE)
                    .short('r')
                    .build()
                    .unwrap(),
            )
            .positional(PositionalSpec::new("env", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();

        CommandSpec::named("deploy-tool")
            .option(verbose_flag(accumulation))
            .subcommand(deploy)
            .build()
            .unwrap()
    }

    fn parse(spec: &CommandSpec, tokens: &[&str]) -> Result<ParseResult, ParseError> {
        run(spec, &ParserConfig::default(), tokens)
    }

    fn parse_with(
        spec: &CommandSpec,
        config: &ParserConfig,
        tokens: &[&str],
    ) -> Result<ParseResult, ParseError> {
        run(spec, config, tokens)
    }

    #[test]
    fn empty_input() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        let result = parse(&spec, &[]).unwrap();

        assert_eq!(result.command(), "deploy-tool");
        assert_eq!(result.alias(), None);
        assert!(result.options().is_empty());
        assert!(result.positionals().is_empty());
        assert!(result.extras().is_empty());
        assert!(result.subcommand().is_none());
    }

    #[test]
    fn flag_then_subcommand_with_positional() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        let result = parse(&spec, &["--verbose", "deploy", "prod"]).unwrap();

        let verbose = result.option("verbose").unwrap();
        assert_eq!(verbose.value(), &Value::Bool(true));
        assert_eq!(verbose.occurrences(), 1);
        assert_eq!(verbose.alias(), "verbose");

        let deploy = result.subcommand().unwrap();
        assert_eq!(deploy.command(), "deploy");
        assert!(deploy.options().is_empty());
        assert_eq!(
            deploy.positional("env").unwrap().value(),
            &Value::Str("prod".to_string())
        );
    }

    #[rstest]
    #[case(&["-v", "-v", "-v"])]
    #[case(&["-vvv"])]
    #[case(&["-vv", "-v"])]
    fn count_accumulation(#[case] tokens: &[&str]) {
        let spec = deploy_tool(AccumulationMode::Count);

        let result = parse(&spec, tokens).unwrap();

        let verbose = result.option("verbose").unwrap();
        assert_eq!(verbose.value(), &Value::Count(3));
        assert_eq!(verbose.occurrences(), 3);
        assert!(result.subcommand().is_none());
        assert!(result.positionals().is_empty());
    }

    #[test]
    fn subcommand_inline_option() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        let result = parse(&spec, &["deploy", "--region=us-east-1", "prod"]).unwrap();

        let deploy = result.subcommand().unwrap();
        assert_eq!(
            deploy.option("region").unwrap().value(),
            &Value::Str("us-east-1".to_string())
        );
        assert_eq!(
            deploy.positional("env").unwrap().value(),
            &Value::Str("prod".to_string())
        );
    }

    #[test]
    fn trailing_extras() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        let result = parse(&spec, &["deploy", "prod", "--", "--not-an-option", "raw"]).unwrap();

        let deploy = result.subcommand().unwrap();
        assert_eq!(
            deploy.positional("env").unwrap().value(),
            &Value::Str("prod".to_string())
        );
        assert_eq!(deploy.extras(), ["--not-an-option", "raw"]);
        assert!(result.extras().is_empty());
    }

    #[test]
    fn lone_separator() {
        let spec = CommandSpec::named("tool").build().unwrap();

        let result = parse(&spec, &["--"]).unwrap();

        assert!(result.extras().is_empty());
        assert!(result.positionals().is_empty());
    }

    #[test]
    fn empty_long_name() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        assert_eq!(
            parse(&spec, &["--=x"]).unwrap_err(),
            ParseError::UnknownOption {
                name: "--=x".to_string(),
                index: 0,
            }
        );
    }

    #[test]
    fn lone_dash_is_positional() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("input", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["-"]).unwrap();

        assert_eq!(
            result.positional("input").unwrap().value(),
            &Value::Str("-".to_string())
        );
    }

    #[test]
    fn abbreviation_resolves_and_records_alias() {
        let spec = deploy_tool(AccumulationMode::LastWins);
        let config = ParserConfig {
            allow_abbreviations: true,
            ..ParserConfig::default()
        };

        let result = parse_with(&spec, &config, &["--verb", "deploy", "prod"]).unwrap();

        let verbose = result.option("verbose").unwrap();
        assert_eq!(verbose.value(), &Value::Bool(true));
        assert_eq!(verbose.alias(), "verb");
        assert_eq!(result.subcommand().unwrap().command(), "deploy");
    }

    #[test]
    fn abbreviation_ambiguity_is_scoped_per_command() {
        // The subcommand's '--region' is out of scope at the root; the
        // ambiguity is between the root's own 're*' options.
        let spec = CommandSpec::named("deploy-tool")
            .option(OptionSpec::value("retain", Arity::EXACTLY_ONE).build().unwrap())
            .option(OptionSpec::flag("refresh").build().unwrap())
            .subcommand(
                CommandSpec::named("deploy")
                    .option(OptionSpec::value("region", Arity::EXACTLY_ONE).build().unwrap())
                    .positional(PositionalSpec::new("env", Arity::EXACTLY_ONE).unwrap())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let config = ParserConfig {
            allow_abbreviations: true,
            abbreviation_min_length: 2,
            ..ParserConfig::default()
        };

        assert_eq!(
            parse_with(&spec, &config, &["--re", "x", "deploy", "prod"]).unwrap_err(),
            ParseError::AmbiguousOption {
                name: "re".to_string(),
                candidates: vec!["retain".to_string(), "refresh".to_string()],
                index: 0,
            }
        );
    }

    #[test]
    fn below_minimum_abbreviation_is_unknown() {
        let spec = deploy_tool(AccumulationMode::LastWins);
        let config = ParserConfig {
            allow_abbreviations: true,
            ..ParserConfig::default()
        };

        assert_matches!(
            parse_with(&spec, &config, &["--ve"]),
            Err(ParseError::UnknownOption { .. })
        );
    }

    #[test]
    fn negated_flag() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        let result = parse(&spec, &["--no-verbose"]).unwrap();

        let verbose = result.option("verbose").unwrap();
        assert_eq!(verbose.value(), &Value::Bool(false));
        assert_eq!(verbose.alias(), "no-verbose");
    }

    #[rstest]
    #[case("--verbose=yes", Value::Bool(true))]
    #[case("--verbose=Off", Value::Bool(false))]
    #[case("--verbose=1", Value::Bool(true))]
    #[case("--no-verbose=true", Value::Bool(false))]
    fn flag_with_equals(#[case] token: &str, #[case] expected: Value) {
        let spec = deploy_tool(AccumulationMode::LastWins);
        let config = ParserConfig {
            allow_equals_for_flags: true,
            ..ParserConfig::default()
        };

        let result = parse_with(&spec, &config, &[token]).unwrap();

        assert_eq!(result.option("verbose").unwrap().value(), &expected);
    }

    #[test]
    fn flag_with_equals_disabled() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        assert_eq!(
            parse(&spec, &["--verbose=yes"]).unwrap_err(),
            ParseError::FlagWithValue {
                name: "verbose".to_string(),
                index: 0,
            }
        );
    }

    #[test]
    fn flag_with_invalid_value() {
        let spec = deploy_tool(AccumulationMode::LastWins);
        let config = ParserConfig {
            allow_equals_for_flags: true,
            ..ParserConfig::default()
        };

        assert_eq!(
            parse_with(&spec, &config, &["--verbose=bogus"]).unwrap_err(),
            ParseError::InvalidFlagValue {
                name: "verbose".to_string(),
                value: "bogus".to_string(),
                index: 0,
            }
        );
    }

    fn nums_tool(arity: Arity) -> CommandSpec {
        CommandSpec::named("tool")
            .option(OptionSpec::value("nums", arity).short('n').build().unwrap())
            .option(OptionSpec::flag("verbose").build().unwrap())
            .build()
            .unwrap()
    }

    #[rstest]
    #[case(&["--nums", "1", "2", "3"], vec!["1", "2", "3"])]
    #[case(&["--nums", "1", "2", "--verbose"], vec!["1", "2"])]
    #[case(&["--nums=1", "2", "3"], vec!["1", "2", "3"])]
    #[case(&["-n1", "2"], vec!["1", "2"])]
    #[case(&["-n=1", "2"], vec!["1", "2"])]
    fn greedy_values(#[case] tokens: &[&str], #[case] expected: Vec<&str>) {
        let spec = nums_tool(Arity::ONE_OR_MORE);

        let result = parse(&spec, tokens).unwrap();

        assert_eq!(
            result.option("nums").unwrap().value(),
            &Value::from_tokens(expected)
        );
    }

    #[test]
    fn bounded_values_stop_at_maximum() {
        let spec = nums_tool(Arity::new(1, Some(2)).unwrap());

        let result = parse(&spec, &["--nums", "1", "2", "3"]).unwrap();

        assert_eq!(
            result.option("nums").unwrap().value(),
            &Value::from_tokens(["1", "2"])
        );
        // The leftover lands in the implicit catch-all.
        assert_eq!(
            result.positional("args").unwrap().value(),
            &Value::from_tokens(["3"])
        );
    }

    #[test]
    fn greedy_values_reserve_positional_minima() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::value("nums", Arity::ONE_OR_MORE).build().unwrap())
            .positional(PositionalSpec::new("target", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["--nums", "1", "2", "3"]).unwrap();

        assert_eq!(
            result.option("nums").unwrap().value(),
            &Value::from_tokens(["1", "2"])
        );
        assert_eq!(
            result.positional("target").unwrap().value(),
            &Value::Str("3".to_string())
        );
    }

    #[rstest]
    #[case(&["--nums"], 1, 0)]
    #[case(&["--nums", "--verbose"], 1, 0)]
    fn insufficient_option_values(
        #[case] tokens: &[&str],
        #[case] expected: usize,
        #[case] provided: usize,
    ) {
        let spec = nums_tool(Arity::ONE_OR_MORE);

        assert_eq!(
            parse(&spec, tokens).unwrap_err(),
            ParseError::InsufficientOptionValues {
                name: "nums".to_string(),
                expected,
                provided,
                index: 0,
            }
        );
    }

    #[test]
    fn exactly_one_consumes_the_next_raw_token() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::value("region", Arity::EXACTLY_ONE).build().unwrap())
            .option(OptionSpec::flag("verbose").build().unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["--region", "--verbose"]).unwrap();

        assert_eq!(
            result.option("region").unwrap().value(),
            &Value::Str("--verbose".to_string())
        );
        assert!(result.option("verbose").is_none());

        assert_eq!(
            parse(&spec, &["--region"]).unwrap_err(),
            ParseError::InsufficientOptionValues {
                name: "region".to_string(),
                expected: 1,
                provided: 0,
                index: 0,
            }
        );
    }

    #[rstest]
    #[case(&["--level"], Value::Bool(true))]
    #[case(&["--level=5"], Value::Str("5".to_string()))]
    fn optional_value_binds_inline_only(#[case] tokens: &[&str], #[case] expected: Value) {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::value("level", Arity::ZERO_OR_ONE).build().unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, tokens).unwrap();

        assert_eq!(result.option("level").unwrap().value(), &expected);
    }

    #[test]
    fn optional_value_never_consumes_lookahead() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::value("level", Arity::ZERO_OR_ONE).build().unwrap())
            .positional(PositionalSpec::new("input", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["--level", "5"]).unwrap();

        assert_eq!(result.option("level").unwrap().value(), &Value::Bool(true));
        assert_eq!(
            result.positional("input").unwrap().value(),
            &Value::Str("5".to_string())
        );
    }

    #[rstest]
    #[case(&["-x"], "x")]
    #[case(&["-vx"], "x")]
    fn unknown_short(#[case] tokens: &[&str], #[case] name: &str) {
        let spec = deploy_tool(AccumulationMode::LastWins);

        assert_eq!(
            parse(&spec, tokens).unwrap_err(),
            ParseError::UnknownOption {
                name: name.to_string(),
                index: 0,
            }
        );
    }

    #[test]
    fn cluster_flags_then_value_option() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::flag("verbose").short('v').build().unwrap())
            .option(
                OptionSpec::value("region", Arity::EXACTLY_ONE)
                    .short('r')
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let result = parse(&spec, &["-vr", "us-east-1"]).unwrap();

        assert_eq!(result.option("verbose").unwrap().value(), &Value::Bool(true));
        let region = result.option("region").unwrap();
        assert_eq!(region.value(), &Value::Str("us-east-1".to_string()));
        assert_eq!(region.alias(), "r");

        let attached = parse(&spec, &["-vrus-east-1"]).unwrap();
        assert_eq!(
            attached.option("region").unwrap().value(),
            &Value::Str("us-east-1".to_string())
        );
    }

    #[rstest]
    #[case(AccumulationMode::LastWins, Value::Str("b".to_string()), 2)]
    #[case(AccumulationMode::FirstWins, Value::Str("a".to_string()), 2)]
    fn last_and_first_wins(
        #[case] accumulation: AccumulationMode,
        #[case] expected: Value,
        #[case] occurrences: usize,
    ) {
        let spec = CommandSpec::named("tool")
            .option(
                OptionSpec::value("pick", Arity::EXACTLY_ONE)
                    .accumulation(accumulation)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let result = parse(&spec, &["--pick", "a", "--pick", "b"]).unwrap();

        let pick = result.option("pick").unwrap();
        assert_eq!(pick.value(), &expected);
        assert_eq!(pick.occurrences(), occurrences);
    }

    #[test]
    fn error_on_duplicate() {
        let spec = CommandSpec::named("tool")
            .option(
                OptionSpec::value("pick", Arity::EXACTLY_ONE)
                    .accumulation(AccumulationMode::ErrorOnDuplicate)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        assert_eq!(
            parse(&spec, &["--pick", "a", "--pick", "b"]).unwrap_err(),
            ParseError::OptionRepeated {
                name: "pick".to_string(),
                index: 2,
            }
        );
    }

    #[test]
    fn collect_preserves_occurrence_order() {
        let spec = CommandSpec::named("tool")
            .option(
                OptionSpec::value("item", Arity::EXACTLY_ONE)
                    .short('i')
                    .accumulation(AccumulationMode::Collect)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let result = parse(&spec, &["--item", "a", "-i", "b", "--item=c"]).unwrap();

        let item = result.option("item").unwrap();
        assert_eq!(item.value(), &Value::from_tokens(["a", "b", "c"]));
        assert_eq!(item.occurrences(), 3);
    }

    #[test]
    fn collect_nests_multi_value_occurrences() {
        let spec = CommandSpec::named("tool")
            .option(
                OptionSpec::value("pair", Arity::new(2, Some(2)).unwrap())
                    .accumulation(AccumulationMode::Collect)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let result = parse(&spec, &["--pair", "a", "b", "--pair", "c", "d"]).unwrap();

        assert_eq!(
            result.option("pair").unwrap().value(),
            &Value::List(vec![
                Value::from_tokens(["a", "b"]),
                Value::from_tokens(["c", "d"]),
            ])
        );
    }

    #[test]
    fn collect_flattens_when_requested() {
        let spec = CommandSpec::named("tool")
            .option(
                OptionSpec::value("pair", Arity::new(2, Some(2)).unwrap())
                    .accumulation(AccumulationMode::Collect)
                    .flatten_values()
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let result = parse(&spec, &["--pair", "a", "b", "--pair", "c", "d"]).unwrap();

        assert_eq!(
            result.option("pair").unwrap().value(),
            &Value::from_tokens(["a", "b", "c", "d"])
        );
    }

    #[rstest]
    #[case("-5")]
    #[case("-3.14")]
    #[case("-2.5E-10")]
    fn negative_numbers_as_positionals(#[case] token: &str) {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::flag("verbose").short('v').build().unwrap())
            .positional(PositionalSpec::new("delta", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();
        let config = ParserConfig {
            allow_negative_numbers: true,
            ..ParserConfig::default()
        };

        let result = parse_with(&spec, &config, &[token]).unwrap();

        assert_eq!(
            result.positional("delta").unwrap().value(),
            &Value::Str(token.to_string())
        );
    }

    #[test]
    fn negative_numbers_disabled() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::flag("verbose").short('v').build().unwrap())
            .positional(PositionalSpec::new("delta", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();

        assert_matches!(parse(&spec, &["-5"]), Err(ParseError::UnknownOption { .. }));
    }

    #[test]
    fn registered_short_beats_negative_number() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::flag("five").short('5').build().unwrap())
            .build()
            .unwrap();
        let config = ParserConfig {
            allow_negative_numbers: true,
            ..ParserConfig::default()
        };

        let result = parse_with(&spec, &config, &["-5"]).unwrap();

        assert_eq!(result.option("five").unwrap().value(), &Value::Bool(true));
    }

    #[test]
    fn unknown_subcommand_without_positionals() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        assert_eq!(
            parse(&spec, &["destroy", "prod"]).unwrap_err(),
            ParseError::UnknownSubcommand {
                name: "destroy".to_string(),
                candidates: vec!["deploy".to_string()],
                index: 0,
            }
        );
    }

    #[test]
    fn unknown_subcommand_with_positionals_declared() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("input", Arity::EXACTLY_ONE).unwrap())
            .subcommand(CommandSpec::named("deploy").build().unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["destroy"]).unwrap();

        assert_eq!(
            result.positional("input").unwrap().value(),
            &Value::Str("destroy".to_string())
        );
    }

    #[test]
    fn subcommand_alias_recorded() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        let result = parse(&spec, &["dep", "prod"]).unwrap();

        let deploy = result.subcommand().unwrap();
        assert_eq!(deploy.command(), "deploy");
        assert_eq!(deploy.alias(), Some("dep"));
    }

    #[test]
    fn subcommand_after_positional_stays_positional() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("inputs", Arity::ONE_OR_MORE).unwrap())
            .subcommand(CommandSpec::named("deploy").build().unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["x", "deploy"]).unwrap();

        assert!(result.subcommand().is_none());
        assert_eq!(
            result.positional("inputs").unwrap().value(),
            &Value::from_tokens(["x", "deploy"])
        );
    }

    #[test]
    fn subcommand_after_positional_resolves_when_not_stopping() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("inputs", Arity::ONE_OR_MORE).unwrap())
            .subcommand(CommandSpec::named("deploy").build().unwrap())
            .build()
            .unwrap();
        let config = ParserConfig {
            stop_at_unknown_subcommand: false,
            ..ParserConfig::default()
        };

        let result = parse_with(&spec, &config, &["x", "deploy"]).unwrap();

        assert_eq!(result.subcommand().unwrap().command(), "deploy");
        assert_eq!(
            result.positional("inputs").unwrap().value(),
            &Value::from_tokens(["x"])
        );
    }

    #[test]
    fn strict_order_demotes_options() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::flag("verbose").build().unwrap())
            .positional(PositionalSpec::new("inputs", Arity::ONE_OR_MORE).unwrap())
            .build()
            .unwrap();
        let strict = ParserConfig {
            strict_option_order: true,
            ..ParserConfig::default()
        };

        let result = parse_with(&spec, &strict, &["x", "--verbose"]).unwrap();

        assert!(result.option("verbose").is_none());
        assert_eq!(
            result.positional("inputs").unwrap().value(),
            &Value::from_tokens(["x", "--verbose"])
        );
    }

    #[test]
    fn strict_order_leftover_is_unexpected() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::flag("verbose").build().unwrap())
            .positional(PositionalSpec::new("input", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();
        let strict = ParserConfig {
            strict_option_order: true,
            ..ParserConfig::default()
        };

        assert_eq!(
            parse_with(&spec, &strict, &["x", "--verbose"]).unwrap_err(),
            ParseError::UnexpectedPositionalArgument {
                value: "--verbose".to_string(),
                command: "tool".to_string(),
            }
        );
    }

    #[test]
    fn interleaved_options() {
        let spec = CommandSpec::named("tool")
            .option(OptionSpec::flag("verbose").build().unwrap())
            .positional(PositionalSpec::new("inputs", Arity::ONE_OR_MORE).unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["x", "--verbose", "y"]).unwrap();

        assert_eq!(result.option("verbose").unwrap().value(), &Value::Bool(true));
        assert_eq!(
            result.positional("inputs").unwrap().value(),
            &Value::from_tokens(["x", "y"])
        );
    }

    #[test]
    fn implicit_catch_all() {
        let spec = CommandSpec::named("tool").build().unwrap();

        let result = parse(&spec, &["a", "b", "c"]).unwrap();

        assert_eq!(
            result.positional(CATCH_ALL_NAME).unwrap().value(),
            &Value::from_tokens(["a", "b", "c"])
        );
    }

    #[test]
    fn implicit_catch_all_disabled() {
        let spec = CommandSpec::named("tool").build().unwrap();
        let config = ParserConfig {
            implicit_catch_all_positional: false,
            ..ParserConfig::default()
        };

        assert_eq!(
            parse_with(&spec, &config, &["a"]).unwrap_err(),
            ParseError::UnexpectedPositionalArgument {
                value: "a".to_string(),
                command: "tool".to_string(),
            }
        );
    }

    #[test]
    fn positional_grouping_reserves_minima() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("head", Arity::new(1, Some(2)).unwrap()).unwrap())
            .positional(PositionalSpec::new("tail", Arity::ONE_OR_MORE).unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["a", "b", "c"]).unwrap();

        assert_eq!(
            result.positional("head").unwrap().value(),
            &Value::from_tokens(["a", "b"])
        );
        assert_eq!(
            result.positional("tail").unwrap().value(),
            &Value::from_tokens(["c"])
        );
    }

    #[test]
    fn unbounded_positional_leaves_later_minima() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("sources", Arity::ONE_OR_MORE).unwrap())
            .positional(PositionalSpec::new("target", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();

        let result = parse(&spec, &["a", "b", "c"]).unwrap();

        assert_eq!(
            result.positional("sources").unwrap().value(),
            &Value::from_tokens(["a", "b"])
        );
        assert_eq!(
            result.positional("target").unwrap().value(),
            &Value::Str("c".to_string())
        );
    }

    #[test]
    fn insufficient_positionals_names_first_unsatisfied() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("head", Arity::EXACTLY_ONE).unwrap())
            .positional(PositionalSpec::new("tail", Arity::new(2, Some(2)).unwrap()).unwrap())
            .build()
            .unwrap();

        assert_eq!(
            parse(&spec, &["a", "b"]).unwrap_err(),
            ParseError::InsufficientPositionalArguments {
                name: "tail".to_string(),
                expected: 2,
                provided: 1,
            }
        );
    }

    #[test]
    fn bounded_leftover_is_unexpected() {
        let spec = CommandSpec::named("tool")
            .positional(PositionalSpec::new("input", Arity::EXACTLY_ONE).unwrap())
            .build()
            .unwrap();

        assert_eq!(
            parse(&spec, &["a", "b"]).unwrap_err(),
            ParseError::UnexpectedPositionalArgument {
                value: "b".to_string(),
                command: "tool".to_string(),
            }
        );
    }

    #[test]
    fn invalid_configuration_surfaces_at_parse() {
        let spec = CommandSpec::named("tool").build().unwrap();
        let config = ParserConfig {
            abbreviation_min_length: 0,
            ..ParserConfig::default()
        };

        assert_matches!(
            parse_with(&spec, &config, &[]),
            Err(ParseError::InvalidConfiguration { .. })
        );
    }

    #[test]
    fn subcommand_config_override() {
        let sub_config = ParserConfig {
            allow_abbreviations: true,
            ..ParserConfig::default()
        };
        let spec = CommandSpec::named("tool")
            .subcommand(
                CommandSpec::named("deploy")
                    .option(OptionSpec::flag("verbose").build().unwrap())
                    .config(sub_config)
                    .build()
                    .unwrap(),
            )
            .option(OptionSpec::flag("loud").build().unwrap())
            .build()
            .unwrap();

        // The override only applies inside the subtree.
        assert_matches!(
            parse(&spec, &["--lo"]),
            Err(ParseError::UnknownOption { .. })
        );

        let result = parse(&spec, &["deploy", "--verb"]).unwrap();
        assert_eq!(
            result
                .subcommand()
                .unwrap()
                .option("verbose")
                .unwrap()
                .value(),
            &Value::Bool(true)
        );
    }

    #[test]
    fn error_indexes_are_absolute() {
        let spec = deploy_tool(AccumulationMode::LastWins);

        assert_eq!(
            parse(&spec, &["--verbose", "deploy", "prod", "--moot"]).unwrap_err(),
            ParseError::UnknownOption {
                name: "moot".to_string(),
                index: 3,
            }
        );
    }
}
