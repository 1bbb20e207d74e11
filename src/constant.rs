use regex::Regex;
use std::sync::LazyLock;

/// The token that switches the engine into trailing mode.
pub(crate) const SEPARATOR: &str = "--";

/// Name of the positional synthesized when a command declares none.
pub(crate) const CATCH_ALL_NAME: &str = "args";

pub(crate) const DEFAULT_TRUTHY_VALUES: [&str; 4] = ["true", "1", "yes", "on"];
pub(crate) const DEFAULT_FALSEY_VALUES: [&str; 4] = ["false", "0", "no", "off"];

/// Matches integers, decimals, and scientific notation (ex: `-1`, `-3.14`, `-2.5E-10`).
/// Does not match a leading decimal point (`-.5`) nor long options (`--1`).
pub(crate) const DEFAULT_NEGATIVE_NUMBER_PATTERN: &str = r"^-\d+\.?\d*([eE][+-]?\d+)?$";

pub(crate) static COMMAND_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("static regex must compile")
});

pub(crate) static LONG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*[A-Za-z0-9]$").expect("static regex must compile")
});
