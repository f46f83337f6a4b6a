//! YAML 1.2 core-schema tag resolution for scalars.
use once_cell::sync::Lazy;
use regex::Regex;

pub const STR: &str = "!!str";
pub const INT: &str = "!!int";
pub const FLOAT: &str = "!!float";
pub const BOOL: &str = "!!bool";
pub const NULL: &str = "!!null";

const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";

static INT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-+]?[0-9]+|0x[0-9a-fA-F]+|0o[0-7]+|0b[01]+)$").expect("static regex")
});

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
    )
    .expect("static regex")
});

/// Implicit tag of a plain (unquoted, non-block) scalar.
pub fn resolve_plain(value: &str) -> &'static str {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => NULL,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => BOOL,
        _ if INT_RE.is_match(value) => INT,
        _ if FLOAT_RE.is_match(value) => FLOAT,
        _ => STR,
    }
}

/// Normalize an explicit tag (`handle` + `suffix`) to its short form.
///
/// `!!x` and `tag:yaml.org,2002:x` both become `!!x`; the non-specific `!`
/// forces a string. Anything else is returned verbatim.
pub fn normalize_explicit(handle: &str, suffix: &str) -> String {
    if handle == "!!" || handle == CORE_SCHEMA_PREFIX {
        return format!("!!{suffix}");
    }
    let full = format!("{handle}{suffix}");
    if full == "!" {
        return STR.to_string();
    }
    match full.strip_prefix(CORE_SCHEMA_PREFIX) {
        Some(rest) => format!("!!{rest}"),
        None => full,
    }
}
