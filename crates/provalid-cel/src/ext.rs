//! Format extension predicates.
//!
//! The method-style predicates available to constraint expressions and
//! built-in format rules: `isEmail`, `isHostname`, `isIp`, `isIpPrefix`,
//! `isUri`, `isUriRef`, `isHostAndPort` on strings, `unique` on lists,
//! `isNan` and `isInf` on doubles.
//!
//! The checks implement the widely-used validation semantics (RFC 1123
//! hostnames, RFC 5322-shaped emails, RFC 3986 URI character rules)
//! without pulling in a full parser for each format.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};

use crate::eval::{EvalError, Function, FunctionRegistry, Overload, Value};
use crate::types::{ExprType, FunctionDecl, OverloadDecl};

/// Format predicate declarations, used by the binder.
pub static FORMAT_DECLARATIONS: LazyLock<HashMap<String, FunctionDecl>> =
    LazyLock::new(build_format_declarations);

fn build_format_declarations() -> HashMap<String, FunctionDecl> {
    let string_method = |id: &str| {
        OverloadDecl::method(id.to_string(), vec![ExprType::String], ExprType::Bool)
    };

    let mut funcs = Vec::new();

    funcs.push(FunctionDecl::new("isEmail").with_overload(string_method("string_is_email")));
    funcs.push(FunctionDecl::new("isHostname").with_overload(string_method("string_is_hostname")));
    funcs.push(
        FunctionDecl::new("isIp")
            .with_overload(string_method("string_is_ip"))
            .with_overload(OverloadDecl::method(
                "string_is_ip_version",
                vec![ExprType::String, ExprType::Int],
                ExprType::Bool,
            )),
    );
    funcs.push(
        FunctionDecl::new("isIpPrefix")
            .with_overload(string_method("string_is_ip_prefix"))
            .with_overload(OverloadDecl::method(
                "string_is_ip_prefix_version",
                vec![ExprType::String, ExprType::Int],
                ExprType::Bool,
            ))
            .with_overload(OverloadDecl::method(
                "string_is_ip_prefix_version_strict",
                vec![ExprType::String, ExprType::Int, ExprType::Bool],
                ExprType::Bool,
            )),
    );
    funcs.push(FunctionDecl::new("isUri").with_overload(string_method("string_is_uri")));
    funcs.push(FunctionDecl::new("isUriRef").with_overload(string_method("string_is_uri_ref")));
    funcs.push(
        FunctionDecl::new("isHostAndPort").with_overload(OverloadDecl::method(
            "string_is_host_and_port",
            vec![ExprType::String, ExprType::Bool],
            ExprType::Bool,
        )),
    );

    funcs.push(FunctionDecl::new("unique").with_overload(OverloadDecl::method(
        "list_unique",
        vec![ExprType::list(ExprType::Dyn)],
        ExprType::Bool,
    )));

    funcs.push(FunctionDecl::new("isNan").with_overload(OverloadDecl::method(
        "double_is_nan",
        vec![ExprType::Double],
        ExprType::Bool,
    )));
    funcs.push(
        FunctionDecl::new("isInf")
            .with_overload(OverloadDecl::method(
                "double_is_inf",
                vec![ExprType::Double],
                ExprType::Bool,
            ))
            .with_overload(OverloadDecl::method(
                "double_is_inf_sign",
                vec![ExprType::Double, ExprType::Int],
                ExprType::Bool,
            )),
    );

    funcs.into_iter().map(|f| (f.name.clone(), f)).collect()
}

/// Build the format predicate registry for evaluation.
pub fn format_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();

    registry.register(Function::new("isEmail").with_overload(Overload::new(
        "string_is_email",
        true,
        1,
        Arc::new(|args| string_predicate(args, "isEmail", is_email)),
    )));
    registry.register(Function::new("isHostname").with_overload(Overload::new(
        "string_is_hostname",
        true,
        1,
        Arc::new(|args| string_predicate(args, "isHostname", is_hostname)),
    )));

    registry.register(
        Function::new("isIp")
            .with_overload(Overload::new(
                "string_is_ip",
                true,
                1,
                Arc::new(|args| string_predicate(args, "isIp", |s| is_ip(s, None))),
            ))
            .with_overload(Overload::new(
                "string_is_ip_version",
                true,
                2,
                Arc::new(is_ip_version_impl),
            )),
    );

    registry.register(
        Function::new("isIpPrefix")
            .with_overload(Overload::new(
                "string_is_ip_prefix",
                true,
                1,
                Arc::new(|args| string_predicate(args, "isIpPrefix", |s| is_ip_prefix(s, None, false))),
            ))
            .with_overload(Overload::new(
                "string_is_ip_prefix_version",
                true,
                2,
                Arc::new(is_ip_prefix_version_impl),
            ))
            .with_overload(Overload::new(
                "string_is_ip_prefix_version_strict",
                true,
                3,
                Arc::new(is_ip_prefix_strict_impl),
            )),
    );

    registry.register(Function::new("isUri").with_overload(Overload::new(
        "string_is_uri",
        true,
        1,
        Arc::new(|args| string_predicate(args, "isUri", is_uri)),
    )));
    registry.register(Function::new("isUriRef").with_overload(Overload::new(
        "string_is_uri_ref",
        true,
        1,
        Arc::new(|args| string_predicate(args, "isUriRef", is_uri_ref)),
    )));

    registry.register(Function::new("isHostAndPort").with_overload(Overload::new(
        "string_is_host_and_port",
        true,
        2,
        Arc::new(is_host_and_port_impl),
    )));

    registry.register(Function::new("unique").with_overload(Overload::new(
        "list_unique",
        true,
        1,
        Arc::new(unique_impl),
    )));

    registry.register(Function::new("isNan").with_overload(Overload::new(
        "double_is_nan",
        true,
        1,
        Arc::new(|args| double_predicate(args, "isNan", f64::is_nan)),
    )));
    registry.register(
        Function::new("isInf")
            .with_overload(Overload::new(
                "double_is_inf",
                true,
                1,
                Arc::new(|args| double_predicate(args, "isInf", f64::is_infinite)),
            ))
            .with_overload(Overload::new("double_is_inf_sign", true, 2, Arc::new(is_inf_sign_impl))),
    );

    registry
}

// ==================== Dispatch Helpers ====================

fn string_predicate(args: &[Value], name: &str, test: impl Fn(&str) -> bool) -> Value {
    match args.first() {
        Some(Value::String(s)) => Value::Bool(test(s)),
        _ => Value::error(EvalError::no_matching_overload(name)),
    }
}

fn double_predicate(args: &[Value], name: &str, test: impl Fn(f64) -> bool) -> Value {
    match args.first() {
        Some(Value::Double(d)) => Value::Bool(test(*d)),
        _ => Value::error(EvalError::no_matching_overload(name)),
    }
}

fn is_ip_version_impl(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::String(s)), Some(Value::Int(version))) => match version {
            0 => Value::Bool(is_ip(s, None)),
            4 | 6 => Value::Bool(is_ip(s, Some(*version as u8))),
            _ => Value::error(EvalError::invalid_argument("ip version must be 0, 4, or 6")),
        },
        _ => Value::error(EvalError::no_matching_overload("isIp")),
    }
}

fn is_ip_prefix_version_impl(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::String(s)), Some(Value::Int(version))) => match version {
            0 => Value::Bool(is_ip_prefix(s, None, false)),
            4 | 6 => Value::Bool(is_ip_prefix(s, Some(*version as u8), false)),
            _ => Value::error(EvalError::invalid_argument("ip version must be 0, 4, or 6")),
        },
        _ => Value::error(EvalError::no_matching_overload("isIpPrefix")),
    }
}

fn is_ip_prefix_strict_impl(args: &[Value]) -> Value {
    match (args.first(), args.get(1), args.get(2)) {
        (Some(Value::String(s)), Some(Value::Int(version)), Some(Value::Bool(strict))) => {
            match version {
                0 => Value::Bool(is_ip_prefix(s, None, *strict)),
                4 | 6 => Value::Bool(is_ip_prefix(s, Some(*version as u8), *strict)),
                _ => Value::error(EvalError::invalid_argument("ip version must be 0, 4, or 6")),
            }
        }
        _ => Value::error(EvalError::no_matching_overload("isIpPrefix")),
    }
}

fn is_host_and_port_impl(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::String(s)), Some(Value::Bool(port_required))) => {
            Value::Bool(is_host_and_port(s, *port_required))
        }
        _ => Value::error(EvalError::no_matching_overload("isHostAndPort")),
    }
}

fn is_inf_sign_impl(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::Double(d)), Some(Value::Int(sign))) => Value::Bool(match sign.signum() {
            1 => *d == f64::INFINITY,
            -1 => *d == f64::NEG_INFINITY,
            _ => d.is_infinite(),
        }),
        _ => Value::error(EvalError::no_matching_overload("isInf")),
    }
}

fn unique_impl(args: &[Value]) -> Value {
    let items = match args.first() {
        Some(Value::List(items)) => items,
        _ => return Value::error(EvalError::no_matching_overload("unique")),
    };

    // Uniqueness is defined for scalar and enum items; structural
    // equality for messages is not
    for item in items.iter() {
        if matches!(item, Value::Message(_)) {
            return Value::error(EvalError::invalid_argument(
                "unique is not defined for message items",
            ));
        }
    }

    for (i, item) in items.iter().enumerate() {
        if items[..i].contains(item) {
            return Value::Bool(false);
        }
    }
    Value::Bool(true)
}

// ==================== Format Checks ====================

/// RFC 1123 hostname: dot-separated labels of alphanumerics and hyphens,
/// each 1-63 octets, no leading/trailing hyphen, at most 253 octets in
/// total, and a non-all-numeric final label.
pub fn is_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = s.split('.').collect();

    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }
    }

    // The final label (TLD position) must not be all digits
    let last = labels[labels.len() - 1];
    !last.chars().all(|c| c.is_ascii_digit())
}

/// Email address in the practical RFC 5322 subset: a dot-atom local part
/// of at most 64 octets, one `@`, and a valid hostname domain.
pub fn is_email(s: &str) -> bool {
    let (local, domain) = match s.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    const ATOM_EXTRA: &str = "!#$%&'*+-/=?^_`{|}~.";
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ATOM_EXTRA.contains(c))
    {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    is_hostname(domain)
}

/// IP address check; `version` restricts to IPv4 or IPv6.
pub fn is_ip(s: &str, version: Option<u8>) -> bool {
    match version {
        Some(4) => s.parse::<Ipv4Addr>().is_ok(),
        Some(6) => s.parse::<Ipv6Addr>().is_ok(),
        _ => s.parse::<Ipv4Addr>().is_ok() || s.parse::<Ipv6Addr>().is_ok(),
    }
}

/// CIDR prefix check (`10.0.0.0/8`, `fd00::/48`). In strict mode the
/// address must be the network address (all host bits zero).
pub fn is_ip_prefix(s: &str, version: Option<u8>, strict: bool) -> bool {
    let (addr, len_str) = match s.split_once('/') {
        Some(parts) => parts,
        None => return false,
    };

    let prefix_len: u32 = match len_str.parse() {
        // The integer parser accepts a leading '+'; CIDR notation does not
        Ok(n) if len_str.chars().all(|c| c.is_ascii_digit()) => n,
        _ => return false,
    };

    if let Ok(v4) = addr.parse::<Ipv4Addr>() {
        if version == Some(6) || prefix_len > 32 {
            return false;
        }
        if strict {
            let bits = u32::from(v4);
            let mask = if prefix_len == 0 {
                0
            } else {
                u32::MAX << (32 - prefix_len)
            };
            return bits & !mask == 0;
        }
        return true;
    }

    if let Ok(v6) = addr.parse::<Ipv6Addr>() {
        if version == Some(4) || prefix_len > 128 {
            return false;
        }
        if strict {
            let bits = u128::from(v6);
            let mask = if prefix_len == 0 {
                0
            } else {
                u128::MAX << (128 - prefix_len)
            };
            return bits & !mask == 0;
        }
        return true;
    }

    false
}

/// Characters permitted anywhere in a URI (RFC 3986 unreserved, reserved,
/// and the percent sign for escapes).
fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '.' | '_' | '~' | ':' | '/' | '?' | '#' | '[' | ']' | '@' | '!' | '$' | '&'
                | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' | '%'
        )
}

/// Validate the URI character set and percent-escape well-formedness.
fn has_valid_uri_chars(s: &str) -> bool {
    if !s.chars().all(is_uri_char) {
        return false;
    }

    // Every % must start a %XX escape
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len()
                || !bytes[i + 1].is_ascii_hexdigit()
                || !bytes[i + 2].is_ascii_hexdigit()
            {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Absolute URI (RFC 3986): a scheme, a colon, and a well-formed remainder.
pub fn is_uri(s: &str) -> bool {
    let colon = match s.find(':') {
        Some(pos) if pos > 0 => pos,
        _ => return false,
    };

    let scheme = &s[..colon];
    let mut scheme_chars = scheme.chars();
    let first_ok = scheme_chars
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false);
    if !first_ok
        || !scheme_chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return false;
    }

    has_valid_uri_chars(&s[colon + 1..])
}

/// URI reference (RFC 3986): an absolute URI or a relative reference.
pub fn is_uri_ref(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    is_uri(s) || has_valid_uri_chars(s)
}

/// `host:port` pair: hostname, IPv4, or bracketed IPv6 host, with the
/// port optional unless `port_required`.
pub fn is_host_and_port(s: &str, port_required: bool) -> bool {
    if s.is_empty() {
        return false;
    }

    // Bracketed IPv6: [::1]:8080
    if let Some(rest) = s.strip_prefix('[') {
        let (host, after) = match rest.split_once(']') {
            Some(parts) => parts,
            None => return false,
        };
        if !is_ip(host, Some(6)) {
            return false;
        }
        return match after.strip_prefix(':') {
            Some(port) => is_port(port),
            None => after.is_empty() && !port_required,
        };
    }

    match s.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            (is_ip(host, Some(4)) || is_hostname(host)) && is_port(port)
        }
        // Unbracketed IPv6 has colons but no port
        Some(_) => !port_required && is_ip(s, Some(6)),
        None => !port_required && (is_ip(s, Some(4)) || is_hostname(s)),
    }
}

fn is_port(s: &str) -> bool {
    if s.is_empty() || s.len() > 5 || !s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // No leading zeros beyond the bare "0"
    if s.len() > 1 && s.starts_with('0') {
        return false;
    }
    s.parse::<u32>().map(|p| p <= 65535).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Evaluator, MapActivation};
    use crate::parser::parse;

    fn eval_with(source: &str, activation: &MapActivation) -> Value {
        let expr = parse(source).unwrap();
        let registry = format_registry();
        Evaluator::new(activation, &registry).eval(&expr)
    }

    #[test]
    fn hostnames() {
        assert!(is_hostname("example.com"));
        assert!(is_hostname("a.b-c.d"));
        assert!(is_hostname("localhost"));
        assert!(!is_hostname(""));
        assert!(!is_hostname("-leading.com"));
        assert!(!is_hostname("trailing-.com"));
        assert!(!is_hostname("under_score.com"));
        assert!(!is_hostname("double..dot"));
        assert!(!is_hostname("example.123"));
        assert!(!is_hostname(&"a".repeat(254)));
    }

    #[test]
    fn emails() {
        assert!(is_email("user@example.com"));
        assert!(is_email("first.last+tag@sub.example.com"));
        assert!(!is_email("no-at-sign"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("user@"));
        assert!(!is_email("user@@example.com"));
        assert!(!is_email("us..er@example.com"));
        assert!(!is_email(".user@example.com"));
        assert!(!is_email("user name@example.com"));
    }

    #[test]
    fn ips() {
        assert!(is_ip("192.168.0.1", None));
        assert!(is_ip("::1", None));
        assert!(is_ip("192.168.0.1", Some(4)));
        assert!(!is_ip("192.168.0.1", Some(6)));
        assert!(is_ip("fe80::1", Some(6)));
        assert!(!is_ip("999.0.0.1", None));
        assert!(!is_ip("example.com", None));
    }

    #[test]
    fn ip_prefixes() {
        assert!(is_ip_prefix("10.0.0.0/8", None, false));
        assert!(is_ip_prefix("10.0.0.0/8", Some(4), false));
        assert!(!is_ip_prefix("10.0.0.0/8", Some(6), false));
        assert!(is_ip_prefix("fd00::/48", None, false));
        assert!(!is_ip_prefix("10.0.0.0/33", None, false));
        assert!(!is_ip_prefix("10.0.0.0", None, false));
        // Strict: host bits must be zero
        assert!(is_ip_prefix("10.0.0.0/8", None, true));
        assert!(!is_ip_prefix("10.0.0.1/8", None, true));
        assert!(is_ip_prefix("10.0.0.1/32", None, true));
    }

    #[test]
    fn uris() {
        assert!(is_uri("https://example.com/path?q=1#frag"));
        assert!(is_uri("mailto:user@example.com"));
        assert!(is_uri("urn:isbn:0451450523"));
        assert!(!is_uri("not a uri"));
        assert!(!is_uri("//missing-scheme"));
        assert!(!is_uri("1http://bad-scheme"));
        assert!(!is_uri("https://example.com/%zz"));
    }

    #[test]
    fn uri_refs() {
        assert!(is_uri_ref("https://example.com"));
        assert!(is_uri_ref("/relative/path"));
        assert!(is_uri_ref("../up?query=1"));
        assert!(!is_uri_ref(""));
        assert!(!is_uri_ref("has space"));
    }

    #[test]
    fn host_and_port() {
        assert!(is_host_and_port("example.com:8080", true));
        assert!(is_host_and_port("192.168.0.1:80", true));
        assert!(is_host_and_port("[::1]:443", true));
        assert!(is_host_and_port("example.com", false));
        assert!(!is_host_and_port("example.com", true));
        assert!(!is_host_and_port("example.com:99999", true));
        assert!(!is_host_and_port("example.com:0080", true));
        assert!(!is_host_and_port("", false));
    }

    #[test]
    fn method_dispatch() {
        let activation = MapActivation::new().with_binding("this", "user@example.com");
        assert_eq!(eval_with("this.isEmail()", &activation), Value::Bool(true));
        assert_eq!(eval_with("this.isHostname()", &activation), Value::Bool(false));

        let activation = MapActivation::new().with_binding("this", "10.0.0.1");
        assert_eq!(eval_with("this.isIp()", &activation), Value::Bool(true));
        assert_eq!(eval_with("this.isIp(4)", &activation), Value::Bool(true));
        assert_eq!(eval_with("this.isIp(6)", &activation), Value::Bool(false));
    }

    #[test]
    fn unique_lists() {
        let activation = MapActivation::new().with_binding(
            "this",
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        );
        assert_eq!(eval_with("this.unique()", &activation), Value::Bool(true));

        let activation = MapActivation::new().with_binding(
            "this",
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(1)]),
        );
        assert_eq!(eval_with("this.unique()", &activation), Value::Bool(false));

        let activation =
            MapActivation::new().with_binding("this", Value::list(Vec::new()));
        assert_eq!(eval_with("this.unique()", &activation), Value::Bool(true));
    }

    #[test]
    fn nan_and_inf() {
        let activation = MapActivation::new().with_binding("this", f64::NAN);
        assert_eq!(eval_with("this.isNan()", &activation), Value::Bool(true));
        assert_eq!(eval_with("this.isInf()", &activation), Value::Bool(false));

        let activation = MapActivation::new().with_binding("this", f64::INFINITY);
        assert_eq!(eval_with("this.isInf()", &activation), Value::Bool(true));
        assert_eq!(eval_with("this.isInf(1)", &activation), Value::Bool(true));
        assert_eq!(eval_with("this.isInf(-1)", &activation), Value::Bool(false));

        let activation = MapActivation::new().with_binding("this", 1.5f64);
        assert_eq!(eval_with("this.isNan()", &activation), Value::Bool(false));
        assert_eq!(eval_with("this.isInf()", &activation), Value::Bool(false));
    }
}
