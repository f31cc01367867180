//! Value conversions.
//!
//! Each converter looks at one term, records an error against it when the
//! value is unusable, and returns the converted value otherwise. The caller
//! writes the value; a failed conversion leaves the destination untouched.

use crate::diagnostics::{ConfigErrors, ErrorKind};
use crate::lexer::{SignOp, TermType};
use crate::schema::{Fsid, IntField, Integer, StrField, TokenTable};
use crate::tree::{Location, NodeRef, Term};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

/// Location of `term` inside statement `node`.
pub(super) fn term_location(node: NodeRef<'_>, term: &Term) -> Location {
    Location {
        line: term.line(),
        ..node.location()
    }
}

fn invalid(errs: &mut ConfigErrors, node: NodeRef<'_>, term: &Term, message: String) {
    errs.record_at(ErrorKind::Invalid, term_location(node, term), message);
}

fn radix_digits(text: &str, kind: TermType) -> Option<(&str, u32)> {
    match kind {
        TermType::DecNum => Some((text, 10)),
        TermType::HexNum => Some((&text[2..], 16)),
        TermType::OctNum => Some((&text[1..], 8)),
        _ => None,
    }
}

/// Parse an integer term and check it against `field`'s bounds.
pub(super) fn number<T, V: Integer>(
    field: &IntField<T, V>,
    node: NodeRef<'_>,
    term: &Term,
    errs: &mut ConfigErrors,
) -> Option<V> {
    let value = signed_value::<V>(node, term, errs)?;
    if value == 0 && field.zero_ok {
        return Some(V::from_i128(0));
    }
    if value < field.min.to_i128() || value > field.max.to_i128() {
        invalid(errs, node, term, format!("({term}) is out of range"));
        return None;
    }
    Some(V::from_i128(value))
}

/// Parse an integer term, applying its sign operator for the width of `V`.
fn signed_value<V: Integer>(node: NodeRef<'_>, term: &Term, errs: &mut ConfigErrors) -> Option<i128> {
    let Some((digits, radix)) = radix_digits(term.text(), term.kind()) else {
        invalid(
            errs,
            node,
            term,
            format!("Expected a number, got a {}", term.kind()),
        );
        return None;
    };
    let Ok(magnitude) = u64::from_str_radix(digits, radix) else {
        invalid(errs, node, term, format!("({term}) is not an integer"));
        return None;
    };

    match (V::SIGNED, term.op()) {
        (_, None) => Some(i128::from(magnitude)),
        (true, Some(SignOp::Minus)) => Some(-i128::from(magnitude)),
        (false, Some(SignOp::Tilde)) => {
            let mask = u64::try_from(V::MAX_VALUE).unwrap_or(u64::MAX);
            if magnitude & !mask != 0 {
                invalid(errs, node, term, format!("({term}) is out of range"));
                return None;
            }
            Some(i128::from(!magnitude & mask))
        }
        (signed, Some(op)) => {
            let what = if signed { "signed" } else { "unsigned" };
            invalid(
                errs,
                node,
                term,
                format!("({}) is not allowed for {what} values", op.as_char()),
            );
            None
        }
    }
}

/// Parse a port number in `[min, max]`.
pub(super) fn port(
    min: u16,
    max: u16,
    node: NodeRef<'_>,
    term: &Term,
    errs: &mut ConfigErrors,
) -> Option<u16> {
    let value = signed_value::<u16>(node, term, errs)?;
    if value < i128::from(min) || value > i128::from(max) {
        invalid(errs, node, term, format!("({term}) is out of range"));
        return None;
    }
    Some(u16::from_i128(value))
}

fn fsid_part(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

/// Parse `<major>.<minor>`.
pub(super) fn fsid(node: NodeRef<'_>, term: &Term, errs: &mut ConfigErrors) -> Option<Fsid> {
    if term.kind() != TermType::Fsid {
        invalid(
            errs,
            node,
            term,
            format!("Expected an FSID, got a {}", term.kind()),
        );
        return None;
    }
    let Some((major, minor)) = term.text().split_once('.') else {
        invalid(errs, node, term, format!("({term}) is not an FSID"));
        return None;
    };
    let Some(major) = fsid_part(major) else {
        invalid(errs, node, term, format!("({term}) major is out of range"));
        return None;
    };
    let Some(minor) = fsid_part(minor) else {
        invalid(errs, node, term, format!("({term}) minor is out of range"));
        return None;
    };
    Some(Fsid { major, minor })
}

/// Copy a string value, checking its length.
pub(super) fn string<T>(
    field: &StrField<T>,
    name: &str,
    node: NodeRef<'_>,
    term: &Term,
    errs: &mut ConfigErrors,
) -> Option<String> {
    let len = term.text().len();
    if len < field.min_len || len > field.max_len {
        invalid(
            errs,
            node,
            term,
            format!(
                "{name} length {len} is outside {}..={}",
                field.min_len, field.max_len
            ),
        );
        return None;
    }
    Some(term.text().to_string())
}

/// Accept the boolean spellings classified by the lexer.
pub(super) fn boolean(node: NodeRef<'_>, term: &Term, errs: &mut ConfigErrors) -> Option<bool> {
    match term.kind() {
        TermType::True => Some(true),
        TermType::False => Some(false),
        _ => {
            invalid(
                errs,
                node,
                term,
                format!("Expected boolean (true/false) got ({term})"),
            );
            None
        }
    }
}

fn lookup(table: TokenTable, word: &str) -> Option<u32> {
    table
        .iter()
        .find(|(token, _)| token.eq_ignore_ascii_case(word))
        .map(|&(_, value)| value)
}

/// Look one word up in `table`.
pub(super) fn token(
    table: TokenTable,
    node: NodeRef<'_>,
    term: &Term,
    errs: &mut ConfigErrors,
) -> Option<u32> {
    let found = lookup(table, term.text());
    if found.is_none() {
        errs.record_at(
            ErrorKind::Bogus,
            term_location(node, term),
            format!("Unknown token ({term})"),
        );
    }
    found
}

/// OR together every word of the statement. Each unknown word is reported;
/// the result is only returned when every word was recognized.
pub(super) fn list(table: TokenTable, node: NodeRef<'_>, errs: &mut ConfigErrors) -> Option<u32> {
    let mut bits = 0;
    let mut unknown = 0;
    for term in node.terms() {
        match lookup(table, term.text()) {
            Some(value) => bits |= value,
            None => {
                errs.record_at(
                    ErrorKind::Bogus,
                    term_location(node, term),
                    format!("Unknown token ({term})"),
                );
                unknown += 1;
            }
        }
    }
    (unknown == 0).then_some(bits)
}

/// Turn an address literal or host name into an [`IpAddr`].
///
/// IPv6 answers are preferred for host names; explicit IPv4 literals stay
/// IPv4.
pub(super) fn ip_addr(node: NodeRef<'_>, term: &Term, errs: &mut ConfigErrors) -> Option<IpAddr> {
    let text = term.text();
    let parsed = match term.kind() {
        TermType::V4Addr | TermType::V4Any => text
            .parse::<Ipv4Addr>()
            .map(IpAddr::V4)
            .map_err(|e| e.to_string()),
        TermType::V6Addr => text
            .parse::<Ipv6Addr>()
            .map(IpAddr::V6)
            .map_err(|e| e.to_string()),
        TermType::Token => resolve_host(text),
        other => {
            invalid(
                errs,
                node,
                term,
                format!("Expected an IP address, got a {other}"),
            );
            return None;
        }
    };
    match parsed {
        Ok(addr) => Some(addr),
        Err(reason) => {
            invalid(
                errs,
                node,
                term,
                format!("No IP address found for {text} because: {reason}"),
            );
            None
        }
    }
}

fn resolve_host(host: &str) -> Result<IpAddr, String> {
    let addrs: Vec<IpAddr> = (host, 0)
        .to_socket_addrs()
        .map_err(|e| e.to_string())?
        .map(|sa| sa.ip())
        .collect();
    addrs
        .iter()
        .find(|a| a.is_ipv6())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| "no addresses returned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::parse_str;
    use crate::tree::ParseTree;

    struct Dummy;

    fn tree(value: &str) -> ParseTree {
        parse_str("t", &format!("X = {value};")).unwrap()
    }

    fn with_term<R>(value: &str, f: impl FnOnce(NodeRef<'_>, &Term, &mut ConfigErrors) -> R) -> (R, ConfigErrors) {
        let tree = tree(value);
        let node = tree.root().children().next().unwrap();
        let mut errs = ConfigErrors::new();
        let out = f(node, &node.terms()[0], &mut errs);
        (out, errs)
    }

    fn int_field<V: Integer>(min: V, max: V) -> IntField<Dummy, V> {
        fn never<V>(_: &mut Dummy) -> &mut V {
            unreachable!()
        }
        IntField {
            min,
            max,
            default: min,
            zero_ok: false,
            access: never::<V>,
        }
    }

    #[test]
    fn test_number_bases() {
        let f = int_field::<u32>(0, 1000);
        assert_eq!(with_term("0x1f", |n, t, e| number(&f, n, t, e)).0, Some(31));
        assert_eq!(with_term("017", |n, t, e| number(&f, n, t, e)).0, Some(15));
        assert_eq!(with_term("99", |n, t, e| number(&f, n, t, e)).0, Some(99));
    }

    #[test]
    fn test_number_out_of_range() {
        let f = int_field::<u32>(0, 10);
        let (v, errs) = with_term("50", |n, t, e| number(&f, n, t, e));
        assert_eq!(v, None);
        assert_eq!(errs.count_of(ErrorKind::Invalid), 1);
        assert!(errs.diagnostics()[0].message.contains("out of range"));
    }

    #[test]
    fn test_zero_ok() {
        let mut f = int_field::<u32>(5, 10);
        assert_eq!(with_term("0", |n, t, e| number(&f, n, t, e)).0, None);
        f.zero_ok = true;
        assert_eq!(with_term("0", |n, t, e| number(&f, n, t, e)).0, Some(0));
    }

    #[test]
    fn test_signs() {
        let signed = int_field::<i32>(-100, 100);
        assert_eq!(with_term("-42", |n, t, e| number(&signed, n, t, e)).0, Some(-42));
        let (v, errs) = with_term("~1", |n, t, e| number(&signed, n, t, e));
        assert_eq!(v, None);
        assert!(errs.diagnostics()[0].message.contains("not allowed for signed"));

        let unsigned = int_field::<u16>(0, u16::MAX);
        assert_eq!(with_term("~0", |n, t, e| number(&unsigned, n, t, e)).0, Some(u16::MAX));
        assert_eq!(with_term("~0xff", |n, t, e| number(&unsigned, n, t, e)).0, Some(0xff00));
        let (v, errs) = with_term("-1", |n, t, e| number(&unsigned, n, t, e));
        assert_eq!(v, None);
        assert!(errs.diagnostics()[0].message.contains("not allowed for unsigned"));
    }

    #[test]
    fn test_tilde_wider_than_type() {
        let f = int_field::<u16>(0, u16::MAX);
        let (v, errs) = with_term("~0x10000", |n, t, e| number(&f, n, t, e));
        assert_eq!(v, None);
        assert!(errs.has(ErrorKind::Invalid));
    }

    #[test]
    fn test_number_overflow() {
        let f = int_field::<u64>(0, u64::MAX);
        let (v, errs) = with_term("18446744073709551616", |n, t, e| number(&f, n, t, e));
        assert_eq!(v, None);
        assert!(errs.diagnostics()[0].message.contains("not an integer"));
    }

    #[test]
    fn test_not_a_number() {
        let f = int_field::<u32>(0, 10);
        let (v, errs) = with_term("ten", |n, t, e| number(&f, n, t, e));
        assert_eq!(v, None);
        assert!(errs.diagnostics()[0].message.contains("Expected a number"));
    }

    #[test]
    fn test_fsid() {
        let (v, _) = with_term("0x10.017", |n, t, e| fsid(n, t, e));
        assert_eq!(v, Some(Fsid { major: 16, minor: 15 }));
        let (v, errs) = with_term("12", |n, t, e| fsid(n, t, e));
        assert_eq!(v, None);
        assert!(errs.has(ErrorKind::Invalid));
    }

    #[test]
    fn test_boolean() {
        assert_eq!(with_term("Yes", |n, t, e| boolean(n, t, e)).0, Some(true));
        assert_eq!(with_term("off", |n, t, e| boolean(n, t, e)).0, Some(false));
        let (v, errs) = with_term("maybe", |n, t, e| boolean(n, t, e));
        assert_eq!(v, None);
        assert_eq!(errs.count_of(ErrorKind::Invalid), 1);
    }

    const LEVELS: TokenTable = &[("INFO", 1), ("DEBUG", 2), ("FULL_DEBUG", 4)];

    #[test]
    fn test_token_lookup() {
        assert_eq!(with_term("debug", |n, t, e| token(LEVELS, n, t, e)).0, Some(2));
        let (v, errs) = with_term("LOUD", |n, t, e| token(LEVELS, n, t, e));
        assert_eq!(v, None);
        assert!(errs.has(ErrorKind::Bogus));
    }

    #[test]
    fn test_list_all_or_nothing() {
        let t = parse_str("t", "X = info, full_debug;").unwrap();
        let mut errs = ConfigErrors::new();
        assert_eq!(list(LEVELS, t.root().children().next().unwrap(), &mut errs), Some(5));

        let t = parse_str("t", "X = info, nope, other;").unwrap();
        assert_eq!(list(LEVELS, t.root().children().next().unwrap(), &mut errs), None);
        assert_eq!(errs.count_of(ErrorKind::Bogus), 2);
    }

    #[test]
    fn test_ip_literals() {
        assert_eq!(
            with_term("10.1.2.3", |n, t, e| ip_addr(n, t, e)).0,
            Some(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)))
        );
        assert_eq!(
            with_term("::1", |n, t, e| ip_addr(n, t, e)).0,
            Some(IpAddr::V6(Ipv6Addr::LOCALHOST))
        );
        let (v, errs) = with_term("300.1.1.1", |n, t, e| ip_addr(n, t, e));
        assert_eq!(v, None);
        assert!(errs.has(ErrorKind::Invalid));
        let (v, errs) = with_term("/srv", |n, t, e| ip_addr(n, t, e));
        assert_eq!(v, None);
        assert!(errs.diagnostics()[0].message.contains("Expected an IP address"));
    }

    #[test]
    fn test_ip_localhost_resolves() {
        let (v, _) = with_term("localhost", |n, t, e| ip_addr(n, t, e));
        assert!(v.is_some_and(|ip| ip.is_loopback()));
    }

    #[test]
    fn test_error_uses_term_line() {
        let tree = parse_str("t", "X = 1,\n  2,\n  zz;").unwrap();
        let node = tree.root().children().next().unwrap();
        let mut errs = ConfigErrors::new();
        assert_eq!(token(LEVELS, node, &node.terms()[2], &mut errs), None);
        assert_eq!(errs.diagnostics()[0].location.line, 3);
    }
}
