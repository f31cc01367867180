//! Property-based tests for the binding engine.

use super::{default_init, load_config_from_parse};
use crate::builder::parse_str;
use crate::diagnostics::{ConfigErrors, ErrorKind};
use crate::schema::{BlockDescriptor, EmbeddedBlock, FieldDescriptor, FieldFlags};
use proptest::prelude::*;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Limits {
    count: i32,
    size: u64,
    mode: u32,
    name: Option<String>,
    on: bool,
}

const MODES: crate::schema::TokenTable = &[("fast", 0x1), ("safe", 0x2)];

fn limits_fields(min: i32, max: i32) -> Vec<FieldDescriptor<Limits>> {
    vec![
        FieldDescriptor::int32("Count", min, max, min, |l: &mut Limits| &mut l.count),
        FieldDescriptor::uint64("Size", 0, 1 << 40, 4096, |l: &mut Limits| &mut l.size),
        FieldDescriptor::enumeration("Mode", MODES, 0x2, 0x3, |l: &mut Limits| &mut l.mode),
        FieldDescriptor::string("Name", 0, 32, Some("limits"), |l: &mut Limits| &mut l.name),
        FieldDescriptor::boolean("On", true, |l: &mut Limits| &mut l.on),
    ]
}

fn limits_desc(min: i32, max: i32, flags: FieldFlags) -> BlockDescriptor<EmbeddedBlock<Limits>> {
    let mut fields = limits_fields(min, max);
    fields[0].flags |= flags;
    BlockDescriptor::new("Limits", fields, EmbeddedBlock::new())
}

fn bind(text: &str, desc: &BlockDescriptor<EmbeddedBlock<Limits>>) -> (Limits, ConfigErrors) {
    let tree = parse_str("prop.conf", text).unwrap();
    let mut out = Limits::default();
    let mut errs = ConfigErrors::new();
    let _ = load_config_from_parse(&tree, desc, &mut out, false, &mut errs);
    (out, errs)
}

fn bounds() -> impl Strategy<Value = (i32, i32)> {
    (-100_000i32..100_000, 0i32..100_000).prop_map(|(min, span)| (min, min + span))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    // Default initialization gives the same structure every time
    #[test]
    fn default_init_idempotent((min, max) in bounds()) {
        let fields = limits_fields(min, max);
        let mut first = Limits::default();
        let mut second = Limits::default();
        default_init(&fields, &mut first);
        default_init(&fields, &mut second);
        prop_assert_eq!(&first, &second);

        let (bound, errs) = bind("Limits { }", &limits_desc(min, max, FieldFlags::empty()));
        prop_assert!(errs.is_error_free());
        prop_assert_eq!(bound, first);
    }

    // Bounds are inclusive; one step outside is exactly one invalid error
    #[test]
    fn integer_range_enforced((min, max) in bounds()) {
        let desc = limits_desc(min, max, FieldFlags::empty());
        for value in [min, max] {
            let (out, errs) = bind(&format!("Limits {{ Count = {value}; }}"), &desc);
            prop_assert!(errs.is_error_free());
            prop_assert_eq!(out.count, value);
        }
        for value in [min - 1, max + 1] {
            let (out, errs) = bind(&format!("Limits {{ Count = {value}; }}"), &desc);
            prop_assert_eq!(errs.error_count(), 1);
            prop_assert_eq!(errs.count_of(ErrorKind::Invalid), 1);
            prop_assert_eq!(out.count, min);
        }
    }

    // Repeated fields apply in file order; unique fields keep the first value
    #[test]
    fn repeated_values_in_order(values in prop::collection::vec(0i32..1000, 1..8)) {
        let body: String = values.iter().map(|v| format!("Count = {v};\n")).collect();
        let text = format!("Limits {{\n{body}}}");

        let (out, errs) = bind(&text, &limits_desc(0, 1000, FieldFlags::empty()));
        prop_assert!(errs.is_error_free());
        prop_assert_eq!(out.count, *values.last().unwrap());

        let (out, errs) = bind(&text, &limits_desc(0, 1000, FieldFlags::UNIQUE));
        prop_assert_eq!(errs.count_of(ErrorKind::Unique), values.len() - 1);
        prop_assert_eq!(errs.error_count(), values.len() - 1);
        prop_assert_eq!(out.count, values[0]);
    }
}
