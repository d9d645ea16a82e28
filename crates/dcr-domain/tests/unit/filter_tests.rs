//! Property tests for provider filters

use dcr_domain::{Filter, Properties};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    /// Printing a parsed equality filter yields an equivalent filter
    #[test]
    fn test_equality_filter_display_roundtrip(
        key in "[a-z][a-z.]{0,8}",
        value in "[a-zA-Z0-9*()\\\\ ]{1,12}",
    ) {
        let escaped: String = value
            .chars()
            .flat_map(|c| {
                if matches!(c, '*' | '(' | ')' | '\\') {
                    vec!['\\', c]
                } else {
                    vec![c]
                }
            })
            .collect();
        let filter = Filter::parse(&format!("({key}={escaped})")).unwrap();

        prop_assert_eq!(Filter::parse(&filter.to_string()).unwrap(), filter.clone());

        let mut props = Properties::new();
        props.insert(key.clone(), json!(value));
        prop_assert!(filter.matches(&props));
    }

    /// Numeric bounds agree with integer ordering
    #[test]
    fn test_numeric_bounds_agree_with_ordering(actual in -1000i64..1000, bound in -1000i64..1000) {
        let mut props = Properties::new();
        props.insert("rank".to_string(), json!(actual));

        let ge = Filter::parse(&format!("(rank>={bound})")).unwrap();
        let le = Filter::parse(&format!("(rank<={bound})")).unwrap();

        prop_assert_eq!(ge.matches(&props), actual >= bound);
        prop_assert_eq!(le.matches(&props), actual <= bound);
    }
}

#[test]
fn test_filter_serde_uses_text_form() {
    let filter = Filter::parse("(&(a=1)(b=*))").unwrap();
    let json = serde_json::to_string(&filter).unwrap();
    assert_eq!(json, "\"(&(a=1)(b=*))\"");

    let back: Filter = serde_json::from_str(&json).unwrap();
    assert_eq!(back, filter);
    assert!(serde_json::from_str::<Filter>("\"(a=\"").is_err());
}
