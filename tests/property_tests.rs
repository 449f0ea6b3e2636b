// Property-based tests for the pure translation stages
// Author: kelexine (https://github.com/kelexine)

use fhir2spine::models::{ExchangeOutcome, FormatSource, InboundQuery, RequestedFormat};
use fhir2spine::translation::{build_simple_trace, classify};
use proptest::prelude::*;

const SENDER: &str = "111111111111";
const TARGET: &str = "928942012545";
const URL: &str = "https://spine.test/sync-service";
const FROM: &str = "https://gateway.test/fhir";

fn build(family: &str, gender: &str, birthdate: &str) -> fhir2spine::error::Result<String> {
    build_simple_trace(Some(family), Some(gender), Some(birthdate), SENDER, TARGET, URL, FROM)
}

fn gender() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["male", "female", "other", "unknown", "M", "F", "O", "U"])
}

fn birthdate() -> impl Strategy<Value = String> {
    (1900i32..2024, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d))
}

proptest! {
    #[test]
    fn prop_non_2xx_never_succeeds(status in 100u16..600, body in ".*") {
        let outcome = classify(Some(status), &body);
        if (200..300).contains(&status) {
            prop_assert_eq!(outcome, ExchangeOutcome::Success { body });
        } else {
            let is_transport = matches!(outcome, ExchangeOutcome::TransportError { status: Some(s), .. } if s == status);
            prop_assert!(is_transport);
        }
    }

    #[test]
    fn prop_connection_failure_is_transport(reason in ".*") {
        let is_transport = matches!(classify(None, &reason), ExchangeOutcome::TransportError { status: None, .. });
        prop_assert!(is_transport);
    }

    #[test]
    fn prop_builder_is_idempotent(
        family in "[A-Za-z][A-Za-z' &<>-]{0,29}",
        gender in gender(),
        birthdate in birthdate(),
    ) {
        let first = build(&family, gender, &birthdate).unwrap();
        let second = build(&family, gender, &birthdate).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_builder_escapes_family(family in "[A-Za-z][A-Za-z<>&\"' ]{0,29}") {
        let body = build(&family, "F", "1980-01-01").unwrap();
        let start = body.find("<family>").unwrap() + "<family>".len();
        let end = body[start..].find("</family>").unwrap() + start;
        let rendered = &body[start..end];
        prop_assert!(!rendered.contains('<'));
        prop_assert!(!rendered.contains('>'));
    }

    #[test]
    fn prop_builder_rejects_bad_gender(gender in "[a-z]{2,8}") {
        prop_assume!(!["male", "female", "other", "unknown"].contains(&gender.as_str()));
        prop_assert!(build("Smith", &gender, "1980-01-01").is_err());
    }

    #[test]
    fn prop_format_parameter_always_wins(value in "[a-z+/]{1,20}", accept in "[a-z+/]{0,30}") {
        let query = InboundQuery::new("GET", "/fhir/Patient")
            .with_param("_format", value.clone())
            .with_header("Accept", format!("application/fhir+{}", accept));
        let format = RequestedFormat::resolve(&query, "application/fhir+xml");
        prop_assert_eq!(format.value, value);
        prop_assert_eq!(format.source, FormatSource::Parameter);
    }
}
