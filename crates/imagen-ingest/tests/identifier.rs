//! Property tests for subject identifier normalization.

use imagen_ingest::{IdentifierNormalizer, normalize_plain, normalize_user_code};
use imagen_model::{Session, SubjectId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn user_code_is_first_twelve_digits(
        prefix in "[0-9]{12}",
        suffix in "[A-Za-z0-9_-]{0,16}",
    ) {
        let raw = format!("{prefix}{suffix}");
        let expected: i64 = prefix.parse().unwrap();
        prop_assert_eq!(normalize_user_code(&raw).unwrap(), SubjectId(expected));
    }

    #[test]
    fn equal_prefixes_normalize_equal(
        prefix in "[0-9]{12}",
        a in "[A-Z-]{0,8}",
        b in "[A-Z-]{0,8}",
    ) {
        let left = normalize_user_code(&format!("{prefix}{a}")).unwrap();
        let right = normalize_user_code(&format!("{prefix}{b}")).unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn short_codes_are_rejected(raw in "[0-9]{1,11}") {
        prop_assert!(normalize_user_code(&raw).is_err());
    }

    #[test]
    fn plain_ids_round_trip(id in 0i64..1_000_000_000_000) {
        prop_assert_eq!(normalize_plain(&id.to_string()).unwrap(), SubjectId(id));
        prop_assert_eq!(normalize_plain(&format!("{id}.0")).unwrap(), SubjectId(id));
    }

    #[test]
    fn session_decides_encoding(id in 1i64..999_999_999_999) {
        let normalizer = IdentifierNormalizer::new([Session::FollowUp3]);
        let user_code = format!("{id:012}-C");
        prop_assert_eq!(
            normalizer.normalize(&user_code, Session::Baseline).unwrap(),
            SubjectId(id)
        );
        prop_assert_eq!(
            normalizer.normalize(&id.to_string(), Session::FollowUp3).unwrap(),
            SubjectId(id)
        );
    }
}
