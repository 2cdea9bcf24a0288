//! Property-based tests for reference text encoding.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    /// Strategy for `type:id` reference components.
    fn object_ref_strategy() -> impl Strategy<Value = (String, String)> {
        ("[a-z]{1,10}", "[a-z0-9-]{1,20}")
    }

    proptest! {
        #[test]
        fn object_ref_display_parse_roundtrip((object_type, object_id) in object_ref_strategy()) {
            use crate::model::ObjectRef;
            let object = ObjectRef::new(&object_type, &object_id);
            let parsed = ObjectRef::parse(&object.to_string());
            prop_assert!(parsed.is_ok());
            prop_assert_eq!(parsed.unwrap(), object);
        }

        #[test]
        fn userset_subject_display_parse_roundtrip(
            (object_type, object_id) in object_ref_strategy(),
            relation in "[a-z_]{1,15}"
        ) {
            use crate::model::Subject;
            let subject = Subject::userset(&object_type, &object_id, &relation);
            let parsed = Subject::parse(&subject.to_string());
            prop_assert!(parsed.is_ok());
            prop_assert_eq!(parsed.unwrap(), subject);
        }

        #[test]
        fn text_without_colon_is_rejected(s in "[a-z]{1,20}") {
            use crate::model::Subject;
            prop_assert!(Subject::parse(&s).is_err());
        }
    }
}
