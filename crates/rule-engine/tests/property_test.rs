//! 比较与逻辑操作符的性质测试
//!
//! 覆盖相等/同一的互补性、宽松相等的对称性、排序的反对称性和逻辑组合的真值表。

use proptest::{prelude::*, test_runner::Config};
use rule_engine::{
    Comparison, ComparisonOperator, Context, Datum, LogicalGroup, Proposition, Value,
};
use serde_json::json;
use std::sync::Arc;

prop_compose! {
    fn generate_scalar()(
        datum in prop_oneof![
            Just(json!(null)),
            any::<bool>().prop_map(|b| json!(b)),
            any::<i32>().prop_map(|n| json!(n)),
            (-1000.0f64..1000.0).prop_map(|f| json!(f)),
            "[a-z0-9]{0,6}".prop_map(|s| json!(s)),
            any::<i16>().prop_map(|n| json!(n.to_string())),
        ]
    ) -> Datum {
        datum
    }
}

prop_compose! {
    fn generate_datum()(
        datum in prop_oneof![
            3 => generate_scalar(),
            1 => prop::collection::vec(generate_scalar(), 0..4).prop_map(Datum::Array),
        ]
    ) -> Datum {
        datum
    }
}

fn check(operator: ComparisonOperator, left: &Datum, right: &Datum) -> bool {
    Comparison::new(operator, Value::new(left.clone()), Value::new(right.clone()))
        .evaluate(&Context::new())
        .unwrap()
}

fn constant(b: bool) -> Arc<dyn Proposition> {
    Arc::new(Comparison::new(
        ComparisonOperator::SameAs,
        Value::new(json!(b)),
        Value::new(json!(true)),
    ))
}

proptest! {
    #![proptest_config(Config {
        failure_persistence: None,
        ..Config::default()
    })]

    #[test]
    fn prop_not_equal_is_negation_of_equal(left in generate_datum(), right in generate_datum()) {
        prop_assert_eq!(
            check(ComparisonOperator::NotEqualTo, &left, &right),
            !check(ComparisonOperator::EqualTo, &left, &right)
        );
    }

    #[test]
    fn prop_not_same_is_negation_of_same(left in generate_datum(), right in generate_datum()) {
        prop_assert_eq!(
            check(ComparisonOperator::NotSameAs, &left, &right),
            !check(ComparisonOperator::SameAs, &left, &right)
        );
    }

    #[test]
    fn prop_loose_equality_is_symmetric(left in generate_datum(), right in generate_datum()) {
        prop_assert_eq!(
            check(ComparisonOperator::EqualTo, &left, &right),
            check(ComparisonOperator::EqualTo, &right, &left)
        );
    }

    #[test]
    fn prop_same_implies_equal(datum in generate_datum()) {
        prop_assert!(check(ComparisonOperator::SameAs, &datum, &datum));
        prop_assert!(check(ComparisonOperator::EqualTo, &datum, &datum));
    }

    #[test]
    fn prop_empty_subset_always_contained(datum in generate_datum()) {
        prop_assert!(check(ComparisonOperator::ContainsSubset, &datum, &json!([])));
        prop_assert!(!check(ComparisonOperator::DoesNotContainSubset, &datum, &json!([])));
    }

    #[test]
    fn prop_number_equals_its_string_form(n in any::<i64>()) {
        let number = json!(n);
        let text = json!(n.to_string());
        prop_assert!(check(ComparisonOperator::EqualTo, &number, &text));
        prop_assert!(!check(ComparisonOperator::SameAs, &number, &text));
    }

    #[test]
    fn prop_ordering_is_antisymmetric(a in any::<i64>(), b in any::<i64>()) {
        let (a, b) = (json!(a), json!(b));
        prop_assert_eq!(
            check(ComparisonOperator::GreaterThan, &a, &b),
            check(ComparisonOperator::LessThan, &b, &a)
        );
        prop_assert_eq!(
            check(ComparisonOperator::GreaterThanOrEqualTo, &a, &b),
            !check(ComparisonOperator::LessThan, &a, &b)
        );
    }

    #[test]
    fn prop_logical_groups_follow_truth_tables(flags in prop::collection::vec(any::<bool>(), 1..6)) {
        let ctx = Context::new();
        let operands: Vec<_> = flags.iter().map(|b| constant(*b)).collect();

        let and = LogicalGroup::and(operands.clone()).evaluate(&ctx).unwrap();
        let or = LogicalGroup::or(operands.clone()).evaluate(&ctx).unwrap();
        let xor = LogicalGroup::xor(operands).evaluate(&ctx).unwrap();

        prop_assert_eq!(and, flags.iter().all(|b| *b));
        prop_assert_eq!(or, flags.iter().any(|b| *b));
        prop_assert_eq!(xor, flags.iter().filter(|b| **b).count() % 2 == 1);
    }
}
