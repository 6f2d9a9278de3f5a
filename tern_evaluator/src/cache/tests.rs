use super::*;
use crate::test_requests::{Lookup, Product, Sum};
use proptest::prelude::*;

#[test]
fn get_returns_what_was_inserted() {
    let mut cache = RequestCache::new();
    assert!(cache.is_empty());

    cache.insert(Sum::new((2, 3)), 5);
    assert_eq!(cache.get(&Sum::new((2, 3))), Some(&5));
    assert_eq!(cache.get(&Sum::new((3, 2))), None);
    assert!(cache.contains(&Sum::new((2, 3))));
    assert_eq!(cache.len(), 1);
}

#[test]
fn same_inputs_of_different_types_do_not_collide() {
    let mut cache = RequestCache::new();
    cache.insert(Sum::new((2, 3)), 5);
    cache.insert(Product::new((2, 3)), 6);

    assert_eq!(cache.get(&Sum::new((2, 3))), Some(&5));
    assert_eq!(cache.get(&Product::new((2, 3))), Some(&6));
}

#[test]
#[should_panic(expected = "already cached")]
fn inserting_twice_panics() {
    let mut cache = RequestCache::new();
    cache.insert(Sum::new((1, 1)), 2);
    cache.insert(Sum::new((1, 1)), 2);
}

#[test]
fn erase_removes_one_entry() {
    let mut cache = RequestCache::new();
    cache.insert(Sum::new((1, 1)), 2);
    cache.insert(Sum::new((1, 2)), 3);

    assert!(cache.erase(&Sum::new((1, 1))));
    assert!(!cache.erase(&Sum::new((1, 1))));
    assert!(!cache.erase(&Product::new((1, 1))));
    assert_eq!(cache.get(&Sum::new((1, 2))), Some(&3));

    // The entry can be cached again once erased.
    cache.insert(Sum::new((1, 1)), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn clear_empties_every_table() {
    let mut cache = RequestCache::new();
    cache.insert(Sum::new((1, 1)), 2);
    cache.insert(Lookup::new(("x".to_owned(),)), 1);
    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.get(&Lookup::new(("x".to_owned(),))), None);
}

#[test]
#[should_panic(expected = "already used by another request type")]
fn colliding_type_ids_are_caught() {
    use crate::request::{RequestFlags, RequestKind, SimpleRequest};
    use crate::type_id::RequestTypeId;

    enum ImpostorKind {}

    impl RequestKind for ImpostorKind {
        type Inputs = (i64, i64);
        type Output = i64;

        // Same identity as `Sum`.
        const ID: RequestTypeId = RequestTypeId::new(Zone::Testing, 0);
        const NAME: &'static str = "Impostor";
        const FLAGS: RequestFlags = RequestFlags::CACHED;
    }

    let mut cache = RequestCache::new();
    cache.insert(Sum::new((1, 1)), 2);
    cache.get(&SimpleRequest::<ImpostorKind>::new((1, 1)));
}

#[derive(Clone, Debug)]
enum Op {
    InsertSum(i64, i64),
    EraseSum(i64, i64),
    ClearSums,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..8i64, 0..8i64).prop_map(|(a, b)| Op::InsertSum(a, b)),
        (0..8i64, 0..8i64).prop_map(|(a, b)| Op::EraseSum(a, b)),
        Just(Op::ClearSums),
    ]
}

proptest! {
    #[test]
    fn sums_never_disturb_products(
        products in prop::collection::vec((0..8i64, 0..8i64), 0..16),
        ops in prop::collection::vec(op(), 0..32),
    ) {
        let mut cache = RequestCache::new();
        let mut expected = FxHashMap::default();

        for (a, b) in products {
            let request = Product::new((a, b));
            if !cache.contains(&request) {
                cache.insert(request.clone(), a * b);
                expected.insert(request, a * b);
            }
        }

        for op in ops {
            match op {
                Op::InsertSum(a, b) => {
                    let request = Sum::new((a, b));
                    if !cache.contains(&request) {
                        cache.insert(request, a + b);
                    }
                },
                Op::EraseSum(a, b) => {
                    cache.erase(&Sum::new((a, b)));
                },
                Op::ClearSums => {
                    if let Some(sums) = cache.tables.existing_table_mut::<Sum, i64>() {
                        sums.clear();
                    }
                },
            }

            for (request, output) in &expected {
                prop_assert_eq!(cache.get(request), Some(output));
            }
        }
    }
}
