use proptest::prelude::*;

use gavel_types::{Digest, HashLock};

proptest! {
    /// A lock opens for its own key and refuses any other byte string.
    #[test]
    fn hash_lock_opens_only_for_its_key(
        key in proptest::collection::vec(any::<u8>(), 0..64),
        other in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let lock = HashLock::from_key(&key);
        prop_assert!(lock.matches(&key));
        if other != key {
            prop_assert!(!lock.matches(&other));
        }
    }

    /// Incremental hashing equals hashing the concatenation, wherever the
    /// input is split.
    #[test]
    fn of_parts_is_split_invariant(
        data in proptest::collection::vec(any::<u8>(), 1..128),
        split in 0usize..128,
    ) {
        let split = split % data.len();
        let (head, tail) = data.split_at(split);
        prop_assert_eq!(Digest::of(&data), Digest::of_parts(&[head, tail]));
    }
}
