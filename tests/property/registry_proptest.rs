//! Property-based tests for the presence registry
//!
//! Any interleaving of associate/release keeps at most one live connection
//! per user, and a release only succeeds for the connection that holds the
//! entry.

use proptest::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use chatpulse::backend::presence::PresenceRegistry;
use chatpulse::shared::{ConnectionId, UserIdentity};

#[derive(Debug, Clone)]
enum Op {
    Associate { user: usize, conn: u128 },
    Release { user: usize, conn: u128 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, 0..6u128).prop_map(|(user, conn)| Op::Associate { user, conn }),
        (0..4usize, 0..6u128).prop_map(|(user, conn)| Op::Release { user, conn }),
    ]
}

fn identity(index: usize) -> UserIdentity {
    UserIdentity::parse(&format!("user-{index}")).unwrap()
}

fn connection(index: u128) -> ConnectionId {
    ConnectionId::from(Uuid::from_u128(index + 1))
}

proptest! {
    #[test]
    fn registry_matches_last_association(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let registry = PresenceRegistry::new();
        let mut model: HashMap<usize, u128> = HashMap::new();

        for op in ops {
            match op {
                Op::Associate { user, conn } => {
                    let previous = registry.associate(identity(user), connection(conn));
                    prop_assert_eq!(previous, model.insert(user, conn).map(connection));
                }
                Op::Release { user, conn } => {
                    let released = registry.release(&identity(user), connection(conn));
                    let expected = model.get(&user) == Some(&conn);
                    if expected {
                        model.remove(&user);
                    }
                    prop_assert_eq!(released, expected);
                }
            }

            prop_assert_eq!(registry.len(), model.len());
            for (user, conn) in &model {
                prop_assert_eq!(registry.connection_for(&identity(*user)), Some(connection(*conn)));
            }
        }
    }

    #[test]
    fn snapshot_is_sorted_and_unique(users in prop::collection::vec(0..8usize, 0..32)) {
        let registry = PresenceRegistry::new();
        for user in &users {
            registry.associate(identity(*user), ConnectionId::new());
        }

        let snapshot = registry.snapshot();
        prop_assert!(snapshot.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(snapshot, registry.snapshot());
    }
}
