//! Ledger behavior: stores, guard, reporters, cascades.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::Utc;

use bwledger_core::model::{NewSubAllocation, Priority, Role, UserRecord};
use bwledger_core::LedgerError;
use bwledger_gateway::infra::{InMemoryUserDirectory, UserDirectory};
use bwledger_gateway::ledger::BandwidthLedger;

struct Fixture {
    users: Arc<InMemoryUserDirectory>,
    ledger: BandwidthLedger,
}

fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserDirectory::new());
    users
        .insert(UserRecord {
            id: "admin".into(),
            username: "admin".into(),
            email: "admin@example.com".into(),
            role: Role::Admin,
            created_at: Utc::now(),
        })
        .unwrap();
    let ledger = BandwidthLedger::new(users.clone());
    Fixture { users, ledger }
}

impl Fixture {
    fn member(&self, name: &str) -> String {
        self.users
            .register(name, &format!("{name}@example.com"), Role::User)
            .unwrap()
            .id
    }

    async fn provisioned(&self, name: &str, cap: f64) -> String {
        let id = self.member(name);
        self.ledger.assign_policy(&id, cap, Priority::Medium).await.unwrap();
        id
    }
}

fn req(user_id: &str, limit: f64) -> NewSubAllocation {
    NewSubAllocation {
        user_id: user_id.to_string(),
        name: "branch".into(),
        ip_range: "10.1.0.0/16".into(),
        limit,
        priority: Priority::Low,
    }
}

#[tokio::test]
async fn upsert_creates_then_overwrites_in_place() {
    let f = fixture();
    let id = f.member("alice");

    let first = f.ledger.assign_policy(&id, 10.0, Priority::High).await.unwrap();
    assert!(first.created);

    let second = f.ledger.assign_policy(&id, 25.0, Priority::Low).await.unwrap();
    assert!(!second.created);
    assert_eq!(second.policy.id, first.policy.id);
    assert_eq!(second.policy.created_at, first.policy.created_at);
    assert_eq!(second.policy.limit, 25.0);
    assert_eq!(second.policy.priority, Priority::Low);
    assert_eq!(f.ledger.policies().len(), 1);
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let f = fixture();
    let id = f.member("alice");

    f.ledger.assign_policy(&id, 10.0, Priority::High).await.unwrap();
    let once = f.ledger.policies().list();
    f.ledger.assign_policy(&id, 10.0, Priority::High).await.unwrap();
    let twice = f.ledger.policies().list();

    assert_eq!(once, twice);
}

#[tokio::test]
async fn upsert_rejections() {
    let f = fixture();
    let id = f.member("alice");

    let e = f.ledger.assign_policy(&id, 0.0, Priority::High).await.unwrap_err();
    assert_eq!(e.client_code().as_str(), "INVALID_ARGUMENT");

    let e = f.ledger.assign_policy("ghost", 5.0, Priority::High).await.unwrap_err();
    assert_eq!(e, LedgerError::NotFound("user not found".into()));

    let e = f.ledger.assign_policy("admin", 5.0, Priority::High).await.unwrap_err();
    assert_eq!(e, LedgerError::NotFound("user is administrative".into()));
    assert!(f.ledger.policies().is_empty());
}

#[test]
fn authorize_requires_a_global_cap() {
    let f = fixture();
    let id = f.member("alice");

    let e = f.ledger.guard().authorize(&id, 1.0).unwrap_err();
    assert_eq!(e.client_code().as_str(), "FORBIDDEN");
    assert!(e.to_string().contains("contact administrator"));
}

#[tokio::test]
async fn sequential_allocations_never_exceed_cap() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;

    for limit in [4.0, 3.0, 2.5, 1.0, 0.5, 2.0] {
        let _ = f.ledger.allocate(req(&id, limit)).await;
        assert!(f.ledger.allocations().sum_by_user(&id) <= 10.0);
    }
    // 4 + 3 + 2.5 + 0.5 fit; 1.0 (after 9.5) and 2.0 do not.
    assert_eq!(f.ledger.allocations().sum_by_user(&id), 10.0);
    assert_eq!(f.ledger.allocations().count_by_user(&id), 4);
}

#[tokio::test]
async fn rejection_reports_exact_headroom() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;
    f.ledger.allocate(req(&id, 4.0)).await.unwrap();
    f.ledger.allocate(req(&id, 3.0)).await.unwrap();

    let e = f.ledger.allocate(req(&id, 3.5)).await.unwrap_err();
    assert_eq!(e, LedgerError::CapacityExceeded { remaining: 3.0, total: 10.0 });

    f.ledger.allocate(req(&id, 3.0)).await.unwrap();
}

#[tokio::test]
async fn non_positive_limits_are_invalid_regardless_of_headroom() {
    let f = fixture();
    let id = f.provisioned("alice", 1000.0).await;
    let unprovisioned = f.member("bob");

    for limit in [0.0, -1.0] {
        let e = f.ledger.allocate(req(&id, limit)).await.unwrap_err();
        assert_eq!(e.client_code().as_str(), "INVALID_ARGUMENT");
        let e = f.ledger.allocate(req(&unprovisioned, limit)).await.unwrap_err();
        assert_eq!(e.client_code().as_str(), "INVALID_ARGUMENT");
    }
    assert_eq!(f.ledger.allocations().count_by_user(&id), 0);
}

#[tokio::test]
async fn delete_decreases_sum_by_exact_limit() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;
    let a = f.ledger.allocate(req(&id, 4.0)).await.unwrap();
    f.ledger.allocate(req(&id, 2.5)).await.unwrap();

    let before = f.ledger.allocations().sum_by_user(&id);
    let removed = f.ledger.delete_allocation(&id, &a.id).unwrap();
    let after = f.ledger.allocations().sum_by_user(&id);

    assert_eq!(removed.id, a.id);
    assert_eq!(before - after, 4.0);

    let e = f.ledger.delete_allocation(&id, &a.id).unwrap_err();
    assert_eq!(e.client_code().as_str(), "NOT_FOUND");
}

#[tokio::test]
async fn cannot_delete_someone_elses_allocation() {
    let f = fixture();
    let alice = f.provisioned("alice", 10.0).await;
    let bob = f.provisioned("bob", 10.0).await;
    let a = f.ledger.allocate(req(&alice, 1.0)).await.unwrap();

    let e = f.ledger.delete_allocation(&bob, &a.id).unwrap_err();
    assert_eq!(e.client_code().as_str(), "FORBIDDEN");
    assert_eq!(f.ledger.allocations().count_by_user(&alice), 1);
}

#[tokio::test]
async fn list_is_newest_first() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;
    let first = f.ledger.allocate(req(&id, 1.0)).await.unwrap();
    let second = f.ledger.allocate(req(&id, 1.0)).await.unwrap();
    let third = f.ledger.allocate(req(&id, 1.0)).await.unwrap();

    let ids: Vec<_> = f.ledger.list_allocations(&id).into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[tokio::test]
async fn usage_report_for_four_and_three_of_ten() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;
    f.ledger.allocate(req(&id, 4.0)).await.unwrap();
    f.ledger.allocate(req(&id, 3.0)).await.unwrap();

    let u = f.ledger.usage(&id).unwrap();
    assert_eq!(u.allocated, 7.0);
    assert_eq!(u.available, 3.0);
    assert_eq!(u.utilization_rate, 70.0);
    assert_eq!(u.policies, 2);
    assert_eq!(u.limit, 10.0);
    assert_eq!(u.unit, "Mbps");
}

#[tokio::test]
async fn lowering_the_cap_shows_negative_headroom() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;
    f.ledger.allocate(req(&id, 8.0)).await.unwrap();
    f.ledger.assign_policy(&id, 5.0, Priority::Medium).await.unwrap();

    let u = f.ledger.usage(&id).unwrap();
    assert_eq!(u.available, -3.0);
    assert_eq!(u.utilization_rate, 160.0);
}

#[test]
fn usage_without_cap_is_not_found() {
    let f = fixture();
    let id = f.member("alice");
    let e = f.ledger.usage(&id).unwrap_err();
    assert_eq!(e.client_code().as_str(), "NOT_FOUND");
}

#[tokio::test]
async fn aggregate_over_two_caps() {
    let f = fixture();
    f.provisioned("alice", 10.0).await;
    f.provisioned("bob", 5.0).await;
    f.member("carol");

    let s = f.ledger.stats();
    assert_eq!(s.total_users, 2);
    assert_eq!(s.total_bandwidth_allocated, 15.0);
    assert_eq!(s.average_bandwidth_per_user, 7.5);

    let mut names: Vec<_> = s.user_summaries.iter().map(|u| u.username.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["alice", "bob"]);
}

#[tokio::test]
async fn aggregate_substitutes_placeholder_for_missing_owner() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;
    // Directory loses the account behind the ledger's back.
    f.users.remove(&id);

    let s = f.ledger.stats();
    assert_eq!(s.total_users, 1);
    assert_eq!(s.user_summaries[0].username, "Unknown User");

    let views = f.ledger.list_policies();
    assert_eq!(views[0].email, "Unknown Email");
}

#[test]
fn aggregate_of_empty_store() {
    let f = fixture();
    let s = f.ledger.stats();
    assert_eq!(s.total_users, 0);
    assert_eq!(s.total_bandwidth_allocated, 0.0);
    assert_eq!(s.average_bandwidth_per_user, 0.0);
    assert!(s.user_summaries.is_empty());
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let f = fixture();
    let id = f.provisioned("alice", 10.0).await;
    f.ledger.allocate(req(&id, 4.0)).await.unwrap();
    f.ledger.allocate(req(&id, 3.0)).await.unwrap();

    let deleted = f.ledger.delete_user(&id).await.unwrap();
    assert!(deleted.policy_removed);
    assert_eq!(deleted.allocations_removed, 2);

    assert!(f.ledger.policies().get(&id).is_none());
    assert_eq!(f.ledger.allocations().sum_by_user(&id), 0.0);
    assert!(f.ledger.list_allocations(&id).is_empty());
    assert!(f.users.get(&id).is_none());
    assert_eq!(f.ledger.usage(&id).unwrap_err().client_code().as_str(), "NOT_FOUND");
}

#[tokio::test]
async fn admins_cannot_be_deleted() {
    let f = fixture();
    let e = f.ledger.delete_user("admin").await.unwrap_err();
    assert_eq!(e.client_code().as_str(), "FORBIDDEN");

    let e = f.ledger.delete_user("ghost").await.unwrap_err();
    assert_eq!(e.client_code().as_str(), "NOT_FOUND");
}

#[tokio::test]
async fn list_users_joins_caps() {
    let f = fixture();
    let alice = f.provisioned("alice", 12.0).await;
    f.member("bob");

    let views = f.ledger.list_users();
    assert_eq!(views.len(), 3);
    let a = views.iter().find(|u| u.id == alice).unwrap();
    assert_eq!(a.bandwidth_limit, Some(12.0));
    assert_eq!(a.priority, Some(Priority::Medium));
    let b = views.iter().find(|u| u.username == "bob").unwrap();
    assert!(b.bandwidth_limit.is_none());

    let json = serde_json::to_value(b).unwrap();
    assert!(json.get("bandwidthLimit").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_allocations_cannot_overshoot() {
    let f = Arc::new(fixture());
    let id = f.provisioned("alice", 10.0).await;

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let f = Arc::clone(&f);
        let id = id.clone();
        tasks.push(tokio::spawn(async move { f.ledger.allocate(req(&id, 1.5)).await }));
    }

    let mut approved = 0;
    for t in tasks {
        if t.await.unwrap().is_ok() {
            approved += 1;
        }
    }

    // floor(10 / 1.5) = 6
    assert_eq!(approved, 6);
    assert_eq!(f.ledger.allocations().sum_by_user(&id), 9.0);
}

#[tokio::test]
async fn totals_do_not_depend_on_hash_order() {
    // Left to right, insertion order.
    let expected = (0.7_f64 + 0.2) + 0.1;

    for _ in 0..300 {
        let f = fixture();
        let id = f.provisioned("alice", 1.0).await;
        for limit in [0.7, 0.2, 0.1] {
            f.ledger.allocate(req(&id, limit)).await.unwrap();
        }

        let total = f.ledger.allocations().sum_by_user(&id);
        assert_eq!(total.to_bits(), expected.to_bits());
        assert_eq!(f.ledger.guard().authorize(&id, 2e-16).is_ok(), expected + 2e-16 <= 1.0);

        let e = f.ledger.guard().authorize(&id, 0.5).unwrap_err();
        assert_eq!(e, LedgerError::CapacityExceeded { remaining: 1.0 - expected, total: 1.0 });
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn assign_racing_delete_leaves_no_orphan_cap() {
    for _ in 0..200 {
        let f = Arc::new(fixture());
        let id = f.member("alice");

        let assign = {
            let f = Arc::clone(&f);
            let id = id.clone();
            tokio::spawn(async move { f.ledger.assign_policy(&id, 10.0, Priority::High).await })
        };
        let delete = {
            let f = Arc::clone(&f);
            let id = id.clone();
            tokio::spawn(async move { f.ledger.delete_user(&id).await })
        };

        let assigned = assign.await.unwrap();
        delete.await.unwrap().unwrap();

        if let Err(e) = assigned {
            assert_eq!(e, LedgerError::NotFound("user not found".into()));
        }
        assert!(f.ledger.policies().is_empty());
        assert_eq!(f.ledger.stats().total_users, 0);
    }
}
