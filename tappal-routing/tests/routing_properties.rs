//! Property checks over the whole role table
//!
//! Exhaustive rather than sampled: the role table is small enough to walk
//! every pair.

use std::sync::Arc;

use tappal_access::{AccessEvaluator, Officer, Role, RoleHierarchy, Tappal, TappalStatus};
use tappal_routing::{
    ForwardError, InMemoryCommentStore, InMemoryDirectory, InMemoryTappalStore, RoutingError,
    RoutingService, Session, TappalStore,
};

fn officer_for(role: Role) -> Officer {
    Officer::new(
        format!("officer-{}", role.as_str()),
        role.display_name(),
        role,
        "Revenue",
    )
}

fn all_officers() -> Vec<Officer> {
    Role::all().into_iter().map(officer_for).collect()
}

async fn service_with(tappal: Tappal) -> (RoutingService, Arc<InMemoryTappalStore>) {
    let store = Arc::new(InMemoryTappalStore::new());
    store.insert(tappal).await.unwrap();
    let service = RoutingService::new(
        store.clone(),
        Arc::new(InMemoryDirectory::from_officers(all_officers())),
        Arc::new(InMemoryCommentStore::new()),
    );
    (service, store)
}

// =============================================================================
// Access evaluation
// =============================================================================

#[test]
fn test_assignee_always_sees_tappal() {
    let evaluator = AccessEvaluator::new();
    for holder in all_officers() {
        let tappal = Tappal::new("T1", "Pattadar passbook", "Revenue", &holder.id);
        let decision = evaluator.evaluate(&holder, &tappal, Some(&holder), &[]);
        assert!(decision.capabilities.can_view, "{:?}", holder.role);
        assert!(decision.capabilities.can_forward, "{:?}", holder.role);
    }
}

#[test]
fn test_visibility_is_monotonic_up_the_chain() {
    let evaluator = AccessEvaluator::new();
    let hierarchy = RoleHierarchy::standard();

    for holder_role in Role::all() {
        let holder = officer_for(holder_role);
        let tappal = Tappal::new("T1", "Pattadar passbook", "Revenue", &holder.id);

        for senior_role in Role::all() {
            if !hierarchy.is_senior(senior_role, holder_role) {
                continue;
            }
            let senior = Officer::new("S", "Senior", senior_role, "Revenue");
            let decision = evaluator.evaluate(&senior, &tappal, Some(&holder), &[]);
            assert!(
                decision.capabilities.can_view,
                "{:?} should see a tappal held by {:?}",
                senior_role,
                holder_role
            );
        }
    }
}

#[test]
fn test_default_deny() {
    let evaluator = AccessEvaluator::new();
    let hierarchy = RoleHierarchy::standard();

    for holder_role in Role::all() {
        let holder = officer_for(holder_role);
        let tappal = Tappal::new("T1", "Pattadar passbook", "Revenue", &holder.id);

        for other_role in Role::all() {
            if hierarchy.bypasses_chain(other_role) || hierarchy.reaches(other_role, holder_role) {
                continue;
            }
            let other = Officer::new("X", "Unrelated", other_role, "Revenue");
            let decision = evaluator.evaluate(&other, &tappal, Some(&holder), &[]);
            assert_eq!(decision.capabilities, Default::default(), "{:?}", other_role);
        }
    }
}

// =============================================================================
// Validation before remote calls
// =============================================================================

#[tokio::test]
async fn test_same_status_rejected_whatever_the_reason() {
    let holder = officer_for(Role::Tahsildar);
    for status in TappalStatus::all() {
        let mut tappal = Tappal::new("T1", "Pattadar passbook", "Revenue", &holder.id);
        tappal.status = status;
        if status == TappalStatus::Completed {
            tappal.completed_at = Some(tappal.created_at);
        }
        let (service, store) = service_with(tappal.clone()).await;
        let session = Session::new(holder.clone(), "token");

        for reason in ["", "   ", "resubmitting", "a much longer explanation of the request"] {
            let err = service
                .transition(&session, &tappal, status, reason)
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{:?} / {:?}", status, reason);
        }
        assert_eq!(store.write_count(), 0);
    }
}

#[tokio::test]
async fn test_blank_reason_rejected_for_every_target() {
    let holder = officer_for(Role::Tahsildar);
    let tappal = Tappal::new("T1", "Pattadar passbook", "Revenue", &holder.id);
    let (service, store) = service_with(tappal.clone()).await;
    let session = Session::new(holder, "token");

    for status in TappalStatus::all() {
        if status == tappal.status {
            continue;
        }
        let err = service
            .transition(&session, &tappal, status, "")
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{:?}", status);
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_forward_to_assignee_rejected() {
    let holder = officer_for(Role::NaibTahsildar);
    let tappal = Tappal::new("T1", "Pattadar passbook", "Revenue", &holder.id);
    let (service, store) = service_with(tappal.clone()).await;

    let err = service
        .forward(
            &Session::new(officer_for(Role::Tahsildar), "token"),
            &tappal,
            &holder.id,
            "back to you",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RoutingError::InvalidForward(ForwardError::AlreadyAssigned)
    ));
    assert_eq!(store.write_count(), 0);
}

// =============================================================================
// Ledger
// =============================================================================

#[tokio::test]
async fn test_each_forward_appends_exactly_one_entry() {
    let chain = [
        Role::Collector,
        Role::JointCollector,
        Role::Dro,
        Role::Rdo,
        Role::Tahsildar,
        Role::NaibTahsildar,
        Role::Ri,
        Role::Vro,
        Role::Clerk,
    ];
    let first = officer_for(Role::JointCollector);
    let (service, store) =
        service_with(Tappal::new("T1", "Pattadar passbook", "Revenue", &first.id)).await;

    let mut holder = first;
    let mut tappal = store.load("T1").await.unwrap().unwrap();
    let mut previous = Vec::new();

    for role in chain.iter().skip(2) {
        let target = officer_for(*role);
        let outcome = service
            .forward(
                &Session::new(holder.clone(), "token"),
                &tappal,
                &target.id,
                &format!("down to {}", role.display_name()),
            )
            .await
            .unwrap();

        let history = store.history("T1").await.unwrap();
        assert_eq!(history.len(), previous.len() + 1);
        assert_eq!(&history[..previous.len()], &previous[..]);
        assert_eq!(history.last(), Some(&outcome.movement));
        assert!(outcome.path_gaps.is_empty());

        store.verify_history("T1").await.unwrap();
        previous = history;
        tappal = outcome.tappal;
        holder = target;
    }

    assert_eq!(tappal.assigned_to, officer_for(Role::Clerk).id);
    assert_eq!(tappal.version, (chain.len() - 2) as u64);
}
