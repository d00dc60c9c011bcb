use super::*;
use shared::domain::UserId;
use storage::MemoryKv;

async fn gate_with_user() -> (MemoryKv, SessionGate<MemoryKv>) {
    let kv = MemoryKv::new();
    let gate = SessionGate::new(kv.clone(), &StorageKeys::default());
    gate.directory()
        .register("Asha", "asha@example.com", "s3cret")
        .await
        .expect("register");
    (kv, gate)
}

#[test]
fn route_guard_redirects_only_mismatched_pages() {
    let user = User {
        id: UserId(1),
        name: "Asha".into(),
        email: "asha@example.com".into(),
        password: "x".into(),
    };
    assert_eq!(
        guard_route(PageKind::Protected, None),
        Some(RedirectTarget::AnonymousLanding)
    );
    assert_eq!(
        guard_route(PageKind::Anonymous, Some(&user)),
        Some(RedirectTarget::Dashboard)
    );
    assert_eq!(guard_route(PageKind::Protected, Some(&user)), None);
    assert_eq!(guard_route(PageKind::Anonymous, None), None);
}

#[tokio::test]
async fn login_stores_the_user_as_session() {
    let (kv, gate) = gate_with_user().await;
    let user = gate
        .login("asha@example.com", "s3cret")
        .await
        .expect("login");
    assert_eq!(gate.current_session().await.expect("session"), Some(user));
    assert!(kv
        .get("inventory_session")
        .await
        .expect("get")
        .is_some());
}

#[tokio::test]
async fn wrong_password_leaves_session_unset() {
    let (_kv, gate) = gate_with_user().await;
    let err = gate
        .login("asha@example.com", "wrong")
        .await
        .expect_err("wrong password");
    assert!(matches!(err, InventoryError::InvalidCredentials));
    assert_eq!(gate.current_session().await.expect("session"), None);
}

#[tokio::test]
async fn unknown_email_leaves_session_unset() {
    let (_kv, gate) = gate_with_user().await;
    let err = gate
        .login("ghost@example.com", "s3cret")
        .await
        .expect_err("unknown email");
    assert!(matches!(err, InventoryError::InvalidCredentials));
    assert_eq!(
        gate.guard_route(PageKind::Protected).await.expect("guard"),
        Some(RedirectTarget::AnonymousLanding)
    );
}

#[tokio::test]
async fn logout_clears_the_session() {
    let (_kv, gate) = gate_with_user().await;
    gate.login("asha@example.com", "s3cret")
        .await
        .expect("login");
    assert_eq!(
        gate.guard_route(PageKind::Anonymous).await.expect("guard"),
        Some(RedirectTarget::Dashboard)
    );

    gate.logout().await.expect("logout");
    assert_eq!(gate.current_session().await.expect("session"), None);
    assert_eq!(
        gate.guard_route(PageKind::Protected).await.expect("guard"),
        Some(RedirectTarget::AnonymousLanding)
    );
}

#[tokio::test]
async fn corrupt_session_counts_as_signed_out() {
    let (kv, gate) = gate_with_user().await;
    kv.set("inventory_session", "][").await.expect("seed");
    assert_eq!(gate.current_session().await.expect("session"), None);
}
