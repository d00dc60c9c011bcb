use inventory_core::{
    AlwaysConfirm, Dashboard, MoneyFormat, ProductStore, SessionGate, StorageKeys,
    DEFAULT_PRODUCTS_KEY,
};
use shared::{
    domain::{PageKind, ProductPatch, RedirectTarget, SortKey},
    protocol::{AuthForm, AuthFormKind, Outcome, ProductForm},
};
use storage::{KvStore, MemoryKv, Storage};

fn asha() -> AuthForm {
    AuthForm {
        name: "Asha".into(),
        email: "asha@example.com".into(),
        password: "s3cret".into(),
    }
}

fn form(name: &str, category: &str, price: &str, qty: &str) -> ProductForm {
    ProductForm {
        name: name.into(),
        category: category.into(),
        price: price.into(),
        qty: qty.into(),
    }
}

#[tokio::test]
async fn sqlite_backed_session_survives_page_loads() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let keys = StorageKeys::default();

    let mut landing = Dashboard::open(storage.clone(), &keys, MoneyFormat::default(), AlwaysConfirm)
        .await
        .expect("landing");
    assert_eq!(
        landing.open_page(PageKind::Protected).await.expect("guard"),
        Some(RedirectTarget::AnonymousLanding)
    );
    landing
        .submit_auth_form(AuthFormKind::Register, asha())
        .await
        .expect("register");
    landing
        .submit_auth_form(AuthFormKind::Login, asha())
        .await
        .expect("login");

    let mut page = Dashboard::open(storage.clone(), &keys, MoneyFormat::default(), AlwaysConfirm)
        .await
        .expect("dashboard");
    assert_eq!(page.open_page(PageKind::Protected).await.expect("guard"), None);
    page.submit_product_form(form("Widget", "Tools", "10", "3"), None)
        .await
        .expect("widget");
    page.submit_product_form(form("Gadget", "Electronics", "20", "10"), None)
        .await
        .expect("gadget");

    let reloaded = Dashboard::open(storage.clone(), &keys, MoneyFormat::default(), AlwaysConfirm)
        .await
        .expect("reload");
    let view = reloaded.render();
    assert_eq!(view.total_count, 2);
    assert_eq!(view.total_value, "₹ 230.00");

    let mut keys_on_disk = storage.keys().await.expect("keys");
    keys_on_disk.sort();
    assert_eq!(
        keys_on_disk,
        ["inventory_session", "inventory_users", "products_db_v1"]
    );
}

#[tokio::test]
async fn products_persist_across_store_instances() {
    let kv = MemoryKv::new();
    let mut store = ProductStore::load(kv.clone(), DEFAULT_PRODUCTS_KEY)
        .await
        .expect("load");
    let widget = store
        .create("Widget", "Tools", 10.0, 3)
        .await
        .expect("widget");
    store
        .update(
            &widget.id,
            ProductPatch {
                price: Some(12.0),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("update");

    let reopened = ProductStore::load(kv, DEFAULT_PRODUCTS_KEY)
        .await
        .expect("reopen");
    assert_eq!(reopened.products(), store.products());
    assert_eq!(reopened.aggregate().total_value, 36.0);
}

#[tokio::test]
async fn sorting_never_reorders_the_persisted_list() {
    let kv = MemoryKv::new();
    let mut store = ProductStore::load(kv.clone(), DEFAULT_PRODUCTS_KEY)
        .await
        .expect("load");
    for (name, price) in [("c", 3.0), ("a", 1.0), ("b", 2.0)] {
        store.create(name, "", price, 1).await.expect("create");
    }

    let sorted: Vec<_> = store
        .list_view("", Some(SortKey::PriceAsc))
        .into_iter()
        .map(|p| p.name.clone())
        .collect();
    assert_eq!(sorted, ["a", "b", "c"]);

    let names: Vec<_> = store.products().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["c", "a", "b"]);
    let raw = kv
        .get(DEFAULT_PRODUCTS_KEY)
        .await
        .expect("get")
        .expect("persisted");
    assert!(raw.find("\"c\"") < raw.find("\"a\""));
}

#[tokio::test]
async fn export_import_round_trip_through_the_dashboard() {
    let keys = StorageKeys::default();
    let source = MemoryKv::new();
    let gate = SessionGate::new(source.clone(), &keys);
    gate.directory()
        .register("Asha", "asha@example.com", "s3cret")
        .await
        .expect("register");
    gate.login("asha@example.com", "s3cret").await.expect("login");

    let mut page = Dashboard::open(source, &keys, MoneyFormat::default(), AlwaysConfirm)
        .await
        .expect("open");
    page.submit_product_form(form("Widget", "Tools", "10", "3"), None)
        .await
        .expect("create");
    let Outcome::Download(download) = page.click_export().await.expect("export") else {
        panic!("expected a download");
    };

    let target = MemoryKv::new();
    let target_gate = SessionGate::new(target.clone(), &keys);
    target_gate
        .directory()
        .register("Asha", "asha@example.com", "s3cret")
        .await
        .expect("register");
    target_gate
        .login("asha@example.com", "s3cret")
        .await
        .expect("login");
    let mut restored = Dashboard::open(target, &keys, MoneyFormat::default(), AlwaysConfirm)
        .await
        .expect("open target");
    restored
        .click_import(&download.bytes)
        .await
        .expect("import");

    assert_eq!(restored.products().products(), page.products().products());
}
