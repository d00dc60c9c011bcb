//! Intent handling between a view and the stores.
//!
//! A view forwards each user action as one call (or one [`Intent`]) and gets
//! back an [`Outcome`] describing what to show next. Recoverable failures come
//! back as [`Outcome::Rejected`] with an operator notice; only storage faults
//! surface as `Err`.

use shared::{
    domain::{PageKind, ProductId, ProductPatch, RedirectTarget, SortKey, Totals},
    error::{InventoryError, InventoryResult, Notice},
    protocol::{
        AuthForm, AuthFormKind, Download, Intent, Outcome, ProductForm, RowAction, ViewModel,
        ViewRow,
    },
};
use storage::KvStore;
use tracing::debug;

use crate::{
    money::MoneyFormat, products::ProductStore, session::SessionGate, StorageKeys,
};

pub const EXPORT_FILE_NAME: &str = "products.json";
pub const ADD_LABEL: &str = "Add Product";
pub const UPDATE_LABEL: &str = "Update Product";

const DELETE_PROMPT: &str = "Delete this product?";
const CLEAR_PROMPT: &str = "Delete all products?";

/// Answers destructive-action prompts on behalf of the operator.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct Dashboard<S, C> {
    session: SessionGate<S>,
    products: ProductStore<S>,
    confirm: C,
    money: MoneyFormat,
    query: String,
    sort: Option<SortKey>,
    editing: Option<ProductId>,
}

impl<S, C> Dashboard<S, C>
where
    S: KvStore + Clone,
    C: Confirm,
{
    pub async fn open(
        store: S,
        keys: &StorageKeys,
        money: MoneyFormat,
        confirm: C,
    ) -> InventoryResult<Self> {
        let products = ProductStore::load(store.clone(), keys.products.clone()).await?;
        Ok(Self::from_parts(
            SessionGate::new(store, keys),
            products,
            money,
            confirm,
        ))
    }
}

impl<S, C> Dashboard<S, C>
where
    S: KvStore,
    C: Confirm,
{
    pub fn from_parts(
        session: SessionGate<S>,
        products: ProductStore<S>,
        money: MoneyFormat,
        confirm: C,
    ) -> Self {
        Self {
            session,
            products,
            confirm,
            money,
            query: String::new(),
            sort: None,
            editing: None,
        }
    }

    pub fn session(&self) -> &SessionGate<S> {
        &self.session
    }

    pub fn products(&self) -> &ProductStore<S> {
        &self.products
    }

    pub fn totals(&self) -> Totals {
        self.products.aggregate()
    }

    pub fn editing(&self) -> Option<&ProductId> {
        self.editing.as_ref()
    }

    /// Route check to run once when a page is shown.
    pub async fn open_page(&self, page: PageKind) -> InventoryResult<Option<RedirectTarget>> {
        self.session.guard_route(page).await
    }

    pub async fn handle(&mut self, intent: Intent) -> InventoryResult<Outcome> {
        debug!(intent = intent.name(), "handling intent");
        match intent {
            Intent::SubmitProductForm { form, editing_id } => {
                self.submit_product_form(form, editing_id).await
            }
            Intent::ClickRow { id, action } => self.click_row(&id, action).await,
            Intent::ChangeSearch { text } => self.change_search(text).await,
            Intent::ChangeSort { key } => self.change_sort(&key).await,
            Intent::ClickExport => self.click_export().await,
            Intent::ClickImport { contents } => self.click_import(&contents).await,
            Intent::ClickClearAll => self.click_clear_all().await,
            Intent::SubmitAuthForm { kind, fields } => self.submit_auth_form(kind, fields).await,
            Intent::ClickLogout => self.click_logout().await,
        }
    }

    /// Creates a product, or replaces the editable fields of `editing_id`.
    pub async fn submit_product_form(
        &mut self,
        form: ProductForm,
        editing_id: Option<ProductId>,
    ) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }

        let fields = match parse_form(&form) {
            Ok(fields) => fields,
            Err(err) => return rejected(err),
        };

        let result = match editing_id {
            Some(id) => self
                .products
                .update(&id, fields)
                .await
                .map(|_| ()),
            None => self
                .products
                .create(
                    fields.name.as_deref().unwrap_or_default(),
                    fields.category.as_deref().unwrap_or_default(),
                    fields.price.unwrap_or_default(),
                    fields.qty.unwrap_or_default(),
                )
                .await
                .map(|_| ()),
        };
        if let Err(err) = result {
            return rejected(err);
        }

        self.editing = None;
        Ok(self.rendered(None))
    }

    /// Partial update: only the fields present in `patch` change.
    pub async fn patch_product(
        &mut self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }
        if let Err(err) = self.products.update(id, patch).await {
            return rejected(err);
        }
        Ok(self.rendered(None))
    }

    pub async fn click_row(&mut self, id: &ProductId, action: RowAction) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }

        match action {
            RowAction::Edit => {
                let Some(product) = self.products.get(id) else {
                    return rejected(InventoryError::NotFound { id: id.0.clone() });
                };
                let form = ProductForm {
                    name: product.name.clone(),
                    category: product.category.clone(),
                    price: product.price.to_string(),
                    qty: product.qty.to_string(),
                };
                self.editing = Some(id.clone());
                Ok(Outcome::EditForm {
                    editing_id: id.clone(),
                    form,
                    submit_label: UPDATE_LABEL.into(),
                })
            }
            RowAction::Delete => {
                if !self.confirm.confirm(DELETE_PROMPT) {
                    return Ok(Outcome::Cancelled);
                }
                if let Err(err) = self.products.remove(id).await {
                    return rejected(err);
                }
                if self.editing.as_ref() == Some(id) {
                    self.editing = None;
                }
                Ok(self.rendered(None))
            }
        }
    }

    pub async fn change_search(&mut self, text: impl Into<String>) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }
        self.query = text.into();
        Ok(self.rendered(None))
    }

    /// Unknown keys switch sorting off.
    pub async fn change_sort(&mut self, key: &str) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }
        self.sort = SortKey::parse_lenient(key);
        Ok(self.rendered(None))
    }

    pub async fn click_export(&self) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }
        match self.products.export_snapshot() {
            Ok(bytes) => Ok(Outcome::Download(Download {
                file_name: EXPORT_FILE_NAME.into(),
                bytes,
            })),
            Err(err) => rejected(err),
        }
    }

    pub async fn click_import(&mut self, contents: &[u8]) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }
        if let Err(err) = self.products.import_replace_all(contents).await {
            return rejected(err);
        }
        self.editing = None;
        Ok(self.rendered(Some(Notice::info("Import successful"))))
    }

    pub async fn click_clear_all(&mut self) -> InventoryResult<Outcome> {
        if let Some(redirect) = self.require_session().await? {
            return Ok(redirect);
        }
        if !self.confirm.confirm(CLEAR_PROMPT) {
            return Ok(Outcome::Cancelled);
        }
        self.products.clear_all().await?;
        self.editing = None;
        Ok(self.rendered(None))
    }

    pub async fn submit_auth_form(
        &mut self,
        kind: AuthFormKind,
        fields: AuthForm,
    ) -> InventoryResult<Outcome> {
        let email = fields.email.trim();
        match kind {
            AuthFormKind::Login => match self.session.login(email, &fields.password).await {
                Ok(_) => Ok(Outcome::Redirect {
                    target: RedirectTarget::Dashboard,
                    notice: None,
                }),
                Err(err) => rejected(err),
            },
            AuthFormKind::Register => {
                if email.is_empty() || fields.password.is_empty() {
                    return rejected(InventoryError::Validation(
                        "Email and password required".into(),
                    ));
                }
                let registered = self
                    .session
                    .directory()
                    .register(fields.name.trim(), email, &fields.password)
                    .await;
                match registered {
                    Ok(_) => Ok(Outcome::Redirect {
                        target: RedirectTarget::AnonymousLanding,
                        notice: Some(Notice::info("Account created! Please login")),
                    }),
                    Err(err) => rejected(err),
                }
            }
        }
    }

    pub async fn click_logout(&mut self) -> InventoryResult<Outcome> {
        self.session.logout().await?;
        self.editing = None;
        Ok(Outcome::Redirect {
            target: RedirectTarget::AnonymousLanding,
            notice: None,
        })
    }

    /// View model for the current search, sort and edit state.
    pub fn render(&self) -> ViewModel {
        let rows: Vec<ViewRow> = self
            .products
            .list_view(&self.query, self.sort)
            .into_iter()
            .enumerate()
            .map(|(i, p)| ViewRow {
                index: i + 1,
                id: p.id.clone(),
                name: p.name.clone(),
                sku: p.sku.clone(),
                category: p.category.clone(),
                price: self.money.format(p.price),
                qty: p.qty,
                value: self.money.format(p.value()),
                low_stock: p.is_low_stock(),
            })
            .collect();
        let totals = self.products.aggregate();
        let submit_label = if self.editing.is_some() {
            UPDATE_LABEL
        } else {
            ADD_LABEL
        };

        ViewModel {
            empty: rows.is_empty(),
            rows,
            total_count: totals.count,
            total_value: self.money.format(totals.total_value),
            submit_label: submit_label.into(),
        }
    }

    fn rendered(&self, notice: Option<Notice>) -> Outcome {
        Outcome::Render {
            view: self.render(),
            notice,
        }
    }

    async fn require_session(&self) -> InventoryResult<Option<Outcome>> {
        Ok(self
            .session
            .guard_route(PageKind::Protected)
            .await?
            .map(|target| Outcome::Redirect {
                target,
                notice: None,
            }))
    }
}

/// Storage faults propagate; everything else becomes an operator notice.
fn rejected(err: InventoryError) -> InventoryResult<Outcome> {
    match err {
        InventoryError::Storage(_) => Err(err),
        other => {
            debug!(code = ?other.code(), "intent rejected");
            Ok(Outcome::Rejected(Notice::from(other)))
        }
    }
}

/// Form text to field values. Blank price or quantity means zero.
fn parse_form(form: &ProductForm) -> InventoryResult<ProductPatch> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(InventoryError::Validation("Product name required".into()));
    }

    let price = match form.price.trim() {
        "" => 0.0,
        raw => raw
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| InventoryError::Validation("Price must be a number".into()))?,
    };
    let qty = match form.qty.trim() {
        "" => 0,
        raw => raw
            .parse::<i64>()
            .map_err(|_| InventoryError::Validation("Quantity must be a whole number".into()))?,
    };

    Ok(ProductPatch {
        name: Some(name.to_string()),
        category: Some(form.category.trim().to_string()),
        price: Some(price),
        qty: Some(qty),
    })
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
