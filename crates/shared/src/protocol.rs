use serde::{Deserialize, Serialize};

use crate::{
    domain::{ProductId, RedirectTarget},
    error::Notice,
};

/// Raw product form text as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub qty: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthForm {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFormKind {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Edit,
    Delete,
}

/// Every user action a view may forward to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Intent {
    SubmitProductForm {
        form: ProductForm,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        editing_id: Option<ProductId>,
    },
    ClickRow {
        id: ProductId,
        action: RowAction,
    },
    ChangeSearch {
        text: String,
    },
    ChangeSort {
        key: String,
    },
    ClickExport,
    ClickImport {
        contents: Vec<u8>,
    },
    ClickClearAll,
    SubmitAuthForm {
        kind: AuthFormKind,
        fields: AuthForm,
    },
    ClickLogout,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitProductForm { .. } => "submit_product_form",
            Self::ClickRow { .. } => "click_row",
            Self::ChangeSearch { .. } => "change_search",
            Self::ChangeSort { .. } => "change_sort",
            Self::ClickExport => "click_export",
            Self::ClickImport { .. } => "click_import",
            Self::ClickClearAll => "click_clear_all",
            Self::SubmitAuthForm { .. } => "submit_auth_form",
            Self::ClickLogout => "click_logout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// 1-based position in the rendered list.
    pub index: usize,
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price: String,
    pub qty: i64,
    pub value: String,
    pub low_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub rows: Vec<ViewRow>,
    /// No rows survived the current filter.
    pub empty: bool,
    pub total_count: usize,
    pub total_value: String,
    pub submit_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Outcome {
    Render {
        view: ViewModel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notice: Option<Notice>,
    },
    EditForm {
        editing_id: ProductId,
        form: ProductForm,
        submit_label: String,
    },
    Download(Download),
    Redirect {
        target: RedirectTarget,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notice: Option<Notice>,
    },
    /// The intent failed without touching any state.
    Rejected(Notice),
    /// A confirmation prompt was declined.
    Cancelled,
}

impl Outcome {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Render { notice, .. } | Self::Redirect { notice, .. } => notice.as_ref(),
            Self::Rejected(notice) => Some(notice),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_use_tagged_representation() {
        let intent = Intent::ClickRow {
            id: ProductId::from("p_1"),
            action: RowAction::Delete,
        };
        let json = serde_json::to_value(&intent).expect("serialize");
        assert_eq!(json["type"], "click_row");
        assert_eq!(json["payload"]["action"], "delete");
        assert_eq!(intent.name(), "click_row");
    }

    #[test]
    fn submit_form_without_editing_id_deserializes() {
        let intent: Intent = serde_json::from_str(
            r#"{"type":"submit_product_form","payload":{"form":{"name":"Widget"}}}"#,
        )
        .expect("deserialize");
        match intent {
            Intent::SubmitProductForm { form, editing_id } => {
                assert_eq!(form.name, "Widget");
                assert!(form.price.is_empty());
                assert!(editing_id.is_none());
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }
}
