use serde::Deserialize;

/// Form posted by the pin and delete buttons.
#[derive(Debug, Deserialize)]
pub struct ActionForm {
    pub action: Option<String>,
    pub id: Option<String>,
}
