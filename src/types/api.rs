//! Wire shapes for the paste API. Field names are camelCase on the wire;
//! every response carries a `success` flag so failures stay structured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::controllers::pastes::PastePreview;
use crate::models::Paste;

#[derive(Debug, Deserialize)]
pub struct CreatePaste {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaste {
    pub content: String,
}

#[derive(Serialize)]
pub struct ListPastes {
    pub success: bool,
    pub data: ListData,
}

#[derive(Serialize)]
pub struct ListData {
    pub pastes: Vec<Paste>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPaste {
    pub success: bool,
    pub data: CreatedData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedData {
    pub paste: Paste,
    pub all_pastes: Vec<Paste>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedPaste {
    pub success: bool,
    pub message: String,
    pub data: UpdatedData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedData {
    pub updated_paste: PastePreview,
    pub remaining_pastes: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPaste {
    pub success: bool,
    pub message: String,
    pub data: DeletedData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedData {
    pub deleted_paste: PastePreview,
    pub remaining_pastes: usize,
    pub timestamp: DateTime<Utc>,
}
