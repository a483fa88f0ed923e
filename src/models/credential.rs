use serde::{Deserialize, Serialize};

use super::sheet::{RowView, SheetRecord};

/// Login identity and verification material. Provisioned out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub email: String,
    /// Lowercase hex SHA-256 of the password
    pub password_hash: String,
    /// Blob id of the registered face image
    pub face_reference_id: Option<String>,
}

impl CredentialRecord {
    pub const EMAIL: &'static str = "Email";
    pub const PASSWORD_HASH: &'static str = "PasswordHash";
    pub const FACE_REFERENCE_ID: &'static str = "FaceReferenceId";
}

impl SheetRecord for CredentialRecord {
    const KIND: &'static str = "credential";
    const COLUMNS: &'static [&'static str] =
        &[Self::EMAIL, Self::PASSWORD_HASH, Self::FACE_REFERENCE_ID];
    const KEY_COLUMN: &'static str = Self::EMAIL;

    fn key(&self) -> &str {
        &self.email
    }

    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            email: row.get_owned(Self::EMAIL),
            password_hash: row.get_owned(Self::PASSWORD_HASH),
            face_reference_id: row.get_optional(Self::FACE_REFERENCE_ID),
        }
    }

    fn to_cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (Self::EMAIL, self.email.clone()),
            (Self::PASSWORD_HASH, self.password_hash.clone()),
            (
                Self::FACE_REFERENCE_ID,
                self.face_reference_id.clone().unwrap_or_default(),
            ),
        ]
    }
}
