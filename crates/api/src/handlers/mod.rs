pub mod attendance;
pub mod device_protocol;
pub mod devices;
pub mod files;

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::{AppError, AppResult};

/// A multipart form with one file part and any number of text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// `(file name, bytes)` of the `file` part.
    pub file: Option<(String, Vec<u8>)>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of `multipart`. The part named `file` is kept as
    /// bytes; all others are read as text.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.file = Some((file_name, data.to_vec()));
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// The `file` part, or 400 if it was not sent.
    pub fn take_file(&mut self) -> AppResult<(String, Vec<u8>)> {
        self.file
            .take()
            .ok_or_else(|| AppError::BadRequest("No file provided".into()))
    }

    /// A text field, `None` when absent or blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}
