//! Multipart form reading shared by the upload endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use engine::FileUpload;

use crate::ServerError;

/// A parsed multipart form: the `file` part (if any, and non-empty) plus
/// every other text field.
#[derive(Default)]
pub(crate) struct UploadForm {
    pub file: Option<FileUpload>,
    pub fields: HashMap<String, String>,
}

pub(crate) async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ServerError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::Generic(format!("invalid multipart body: {err}")))?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(ToString::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ServerError::Generic(format!("invalid file part: {err}")))?;
            if !bytes.is_empty() {
                form.file = Some(FileUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| ServerError::Generic(format!("invalid field {name}: {err}")))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
