//! Admin console: knowledge-base uploads, the external-AI switch, and the
//! student roster.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use campusbot_core::error::{CampusError, Result};
use campusbot_core::session::SessionContext;
use campusbot_core::types::{Role, StudentRecord, StudentUpdate, UploadReceipt};

use crate::api::ApiClient;

#[derive(Deserialize)]
struct FilesReply {
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Deserialize)]
struct ToggleReply {
    allow_external_queries: bool,
}

#[derive(Deserialize)]
struct StudentsReply {
    #[serde(default)]
    students: Vec<StudentRecord>,
}

/// Admin operations, available only to an Admin session.
#[derive(Clone, Debug)]
pub struct AdminConsole {
    api: ApiClient,
    token: String,
}

impl AdminConsole {
    /// Open the console for the session in `ctx`.
    pub fn open(api: ApiClient, ctx: &SessionContext) -> Result<Self> {
        let session = ctx.session().ok_or(CampusError::NotSignedIn)?;
        if session.role != Role::Admin {
            return Err(CampusError::Forbidden(format!(
                "{} is not an administrator",
                session.user_key
            )));
        }
        Ok(Self {
            api,
            token: session.token.clone(),
        })
    }

    fn token(&self) -> Option<&str> {
        Some(self.token.as_str())
    }

    /// Upload a local file into the knowledge base.
    pub async fn upload(&self, path: &Path, target: Option<&str>) -> Result<UploadReceipt> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CampusError::Validation("Choose a file".into()))?;
        self.upload_bytes(&file_name, bytes, target).await
    }

    pub async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        target: Option<&str>,
    ) -> Result<UploadReceipt> {
        let mut form =
            Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        if let Some(target) = target.filter(|t| !t.trim().is_empty()) {
            form = form.text("target", target.trim().to_string());
        }
        let request = self.api.post("/api/admin/upload", self.token()).multipart(form);
        let value = self.api.call(request, "Upload failed").await?;
        let receipt = upload_receipt(&value);
        info!(file = file_name, stored = ?receipt.files, "Uploaded");
        Ok(receipt)
    }

    /// Names of files already uploaded.
    pub async fn list_uploads(&self) -> Result<Vec<String>> {
        let reply: FilesReply = self
            .api
            .call_as(self.api.get("/api/admin/upload", self.token()), "Failed to list files")
            .await?;
        Ok(reply.files)
    }

    /// Flip the external-AI switch. Returns the new setting.
    pub async fn toggle_ai(&self) -> Result<bool> {
        let request = self
            .api
            .post("/api/admin/toggle_ai", self.token())
            .json(&serde_json::json!({}));
        let reply: ToggleReply = self.api.call_as(request, "Failed to toggle").await?;
        info!(allowed = reply.allow_external_queries, "External AI toggled");
        Ok(reply.allow_external_queries)
    }

    pub async fn students(&self) -> Result<Vec<StudentRecord>> {
        let reply: StudentsReply = self
            .api
            .call_as(
                self.api.get("/api/admin/students", self.token()),
                "Failed to load students",
            )
            .await?;
        Ok(reply.students)
    }

    /// Set a student's marks. The e-mail is required; marks may be empty.
    pub async fn update_student(&self, email: &str, marks: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CampusError::Validation("Enter student email".into()));
        }
        let update = StudentUpdate {
            email: email.to_string(),
            marks: marks.trim().to_string(),
        };
        let request = self
            .api
            .post("/api/admin/update_student", self.token())
            .json(&update);
        self.api.call(request, "Update failed").await?;
        info!(email, "Student updated");
        Ok(())
    }
}

/// The server answers an upload with either `file` or `files`.
fn upload_receipt(value: &Value) -> UploadReceipt {
    if let Some(file) = value.get("file").and_then(Value::as_str) {
        return UploadReceipt {
            files: vec![file.to_string()],
        };
    }
    let files = value
        .get("files")
        .and_then(Value::as_array)
        .map(|files| {
            files
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    UploadReceipt { files }
}
