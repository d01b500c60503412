//! Projects, memberships, and attached knowledge sources.

use crate::error::ApiError;
use crate::extract;
use crate::types::{
    CreateProjectRequest, MemberRole, NotionPage, Project, ProjectDetail, ProjectMember,
    SwaggerDocument, UpdateProjectRequest,
};
use ragchat_session::AuthGateway;
use serde_json::{Value, json};

/// Project endpoints
pub struct ProjectsApi<'a> {
    gateway: &'a AuthGateway,
}

impl<'a> ProjectsApi<'a> {
    pub(crate) fn new(gateway: &'a AuthGateway) -> Self {
        Self { gateway }
    }

    /// `GET /projects` — projects visible to the signed-in user
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` for transport, status, or refresh
    /// failures, and `ApiError::Json` for an unrecognized payload.
    pub async fn list(&self) -> Result<Vec<Project>, ApiError> {
        let payload: Value = self.gateway.get("/projects").send().await?.json().await?;
        extract::list(&payload, &["projects"])
    }

    /// `GET /projects/{id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn get(&self, id: &str) -> Result<ProjectDetail, ApiError> {
        let payload: Value = self
            .gateway
            .get(&format!("/projects/{id}"))
            .send()
            .await?
            .json()
            .await?;
        Ok(serde_json::from_value(unwrap_key(&payload, "project"))?)
    }

    /// `POST /projects`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn create(&self, request: &CreateProjectRequest) -> Result<Project, ApiError> {
        let payload: Value = self
            .gateway
            .post("/projects")
            .json(request)?
            .send()
            .await?
            .json()
            .await?;
        Ok(serde_json::from_value(unwrap_key(&payload, "project"))?)
    }

    /// `PATCH /projects/{id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateProjectRequest,
    ) -> Result<Project, ApiError> {
        let payload: Value = self
            .gateway
            .patch(&format!("/projects/{id}"))
            .json(request)?
            .send()
            .await?
            .json()
            .await?;
        Ok(serde_json::from_value(unwrap_key(&payload, "project"))?)
    }

    /// `DELETE /projects/{id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("/projects/{id}"))
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }

    /// `GET /projects/{id}/members`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn members(&self, id: &str) -> Result<Vec<ProjectMember>, ApiError> {
        let payload: Value = self
            .gateway
            .get(&format!("/projects/{id}/members"))
            .send()
            .await?
            .json()
            .await?;
        extract::list(&payload, &["members"])
    }

    /// `POST /projects/{id}/members`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn add_member(
        &self,
        id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<(), ApiError> {
        self.gateway
            .post(&format!("/projects/{id}/members"))
            .json(&json!({ "userId": user_id, "role": role }))?
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }

    /// `DELETE /projects/{id}/members/{user_id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn remove_member(&self, id: &str, user_id: &str) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("/projects/{id}/members/{user_id}"))
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }

    /// `PATCH /projects/{id}/members/{user_id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn set_member_role(
        &self,
        id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<(), ApiError> {
        self.gateway
            .patch(&format!("/projects/{id}/members/{user_id}"))
            .json(&json!({ "role": role }))?
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }

    /// `GET /projects/selectable/notion-pages` — indexed pages available for
    /// attachment
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn selectable_notion_pages(&self) -> Result<Vec<NotionPage>, ApiError> {
        let payload: Value = self
            .gateway
            .get("/projects/selectable/notion-pages")
            .send()
            .await?
            .json()
            .await?;
        extract::list(&payload, &["pages"])
    }

    /// `GET /projects/selectable/swagger-documents`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn selectable_swagger_documents(&self) -> Result<Vec<SwaggerDocument>, ApiError> {
        let payload: Value = self
            .gateway
            .get("/projects/selectable/swagger-documents")
            .send()
            .await?
            .json()
            .await?;
        extract::list(&payload, &["documents"])
    }

    /// `POST /projects/{id}/notion-pages` — bulk attach
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn attach_notion_pages(&self, id: &str, page_ids: &[&str]) -> Result<(), ApiError> {
        self.gateway
            .post(&format!("/projects/{id}/notion-pages"))
            .json(&json!({ "notionPageIds": page_ids }))?
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }

    /// `DELETE /projects/{id}/notion-pages/{page_id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn detach_notion_page(&self, id: &str, page_id: &str) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("/projects/{id}/notion-pages/{page_id}"))
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }

    /// `POST /projects/{id}/swagger-documents` — bulk attach
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn attach_swagger_documents(
        &self,
        id: &str,
        document_ids: &[&str],
    ) -> Result<(), ApiError> {
        self.gateway
            .post(&format!("/projects/{id}/swagger-documents"))
            .json(&json!({ "swaggerDocumentIds": document_ids }))?
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }

    /// `DELETE /projects/{id}/swagger-documents/{document_id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn detach_swagger_document(
        &self,
        id: &str,
        document_id: &str,
    ) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("/projects/{id}/swagger-documents/{document_id}"))
            .send()
            .await?
            .checked_bytes()
            .await?;
        Ok(())
    }
}

/// Unwrap a `{ "<key>": … }` envelope, or take the payload bare.
fn unwrap_key(payload: &Value, key: &str) -> Value {
    payload.get(key).unwrap_or(payload).clone()
}
