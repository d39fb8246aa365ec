//! REST store backend.
//!
//! Talks to the document service over plain request/response JSON. No
//! engine-side timeout or retry: the transport's behavior is the
//! behavior, and retries are a caller concern.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use sage_document::{
    Action, ActionDraft, ActionId, ActionPatch, Control, ControlDraft, ControlId, ControlPatch,
    Document, DocumentId, DocumentKind, EntityId, Hazard, HazardDraft, HazardId, HazardPatch,
    Phase, RatingPatch, RatingStage, Step, StepDraft, StepId, StepPatch,
};

use crate::error::StoreError;
use crate::store::DocumentStore;

/// A [`DocumentStore`] over the document service's HTTP interface.
#[derive(Debug, Clone)]
pub struct RestStore {
    base: String,
    client: Client,
}

impl RestStore {
    /// Builds a store client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Uses a preconfigured client, for callers that need their own
    /// proxy, TLS, or timeout settings.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, StoreError> {
        let response = self.checked(request, path).await?;
        Ok(response.json().await?)
    }

    async fn execute_unit(&self, request: RequestBuilder, path: &str) -> Result<(), StoreError> {
        let _ = self.checked(request, path).await?;
        Ok(())
    }

    async fn checked(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, StoreError> {
        debug!(path, "store request");
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            path: path.to_owned(),
            message: clip(&message),
        })
    }
}

fn clip(message: &str) -> String {
    message.chars().take(240).collect()
}

#[derive(Serialize)]
struct CreateBody<T: Serialize> {
    position: usize,
    #[serde(flatten)]
    draft: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderBody<'a> {
    ordered_ids: &'a [EntityId],
}

#[derive(Serialize)]
struct PhaseBody {
    phase: Phase,
}

#[derive(Serialize)]
struct NewDocumentBody<'a> {
    kind: DocumentKind,
    title: &'a str,
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn create_document(
        &self,
        kind: DocumentKind,
        title: String,
    ) -> Result<Document, StoreError> {
        let path = "documents".to_owned();
        let body = NewDocumentBody {
            kind,
            title: &title,
        };
        self.execute(self.client.post(self.url(&path)).json(&body), &path)
            .await
    }

    async fn fetch_document(&self, document: DocumentId) -> Result<Document, StoreError> {
        let path = format!("documents/{document}");
        self.execute(self.client.get(self.url(&path)), &path).await
    }

    async fn replace_document(&self, document: Document) -> Result<Document, StoreError> {
        let path = format!("documents/{}", document.id);
        self.execute(self.client.put(self.url(&path)).json(&document), &path)
            .await
    }

    async fn set_phase(&self, document: DocumentId, phase: Phase) -> Result<(), StoreError> {
        let path = format!("documents/{document}/phase");
        let body = PhaseBody { phase };
        self.execute_unit(self.client.put(self.url(&path)).json(&body), &path)
            .await
    }

    async fn create_step(
        &self,
        document: DocumentId,
        position: usize,
        draft: StepDraft,
    ) -> Result<Step, StoreError> {
        let path = format!("documents/{document}/steps");
        let body = CreateBody { position, draft };
        self.execute(self.client.post(self.url(&path)).json(&body), &path)
            .await
    }

    async fn update_step(
        &self,
        document: DocumentId,
        step: StepId,
        patch: StepPatch,
    ) -> Result<Step, StoreError> {
        let path = format!("documents/{document}/steps/{step}");
        self.execute(self.client.patch(self.url(&path)).json(&patch), &path)
            .await
    }

    async fn delete_step(&self, document: DocumentId, step: StepId) -> Result<(), StoreError> {
        let path = format!("documents/{document}/steps/{step}");
        self.execute_unit(self.client.delete(self.url(&path)), &path)
            .await
    }

    async fn reorder_steps(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        let path = format!("documents/{document}/steps/order");
        let body = OrderBody {
            ordered_ids: &ordered,
        };
        self.execute_unit(self.client.put(self.url(&path)).json(&body), &path)
            .await
    }

    async fn create_hazard(
        &self,
        document: DocumentId,
        step: StepId,
        position: usize,
        draft: HazardDraft,
    ) -> Result<Hazard, StoreError> {
        let path = format!("documents/{document}/steps/{step}/hazards");
        let body = CreateBody { position, draft };
        self.execute(self.client.post(self.url(&path)).json(&body), &path)
            .await
    }

    async fn update_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
        patch: HazardPatch,
    ) -> Result<Hazard, StoreError> {
        let path = format!("documents/{document}/hazards/{hazard}");
        self.execute(self.client.patch(self.url(&path)).json(&patch), &path)
            .await
    }

    async fn delete_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
    ) -> Result<(), StoreError> {
        let path = format!("documents/{document}/hazards/{hazard}");
        self.execute_unit(self.client.delete(self.url(&path)), &path)
            .await
    }

    async fn reorder_hazards(
        &self,
        document: DocumentId,
        step: StepId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        let path = format!("documents/{document}/steps/{step}/hazards/order");
        let body = OrderBody {
            ordered_ids: &ordered,
        };
        self.execute_unit(self.client.put(self.url(&path)).json(&body), &path)
            .await
    }

    async fn update_rating(
        &self,
        document: DocumentId,
        hazard: HazardId,
        stage: RatingStage,
        patch: RatingPatch,
    ) -> Result<Hazard, StoreError> {
        let path = format!("documents/{document}/hazards/{hazard}/ratings/{stage}");
        self.execute(self.client.put(self.url(&path)).json(&patch), &path)
            .await
    }

    async fn create_control(
        &self,
        document: DocumentId,
        hazard: HazardId,
        position: usize,
        draft: ControlDraft,
    ) -> Result<Control, StoreError> {
        let path = format!("documents/{document}/hazards/{hazard}/controls");
        let body = CreateBody { position, draft };
        self.execute(self.client.post(self.url(&path)).json(&body), &path)
            .await
    }

    async fn update_control(
        &self,
        document: DocumentId,
        control: ControlId,
        patch: ControlPatch,
    ) -> Result<Control, StoreError> {
        let path = format!("documents/{document}/controls/{control}");
        self.execute(self.client.patch(self.url(&path)).json(&patch), &path)
            .await
    }

    async fn delete_control(
        &self,
        document: DocumentId,
        control: ControlId,
    ) -> Result<(), StoreError> {
        let path = format!("documents/{document}/controls/{control}");
        self.execute_unit(self.client.delete(self.url(&path)), &path)
            .await
    }

    async fn reorder_controls(
        &self,
        document: DocumentId,
        hazard: HazardId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        let path = format!("documents/{document}/hazards/{hazard}/controls/order");
        let body = OrderBody {
            ordered_ids: &ordered,
        };
        self.execute_unit(self.client.put(self.url(&path)).json(&body), &path)
            .await
    }

    async fn create_action(
        &self,
        document: DocumentId,
        position: usize,
        draft: ActionDraft,
    ) -> Result<Action, StoreError> {
        let path = format!("documents/{document}/actions");
        let body = CreateBody { position, draft };
        self.execute(self.client.post(self.url(&path)).json(&body), &path)
            .await
    }

    async fn update_action(
        &self,
        document: DocumentId,
        action: ActionId,
        patch: ActionPatch,
    ) -> Result<Action, StoreError> {
        let path = format!("documents/{document}/actions/{action}");
        self.execute(self.client.patch(self.url(&path)).json(&patch), &path)
            .await
    }

    async fn delete_action(
        &self,
        document: DocumentId,
        action: ActionId,
    ) -> Result<(), StoreError> {
        let path = format!("documents/{document}/actions/{action}");
        self.execute_unit(self.client.delete(self.url(&path)), &path)
            .await
    }

    async fn reorder_actions(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        let path = format!("documents/{document}/actions/order");
        let body = OrderBody {
            ordered_ids: &ordered,
        };
        self.execute_unit(self.client.put(self.url(&path)).json(&body), &path)
            .await
    }
}
