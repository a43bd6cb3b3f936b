//! Client for the `/api/domain` resource.

use std::future::Future;

use serde::de::DeserializeOwned;
use tracing::warn;

use super::error::{handle_error, AccessError};
use super::model::{
    to_domain_entity, DomainApiResponse, DomainChanges, DomainEntity, NewDomainEntity,
};
use super::transport::{Method, Transport, TransportRequest, TransportResponse};

/// Operations a domain store needs from the remote side.
///
/// Each call issues one request. A failed call yields exactly one
/// normalized [`AccessError`]; nothing is retried.
pub trait DataAccess: Send + Sync + 'static {
    fn load(
        &self,
        scope_id: &str,
    ) -> impl Future<Output = Result<Vec<DomainEntity>, AccessError>> + Send;

    fn get_by_id(&self, id: &str)
        -> impl Future<Output = Result<DomainEntity, AccessError>> + Send;

    fn create(
        &self,
        entity: NewDomainEntity,
    ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send;

    fn update(
        &self,
        id: &str,
        changes: DomainChanges,
    ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), AccessError>> + Send;
}

/// [`DataAccess`] over a [`Transport`].
#[derive(Debug, Clone)]
pub struct DomainDataAccess<T> {
    transport: T,
}

impl<T: Transport> DomainDataAccess<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, AccessError> {
        let method = request.method;
        let path = request.path();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, %path, reason = %err.reason, "request failed");
                return Err(handle_error(None, ""));
            }
        };

        if !response.is_success() {
            let error = handle_error(Some(response.status), &response.body);
            warn!(%method, %path, status = response.status, error = %error, "request rejected");
            return Err(error);
        }
        Ok(response)
    }

    async fn fetch<R: DeserializeOwned>(&self, request: TransportRequest) -> Result<R, AccessError> {
        let response = self.execute(request).await?;
        serde_json::from_str(&response.body).map_err(|err| {
            warn!(status = response.status, error = %err, "response body did not decode");
            AccessError::decode(response.status, err)
        })
    }

    async fn fetch_entity(&self, request: TransportRequest) -> Result<DomainEntity, AccessError> {
        self.fetch::<DomainApiResponse>(request)
            .await
            .map(to_domain_entity)
    }
}

fn json_body<S: serde::Serialize>(value: &S) -> Result<serde_json::Value, AccessError> {
    serde_json::to_value(value).map_err(|err| AccessError::Unexpected {
        status: None,
        source: Some(err),
    })
}

impl<T: Transport> DataAccess for DomainDataAccess<T> {
    fn load(
        &self,
        scope_id: &str,
    ) -> impl Future<Output = Result<Vec<DomainEntity>, AccessError>> + Send {
        let request = TransportRequest::new(Method::Get, ["api", "domain", scope_id]);
        async move {
            let items: Vec<DomainApiResponse> = self.fetch(request).await?;
            Ok(items.into_iter().map(to_domain_entity).collect())
        }
    }

    fn get_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send {
        let request = TransportRequest::new(Method::Get, ["api", "domain", "item", id]);
        self.fetch_entity(request)
    }

    fn create(
        &self,
        entity: NewDomainEntity,
    ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send {
        async move {
            let request =
                TransportRequest::new(Method::Post, ["api", "domain"]).with_body(json_body(&entity)?);
            self.fetch_entity(request).await
        }
    }

    fn update(
        &self,
        id: &str,
        changes: DomainChanges,
    ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send {
        let request = TransportRequest::new(Method::Patch, ["api", "domain", id]);
        async move {
            let request = request.with_body(json_body(&changes)?);
            self.fetch_entity(request).await
        }
    }

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), AccessError>> + Send {
        let request = TransportRequest::new(Method::Delete, ["api", "domain", id]);
        async move {
            self.execute(request).await?;
            Ok(())
        }
    }
}
