use crate::types::{Appointment, AppointmentRequest, ErrorResponse, MessageResponse};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Appointment server is not reachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client side of the appointment API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Appointment>, ApiError>;
    async fn create(&self, request: &AppointmentRequest) -> Result<Appointment, ApiError>;
    async fn update(&self, id: &str, request: &AppointmentRequest)
        -> Result<Appointment, ApiError>;
    async fn delete(&self, id: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpAppointmentApi {
    client: Client,
    base_url: String,
}

impl HttpAppointmentApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AppointmentApi for HttpAppointmentApi {
    async fn list(&self) -> Result<Vec<Appointment>, ApiError> {
        let response = self.client.get(self.url("appointments")).send().await?;
        Self::parse(response).await
    }

    async fn create(&self, request: &AppointmentRequest) -> Result<Appointment, ApiError> {
        let response = self
            .client
            .post(self.url("appointments"))
            .json(request)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn update(
        &self,
        id: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ApiError> {
        let response = self
            .client
            .put(self.url(&format!("appointments/{id}")))
            .json(request)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn delete(&self, id: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("appointments/{id}")))
            .send()
            .await?;
        let body: MessageResponse = Self::parse(response).await?;
        Ok(body.message)
    }
}
