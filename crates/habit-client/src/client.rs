//! Habit tracker HTTP client implementation.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use habit_core::{Backup, HabitId, HabitView, ProfileUpdate, ProfileView, ProgressSummary};

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, BadgesResponse, CompleteHabitRequest, CompletionResponse,
    CreateHabitRequest, ImportResponse,
};

/// Habit tracker API client.
///
/// Every request carries the user's bearer token; the server derives the
/// user from it.
#[derive(Debug, Clone)]
pub struct HabitClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HabitClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://habits:8080"`)
    /// * `token` - The user's bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, token, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    // =========================================================================
    // Habits
    // =========================================================================

    /// List habits in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_habits(&self) -> Result<Vec<HabitView>, ClientError> {
        self.send(self.request(Method::GET, "/v1/habits")).await
    }

    /// Create a habit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BadRequest`] for an empty name, or another error
    /// if the request fails.
    pub async fn create_habit(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<HabitView, ClientError> {
        let body = CreateHabitRequest {
            name: name.into(),
            description,
        };
        self.send(self.request(Method::POST, "/v1/habits").json(&body))
            .await
    }

    /// Delete a habit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the habit does not exist.
    pub async fn delete_habit(&self, habit_id: &HabitId) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .send(self.request(Method::DELETE, &format!("/v1/habits/{habit_id}")))
            .await?;
        Ok(())
    }

    /// Mark a habit completed on `date`, or on the server's UTC date.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotFound`] if the habit does not exist
    /// - [`ClientError::PartialFailure`] if the habit was saved but the
    ///   profile was not
    /// - [`ClientError::Unavailable`] if the server's store is down
    pub async fn complete_habit(
        &self,
        habit_id: &HabitId,
        date: Option<NaiveDate>,
    ) -> Result<CompletionResponse, ClientError> {
        let body = CompleteHabitRequest { date };
        self.send(
            self.request(Method::PATCH, &format!("/v1/habits/{habit_id}"))
                .json(&body),
        )
        .await
    }

    /// Clear a habit's completions and current streak.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the habit does not exist.
    pub async fn reset_habit(&self, habit_id: &HabitId) -> Result<HabitView, ClientError> {
        self.send(self.request(Method::POST, &format!("/v1/habits/{habit_id}/reset")))
            .await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Get the profile, created with defaults on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_profile(&self) -> Result<ProfileView, ClientError> {
        self.send(self.request(Method::GET, "/v1/profile")).await
    }

    /// Edit the profile's name or avatar.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BadRequest`] for an invalid name or avatar.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileView, ClientError> {
        self.send(self.request(Method::PATCH, "/v1/profile").json(update))
            .await
    }

    /// Delete every habit and the profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn reset_all(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self.send(self.request(Method::DELETE, "/v1/profile")).await?;
        Ok(())
    }

    // =========================================================================
    // Progress and backups
    // =========================================================================

    /// Get the progress summary for `date`, or the server's UTC date.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn progress(&self, date: Option<NaiveDate>) -> Result<ProgressSummary, ClientError> {
        let mut request = self.request(Method::GET, "/v1/progress");
        if let Some(date) = date {
            request = request.query(&[("date", date.to_string())]);
        }
        self.send(request).await
    }

    /// Get the badge overview.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn badges(&self) -> Result<BadgesResponse, ClientError> {
        self.send(self.request(Method::GET, "/v1/badges")).await
    }

    /// Download a backup of all habits and the profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn export(&self) -> Result<Backup, ClientError> {
        self.send(self.request(Method::GET, "/v1/export")).await
    }

    /// Replace all habits and the profile with a backup.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BadRequest`] if the server rejects the backup.
    pub async fn import(&self, backup: &Backup) -> Result<ImportResponse, ClientError> {
        self.send(self.request(Method::POST, "/v1/import").json(backup))
            .await
    }

    /// Send a request and decode the response or its error envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let Ok(envelope) = response.json::<ApiErrorResponse>().await else {
            return Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            });
        };

        let error = envelope.error;
        tracing::debug!(status = %status, code = %error.code, "API error response");

        // Map specific error codes to typed errors
        Err(match error.code.as_str() {
            "unauthorized" => ClientError::Unauthorized,
            "bad_request" => ClientError::BadRequest(error.message),
            "not_found" => ClientError::NotFound(error.message),
            "store_unavailable" => ClientError::Unavailable(error.message),
            "partial_failure" => match error
                .details
                .as_ref()
                .and_then(|d| d.get("habitId"))
                .and_then(serde_json::Value::as_str)
                .and_then(|id| id.parse().ok())
            {
                Some(habit_id) => ClientError::PartialFailure { habit_id },
                None => ClientError::Api {
                    code: error.code,
                    message: error.message,
                    status: status.as_u16(),
                },
            },
            _ => ClientError::Api {
                code: error.code,
                message: error.message,
                status: status.as_u16(),
            },
        })
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = HabitClient::new("http://localhost:8080/", "token").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_options() {
        let options = ClientOptions { timeout_seconds: 5 };
        let client = HabitClient::with_options("http://localhost:8080", "token", options).unwrap();
        assert_eq!(client.token, "token");
    }
}
