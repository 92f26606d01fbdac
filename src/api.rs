// src/api.rs
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::types::*;

/// The two remote calls the startup resolver depends on.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    async fn check_device_registration(
        &self,
        token: &str,
        device_identifier: &str,
        platform: &str,
    ) -> Result<DeviceCheck, ApiError>;

    async fn device_status(&self, token: &str) -> Result<DeviceStatusResponse, ApiError>;
}

/// Thin wrapper over the ShadowGuard REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ---------- AUTH ---------- //

    pub async fn register_user(&self, req: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        debug!("registering user {}", req.email);
        let res: RegisterResponse = self
            .send("Registration", self.client.post(self.url("/api/users/register")).json(req))
            .await?;
        info!("registration successful: {}", res.email);
        Ok(res)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!("logging in {}", req.email);
        let res: LoginResponse = self
            .send("Login", self.client.post(self.url("/api/auth/login")).json(req))
            .await?;
        info!("login successful for {}", res.user.email);
        Ok(res)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<LoginResponse, ApiError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.send("Token refresh", self.client.post(self.url("/api/auth/refresh")).json(&body))
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.send(
            "Password reset request",
            self.client.post(self.url("/api/auth/forgot-password")).json(&body),
        )
        .await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<VerifyOtpResponse, ApiError> {
        let body = VerifyOtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        self.send(
            "OTP verification",
            self.client.post(self.url("/api/auth/verify-otp")).json(&body),
        )
        .await
    }

    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<MessageResponse, ApiError> {
        self.send(
            "Password reset",
            self.client.post(self.url("/api/auth/reset-password")).json(req),
        )
        .await
    }

    // ---------- USERS ---------- //

    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.send(
            "Profile fetch",
            self.client.get(self.url("/api/users/me")).bearer_auth(token),
        )
        .await
    }

    pub async fn update_profile(
        &self,
        token: &str,
        user_id: &str,
        req: &UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        self.send(
            "Profile update",
            self.client
                .patch(self.url(&format!("/api/users/profile/{user_id}")))
                .bearer_auth(token)
                .json(req),
        )
        .await
    }

    // ---------- DEVICES ---------- //

    pub async fn register_device(
        &self,
        token: &str,
        req: &RegisterDeviceRequest,
    ) -> Result<RegisterDeviceResponse, ApiError> {
        self.send(
            "Device registration",
            self.client
                .post(self.url("/api/devices/register"))
                .bearer_auth(token)
                .json(req),
        )
        .await
    }

    pub async fn device_by_identifier(
        &self,
        token: &str,
        device_identifier: &str,
    ) -> Result<DeviceInfo, ApiError> {
        self.send(
            "Device lookup",
            self.client
                .get(self.url(&format!("/api/devices/identifier/{device_identifier}")))
                .bearer_auth(token),
        )
        .await
    }

    pub async fn upload_scan(
        &self,
        token: &str,
        device_identifier: &str,
        req: &ScanRequest,
    ) -> Result<ScanResponse, ApiError> {
        debug!("uploading scan of {} apps for {device_identifier}", req.apps.len());
        self.send(
            "Scan upload",
            self.client
                .post(self.url(&format!("/api/devices/{device_identifier}/scan")))
                .bearer_auth(token)
                .json(req),
        )
        .await
    }

    // ---------- PLUMBING ---------- //

    async fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T, ApiError> {
        let res = req.send().await.map_err(|e| {
            error!("{what} request failed: {e}");
            ApiError::Network(e.to_string())
        })?;

        let status = res.status();
        if status.is_success() {
            return res.json::<T>().await.map_err(|e| {
                error!("{what}: undecodable body: {e}");
                ApiError::Decode(e.to_string())
            });
        }

        let body = res.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| format!("{what} failed: HTTP {}", status.as_u16()));
        error!("{what} failed: {message} (code: {})", status.as_u16());

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized { message })
        } else {
            Err(ApiError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.trim().is_empty())
}

#[async_trait]
impl DeviceGateway for ApiClient {
    async fn check_device_registration(
        &self,
        token: &str,
        device_identifier: &str,
        platform: &str,
    ) -> Result<DeviceCheck, ApiError> {
        let res: DeviceCheckResponse = self
            .send(
                "Device check",
                self.client
                    .get(self.url("/api/devices/check"))
                    .query(&[("deviceIdentifier", device_identifier), ("platform", platform)])
                    .bearer_auth(token),
            )
            .await?;
        debug!("device check: isRegistered={}", res.is_registered);
        Ok(res.into_check(device_identifier))
    }

    async fn device_status(&self, token: &str) -> Result<DeviceStatusResponse, ApiError> {
        let res: DeviceStatusResponse = self
            .send(
                "Device status",
                self.client.get(self.url("/api/devices/status")).bearer_auth(token),
            )
            .await?;
        debug!(
            "device status: isRegistered={}, count={}",
            res.is_device_registered, res.device_count
        );
        Ok(res)
    }
}
