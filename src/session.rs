// src/session.rs
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiClient, DeviceGateway};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::resolver::{usable_identifier, NavigationTarget, SessionResolver};
use crate::scan::{normalize_inventory, ScanSummary};
use crate::store::{CredentialStore, DeviceCache};
use crate::types::*;
use crate::validation::{self, SignupForm};

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub target: NavigationTarget,
}

#[derive(Debug, Clone)]
pub struct RegisteredDevice {
    pub device_identifier: String,
    pub already_registered: bool,
    pub device: DeviceInfo,
}

/// Authenticated client state: the API, durable storage, and the startup
/// resolver sharing both.
pub struct Session<S> {
    api: Arc<ApiClient>,
    store: Arc<S>,
    resolver: SessionResolver<ApiClient, S>,
    platform: String,
    app_version: String,
}

impl<S> Session<S>
where
    S: CredentialStore + DeviceCache,
{
    pub fn new(config: &ClientConfig, store: S) -> Result<Self, ClientError> {
        let api = Arc::new(ApiClient::new(config)?);
        let store = Arc::new(store);
        let resolver = SessionResolver::new(api.clone(), store.clone(), config.platform.clone());
        Ok(Self {
            api,
            store,
            resolver,
            platform: config.platform.clone(),
            app_version: config.app_version.clone(),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn bearer(&self) -> Result<String, ClientError> {
        self.store
            .access_token()
            .await?
            .ok_or(ClientError::Api(ApiError::NotAuthenticated))
    }

    /// Startup routing.
    pub async fn bootstrap(&self, device_identifier: Option<&str>) -> NavigationTarget {
        self.resolver.resolve(device_identifier).await
    }

    /// Logs in, stores the new credentials, then routes exactly as startup
    /// would.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device_identifier: Option<&str>,
    ) -> Result<LoginOutcome, ClientError> {
        let email = email.trim();
        validation::validate_login(email, password)?;

        let res = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.store
            .save_tokens(&res.access_token, &res.refresh_token)
            .await?;
        self.store.save_user(res.user.uid(), &res.user.email).await?;

        let target = self.bootstrap(device_identifier).await;
        Ok(LoginOutcome {
            user: res.user,
            target,
        })
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<RegisterResponse, ClientError> {
        validation::validate_signup(form)?;
        let req = RegisterRequest {
            name: form.name.trim().to_string(),
            surname: form.surname.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            phone: form.phone.trim().to_string(),
        };
        Ok(self.api.register_user(&req).await?)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, ClientError> {
        let email = email.trim();
        validation::validate_email(email)?;
        Ok(self.api.forgot_password(email).await?.message)
    }

    /// Checks the emailed code; the accepted code doubles as the reset token.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String, ClientError> {
        let otp = otp.trim();
        validation::validate_otp(otp)?;
        let res = self.api.verify_otp(email.trim(), otp).await?;
        if !res.valid {
            return Err(ClientError::OtpRejected(res.message));
        }
        Ok(otp.to_string())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<String, ClientError> {
        validation::validate_new_password(new_password, confirm_password)?;
        let email = email.trim();
        let req = ResetPasswordRequest {
            email: (!email.is_empty()).then(|| email.to_string()),
            reset_token: reset_token.to_string(),
            new_password: new_password.to_string(),
        };
        Ok(self.api.reset_password(&req).await?.message)
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let refresh_token = self
            .store
            .refresh_token()
            .await?
            .ok_or(ClientError::Api(ApiError::NotAuthenticated))?;
        let res = self.api.refresh_token(&refresh_token).await?;
        self.store
            .save_tokens(&res.access_token, &res.refresh_token)
            .await?;
        info!("token refresh successful");
        Ok(())
    }

    /// Forgets credentials. The device cache is kept.
    pub async fn logout(&self) -> Result<(), ClientError> {
        info!("logging out");
        CredentialStore::clear(self.store.as_ref()).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        let token = self.bearer().await?;
        Ok(self.api.current_user(&token).await?)
    }

    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<User, ClientError> {
        let token = self.bearer().await?;
        let user_id = self
            .store
            .user_id()
            .await?
            .ok_or(ClientError::Api(ApiError::NotAuthenticated))?;
        let user = self.api.update_profile(&token, &user_id, req).await?;
        info!("profile updated for {}", user.email);
        Ok(user)
    }

    pub async fn register_device(
        &self,
        device_identifier: &str,
        os_version: &str,
        device_model: &str,
    ) -> Result<RegisteredDevice, ClientError> {
        let token = self.bearer().await?;
        let requested = usable_identifier(Some(device_identifier))
            .unwrap_or(device_identifier)
            .to_string();
        let req = RegisterDeviceRequest {
            platform: self.platform.clone(),
            os_version: os_version.to_string(),
            device_model: device_model.to_string(),
            app_version: self.app_version.clone(),
            device_identifier: requested.clone(),
        };
        let res = self.api.register_device(&token, &req).await?;

        let confirmed = res
            .device
            .device_identifier
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(requested);
        DeviceCache::set(self.store.as_ref(), &confirmed).await?;

        let already_registered = res.is_registered.unwrap_or(false);
        info!(
            "device {confirmed} {}",
            if already_registered { "already registered" } else { "registered" }
        );
        Ok(RegisteredDevice {
            device_identifier: confirmed,
            already_registered,
            device: res.device,
        })
    }

    /// Device status with one refresh-and-retry on an expired token.
    pub async fn device_status(&self) -> Result<DeviceStatusResponse, ClientError> {
        let token = self.bearer().await?;
        match self.api.device_status(&token).await {
            Err(e) if e.is_unauthorized() => {
                info!("token expired, attempting refresh");
                if let Err(e) = self.refresh().await {
                    warn!("token refresh failed: {e}");
                    return Err(ApiError::Unauthorized {
                        message: "Unauthorized - please login again".into(),
                    }
                    .into());
                }
                let token = self.bearer().await?;
                Ok(self.api.device_status(&token).await?)
            }
            other => Ok(other?),
        }
    }

    pub async fn device(&self, device_identifier: &str) -> Result<DeviceInfo, ClientError> {
        let token = self.bearer().await?;
        Ok(self.api.device_by_identifier(&token, device_identifier).await?)
    }

    /// Uploads the installed-app inventory for the cached device.
    pub async fn upload_scan(&self, apps: Vec<AppInfo>) -> Result<ScanSummary, ClientError> {
        let token = self.bearer().await?;
        let device_identifier = DeviceCache::get(self.store.as_ref())
            .await?
            .ok_or(ClientError::DeviceNotRegistered)?;

        let req = ScanRequest {
            apps: normalize_inventory(apps),
        };
        let res = self.api.upload_scan(&token, &device_identifier, &req).await?;
        info!("scan uploaded: {} threats", res.threats_found);
        Ok(ScanSummary::new(&res, req.apps.len()))
    }
}
