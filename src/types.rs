// src/types.rs
use serde::{Deserialize, Serialize};

// ---------- AUTH ---------- //

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body the backend sends with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub status_code: Option<u16>,
}

// ---------- USERS ---------- //

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_device_registered: Option<bool>,
}

impl User {
    /// The backend returns either `_id` or `id`; prefer `_id`.
    pub fn uid(&self) -> &str {
        self.mongo_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// ---------- DEVICES ---------- //

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub platform: String,
    pub os_version: String,
    pub device_model: String,
    pub app_version: String,
    pub device_identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceResponse {
    pub message: String,
    pub device: DeviceInfo,
    #[serde(default)]
    pub is_registered: Option<bool>,
}

/// Device record as the backend returns it. Every field may be missing:
/// the check endpoint often sends only `deviceIdentifier`. Timestamps are
/// kept as the backend formats them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub platform: String,
    pub os_version: String,
    pub device_model: String,
    pub app_version: String,
    pub device_identifier: Option<String>,
    pub last_seen: Option<String>,
    pub last_scan_at: Option<String>,
    pub last_risk_score: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusResponse {
    pub is_device_registered: bool,
    pub device_count: u32,
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
}

/// Raw body of `GET /api/devices/check`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCheckResponse {
    pub is_registered: bool,
    #[serde(default)]
    pub device: Option<DeviceInfo>,
}

/// A device the backend has confirmed as registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub device_identifier: String,
    pub info: Option<DeviceInfo>,
}

/// Outcome of a registration check. A device record exists only on the
/// registered branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCheck {
    Registered { device: DeviceRecord },
    NotRegistered,
}

impl DeviceCheckResponse {
    /// Folds the nullable pair into a [`DeviceCheck`]. `requested` fills in
    /// for a missing device or a device without an identifier.
    pub fn into_check(self, requested: &str) -> DeviceCheck {
        if !self.is_registered {
            return DeviceCheck::NotRegistered;
        }
        let device_identifier = self
            .device
            .as_ref()
            .and_then(|d| d.device_identifier.clone())
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| requested.to_string());
        DeviceCheck::Registered {
            device: DeviceRecord {
                device_identifier,
                info: self.device,
            },
        }
    }
}

// ---------- SCANS ---------- //

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub package_name: String,
    #[serde(default)]
    pub version_code: i64,
    #[serde(default)]
    pub version_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub apps: Vec<AppInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub scan_id: String,
    pub threats_found: u32,
    pub risk_score: u32,
    #[serde(default)]
    pub message: Option<String>,
}
