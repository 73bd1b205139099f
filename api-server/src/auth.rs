use std::future::{ready, Ready};

use actix_web::{
    dev::Payload,
    http::{header::HeaderMap, StatusCode},
    web::Data,
    FromRequest, HttpRequest, HttpResponse, ResponseError,
};
use reward_core::{attestation::recover_personal_signer, Address, Signature};

use crate::config::DEFAULT_ADMIN_MESSAGE;
use crate::response::json_error_with_message;
use crate::AppState;

pub(crate) const ADMIN_ADDRESS_HEADER: &str = "x-admin-address";
pub(crate) const ADMIN_SIGNATURE_HEADER: &str = "x-admin-signature";
pub(crate) const ADMIN_MESSAGE_HEADER: &str = "x-admin-message";

/// A wallet that proved control of an allow-listed admin address by signing
/// the admin message. Handlers take it as a typed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AdminPrincipal {
    pub(crate) address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdminAuthError {
    NotConfigured,
    MissingHeaders,
    InvalidAddress,
    Unauthorized,
    InvalidSignature,
}

impl AdminAuthError {
    fn code(self) -> &'static str {
        match self {
            Self::NotConfigured => "ADMIN_NOT_CONFIGURED",
            Self::MissingHeaders => "MISSING_AUTH_HEADERS",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidSignature => "INVALID_SIGNATURE",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::NotConfigured => "Admin functionality is not configured. Set ADMIN_WALLETS.",
            Self::MissingHeaders => {
                "Missing admin authentication headers. Required: x-admin-address, x-admin-signature"
            }
            Self::InvalidAddress => "Invalid wallet address format",
            Self::Unauthorized => "This wallet is not authorized as an admin",
            Self::InvalidSignature => "Signature does not match the provided address",
        }
    }
}

impl std::fmt::Display for AdminAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl ResponseError for AdminAuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::MissingHeaders | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::InvalidAddress => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error_with_message(self.status_code(), self.code(), self.message())
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value)
}

pub(crate) fn authenticate(
    headers: &HeaderMap,
    admin_wallets: &[Address],
) -> Result<AdminPrincipal, AdminAuthError> {
    if admin_wallets.is_empty() {
        tracing::warn!("admin request rejected: no admin wallets configured");
        return Err(AdminAuthError::NotConfigured);
    }

    let (Some(address), Some(signature)) = (
        header_value(headers, ADMIN_ADDRESS_HEADER),
        header_value(headers, ADMIN_SIGNATURE_HEADER),
    ) else {
        return Err(AdminAuthError::MissingHeaders);
    };
    let message = header_value(headers, ADMIN_MESSAGE_HEADER).unwrap_or(DEFAULT_ADMIN_MESSAGE);

    let address = Address::parse(address).map_err(|_| AdminAuthError::InvalidAddress)?;
    if !admin_wallets.contains(&address) {
        return Err(AdminAuthError::Unauthorized);
    }

    let signature = Signature::from_hex(signature).map_err(|_| AdminAuthError::InvalidSignature)?;
    match recover_personal_signer(message.as_bytes(), &signature) {
        Ok(recovered) if recovered == address => Ok(AdminPrincipal { address }),
        Ok(recovered) => {
            tracing::warn!(claimed = %address, recovered = %recovered, "admin signature mismatch");
            Err(AdminAuthError::InvalidSignature)
        }
        Err(err) => {
            tracing::warn!(claimed = %address, "admin signature recovery failed: {err}");
            Err(AdminAuthError::InvalidSignature)
        }
    }
}

impl FromRequest for AdminPrincipal {
    type Error = AdminAuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<Data<AppState>>() {
            Some(state) => authenticate(req.headers(), &state.admin_wallets),
            None => Err(AdminAuthError::NotConfigured),
        };
        ready(result)
    }
}
