//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

/// Query flag for destructive actions (`?confirm=true`).
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmParams {
    /// Must be `true` to carry out the action. Defaults to `false`.
    #[serde(default)]
    pub confirm: bool,
}
