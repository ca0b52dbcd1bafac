use serde::Serialize;

use crate::response::ApiResponse;

#[derive(Serialize)]
pub struct HealthData {
    pub message: &'static str,
}

pub async fn healthcheck() -> ApiResponse<HealthData> {
    ApiResponse::ok(
        HealthData {
            message: "Server is Running",
        },
        "Success",
    )
}
