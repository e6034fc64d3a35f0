//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::protocol::{
    ChatRequestBody, ChatResponseBody, ErrorBody, HealthConfigBody, HealthResponseBody,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::chat::chat_handler,
        crate::web::health::health_handler,
    ),
    components(
        schemas(ChatRequestBody, ChatResponseBody, ErrorBody, HealthResponseBody, HealthConfigBody)
    ),
    tags(
        (name = "LexiBot API", description = "Legal-information chat assistant backed by Gemini.")
    )
)]
pub struct ApiDoc;
