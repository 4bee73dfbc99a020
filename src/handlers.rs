use actix_web::error::JsonPayloadError;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{debug, error, warn};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::features::FormattedFeatures;
use crate::inference::TrafficModel;
use crate::models::{Category, ErrorBody, FieldError, PredictionResponse};
use crate::validation::validate_request;

pub const LANDING_PAGE: &str =
    "<h1>A self-documenting API to interact with a recipie prediction model</h1>";

/// Registers every route. The model must already be in the app data as
/// `web::Data<dyn TrafficModel>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(resource("/", web::get().to(index)))
        .service(resource("/predict", web::post().to(predict)))
        .service(resource("/openapi.json", web::get().to(openapi)))
        .service(resource("/docs", web::get().to(docs)));
}

/// A single-method resource; other methods get a JSON 405.
fn resource(path: &str, route: actix_web::Route) -> actix_web::Resource {
    web::resource(path)
        .route(route)
        .default_service(web::to(method_not_allowed))
}

/// Body errors are reported like field errors, except oversized payloads
/// which keep the framework's 413.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        if matches!(
            err,
            JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. }
        ) {
            return err.into();
        }
        warn!("Rejected /predict body: {}", err);
        ApiError::Validation(vec![FieldError {
            kind: "json_invalid",
            loc: vec!["body".to_string()],
            msg: err.to_string(),
            input: Value::Null,
            ctx: None,
        }])
        .into()
    })
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(LANDING_PAGE)
}

/// Predict whether the recipe will generate high traffic.
pub async fn predict(
    model: web::Data<dyn TrafficModel>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let request = validate_request(&body).map_err(|errors| {
        warn!("Validation failed for {} field(s)", errors.len());
        ApiError::Validation(errors)
    })?;

    let model = model.into_inner();
    let row = FormattedFeatures::from(&request);
    let prediction = web::block(move || model.predict(&row))
        .await
        .map_err(|e| ApiError::Prediction(e.to_string()))
        .and_then(|result| result.map_err(ApiError::from))
        .map_err(|e| {
            error!("{}", e);
            e
        })?;

    debug!(
        "Predicted {:?} for category {}",
        prediction,
        request.category.label()
    );
    Ok(HttpResponse::Ok().json(PredictionResponse { prediction }))
}

pub async fn openapi() -> HttpResponse {
    HttpResponse::Ok().json(openapi_document())
}

pub async fn docs() -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(
        r##"<!DOCTYPE html>
<html>
<head>
<title>Recipe traffic prediction - Docs</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
</script>
</body>
</html>"##,
    )
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody {
        detail: "Not Found".to_string(),
    })
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ErrorBody {
        detail: "Method Not Allowed".to_string(),
    })
}

pub fn openapi_document() -> Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
    json!({
        "openapi": "3.1.0",
        "info": { "title": "Recipe traffic prediction", "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/": {
                "get": {
                    "summary": "Landing page",
                    "responses": {
                        "200": { "description": "Successful Response", "content": { "text/html": {} } }
                    }
                }
            },
            "/predict": {
                "post": {
                    "summary": "Predict if the recipe will generate high traffic",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Body" } } }
                    },
                    "responses": {
                        "200": { "description": "Successful Response" },
                        "422": { "description": "Validation Error" },
                        "500": { "description": "Prediction Error" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "CategoryEnum": { "type": "string", "enum": categories },
                "Body": {
                    "type": "object",
                    "required": ["calories", "carbohydrates", "sugar", "protein", "category", "servings"],
                    "properties": {
                        "calories": { "type": "number" },
                        "carbohydrates": { "type": "number" },
                        "sugar": { "type": "number" },
                        "protein": { "type": "number" },
                        "category": { "$ref": "#/components/schemas/CategoryEnum" },
                        "servings": { "type": "integer" }
                    }
                }
            }
        }
    })
}
