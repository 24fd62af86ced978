use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::auth::request_password_recover,
        routes::auth::reset_password,
        routes::organizations::create_organization,
        routes::organizations::list_organizations,
        routes::organizations::get_organization,
        routes::organizations::get_membership,
        routes::organizations::update_organization,
        routes::organizations::shutdown_organization,
        routes::organizations::transfer_ownership,
        routes::members::list_members,
        routes::members::update_member_role,
        routes::members::remove_member,
        routes::invites::create_invite,
        routes::invites::list_invites,
        routes::invites::get_invite,
        routes::invites::accept_invite,
        routes::invites::reject_invite,
        routes::invites::revoke_invite,
        routes::invites::list_pending_invites,
        routes::events::create_event,
        routes::events::list_events,
        routes::events::get_event
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            models::user::User,
            models::user::AuthResponse,
            models::user::LoginRequest,
            models::user::RegisterRequest,
            models::user::PasswordRecoverRequest,
            models::user::PasswordResetRequest,
            models::organization::Organization,
            models::organization::OrganizationSummary,
            models::organization::OrganizationCreateRequest,
            models::organization::OrganizationUpdateRequest,
            models::organization::TransferOwnershipRequest,
            models::member::MemberRole,
            models::member::Member,
            models::member::Membership,
            models::member::UpdateMemberRoleRequest,
            models::invite::MemberInvite,
            models::invite::InviteAuthor,
            models::invite::InviteCreateRequest,
            models::invite::InviteCreatedResponse,
            models::event::Event,
            models::event::EventCreateRequest,
            models::event::EventCreatedResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Organizations", description = "Organization management"),
        (name = "Members", description = "Organization members"),
        (name = "Member invites", description = "Organization member invites"),
        (name = "Events", description = "Competitive events")
    )
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
    let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

    ensure_security_components(&mut doc);
    ensure_global_security(&mut doc);
    ensure_servers(&mut doc, port);

    Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
    let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
        .try_it_out_enabled(true)
        .with_credentials(true)
        .persist_authorization(true);

    let doc_json = Arc::new(serde_json::to_value(&doc).expect("OpenAPI serialization must succeed"));

    let json_route = {
        let doc_json = Arc::clone(&doc_json);
        get(move || {
            let doc_json = Arc::clone(&doc_json);
            async move { Json((*doc_json).clone()) }
        })
    };

    Router::new()
        .route("/api-docs/openapi.json", json_route)
        .merge(SwaggerUi::new("/docs").config(swagger_config))
}

/// Register the bearer scheme so the Swagger UI Authorize dialog works.
fn ensure_security_components(doc: &mut Value) {
    let components = doc
        .as_object_mut()
        .expect("OpenAPI root must be an object")
        .entry("components")
        .or_insert_with(|| json!({}));

    if let Some(schemes) = components
        .as_object_mut()
        .map(|c| c.entry("securitySchemes").or_insert_with(|| json!({})))
        .and_then(Value::as_object_mut)
    {
        schemes.insert(
            "bearerAuth".to_string(),
            json!({
                "type": "http",
                "scheme": "bearer",
                "bearerFormat": "JWT"
            }),
        );
    }
}

fn ensure_global_security(doc: &mut Value) {
    if doc.get("security").is_none() {
        doc["security"] = json!([{ "bearerAuth": [] }]);
    }
}

fn ensure_servers(doc: &mut Value, port: u16) {
    if doc.get("servers").is_none() {
        doc["servers"] = json!([
            { "url": format!("http://localhost:{port}") }
        ]);
    }
}
