use super::handlers::{
    auth::{gate, login, register, session},
    catalog::{categories, permissions, relations, roles},
    health,
};
use axum::middleware;
use utoipa::openapi::{
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    ComponentsBuilder, Contact, InfoBuilder, License, OpenApiBuilder, Tag,
};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Public routes are registered directly; everything under `/api/protected` goes
/// through `protected_router`, which puts the access gate in front of it.
/// Routes added outside (like `/` or `OPTIONS /health`) are not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(register::register))
        .routes(routes!(login::login))
        .routes(routes!(session::validate_token))
        .merge(protected_router())
}

/// Routes served only after `gate::require_session` attaches a `Principal`.
fn protected_router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(session::logout))
        .routes(routes!(session::profile))
        .routes(routes!(roles::list_roles, roles::create_role))
        .routes(routes!(
            roles::get_role,
            roles::update_role_handler,
            roles::delete_role
        ))
        .routes(routes!(relations::role_permissions))
        .routes(routes!(relations::role_permission_state))
        .routes(routes!(
            categories::list_categories,
            categories::create_category
        ))
        .routes(routes!(
            categories::get_category,
            categories::update_category_handler,
            categories::delete_category
        ))
        .routes(routes!(
            permissions::list_permissions,
            permissions::create_permission
        ))
        .routes(routes!(
            permissions::get_permission,
            permissions::update_permission_handler,
            permissions::delete_permission
        ))
        .routes(routes!(permissions::roles_of_permission))
        .routes(routes!(relations::list_assignments, relations::assign))
        .routes(routes!(relations::get_assignment, relations::unassign))
        .routes(routes!(relations::bulk))
        .route_layer(middleware::from_fn(gate::require_session))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(api_tags()))
        .components(Some(
            ComponentsBuilder::new()
                .security_scheme(
                    "bearer",
                    SecurityScheme::Http(
                        HttpBuilder::new()
                            .scheme(HttpAuthScheme::Bearer)
                            .bearer_format("JWT")
                            .build(),
                    ),
                )
                .build(),
        ))
        .build()
}

fn api_tags() -> Vec<Tag> {
    let mut escolar_tag = Tag::new("escolar");
    escolar_tag.description = Some("School records administration API".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Registration, login, logout and session checks".to_string());

    let mut roles_tag = Tag::new("roles");
    roles_tag.description = Some("Roles and their permission assignments".to_string());

    let mut permissions_tag = Tag::new("permissions");
    permissions_tag.description = Some("Permission categories and permissions".to_string());

    vec![escolar_tag, auth_tag, roles_tag, permissions_tag]
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Equipo Escolar"));
            assert_eq!(contact.email.as_deref(), Some("dev@escolar.local"));
        }

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        for name in ["escolar", "auth", "roles", "permissions"] {
            assert!(tags.iter().any(|tag| tag.name == name), "missing tag {name}");
        }
        for path in [
            "/health",
            "/api/register",
            "/api/login",
            "/api/validate-token",
            "/api/protected/logout",
            "/api/protected/profile",
            "/api/protected/roles/{id}/permissions/state",
            "/api/protected/role-permissions/bulk",
            "/api/protected/role-permissions/{role_id}/{permission_id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn openapi_declares_bearer_scheme() {
        let spec = openapi();
        let components = spec.components.unwrap_or_default();
        assert!(components.security_schemes.contains_key("bearer"));
        // Route schemas merge into the same components as the scheme.
        assert!(components.schemas.contains_key("RegisterRequest"));
    }

    #[test]
    fn base_document_carries_tags_before_routes() {
        let base = cargo_openapi();
        let tags = base.tags.unwrap_or_default();
        assert_eq!(tags.len(), 4);
        assert!(base.paths.paths.is_empty());
        assert!(base
            .components
            .is_some_and(|components| components.security_schemes.contains_key("bearer")));
    }

    #[test]
    fn parse_author_splits_name_and_email() {
        assert_eq!(
            parse_author("Equipo Escolar <dev@escolar.local>"),
            (Some("Equipo Escolar"), Some("dev@escolar.local"))
        );
        assert_eq!(parse_author("Solo Nombre"), (Some("Solo Nombre"), None));
        assert_eq!(parse_author(" <>"), (None, None));
    }
}
