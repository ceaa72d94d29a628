//! OpenAPI document, served at `/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Banner Rotator API",
        version = "0.1.0",
        description = "Banner rotation with UCB1 selection.\n\nManages banners, slots and social groups, links them into rotations and picks which banner to show.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Banners", description = "Banner lifecycle"),
        (name = "Slots", description = "Slot lifecycle"),
        (name = "Groups", description = "Social group lifecycle"),
        (name = "Rotations", description = "Rotations, clicks, statistics and banner choice"),
        (name = "Operations", description = "Version, health, readiness, and liveness probes"),
    ),
    paths(
        // Banners
        crate::rest::add_banner,
        crate::rest::get_banner,
        crate::rest::delete_banner,
        // Slots
        crate::rest::add_slot,
        crate::rest::get_slot,
        crate::rest::delete_slot,
        // Groups
        crate::rest::add_group,
        crate::rest::get_group,
        crate::rest::delete_group,
        // Rotations
        crate::rest::add_rotation,
        crate::rest::get_rotation,
        crate::rest::delete_rotation,
        crate::rest::register_click,
        crate::rest::get_stats,
        crate::rest::choose_banner,
        // Operations
        crate::rest::version,
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        rotation_core::Banner,
        rotation_core::Slot,
        rotation_core::Group,
        rotation_core::Rotation,
        rotation_core::Event,
        rotation_core::EventType,
        crate::rest::DescriptionBody,
        crate::rest::HealthResponse,
        crate::rest::VersionResponse,
        crate::error::ErrorResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_rotation_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/banners"));
        assert!(paths.contains_key("/groups/{group_id}/slots/{slot_id}/banner"));
        assert!(paths.contains_key("/groups/{group_id}/slots/{slot_id}/banners/{banner_id}/stats"));
    }
}
