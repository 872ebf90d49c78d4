use crate::handlers::{events, start, status, urls};
use ondemand_common::{LifecycleDetail, LifecycleEvent, StatusChecks};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        status::get_status,
        start::start_instance,
        events::lifecycle_event,
        events::scheduled_event,
        urls::update_urls
    ),
    components(
        schemas(
            status::StatusResponse,
            StatusChecks,
            LifecycleEvent,
            LifecycleDetail,
            urls::UpdateUrlsRequest,
            urls::UpdateUrlsResponse
        )
    ),
    tags(
        (name = "ondemand", description = "On-demand instance lifecycle")
    )
)]
pub struct ApiDoc;
