use crate::{
    api::{attendance, audit, leave_request, teacher},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // only None for a zero period or burst, both clamped above
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let decision_limiter = Arc::new(build_limiter(config.rate_decision_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // fixed paths before /leave/{id}
                    .service(
                        web::resource("/eligibility")
                            .route(web::get().to(leave_request::eligibility)),
                    )
                    .service(
                        web::resource("/hours/remaining")
                            .route(web::get().to(leave_request::remaining_hours)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .wrap(decision_limiter.clone())
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .wrap(decision_limiter.clone())
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/audit")
                    .service(web::resource("").route(web::get().to(audit::audit_list)))
                    .service(web::resource("/summary").route(web::get().to(audit::audit_summary))),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::put().to(attendance::check_out))
                            .route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/summary")
                            .route(web::get().to(attendance::attendance_summary)),
                    ),
            )
            .service(
                web::scope("/teacher")
                    // /teacher
                    .service(
                        web::resource("")
                            .route(web::post().to(teacher::create_teacher))
                            .route(web::get().to(teacher::list_teachers)),
                    )
                    // /teacher/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(teacher::update_teacher))
                            .route(web::get().to(teacher::get_teacher))
                            .route(web::delete().to(teacher::deactivate_teacher)),
                    ),
            ),
    );
}
