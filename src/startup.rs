use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::email_client::MailClient;
use crate::observability::OpsSink;
use crate::rate_limit::SlidingWindow;
use crate::routes;

pub fn run(
    listener: TcpListener,
    settings: Settings,
    mail_client: MailClient,
    rate_limiter: SlidingWindow,
    ops: Arc<dyn OpsSink>,
) -> Result<Server, std::io::Error> {
    let settings = Data::new(settings);
    let mail_client = Data::new(mail_client);
    let rate_limiter = Data::new(rate_limiter);
    let ops = Data::new(ops);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(routes::health_check::health_check))
            .service(
                web::resource("/contact-submit")
                    .route(web::post().to(routes::contact::submit_contact))
                    .route(web::to(routes::submission::method_not_allowed)),
            )
            .service(
                web::resource("/event-submit")
                    .route(web::post().to(routes::event::submit_event))
                    .route(web::to(routes::submission::method_not_allowed)),
            )
            .app_data(settings.clone())
            .app_data(mail_client.clone())
            .app_data(rate_limiter.clone())
            .app_data(ops.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
