pub mod auth;
pub mod health;
pub mod lists;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::refresh)
                .service(auth::logout),
        )
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(health::health)
                .service(users::me)
                .service(users::create_user)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user)
                .service(lists::get_lists)
                .service(lists::create_list)
                .service(lists::get_list)
                .service(lists::update_list)
                .service(lists::delete_list)
                .service(lists::share_list)
                .service(lists::unshare_list)
                .service(tasks::get_tasks_for_list)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}
