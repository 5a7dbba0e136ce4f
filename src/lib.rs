pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod session_store;
pub mod state;

pub mod crypto {
    pub mod csrf;
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod comment;
    pub mod identity;
    pub mod post;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod comments;
    pub mod images;
    pub mod posts;
    pub mod profiles;
}

pub mod handlers {
    pub mod auth;
    pub mod comments;
    pub mod extract;
    pub mod posts;
    pub mod profiles;
    pub mod root;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
}

pub mod validation {
    pub mod auth;
    pub mod content;
    pub mod sanitize;
}
