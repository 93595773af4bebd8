// BpLogger-api lib.rs
//
// HTTP surface of the blood pressure logger: router, handlers, public
// entities and the OpenAPI document.

pub mod api;
pub mod config;
pub mod entities;
pub mod openapi;
