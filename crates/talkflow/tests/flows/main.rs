//! Integration tests driving complete conversations through `FlowService`.

mod support;

mod engine;
mod service;
mod transforms;
