//! Shared handler state (§6 Control API), grounded on
//! `nvisy_server::pipeline::state::PipelineState`'s thin `Arc`-wrapper
//! shape: a single cheaply-cloneable handle to the one collaborator every
//! handler needs.

use std::sync::Arc;

use forge_controller::ClusterController;

#[derive(Clone)]
pub struct ServerState {
    pub controller: Arc<ClusterController>,
}

impl ServerState {
    pub fn new(controller: Arc<ClusterController>) -> Self {
        Self { controller }
    }
}
