use omr_gateway_core::{CheckService, SecureFileServer};

/// Shared application state
pub struct AppState {
    check_service: CheckService,
    file_server: SecureFileServer,
}

impl AppState {
    pub fn new(check_service: CheckService, file_server: SecureFileServer) -> Self {
        Self {
            check_service,
            file_server,
        }
    }

    pub fn check_service(&self) -> &CheckService {
        &self.check_service
    }

    pub fn file_server(&self) -> &SecureFileServer {
        &self.file_server
    }
}
